//! Cognito-backed service identity.
//!
//! The service signs in with a stored refresh token (preferred) or a
//! username/password pair, then resolves the signed-in user's `sub`.
//! The subject is cached after the first success.

use aws_sdk_cognitoidentityprovider::Client;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::AuthError;
use crate::flows;
use crate::identity::{BoxFuture, IdentityProvider};

/// How the service signs in.
#[derive(Debug, Clone, Default)]
pub struct SignIn {
    pub refresh_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

pub struct CognitoIdentity {
    client: Client,
    user_pool_client_id: String,
    sign_in: SignIn,
    current: RwLock<Option<String>>,
}

impl CognitoIdentity {
    pub fn new(client: Client, user_pool_client_id: impl Into<String>, sign_in: SignIn) -> Self {
        Self {
            client,
            user_pool_client_id: user_pool_client_id.into(),
            sign_in,
            current: RwLock::new(None),
        }
    }

    /// Resolve the subject of a caller's bearer access token.
    pub async fn subject_for_token(&self, access_token: &str) -> Result<String, AuthError> {
        flows::user_subject(&self.client, access_token).await
    }

    async fn sign_in(&self) -> Result<String, AuthError> {
        let mut last_error = AuthError::NotConfigured;

        if let Some(token) = &self.sign_in.refresh_token {
            match flows::refresh_auth(&self.client, &self.user_pool_client_id, token).await {
                Ok(tokens) => return flows::user_subject(&self.client, &tokens.access_token).await,
                Err(e) => {
                    warn!(error = %e, "refresh token sign-in failed");
                    last_error = e;
                }
            }
        }

        if let (Some(username), Some(password)) = (&self.sign_in.username, &self.sign_in.password) {
            match flows::initiate_auth(&self.client, &self.user_pool_client_id, username, password)
                .await
            {
                Ok(tokens) => return flows::user_subject(&self.client, &tokens.access_token).await,
                Err(e) => {
                    warn!(error = %e, "password sign-in failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

impl IdentityProvider for CognitoIdentity {
    fn current_identity(&self) -> BoxFuture<'_, Option<String>> {
        Box::pin(async move { self.current.read().await.clone() })
    }

    fn establish_identity(&self) -> BoxFuture<'_, Result<String, AuthError>> {
        Box::pin(async move {
            let sub = self.sign_in().await?;
            info!(sub = %sub, "service identity established");
            *self.current.write().await = Some(sub.clone());
            Ok(sub)
        })
    }
}
