use std::collections::HashMap;

use aws_sdk_cognitoidentityprovider::Client;
use aws_sdk_cognitoidentityprovider::types::AuthFlowType;
use tracing::info;

use crate::error::AuthError;

/// Tokens returned by a successful sign-in.
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Sign in with a username and password.
pub async fn initiate_auth(
    client: &Client,
    user_pool_client_id: &str,
    username: &str,
    password: &str,
) -> Result<AuthTokens, AuthError> {
    info!(username = username, "initiating auth");

    let mut auth_params = HashMap::new();
    auth_params.insert("USERNAME".to_string(), username.to_string());
    auth_params.insert("PASSWORD".to_string(), password.to_string());

    run_flow(
        client,
        user_pool_client_id,
        AuthFlowType::UserPasswordAuth,
        auth_params,
    )
    .await
}

/// Exchange a refresh token for fresh tokens.
pub async fn refresh_auth(
    client: &Client,
    user_pool_client_id: &str,
    refresh_token: &str,
) -> Result<AuthTokens, AuthError> {
    let mut auth_params = HashMap::new();
    auth_params.insert("REFRESH_TOKEN".to_string(), refresh_token.to_string());

    run_flow(
        client,
        user_pool_client_id,
        AuthFlowType::RefreshTokenAuth,
        auth_params,
    )
    .await
}

async fn run_flow(
    client: &Client,
    user_pool_client_id: &str,
    flow: AuthFlowType,
    auth_params: HashMap<String, String>,
) -> Result<AuthTokens, AuthError> {
    let resp = client
        .initiate_auth()
        .auth_flow(flow)
        .client_id(user_pool_client_id)
        .set_auth_parameters(Some(auth_params))
        .send()
        .await
        .map_err(|e| AuthError::Cognito(e.into_service_error().to_string()))?;

    if let Some(result) = resp.authentication_result() {
        Ok(AuthTokens {
            access_token: result.access_token().unwrap_or_default().to_string(),
            refresh_token: result.refresh_token().map(str::to_string),
        })
    } else if let Some(challenge) = resp.challenge_name() {
        // Interactive challenges (MFA, new password) cannot be answered here.
        Err(AuthError::AuthFailed(format!(
            "unsupported challenge: {}",
            challenge.as_str()
        )))
    } else {
        Err(AuthError::AuthFailed("unexpected response".to_string()))
    }
}

/// Resolve the `sub` of the user an access token belongs to.
///
/// Cognito checks the token itself, so this doubles as validation for
/// callers without the pool's signing key.
pub async fn user_subject(client: &Client, access_token: &str) -> Result<String, AuthError> {
    let resp = client
        .get_user()
        .access_token(access_token)
        .send()
        .await
        .map_err(|e| AuthError::Cognito(e.into_service_error().to_string()))?;

    resp.user_attributes()
        .iter()
        .find(|attr| attr.name() == "sub")
        .and_then(|attr| attr.value())
        .map(str::to_string)
        .ok_or_else(|| AuthError::InvalidToken("user has no sub attribute".to_string()))
}
