use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::AuthError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of the stable user identifier notes are attributed to.
///
/// Methods return boxed futures for dyn compatibility.
pub trait IdentityProvider: Send + Sync {
    /// The identity already established, if any.
    fn current_identity(&self) -> BoxFuture<'_, Option<String>>;

    /// Establish (or re-establish) an identity. Fails when no sign-in path
    /// succeeds.
    fn establish_identity(&self) -> BoxFuture<'_, Result<String, AuthError>>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
    fn current_identity(&self) -> BoxFuture<'_, Option<String>> {
        (**self).current_identity()
    }

    fn establish_identity(&self) -> BoxFuture<'_, Result<String, AuthError>> {
        (**self).establish_identity()
    }
}

/// A provider with a fixed identity, or none at all.
///
/// With no identity, establishing one always fails, which leaves attribution
/// to the caller's demo fallback.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    id: Option<String>,
}

impl StaticIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_identity(&self) -> BoxFuture<'_, Option<String>> {
        Box::pin(async move { self.id.clone() })
    }

    fn establish_identity(&self) -> BoxFuture<'_, Result<String, AuthError>> {
        Box::pin(async move { self.id.clone().ok_or(AuthError::NotConfigured) })
    }
}

/// A caller-supplied identity in front of a fallback provider.
///
/// Used for bearer-token attribution: the request's own subject wins, and
/// the service identity is only consulted when the request carried none.
pub struct LayeredIdentity {
    preferred: Option<String>,
    fallback: Arc<dyn IdentityProvider>,
}

impl LayeredIdentity {
    pub fn new(preferred: Option<String>, fallback: Arc<dyn IdentityProvider>) -> Self {
        Self {
            preferred,
            fallback,
        }
    }
}

impl IdentityProvider for LayeredIdentity {
    fn current_identity(&self) -> BoxFuture<'_, Option<String>> {
        Box::pin(async move {
            match &self.preferred {
                Some(id) => Some(id.clone()),
                None => self.fallback.current_identity().await,
            }
        })
    }

    fn establish_identity(&self) -> BoxFuture<'_, Result<String, AuthError>> {
        Box::pin(async move {
            match &self.preferred {
                Some(id) => Ok(id.clone()),
                None => self.fallback.establish_identity().await,
            }
        })
    }
}
