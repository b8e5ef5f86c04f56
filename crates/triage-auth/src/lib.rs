//! triage-auth
//!
//! Attribution identity for compiled notes: the [`identity::IdentityProvider`]
//! seam, a Cognito-backed provider, and Cognito JWT validation.

pub mod client;
pub mod cognito;
pub mod error;
pub mod flows;
pub mod identity;
pub mod jwt;
