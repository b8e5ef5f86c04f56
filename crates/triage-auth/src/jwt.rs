use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::error::AuthError;

/// Claims extracted from a Cognito JWT.
#[derive(Debug, Deserialize)]
pub struct CognitoClaims {
    pub sub: String,
    pub iss: String,
    pub token_use: String,
    pub exp: u64,
    pub iat: u64,
    #[serde(default)]
    pub username: Option<String>,
}

/// Validate a Cognito JWT against the user pool's public key.
///
/// Accepts both access and id tokens; the audience is not checked because
/// Cognito access tokens carry `client_id` instead of `aud`.
pub fn validate_token(
    token: &str,
    decoding_key: &DecodingKey,
    user_pool_id: &str,
    region: &str,
) -> Result<CognitoClaims, AuthError> {
    let issuer = format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}");

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[&issuer]);
    validation.validate_exp = true;
    validation.validate_aud = false;

    let token_data = decode::<CognitoClaims>(token, decoding_key, &validation)?;

    let token_use = &token_data.claims.token_use;
    if token_use != "access" && token_use != "id" {
        return Err(AuthError::InvalidToken(format!(
            "unexpected token_use: {token_use}"
        )));
    }

    Ok(token_data.claims)
}

/// Verifies bearer tokens issued by one Cognito user pool.
pub struct TokenVerifier {
    key: DecodingKey,
    user_pool_id: String,
    region: String,
}

impl TokenVerifier {
    /// Build a verifier from the pool's RSA public key in PEM form.
    pub fn from_pem(
        pem: &str,
        user_pool_id: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            key: DecodingKey::from_rsa_pem(pem.as_bytes())?,
            user_pool_id: user_pool_id.into(),
            region: region.into(),
        })
    }

    pub fn verify(&self, token: &str) -> Result<CognitoClaims, AuthError> {
        validate_token(token, &self.key, &self.user_pool_id, &self.region)
    }
}
