use triage_auth::error::AuthError;
use triage_auth::jwt::TokenVerifier;

#[test]
fn malformed_pem_is_rejected() {
    let result = TokenVerifier::from_pem("not a key", "us-east-1_pool", "us-east-1");
    assert!(matches!(result, Err(AuthError::Jwt(_))));
}
