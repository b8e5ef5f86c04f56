use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::state::AppState;

/// The caller behind a request, as far as it could be established.
#[derive(Clone, Debug, Default)]
pub struct Caller {
    /// Subject of a verified bearer token. `None` for anonymous requests.
    pub sub: Option<String>,
}

/// Bearer attribution middleware.
///
/// Requests without an `Authorization` header pass through anonymously.
/// A malformed or rejected bearer token is a 401. On success, inserts
/// [`Caller`] into request extensions for handlers to use.
pub async fn attribute_caller(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = match req.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => {
            let token = value
                .to_str()
                .ok()
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or(StatusCode::UNAUTHORIZED)?;
            Some(token.to_string())
        }
    };

    let sub = match token {
        Some(token) => subject(&state, &token).await?,
        None => None,
    };

    req.extensions_mut().insert(Caller { sub });

    Ok(next.run(req).await)
}

/// Local verification against the pool key when configured, otherwise a
/// Cognito `GetUser` round trip. Without either, the token is ignored.
async fn subject(state: &AppState, token: &str) -> Result<Option<String>, StatusCode> {
    if let Some(verifier) = &state.verifier {
        return verifier.verify(token).map(|claims| Some(claims.sub)).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            StatusCode::UNAUTHORIZED
        });
    }

    if let Some(cognito) = &state.cognito {
        return cognito.subject_for_token(token).await.map(Some).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            StatusCode::UNAUTHORIZED
        });
    }

    warn!("bearer token ignored, no token verification configured");
    Ok(None)
}
