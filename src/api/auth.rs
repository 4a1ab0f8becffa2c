// src/api/auth.rs

use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::api::{types::ErrorResponse, ApiState};
use crate::entitlement::DeniedReason;

/// Header carrying the caller's identity, set by the auth proxy in front
/// of this service after it has verified the user's token. This service
/// never decodes tokens itself.
pub const USER_HEADER: &str = "x-devicefix-user";

/// The already-verified caller.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_id: String,
}

/// Verify the service bearer token (if configured) and extract the caller
/// identity. Both failures map to the `auth_required` wire code.
pub fn authenticate(
    state: &ApiState,
    headers: &HeaderMap,
) -> Result<CallerIdentity, (StatusCode, Json<ErrorResponse>)> {
    if let Some(ref expected) = state.token {
        let auth_header = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let token = auth_header.strip_prefix("Bearer ").unwrap_or("");

        if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
            return Err(unauthorized());
        }
    }

    let user_id = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match user_id {
        Some(user_id) => Ok(CallerIdentity {
            user_id: user_id.to_string(),
        }),
        None => Err(unauthorized()),
    }
}

fn unauthorized() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::denied(DeniedReason::AuthRequired)),
    )
}

/// Constant-time byte comparison to prevent timing attacks on token auth.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
