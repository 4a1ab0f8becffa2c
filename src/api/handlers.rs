// src/api/handlers.rs

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use tracing::{error, warn};

use crate::api::{auth, types::*, ApiState};
use crate::entitlement::{DeniedReason, GateDecision};
use crate::pipeline::types::{DeviceCategory, DiagnosisContext, SessionStatus};

/// POST /api/v1/diagnoses — Run the fallback chain for one request.
///
/// An entitled caller always gets a complete diagnosis back; only the
/// gate (quota/auth) and malformed input produce explicit failures.
pub async fn create_diagnosis(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<DiagnoseRequest>,
) -> Result<Json<DiagnoseResponse>, (StatusCode, Json<ErrorResponse>)> {
    let caller = auth::authenticate(&state, &headers)?;

    if body.description.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("description cannot be empty")),
        ));
    }

    match state.gate.check_and_consume(&caller.user_id) {
        Ok(GateDecision::Allowed { .. }) => {}
        Ok(GateDecision::Denied(reason)) => {
            let status = match reason {
                DeniedReason::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
                DeniedReason::AuthRequired => StatusCode::UNAUTHORIZED,
            };
            return Err((status, Json(ErrorResponse::denied(reason))));
        }
        Err(e) => {
            error!("entitlement check failed: {e}");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("entitlement check failed")),
            ));
        }
    }

    let session_id = body
        .session_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let category = DeviceCategory::from_tag(body.device_category.as_deref().unwrap_or(""));

    let ctx = DiagnosisContext::new(body.description.clone(), category)
        .with_images(body.image_refs.clone())
        .with_answers(body.clarifying_answers.clone());

    // Record the session up front so a crash mid-pipeline leaves a trace.
    // Best-effort: persistence never blocks the diagnosis itself.
    match state.store.lock() {
        Ok(store) => {
            if let Err(e) = store.create_session(
                &session_id,
                &caller.user_id,
                &body.description,
                category,
                &body.image_refs,
            ) {
                warn!(session = %session_id, "session create failed: {e}");
            }
        }
        Err(_) => warn!(session = %session_id, "store lock poisoned, session not created"),
    }

    let outcome = state.pipeline.run(&ctx).await;

    match state.store.lock() {
        Ok(store) => {
            if let Err(e) = store.commit_session(
                &session_id,
                &outcome.result,
                outcome.source,
                SessionStatus::Completed,
            ) {
                warn!(session = %session_id, "session commit failed: {e}");
            }
        }
        Err(_) => warn!(session = %session_id, "store lock poisoned, session not committed"),
    }

    Ok(Json(DiagnoseResponse {
        success: true,
        session_id,
        source: outcome.source.as_str().to_string(),
        diagnosis: outcome.result,
    }))
}

/// GET /api/v1/diagnoses/{id} — Fetch a persisted session.
///
/// A store fault is a 500, never a silent 404; only a genuine miss is 404.
pub async fn get_diagnosis(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, (StatusCode, Json<ErrorResponse>)> {
    auth::authenticate(&state, &headers)?;

    let lookup_failed = || {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("session lookup failed")),
        )
    };

    let session = match state.store.lock() {
        Ok(store) => match store.get_session(&id) {
            Ok(session) => session,
            Err(e) => {
                warn!(session = %id, "session read failed: {e}");
                return Err(lookup_failed());
            }
        },
        Err(_) => {
            warn!(session = %id, "store lock poisoned, session not read");
            return Err(lookup_failed());
        }
    };

    match session {
        Some(session) => Ok(Json(SessionResponse {
            session_id: session.id,
            status: session.status.as_str().to_string(),
            source: session.source.map(|s| s.as_str().to_string()),
            diagnosis: session.result,
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("session '{id}' not found"))),
        )),
    }
}

/// GET /api/v1/health — Simple health check.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
