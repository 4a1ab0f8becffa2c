// src/entitlement.rs — Rate/entitlement gate

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::debug;

use crate::storage::Store;

/// Why a request was turned away. The one error family that reaches the
/// client as an explicit failure instead of being absorbed by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeniedReason {
    QuotaExceeded,
    AuthRequired,
}

impl DeniedReason {
    /// Stable wire code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DeniedReason::QuotaExceeded => "quota_exceeded",
            DeniedReason::AuthRequired => "auth_required",
        }
    }
}

impl std::fmt::Display for DeniedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// `remaining` is None for premium users (no counter involved).
    Allowed { remaining: Option<i64> },
    Denied(DeniedReason),
}

/// Pre-check run before the pipeline. Quota is consumed per attempt, not
/// per successful diagnosis: a request that falls through to the guaranteed
/// stage still spent one.
pub struct EntitlementGate {
    store: Arc<Mutex<Store>>,
    daily_limit: i64,
}

impl EntitlementGate {
    pub fn new(store: Arc<Mutex<Store>>, daily_limit: i64) -> Self {
        Self { store, daily_limit }
    }

    pub fn check_and_consume(&self, user_id: &str) -> anyhow::Result<GateDecision> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let store = self
            .store
            .lock()
            .map_err(|_| anyhow::anyhow!("entitlement store lock poisoned"))?;
        let decision = store.check_and_consume(user_id, &today, self.daily_limit)?;
        debug!(user = user_id, ?decision, "entitlement check");
        Ok(decision)
    }
}
