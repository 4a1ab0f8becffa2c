// src/storage/store.rs — SQLite operations

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::entitlement::{DeniedReason, GateDecision};
use crate::pipeline::types::{
    DeviceCategory, DiagnosisResult, DiagnosisSource, ImageRef, SessionStatus,
};

/// Low-level SQLite operations for sessions, entitlements, and the fault
/// knowledge base.
pub struct Store {
    conn: Connection,
}

/// A persisted diagnostic session.
#[derive(Debug, Clone)]
pub struct DiagnosticSession {
    pub id: String,
    pub user_id: String,
    pub status: SessionStatus,
    pub description: String,
    pub category: DeviceCategory,
    pub images: Vec<ImageRef>,
    pub result: Option<DiagnosisResult>,
    pub source: Option<DiagnosisSource>,
    pub created_at: String,
    pub updated_at: String,
}

/// One row of the category-keyed fault table.
#[derive(Debug, Clone)]
pub struct FaultEntry {
    pub title: String,
    pub symptoms: String,
    pub explanation: String,
    pub repair_steps: Vec<String>,
    pub tools_needed: Vec<String>,
    pub estimated_cost: String,
    pub difficulty: String,
    pub safety_warnings: Vec<String>,
}

impl FaultEntry {
    /// The text a description's keywords are scored against.
    pub fn match_text(&self) -> String {
        format!("{} {} {}", self.title, self.symptoms, self.explanation).to_lowercase()
    }

    pub fn into_result(self) -> DiagnosisResult {
        DiagnosisResult {
            problem: self.title,
            explanation: self.explanation,
            repair_steps: self.repair_steps,
            tools_needed: self.tools_needed,
            estimated_cost: self.estimated_cost,
            difficulty: self.difficulty,
            success_rate: "unknown".into(),
            time_required: "varies".into(),
            safety_warnings: self.safety_warnings,
        }
    }
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // -- Sessions --

    pub fn create_session(
        &self,
        id: &str,
        user_id: &str,
        description: &str,
        category: DeviceCategory,
        images: &[ImageRef],
    ) -> anyhow::Result<()> {
        let now = Utc::now().to_rfc3339();
        let image_refs = serde_json::to_string(images)?;
        self.conn.execute(
            "INSERT INTO sessions (id, user_id, status, description, device_category,
             image_refs, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                id,
                user_id,
                SessionStatus::Analyzing.as_str(),
                description,
                category.as_str(),
                image_refs,
                now
            ],
        )?;
        Ok(())
    }

    /// Write the final result onto a session. Last write wins; committing
    /// to a session id that was never created is a no-op, not an error.
    pub fn commit_session(
        &self,
        id: &str,
        result: &DiagnosisResult,
        source: DiagnosisSource,
        status: SessionStatus,
    ) -> anyhow::Result<()> {
        let now = Utc::now().to_rfc3339();
        let result_json = serde_json::to_string(result)?;
        self.conn.execute(
            "UPDATE sessions SET result_json = ?1, source = ?2, status = ?3, updated_at = ?4
             WHERE id = ?5",
            params![result_json, source.as_str(), status.as_str(), now, id],
        )?;
        Ok(())
    }

    pub fn get_session(&self, id: &str) -> anyhow::Result<Option<DiagnosticSession>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, user_id, status, description, device_category, image_refs,
                 result_json, source, created_at, updated_at
                 FROM sessions WHERE id = ?1",
                [id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            id,
            user_id,
            status,
            description,
            category,
            image_refs,
            result_json,
            source,
            created_at,
            updated_at,
        )) = row
        else {
            return Ok(None);
        };

        let status = SessionStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown session status '{status}'"))?;
        let images = match image_refs {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };
        let result = match result_json {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };
        let source = source.as_deref().and_then(DiagnosisSource::parse);

        Ok(Some(DiagnosticSession {
            id,
            user_id,
            status,
            description,
            category: DeviceCategory::from_tag(&category),
            images,
            result,
            source,
            created_at,
            updated_at,
        }))
    }

    // -- Entitlements --

    /// Atomic quota check for one user: premium is always allowed without
    /// touching the counter; free users get a lazy reset when the stored
    /// date is stale, then a decrement-if-positive, all in one UPDATE so
    /// concurrent requests cannot double-spend.
    pub fn check_and_consume(
        &self,
        user_id: &str,
        today: &str,
        daily_limit: i64,
    ) -> anyhow::Result<GateDecision> {
        // First sight of a user provisions a fresh free-tier record.
        self.conn.execute(
            "INSERT INTO entitlements (user_id, is_premium, remaining_quota, reset_date)
             VALUES (?1, 0, ?2, ?3)
             ON CONFLICT(user_id) DO NOTHING",
            params![user_id, daily_limit, today],
        )?;

        let is_premium: bool = self.conn.query_row(
            "SELECT is_premium FROM entitlements WHERE user_id = ?1",
            [user_id],
            |r| r.get(0),
        )?;
        if is_premium {
            return Ok(GateDecision::Allowed { remaining: None });
        }

        // Dates are YYYY-MM-DD, so string comparison orders correctly.
        let changed = self.conn.execute(
            "UPDATE entitlements SET
                remaining_quota = CASE
                    WHEN reset_date < ?2 THEN MAX(?3 - 1, 0)
                    ELSE remaining_quota - 1
                END,
                reset_date = CASE WHEN reset_date < ?2 THEN ?2 ELSE reset_date END
             WHERE user_id = ?1
               AND ((reset_date < ?2 AND ?3 > 0) OR remaining_quota > 0)",
            params![user_id, today, daily_limit],
        )?;

        if changed == 0 {
            return Ok(GateDecision::Denied(DeniedReason::QuotaExceeded));
        }

        let remaining: i64 = self.conn.query_row(
            "SELECT remaining_quota FROM entitlements WHERE user_id = ?1",
            [user_id],
            |r| r.get(0),
        )?;
        Ok(GateDecision::Allowed {
            remaining: Some(remaining),
        })
    }

    pub fn set_premium(&self, user_id: &str, is_premium: bool) -> anyhow::Result<()> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO entitlements (user_id, is_premium, remaining_quota, reset_date)
             VALUES (?1, ?2, 0, ?3)
             ON CONFLICT(user_id) DO UPDATE SET is_premium = ?2",
            params![user_id, is_premium, today],
        )?;
        Ok(())
    }

    // -- Fault knowledge base --

    pub fn fault_entries_for(&self, category: DeviceCategory) -> anyhow::Result<Vec<FaultEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT title, symptoms, explanation, repair_steps, tools_needed,
             estimated_cost, difficulty, safety_warnings
             FROM fault_entries WHERE category = ?1",
        )?;

        let rows = stmt.query_map([category.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (
                title,
                symptoms,
                explanation,
                repair_steps,
                tools_needed,
                estimated_cost,
                difficulty,
                safety_warnings,
            ) = row?;
            entries.push(FaultEntry {
                title,
                symptoms,
                explanation,
                repair_steps: serde_json::from_str(&repair_steps)?,
                tools_needed: serde_json::from_str(&tools_needed)?,
                estimated_cost,
                difficulty,
                safety_warnings: serde_json::from_str(&safety_warnings)?,
            });
        }
        Ok(entries)
    }
}
