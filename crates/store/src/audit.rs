use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Append-only record of store lifecycle events, one JSON object per line.
/// Writes are best-effort; callers ignore the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event_type: String,
    pub record_id: String,
    pub owner: Option<String>,
    pub state: Option<String>,
    pub signature: Option<String>,
    pub amount: Option<f64>,
}

impl AuditEvent {
    pub fn new(event_type: &str, record_id: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event_type: event_type.to_string(),
            record_id: record_id.to_string(),
            owner: None,
            state: None,
            signature: None,
            amount: None,
        }
    }

    pub fn with_owner(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.state = Some(state.to_string());
        self
    }

    pub fn with_signature(mut self, signature: &str) -> Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }
}

fn audit_log_path() -> PathBuf {
    std::env::var_os("PASSPAY_AUDIT_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("passpay_audit.jsonl"))
}

pub fn write_audit_event(event: &AuditEvent) -> Result<()> {
    let path = audit_log_path();
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

    let json = serde_json::to_string(event)?;
    writeln!(file, "{}", json)?;
    tracing::debug!(event_type = %event.event_type, record_id = %event.record_id, "audit event written");
    Ok(())
}
