use crate::core::db;
use crate::core::error::TrailheadError;
use crate::core::time;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Single entry point for database access.
///
/// Every operation gets a fresh connection, runs under an in-process lock, and is
/// recorded to the append-only audit log `broker.events.jsonl`.
pub struct DbBroker {
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub actor: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
}

pub const AUDIT_LOG_NAME: &str = "broker.events.jsonl";

impl DbBroker {
    pub fn new(root: &Path) -> Self {
        Self {
            audit_log_path: root.join(AUDIT_LOG_NAME),
        }
    }

    /// Execute a closure with a serialized connection to the specified DB.
    pub fn with_conn<F, R>(
        &self,
        db_path: &Path,
        actor: &str,
        op_name: &str,
        f: F,
    ) -> Result<R, TrailheadError>
    where
        F: FnOnce(&mut Connection) -> Result<R, TrailheadError>,
    {
        static DB_LOCK: Mutex<()> = Mutex::new(());
        let _lock = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let db_id = db_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let mut conn = db::db_connect(db_path)?;

        let result = f(&mut conn);

        let status = match &result {
            Ok(_) => "success",
            Err(e) => {
                tracing::warn!(op = op_name, db = %db_id, error = %e, "broker operation failed");
                "error"
            }
        };
        self.log_event(actor, op_name, &db_id, status)?;

        result
    }

    fn log_event(&self, actor: &str, op: &str, db_id: &str, status: &str) -> Result<(), TrailheadError> {
        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            actor: actor.to_string(),
            op: op.to_string(),
            db_id: db_id.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)?;

        writeln!(f, "{}", serde_json::to_string(&ev)?)?;
        Ok(())
    }

    /// Read back the audit log, skipping lines that fail to parse.
    pub fn read_events(&self) -> Result<Vec<BrokerEvent>, TrailheadError> {
        if !self.audit_log_path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.audit_log_path)?;
        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}
