//! Learner progress record store.
//!
//! One JSON document per learner. Reads are lenient: a missing row is the empty record
//! and a stored document of any shape parses without error.
//!
//! There is exactly one write path, [`apply_patch`]. It merges the flags named by a
//! [`ProgressPatch`] into the stored document inside an immediate transaction and bumps
//! the record's revision. Nothing outside the patch is touched, so concurrent writers
//! never erase each other's unrelated entries.

use crate::core::broker::DbBroker;
use crate::core::curriculum::Curriculum;
use crate::core::db;
use crate::core::error::TrailheadError;
use crate::core::record::{ProgressPatch, ProgressRecord};
use crate::core::schemas;
use crate::core::store::Store;
use crate::core::time;
use clap::{Parser, Subcommand};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub fn progress_db_path(root: &Path) -> PathBuf {
    root.join(schemas::PROGRESS_DB_NAME)
}

pub fn initialize_progress_db(root: &Path) -> Result<(), TrailheadError> {
    let broker = DbBroker::new(root);
    broker.with_conn(&progress_db_path(root), "trailhead", "progress.init", |conn| {
        db::apply_schema(conn, &[schemas::PROGRESS_DB_SCHEMA])
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub learner_id: String,
    pub record: ProgressRecord,
    /// Incremented on every write; pairs with the curriculum fingerprint as a cache key.
    pub revision: i64,
    pub updated_at: String,
}

fn validate_learner_id(learner_id: &str) -> Result<(), TrailheadError> {
    if learner_id.trim().is_empty() {
        return Err(TrailheadError::ValidationError(
            "learner id must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn select_record(conn: &Connection, learner_id: &str) -> Result<Option<StoredRecord>, TrailheadError> {
    let row = conn
        .query_row(
            "SELECT body, revision, updated_at FROM progress_records WHERE learner_id = ?1",
            params![learner_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    Ok(row.map(|(body, revision, updated_at)| StoredRecord {
        learner_id: learner_id.to_string(),
        record: ProgressRecord::parse_lenient(&body),
        revision,
        updated_at,
    }))
}

pub fn get_stored_record(store: &Store, learner_id: &str) -> Result<Option<StoredRecord>, TrailheadError> {
    validate_learner_id(learner_id)?;
    initialize_progress_db(&store.root)?;
    let broker = DbBroker::new(&store.root);
    broker.with_conn(
        &progress_db_path(&store.root),
        learner_id,
        "progress.get",
        |conn| select_record(conn, learner_id),
    )
}

/// The learner's record, or `None` if nothing has been stored yet. Callers treat `None`
/// exactly like [`ProgressRecord::empty`].
pub fn get_progress_record(store: &Store, learner_id: &str) -> Result<Option<ProgressRecord>, TrailheadError> {
    Ok(get_stored_record(store, learner_id)?.map(|s| s.record))
}

/// Fetch the learner's record, creating an empty one on first read.
pub fn load_or_init(store: &Store, learner_id: &str) -> Result<StoredRecord, TrailheadError> {
    validate_learner_id(learner_id)?;
    initialize_progress_db(&store.root)?;
    let broker = DbBroker::new(&store.root);
    broker.with_conn(
        &progress_db_path(&store.root),
        learner_id,
        "progress.load_or_init",
        |conn| {
            let created = conn.execute(
                "INSERT OR IGNORE INTO progress_records(learner_id, body, revision, updated_at)
                 VALUES(?1, ?2, 0, ?3)",
                params![
                    learner_id,
                    serde_json::to_string(&ProgressRecord::empty())?,
                    time::now_epoch_z()
                ],
            )?;
            if created > 0 {
                tracing::debug!(learner = learner_id, "created empty progress record");
            }
            select_record(conn, learner_id)?
                .ok_or_else(|| TrailheadError::NotFound(format!("progress record '{}'", learner_id)))
        },
    )
}

/// Merge `patch` into the learner's stored record.
///
/// Marks must name modules and rooms that exist in `curriculum`. The read-modify-write
/// runs under `BEGIN IMMEDIATE`, so two writers for the same learner are serialized and
/// both sets of marks survive.
pub fn apply_patch(
    store: &Store,
    curriculum: &Curriculum,
    learner_id: &str,
    patch: &ProgressPatch,
) -> Result<StoredRecord, TrailheadError> {
    validate_learner_id(learner_id)?;
    patch.check(curriculum)?;
    initialize_progress_db(&store.root)?;

    let broker = DbBroker::new(&store.root);
    let stored = broker.with_conn(
        &progress_db_path(&store.root),
        learner_id,
        "progress.merge",
        |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current = select_record(&tx, learner_id)?;
            let (mut record, revision) = match current {
                Some(s) => (s.record, s.revision),
                None => (ProgressRecord::empty(), 0),
            };
            record.apply(patch);

            let next_revision = revision + 1;
            let now = time::now_epoch_z();
            tx.execute(
                "INSERT INTO progress_records(learner_id, body, revision, updated_at)
                 VALUES(?1, ?2, ?3, ?4)
                 ON CONFLICT(learner_id) DO UPDATE SET
                    body = excluded.body,
                    revision = excluded.revision,
                    updated_at = excluded.updated_at",
                params![learner_id, serde_json::to_string(&record)?, next_revision, now],
            )?;
            tx.commit()?;

            Ok(StoredRecord {
                learner_id: learner_id.to_string(),
                record,
                revision: next_revision,
                updated_at: now,
            })
        },
    )?;

    tracing::info!(
        learner = learner_id,
        marks = patch.marks.len(),
        revision = stored.revision,
        "progress merged"
    );
    Ok(stored)
}

#[derive(Parser, Debug)]
#[clap(name = "progress", about = "Read and update learner progress records")]
pub struct ProgressCli {
    #[clap(subcommand)]
    pub command: ProgressCommand,
}

#[derive(Subcommand, Debug)]
pub enum ProgressCommand {
    /// Print a learner's stored progress document.
    Show {
        #[clap(long)]
        learner: String,
    },
    /// Mark a room or a module's CTF as completed (or not, with --undo).
    Mark {
        #[clap(long)]
        learner: String,
        #[clap(long)]
        module: String,
        /// Room id within the module.
        #[clap(long, conflicts_with = "ctf", required_unless_present = "ctf")]
        room: Option<String>,
        /// Target the module's capstone CTF instead of a room.
        #[clap(long)]
        ctf: bool,
        /// Clear the flag instead of setting it.
        #[clap(long)]
        undo: bool,
    },
}

pub fn run_progress_cli(store: &Store, curriculum: &Curriculum, cli: ProgressCli) -> Result<(), TrailheadError> {
    match cli.command {
        ProgressCommand::Show { learner } => {
            let stored = load_or_init(store, &learner)?;
            let foreign = stored.record.foreign_ids(curriculum);
            if !foreign.is_empty() {
                tracing::debug!(learner = %learner, ?foreign, "record references unknown ids");
            }
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
        ProgressCommand::Mark {
            learner,
            module,
            room,
            ctf,
            undo,
        } => {
            let completed = !undo;
            let patch = match (room, ctf) {
                (Some(room), false) => ProgressPatch::new().room(&module, &room, completed),
                _ => ProgressPatch::new().ctf(&module, completed),
            };
            let stored = apply_patch(store, curriculum, &learner, &patch)?;
            println!("Progress updated: {} (revision {})", learner, stored.revision);
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "progress",
        "version": "0.1.0",
        "description": "Per-learner completion records (merge-only writes)",
        "commands": [
            { "name": "show", "parameters": ["learner"] },
            { "name": "mark", "parameters": ["learner", "module", "room", "ctf", "undo"] }
        ],
        "storage": [schemas::PROGRESS_DB_NAME]
    })
}
