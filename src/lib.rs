//! Trailhead: learner progress for sequential security curricula.
//!
//! A curriculum is an ordered list of modules. Each module holds rooms (lessons) and one
//! capstone CTF. A learner's progress record stores completion flags only; everything a
//! student sees (per-module status, percentages, headline metrics) is derived from the
//! curriculum and the record on every read.
//!
//! # Architecture
//!
//! - [`core::engine`] is the pure derivation: stats, gated statuses, aggregate.
//! - [`core::views`] reshapes a derived view into the learning path, module list, and
//!   snapshot payloads.
//! - [`plugins`] hold the stores (catalog, progress, quiz) and the read handlers.
//!   All database access goes through [`core::broker::DbBroker`], which serializes
//!   operations and appends to `broker.events.jsonl`.
//!
//! # Gating
//!
//! The first incomplete module in curriculum order is the gate. Complete modules are
//! `done` wherever they sit, the gate is `in-progress` once any unit counts, and every
//! other incomplete module is `next`, even if the learner has partial progress there.

pub mod core;
pub mod plugins;

mod cli;

use crate::cli::{Cli, Command, SchemaCli};
use crate::core::broker::DbBroker;
use crate::core::config::Config;
use crate::core::error::TrailheadError;
use crate::core::store::Store;
use crate::plugins::{catalog, progress, quiz, student};

use clap::Parser;
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` wins over the configured filter.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("trailhead=info"));
    // A subscriber may already be set (tests, embedding); keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn all_schemas() -> BTreeMap<&'static str, serde_json::Value> {
    let mut schemas = BTreeMap::new();
    schemas.insert("catalog", catalog::schema());
    schemas.insert("progress", progress::schema());
    schemas.insert("student", student::schema());
    schemas.insert("quiz", quiz::schema());
    schemas
}

fn run_schema(schema_cli: SchemaCli) -> Result<(), TrailheadError> {
    let schemas = all_schemas();
    let output = match schema_cli.subsystem {
        Some(sub) => schemas
            .get(sub.as_str())
            .cloned()
            .ok_or_else(|| TrailheadError::NotFound(format!("subsystem '{}'", sub)))?,
        None => serde_json::json!({
            "schema_version": "1.0.0",
            "subsystems": schemas,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_audit(store: &Store) -> Result<(), TrailheadError> {
    let broker = DbBroker::new(store.root());
    for event in broker.read_events()? {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

pub fn run() -> Result<(), TrailheadError> {
    let cli = Cli::parse();

    if let Command::Version = cli.command {
        println!("v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let current_dir = std::env::current_dir()?;
    let config = Config::load_from_dir(&current_dir)?;
    init_logging(&config);

    let store_root = cli.store.clone().unwrap_or_else(|| config.store_dir.clone());
    let store = Store::open(store_root)?;
    tracing::debug!(store = %store.root().display(), "store opened");

    match cli.command {
        Command::Catalog(catalog_cli) => catalog::run_catalog_cli(&store, &config, catalog_cli),
        Command::Progress(progress_cli) => {
            let curriculum = catalog::get_curriculum(&store, &config)?;
            progress::run_progress_cli(&store, &curriculum, progress_cli)
        }
        Command::Student(student_cli) => student::run_student_cli(&store, &config, student_cli),
        Command::Quiz(quiz_cli) => quiz::run_quiz_cli(&store, quiz_cli),
        Command::Schema(schema_cli) => run_schema(schema_cli),
        Command::Audit => run_audit(&store),
        Command::Version => Ok(()),
    }
}
