//! Curriculum catalog store.
//!
//! Holds the single active curriculum. An empty catalog is seeded on first access from
//! the configured curriculum file, or from the built-in curriculum when none is set.
//! Every curriculum is validated before it is stored and again when it is loaded, so
//! the engine only ever sees structurally sound input.

use crate::core::assets;
use crate::core::broker::DbBroker;
use crate::core::config::Config;
use crate::core::curriculum::Curriculum;
use crate::core::db;
use crate::core::error::TrailheadError;
use crate::core::schemas;
use crate::core::store::Store;
use crate::core::time;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rusqlite::{OptionalExtension, params};
use std::fs;
use std::path::{Path, PathBuf};

pub fn catalog_db_path(root: &Path) -> PathBuf {
    root.join(schemas::CATALOG_DB_NAME)
}

pub fn initialize_catalog_db(root: &Path) -> Result<(), TrailheadError> {
    let broker = DbBroker::new(root);
    broker.with_conn(&catalog_db_path(root), "trailhead", "catalog.init", |conn| {
        db::apply_schema(conn, &[schemas::CATALOG_DB_SCHEMA])
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurriculumFormat {
    Toml,
    Json,
}

impl CurriculumFormat {
    /// `.json` files are JSON; everything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => CurriculumFormat::Json,
            _ => CurriculumFormat::Toml,
        }
    }
}

/// Parse and validate a curriculum document.
pub fn parse_curriculum(text: &str, format: CurriculumFormat) -> Result<Curriculum, TrailheadError> {
    let curriculum: Curriculum = match format {
        CurriculumFormat::Toml => toml::from_str(text)?,
        CurriculumFormat::Json => serde_json::from_str(text)?,
    };
    curriculum.validate()?;
    Ok(curriculum)
}

pub fn read_curriculum_file(path: &Path) -> Result<Curriculum, TrailheadError> {
    let text = fs::read_to_string(path)?;
    parse_curriculum(&text, CurriculumFormat::from_path(path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub curriculum: Curriculum,
    pub fingerprint: String,
    pub source: String,
    pub loaded_at: String,
}

fn load_entry(store: &Store) -> Result<Option<CatalogEntry>, TrailheadError> {
    let broker = DbBroker::new(&store.root);
    let row = broker.with_conn(
        &catalog_db_path(&store.root),
        "trailhead",
        "catalog.get",
        |conn| {
            Ok(conn
                .query_row(
                    "SELECT body, fingerprint, source, loaded_at FROM curriculum WHERE id = 1",
                    [],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?)
        },
    )?;

    let Some((body, fingerprint, source, loaded_at)) = row else {
        return Ok(None);
    };
    let curriculum: Curriculum = serde_json::from_str(&body)?;
    curriculum.validate()?;
    Ok(Some(CatalogEntry {
        curriculum,
        fingerprint,
        source,
        loaded_at,
    }))
}

fn store_curriculum(store: &Store, curriculum: &Curriculum, source: &str) -> Result<String, TrailheadError> {
    curriculum.validate()?;
    let body = serde_json::to_string(curriculum)?;
    let fingerprint = curriculum.fingerprint();
    let broker = DbBroker::new(&store.root);

    broker.with_conn(
        &catalog_db_path(&store.root),
        "trailhead",
        "catalog.put",
        |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO curriculum(id, body, fingerprint, source, loaded_at)
                 VALUES(1, ?1, ?2, ?3, ?4)",
                params![body, fingerprint, source, time::now_epoch_z()],
            )?;
            Ok(())
        },
    )?;
    Ok(fingerprint)
}

/// Return the active catalog entry, seeding the catalog on first access.
pub fn get_catalog_entry(store: &Store, config: &Config) -> Result<CatalogEntry, TrailheadError> {
    initialize_catalog_db(&store.root)?;
    if let Some(entry) = load_entry(store)? {
        return Ok(entry);
    }

    let (curriculum, source) = match &config.curriculum_path {
        Some(path) => (read_curriculum_file(path)?, path.display().to_string()),
        None => (assets::default_curriculum()?, "builtin".to_string()),
    };
    store_curriculum(store, &curriculum, &source)?;
    tracing::info!(
        source = %source,
        modules = curriculum.modules.len(),
        "seeded empty curriculum catalog"
    );

    load_entry(store)?.ok_or_else(|| TrailheadError::NotFound("curriculum after seeding".to_string()))
}

/// The active curriculum. Identical across calls until an import replaces it.
pub fn get_curriculum(store: &Store, config: &Config) -> Result<Curriculum, TrailheadError> {
    Ok(get_catalog_entry(store, config)?.curriculum)
}

/// Replace the active curriculum. Learner records are left as they are; entries that no
/// longer match the new curriculum are ignored on read.
pub fn import_curriculum(store: &Store, curriculum: &Curriculum, source: &str) -> Result<String, TrailheadError> {
    initialize_catalog_db(&store.root)?;
    let fingerprint = store_curriculum(store, curriculum, source)?;
    tracing::info!(source, fingerprint = %fingerprint, "curriculum imported");
    Ok(fingerprint)
}

#[derive(Parser, Debug)]
#[clap(name = "catalog", about = "Inspect and manage the curriculum catalog")]
pub struct CatalogCli {
    #[clap(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// Print the active curriculum.
    Show {
        /// Emit JSON instead of text.
        #[clap(long)]
        json: bool,
    },
    /// Validate a curriculum file without importing it.
    Validate {
        #[clap(long)]
        file: PathBuf,
    },
    /// Validate and import a curriculum file, replacing the active one.
    Import {
        #[clap(long)]
        file: PathBuf,
    },
    /// Print the fingerprint of the active curriculum.
    Fingerprint,
}

pub fn run_catalog_cli(store: &Store, config: &Config, cli: CatalogCli) -> Result<(), TrailheadError> {
    match cli.command {
        CatalogCommand::Show { json } => {
            let entry = get_catalog_entry(store, config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entry.curriculum)?);
            } else {
                println!(
                    "{} ({}, {})",
                    "Curriculum".bold(),
                    entry.source,
                    entry.fingerprint.get(..12).unwrap_or(&entry.fingerprint)
                );
                for (i, module) in entry.curriculum.modules.iter().enumerate() {
                    println!("{:>2}. {} [{}]", i + 1, module.title.bold(), module.id);
                    for room in &module.rooms {
                        println!("      - {} [{}]", room.title, room.id);
                    }
                    println!("      * CTF: {}", module.ctf_name.yellow());
                }
            }
        }
        CatalogCommand::Validate { file } => {
            let curriculum = read_curriculum_file(&file)?;
            println!(
                "{} {} modules, {} rooms",
                "valid:".green(),
                curriculum.modules.len(),
                curriculum.total_rooms()
            );
        }
        CatalogCommand::Import { file } => {
            let curriculum = read_curriculum_file(&file)?;
            let fingerprint = import_curriculum(store, &curriculum, &file.display().to_string())?;
            println!("Curriculum imported: {}", fingerprint);
        }
        CatalogCommand::Fingerprint => {
            println!("{}", get_catalog_entry(store, config)?.fingerprint);
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "catalog",
        "version": "0.1.0",
        "description": "Active curriculum (modules, rooms, capstone CTFs)",
        "commands": [
            { "name": "show", "parameters": ["json"] },
            { "name": "validate", "parameters": ["file"] },
            { "name": "import", "parameters": ["file"] },
            { "name": "fingerprint" }
        ],
        "storage": [schemas::CATALOG_DB_NAME]
    })
}
