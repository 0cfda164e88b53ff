//! CLI struct definitions for the trailhead command-line interface.
//!
//! All clap-derived top-level types live here. Dispatch lives in `lib.rs`.

use crate::plugins::{catalog, progress, quiz, student};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "trailhead",
    version = env!("CARGO_PKG_VERSION"),
    about = "Learner progress for sequential security curricula: gated module status, completion percentages, and headline metrics."
)]
pub(crate) struct Cli {
    /// Store directory (overrides `store_dir` from trailhead.toml).
    #[clap(long, global = true)]
    pub store: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub(crate) struct SchemaCli {
    /// Optional: filter by subsystem name
    #[clap(long)]
    pub subsystem: Option<String>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Curriculum catalog
    Catalog(catalog::CatalogCli),

    /// Learner progress records
    Progress(progress::ProgressCli),

    /// Derived learner views
    Student(student::StudentCli),

    /// Room and module quizzes
    Quiz(quiz::QuizCli),

    /// Print subsystem schemas as JSON
    Schema(SchemaCli),

    /// Show the store's mutation audit log
    Audit,

    /// Print version
    Version,
}
