//! Student read surfaces: overview, learning path, module list, snapshot.
//!
//! Each read fetches the curriculum and the learner's record, runs the engine, and
//! reshapes the derived view. Nothing derived is stored.

use crate::core::config::Config;
use crate::core::curriculum::Curriculum;
use crate::core::engine::{self, DerivedView, ModuleStatus};
use crate::core::error::TrailheadError;
use crate::core::record::ProgressRecord;
use crate::core::store::Store;
use crate::core::time::Envelope;
use crate::core::views::{self, LearningPathEntry, ModuleListEntry, SnapshotMetric, StudentOverview};
use crate::plugins::{catalog, progress};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

/// Catalog and learner record fetched for one read.
pub struct ReadContext {
    pub curriculum: Curriculum,
    pub record: ProgressRecord,
}

pub fn read_context(store: &Store, config: &Config, learner_id: &str) -> Result<ReadContext, TrailheadError> {
    let curriculum = catalog::get_curriculum(store, config)?;
    let record = progress::load_or_init(store, learner_id)?.record;

    let foreign = record.foreign_ids(&curriculum);
    if !foreign.is_empty() {
        tracing::debug!(learner = learner_id, ignored = foreign.len(), "ignoring unknown ids in progress record");
    }
    Ok(ReadContext { curriculum, record })
}

pub fn derived_view(store: &Store, config: &Config, learner_id: &str) -> Result<DerivedView, TrailheadError> {
    let ctx = read_context(store, config, learner_id)?;
    Ok(engine::overview(&ctx.curriculum, &ctx.record))
}

pub fn student_overview(store: &Store, config: &Config, learner_id: &str) -> Result<StudentOverview, TrailheadError> {
    Ok(views::student_overview(&derived_view(store, config, learner_id)?))
}

pub fn learning_path(store: &Store, config: &Config, learner_id: &str) -> Result<Vec<LearningPathEntry>, TrailheadError> {
    Ok(views::learning_path(&derived_view(store, config, learner_id)?))
}

pub fn module_list(store: &Store, config: &Config, learner_id: &str) -> Result<Vec<ModuleListEntry>, TrailheadError> {
    Ok(views::module_list(&derived_view(store, config, learner_id)?))
}

pub fn snapshot(store: &Store, config: &Config, learner_id: &str) -> Result<Vec<SnapshotMetric>, TrailheadError> {
    Ok(views::snapshot(&derived_view(store, config, learner_id)?))
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(name = "student", about = "Derived progress views for a learner")]
pub struct StudentCli {
    /// Learner whose progress is read.
    #[clap(long, global = true)]
    pub learner: Option<String>,
    /// Output format for this command group.
    #[clap(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
    #[clap(subcommand)]
    pub command: StudentCommand,
}

#[derive(Subcommand, Debug)]
pub enum StudentCommand {
    /// Learning path, module list, and snapshot together.
    Overview,
    /// One entry per module with its gated status.
    LearningPath,
    /// Per-module room and CTF detail.
    Modules,
    /// Headline metrics.
    Snapshot,
}

fn status_label(status: ModuleStatus) -> String {
    match status {
        ModuleStatus::Done => status.as_str().green().to_string(),
        ModuleStatus::InProgress => status.as_str().yellow().bold().to_string(),
        ModuleStatus::Next => status.as_str().dimmed().to_string(),
    }
}

fn print_learning_path(entries: &[LearningPathEntry]) {
    for entry in entries {
        println!(
            "{:<24} {:<12} {:>3}%  rooms {}/{}",
            entry.title,
            status_label(entry.status),
            entry.progress,
            entry.rooms_completed,
            entry.rooms_total
        );
    }
}

fn print_modules(entries: &[ModuleListEntry]) {
    for entry in entries {
        let ctf = if entry.ctf.completed {
            "captured".green().to_string()
        } else {
            "open".dimmed().to_string()
        };
        println!(
            "{} [{}] {:>3}%  rooms {}/{}  CTF {} ({})",
            entry.title.bold(),
            entry.badge,
            entry.progress,
            entry.rooms_completed,
            entry.rooms_total,
            entry.ctf.name,
            ctf
        );
    }
}

fn print_snapshot(metrics: &[SnapshotMetric]) {
    for metric in metrics {
        println!("{:<20} {}", metric.label, metric.value.bold());
    }
}

pub fn run_student_cli(store: &Store, config: &Config, cli: StudentCli) -> Result<(), TrailheadError> {
    let learner = cli
        .learner
        .ok_or_else(|| TrailheadError::ValidationError("--learner is required".to_string()))?;
    let view = derived_view(store, config, &learner)?;

    if cli.format == OutputFormat::Json {
        let (cmd, payload) = match cli.command {
            StudentCommand::Overview => (
                "student.overview",
                serde_json::to_value(views::student_overview(&view))?,
            ),
            StudentCommand::LearningPath => (
                "student.learning_path",
                serde_json::to_value(views::learning_path(&view))?,
            ),
            StudentCommand::Modules => (
                "student.modules",
                serde_json::to_value(views::module_list(&view))?,
            ),
            StudentCommand::Snapshot => (
                "student.snapshot",
                serde_json::to_value(views::snapshot(&view))?,
            ),
        };
        let envelope = Envelope::ok(cmd, &learner, payload);
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    match cli.command {
        StudentCommand::LearningPath => print_learning_path(&views::learning_path(&view)),
        StudentCommand::Modules => print_modules(&views::module_list(&view)),
        StudentCommand::Snapshot => print_snapshot(&views::snapshot(&view)),
        StudentCommand::Overview => {
            println!("{}", "Learning path".bold());
            print_learning_path(&views::learning_path(&view));
            println!();
            println!("{}", "Modules".bold());
            print_modules(&views::module_list(&view));
            println!();
            println!("{}", "Snapshot".bold());
            print_snapshot(&views::snapshot(&view));
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "student",
        "version": "0.1.0",
        "description": "Derived learner views (recomputed on every read)",
        "commands": [
            { "name": "overview", "parameters": ["learner", "format"] },
            { "name": "learning-path", "parameters": ["learner", "format"] },
            { "name": "modules", "parameters": ["learner", "format"] },
            { "name": "snapshot", "parameters": ["learner", "format"] }
        ],
        "storage": []
    })
}
