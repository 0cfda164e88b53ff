use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrailheadError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Invalid curriculum: {0}")]
    CurriculumError(#[from] CurriculumError),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Structural defects found while loading a curriculum.
///
/// These are catalog preconditions; the progress engine assumes none of them hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurriculumDefect {
    #[error("duplicate module id '{0}'")]
    DuplicateModule(String),
    #[error("duplicate room id '{room}' in module '{module}'")]
    DuplicateRoom { module: String, room: String },
    #[error("malformed id '{0}' (expected lowercase letters, digits, '-' or '_')")]
    MalformedId(String),
    #[error("module '{0}' has an empty title")]
    EmptyModuleTitle(String),
    #[error("room '{room}' in module '{module}' has an empty title")]
    EmptyRoomTitle { module: String, room: String },
    #[error("module '{0}' has no CTF name")]
    MissingCtf(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} defect(s): {}", .defects.len(), render_defects(.defects))]
pub struct CurriculumError {
    pub defects: Vec<CurriculumDefect>,
}

fn render_defects(defects: &[CurriculumDefect]) -> String {
    defects
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
