//! Database schema definitions.
//!
//! trailhead keeps three SQLite databases in the store root:
//! 1. catalog.db: the active curriculum (single row).
//! 2. progress.db: one progress document per learner.
//! 3. quiz.db: quizzes by scope and graded submissions.

// --- 1. Catalog ---
pub const CATALOG_DB_NAME: &str = "catalog.db";

pub const CATALOG_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS curriculum (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        body TEXT NOT NULL,
        fingerprint TEXT NOT NULL,
        source TEXT NOT NULL,
        loaded_at TEXT NOT NULL
    )
";

// --- 2. Progress ---
pub const PROGRESS_DB_NAME: &str = "progress.db";

pub const PROGRESS_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS progress_records (
        learner_id TEXT PRIMARY KEY,
        body TEXT NOT NULL,
        revision INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL
    )
";

// --- 3. Quiz ---
pub const QUIZ_DB_NAME: &str = "quiz.db";

pub const QUIZ_DB_SCHEMA_QUIZZES: &str = "
    CREATE TABLE IF NOT EXISTS quizzes (
        scope_type TEXT NOT NULL,
        scope_id TEXT NOT NULL,
        course_id TEXT NOT NULL DEFAULT '',
        questions TEXT NOT NULL, -- JSON array
        updated_at TEXT NOT NULL,
        PRIMARY KEY (scope_type, scope_id, course_id)
    )
";

pub const QUIZ_DB_SCHEMA_SUBMISSIONS: &str = "
    CREATE TABLE IF NOT EXISTS quiz_submissions (
        id TEXT PRIMARY KEY,
        learner_id TEXT NOT NULL,
        scope_type TEXT NOT NULL,
        scope_id TEXT NOT NULL,
        course_id TEXT NOT NULL DEFAULT '',
        score INTEGER NOT NULL,
        total INTEGER NOT NULL,
        correct INTEGER NOT NULL,
        passed INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
";

pub const QUIZ_DB_SCHEMA_SUBMISSIONS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_quiz_submissions_learner ON quiz_submissions(learner_id, created_at)";
