//! Quizzes attached to rooms or modules, graded against a fixed pass mark.
//!
//! Grading is pure. Submissions are recorded for history only; a passed quiz does not
//! mark anything complete in the learner's progress record.

use crate::core::broker::DbBroker;
use crate::core::db;
use crate::core::error::TrailheadError;
use crate::core::engine::percent;
use crate::core::schemas;
use crate::core::store::Store;
use crate::core::time;
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::{OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Minimum score (percent) for a submission to pass.
pub const PASS_THRESHOLD_PERCENT: u32 = 70;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    Room,
    Module,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Room => "room",
            ScopeType::Module => "module",
        }
    }

    fn parse(raw: &str) -> Result<Self, TrailheadError> {
        match raw {
            "room" => Ok(ScopeType::Room),
            "module" => Ok(ScopeType::Module),
            other => Err(TrailheadError::ValidationError(format!(
                "unknown quiz scope type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizScope {
    #[serde(rename = "type")]
    pub scope_type: ScopeType,
    pub id: String,
    #[serde(default)]
    pub course_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub scope: QuizScope,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn validate(&self) -> Result<(), TrailheadError> {
        if self.scope.id.trim().is_empty() {
            return Err(TrailheadError::ValidationError("quiz scope id is empty".to_string()));
        }
        let mut seen = rustc_hash::FxHashSet::default();
        for q in &self.questions {
            if !seen.insert(q.id.as_str()) {
                return Err(TrailheadError::ValidationError(format!(
                    "duplicate question id '{}'",
                    q.id
                )));
            }
            if q.correct_index >= q.options.len() {
                return Err(TrailheadError::ValidationError(format!(
                    "question '{}' has correctIndex {} but {} option(s)",
                    q.id,
                    q.correct_index,
                    q.options.len()
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub score: u32,
    pub total: usize,
    pub correct: usize,
    pub passed: bool,
}

/// Grade `answers` (question id → chosen option index). Unanswered questions and answers
/// to unknown questions count as wrong and are ignored respectively.
pub fn grade_quiz(quiz: &Quiz, answers: &BTreeMap<String, usize>) -> Grade {
    let total = quiz.questions.len();
    let correct = quiz
        .questions
        .iter()
        .filter(|q| answers.get(&q.id) == Some(&q.correct_index))
        .count();
    let score = percent(correct, total);
    Grade {
        score,
        total,
        correct,
        passed: score >= PASS_THRESHOLD_PERCENT,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub id: String,
    pub learner_id: String,
    pub scope: QuizScope,
    #[serde(flatten)]
    pub grade: Grade,
    pub created_at: String,
}

pub fn quiz_db_path(root: &Path) -> PathBuf {
    root.join(schemas::QUIZ_DB_NAME)
}

pub fn initialize_quiz_db(root: &Path) -> Result<(), TrailheadError> {
    let broker = DbBroker::new(root);
    broker.with_conn(&quiz_db_path(root), "trailhead", "quiz.init", |conn| {
        db::apply_schema(
            conn,
            &[
                schemas::QUIZ_DB_SCHEMA_QUIZZES,
                schemas::QUIZ_DB_SCHEMA_SUBMISSIONS,
                schemas::QUIZ_DB_SCHEMA_SUBMISSIONS_INDEX,
            ],
        )
    })
}

/// Store `quiz`, replacing any quiz with the same scope.
pub fn put_quiz(store: &Store, quiz: &Quiz) -> Result<(), TrailheadError> {
    quiz.validate()?;
    initialize_quiz_db(&store.root)?;
    let questions = serde_json::to_string(&quiz.questions)?;
    let broker = DbBroker::new(&store.root);
    broker.with_conn(&quiz_db_path(&store.root), "trailhead", "quiz.put", |conn| {
        conn.execute(
            "INSERT OR REPLACE INTO quizzes(scope_type, scope_id, course_id, questions, updated_at)
             VALUES(?1, ?2, ?3, ?4, ?5)",
            params![
                quiz.scope.scope_type.as_str(),
                quiz.scope.id,
                quiz.scope.course_id,
                questions,
                time::now_epoch_z()
            ],
        )?;
        Ok(())
    })
}

pub fn get_quiz(store: &Store, scope: &QuizScope) -> Result<Option<Quiz>, TrailheadError> {
    initialize_quiz_db(&store.root)?;
    let broker = DbBroker::new(&store.root);
    let questions = broker.with_conn(&quiz_db_path(&store.root), "trailhead", "quiz.get", |conn| {
        Ok(conn
            .query_row(
                "SELECT questions FROM quizzes WHERE scope_type = ?1 AND scope_id = ?2 AND course_id = ?3",
                params![scope.scope_type.as_str(), scope.id, scope.course_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    })?;

    match questions {
        Some(raw) => Ok(Some(Quiz {
            scope: scope.clone(),
            questions: serde_json::from_str(&raw)?,
        })),
        None => Ok(None),
    }
}

/// Grade and record a learner's answers for the quiz at `scope`.
pub fn submit_quiz(
    store: &Store,
    learner_id: &str,
    scope: &QuizScope,
    answers: &BTreeMap<String, usize>,
) -> Result<QuizSubmission, TrailheadError> {
    let quiz = get_quiz(store, scope)?.ok_or_else(|| {
        TrailheadError::NotFound(format!("quiz for {} '{}'", scope.scope_type.as_str(), scope.id))
    })?;
    let grade = grade_quiz(&quiz, answers);
    let submission = QuizSubmission {
        id: time::new_event_id(),
        learner_id: learner_id.to_string(),
        scope: scope.clone(),
        grade,
        created_at: time::now_epoch_z(),
    };

    let broker = DbBroker::new(&store.root);
    broker.with_conn(&quiz_db_path(&store.root), learner_id, "quiz.submit", |conn| {
        conn.execute(
            "INSERT INTO quiz_submissions(id, learner_id, scope_type, scope_id, course_id, score, total, correct, passed, created_at)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                submission.id,
                submission.learner_id,
                scope.scope_type.as_str(),
                scope.id,
                scope.course_id,
                grade.score,
                grade.total as i64,
                grade.correct as i64,
                grade.passed,
                submission.created_at
            ],
        )?;
        Ok(())
    })?;

    tracing::info!(
        learner = learner_id,
        scope = %scope.id,
        score = grade.score,
        passed = grade.passed,
        "quiz submitted"
    );
    Ok(submission)
}

/// A learner's submissions, newest first.
pub fn list_submissions(store: &Store, learner_id: &str) -> Result<Vec<QuizSubmission>, TrailheadError> {
    initialize_quiz_db(&store.root)?;
    let broker = DbBroker::new(&store.root);
    broker.with_conn(&quiz_db_path(&store.root), learner_id, "quiz.list", |conn| {
        let mut stmt = conn.prepare(
            "SELECT id, scope_type, scope_id, course_id, score, total, correct, passed, created_at
             FROM quiz_submissions WHERE learner_id = ?1 ORDER BY rowid DESC",
        )?;
        let rows = stmt.query_map(params![learner_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, bool>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?;

        let mut out = Vec::new();
        for r in rows {
            let (id, scope_type, scope_id, course_id, score, total, correct, passed, created_at) = r?;
            out.push(QuizSubmission {
                id,
                learner_id: learner_id.to_string(),
                scope: QuizScope {
                    scope_type: ScopeType::parse(&scope_type)?,
                    id: scope_id,
                    course_id,
                },
                grade: Grade {
                    score,
                    total: total.max(0) as usize,
                    correct: correct.max(0) as usize,
                    passed,
                },
                created_at,
            });
        }
        Ok(out)
    })
}

#[derive(Parser, Debug)]
#[clap(name = "quiz", about = "Room and module quizzes")]
pub struct QuizCli {
    #[clap(subcommand)]
    pub command: QuizCommand,
}

#[derive(Subcommand, Debug)]
pub enum QuizCommand {
    /// Add or replace a quiz from a JSON file.
    Add {
        #[clap(long)]
        file: PathBuf,
    },
    /// Grade and record a learner's answers.
    Submit {
        #[clap(long)]
        learner: String,
        #[clap(long, value_enum)]
        scope_type: ScopeType,
        #[clap(long)]
        scope_id: String,
        #[clap(long, default_value = "")]
        course_id: String,
        /// JSON object mapping question id to chosen option index.
        #[clap(long)]
        answers: String,
    },
    /// List a learner's submissions, newest first.
    History {
        #[clap(long)]
        learner: String,
    },
}

pub fn run_quiz_cli(store: &Store, cli: QuizCli) -> Result<(), TrailheadError> {
    match cli.command {
        QuizCommand::Add { file } => {
            let quiz: Quiz = serde_json::from_str(&fs::read_to_string(&file)?)?;
            put_quiz(store, &quiz)?;
            println!(
                "Quiz stored for {} '{}' ({} questions)",
                quiz.scope.scope_type.as_str(),
                quiz.scope.id,
                quiz.questions.len()
            );
        }
        QuizCommand::Submit {
            learner,
            scope_type,
            scope_id,
            course_id,
            answers,
        } => {
            let answers: BTreeMap<String, usize> = serde_json::from_str(&answers)?;
            let scope = QuizScope {
                scope_type,
                id: scope_id,
                course_id,
            };
            let submission = submit_quiz(store, &learner, &scope, &answers)?;
            println!("{}", serde_json::to_string_pretty(&submission)?);
        }
        QuizCommand::History { learner } => {
            let submissions = list_submissions(store, &learner)?;
            println!("{}", serde_json::to_string_pretty(&submissions)?);
        }
    }
    Ok(())
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "quiz",
        "version": "0.1.0",
        "description": "Scoped quizzes graded against a fixed pass mark",
        "commands": [
            { "name": "add", "parameters": ["file"] },
            { "name": "submit", "parameters": ["learner", "scope_type", "scope_id", "course_id", "answers"] },
            { "name": "history", "parameters": ["learner"] }
        ],
        "storage": [schemas::QUIZ_DB_NAME]
    })
}
