//! Per-learner progress record.
//!
//! The stored document is untrusted: any module or room may be missing, ids may not
//! exist in the current curriculum, and flag values may be of any JSON type. Parsing is
//! total (never fails) and every lookup resolves absence to "not completed".
//!
//! Writes go through [`ProgressPatch`], which merges named flags into the record and
//! leaves everything else untouched. There is no whole-document replace.

use crate::core::curriculum::Curriculum;
use crate::core::error::TrailheadError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct ModuleProgress {
    pub rooms: BTreeMap<String, bool>,
    pub ctf_completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct ProgressRecord {
    pub modules: BTreeMap<String, ModuleProgress>,
}

/// Coerce an arbitrary JSON value to a completion flag. Anything that is not clearly
/// affirmative counts as incomplete.
pub fn coerce_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

impl From<Value> for ModuleProgress {
    fn from(value: Value) -> Self {
        let mut progress = ModuleProgress::default();
        let Value::Object(obj) = value else {
            return progress;
        };
        if let Some(Value::Object(rooms)) = obj.get("rooms") {
            for (room_id, flag) in rooms {
                progress.rooms.insert(room_id.clone(), coerce_flag(flag));
            }
        }
        progress.ctf_completed = obj
            .get("ctfCompleted")
            .or_else(|| obj.get("ctf_completed"))
            .map(coerce_flag)
            .unwrap_or(false);
        progress
    }
}

impl From<Value> for ProgressRecord {
    fn from(value: Value) -> Self {
        let mut record = ProgressRecord::default();
        if let Some(Value::Object(modules)) = value.get("modules") {
            for (module_id, entry) in modules {
                record
                    .modules
                    .insert(module_id.clone(), ModuleProgress::from(entry.clone()));
            }
        }
        record
    }
}

impl ProgressRecord {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a stored document. Malformed JSON degrades to the empty record.
    pub fn parse_lenient(raw: &str) -> Self {
        serde_json::from_str::<Value>(raw)
            .map(ProgressRecord::from)
            .unwrap_or_default()
    }

    pub fn module(&self, module_id: &str) -> Option<&ModuleProgress> {
        self.modules.get(module_id)
    }

    pub fn room_completed(&self, module_id: &str, room_id: &str) -> bool {
        self.module(module_id)
            .and_then(|m| m.rooms.get(room_id))
            .copied()
            .unwrap_or(false)
    }

    pub fn ctf_completed(&self, module_id: &str) -> bool {
        self.module(module_id).is_some_and(|m| m.ctf_completed)
    }

    /// Entries that reference modules or rooms absent from `curriculum`, as
    /// `module` or `module/room` paths. The engine ignores these.
    pub fn foreign_ids(&self, curriculum: &Curriculum) -> Vec<String> {
        let mut foreign = Vec::new();
        for (module_id, progress) in &self.modules {
            match curriculum.module(module_id) {
                None => foreign.push(module_id.clone()),
                Some(module) => {
                    for room_id in progress.rooms.keys() {
                        if module.room(room_id).is_none() {
                            foreign.push(format!("{}/{}", module_id, room_id));
                        }
                    }
                }
            }
        }
        foreign
    }

    /// Merge `patch` into this record. Entries the patch does not name are preserved.
    pub fn apply(&mut self, patch: &ProgressPatch) {
        for mark in &patch.marks {
            match mark {
                CompletionMark::Room {
                    module,
                    room,
                    completed,
                } => {
                    self.modules
                        .entry(module.clone())
                        .or_default()
                        .rooms
                        .insert(room.clone(), *completed);
                }
                CompletionMark::Ctf { module, completed } => {
                    self.modules.entry(module.clone()).or_default().ctf_completed = *completed;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletionMark {
    Room {
        module: String,
        room: String,
        completed: bool,
    },
    Ctf {
        module: String,
        completed: bool,
    },
}

/// A set of completion flags to merge into a learner's record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPatch {
    pub marks: Vec<CompletionMark>,
}

impl ProgressPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room(mut self, module: &str, room: &str, completed: bool) -> Self {
        self.marks.push(CompletionMark::Room {
            module: module.to_string(),
            room: room.to_string(),
            completed,
        });
        self
    }

    pub fn ctf(mut self, module: &str, completed: bool) -> Self {
        self.marks.push(CompletionMark::Ctf {
            module: module.to_string(),
            completed,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Reject marks naming modules or rooms the curriculum does not contain. Reads
    /// tolerate foreign ids; writes do not create new ones.
    pub fn check(&self, curriculum: &Curriculum) -> Result<(), TrailheadError> {
        for mark in &self.marks {
            match mark {
                CompletionMark::Room { module, room, .. } => {
                    let m = curriculum
                        .module(module)
                        .ok_or_else(|| TrailheadError::NotFound(format!("module '{}'", module)))?;
                    if m.room(room).is_none() {
                        return Err(TrailheadError::NotFound(format!(
                            "room '{}' in module '{}'",
                            room, module
                        )));
                    }
                }
                CompletionMark::Ctf { module, .. } => {
                    if curriculum.module(module).is_none() {
                        return Err(TrailheadError::NotFound(format!("module '{}'", module)));
                    }
                }
            }
        }
        Ok(())
    }
}
