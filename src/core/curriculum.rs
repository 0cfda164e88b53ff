//! Curriculum catalog data model.
//!
//! A curriculum is an ordered list of modules; each module holds an ordered list of
//! rooms and exactly one capstone CTF. Module order defines the gating sequence and is
//! never re-sorted by anything downstream.

use crate::core::error::{CurriculumDefect, CurriculumError};
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("id pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub badge: String,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(alias = "ctf_name")]
    pub ctf_name: String,
}

impl Module {
    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curriculum {
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl Curriculum {
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    pub fn module(&self, module_id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    pub fn total_rooms(&self) -> usize {
        self.modules.iter().map(|m| m.rooms.len()).sum()
    }

    /// Check the structural invariants every catalog must satisfy before the
    /// engine may read it. All defects are collected, not just the first.
    pub fn validate(&self) -> Result<(), CurriculumError> {
        let mut defects = Vec::new();
        let mut module_ids = FxHashSet::default();

        for module in &self.modules {
            if !ID_RE.is_match(&module.id) {
                defects.push(CurriculumDefect::MalformedId(module.id.clone()));
            }
            if !module_ids.insert(module.id.as_str()) {
                defects.push(CurriculumDefect::DuplicateModule(module.id.clone()));
            }
            if module.title.trim().is_empty() {
                defects.push(CurriculumDefect::EmptyModuleTitle(module.id.clone()));
            }
            if module.ctf_name.trim().is_empty() {
                defects.push(CurriculumDefect::MissingCtf(module.id.clone()));
            }

            let mut room_ids = FxHashSet::default();
            for room in &module.rooms {
                if !ID_RE.is_match(&room.id) {
                    defects.push(CurriculumDefect::MalformedId(room.id.clone()));
                }
                if !room_ids.insert(room.id.as_str()) {
                    defects.push(CurriculumDefect::DuplicateRoom {
                        module: module.id.clone(),
                        room: room.id.clone(),
                    });
                }
                if room.title.trim().is_empty() {
                    defects.push(CurriculumDefect::EmptyRoomTitle {
                        module: module.id.clone(),
                        room: room.id.clone(),
                    });
                }
            }
        }

        if defects.is_empty() {
            Ok(())
        } else {
            Err(CurriculumError { defects })
        }
    }

    /// SHA-256 over the canonical JSON encoding. Stable for identical curricula and
    /// usable as a cache key alongside a record revision.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        format!("{:x}", hasher.finalize())
    }
}
