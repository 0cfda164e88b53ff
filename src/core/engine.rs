//! Progress engine: derives module status, completion percentages, and rollups from a
//! curriculum and a learner's progress record.
//!
//! Everything here is a pure function over borrowed inputs. Nothing is cached and no
//! derived state survives a call; every read recomputes from source.
//!
//! # Units
//!
//! Each room is one unit and each module's CTF is exactly one more unit, both per module
//! (`rooms + 1`) and across the curriculum (`Σ rooms + module_count`).
//!
//! # Gating
//!
//! Modules are gated in curriculum order. The *gate* is the first module that is not
//! complete. Complete modules are `done` wherever they sit. The gate is `in-progress`
//! once it has any progress, else `next`. Every other incomplete module is `next`, even
//! when its own percentage is non-zero: at most one module is ever shown as active.

use crate::core::curriculum::{Curriculum, Module};
use crate::core::record::ProgressRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleStatus {
    Done,
    InProgress,
    Next,
}

impl ModuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStatus::Done => "done",
            ModuleStatus::InProgress => "in-progress",
            ModuleStatus::Next => "next",
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleStats {
    pub rooms_completed: usize,
    pub rooms_total: usize,
    pub ctf_completed: bool,
    pub progress_percent: u32,
}

impl ModuleStats {
    pub fn is_complete(&self) -> bool {
        self.rooms_completed == self.rooms_total && self.ctf_completed
    }
}

/// Per-module slice of a [`DerivedView`], in curriculum order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleView {
    pub id: String,
    pub title: String,
    pub badge: String,
    pub ctf_name: String,
    pub status: ModuleStatus,
    pub progress_percent: u32,
    pub rooms_total: usize,
    pub rooms_completed: usize,
    pub ctf_completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub modules_completed: usize,
    pub rooms_total: usize,
    pub rooms_completed_total: usize,
    pub ctfs_completed_total: usize,
    pub total_units: usize,
    pub overall_progress_percent: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedView {
    pub modules: Vec<ModuleView>,
    pub aggregate: Aggregate,
}

/// `round(100 × completed / total)` with ties rounding up; `0` when `total == 0`.
/// Clamped so a caller passing `completed > total` still gets at most 100.
pub fn percent(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    ((200 * completed + total) / (2 * total)) as u32
}

pub fn module_stats(module: &Module, record: &ProgressRecord) -> ModuleStats {
    let rooms_total = module.rooms.len();
    let rooms_completed = module
        .rooms
        .iter()
        .filter(|room| record.room_completed(&module.id, &room.id))
        .count();
    let ctf_completed = record.ctf_completed(&module.id);
    let total_units = rooms_total + 1;
    let completed_units = rooms_completed + usize::from(ctf_completed);

    ModuleStats {
        rooms_completed,
        rooms_total,
        ctf_completed,
        progress_percent: percent(completed_units, total_units),
    }
}

fn statuses_from_stats(stats: &[ModuleStats]) -> Vec<ModuleStatus> {
    let gate = stats.iter().position(|s| !s.is_complete());
    stats
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if s.is_complete() {
                ModuleStatus::Done
            } else if Some(i) == gate && s.progress_percent > 0 {
                ModuleStatus::InProgress
            } else {
                ModuleStatus::Next
            }
        })
        .collect()
}

pub fn module_statuses(modules: &[Module], record: &ProgressRecord) -> Vec<ModuleStatus> {
    let stats: Vec<ModuleStats> = modules.iter().map(|m| module_stats(m, record)).collect();
    statuses_from_stats(&stats)
}

pub fn overview(curriculum: &Curriculum, record: &ProgressRecord) -> DerivedView {
    let stats: Vec<ModuleStats> = curriculum
        .modules
        .iter()
        .map(|m| module_stats(m, record))
        .collect();
    let statuses = statuses_from_stats(&stats);

    let mut aggregate = Aggregate::default();
    let mut modules = Vec::with_capacity(stats.len());

    for ((module, s), status) in curriculum.modules.iter().zip(&stats).zip(statuses) {
        aggregate.rooms_total += s.rooms_total;
        aggregate.rooms_completed_total += s.rooms_completed;
        aggregate.ctfs_completed_total += usize::from(s.ctf_completed);
        if status == ModuleStatus::Done {
            aggregate.modules_completed += 1;
        }
        modules.push(ModuleView {
            id: module.id.clone(),
            title: module.title.clone(),
            badge: module.badge.clone(),
            ctf_name: module.ctf_name.clone(),
            status,
            progress_percent: s.progress_percent,
            rooms_total: s.rooms_total,
            rooms_completed: s.rooms_completed,
            ctf_completed: s.ctf_completed,
        });
    }

    aggregate.total_units = aggregate.rooms_total + curriculum.modules.len();
    aggregate.overall_progress_percent = percent(
        aggregate.rooms_completed_total + aggregate.ctfs_completed_total,
        aggregate.total_units,
    );

    DerivedView { modules, aggregate }
}
