//! Response shapes for the student read surfaces.
//!
//! Field names are part of the external contract and are serialized in camelCase.

use crate::core::engine::{DerivedView, ModuleStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPathEntry {
    pub id: String,
    pub title: String,
    pub status: ModuleStatus,
    pub progress: u32,
    pub rooms_total: usize,
    pub rooms_completed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtfSummary {
    pub name: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleListEntry {
    pub id: String,
    pub title: String,
    pub rooms_total: usize,
    pub rooms_completed: usize,
    pub ctf: CtfSummary,
    pub badge: String,
    pub progress: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetric {
    pub id: String,
    pub label: String,
    pub value: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOverview {
    pub learning_path: Vec<LearningPathEntry>,
    pub modules: Vec<ModuleListEntry>,
    pub snapshot: Vec<SnapshotMetric>,
}

pub fn learning_path(view: &DerivedView) -> Vec<LearningPathEntry> {
    view.modules
        .iter()
        .map(|m| LearningPathEntry {
            id: m.id.clone(),
            title: m.title.clone(),
            status: m.status,
            progress: m.progress_percent,
            rooms_total: m.rooms_total,
            rooms_completed: m.rooms_completed,
        })
        .collect()
}

pub fn module_list(view: &DerivedView) -> Vec<ModuleListEntry> {
    view.modules
        .iter()
        .map(|m| ModuleListEntry {
            id: m.id.clone(),
            title: m.title.clone(),
            rooms_total: m.rooms_total,
            rooms_completed: m.rooms_completed,
            ctf: CtfSummary {
                name: m.ctf_name.clone(),
                completed: m.ctf_completed,
            },
            badge: m.badge.clone(),
            progress: m.progress_percent,
        })
        .collect()
}

fn metric(id: &str, label: &str, value: String, icon: &str) -> SnapshotMetric {
    SnapshotMetric {
        id: id.to_string(),
        label: label.to_string(),
        value,
        icon: icon.to_string(),
    }
}

/// Fixed four-entry headline metrics, always in this order.
pub fn snapshot(view: &DerivedView) -> Vec<SnapshotMetric> {
    let agg = &view.aggregate;
    vec![
        metric(
            "modules",
            "Modules completed",
            agg.modules_completed.to_string(),
            "check",
        ),
        metric(
            "rooms",
            "Rooms completed",
            agg.rooms_completed_total.to_string(),
            "lock",
        ),
        metric(
            "ctfs",
            "CTFs completed",
            agg.ctfs_completed_total.to_string(),
            "code",
        ),
        metric(
            "progress",
            "Overall progress",
            format!("{}%", agg.overall_progress_percent),
            "chart",
        ),
    ]
}

pub fn student_overview(view: &DerivedView) -> StudentOverview {
    StudentOverview {
        learning_path: learning_path(view),
        modules: module_list(view),
        snapshot: snapshot(view),
    }
}
