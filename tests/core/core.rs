use serde_json::json;
use std::fs;
use tempfile::tempdir;
use trailhead::core::assets;
use trailhead::core::broker::{AUDIT_LOG_NAME, DbBroker};
use trailhead::core::curriculum::{Curriculum, Module, Room};
use trailhead::core::db;
use trailhead::core::engine::{self, ModuleStatus};
use trailhead::core::error::{CurriculumDefect, TrailheadError};
use trailhead::core::record::ProgressRecord;
use trailhead::core::store::Store;
use trailhead::core::views;

fn module(id: &str, rooms: &[&str]) -> Module {
    Module {
        id: id.to_string(),
        title: format!("Module {}", id),
        badge: format!("{}-badge", id),
        rooms: rooms
            .iter()
            .map(|r| Room {
                id: r.to_string(),
                title: format!("Room {}", r),
            })
            .collect(),
        ctf_name: format!("{} capstone", id),
    }
}

/// Record document with the given `modules` mapping.
fn record(modules: serde_json::Value) -> ProgressRecord {
    serde_json::from_value(json!({ "modules": modules })).unwrap()
}

fn statuses(curriculum: &Curriculum, rec: &ProgressRecord) -> Vec<ModuleStatus> {
    engine::module_statuses(&curriculum.modules, rec)
}

#[test]
fn percent_rounds_half_up_and_handles_zero_total() {
    assert_eq!(engine::percent(0, 0), 0);
    assert_eq!(engine::percent(0, 7), 0);
    assert_eq!(engine::percent(1, 2), 50);
    assert_eq!(engine::percent(1, 8), 13);
    assert_eq!(engine::percent(1, 3), 33);
    assert_eq!(engine::percent(2, 3), 67);
    assert_eq!(engine::percent(4, 5), 80);
    assert_eq!(engine::percent(5, 5), 100);
    assert_eq!(engine::percent(9, 5), 100);
}

#[test]
fn concrete_two_module_scenario() {
    let curriculum = Curriculum::new(vec![module("a", &["r1", "r2"]), module("b", &["r3"])]);
    let rec = record(json!({
        "a": { "rooms": { "r1": true, "r2": true }, "ctfCompleted": true },
        "b": { "rooms": { "r3": true } }
    }));

    let view = engine::overview(&curriculum, &rec);
    assert_eq!(view.modules[0].status, ModuleStatus::Done);
    assert_eq!(view.modules[0].progress_percent, 100);
    assert_eq!(view.modules[1].status, ModuleStatus::InProgress);
    assert_eq!(view.modules[1].progress_percent, 50);

    let agg = &view.aggregate;
    assert_eq!(agg.modules_completed, 1);
    assert_eq!(agg.rooms_total, 3);
    assert_eq!(agg.rooms_completed_total, 3);
    assert_eq!(agg.ctfs_completed_total, 1);
    assert_eq!(agg.total_units, 5);
    assert_eq!(agg.overall_progress_percent, 80);
}

#[test]
fn empty_record_gates_first_module_as_next() {
    let curriculum = assets::default_curriculum().unwrap();
    let view = engine::overview(&curriculum, &ProgressRecord::empty());
    assert!(view.modules.iter().all(|m| m.status == ModuleStatus::Next));
    assert!(view.modules.iter().all(|m| m.progress_percent == 0));
    assert_eq!(view.aggregate.overall_progress_percent, 0);
    assert_eq!(view.aggregate.total_units, 15);
}

#[test]
fn partial_progress_past_the_gate_stays_next() {
    let curriculum = Curriculum::new(vec![module("a", &["r1"]), module("b", &["r2", "r3"])]);
    let rec = record(json!({ "b": { "rooms": { "r2": true } } }));

    let view = engine::overview(&curriculum, &rec);
    assert_eq!(view.modules[0].status, ModuleStatus::Next);
    assert_eq!(view.modules[1].status, ModuleStatus::Next);
    assert_eq!(view.modules[1].progress_percent, 33);
    assert_eq!(view.modules[1].rooms_completed, 1);
}

#[test]
fn out_of_order_completion_keeps_later_modules_done() {
    let curriculum = Curriculum::new(vec![
        module("a", &["r1"]),
        module("b", &["r2"]),
        module("c", &["r3"]),
    ]);
    let rec = record(json!({
        "b": { "rooms": { "r2": true }, "ctfCompleted": true },
        "c": { "rooms": { "r3": true } }
    }));

    assert_eq!(
        statuses(&curriculum, &rec),
        vec![ModuleStatus::Next, ModuleStatus::Done, ModuleStatus::Next]
    );
}

#[test]
fn at_most_one_module_is_in_progress() {
    let curriculum = Curriculum::new(vec![
        module("a", &["r1", "r2"]),
        module("b", &["r3"]),
        module("c", &["r4"]),
    ]);
    let rec = record(json!({
        "a": { "rooms": { "r1": true } },
        "b": { "rooms": { "r3": true } },
        "c": { "ctfCompleted": true }
    }));

    let s = statuses(&curriculum, &rec);
    assert_eq!(s.iter().filter(|s| **s == ModuleStatus::InProgress).count(), 1);
    assert_eq!(s[0], ModuleStatus::InProgress);
}

#[test]
fn zero_room_module_counts_its_ctf_only() {
    let curriculum = Curriculum::new(vec![module("intro", &[])]);
    let view = engine::overview(&curriculum, &ProgressRecord::empty());
    assert_eq!(view.modules[0].progress_percent, 0);
    assert_eq!(view.modules[0].status, ModuleStatus::Next);

    let done = record(json!({ "intro": { "ctf_completed": "yes" } }));
    let view = engine::overview(&curriculum, &done);
    assert_eq!(view.modules[0].progress_percent, 100);
    assert_eq!(view.modules[0].status, ModuleStatus::Done);
    assert_eq!(view.aggregate.total_units, 1);
}

#[test]
fn zero_module_curriculum_yields_empty_view() {
    let view = engine::overview(&Curriculum::default(), &ProgressRecord::empty());
    assert!(view.modules.is_empty());
    assert_eq!(view.aggregate.total_units, 0);
    assert_eq!(view.aggregate.overall_progress_percent, 0);

    let snapshot = views::snapshot(&view);
    assert_eq!(snapshot.len(), 4);
    assert_eq!(snapshot[3].value, "0%");
}

#[test]
fn derivation_is_deterministic_and_bounded() {
    let curriculum = assets::default_curriculum().unwrap();
    let rec = record(json!({
        "net": { "rooms": { "osi-model": 1, "tcp-ip": "TRUE", "dns": "no", "ghost": true } },
        "linux": { "rooms": { "shell-basics": true }, "ctfCompleted": 0 },
        "unknown-module": { "rooms": { "x": true }, "ctfCompleted": true }
    }));

    let first = serde_json::to_value(views::student_overview(&engine::overview(&curriculum, &rec))).unwrap();
    let second = serde_json::to_value(views::student_overview(&engine::overview(&curriculum, &rec))).unwrap();
    assert_eq!(first, second);

    let view = engine::overview(&curriculum, &rec);
    for m in &view.modules {
        assert!(m.progress_percent <= 100);
        assert!(m.rooms_completed <= m.rooms_total);
    }
    assert_eq!(view.modules[0].rooms_completed, 2);
    assert_eq!(view.modules[0].status, ModuleStatus::InProgress);
    assert!(view.aggregate.overall_progress_percent <= 100);
}

#[test]
fn garbage_record_reads_as_empty() {
    for raw in ["", "null", "42", "[1,2]", "{\"modules\": {\"net\": 7}}", "{\"modules\": []}", "not json"] {
        let rec = ProgressRecord::parse_lenient(raw);
        let view = engine::overview(&assets::default_curriculum().unwrap(), &rec);
        assert_eq!(view.aggregate.rooms_completed_total, 0, "input {:?}", raw);
    }
}

#[test]
fn curriculum_validation_reports_every_defect() {
    let mut bad = module("Net Basics", &["dup", "dup"]);
    bad.ctf_name = String::new();
    let curriculum = Curriculum::new(vec![bad, module("a", &["r"]), module("a", &["r"])]);

    let err = curriculum.validate().unwrap_err();
    assert!(err.defects.contains(&CurriculumDefect::MalformedId("Net Basics".to_string())));
    assert!(err.defects.contains(&CurriculumDefect::MissingCtf("Net Basics".to_string())));
    assert!(err.defects.contains(&CurriculumDefect::DuplicateRoom {
        module: "Net Basics".to_string(),
        room: "dup".to_string(),
    }));
    assert!(err.defects.contains(&CurriculumDefect::DuplicateModule("a".to_string())));
}

#[test]
fn fingerprint_tracks_content() {
    let a = Curriculum::new(vec![module("a", &["r1"])]);
    let b = Curriculum::new(vec![module("a", &["r1", "r2"])]);
    assert_eq!(a.fingerprint(), a.clone().fingerprint());
    assert_ne!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint().len(), 64);
}

#[test]
fn broker_audits_success_and_failure() {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path().join("data")).unwrap();
    let broker = DbBroker::new(store.root());
    let db_path = store.db_path("scratch.db");

    broker
        .with_conn(&db_path, "tester", "scratch.init", |conn| {
            db::apply_schema(conn, &["CREATE TABLE IF NOT EXISTS t (x INTEGER)"])
        })
        .unwrap();
    let failed: Result<(), TrailheadError> = broker.with_conn(&db_path, "tester", "scratch.bad", |conn| {
        conn.execute("INSERT INTO missing_table VALUES (1)", [])?;
        Ok(())
    });
    assert!(matches!(failed, Err(TrailheadError::RusqliteError(_))));

    let events = broker.read_events().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].op, "scratch.init");
    assert_eq!(events[0].status, "success");
    assert_eq!(events[1].op, "scratch.bad");
    assert_eq!(events[1].status, "error");
    assert_eq!(events[1].db_id, "scratch.db");
    assert!(store.root().join(AUDIT_LOG_NAME).exists());
}

#[test]
fn broker_skips_unparseable_audit_lines() {
    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join(AUDIT_LOG_NAME), "not json\n").unwrap();
    let broker = DbBroker::new(tmp.path());
    assert!(broker.read_events().unwrap().is_empty());
}

#[test]
fn db_connect_enables_wal() {
    let tmp = tempdir().unwrap();
    let conn = db::db_connect(&tmp.path().join("wal.db")).unwrap();
    let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0)).unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}
