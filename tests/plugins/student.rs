use serde_json::json;
use tempfile::tempdir;
use trailhead::core::config::Config;
use trailhead::core::engine::ModuleStatus;
use trailhead::core::record::ProgressPatch;
use trailhead::core::store::Store;
use trailhead::plugins::{catalog, progress, student};

fn setup() -> (tempfile::TempDir, Store, Config) {
    let tmp = tempdir().unwrap();
    let store = Store::open(tmp.path().join("data")).unwrap();
    (tmp, store, Config::default())
}

fn complete_networking(store: &Store, config: &Config, learner: &str) {
    let curriculum = catalog::get_curriculum(store, config).unwrap();
    let patch = ProgressPatch::new()
        .room("net", "osi-model", true)
        .room("net", "tcp-ip", true)
        .room("net", "dns", true)
        .room("net", "packet-capture", true)
        .ctf("net", true);
    progress::apply_patch(store, &curriculum, learner, &patch).unwrap();
}

#[test]
fn new_learner_sees_all_modules_as_next() {
    let (_tmp, store, config) = setup();
    let path = student::learning_path(&store, &config, "ada").unwrap();

    assert_eq!(path.len(), 3);
    assert!(path.iter().all(|e| e.status == ModuleStatus::Next && e.progress == 0));
    assert_eq!(path[0].title, "Networking Basics");
    assert_eq!(path[0].rooms_total, 4);

    // First read materializes an empty record.
    assert!(progress::get_progress_record(&store, "ada").unwrap().is_some());
}

#[test]
fn learning_path_json_shape() {
    let (_tmp, store, config) = setup();
    complete_networking(&store, &config, "ada");
    let curriculum = catalog::get_curriculum(&store, &config).unwrap();
    progress::apply_patch(&store, &curriculum, "ada", &ProgressPatch::new().room("linux", "shell-basics", true))
        .unwrap();

    let path = serde_json::to_value(student::learning_path(&store, &config, "ada").unwrap()).unwrap();
    assert_eq!(
        path,
        json!([
            { "id": "net", "title": "Networking Basics", "status": "done", "progress": 100, "roomsTotal": 4, "roomsCompleted": 4 },
            { "id": "linux", "title": "Linux Essentials", "status": "in-progress", "progress": 20, "roomsTotal": 4, "roomsCompleted": 1 },
            { "id": "web", "title": "Web Security", "status": "next", "progress": 0, "roomsTotal": 4, "roomsCompleted": 0 }
        ])
    );
}

#[test]
fn module_list_carries_ctf_and_badge() {
    let (_tmp, store, config) = setup();
    complete_networking(&store, &config, "ada");

    let modules = student::module_list(&store, &config, "ada").unwrap();
    let net = serde_json::to_value(&modules[0]).unwrap();
    assert_eq!(net["ctf"], json!({ "name": "Lost in Transit", "completed": true }));
    assert_eq!(net["roomsCompleted"], 4);
    assert_eq!(net["progress"], 100);
    assert!(net["badge"].is_string());

    assert!(!modules[2].ctf.completed);
    assert_eq!(modules[2].ctf.name, "Broken Storefront");
}

#[test]
fn snapshot_reports_headline_metrics() {
    let (_tmp, store, config) = setup();
    complete_networking(&store, &config, "ada");

    let snapshot = student::snapshot(&store, &config, "ada").unwrap();
    let pairs: Vec<(&str, &str)> = snapshot.iter().map(|m| (m.id.as_str(), m.value.as_str())).collect();
    assert_eq!(
        pairs,
        vec![("modules", "1"), ("rooms", "4"), ("ctfs", "1"), ("progress", "33%")]
    );
    assert!(snapshot.iter().all(|m| !m.label.is_empty() && !m.icon.is_empty()));
}

#[test]
fn overview_combines_the_three_views() {
    let (_tmp, store, config) = setup();
    complete_networking(&store, &config, "ada");

    let overview = serde_json::to_value(student::student_overview(&store, &config, "ada").unwrap()).unwrap();
    assert_eq!(overview["learningPath"].as_array().unwrap().len(), 3);
    assert_eq!(overview["modules"].as_array().unwrap().len(), 3);
    assert_eq!(overview["snapshot"].as_array().unwrap().len(), 4);
    assert_eq!(overview["learningPath"][1]["status"], "next");
}

#[test]
fn records_from_a_retired_curriculum_are_ignored() {
    let (_tmp, store, config) = setup();
    complete_networking(&store, &config, "ada");

    let replacement = catalog::parse_curriculum(
        r#"
[[modules]]
id = "net"
title = "Networking Basics"
ctf_name = "Lost in Transit"

[[modules.rooms]]
id = "subnetting"
title = "Subnetting"
"#,
        catalog::CurriculumFormat::Toml,
    )
    .unwrap();
    catalog::import_curriculum(&store, &replacement, "test").unwrap();

    let ctx = student::read_context(&store, &config, "ada").unwrap();
    assert_eq!(ctx.record.foreign_ids(&ctx.curriculum).len(), 4);

    let path = student::learning_path(&store, &config, "ada").unwrap();
    assert_eq!(path.len(), 1);
    assert_eq!(path[0].rooms_completed, 0);
    assert_eq!(path[0].progress, 50);
    assert_eq!(path[0].status, ModuleStatus::InProgress);
}

#[test]
fn reads_never_write_progress() {
    let (_tmp, store, config) = setup();
    complete_networking(&store, &config, "ada");
    let before = progress::get_stored_record(&store, "ada").unwrap().unwrap();

    student::student_overview(&store, &config, "ada").unwrap();
    student::snapshot(&store, &config, "ada").unwrap();

    let after = progress::get_stored_record(&store, "ada").unwrap().unwrap();
    assert_eq!(before, after);
}
