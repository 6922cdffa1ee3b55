use auth::{AccessPolicy, ResponderLinks};
use common::lock::DEFAULT_LOCK_TIMEOUT;
use runs::{NewRun, RunLogStore, UnitStatus};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn new_run(number: String, assigned: &str) -> NewRun {
    NewRun {
        run_number: number,
        caller: "Security desk".to_string(),
        location: "Building 2".to_string(),
        nature: "Sick person".to_string(),
        assigned: assigned.to_string(),
        notes: "Call Received\nsecond line\nthird line".to_string(),
        timestamp: Some("2025-03-02 14:05:11".to_string()),
        statuses: vec![
            UnitStatus::new("41", "ENROUTE", "2025-03-02 14:06:00"),
            UnitStatus::new("41", "ON SCENE", "2025-03-02 14:10:00"),
        ],
    }
}

#[test]
fn concurrent_writers_produce_intact_blocks() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RunLogStore::new(dir.path().join("run_log.txt"), DEFAULT_LOCK_TIMEOUT));

    let handles: Vec<_> = (0..2)
        .map(|writer| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 0..25 {
                    store.append_run(new_run(format!("{writer}-{n}"), "41")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let runs = store.list_runs().unwrap();
    assert_eq!(runs.len(), 50);
    for run in &runs {
        assert_eq!(run.notes, "Call Received\nsecond line\nthird line");
        assert_eq!(run.statuses.len(), 2);
    }

    let contents = std::fs::read_to_string(store.path()).unwrap();
    assert_eq!(contents.matches("=== RUN START ===").count(), 50);
    assert_eq!(contents.matches("=== RUN END ===").count(), 50);
}

#[test]
fn visibility_over_logged_runs() {
    let dir = TempDir::new().unwrap();
    let store = RunLogStore::new(dir.path().join("run_log.txt"), DEFAULT_LOCK_TIMEOUT);
    store.append_run(new_run("1".to_string(), "41, E1")).unwrap();
    store.append_run(new_run("2".to_string(), "E1")).unwrap();

    let mut fallback = new_run("3".to_string(), "");
    fallback.statuses = vec![UnitStatus::new("41", "ENROUTE", "2025-03-02 15:00:00")];
    store.append_run(fallback).unwrap();

    let runs = store.list_runs().unwrap();
    let links = ResponderLinks::from_pairs([("41", vec!["chris"])]);
    let policy = AccessPolicy::new("Dakota", links).with_admins(["alex"]);

    let visible: Vec<&str> = policy
        .filter_visible("chris", &runs)
        .into_iter()
        .map(|run| run.run_number.as_str())
        .collect();
    assert_eq!(visible, vec!["1", "3"]);

    assert_eq!(policy.filter_visible("alex", &runs).len(), 3);
    assert_eq!(policy.filter_visible("dakota", &runs).len(), 3);
    assert!(policy.filter_visible("nobody", &runs).is_empty());
}

#[test]
fn addendum_survives_later_appends() {
    let dir = TempDir::new().unwrap();
    let store = RunLogStore::new(dir.path().join("run_log.txt"), DEFAULT_LOCK_TIMEOUT);
    store.append_run(new_run("10".to_string(), "41")).unwrap();
    store.append_addendum("10", "alex", "returned to service").unwrap();
    store.append_run(new_run("11".to_string(), "42")).unwrap();

    let run = store.find_run("10").unwrap();
    assert_eq!(run.addendums.len(), 1);
    assert!(run.addendums[0].ends_with("alex: returned to service"));
    assert_eq!(store.list_runs().unwrap().len(), 2);
}
