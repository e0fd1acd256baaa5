use std::sync::{Arc, Mutex};

use crate::devres::Devres;
use crate::error::OffloadError;

fn recording(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> impl FnOnce() + Send {
    let log = Arc::clone(log);
    move || log.lock().unwrap().push(name)
}

#[test]
fn actions_run_in_reverse_order_once() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let devres = Devres::new("dev0");
    devres.add_action_or_reset("first", recording(&log, "first")).unwrap();
    devres.add_action_or_reset("second", recording(&log, "second")).unwrap();
    devres.add_action_or_reset("third", recording(&log, "third")).unwrap();
    assert_eq!(devres.pending(), vec!["first", "second", "third"]);

    assert_eq!(devres.release_all(), 3);
    assert_eq!(devres.release_all(), 0);
    assert_eq!(*log.lock().unwrap(), vec!["third", "second", "first"]);
    assert!(devres.is_empty());
}

#[test]
fn late_action_runs_immediately() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let devres = Devres::new("dev0");
    devres.release_all();

    let err = devres
        .add_action_or_reset("late", recording(&log, "late"))
        .unwrap_err();
    assert_eq!(err, OffloadError::DeviceGone("dev0".into()));
    assert_eq!(*log.lock().unwrap(), vec!["late"]);
    assert!(devres.is_empty());
}

#[test]
fn reopen_accepts_actions_again() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let devres = Devres::new("dev0");
    devres.release_all();
    devres.reopen();

    devres.add_action_or_reset("again", recording(&log, "again")).unwrap();
    assert_eq!(devres.len(), 1);
    assert!(log.lock().unwrap().is_empty());
}
