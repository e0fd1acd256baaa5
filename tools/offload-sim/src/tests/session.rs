use crate::{Board, Faults, Session};

const BOARD: &str = include_str!("../../boards/zed-ad7944.json");
const TRIGGER: &str = "axi-spi-engine-spi_offload0-pwm-trigger";

#[test]
fn sample_board_binds_everything() {
    let board = Board::from_json(BOARD).unwrap();
    assert_eq!(board.config.default_rate_hz, 1000);

    let session = Session::new(&board, Faults::default()).unwrap();
    let report = session.probe();
    assert_eq!(report.bound.len(), 3);
    assert!(report.deferred.is_empty());

    let summary = session.summary();
    let adc0 = summary.devices.iter().find(|d| d.name == "adc0").unwrap();
    assert_eq!(adc0.trigger.as_deref(), Some(TRIGGER));
    let adc1 = summary.devices.iter().find(|d| d.name == "adc1").unwrap();
    assert!(adc1.trigger.is_none());
    assert_eq!(summary.triggers.len(), 1);
    assert_eq!(summary.triggers[0].sampling_frequency, Some(1000));
    assert_eq!(summary.triggers[0].pwm_enabled, Some(true));
    assert_eq!(summary.live_buffers, 1);
}

#[test]
fn rate_attribute_round_trip() {
    let board = Board::from_json(BOARD).unwrap();
    let session = Session::new(&board, Faults::default()).unwrap();
    session.probe();

    assert_eq!(session.store_rate(None, "500\n").unwrap(), 4);
    assert_eq!(session.show_rate(Some(TRIGGER)).unwrap(), "500\n");
    assert!(session.store_rate(None, "0").is_err());
    assert!(session.store_rate(None, "fast").is_err());
    assert_eq!(session.show_rate(None).unwrap(), "500\n");
    assert!(session.show_rate(Some("nope")).is_err());
}

#[test]
fn pwm_fault_leaves_consumer_deferred() {
    let board = Board::from_json(BOARD).unwrap();
    let faults = Faults {
        pwm_request: true,
        ..Faults::default()
    };
    let session = Session::new(&board, faults).unwrap();
    let report = session.probe();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.deferred, vec!["adc0".to_string()]);
    assert!(session.store_rate(None, "500").is_err());
    assert_eq!(session.summary().live_buffers, 0);
}

#[test]
fn removal_releases_everything() {
    let board = Board::from_json(BOARD).unwrap();
    let session = Session::new(&board, Faults::default()).unwrap();
    session.probe();

    session.remove("adc0").unwrap();
    assert_eq!(session.summary().triggers[0].refs, 1);
    session.remove("spi_offload0").unwrap();

    let summary = session.summary();
    assert!(summary.triggers.is_empty());
    assert_eq!(summary.live_buffers, 0);
    assert!(session.remove("missing").is_err());
}

#[test]
fn unknown_node_is_rejected() {
    let json = r#"{
        "nodes": [],
        "devices": [{ "name": "x", "node": "ghost" }]
    }"#;
    let board = Board::from_json(json).unwrap();
    assert!(Session::new(&board, Faults::default()).is_err());
}
