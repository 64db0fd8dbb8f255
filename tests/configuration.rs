mod common;

use std::{fs, net::UdpSocket, sync::Arc, time::Duration};

use telemetry_logging::{
    config::DriverSettings, Config, ConfigurationError, DriverRegistry, Severity,
};
use tempfile::TempDir;

use common::RecordingDriver;

#[test]
fn unknown_driver_types_are_skipped() {
    let config = Config::from_json(
        r#"{
            "log_level": "WARN",
            "drivers": [
                {"type": "carrier-pigeon", "settings": {"loft": "north"}},
                {"type": "console", "settings": {"stream": "stderr"}}
            ]
        }"#,
    )
    .unwrap();

    let dispatcher = config.initialize().unwrap();

    assert_eq!(dispatcher.driver_count(), 1);
    assert_eq!(dispatcher.threshold(), Severity::Warn);
}

#[test]
fn missing_log_level_defaults_to_debug() {
    let config = Config::from_json(r#"{"drivers": []}"#).unwrap();
    let dispatcher = config.initialize().unwrap();

    assert_eq!(dispatcher.threshold(), Severity::Debug);
    assert_eq!(dispatcher.driver_count(), 0);
}

#[test]
fn unknown_log_level_is_rejected() {
    let config = Config::from_json(r#"{"log_level": "VERBOSE"}"#).unwrap();

    assert!(matches!(
        config.initialize(),
        Err(ConfigurationError::UnknownSeverity(_))
    ));
}

#[test]
fn file_driver_without_path_aborts_initialization() {
    let config = Config::from_json(
        r#"{
            "drivers": [
                {"type": "console"},
                {"type": "file", "settings": {}}
            ]
        }"#,
    )
    .unwrap();

    match config.initialize() {
        Err(ConfigurationError::MissingSetting { driver, key }) => {
            assert_eq!(driver, "file");
            assert_eq!(key, "file_path");
        }
        other => panic!("expected a missing setting error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn bad_driver_level_is_an_invalid_setting() {
    let config = Config::from_json(
        r#"{"drivers": [{"type": "console", "settings": {"level": "LOUD"}}]}"#,
    )
    .unwrap();

    assert!(matches!(
        config.initialize(),
        Err(ConfigurationError::InvalidSetting { key: "level", .. })
    ));
}

#[test]
fn file_driver_from_json_document_writes_events() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("nested").join("app.log");
    let config_path = dir.path().join("logging.json");
    fs::write(
        &config_path,
        serde_json::json!({
            "log_level": "INFO",
            "drivers": [
                {"type": "file", "settings": {"file_path": log_path, "level": "warn"}}
            ]
        })
        .to_string(),
    )
    .unwrap();

    let dispatcher = Config::load(&config_path).unwrap().initialize().unwrap();
    dispatcher.info("passes the dispatcher, not the driver", None);
    dispatcher.error("disk full", None);
    dispatcher.flush();

    let contents = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 1);

    let line: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(line["level"], "ERROR");
    assert_eq!(line["message"], "disk full");
}

#[test]
fn toml_documents_are_recognised_by_extension() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("app.log");
    let config_path = dir.path().join("logging.toml");
    fs::write(
        &config_path,
        format!(
            r#"
log_level = "error"

[[drivers]]
type = "file"

[drivers.settings]
file_path = "{}"
format = "text"
ansi = false
"#,
            log_path.display()
        ),
    )
    .unwrap();

    let config = Config::load(&config_path).unwrap();
    assert_eq!(config.level().unwrap(), Severity::Error);

    let dispatcher = config.initialize().unwrap();
    dispatcher.with_trace("t-9").error("boom", None);

    let contents = fs::read_to_string(&log_path).unwrap();
    assert!(contents.trim_end().ends_with("ERR: boom trace_id=t-9"), "{}", contents);
}

#[test]
fn unreadable_documents_report_their_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");

    match Config::load(&missing) {
        Err(ConfigurationError::Read { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected a read error, got {:?}", other),
    }
}

#[test]
fn malformed_documents_are_parse_errors() {
    assert!(matches!(
        Config::from_json("{ not json"),
        Err(ConfigurationError::Parse(_))
    ));
    assert!(matches!(
        Config::from_toml("drivers = 3"),
        Err(ConfigurationError::Parse(_))
    ));
}

#[test]
fn custom_drivers_can_be_registered() {
    let recorder = RecordingDriver::new();
    let shared = Arc::clone(&recorder);

    let mut registry = DriverRegistry::empty();
    registry.register("memory", move |_settings: &DriverSettings<'_>| {
        Ok(shared.clone() as Arc<dyn telemetry_logging::Driver>)
    });

    let config = Config::from_json(
        r#"{"drivers": [{"type": "memory"}, {"type": "console"}]}"#,
    )
    .unwrap();
    let dispatcher = registry.initialize(&config).unwrap();

    assert_eq!(registry.kinds(), vec!["memory"]);
    assert_eq!(dispatcher.driver_count(), 1);

    dispatcher.info("kept in memory", None);
    assert_eq!(recorder.messages(), vec!["kept in memory"]);
}

#[test]
fn builtin_registry_knows_every_alias() {
    let registry = DriverRegistry::with_builtin();
    let kinds = registry.kinds();

    for kind in [
        "cli",
        "console",
        "database",
        "db",
        "elasticsearch",
        "file",
        "http",
        "network",
        "search",
        "syslog",
    ] {
        assert!(kinds.contains(&kind), "missing {}", kind);
    }
}

#[test]
fn syslog_driver_from_settings_sends_datagrams() {
    let collector = UdpSocket::bind("127.0.0.1:0").unwrap();
    collector
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let address = collector.local_addr().unwrap();

    let config = Config::from_json(
        &serde_json::json!({
            "drivers": [{
                "type": "syslog",
                "settings": {
                    "address": address.to_string(),
                    "app_name": "billing",
                    "facility": "local0"
                }
            }]
        })
        .to_string(),
    )
    .unwrap();

    let dispatcher = config.initialize().unwrap();
    dispatcher.warn("payment retried", None);

    let mut buffer = [0u8; 2048];
    let size = collector.recv(&mut buffer).unwrap();
    let datagram = String::from_utf8_lossy(&buffer[..size]);

    // local0 (16) * 8 + warning (4)
    assert!(datagram.starts_with("<132>"), "{}", datagram);
    assert!(datagram.contains(" billing["), "{}", datagram);
    assert!(datagram.ends_with(": payment retried"), "{}", datagram);
}

#[test]
fn database_driver_from_settings_creates_the_table() {
    let dir = TempDir::new().unwrap();
    let dsn = format!("sqlite://{}", dir.path().join("logs.db").display());

    let config = Config::from_json(
        &serde_json::json!({
            "drivers": [{"type": "db", "settings": {"dsn": dsn, "timeout": "2s"}}]
        })
        .to_string(),
    )
    .unwrap();

    let dispatcher = config.initialize().unwrap();
    assert_eq!(dispatcher.driver_count(), 1);

    let failures = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = Arc::clone(&failures);
    dispatcher.set_failure_observer(move |_| {
        counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });
    dispatcher.info("stored", None);

    assert_eq!(failures.load(std::sync::atomic::Ordering::SeqCst), 0);
}
