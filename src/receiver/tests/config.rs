use crate::receiver::config::{ConfigError, ConfigSnapshot, ReceiverConfig};
use std::net::{IpAddr, Ipv4Addr};

#[test]
fn test_receiver_config_defaults() {
    let config = ReceiverConfig::default();
    assert_eq!(config.port, 5000);
    assert_eq!(config.audio_port, 0);
    assert_eq!(config.server_name, "AirHome/1.0");
    assert_eq!(config.audio_latency, 0);
    assert_eq!(config.sink_periods, 4);
    assert!(config.audio_device.is_none());
}

#[test]
fn test_receiver_config_builder() {
    let config = ReceiverConfig::with_name("Kitchen")
        .port(5001)
        .bind_addr(IpAddr::V4(Ipv4Addr::LOCALHOST))
        .audio_port(6000)
        .server_name("Test/2.0")
        .audio_latency(11025)
        .sink_periods(0)
        .audio_device("hw:1");

    assert_eq!(config.name, "Kitchen");
    assert_eq!(config.port, 5001);
    assert_eq!(config.bind_addr, IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(config.audio_port, 6000);
    assert_eq!(config.server_name, "Test/2.0");
    assert_eq!(config.audio_latency, 11025);
    assert_eq!(config.sink_periods, 1);
    assert_eq!(config.audio_device.as_deref(), Some("hw:1"));
}

#[test]
fn test_snapshot_defaults_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = ConfigSnapshot::load(dir.path().join("absent.json")).unwrap();
    assert_eq!(snapshot, ConfigSnapshot::default());
    assert_eq!(snapshot.device_name, "AirHome Bridge");
    assert!(snapshot.auto_start);
    assert!(snapshot.transcoding_enabled);
}

#[test]
fn test_snapshot_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let snapshot = ConfigSnapshot {
        device_name: "Living Room".into(),
        auto_start: false,
        transcoding_enabled: true,
    };

    snapshot.save(&path).unwrap();
    assert_eq!(ConfigSnapshot::load(&path).unwrap(), snapshot);
}

#[test]
fn test_snapshot_partial_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"auto_start": false}"#).unwrap();

    let snapshot = ConfigSnapshot::load(&path).unwrap();
    assert_eq!(snapshot.device_name, "AirHome Bridge");
    assert!(!snapshot.auto_start);
}

#[test]
fn test_snapshot_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(ConfigSnapshot::load(&path), Err(ConfigError::Parse(_))));
}
