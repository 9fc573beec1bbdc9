use std::fs;
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;

use super::{DeliveryMode, Settings, load_config_from};
use crate::hub::{DeliveryPolicy, HubConfig};
use crate::producer::heartbeat::DEFAULT_INTERVAL;

fn missing_path(dir: &TempDir) -> String {
    dir.path().join("absent").to_string_lossy().into_owned()
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 8085);
    assert_eq!(settings.server.addr(), "0.0.0.0:8085");
    assert_eq!(settings.hub.subscriber_capacity, 1);
    assert_eq!(settings.hub.delivery, DeliveryMode::Block);
    assert_eq!(settings.hub.publish_capacity, 64);
    assert!(settings.heartbeat.enabled);
    assert_eq!(settings.heartbeat.interval(), DEFAULT_INTERVAL);
    assert_eq!(settings.log.level, "info");
}

#[test]
fn test_hub_config_from_settings() {
    let mut settings = Settings::default();
    assert_eq!(HubConfig::from(&settings.hub), HubConfig::default());

    settings.hub.delivery = DeliveryMode::Evict;
    settings.hub.delivery_timeout_ms = 250;
    settings.hub.subscriber_capacity = 16;
    settings.hub.publish_capacity = 8;
    let config = HubConfig::from(&settings.hub);

    assert_eq!(config.subscriber_capacity, 16);
    assert_eq!(config.publish_capacity, 8);
    assert_eq!(
        config.delivery,
        DeliveryPolicy::Evict {
            timeout: Duration::from_millis(250)
        }
    );
}

#[test]
#[serial]
fn test_missing_file_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let settings = load_config_from(&missing_path(&tmp)).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
#[serial]
fn test_load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("streamhub.toml");
    let toml = r#"
        [server]
        host = "127.0.0.1"
        port = 9000

        [hub]
        subscriber_capacity = 32
        delivery = "evict"
        publish_capacity = 4

        [heartbeat]
        interval_secs = 3
    "#;
    fs::write(&path, toml).unwrap();

    let settings = load_config_from(path.to_str().unwrap()).unwrap();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 9000);
    assert_eq!(settings.hub.subscriber_capacity, 32);
    assert_eq!(settings.hub.delivery, DeliveryMode::Evict);
    assert_eq!(settings.hub.publish_capacity, 4);
    assert_eq!(settings.heartbeat.interval_secs, 3);

    // untouched keys keep their defaults
    assert_eq!(settings.hub.delivery_timeout_ms, 5000);
    assert!(settings.heartbeat.enabled);
    assert_eq!(settings.log.level, "info");
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("streamhub.toml");
    fs::write(&path, "[server]\nport = 9000\n").unwrap();

    temp_env::with_vars(
        [
            ("STREAMHUB_SERVER__PORT", Some("9100")),
            ("STREAMHUB_HEARTBEAT__ENABLED", Some("false")),
            ("STREAMHUB_LOG__LEVEL", Some("debug")),
        ],
        || {
            let settings = load_config_from(path.to_str().unwrap()).unwrap();
            assert_eq!(settings.server.port, 9100);
            assert!(!settings.heartbeat.enabled);
            assert_eq!(settings.log.level, "debug");
            assert_eq!(settings.server.host, "0.0.0.0");
        },
    );
}

#[test]
#[serial]
fn test_invalid_value_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("streamhub.toml");
    fs::write(&path, "[hub]\ndelivery = \"sometimes\"\n").unwrap();

    assert!(load_config_from(path.to_str().unwrap()).is_err());
}
