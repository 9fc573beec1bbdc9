use std::time::Duration;

use serde::Deserialize;

use crate::hub::{DeliveryPolicy, HubConfig};
use crate::producer::heartbeat::DEFAULT_INTERVAL;

/// Top-level configuration settings for the application.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub hub: HubSettings,
    pub heartbeat: HeartbeatSettings,
    pub log: LogSettings,
}

/// Defines the host and port the websocket server binds to.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Block,
    Evict,
}

/// Queue sizing and slow-subscriber handling for the hub.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HubSettings {
    pub subscriber_capacity: usize,
    pub delivery: DeliveryMode,
    /// Only used with `delivery = "evict"`.
    pub delivery_timeout_ms: u64,
    /// Pending publishes allowed before producers have to wait.
    pub publish_capacity: usize,
}

impl From<&HubSettings> for HubConfig {
    fn from(settings: &HubSettings) -> Self {
        let delivery = match settings.delivery {
            DeliveryMode::Block => DeliveryPolicy::Block,
            DeliveryMode::Evict => DeliveryPolicy::Evict {
                timeout: Duration::from_millis(settings.delivery_timeout_ms),
            },
        };

        HubConfig {
            subscriber_capacity: settings.subscriber_capacity,
            delivery,
            publish_capacity: settings.publish_capacity,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HeartbeatSettings {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl HeartbeatSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled in from [`Settings::default`].
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub hub: Option<PartialHubSettings>,
    pub heartbeat: Option<PartialHeartbeatSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialHubSettings {
    pub subscriber_capacity: Option<usize>,
    pub delivery: Option<DeliveryMode>,
    pub delivery_timeout_ms: Option<u64>,
    pub publish_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialHeartbeatSettings {
    pub enabled: Option<bool>,
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl PartialSettings {
    /// Overlays whatever was provided on top of `defaults`.
    pub fn merge_onto(self, defaults: Settings) -> Settings {
        let server = self.server.unwrap_or_default();
        let hub = self.hub.unwrap_or_default();
        let heartbeat = self.heartbeat.unwrap_or_default();
        let log = self.log.unwrap_or_default();

        Settings {
            server: ServerSettings {
                host: server.host.unwrap_or(defaults.server.host),
                port: server.port.unwrap_or(defaults.server.port),
            },
            hub: HubSettings {
                subscriber_capacity: hub
                    .subscriber_capacity
                    .unwrap_or(defaults.hub.subscriber_capacity),
                delivery: hub.delivery.unwrap_or(defaults.hub.delivery),
                delivery_timeout_ms: hub
                    .delivery_timeout_ms
                    .unwrap_or(defaults.hub.delivery_timeout_ms),
                publish_capacity: hub
                    .publish_capacity
                    .unwrap_or(defaults.hub.publish_capacity),
            },
            heartbeat: HeartbeatSettings {
                enabled: heartbeat.enabled.unwrap_or(defaults.heartbeat.enabled),
                interval_secs: heartbeat
                    .interval_secs
                    .unwrap_or(defaults.heartbeat.interval_secs),
            },
            log: LogSettings {
                level: log.level.unwrap_or(defaults.log.level),
            },
        }
    }
}

/// Provides default values for `Settings`.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8085,
            },
            hub: HubSettings {
                subscriber_capacity: HubConfig::DEFAULT_SUBSCRIBER_CAPACITY,
                delivery: DeliveryMode::Block,
                delivery_timeout_ms: 5000,
                publish_capacity: HubConfig::DEFAULT_PUBLISH_CAPACITY,
            },
            heartbeat: HeartbeatSettings {
                enabled: true,
                interval_secs: DEFAULT_INTERVAL.as_secs(),
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}
