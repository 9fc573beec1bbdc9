use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::hub::Publisher;

/// Period used when the configuration does not set one.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Text published on every heartbeat tick.
pub fn heartbeat_message<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("The Current Time Is {}", now.format(TIME_FORMAT))
}

/// Publishes the current local time every `period` until `cancel` fires.
///
/// The first message goes out one full period after the call, not
/// immediately.
pub async fn run_heartbeat(publisher: Publisher, period: Duration, cancel: CancellationToken) {
    let mut ticker = time::interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                // a stalled hub can hold the publish; shutdown must not wait on it
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = publisher.publish(heartbeat_message(&Local::now())) => {}
                }
            }
        }
    }

    debug!("Heartbeat producer stopped");
}
