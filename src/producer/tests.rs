use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use super::heartbeat::{heartbeat_message, run_heartbeat};
use crate::hub::{Hub, HubConfig};

#[test]
fn test_heartbeat_message_format() {
    let now = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
    assert_eq!(
        heartbeat_message(&now),
        "The Current Time Is 2024-03-09 07:05:01"
    );
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_publishes_on_interval() {
    let cancel = CancellationToken::new();
    let (hub, worker) = Hub::start(HubConfig::default(), cancel.clone());
    let mut subscription = hub.subscribe();
    hub.stats().await.unwrap();

    let period = Duration::from_secs(10);
    let producer = tokio::spawn(run_heartbeat(hub.publisher(), period, cancel.clone()));

    // Nothing before the first full period has elapsed.
    let early = tokio::time::timeout(Duration::from_secs(9), subscription.recv()).await;
    assert!(early.is_err());

    for _ in 0..2 {
        let msg = subscription.recv().await.unwrap();
        assert!(msg.as_str().starts_with("The Current Time Is "));
    }

    cancel.cancel();
    producer.await.unwrap();
    worker.await.unwrap();
    assert!(subscription.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_stops_on_cancel() {
    let cancel = CancellationToken::new();
    let (hub, _worker) = Hub::start(HubConfig::default(), CancellationToken::new());

    cancel.cancel();
    run_heartbeat(hub.publisher(), Duration::from_secs(10), cancel).await;

    assert_eq!(hub.stats().await.unwrap().published, 0);
}

#[tokio::test(start_paused = true)]
async fn test_heartbeat_waiting_on_stalled_hub_stops_on_cancel() {
    let config = HubConfig {
        publish_capacity: 1,
        ..HubConfig::default()
    };
    let (hub, _worker) = Hub::start(config, CancellationToken::new());
    let _idle = hub.subscribe();
    hub.publish("fills the queue").await;
    hub.publish("stalls the worker").await;

    let cancel = CancellationToken::new();
    let producer = tokio::spawn(run_heartbeat(
        hub.publisher(),
        Duration::from_secs(1),
        cancel.clone(),
    ));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!producer.is_finished());

    cancel.cancel();
    producer.await.unwrap();
}
