//! Shared helpers for lifecycle and HTTP integration tests.

use std::path::Path;
use std::time::Duration;

use mbtiles_server::{Event, ServerOptions};
use tokio::sync::broadcast;

#[allow(dead_code)]
pub fn options(port: u16, cache: &Path) -> ServerOptions {
    ServerOptions {
        port: Some(port),
        domain: Some("localhost".into()),
        cache: Some(cache.to_path_buf()),
    }
}

/// Wait for the next event matching the predicate, with a timeout.
#[allow(dead_code)]
pub async fn wait_for<F>(rx: &mut broadcast::Receiver<Event>, mut pred: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for lifecycle event")
}

/// GET a URL as JSON, retrying while the server is briefly unreachable
/// between restart cycles.
#[allow(dead_code)]
pub async fn get_json(url: &str) -> serde_json::Value {
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    for _ in 0..50 {
        match client.get(url).send().await {
            Ok(res) => {
                return res
                    .json()
                    .await
                    .expect("info endpoint returned invalid JSON");
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
    panic!("server at {url} did not become reachable");
}
