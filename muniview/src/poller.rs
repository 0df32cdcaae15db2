use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::app::Event;
use crate::cache::Cache;
use crate::feed::{self, FeedClient};

/// How long to wait after the Nth consecutive fetch failure. Delays grow
/// linearly so a flaky feed isn't hammered, but stop growing at `cap * base`
/// instead of climbing forever.
pub fn retry_delay(base: Duration, failures: u32, cap: u32) -> Duration {
    base * failures.clamp(1, cap.max(1))
}

/// Polls vehicle locations forever. Each result is tagged with the filter it
/// was fetched under, so the main loop can discard responses that raced a
/// selection change. A selection change also interrupts any pending sleep and
/// refetches immediately; the in-flight request itself is never aborted.
pub async fn poll_vehicles(
    client: FeedClient,
    interval: Duration,
    backoff_cap: u32,
    mut selection: watch::Receiver<Option<String>>,
    tx: mpsc::UnboundedSender<Event>,
) {
    let mut failures: u32 = 0;
    loop {
        let filter = selection.borrow_and_update().clone();
        match client.vehicle_locations(filter.as_deref()).await {
            Ok(vehicles) => {
                failures = 0;
                if tx.send(Event::Vehicles { vehicles, filter }).is_err() {
                    return;
                }
            }
            Err(err) => {
                failures += 1;
                warn!("Fetching vehicles failed ({} in a row): {}", failures, err);
            }
        }

        let delay = if failures == 0 {
            interval
        } else {
            retry_delay(interval, failures, backoff_cap)
        };
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = selection.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

/// Resolves the route list (tag to title pairs) once: from the cache when
/// possible, otherwise from the feed, caching the payload for next time.
/// Failure isn't critical; the UI just shows bare tags.
pub async fn fetch_route_list(client: FeedClient, cache: Cache, tx: mpsc::UnboundedSender<Event>) {
    if let Some(raw) = cache.get("routes") {
        match feed::parse_route_list(&raw) {
            Ok(pairs) => {
                let _ = tx.send(Event::Routes { pairs });
                return;
            }
            Err(err) => warn!("Ignoring the cached route list: {}", err),
        }
    }
    match client.fetch_route_list().await {
        Ok(raw) => match feed::parse_route_list(&raw) {
            Ok(pairs) => {
                if let Err(err) = cache.put("routes", &raw) {
                    warn!("Couldn't cache the route list: {}", err);
                }
                let _ = tx.send(Event::Routes { pairs });
            }
            Err(err) => warn!("The route list response made no sense: {}", err),
        },
        Err(err) => warn!("Fetching the route list failed; showing bare tags: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_linearly_up_to_the_cap() {
        let base = Duration::from_secs(15);
        assert_eq!(retry_delay(base, 1, 8), Duration::from_secs(15));
        assert_eq!(retry_delay(base, 2, 8), Duration::from_secs(30));
        assert_eq!(retry_delay(base, 3, 8), Duration::from_secs(45));
        assert_eq!(retry_delay(base, 8, 8), Duration::from_secs(120));
        assert_eq!(retry_delay(base, 9, 8), Duration::from_secs(120));
        assert_eq!(retry_delay(base, 1000, 8), Duration::from_secs(120));
    }

    #[test]
    fn degenerate_inputs_still_wait() {
        let base = Duration::from_secs(15);
        assert_eq!(retry_delay(base, 0, 8), base);
        assert_eq!(retry_delay(base, 5, 0), base);
    }
}
