//! Periodic refresh driving one resource collector
//!
//! Each cycle acquires fresh domain objects and writes them to the store.
//! A cycle that yields nothing leaves the store as it was, so scrapes keep
//! serving the last good values.

use crate::collectors::clients::ClientFactory;
use crate::collectors::ResourceCollector;
use crate::metrics::{Identified, MetricsStore};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

pub struct RefreshLoop<C: ResourceCollector> {
    name: &'static str,
    collector: C,
    store: Arc<MetricsStore<C::Value>>,
    clients: Arc<dyn ClientFactory>,
    interval: Duration,
}

impl<C: ResourceCollector> RefreshLoop<C> {
    pub fn new(
        name: &'static str,
        collector: C,
        store: Arc<MetricsStore<C::Value>>,
        clients: Arc<dyn ClientFactory>,
        interval: Duration,
    ) -> Self {
        Self {
            name,
            collector,
            store,
            clients,
            interval,
        }
    }

    /// Run one acquire-and-write cycle, returning how many objects were written
    pub async fn refresh_once(&self) -> usize {
        let objs = self.collector.acquire(self.clients.as_ref()).await;

        if objs.is_empty() {
            debug!("{}: no result this cycle, keeping previous metrics", self.name);
            return 0;
        }

        for obj in &objs {
            self.store.update(obj);
            debug!("{}: updated {}", self.name, obj.identity());
        }

        objs.len()
    }

    /// Refresh until `shutdown` is cancelled.
    ///
    /// A panicking cycle is logged and retried after an exponential back-off;
    /// the loop itself only ends on shutdown.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            "Starting {} refresh loop (interval {:?})",
            self.name, self.interval
        );

        let mut backoff = INITIAL_BACKOFF;

        while !shutdown.is_cancelled() {
            let wait = match AssertUnwindSafe(self.refresh_once()).catch_unwind().await {
                Ok(written) => {
                    debug!("{}: cycle complete, {} objects written", self.name, written);
                    backoff = INITIAL_BACKOFF;
                    self.interval
                }
                Err(panic) => {
                    error!(
                        "{} refresh cycle panicked: {}, restarting in {:?}",
                        self.name,
                        panic_message(panic.as_ref()),
                        backoff
                    );
                    let wait = backoff;
                    backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
                    wait
                }
            };

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        info!("{} refresh loop stopped", self.name);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
