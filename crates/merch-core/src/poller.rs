//! ============================================================================
//! Catalog Poller - Periodic background refresh
//! ============================================================================
//! Pattern: Arc<source> -> tokio::spawn -> interval tick -> watch channel
//!
//! The poller refreshes once at start and then on every tick. A failed refresh
//! keeps the last products and records the error; the next tick is the only
//! retry. Dropping the poller aborts the task.
//! ============================================================================

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::catalog::CatalogSource;
use crate::types::Product;

/// Latest view of the catalog published by the poller
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub products: Vec<Product>,
    /// Error text of the most recent failed refresh, cleared on success
    pub last_error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Number of completed refresh attempts
    pub generation: u64,
}

pub struct CatalogPoller {
    handle: JoinHandle<()>,
    snapshots: watch::Receiver<CatalogSnapshot>,
}

impl CatalogPoller {
    /// Start polling `source` every `interval`. Must be called inside a tokio runtime.
    pub fn spawn<S>(source: Arc<S>, interval: Duration) -> Self
    where
        S: CatalogSource + ?Sized + 'static,
    {
        let (tx, rx) = watch::channel(CatalogSnapshot::default());

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let result = source.list_products().await;

                tx.send_modify(|snapshot| {
                    snapshot.generation += 1;
                    snapshot.refreshed_at = Some(Utc::now());
                    match result {
                        Ok(products) => {
                            info!(
                                "Catalog refresh #{}: {} products",
                                snapshot.generation,
                                products.len()
                            );
                            snapshot.products = products;
                            snapshot.last_error = None;
                        }
                        Err(e) => {
                            warn!(
                                "Catalog refresh #{} failed (retryable: {}): {}",
                                snapshot.generation,
                                e.is_retryable(),
                                e
                            );
                            snapshot.last_error = Some(e.to_string());
                        }
                    }
                });

                if tx.is_closed() {
                    break;
                }
            }
        });

        Self {
            handle,
            snapshots: rx,
        }
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<CatalogSnapshot> {
        self.snapshots.clone()
    }

    /// Copy of the latest snapshot
    pub fn latest(&self) -> CatalogSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for CatalogPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EventLogCatalog;
    use crate::config::StoreConfig;
    use crate::testing::MemoryGateway;
    use serde_json::json;

    fn source(gw: &Arc<MemoryGateway>) -> Arc<EventLogCatalog<MemoryGateway>> {
        Arc::new(EventLogCatalog::new(
            Arc::clone(gw),
            StoreConfig {
                package_id: "0xpkg".into(),
                ..StoreConfig::default()
            },
        ))
    }

    async fn next(rx: &mut watch::Receiver<CatalogSnapshot>) -> CatalogSnapshot {
        rx.changed().await.unwrap();
        rx.borrow_and_update().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_last_products() {
        let gw = Arc::new(MemoryGateway::new());
        gw.emit("T1", "0xpkg::store::ProductAdded", json!({}));
        gw.record_created("T1", "0xp1", "0xpkg::store::Product");
        gw.put_object(
            "0xp1",
            "0xpkg::store::Product",
            json!({ "name": "Hoodie", "price": "1", "stock": "1", "product_id": "1" }),
        );

        let poller = CatalogPoller::spawn(source(&gw), Duration::from_secs(10));
        let mut rx = poller.subscribe();

        let first = next(&mut rx).await;
        assert_eq!(first.generation, 1);
        assert_eq!(first.products.len(), 1);
        assert!(first.last_error.is_none());

        gw.set_failing(true);
        let second = next(&mut rx).await;
        assert_eq!(second.generation, 2);
        assert_eq!(second.products.len(), 1);
        assert!(second.last_error.is_some());

        gw.set_failing(false);
        gw.delete_object("0xp1");
        let third = next(&mut rx).await;
        assert!(third.products.is_empty());
        assert!(third.last_error.is_none());

        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let gw = Arc::new(MemoryGateway::new());
        let poller = CatalogPoller::spawn(source(&gw), Duration::from_secs(10));
        let mut rx = poller.subscribe();
        next(&mut rx).await;

        drop(poller);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(gw.call_count(), 1);
        assert_eq!(rx.borrow().generation, 1);
    }
}
