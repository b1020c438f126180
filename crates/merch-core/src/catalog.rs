//! ============================================================================
//! Catalog - Rebuild the product list from the chain's event log
//! ============================================================================
//! The chain offers no "list products" query. The live catalog is derived:
//!
//! 1. query `ProductAdded` events (oldest first, one page of 50)
//! 2. fetch the distinct transactions that emitted them
//! 3. collect the `store::Product` objects those transactions created
//! 4. read the objects in one batch; deleted ones come back missing
//! 5. decode what is left
//!
//! Nothing is cached. Every call re-reads the chain and is safe to repeat.
//! ============================================================================

use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::decode::{decode_product, decode_receipt};
use crate::error::{Result, StoreError};
use crate::gateway::{EventOrder, ObjectGateway, ObjectRead};
use crate::types::{Product, Receipt, StoreObject};

/// Largest page requested from `suix_queryEvents`
pub const EVENT_QUERY_LIMIT: usize = 50;

/// Read side of the storefront
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Live products in discovery order
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Receipts owned by `owner`; empty when no account is connected
    async fn list_receipts(&self, owner: Option<&str>) -> Result<Vec<Receipt>>;

    /// The most recently created store, if any
    async fn find_store(&self) -> Result<Option<StoreObject>>;
}

/// Catalog reconstructed from events, transactions and object reads
pub struct EventLogCatalog<G: ObjectGateway> {
    gateway: Arc<G>,
    config: StoreConfig,
}

impl<G: ObjectGateway> EventLogCatalog<G> {
    pub fn new(gateway: Arc<G>, config: StoreConfig) -> Self {
        Self { gateway, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// True when a store exists and `account` is its admin
    pub async fn is_admin(&self, account: &str) -> Result<bool> {
        Ok(self
            .find_store()
            .await?
            .map(|store| store.is_admin(account))
            .unwrap_or(false))
    }

    /// Ids of Product objects created by the transactions behind `ProductAdded`
    async fn discover_product_ids(&self) -> Result<Vec<String>> {
        let events = self
            .gateway
            .query_events(
                &self.config.store_member("ProductAdded"),
                EventOrder::Ascending,
                EVENT_QUERY_LIMIT,
            )
            .await?;

        if events.is_empty() {
            debug!("No ProductAdded events");
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let digests: Vec<&str> = events
            .iter()
            .map(|event| event.id.tx_digest.as_str())
            .filter(|digest| seen.insert(*digest))
            .collect();

        debug!(
            "{} ProductAdded events across {} transactions",
            events.len(),
            digests.len()
        );

        let transactions =
            try_join_all(digests.iter().map(|digest| self.gateway.get_transaction(digest))).await?;

        let product_type = self.config.store_member("Product");
        let mut seen_ids = HashSet::new();
        let ids = transactions
            .iter()
            .flat_map(|tx| tx.created_of_type(&product_type))
            .filter(|id| seen_ids.insert(id.to_string()))
            .map(str::to_string)
            .collect();

        Ok(ids)
    }
}

#[async_trait]
impl<G: ObjectGateway> CatalogSource for EventLogCatalog<G> {
    async fn list_products(&self) -> Result<Vec<Product>> {
        if !self.config.is_configured() {
            debug!("Package id not configured, returning empty catalog");
            return Ok(Vec::new());
        }

        let ids = self.discover_product_ids().await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let reads = self.gateway.multi_get_objects(&ids).await?;

        let mut products = Vec::with_capacity(reads.len());
        let mut deleted = 0usize;
        for read in reads {
            match read {
                ObjectRead::Present(object) => match decode_product(&object) {
                    Ok(product) => products.push(product),
                    Err(e) => warn!("Skipping undecodable product: {}", e),
                },
                ObjectRead::Missing { object_id, reason } => {
                    debug!("Product {} gone: {}", object_id, reason);
                    deleted += 1;
                }
            }
        }

        info!(
            "Catalog: {} live products ({} deleted)",
            products.len(),
            deleted
        );
        Ok(products)
    }

    async fn list_receipts(&self, owner: Option<&str>) -> Result<Vec<Receipt>> {
        let owner = match owner {
            Some(owner) if !owner.trim().is_empty() => owner,
            _ => return Ok(Vec::new()),
        };
        if !self.config.is_configured() {
            return Ok(Vec::new());
        }

        let reads = self
            .gateway
            .get_owned_objects(owner, &self.config.store_member("Receipt"))
            .await?;

        let receipts: Vec<Receipt> = reads
            .into_iter()
            .filter_map(ObjectRead::into_present)
            .filter_map(|object| match decode_receipt(&object) {
                Ok(receipt) => Some(receipt),
                Err(e) => {
                    warn!("Skipping undecodable receipt: {}", e);
                    None
                }
            })
            .collect();

        info!("Found {} receipts for {}", receipts.len(), owner);
        Ok(receipts)
    }

    async fn find_store(&self) -> Result<Option<StoreObject>> {
        if !self.config.is_configured() {
            return Ok(None);
        }

        let events = self
            .gateway
            .query_events(
                &self.config.store_member("StoreCreated"),
                EventOrder::Descending,
                EVENT_QUERY_LIMIT,
            )
            .await?;

        let Some(latest) = events.first() else {
            debug!("No StoreCreated event found");
            return Ok(None);
        };

        let text = |key: &str| {
            latest
                .parsed_json
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        match (text("store_id"), text("admin")) {
            (Some(object_id), Some(admin)) => Ok(Some(StoreObject { object_id, admin })),
            _ => {
                warn!("StoreCreated event in {} is missing store_id or admin", latest.id.tx_digest);
                Ok(None)
            }
        }
    }
}

/// Display order for a product list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    /// Most recently discovered first
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

impl ProductSort {
    pub const ALL: [ProductSort; 4] = [
        Self::Newest,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::NameAsc,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::NameAsc => "name-asc",
        }
    }
}

impl fmt::Display for ProductSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProductSort {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|sort| sort.label() == wanted)
            .ok_or_else(|| {
                StoreError::validation(
                    "sort",
                    format!(
                        "unknown order '{}'. Valid values: newest, price-asc, price-desc, name-asc",
                        s
                    ),
                )
            })
    }
}

/// Reorder products in place. Input is expected in discovery order.
/// Sorts are stable, so equal keys keep their relative order.
pub fn sort_products(products: &mut [Product], order: ProductSort) {
    match order {
        ProductSort::Newest => products.reverse(),
        ProductSort::PriceAsc => products.sort_by_key(|p| p.price),
        ProductSort::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
        ProductSort::NameAsc => products.sort_by_cached_key(|p| p.name.to_lowercase()),
    }
}
