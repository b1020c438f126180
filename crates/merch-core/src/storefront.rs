//! ============================================================================
//! Storefront - Composition root
//! ============================================================================
//! Wires configuration, the gateway, the catalog, the transaction builder and
//! the shared cart. Write flows follow one path:
//!
//!   build (validate) -> wallet signs -> gateway executes -> check status
//!
//! Nothing local changes on success. Callers re-read the catalog or receipts
//! to observe the effect.
//! ============================================================================

use std::sync::Arc;
use tracing::{info, warn};

use crate::cart::CartStore;
use crate::catalog::{CatalogSource, EventLogCatalog};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::gateway::{ExecutionStatus, ObjectGateway, WalletSigner};
use crate::transactions::{MoveCall, ProductDraft, TransactionBuilder};
use crate::types::{DeliveryInfo, Product};

pub struct Storefront<G: ObjectGateway> {
    config: StoreConfig,
    gateway: Arc<G>,
    catalog: Arc<EventLogCatalog<G>>,
    builder: TransactionBuilder,
    cart: Arc<CartStore>,
}

impl<G: ObjectGateway + 'static> Storefront<G> {
    pub fn new(config: StoreConfig, gateway: Arc<G>) -> Self {
        info!(
            "Storefront on {} (package {})",
            config.network, config.package_id
        );
        Self {
            catalog: Arc::new(EventLogCatalog::new(Arc::clone(&gateway), config.clone())),
            builder: TransactionBuilder::new(config.package_id.clone()),
            cart: Arc::new(CartStore::new()),
            config,
            gateway,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn catalog(&self) -> Arc<EventLogCatalog<G>> {
        Arc::clone(&self.catalog)
    }

    pub fn builder(&self) -> &TransactionBuilder {
        &self.builder
    }

    pub fn cart(&self) -> Arc<CartStore> {
        Arc::clone(&self.cart)
    }

    /// Cart total in MIST
    pub fn cart_total(&self) -> u64 {
        self.cart.total_price()
    }

    /// Sign and execute a call, returning the transaction digest
    pub async fn submit(&self, call: MoveCall, signer: &dyn WalletSigner) -> Result<String> {
        info!("Submitting {} from {}", call.target, signer.address());

        let signed = signer.sign(&call).await?;
        let outcome = self.gateway.execute_transaction(&signed).await?;

        match outcome.status {
            ExecutionStatus::Success => {
                info!("Transaction {} succeeded", outcome.digest);
                Ok(outcome.digest)
            }
            ExecutionStatus::Failure(message) => {
                warn!("Transaction {} failed: {}", outcome.digest, message);
                Err(StoreError::Settlement {
                    digest: outcome.digest,
                    message,
                })
            }
        }
    }

    pub async fn purchase(&self, product: &Product, signer: &dyn WalletSigner) -> Result<String> {
        let call = self.builder.purchase(product)?;
        self.submit(call, signer).await
    }

    pub async fn checkout(
        &self,
        product: &Product,
        delivery: &DeliveryInfo,
        signer: &dyn WalletSigner,
    ) -> Result<String> {
        let call = self.builder.checkout(product, delivery)?;
        self.submit(call, signer).await
    }

    pub async fn create_store(&self, signer: &dyn WalletSigner) -> Result<String> {
        self.submit(self.builder.create_store(), signer).await
    }

    pub async fn add_product(&self, draft: &ProductDraft, signer: &dyn WalletSigner) -> Result<String> {
        let call = self
            .build_admin(|builder, store| builder.add_product(store, draft))
            .await?;
        self.submit(call, signer).await
    }

    pub async fn update_stock(
        &self,
        product_object_id: &str,
        new_stock: &str,
        signer: &dyn WalletSigner,
    ) -> Result<String> {
        let call = self
            .build_admin(|builder, store| builder.update_stock(store, product_object_id, new_stock))
            .await?;
        self.submit(call, signer).await
    }

    pub async fn delete_product(
        &self,
        product_object_id: &str,
        signer: &dyn WalletSigner,
    ) -> Result<String> {
        let call = self
            .build_admin(|builder, store| builder.delete_product(store, product_object_id))
            .await?;
        self.submit(call, signer).await
    }

    /// Build an admin call against the store.
    ///
    /// Builders check the store id last, so form errors surface before any
    /// lookup. Only when the sole problem is the missing store id is the store
    /// discovered from its creation event.
    pub async fn build_admin<F>(&self, build: F) -> Result<MoveCall>
    where
        F: Fn(&TransactionBuilder, Option<&str>) -> Result<MoveCall>,
    {
        let pinned = self.config.store_id.as_deref();
        match build(&self.builder, pinned) {
            Err(StoreError::Validation {
                field: "store_id", ..
            }) if pinned.is_none() => {
                let store = self.catalog.find_store().await?;
                build(&self.builder, store.as_ref().map(|s| s.object_id.as_str()))
            }
            other => other,
        }
    }
}
