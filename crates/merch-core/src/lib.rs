//! ============================================================================
//! MERCH-CORE: On-chain merch storefront
//! ============================================================================
//! Everything between the UI and a Sui full node:
//! - Catalog rebuilt from ProductAdded events, deletions detected by absence
//! - Receipts owned by the connected account
//! - Cart store with change notification
//! - Move call builders for shopper and admin flows
//! - SUI/MIST conversion and Walrus blob URLs
//! ============================================================================

pub mod cart;
pub mod catalog;
pub mod config;
pub mod decode;
pub mod error;
pub mod gateway;
pub mod money;
pub mod poller;
pub mod storefront;
pub mod transactions;
pub mod types;
pub mod walrus;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use cart::{CartItem, CartStore, SubscriptionId};
pub use catalog::{sort_products, CatalogSource, EventLogCatalog, ProductSort};
pub use config::{Network, StoreConfig};
pub use error::{DecodeError, Result, StoreError};
pub use gateway::{ObjectGateway, SuiRpcClient, WalletSigner};
pub use poller::{CatalogPoller, CatalogSnapshot};
pub use storefront::Storefront;
pub use transactions::{CallArg, MoveCall, ProductDraft, TransactionBuilder};
pub use types::*;
