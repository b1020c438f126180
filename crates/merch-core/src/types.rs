//! ============================================================================
//! Core Types for the Merch Store
//! ============================================================================
//! Mirrors of the on-chain `store` module objects (Product, Receipt,
//! DeliveryInfo) plus the derived store/admin record. All types serialize to
//! JSON so the CLI can print them.
//! ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::walrus;

/// Shown when a product has neither an image URL nor a blob id
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// A purchasable item, mirrored from a `store::Product` object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub object_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in MIST
    pub price: u64,
    pub stock: u64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub walrus_blob_id: Option<String>,
    /// Sequential id assigned by the store contract
    pub product_id: u64,
}

impl Product {
    /// Resolve which image to render: explicit URL, then blob, then placeholder
    pub fn image(&self, aggregator: &str) -> ProductImage {
        if let Some(url) = non_empty(&self.image_url) {
            ProductImage::Url(url.to_string())
        } else if let Some(blob_id) = non_empty(&self.walrus_blob_id) {
            ProductImage::Blob(walrus::blob_url(aggregator, blob_id))
        } else {
            ProductImage::Placeholder
        }
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Image source picked for a product
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductImage {
    Url(String),
    Blob(String),
    Placeholder,
}

impl ProductImage {
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) | Self::Blob(url) => url,
            Self::Placeholder => PLACEHOLDER_IMAGE,
        }
    }
}

/// Shipping details attached at checkout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub recipient_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub email: String,
    pub phone: String,
}

impl DeliveryInfo {
    /// Every field except `address_line2` must be non-empty.
    /// Reports the first missing field in form order.
    pub fn validate(&self) -> Result<()> {
        let required: [(&'static str, &str); 7] = [
            ("recipient_name", &self.recipient_name),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
            ("email", &self.email),
            ("phone", &self.phone),
        ];

        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(StoreError::required(*field)),
            None => Ok(()),
        }
    }
}

/// Proof of purchase owned by the buyer. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub object_id: String,
    /// Snapshot of the product name at purchase time
    pub product_name: String,
    pub product_id: u64,
    /// MIST actually paid
    pub price_paid: u64,
    pub buyer: String,
    #[serde(default)]
    pub walrus_blob_id: Option<String>,
    #[serde(default)]
    pub delivery_info: Option<DeliveryInfo>,
    /// Milliseconds since the Unix epoch (Sui clock)
    pub checkout_timestamp: u64,
}

/// The store object and the address allowed to manage it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreObject {
    pub object_id: String,
    pub admin: String,
}

impl StoreObject {
    /// Whether `account` may run the admin flows
    pub fn is_admin(&self, account: &str) -> bool {
        !account.trim().is_empty() && self.admin.eq_ignore_ascii_case(account.trim())
    }
}
