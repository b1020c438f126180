//! ============================================================================
//! Transaction Builders - Move call shapes for the `store` module
//! ============================================================================
//! Each builder validates its input and returns the MoveCall the wallet should
//! sign. No network I/O happens here: a missing field stops construction with
//! a field-level validation error before anything reaches the wallet.
//!
//! Entry points:
//!   create_store()
//!   add_product(store, name, description, price, stock, image_url)
//!   update_stock(store, product, new_stock)
//!   delete_product(store, product)
//!   purchase(product, payment)
//!   checkout(product, payment, 8 delivery fields)
//! ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::money;
use crate::types::{DeliveryInfo, Product};

/// Move module holding every store entry point
pub const STORE_MODULE: &str = "store";

/// One positional argument of a Move call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CallArg {
    /// Object reference by id
    Object(String),
    /// Pure u64
    U64(u64),
    /// Pure vector<u8> (text fields are UTF-8 encoded)
    Bytes(Vec<u8>),
    /// Coin split from the gas coin for this many MIST
    GasCoin(u64),
}

impl CallArg {
    /// Text fields are trimmed before encoding
    fn text(value: &str) -> Self {
        Self::Bytes(value.trim().as_bytes().to_vec())
    }
}

/// A fully-specified call ready for signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCall {
    /// `{package}::store::{function}`
    pub target: String,
    pub arguments: Vec<CallArg>,
}

impl MoveCall {
    /// Total MIST this call pays out of the gas coin
    pub fn payment(&self) -> u64 {
        self.arguments
            .iter()
            .map(|arg| match arg {
                CallArg::GasCoin(amount) => *amount,
                _ => 0,
            })
            .sum()
    }
}

/// Raw admin form input for a new product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    /// SUI as typed, e.g. "0.5"
    pub price: String,
    pub stock: String,
    pub image_url: String,
}

/// Builds calls against one deployed package
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    package_id: String,
}

impl TransactionBuilder {
    pub fn new(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
        }
    }

    fn call(&self, function: &str, arguments: Vec<CallArg>) -> MoveCall {
        MoveCall {
            target: format!("{}::{}::{}", self.package_id, STORE_MODULE, function),
            arguments,
        }
    }

    pub fn create_store(&self) -> MoveCall {
        self.call("create_store", Vec::new())
    }

    pub fn add_product(&self, store_id: Option<&str>, draft: &ProductDraft) -> Result<MoveCall> {
        let name = required_text("name", &draft.name)?;
        let description = required_text("description", &draft.description)?;
        let price = money::parse_sui(&draft.price)?;
        let stock = parse_count("stock", &draft.stock)?;
        let image_url = required_text("image_url", &draft.image_url)?;
        let store = store_object(store_id)?;

        Ok(self.call(
            "add_product",
            vec![
                CallArg::Object(store),
                CallArg::text(name),
                CallArg::text(description),
                CallArg::U64(price),
                CallArg::U64(stock),
                CallArg::text(image_url),
            ],
        ))
    }

    pub fn update_stock(
        &self,
        store_id: Option<&str>,
        product_object_id: &str,
        new_stock: &str,
    ) -> Result<MoveCall> {
        let product = object_id("product_id", product_object_id)?;
        let stock = parse_count("stock", new_stock)?;
        let store = store_object(store_id)?;

        Ok(self.call(
            "update_stock",
            vec![
                CallArg::Object(store),
                CallArg::Object(product),
                CallArg::U64(stock),
            ],
        ))
    }

    pub fn delete_product(&self, store_id: Option<&str>, product_object_id: &str) -> Result<MoveCall> {
        let product = object_id("product_id", product_object_id)?;
        let store = store_object(store_id)?;

        Ok(self.call(
            "delete_product",
            vec![CallArg::Object(store), CallArg::Object(product)],
        ))
    }

    /// Quick purchase: pay the listed price, receive a receipt
    pub fn purchase(&self, product: &Product) -> Result<MoveCall> {
        let product_id = object_id("product_id", &product.object_id)?;

        Ok(self.call(
            "purchase",
            vec![CallArg::Object(product_id), CallArg::GasCoin(product.price)],
        ))
    }

    /// Purchase with shipping details recorded on the receipt
    pub fn checkout(&self, product: &Product, delivery: &DeliveryInfo) -> Result<MoveCall> {
        let product_id = object_id("product_id", &product.object_id)?;
        delivery.validate()?;

        Ok(self.call(
            "checkout",
            vec![
                CallArg::Object(product_id),
                CallArg::GasCoin(product.price),
                CallArg::text(&delivery.recipient_name),
                CallArg::text(&delivery.address_line1),
                CallArg::text(&delivery.address_line2),
                CallArg::text(&delivery.city),
                CallArg::text(&delivery.postal_code),
                CallArg::text(&delivery.country),
                CallArg::text(&delivery.email),
                CallArg::text(&delivery.phone),
            ],
        ))
    }
}

fn required_text<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(StoreError::required(field))
    } else {
        Ok(trimmed)
    }
}

fn parse_count(field: &'static str, value: &str) -> Result<u64> {
    let text = required_text(field, value)?;
    text.parse::<u64>()
        .map_err(|_| StoreError::validation(field, format!("'{}' is not a whole number", text)))
}

fn store_object(store_id: Option<&str>) -> Result<String> {
    match store_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => object_id("store_id", id),
        None => Err(StoreError::validation(
            "store_id",
            "store not found, create a store first",
        )),
    }
}

/// Object ids are `0x` followed by 1..=64 hex digits
fn object_id(field: &'static str, value: &str) -> Result<String> {
    let id = required_text(field, value)?;
    let digits = id
        .strip_prefix("0x")
        .ok_or_else(|| StoreError::validation(field, format!("'{}' must start with 0x", id)))?;

    if digits.is_empty() || digits.len() > 64 {
        return Err(StoreError::validation(field, format!("'{}' has the wrong length", id)));
    }

    // hex::decode wants an even number of digits
    let padded = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };
    hex::decode(&padded)
        .map_err(|_| StoreError::validation(field, format!("'{}' is not hex", id)))?;

    Ok(id.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKG: &str = "0xee3b";
    const STORE: &str = "0x5a";

    fn product() -> Product {
        Product {
            object_id: "0xa1".into(),
            name: "Hoodie".into(),
            description: None,
            price: 500_000_000,
            stock: 3,
            image_url: None,
            walrus_blob_id: None,
            product_id: 1,
        }
    }

    fn delivery() -> DeliveryInfo {
        DeliveryInfo {
            recipient_name: "Ada".into(),
            address_line1: "1 Main St".into(),
            address_line2: String::new(),
            city: "Paris".into(),
            postal_code: "75001".into(),
            country: "FR".into(),
            email: "ada@example.com".into(),
            phone: "+33 1".into(),
        }
    }

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Hoodie".into(),
            description: "Warm".into(),
            price: "0.5".into(),
            stock: "10".into(),
            image_url: "https://cdn.example/h.png".into(),
        }
    }

    #[test]
    fn test_create_store_target() {
        let call = TransactionBuilder::new(PKG).create_store();
        assert_eq!(call.target, "0xee3b::store::create_store");
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_add_product_encoding() {
        let call = TransactionBuilder::new(PKG)
            .add_product(Some(STORE), &draft())
            .unwrap();

        assert_eq!(call.target, "0xee3b::store::add_product");
        assert_eq!(
            call.arguments,
            vec![
                CallArg::Object(STORE.into()),
                CallArg::Bytes(b"Hoodie".to_vec()),
                CallArg::Bytes(b"Warm".to_vec()),
                CallArg::U64(500_000_000),
                CallArg::U64(10),
                CallArg::Bytes(b"https://cdn.example/h.png".to_vec()),
            ]
        );
    }

    #[test]
    fn test_add_product_validation() {
        let builder = TransactionBuilder::new(PKG);

        let mut missing_name = draft();
        missing_name.name = "  ".into();
        assert!(matches!(
            builder.add_product(Some(STORE), &missing_name),
            Err(StoreError::Validation { field: "name", .. })
        ));

        let mut bad_stock = draft();
        bad_stock.stock = "-1".into();
        assert!(matches!(
            builder.add_product(Some(STORE), &bad_stock),
            Err(StoreError::Validation { field: "stock", .. })
        ));

        let mut negative_price = draft();
        negative_price.price = "-0.5".into();
        assert!(matches!(
            builder.add_product(Some(STORE), &negative_price),
            Err(StoreError::Validation { field: "price", .. })
        ));

        assert!(matches!(
            builder.add_product(None, &draft()),
            Err(StoreError::Validation { field: "store_id", .. })
        ));
    }

    #[test]
    fn test_update_and_delete() {
        let builder = TransactionBuilder::new(PKG);

        let update = builder.update_stock(Some(STORE), "0xA1", "7").unwrap();
        assert_eq!(update.target, "0xee3b::store::update_stock");
        assert_eq!(
            update.arguments,
            vec![
                CallArg::Object(STORE.into()),
                CallArg::Object("0xa1".into()),
                CallArg::U64(7),
            ]
        );

        let delete = builder.delete_product(Some(STORE), "0xa1").unwrap();
        assert_eq!(
            delete.arguments,
            vec![CallArg::Object(STORE.into()), CallArg::Object("0xa1".into())]
        );

        assert!(matches!(
            builder.update_stock(Some(STORE), "", "7"),
            Err(StoreError::Validation { field: "product_id", .. })
        ));
        assert!(matches!(
            builder.delete_product(Some(STORE), "a1"),
            Err(StoreError::Validation { field: "product_id", .. })
        ));
        assert!(matches!(
            builder.delete_product(Some(STORE), "0xzz"),
            Err(StoreError::Validation { field: "product_id", .. })
        ));
        assert!(matches!(
            builder.delete_product(Some(" "), "0xa1"),
            Err(StoreError::Validation { field: "store_id", .. })
        ));
    }

    #[test]
    fn test_purchase_pays_listed_price() {
        let call = TransactionBuilder::new(PKG).purchase(&product()).unwrap();
        assert_eq!(call.target, "0xee3b::store::purchase");
        assert_eq!(
            call.arguments,
            vec![CallArg::Object("0xa1".into()), CallArg::GasCoin(500_000_000)]
        );
        assert_eq!(call.payment(), 500_000_000);
    }

    #[test]
    fn test_checkout_encodes_delivery_in_order() {
        let call = TransactionBuilder::new(PKG)
            .checkout(&product(), &delivery())
            .unwrap();

        assert_eq!(call.target, "0xee3b::store::checkout");
        assert_eq!(call.arguments.len(), 10);
        assert_eq!(call.arguments[2], CallArg::Bytes(b"Ada".to_vec()));
        assert_eq!(call.arguments[4], CallArg::Bytes(Vec::new()));
        assert_eq!(call.arguments[8], CallArg::Bytes(b"ada@example.com".to_vec()));
        assert_eq!(call.arguments[9], CallArg::Bytes(b"+33 1".to_vec()));
    }

    #[test]
    fn test_checkout_trims_delivery_fields() {
        let mut info = delivery();
        info.recipient_name = "  Ada ".into();
        info.address_line2 = "   ".into();
        info.email = "ada@example.com\n".into();

        let call = TransactionBuilder::new(PKG).checkout(&product(), &info).unwrap();
        assert_eq!(call.arguments[2], CallArg::Bytes(b"Ada".to_vec()));
        assert_eq!(call.arguments[4], CallArg::Bytes(Vec::new()));
        assert_eq!(call.arguments[8], CallArg::Bytes(b"ada@example.com".to_vec()));
    }

    #[test]
    fn test_checkout_rejects_empty_email() {
        let mut info = delivery();
        info.email.clear();
        assert!(matches!(
            TransactionBuilder::new(PKG).checkout(&product(), &info),
            Err(StoreError::Validation { field: "email", .. })
        ));
    }

    #[test]
    fn test_call_serializes_for_wallets() {
        let call = TransactionBuilder::new(PKG).purchase(&product()).unwrap();
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["target"], "0xee3b::store::purchase");
        assert_eq!(json["arguments"][0]["kind"], "object");
        assert_eq!(json["arguments"][1]["kind"], "gas_coin");
        assert_eq!(json["arguments"][1]["value"], 500_000_000);
    }
}
