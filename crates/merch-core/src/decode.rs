//! ============================================================================
//! Object Decoding - Move field maps to typed records
//! ============================================================================
//! Object content comes back as loosely-typed JSON. Every field goes through
//! an explicit check here so malformed on-chain data becomes a DecodeError
//! naming the object and field, never a silently defaulted value.
//!
//! Move JSON conventions handled:
//! - u64 as a decimal string (JSON numbers are accepted too)
//! - Option<T> as null, the bare value, or {"vec": [..]}
//! - nested structs as {"type": .., "fields": {..}} or a flat object
//! - vector<u8> as an array of byte values (decoded as UTF-8)
//! ============================================================================

use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::gateway::MoveObject;
use crate::types::{DeliveryInfo, Product, Receipt};

/// Map a `store::Product` object onto a Product
pub fn decode_product(object: &MoveObject) -> Result<Product, DecodeError> {
    let fields = Fields::new(&object.object_id, &object.fields);

    Ok(Product {
        object_id: object.object_id.clone(),
        name: fields.string("name")?,
        description: fields.opt_string("description")?,
        price: fields.u64("price")?,
        stock: fields.u64("stock")?,
        image_url: fields.opt_string("image_url")?,
        walrus_blob_id: fields.opt_string("walrus_blob_id")?,
        product_id: fields.u64("product_id")?,
    })
}

/// Map a `store::Receipt` object onto a Receipt
pub fn decode_receipt(object: &MoveObject) -> Result<Receipt, DecodeError> {
    let fields = Fields::new(&object.object_id, &object.fields);

    let delivery_info = match fields.optional("delivery_info") {
        Some(value) => Some(decode_delivery(&object.object_id, value)?),
        None => None,
    };

    Ok(Receipt {
        object_id: object.object_id.clone(),
        product_name: fields.string("product_name")?,
        product_id: fields.u64("product_id")?,
        price_paid: fields.u64("price_paid")?,
        buyer: fields.string("buyer")?,
        walrus_blob_id: fields.opt_string("walrus_blob_id")?,
        delivery_info,
        checkout_timestamp: fields.u64("checkout_timestamp")?,
    })
}

fn decode_delivery(object_id: &str, value: &Value) -> Result<DeliveryInfo, DecodeError> {
    let map = struct_fields(value).ok_or_else(|| DecodeError::InvalidField {
        object_id: object_id.to_string(),
        field: "delivery_info",
        reason: "is not a struct".into(),
    })?;
    let fields = Fields::new(object_id, map);

    Ok(DeliveryInfo {
        recipient_name: fields.string("recipient_name")?,
        address_line1: fields.string("address_line1")?,
        address_line2: fields.opt_string("address_line2")?.unwrap_or_default(),
        city: fields.string("city")?,
        postal_code: fields.string("postal_code")?,
        country: fields.string("country")?,
        email: fields.string("email")?,
        phone: fields.string("phone")?,
    })
}

/// Unwrap a nested struct, with or without the {"type","fields"} wrapper
fn struct_fields(value: &Value) -> Option<&Map<String, Value>> {
    let map = value.as_object()?;
    match map.get("fields").and_then(Value::as_object) {
        Some(inner) => Some(inner),
        None => Some(map),
    }
}

/// Unwrap Move's Option encodings; None when absent or empty
fn unwrap_option(value: &Value) -> Option<&Value> {
    match value {
        Value::Null => None,
        Value::Object(_) => match struct_fields(value).and_then(|map| map.get("vec")) {
            Some(Value::Array(items)) => items.first(),
            _ => Some(value),
        },
        other => Some(other),
    }
}

struct Fields<'a> {
    object_id: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn new(object_id: &'a str, map: &'a Map<String, Value>) -> Self {
        Self { object_id, map }
    }

    fn invalid(&self, field: &'static str, reason: impl Into<String>) -> DecodeError {
        DecodeError::InvalidField {
            object_id: self.object_id.to_string(),
            field,
            reason: reason.into(),
        }
    }

    fn required(&self, field: &'static str) -> Result<&'a Value, DecodeError> {
        match self.map.get(field) {
            Some(Value::Null) | None => Err(DecodeError::MissingField {
                object_id: self.object_id.to_string(),
                field,
            }),
            Some(value) => Ok(value),
        }
    }

    fn optional(&self, field: &'static str) -> Option<&'a Value> {
        self.map.get(field).and_then(unwrap_option)
    }

    fn string(&self, field: &'static str) -> Result<String, DecodeError> {
        let value = self.required(field)?;
        self.text(field, value)
    }

    /// Empty strings count as absent
    fn opt_string(&self, field: &'static str) -> Result<Option<String>, DecodeError> {
        match self.optional(field) {
            Some(value) => Ok(Some(self.text(field, value)?).filter(|s| !s.is_empty())),
            None => Ok(None),
        }
    }

    fn text(&self, field: &'static str, value: &Value) -> Result<String, DecodeError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Array(bytes) => {
                let raw = bytes
                    .iter()
                    .map(|b| b.as_u64().and_then(|n| u8::try_from(n).ok()))
                    .collect::<Option<Vec<u8>>>()
                    .ok_or_else(|| self.invalid(field, "is not a byte vector"))?;
                String::from_utf8(raw).map_err(|_| self.invalid(field, "is not valid UTF-8"))
            }
            other => Err(self.invalid(field, format!("expected text, got {}", other))),
        }
    }

    fn u64(&self, field: &'static str) -> Result<u64, DecodeError> {
        match self.required(field)? {
            Value::String(s) => s
                .parse::<u64>()
                .map_err(|_| self.invalid(field, format!("'{}' is not a u64", s))),
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| self.invalid(field, format!("{} is not a u64", n))),
            other => Err(self.invalid(field, format!("expected integer, got {}", other))),
        }
    }
}
