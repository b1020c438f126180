//! ============================================================================
//! Error Types - Store Operation Failures
//! ============================================================================
//! Every failure is local to the operation that raised it:
//! - Configuration: package id unset or a bad endpoint
//! - Transport / RPC: the full node could not be reached or refused the call
//! - Validation: a transaction builder was handed incomplete input
//! - Settlement: the chain executed the transaction and reported failure
//! - Decode: an on-chain object did not match the expected Move layout
//! ============================================================================

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Error types for storefront operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Transaction {digest} failed: {message}")]
    Settlement { digest: String, message: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl StoreError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn required(field: &'static str) -> Self {
        Self::validation(field, "required field is empty")
    }

    /// Whether re-invoking the same read later may succeed.
    ///
    /// The core never retries on its own; pollers and the CLI use this to
    /// decide between "try again next cycle" and "give up".
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rpc { code, message } => {
                let lower = message.to_lowercase();
                // -32603 internal error, -32000..-32099 server errors
                *code == -32603
                    || (-32099..=-32000).contains(code)
                    || lower.contains("rate limit")
                    || lower.contains("too many requests")
                    || lower.contains("timeout")
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// A Move object whose content could not be mapped onto a typed record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("object {object_id}: missing field `{field}`")]
    MissingField { object_id: String, field: &'static str },

    #[error("object {object_id}: field `{field}` {reason}")]
    InvalidField {
        object_id: String,
        field: &'static str,
        reason: String,
    },

    #[error("malformed RPC response: {0}")]
    Response(String),
}
