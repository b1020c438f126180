//! Walrus blob reference resolution.
//!
//! A blob id is turned into a retrieval URL against the configured aggregator.
//! No caching and no integrity check happen client-side.

/// Default public aggregator for Walrus testnet
pub const DEFAULT_AGGREGATOR_URL: &str = "https://aggregator.walrus-testnet.walrus.space";

/// Build the aggregator URL for a blob id
pub fn blob_url(aggregator: &str, blob_id: &str) -> String {
    format!("{}/v1/blobs/{}", aggregator.trim_end_matches('/'), blob_id)
}
