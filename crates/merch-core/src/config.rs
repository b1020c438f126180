//! ============================================================================
//! Store Configuration
//! ============================================================================
//! Fixed identifiers read once at startup: network, full-node URL, deployed
//! package, optional pinned store object, admin address and Walrus aggregator.
//! Defaults point at the testnet deployment; every value can be overridden
//! from the environment (a `.env` file is loaded first when present).
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::types::StoreObject;
use crate::walrus::DEFAULT_AGGREGATOR_URL;

/// Deployed merch store package on testnet
pub const DEFAULT_PACKAGE_ID: &str =
    "0xee3b31435df25a8b913275b8f263f2a1bbc3cc196dad9fd7749e201b60d0423a";

/// Merch store admin address (where payments go)
pub const DEFAULT_ADMIN_ADDRESS: &str =
    "0xe2bf986ccb385f8e5d9500ce8332b69a5cee19579152c240c09213e80e9355b8";

/// Marker left in unconfigured package / store ids
pub const PLACEHOLDER_MARKER: &str = "YOUR_";

/// Catalog refresh interval used by the storefront
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Sui network the storefront talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Testnet,
    Mainnet,
    Devnet,
}

impl Network {
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Self::Testnet => "https://fullnode.testnet.sui.io:443",
            Self::Mainnet => "https://fullnode.mainnet.sui.io:443",
            Self::Devnet => "https://fullnode.devnet.sui.io:443",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
            Self::Devnet => "devnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Network {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            "devnet" => Ok(Self::Devnet),
            other => Err(StoreError::NotConfigured(format!(
                "unknown network '{}'. Valid values: testnet, mainnet, devnet",
                other
            ))),
        }
    }
}

/// Storefront configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub network: Network,
    pub rpc_url: String,
    pub package_id: String,
    /// Pinned store object; when absent the store is discovered from events
    pub store_id: Option<String>,
    pub admin_address: String,
    pub aggregator_url: String,
    pub poll_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let network = Network::Testnet;
        Self {
            network,
            rpc_url: network.default_rpc_url().to_string(),
            package_id: DEFAULT_PACKAGE_ID.to_string(),
            store_id: None,
            admin_address: DEFAULT_ADMIN_ADDRESS.to_string(),
            aggregator_url: DEFAULT_AGGREGATOR_URL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl StoreConfig {
    /// Load `.env` (if any) and read overrides from the process environment
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {}", e);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (environment, test map, ...)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let network = match get("MERCH_NETWORK") {
            Some(name) => name.parse()?,
            None => Network::Testnet,
        };

        let rpc_url = get("MERCH_RPC_URL").unwrap_or_else(|| network.default_rpc_url().to_string());
        validate_url("MERCH_RPC_URL", &rpc_url)?;

        let aggregator_url =
            get("MERCH_AGGREGATOR_URL").unwrap_or_else(|| DEFAULT_AGGREGATOR_URL.to_string());
        validate_url("MERCH_AGGREGATOR_URL", &aggregator_url)?;

        let poll_interval_secs = match get("MERCH_POLL_INTERVAL_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(StoreError::NotConfigured(format!(
                        "MERCH_POLL_INTERVAL_SECS must be a positive integer, got '{}'",
                        raw
                    )))
                }
            },
            None => DEFAULT_POLL_INTERVAL_SECS,
        };

        let config = Self {
            network,
            rpc_url,
            package_id: get("MERCH_PACKAGE_ID").unwrap_or_else(|| DEFAULT_PACKAGE_ID.to_string()),
            store_id: get("MERCH_STORE_ID").filter(|id| !is_placeholder(id)),
            admin_address: get("MERCH_ADMIN_ADDRESS")
                .unwrap_or_else(|| DEFAULT_ADMIN_ADDRESS.to_string()),
            aggregator_url,
            poll_interval_secs,
        };

        if !config.is_configured() {
            warn!("Package id is a placeholder; catalog reads will return nothing");
        }

        Ok(config)
    }

    /// False while the package id is unset or still a placeholder
    pub fn is_configured(&self) -> bool {
        !is_placeholder(&self.package_id)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Replace the full-node URL, applying the same check as `MERCH_RPC_URL`
    pub fn set_rpc_url(&mut self, rpc_url: &str) -> Result<()> {
        let rpc_url = rpc_url.trim();
        validate_url("rpc_url", rpc_url)?;
        self.rpc_url = rpc_url.to_string();
        Ok(())
    }

    /// False when the on-chain store is administered by someone other than
    /// the configured admin address
    pub fn expects_admin(&self, store: &StoreObject) -> bool {
        store.is_admin(&self.admin_address)
    }

    /// Fully-qualified Move type or function name inside the `store` module
    pub fn store_member(&self, name: &str) -> String {
        format!("{}::store::{}", self.package_id, name)
    }
}

fn is_placeholder(id: &str) -> bool {
    id.trim().is_empty() || id.contains(PLACEHOLDER_MARKER)
}

fn validate_url(key: &str, value: &str) -> Result<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| StoreError::NotConfigured(format!("{} is not a valid URL ({}): {}", key, e, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.rpc_url, "https://fullnode.testnet.sui.io:443");
        assert_eq!(config.package_id, DEFAULT_PACKAGE_ID);
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert!(config.store_id.is_none());
        assert!(config.is_configured());
    }

    #[test]
    fn test_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("MERCH_NETWORK", "Devnet"),
            ("MERCH_PACKAGE_ID", "0xabc"),
            ("MERCH_STORE_ID", "0x5"),
            ("MERCH_POLL_INTERVAL_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.network, Network::Devnet);
        assert_eq!(config.rpc_url, "https://fullnode.devnet.sui.io:443");
        assert_eq!(config.store_id.as_deref(), Some("0x5"));
        assert_eq!(config.store_member("Product"), "0xabc::store::Product");
        assert_eq!(config.poll_interval_secs, 3);
    }

    #[test]
    fn test_placeholders() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("MERCH_PACKAGE_ID", "0xYOUR_PACKAGE_ID"),
            ("MERCH_STORE_ID", "0xYOUR_STORE_ID"),
        ]))
        .unwrap();
        assert!(!config.is_configured());
        assert!(config.store_id.is_none());
    }

    #[test]
    fn test_set_rpc_url_validates() {
        let mut config = StoreConfig::default();
        config.set_rpc_url(" http://localhost:9000 ").unwrap();
        assert_eq!(config.rpc_url, "http://localhost:9000");

        let err = config.set_rpc_url("localhost 9000").unwrap_err();
        assert!(matches!(err, StoreError::NotConfigured(_)));
        assert_eq!(config.rpc_url, "http://localhost:9000");
    }

    #[test]
    fn test_expected_admin() {
        let config = StoreConfig::from_lookup(lookup(&[("MERCH_ADMIN_ADDRESS", "0xa1")])).unwrap();
        let mut store = StoreObject {
            object_id: "0x5".into(),
            admin: "0xa1".into(),
        };
        assert!(config.expects_admin(&store));

        store.admin = "0xb2".into();
        assert!(!config.expects_admin(&store));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(StoreConfig::from_lookup(lookup(&[("MERCH_NETWORK", "localnet")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[("MERCH_RPC_URL", "not a url")])).is_err());
        assert!(StoreConfig::from_lookup(lookup(&[("MERCH_POLL_INTERVAL_SECS", "0")])).is_err());
    }
}
