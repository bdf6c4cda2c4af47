//! Client configuration - passed from higher layers (CLI, browser bootstrap)

use std::time::Duration;

use crate::contract::DEFAULT_CONFIRMATION_POLL;
#[cfg(feature = "native")]
use crate::error::{ClientError, Result};

/// Address the CharityFund contract is deployed at on the local dev network.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

/// Bundled CharityFund artifact.
pub const DEFAULT_INTERFACE: &str = include_str!("../abi/CharityFund.json");

#[cfg(feature = "native")]
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Client configuration. Higher layers construct this.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub contract_address: String,
    /// ABI JSON (hardhat artifact or bare array)
    pub interface: String,
    /// Delay between receipt polls while awaiting confirmation
    pub confirmation_poll: Duration,
    #[cfg(feature = "native")]
    pub rpc_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS.into(),
            interface: DEFAULT_INTERFACE.into(),
            confirmation_poll: DEFAULT_CONFIRMATION_POLL,
            #[cfg(feature = "native")]
            rpc_url: DEFAULT_RPC_URL.into(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_contract_address(mut self, address: impl Into<String>) -> Self { self.contract_address = address.into(); self }
    pub fn with_interface(mut self, json: impl Into<String>) -> Self { self.interface = json.into(); self }
    pub fn with_confirmation_poll(mut self, interval: Duration) -> Self { self.confirmation_poll = interval; self }
    #[cfg(feature = "native")]
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self { self.rpc_url = url.into(); self }

    /// Defaults overridden by `CHARITY_CONTRACT`, `CHARITY_RPC_URL`,
    /// `CHARITY_ABI` (artifact path) and `CHARITY_POLL_MS`.
    #[cfg(feature = "native")]
    pub fn from_env() -> Result<Self> {
        let var = |key: &str| std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();
        if let Some(address) = var("CHARITY_CONTRACT") {
            config.contract_address = address;
        }
        if let Some(url) = var("CHARITY_RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(path) = var("CHARITY_ABI") {
            config.interface = std::fs::read_to_string(&path)
                .map_err(|e| ClientError::Config(format!("CHARITY_ABI {path}: {e}")))?;
        }
        if let Some(ms) = var("CHARITY_POLL_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|e| ClientError::Config(format!("CHARITY_POLL_MS {ms}: {e}")))?;
            config.confirmation_poll = Duration::from_millis(ms);
        }
        Ok(config)
    }
}
