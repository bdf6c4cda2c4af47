//! RpcWallet - JSON-RPC 2.0 over HTTP to a development node whose accounts are
//! unlocked (hardhat, anvil). Stands in for an injected browser wallet.

use async_trait::async_trait;
use futures::channel::mpsc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

use super::{HostEnvironment, WalletHandle, WalletProvider};
use crate::core::methods::rpc;
use crate::error::ProviderError;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ProviderError>,
}

pub struct RpcWallet {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcWallet {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), client: reqwest::Client::new(), next_id: AtomicU64::new(1) }
    }

    pub fn url(&self) -> &str { &self.url }
}

#[async_trait(?Send)]
impl WalletProvider for RpcWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        // Dev nodes expose their unlocked accounts without a permission prompt.
        let method = if method == rpc::REQUEST_ACCOUNTS { rpc::ACCOUNTS } else { method };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        trace!(%method, id, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(ProviderError::DISCONNECTED, format!("{}: {}", self.url, e)))?;
        let status = response.status();
        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(format!("rpc response ({status}): {e}")))?;

        if let Some(err) = parsed.error {
            debug!(%method, code = err.code, message = %err.message, "rpc error");
            return Err(err);
        }
        Ok(parsed.result.unwrap_or(Value::Null))
    }

    fn subscribe_accounts(&self) -> mpsc::UnboundedReceiver<Vec<String>> {
        // A dev node never switches accounts; the stream ends immediately.
        let (_tx, rx) = mpsc::unbounded();
        rx
    }
}

/// Native host: the "injected" wallet is whatever node answers at `url`.
pub struct RpcHost {
    url: Option<String>,
}

impl RpcHost {
    pub fn new(url: impl Into<String>) -> Self { Self { url: Some(url.into()) } }

    /// A host with nothing injected.
    pub fn empty() -> Self { Self { url: None } }
}

impl HostEnvironment for RpcHost {
    fn injected_wallet(&self) -> Option<WalletHandle> {
        let url = self.url.as_deref().filter(|u| !u.trim().is_empty())?;
        Some(Rc::new(RpcWallet::new(url)))
    }
}
