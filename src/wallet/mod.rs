//! Wallet module - injected signing capability
//!
//! The host environment may expose an EIP-1193 provider (a browser extension in
//! the browser, an unlocked development node natively). Everything the client
//! does with it goes through [`WalletProvider::request`].
//!
//! # Architecture
//!
//! ```text
//! HostEnvironment ──detect()──► WalletHandle (Rc<dyn WalletProvider>)
//!                                     │
//!                                     ├── authorize() → eth_requestAccounts → [Account]
//!                                     │
//!                                     └── subscribe_accounts() → accountsChanged stream
//! ```
//!
//! | Platform | Host | Provider |
//! |----------|------|----------|
//! | `wasm` | `BrowserHost` | `window.ethereum` |
//! | `native` | [`RpcHost`] | JSON-RPC dev node |

#[cfg(feature = "native")]
mod json_rpc;

#[cfg(feature = "native")]
pub use json_rpc::{RpcHost, RpcWallet};

use async_trait::async_trait;
use futures::channel::mpsc;
use serde_json::{json, Value};
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::core::address::Account;
use crate::core::methods::rpc;
use crate::error::{ClientError, ProviderError, Result};

/// EIP-1193 request surface plus the account-change notification channel.
#[async_trait(?Send)]
pub trait WalletProvider {
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError>;

    /// Each item is the wallet's full account list after a change.
    fn subscribe_accounts(&self) -> mpsc::UnboundedReceiver<Vec<String>>;
}

/// Opaque, immutable handle to the detected wallet.
pub type WalletHandle = Rc<dyn WalletProvider>;

/// Something that may have a wallet injected into it.
pub trait HostEnvironment {
    fn injected_wallet(&self) -> Option<WalletHandle>;
}

/// Look for an injected wallet. Side-effect free; call as often as needed.
pub fn detect(host: &dyn HostEnvironment) -> Option<WalletHandle> {
    let wallet = host.injected_wallet();
    debug!(detected = wallet.is_some(), "wallet detection");
    wallet
}

/// Ask the user to reveal their accounts.
///
/// An empty list is not an error: the caller treats it as "no account".
pub async fn authorize(wallet: &WalletHandle) -> Result<Vec<Account>> {
    let response = wallet
        .request(rpc::REQUEST_ACCOUNTS, json!([]))
        .await
        .map_err(ClientError::from_authorization)?;
    let accounts = parse_accounts(&response)?;
    if accounts.is_empty() {
        warn!("wallet returned no accounts");
    } else {
        info!(account = %accounts[0], count = accounts.len(), "accounts authorized");
    }
    Ok(accounts)
}

/// Parse an `address[]` response into normalized accounts.
pub fn parse_accounts(response: &Value) -> Result<Vec<Account>> {
    let items = response
        .as_array()
        .ok_or_else(|| ProviderError::malformed(format!("{} result must be an array", rpc::REQUEST_ACCOUNTS)))?;
    items
        .iter()
        .map(|item| {
            let raw = item
                .as_str()
                .ok_or_else(|| ProviderError::malformed("account entry must be a string"))?;
            Account::parse(raw).map_err(|e| ClientError::Provider(ProviderError::malformed(e.to_string())))
        })
        .collect()
}
