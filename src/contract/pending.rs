//! PendingTransaction - broadcast, not yet included.

use chrono::{DateTime, Utc};
use futures_timer::Delay;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::parse_quantity;
use crate::core::methods::{receipt, rpc};
use crate::error::{ClientError, Result};
use crate::wallet::WalletHandle;

/// Inclusion receipt of a successful transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub hash: String,
    pub block_number: Option<u64>,
    pub confirmed_at: DateTime<Utc>,
}

pub struct PendingTransaction {
    hash: String,
    wallet: WalletHandle,
    poll_interval: Duration,
    submitted_at: DateTime<Utc>,
}

impl PendingTransaction {
    pub(crate) fn new(hash: String, wallet: WalletHandle, poll_interval: Duration) -> Self {
        Self { hash, wallet, poll_interval, submitted_at: Utc::now() }
    }

    pub fn hash(&self) -> &str { &self.hash }

    pub fn submitted_at(&self) -> DateTime<Utc> { self.submitted_at }

    /// Wait for inclusion.
    ///
    /// Polls `eth_getTransactionReceipt` until a receipt exists. A reverted
    /// receipt or a failed poll is terminal. There is no deadline: a
    /// transaction that never lands keeps this future pending.
    pub async fn confirm(self) -> Result<Receipt> {
        let mut polls = 0u64;
        loop {
            let response = self
                .wallet
                .request(rpc::GET_TRANSACTION_RECEIPT, json!([self.hash]))
                .await
                .map_err(|e| ClientError::ConfirmationFailed(e.message))?;
            polls += 1;
            if response.is_null() {
                Delay::new(self.poll_interval).await;
                continue;
            }
            return self.settle(&response, polls);
        }
    }

    fn settle(&self, receipt: &Value, polls: u64) -> Result<Receipt> {
        let block_number = receipt.get("blockNumber").and_then(parse_quantity);
        let status = receipt.get("status").and_then(Value::as_str).unwrap_or_default();
        let waited = Utc::now() - self.submitted_at;
        if status != receipt::STATUS_SUCCESS {
            warn!(tx_hash = %self.hash, status, ?block_number, "transaction reverted");
            return Err(ClientError::ConfirmationFailed(format!("transaction {} reverted", self.hash)));
        }
        debug!(tx_hash = %self.hash, polls, "receipt found");
        info!(tx_hash = %self.hash, ?block_number, waited_ms = waited.num_milliseconds(), "transaction confirmed");
        Ok(Receipt { hash: self.hash.clone(), block_number, confirmed_at: Utc::now() })
    }
}
