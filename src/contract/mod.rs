//! ContractBinding - a CharityFund handle bound to one authorized account.
//!
//! The signer is account-scoped: when the account changes the handle must be
//! rebuilt with [`bind`], never reused.

mod pending;

pub use pending::{PendingTransaction, Receipt};

use alloy_primitives::{Address, U256};
use serde_json::{json, Map, Value};
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

use crate::core::abi::{self, InterfaceDescriptor};
use crate::core::address::Account;
use crate::core::methods::{contract as methods, rpc};
use crate::error::{ClientError, ProviderError, Result};
use crate::wallet::WalletHandle;

pub const DEFAULT_CONFIRMATION_POLL: Duration = Duration::from_secs(1);

/// Signing identity: a wallet plus the account it signs for.
#[derive(Clone)]
pub struct Signer {
    wallet: WalletHandle,
    account: Account,
}

impl Signer {
    pub fn account(&self) -> &Account { &self.account }
}

/// Callable CharityFund handle.
#[derive(Clone)]
pub struct CharityContract {
    address: Account,
    interface: Rc<InterfaceDescriptor>,
    signer: Signer,
    poll_interval: Duration,
}

/// Bind `account` over `wallet` to the contract at `address`.
///
/// Pure given its inputs: no request is sent. Fails if the address is not an
/// address or the descriptor lacks any method the client calls.
pub fn bind(
    wallet: &WalletHandle,
    account: &Account,
    address: &str,
    interface: &Rc<InterfaceDescriptor>,
) -> Result<CharityContract> {
    let address = Account::parse(address)
        .map_err(|_| ClientError::Binding(format!("invalid contract address: {address}")))?;
    interface.require(methods::REQUIRED)?;
    debug!(contract = %address, signer = %account, "contract bound");
    Ok(CharityContract {
        address,
        interface: Rc::clone(interface),
        signer: Signer { wallet: Rc::clone(wallet), account: *account },
        poll_interval: DEFAULT_CONFIRMATION_POLL,
    })
}

impl CharityContract {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn address(&self) -> &Account { &self.address }

    pub fn signer(&self) -> &Signer { &self.signer }

    /// `getBalance() -> uint`, in wei.
    pub async fn get_balance(&self) -> Result<U256> {
        let data = self.call(methods::GET_BALANCE, &[]).await?;
        Ok(abi::decode_uint(&data)?)
    }

    /// `owner() -> address`
    pub async fn owner(&self) -> Result<Account> {
        let data = self.call(methods::OWNER, &[]).await?;
        Ok(abi::decode_address(&data)?.into())
    }

    /// `donate() payable`
    pub async fn donate(&self, value: U256) -> Result<PendingTransaction> {
        self.send(methods::DONATE, &[], Some(value)).await
    }

    /// `withdraw()`
    pub async fn withdraw(&self) -> Result<PendingTransaction> {
        self.send(methods::WITHDRAW, &[], None).await
    }

    /// `refundDonation()`
    pub async fn refund_donation(&self) -> Result<PendingTransaction> {
        self.send(methods::REFUND_DONATION, &[], None).await
    }

    /// `changeOwner(address)`
    pub async fn change_owner(&self, new_owner: &Account) -> Result<PendingTransaction> {
        self.send(methods::CHANGE_OWNER, &[new_owner.address()], None).await
    }

    async fn call(&self, name: &str, args: &[Address]) -> Result<Vec<u8>> {
        let data = self.interface.method(name)?.encode_call(args)?;
        let params = json!([
            {"from": self.signer.account.to_hex(), "to": self.address.to_hex(), "data": hex_data(&data)},
            rpc::LATEST
        ]);
        let result = self.signer.wallet.request(rpc::CALL, params).await?;
        Ok(decode_hex_result(&result)?)
    }

    async fn send(&self, name: &str, args: &[Address], value: Option<U256>) -> Result<PendingTransaction> {
        let data = self.interface.method(name)?.encode_call(args)?;
        let mut tx = Map::new();
        tx.insert("from".into(), json!(self.signer.account.to_hex()));
        tx.insert("to".into(), json!(self.address.to_hex()));
        tx.insert("data".into(), json!(hex_data(&data)));
        if let Some(value) = value {
            tx.insert("value".into(), json!(format!("0x{value:x}")));
        }

        let result = self
            .signer
            .wallet
            .request(rpc::SEND_TRANSACTION, json!([Value::Object(tx)]))
            .await
            .map_err(ClientError::from_submission)?;
        let hash = result
            .as_str()
            .filter(|h| h.starts_with("0x"))
            .ok_or_else(|| ClientError::SubmissionFailed(format!("unexpected transaction hash: {result}")))?;
        Ok(PendingTransaction::new(hash.to_string(), Rc::clone(&self.signer.wallet), self.poll_interval))
    }
}

fn hex_data(data: &[u8]) -> String { format!("0x{}", hex::encode(data)) }

fn decode_hex_result(result: &Value) -> std::result::Result<Vec<u8>, ProviderError> {
    let text = result
        .as_str()
        .ok_or_else(|| ProviderError::malformed(format!("{} result must be a hex string", rpc::CALL)))?;
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).map_err(|e| ProviderError::malformed(format!("invalid hex result: {e}")))
}

/// Parse a `0x` quantity (block numbers, values).
pub(crate) fn parse_quantity(value: &Value) -> Option<u64> {
    let text = value.as_str()?;
    u64::from_str_radix(text.strip_prefix("0x")?, 16).ok()
}
