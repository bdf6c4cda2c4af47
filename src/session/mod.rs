//! Session state: the single cached view of the chain for one account.
//!
//! ```text
//! connect ─► register(account, contract) ─► refresh_if_stale()
//!                                              ├── refresh_balance()   getBalance()
//!                                              └── refresh_ownership() owner()
//! tx confirmed ─► refresh_balance() / refresh_ownership()
//! ```
//!
//! The snapshot is derived, never authoritative. Reads are tagged with an epoch
//! when they start; a result only lands if no newer read of the same field (and
//! no account change) started in the meantime.

mod controller;

pub use controller::{Notice, SessionController, LOAD_FAILED};

use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::contract::CharityContract;
use crate::core::address::{same_address, Account};
use crate::core::units::format_amount;
use crate::error::{ClientError, Result};

/// Owner check with case-insensitive address comparison.
pub fn is_owner(account: &str, owner: &str) -> bool { same_address(account, owner) }

/// Read-only copy of the session for the view layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub account: Option<Account>,
    pub contract: Option<Account>,
    pub balance: Option<String>,
    pub owner: Option<Account>,
    pub is_owner: bool,
}

#[derive(Default)]
struct Inner {
    account: Option<Account>,
    contract: Option<Rc<CharityContract>>,
    balance: Option<String>,
    owner: Option<Account>,
    balance_epoch: u64,
    owner_epoch: u64,
}

impl Inner {
    fn is_owner(&self) -> bool {
        match (&self.account, &self.owner) {
            (Some(account), Some(owner)) => is_owner(&account.to_hex(), &owner.to_hex()),
            _ => false,
        }
    }

    fn invalidate(&mut self) {
        self.balance = None;
        self.owner = None;
        self.balance_epoch += 1;
        self.owner_epoch += 1;
    }
}

/// Shared handle to the session state. Clones observe the same state.
#[derive(Clone, Default)]
pub struct SessionState {
    inner: Rc<RefCell<Inner>>,
}

impl SessionState {
    pub fn new() -> Self { Self::default() }

    pub fn account(&self) -> Option<Account> { self.inner.borrow().account }

    pub fn contract(&self) -> Option<Rc<CharityContract>> { self.inner.borrow().contract.clone() }

    pub fn is_owner(&self) -> bool { self.inner.borrow().is_owner() }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.borrow();
        SessionSnapshot {
            account: inner.account,
            contract: inner.contract.as_ref().map(|c| *c.address()),
            balance: inner.balance.clone(),
            owner: inner.owner,
            is_owner: inner.is_owner(),
        }
    }

    /// Install a freshly bound contract for `account`. Cached reads belong to
    /// the previous signer and are dropped.
    pub fn register(&self, account: Account, contract: CharityContract) {
        let mut inner = self.inner.borrow_mut();
        inner.account = Some(account);
        inner.contract = Some(Rc::new(contract));
        inner.invalidate();
    }

    /// Forget the account and its contract handle.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.account = None;
        inner.contract = None;
        inner.invalidate();
    }

    /// Mark the owner unknown so `is_owner` cannot be served from a stale value.
    pub fn forget_owner(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.owner = None;
        inner.owner_epoch += 1;
    }

    /// Mark the balance unknown; it reads as loading until the next refresh lands.
    pub fn forget_balance(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.balance = None;
        inner.balance_epoch += 1;
    }

    fn bound(&self) -> Result<Rc<CharityContract>> { self.contract().ok_or(ClientError::NotConnected) }

    /// Fetch `getBalance()` and store it as a decimal ether string.
    pub async fn refresh_balance(&self) -> Result<()> {
        let contract = self.bound()?;
        let ticket = {
            let mut inner = self.inner.borrow_mut();
            inner.balance_epoch += 1;
            inner.balance_epoch
        };
        let wei = contract.get_balance().await?;
        let mut inner = self.inner.borrow_mut();
        if inner.balance_epoch != ticket {
            debug!(ticket, latest = inner.balance_epoch, "discarding superseded balance read");
            return Ok(());
        }
        inner.balance = Some(format_amount(wei));
        debug!(balance = ?inner.balance, "balance refreshed");
        Ok(())
    }

    /// Fetch `owner()` and recompute `is_owner`.
    pub async fn refresh_ownership(&self) -> Result<()> {
        let contract = self.bound()?;
        let ticket = {
            let mut inner = self.inner.borrow_mut();
            inner.owner_epoch += 1;
            inner.owner_epoch
        };
        let owner = contract.owner().await?;
        let mut inner = self.inner.borrow_mut();
        if inner.owner_epoch != ticket {
            debug!(ticket, latest = inner.owner_epoch, "discarding superseded owner read");
            return Ok(());
        }
        inner.owner = Some(owner);
        debug!(%owner, is_owner = inner.is_owner(), "ownership refreshed");
        Ok(())
    }

    /// Refresh only the fields that are currently unknown. Safe to call after
    /// every state-changing event; a populated snapshot issues no reads.
    pub async fn refresh_if_stale(&self) -> Result<()> {
        if self.inner.borrow().contract.is_none() {
            return Ok(());
        }
        let (need_balance, need_owner) = {
            let inner = self.inner.borrow();
            (inner.balance.is_none(), inner.owner.is_none())
        };
        let balance = if need_balance { self.refresh_balance().await } else { Ok(()) };
        let owner = if need_owner { self.refresh_ownership().await } else { Ok(()) };
        if let Err(e) = &balance {
            warn!(error = %e, "balance refresh failed");
        }
        if let Err(e) = &owner {
            warn!(error = %e, "ownership refresh failed");
        }
        balance.and(owner)
    }
}

/// User-editable inputs: donation amount and candidate owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormInputs {
    pub donation_amount: String,
    pub new_owner: String,
}

/// Shared handle to the form inputs.
#[derive(Clone, Default)]
pub struct Form {
    inputs: Rc<RefCell<FormInputs>>,
}

impl Form {
    pub fn donation_amount(&self) -> String { self.inputs.borrow().donation_amount.clone() }

    pub fn new_owner(&self) -> String { self.inputs.borrow().new_owner.clone() }

    pub fn set_donation_amount(&self, value: impl Into<String>) { self.inputs.borrow_mut().donation_amount = value.into(); }

    pub fn set_new_owner(&self, value: impl Into<String>) { self.inputs.borrow_mut().new_owner = value.into(); }

    pub fn clear_donation_amount(&self) { self.inputs.borrow_mut().donation_amount.clear(); }

    pub fn clear_new_owner(&self) { self.inputs.borrow_mut().new_owner.clear(); }

    pub fn inputs(&self) -> FormInputs { self.inputs.borrow().clone() }
}
