//! TransactionController - submit → confirm → reconcile for every mutating call.
//!
//! # Lifecycle (per operation)
//!
//! ```text
//! Idle ─► Submitting ─► AwaitingConfirmation ─► Confirmed ─┐
//!            │                  │                            ├─► (next invocation) Submitting
//!            └──────────────────┴──────────► Failed ────────┘
//! ```
//!
//! | Operation | Client-side gate | On confirmation |
//! |-----------|------------------|-----------------|
//! | donate | amount > 0 | clear amount, refresh balance |
//! | withdraw | is owner | refresh balance |
//! | refundDonation | contract bound | refresh balance |
//! | changeOwner | valid address, is owner | clear candidate, refresh ownership |
//!
//! Precondition failures never reach the wallet. A second invocation of an
//! operation that is still `Submitting`/`AwaitingConfirmation` is rejected with
//! `AlreadyPending`. Nothing is retried automatically and nothing is refreshed
//! unless the receipt confirmed success.

use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use tracing::{error, info, warn};

use crate::contract::{CharityContract, PendingTransaction, Receipt};
use crate::core::address::{is_address, Account};
use crate::core::units::{format_amount, parse_amount};
use crate::error::{ClientError, Result};
use crate::session::{Form, SessionState};

pub const NOT_OWNER_WITHDRAW: &str = "Only the owner can withdraw funds.";
pub const INVALID_NEW_OWNER: &str = "Invalid address or you are not the owner.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Donate,
    Withdraw,
    RefundDonation,
    ChangeOwner,
}

impl Operation {
    pub const ALL: [Operation; 4] = [Self::Donate, Self::Withdraw, Self::RefundDonation, Self::ChangeOwner];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Donate => "Donation",
            Self::Withdraw => "Withdrawal",
            Self::RefundDonation => "Refund",
            Self::ChangeOwner => "Ownership change",
        }
    }

    /// Message shown when the wallet or the chain rejects the operation.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Donate => "Donation failed.",
            Self::Withdraw => "Withdrawal failed.",
            Self::RefundDonation => "Failed to refund donation.",
            Self::ChangeOwner => "Failed to change owner.",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum TxPhase {
    #[default]
    Idle,
    Submitting,
    AwaitingConfirmation { hash: String },
    Confirmed { hash: String },
    Failed { reason: String },
}

impl TxPhase {
    pub fn is_pending(&self) -> bool { matches!(self, Self::Submitting | Self::AwaitingConfirmation { .. }) }
}

type Phases = Rc<RefCell<HashMap<Operation, TxPhase>>>;

/// Marks an operation in flight; a dropped (abandoned) invocation fails it.
struct InFlight {
    phases: Phases,
    op: Operation,
    settled: bool,
}

impl InFlight {
    fn set(&self, phase: TxPhase) { self.phases.borrow_mut().insert(self.op, phase); }

    fn settle(mut self, phase: TxPhase) {
        self.set(phase);
        self.settled = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.settled {
            self.set(TxPhase::Failed { reason: "abandoned".into() });
        }
    }
}

#[derive(Clone)]
pub struct TransactionController {
    state: SessionState,
    form: Form,
    phases: Phases,
}

impl TransactionController {
    pub fn new(state: SessionState, form: Form) -> Self {
        Self { state, form, phases: Rc::default() }
    }

    pub fn phase(&self, op: Operation) -> TxPhase { self.phases.borrow().get(&op).cloned().unwrap_or_default() }

    pub fn is_pending(&self, op: Operation) -> bool { self.phase(op).is_pending() }

    /// Operations currently submitting or awaiting confirmation.
    pub fn pending(&self) -> Vec<Operation> {
        Operation::ALL.into_iter().filter(|op| self.is_pending(*op)).collect()
    }

    /// Donate the amount in the donation field.
    pub async fn donate(&self) -> Result<Receipt> {
        let value = parse_amount(&self.form.donation_amount())?;
        let contract = self.state.contract().ok_or(ClientError::NotConnected)?;
        let receipt = self.execute(Operation::Donate, contract.donate(value)).await?;
        info!(amount = %format_amount(value), tx_hash = %receipt.hash, "donation confirmed");
        self.form.clear_donation_amount();
        self.reconcile_balance().await;
        Ok(receipt)
    }

    /// Withdraw all funds. Owner only.
    pub async fn withdraw(&self) -> Result<Receipt> {
        let contract = self.owner_contract(NOT_OWNER_WITHDRAW)?;
        let receipt = self.execute(Operation::Withdraw, contract.withdraw()).await?;
        self.reconcile_balance().await;
        Ok(receipt)
    }

    /// Refund the caller's donation.
    pub async fn refund_donation(&self) -> Result<Receipt> {
        let contract = self.state.contract().ok_or(ClientError::NotConnected)?;
        let receipt = self.execute(Operation::RefundDonation, contract.refund_donation()).await?;
        self.reconcile_balance().await;
        Ok(receipt)
    }

    /// Transfer ownership to the address in the new-owner field. Owner only.
    pub async fn change_owner(&self) -> Result<Receipt> {
        let candidate = self.form.new_owner();
        if !is_address(&candidate) {
            return Err(ClientError::InvalidInput(INVALID_NEW_OWNER.into()));
        }
        let candidate = Account::parse(&candidate)?;
        let contract = self.owner_contract(INVALID_NEW_OWNER)?;
        let receipt = self.execute(Operation::ChangeOwner, contract.change_owner(&candidate)).await?;
        info!(new_owner = %candidate, tx_hash = %receipt.hash, "ownership transferred");
        self.form.clear_new_owner();
        self.state.forget_owner();
        if let Err(e) = self.state.refresh_ownership().await {
            warn!(error = %e, "ownership refresh after confirmation failed");
        }
        Ok(receipt)
    }

    fn owner_contract(&self, denial: &str) -> Result<Rc<CharityContract>> {
        let contract = self.state.contract().ok_or(ClientError::NotConnected)?;
        if !self.state.is_owner() {
            return Err(ClientError::NotAuthorized(denial.into()));
        }
        Ok(contract)
    }

    async fn reconcile_balance(&self) {
        self.state.forget_balance();
        if let Err(e) = self.state.refresh_balance().await {
            warn!(error = %e, "balance refresh after confirmation failed");
        }
    }

    /// Drive one invocation through the lifecycle. `submit` is not polled
    /// until the in-flight guard has been taken.
    async fn execute<F>(&self, op: Operation, submit: F) -> Result<Receipt>
    where
        F: Future<Output = Result<PendingTransaction>>,
    {
        let flight = self.begin(op)?;
        let result = async {
            let pending = submit.await?;
            info!(?op, tx_hash = %pending.hash(), "transaction submitted");
            flight.set(TxPhase::AwaitingConfirmation { hash: pending.hash().to_string() });
            pending.confirm().await
        }
        .await;

        match result {
            Ok(receipt) => {
                flight.settle(TxPhase::Confirmed { hash: receipt.hash.clone() });
                Ok(receipt)
            }
            Err(e) => {
                error!(?op, error = %e, "transaction failed");
                flight.settle(TxPhase::Failed { reason: e.to_string() });
                Err(e)
            }
        }
    }

    fn begin(&self, op: Operation) -> Result<InFlight> {
        let mut phases = self.phases.borrow_mut();
        let phase = phases.entry(op).or_default();
        if phase.is_pending() {
            warn!(?op, "invocation rejected: previous one still in flight");
            return Err(ClientError::AlreadyPending(op));
        }
        *phase = TxPhase::Submitting;
        Ok(InFlight { phases: Rc::clone(&self.phases), op, settled: false })
    }
}
