//! SessionController: owns the session and is the only thing that mutates it.

use futures::StreamExt;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, warn};

use super::{Form, SessionSnapshot, SessionState};
use crate::config::ClientConfig;
use crate::contract::{self, Receipt};
use crate::core::abi::InterfaceDescriptor;
use crate::core::address::Account;
use crate::core::units::{format_amount, parse_amount};
use crate::error::{ClientError, Result, INSTALL_WALLET};
use crate::tx::{Operation, TransactionController};
use crate::view::{self, SessionView};
use crate::wallet::{self, HostEnvironment, WalletHandle};

pub const LOAD_FAILED: &str = "Could not load contract state.";

/// Last user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Self::Info(m) | Self::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool { matches!(self, Self::Error(_)) }
}

pub struct SessionController {
    config: ClientConfig,
    interface: Rc<InterfaceDescriptor>,
    wallet: Option<WalletHandle>,
    state: SessionState,
    form: Form,
    tx: TransactionController,
    notice: RefCell<Option<Notice>>,
}

impl SessionController {
    /// Load the interface descriptor once and detect the host's wallet.
    pub fn new(config: ClientConfig, host: &dyn HostEnvironment) -> Result<Self> {
        let interface = Rc::new(InterfaceDescriptor::from_json(&config.interface)?);
        let wallet = wallet::detect(host);
        let state = SessionState::new();
        let form = Form::default();
        let tx = TransactionController::new(state.clone(), form.clone());
        Ok(Self { config, interface, wallet, state, form, tx, notice: RefCell::new(None) })
    }

    pub fn wallet_detected(&self) -> bool { self.wallet.is_some() }

    pub fn config(&self) -> &ClientConfig { &self.config }

    pub fn state(&self) -> &SessionState { &self.state }

    pub fn transactions(&self) -> &TransactionController { &self.tx }

    pub fn snapshot(&self) -> SessionSnapshot { self.state.snapshot() }

    pub fn notice(&self) -> Option<Notice> { self.notice.borrow().clone() }

    pub fn view(&self) -> SessionView {
        view::render(
            self.wallet_detected(),
            &self.state.snapshot(),
            &self.form.inputs(),
            &self.tx.pending(),
            self.notice().as_ref(),
        )
    }

    pub fn set_donation_amount(&self, value: impl Into<String>) { self.form.set_donation_amount(value); }

    pub fn set_new_owner(&self, value: impl Into<String>) { self.form.set_new_owner(value); }

    fn post(&self, notice: Notice) {
        match &notice {
            Notice::Info(m) => info!(notice = %m),
            Notice::Error(m) => warn!(notice = %m),
        }
        *self.notice.borrow_mut() = Some(notice);
    }

    /// Authorize, bind the contract for the first account, and load the snapshot.
    pub async fn connect(&self) -> Result<()> {
        let Some(wallet) = self.wallet.clone() else {
            self.post(Notice::Error(INSTALL_WALLET.into()));
            return Err(ClientError::NoWalletAvailable);
        };
        let accounts = match wallet::authorize(&wallet).await {
            Ok(accounts) => accounts,
            Err(e) => {
                self.post(Notice::Error(e.user_message()));
                return Err(e);
            }
        };
        let Some(account) = accounts.first().copied() else {
            info!("No account connected");
            return Ok(());
        };
        self.register(&wallet, account)?;
        self.refresh_if_stale().await
    }

    /// React to an `accountsChanged` notification.
    pub async fn on_accounts_changed(&self, accounts: &[String]) -> Result<()> {
        let Some(wallet) = self.wallet.clone() else {
            return Ok(());
        };
        let Some(raw) = accounts.first() else {
            info!("wallet revoked account access");
            self.state.clear();
            return Ok(());
        };
        let account = Account::parse(raw)?;
        if self.state.account() == Some(account) {
            return Ok(());
        }
        info!(%account, "account changed; rebinding contract");
        self.register(&wallet, account)?;
        self.refresh_if_stale().await
    }

    /// Follow the wallet's account-change stream until it ends.
    pub async fn watch_accounts(&self) {
        let Some(wallet) = self.wallet.clone() else {
            return;
        };
        let mut changes = wallet.subscribe_accounts();
        while let Some(accounts) = changes.next().await {
            if let Err(e) = self.on_accounts_changed(&accounts).await {
                warn!(error = %e, "account change handling failed");
            }
        }
    }

    fn register(&self, wallet: &WalletHandle, account: Account) -> Result<()> {
        let bound = contract::bind(wallet, &account, &self.config.contract_address, &self.interface);
        let bound = match bound {
            Ok(c) => c.with_poll_interval(self.config.confirmation_poll),
            Err(e) => {
                self.post(Notice::Error(e.user_message()));
                return Err(e);
            }
        };
        info!(%account, contract = %bound.address(), "session registered");
        self.state.register(account, bound);
        Ok(())
    }

    /// Load whatever the snapshot is missing.
    pub async fn refresh_if_stale(&self) -> Result<()> {
        let result = self.state.refresh_if_stale().await;
        if result.is_err() {
            self.post(Notice::Error(LOAD_FAILED.into()));
        }
        result
    }

    pub async fn donate(&self) -> Result<Receipt> {
        let amount = self.form.donation_amount();
        let result = self.tx.donate().await;
        let success = result
            .as_ref()
            .ok()
            .map(|_| format!("Successfully donated {} ETH!", display_amount(&amount)));
        self.report(Operation::Donate, result, success)
    }

    pub async fn withdraw(&self) -> Result<Receipt> {
        let result = self.tx.withdraw().await;
        self.report(Operation::Withdraw, result, Some("Successfully withdrew all funds!".into()))
    }

    pub async fn refund_donation(&self) -> Result<Receipt> {
        let result = self.tx.refund_donation().await;
        self.report(Operation::RefundDonation, result, Some("Donation refunded successfully!".into()))
    }

    pub async fn change_owner(&self) -> Result<Receipt> {
        let candidate = self.form.new_owner();
        let result = self.tx.change_owner().await;
        self.report(Operation::ChangeOwner, result, Some(format!("Ownership transferred to {}!", candidate.trim())))
    }

    fn report(&self, op: Operation, result: Result<Receipt>, success: Option<String>) -> Result<Receipt> {
        match &result {
            Ok(_) => {
                if let Some(message) = success {
                    self.post(Notice::Info(message));
                }
            }
            Err(e) if e.is_precondition() || matches!(e, ClientError::UserRejected) => {
                self.post(Notice::Error(e.user_message()))
            }
            Err(_) => self.post(Notice::Error(op.failure_message().into())),
        }
        result
    }
}

/// Echo the typed amount in its canonical form when it parses.
fn display_amount(raw: &str) -> String {
    parse_amount(raw)
        .map(format_amount)
        .unwrap_or_else(|_| raw.trim().to_string())
}
