//! View model: a pure function of the session snapshot and form inputs.
//!
//! Rendering never triggers reads; refreshes are driven by the controller.

use serde::Serialize;

use crate::error::INSTALL_WALLET;
use crate::session::{FormInputs, Notice, SessionSnapshot};
use crate::tx::Operation;

pub const LOADING: &str = "Loading...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Connect,
    Donate,
    Withdraw,
    RefundDonation,
    ChangeOwner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub wallet_detected: bool,
    /// Shown instead of everything else when no wallet is present.
    pub install_prompt: Option<String>,
    pub account: Option<String>,
    pub balance: Option<String>,
    /// `"1.5 ETH"`, or `"Loading..."` until the first read lands
    pub balance_label: String,
    pub donation_amount: String,
    pub new_owner: String,
    pub is_owner: bool,
    pub actions: Vec<Action>,
    pub pending: Vec<Operation>,
    pub notice: Option<Notice>,
}

impl SessionView {
    pub fn can(&self, action: Action) -> bool { self.actions.contains(&action) }
}

pub fn render(
    wallet_detected: bool,
    snapshot: &SessionSnapshot,
    form: &FormInputs,
    pending: &[Operation],
    notice: Option<&Notice>,
) -> SessionView {
    let connected = wallet_detected && snapshot.account.is_some();
    let actions = if !wallet_detected {
        Vec::new()
    } else if !connected {
        vec![Action::Connect]
    } else if snapshot.is_owner {
        vec![Action::Donate, Action::Withdraw, Action::ChangeOwner, Action::RefundDonation]
    } else {
        vec![Action::Donate, Action::RefundDonation]
    };

    SessionView {
        wallet_detected,
        install_prompt: (!wallet_detected).then(|| INSTALL_WALLET.to_string()),
        account: snapshot.account.map(|a| a.to_hex()),
        balance: snapshot.balance.clone(),
        balance_label: snapshot
            .balance
            .as_ref()
            .map(|b| format!("{b} ETH"))
            .unwrap_or_else(|| LOADING.to_string()),
        donation_amount: form.donation_amount.clone(),
        new_owner: form.new_owner.clone(),
        is_owner: connected && snapshot.is_owner,
        actions,
        pending: pending.to_vec(),
        notice: notice.cloned(),
    }
}
