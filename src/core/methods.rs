//! Method name constants for the wallet and contract surfaces
//!
//! Centralized registry for every RPC and contract method the client consumes.

/// EIP-1193 / JSON-RPC methods
pub mod rpc {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CALL: &str = "eth_call";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
    pub const GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";

    pub const ACCOUNTS_CHANGED: &str = "accountsChanged";
    pub const LATEST: &str = "latest";
}

/// CharityFund contract methods
pub mod contract {
    pub const GET_BALANCE: &str = "getBalance";
    pub const OWNER: &str = "owner";
    pub const DONATE: &str = "donate";
    pub const WITHDRAW: &str = "withdraw";
    pub const REFUND_DONATION: &str = "refundDonation";
    pub const CHANGE_OWNER: &str = "changeOwner";

    /// `(name, input types, payable)` that a bindable interface must expose.
    pub const REQUIRED: &[(&str, &[&str], bool)] = &[
        (GET_BALANCE, &[], false),
        (OWNER, &[], false),
        (DONATE, &[], true),
        (WITHDRAW, &[], false),
        (REFUND_DONATION, &[], false),
        (CHANGE_OWNER, &["address"], false),
    ];
}

/// Receipt status values
pub mod receipt {
    pub const STATUS_SUCCESS: &str = "0x1";
}
