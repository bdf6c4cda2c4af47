//! Error taxonomy for the wallet session and transaction lifecycle.
//!
//! Input-validation errors (`InvalidInput`, `NotAuthorized`) are produced before
//! anything reaches the wallet. Everything else originates from the provider or
//! the chain and is surfaced per operation, never fatal to the session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tx::Operation;

pub const INSTALL_WALLET: &str = "Please install MetaMask to use this app.";

/// EIP-1193 provider error object: `{code, message}`.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const DISCONNECTED: i64 = 4900;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// A response that arrived but could not be understood.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL, message)
    }

    pub fn is_user_rejection(&self) -> bool { self.code == Self::USER_REJECTED }

    pub fn is_disconnect(&self) -> bool { self.code == Self::DISCONNECTED }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("no injected wallet available")]
    NoWalletAvailable,
    #[error("request rejected in wallet")]
    UserRejected,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not authorized: {0}")]
    NotAuthorized(String),
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    #[error("confirmation failed: {0}")]
    ConfirmationFailed(String),
    #[error("contract binding failed: {0}")]
    Binding(String),
    #[error("no account connected")]
    NotConnected,
    #[error("{0} is already pending")]
    AlreadyPending(Operation),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ClientError {
    /// Classify an error returned by an authorization request.
    pub fn from_authorization(err: ProviderError) -> Self {
        if err.is_user_rejection() {
            Self::UserRejected
        } else if err.is_disconnect() {
            Self::NoWalletAvailable
        } else {
            Self::Provider(err)
        }
    }

    /// Classify an error returned while broadcasting a transaction.
    pub fn from_submission(err: ProviderError) -> Self {
        if err.is_user_rejection() { Self::UserRejected } else { Self::SubmissionFailed(err.message) }
    }

    /// True for errors raised before any request was sent.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::NotAuthorized(_) | Self::NotConnected | Self::AlreadyPending(_))
    }

    /// Human-readable text for the UI.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoWalletAvailable => INSTALL_WALLET.into(),
            Self::UserRejected => "Request rejected in wallet.".into(),
            Self::InvalidInput(msg) | Self::NotAuthorized(msg) => msg.clone(),
            Self::NotConnected => "Connect your wallet first.".into(),
            Self::AlreadyPending(op) => format!("{} is already in progress.", op.label()),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_codes() {
        let rejected = ProviderError::new(ProviderError::USER_REJECTED, "User rejected the request.");
        assert_eq!(ClientError::from_authorization(rejected), ClientError::UserRejected);

        let gone = ProviderError::new(ProviderError::DISCONNECTED, "disconnected");
        assert_eq!(ClientError::from_authorization(gone), ClientError::NoWalletAvailable);

        let other = ProviderError::new(-32002, "Already processing eth_requestAccounts.");
        assert!(matches!(ClientError::from_authorization(other), ClientError::Provider(_)));
    }

    #[test]
    fn submission_codes() {
        let rejected = ProviderError::new(ProviderError::USER_REJECTED, "denied");
        assert_eq!(ClientError::from_submission(rejected), ClientError::UserRejected);

        let funds = ProviderError::new(-32000, "insufficient funds");
        assert_eq!(ClientError::from_submission(funds), ClientError::SubmissionFailed("insufficient funds".into()));
    }

    #[test]
    fn preconditions_and_messages() {
        assert!(ClientError::InvalidInput("x".into()).is_precondition());
        assert!(ClientError::AlreadyPending(Operation::Withdraw).is_precondition());
        assert!(!ClientError::ConfirmationFailed("reverted".into()).is_precondition());

        assert_eq!(ClientError::NoWalletAvailable.user_message(), INSTALL_WALLET);
        assert_eq!(
            ClientError::AlreadyPending(Operation::Donate).user_message(),
            "Donation is already in progress."
        );
    }

    #[test]
    fn provider_error_deserializes_from_wallet_shape() {
        let err: ProviderError = serde_json::from_str(r#"{"code":4001,"message":"User rejected"}"#).unwrap();
        assert!(err.is_user_rejection());
    }
}
