//! Charity client: wallet session and transaction lifecycle for the CharityFund contract.
//!
//! # Architecture
//!
//! ```text
//! SessionController (entry point)
//!   │
//!   ├── WalletHandle (detected once from the host)
//!   │     └── authorize() → Account (lowercase)
//!   │
//!   ├── SessionState
//!   │     ├── CharityContract (bound to the account's signer)
//!   │     └── snapshot: account, balance, owner, is_owner
//!   │
//!   ├── TransactionController
//!   │     └── per operation: Idle → Submitting → AwaitingConfirmation → Confirmed | Failed
//!   │
//!   └── view() → SessionView (pure; never triggers reads)
//! ```
//!
//! # Actions
//!
//! | Action | Method | Gate |
//! |--------|--------|------|
//! | connect | `session.connect()` | wallet present |
//! | donate | `session.donate()` | amount > 0 |
//! | withdraw | `session.withdraw()` | owner |
//! | refund | `session.refund_donation()` | connected |
//! | change owner | `session.change_owner()` | owner, valid address |
//!
//! # Features
//!
//! - `native` - JSON-RPC dev-node wallet, tracing-subscriber logging, `charity` CLI
//! - `wasm` - browser host (`window.ethereum`), `CharityApp` JS bindings
//!
//! # Usage
//!
//! ```ignore
//! use charity_client::{ClientConfig, RpcHost, SessionController};
//!
//! let config = ClientConfig::from_env()?;
//! let session = SessionController::new(config.clone(), &RpcHost::new(&config.rpc_url))?;
//! session.connect().await?;
//! session.set_donation_amount("1.5");
//! session.donate().await?;
//! println!("{}", session.view().balance_label);
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod config;
pub mod contract;
pub mod core;
pub mod error;
pub mod session;
pub mod tx;
pub mod view;
pub mod wallet;

// =============================================================================
// Native-only modules
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports
// =============================================================================
pub use config::ClientConfig;
pub use contract::{bind, CharityContract, PendingTransaction, Receipt};
pub use self::core::abi::InterfaceDescriptor;
pub use self::core::address::{is_address, same_address, Account};
pub use self::core::units::{format_amount, parse_amount};
pub use error::{ClientError, ProviderError, Result};
pub use session::{is_owner, Form, FormInputs, Notice, SessionController, SessionSnapshot, SessionState};
pub use tx::{Operation, TransactionController, TxPhase};
pub use view::{Action, SessionView};
pub use wallet::{authorize, detect, HostEnvironment, WalletHandle, WalletProvider};

#[cfg(feature = "native")]
pub use wallet::{RpcHost, RpcWallet};

#[cfg(feature = "wasm")]
pub use wasm::{BrowserHost, CharityApp, InjectedWallet};
