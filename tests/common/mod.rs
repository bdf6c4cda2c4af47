//! In-memory CharityFund chain behind the `WalletProvider` surface.
//!
//! Calls are dispatched on the 4-byte selector, so the client's encoding is
//! exercised for real. Transactions are mined immediately unless `auto_mine`
//! is off, in which case they sit in the mempool until `mine_all()`.

#![allow(dead_code)]

use alloy_primitives::{keccak256, Address, U256};
use async_trait::async_trait;
use charity_client::{ClientConfig, HostEnvironment, ProviderError, SessionController, WalletHandle, WalletProvider};
use futures::channel::{mpsc, oneshot};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

pub const OWNER: &str = "0x00000000000000000000000000000000000000aa";
pub const DONOR: &str = "0x00000000000000000000000000000000000000bb";
pub const STRANGER: &str = "0x00000000000000000000000000000000000000cc";

pub fn eth(whole: u64) -> U256 { U256::from(whole) * U256::from(10u64).pow(U256::from(18u64)) }

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn addr(raw: &str) -> Address { Address::from_str(raw).expect("test address") }

#[derive(Debug, Clone)]
struct MempoolTx {
    hash: String,
    from: Address,
    data: Vec<u8>,
    value: U256,
}

struct Chain {
    accounts: Vec<String>,
    owner: Address,
    balance: U256,
    donations: HashMap<Address, U256>,
    reads: HashMap<String, usize>,
    sends: Vec<Value>,
    mempool: Vec<MempoolTx>,
    receipts: HashMap<String, Value>,
    auto_mine: bool,
    fail_next_send: Option<ProviderError>,
    reject_accounts: bool,
    fail_reads: bool,
    held: HashMap<String, VecDeque<oneshot::Receiver<()>>>,
    nonce: u64,
    block: u64,
}

pub struct MockChain {
    chain: RefCell<Chain>,
    watchers: RefCell<Vec<mpsc::UnboundedSender<Vec<String>>>>,
}

impl MockChain {
    /// A chain owned by `owner` whose wallet exposes `account`.
    pub fn new(owner: &str, account: &str) -> Rc<Self> {
        Rc::new(Self {
            chain: RefCell::new(Chain {
                accounts: vec![account.to_string()],
                owner: addr(owner),
                balance: U256::ZERO,
                donations: HashMap::new(),
                reads: HashMap::new(),
                sends: Vec::new(),
                mempool: Vec::new(),
                receipts: HashMap::new(),
                auto_mine: true,
                fail_next_send: None,
                reject_accounts: false,
                fail_reads: false,
                held: HashMap::new(),
                nonce: 0,
                block: 1,
            }),
            watchers: RefCell::new(Vec::new()),
        })
    }

    pub fn handle(self: &Rc<Self>) -> WalletHandle { Rc::clone(self) as WalletHandle }

    pub fn host(self: &Rc<Self>) -> MockHost { MockHost(Some(Rc::clone(self))) }

    pub fn reads(&self, method: &str) -> usize { self.chain.borrow().reads.get(method).copied().unwrap_or(0) }

    pub fn sends(&self) -> Vec<Value> { self.chain.borrow().sends.clone() }

    pub fn balance(&self) -> U256 { self.chain.borrow().balance }

    pub fn set_balance(&self, wei: U256) { self.chain.borrow_mut().balance = wei; }

    pub fn set_owner(&self, owner: &str) { self.chain.borrow_mut().owner = addr(owner); }

    pub fn owner(&self) -> Address { self.chain.borrow().owner }

    pub fn set_auto_mine(&self, on: bool) { self.chain.borrow_mut().auto_mine = on; }

    pub fn fail_next_send(&self, err: ProviderError) { self.chain.borrow_mut().fail_next_send = Some(err); }

    /// Every `eth_call` fails until turned off again.
    pub fn fail_reads(&self, on: bool) { self.chain.borrow_mut().fail_reads = on; }

    pub fn reject_accounts(&self) { self.chain.borrow_mut().reject_accounts = true; }

    pub fn set_accounts(&self, accounts: &[&str]) {
        self.chain.borrow_mut().accounts = accounts.iter().map(|a| a.to_string()).collect();
    }

    /// Hold the next read of `method` after its result has been computed.
    pub fn hold_next_read(&self, method: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.chain.borrow_mut().held.entry(method.to_string()).or_default().push_back(rx);
        tx
    }

    /// Change the wallet's accounts and notify every subscriber.
    pub fn switch_accounts(&self, accounts: &[&str]) {
        self.set_accounts(accounts);
        let list: Vec<String> = accounts.iter().map(|a| a.to_string()).collect();
        self.watchers.borrow_mut().retain(|w| w.unbounded_send(list.clone()).is_ok());
    }

    /// Stop notifying: subscribers see their stream end.
    pub fn close_watchers(&self) { self.watchers.borrow_mut().clear(); }

    pub fn mine_all(&self) {
        let mut chain = self.chain.borrow_mut();
        let pending: Vec<MempoolTx> = chain.mempool.drain(..).collect();
        for tx in pending {
            chain.mine(tx);
        }
    }

    fn call(&self, params: &Value) -> Result<(String, Value), ProviderError> {
        let data = tx_data(&params[0])?;
        let chain = self.chain.borrow();
        let (name, word) = if data[..4] == selector("getBalance()") {
            ("getBalance", chain.balance.to_be_bytes::<32>())
        } else if data[..4] == selector("owner()") {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(chain.owner.as_slice());
            ("owner", word)
        } else if data[..4] == selector("donations(address)") {
            let who = Address::from_slice(&data[16..36]);
            ("donations", chain.donations.get(&who).copied().unwrap_or_default().to_be_bytes::<32>())
        } else {
            return Err(ProviderError::new(-32000, "execution reverted: unknown selector"));
        };
        Ok((name.to_string(), json!(format!("0x{}", hex::encode(word)))))
    }

    fn send(&self, params: &Value) -> Result<Value, ProviderError> {
        let mut chain = self.chain.borrow_mut();
        chain.sends.push(params[0].clone());
        if let Some(err) = chain.fail_next_send.take() {
            return Err(err);
        }
        let from = params[0]["from"].as_str().map(addr).ok_or_else(|| ProviderError::new(-32602, "missing from"))?;
        let value = params[0]["value"]
            .as_str()
            .map(|v| U256::from_str_radix(v.trim_start_matches("0x"), 16).expect("hex value"))
            .unwrap_or_default();
        chain.nonce += 1;
        let tx = MempoolTx { hash: format!("0x{:064x}", chain.nonce), from, data: tx_data(&params[0])?, value };
        let hash = tx.hash.clone();
        if chain.auto_mine {
            chain.mine(tx);
        } else {
            chain.mempool.push(tx);
        }
        Ok(json!(hash))
    }
}

impl Chain {
    fn mine(&mut self, tx: MempoolTx) {
        let selector_of = &tx.data[..4];
        let ok = if selector_of == selector("donate()") {
            *self.donations.entry(tx.from).or_default() += tx.value;
            self.balance += tx.value;
            true
        } else if selector_of == selector("withdraw()") {
            let allowed = tx.from == self.owner;
            if allowed {
                self.balance = U256::ZERO;
            }
            allowed
        } else if selector_of == selector("refundDonation()") {
            let donated = self.donations.get(&tx.from).copied().unwrap_or_default();
            if donated > U256::ZERO {
                self.balance -= donated;
                self.donations.insert(tx.from, U256::ZERO);
            }
            donated > U256::ZERO
        } else if selector_of == selector("changeOwner(address)") {
            let allowed = tx.from == self.owner;
            if allowed {
                self.owner = Address::from_slice(&tx.data[16..36]);
            }
            allowed
        } else {
            false
        };
        self.block += 1;
        let status = if ok { "0x1" } else { "0x0" };
        self.receipts.insert(
            tx.hash.clone(),
            json!({"transactionHash": tx.hash, "blockNumber": format!("0x{:x}", self.block), "status": status}),
        );
    }
}

fn tx_data(tx: &Value) -> Result<Vec<u8>, ProviderError> {
    let data = tx["data"].as_str().ok_or_else(|| ProviderError::new(-32602, "missing data"))?;
    let bytes = hex::decode(data.trim_start_matches("0x")).map_err(|e| ProviderError::new(-32602, e.to_string()))?;
    if bytes.len() < 4 {
        return Err(ProviderError::new(-32602, "short calldata"));
    }
    Ok(bytes)
}

#[async_trait(?Send)]
impl WalletProvider for MockChain {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        match method {
            "eth_requestAccounts" => {
                let chain = self.chain.borrow();
                if chain.reject_accounts {
                    return Err(ProviderError::new(ProviderError::USER_REJECTED, "User rejected the request."));
                }
                Ok(json!(chain.accounts))
            }
            "eth_call" => {
                if self.chain.borrow().fail_reads {
                    return Err(ProviderError::new(ProviderError::INTERNAL, "node unavailable"));
                }
                let (name, result) = self.call(&params)?;
                let gate = {
                    let mut chain = self.chain.borrow_mut();
                    *chain.reads.entry(name.clone()).or_default() += 1;
                    chain.held.get_mut(&name).and_then(VecDeque::pop_front)
                };
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                Ok(result)
            }
            "eth_sendTransaction" => self.send(&params),
            "eth_getTransactionReceipt" => {
                let hash = params[0].as_str().unwrap_or_default();
                Ok(self.chain.borrow().receipts.get(hash).cloned().unwrap_or(Value::Null))
            }
            other => Err(ProviderError::new(ProviderError::METHOD_NOT_FOUND, format!("unsupported method {other}"))),
        }
    }

    fn subscribe_accounts(&self) -> mpsc::UnboundedReceiver<Vec<String>> {
        let (tx, rx) = mpsc::unbounded();
        self.watchers.borrow_mut().push(tx);
        rx
    }
}

pub struct MockHost(pub Option<Rc<MockChain>>);

impl MockHost {
    pub fn empty() -> Self { Self(None) }
}

impl HostEnvironment for MockHost {
    fn injected_wallet(&self) -> Option<WalletHandle> { self.0.as_ref().map(|chain| chain.handle()) }
}

pub fn test_config() -> ClientConfig { ClientConfig::default().with_confirmation_poll(Duration::from_millis(5)) }

/// A session over `chain`, not yet connected.
pub fn session(chain: &Rc<MockChain>) -> SessionController {
    SessionController::new(test_config(), &chain.host()).expect("session")
}

/// A connected session for `account` on a chain owned by `owner`.
pub async fn connected(owner: &str, account: &str) -> (Rc<MockChain>, SessionController) {
    let chain = MockChain::new(owner, account);
    let session = session(&chain);
    session.connect().await.expect("connect");
    (chain, session)
}
