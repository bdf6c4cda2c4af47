//! Account addresses: lowercase normalization, format validation, comparison.
//!
//! On-chain addresses are case-insensitive. Every comparison in the client goes
//! through [`same_address`] or compares normalized [`Account`] values.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ClientError, Result};

/// A lowercase-normalized `0x`-prefixed address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Account(Address);

impl Account {
    /// Parse an address of any letter case (wallet responses, contract returns).
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if !has_address_shape(raw) {
            return Err(ClientError::InvalidInput(format!("not an address: {raw}")));
        }
        Address::from_str(raw)
            .map(Self)
            .map_err(|e| ClientError::InvalidInput(format!("not an address: {raw} ({e})")))
    }

    /// Parse user-entered text. Mixed-case input must carry a valid checksum.
    pub fn parse_input(raw: &str) -> Result<Self> {
        if !is_address(raw) {
            return Err(ClientError::InvalidInput(format!("not an address: {}", raw.trim())));
        }
        Self::parse(raw)
    }

    pub fn address(&self) -> Address { self.0 }

    pub fn to_hex(&self) -> String { format!("0x{}", hex::encode(self.0.as_slice())) }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_hex()) }
}

impl FromStr for Account {
    type Err = ClientError;
    fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl From<Address> for Account {
    fn from(address: Address) -> Self { Self(address) }
}

impl TryFrom<String> for Account {
    type Error = ClientError;
    fn try_from(value: String) -> Result<Self> { Self::parse(&value) }
}

impl From<Account> for String {
    fn from(account: Account) -> Self { account.to_hex() }
}

fn hex_digits(raw: &str) -> Option<&str> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    (digits.len() == 40 && digits.bytes().all(|b| b.is_ascii_hexdigit())).then_some(digits)
}

fn has_address_shape(raw: &str) -> bool { hex_digits(raw).is_some() }

/// Address-format check applied to user input before any submission.
///
/// Same shape as ethers' `isAddress`: 40 hex digits with an optional lowercase
/// `0x`. All-lowercase and all-uppercase digits are accepted as is; mixed case
/// is an EIP-55 checksum and must verify.
pub fn is_address(raw: &str) -> bool {
    let Some(digits) = hex_digits(raw.trim()) else {
        return false;
    };
    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(format!("0x{digits}"), None).is_ok();
    }
    true
}

/// Case-insensitive address equality.
pub fn same_address(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
