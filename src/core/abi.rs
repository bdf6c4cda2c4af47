//! Interface descriptor: the contract's ABI, loaded once and used for call
//! encoding and return decoding.
//!
//! Accepts a hardhat artifact (`{"abi": [...]}`) or a bare ABI array. Only
//! `function` entries are kept; events, constructors and errors are skipped.
//! Overloads are not supported: the first function with a given name wins.

use alloy_primitives::{keccak256, Address, U256};
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{ClientError, ProviderError, Result};

const WORD: usize = 32;

#[derive(Debug, Clone, Deserialize)]
struct AbiParam {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AbiEntry {
    #[serde(rename = "type", default = "default_entry_kind")]
    kind: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    inputs: Vec<AbiParam>,
    #[serde(default)]
    outputs: Vec<AbiParam>,
    #[serde(rename = "stateMutability", default)]
    state_mutability: Option<String>,
    /// Pre-0.6 ABIs
    #[serde(default)]
    payable: Option<bool>,
}

fn default_entry_kind() -> String { "function".into() }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Artifact {
    Hardhat { abi: Vec<AbiEntry> },
    Bare(Vec<AbiEntry>),
}

/// One callable contract function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub payable: bool,
    pub selector: [u8; 4],
}

impl Method {
    fn new(name: String, inputs: Vec<String>, outputs: Vec<String>, payable: bool) -> Self {
        let signature = format!("{}({})", name, inputs.join(","));
        let hash = keccak256(signature.as_bytes());
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&hash[..4]);
        Self { name, inputs, outputs, payable, selector }
    }

    /// Canonical signature, e.g. `changeOwner(address)`.
    pub fn signature(&self) -> String { format!("{}({})", self.name, self.inputs.join(",")) }

    /// Calldata for this method. Only address arguments are supported.
    pub fn encode_call(&self, args: &[Address]) -> Result<Vec<u8>> {
        if args.len() != self.inputs.len() {
            return Err(ClientError::Binding(format!(
                "{} takes {} argument(s), got {}",
                self.signature(),
                self.inputs.len(),
                args.len()
            )));
        }
        if let Some(other) = self.inputs.iter().find(|t| t.as_str() != "address") {
            return Err(ClientError::Binding(format!("{}: unsupported argument type {}", self.signature(), other)));
        }
        let mut data = Vec::with_capacity(4 + WORD * args.len());
        data.extend_from_slice(&self.selector);
        for arg in args {
            data.extend_from_slice(&[0u8; 12]);
            data.extend_from_slice(arg.as_slice());
        }
        Ok(data)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InterfaceDescriptor {
    methods: HashMap<String, Method>,
}

impl InterfaceDescriptor {
    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: Artifact = serde_json::from_str(json)
            .map_err(|e| ClientError::Binding(format!("malformed interface descriptor: {e}")))?;
        let entries = match artifact {
            Artifact::Hardhat { abi } => abi,
            Artifact::Bare(abi) => abi,
        };
        let mut methods = HashMap::new();
        for entry in entries.into_iter().filter(|e| e.kind == "function") {
            let name = entry
                .name
                .filter(|n| !n.is_empty())
                .ok_or_else(|| ClientError::Binding("function entry without a name".into()))?;
            let payable = entry.state_mutability.as_deref() == Some("payable") || entry.payable == Some(true);
            let method = Method::new(
                name.clone(),
                entry.inputs.into_iter().map(|p| p.kind).collect(),
                entry.outputs.into_iter().map(|p| p.kind).collect(),
                payable,
            );
            methods.entry(name).or_insert(method);
        }
        Ok(Self { methods })
    }

    pub fn method(&self, name: &str) -> Result<&Method> {
        self.methods
            .get(name)
            .ok_or_else(|| ClientError::Binding(format!("interface has no method {name}")))
    }

    pub fn len(&self) -> usize { self.methods.len() }

    pub fn is_empty(&self) -> bool { self.methods.is_empty() }

    /// Check that every `(name, inputs, payable)` is present with that shape.
    pub fn require(&self, expected: &[(&str, &[&str], bool)]) -> Result<()> {
        for (name, inputs, payable) in expected {
            let method = self.method(name)?;
            if method.inputs.iter().map(String::as_str).ne(inputs.iter().copied()) {
                return Err(ClientError::Binding(format!(
                    "{} does not match expected {}({})",
                    method.signature(),
                    name,
                    inputs.join(",")
                )));
            }
            if method.payable != *payable {
                return Err(ClientError::Binding(format!(
                    "{} must {}be payable",
                    method.signature(),
                    if *payable { "" } else { "not " }
                )));
            }
        }
        Ok(())
    }
}

fn first_word(data: &[u8]) -> std::result::Result<&[u8], ProviderError> {
    data.get(..WORD)
        .ok_or_else(|| ProviderError::malformed(format!("return data too short: {} bytes", data.len())))
}

/// Decode a single `uint256` return value.
pub fn decode_uint(data: &[u8]) -> std::result::Result<U256, ProviderError> {
    Ok(U256::from_be_slice(first_word(data)?))
}

/// Decode a single `address` return value.
pub fn decode_address(data: &[u8]) -> std::result::Result<Address, ProviderError> {
    let word = first_word(data)?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(ProviderError::malformed("address word has non-zero padding"));
    }
    Ok(Address::from_slice(&word[12..]))
}
