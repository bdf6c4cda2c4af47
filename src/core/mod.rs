//! Shared primitives (compile everywhere): addresses, ether units, the contract
//! interface descriptor and the registry of method names.

pub mod abi;
pub mod address;
pub mod methods;
pub mod units;
