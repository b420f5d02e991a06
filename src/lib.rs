//! Apiary Protocol
//!
//! Workspace facade over the contract crate.

pub use apiary_contracts::*;
