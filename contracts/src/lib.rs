//! Apiary Protocol Contracts
//!
//! Reserve-backed token protocol core on Casper.
//!
//! ## Architecture
//!
//! - **Treasury**: Reserve custody, depositor authorization and the APIARY mint gate
//! - **BondDepository**: Discounted, linearly vesting APIARY sold against one principal
//! - **YieldManager**: Harvests iBGT rewards and swaps, burns, pairs or compounds them
//! - **ApiaryToken**: CEP-18 token with allocation-limited protocol minting
//! - **TwapOracle**: Time-weighted APIARY price with a spot feed view
//! - **BondingCalculator**: Risk-free valuation of liquidity tokens
//!
//! ## Flows
//!
//! Bonding: `BondDepository.deposit -> Treasury.deposit (mints payout) -> vesting entry`.
//! Harvest: `YieldManager.execute_yield -> claim -> swap / burn / LP / stake -> Treasury`.
//! iBGT principal moves between Treasury and YieldManager through
//! `pull_ibgt_for_staking` and `return_ibgt_from_staking`.

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod types;
pub mod errors;
pub mod math;
pub mod interfaces;

// Contract modules
pub mod token;
pub mod twap_oracle;
pub mod bonding_calculator;
pub mod treasury;
pub mod bond_depository;
pub mod yield_manager;

#[cfg(feature = "mocks")]
pub mod mocks;
