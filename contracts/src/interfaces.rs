//! Collaborator interfaces for cross-contract calls.
//!
//! Every external dependency of the core contracts is reached through one of these
//! traits, so any contract exposing the same entry points (a production venue adapter
//! or a test double from `mocks`) can be wired in by address.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::types::{LiquidityResult, PriceData, TreasuryValuation};

/// CEP-18 token
#[odra::external_contract]
pub trait Cep18Token {
    fn transfer(&mut self, recipient: Address, amount: U256) -> bool;
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool;
    fn approve(&mut self, spender: Address, amount: U256) -> bool;
    fn allowance(&self, owner: Address, spender: Address) -> U256;
    fn balance_of(&self, account: Address) -> U256;
    fn total_supply(&self) -> U256;
}

/// APIARY token ledger: CEP-18 plus protocol mint/burn
#[odra::external_contract]
pub trait ProtocolToken {
    fn transfer(&mut self, recipient: Address, amount: U256) -> bool;
    fn balance_of(&self, account: Address) -> U256;
    fn total_supply(&self) -> U256;
    fn mint(&mut self, to: Address, amount: U256);
    fn burn(&mut self, amount: U256);
    fn allocation_limits(&self, account: Address) -> U256;
}

/// Time-weighted price oracle for APIARY in quote currency
#[odra::external_contract]
pub trait PriceOracle {
    /// Quote amount for `amount_in` APIARY averaged over the oracle window
    fn consult(&self, amount_in: U256) -> U256;
}

/// Spot price feed for a single-asset bond principal
#[odra::external_contract]
pub trait PriceFeed {
    fn latest_price_data(&self) -> PriceData;
}

/// Liquidity token valuation (bonding calculator)
#[odra::external_contract]
pub trait LiquidityValuator {
    /// Quote value of `amount` liquidity tokens of `pair`
    fn valuation(&self, pair: Address, amount: U256) -> U256;
}

/// Two-asset liquidity pair read by the bonding calculator
#[odra::external_contract]
pub trait LiquidityPair {
    fn get_reserves(&self) -> (U256, U256);
    fn total_supply(&self) -> U256;
}

/// External staking venue for the reserve asset
#[odra::external_contract]
pub trait StakingAdapter {
    fn stake(&mut self, amount: U256);
    fn unstake(&mut self, amount: U256);
    fn claim_rewards(&mut self) -> U256;
    fn pending_rewards(&self, account: Address) -> U256;
}

/// External swap / liquidity venue
#[odra::external_contract]
pub trait SwapAdapter {
    fn swap(&mut self, token_in: Address, token_out: Address, amount_in: U256, min_amount_out: U256) -> U256;
    fn add_liquidity(
        &mut self,
        token_a: Address,
        token_b: Address,
        amount_a: U256,
        amount_b: U256,
        min_a: U256,
        min_b: U256,
    ) -> LiquidityResult;
    fn stake_lp(&mut self, lp_token: Address, amount: U256) -> U256;
    fn get_amount_out(&self, token_in: Address, token_out: Address, amount_in: U256) -> U256;
}

/// Treasury surface used by bond depositories and the yield manager
#[odra::external_contract]
pub trait ReserveTreasury {
    fn deposit(&mut self, amount: U256, token: Address, mint_value: U256) -> U256;
    fn pull_ibgt_for_staking(&mut self, amount: U256);
    fn return_ibgt_from_staking(&mut self, amount: U256, principal: U256);
    fn get_market_cap_and_treasury_value(&self) -> TreasuryValuation;
}
