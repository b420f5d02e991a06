//! Bonding Calculator Contract
//!
//! Values two-asset liquidity tokens by their risk-free value:
//! `2 * sqrt(reserve0 * reserve1) * amount / total_supply`.
//! Both reserves are assumed to carry the same decimals as the quote currency.

use odra::prelude::*;
use odra::ContractRef;
use odra::casper_types::U256;
use crate::interfaces::LiquidityPairContractRef;

/// Bonding Calculator Contract
#[odra::module]
pub struct BondingCalculator {}

#[odra::module]
impl BondingCalculator {
    pub fn init(&mut self) {}

    /// Quote value of `amount` liquidity tokens of `pair`
    pub fn valuation(&self, pair: Address, amount: U256) -> U256 {
        let pair_ref = LiquidityPairContractRef::new(self.env(), pair);
        let (reserve0, reserve1) = pair_ref.get_reserves();
        let total_supply = pair_ref.total_supply();
        lp_valuation(reserve0, reserve1, total_supply, amount)
    }

    /// Value of the whole pool: `2 * sqrt(k)`
    pub fn total_value(&self, pair: Address) -> U256 {
        let (reserve0, reserve1) = LiquidityPairContractRef::new(self.env(), pair).get_reserves();
        total_pool_value(reserve0, reserve1)
    }
}

/// `2 * sqrt(reserve0 * reserve1)`
pub fn total_pool_value(reserve0: U256, reserve1: U256) -> U256 {
    (reserve0 * reserve1).integer_sqrt() * U256::from(2u8)
}

/// Pro-rata share of the pool value held by `amount` liquidity tokens
pub fn lp_valuation(reserve0: U256, reserve1: U256, total_supply: U256, amount: U256) -> U256 {
    if total_supply.is_zero() {
        return U256::zero();
    }
    total_pool_value(reserve0, reserve1) * amount / total_supply
}
