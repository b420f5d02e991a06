//! Common types used across the Apiary protocol.

use odra::prelude::*;
use odra::casper_types::U256;

/// Oracle price status
#[odra::odra_type]
#[derive(Copy)]
pub enum OracleStatus {
    /// Price is valid and fresh
    Ok,
    /// Price data unavailable
    Unavailable,
    /// Price data is stale
    Stale,
    /// Price deviation exceeds the configured bound from the last good price
    Deviation,
}

/// Price data returned by a price feed
#[odra::odra_type]
pub struct PriceData {
    /// Integer price value
    pub price_int: U256,
    /// Decimal places for price_int
    pub price_decimals: u8,
    /// Timestamp of the observation
    pub timestamp_sec: u64,
    /// Price status
    pub status: OracleStatus,
}

/// Reserve asset (iBGT) sub-ledger kept by the treasury
#[odra::odra_type]
#[derive(Default)]
pub struct IbgtAccounting {
    /// All iBGT ever deposited through `deposit`
    pub total_deposited: U256,
    /// Principal currently out with the yield manager
    pub total_staked: U256,
    /// All iBGT ever returned from staking (principal + rewards)
    pub total_returned: U256,
    /// iBGT held by the treasury and free to be staked or borrowed
    pub available_balance: U256,
}

/// Market capitalisation and backing, both in quote currency (HONEY, 1e18)
#[odra::odra_type]
#[derive(Default)]
pub struct TreasuryValuation {
    pub market_cap: U256,
    pub treasury_value: U256,
}

/// A single vesting bond
#[odra::odra_type]
#[derive(Default)]
pub struct BondInfo {
    /// APIARY remaining to be paid
    pub payout: U256,
    /// Discounted price paid (quote per APIARY, 1e18)
    pub price_paid: U256,
    /// Vesting start timestamp
    pub vesting_start: u64,
    /// Vesting end timestamp
    pub vesting_end: u64,
    /// Whether the bond has been fully paid out
    pub redeemed: bool,
}

/// Bond terms
#[odra::odra_type]
#[derive(Default)]
pub struct BondTerms {
    /// Vesting length in block time units
    pub vesting_term: u64,
    /// Max payout per bond in ten-thousandths of the depository allocation
    pub max_payout_bps: u32,
    /// Static discount in bps applied to the oracle price
    pub discount_rate_bps: u32,
    /// Ceiling for outstanding debt (APIARY)
    pub max_debt: U256,
}

/// Adjustable bond term selector for `set_bond_terms`
#[odra::odra_type]
#[derive(Copy)]
pub enum BondParameter {
    Vesting,
    MaxPayout,
    Discount,
    MaxDebt,
}

/// One step of the debt-ratio discount ladder.
///
/// Applies while the debt ratio is strictly below `max_debt_ratio_bps`.
#[odra::odra_type]
#[derive(Copy)]
pub struct DiscountTier {
    pub max_debt_ratio_bps: u32,
    pub discount_bps: u32,
}

/// Debt-ratio tiered discounts
#[odra::odra_type]
#[derive(Default)]
pub struct DynamicDiscounts {
    pub enabled: bool,
    /// Tiers ordered by ascending `max_debt_ratio_bps`
    pub tiers: Vec<DiscountTier>,
    /// Bonds are paused at or above this debt ratio
    pub pause_threshold_bps: u32,
}

/// Yield split in bps, summing to 10000
#[odra::odra_type]
#[derive(Copy, Default)]
pub struct SplitConfig {
    pub to_honey: u32,
    pub to_apiary_lp: u32,
    pub to_burn: u32,
    pub to_stakers: u32,
    pub to_compound: u32,
}

impl SplitConfig {
    pub fn total(&self) -> u64 {
        self.to_honey as u64
            + self.to_apiary_lp as u64
            + self.to_burn as u64
            + self.to_stakers as u64
            + self.to_compound as u64
    }
}

/// Yield distribution strategy
#[odra::odra_type]
#[derive(Copy)]
pub enum Strategy {
    /// Fixed split
    Phase1,
    /// Conditional on market cap versus treasury value
    Phase2,
    /// Compound everything to the treasury
    Phase3,
}

/// Parameters for the Phase2 branch
#[odra::odra_type]
#[derive(Copy)]
pub struct Phase2Config {
    /// Market cap above `treasury_value * multiplier / 10000` triggers compounding
    pub mc_threshold_multiplier_bps: u32,
    /// Share compounded to the treasury when the threshold is exceeded
    pub compound_bps: u32,
    /// Share routed to stakers between parity and the threshold
    pub stakers_bps: u32,
}

impl Default for Phase2Config {
    fn default() -> Self {
        Self {
            mc_threshold_multiplier_bps: 13_000,
            compound_bps: 3_000,
            stakers_bps: 2_000,
        }
    }
}

/// Result of one harvest
#[odra::odra_type]
#[derive(Default)]
pub struct ExecutionResult {
    pub total_yield: U256,
    pub honey_swapped: U256,
    pub apiary_burned: U256,
    pub lp_created: U256,
    pub compounded: U256,
}

/// Cumulative harvest statistics
#[odra::odra_type]
#[derive(Default)]
pub struct YieldStats {
    pub total_yield_processed: U256,
    pub total_honey_swapped: U256,
    pub total_apiary_burned: U256,
    pub total_lp_created: U256,
    pub total_compounded: U256,
    pub execution_count: u64,
}

/// Amounts actually consumed by a liquidity add
#[odra::odra_type]
#[derive(Default)]
pub struct LiquidityResult {
    pub used_a: U256,
    pub used_b: U256,
    pub liquidity: U256,
}
