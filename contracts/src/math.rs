//! Fixed-point helpers shared by the treasury, bond depository and yield manager.
//!
//! Amounts are U256 with 18 decimals unless noted. Percentages are basis points
//! (10000 = 100%). Every helper is pure so the contract modules stay thin and the
//! arithmetic can be unit tested without a VM.

use odra::casper_types::U256;

/// Basis points scale (100% = 10000 bps)
pub const BPS_SCALE: u32 = 10_000;

/// Internal precision scale (1e18)
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// `amount * bps / 10000`
pub fn bps_of(amount: U256, bps: u32) -> U256 {
    amount * U256::from(bps) / U256::from(BPS_SCALE)
}

/// Linear vesting progress in bps.
///
/// 0 at or before `vesting_start`, 10000 at or after `vesting_end`,
/// `(now - start) * 10000 / (end - start)` in between.
pub fn percent_vested(vesting_start: u64, vesting_end: u64, now: u64) -> u32 {
    if now <= vesting_start {
        return 0;
    }
    if now >= vesting_end || vesting_end <= vesting_start {
        return BPS_SCALE;
    }
    let elapsed = (now - vesting_start) as u128;
    let term = (vesting_end - vesting_start) as u128;
    (elapsed * BPS_SCALE as u128 / term) as u32
}

/// Portion of `payout` claimable at `percent_vested_bps`.
pub fn vested_amount(payout: U256, percent_vested_bps: u32) -> U256 {
    if percent_vested_bps >= BPS_SCALE {
        payout
    } else {
        bps_of(payout, percent_vested_bps)
    }
}

/// Apply a discount: `price * (10000 - discount_bps) / 10000`.
pub fn discounted_price(price: U256, discount_bps: u32) -> U256 {
    let keep = BPS_SCALE.saturating_sub(discount_bps);
    bps_of(price, keep)
}

/// Protocol tokens owed for `value` quote units at `price` (quote per token, 1e18).
pub fn payout_for(value: U256, price: U256) -> U256 {
    if price.is_zero() {
        return U256::zero();
    }
    value * U256::from(PRECISION) / price
}

/// Debt to remove after `elapsed` time units: `total_debt * elapsed / vesting_term`,
/// never more than `total_debt`.
pub fn debt_decay(total_debt: U256, elapsed: u64, vesting_term: u64) -> U256 {
    if vesting_term == 0 || elapsed >= vesting_term {
        return total_debt;
    }
    total_debt * U256::from(elapsed) / U256::from(vesting_term)
}

/// Outstanding debt as bps of the ceiling, saturating at u32::MAX.
pub fn debt_ratio_bps(total_debt: U256, max_debt: U256) -> u32 {
    if max_debt.is_zero() {
        return u32::MAX;
    }
    let ratio = total_debt * U256::from(BPS_SCALE) / max_debt;
    if ratio > U256::from(u32::MAX) {
        u32::MAX
    } else {
        ratio.low_u32()
    }
}

/// Minimum acceptable output for a quote given a slippage tolerance in bps.
pub fn min_amount_out(quote: U256, slippage_bps: u32) -> U256 {
    bps_of(quote, BPS_SCALE.saturating_sub(slippage_bps))
}

/// Quote value of `amount` tokens at `price` carrying `price_decimals` decimals.
pub fn value_at_price(amount: U256, price: U256, price_decimals: u8) -> U256 {
    amount * price / U256::from(10u64).pow(U256::from(price_decimals))
}
