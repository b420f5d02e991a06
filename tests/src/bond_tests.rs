//! Bond depository: pricing, risk limits, vesting and debt decay.

use crate::fixture::{assert_reverts, tokens, Protocol, APIARY_PRICE, ONE, VESTING_TERM};
use apiary_contracts::bond_depository::{
    BondDepository, BondDepositoryInitArgs, MAX_BONDS_PER_USER, MAX_VESTING_TERM,
};
use apiary_contracts::errors::ApiaryError;
use apiary_contracts::mocks::{MockLiquidityPair, MockLiquidityPairInitArgs};
use apiary_contracts::types::{BondParameter, DiscountTier};
use odra::casper_types::U256;
use odra::host::{Deployer, HostRef};
use odra::prelude::Addressable;
use pretty_assertions::assert_eq;

fn apiary_price() -> U256 {
    U256::from(APIARY_PRICE)
}

#[test]
fn scenario_a_half_then_full_redemption() {
    let mut p = Protocol::setup();
    let payout = p.bond_as_alice(tokens(100));
    assert_eq!(payout, tokens(1_000));
    assert_eq!(p.bond.get_total_debt(), tokens(1_000));
    assert_eq!(p.ibgt.balance_of(p.treasury.address().clone()), tokens(100));

    let bond = p.bond.bond_info(p.alice, 0).unwrap();
    assert_eq!(bond.vesting_end - bond.vesting_start, VESTING_TERM);
    assert_eq!(bond.price_paid, apiary_price());

    p.env.advance_block_time(VESTING_TERM / 2);
    p.env.set_caller(p.alice);
    assert_eq!(p.bond.percent_vested_for(p.alice, 0), 5_000);
    assert_eq!(p.bond.redeem(0), tokens(500));
    let bond = p.bond.bond_info(p.alice, 0).unwrap();
    assert_eq!(bond.payout, tokens(500));
    assert!(!bond.redeemed);

    p.env.advance_block_time(VESTING_TERM / 2);
    assert_eq!(p.bond.redeem(0), tokens(500));
    let bond = p.bond.bond_info(p.alice, 0).unwrap();
    assert_eq!(bond.payout, U256::zero());
    assert!(bond.redeemed);

    assert_eq!(p.apiary.balance_of(p.alice), tokens(1_000));
    assert_reverts(p.bond.try_redeem(0), ApiaryError::BondAlreadyRedeemed);
}

#[test]
fn partial_redemptions_sum_to_payout() {
    let mut p = Protocol::setup();
    let payout = p.bond_as_alice(tokens(100));
    p.env.set_caller(p.alice);

    // Vesting checkpoints at 25%, 60% and 100% of the term
    let mut received = U256::zero();
    let mut last_remaining = payout;
    for step in [VESTING_TERM / 4, VESTING_TERM * 3 / 5 - VESTING_TERM / 4, VESTING_TERM * 2 / 5] {
        p.env.advance_block_time(step);
        received += p.bond.redeem(0);

        let remaining = p.bond.bond_info(p.alice, 0).unwrap().payout;
        assert!(remaining <= last_remaining);
        last_remaining = remaining;
    }

    assert_eq!(received, payout);
    assert!(p.bond.bond_info(p.alice, 0).unwrap().redeemed);
}

#[test]
fn nothing_to_redeem_before_vesting() {
    let mut p = Protocol::setup();
    p.bond_as_alice(tokens(100));
    p.env.set_caller(p.alice);

    assert_reverts(p.bond.try_redeem(0), ApiaryError::NothingToRedeem);
    assert_reverts(p.bond.try_redeem_all(), ApiaryError::NothingToRedeem);
    assert_reverts(p.bond.try_redeem(5), ApiaryError::BondNotFound);
}

#[test]
fn redeem_all_sums_open_bonds() {
    let mut p = Protocol::setup();
    p.bond_as_alice(tokens(100));
    p.bond_as_alice(tokens(50));
    assert_eq!(p.bond.bond_count(p.alice), 2);

    p.env.advance_block_time(VESTING_TERM / 2);
    p.env.set_caller(p.alice);
    assert_eq!(p.bond.pending_payout_for(p.alice, 1), tokens(250));
    assert_eq!(p.bond.redeem_all(), tokens(750));
    assert_eq!(p.apiary.balance_of(p.alice), tokens(750));
}

#[test]
fn debt_ceiling_breach_leaves_state_unchanged() {
    let mut p = Protocol::setup();
    p.bond.set_bond_terms(BondParameter::MaxDebt, tokens(500));
    let balance_before = p.ibgt.balance_of(p.alice);

    p.env.set_caller(p.alice);
    p.ibgt.approve(p.bond.address().clone(), tokens(100));
    assert_reverts(
        p.bond.try_deposit(tokens(100), apiary_price()),
        ApiaryError::DebtCeilingExceeded,
    );

    assert_eq!(p.bond.get_total_debt(), U256::zero());
    assert_eq!(p.bond.bond_count(p.alice), 0);
    assert_eq!(p.ibgt.balance_of(p.alice), balance_before);
    assert_eq!(p.apiary.total_supply(), tokens(1_000_000));
}

#[test]
fn slippage_and_size_limits() {
    let mut p = Protocol::setup();
    p.env.set_caller(p.alice);
    p.ibgt.approve(p.bond.address().clone(), tokens(1_000));

    assert_reverts(
        p.bond.try_deposit(tokens(100), apiary_price() - 1),
        ApiaryError::SlippageExceeded,
    );
    // 1 wei of principal pays 10 wei, below the dust floor
    assert_reverts(
        p.bond.try_deposit(U256::one(), apiary_price()),
        ApiaryError::BondTooSmall,
    );
    assert_reverts(p.bond.try_deposit(U256::zero(), apiary_price()), ApiaryError::ZeroAmount);

    // 0.05% of a 1M allocation is 500 APIARY
    p.env.set_caller(p.owner);
    p.bond.set_bond_terms(BondParameter::MaxPayout, U256::from(5u64));
    assert_eq!(p.bond.max_payout(), tokens(500));
    p.env.set_caller(p.alice);
    assert_reverts(
        p.bond.try_deposit(tokens(100), apiary_price()),
        ApiaryError::BondTooLarge,
    );
}

#[test]
fn open_bonds_are_capped_per_user() {
    let mut p = Protocol::setup();
    for _ in 0..MAX_BONDS_PER_USER {
        p.bond_as_alice(tokens(1));
    }

    p.env.set_caller(p.alice);
    p.ibgt.approve(p.bond.address().clone(), tokens(1));
    assert_reverts(
        p.bond.try_deposit(tokens(1), apiary_price()),
        ApiaryError::TooManyBonds,
    );
}

#[test]
fn stale_principal_price_is_rejected() {
    let mut p = Protocol::setup();
    p.env.advance_block_time(3_601);

    p.env.set_caller(p.alice);
    p.ibgt.approve(p.bond.address().clone(), tokens(100));
    assert_reverts(
        p.bond.try_deposit(tokens(100), apiary_price()),
        ApiaryError::OraclePriceStale,
    );

    // A fresh observation restores bonding
    p.env.set_caller(p.owner);
    p.ibgt_feed.update(U256::from(ONE));
    p.env.set_caller(p.alice);
    assert_eq!(p.bond.deposit(tokens(100), apiary_price()), tokens(1_000));
}

#[test]
fn static_discount_lowers_price() {
    let mut p = Protocol::setup();
    p.bond.set_bond_terms(BondParameter::Discount, U256::from(2_000u64));

    // 0.1 at 20% off is 0.08, so 100 iBGT buys 1250 APIARY
    assert_eq!(p.bond.bond_price(), U256::from(ONE / 100 * 8));
    p.env.set_caller(p.alice);
    p.ibgt.approve(p.bond.address().clone(), tokens(100));
    assert_eq!(p.bond.deposit(tokens(100), apiary_price()), tokens(1_250));
}

#[test]
fn dynamic_discounts_follow_debt_ratio() {
    let mut p = Protocol::setup();
    let tiers = vec![
        DiscountTier { max_debt_ratio_bps: 1_000, discount_bps: 2_000 },
        DiscountTier { max_debt_ratio_bps: 5_000, discount_bps: 1_000 },
    ];
    p.bond.set_dynamic_discounts(true, tiers, 9_000);

    // Ratio 0 sits in the deepest tier
    assert_eq!(p.bond.bond_price(), U256::from(ONE / 100 * 8));
    assert_eq!(p.bond_as_alice(tokens(100)), tokens(1_250));

    // 1250 / 10000 = 12.5% debt ratio, second tier
    p.bond.set_bond_terms(BondParameter::MaxDebt, tokens(10_000));
    assert_eq!(p.bond.debt_ratio(), 1_250);
    assert_eq!(p.bond.bond_price(), U256::from(ONE / 100 * 9));

    // Above the pause threshold bonding halts
    p.bond.set_bond_terms(BondParameter::MaxDebt, tokens(1_300));
    p.env.set_caller(p.alice);
    p.ibgt.approve(p.bond.address().clone(), tokens(1));
    assert_reverts(p.bond.try_deposit(tokens(1), apiary_price()), ApiaryError::BondsPaused);
}

#[test]
fn debt_past_top_tier_pauses_bonds() {
    let mut p = Protocol::setup();
    p.bond.set_bond_terms(BondParameter::Discount, U256::from(5_000u64));
    let tiers = vec![DiscountTier { max_debt_ratio_bps: 1_000, discount_bps: 2_000 }];
    p.bond.set_dynamic_discounts(true, tiers, 9_000);
    assert_eq!(p.bond_as_alice(tokens(100)), tokens(1_250));

    // 12.5% is past the only tier but below the pause threshold
    p.bond.set_bond_terms(BondParameter::MaxDebt, tokens(10_000));
    assert_eq!(p.bond.debt_ratio(), 1_250);
    assert_reverts(p.bond.try_bond_price(), ApiaryError::BondsPaused);

    p.env.set_caller(p.alice);
    p.ibgt.approve(p.bond.address().clone(), tokens(1));
    assert_reverts(p.bond.try_deposit(tokens(1), apiary_price()), ApiaryError::BondsPaused);
    assert_eq!(p.bond.get_total_debt(), tokens(1_250));
}

#[test]
fn invalid_discount_tiers_are_rejected() {
    let mut p = Protocol::setup();
    let inverted = vec![
        DiscountTier { max_debt_ratio_bps: 1_000, discount_bps: 500 },
        DiscountTier { max_debt_ratio_bps: 5_000, discount_bps: 1_000 },
    ];
    assert_reverts(
        p.bond.try_set_dynamic_discounts(true, inverted, 9_000),
        ApiaryError::InvalidDiscountTiers,
    );
    assert_reverts(
        p.bond.try_set_dynamic_discounts(true, vec![], 9_000),
        ApiaryError::InvalidDiscountTiers,
    );
}

#[test]
fn debt_decays_linearly_on_deposit() {
    let mut p = Protocol::setup();
    p.bond_as_alice(tokens(100));

    p.env.advance_block_time(VESTING_TERM / 2);
    assert_eq!(p.bond.current_debt(), tokens(500));
    // Decay is only written on the deposit path
    assert_eq!(p.bond.get_total_debt(), tokens(1_000));

    // Keep the principal feed fresh across the jump
    p.ibgt_feed.update(U256::from(ONE));
    p.bond_as_alice(tokens(10));
    assert_eq!(p.bond.get_total_debt(), tokens(600));

    // Redemption never touches debt
    p.env.set_caller(p.alice);
    p.bond.redeem(0);
    assert_eq!(p.bond.get_total_debt(), tokens(600));

    // Decay never exceeds the outstanding debt
    p.env.advance_block_time(VESTING_TERM * 3);
    assert_eq!(p.bond.current_debt(), U256::zero());
}

#[test]
fn terms_are_bounded_and_owner_only() {
    let mut p = Protocol::setup();
    assert_reverts(
        p.bond.try_initialize_bond_terms(VESTING_TERM, 1_000, 0, tokens(1)),
        ApiaryError::AlreadyInitialized,
    );
    assert_reverts(
        p.bond.try_set_bond_terms(BondParameter::Vesting, U256::from(60u64)),
        ApiaryError::InvalidParameter,
    );
    assert_reverts(
        p.bond.try_set_bond_terms(BondParameter::MaxPayout, U256::from(10_001u64)),
        ApiaryError::InvalidParameter,
    );
    assert_reverts(
        p.bond.try_set_bond_terms(BondParameter::MaxDebt, U256::zero()),
        ApiaryError::InvalidParameter,
    );

    p.env.set_caller(p.alice);
    assert_reverts(
        p.bond.try_set_bond_terms(BondParameter::Discount, U256::from(100u64)),
        ApiaryError::Unauthorized,
    );
    assert_eq!(p.bond.get_terms().discount_rate_bps, 0);
}

#[test]
fn vesting_term_is_capped() {
    let mut p = Protocol::setup();
    assert_reverts(
        p.bond.try_set_bond_terms(BondParameter::Vesting, U256::from(u64::MAX)),
        ApiaryError::InvalidParameter,
    );
    assert_reverts(
        p.bond.try_set_bond_terms(BondParameter::Vesting, U256::from(MAX_VESTING_TERM + 1)),
        ApiaryError::InvalidParameter,
    );
    assert_eq!(p.bond.get_terms().vesting_term, VESTING_TERM);

    p.bond.set_bond_terms(BondParameter::Vesting, U256::from(MAX_VESTING_TERM));
    assert_eq!(p.bond_as_alice(tokens(100)), tokens(1_000));
    let bond = p.bond.bond_info(p.alice, 0).unwrap();
    assert_eq!(bond.vesting_end - bond.vesting_start, MAX_VESTING_TERM);
}

#[test]
fn depository_without_terms_rejects_bonds() {
    let p = Protocol::setup();
    let mut fresh = BondDepository::deploy(
        &p.env,
        BondDepositoryInitArgs {
            apiary: p.apiary.address().clone(),
            principal: p.ibgt.address().clone(),
            treasury: p.treasury.address().clone(),
            oracle: p.oracle.address().clone(),
            bonding_calculator: None,
            principal_feed: Some(p.ibgt_feed.address().clone()),
        },
    );
    p.env.set_caller(p.alice);
    assert_reverts(
        fresh.try_deposit(tokens(1), apiary_price()),
        ApiaryError::NotInitialized,
    );
}

#[test]
fn liquidity_bond_uses_risk_free_value() {
    let mut p = Protocol::setup();
    let mut pair = MockLiquidityPair::deploy(
        &p.env,
        MockLiquidityPairInitArgs {
            reserve0: tokens(100),
            reserve1: tokens(100),
        },
    );
    let pair_address = pair.address().clone();
    pair.mint(p.alice, tokens(100));

    let mut lp_bond = BondDepository::deploy(
        &p.env,
        BondDepositoryInitArgs {
            apiary: p.apiary.address().clone(),
            principal: pair_address,
            treasury: p.treasury.address().clone(),
            oracle: p.oracle.address().clone(),
            bonding_calculator: Some(p.calculator.address().clone()),
            principal_feed: None,
        },
    );
    lp_bond.initialize_bond_terms(VESTING_TERM, 1_000, 0, tokens(50_000));
    p.treasury.add_liquidity_token(pair_address, p.calculator.address().clone());
    p.treasury.set_liquidity_depositor(lp_bond.address().clone(), true);
    p.apiary.set_allocation_limit(lp_bond.address().clone(), tokens(1_000_000));
    assert!(lp_bond.is_liquidity_bond());

    // 10 LP of a 100/100 pool is worth 20 HONEY, or 200 APIARY at 0.1
    p.env.set_caller(p.alice);
    pair.approve(lp_bond.address().clone(), tokens(10));
    assert_eq!(lp_bond.deposit(tokens(10), apiary_price()), tokens(200));
    assert_eq!(pair.balance_of(p.treasury.address().clone()), tokens(10));
    assert_eq!(p.treasury.get_total_reserves(pair_address), tokens(10));
}
