//! Shared deployment for integration tests.
//!
//! Prices: APIARY at 0.1 HONEY (TWAP), iBGT at 1 HONEY (spot feed).
//! The iBGT bond has a 120960 vesting term, no discount, a 50k APIARY debt
//! ceiling and a 1M APIARY mint allocation of which 10% may go to a single bond.

use apiary_contracts::bond_depository::{BondDepository, BondDepositoryHostRef, BondDepositoryInitArgs};
use apiary_contracts::bonding_calculator::{BondingCalculator, BondingCalculatorHostRef};
use apiary_contracts::errors::ApiaryError;
use apiary_contracts::mocks::{
    MockStakingAdapter, MockStakingAdapterHostRef, MockStakingAdapterInitArgs, MockSwapAdapter,
    MockSwapAdapterHostRef, MockSwapAdapterInitArgs,
};
use apiary_contracts::token::{ApiaryToken, ApiaryTokenHostRef, ApiaryTokenInitArgs};
use apiary_contracts::treasury::{Treasury, TreasuryHostRef, TreasuryInitArgs};
use apiary_contracts::twap_oracle::{TwapOracle, TwapOracleHostRef, TwapOracleInitArgs};
use apiary_contracts::yield_manager::{YieldManager, YieldManagerHostRef, YieldManagerInitArgs};
use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
use odra::prelude::*;
use odra::prelude::OdraResult;

pub const ONE: u128 = 1_000_000_000_000_000_000;
pub const VESTING_TERM: u64 = 120_960;
pub const APIARY_PRICE: u128 = ONE / 10;

pub fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::from(ONE)
}

/// `n / 10` tokens
pub fn tenths(n: u64) -> U256 {
    U256::from(n) * U256::from(ONE / 10)
}

pub fn assert_reverts<T: core::fmt::Debug>(result: OdraResult<T>, error: ApiaryError) {
    assert_eq!(result.err(), Some(error.into()));
}

pub struct Protocol {
    pub env: HostEnv,
    pub owner: Address,
    pub alice: Address,
    pub bob: Address,
    pub stakers: Address,
    pub apiary: ApiaryTokenHostRef,
    pub ibgt: ApiaryTokenHostRef,
    pub honey: ApiaryTokenHostRef,
    pub lp: ApiaryTokenHostRef,
    pub oracle: TwapOracleHostRef,
    pub ibgt_feed: TwapOracleHostRef,
    pub calculator: BondingCalculatorHostRef,
    pub treasury: TreasuryHostRef,
    pub bond: BondDepositoryHostRef,
    pub yield_manager: YieldManagerHostRef,
    pub staking: MockStakingAdapterHostRef,
    pub swap: MockSwapAdapterHostRef,
}

fn deploy_token(env: &HostEnv, symbol: &str) -> ApiaryTokenHostRef {
    ApiaryToken::deploy(
        env,
        ApiaryTokenInitArgs {
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            decimals: 18,
        },
    )
}

impl Protocol {
    pub fn setup() -> Self {
        let env = odra_test::env();
        let owner = env.get_account(0);
        let alice = env.get_account(1);
        let bob = env.get_account(2);
        let stakers = env.get_account(3);
        env.set_caller(owner);

        // Host VM addresses are the deployment index right-padded with zeros, so
        // deployment 10 lands on deployment 1's address (and 20 on 2's). The first
        // slot is a throwaway that the bond depository later replaces; a single
        // test must stay under 20 deployments.
        let _shadowed = BondingCalculator::deploy(&env, NoArgs);

        let mut apiary = deploy_token(&env, "APIARY");
        let mut ibgt = deploy_token(&env, "iBGT");
        let mut honey = deploy_token(&env, "HONEY");
        let mut lp = deploy_token(&env, "APIARY-HONEY");

        let oracle = TwapOracle::deploy(
            &env,
            TwapOracleInitArgs {
                initial_price: U256::from(APIARY_PRICE),
                window: 3600,
            },
        );
        let ibgt_feed = TwapOracle::deploy(
            &env,
            TwapOracleInitArgs {
                initial_price: U256::from(ONE),
                window: 3600,
            },
        );
        let calculator = BondingCalculator::deploy(&env, NoArgs);

        let mut treasury = Treasury::deploy(
            &env,
            TreasuryInitArgs {
                apiary: apiary.address().clone(),
                ibgt: ibgt.address().clone(),
            },
        );
        treasury.set_oracle(oracle.address().clone());
        apiary.add_minter(treasury.address().clone());

        let mut bond = BondDepository::deploy(
            &env,
            BondDepositoryInitArgs {
                apiary: apiary.address().clone(),
                principal: ibgt.address().clone(),
                treasury: treasury.address().clone(),
                oracle: oracle.address().clone(),
                bonding_calculator: None,
                principal_feed: Some(ibgt_feed.address().clone()),
            },
        );
        treasury.set_reserve_depositor(bond.address().clone(), true);
        apiary.set_allocation_limit(bond.address().clone(), tokens(1_000_000));
        bond.initialize_bond_terms(VESTING_TERM, 1_000, 0, tokens(50_000));

        let staking = MockStakingAdapter::deploy(
            &env,
            MockStakingAdapterInitArgs {
                ibgt: ibgt.address().clone(),
            },
        );
        let mut swap = MockSwapAdapter::deploy(
            &env,
            MockSwapAdapterInitArgs {
                lp_token: lp.address().clone(),
            },
        );

        let mut yield_manager = YieldManager::deploy(
            &env,
            YieldManagerInitArgs {
                apiary: apiary.address().clone(),
                ibgt: ibgt.address().clone(),
                honey: honey.address().clone(),
                treasury: treasury.address().clone(),
            },
        );
        yield_manager.set_adapters(
            staking.address().clone(),
            swap.address().clone(),
            lp.address().clone(),
        );
        yield_manager.set_staking_contract(stakers);
        treasury.set_yield_manager(yield_manager.address().clone());

        // Venue inventory and 1:1 rates
        swap.set_rate(ibgt.address().clone(), honey.address().clone(), U256::from(ONE));
        swap.set_rate(ibgt.address().clone(), apiary.address().clone(), U256::from(ONE));
        honey.mint(swap.address().clone(), tokens(1_000_000));
        apiary.mint(swap.address().clone(), tokens(1_000_000));
        lp.mint(swap.address().clone(), tokens(1_000_000));

        // Rewards inventory and user funds
        ibgt.mint(staking.address().clone(), tokens(1_000));
        ibgt.mint(alice, tokens(10_000));

        Protocol {
            env,
            owner,
            alice,
            bob,
            stakers,
            apiary,
            ibgt,
            honey,
            lp,
            oracle,
            ibgt_feed,
            calculator,
            treasury,
            bond,
            yield_manager,
            staking,
            swap,
        }
    }

    /// Bond `amount` iBGT as alice; returns the payout
    pub fn bond_as_alice(&mut self, amount: U256) -> U256 {
        self.env.set_caller(self.alice);
        self.ibgt.approve(self.bond.address().clone(), amount);
        let payout = self.bond.deposit(amount, U256::from(APIARY_PRICE));
        self.env.set_caller(self.owner);
        payout
    }

    /// Make `amount` iBGT claimable by the yield manager
    pub fn set_pending_yield(&mut self, amount: U256) {
        let yield_manager = self.yield_manager.address().clone();
        self.staking.set_pending_rewards(yield_manager, amount);
    }
}
