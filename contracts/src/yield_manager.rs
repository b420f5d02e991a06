//! Yield Manager Contract
//!
//! Harvests iBGT rewards from the staking adapter and distributes them.
//!
//! A harvest runs in two stages. First a `DistributionPlan` is derived from the
//! active strategy with no side effects; then the plan is executed leg by leg through
//! the swap adapter:
//! - HONEY leg: swap to HONEY
//! - LP leg: swap to APIARY, pair with the HONEY, add liquidity, stake the LP tokens
//! - Burn leg: swap to APIARY and burn
//! - Stakers leg: swap to APIARY and send to the staking contract
//! - Compound leg: return iBGT to the treasury with zero principal
//!
//! Unpaired HONEY and APIARY end up in the treasury. Any failing leg reverts the
//! whole harvest, including the reward claim and the execution timestamp.

use odra::prelude::*;
use odra::ContractRef;
use odra::casper_types::U256;
use crate::errors::ApiaryError;
use crate::interfaces::{
    Cep18TokenContractRef, ProtocolTokenContractRef, ReserveTreasuryContractRef,
    StakingAdapterContractRef, SwapAdapterContractRef,
};
use crate::math::{bps_of, min_amount_out, BPS_SCALE};
use crate::types::{ExecutionResult, Phase2Config, SplitConfig, Strategy, TreasuryValuation, YieldStats};

/// Minimum time between two harvests (1 hour)
pub const MIN_EXECUTION_INTERVAL: u64 = 3600;

/// Upper bound for the swap slippage tolerance (10%)
pub const MAX_SLIPPAGE_BPS: u32 = 1_000;

/// Default swap slippage tolerance (5%)
const DEFAULT_SLIPPAGE_BPS: u32 = 500;

/// Default Phase1 split: 25% HONEY, 50% LP, 25% burn
const DEFAULT_SPLIT: SplitConfig = SplitConfig {
    to_honey: 2_500,
    to_apiary_lp: 5_000,
    to_burn: 2_500,
    to_stakers: 0,
    to_compound: 0,
};

/// iBGT amounts assigned to each distribution leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DistributionPlan {
    pub honey: U256,
    pub lp: U256,
    pub burn: U256,
    pub stakers: U256,
    pub compound: U256,
}

impl DistributionPlan {
    pub fn total(&self) -> U256 {
        self.honey + self.lp + self.burn + self.stakers + self.compound
    }
}

#[odra::event]
pub struct YieldExecuted {
    pub strategy: Strategy,
    pub total_yield: U256,
    pub honey_swapped: U256,
    pub apiary_burned: U256,
    pub lp_created: U256,
    pub compounded: U256,
    pub carried_over: U256,
}

#[odra::event]
pub struct SplitUpdated {
    pub to_honey: u32,
    pub to_apiary_lp: u32,
    pub to_burn: u32,
    pub to_stakers: u32,
    pub to_compound: u32,
}

#[odra::event]
pub struct StrategyUpdated {
    pub strategy: Strategy,
}

#[odra::event]
pub struct EmergencyModeSet {
    pub enabled: bool,
}

/// Yield Manager Contract
#[odra::module(events = [YieldExecuted, SplitUpdated, StrategyUpdated, EmergencyModeSet])]
pub struct YieldManager {
    /// Contract owner
    owner: Var<Address>,
    /// APIARY token
    apiary: Var<Address>,
    /// Reserve asset and reward token
    ibgt: Var<Address>,
    /// Quote stablecoin
    honey: Var<Address>,
    /// Protocol treasury
    treasury: Var<Address>,
    /// External staking venue adapter
    staking_adapter: Var<Option<Address>>,
    /// External swap / liquidity venue adapter
    swap_adapter: Var<Option<Address>>,
    /// HONEY/APIARY liquidity token
    lp_token: Var<Option<Address>>,
    /// Recipient of the stakers leg
    staking_contract: Var<Option<Address>>,
    /// Active split
    split: Var<SplitConfig>,
    /// Active strategy
    strategy: Var<Strategy>,
    /// Phase2 parameters
    phase2_config: Var<Phase2Config>,
    /// Swap slippage tolerance in bps
    slippage_bps: Var<u32>,
    /// Harvests below this are rejected
    min_yield_amount: Var<U256>,
    /// Harvest cap (0 = unlimited); the excess carries over
    max_yield_per_harvest: Var<U256>,
    /// Claimed yield held back by the harvest cap
    carried_yield: Var<U256>,
    /// Last harvest time, unset until the first harvest
    last_execution_time: Var<u64>,
    /// iBGT principal currently staked through the adapter
    staked_principal: Var<U256>,
    /// Cumulative statistics
    stats: Var<YieldStats>,
    /// Compound everything regardless of strategy
    emergency_mode: Var<bool>,
    /// Whether mutating entry points are halted
    paused: Var<bool>,
}

#[odra::module]
impl YieldManager {
    /// Initialize the yield manager
    pub fn init(&mut self, apiary: Address, ibgt: Address, honey: Address, treasury: Address) {
        self.owner.set(self.env().caller());
        self.apiary.set(apiary);
        self.ibgt.set(ibgt);
        self.honey.set(honey);
        self.treasury.set(treasury);
        self.staking_adapter.set(None);
        self.swap_adapter.set(None);
        self.lp_token.set(None);
        self.staking_contract.set(None);
        self.split.set(DEFAULT_SPLIT);
        self.strategy.set(Strategy::Phase1);
        self.phase2_config.set(Phase2Config::default());
        self.slippage_bps.set(DEFAULT_SLIPPAGE_BPS);
        self.min_yield_amount.set(U256::zero());
        self.max_yield_per_harvest.set(U256::zero());
        self.carried_yield.set(U256::zero());
        self.staked_principal.set(U256::zero());
        self.stats.set(YieldStats::default());
        self.emergency_mode.set(false);
        self.paused.set(false);
    }

    // ========== Harvest ==========

    /// Claim pending rewards and distribute them according to the active strategy
    #[odra(non_reentrant)]
    pub fn execute_yield(&mut self) -> ExecutionResult {
        self.require_not_paused();
        let staking_adapter = self.staking_adapter_address();
        if !self.compounds_only() {
            self.swap_adapter_address();
        }

        let now = self.env().get_block_time();
        if !interval_elapsed(self.last_execution_time.get(), now) {
            self.env().revert(ApiaryError::ExecutionTooSoon);
        }

        let self_address = self.env().self_address();
        let pending = StakingAdapterContractRef::new(self.env(), staking_adapter).pending_rewards(self_address);
        let carried = self.get_carried_yield();
        let available = pending + carried;
        if available.is_zero() {
            self.env().revert(ApiaryError::NoYieldAvailable);
        }
        if available < self.get_min_yield_amount() {
            self.env().revert(ApiaryError::BelowMinimumYield);
        }
        let (total_yield, carry_over) = cap_harvest(available, self.get_max_yield_per_harvest());

        self.last_execution_time.set(now);
        self.carried_yield.set(carry_over);

        if !pending.is_zero() {
            self.claim_rewards(staking_adapter, pending);
        }

        let strategy = self.get_strategy();
        let emergency = self.is_emergency_mode();
        let valuation = if !emergency && strategy == Strategy::Phase2 {
            Some(ReserveTreasuryContractRef::new(self.env(), self.treasury_address()).get_market_cap_and_treasury_value())
        } else {
            None
        };

        let plan = plan_distribution(
            total_yield,
            strategy,
            emergency,
            &self.get_split(),
            &self.get_phase2_config(),
            valuation.as_ref(),
        );
        let result = self.execute_plan(&plan, total_yield);

        let mut stats = self.get_stats();
        stats.total_yield_processed += result.total_yield;
        stats.total_honey_swapped += result.honey_swapped;
        stats.total_apiary_burned += result.apiary_burned;
        stats.total_lp_created += result.lp_created;
        stats.total_compounded += result.compounded;
        stats.execution_count += 1;
        self.stats.set(stats);

        self.env().emit_event(YieldExecuted {
            strategy,
            total_yield: result.total_yield,
            honey_swapped: result.honey_swapped,
            apiary_burned: result.apiary_burned,
            lp_created: result.lp_created,
            compounded: result.compounded,
            carried_over: carry_over,
        });

        result
    }

    // ========== Principal Staking ==========

    /// Pull available iBGT from the treasury and stake it through the adapter
    #[odra(non_reentrant)]
    pub fn stake_ibgt(&mut self, amount: U256) {
        self.require_owner();
        self.require_not_paused();
        if amount.is_zero() {
            self.env().revert(ApiaryError::ZeroAmount);
        }
        let staking_adapter = self.staking_adapter_address();

        ReserveTreasuryContractRef::new(self.env(), self.treasury_address()).pull_ibgt_for_staking(amount);
        Cep18TokenContractRef::new(self.env(), self.ibgt_address()).approve(staking_adapter, amount);
        StakingAdapterContractRef::new(self.env(), staking_adapter).stake(amount);

        let staked = self.get_staked_principal();
        self.staked_principal.set(staked + amount);
    }

    /// Unstake iBGT from the adapter and return it to the treasury as principal
    #[odra(non_reentrant)]
    pub fn unstake_ibgt(&mut self, amount: U256) {
        self.require_owner();
        self.require_not_paused();
        if amount.is_zero() {
            self.env().revert(ApiaryError::ZeroAmount);
        }
        let staked = self.get_staked_principal();
        if amount > staked {
            self.env().revert(ApiaryError::InvalidParameter);
        }
        let staking_adapter = self.staking_adapter_address();
        let treasury = self.treasury_address();

        StakingAdapterContractRef::new(self.env(), staking_adapter).unstake(amount);
        Cep18TokenContractRef::new(self.env(), self.ibgt_address()).approve(treasury, amount);
        ReserveTreasuryContractRef::new(self.env(), treasury).return_ibgt_from_staking(amount, amount);

        self.staked_principal.set(staked - amount);
    }

    // ========== View Functions ==========

    /// Whether `execute_yield` would pass its entry checks right now
    pub fn can_execute_yield(&self) -> bool {
        if self.is_paused() || self.get_staking_adapter().is_none() {
            return false;
        }
        if !self.compounds_only() && self.get_swap_adapter().is_none() {
            return false;
        }
        if !interval_elapsed(self.last_execution_time.get(), self.env().get_block_time()) {
            return false;
        }
        let available = self.pending_yield();
        !available.is_zero() && available >= self.get_min_yield_amount()
    }

    /// Rewards pending at the adapter plus carried-over yield
    pub fn pending_yield(&self) -> U256 {
        let pending = match self.get_staking_adapter() {
            Some(adapter) => StakingAdapterContractRef::new(self.env(), adapter).pending_rewards(self.env().self_address()),
            None => U256::zero(),
        };
        pending + self.get_carried_yield()
    }

    pub fn get_stats(&self) -> YieldStats {
        self.stats.get().unwrap_or_default()
    }

    pub fn get_split(&self) -> SplitConfig {
        self.split.get().unwrap_or(DEFAULT_SPLIT)
    }

    pub fn get_strategy(&self) -> Strategy {
        self.strategy.get().unwrap_or(Strategy::Phase1)
    }

    pub fn get_phase2_config(&self) -> Phase2Config {
        self.phase2_config.get().unwrap_or_default()
    }

    pub fn get_slippage_tolerance(&self) -> u32 {
        self.slippage_bps.get().unwrap_or(DEFAULT_SLIPPAGE_BPS)
    }

    pub fn get_min_yield_amount(&self) -> U256 {
        self.min_yield_amount.get().unwrap_or(U256::zero())
    }

    pub fn get_max_yield_per_harvest(&self) -> U256 {
        self.max_yield_per_harvest.get().unwrap_or(U256::zero())
    }

    pub fn get_carried_yield(&self) -> U256 {
        self.carried_yield.get().unwrap_or(U256::zero())
    }

    pub fn get_last_execution_time(&self) -> u64 {
        self.last_execution_time.get().unwrap_or(0)
    }

    pub fn get_staked_principal(&self) -> U256 {
        self.staked_principal.get().unwrap_or(U256::zero())
    }

    pub fn get_staking_adapter(&self) -> Option<Address> {
        self.staking_adapter.get().flatten()
    }

    pub fn get_swap_adapter(&self) -> Option<Address> {
        self.swap_adapter.get().flatten()
    }

    pub fn get_lp_token(&self) -> Option<Address> {
        self.lp_token.get().flatten()
    }

    pub fn get_staking_contract(&self) -> Option<Address> {
        self.staking_contract.get().flatten()
    }

    pub fn is_emergency_mode(&self) -> bool {
        self.emergency_mode.get().unwrap_or(false)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get().unwrap_or(false)
    }

    pub fn get_owner(&self) -> Option<Address> {
        self.owner.get()
    }

    // ========== Admin Functions ==========

    /// Set the Phase1 split; the five shares must sum to 10000
    pub fn set_split_percentages(
        &mut self,
        to_honey: u32,
        to_apiary_lp: u32,
        to_burn: u32,
        to_stakers: u32,
        to_compound: u32,
    ) {
        self.require_owner();
        let split = SplitConfig {
            to_honey,
            to_apiary_lp,
            to_burn,
            to_stakers,
            to_compound,
        };
        if split.total() != BPS_SCALE as u64 {
            self.env().revert(ApiaryError::InvalidSplit);
        }
        self.split.set(split);
        self.env().emit_event(SplitUpdated {
            to_honey,
            to_apiary_lp,
            to_burn,
            to_stakers,
            to_compound,
        });
    }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.require_owner();
        self.strategy.set(strategy);
        self.env().emit_event(StrategyUpdated { strategy });
    }

    pub fn set_slippage_tolerance(&mut self, slippage_bps: u32) {
        self.require_owner();
        if slippage_bps > MAX_SLIPPAGE_BPS {
            self.env().revert(ApiaryError::SlippageTooHigh);
        }
        self.slippage_bps.set(slippage_bps);
    }

    /// Threshold multiplier must be at or above parity; shares are bps of the harvest
    pub fn set_phase2_parameters(&mut self, mc_threshold_multiplier_bps: u32, compound_bps: u32, stakers_bps: u32) {
        self.require_owner();
        if mc_threshold_multiplier_bps < BPS_SCALE || compound_bps > BPS_SCALE || stakers_bps > BPS_SCALE {
            self.env().revert(ApiaryError::InvalidConfig);
        }
        self.phase2_config.set(Phase2Config {
            mc_threshold_multiplier_bps,
            compound_bps,
            stakers_bps,
        });
    }

    /// Set harvest bounds; a zero cap disables it
    pub fn set_yield_limits(&mut self, min_yield_amount: U256, max_yield_per_harvest: U256) {
        self.require_owner();
        if !max_yield_per_harvest.is_zero() && min_yield_amount > max_yield_per_harvest {
            self.env().revert(ApiaryError::InvalidConfig);
        }
        self.min_yield_amount.set(min_yield_amount);
        self.max_yield_per_harvest.set(max_yield_per_harvest);
    }

    pub fn set_emergency_mode(&mut self, enabled: bool) {
        self.require_owner();
        self.emergency_mode.set(enabled);
        self.env().emit_event(EmergencyModeSet { enabled });
    }

    pub fn set_adapters(&mut self, staking_adapter: Address, swap_adapter: Address, lp_token: Address) {
        self.require_owner();
        self.staking_adapter.set(Some(staking_adapter));
        self.swap_adapter.set(Some(swap_adapter));
        self.lp_token.set(Some(lp_token));
    }

    /// Point at a new staking venue without touching the swap venue
    pub fn set_staking_adapter(&mut self, staking_adapter: Address) {
        self.require_owner();
        self.staking_adapter.set(Some(staking_adapter));
    }

    pub fn set_staking_contract(&mut self, staking_contract: Address) {
        self.require_owner();
        self.staking_contract.set(Some(staking_contract));
    }

    /// Send stray tokens to the treasury. Carried-over iBGT stays put.
    pub fn recover_token(&mut self, token: Address, amount: U256) {
        self.require_owner();
        let self_address = self.env().self_address();
        let balance = Cep18TokenContractRef::new(self.env(), token).balance_of(self_address);
        let reserved = if Some(token) == self.ibgt.get() {
            self.get_carried_yield()
        } else {
            U256::zero()
        };
        if amount.is_zero() || amount + reserved > balance {
            self.env().revert(ApiaryError::InsufficientTokenBalance);
        }
        self.send_token(token, self.treasury_address(), amount);
    }

    pub fn pause(&mut self) {
        self.require_owner();
        self.paused.set(true);
    }

    pub fn unpause(&mut self) {
        self.require_owner();
        self.paused.set(false);
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) {
        self.require_owner();
        self.owner.set(new_owner);
    }

    // ========== Internal Functions ==========

    /// Claim from the adapter; the iBGT actually received must equal what was pending
    fn claim_rewards(&mut self, staking_adapter: Address, pending: U256) {
        let ibgt = Cep18TokenContractRef::new(self.env(), self.ibgt_address());
        let self_address = self.env().self_address();
        let balance_before = ibgt.balance_of(self_address);
        StakingAdapterContractRef::new(self.env(), staking_adapter).claim_rewards();
        let balance_after = ibgt.balance_of(self_address);
        if balance_after < balance_before || balance_after - balance_before != pending {
            self.env().revert(ApiaryError::ClaimMismatch);
        }
    }

    fn execute_plan(&mut self, plan: &DistributionPlan, total_yield: U256) -> ExecutionResult {
        let ibgt = self.ibgt_address();
        let honey = self.honey_address();
        let apiary = self.apiary_address();
        let mut result = ExecutionResult {
            total_yield,
            ..Default::default()
        };

        let mut honey_out = U256::zero();
        if !plan.honey.is_zero() {
            honey_out = self.swap_exact(ibgt, honey, plan.honey);
            result.honey_swapped = honey_out;
        }

        if !plan.lp.is_zero() {
            let mut lp_ibgt = plan.lp;
            let mut honey_for_lp = honey_out;
            // Without a HONEY leg the LP leg sources its own HONEY from half its share
            if honey_for_lp.is_zero() {
                let half = plan.lp / 2;
                honey_for_lp = self.swap_exact(ibgt, honey, half);
                result.honey_swapped += honey_for_lp;
                lp_ibgt = plan.lp - half;
            }
            let apiary_for_lp = self.swap_exact(ibgt, apiary, lp_ibgt);
            result.lp_created = self.add_and_stake_liquidity(honey, apiary, honey_for_lp, apiary_for_lp);
        }

        if !plan.burn.is_zero() {
            let apiary_out = self.swap_exact(ibgt, apiary, plan.burn);
            ProtocolTokenContractRef::new(self.env(), apiary).burn(apiary_out);
            result.apiary_burned = apiary_out;
        }

        if !plan.stakers.is_zero() {
            let staking_contract = self
                .get_staking_contract()
                .unwrap_or_else(|| self.env().revert(ApiaryError::AdapterNotSet));
            let apiary_out = self.swap_exact(ibgt, apiary, plan.stakers);
            self.send_token(apiary, staking_contract, apiary_out);
        }

        if !plan.compound.is_zero() {
            let treasury = self.treasury_address();
            Cep18TokenContractRef::new(self.env(), ibgt).approve(treasury, plan.compound);
            ReserveTreasuryContractRef::new(self.env(), treasury).return_ibgt_from_staking(plan.compound, U256::zero());
            result.compounded = plan.compound;
        }

        self.forward_balance_to_treasury(honey);
        self.forward_balance_to_treasury(apiary);

        result
    }

    /// Swap through the adapter with the configured slippage bound
    fn swap_exact(&mut self, token_in: Address, token_out: Address, amount_in: U256) -> U256 {
        let swap_adapter = self.swap_adapter_address();
        let mut adapter = SwapAdapterContractRef::new(self.env(), swap_adapter);

        let quote = adapter.get_amount_out(token_in, token_out, amount_in);
        if quote.is_zero() {
            self.env().revert(ApiaryError::SwapFailed);
        }
        let min_out = min_amount_out(quote, self.get_slippage_tolerance());

        Cep18TokenContractRef::new(self.env(), token_in).approve(swap_adapter, amount_in);
        let amount_out = adapter.swap(token_in, token_out, amount_in, min_out);
        if amount_out.is_zero() || amount_out < min_out {
            self.env().revert(ApiaryError::SwapFailed);
        }
        amount_out
    }

    /// Pair HONEY with APIARY and stake the resulting LP tokens; returns the liquidity minted
    fn add_and_stake_liquidity(&mut self, honey: Address, apiary: Address, honey_amount: U256, apiary_amount: U256) -> U256 {
        let swap_adapter = self.swap_adapter_address();
        let lp_token = self
            .get_lp_token()
            .unwrap_or_else(|| self.env().revert(ApiaryError::AdapterNotSet));
        let mut adapter = SwapAdapterContractRef::new(self.env(), swap_adapter);

        Cep18TokenContractRef::new(self.env(), honey).approve(swap_adapter, honey_amount);
        Cep18TokenContractRef::new(self.env(), apiary).approve(swap_adapter, apiary_amount);
        // Both inputs were slippage-checked when swapped; any ratio mismatch is forwarded
        let added = adapter.add_liquidity(honey, apiary, honey_amount, apiary_amount, U256::zero(), U256::zero());
        if added.liquidity.is_zero() {
            self.env().revert(ApiaryError::LiquidityFailed);
        }

        Cep18TokenContractRef::new(self.env(), lp_token).approve(swap_adapter, added.liquidity);
        let staked = adapter.stake_lp(lp_token, added.liquidity);
        if staked.is_zero() {
            self.env().revert(ApiaryError::LpStakeFailed);
        }
        added.liquidity
    }

    fn forward_balance_to_treasury(&self, token: Address) {
        let self_address = self.env().self_address();
        let balance = Cep18TokenContractRef::new(self.env(), token).balance_of(self_address);
        if !balance.is_zero() {
            self.send_token(token, self.treasury_address(), balance);
        }
    }

    fn send_token(&self, token: Address, recipient: Address, amount: U256) {
        if !Cep18TokenContractRef::new(self.env(), token).transfer(recipient, amount) {
            self.env().revert(ApiaryError::TokenTransferFailed);
        }
    }

    fn staking_adapter_address(&self) -> Address {
        self.get_staking_adapter()
            .unwrap_or_else(|| self.env().revert(ApiaryError::AdapterNotSet))
    }

    /// Emergency mode and Phase3 route every harvest back to the treasury
    fn compounds_only(&self) -> bool {
        self.is_emergency_mode() || self.get_strategy() == Strategy::Phase3
    }

    fn swap_adapter_address(&self) -> Address {
        self.get_swap_adapter()
            .unwrap_or_else(|| self.env().revert(ApiaryError::AdapterNotSet))
    }

    fn apiary_address(&self) -> Address {
        self.apiary
            .get()
            .unwrap_or_else(|| self.env().revert(ApiaryError::NotInitialized))
    }

    fn ibgt_address(&self) -> Address {
        self.ibgt
            .get()
            .unwrap_or_else(|| self.env().revert(ApiaryError::NotInitialized))
    }

    fn honey_address(&self) -> Address {
        self.honey
            .get()
            .unwrap_or_else(|| self.env().revert(ApiaryError::NotInitialized))
    }

    fn treasury_address(&self) -> Address {
        self.treasury
            .get()
            .unwrap_or_else(|| self.env().revert(ApiaryError::NotInitialized))
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(ApiaryError::Unauthorized);
        }
    }

    fn require_not_paused(&self) {
        if self.is_paused() {
            self.env().revert(ApiaryError::ContractPaused);
        }
    }
}

fn interval_elapsed(last_execution_time: Option<u64>, now: u64) -> bool {
    match last_execution_time {
        Some(last) => now >= last.saturating_add(MIN_EXECUTION_INTERVAL),
        None => true,
    }
}

/// Split `available` into this harvest and the carry-over; a zero cap means no cap
fn cap_harvest(available: U256, max_per_harvest: U256) -> (U256, U256) {
    if max_per_harvest.is_zero() || available <= max_per_harvest {
        (available, U256::zero())
    } else {
        (max_per_harvest, available - max_per_harvest)
    }
}

/// Fixed split; the LP leg absorbs rounding dust
pub fn phase1_plan(total: U256, split: &SplitConfig) -> DistributionPlan {
    let honey = bps_of(total, split.to_honey);
    let burn = bps_of(total, split.to_burn);
    let stakers = bps_of(total, split.to_stakers);
    let compound = bps_of(total, split.to_compound);
    DistributionPlan {
        honey,
        lp: total - honey - burn - stakers - compound,
        burn,
        stakers,
        compound,
    }
}

/// Derive the distribution for a harvest of `total` iBGT
pub fn plan_distribution(
    total: U256,
    strategy: Strategy,
    emergency: bool,
    split: &SplitConfig,
    phase2: &Phase2Config,
    valuation: Option<&TreasuryValuation>,
) -> DistributionPlan {
    if emergency {
        return compound_all(total);
    }
    match strategy {
        Strategy::Phase1 => phase1_plan(total, split),
        Strategy::Phase2 => match valuation {
            Some(valuation) => phase2_plan(total, split, phase2, valuation),
            None => phase1_plan(total, split),
        },
        Strategy::Phase3 => compound_all(total),
    }
}

fn phase2_plan(
    total: U256,
    split: &SplitConfig,
    phase2: &Phase2Config,
    valuation: &TreasuryValuation,
) -> DistributionPlan {
    let threshold = bps_of(valuation.treasury_value, phase2.mc_threshold_multiplier_bps);
    if valuation.market_cap > threshold {
        let compound = bps_of(total, phase2.compound_bps);
        let mut plan = phase1_plan(total - compound, split);
        plan.compound += compound;
        plan
    } else if valuation.market_cap < valuation.treasury_value {
        DistributionPlan {
            burn: total,
            ..Default::default()
        }
    } else {
        let stakers = bps_of(total, phase2.stakers_bps);
        let mut plan = phase1_plan(total - stakers, split);
        plan.stakers += stakers;
        plan
    }
}

fn compound_all(total: U256) -> DistributionPlan {
    DistributionPlan {
        compound: total,
        ..Default::default()
    }
}
