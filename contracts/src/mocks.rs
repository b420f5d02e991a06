//! Deterministic test doubles for external venues (feature `mocks`).
//!
//! - `MockStakingAdapter`: holds staked iBGT and pays rewards set by the test
//! - `MockSwapAdapter`: swaps at fixed rates from its own inventory, pairs liquidity
//!   at a fixed ratio and takes LP tokens for staking
//! - `MockLiquidityPair`: minimal CEP-18 liquidity token exposing fixed reserves

use odra::prelude::*;
use odra::ContractRef;
use odra::casper_types::U256;
use crate::errors::ApiaryError;
use crate::interfaces::Cep18TokenContractRef;
use crate::math::{bps_of, BPS_SCALE, PRECISION};
use crate::types::LiquidityResult;

/// Staking venue double
#[odra::module]
pub struct MockStakingAdapter {
    /// Staked and reward token
    ibgt: Var<Address>,
    /// Principal staked per account
    staked: Mapping<Address, U256>,
    /// Rewards claimable per account
    pending: Mapping<Address, U256>,
    /// Withheld from every claim to simulate a short payout
    claim_shortfall: Var<U256>,
}

#[odra::module]
impl MockStakingAdapter {
    pub fn init(&mut self, ibgt: Address) {
        self.ibgt.set(ibgt);
        self.claim_shortfall.set(U256::zero());
    }

    pub fn stake(&mut self, amount: U256) {
        let caller = self.env().caller();
        let self_address = self.env().self_address();
        if !self.token().transfer_from(caller, self_address, amount) {
            self.env().revert(ApiaryError::TokenTransferFailed);
        }
        let staked = self.staked_of(caller);
        self.staked.set(&caller, staked + amount);
    }

    pub fn unstake(&mut self, amount: U256) {
        let caller = self.env().caller();
        let staked = self.staked_of(caller);
        if amount > staked {
            self.env().revert(ApiaryError::InsufficientTokenBalance);
        }
        self.staked.set(&caller, staked - amount);
        self.token().transfer(caller, amount);
    }

    pub fn claim_rewards(&mut self) -> U256 {
        let caller = self.env().caller();
        let pending = self.pending_rewards(caller);
        let payout = pending.saturating_sub(self.claim_shortfall.get().unwrap_or(U256::zero()));
        self.pending.set(&caller, U256::zero());
        if !payout.is_zero() {
            self.token().transfer(caller, payout);
        }
        payout
    }

    pub fn pending_rewards(&self, account: Address) -> U256 {
        self.pending.get(&account).unwrap_or(U256::zero())
    }

    pub fn staked_of(&self, account: Address) -> U256 {
        self.staked.get(&account).unwrap_or(U256::zero())
    }

    pub fn set_pending_rewards(&mut self, account: Address, amount: U256) {
        self.pending.set(&account, amount);
    }

    pub fn set_claim_shortfall(&mut self, amount: U256) {
        self.claim_shortfall.set(amount);
    }

    fn token(&self) -> Cep18TokenContractRef {
        let ibgt = self
            .ibgt
            .get()
            .unwrap_or_else(|| self.env().revert(ApiaryError::NotInitialized));
        Cep18TokenContractRef::new(self.env(), ibgt)
    }
}

/// Swap and liquidity venue double
#[odra::module]
pub struct MockSwapAdapter {
    /// Output per input unit (1e18) per (token_in, token_out)
    rates: Mapping<(Address, Address), U256>,
    /// Output shortfall against the quote, in bps
    execution_haircut_bps: Var<u32>,
    /// token_b paired per token_a (1e18)
    liquidity_ratio: Var<U256>,
    /// LP token handed out from inventory
    lp_token: Var<Address>,
    /// Return zero liquidity from `add_liquidity`
    fail_liquidity: Var<bool>,
    /// LP tokens staked per account
    staked_lp: Mapping<Address, U256>,
}

#[odra::module]
impl MockSwapAdapter {
    pub fn init(&mut self, lp_token: Address) {
        self.lp_token.set(lp_token);
        self.execution_haircut_bps.set(0);
        self.liquidity_ratio.set(U256::from(PRECISION));
        self.fail_liquidity.set(false);
    }

    pub fn get_amount_out(&self, token_in: Address, token_out: Address, amount_in: U256) -> U256 {
        let rate = self.rates.get(&(token_in, token_out)).unwrap_or(U256::zero());
        amount_in * rate / U256::from(PRECISION)
    }

    pub fn swap(&mut self, token_in: Address, token_out: Address, amount_in: U256, min_amount_out: U256) -> U256 {
        let quote = self.get_amount_out(token_in, token_out, amount_in);
        let haircut = self.execution_haircut_bps.get().unwrap_or(0);
        let amount_out = bps_of(quote, BPS_SCALE.saturating_sub(haircut));
        if amount_out < min_amount_out {
            self.env().revert(ApiaryError::SwapFailed);
        }

        let caller = self.env().caller();
        let self_address = self.env().self_address();
        if !Cep18TokenContractRef::new(self.env(), token_in).transfer_from(caller, self_address, amount_in) {
            self.env().revert(ApiaryError::TokenTransferFailed);
        }
        if !amount_out.is_zero() {
            Cep18TokenContractRef::new(self.env(), token_out).transfer(caller, amount_out);
        }
        amount_out
    }

    pub fn add_liquidity(
        &mut self,
        token_a: Address,
        token_b: Address,
        amount_a: U256,
        amount_b: U256,
        min_a: U256,
        min_b: U256,
    ) -> LiquidityResult {
        if self.fail_liquidity.get().unwrap_or(false) {
            return LiquidityResult::default();
        }

        let ratio = self.liquidity_ratio.get().unwrap_or(U256::from(PRECISION));
        let used_a = amount_a.min(amount_b * U256::from(PRECISION) / ratio);
        let used_b = used_a * ratio / U256::from(PRECISION);
        if used_a < min_a || used_b < min_b {
            self.env().revert(ApiaryError::LiquidityFailed);
        }

        let caller = self.env().caller();
        let self_address = self.env().self_address();
        Cep18TokenContractRef::new(self.env(), token_a).transfer_from(caller, self_address, used_a);
        Cep18TokenContractRef::new(self.env(), token_b).transfer_from(caller, self_address, used_b);

        let liquidity = (used_a * used_b).integer_sqrt();
        if !liquidity.is_zero() {
            Cep18TokenContractRef::new(self.env(), self.lp_address()).transfer(caller, liquidity);
        }

        LiquidityResult {
            used_a,
            used_b,
            liquidity,
        }
    }

    pub fn stake_lp(&mut self, lp_token: Address, amount: U256) -> U256 {
        let caller = self.env().caller();
        let self_address = self.env().self_address();
        if !Cep18TokenContractRef::new(self.env(), lp_token).transfer_from(caller, self_address, amount) {
            self.env().revert(ApiaryError::TokenTransferFailed);
        }
        let staked = self.staked_lp_of(caller);
        self.staked_lp.set(&caller, staked + amount);
        amount
    }

    pub fn staked_lp_of(&self, account: Address) -> U256 {
        self.staked_lp.get(&account).unwrap_or(U256::zero())
    }

    pub fn set_rate(&mut self, token_in: Address, token_out: Address, rate: U256) {
        self.rates.set(&(token_in, token_out), rate);
    }

    pub fn set_execution_haircut(&mut self, haircut_bps: u32) {
        self.execution_haircut_bps.set(haircut_bps);
    }

    pub fn set_liquidity_ratio(&mut self, ratio: U256) {
        self.liquidity_ratio.set(ratio);
    }

    pub fn set_fail_liquidity(&mut self, fail: bool) {
        self.fail_liquidity.set(fail);
    }

    fn lp_address(&self) -> Address {
        self.lp_token
            .get()
            .unwrap_or_else(|| self.env().revert(ApiaryError::NotInitialized))
    }
}

/// Liquidity token double with settable reserves
#[odra::module]
pub struct MockLiquidityPair {
    reserve0: Var<U256>,
    reserve1: Var<U256>,
    total_supply: Var<U256>,
    balances: Mapping<Address, U256>,
    allowances: Mapping<(Address, Address), U256>,
}

#[odra::module]
impl MockLiquidityPair {
    pub fn init(&mut self, reserve0: U256, reserve1: U256) {
        self.reserve0.set(reserve0);
        self.reserve1.set(reserve1);
        self.total_supply.set(U256::zero());
    }

    pub fn get_reserves(&self) -> (U256, U256) {
        (
            self.reserve0.get().unwrap_or(U256::zero()),
            self.reserve1.get().unwrap_or(U256::zero()),
        )
    }

    pub fn set_reserves(&mut self, reserve0: U256, reserve1: U256) {
        self.reserve0.set(reserve0);
        self.reserve1.set(reserve1);
    }

    /// Unrestricted mint for fixtures
    pub fn mint(&mut self, to: Address, amount: U256) {
        let balance = self.balance_of(to);
        self.balances.set(&to, balance + amount);
        let supply = self.total_supply();
        self.total_supply.set(supply + amount);
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get().unwrap_or(U256::zero())
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or(U256::zero())
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or(U256::zero())
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.allowances.set(&(owner, spender), amount);
        true
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.move_balance(sender, recipient, amount);
        true
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        let allowance = self.allowance(owner, spender);
        if allowance < amount {
            self.env().revert(ApiaryError::InsufficientAllowance);
        }
        self.allowances.set(&(owner, spender), allowance - amount);
        self.move_balance(owner, recipient, amount);
        true
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(ApiaryError::InsufficientTokenBalance);
        }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);
    }
}
