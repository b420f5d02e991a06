//! Treasury Contract
//!
//! Custodies protocol reserves and gates APIARY minting.
//!
//! - Reserve and liquidity token registries with per-class depositor lists
//! - Mint gate: every deposit mints the requested `mint_value` of APIARY to the
//!   depositor, bounded by optional per-deposit and value-ratio caps
//! - iBGT sub-ledger tracking what is held, what is out with the yield manager
//!   and what has come back
//! - Market cap and backing valuation used by the yield strategy

use odra::prelude::*;
use odra::ContractRef;
use odra::casper_types::U256;
use crate::errors::ApiaryError;
use crate::interfaces::{
    Cep18TokenContractRef, LiquidityValuatorContractRef, PriceOracleContractRef,
    ProtocolTokenContractRef,
};
use crate::math::{bps_of, PRECISION};
use crate::types::{IbgtAccounting, TreasuryValuation};

/// Emitted on every accepted deposit
#[odra::event]
pub struct ReservesDeposited {
    pub token: Address,
    pub depositor: Address,
    pub amount: U256,
    pub value: U256,
    pub minted: U256,
}

#[odra::event]
pub struct ReservesBorrowed {
    pub token: Address,
    pub manager: Address,
    pub amount: U256,
}

#[odra::event]
pub struct ReservesRepaid {
    pub token: Address,
    pub manager: Address,
    pub amount: U256,
}

#[odra::event]
pub struct IbgtPulled {
    pub amount: U256,
    pub total_staked: U256,
}

#[odra::event]
pub struct IbgtReturned {
    pub amount: U256,
    pub principal: U256,
    pub rewards: U256,
}

/// Treasury Contract
#[odra::module(events = [ReservesDeposited, ReservesBorrowed, ReservesRepaid, IbgtPulled, IbgtReturned])]
pub struct Treasury {
    /// Contract owner
    owner: Var<Address>,
    /// APIARY token
    apiary: Var<Address>,
    /// Primary reserve asset
    ibgt: Var<Address>,
    /// APIARY TWAP oracle used for market cap
    oracle: Var<Option<Address>>,
    /// Reserve token membership
    reserve_tokens: Mapping<Address, bool>,
    /// Liquidity token membership
    liquidity_tokens: Mapping<Address, bool>,
    /// Registered reserve tokens by index
    reserve_token_list: Mapping<u32, Address>,
    reserve_token_count: Var<u32>,
    /// Registered liquidity tokens by index
    liquidity_token_list: Mapping<u32, Address>,
    liquidity_token_count: Var<u32>,
    /// Valuation contract per liquidity token
    bonding_calculators: Mapping<Address, Address>,
    /// Accounts allowed to deposit reserve tokens
    reserve_depositors: Mapping<Address, bool>,
    /// Accounts allowed to deposit liquidity tokens
    liquidity_depositors: Mapping<Address, bool>,
    /// Accounts allowed to borrow and repay reserves
    reserves_managers: Mapping<Address, bool>,
    /// Yield manager allowed to pull and return iBGT
    yield_manager: Var<Option<Address>>,
    /// Reserves held per token
    total_reserves: Mapping<Address, U256>,
    /// Reserves lent out per token
    total_borrowed: Mapping<Address, U256>,
    /// iBGT sub-ledger
    ibgt_accounting: Var<IbgtAccounting>,
    /// Max APIARY minted by a single deposit (0 = unlimited)
    max_mint_per_deposit: Var<U256>,
    /// Max APIARY minted per unit of deposit value in bps (0 = unlimited)
    max_mint_ratio_bps: Var<u32>,
    /// Whether mutating entry points are halted
    paused: Var<bool>,
}

#[odra::module]
impl Treasury {
    /// Initialize the treasury. iBGT is registered as a reserve token.
    pub fn init(&mut self, apiary: Address, ibgt: Address) {
        self.owner.set(self.env().caller());
        self.apiary.set(apiary);
        self.ibgt.set(ibgt);
        self.oracle.set(None);
        self.yield_manager.set(None);
        self.ibgt_accounting.set(IbgtAccounting::default());
        self.max_mint_per_deposit.set(U256::zero());
        self.max_mint_ratio_bps.set(0);
        self.paused.set(false);
        self.register_reserve_token(ibgt);
    }

    // ========== Deposits ==========

    /// Deposit `amount` of `token` and mint `mint_value` APIARY to the caller.
    ///
    /// Reserve membership is checked first; a token registered in both classes
    /// is treated as a reserve token.
    #[odra(non_reentrant)]
    pub fn deposit(&mut self, amount: U256, token: Address, mint_value: U256) -> U256 {
        self.require_not_paused();
        if amount.is_zero() {
            self.env().revert(ApiaryError::ZeroAmount);
        }

        let caller = self.env().caller();
        let deposit_value = if self.is_reserve_token(token) {
            if !self.is_reserve_depositor(caller) {
                self.env().revert(ApiaryError::UnauthorizedDepositor);
            }
            amount
        } else if self.is_liquidity_token(token) {
            if !self.is_liquidity_depositor(caller) {
                self.env().revert(ApiaryError::UnauthorizedDepositor);
            }
            self.liquidity_value(token, amount)
        } else {
            self.env().revert(ApiaryError::InvalidToken)
        };

        let max_mint = self.get_max_mint_per_deposit();
        if !max_mint.is_zero() && mint_value > max_mint {
            self.env().revert(ApiaryError::MintCapExceeded);
        }
        let ratio = self.get_max_mint_ratio_bps();
        if ratio > 0 && mint_value > bps_of(deposit_value, ratio) {
            self.env().revert(ApiaryError::MintRatioExceeded);
        }

        let self_address = self.env().self_address();
        if !Cep18TokenContractRef::new(self.env(), token).transfer_from(caller, self_address, amount) {
            self.env().revert(ApiaryError::TokenTransferFailed);
        }

        let reserves = self.get_total_reserves(token);
        self.total_reserves.set(&token, reserves + amount);

        if Some(token) == self.ibgt.get() {
            let mut accounting = self.get_ibgt_accounting();
            accounting.total_deposited += amount;
            accounting.available_balance += amount;
            self.ibgt_accounting.set(accounting);
        }

        if !mint_value.is_zero() {
            ProtocolTokenContractRef::new(self.env(), self.apiary_address()).mint(caller, mint_value);
        }

        self.env().emit_event(ReservesDeposited {
            token,
            depositor: caller,
            amount,
            value: deposit_value,
            minted: mint_value,
        });

        mint_value
    }

    // ========== Reserves Management ==========

    /// Lend reserves to a reserves manager
    pub fn borrow_reserves(&mut self, token: Address, amount: U256) {
        self.require_not_paused();
        let caller = self.env().caller();
        self.require_reserves_manager(caller);
        if amount.is_zero() {
            self.env().revert(ApiaryError::ZeroAmount);
        }
        if !self.is_reserve_token(token) && !self.is_liquidity_token(token) {
            self.env().revert(ApiaryError::InvalidToken);
        }

        let reserves = self.get_total_reserves(token);
        if amount > reserves {
            self.env().revert(ApiaryError::InsufficientReserves);
        }

        if Some(token) == self.ibgt.get() {
            let mut accounting = self.get_ibgt_accounting();
            if amount > accounting.available_balance {
                self.env().revert(ApiaryError::InsufficientAvailableBalance);
            }
            accounting.available_balance -= amount;
            self.ibgt_accounting.set(accounting);
        }

        self.total_reserves.set(&token, reserves - amount);
        let borrowed = self.get_total_borrowed(token);
        self.total_borrowed.set(&token, borrowed + amount);

        self.send_token(token, caller, amount);

        self.env().emit_event(ReservesBorrowed {
            token,
            manager: caller,
            amount,
        });
    }

    /// Return previously borrowed reserves
    pub fn repay_reserves(&mut self, token: Address, amount: U256) {
        self.require_not_paused();
        let caller = self.env().caller();
        self.require_reserves_manager(caller);
        if amount.is_zero() {
            self.env().revert(ApiaryError::ZeroAmount);
        }

        let borrowed = self.get_total_borrowed(token);
        if amount > borrowed {
            self.env().revert(ApiaryError::InvalidParameter);
        }

        let self_address = self.env().self_address();
        if !Cep18TokenContractRef::new(self.env(), token).transfer_from(caller, self_address, amount) {
            self.env().revert(ApiaryError::TokenTransferFailed);
        }

        self.total_borrowed.set(&token, borrowed - amount);
        let reserves = self.get_total_reserves(token);
        self.total_reserves.set(&token, reserves + amount);

        if Some(token) == self.ibgt.get() {
            let mut accounting = self.get_ibgt_accounting();
            accounting.available_balance += amount;
            self.ibgt_accounting.set(accounting);
        }

        self.env().emit_event(ReservesRepaid {
            token,
            manager: caller,
            amount,
        });
    }

    // ========== iBGT Staking Lifecycle ==========

    /// Move available iBGT to the yield manager for staking
    pub fn pull_ibgt_for_staking(&mut self, amount: U256) {
        self.require_not_paused();
        let caller = self.env().caller();
        self.require_yield_manager(caller);
        if amount.is_zero() {
            self.env().revert(ApiaryError::ZeroAmount);
        }

        let mut accounting = self.get_ibgt_accounting();
        if amount > accounting.available_balance {
            self.env().revert(ApiaryError::InsufficientAvailableBalance);
        }
        accounting.available_balance -= amount;
        accounting.total_staked += amount;
        let total_staked = accounting.total_staked;
        self.ibgt_accounting.set(accounting);

        self.send_token(self.ibgt_address(), caller, amount);

        self.env().emit_event(IbgtPulled {
            amount,
            total_staked,
        });
    }

    /// Take back `amount` iBGT, of which `principal` was previously pulled.
    ///
    /// Anything above the principal is yield and is added to reserves.
    /// A zero-principal return compounds harvested yield.
    pub fn return_ibgt_from_staking(&mut self, amount: U256, principal: U256) {
        self.require_not_paused();
        let caller = self.env().caller();
        self.require_yield_manager(caller);
        if amount.is_zero() {
            self.env().revert(ApiaryError::ZeroAmount);
        }

        let mut accounting = self.get_ibgt_accounting();
        if principal > accounting.total_staked {
            self.env().revert(ApiaryError::PrincipalExceedsStaked);
        }
        if amount < principal {
            self.env().revert(ApiaryError::ReturnBelowPrincipal);
        }

        let ibgt = self.ibgt_address();
        let self_address = self.env().self_address();
        if !Cep18TokenContractRef::new(self.env(), ibgt).transfer_from(caller, self_address, amount) {
            self.env().revert(ApiaryError::TokenTransferFailed);
        }

        let rewards = amount - principal;
        accounting.total_staked -= principal;
        accounting.available_balance += amount;
        accounting.total_returned += amount;
        self.ibgt_accounting.set(accounting);

        let reserves = self.get_total_reserves(ibgt);
        self.total_reserves.set(&ibgt, reserves + rewards);

        self.env().emit_event(IbgtReturned {
            amount,
            principal,
            rewards,
        });
    }

    /// Reconcile the available iBGT balance with what the treasury actually holds
    pub fn sync_ibgt_balance(&mut self) {
        self.require_owner();
        let self_address = self.env().self_address();
        let held = Cep18TokenContractRef::new(self.env(), self.ibgt_address()).balance_of(self_address);
        let mut accounting = self.get_ibgt_accounting();
        accounting.available_balance = held;
        self.ibgt_accounting.set(accounting);
    }

    // ========== Valuation ==========

    /// Market cap of APIARY and the quote value of everything backing it
    pub fn get_market_cap_and_treasury_value(&self) -> TreasuryValuation {
        let oracle = self
            .oracle
            .get()
            .flatten()
            .unwrap_or_else(|| self.env().revert(ApiaryError::NotInitialized));
        let supply = ProtocolTokenContractRef::new(self.env(), self.apiary_address()).total_supply();
        let price = PriceOracleContractRef::new(self.env(), oracle).consult(U256::from(PRECISION));

        TreasuryValuation {
            market_cap: supply * price / U256::from(PRECISION),
            treasury_value: self.treasury_value(),
        }
    }

    /// Reserve holdings at 1:1, plus staked iBGT principal, plus liquidity holdings
    /// valued by their bonding calculators
    pub fn treasury_value(&self) -> U256 {
        let self_address = self.env().self_address();
        let mut value = self.get_ibgt_accounting().total_staked;

        for i in 0..self.reserve_token_count.get().unwrap_or(0) {
            if let Some(token) = self.reserve_token_list.get(&i) {
                if self.is_reserve_token(token) {
                    value += Cep18TokenContractRef::new(self.env(), token).balance_of(self_address);
                }
            }
        }

        for i in 0..self.liquidity_token_count.get().unwrap_or(0) {
            if let Some(token) = self.liquidity_token_list.get(&i) {
                // Tokens already counted as reserves are skipped
                if self.is_liquidity_token(token) && !self.is_reserve_token(token) {
                    let held = Cep18TokenContractRef::new(self.env(), token).balance_of(self_address);
                    if !held.is_zero() {
                        value += self.liquidity_value(token, held);
                    }
                }
            }
        }

        value
    }

    /// Quote value of `amount` of a registered token
    pub fn value_of(&self, token: Address, amount: U256) -> U256 {
        if self.is_reserve_token(token) {
            amount
        } else if self.is_liquidity_token(token) {
            self.liquidity_value(token, amount)
        } else {
            self.env().revert(ApiaryError::InvalidToken)
        }
    }

    // ========== View Functions ==========

    pub fn get_total_reserves(&self, token: Address) -> U256 {
        self.total_reserves.get(&token).unwrap_or(U256::zero())
    }

    pub fn get_total_borrowed(&self, token: Address) -> U256 {
        self.total_borrowed.get(&token).unwrap_or(U256::zero())
    }

    pub fn get_ibgt_accounting(&self) -> IbgtAccounting {
        self.ibgt_accounting.get().unwrap_or_default()
    }

    pub fn is_reserve_token(&self, token: Address) -> bool {
        self.reserve_tokens.get(&token).unwrap_or(false)
    }

    pub fn is_liquidity_token(&self, token: Address) -> bool {
        self.liquidity_tokens.get(&token).unwrap_or(false)
    }

    pub fn is_reserve_depositor(&self, account: Address) -> bool {
        self.reserve_depositors.get(&account).unwrap_or(false)
    }

    pub fn is_liquidity_depositor(&self, account: Address) -> bool {
        self.liquidity_depositors.get(&account).unwrap_or(false)
    }

    pub fn is_reserves_manager(&self, account: Address) -> bool {
        self.reserves_managers.get(&account).unwrap_or(false)
    }

    pub fn get_bonding_calculator(&self, token: Address) -> Option<Address> {
        self.bonding_calculators.get(&token)
    }

    pub fn get_yield_manager(&self) -> Option<Address> {
        self.yield_manager.get().flatten()
    }

    pub fn get_oracle(&self) -> Option<Address> {
        self.oracle.get().flatten()
    }

    pub fn get_apiary(&self) -> Option<Address> {
        self.apiary.get()
    }

    pub fn get_ibgt(&self) -> Option<Address> {
        self.ibgt.get()
    }

    pub fn get_max_mint_per_deposit(&self) -> U256 {
        self.max_mint_per_deposit.get().unwrap_or(U256::zero())
    }

    pub fn get_max_mint_ratio_bps(&self) -> u32 {
        self.max_mint_ratio_bps.get().unwrap_or(0)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get().unwrap_or(false)
    }

    pub fn get_owner(&self) -> Option<Address> {
        self.owner.get()
    }

    // ========== Admin Functions ==========

    /// Register a reserve token (owner only)
    pub fn add_reserve_token(&mut self, token: Address) {
        self.require_owner();
        self.register_reserve_token(token);
    }

    pub fn remove_reserve_token(&mut self, token: Address) {
        self.require_owner();
        self.reserve_tokens.set(&token, false);
    }

    /// Register a liquidity token together with its valuation contract (owner only)
    pub fn add_liquidity_token(&mut self, token: Address, calculator: Address) {
        self.require_owner();
        if self.liquidity_tokens.get(&token).is_none() {
            let count = self.liquidity_token_count.get().unwrap_or(0);
            self.liquidity_token_list.set(&count, token);
            self.liquidity_token_count.set(count + 1);
        }
        self.liquidity_tokens.set(&token, true);
        self.bonding_calculators.set(&token, calculator);
    }

    pub fn remove_liquidity_token(&mut self, token: Address) {
        self.require_owner();
        self.liquidity_tokens.set(&token, false);
    }

    pub fn set_bonding_calculator(&mut self, token: Address, calculator: Address) {
        self.require_owner();
        self.bonding_calculators.set(&token, calculator);
    }

    pub fn set_reserve_depositor(&mut self, account: Address, allowed: bool) {
        self.require_owner();
        self.reserve_depositors.set(&account, allowed);
    }

    pub fn set_liquidity_depositor(&mut self, account: Address, allowed: bool) {
        self.require_owner();
        self.liquidity_depositors.set(&account, allowed);
    }

    pub fn set_reserves_manager(&mut self, account: Address, allowed: bool) {
        self.require_owner();
        self.reserves_managers.set(&account, allowed);
    }

    pub fn set_yield_manager(&mut self, yield_manager: Address) {
        self.require_owner();
        self.yield_manager.set(Some(yield_manager));
    }

    pub fn set_oracle(&mut self, oracle: Address) {
        self.require_owner();
        self.oracle.set(Some(oracle));
    }

    /// Set mint limits; zero disables a limit
    pub fn set_mint_limits(&mut self, max_mint_per_deposit: U256, max_mint_ratio_bps: u32) {
        self.require_owner();
        self.max_mint_per_deposit.set(max_mint_per_deposit);
        self.max_mint_ratio_bps.set(max_mint_ratio_bps);
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

    fn register_reserve_token(&mut self, token: Address) {
        if self.reserve_tokens.get(&token).is_none() {
            let count = self.reserve_token_count.get().unwrap_or(0);
            self.reserve_token_list.set(&count, token);
            self.reserve_token_count.set(count + 1);
        }
        self.reserve_tokens.set(&token, true);
    }

    fn liquidity_value(&self, token: Address, amount: U256) -> U256 {
        let calculator = self
            .bonding_calculators
            .get(&token)
            .unwrap_or_else(|| self.env().revert(ApiaryError::NotInitialized));
        LiquidityValuatorContractRef::new(self.env(), calculator).valuation(token, amount)
    }

    fn send_token(&self, token: Address, recipient: Address, amount: U256) {
        if !Cep18TokenContractRef::new(self.env(), token).transfer(recipient, amount) {
            self.env().revert(ApiaryError::TokenTransferFailed);
        }
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

    fn require_reserves_manager(&self, caller: Address) {
        if !self.is_reserves_manager(caller) {
            self.env().revert(ApiaryError::UnauthorizedReservesManager);
        }
    }

    fn require_yield_manager(&self, caller: Address) {
        if self.yield_manager.get().flatten() != Some(caller) {
            self.env().revert(ApiaryError::UnauthorizedYieldManager);
        }
    }
}
