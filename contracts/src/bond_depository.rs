//! Bond Depository Contract
//!
//! Sells discounted APIARY that vests linearly, in exchange for one principal asset.
//! One depository is deployed per principal.
//!
//! Pricing:
//! - APIARY price comes from the TWAP oracle (`consult(1e18)`)
//! - Liquidity-token principals are valued by their bonding calculator
//! - Single-asset principals are valued by a spot price feed, rejecting stale,
//!   non-Ok or zero readings
//! - The discount is either static or picked from a debt-ratio ladder where a
//!   lower ratio earns a deeper discount; at or above the pause threshold bonds halt
//!
//! Risk limits: per-bond max payout (a share of the depository's mint allocation),
//! a dust floor, an outstanding-debt ceiling with linear decay, and a cap on open
//! bonds per depositor.

use odra::prelude::*;
use odra::ContractRef;
use odra::casper_types::U256;
use crate::errors::ApiaryError;
use crate::interfaces::{
    Cep18TokenContractRef, LiquidityValuatorContractRef, PriceFeedContractRef,
    PriceOracleContractRef, ProtocolTokenContractRef, ReserveTreasuryContractRef,
};
use crate::math::{
    bps_of, debt_decay, debt_ratio_bps, discounted_price, payout_for, percent_vested,
    value_at_price, vested_amount, BPS_SCALE, PRECISION,
};
use crate::types::{BondInfo, BondParameter, BondTerms, DiscountTier, DynamicDiscounts, OracleStatus};

/// Maximum open bonds per depositor
pub const MAX_BONDS_PER_USER: u32 = 50;

/// Shortest allowed vesting term (1 hour)
pub const MIN_VESTING_TERM: u64 = 3600;

/// Longest vesting term (ten years)
pub const MAX_VESTING_TERM: u64 = 315_360_000;

/// Deepest allowed discount (50%)
pub const MAX_DISCOUNT_BPS: u32 = 5_000;

/// Maximum number of discount tiers
pub const MAX_DISCOUNT_TIERS: usize = 10;

/// Default dust floor (0.01 APIARY)
const DEFAULT_MIN_PAYOUT: u128 = PRECISION / 100;

/// Default maximum principal price age (1 hour)
const DEFAULT_MAX_PRICE_AGE_SECONDS: u64 = 3600;

#[odra::event]
pub struct BondCreated {
    pub depositor: Address,
    pub bond_index: u32,
    pub amount: U256,
    pub payout: U256,
    pub price_paid: U256,
    pub vesting_end: u64,
}

#[odra::event]
pub struct BondRedeemed {
    pub depositor: Address,
    pub bond_index: u32,
    pub amount: U256,
    pub remaining: U256,
}

#[odra::event]
pub struct BondTermsUpdated {
    pub parameter: BondParameter,
    pub value: U256,
}

/// Bond Depository Contract
#[odra::module(events = [BondCreated, BondRedeemed, BondTermsUpdated])]
pub struct BondDepository {
    /// Contract owner
    owner: Var<Address>,
    /// APIARY token paid out to bonders
    apiary: Var<Address>,
    /// Principal asset accepted by this depository
    principal: Var<Address>,
    /// Treasury receiving principal and minting payouts
    treasury: Var<Address>,
    /// APIARY TWAP oracle
    oracle: Var<Address>,
    /// Valuation contract for liquidity-token principals
    bonding_calculator: Var<Option<Address>>,
    /// Spot price feed for single-asset principals
    principal_feed: Var<Option<Address>>,
    /// Bond terms
    terms: Var<BondTerms>,
    terms_initialized: Var<bool>,
    /// Outstanding debt in APIARY
    total_debt: Var<U256>,
    /// Last decay checkpoint
    last_decay: Var<u64>,
    /// Debt-ratio discount ladder
    dynamic_discounts: Var<DynamicDiscounts>,
    /// Dust floor for a single bond
    min_payout: Var<U256>,
    /// Maximum principal price age
    max_price_age: Var<u64>,
    /// Bonds by (depositor, index)
    bonds: Mapping<(Address, u32), BondInfo>,
    /// Number of bonds ever created per depositor
    bond_counts: Mapping<Address, u32>,
    /// Whether new bonds and redemptions are halted
    paused: Var<bool>,
}

#[odra::module]
impl BondDepository {
    /// Initialize the depository.
    ///
    /// Exactly one of `bonding_calculator` (liquidity bond) or `principal_feed`
    /// (single-asset bond) must be given.
    pub fn init(
        &mut self,
        apiary: Address,
        principal: Address,
        treasury: Address,
        oracle: Address,
        bonding_calculator: Option<Address>,
        principal_feed: Option<Address>,
    ) {
        if bonding_calculator.is_some() == principal_feed.is_some() {
            self.env().revert(ApiaryError::InvalidConfig);
        }
        self.owner.set(self.env().caller());
        self.apiary.set(apiary);
        self.principal.set(principal);
        self.treasury.set(treasury);
        self.oracle.set(oracle);
        self.bonding_calculator.set(bonding_calculator);
        self.principal_feed.set(principal_feed);
        self.terms_initialized.set(false);
        self.total_debt.set(U256::zero());
        self.last_decay.set(self.env().get_block_time());
        self.dynamic_discounts.set(DynamicDiscounts::default());
        self.min_payout.set(U256::from(DEFAULT_MIN_PAYOUT));
        self.max_price_age.set(DEFAULT_MAX_PRICE_AGE_SECONDS);
        self.paused.set(false);
    }

    // ========== Bonding ==========

    /// Bond `amount` of principal at a price no higher than `max_price`.
    /// Returns the APIARY payout that vests over the vesting term.
    #[odra(non_reentrant)]
    pub fn deposit(&mut self, amount: U256, max_price: U256) -> U256 {
        self.require_not_paused();
        let terms = self.require_terms();
        if amount.is_zero() {
            self.env().revert(ApiaryError::ZeroAmount);
        }

        self.decay_debt(&terms);

        let price = self.oracle_price();
        let value = self.principal_value(amount);
        let total_debt = self.get_total_debt();
        let discount = self.discount_for_debt(total_debt, &terms);
        let price_paid = discounted_price(price, discount);
        if price_paid.is_zero() {
            self.env().revert(ApiaryError::OraclePriceInvalid);
        }
        let payout = payout_for(value, price_paid);

        if total_debt + payout > terms.max_debt {
            self.env().revert(ApiaryError::DebtCeilingExceeded);
        }
        if price_paid > max_price {
            self.env().revert(ApiaryError::SlippageExceeded);
        }
        if payout.is_zero() || payout < self.get_min_payout() {
            self.env().revert(ApiaryError::BondTooSmall);
        }
        if payout > self.max_payout() {
            self.env().revert(ApiaryError::BondTooLarge);
        }

        let depositor = self.env().caller();
        let bond_index = self.bond_count(depositor);
        if self.open_bond_count(depositor) >= MAX_BONDS_PER_USER {
            self.env().revert(ApiaryError::TooManyBonds);
        }

        // Route principal through the depository into the treasury, which mints the payout here
        let principal = self.principal_address();
        let treasury = self.treasury_address();
        let self_address = self.env().self_address();
        let mut principal_token = Cep18TokenContractRef::new(self.env(), principal);
        if !principal_token.transfer_from(depositor, self_address, amount) {
            self.env().revert(ApiaryError::TokenTransferFailed);
        }
        principal_token.approve(treasury, amount);
        ReserveTreasuryContractRef::new(self.env(), treasury).deposit(amount, principal, payout);

        self.total_debt.set(total_debt + payout);

        let now = self.env().get_block_time();
        let vesting_end = now
            .checked_add(terms.vesting_term)
            .unwrap_or_else(|| self.env().revert(ApiaryError::InvalidParameter));
        self.bonds.set(
            &(depositor, bond_index),
            BondInfo {
                payout,
                price_paid,
                vesting_start: now,
                vesting_end,
                redeemed: false,
            },
        );
        self.bond_counts.set(&depositor, bond_index + 1);

        self.env().emit_event(BondCreated {
            depositor,
            bond_index,
            amount,
            payout,
            price_paid,
            vesting_end,
        });

        payout
    }

    /// Redeem the vested part of one bond
    #[odra(non_reentrant)]
    pub fn redeem(&mut self, bond_index: u32) -> U256 {
        self.require_not_paused();
        let depositor = self.env().caller();
        let bond = self
            .bonds
            .get(&(depositor, bond_index))
            .unwrap_or_else(|| self.env().revert(ApiaryError::BondNotFound));
        if bond.redeemed {
            self.env().revert(ApiaryError::BondAlreadyRedeemed);
        }

        let amount = self.settle_bond(depositor, bond_index, bond);
        if amount.is_zero() {
            self.env().revert(ApiaryError::NothingToRedeem);
        }

        self.pay_out(depositor, amount);
        amount
    }

    /// Redeem the vested part of every open bond of the caller
    #[odra(non_reentrant)]
    pub fn redeem_all(&mut self) -> U256 {
        self.require_not_paused();
        let depositor = self.env().caller();
        let mut total = U256::zero();

        for bond_index in 0..self.bond_count(depositor) {
            if let Some(bond) = self.bonds.get(&(depositor, bond_index)) {
                if !bond.redeemed {
                    total += self.settle_bond(depositor, bond_index, bond);
                }
            }
        }

        if total.is_zero() {
            self.env().revert(ApiaryError::NothingToRedeem);
        }

        self.pay_out(depositor, total);
        total
    }

    // ========== View Functions ==========

    /// Largest payout a single bond may have
    pub fn max_payout(&self) -> U256 {
        let terms = self.get_terms();
        let allocation = ProtocolTokenContractRef::new(self.env(), self.apiary_address())
            .allocation_limits(self.env().self_address());
        bps_of(allocation, terms.max_payout_bps)
    }

    /// Discounted price a bond would pay right now (quote per APIARY, 1e18)
    pub fn bond_price(&self) -> U256 {
        let terms = self.require_terms();
        let discount = self.discount_for_debt(self.current_debt(), &terms);
        discounted_price(self.oracle_price(), discount)
    }

    /// Outstanding debt with pending decay applied
    pub fn current_debt(&self) -> U256 {
        let total_debt = self.get_total_debt();
        let terms = self.get_terms();
        total_debt - debt_decay(total_debt, self.elapsed_since_decay(), terms.vesting_term)
    }

    /// Current debt as bps of the debt ceiling
    pub fn debt_ratio(&self) -> u32 {
        debt_ratio_bps(self.current_debt(), self.get_terms().max_debt)
    }

    pub fn percent_vested_for(&self, depositor: Address, bond_index: u32) -> u32 {
        match self.bonds.get(&(depositor, bond_index)) {
            Some(bond) => percent_vested(bond.vesting_start, bond.vesting_end, self.env().get_block_time()),
            None => 0,
        }
    }

    /// APIARY `redeem` would pay for this bond right now
    pub fn pending_payout_for(&self, depositor: Address, bond_index: u32) -> U256 {
        match self.bonds.get(&(depositor, bond_index)) {
            Some(bond) if !bond.redeemed => {
                let pct = percent_vested(bond.vesting_start, bond.vesting_end, self.env().get_block_time());
                vested_amount(bond.payout, pct)
            }
            _ => U256::zero(),
        }
    }

    pub fn bond_info(&self, depositor: Address, bond_index: u32) -> Option<BondInfo> {
        self.bonds.get(&(depositor, bond_index))
    }

    pub fn bond_count(&self, depositor: Address) -> u32 {
        self.bond_counts.get(&depositor).unwrap_or(0)
    }

    pub fn get_terms(&self) -> BondTerms {
        self.terms.get().unwrap_or_default()
    }

    pub fn terms_initialized(&self) -> bool {
        self.terms_initialized.get().unwrap_or(false)
    }

    /// Stored debt, without pending decay
    pub fn get_total_debt(&self) -> U256 {
        self.total_debt.get().unwrap_or(U256::zero())
    }

    pub fn get_last_decay(&self) -> u64 {
        self.last_decay.get().unwrap_or(0)
    }

    pub fn get_dynamic_discounts(&self) -> DynamicDiscounts {
        self.dynamic_discounts.get().unwrap_or_default()
    }

    pub fn get_min_payout(&self) -> U256 {
        self.min_payout.get().unwrap_or(U256::from(DEFAULT_MIN_PAYOUT))
    }

    pub fn get_max_price_age(&self) -> u64 {
        self.max_price_age.get().unwrap_or(DEFAULT_MAX_PRICE_AGE_SECONDS)
    }

    pub fn is_liquidity_bond(&self) -> bool {
        self.bonding_calculator.get().flatten().is_some()
    }

    pub fn get_principal(&self) -> Option<Address> {
        self.principal.get()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get().unwrap_or(false)
    }

    pub fn get_owner(&self) -> Option<Address> {
        self.owner.get()
    }

    // ========== Admin Functions ==========

    /// Set the initial bond terms (owner only, once)
    pub fn initialize_bond_terms(
        &mut self,
        vesting_term: u64,
        max_payout_bps: u32,
        discount_rate_bps: u32,
        max_debt: U256,
    ) {
        self.require_owner();
        if self.terms_initialized() {
            self.env().revert(ApiaryError::AlreadyInitialized);
        }
        let terms = BondTerms {
            vesting_term,
            max_payout_bps,
            discount_rate_bps,
            max_debt,
        };
        if !terms_valid(&terms) {
            self.env().revert(ApiaryError::InvalidParameter);
        }
        self.terms.set(terms);
        self.terms_initialized.set(true);
        self.last_decay.set(self.env().get_block_time());
    }

    /// Adjust one bond term (owner only)
    pub fn set_bond_terms(&mut self, parameter: BondParameter, value: U256) {
        self.require_owner();
        let mut terms = self.require_terms();
        match parameter {
            BondParameter::Vesting => {
                if value > U256::from(u64::MAX) {
                    self.env().revert(ApiaryError::InvalidParameter);
                }
                terms.vesting_term = value.as_u64();
            }
            BondParameter::MaxPayout => {
                if value > U256::from(BPS_SCALE) {
                    self.env().revert(ApiaryError::InvalidParameter);
                }
                terms.max_payout_bps = value.as_u32();
            }
            BondParameter::Discount => {
                if value > U256::from(MAX_DISCOUNT_BPS) {
                    self.env().revert(ApiaryError::InvalidParameter);
                }
                terms.discount_rate_bps = value.as_u32();
            }
            BondParameter::MaxDebt => {
                terms.max_debt = value;
            }
        }
        if !terms_valid(&terms) {
            self.env().revert(ApiaryError::InvalidParameter);
        }
        self.terms.set(terms);
        self.env().emit_event(BondTermsUpdated { parameter, value });
    }

    /// Configure the debt-ratio discount ladder (owner only)
    pub fn set_dynamic_discounts(&mut self, enabled: bool, tiers: Vec<DiscountTier>, pause_threshold_bps: u32) {
        self.require_owner();
        if enabled && !tiers_valid(&tiers, pause_threshold_bps) {
            self.env().revert(ApiaryError::InvalidDiscountTiers);
        }
        self.dynamic_discounts.set(DynamicDiscounts {
            enabled,
            tiers,
            pause_threshold_bps,
        });
    }

    pub fn set_min_payout(&mut self, min_payout: U256) {
        self.require_owner();
        self.min_payout.set(min_payout);
    }

    pub fn set_max_price_age(&mut self, max_price_age: u64) {
        self.require_owner();
        if max_price_age == 0 {
            self.env().revert(ApiaryError::InvalidParameter);
        }
        self.max_price_age.set(max_price_age);
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

    /// Remove debt that has vested since the last checkpoint
    fn decay_debt(&mut self, terms: &BondTerms) {
        let total_debt = self.get_total_debt();
        let decay = debt_decay(total_debt, self.elapsed_since_decay(), terms.vesting_term);
        self.total_debt.set(total_debt - decay);
        self.last_decay.set(self.env().get_block_time());
    }

    fn elapsed_since_decay(&self) -> u64 {
        self.env().get_block_time().saturating_sub(self.get_last_decay())
    }

    /// Apply vesting to a bond and persist it; returns the amount released
    fn settle_bond(&mut self, depositor: Address, bond_index: u32, mut bond: BondInfo) -> U256 {
        let pct = percent_vested(bond.vesting_start, bond.vesting_end, self.env().get_block_time());
        let amount = vested_amount(bond.payout, pct);
        if amount.is_zero() {
            return amount;
        }

        bond.payout -= amount;
        if pct >= BPS_SCALE {
            bond.redeemed = true;
        }
        let remaining = bond.payout;
        self.bonds.set(&(depositor, bond_index), bond);

        self.env().emit_event(BondRedeemed {
            depositor,
            bond_index,
            amount,
            remaining,
        });
        amount
    }

    fn pay_out(&self, depositor: Address, amount: U256) {
        if !ProtocolTokenContractRef::new(self.env(), self.apiary_address()).transfer(depositor, amount) {
            self.env().revert(ApiaryError::TokenTransferFailed);
        }
    }

    fn open_bond_count(&self, depositor: Address) -> u32 {
        let mut open = 0u32;
        for bond_index in 0..self.bond_count(depositor) {
            if let Some(bond) = self.bonds.get(&(depositor, bond_index)) {
                if !bond.redeemed {
                    open += 1;
                }
            }
        }
        open
    }

    fn oracle_price(&self) -> U256 {
        let oracle = self
            .oracle
            .get()
            .unwrap_or_else(|| self.env().revert(ApiaryError::NotInitialized));
        let price = PriceOracleContractRef::new(self.env(), oracle).consult(U256::from(PRECISION));
        if price.is_zero() {
            self.env().revert(ApiaryError::OraclePriceInvalid);
        }
        price
    }

    /// Quote value of `amount` principal
    fn principal_value(&self, amount: U256) -> U256 {
        let principal = self.principal_address();
        if let Some(calculator) = self.bonding_calculator.get().flatten() {
            return LiquidityValuatorContractRef::new(self.env(), calculator).valuation(principal, amount);
        }

        let feed = self
            .principal_feed
            .get()
            .flatten()
            .unwrap_or_else(|| self.env().revert(ApiaryError::NotInitialized));
        let data = PriceFeedContractRef::new(self.env(), feed).latest_price_data();
        match data.status {
            OracleStatus::Ok => {}
            OracleStatus::Stale => self.env().revert(ApiaryError::OraclePriceStale),
            OracleStatus::Deviation => self.env().revert(ApiaryError::OraclePriceDeviation),
            OracleStatus::Unavailable => self.env().revert(ApiaryError::OraclePriceUnavailable),
        }
        if data.price_int.is_zero() {
            self.env().revert(ApiaryError::OraclePriceInvalid);
        }
        let age = self.env().get_block_time().saturating_sub(data.timestamp_sec);
        if age > self.get_max_price_age() {
            self.env().revert(ApiaryError::OraclePriceStale);
        }
        value_at_price(amount, data.price_int, data.price_decimals)
    }

    /// Static discount, or the ladder discount for the given debt.
    ///
    /// With the ladder enabled, a debt ratio past the top tier pauses bonding
    /// just like the pause threshold does.
    fn discount_for_debt(&self, total_debt: U256, terms: &BondTerms) -> u32 {
        let dynamic = self.get_dynamic_discounts();
        if !dynamic.enabled {
            return terms.discount_rate_bps;
        }
        let ratio = debt_ratio_bps(total_debt, terms.max_debt);
        if ratio >= dynamic.pause_threshold_bps {
            self.env().revert(ApiaryError::BondsPaused);
        }
        tier_discount(&dynamic.tiers, ratio)
            .unwrap_or_else(|| self.env().revert(ApiaryError::BondsPaused))
    }

    fn require_terms(&self) -> BondTerms {
        if !self.terms_initialized() {
            self.env().revert(ApiaryError::NotInitialized);
        }
        self.get_terms()
    }

    fn apiary_address(&self) -> Address {
        self.apiary
            .get()
            .unwrap_or_else(|| self.env().revert(ApiaryError::NotInitialized))
    }

    fn principal_address(&self) -> Address {
        self.principal
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

fn terms_valid(terms: &BondTerms) -> bool {
    terms.vesting_term >= MIN_VESTING_TERM
        && terms.vesting_term <= MAX_VESTING_TERM
        && terms.max_payout_bps > 0
        && terms.max_payout_bps <= BPS_SCALE
        && terms.discount_rate_bps <= MAX_DISCOUNT_BPS
        && !terms.max_debt.is_zero()
}

/// Discount of the first tier whose ratio bound lies above `ratio`
fn tier_discount(tiers: &[DiscountTier], ratio: u32) -> Option<u32> {
    tiers
        .iter()
        .find(|tier| ratio < tier.max_debt_ratio_bps)
        .map(|tier| tier.discount_bps)
}

/// Tiers must be non-empty, strictly ascending by ratio, with discounts that never
/// deepen as the ratio grows, and the pause threshold must sit inside the scale.
fn tiers_valid(tiers: &[DiscountTier], pause_threshold_bps: u32) -> bool {
    if tiers.is_empty() || tiers.len() > MAX_DISCOUNT_TIERS {
        return false;
    }
    if pause_threshold_bps == 0 || pause_threshold_bps > BPS_SCALE {
        return false;
    }
    if tiers.iter().any(|tier| tier.discount_bps > MAX_DISCOUNT_BPS) {
        return false;
    }
    tiers.windows(2).all(|pair| {
        pair[0].max_debt_ratio_bps < pair[1].max_debt_ratio_bps
            && pair[0].discount_bps >= pair[1].discount_bps
    })
}
