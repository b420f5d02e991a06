//! TWAP Oracle Contract
//!
//! Time-weighted average price of APIARY in quote currency (HONEY, 1e18).
//!
//! Authorized feeders push spot observations. Each observation accrues
//! `previous_price * elapsed` into a cumulative price; once a full averaging window
//! has passed since the last checkpoint the average is recomputed from the
//! cumulative delta and the checkpoint rolls forward. `consult` always answers from
//! the last completed window, so a single observation cannot move the quoted price.
//!
//! The same instance also exposes `latest_price_data` with freshness status, which
//! lets it serve as the principal price feed of a single-asset bond.

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::ApiaryError;
use crate::math::{BPS_SCALE, PRECISION};
use crate::types::{OracleStatus, PriceData};

/// Minimum averaging window (1 hour)
pub const MIN_TWAP_WINDOW: u64 = 3600;

/// Default maximum observation age before the spot feed reports stale
const DEFAULT_MAX_PRICE_AGE_SECONDS: u64 = 3600;

/// Default maximum move between consecutive observations (5%)
const DEFAULT_MAX_DEVIATION_BPS: u32 = 500;

/// Oracle configuration
#[odra::odra_type]
pub struct OracleConfig {
    /// Averaging window, at least `MIN_TWAP_WINDOW`
    pub window: u64,
    /// Maximum observation age before considered stale
    pub max_price_age_seconds: u64,
    /// Maximum deviation from the previous observation in bps
    pub max_deviation_bps: u32,
    /// Minimum valid price (sanity check)
    pub min_price: U256,
    /// Maximum valid price (sanity check)
    pub max_price: U256,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            window: MIN_TWAP_WINDOW,
            max_price_age_seconds: DEFAULT_MAX_PRICE_AGE_SECONDS,
            max_deviation_bps: DEFAULT_MAX_DEVIATION_BPS,
            // 0.001 to 1,000,000 quote per token
            min_price: U256::from(PRECISION / 1000),
            max_price: U256::from(1_000_000u64) * U256::from(PRECISION),
        }
    }
}

/// Cumulative price snapshot marking the start of the current window
#[odra::odra_type]
#[derive(Default)]
pub struct Checkpoint {
    pub price_cumulative: U256,
    pub timestamp: u64,
}

/// Emitted on every accepted observation
#[odra::event]
pub struct PriceUpdated {
    pub price: U256,
    pub price_average: U256,
    pub timestamp: u64,
}

/// TWAP Oracle Contract
#[odra::module(events = [PriceUpdated])]
pub struct TwapOracle {
    /// Oracle owner
    owner: Var<Address>,
    /// Accounts allowed to push observations
    feeders: Mapping<Address, bool>,
    /// Oracle configuration
    config: Var<OracleConfig>,
    /// Last observed spot price
    last_price: Var<U256>,
    /// Time of the last observation
    last_update: Var<u64>,
    /// Running sum of price * time
    price_cumulative: Var<U256>,
    /// Start of the current averaging window
    checkpoint: Var<Checkpoint>,
    /// Average over the last completed window
    price_average: Var<U256>,
}

#[odra::module]
impl TwapOracle {
    /// Initialize with a seed price; the deployer becomes owner and feeder
    pub fn init(&mut self, initial_price: U256, window: u64) {
        if window < MIN_TWAP_WINDOW {
            self.env().revert(ApiaryError::OracleWindowTooShort);
        }
        let config = OracleConfig {
            window,
            ..OracleConfig::default()
        };
        if !price_in_bounds(initial_price, &config) {
            self.env().revert(ApiaryError::OraclePriceInvalid);
        }

        let caller = self.env().caller();
        let now = self.env().get_block_time();
        self.owner.set(caller);
        self.feeders.set(&caller, true);
        self.config.set(config);
        self.last_price.set(initial_price);
        self.last_update.set(now);
        self.price_cumulative.set(U256::zero());
        self.checkpoint.set(Checkpoint {
            price_cumulative: U256::zero(),
            timestamp: now,
        });
        self.price_average.set(initial_price);
    }

    // ========== Price Query Functions ==========

    /// Quote amount for `amount_in` tokens at the time-weighted average price
    pub fn consult(&self, amount_in: U256) -> U256 {
        let average = self.price_average.get().unwrap_or(U256::zero());
        if average.is_zero() {
            self.env().revert(ApiaryError::OraclePriceUnavailable);
        }
        amount_in * average / U256::from(PRECISION)
    }

    /// Spot observation with freshness status
    pub fn latest_price_data(&self) -> PriceData {
        let price = self.last_price.get().unwrap_or(U256::zero());
        let timestamp = self.last_update.get().unwrap_or(0);
        let config = self.config.get().unwrap_or_default();

        let age = self.env().get_block_time().saturating_sub(timestamp);
        let status = if price.is_zero() {
            OracleStatus::Unavailable
        } else if age > config.max_price_age_seconds {
            OracleStatus::Stale
        } else {
            OracleStatus::Ok
        };

        PriceData {
            price_int: price,
            price_decimals: 18,
            timestamp_sec: timestamp,
            status,
        }
    }

    pub fn get_price_average(&self) -> U256 {
        self.price_average.get().unwrap_or(U256::zero())
    }

    pub fn get_last_price(&self) -> U256 {
        self.last_price.get().unwrap_or(U256::zero())
    }

    /// Cumulative price including accrual up to now
    pub fn current_cumulative_price(&self) -> U256 {
        let cumulative = self.price_cumulative.get().unwrap_or(U256::zero());
        let last_price = self.last_price.get().unwrap_or(U256::zero());
        let elapsed = self
            .env()
            .get_block_time()
            .saturating_sub(self.last_update.get().unwrap_or(0));
        accumulate(cumulative, last_price, elapsed)
    }

    pub fn get_checkpoint(&self) -> Checkpoint {
        self.checkpoint.get().unwrap_or_default()
    }

    // ========== Price Update Functions ==========

    /// Push a new observation (feeder only)
    pub fn update(&mut self, price: U256) {
        let caller = self.env().caller();
        if !self.is_feeder(caller) {
            self.env().revert(ApiaryError::Unauthorized);
        }

        let config = self.config.get().unwrap_or_default();
        if !price_in_bounds(price, &config) {
            self.env().revert(ApiaryError::OraclePriceInvalid);
        }

        let last_price = self.last_price.get().unwrap_or(U256::zero());
        if exceeds_deviation(price, last_price, config.max_deviation_bps) {
            self.env().revert(ApiaryError::OraclePriceDeviation);
        }

        let now = self.env().get_block_time();
        let cumulative = self.current_cumulative_price();
        self.price_cumulative.set(cumulative);
        self.last_price.set(price);
        self.last_update.set(now);

        // Roll the window once it has fully elapsed
        let checkpoint = self.get_checkpoint();
        let window_elapsed = now.saturating_sub(checkpoint.timestamp);
        if window_elapsed >= config.window {
            let average = (cumulative - checkpoint.price_cumulative) / U256::from(window_elapsed);
            self.price_average.set(average);
            self.checkpoint.set(Checkpoint {
                price_cumulative: cumulative,
                timestamp: now,
            });
        }

        self.env().emit_event(PriceUpdated {
            price,
            price_average: self.get_price_average(),
            timestamp: now,
        });
    }

    // ========== Configuration Functions ==========

    pub fn get_config(&self) -> OracleConfig {
        self.config.get().unwrap_or_default()
    }

    /// Update oracle configuration (owner only)
    pub fn set_config(&mut self, config: OracleConfig) {
        self.require_owner();
        if config.window < MIN_TWAP_WINDOW {
            self.env().revert(ApiaryError::OracleWindowTooShort);
        }
        if config.min_price.is_zero()
            || config.min_price > config.max_price
            || config.max_deviation_bps > BPS_SCALE
        {
            self.env().revert(ApiaryError::InvalidConfig);
        }
        self.config.set(config);
    }

    pub fn add_feeder(&mut self, feeder: Address) {
        self.require_owner();
        self.feeders.set(&feeder, true);
    }

    pub fn remove_feeder(&mut self, feeder: Address) {
        self.require_owner();
        self.feeders.set(&feeder, false);
    }

    pub fn is_feeder(&self, account: Address) -> bool {
        self.feeders.get(&account).unwrap_or(false)
    }

    pub fn get_owner(&self) -> Option<Address> {
        self.owner.get()
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) {
        self.require_owner();
        self.owner.set(new_owner);
    }

    fn require_owner(&self) {
        if self.owner.get() != Some(self.env().caller()) {
            self.env().revert(ApiaryError::Unauthorized);
        }
    }
}

/// `cumulative + price * elapsed`
fn accumulate(cumulative: U256, price: U256, elapsed: u64) -> U256 {
    cumulative + price * U256::from(elapsed)
}

fn price_in_bounds(price: U256, config: &OracleConfig) -> bool {
    !price.is_zero() && price >= config.min_price && price <= config.max_price
}

/// Whether `new_price` moved more than `max_deviation_bps` from `reference_price`
fn exceeds_deviation(new_price: U256, reference_price: U256, max_deviation_bps: u32) -> bool {
    if reference_price.is_zero() {
        return false;
    }
    let diff = if new_price > reference_price {
        new_price - reference_price
    } else {
        reference_price - new_price
    };
    diff * U256::from(BPS_SCALE) / reference_price > U256::from(max_deviation_bps)
}
