//! Protocol error definitions.

use odra::prelude::*;

/// Apiary protocol errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ApiaryError {
    // Validation errors (1xx)
    ZeroAddress = 100,
    ZeroAmount = 101,
    InvalidParameter = 102,
    NotInitialized = 103,
    AlreadyInitialized = 104,
    ContractPaused = 105,

    // Oracle errors (2xx)
    OraclePriceUnavailable = 200,
    OraclePriceStale = 201,
    OraclePriceDeviation = 202,
    OraclePriceInvalid = 203,
    OracleWindowTooShort = 204,

    // Bond economics errors (3xx)
    DebtCeilingExceeded = 300,
    BondTooSmall = 301,
    BondTooLarge = 302,
    SlippageExceeded = 303,
    BondsPaused = 304,
    TooManyBonds = 305,
    BondNotFound = 306,
    BondAlreadyRedeemed = 307,
    NothingToRedeem = 308,

    // Access control errors (4xx)
    Unauthorized = 400,
    UnauthorizedDepositor = 401,
    UnauthorizedReservesManager = 402,
    UnauthorizedYieldManager = 403,
    UnauthorizedMinter = 404,

    // Token errors (5xx)
    TokenTransferFailed = 500,
    InsufficientTokenBalance = 501,
    InsufficientAllowance = 502,
    AllocationExceeded = 503,
    SupplyCapExceeded = 504,

    // Treasury errors (6xx)
    InvalidToken = 600,
    MintCapExceeded = 601,
    MintRatioExceeded = 602,
    InsufficientReserves = 603,
    InsufficientAvailableBalance = 604,
    PrincipalExceedsStaked = 605,
    ReturnBelowPrincipal = 606,

    // Yield errors (7xx)
    ExecutionTooSoon = 700,
    NoYieldAvailable = 701,
    BelowMinimumYield = 702,
    ClaimMismatch = 703,
    SwapFailed = 704,
    LiquidityFailed = 705,
    LpStakeFailed = 706,
    AdapterNotSet = 707,

    // Configuration errors (9xx)
    InvalidConfig = 900,
    InvalidSplit = 901,
    SlippageTooHigh = 902,
    InvalidDiscountTiers = 903,
}

impl ApiaryError {
    pub const fn message(&self) -> &'static str {
        match self {
            // Validation
            ApiaryError::ZeroAddress => "Zero address",
            ApiaryError::ZeroAmount => "Amount must be greater than zero",
            ApiaryError::InvalidParameter => "Parameter out of range",
            ApiaryError::NotInitialized => "Not initialized",
            ApiaryError::AlreadyInitialized => "Already initialized",
            ApiaryError::ContractPaused => "Operation blocked: contract paused",

            // Oracle
            ApiaryError::OraclePriceUnavailable => "Oracle price unavailable",
            ApiaryError::OraclePriceStale => "Oracle price stale",
            ApiaryError::OraclePriceDeviation => "Oracle price deviation",
            ApiaryError::OraclePriceInvalid => "Oracle price zero or out of bounds",
            ApiaryError::OracleWindowTooShort => "Oracle averaging window too short",

            // Bonds
            ApiaryError::DebtCeilingExceeded => "Bond: max debt exceeded",
            ApiaryError::BondTooSmall => "Bond: payout below minimum",
            ApiaryError::BondTooLarge => "Bond: payout above max payout",
            ApiaryError::SlippageExceeded => "Bond: price above max price",
            ApiaryError::BondsPaused => "Bond: paused at current debt ratio",
            ApiaryError::TooManyBonds => "Bond: too many open bonds",
            ApiaryError::BondNotFound => "Bond: index not found",
            ApiaryError::BondAlreadyRedeemed => "Bond: already redeemed",
            ApiaryError::NothingToRedeem => "Bond: nothing vested to redeem",

            // Access control
            ApiaryError::Unauthorized => "Unauthorized: caller is not owner",
            ApiaryError::UnauthorizedDepositor => "Unauthorized: caller is not an approved depositor",
            ApiaryError::UnauthorizedReservesManager => "Unauthorized: caller is not a reserves manager",
            ApiaryError::UnauthorizedYieldManager => "Unauthorized: caller is not the yield manager",
            ApiaryError::UnauthorizedMinter => "Unauthorized: caller is not a minter",

            // Token
            ApiaryError::TokenTransferFailed => "Token transfer failed",
            ApiaryError::InsufficientTokenBalance => "Insufficient token balance",
            ApiaryError::InsufficientAllowance => "Insufficient allowance",
            ApiaryError::AllocationExceeded => "Mint exceeds allocation limit",
            ApiaryError::SupplyCapExceeded => "Mint exceeds supply cap",

            // Treasury
            ApiaryError::InvalidToken => "Treasury: token not accepted",
            ApiaryError::MintCapExceeded => "Treasury: mint exceeds per-deposit cap",
            ApiaryError::MintRatioExceeded => "Treasury: mint exceeds deposit value ratio",
            ApiaryError::InsufficientReserves => "Treasury: insufficient reserves",
            ApiaryError::InsufficientAvailableBalance => "Treasury: insufficient available iBGT",
            ApiaryError::PrincipalExceedsStaked => "Treasury: principal exceeds staked iBGT",
            ApiaryError::ReturnBelowPrincipal => "Treasury: returned amount below principal",

            // Yield
            ApiaryError::ExecutionTooSoon => "Yield: execution interval not elapsed",
            ApiaryError::NoYieldAvailable => "Yield: nothing to harvest",
            ApiaryError::BelowMinimumYield => "Yield: pending yield below minimum",
            ApiaryError::ClaimMismatch => "Yield: claimed amount does not match pending",
            ApiaryError::SwapFailed => "Yield: swap output below expectation",
            ApiaryError::LiquidityFailed => "Yield: liquidity creation failed",
            ApiaryError::LpStakeFailed => "Yield: LP staking failed",
            ApiaryError::AdapterNotSet => "Yield: adapter not configured",

            // Config
            ApiaryError::InvalidConfig => "Invalid configuration parameter",
            ApiaryError::InvalidSplit => "Split percentages must sum to 10000",
            ApiaryError::SlippageTooHigh => "Slippage tolerance above 1000 bps",
            ApiaryError::InvalidDiscountTiers => "Discount tiers invalid",
        }
    }
}

impl core::fmt::Display for ApiaryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<ApiaryError> for OdraError {
    fn from(error: ApiaryError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}
