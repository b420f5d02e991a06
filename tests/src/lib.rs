//! Apiary Integration Tests
//!
//! Deploys the full protocol on the Odra host VM with mock venues and exercises
//! the bonding, treasury and harvest flows end to end.

#[cfg(test)]
mod fixture;


#[cfg(test)]
mod bond_tests;



#[cfg(test)]
mod token_tests;

#[cfg(test)]
mod tests {
    use apiary_contracts::errors::ApiaryError;
    use apiary_contracts::types::Phase2Config;

    #[test]
    fn test_phase2_defaults() {
        let config = Phase2Config::default();
        assert_eq!(config.mc_threshold_multiplier_bps, 13_000);
        assert_eq!(config.compound_bps, 3_000);
        assert_eq!(config.stakers_bps, 2_000);
    }

    #[test]
    fn test_error_codes_are_grouped() {
        assert_eq!(ApiaryError::ZeroAmount as u16 / 100, 1);
        assert_eq!(ApiaryError::OraclePriceStale as u16 / 100, 2);
        assert_eq!(ApiaryError::DebtCeilingExceeded as u16 / 100, 3);
        assert_eq!(ApiaryError::Unauthorized as u16 / 100, 4);
        assert_eq!(ApiaryError::ExecutionTooSoon as u16 / 100, 7);
        assert_eq!(ApiaryError::InvalidSplit as u16 / 100, 9);
    }
}
