//! Basis-point trading fees
//!
//! The fee is always `floor(amount * bps / 10_000)`. On a buy it is charged on
//! top of the curve cost, on a sell it is deducted from the curve proceeds.

use launchpad_config::defaults::BASIS_POINTS_DENOMINATOR;

use crate::errors::{CurveError, Result};
use crate::math;

pub struct FeeCalculator;

impl FeeCalculator {
    /// Fee owed on `amount` at `basis_points`
    ///
    /// # Errors
    /// [`CurveError::InvalidConfiguration`] when `basis_points > 10_000`.
    pub fn fee(amount: u64, basis_points: u16) -> Result<u64> {
        if basis_points > BASIS_POINTS_DENOMINATOR {
            return Err(CurveError::invalid_configuration(format!(
                "fee of {} basis points exceeds {}",
                basis_points, BASIS_POINTS_DENOMINATOR
            )));
        }

        Ok(math::mul_div_floor(
            amount,
            basis_points as u64,
            BASIS_POINTS_DENOMINATOR as u64,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_exactness() {
        assert_eq!(FeeCalculator::fee(1_000_000_000, 50).unwrap(), 5_000_000);
    }

    #[test]
    fn test_fee_floors_dust() {
        // 199 * 50 / 10_000 = 0.995
        assert_eq!(FeeCalculator::fee(199, 50).unwrap(), 0);
        assert_eq!(FeeCalculator::fee(200, 50).unwrap(), 1);
    }

    #[test]
    fn test_fee_bounds() {
        assert_eq!(FeeCalculator::fee(12_345, 0).unwrap(), 0);
        assert_eq!(FeeCalculator::fee(12_345, 10_000).unwrap(), 12_345);
        assert_eq!(FeeCalculator::fee(u64::MAX, 10_000).unwrap(), u64::MAX);
    }

    #[test]
    fn test_rejects_rate_above_one_hundred_percent() {
        assert!(matches!(
            FeeCalculator::fee(1_000, 10_001),
            Err(CurveError::InvalidConfiguration { .. })
        ));
    }
}
