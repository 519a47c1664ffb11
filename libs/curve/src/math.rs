//! Overflow-checked integer arithmetic for reserve and price calculations
//!
//! All amounts are `u64`. Products widen to `u128` before multiplying and are
//! narrowed back with an explicit check, so no intermediate can silently wrap.
//! Floating point never appears on the settlement path.

use crate::errors::ArithmeticError;

type MathResult<T> = Result<T, ArithmeticError>;

/// `a * b` in u128; cannot overflow for u64 inputs
#[inline]
pub fn widening_mul(a: u64, b: u64) -> u128 {
    a as u128 * b as u128
}

/// Narrow a widened value back to u64
#[inline]
pub fn narrow(value: u128) -> MathResult<u64> {
    u64::try_from(value).map_err(|_| ArithmeticError::Narrowing { value })
}

#[inline]
pub fn checked_add(a: u64, b: u64) -> MathResult<u64> {
    a.checked_add(b).ok_or(ArithmeticError::Overflow)
}

#[inline]
pub fn checked_sub(a: u64, b: u64) -> MathResult<u64> {
    a.checked_sub(b).ok_or(ArithmeticError::Underflow)
}

/// `ceil(numerator / denominator)` in u128
#[inline]
pub fn div_ceil(numerator: u128, denominator: u128) -> MathResult<u128> {
    if denominator == 0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    let quotient = numerator / denominator;
    if numerator % denominator == 0 {
        Ok(quotient)
    } else {
        quotient.checked_add(1).ok_or(ArithmeticError::Overflow)
    }
}

/// `floor(a * b / denominator)`, narrowed to u64
pub fn mul_div_floor(a: u64, b: u64, denominator: u64) -> MathResult<u64> {
    if denominator == 0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    narrow(widening_mul(a, b) / denominator as u128)
}

/// `ceil(a * b / denominator)`, narrowed to u64
pub fn mul_div_ceil(a: u64, b: u64, denominator: u64) -> MathResult<u64> {
    narrow(div_ceil(widening_mul(a, b), denominator as u128)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_mul_max() {
        assert_eq!(
            widening_mul(u64::MAX, u64::MAX),
            (u64::MAX as u128) * (u64::MAX as u128)
        );
    }

    #[test]
    fn test_narrow_rejects_large_values() {
        assert_eq!(narrow(u64::MAX as u128), Ok(u64::MAX));
        assert_eq!(
            narrow(u64::MAX as u128 + 1),
            Err(ArithmeticError::Narrowing {
                value: u64::MAX as u128 + 1
            })
        );
    }

    #[test]
    fn test_checked_add_sub() {
        assert_eq!(checked_add(u64::MAX, 1), Err(ArithmeticError::Overflow));
        assert_eq!(checked_sub(0, 1), Err(ArithmeticError::Underflow));
        assert_eq!(checked_sub(10, 4), Ok(6));
    }

    #[test]
    fn test_div_ceil_rounding() {
        assert_eq!(div_ceil(10, 5), Ok(2));
        assert_eq!(div_ceil(11, 5), Ok(3));
        assert_eq!(div_ceil(0, 5), Ok(0));
        assert_eq!(div_ceil(1, 0), Err(ArithmeticError::DivisionByZero));
    }

    #[test]
    fn test_mul_div_directions() {
        // 7 * 3 / 2 = 10.5
        assert_eq!(mul_div_floor(7, 3, 2), Ok(10));
        assert_eq!(mul_div_ceil(7, 3, 2), Ok(11));
        assert_eq!(mul_div_floor(7, 3, 0), Err(ArithmeticError::DivisionByZero));
    }

    #[test]
    fn test_mul_div_uses_wide_intermediate() {
        // Product overflows u64 but the quotient fits
        assert_eq!(mul_div_floor(u64::MAX, u64::MAX, u64::MAX), Ok(u64::MAX));
        assert!(matches!(
            mul_div_floor(u64::MAX, u64::MAX, 1),
            Err(ArithmeticError::Narrowing { .. })
        ));
    }
}
