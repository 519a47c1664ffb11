//! Constant-product quoting against virtual reserves
//!
//! Holding `k = virtual_sol * virtual_token` constant, removing `t` tokens
//! costs `ceil(k / (virtual_token - t)) - virtual_sol` and adding `t` tokens
//! pays out `virtual_sol - ceil(k / (virtual_token + t))`. Both round in the
//! curve's favour, so the post-trade product never drops below `k`.
//!
//! Quotes are pure: the same snapshot always yields the same numbers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ArithmeticError, CurveError, Result};
use crate::fees::FeeCalculator;
use crate::math;
use crate::state::CurveState;

/// Lamports per SOL, for display conversions only
pub const LAMPORTS_PER_SOL: Decimal = dec!(1000000000);

/// Priced buy, fee on top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyQuote {
    pub token_amount: u64,
    /// Curve cost before fee
    pub cost: u64,
    pub fee: u64,
    /// `cost + fee`, the minimum acceptable `max_sol_amount`
    pub total: u64,
}

/// Priced sell, fee deducted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellQuote {
    pub token_amount: u64,
    /// Curve proceeds before fee
    pub proceeds: u64,
    pub fee: u64,
    /// `proceeds - fee`, the maximum acceptable `min_sol_amount`
    pub payout: u64,
}

pub struct PricingEngine;

impl PricingEngine {
    /// SOL cost, before fee, of buying `token_amount` from the curve
    ///
    /// # Errors
    /// [`CurveError::InsufficientLiquidity`] when `token_amount` exceeds the
    /// real token reserves or would exhaust the virtual token reserves.
    pub fn buy_price(curve: &CurveState, token_amount: u64) -> Result<u64> {
        if token_amount == 0 {
            return Ok(0);
        }
        if token_amount > curve.real_token_reserves
            || token_amount >= curve.virtual_token_reserves
        {
            return Err(CurveError::InsufficientLiquidity {
                requested: token_amount,
                available: curve
                    .real_token_reserves
                    .min(curve.virtual_token_reserves.saturating_sub(1)),
            });
        }

        let k = curve.invariant_k();
        let new_virtual_token = (curve.virtual_token_reserves - token_amount) as u128;
        let new_virtual_sol = math::div_ceil(k, new_virtual_token)?;

        let cost = new_virtual_sol
            .checked_sub(curve.virtual_sol_reserves as u128)
            .ok_or(ArithmeticError::Underflow)?;

        Ok(math::narrow(cost)?)
    }

    /// SOL proceeds, before fee, of selling `token_amount` into the curve
    pub fn sell_price(curve: &CurveState, token_amount: u64) -> Result<u64> {
        if token_amount == 0 {
            return Ok(0);
        }

        let k = curve.invariant_k();
        let new_virtual_token = curve.virtual_token_reserves as u128 + token_amount as u128;
        let new_virtual_sol = math::div_ceil(k, new_virtual_token)?;

        let proceeds = (curve.virtual_sol_reserves as u128)
            .checked_sub(new_virtual_sol)
            .ok_or(ArithmeticError::Underflow)?;

        Ok(math::narrow(proceeds)?)
    }

    /// Cost, fee and total for a buy in one call
    pub fn quote_buy(
        curve: &CurveState,
        token_amount: u64,
        fee_basis_points: u16,
    ) -> Result<BuyQuote> {
        let cost = Self::buy_price(curve, token_amount)?;
        let fee = FeeCalculator::fee(cost, fee_basis_points)?;
        let total = math::checked_add(cost, fee)?;

        debug!(token_amount, cost, fee, total, "Quoted buy");
        Ok(BuyQuote {
            token_amount,
            cost,
            fee,
            total,
        })
    }

    /// Proceeds, fee and payout for a sell in one call
    pub fn quote_sell(
        curve: &CurveState,
        token_amount: u64,
        fee_basis_points: u16,
    ) -> Result<SellQuote> {
        let proceeds = Self::sell_price(curve, token_amount)?;
        let fee = FeeCalculator::fee(proceeds, fee_basis_points)?;
        let payout = math::checked_sub(proceeds, fee)?;

        debug!(token_amount, proceeds, fee, payout, "Quoted sell");
        Ok(SellQuote {
            token_amount,
            proceeds,
            fee,
            payout,
        })
    }

    /// Marginal price in lamports per token base unit
    ///
    /// Display only; settlement never touches decimals.
    pub fn spot_price(curve: &CurveState) -> Option<Decimal> {
        Decimal::from(curve.virtual_sol_reserves)
            .checked_div(Decimal::from(curve.virtual_token_reserves))
    }

    /// Fully diluted valuation in SOL at the current spot price
    pub fn market_cap_sol(curve: &CurveState) -> Option<Decimal> {
        Self::spot_price(curve)?
            .checked_mul(Decimal::from(curve.token_total_supply))?
            .checked_div(LAMPORTS_PER_SOL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> CurveState {
        CurveState {
            virtual_sol_reserves: 30_000_000_000,
            virtual_token_reserves: 1_073_000_000_000_000,
            real_sol_reserves: 0,
            real_token_reserves: 793_100_000_000_000,
            token_total_supply: 1_000_000_000_000_000,
            complete: false,
        }
    }

    #[test]
    fn test_zero_amount_quotes_are_zero() {
        assert_eq!(PricingEngine::buy_price(&curve(), 0).unwrap(), 0);
        assert_eq!(PricingEngine::sell_price(&curve(), 0).unwrap(), 0);
    }

    #[test]
    fn test_small_buy_matches_closed_form() {
        // k = 1000 * 100 = 100_000; removing 10 tokens: ceil(100_000 / 90) = 1112
        let state = CurveState {
            virtual_sol_reserves: 1_000,
            virtual_token_reserves: 100,
            real_sol_reserves: 0,
            real_token_reserves: 50,
            token_total_supply: 100,
            complete: false,
        };
        assert_eq!(PricingEngine::buy_price(&state, 10).unwrap(), 112);
    }

    #[test]
    fn test_small_sell_rounds_payout_down() {
        // adding 10 tokens: ceil(100_000 / 110) = 910, payout 90
        let state = CurveState {
            virtual_sol_reserves: 1_000,
            virtual_token_reserves: 100,
            real_sol_reserves: 500,
            real_token_reserves: 50,
            token_total_supply: 100,
            complete: false,
        };
        assert_eq!(PricingEngine::sell_price(&state, 10).unwrap(), 90);
    }

    #[test]
    fn test_buy_beyond_real_reserves_rejected() {
        let state = curve();
        let err = PricingEngine::buy_price(&state, state.real_token_reserves + 1).unwrap_err();
        assert_eq!(
            err,
            CurveError::InsufficientLiquidity {
                requested: state.real_token_reserves + 1,
                available: state.real_token_reserves,
            }
        );
    }

    #[test]
    fn test_buy_of_all_virtual_tokens_rejected() {
        let state = CurveState {
            real_token_reserves: 2_000_000_000_000_000,
            ..curve()
        };
        assert!(matches!(
            PricingEngine::buy_price(&state, state.virtual_token_reserves),
            Err(CurveError::InsufficientLiquidity { .. })
        ));
    }

    #[test]
    fn test_quotes_are_pure() {
        let state = curve();
        let first = PricingEngine::quote_buy(&state, 1_000_000_000, 50).unwrap();
        let second = PricingEngine::quote_buy(&state, 1_000_000_000, 50).unwrap();
        assert_eq!(first, second);

        let first = PricingEngine::quote_sell(&state, 1_000_000_000, 50).unwrap();
        let second = PricingEngine::quote_sell(&state, 1_000_000_000, 50).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_quote_buy_adds_fee() {
        let quote = PricingEngine::quote_buy(&curve(), 10_000_000_000_000, 50).unwrap();
        assert_eq!(quote.fee, quote.cost * 50 / 10_000);
        assert_eq!(quote.total, quote.cost + quote.fee);
    }

    #[test]
    fn test_spot_price_and_market_cap() {
        let state = CurveState {
            virtual_sol_reserves: 30_000_000_000,
            virtual_token_reserves: 1_000_000_000_000_000,
            ..curve()
        };
        assert_eq!(PricingEngine::spot_price(&state), Some(dec!(0.00003)));
        // 0.00003 lamports/unit * 1e15 units = 3e10 lamports = 30 SOL
        assert_eq!(PricingEngine::market_cap_sol(&state), Some(dec!(30)));
    }
}
