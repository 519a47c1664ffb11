//! Buy and sell state transitions
//!
//! Each trade runs in two phases. `plan_*` validates the request against a
//! snapshot and returns the successor state plus a receipt without touching
//! anything. The committing entry points (`buy`, `sell`, and the `*_settled`
//! variants that also move funds through a [`Custody`]) overwrite the curve
//! only once the plan, and any settlement, has succeeded.
//!
//! ```text
//!   Active ──buy(real_token_reserves → 0)──▶ Complete
//!     ▲ │
//!     └─┘ buy / sell
//! ```

use launchpad_config::{Address, ProtocolConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::custody::{Account, Custody, Transfer};
use crate::errors::{CurveError, Result};
use crate::fees::FeeCalculator;
use crate::math;
use crate::pricing::PricingEngine;
use crate::state::{CurveHandle, CurveState};

/// Realized amounts of an executed buy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyReceipt {
    pub token_amount: u64,
    /// SOL added to the curve reserves
    pub cost: u64,
    pub fee: u64,
    /// Total debited from the trader, `cost + fee`
    pub paid: u64,
    /// This buy exhausted the real token reserves
    pub completed: bool,
}

/// Realized amounts of an executed sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellReceipt {
    pub token_amount: u64,
    /// SOL removed from the curve reserves
    pub proceeds: u64,
    pub fee: u64,
    /// Credited to the seller, `proceeds - fee`
    pub received: u64,
}

/// Parties to a settled trade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeAccounts {
    pub curve: CurveHandle,
    pub trader: Address,
    /// Must match the configured fee recipient
    pub fee_recipient: Address,
}

/// Applies trades to curves under one protocol configuration
pub struct TradeExecutor<'a> {
    config: &'a ProtocolConfig,
}

impl<'a> TradeExecutor<'a> {
    pub fn new(config: &'a ProtocolConfig) -> Self {
        Self { config }
    }

    /// Validate and price a buy without mutating anything
    pub fn plan_buy(
        &self,
        curve: &CurveState,
        token_amount: u64,
        max_sol_amount: u64,
    ) -> Result<(CurveState, BuyReceipt)> {
        self.config.ensure_initialized()?;
        curve.ensure_active()?;

        if token_amount == 0 || token_amount > curve.real_token_reserves {
            return Err(CurveError::InsufficientLiquidity {
                requested: token_amount,
                available: curve.real_token_reserves,
            });
        }

        let cost = PricingEngine::buy_price(curve, token_amount)?;
        let fee = FeeCalculator::fee(cost, self.config.fee_basis_points)?;
        let paid = math::checked_add(cost, fee)?;

        if paid > max_sol_amount {
            warn!(
                token_amount,
                quoted = paid,
                limit = max_sol_amount,
                "Buy rejected: slippage exceeded"
            );
            return Err(CurveError::SlippageExceeded {
                quoted: paid,
                limit: max_sol_amount,
            });
        }

        let mut next = *curve;
        next.virtual_sol_reserves = math::checked_add(next.virtual_sol_reserves, cost)?;
        next.virtual_token_reserves = math::checked_sub(next.virtual_token_reserves, token_amount)?;
        next.real_sol_reserves = math::checked_add(next.real_sol_reserves, cost)?;
        next.real_token_reserves = math::checked_sub(next.real_token_reserves, token_amount)?;

        let completed = next.real_token_reserves == 0;
        if completed {
            next.complete = true;
        }

        curve.check_transition(&next)?;

        Ok((
            next,
            BuyReceipt {
                token_amount,
                cost,
                fee,
                paid,
                completed,
            },
        ))
    }

    /// Validate and price a sell without mutating anything
    pub fn plan_sell(
        &self,
        curve: &CurveState,
        token_amount: u64,
        min_sol_amount: u64,
    ) -> Result<(CurveState, SellReceipt)> {
        self.config.ensure_initialized()?;
        curve.ensure_active()?;

        if token_amount == 0 {
            return Err(CurveError::InvalidAmount);
        }

        let proceeds = PricingEngine::sell_price(curve, token_amount)?;
        let fee = FeeCalculator::fee(proceeds, self.config.fee_basis_points)?;
        let received = math::checked_sub(proceeds, fee)?;

        if received < min_sol_amount {
            warn!(
                token_amount,
                payout = received,
                limit = min_sol_amount,
                "Sell rejected: slippage exceeded"
            );
            return Err(CurveError::SlippageExceeded {
                quoted: received,
                limit: min_sol_amount,
            });
        }

        let mut next = *curve;
        next.virtual_sol_reserves = math::checked_sub(next.virtual_sol_reserves, proceeds)?;
        next.virtual_token_reserves = math::checked_add(next.virtual_token_reserves, token_amount)?;
        next.real_sol_reserves = math::checked_sub(next.real_sol_reserves, proceeds)?;
        next.real_token_reserves = math::checked_add(next.real_token_reserves, token_amount)?;

        curve.check_transition(&next)?;

        Ok((
            next,
            SellReceipt {
                token_amount,
                proceeds,
                fee,
                received,
            },
        ))
    }

    /// Execute a buy against `curve`, reserves only
    pub fn buy(
        &self,
        curve: &mut CurveState,
        token_amount: u64,
        max_sol_amount: u64,
    ) -> Result<BuyReceipt> {
        let (next, receipt) = self.plan_buy(curve, token_amount, max_sol_amount)?;
        *curve = next;
        log_buy(&receipt, curve);
        Ok(receipt)
    }

    /// Execute a sell against `curve`, reserves only
    pub fn sell(
        &self,
        curve: &mut CurveState,
        token_amount: u64,
        min_sol_amount: u64,
    ) -> Result<SellReceipt> {
        let (next, receipt) = self.plan_sell(curve, token_amount, min_sol_amount)?;
        *curve = next;
        log_sell(&receipt, curve);
        Ok(receipt)
    }

    /// Execute a buy and settle its fund movements through `custody`
    ///
    /// The curve is left untouched if settlement fails.
    pub fn buy_settled<C: Custody + ?Sized>(
        &self,
        custody: &C,
        accounts: &TradeAccounts,
        curve: &mut CurveState,
        token_amount: u64,
        max_sol_amount: u64,
    ) -> Result<BuyReceipt> {
        self.config.ensure_initialized()?;
        self.check_fee_recipient(accounts)?;
        let (next, receipt) = self.plan_buy(curve, token_amount, max_sol_amount)?;

        custody.settle(&Self::buy_transfers(accounts, &receipt))?;

        *curve = next;
        log_buy(&receipt, curve);
        Ok(receipt)
    }

    /// Execute a sell and settle its fund movements through `custody`
    pub fn sell_settled<C: Custody + ?Sized>(
        &self,
        custody: &C,
        accounts: &TradeAccounts,
        curve: &mut CurveState,
        token_amount: u64,
        min_sol_amount: u64,
    ) -> Result<SellReceipt> {
        self.config.ensure_initialized()?;
        self.check_fee_recipient(accounts)?;
        let (next, receipt) = self.plan_sell(curve, token_amount, min_sol_amount)?;

        custody.settle(&Self::sell_transfers(accounts, &receipt))?;

        *curve = next;
        log_sell(&receipt, curve);
        Ok(receipt)
    }

    /// Trader pays fee and cost, vault releases the tokens
    pub fn buy_transfers(accounts: &TradeAccounts, receipt: &BuyReceipt) -> Vec<Transfer> {
        let trader = Account::Wallet(accounts.trader);
        let vault = Account::CurveVault(accounts.curve);
        vec![
            Transfer::sol(trader, Account::Wallet(accounts.fee_recipient), receipt.fee),
            Transfer::sol(trader, vault, receipt.cost),
            Transfer::token(accounts.curve, vault, trader, receipt.token_amount),
        ]
    }

    /// Seller hands over tokens, vault pays out proceeds split into payout and fee
    pub fn sell_transfers(accounts: &TradeAccounts, receipt: &SellReceipt) -> Vec<Transfer> {
        let trader = Account::Wallet(accounts.trader);
        let vault = Account::CurveVault(accounts.curve);
        vec![
            Transfer::token(accounts.curve, trader, vault, receipt.token_amount),
            Transfer::sol(vault, trader, receipt.received),
            Transfer::sol(vault, Account::Wallet(accounts.fee_recipient), receipt.fee),
        ]
    }

    fn check_fee_recipient(&self, accounts: &TradeAccounts) -> Result<()> {
        if accounts.fee_recipient != self.config.fee_recipient {
            return Err(CurveError::InvalidFeeRecipient);
        }
        Ok(())
    }
}

fn log_buy(receipt: &BuyReceipt, curve: &CurveState) {
    info!(
        token_amount = receipt.token_amount,
        cost = receipt.cost,
        fee = receipt.fee,
        real_token_reserves = curve.real_token_reserves,
        "Executed buy"
    );
    if receipt.completed {
        info!(
            real_sol_reserves = curve.real_sol_reserves,
            "Bonding curve complete"
        );
    }
}

fn log_sell(receipt: &SellReceipt, curve: &CurveState) {
    info!(
        token_amount = receipt.token_amount,
        proceeds = receipt.proceeds,
        fee = receipt.fee,
        real_sol_reserves = curve.real_sol_reserves,
        "Executed sell"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::{Asset, InMemoryLedger};
    use launchpad_config::InitializeParams;

    fn config(fee_basis_points: u16) -> ProtocolConfig {
        let mut config = ProtocolConfig::uninitialized(Address::new([1; 32]));
        config
            .initialize(InitializeParams {
                fee_recipient: Address::new([2; 32]),
                withdraw_authority: Address::new([3; 32]),
                fee_basis_points,
                ..InitializeParams::default()
            })
            .unwrap();
        config
    }

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
    fn test_buy_updates_reserves() {
        let config = config(50);
        let executor = TradeExecutor::new(&config);
        let mut state = curve();
        let before = state;

        let receipt = executor.buy(&mut state, 1_000_000_000_000, u64::MAX).unwrap();

        assert_eq!(state.virtual_sol_reserves, before.virtual_sol_reserves + receipt.cost);
        assert_eq!(state.real_sol_reserves, receipt.cost);
        assert_eq!(
            state.virtual_token_reserves,
            before.virtual_token_reserves - 1_000_000_000_000
        );
        assert_eq!(
            state.real_token_reserves,
            before.real_token_reserves - 1_000_000_000_000
        );
        assert_eq!(receipt.paid, receipt.cost + receipt.fee);
        assert!(!receipt.completed);
    }

    #[test]
    fn test_buy_zero_is_insufficient_liquidity() {
        let config = config(50);
        let mut state = curve();
        assert!(matches!(
            TradeExecutor::new(&config).buy(&mut state, 0, u64::MAX),
            Err(CurveError::InsufficientLiquidity { requested: 0, .. })
        ));
    }

    #[test]
    fn test_sell_zero_is_invalid_amount() {
        let config = config(50);
        let mut state = curve();
        assert_eq!(
            TradeExecutor::new(&config).sell(&mut state, 0, 0),
            Err(CurveError::InvalidAmount)
        );
    }

    #[test]
    fn test_buy_slippage_leaves_state_untouched() {
        let config = config(50);
        let executor = TradeExecutor::new(&config);
        let mut state = curve();
        let before = state;

        let quote = PricingEngine::quote_buy(&state, 5_000_000_000_000, 50).unwrap();
        let err = executor
            .buy(&mut state, 5_000_000_000_000, quote.total - 1)
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(state, before);
    }

    #[test]
    fn test_uninitialized_config_rejects_trades() {
        let config = ProtocolConfig::uninitialized(Address::new([1; 32]));
        let mut state = curve();
        assert_eq!(
            TradeExecutor::new(&config).buy(&mut state, 1, u64::MAX),
            Err(CurveError::NotInitialized)
        );
    }

    #[test]
    fn test_sell_more_than_curve_holds_is_arithmetic_error() {
        let config = config(0);
        let mut state = curve();

        // Fresh curve holds no real SOL to pay out
        let err = TradeExecutor::new(&config)
            .sell(&mut state, 1_000_000_000, 0)
            .unwrap_err();
        assert!(matches!(err, CurveError::Arithmetic(_)));
        assert_eq!(state, curve());
    }

    #[test]
    fn test_settled_buy_moves_funds() {
        let config = config(50);
        let executor = TradeExecutor::new(&config);
        let ledger = InMemoryLedger::new();
        let handle = CurveHandle::new([9; 32]);
        let accounts = TradeAccounts {
            curve: handle,
            trader: Address::new([4; 32]),
            fee_recipient: config.fee_recipient,
        };
        let trader = Account::Wallet(accounts.trader);
        let vault = Account::CurveVault(handle);

        ledger.mint(trader, Asset::Sol, 10_000_000_000).unwrap();
        ledger
            .mint(vault, Asset::Token(handle), 1_000_000_000_000_000)
            .unwrap();

        let mut state = curve();
        let receipt = executor
            .buy_settled(&ledger, &accounts, &mut state, 1_000_000_000_000, u64::MAX)
            .unwrap();

        assert_eq!(
            ledger.balance(&trader, &Asset::Sol),
            10_000_000_000 - receipt.paid
        );
        assert_eq!(ledger.balance(&vault, &Asset::Sol), receipt.cost);
        assert_eq!(
            ledger.balance(&Account::Wallet(config.fee_recipient), &Asset::Sol),
            receipt.fee
        );
        assert_eq!(
            ledger.balance(&trader, &Asset::Token(handle)),
            1_000_000_000_000
        );
    }

    #[test]
    fn test_failed_settlement_keeps_curve() {
        let config = config(50);
        let executor = TradeExecutor::new(&config);
        let ledger = InMemoryLedger::new();
        let handle = CurveHandle::new([9; 32]);
        let accounts = TradeAccounts {
            curve: handle,
            trader: Address::new([4; 32]),
            fee_recipient: config.fee_recipient,
        };
        ledger
            .mint(
                Account::CurveVault(handle),
                Asset::Token(handle),
                1_000_000_000_000_000,
            )
            .unwrap();

        // Trader holds no SOL
        let mut state = curve();
        let err = executor
            .buy_settled(&ledger, &accounts, &mut state, 1_000_000_000_000, u64::MAX)
            .unwrap_err();

        assert!(matches!(err, CurveError::Custody(_)));
        assert_eq!(state, curve());
    }

    #[test]
    fn test_wrong_fee_recipient_rejected() {
        let config = config(50);
        let ledger = InMemoryLedger::new();
        let accounts = TradeAccounts {
            curve: CurveHandle::new([9; 32]),
            trader: Address::new([4; 32]),
            fee_recipient: Address::new([5; 32]),
        };

        let mut state = curve();
        assert_eq!(
            TradeExecutor::new(&config).buy_settled(&ledger, &accounts, &mut state, 1, u64::MAX),
            Err(CurveError::InvalidFeeRecipient)
        );
    }

    #[test]
    fn test_uninitialized_config_checked_before_fee_recipient() {
        let config = ProtocolConfig::uninitialized(Address::new([1; 32]));
        let ledger = InMemoryLedger::new();
        let accounts = TradeAccounts {
            curve: CurveHandle::new([9; 32]),
            trader: Address::new([4; 32]),
            fee_recipient: Address::new([5; 32]),
        };
        let executor = TradeExecutor::new(&config);

        let mut state = curve();
        assert_eq!(
            executor.buy_settled(&ledger, &accounts, &mut state, 1, u64::MAX),
            Err(CurveError::NotInitialized)
        );
        assert_eq!(
            executor.sell_settled(&ledger, &accounts, &mut state, 1, 0),
            Err(CurveError::NotInitialized)
        );
        assert_eq!(state, curve());
    }
}
