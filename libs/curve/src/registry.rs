//! Curve registry
//!
//! Owns every live curve, keyed by handle. Each curve sits behind its own
//! lock, so trades on one curve are serialized while independent curves
//! proceed in parallel. A trade holds the write lock from pricing through
//! settlement to commit; nothing can observe or interleave with a half-applied
//! trade.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use launchpad_config::{Address, ProtocolConfig};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::custody::{Account, Asset, Custody};
use crate::errors::{CurveError, Result};
use crate::executor::{BuyReceipt, SellReceipt, TradeAccounts, TradeExecutor};
use crate::lifecycle::{CurveLifecycle, CurveParams, Withdrawal};
use crate::pricing::{BuyQuote, PricingEngine, SellQuote};
use crate::state::{CurveHandle, CurveState};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_curves: usize,
    pub completed_curves: usize,
    pub buys: u64,
    pub sells: u64,
    pub withdrawals: u64,
}

pub struct CurveRegistry<C> {
    config: ProtocolConfig,
    custody: Arc<C>,
    curves: DashMap<CurveHandle, Arc<RwLock<CurveState>>>,
    stats: Arc<RwLock<RegistryStats>>,
}

impl<C: Custody + Send + Sync> CurveRegistry<C> {
    pub fn new(config: ProtocolConfig, custody: Arc<C>) -> Self {
        Self {
            config,
            custody,
            curves: DashMap::new(),
            stats: Arc::new(RwLock::new(RegistryStats::default())),
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn custody(&self) -> &Arc<C> {
        &self.custody
    }

    /// Register a new curve under `handle` and mint its supply into the vault
    pub fn create_curve(&self, handle: CurveHandle, params: &CurveParams) -> Result<CurveState> {
        self.config.ensure_initialized()?;

        match self.curves.entry(handle) {
            Entry::Occupied(_) => Err(CurveError::CurveExists {
                handle: handle.to_string(),
            }),
            Entry::Vacant(slot) => {
                let curve = CurveLifecycle::create(params)?;
                self.custody.mint(
                    Account::CurveVault(handle),
                    Asset::Token(handle),
                    curve.token_total_supply,
                )?;
                slot.insert(Arc::new(RwLock::new(curve)));
                self.stats.write().total_curves += 1;
                info!(%handle, "Registered bonding curve");
                Ok(curve)
            }
        }
    }

    /// Register a curve seeded from the configured defaults
    pub fn create_default_curve(&self, handle: CurveHandle) -> Result<CurveState> {
        let params = CurveParams::from_config(&self.config);
        self.create_curve(handle, &params)
    }

    pub fn contains(&self, handle: &CurveHandle) -> bool {
        self.curves.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn handles(&self) -> Vec<CurveHandle> {
        self.curves.iter().map(|entry| *entry.key()).collect()
    }

    /// Point-in-time copy of a curve
    pub fn snapshot(&self, handle: &CurveHandle) -> Result<CurveState> {
        Ok(*self.curve(handle)?.read())
    }

    pub fn quote_buy(&self, handle: &CurveHandle, token_amount: u64) -> Result<BuyQuote> {
        let curve = self.snapshot(handle)?;
        curve.ensure_active()?;
        PricingEngine::quote_buy(&curve, token_amount, self.config.fee_basis_points)
    }

    pub fn quote_sell(&self, handle: &CurveHandle, token_amount: u64) -> Result<SellQuote> {
        let curve = self.snapshot(handle)?;
        curve.ensure_active()?;
        PricingEngine::quote_sell(&curve, token_amount, self.config.fee_basis_points)
    }

    pub fn buy(
        &self,
        handle: &CurveHandle,
        trader: Address,
        token_amount: u64,
        max_sol_amount: u64,
    ) -> Result<BuyReceipt> {
        let lock = self.curve(handle)?;
        let mut curve = lock.write();

        let receipt = TradeExecutor::new(&self.config).buy_settled(
            self.custody.as_ref(),
            &self.accounts(*handle, trader),
            &mut curve,
            token_amount,
            max_sol_amount,
        )?;

        let mut stats = self.stats.write();
        stats.buys += 1;
        if receipt.completed {
            stats.completed_curves += 1;
        }
        Ok(receipt)
    }

    pub fn sell(
        &self,
        handle: &CurveHandle,
        trader: Address,
        token_amount: u64,
        min_sol_amount: u64,
    ) -> Result<SellReceipt> {
        let lock = self.curve(handle)?;
        let mut curve = lock.write();

        let receipt = TradeExecutor::new(&self.config).sell_settled(
            self.custody.as_ref(),
            &self.accounts(*handle, trader),
            &mut curve,
            token_amount,
            min_sol_amount,
        )?;

        self.stats.write().sells += 1;
        Ok(receipt)
    }

    /// Sweep a completed curve's holdings to the withdraw authority
    pub fn withdraw(&self, handle: &CurveHandle, caller: Address) -> Result<Withdrawal> {
        let lock = self.curve(handle)?;
        let mut curve = lock.write();

        let withdrawal = CurveLifecycle::withdraw_settled(
            self.custody.as_ref(),
            &self.config,
            *handle,
            caller,
            &mut curve,
        )?;

        self.stats.write().withdrawals += 1;
        Ok(withdrawal)
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats.read().clone()
    }

    fn curve(&self, handle: &CurveHandle) -> Result<Arc<RwLock<CurveState>>> {
        // Clone the Arc so the map shard is released before locking the curve
        let curve = self
            .curves
            .get(handle)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| CurveError::UnknownCurve {
                handle: handle.to_string(),
            })?;
        debug!(%handle, "Resolved curve");
        Ok(curve)
    }

    fn accounts(&self, curve: CurveHandle, trader: Address) -> TradeAccounts {
        TradeAccounts {
            curve,
            trader,
            fee_recipient: self.config.fee_recipient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::InMemoryLedger;
    use launchpad_config::InitializeParams;
    use std::thread;

    const TRADER: Address = Address([4; 32]);

    fn registry() -> CurveRegistry<InMemoryLedger> {
        let mut config = ProtocolConfig::uninitialized(Address::new([1; 32]));
        config
            .initialize(InitializeParams {
                fee_recipient: Address::new([2; 32]),
                withdraw_authority: Address::new([3; 32]),
                ..InitializeParams::default()
            })
            .unwrap();
        CurveRegistry::new(config, Arc::new(InMemoryLedger::new()))
    }

    fn funded_curve(registry: &CurveRegistry<InMemoryLedger>, byte: u8) -> CurveHandle {
        let handle = CurveHandle::new([byte; 32]);
        registry.create_default_curve(handle).unwrap();
        registry
            .custody()
            .mint(Account::Wallet(TRADER), Asset::Sol, 1_000_000_000_000)
            .unwrap();
        handle
    }

    #[test]
    fn test_duplicate_handle_rejected() {
        let registry = registry();
        let handle = funded_curve(&registry, 9);

        assert!(matches!(
            registry.create_default_curve(handle),
            Err(CurveError::CurveExists { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_create_mints_supply_into_vault() {
        let registry = registry();
        let handle = funded_curve(&registry, 9);
        let supply = registry.snapshot(&handle).unwrap().token_total_supply;

        assert_eq!(
            registry
                .custody()
                .balance(&Account::CurveVault(handle), &Asset::Token(handle)),
            supply
        );
    }

    #[test]
    fn test_unknown_curve() {
        let registry = registry();
        assert!(matches!(
            registry.snapshot(&CurveHandle::new([7; 32])),
            Err(CurveError::UnknownCurve { .. })
        ));
    }

    #[test]
    fn test_quote_matches_executed_buy() {
        let registry = registry();
        let handle = funded_curve(&registry, 9);

        let quote = registry.quote_buy(&handle, 10_000_000_000_000).unwrap();
        let receipt = registry
            .buy(&handle, TRADER, 10_000_000_000_000, quote.total)
            .unwrap();

        assert_eq!(receipt.paid, quote.total);
        assert_eq!(receipt.fee, quote.fee);
        assert_eq!(registry.stats().buys, 1);
    }

    #[test]
    fn test_buy_then_sell_settles_through_custody() {
        let registry = registry();
        let handle = funded_curve(&registry, 9);

        let bought = registry
            .buy(&handle, TRADER, 5_000_000_000_000, u64::MAX)
            .unwrap();
        let sold = registry
            .sell(&handle, TRADER, bought.token_amount, 0)
            .unwrap();

        assert!(sold.received < bought.paid);
        let ledger = registry.custody();
        assert_eq!(
            ledger.balance(&Account::Wallet(TRADER), &Asset::Token(handle)),
            0
        );
        assert_eq!(
            ledger.balance(&Account::CurveVault(handle), &Asset::Sol),
            registry.snapshot(&handle).unwrap().real_sol_reserves
        );
    }

    #[test]
    fn test_independent_curves_trade_concurrently() {
        let registry = Arc::new(registry());
        let handles: Vec<_> = (1..=4).map(|b| funded_curve(&registry, b)).collect();

        let workers: Vec<_> = handles
            .iter()
            .copied()
            .map(|handle| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..10 {
                        registry
                            .buy(&handle, TRADER, 1_000_000_000, u64::MAX)
                            .unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let initial = registry.config().initial_real_token_reserves;
        for handle in &handles {
            let curve = registry.snapshot(handle).unwrap();
            assert_eq!(curve.real_token_reserves, initial - 10_000_000_000);
        }
        assert_eq!(registry.stats().buys, 40);
    }

    #[test]
    fn test_default_curve_completes_and_withdraws() {
        let registry = registry();
        let handle = funded_curve(&registry, 9);
        let authority = registry.config().withdraw_authority;
        let remaining = registry.snapshot(&handle).unwrap().real_token_reserves;

        let receipt = registry
            .buy(&handle, TRADER, remaining, u64::MAX)
            .unwrap();
        assert!(receipt.completed);

        let withdrawal = registry.withdraw(&handle, authority).unwrap();
        let supply = registry.config().initial_token_supply;
        assert_eq!(withdrawal.sol_amount, receipt.cost);
        assert_eq!(withdrawal.token_amount, supply - remaining);
        assert_eq!(
            registry
                .custody()
                .balance(&Account::Wallet(authority), &Asset::Sol),
            receipt.cost
        );
        assert_eq!(registry.stats().withdrawals, 1);
    }

    #[test]
    fn test_withdraw_before_completion_rejected() {
        let registry = registry();
        let handle = funded_curve(&registry, 9);
        let authority = registry.config().withdraw_authority;

        assert_eq!(
            registry.withdraw(&handle, authority),
            Err(CurveError::CurveNotComplete)
        );
    }
}
