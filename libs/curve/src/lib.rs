//! # Launchpad Curve - Bonding Curve Market Maker
//!
//! ## Purpose
//!
//! Prices and executes trades against per-token constant-product bonding curves.
//! Each curve quotes against virtual reserves, tracks the SOL and tokens it
//! really holds, charges a basis-point fee on every trade and completes once its
//! sellable token supply is exhausted. A completed curve refuses trades and only
//! allows the withdraw authority to sweep its holdings.
//!
//! ## Integration Points
//!
//! - **Configuration**: [`launchpad_config::ProtocolConfig`] supplies fee rate, fee
//!   recipient, withdraw authority and the default seed reserves
//! - **Custody**: fund movements are expressed as [`custody::Transfer`] batches
//!   applied atomically by a [`custody::Custody`] implementation
//! - **Concurrency**: [`registry::CurveRegistry`] serializes trades per curve and
//!   lets independent curves trade in parallel
//!
//! ## Precision
//!
//! - All settlement arithmetic is unsigned 64-bit with 128-bit intermediates
//! - Prices round up and payouts round down, so the curve never loses value
//!   to rounding
//! - Decimal values are produced only for display (spot price, market cap)
//!
//! ## Usage
//!
//! ```rust
//! use launchpad_curve::{CurveLifecycle, CurveParams, PricingEngine};
//!
//! let curve = CurveLifecycle::create(&CurveParams {
//!     initial_virtual_sol_reserves: 30_000_000_000,
//!     initial_virtual_token_reserves: 1_073_000_000_000_000,
//!     initial_real_token_reserves: 793_100_000_000_000,
//!     token_total_supply: 1_000_000_000_000_000,
//! })
//! .unwrap();
//!
//! let quote = PricingEngine::quote_buy(&curve, 1_000_000_000_000, 50).unwrap();
//! assert_eq!(quote.total, quote.cost + quote.fee);
//! ```

pub mod custody;
pub mod errors;
pub mod executor;
pub mod fees;
pub mod lifecycle;
pub mod math;
pub mod pricing;
pub mod registry;
pub mod state;

pub use custody::{Account, Asset, Custody, CustodyError, InMemoryLedger, Transfer};
pub use errors::{ArithmeticError, CurveError, Result};
pub use executor::{BuyReceipt, SellReceipt, TradeAccounts, TradeExecutor};
pub use fees::FeeCalculator;
pub use lifecycle::{CurveLifecycle, CurveParams, Withdrawal};
pub use pricing::{BuyQuote, PricingEngine, SellQuote, LAMPORTS_PER_SOL};
pub use registry::{CurveRegistry, RegistryStats};
pub use state::{CurveHandle, CurveState, CurveStatus};

pub use launchpad_config::{Address, ProtocolConfig};
