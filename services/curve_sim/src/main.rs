//! Bonding Curve Simulator
//!
//! Quotes and replays trades against a freshly launched curve using the
//! protocol configuration on disk and an in-memory ledger for custody.
//!
//! ```text
//! config/launchpad.toml ─▶ ProtocolConfig ─▶ CurveRegistry ─▶ JSON on stdout
//!                                               │
//!                                          InMemoryLedger
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use launchpad_config::{defaults, Address, InitializeParams, ProtocolConfig};
use launchpad_curve::{
    Account, Asset, Custody, CurveError, CurveHandle, CurveRegistry, CurveState,
    InMemoryLedger, PricingEngine,
};

const SIM_CURVE: CurveHandle = CurveHandle::new([0xc0; 32]);
const SIM_TRADER: Address = Address([0x7a; 32]);
const SIM_TRADER_SOL: u64 = 1_000_000_000_000_000;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "curve-sim")]
#[command(about = "Quote and simulate trades on a launchpad bonding curve")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = defaults::CONFIG_PATH)]
    config: PathBuf,

    /// Environment override (loads config/environments/<env>.toml)
    #[arg(short, long)]
    env: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Price a buy of `amount` token base units
    QuoteBuy {
        #[arg(short, long)]
        amount: u64,

        /// Tokens bought before quoting
        #[arg(long, default_value_t = 0)]
        prebuy: u64,
    },

    /// Price a sell of `amount` token base units
    QuoteSell {
        #[arg(short, long)]
        amount: u64,

        /// Tokens bought before quoting, giving the curve SOL to pay out
        #[arg(long, default_value_t = 0)]
        prebuy: u64,
    },

    /// Run a sequence of buys then sells and report the final curve
    Simulate {
        #[arg(long, default_value_t = 10)]
        buys: u32,

        #[arg(long, default_value_t = 0)]
        sells: u32,

        /// Token base units per trade
        #[arg(short, long)]
        amount: u64,
    },

    /// Print the effective protocol configuration
    ShowConfig,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs)?;

    info!("Config file: {:?}", args.config);
    info!("Environment: {}", args.env.as_deref().unwrap_or("default"));

    let config = load_protocol_config(&args)?;

    let output = match args.command {
        Command::QuoteBuy { amount, prebuy } => {
            let registry = launch(config)?;
            prebuy_tokens(&registry, prebuy)?;
            let quote = registry.quote_buy(&SIM_CURVE, amount)?;
            json!({ "quote": quote, "curve": describe(&registry.snapshot(&SIM_CURVE)?) })
        }
        Command::QuoteSell { amount, prebuy } => {
            let registry = launch(config)?;
            prebuy_tokens(&registry, prebuy)?;
            let quote = registry.quote_sell(&SIM_CURVE, amount)?;
            json!({ "quote": quote, "curve": describe(&registry.snapshot(&SIM_CURVE)?) })
        }
        Command::Simulate {
            buys,
            sells,
            amount,
        } => simulate(config, buys, sells, amount)?,
        Command::ShowConfig => serde_json::to_value(&config)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_tracing(json_logs: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log filter")?;

    // Logs go to stderr so stdout stays machine-readable
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

/// Load from disk, or fall back to built-in defaults when no file exists
fn load_protocol_config(args: &Args) -> Result<ProtocolConfig> {
    if args.config.exists() {
        return ProtocolConfig::load(Some(&args.config), args.env.as_deref());
    }

    warn!(
        "Config file {:?} not found, using built-in defaults",
        args.config
    );
    let mut config = ProtocolConfig::uninitialized(Address::new([0x01; 32]));
    config
        .initialize(InitializeParams {
            fee_recipient: Address::new([0x02; 32]),
            withdraw_authority: Address::new([0x03; 32]),
            ..InitializeParams::default()
        })
        .context("Failed to initialize default configuration")?;
    Ok(config)
}

/// Registry with one launched curve and a funded trader
fn launch(config: ProtocolConfig) -> Result<CurveRegistry<InMemoryLedger>> {
    let registry = CurveRegistry::new(config, Arc::new(InMemoryLedger::new()));
    registry.create_default_curve(SIM_CURVE)?;
    registry
        .custody()
        .mint(Account::Wallet(SIM_TRADER), Asset::Sol, SIM_TRADER_SOL)?;
    Ok(registry)
}

fn prebuy_tokens(registry: &CurveRegistry<InMemoryLedger>, amount: u64) -> Result<()> {
    if amount > 0 {
        registry
            .buy(&SIM_CURVE, SIM_TRADER, amount, u64::MAX)
            .context("Pre-buy failed")?;
    }
    Ok(())
}

fn simulate(
    config: ProtocolConfig,
    buys: u32,
    sells: u32,
    amount: u64,
) -> Result<serde_json::Value> {
    let registry = launch(config)?;

    let mut buy_receipts = Vec::new();
    for round in 0..buys {
        match registry.buy(&SIM_CURVE, SIM_TRADER, amount, u64::MAX) {
            Ok(receipt) => {
                let completed = receipt.completed;
                buy_receipts.push(receipt);
                if completed {
                    info!(round, "Curve completed, stopping buys");
                    break;
                }
            }
            Err(
                err @ (CurveError::InsufficientLiquidity { .. }
                | CurveError::CurveComplete
                | CurveError::Custody(_)),
            ) => {
                warn!(round, error = %err, "Stopping buys");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    let mut sell_receipts = Vec::new();
    for round in 0..sells {
        match registry.sell(&SIM_CURVE, SIM_TRADER, amount, 0) {
            Ok(receipt) => sell_receipts.push(receipt),
            Err(
                err @ (CurveError::CurveComplete
                | CurveError::Custody(_)
                | CurveError::Arithmetic(_)),
            ) => {
                warn!(round, error = %err, "Stopping sells");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    let ledger = registry.custody();
    let trader = Account::Wallet(SIM_TRADER);
    Ok(json!({
        "buys": buy_receipts,
        "sells": sell_receipts,
        "curve": describe(&registry.snapshot(&SIM_CURVE)?),
        "trader": {
            "sol": ledger.balance(&trader, &Asset::Sol),
            "tokens": ledger.balance(&trader, &Asset::Token(SIM_CURVE)),
        },
        "fees_collected": ledger.balance(
            &Account::Wallet(registry.config().fee_recipient),
            &Asset::Sol,
        ),
        "stats": registry.stats(),
    }))
}

fn describe(curve: &CurveState) -> serde_json::Value {
    json!({
        "state": curve,
        "status": curve.status(),
        "spot_price": PricingEngine::spot_price(curve),
        "market_cap_sol": PricingEngine::market_cap_sol(curve),
    })
}
