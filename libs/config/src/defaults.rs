//! Deployment defaults for newly created curves
//!
//! Amounts are raw integer units: lamports for SOL (1 SOL = 10^9) and base
//! units for tokens minted with [`TOKEN_DECIMALS`] decimals.

/// Decimals of every token minted by the launchpad
pub const TOKEN_DECIMALS: u8 = 6;

/// Phantom token liquidity seeded into each curve
pub const INITIAL_VIRTUAL_TOKEN_RESERVES: u64 = 1_073_000_000_000_000;

/// Phantom SOL liquidity seeded into each curve (30 SOL)
pub const INITIAL_VIRTUAL_SOL_RESERVES: u64 = 30_000_000_000;

/// Tokens offered for sale by the curve at creation
pub const INITIAL_REAL_TOKEN_RESERVES: u64 = 793_100_000_000_000;

/// Total minted supply (one billion whole tokens)
pub const INITIAL_TOKEN_SUPPLY: u64 = 1_000_000_000_000_000;

/// Trading fee (0.5%)
pub const FEE_BASIS_POINTS: u16 = 50;

/// Basis points in one whole (100%)
pub const BASIS_POINTS_DENOMINATOR: u16 = 10_000;

/// Prefix for environment variable overrides (`LAUNCHPAD_FEE_BASIS_POINTS`, ...)
pub const ENV_PREFIX: &str = "LAUNCHPAD";

/// Default location of the base configuration file
pub const CONFIG_PATH: &str = "config/launchpad.toml";
