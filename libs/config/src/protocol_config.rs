//! Protocol Configuration Module
//!
//! Provides the administrator configuration record and its loading from TOML
//! files with environment-specific overrides.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::address::Address;
use crate::defaults;

/// Errors raised while validating or initializing the protocol configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Protocol configuration is already initialized")]
    AlreadyInitialized,

    #[error("Protocol configuration is not initialized")]
    NotInitialized,

    #[error("Fee of {bps} basis points is outside [0, {}]", defaults::BASIS_POINTS_DENOMINATOR)]
    FeeOutOfRange { bps: u16 },

    #[error("Initial {field} must be greater than zero")]
    ZeroReserve { field: &'static str },

    /// Real token reserves a curve could never sell out of
    #[error("Initial real token reserves {real} must be below virtual token reserves {virtual_tokens} and at most supply {supply}")]
    RealReservesOutOfRange {
        real: u64,
        virtual_tokens: u64,
        supply: u64,
    },

    #[error("Invalid address: '{input}' - expected 32 hex-encoded bytes")]
    InvalidAddress { input: String },
}

/// Process-wide configuration set once by the administrator
///
/// Passed explicitly into every trade; nothing in the engine reads it from
/// ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub authority: Address,
    pub fee_recipient: Address,
    pub withdraw_authority: Address,
    pub initial_virtual_token_reserves: u64,
    pub initial_virtual_sol_reserves: u64,
    pub initial_real_token_reserves: u64,
    pub initial_token_supply: u64,
    pub fee_basis_points: u16,
    pub initialized: bool,
}

/// Administrator-supplied values for [`ProtocolConfig::initialize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeParams {
    pub fee_recipient: Address,
    pub withdraw_authority: Address,
    pub initial_virtual_token_reserves: u64,
    pub initial_virtual_sol_reserves: u64,
    pub initial_real_token_reserves: u64,
    pub initial_token_supply: u64,
    pub fee_basis_points: u16,
}

impl Default for InitializeParams {
    fn default() -> Self {
        Self {
            fee_recipient: Address::ZERO,
            withdraw_authority: Address::ZERO,
            initial_virtual_token_reserves: defaults::INITIAL_VIRTUAL_TOKEN_RESERVES,
            initial_virtual_sol_reserves: defaults::INITIAL_VIRTUAL_SOL_RESERVES,
            initial_real_token_reserves: defaults::INITIAL_REAL_TOKEN_RESERVES,
            initial_token_supply: defaults::INITIAL_TOKEN_SUPPLY,
            fee_basis_points: defaults::FEE_BASIS_POINTS,
        }
    }
}

/// On-disk shape: addresses stay as strings until `${VAR}` expansion
#[derive(Debug, Deserialize, Serialize, Clone)]
struct ProtocolConfigFile {
    authority: String,
    fee_recipient: String,
    withdraw_authority: String,
    #[serde(default = "default_virtual_token_reserves")]
    initial_virtual_token_reserves: u64,
    #[serde(default = "default_virtual_sol_reserves")]
    initial_virtual_sol_reserves: u64,
    #[serde(default = "default_real_token_reserves")]
    initial_real_token_reserves: u64,
    #[serde(default = "default_token_supply")]
    initial_token_supply: u64,
    #[serde(default = "default_fee_basis_points")]
    fee_basis_points: u16,
    #[serde(default = "default_initialized")]
    initialized: bool,
}

fn default_virtual_token_reserves() -> u64 {
    defaults::INITIAL_VIRTUAL_TOKEN_RESERVES
}

fn default_virtual_sol_reserves() -> u64 {
    defaults::INITIAL_VIRTUAL_SOL_RESERVES
}

fn default_real_token_reserves() -> u64 {
    defaults::INITIAL_REAL_TOKEN_RESERVES
}

fn default_token_supply() -> u64 {
    defaults::INITIAL_TOKEN_SUPPLY
}

fn default_fee_basis_points() -> u16 {
    defaults::FEE_BASIS_POINTS
}

// A config file describes a deployed protocol, so it counts as initialized
// unless it says otherwise.
fn default_initialized() -> bool {
    true
}

impl ProtocolConfigFile {
    /// Expand environment variables in address fields and parse them
    fn into_config(self) -> Result<ProtocolConfig> {
        Ok(ProtocolConfig {
            authority: expand_address(&self.authority).context("Failed to parse authority")?,
            fee_recipient: expand_address(&self.fee_recipient)
                .context("Failed to parse fee_recipient")?,
            withdraw_authority: expand_address(&self.withdraw_authority)
                .context("Failed to parse withdraw_authority")?,
            initial_virtual_token_reserves: self.initial_virtual_token_reserves,
            initial_virtual_sol_reserves: self.initial_virtual_sol_reserves,
            initial_real_token_reserves: self.initial_real_token_reserves,
            initial_token_supply: self.initial_token_supply,
            fee_basis_points: self.fee_basis_points,
            initialized: self.initialized,
        })
    }
}

fn expand_address(raw: &str) -> Result<Address> {
    let expanded = shellexpand::env(raw).context("Failed to expand address")?;
    Ok(expanded.parse::<Address>()?)
}

impl ProtocolConfig {
    /// Config record as it exists before the administrator initializes it
    pub fn uninitialized(authority: Address) -> Self {
        let params = InitializeParams::default();
        Self {
            authority,
            fee_recipient: params.fee_recipient,
            withdraw_authority: params.withdraw_authority,
            initial_virtual_token_reserves: params.initial_virtual_token_reserves,
            initial_virtual_sol_reserves: params.initial_virtual_sol_reserves,
            initial_real_token_reserves: params.initial_real_token_reserves,
            initial_token_supply: params.initial_token_supply,
            fee_basis_points: params.fee_basis_points,
            initialized: false,
        }
    }

    /// One-shot administrator initialization
    ///
    /// Fails with [`ConfigError::AlreadyInitialized`] on a second call and
    /// leaves the record untouched when validation fails.
    pub fn initialize(&mut self, params: InitializeParams) -> Result<(), ConfigError> {
        if self.initialized {
            return Err(ConfigError::AlreadyInitialized);
        }

        let candidate = Self {
            authority: self.authority,
            fee_recipient: params.fee_recipient,
            withdraw_authority: params.withdraw_authority,
            initial_virtual_token_reserves: params.initial_virtual_token_reserves,
            initial_virtual_sol_reserves: params.initial_virtual_sol_reserves,
            initial_real_token_reserves: params.initial_real_token_reserves,
            initial_token_supply: params.initial_token_supply,
            fee_basis_points: params.fee_basis_points,
            initialized: true,
        };
        candidate.validate()?;

        *self = candidate;
        info!(
            authority = %self.authority,
            fee_recipient = %self.fee_recipient,
            withdraw_authority = %self.withdraw_authority,
            fee_basis_points = self.fee_basis_points,
            "Initialized protocol config"
        );
        Ok(())
    }

    /// Check fee range, non-zero virtual reserves and that the seeded real
    /// token reserves can be bought out
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fee_basis_points > defaults::BASIS_POINTS_DENOMINATOR {
            return Err(ConfigError::FeeOutOfRange {
                bps: self.fee_basis_points,
            });
        }
        if self.initial_virtual_token_reserves == 0 {
            return Err(ConfigError::ZeroReserve {
                field: "virtual token reserves",
            });
        }
        if self.initial_virtual_sol_reserves == 0 {
            return Err(ConfigError::ZeroReserve {
                field: "virtual sol reserves",
            });
        }
        if self.initial_real_token_reserves >= self.initial_virtual_token_reserves
            || self.initial_real_token_reserves > self.initial_token_supply
        {
            return Err(ConfigError::RealReservesOutOfRange {
                real: self.initial_real_token_reserves,
                virtual_tokens: self.initial_virtual_token_reserves,
                supply: self.initial_token_supply,
            });
        }
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<(), ConfigError> {
        if self.initialized {
            Ok(())
        } else {
            Err(ConfigError::NotInitialized)
        }
    }

    /// Load configuration from files with environment overrides
    ///
    /// Sources, later ones winning: `base_path` (default
    /// `config/launchpad.toml`), `<base dir>/environments/<environment>.toml`
    /// when present, then `LAUNCHPAD_*` variables.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(defaults::CONFIG_PATH));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Override with environment variables (LAUNCHPAD_ prefix). Values stay
        // strings: all-digit hex addresses must not be read as numbers, and
        // numeric fields are converted on deserialization.
        builder = builder.add_source(
            Environment::with_prefix(defaults::ENV_PREFIX).prefix_separator("_"),
        );

        let raw: ProtocolConfigFile = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        let config = raw.into_config()?;
        config.validate().context("Invalid protocol configuration")?;

        debug!(?config, "Loaded protocol config");
        Ok(config)
    }

    /// Render as TOML, the same format [`ProtocolConfig::load`] reads
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Write as TOML to `path`
    pub fn save(&self, path: &Path) -> Result<PathBuf> {
        let rendered = self.to_toml()?;
        std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write configuration to {:?}", path))?;
        Ok(path.to_path_buf())
    }
}

/// Convenience function to load configuration with defaults
pub fn load_config(environment: Option<&str>) -> Result<ProtocolConfig> {
    ProtocolConfig::load(None, environment)
}
