//! # Launchpad Protocol Configuration
//!
//! This crate owns the administrator-set configuration record consumed by every
//! bonding-curve operation, together with the deployment defaults and the
//! loader that assembles it from TOML files and environment variables.
//!
//! ## Features
//!
//! - **Protocol Defaults**: Initial virtual/real reserves, total supply, fee rate
//! - **Identity**: Fee recipient, withdraw authority and admin authority addresses
//! - **Loading**: Base TOML file, per-environment overrides, `LAUNCHPAD_*` variables
//!
//! ## Usage
//!
//! ```rust
//! use launchpad_config::{defaults, Address, InitializeParams, ProtocolConfig};
//!
//! let mut config = ProtocolConfig::uninitialized(Address::new([1; 32]));
//! config
//!     .initialize(InitializeParams {
//!         fee_recipient: Address::new([2; 32]),
//!         withdraw_authority: Address::new([3; 32]),
//!         ..InitializeParams::default()
//!     })
//!     .unwrap();
//!
//! assert!(config.initialized);
//! assert_eq!(config.fee_basis_points, defaults::FEE_BASIS_POINTS);
//! ```

pub mod address;
pub mod defaults;
pub mod protocol_config;

// Re-export commonly used types
pub use address::Address;
pub use protocol_config::{load_config, ConfigError, InitializeParams, ProtocolConfig};
