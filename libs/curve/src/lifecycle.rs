//! Curve creation and the completion-gated withdrawal

use launchpad_config::{Address, ProtocolConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::custody::{Account, Asset, Custody, Transfer};
use crate::errors::{CurveError, Result};
use crate::state::{CurveHandle, CurveState};

/// Seed values for a new curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveParams {
    pub initial_virtual_sol_reserves: u64,
    pub initial_virtual_token_reserves: u64,
    pub initial_real_token_reserves: u64,
    pub token_total_supply: u64,
}

impl CurveParams {
    /// Administrator defaults from the protocol configuration
    pub fn from_config(config: &ProtocolConfig) -> Self {
        Self {
            initial_virtual_sol_reserves: config.initial_virtual_sol_reserves,
            initial_virtual_token_reserves: config.initial_virtual_token_reserves,
            initial_real_token_reserves: config.initial_real_token_reserves,
            token_total_supply: config.initial_token_supply,
        }
    }
}

/// Amounts released to the withdraw authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub sol_amount: u64,
    pub token_amount: u64,
}

pub struct CurveLifecycle;

impl CurveLifecycle {
    /// Seed a fresh, active curve
    ///
    /// # Errors
    /// [`CurveError::InvalidConfiguration`] when either virtual reserve is zero.
    pub fn create(params: &CurveParams) -> Result<CurveState> {
        if params.initial_virtual_token_reserves == 0 {
            return Err(CurveError::invalid_configuration(
                "initial virtual token reserves must be greater than zero",
            ));
        }
        if params.initial_virtual_sol_reserves == 0 {
            return Err(CurveError::invalid_configuration(
                "initial virtual sol reserves must be greater than zero",
            ));
        }

        let curve = CurveState {
            virtual_sol_reserves: params.initial_virtual_sol_reserves,
            virtual_token_reserves: params.initial_virtual_token_reserves,
            real_sol_reserves: 0,
            real_token_reserves: params.initial_real_token_reserves,
            token_total_supply: params.token_total_supply,
            complete: false,
        };
        curve.check_invariants()?;

        info!(%curve, "Created bonding curve");
        Ok(curve)
    }

    /// Release the collected reserves of a completed curve
    ///
    /// Zeroes the real reserves; the virtual reserves and the completion flag
    /// are left as they were.
    pub fn withdraw(curve: &mut CurveState) -> Result<Withdrawal> {
        if !curve.complete {
            warn!("Withdrawal rejected: curve not complete");
            return Err(CurveError::CurveNotComplete);
        }

        let withdrawal = Withdrawal {
            sol_amount: curve.real_sol_reserves,
            token_amount: curve.real_token_reserves,
        };
        curve.real_sol_reserves = 0;
        curve.real_token_reserves = 0;

        info!(
            sol_amount = withdrawal.sol_amount,
            token_amount = withdrawal.token_amount,
            "Withdrew bonding curve reserves"
        );
        Ok(withdrawal)
    }

    /// Withdraw and move the collected SOL plus every token left in the
    /// curve vault to the configured withdraw authority
    ///
    /// `caller` must be that authority. Nothing moves unless the curve is
    /// complete.
    pub fn withdraw_settled<C: Custody + ?Sized>(
        custody: &C,
        config: &ProtocolConfig,
        handle: CurveHandle,
        caller: Address,
        curve: &mut CurveState,
    ) -> Result<Withdrawal> {
        config.ensure_initialized()?;
        if !curve.complete {
            warn!(%handle, "Withdrawal rejected: curve not complete");
            return Err(CurveError::CurveNotComplete);
        }
        if caller != config.withdraw_authority {
            return Err(CurveError::InvalidWithdrawAuthority);
        }

        let vault = Account::CurveVault(handle);
        let authority = Account::Wallet(config.withdraw_authority);
        let vault_tokens = custody.balance(&vault, &Asset::Token(handle));

        let mut next = *curve;
        let reserves = Self::withdraw(&mut next)?;

        custody.settle(&[
            Transfer::token(handle, vault, authority, vault_tokens),
            Transfer::sol(vault, authority, reserves.sol_amount),
        ])?;

        *curve = next;
        Ok(Withdrawal {
            sol_amount: reserves.sol_amount,
            token_amount: vault_tokens,
        })
    }
}
