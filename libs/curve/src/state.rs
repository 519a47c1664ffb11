//! Curve reserve record and its invariants
//!
//! A [`CurveState`] is a plain value. Mutating paths build the successor state
//! on a copy, run [`CurveState::check_transition`] and only then commit, so
//! a failed check never leaves a half-applied trade behind.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::{CurveError, Result};
use crate::math;

/// Opaque capability naming one curve
///
/// Derived by the addressing collaborator; the engine only compares handles.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurveHandle(pub [u8; 32]);

impl CurveHandle {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for CurveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for CurveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CurveHandle({}..)", &hex::encode(self.0)[..8])
    }
}

impl FromStr for CurveHandle {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for CurveHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CurveHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Trading state of a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveStatus {
    /// Accepting buys and sells
    Active,
    /// Sellable supply exhausted; only withdrawal remains
    Complete,
}

/// Reserve record for one token's curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveState {
    /// Phantom SOL liquidity, never withdrawable
    pub virtual_sol_reserves: u64,
    /// Phantom token liquidity, moves one-for-one with `real_token_reserves`
    pub virtual_token_reserves: u64,
    /// SOL actually held by the curve
    pub real_sol_reserves: u64,
    /// Tokens still available for sale
    pub real_token_reserves: u64,
    /// Minted supply, fixed at creation
    pub token_total_supply: u64,
    /// Set once the real token reserves hit zero; never reset
    pub complete: bool,
}

impl CurveState {
    pub fn status(&self) -> CurveStatus {
        if self.complete {
            CurveStatus::Complete
        } else {
            CurveStatus::Active
        }
    }

    /// Constant product `k = virtual_sol * virtual_token`
    #[inline]
    pub fn invariant_k(&self) -> u128 {
        math::widening_mul(self.virtual_sol_reserves, self.virtual_token_reserves)
    }

    /// Reject trades against a completed curve
    pub fn ensure_active(&self) -> Result<()> {
        if self.complete {
            Err(CurveError::CurveComplete)
        } else {
            Ok(())
        }
    }

    /// Standalone invariants that hold for every reachable state
    pub fn check_invariants(&self) -> Result<()> {
        if self.virtual_sol_reserves == 0 || self.virtual_token_reserves == 0 {
            return Err(CurveError::InvariantViolation {
                reason: format!(
                    "virtual reserves must be non-zero (sol={}, token={})",
                    self.virtual_sol_reserves, self.virtual_token_reserves
                ),
            });
        }
        Ok(())
    }

    /// Invariants relating a state to its successor across one trade
    ///
    /// - `k` never decreases
    /// - virtual and real token reserves move by the same amount
    /// - virtual and real SOL reserves move by the same amount
    /// - supply is fixed and completion never reverts
    pub fn check_transition(&self, next: &CurveState) -> Result<()> {
        next.check_invariants()?;

        if next.invariant_k() < self.invariant_k() {
            return Err(CurveError::InvariantViolation {
                reason: format!(
                    "constant product decreased from {} to {}",
                    self.invariant_k(),
                    next.invariant_k()
                ),
            });
        }

        let virtual_token_delta =
            next.virtual_token_reserves as i128 - self.virtual_token_reserves as i128;
        let real_token_delta = next.real_token_reserves as i128 - self.real_token_reserves as i128;
        if virtual_token_delta != real_token_delta {
            return Err(CurveError::InvariantViolation {
                reason: format!(
                    "token reserve deltas diverged (virtual={}, real={})",
                    virtual_token_delta, real_token_delta
                ),
            });
        }

        let virtual_sol_delta =
            next.virtual_sol_reserves as i128 - self.virtual_sol_reserves as i128;
        let real_sol_delta = next.real_sol_reserves as i128 - self.real_sol_reserves as i128;
        if virtual_sol_delta != real_sol_delta {
            return Err(CurveError::InvariantViolation {
                reason: format!(
                    "sol reserve deltas diverged (virtual={}, real={})",
                    virtual_sol_delta, real_sol_delta
                ),
            });
        }

        if next.token_total_supply != self.token_total_supply {
            return Err(CurveError::InvariantViolation {
                reason: "token total supply changed".to_string(),
            });
        }

        if self.complete && !next.complete {
            return Err(CurveError::InvariantViolation {
                reason: "completed curve reverted to active".to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for CurveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Curve {{ virtual_sol: {}, virtual_token: {}, real_sol: {}, real_token: {}, supply: {}, complete: {} }}",
            self.virtual_sol_reserves,
            self.virtual_token_reserves,
            self.real_sol_reserves,
            self.real_token_reserves,
            self.token_total_supply,
            self.complete
        )
    }
}
