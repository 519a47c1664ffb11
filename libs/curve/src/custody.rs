//! Custody collaborator boundary
//!
//! The engine never moves funds itself. Every trade or withdrawal produces a
//! settlement plan, a list of [`Transfer`]s, which a [`Custody`]
//! implementation must apply all-or-nothing. Reserves are committed only after
//! the plan settles.

use launchpad_config::Address;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::state::CurveHandle;

/// Something that can be held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// Base currency, in lamports
    Sol,
    /// The token traded on the given curve
    Token(CurveHandle),
}

/// Something that can hold assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Account {
    /// Externally owned wallet (trader, fee recipient, withdraw authority)
    Wallet(Address),
    /// Custody of one curve
    CurveVault(CurveHandle),
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Sol => write!(f, "SOL"),
            Asset::Token(handle) => write!(f, "token:{}", handle),
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Account::Wallet(address) => write!(f, "wallet:{}", address),
            Account::CurveVault(handle) => write!(f, "vault:{}", handle),
        }
    }
}

/// One movement in a settlement plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub asset: Asset,
    pub from: Account,
    pub to: Account,
    pub amount: u64,
}

impl Transfer {
    pub fn sol(from: Account, to: Account, amount: u64) -> Self {
        Self {
            asset: Asset::Sol,
            from,
            to,
            amount,
        }
    }

    pub fn token(curve: CurveHandle, from: Account, to: Account, amount: u64) -> Self {
        Self {
            asset: Asset::Token(curve),
            from,
            to,
            amount,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("Insufficient {asset} in {account}: required {required}, available {available}")]
    InsufficientFunds {
        account: String,
        asset: String,
        required: u64,
        available: u64,
    },

    #[error("Balance overflow crediting {asset} to {account}")]
    BalanceOverflow { account: String, asset: String },
}

/// Atomic settlement of transfer batches
pub trait Custody {
    /// Apply every transfer or none of them
    fn settle(&self, transfers: &[Transfer]) -> Result<(), CustodyError>;

    /// Create `amount` of `asset` in `account`
    ///
    /// Used at curve creation to fund the vault with the token supply.
    fn mint(&self, account: Account, asset: Asset, amount: u64) -> Result<(), CustodyError>;

    /// Current holding of `asset` in `account`
    fn balance(&self, account: &Account, asset: &Asset) -> u64;
}

/// In-process ledger used by tests and the simulator
///
/// `mint` also stands in for the funding collaborator, crediting wallets with SOL.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: Mutex<HashMap<(Account, Asset), u64>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Custody for InMemoryLedger {
    fn settle(&self, transfers: &[Transfer]) -> Result<(), CustodyError> {
        let mut balances = self.balances.lock();

        // Stage every touched balance, then publish only if all transfers apply
        let mut staged: HashMap<(Account, Asset), u64> = HashMap::new();
        for transfer in transfers.iter().filter(|t| t.amount > 0) {
            let from_key = (transfer.from, transfer.asset);
            let to_key = (transfer.to, transfer.asset);

            let available = *staged
                .entry(from_key)
                .or_insert_with(|| balances.get(&from_key).copied().unwrap_or(0));
            let remaining = available.checked_sub(transfer.amount).ok_or_else(|| {
                CustodyError::InsufficientFunds {
                    account: transfer.from.to_string(),
                    asset: transfer.asset.to_string(),
                    required: transfer.amount,
                    available,
                }
            })?;
            staged.insert(from_key, remaining);

            let current = *staged
                .entry(to_key)
                .or_insert_with(|| balances.get(&to_key).copied().unwrap_or(0));
            let credited =
                current
                    .checked_add(transfer.amount)
                    .ok_or_else(|| CustodyError::BalanceOverflow {
                        account: transfer.to.to_string(),
                        asset: transfer.asset.to_string(),
                    })?;
            staged.insert(to_key, credited);
        }

        debug!(transfers = transfers.len(), "Settled transfer batch");
        balances.extend(staged);
        Ok(())
    }

    fn mint(&self, account: Account, asset: Asset, amount: u64) -> Result<(), CustodyError> {
        let mut balances = self.balances.lock();
        let entry = balances.entry((account, asset)).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| CustodyError::BalanceOverflow {
                account: account.to_string(),
                asset: asset.to_string(),
            })?;
        debug!(%account, %asset, amount, "Minted");
        Ok(())
    }

    fn balance(&self, account: &Account, asset: &Asset) -> u64 {
        self.balances
            .lock()
            .get(&(*account, *asset))
            .copied()
            .unwrap_or(0)
    }
}
