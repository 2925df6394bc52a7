//! Trait definitions for external system boundaries.
//!
//! The engine never keeps value or assets itself. Funds live in a [`Ledger`],
//! sold assets are handed to an [`AssetCustody`], identities and time come
//! from an [`IdentityService`] and a [`Clock`]. In-memory implementations are
//! in [`crate::infra`].

use {
    crate::primitives::{Address, Timestamp, U256},
    serde_with::{DisplayFromStr, serde_as},
};

/// A movement of fungible value between two ledger accounts.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("account {account} holds {available} but {required} is required")]
    InsufficientFunds {
        account: Address,
        available: U256,
        required: U256,
    },
    #[error("balance of account {0} would overflow")]
    Overflow(Address),
}

/// Custody of fungible value.
///
/// Escrow is modelled as value held under the identity of the bid or auction
/// it belongs to.
#[cfg_attr(test, mockall::automock)]
pub trait Ledger: Send + Sync {
    /// Current balance of `account`.
    fn balance(&self, account: Address) -> U256;

    /// Applies all transfers in order, or none of them.
    ///
    /// Batches are totally ordered with respect to each other; no other
    /// observer can see a state where only a prefix of the batch is applied.
    fn apply(&self, transfers: &[Transfer]) -> Result<(), LedgerError>;
}

/// Generates fresh unique identities for bids and auctions.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityService: Send + Sync {
    fn fresh(&self) -> Address;
}

/// Source of the current logical time.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Monotonic; coarse granularity is fine.
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to release asset to {to}: {reason}")]
pub struct CustodyError {
    pub to: Address,
    pub reason: String,
}

/// Moves ownership of the asset being auctioned.
pub trait AssetCustody<A>: Send + Sync {
    /// Transfers `asset` to `to`. On failure the asset is handed back
    /// unchanged together with the reason.
    fn release(&self, asset: A, to: Address) -> Result<(), (A, CustodyError)>;
}
