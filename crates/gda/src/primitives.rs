//! Primitive types shared by all auction components.

pub use alloy::primitives::{Address, U256};

/// Logical time in seconds as reported by the [`crate::boundary::Clock`].
pub type Timestamp = u64;

/// Identity of an auction.
///
/// The identity doubles as the ledger account holding the auction's escrow.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct AuctionId(pub Address);

impl AuctionId {
    /// The ledger account holding the funds of the current highest bid.
    pub fn escrow(self) -> Address {
        self.0
    }
}

/// Identity of a bid.
///
/// The identity doubles as the ledger account holding the bid's funds until
/// the bid is settled.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct BidId(pub Address);

impl BidId {
    pub fn escrow(self) -> Address {
        self.0
    }
}
