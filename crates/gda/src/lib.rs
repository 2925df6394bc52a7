//! Gradual Dutch Auction settlement engine.
//!
//! Auctions start at a high price that decays over time until a bid clears
//! it. Discrete auctions sell indivisible units in contiguous blocks whose
//! price grows with the number of units already sold; continuous auctions
//! sell a constantly emitted flow of supply.
//!
//! The crate is split along the lifetime of an auction:
//! - [`pricing`] holds the pure price formulas,
//! - [`auction`] the mutable state of one auction,
//! - [`settlement`] decides about a single bid and moves the escrowed funds,
//! - [`lifecycle`] creates and closes auctions,
//! - [`house`] addresses auctions by identity and serializes access to them,
//! - [`relay`] lets bidders hand their bids to the auctioneer task.
//!
//! Everything the engine needs from the outside world (fund custody, asset
//! custody, identities and time) is expressed by the traits in [`boundary`].

pub mod auction;
pub mod bid;
pub mod boundary;
pub mod error;
pub mod house;
pub mod infra;
pub mod lifecycle;
mod metrics;
pub mod pricing;
pub mod primitives;
pub mod relay;
pub mod settlement;

pub use {
    auction::{Auction, HighestBid, Parameters, Position, Schedule},
    bid::{Bid, Request},
    error::Error,
    house::{AuctionHouse, Infra},
    lifecycle::Closed,
    primitives::{Address, AuctionId, BidId, Timestamp, U256},
    relay::{Auctioneer, BidRelay, RelayError},
    settlement::{Outcome, Refused, Rejection},
};
