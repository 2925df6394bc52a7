//! In-memory implementations of the [`crate::boundary`] traits.
//!
//! They are complete enough to run auctions end to end in a single process,
//! which is what the command line simulator and the tests do.

mod clock;
mod custody;
mod identity;
mod ledger;

pub use {
    clock::{ManualClock, SystemClock},
    custody::InMemoryCustody,
    identity::SequentialIds,
    ledger::InMemoryLedger,
};
