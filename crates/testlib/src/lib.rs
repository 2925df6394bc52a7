//! Fixtures shared by the tests of all crates.

pub mod identities;
pub mod prices;
