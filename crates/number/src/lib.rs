//! Deterministic integer arithmetic shared by the auction pricing formulas.
//!
//! Everything here works on 256-bit unsigned integers with floor division and
//! fails loudly instead of wrapping, so that independent implementations agree
//! on every result bit for bit.

pub mod exp;
pub mod u256_ext;

pub use {
    exp::{Error, exp},
    u256_ext::U256Ext,
};
