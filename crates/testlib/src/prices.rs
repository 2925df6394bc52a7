//! Auction parameters with easy to verify prices.
//!
//! All exponentials are computed with four Taylor terms in the expectations
//! below: `exp(0) = 1`, `exp(1) = 2`, `exp(2) = 6`.

/// Initial price of the reference discrete auction. With a scale factor of 2
/// and no decay the first unit costs exactly this much.
pub const INITIAL_PRICE: u64 = 1000;

/// Scale factor of the reference discrete auction.
pub const SCALE_FACTOR: u64 = 2;

/// Precision the expectations were derived with.
pub const PRECISION: u32 = 4;
