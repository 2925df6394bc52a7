//! Integer approximation of the exponential function.
//!
//! The approximation is the truncated Taylor series
//!
//! ```text
//! exp(x, precision) = Σ_{i=0}^{precision-1} floor(x^i / i!)
//! ```
//!
//! where every term is floored on its own before it is added to the sum. This
//! truncation is part of the contract: pricing results derived from it are
//! compared across implementations, so switching to a more accurate scheme
//! (or to floating point) changes observable prices.

use {crate::u256_ext::U256Ext, alloy::primitives::U256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("exponential precision must be at least one term")]
    InvalidPrecision,
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

/// Approximates `e^x` with `precision` Taylor terms.
///
/// Higher precision increases accuracy and cost. Terms whose power or
/// factorial does not fit into 256 bits fail with
/// [`Error::ArithmeticOverflow`]; for any `x` that happens at the latest with
/// the 59th term, since `58!` exceeds `2^256`.
pub fn exp(x: U256, precision: u32) -> Result<U256, Error> {
    if precision == 0 {
        return Err(Error::InvalidPrecision);
    }
    (0..u64::from(precision)).try_fold(U256::ZERO, |sum, i| {
        let power = x.checked_pow_u64(i).ok_or(Error::ArithmeticOverflow)?;
        let factorial = U256::checked_factorial(i).ok_or(Error::ArithmeticOverflow)?;
        sum.checked_add(power / factorial)
            .ok_or(Error::ArithmeticOverflow)
    })
}

/// Checked integer power `base^exponent`.
pub fn pow(base: U256, exponent: u64) -> Result<U256, Error> {
    base.checked_pow_u64(exponent)
        .ok_or(Error::ArithmeticOverflow)
}
