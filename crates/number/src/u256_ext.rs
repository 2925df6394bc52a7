//! Extension trait for U256 arithmetic operations.

use alloy::primitives::U256;

/// Extension trait for U256 to add utility methods.
pub trait U256Ext: Sized {
    /// Checked integer power with a machine sized exponent.
    fn checked_pow_u64(&self, exponent: u64) -> Option<Self>;

    /// Checked factorial of `n`.
    fn checked_factorial(n: u64) -> Option<Self>;
}

impl U256Ext for U256 {
    fn checked_pow_u64(&self, exponent: u64) -> Option<Self> {
        self.checked_pow(U256::from(exponent))
    }

    fn checked_factorial(n: u64) -> Option<Self> {
        (2..=n).try_fold(U256::ONE, |acc, i| acc.checked_mul(U256::from(i)))
    }
}
