//! Price formulas of the two auction variants.
//!
//! Both formulas are pure integer arithmetic on 256-bit numbers. Every
//! exponential goes through [`number::exp`] with a pinned precision, so the
//! same inputs produce the same price everywhere. The functions are used by
//! the settlement engine as the reserve price of a bid and by off-chain
//! quoting tools.

use {
    crate::{
        error::Error,
        primitives::{Timestamp, U256},
    },
    number::exp,
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
};

/// Number of Taylor terms used for all exponentials unless configured
/// otherwise.
pub const DEFAULT_PRECISION: u32 = 10;

/// Pricing parameters of an auction selling indivisible units.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrete {
    /// Price of the very first unit at the start of the auction.
    #[serde_as(as = "DisplayFromStr")]
    pub initial_price: U256,
    /// Growth of the price between two successive units.
    #[serde_as(as = "DisplayFromStr")]
    pub scale_factor: U256,
    /// Decay of the price per unit of elapsed time.
    #[serde_as(as = "DisplayFromStr")]
    pub decay_constant: U256,
}

impl Discrete {
    /// Rejects parameters for which no price can ever be computed.
    pub fn validate(&self) -> Result<(), Error> {
        if self.scale_factor == U256::ONE {
            return Err(Error::DivisionByZero);
        }
        if self.scale_factor.is_zero() {
            // (scale_factor - 1) would be negative.
            return Err(Error::ArithmeticOverflow);
        }
        Ok(())
    }

    /// Total price of the next `quantity` units after `num_sold` units were
    /// already sold:
    ///
    /// ```text
    /// initial_price * scale_factor^num_sold * (scale_factor^quantity - 1)
    ///     / (exp(decay_constant * (now - auction_start)) * (scale_factor - 1))
    /// ```
    pub fn price(
        &self,
        num_sold: u64,
        quantity: u64,
        auction_start: Timestamp,
        now: Timestamp,
        precision: u32,
    ) -> Result<U256, Error> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity);
        }
        self.validate()?;
        let elapsed = elapsed(auction_start, now)?;

        let growth = exp::pow(self.scale_factor, num_sold)?;
        let batch = exp::pow(self.scale_factor, quantity)?
            .checked_sub(U256::ONE)
            .ok_or(Error::ArithmeticOverflow)?;
        let decay = exp::exp(mul(self.decay_constant, U256::from(elapsed))?, precision)?;

        let numerator = mul(mul(self.initial_price, growth)?, batch)?;
        let denominator = mul(decay, self.scale_factor - U256::ONE)?;
        Ok(numerator / denominator)
    }
}

/// Pricing parameters of an auction selling a continuously emitted supply.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Continuous {
    #[serde_as(as = "DisplayFromStr")]
    pub initial_price: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub decay_constant: U256,
    /// Units released per unit of time.
    #[serde_as(as = "DisplayFromStr")]
    pub emission_rate: U256,
}

impl Continuous {
    pub fn validate(&self) -> Result<(), Error> {
        if self.decay_constant.is_zero() || self.emission_rate.is_zero() {
            return Err(Error::DivisionByZero);
        }
        Ok(())
    }

    /// Price of `quantity` units:
    ///
    /// ```text
    /// (initial_price / decay_constant)
    ///     * (exp(decay_constant * quantity / emission_rate) - 1)
    ///     / exp(decay_constant * (now - last_available_start))
    /// ```
    ///
    /// Every division floors.
    pub fn price(
        &self,
        quantity: u64,
        last_available_start: Timestamp,
        now: Timestamp,
        precision: u32,
    ) -> Result<U256, Error> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity);
        }
        self.validate()?;
        let elapsed = elapsed(last_available_start, now)?;

        let base = self.initial_price / self.decay_constant;
        let emitted = exp::exp(
            mul(self.decay_constant, U256::from(quantity))? / self.emission_rate,
            precision,
        )?;
        // exp() is at least one, its first term is always 1.
        let numerator = mul(base, emitted - U256::ONE)?;
        let decay = exp::exp(mul(self.decay_constant, U256::from(elapsed))?, precision)?;
        Ok(numerator / decay)
    }
}

fn elapsed(since: Timestamp, now: Timestamp) -> Result<u64, Error> {
    now.checked_sub(since).ok_or(Error::InvalidTime)
}

fn mul(a: U256, b: U256) -> Result<U256, Error> {
    a.checked_mul(b).ok_or(Error::ArithmeticOverflow)
}
