//! State of a single running auction.

use {
    crate::{
        error::Error,
        pricing,
        primitives::{Address, AuctionId, Timestamp, U256},
    },
    serde::{Deserialize, Serialize},
    serde_with::{DisplayFromStr, serde_as},
};

/// A running auction.
///
/// Starts without a highest bid and with zero escrow. The only state
/// transition while the auction is open is replacing the highest bid, see
/// [`crate::settlement::update`]. Closing consumes the auction, see
/// [`crate::lifecycle::end`].
#[derive(Debug)]
pub struct Auction<A> {
    pub(crate) id: AuctionId,
    /// The only identity allowed to settle bids and close the auction.
    pub(crate) auctioneer: Address,
    /// Receives the proceeds, or the asset if nobody bought it.
    pub(crate) owner: Address,
    pub(crate) asset: A,
    pub(crate) highest: Option<HighestBid>,
    pub(crate) schedule: Schedule,
}

/// The current highest bid of an auction. Its funds are held in the auction's
/// escrow account.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighestBid {
    pub bidder: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub funds: U256,
    pub quantity: u64,
}

/// What is being sold and how its price evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Schedule {
    #[serde(rename_all = "camelCase")]
    Discrete {
        pricing: pricing::Discrete,
        /// First unit that has not been sold yet.
        first_id: u64,
        num_sold: u64,
        start_time: Timestamp,
    },
    #[serde(rename_all = "camelCase")]
    Continuous {
        pricing: pricing::Continuous,
        /// Start time of the most recent unit made available.
        last_available_start_time: Timestamp,
    },
}

/// Position of a discrete auction within a series of sub-auctions selling
/// the same kind of units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub first_id: u64,
    pub num_sold: u64,
}

/// Parameters supplied when creating an auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameters {
    Discrete {
        pricing: pricing::Discrete,
        position: Position,
    },
    Continuous(pricing::Continuous),
}

impl Parameters {
    /// A discrete auction starting with the very first unit of a series.
    pub fn discrete(pricing: pricing::Discrete) -> Self {
        Self::Discrete {
            pricing,
            position: Position::default(),
        }
    }

    pub fn continuous(pricing: pricing::Continuous) -> Self {
        Self::Continuous(pricing)
    }

    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Self::Discrete { pricing, .. } => pricing.validate(),
            Self::Continuous(pricing) => pricing.validate(),
        }
    }
}

impl<A> Auction<A> {
    /// Creates an open auction without bids. Parameters are validated right
    /// away so that broken auctions never accept funds.
    pub fn new(
        id: AuctionId,
        auctioneer: Address,
        owner: Address,
        asset: A,
        parameters: Parameters,
        now: Timestamp,
    ) -> Result<Self, Error> {
        parameters.validate()?;
        let schedule = match parameters {
            Parameters::Discrete { pricing, position } => Schedule::Discrete {
                pricing,
                first_id: position.first_id,
                num_sold: position.num_sold,
                start_time: now,
            },
            Parameters::Continuous(pricing) => Schedule::Continuous {
                pricing,
                last_available_start_time: now,
            },
        };
        Ok(Self {
            id,
            auctioneer,
            owner,
            asset,
            highest: None,
            schedule,
        })
    }

    pub fn id(&self) -> AuctionId {
        self.id
    }

    pub fn auctioneer(&self) -> Address {
        self.auctioneer
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn asset(&self) -> &A {
        &self.asset
    }

    pub fn highest(&self) -> Option<HighestBid> {
        self.highest
    }

    /// Funds currently escrowed by the highest bid.
    pub fn highest_funds(&self) -> U256 {
        self.highest.map(|bid| bid.funds).unwrap_or_default()
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn initial_price(&self) -> U256 {
        match &self.schedule {
            Schedule::Discrete { pricing, .. } => pricing.initial_price,
            Schedule::Continuous { pricing, .. } => pricing.initial_price,
        }
    }

    pub fn decay_constant(&self) -> U256 {
        match &self.schedule {
            Schedule::Discrete { pricing, .. } => pricing.decay_constant,
            Schedule::Continuous { pricing, .. } => pricing.decay_constant,
        }
    }

    /// Current price of `quantity` units.
    pub fn quote(&self, quantity: u64, now: Timestamp, precision: u32) -> Result<U256, Error> {
        match &self.schedule {
            Schedule::Discrete {
                pricing,
                num_sold,
                start_time,
                ..
            } => pricing.price(*num_sold, quantity, *start_time, now, precision),
            Schedule::Continuous {
                pricing,
                last_available_start_time,
            } => pricing.price(quantity, *last_available_start_time, now, precision),
        }
    }

    pub(crate) fn authorize(&self, caller: Address) -> Result<(), Error> {
        if caller != self.auctioneer {
            return Err(Error::Unauthorized { caller });
        }
        Ok(())
    }

    /// Checks that a bid asks for a positive quantity and, for discrete
    /// auctions, names exactly the next unsold block: the block starts at
    /// `first_id` and `current_id` is its last unit.
    pub(crate) fn check_quantity(&self, quantity: u64, current_id: Option<u64>) -> Result<(), Error> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity);
        }
        match &self.schedule {
            Schedule::Discrete { first_id, .. } => {
                let last = quantity
                    .checked_add(*first_id)
                    .map(|end| end - 1)
                    .ok_or(Error::InvalidQuantity)?;
                if current_id != Some(last) {
                    return Err(Error::InvalidQuantity);
                }
                Ok(())
            }
            Schedule::Continuous { .. } => Ok(()),
        }
    }

    /// Replaces the highest bid, returning the previous one.
    pub(crate) fn replace_highest(&mut self, bid: HighestBid) -> Option<HighestBid> {
        self.highest.replace(bid)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, testlib::identities::*};

    fn discrete(position: Position) -> Auction<()> {
        let pricing = pricing::Discrete {
            initial_price: U256::from(1000),
            scale_factor: U256::from(2),
            decay_constant: U256::ZERO,
        };
        Auction::new(
            AuctionId(AUCTION),
            AUCTIONEER,
            OWNER,
            (),
            Parameters::Discrete { pricing, position },
            7,
        )
        .unwrap()
    }

    #[test]
    fn starts_without_bids() {
        let auction = discrete(Position::default());
        assert_eq!(auction.highest(), None);
        assert_eq!(auction.highest_funds(), U256::ZERO);
        assert_eq!(auction.initial_price(), U256::from(1000));
        assert_eq!(auction.decay_constant(), U256::ZERO);
        assert_eq!(
            auction.schedule(),
            &Schedule::Discrete {
                pricing: pricing::Discrete {
                    initial_price: U256::from(1000),
                    scale_factor: U256::from(2),
                    decay_constant: U256::ZERO,
                },
                first_id: 0,
                num_sold: 0,
                start_time: 7,
            }
        );
    }

    #[test]
    fn invalid_parameters_fail_fast() {
        let pricing = pricing::Discrete {
            initial_price: U256::from(1000),
            scale_factor: U256::ONE,
            decay_constant: U256::ZERO,
        };
        let result = Auction::new(
            AuctionId(AUCTION),
            AUCTIONEER,
            OWNER,
            (),
            Parameters::discrete(pricing),
            0,
        );
        assert_eq!(result.unwrap_err(), Error::DivisionByZero);

        let pricing = pricing::Continuous {
            initial_price: U256::from(1000),
            decay_constant: U256::ONE,
            emission_rate: U256::ZERO,
        };
        let result = Auction::new(
            AuctionId(AUCTION),
            AUCTIONEER,
            OWNER,
            (),
            Parameters::continuous(pricing),
            0,
        );
        assert_eq!(result.unwrap_err(), Error::DivisionByZero);
    }

    #[test]
    fn bids_must_name_the_next_unsold_block() {
        let auction = discrete(Position::default());
        assert_eq!(auction.check_quantity(1, Some(0)), Ok(()));
        assert_eq!(auction.check_quantity(2, Some(1)), Ok(()));
        assert_eq!(auction.check_quantity(2, Some(2)), Err(Error::InvalidQuantity));
        assert_eq!(auction.check_quantity(0, Some(0)), Err(Error::InvalidQuantity));
        assert_eq!(auction.check_quantity(1, None), Err(Error::InvalidQuantity));
    }

    #[test]
    fn gaps_in_the_series_are_rejected() {
        // Units 0 and 1 are sold, the next block starts at 2.
        let auction = discrete(Position {
            first_id: 2,
            num_sold: 2,
        });
        assert_eq!(auction.check_quantity(2, Some(6)), Err(Error::InvalidQuantity));
        assert_eq!(auction.check_quantity(2, Some(3)), Ok(()));
    }

    #[test]
    fn only_the_auctioneer_is_authorized() {
        let auction = discrete(Position::default());
        assert_eq!(auction.authorize(AUCTIONEER), Ok(()));
        assert_eq!(
            auction.authorize(ALICE),
            Err(Error::Unauthorized { caller: ALICE })
        );
    }

    #[test]
    fn quotes_follow_the_series_position() {
        let first = discrete(Position::default());
        let later = discrete(Position {
            first_id: 3,
            num_sold: 3,
        });
        assert_eq!(first.quote(1, 7, 4), Ok(U256::from(1000)));
        assert_eq!(later.quote(1, 7, 4), Ok(U256::from(8000)));
    }
}
