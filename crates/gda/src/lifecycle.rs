//! Creating and closing auctions.

use {
    crate::{
        auction::{Auction, HighestBid, Parameters, Position, Schedule},
        boundary::{AssetCustody, Clock, IdentityService, Ledger, Transfer},
        error::Error,
        primitives::{Address, AuctionId, U256},
    },
    serde::Serialize,
    serde_with::{DisplayFromStr, serde_as},
};

/// Creates an auction under a fresh identity, starting now.
pub fn create<A>(
    ids: &dyn IdentityService,
    clock: &dyn Clock,
    auctioneer: Address,
    owner: Address,
    asset: A,
    parameters: Parameters,
) -> Result<Auction<A>, Error> {
    let id = AuctionId(ids.fresh());
    let auction = Auction::new(id, auctioneer, owner, asset, parameters, clock.now())?;
    tracing::info!(auction = %id, %auctioneer, %owner, ?parameters, "created auction");
    Ok(auction)
}

/// Receipt of a closed auction.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Closed {
    pub auction: AuctionId,
    pub owner: Address,
    /// Receives the asset. `None` if the asset went back to the owner.
    pub winner: Option<Address>,
    /// Funds paid to the owner.
    #[serde_as(as = "DisplayFromStr")]
    pub proceeds: U256,
    pub quantity: u64,
    /// Units sold by a discrete auction.
    pub units: Option<Units>,
    /// Where the next discrete auction of the same series starts.
    pub next: Option<Position>,
}

/// Inclusive range of sold units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Units {
    pub first: u64,
    pub last: u64,
}

/// An auction that could not be closed.
#[derive(Debug)]
pub enum Unclosed<A> {
    /// Nothing changed, the auction is handed back open.
    Open { auction: Auction<A>, error: Error },
    /// The asset reached its recipient but the owner was not paid. The
    /// proceeds are still held by the auction's escrow, see [`pay`].
    Unpaid { closed: Closed, error: Error },
}

impl<A> Unclosed<A> {
    pub fn error(&self) -> &Error {
        match self {
            Self::Open { error, .. } | Self::Unpaid { error, .. } => error,
        }
    }
}

/// Closes `auction` on behalf of `caller`.
///
/// The asset goes to the highest bidder and the escrow is paid to the owner as
/// sale proceeds. Without a highest bid the asset goes back to the owner and
/// no funds move. The asset is released first: if that fails the auction is
/// handed back open with its escrow untouched.
pub fn end<A>(
    auction: Auction<A>,
    caller: Address,
    ledger: &dyn Ledger,
    custody: &dyn AssetCustody<A>,
) -> Result<Closed, Unclosed<A>> {
    if let Err(error) = auction.authorize(caller) {
        return Err(Unclosed::Open { auction, error });
    }

    let Auction {
        id,
        auctioneer,
        owner,
        asset,
        highest,
        schedule,
    } = auction;
    let recipient = highest.map_or(owner, |highest| highest.bidder);
    if let Err((asset, err)) = custody.release(asset, recipient) {
        let auction = Auction {
            id,
            auctioneer,
            owner,
            asset,
            highest,
            schedule,
        };
        return Err(Unclosed::Open {
            auction,
            error: err.into(),
        });
    }

    let closed = receipt(id, owner, highest, &schedule);
    if let Err(error) = pay(&closed, ledger) {
        tracing::error!(auction = %id, %recipient, err = %error, "released asset of unpaid auction");
        return Err(Unclosed::Unpaid { closed, error });
    }
    tracing::info!(auction = %id, winner = ?closed.winner, proceeds = %closed.proceeds, "closed auction");
    Ok(closed)
}

/// Pays the proceeds of `closed` from the auction's escrow to its owner.
pub fn pay(closed: &Closed, ledger: &dyn Ledger) -> Result<(), Error> {
    if closed.proceeds.is_zero() {
        return Ok(());
    }
    ledger
        .apply(&[Transfer {
            from: closed.auction.escrow(),
            to: closed.owner,
            amount: closed.proceeds,
        }])
        .map_err(|error| Error::ProceedsUnpaid {
            auction: closed.auction,
            error,
        })
}

fn receipt(
    auction: AuctionId,
    owner: Address,
    highest: Option<HighestBid>,
    schedule: &Schedule,
) -> Closed {
    let quantity = highest.map(|highest| highest.quantity).unwrap_or_default();
    let (units, next) = match (schedule, highest) {
        (
            Schedule::Discrete {
                first_id, num_sold, ..
            },
            Some(highest),
        ) => (
            Some(Units {
                first: *first_id,
                last: first_id + highest.quantity - 1,
            }),
            Some(Position {
                first_id: first_id + highest.quantity,
                num_sold: num_sold + highest.quantity,
            }),
        ),
        (
            Schedule::Discrete {
                first_id, num_sold, ..
            },
            None,
        ) => (
            None,
            Some(Position {
                first_id: *first_id,
                num_sold: *num_sold,
            }),
        ),
        (Schedule::Continuous { .. }, _) => (None, None),
    };
    Closed {
        auction,
        owner,
        winner: highest.map(|highest| highest.bidder),
        proceeds: highest.map(|highest| highest.funds).unwrap_or_default(),
        quantity,
        units,
        next,
    }
}
