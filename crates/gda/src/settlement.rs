//! Settlement of a single bid against an auction.
//!
//! Settling either accepts the bid, moving its funds into the auction's escrow
//! and refunding the previous highest bidder, or rejects it and refunds its
//! bidder. In both cases all fund movements of one decision are applied as a
//! single ledger batch and the auction only changes after the batch went
//! through, so no party is ever debited without the counterparty being
//! credited.

use {
    crate::{
        auction::{Auction, HighestBid},
        bid::Bid,
        boundary::{Ledger, Transfer},
        error::Error,
        metrics,
        primitives::{Address, BidId, Timestamp, U256},
    },
    serde::Serialize,
    serde_with::{DisplayFromStr, serde_as},
};

/// Everything besides the auction and the bid a settlement depends on.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub ledger: &'a dyn Ledger,
    pub now: Timestamp,
    /// Number of Taylor terms of every exponential.
    pub precision: u32,
}

/// Result of a settled bid. The bid is consumed either way.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "result")]
pub enum Outcome {
    /// The bid is the new highest bid.
    #[serde(rename_all = "camelCase")]
    Accepted {
        bid: BidId,
        bidder: Address,
        #[serde_as(as = "DisplayFromStr")]
        funds: U256,
        /// The replaced highest bid, whose funds were returned in full.
        refunded: Option<HighestBid>,
    },
    /// The bid lost and its funds were returned in full.
    #[serde(rename_all = "camelCase")]
    Rejected {
        bid: BidId,
        bidder: Address,
        #[serde_as(as = "DisplayFromStr")]
        refund: U256,
        reason: Rejection,
    },
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::Rejected {
                reason: Rejection::Outbid { .. },
                ..
            } => "outbid",
            Self::Rejected {
                reason: Rejection::BelowPrice { .. },
                ..
            } => "below_price",
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Rejection {
    /// The auction already holds a higher bid.
    Outbid {
        #[serde_as(as = "DisplayFromStr")]
        highest: U256,
    },
    /// The bid does not cover the current price of the requested quantity.
    BelowPrice {
        #[serde_as(as = "DisplayFromStr")]
        price: U256,
    },
}

/// A bid that could not be settled at all.
///
/// Neither the auction nor any balance changed. The bid is handed back
/// untouched with its funds still escrowed under the bid's identity; the
/// caller decides whether to fix and resubmit it or to return the funds with
/// [`Bid::withdraw`].
#[derive(Debug, thiserror::Error)]
#[error("bid {} refused: {error}", .bid.id())]
pub struct Refused {
    pub bid: Bid,
    pub error: Error,
}

/// Settles `bid` against `auction` on behalf of `caller`.
///
/// The bid has to target this auction, ask for a valid quantity and cover the
/// current price of that quantity. A bid with at least the funds of the
/// current highest bid replaces it. Ties favor the new bid.
pub fn update<A>(
    auction: &mut Auction<A>,
    caller: Address,
    bid: Bid,
    context: &Context<'_>,
) -> Result<Outcome, Refused> {
    let _timer = metrics::get().on_settlement_start();
    let result = settle(auction, caller, bid, context);
    match &result {
        Ok(outcome) => {
            metrics::get().bids.with_label_values(&[outcome.label()]).inc();
            tracing::debug!(auction = %auction.id(), ?outcome, "settled bid");
        }
        Err(refused) => {
            metrics::get()
                .bids
                .with_label_values(&[refused.error.kind()])
                .inc();
            tracing::warn!(
                auction = %auction.id(),
                bid = %refused.bid.id(),
                err = %refused.error,
                "refused bid"
            );
        }
    }
    result
}

fn settle<A>(
    auction: &mut Auction<A>,
    caller: Address,
    bid: Bid,
    context: &Context<'_>,
) -> Result<Outcome, Refused> {
    let price = match validate(auction, caller, &bid, context) {
        Ok(price) => price,
        Err(error) => return Err(Refused { bid, error }),
    };

    if bid.funds() < price {
        return reject(bid, Rejection::BelowPrice { price }, context);
    }
    let highest = auction.highest_funds();
    if bid.funds() < highest {
        return reject(bid, Rejection::Outbid { highest }, context);
    }
    accept(auction, bid, context)
}

/// Checks everything that has to hold before any funds move and returns the
/// current price of the requested quantity.
fn validate<A>(
    auction: &Auction<A>,
    caller: Address,
    bid: &Bid,
    context: &Context<'_>,
) -> Result<U256, Error> {
    auction.authorize(caller)?;
    if bid.auction() != auction.id() {
        return Err(Error::WrongAuction {
            auction: auction.id(),
            bid: bid.auction(),
        });
    }
    auction.check_quantity(bid.quantity(), bid.current_id())?;
    auction.quote(bid.quantity(), context.now, context.precision)
}

fn reject(bid: Bid, reason: Rejection, context: &Context<'_>) -> Result<Outcome, Refused> {
    if let Err(err) = context.ledger.apply(&[bid.refund()]) {
        return Err(Refused {
            bid,
            error: err.into(),
        });
    }
    Ok(Outcome::Rejected {
        bid: bid.id(),
        bidder: bid.bidder(),
        refund: bid.funds(),
        reason,
    })
}

fn accept<A>(auction: &mut Auction<A>, bid: Bid, context: &Context<'_>) -> Result<Outcome, Refused> {
    let escrow = auction.id().escrow();
    let mut transfers = vec![Transfer {
        from: bid.id().escrow(),
        to: escrow,
        amount: bid.funds(),
    }];
    if let Some(previous) = auction.highest() {
        transfers.push(Transfer {
            from: escrow,
            to: previous.bidder,
            amount: previous.funds,
        });
    }
    if let Err(err) = context.ledger.apply(&transfers) {
        return Err(Refused {
            bid,
            error: err.into(),
        });
    }

    let refunded = auction.replace_highest(HighestBid {
        bidder: bid.bidder(),
        funds: bid.funds(),
        quantity: bid.quantity(),
    });
    Ok(Outcome::Accepted {
        bid: bid.id(),
        bidder: bid.bidder(),
        funds: bid.funds(),
        refunded,
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            auction::{Parameters, Position},
            bid::Request,
            boundary::{LedgerError, MockLedger},
            infra::{InMemoryLedger, SequentialIds},
            pricing,
            primitives::AuctionId,
        },
        testlib::{identities::*, prices::*},
    };

    fn discrete_auction(position: Position) -> Auction<&'static str> {
        let pricing = pricing::Discrete {
            initial_price: U256::from(INITIAL_PRICE),
            scale_factor: U256::from(SCALE_FACTOR),
            decay_constant: U256::ZERO,
        };
        Auction::new(
            AuctionId(AUCTION),
            AUCTIONEER,
            OWNER,
            "painting",
            Parameters::Discrete { pricing, position },
            0,
        )
        .unwrap()
    }

    struct Setup {
        ids: SequentialIds,
        ledger: InMemoryLedger,
    }

    impl Setup {
        fn new() -> Self {
            let ledger = InMemoryLedger::default();
            for bidder in [ALICE, BOB, CAROL] {
                ledger.deposit(bidder, U256::from(100_000)).unwrap();
            }
            Self {
                ids: SequentialIds::default(),
                ledger,
            }
        }

        fn bid(&self, bidder: Address, request: Request, funds: u64) -> Bid {
            Bid::package(&self.ids, &self.ledger, bidder, request, U256::from(funds)).unwrap()
        }

        fn context(&self) -> Context<'_> {
            Context {
                ledger: &self.ledger,
                now: 0,
                precision: PRECISION,
            }
        }

        fn balance(&self, account: Address) -> U256 {
            self.ledger.balance(account)
        }
    }

    fn first_unit() -> Request {
        Request::discrete(AuctionId(AUCTION), 0, 1)
    }

    #[test]
    fn first_bid_at_the_price_is_accepted() {
        let setup = Setup::new();
        let mut auction = discrete_auction(Position::default());
        let bid = setup.bid(ALICE, first_unit(), 1000);
        let bid_id = bid.id();

        let outcome = update(&mut auction, AUCTIONEER, bid, &setup.context()).unwrap();

        assert_eq!(
            outcome,
            Outcome::Accepted {
                bid: bid_id,
                bidder: ALICE,
                funds: U256::from(1000),
                refunded: None,
            }
        );
        assert_eq!(
            auction.highest(),
            Some(HighestBid {
                bidder: ALICE,
                funds: U256::from(1000),
                quantity: 1,
            })
        );
        assert_eq!(setup.balance(AUCTION), U256::from(1000));
        assert_eq!(setup.balance(bid_id.escrow()), U256::ZERO);
        assert_eq!(setup.balance(ALICE), U256::from(99_000));
    }

    #[test]
    fn higher_bid_refunds_the_previous_winner() {
        let setup = Setup::new();
        let mut auction = discrete_auction(Position::default());
        let first = setup.bid(ALICE, first_unit(), 1000);
        update(&mut auction, AUCTIONEER, first, &setup.context()).unwrap();

        let second = setup.bid(BOB, first_unit(), 1500);
        let outcome = update(&mut auction, AUCTIONEER, second, &setup.context()).unwrap();

        let Outcome::Accepted { refunded, .. } = outcome else {
            panic!("expected acceptance, got {outcome:?}");
        };
        assert_eq!(
            refunded,
            Some(HighestBid {
                bidder: ALICE,
                funds: U256::from(1000),
                quantity: 1,
            })
        );
        assert_eq!(setup.balance(ALICE), U256::from(100_000));
        assert_eq!(setup.balance(BOB), U256::from(98_500));
        assert_eq!(setup.balance(AUCTION), U256::from(1500));
        assert_eq!(auction.highest_funds(), U256::from(1500));
    }

    #[test]
    fn equal_bid_replaces_the_highest_bid() {
        let setup = Setup::new();
        let mut auction = discrete_auction(Position::default());
        let first = setup.bid(ALICE, first_unit(), 1200);
        update(&mut auction, AUCTIONEER, first, &setup.context()).unwrap();

        let tie = setup.bid(BOB, first_unit(), 1200);
        let outcome = update(&mut auction, AUCTIONEER, tie, &setup.context()).unwrap();

        assert!(outcome.is_accepted());
        assert_eq!(auction.highest().unwrap().bidder, BOB);
        assert_eq!(setup.balance(ALICE), U256::from(100_000));
        assert_eq!(setup.balance(AUCTION), U256::from(1200));
    }

    #[test]
    fn lower_bid_is_refunded_in_full() {
        let setup = Setup::new();
        let mut auction = discrete_auction(Position::default());
        let first = setup.bid(ALICE, first_unit(), 2000);
        update(&mut auction, AUCTIONEER, first, &setup.context()).unwrap();

        let lower = setup.bid(BOB, first_unit(), 1500);
        let lower_id = lower.id();
        let outcome = update(&mut auction, AUCTIONEER, lower, &setup.context()).unwrap();

        assert_eq!(
            outcome,
            Outcome::Rejected {
                bid: lower_id,
                bidder: BOB,
                refund: U256::from(1500),
                reason: Rejection::Outbid {
                    highest: U256::from(2000)
                },
            }
        );
        assert_eq!(setup.balance(BOB), U256::from(100_000));
        assert_eq!(setup.balance(lower_id.escrow()), U256::ZERO);
        assert_eq!(auction.highest().unwrap().bidder, ALICE);
        assert_eq!(setup.balance(AUCTION), U256::from(2000));
    }

    #[test]
    fn bid_below_the_price_is_refunded_in_full() {
        let setup = Setup::new();
        let mut auction = discrete_auction(Position::default());
        let cheap = setup.bid(ALICE, first_unit(), 999);

        let outcome = update(&mut auction, AUCTIONEER, cheap, &setup.context()).unwrap();

        assert!(matches!(
            outcome,
            Outcome::Rejected {
                reason: Rejection::BelowPrice { price },
                ..
            } if price == U256::from(1000)
        ));
        assert_eq!(setup.balance(ALICE), U256::from(100_000));
        assert_eq!(auction.highest(), None);
        assert_eq!(setup.balance(AUCTION), U256::ZERO);
    }

    #[test]
    fn bid_for_another_auction_is_handed_back() {
        let setup = Setup::new();
        let mut auction = discrete_auction(Position::default());
        let request = Request::discrete(AuctionId(OTHER_AUCTION), 0, 1);
        let bid = setup.bid(ALICE, request, 1000);
        let bid_id = bid.id();

        let refused = update(&mut auction, AUCTIONEER, bid, &setup.context()).unwrap_err();

        assert_eq!(
            refused.error,
            Error::WrongAuction {
                auction: AuctionId(AUCTION),
                bid: AuctionId(OTHER_AUCTION),
            }
        );
        assert_eq!(refused.bid.id(), bid_id);
        // Not refunded automatically, the funds stay with the bid.
        assert_eq!(setup.balance(bid_id.escrow()), U256::from(1000));
        assert_eq!(setup.balance(ALICE), U256::from(99_000));
        assert_eq!(auction.highest(), None);
    }

    #[test]
    fn non_contiguous_block_is_refused() {
        let setup = Setup::new();
        // Units 0 and 1 are sold already.
        let mut auction = discrete_auction(Position {
            first_id: 2,
            num_sold: 2,
        });
        let bid = setup.bid(ALICE, Request::discrete(AuctionId(AUCTION), 5, 2), 100_000);

        let refused = update(&mut auction, AUCTIONEER, bid, &setup.context()).unwrap_err();

        assert_eq!(refused.error, Error::InvalidQuantity);
        assert_eq!(auction.highest(), None);
        assert_eq!(setup.balance(refused.bid.id().escrow()), U256::from(100_000));
    }

    #[test]
    fn contiguous_block_is_priced_by_units_sold() {
        let setup = Setup::new();
        let mut auction = discrete_auction(Position {
            first_id: 2,
            num_sold: 2,
        });
        // 1000 * 2^2 * (2^2 - 1) / 1
        let bid = setup.bid(ALICE, Request::discrete(AuctionId(AUCTION), 2, 2), 12_000);

        let outcome = update(&mut auction, AUCTIONEER, bid, &setup.context()).unwrap();

        assert!(outcome.is_accepted());
        assert_eq!(auction.highest().unwrap().quantity, 2);
    }

    #[test]
    fn zero_quantity_is_refused() {
        let setup = Setup::new();
        let mut auction = discrete_auction(Position::default());
        let request = Request {
            auction: AuctionId(AUCTION),
            quantity: 0,
            current_id: Some(0),
        };
        let bid = setup.bid(ALICE, request, 1000);

        let refused = update(&mut auction, AUCTIONEER, bid, &setup.context()).unwrap_err();
        assert_eq!(refused.error, Error::InvalidQuantity);
    }

    #[test]
    fn only_the_auctioneer_settles() {
        let setup = Setup::new();
        let mut auction = discrete_auction(Position::default());
        let bid = setup.bid(ALICE, first_unit(), 1000);

        let refused = update(&mut auction, ALICE, bid, &setup.context()).unwrap_err();

        assert_eq!(refused.error, Error::Unauthorized { caller: ALICE });
        assert_eq!(auction.highest(), None);
        assert_eq!(setup.balance(refused.bid.id().escrow()), U256::from(1000));
    }

    #[test]
    fn failing_ledger_leaves_the_auction_untouched() {
        let setup = Setup::new();
        let mut auction = discrete_auction(Position::default());
        let bid = setup.bid(ALICE, first_unit(), 1000);

        let mut ledger = MockLedger::new();
        ledger.expect_apply().times(1).returning(|transfers| {
            Err(LedgerError::InsufficientFunds {
                account: transfers[0].from,
                available: U256::ZERO,
                required: transfers[0].amount,
            })
        });
        let context = Context {
            ledger: &ledger,
            ..setup.context()
        };

        let refused = update(&mut auction, AUCTIONEER, bid, &context).unwrap_err();

        assert!(matches!(refused.error, Error::Ledger(_)));
        assert_eq!(auction.highest(), None);
    }

    #[test]
    fn escrow_matches_the_ledger_and_never_decreases() {
        let setup = Setup::new();
        let mut auction = discrete_auction(Position::default());
        let bids = [
            (ALICE, 1000),
            (BOB, 900),
            (CAROL, 1000),
            (ALICE, 3000),
            (BOB, 2999),
            (CAROL, 5000),
            (ALICE, 1),
        ];

        let mut last = U256::ZERO;
        for (bidder, funds) in bids {
            let bid = setup.bid(bidder, first_unit(), funds);
            update(&mut auction, AUCTIONEER, bid, &setup.context()).unwrap();
            assert!(auction.highest_funds() >= last);
            assert_eq!(setup.balance(AUCTION), auction.highest_funds());
            last = auction.highest_funds();
        }

        assert_eq!(auction.highest().unwrap().bidder, CAROL);
        assert_eq!(setup.balance(ALICE), U256::from(100_000));
        assert_eq!(setup.balance(BOB), U256::from(100_000));
        assert_eq!(setup.balance(CAROL), U256::from(95_000));
    }

    #[test]
    fn continuous_auction_prices_the_requested_quantity() {
        let setup = Setup::new();
        let pricing = pricing::Continuous {
            initial_price: U256::from(1000),
            decay_constant: U256::ONE,
            emission_rate: U256::ONE,
        };
        let mut auction = Auction::new(
            AuctionId(AUCTION),
            AUCTIONEER,
            OWNER,
            "stream",
            Parameters::continuous(pricing),
            10,
        )
        .unwrap();
        let context = Context {
            now: 11,
            ..setup.context()
        };

        // 1000 * (exp(2) - 1) / exp(1) == 2500
        let cheap = setup.bid(ALICE, Request::continuous(AuctionId(AUCTION), 2), 2499);
        let outcome = update(&mut auction, AUCTIONEER, cheap, &context).unwrap();
        assert!(!outcome.is_accepted());

        let enough = setup.bid(BOB, Request::continuous(AuctionId(AUCTION), 2), 2500);
        let outcome = update(&mut auction, AUCTIONEER, enough, &context).unwrap();
        assert!(outcome.is_accepted());
    }

    #[test]
    fn outcomes_serialize_with_their_result() {
        let outcome = Outcome::Rejected {
            bid: BidId(ALICE),
            bidder: BOB,
            refund: U256::from(5),
            reason: Rejection::BelowPrice {
                price: U256::from(6),
            },
        };
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["result"], "rejected");
        assert_eq!(json["refund"], "5");
        assert_eq!(json["reason"]["kind"], "belowPrice");
        assert_eq!(json["reason"]["price"], "6");
    }
}
