//! Bids packaged by bidders and consumed by the settlement engine.

use crate::{
    boundary::{IdentityService, Ledger, LedgerError, Transfer},
    primitives::{Address, AuctionId, BidId, U256},
};

/// What a bidder asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub auction: AuctionId,
    pub quantity: u64,
    /// Last unit of the requested block. Only meaningful for discrete
    /// auctions, where the block has to start at the first unsold unit.
    pub current_id: Option<u64>,
}

impl Request {
    /// Requests the block `[first_unit, first_unit + quantity - 1]` of a
    /// discrete auction.
    pub fn discrete(auction: AuctionId, first_unit: u64, quantity: u64) -> Self {
        Self {
            auction,
            quantity,
            current_id: first_unit
                .checked_add(quantity)
                .and_then(|end| end.checked_sub(1)),
        }
    }

    pub fn continuous(auction: AuctionId, quantity: u64) -> Self {
        Self {
            auction,
            quantity,
            current_id: None,
        }
    }
}

/// Funds offered for a [`Request`].
///
/// The funds are escrowed under the bid's own identity from the moment the
/// bid is packaged and the amount never changes afterwards. A bid is moved
/// into the settlement engine, which either keeps the funds or returns them
/// to the bidder, so it can be settled only once. On validation failures the
/// engine hands the untouched bid back.
#[derive(Debug, PartialEq, Eq)]
pub struct Bid {
    id: BidId,
    bidder: Address,
    request: Request,
    funds: U256,
}

impl Bid {
    /// Packages `funds` of `bidder` into a new bid by moving them from the
    /// bidder's account into the escrow of a fresh bid identity.
    pub fn package(
        ids: &dyn IdentityService,
        ledger: &dyn Ledger,
        bidder: Address,
        request: Request,
        funds: U256,
    ) -> Result<Self, LedgerError> {
        let id = BidId(ids.fresh());
        ledger.apply(&[Transfer {
            from: bidder,
            to: id.escrow(),
            amount: funds,
        }])?;
        tracing::debug!(bid = %id, %bidder, auction = %request.auction, %funds, "packaged bid");
        Ok(Self {
            id,
            bidder,
            request,
            funds,
        })
    }

    pub fn id(&self) -> BidId {
        self.id
    }

    pub fn bidder(&self) -> Address {
        self.bidder
    }

    pub fn auction(&self) -> AuctionId {
        self.request.auction
    }

    pub fn quantity(&self) -> u64 {
        self.request.quantity
    }

    pub fn current_id(&self) -> Option<u64> {
        self.request.current_id
    }

    pub fn funds(&self) -> U256 {
        self.funds
    }

    /// Returns the escrowed funds to the bidder, consuming a bid that was
    /// refused by the settlement engine. On failure the bid is handed back.
    pub fn withdraw(self, ledger: &dyn Ledger) -> Result<(), (Self, LedgerError)> {
        if let Err(err) = ledger.apply(&[self.refund()]) {
            return Err((self, err));
        }
        tracing::debug!(bid = %self.id, bidder = %self.bidder, funds = %self.funds, "withdrew bid");
        Ok(())
    }

    /// The transfer returning the funds to the bidder.
    pub(crate) fn refund(&self) -> Transfer {
        Transfer {
            from: self.id.escrow(),
            to: self.bidder,
            amount: self.funds,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            boundary::{MockIdentityService, MockLedger},
            infra::{InMemoryLedger, SequentialIds},
        },
        testlib::identities::*,
    };

    #[test]
    fn discrete_requests_name_their_last_unit() {
        let request = Request::discrete(AuctionId(AUCTION), 0, 2);
        assert_eq!(request.current_id, Some(1));
        let request = Request::discrete(AuctionId(AUCTION), 5, 2);
        assert_eq!(request.current_id, Some(6));
        let request = Request::discrete(AuctionId(AUCTION), 0, 0);
        assert_eq!(request.current_id, None);
    }

    #[test]
    fn packaging_escrows_the_funds() {
        let bid_id = Address::repeat_byte(0xb1);
        let mut ids = MockIdentityService::new();
        ids.expect_fresh().return_const(bid_id);
        let mut ledger = MockLedger::new();
        ledger
            .expect_apply()
            .withf(move |transfers| {
                transfers
                    == [Transfer {
                        from: ALICE,
                        to: bid_id,
                        amount: U256::from(10),
                    }]
            })
            .times(1)
            .returning(|_| Ok(()));

        let request = Request::continuous(AuctionId(AUCTION), 3);
        let bid = Bid::package(&ids, &ledger, ALICE, request, U256::from(10)).unwrap();
        assert_eq!(bid.id(), BidId(bid_id));
        assert_eq!(bid.bidder(), ALICE);
        assert_eq!(bid.auction(), AuctionId(AUCTION));
        assert_eq!(bid.quantity(), 3);
        assert_eq!(bid.current_id(), None);
        assert_eq!(bid.funds(), U256::from(10));
        assert_eq!(
            bid.refund(),
            Transfer {
                from: bid_id,
                to: ALICE,
                amount: U256::from(10),
            }
        );
    }

    #[test]
    fn packaging_fails_without_funds() {
        let mut ids = MockIdentityService::new();
        ids.expect_fresh().return_const(Address::repeat_byte(0xb1));
        let mut ledger = MockLedger::new();
        ledger.expect_apply().returning(|_| {
            Err(LedgerError::InsufficientFunds {
                account: ALICE,
                available: U256::ZERO,
                required: U256::from(10),
            })
        });

        let request = Request::continuous(AuctionId(AUCTION), 3);
        let result = Bid::package(&ids, &ledger, ALICE, request, U256::from(10));
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds { account, .. }) if account == ALICE
        ));
    }

    #[test]
    fn withdrawing_returns_the_funds() {
        let ledger = InMemoryLedger::default();
        ledger.deposit(ALICE, U256::from(5000)).unwrap();
        let request = Request::discrete(AuctionId(AUCTION), 7, 1);
        let bid = Bid::package(
            &SequentialIds::default(),
            &ledger,
            ALICE,
            request,
            U256::from(3000),
        )
        .unwrap();
        let escrow = bid.id().escrow();
        assert_eq!(ledger.balance(ALICE), U256::from(2000));

        bid.withdraw(&ledger).unwrap();

        assert_eq!(ledger.balance(ALICE), U256::from(5000));
        assert_eq!(ledger.balance(escrow), U256::ZERO);
    }

    #[test]
    fn failed_withdrawal_hands_the_bid_back() {
        let mut ids = MockIdentityService::new();
        ids.expect_fresh().return_const(Address::repeat_byte(0xb1));
        let mut ledger = MockLedger::new();
        ledger.expect_apply().times(1).returning(|_| Ok(()));
        let request = Request::continuous(AuctionId(AUCTION), 1);
        let bid = Bid::package(&ids, &ledger, ALICE, request, U256::from(10)).unwrap();

        let mut frozen = MockLedger::new();
        frozen
            .expect_apply()
            .times(1)
            .returning(|_| Err(LedgerError::Overflow(ALICE)));
        let (bid, err) = bid.withdraw(&frozen).unwrap_err();
        assert_eq!(bid.id(), BidId(Address::repeat_byte(0xb1)));
        assert_eq!(err, LedgerError::Overflow(ALICE));
    }
}
