//! Registry of all auctions, addressed by identity.
//!
//! Every auction lives behind its own lock. Settling a bid or closing an
//! auction holds that lock for the whole operation, so operations on the same
//! auction are applied one after another in some total order while different
//! auctions are settled in parallel.

use {
    crate::{
        auction::{Auction, HighestBid, Parameters},
        bid::Bid,
        boundary::{AssetCustody, Clock, IdentityService, Ledger},
        error::Error,
        lifecycle::{self, Closed, Unclosed},
        metrics,
        pricing,
        primitives::{Address, AuctionId, U256},
        settlement::{self, Context, Outcome, Refused},
    },
    dashmap::DashMap,
    std::sync::{Arc, Mutex},
};

/// Collaborators the house depends on.
pub struct Infra<A> {
    pub ids: Arc<dyn IdentityService>,
    pub ledger: Arc<dyn Ledger>,
    pub clock: Arc<dyn Clock>,
    pub custody: Arc<dyn AssetCustody<A>>,
}

impl<A> Clone for Infra<A> {
    fn clone(&self) -> Self {
        Self {
            ids: self.ids.clone(),
            ledger: self.ledger.clone(),
            clock: self.clock.clone(),
            custody: self.custody.clone(),
        }
    }
}

struct Entry<A> {
    /// Checked before the slot is looked at.
    auctioneer: Address,
    slot: Mutex<Slot<A>>,
}

enum Slot<A> {
    Open(Auction<A>),
    /// The asset was released but the owner still waits for the proceeds.
    Unpaid(Closed),
    Closed,
}

impl<A> Entry<A> {
    fn authorize(&self, caller: Address) -> Result<(), Error> {
        if caller != self.auctioneer {
            return Err(Error::Unauthorized { caller });
        }
        Ok(())
    }
}

pub struct AuctionHouse<A> {
    auctions: DashMap<AuctionId, Arc<Entry<A>>>,
    infra: Infra<A>,
    precision: u32,
}

impl<A: Send + 'static> AuctionHouse<A> {
    pub fn new(infra: Infra<A>) -> Self {
        Self::with_precision(infra, pricing::DEFAULT_PRECISION)
    }

    /// Uses `precision` Taylor terms for every exponential.
    pub fn with_precision(infra: Infra<A>, precision: u32) -> Self {
        Self {
            auctions: DashMap::new(),
            infra,
            precision,
        }
    }

    pub fn infra(&self) -> &Infra<A> {
        &self.infra
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Opens a new auction of `asset` on behalf of `owner`, settled by
    /// `auctioneer`.
    pub fn create(
        &self,
        auctioneer: Address,
        owner: Address,
        asset: A,
        parameters: Parameters,
    ) -> Result<AuctionId, Error> {
        let auction = lifecycle::create(
            self.infra.ids.as_ref(),
            self.infra.clock.as_ref(),
            auctioneer,
            owner,
            asset,
            parameters,
        )?;
        let id = auction.id();
        self.auctions.insert(
            id,
            Arc::new(Entry {
                auctioneer,
                slot: Mutex::new(Slot::Open(auction)),
            }),
        );
        metrics::get().auctions.with_label_values(&["created"]).inc();
        Ok(id)
    }

    /// Settles `bid` against the auction `id` on behalf of `caller`.
    pub fn update(&self, caller: Address, id: AuctionId, bid: Bid) -> Result<Outcome, Refused> {
        let entry = match self.entry(id) {
            Ok(entry) => entry,
            Err(error) => return Err(Refused { bid, error }),
        };
        if let Err(error) = entry.authorize(caller) {
            return Err(Refused { bid, error });
        }
        let mut slot = entry.slot.lock().unwrap();
        let Slot::Open(auction) = &mut *slot else {
            return Err(Refused {
                bid,
                error: Error::AuctionAlreadyClosed(id),
            });
        };
        let context = Context {
            ledger: self.infra.ledger.as_ref(),
            now: self.infra.clock.now(),
            precision: self.precision,
        };
        settlement::update(auction, caller, bid, &context)
    }

    /// Closes the auction `id` on behalf of `caller`. Closing is final; every
    /// later attempt fails with [`Error::AuctionAlreadyClosed`]. An auction
    /// whose asset was released without paying the owner stays pending, and
    /// closing it again retries the payment.
    pub fn end(&self, caller: Address, id: AuctionId) -> Result<Closed, Error> {
        let entry = self.entry(id)?;
        entry.authorize(caller)?;
        let mut slot = entry.slot.lock().unwrap();
        let result = match std::mem::replace(&mut *slot, Slot::Closed) {
            Slot::Open(auction) => lifecycle::end(
                auction,
                caller,
                self.infra.ledger.as_ref(),
                self.infra.custody.as_ref(),
            ),
            Slot::Unpaid(closed) => match lifecycle::pay(&closed, self.infra.ledger.as_ref()) {
                Ok(()) => Ok(closed),
                Err(error) => Err(Unclosed::Unpaid { closed, error }),
            },
            Slot::Closed => return Err(Error::AuctionAlreadyClosed(id)),
        };
        match result {
            Ok(closed) => {
                metrics::get().auctions.with_label_values(&["closed"]).inc();
                Ok(closed)
            }
            Err(unclosed) => {
                tracing::warn!(auction = %id, %caller, err = %unclosed.error(), "failed to close auction");
                let (restored, error) = match unclosed {
                    Unclosed::Open { auction, error } => (Slot::Open(auction), error),
                    Unclosed::Unpaid { closed, error } => (Slot::Unpaid(closed), error),
                };
                *slot = restored;
                Err(error)
            }
        }
    }

    /// Current price of `quantity` units of the auction `id`.
    pub fn quote(&self, id: AuctionId, quantity: u64) -> Result<U256, Error> {
        let now = self.infra.clock.now();
        self.with_open(id, |auction| auction.quote(quantity, now, self.precision))?
    }

    /// Current highest bid of the auction `id`.
    pub fn highest(&self, id: AuctionId) -> Result<Option<HighestBid>, Error> {
        self.with_open(id, |auction| auction.highest())
    }

    /// Identities of all auctions that are still open.
    pub fn open_auctions(&self) -> Vec<AuctionId> {
        let mut ids: Vec<_> = self
            .auctions
            .iter()
            .filter(|entry| matches!(*entry.value().slot.lock().unwrap(), Slot::Open(_)))
            .map(|entry| *entry.key())
            .collect();
        ids.sort();
        ids
    }

    fn with_open<T>(&self, id: AuctionId, f: impl FnOnce(&Auction<A>) -> T) -> Result<T, Error> {
        let entry = self.entry(id)?;
        let slot = entry.slot.lock().unwrap();
        match &*slot {
            Slot::Open(auction) => Ok(f(auction)),
            Slot::Unpaid(_) | Slot::Closed => Err(Error::AuctionAlreadyClosed(id)),
        }
    }

    fn entry(&self, id: AuctionId) -> Result<Arc<Entry<A>>, Error> {
        // Clone the handle so the map shard is not locked while the auction is.
        self.auctions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(Error::UnknownAuction(id))
    }
}
