//! Hands bids from bidders to the auctioneer.
//!
//! The [`Auctioneer`] runs as a background task that owns the receiving end of
//! a mailbox and is the only party settling bids against the auctions it is
//! responsible for. Bidders talk to it through cloneable [`BidRelay`] handles
//! and get every outcome back over a oneshot channel.

use {
    crate::{
        bid::Bid,
        error::Error,
        house::AuctionHouse,
        lifecycle::Closed,
        primitives::{Address, AuctionId},
        settlement::{Outcome, Refused},
    },
    std::sync::Arc,
    tokio::{
        sync::{mpsc, oneshot},
        task::JoinHandle,
    },
    tracing::Instrument as _,
};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Refused(#[from] Refused),
    #[error("auction could not be closed: {0}")]
    Rejected(Error),
    /// The auctioneer task is gone. Carries the bid back if it never reached
    /// the auctioneer.
    #[error("auctioneer stopped")]
    Stopped(Option<Bid>),
}

impl RelayError {
    /// The bid that was handed back, if any. Its funds are still escrowed.
    pub fn into_bid(self) -> Option<Bid> {
        match self {
            Self::Refused(refused) => Some(refused.bid),
            Self::Rejected(_) | Self::Stopped(None) => None,
            Self::Stopped(Some(bid)) => Some(bid),
        }
    }
}

enum Command {
    Settle {
        auction: AuctionId,
        bid: Bid,
        reply: oneshot::Sender<Result<Outcome, Refused>>,
    },
    End {
        auction: AuctionId,
        reply: oneshot::Sender<Result<Closed, Error>>,
    },
}

/// The identity settling bids, together with the auctions it works on.
pub struct Auctioneer<A> {
    identity: Address,
    house: Arc<AuctionHouse<A>>,
}

impl<A: Send + 'static> Auctioneer<A> {
    pub fn new(identity: Address, house: Arc<AuctionHouse<A>>) -> Self {
        Self { identity, house }
    }

    /// Starts the auctioneer task. The task runs until every [`BidRelay`]
    /// handle has been dropped.
    pub fn spawn(self, capacity: usize) -> (BidRelay, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let span = tracing::info_span!("auctioneer", identity = %self.identity);
        let handle = tokio::task::spawn(self.run(receiver).instrument(span));
        (BidRelay { sender }, handle)
    }

    async fn run(self, mut commands: mpsc::Receiver<Command>) {
        tracing::info!("auctioneer started");
        while let Some(command) = commands.recv().await {
            match command {
                Command::Settle {
                    auction,
                    bid,
                    reply,
                } => {
                    let result = self.house.update(self.identity, auction, bid);
                    if let Err(Err(refused)) = reply.send(result) {
                        tracing::warn!(bid = %refused.bid.id(), err = %refused.error, "refused bid was not collected");
                        if let Err((bid, err)) =
                            refused.bid.withdraw(self.house.infra().ledger.as_ref())
                        {
                            tracing::error!(bid = %bid.id(), ?err, "failed to withdraw uncollected bid");
                        }
                    }
                }
                Command::End { auction, reply } => {
                    let _ = reply.send(self.house.end(self.identity, auction));
                }
            }
        }
        tracing::info!("auctioneer stopped");
    }
}

/// Handle for submitting bids to an [`Auctioneer`].
#[derive(Clone, Debug)]
pub struct BidRelay {
    sender: mpsc::Sender<Command>,
}

impl BidRelay {
    /// Submits `bid` for settlement against `auction` and waits for the
    /// outcome.
    pub async fn submit(&self, auction: AuctionId, bid: Bid) -> Result<Outcome, RelayError> {
        let (reply, outcome) = oneshot::channel();
        let command = Command::Settle {
            auction,
            bid,
            reply,
        };
        if let Err(mpsc::error::SendError(command)) = self.sender.send(command).await {
            let Command::Settle { bid, .. } = command else {
                unreachable!("sent a settle command");
            };
            return Err(RelayError::Stopped(Some(bid)));
        }
        match outcome.await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RelayError::Stopped(None)),
        }
    }

    /// Asks the auctioneer to close `auction`.
    pub async fn end(&self, auction: AuctionId) -> Result<Closed, RelayError> {
        let (reply, closed) = oneshot::channel();
        self.sender
            .send(Command::End { auction, reply })
            .await
            .map_err(|_| RelayError::Stopped(None))?;
        closed
            .await
            .map_err(|_| RelayError::Stopped(None))?
            .map_err(RelayError::Rejected)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Settle { auction, bid, .. } => f
                .debug_struct("Settle")
                .field("auction", auction)
                .field("bid", &bid.id())
                .finish(),
            Self::End { auction, .. } => f.debug_struct("End").field("auction", auction).finish(),
        }
    }
}
