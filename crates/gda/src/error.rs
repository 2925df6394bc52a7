use crate::{
    boundary::{CustodyError, LedgerError},
    primitives::{Address, AuctionId},
};

/// Every way an auction operation can fail.
///
/// Failures never mutate the auction and never move funds, with the exception
/// of [`Error::ProceedsUnpaid`]. Callers decide based on the kind whether to
/// resubmit, alert or give up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("bid targets auction {bid} but was submitted to auction {auction}")]
    WrongAuction { auction: AuctionId, bid: AuctionId },
    #[error("requested quantity is zero or not the next unsold block")]
    InvalidQuantity,
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    #[error("exponential precision must be at least one term")]
    InvalidPrecision,
    #[error("current time lies before the auction's reference time")]
    InvalidTime,
    #[error("auction {0} is already closed")]
    AuctionAlreadyClosed(AuctionId),
    #[error("auction {0} does not exist")]
    UnknownAuction(AuctionId),
    #[error("{caller} is not the auctioneer")]
    Unauthorized { caller: Address },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Custody(#[from] CustodyError),
    /// The asset of the auction was released but paying the owner failed.
    /// The proceeds are still held by the auction's escrow and closing the
    /// auction again retries the payment.
    #[error("proceeds of auction {auction} could not be paid: {error}")]
    ProceedsUnpaid {
        auction: AuctionId,
        error: LedgerError,
    },
}

impl From<number::Error> for Error {
    fn from(err: number::Error) -> Self {
        match err {
            number::Error::InvalidPrecision => Self::InvalidPrecision,
            number::Error::ArithmeticOverflow => Self::ArithmeticOverflow,
        }
    }
}

impl Error {
    /// Short machine friendly name used for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WrongAuction { .. } => "wrong_auction",
            Self::InvalidQuantity => "invalid_quantity",
            Self::DivisionByZero => "division_by_zero",
            Self::ArithmeticOverflow => "arithmetic_overflow",
            Self::InvalidPrecision => "invalid_precision",
            Self::InvalidTime => "invalid_time",
            Self::AuctionAlreadyClosed(_) => "auction_already_closed",
            Self::UnknownAuction(_) => "unknown_auction",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Ledger(_) => "ledger",
            Self::Custody(_) => "custody",
            Self::ProceedsUnpaid { .. } => "proceeds_unpaid",
        }
    }
}
