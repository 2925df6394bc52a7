//! Well-known identities used throughout the tests.

use alloy::primitives::{Address, address};

/// Identity allowed to settle bids and close auctions.
pub const AUCTIONEER: Address = address!("0xa0c7100eeea0c7100eeea0c7100eeea0c7100eee");

/// Original owner of the auctioned asset.
pub const OWNER: Address = address!("0x0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e");

/// Identity of the auction in tests that only need a single one.
pub const AUCTION: Address = address!("0xa7c10a7c10a7c10a7c10a7c10a7c10a7c10a7c10");

/// Another auction, used to provoke mismatched bids.
pub const OTHER_AUCTION: Address = address!("0xa7c20a7c20a7c20a7c20a7c20a7c20a7c20a7c20");

pub const ALICE: Address = address!("0xa11ce00000000000000000000000000000000001");
pub const BOB: Address = address!("0xb0b0000000000000000000000000000000000002");
pub const CAROL: Address = address!("0xca20100000000000000000000000000000000003");
