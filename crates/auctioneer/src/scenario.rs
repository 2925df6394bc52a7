//! Scenario files replayed by the `simulate` command.
//!
//! A scenario funds a set of accounts, opens auctions and then runs a script
//! of steps against them. Amounts are decimal strings so they are not limited
//! to 64 bits.

use {
    anyhow::{Context, Result},
    gda::{Address, Parameters, Position, Timestamp, U256, pricing},
    serde::Deserialize,
    serde_with::{DisplayFromStr, serde_as},
    std::path::Path,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Scenario {
    /// Identity settling all bids and closing all auctions.
    pub auctioneer: Address,

    /// Time at which the simulation starts, in seconds.
    #[serde(default)]
    pub start_time: Timestamp,

    #[serde(default, rename = "account")]
    pub accounts: Vec<Account>,

    #[serde(default, rename = "auction")]
    pub auctions: Vec<Auction>,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Account {
    pub address: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub balance: U256,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Auction {
    /// Name of the sold asset. Steps refer to the auction by this name.
    pub name: String,
    pub owner: Address,
    pub pricing: Pricing,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Pricing {
    #[serde(rename_all = "kebab-case")]
    Discrete {
        #[serde_as(as = "DisplayFromStr")]
        initial_price: U256,
        #[serde_as(as = "DisplayFromStr")]
        scale_factor: U256,
        #[serde_as(as = "DisplayFromStr")]
        decay_constant: U256,
        /// First unsold unit of the series this auction continues.
        #[serde(default)]
        first_id: u64,
        #[serde(default)]
        num_sold: u64,
    },
    #[serde(rename_all = "kebab-case")]
    Continuous {
        #[serde_as(as = "DisplayFromStr")]
        initial_price: U256,
        #[serde_as(as = "DisplayFromStr")]
        decay_constant: U256,
        #[serde_as(as = "DisplayFromStr")]
        emission_rate: U256,
    },
}

impl Pricing {
    pub fn parameters(&self) -> Parameters {
        match *self {
            Self::Discrete {
                initial_price,
                scale_factor,
                decay_constant,
                first_id,
                num_sold,
            } => Parameters::Discrete {
                pricing: pricing::Discrete {
                    initial_price,
                    scale_factor,
                    decay_constant,
                },
                position: Position { first_id, num_sold },
            },
            Self::Continuous {
                initial_price,
                decay_constant,
                emission_rate,
            } => Parameters::continuous(pricing::Continuous {
                initial_price,
                decay_constant,
                emission_rate,
            }),
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "action")]
pub enum Step {
    /// Packages and submits a bid.
    #[serde(rename_all = "kebab-case")]
    Bid {
        auction: String,
        bidder: Address,
        quantity: u64,
        /// First requested unit. Required by discrete auctions.
        first_unit: Option<u64>,
        #[serde_as(as = "DisplayFromStr")]
        funds: U256,
    },
    /// Moves the clock forward.
    Advance { seconds: u64 },
    /// Closes an auction.
    End { auction: String },
}

/// Loads a scenario from a TOML file.
pub async fn load(path: &Path) -> Result<Scenario> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading scenario {}", path.display()))?;
    parse(&data).with_context(|| format!("parsing scenario {}", path.display()))
}

pub fn parse(data: &str) -> Result<Scenario> {
    Ok(toml::de::from_str(data)?)
}
