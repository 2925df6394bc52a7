use {
    crate::{
        arguments::{Arguments, Command, Continuous, Discrete},
        scenario::{self, Scenario, Step},
    },
    anyhow::{Context, Result},
    clap::Parser,
    gda::{
        Address,
        AuctionHouse,
        AuctionId,
        Auctioneer,
        Bid,
        Closed,
        Infra,
        Outcome,
        RelayError,
        Request,
        Timestamp,
        U256,
        boundary::{Clock, Ledger},
        infra::{InMemoryCustody, InMemoryLedger, ManualClock, SequentialIds},
        pricing,
    },
    serde::Serialize,
    serde_with::{DisplayFromStr, serde_as},
    std::{
        collections::{BTreeMap, HashMap},
        sync::Arc,
    },
};

pub async fn start(args: impl Iterator<Item = String>) -> Result<()> {
    let args = Arguments::parse_from(args);
    let obs_config = observe::Config::new(
        args.log_filter.as_str(),
        args.log_stderr_threshold,
        args.use_json_logs,
    );
    observe::tracing::initialize(&obs_config);
    tracing::info!("running auctioneer with validated arguments:\n{}", args);
    observe::metrics::setup_registry(Some("auctioneer".into()), None);
    run(args).await
}

pub async fn run(args: Arguments) -> Result<()> {
    match args.command {
        Command::QuoteDiscrete(discrete) => {
            println!("{}", quote_discrete(&discrete, args.precision)?);
        }
        Command::QuoteContinuous(continuous) => {
            println!("{}", quote_continuous(&continuous, args.precision)?);
        }
        Command::Simulate { scenario } => {
            let scenario = scenario::load(&scenario).await?;
            let report = simulate(scenario, args.precision).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            let metrics = observe::metrics::encode(observe::metrics::get_registry())
                .context("encoding metrics")?;
            println!("{metrics}");
        }
    }
    Ok(())
}

fn quote_discrete(args: &Discrete, precision: u32) -> Result<U256> {
    let pricing = pricing::Discrete {
        initial_price: args.initial_price,
        scale_factor: args.scale_factor,
        decay_constant: args.decay_constant,
    };
    pricing
        .price(args.num_sold, args.quantity, 0, args.elapsed, precision)
        .context("quoting discrete auction")
}

fn quote_continuous(args: &Continuous, precision: u32) -> Result<U256> {
    let pricing = pricing::Continuous {
        initial_price: args.initial_price,
        decay_constant: args.decay_constant,
        emission_rate: args.emission_rate,
    };
    pricing
        .price(args.quantity, 0, args.elapsed, precision)
        .context("quoting continuous auction")
}

/// What happened while replaying a scenario.
#[serde_as]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub steps: Vec<StepReport>,
    /// Final balances of all funded accounts and auction owners.
    #[serde_as(as = "BTreeMap<_, DisplayFromStr>")]
    pub balances: BTreeMap<Address, U256>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase", tag = "step")]
pub enum StepReport {
    #[serde(rename_all = "camelCase")]
    Bid {
        auction: String,
        bidder: Address,
        #[serde(skip_serializing_if = "Option::is_none")]
        outcome: Option<Outcome>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Advance { now: Timestamp },
    #[serde(rename_all = "camelCase")]
    End {
        auction: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        receipt: Option<Closed>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Replays `scenario` against in-memory collaborators. Invalid steps, like
/// bids the bidder can not pay for or refused bids, are reported and do not
/// stop the simulation. Refused bids are withdrawn right away.
pub async fn simulate(scenario: Scenario, precision: u32) -> Result<Report> {
    let ledger = Arc::new(InMemoryLedger::default());
    let custody = Arc::new(InMemoryCustody::default());
    let clock = Arc::new(ManualClock::new(scenario.start_time));
    let ids = Arc::new(SequentialIds::default());
    let house = Arc::new(AuctionHouse::with_precision(
        Infra {
            ids: ids.clone(),
            ledger: ledger.clone(),
            clock: clock.clone(),
            custody: custody.clone(),
        },
        precision,
    ));

    let mut accounts = Vec::new();
    for account in &scenario.accounts {
        ledger
            .deposit(account.address, account.balance)
            .with_context(|| format!("funding {}", account.address))?;
        accounts.push(account.address);
    }

    let mut auctions = HashMap::new();
    for auction in scenario.auctions {
        anyhow::ensure!(
            !auctions.contains_key(&auction.name),
            "duplicate auction {}",
            auction.name
        );
        custody.register(auction.name.clone(), auction.owner);
        let id = house
            .create(
                scenario.auctioneer,
                auction.owner,
                auction.name.clone(),
                auction.pricing.parameters(),
            )
            .with_context(|| format!("creating auction {}", auction.name))?;
        accounts.push(auction.owner);
        auctions.insert(auction.name, id);
    }
    let lookup = |name: &str| -> Result<AuctionId> {
        auctions
            .get(name)
            .copied()
            .with_context(|| format!("unknown auction {name}"))
    };

    let (relay, handle) = Auctioneer::new(scenario.auctioneer, house.clone()).spawn(16);
    let mut steps = Vec::new();
    for step in scenario.steps {
        let report = match step {
            Step::Bid {
                auction,
                bidder,
                quantity,
                first_unit,
                funds,
            } => {
                let id = lookup(&auction)?;
                let request = match first_unit {
                    Some(first_unit) => Request::discrete(id, first_unit, quantity),
                    None => Request::continuous(id, quantity),
                };
                let packaged =
                    Bid::package(ids.as_ref(), ledger.as_ref(), bidder, request, funds);
                let result = match packaged {
                    Ok(bid) => match relay.submit(id, bid).await {
                        Ok(outcome) => Ok(outcome),
                        Err(err) => Err(withdraw(err, ledger.as_ref())),
                    },
                    Err(err) => Err(err.to_string()),
                };
                tracing::debug!(%auction, %bidder, ?result, "simulated bid");
                let (outcome, error) = split(result);
                StepReport::Bid {
                    auction,
                    bidder,
                    outcome,
                    error,
                }
            }
            Step::Advance { seconds } => {
                clock.advance(seconds);
                StepReport::Advance { now: clock.now() }
            }
            Step::End { auction } => {
                let id = lookup(&auction)?;
                let result = relay.end(id).await.map_err(|err| err.to_string());
                let (receipt, error) = split(result);
                StepReport::End {
                    auction,
                    receipt,
                    error,
                }
            }
        };
        steps.push(report);
    }
    drop(relay);
    handle.await.context("auctioneer task failed")?;

    let balances = accounts
        .into_iter()
        .map(|account| (account, ledger.balance(account)))
        .collect();
    Ok(Report { steps, balances })
}

/// Returns the funds of a bid the relay handed back and describes what
/// happened.
fn withdraw(err: RelayError, ledger: &dyn Ledger) -> String {
    let message = err.to_string();
    match err.into_bid().map(|bid| bid.withdraw(ledger)) {
        Some(Err((bid, err))) => {
            tracing::error!(bid = %bid.id(), ?err, "failed to withdraw refused bid");
            format!("{message}; funds stay with bid {}", bid.id())
        }
        Some(Ok(())) => format!("{message}; funds withdrawn"),
        None => message,
    }
}

fn split<T>(result: Result<T, String>) -> (Option<T>, Option<String>) {
    match result {
        Ok(value) => (Some(value), None),
        Err(err) => (None, Some(err)),
    }
}
