use {
    gda::U256,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
    },
};

#[derive(Debug, clap::Parser)]
#[clap(version, about = "Quotes and simulates gradual dutch auctions")]
pub struct Arguments {
    #[clap(long, env, default_value = "warn,auctioneer=info,gda=info")]
    pub log_filter: String,

    /// At which log level logs should be printed to stderr instead of stdout.
    #[clap(long, env)]
    pub log_stderr_threshold: Option<tracing::Level>,

    /// Whether to use JSON format for the logs.
    #[clap(long, env, default_value = "false")]
    pub use_json_logs: bool,

    /// Number of Taylor series terms used to approximate exponentials.
    #[clap(long, env, default_value = "10")]
    pub precision: u32,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Prints the price of the next units of a discrete auction.
    QuoteDiscrete(Discrete),
    /// Prints the price of a quantity of a continuous auction.
    QuoteContinuous(Continuous),
    /// Replays a scenario against in-memory auctions and prints the results.
    Simulate {
        /// Path to the scenario, a TOML file.
        #[clap(long, env)]
        scenario: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
pub struct Discrete {
    #[clap(long)]
    pub initial_price: U256,

    #[clap(long)]
    pub scale_factor: U256,

    #[clap(long, default_value = "0")]
    pub decay_constant: U256,

    /// Units sold before the quoted ones.
    #[clap(long, default_value = "0")]
    pub num_sold: u64,

    #[clap(long, default_value = "1")]
    pub quantity: u64,

    /// Seconds since the auction started.
    #[clap(long, default_value = "0")]
    pub elapsed: u64,
}

#[derive(Debug, clap::Args)]
pub struct Continuous {
    #[clap(long)]
    pub initial_price: U256,

    #[clap(long)]
    pub decay_constant: U256,

    /// Units emitted per second.
    #[clap(long)]
    pub emission_rate: U256,

    #[clap(long, default_value = "1")]
    pub quantity: u64,

    /// Seconds since the last unit became available.
    #[clap(long, default_value = "0")]
    pub elapsed: u64,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            use_json_logs,
            precision,
            command,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        display_option(f, "log_stderr_threshold", log_stderr_threshold)?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        writeln!(f, "precision: {precision}")?;
        write!(f, "{command}")
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuoteDiscrete(Discrete {
                initial_price,
                scale_factor,
                decay_constant,
                num_sold,
                quantity,
                elapsed,
            }) => {
                writeln!(f, "command: quote-discrete")?;
                writeln!(f, "initial_price: {initial_price}")?;
                writeln!(f, "scale_factor: {scale_factor}")?;
                writeln!(f, "decay_constant: {decay_constant}")?;
                writeln!(f, "num_sold: {num_sold}")?;
                writeln!(f, "quantity: {quantity}")?;
                writeln!(f, "elapsed: {elapsed}")
            }
            Self::QuoteContinuous(Continuous {
                initial_price,
                decay_constant,
                emission_rate,
                quantity,
                elapsed,
            }) => {
                writeln!(f, "command: quote-continuous")?;
                writeln!(f, "initial_price: {initial_price}")?;
                writeln!(f, "decay_constant: {decay_constant}")?;
                writeln!(f, "emission_rate: {emission_rate}")?;
                writeln!(f, "quantity: {quantity}")?;
                writeln!(f, "elapsed: {elapsed}")
            }
            Self::Simulate { scenario } => {
                writeln!(f, "command: simulate")?;
                writeln!(f, "scenario: {}", scenario.display())
            }
        }
    }
}

fn display_option(f: &mut Formatter<'_>, name: &str, option: &Option<impl Display>) -> fmt::Result {
    write!(f, "{name}: ")?;
    match option {
        Some(display) => writeln!(f, "{display}"),
        None => writeln!(f, "None"),
    }
}
