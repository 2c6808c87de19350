use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Print Prometheus metrics before exiting
    #[arg(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the current token prices and which source they came from
    Prices,

    /// Convert an amount from one token to another
    Quote {
        /// Symbol of the token being sold
        #[arg(long)]
        from: String,

        /// Symbol of the token being bought
        #[arg(long)]
        to: String,

        /// Amount to convert, in token units unless --from-usd is set
        #[arg(long)]
        amount: String,

        /// Treat the amount as a USD value
        #[arg(long)]
        from_usd: bool,

        /// Show the result as a USD value
        #[arg(long)]
        to_usd: bool,
    },

    /// Print every price update until interrupted
    Watch,
}
