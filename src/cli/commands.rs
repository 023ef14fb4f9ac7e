use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "chalkchain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "keygen", about = "Generate a keypair on the production curve")]
    Keygen,
    #[command(
        name = "demo",
        about = "Run a two-user sign/mine/append scenario and save the chain"
    )]
    Demo {
        #[arg(long, default_value_t = 2, help = "Leading-zero mining difficulty")]
        difficulty: usize,
        #[arg(long, default_value_t = 100_000, help = "Proof-of-work iteration budget")]
        max_iterations: u64,
        #[arg(long, help = "Chain file to write (defaults to the configured location)")]
        output: Option<String>,
    },
    #[command(name = "validatechain", about = "Validate a saved chain file")]
    Validatechain {
        #[arg(help = "Path to the chain JSON file")]
        path: String,
    },
}
