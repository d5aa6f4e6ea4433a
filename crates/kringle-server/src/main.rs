//! Kringle command-line binary.
//!
//! # Usage
//!
//! ```bash
//! # Draw once registration closes
//! kringle draw --roster party.json --state party.cbor
//!
//! # Each giver looks up their own assignment
//! kringle reveal --roster party.json --state party.cbor --giver 3
//!
//! # Organizer checks progress
//! kringle status --roster party.json --state party.cbor
//! ```

use clap::Parser;
use kringle_server::{SystemEnv, cli::Cli};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let env = SystemEnv::new();
    let mut stdout = std::io::stdout().lock();

    kringle_server::cli::run(&args.command, &env, &mut stdout)?;

    Ok(())
}
