#![forbid(unsafe_code)]
//! Threshold eligibility checks from the command line

use chainlab::cli::{init_logging, load_store_from_config, ELIGIBILITY_KEY};
use chainlab::eligibility::EligibilityGate;
use chainlab::identity::resolve;
use clap::{Parser, Subcommand};
use colored::*;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Caller identity (label or 64-char hex)
    #[arg(long = "as", global = true, default_value = "admin")]
    caller: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Checks one or more values against the current threshold
    Check {
        #[arg(required = true)]
        values: Vec<u64>,
    },
    /// Replaces the threshold (admin only)
    Update { value: u64 },
    /// Prints the current threshold
    Show,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (config, db) = load_store_from_config()?;
    let admin = config.admin_identity();
    let min_age = config.eligibility.min_age;

    match &cli.command {
        Commands::Check { values } => {
            let gate = EligibilityGate::load_or_new(&db, ELIGIBILITY_KEY, admin, min_age)?;
            for value in values {
                if gate.check_eligibility(*value) {
                    println!("{} {} is eligible", "✅".green(), value);
                } else {
                    println!("{} {} is not eligible", "❌".red(), value);
                }
            }
        }
        Commands::Update { value } => {
            let caller = resolve(&cli.caller);
            EligibilityGate::update_stored(&db, ELIGIBILITY_KEY, admin, min_age, |gate| {
                gate.update_threshold(caller, *value)
            })?;
            info!("threshold updated to {}", value);
            println!("{} Minimum is now {}", "✅".green(), value);
        }
        Commands::Show => {
            let gate = EligibilityGate::load_or_new(&db, ELIGIBILITY_KEY, admin, min_age)?;
            println!("Minimum: {}", gate.threshold().to_string().bright_green());
        }
    }

    Ok(())
}
