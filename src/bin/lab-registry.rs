#![forbid(unsafe_code)]
//! One-time record registration from the command line

use chainlab::cli::{init_logging, load_store_from_config, REGISTRY_KEY};
use chainlab::error::LabError;
use chainlab::identity::resolve;
use chainlab::registry::{fields, FieldValue, Registry, RegistryMode};
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
    /// Registers a student record
    Register {
        name: String,
        age: u64,
        /// Target identity; required when the registry is admin-managed
        #[arg(long)]
        target: Option<String>,
    },
    /// Shows the record of an identity
    Show {
        identity: String,
    },
    /// Lists every registered record
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (config, db) = load_store_from_config()?;
    let admin = config.admin_identity();
    let mode = config.registry.mode;
    let caller = resolve(&cli.caller);

    match &cli.command {
        Commands::Register { name, age, target } => {
            let record = fields([
                ("name", FieldValue::from(name.as_str())),
                ("age", FieldValue::from(*age)),
            ]);
            let target = target.as_deref().map(resolve);
            let owner = Registry::update_stored(&db, REGISTRY_KEY, admin, mode, |registry| {
                match registry.mode() {
                    RegistryMode::SelfService => {
                        registry.register(caller, record)?;
                        Ok(caller)
                    }
                    RegistryMode::AdminManaged => {
                        let target = target.ok_or_else(|| {
                            LabError::InvalidIdentity(
                                "--target is required for an admin-managed registry".to_string(),
                            )
                        })?;
                        registry.register_for(caller, target, record)?;
                        Ok(target)
                    }
                }
            })?;
            info!("registered {}", owner);
            println!("{} Registered {}", "✅".green(), owner.to_hex().bright_yellow());
        }
        Commands::Show { identity } => {
            let registry = Registry::load_or_new(&db, REGISTRY_KEY, admin, mode)?;
            let record = registry.get_record(&resolve(identity));
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::List => {
            let records = Registry::load_or_new(&db, REGISTRY_KEY, admin, mode)?.records();
            if records.is_empty() {
                println!("{}", "No records yet.".yellow());
            }
            for record in records {
                let name = record
                    .field("name")
                    .and_then(|v| v.as_text())
                    .unwrap_or("");
                let age = record.field("age").and_then(|v| v.as_uint()).unwrap_or(0);
                println!(
                    "{} {}  {} ({})",
                    "•".bright_yellow(),
                    record.owner.to_hex().bright_green(),
                    name,
                    age
                );
            }
        }
    }

    Ok(())
}
