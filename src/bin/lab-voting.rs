#![forbid(unsafe_code)]
//! Candidate ballot from the command line

use chainlab::cli::{init_logging, load_store_from_config, BALLOT_KEY};
use chainlab::identity::resolve;
use chainlab::voting::Ballot;
use clap::{Parser, Subcommand};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
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
    /// Adds a candidate (admin only)
    Add {
        /// Candidate name; duplicates are allowed
        name: String,
    },
    /// Casts the caller's single vote
    Vote {
        /// Candidate index as shown by `list`
        index: usize,
    },
    /// Lists candidates with their vote counts
    List,
    /// Shows whether an identity has voted
    Status {
        /// Identity to check (defaults to the caller)
        identity: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (config, db) = load_store_from_config()?;
    let admin = config.admin_identity();
    let caller = resolve(&cli.caller);

    match &cli.command {
        Commands::Add { name } => {
            let index = Ballot::update_stored(&db, BALLOT_KEY, admin, |ballot| {
                ballot.add_candidate(caller, name.clone())
            })?;
            info!("candidate {} added at index {}", name, index);
            println!("{} \"{}\" added as candidate {}", "✅".green(), name, index);
        }
        Commands::Vote { index } => {
            Ballot::update_stored(&db, BALLOT_KEY, admin, |ballot| ballot.vote(caller, *index))?;
            info!("vote recorded for candidate {}", index);
            println!("{} Vote cast for candidate {}", "🗳️".green(), index);
        }
        Commands::List => list(&Ballot::load_or_new(&db, BALLOT_KEY, admin)?),
        Commands::Status { identity } => {
            let ballot = Ballot::load_or_new(&db, BALLOT_KEY, admin)?;
            let who = identity.as_deref().map(resolve).unwrap_or(caller);
            if ballot.has_voted(&who) {
                println!("{} {} has voted", "✅".green(), who.to_hex().bright_yellow());
            } else {
                println!("{} {} has not voted", "❌".red(), who.to_hex().bright_yellow());
            }
        }
    }

    Ok(())
}

fn list(ballot: &Ballot) {
    let candidates = ballot.candidates();
    if candidates.is_empty() {
        println!("{}", "No candidates yet.".yellow());
        return;
    }

    let leaders = ballot.leaders();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Candidate", "Votes"]);

    for (i, candidate) in candidates.iter().enumerate() {
        let name = if leaders.contains(&i) {
            format!("{} 🏆", candidate.name)
        } else {
            candidate.name.clone()
        };
        table.add_row(vec![
            Cell::new(i),
            Cell::new(name),
            Cell::new(candidate.vote_count),
        ]);
    }

    println!("{table}");
    println!("Total votes: {}", ballot.total_votes().to_string().bright_green());
}
