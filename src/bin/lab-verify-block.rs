#![forbid(unsafe_code)]
//! Verify block hashes stored as JSON

use chainlab::cli::init_logging;
use chainlab::integrity::{validate_blocks, validate_chain, ChainedBlock};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file holding one block or an array of blocks
    file: PathBuf,

    /// Also check indices and previous-hash links across the array
    #[arg(long)]
    chain: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let contents = std::fs::read_to_string(&cli.file)
        .map_err(|e| format!("Failed to read {}: {}", cli.file.display(), e))?;
    let value: serde_json::Value = serde_json::from_str(&contents)?;

    let blocks: Vec<ChainedBlock> = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    debug!("loaded {} block(s) from {}", blocks.len(), cli.file.display());

    let verdicts = validate_blocks(&blocks);
    for (block, ok) in blocks.iter().zip(&verdicts) {
        if *ok {
            println!("{} block {} valid", "✅".green(), block.index);
        } else {
            warn!("block {} hash mismatch", block.index);
            println!(
                "{} block {} INVALID (expected {})",
                "❌".red(),
                block.index,
                block.expected_hash().bright_yellow()
            );
        }
    }

    let mut failed = verdicts.iter().any(|ok| !ok);

    if cli.chain {
        match validate_chain(&blocks) {
            Ok(()) => println!("{}", "Chain links are consistent.".bright_green()),
            Err(e) => {
                failed = true;
                println!("{} {}", "Chain check failed:".red(), e);
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
