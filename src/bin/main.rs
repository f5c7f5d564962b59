#![forbid(unsafe_code)]

use colored::*;

fn main() {
    println!("{}", "ChainLab CLI".bright_cyan().bold());
    println!("{}", "------------".bright_cyan());
    println!();
    println!(
        "{}",
        "This is the main entry point, but all functionality lives in separate binaries.".yellow()
    );
    println!(
        "{}",
        "Use 'cargo run --bin <binary_name>' to run a specific command.".yellow()
    );
    println!();
    println!("{}", "Available binaries:".bright_green().underline());
    println!("  - {}  candidate ballot", "lab-voting".bright_white());
    println!("  - {}  one-time record registration", "lab-registry".bright_white());
    println!("  - {}  threshold eligibility checks", "lab-eligibility".bright_white());
    println!("  - {}  block hash verification", "lab-verify-block".bright_white());
    println!();
    println!("{}", "Example:".bright_green().underline());
    println!("{}", "  cargo run --bin lab-voting -- --as admin add Alice".italic());
}
