//! Warren — concurrent hidden-path discovery scanner.
//!
//! Usage:
//!   warren -u http://example.com -w wordlists/common.txt --bypass-403
//!   warren --cidr 10.0.0.0/24 --port 8080 --scheme http --format json

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use warren::cli::{output, Cli};
use warren::Orchestrator;

#[tokio::main]
async fn main() {
    // Initialise logging (RUST_LOG=debug etc.)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let format = config.format;

    let orchestrator = match Orchestrator::new(config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // Configuration errors (wordlist, CIDR, login) are fatal; an
    // unreachable target comes back as an empty result set instead.
    let completed = match orchestrator.run().await {
        Ok(completed) => completed,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    for scan in &completed {
        if let Err(e) = output::write_results(&scan.hits, &scan.dest, format) {
            eprintln!("Error: cannot write results to {}: {e}", scan.dest.display());
            std::process::exit(1);
        }
        println!(
            "{} Scan complete on {}. {} paths found in {:.2}s.",
            "[+]".green(),
            scan.target,
            scan.hits.len(),
            scan.report.duration_ms as f64 / 1000.0
        );
        println!("{} Results saved to {}", "[+]".green(), scan.dest.display());
    }
}
