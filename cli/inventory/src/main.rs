//! inventory CLI
//!
//! Bulk-loads object-store metadata into an inventory table, keeps it current
//! from change notifications, and builds access-classification queries.

use anyhow::Result;
use clap::Parser;
use inv_cli_common::{format_number, init_logging, load_config, render_config, resolve_log_level};

mod args;
mod run;

use args::Cli;
use run::Outcome;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config = load_config(&args.config, &run::required_sections(&args.command))?;

    // Initialize logging (to stderr, so stdout is clean for `cat` and `query`)
    let (level, source) = resolve_log_level(args.log_level, config.runtime.log_level.as_deref())?;
    init_logging(level)?;
    eprintln!("Log level is {level}, set by {source}");
    eprintln!("Configuration ({}):", args.config.display());
    eprintln!("{}", render_config(&config)?);

    let outcome = run::execute(args.command, &config).await?;

    report(&outcome);

    if outcome.is_partial_failure() {
        std::process::exit(4); // Partial failure
    }

    Ok(())
}

/// Print the run summary to stderr.
fn report(outcome: &Outcome) {
    eprintln!();
    match outcome {
        Outcome::Load(listing) | Outcome::Cat(listing) => {
            eprintln!("Listing completed:");
            for (bucket, count) in &listing.buckets {
                eprintln!("  {bucket}: {} objects", format_number(*count));
            }
            eprintln!("  Total objects:   {}", format_number(listing.total()));
            if listing.failed_pages > 0 {
                eprintln!("  Failed pages:    {}", listing.failed_pages);
            }
            for error in &listing.errors {
                eprintln!("  Error: {error}");
            }
        }
        Outcome::Listen(listen) => {
            eprintln!("Listener stopped:");
            eprintln!("  Acked:           {}", format_number(listen.acked));
            eprintln!("  Rejected:        {}", format_number(listen.rejected));
            eprintln!("  Flushes:         {}", listen.flushes);
        }
        Outcome::Query { kind, executed } => match executed {
            Some(destination) => eprintln!("Wrote {kind} query results to {destination}"),
            None => eprintln!("Printed {kind} query"),
        },
    }
}
