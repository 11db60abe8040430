//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use shelfbench_core::{library_schema, EntityKind, Error, Result, Variant};

use crate::harness::{first_author_id, reset, time_variant, BenchContext};

/// Default iteration count for `run`.
pub const DEFAULT_ITERATIONS: usize = 10;

/// Command-line arguments for the harness.
#[derive(Parser, Debug)]
#[command(name = "shelfbench")]
#[command(version, about = "Tracking and split-query benchmark harness", long_about = None)]
pub struct Args {
    /// Path to appsettings.json. Defaults to the executable's directory,
    /// then the working directory.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create the schema and seed it if the Book table is empty.
    Seed,
    /// Compare row counts and parent references against the configured volumes.
    Verify,
    /// Time one query variant.
    Run {
        /// without_split_query, with_split_query, without_no_tracking or with_no_tracking.
        #[arg(short, long, value_parser = parse_variant)]
        variant: Variant,

        #[arg(short, long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: usize,
    },
    /// Delete every author and, through cascading deletes, everything else.
    Reset,
}

fn parse_variant(s: &str) -> std::result::Result<Variant, String> {
    s.parse::<Variant>().map_err(|e| e.to_string())
}

impl Args {
    /// Execute the selected command.
    pub fn execute(self) -> Result<()> {
        let ctx = BenchContext::load(self.config.as_deref())?;
        let mut session = ctx.session()?;

        match self.command {
            Command::Seed => {
                let report = ctx.prepare(&mut session)?;
                if report.skipped {
                    println!("database already seeded");
                } else {
                    for kind in EntityKind::ALL {
                        println!("{:<16} {:>12}", kind.name(), report.rows_for(kind));
                    }
                    println!(
                        "{} rows in {} batches, {:.2?} ({:.0} rows/s)",
                        report.total_rows(),
                        report.batches,
                        report.elapsed,
                        report.rows_per_second()
                    );
                }
            }
            Command::Verify => {
                session.store().apply_schema(&library_schema())?;
                let report = ctx.verify(&mut session)?;
                for check in &report.checks {
                    println!(
                        "{:<16} {:>12} / {:<12} orphans={} invalid={} {}",
                        check.kind.name(),
                        check.actual,
                        check.expected,
                        check.orphans,
                        check.invalid_values,
                        if check.is_ok() { "ok" } else { "MISMATCH" }
                    );
                }
                if !report.is_consistent() {
                    return Err(Error::InvalidData(format!(
                        "{} tables failed verification",
                        report.failures().count()
                    )));
                }
            }
            Command::Run {
                variant,
                iterations,
            } => {
                ctx.prepare(&mut session)?;
                let author_id = first_author_id(&mut session)?;
                let stats = time_variant(&mut session, variant, author_id, iterations)?;
                println!(
                    "{variant}: {iterations} iterations, {} entities, mean {:.2?}, min {:.2?}, max {:.2?}",
                    stats.entities,
                    stats.mean(),
                    stats.min,
                    stats.max
                );
            }
            Command::Reset => {
                session.store().apply_schema(&library_schema())?;
                let deleted = reset(&mut session)?;
                println!("deleted {deleted} authors and their descendants");
            }
        }
        Ok(())
    }
}
