// Cryptax
// Written in 2024 by
//   Andrew Poelstra <tradetracker@wpsoftware.net>
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the CC0 Public Domain Dedication
// along with this software.
// If not, see <http://creativecommons.org/publicdomain/zero/1.0/>.
//

//! Cryptax
//!
//! Personal-use tool which turns a ledger of coin transactions into capital
//! gains, yearly income and mining economics reports
//!

pub mod config;
pub mod csv;
pub mod file;
pub mod logger;
pub mod report;
pub mod tax;
pub mod timemap;
pub mod transaction;
pub mod units;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use config::Configuration;
use report::OutputFiles;
use tax::CostBasisMethod;
use transaction::{read_ledger, Ledger};
use units::UtcTime;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute gains, income and mining reports for a ledger
    Process {
        /// Ledger CSV file
        #[arg(value_name = "LEDGER_CSV")]
        input: PathBuf,
        /// Configuration file, if not the default one
        #[arg(long, short)]
        config: Option<PathBuf>,
        /// Reference date for aging open lots (defaults to today)
        #[arg(long)]
        now: Option<NaiveDate>,
        /// Cost basis method
        #[arg(long, short)]
        method: Option<CostBasisMethod>,
    },
    /// Read a ledger and report which records would be used
    Check {
        /// Ledger CSV file
        #[arg(value_name = "LEDGER_CSV")]
        input: PathBuf,
    },
}

fn load_ledger(input: &Path) -> anyhow::Result<Ledger> {
    let file = fs::File::open(input)
        .with_context(|| format!("opening ledger {}", input.display()))?;
    read_ledger(file).with_context(|| format!("reading ledger {}", input.display()))
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    match args.command {
        Command::Process {
            input,
            config,
            now,
            method,
        } => {
            let mut config = Configuration::load_or_default(config.as_deref())
                .context("loading configuration")?;
            if let Some(method) = method {
                config.set_cost_basis_method(method);
            }
            if let Some(now) = now {
                config.set_now(now);
            }
            match config.debug_log() {
                Some(path) => logger::Logger::init(path)?,
                None => logger::Logger::init_stdout_only()?,
            }

            let run_time = UtcTime::now();
            let now = config.now().unwrap_or_else(|| run_time.date());
            info!(
                "Processing {} using {} cost basis, aging open lots to {}",
                input.display(),
                config.cost_basis_method(),
                now,
            );

            let ledger = load_ledger(&input)?;
            info!(
                "Read {} transactions over {} accounts",
                ledger.len(),
                ledger.accounts().len(),
            );
            let report = tax::run(ledger.accounts(), config.cost_basis_method(), now)
                .with_context(|| format!("processing ledger {}", input.display()))?;

            let files = OutputFiles::new(&input, config.output_dir(), run_time);
            let written = report::write_report(&report, &files, &config)?;
            info!("Done. Wrote {} files.", written.len());
        }
        Command::Check { input } => {
            logger::Logger::init_stdout_only()?;
            let ledger = load_ledger(&input)?;
            for (account, txs) in ledger.accounts() {
                let name = if account.is_empty() { "(default)" } else { account.as_str() };
                info!("Account {}: {} transactions", name, txs.len());
            }
            if !ledger.skipped_invalid().is_empty() {
                warn!(
                    "{} invalid records would be skipped",
                    ledger.skipped_invalid().len()
                );
            }
            if !ledger.skipped_empty().is_empty() {
                info!(
                    "{} empty records would be skipped",
                    ledger.skipped_empty().len()
                );
            }
            info!("Read {} transactions", ledger.len());
        }
    }

    Ok(())
}
