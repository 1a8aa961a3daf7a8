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

//! Configuration
//!
//! Parses the optional JSON configuration file. Every field has a default,
//! so an empty object (or no file at all) is a valid configuration.
//!
//! Example:
//!
//! ```json
//! {
//!     "cost_basis_method": "fifo",
//!     "now": "2023-12-31",
//!     "stablecoin_accounts": ["USDC", "DAI"],
//!     "output_dir": "/home/user/taxes/2023",
//!     "debug_log": "/home/user/taxes/2023/debug.log"
//! }
//! ```
//!

use crate::tax::CostBasisMethod;
use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Accounts treated as dollar-pegged stablecoins unless configured otherwise
pub const DEFAULT_STABLECOINS: &[&str] = &[
    "USDC", "USDT", "BUSD", "DAI", "UST", "PAX", "HUSD", "TUSD", "GUSD",
];

/// The main configuration structure
#[derive(Clone, PartialEq, Eq, Deserialize, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    /// How disposals are matched against lots. Only FIFO actually works.
    cost_basis_method: CostBasisMethod,
    /// Reference date for aging unrealized lots; today if unset
    now: Option<NaiveDate>,
    /// Accounts whose gains and unrealized cost basis are not written out
    stablecoin_accounts: BTreeSet<String>,
    /// Where to write output files; next to the input if unset
    output_dir: Option<PathBuf>,
    /// Where to write the debug log, if anywhere
    debug_log: Option<PathBuf>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            cost_basis_method: CostBasisMethod::default(),
            now: None,
            stablecoin_accounts: DEFAULT_STABLECOINS.iter().map(|s| s.to_string()).collect(),
            output_dir: None,
            debug_log: None,
        }
    }
}

impl Configuration {
    /// The default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("cryptax");
        path.push("config.json");
        Some(path)
    }

    /// Reads a configuration file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("parsing configuration {}", path.display()))
    }

    /// Reads the configuration file at `path` if given, otherwise the one in
    /// the default location if it exists, otherwise uses defaults
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => Ok(Self::default()),
        }
    }

    /// Accessor for the cost basis method
    pub fn cost_basis_method(&self) -> CostBasisMethod {
        self.cost_basis_method
    }

    /// Accessor for the fixed reference date, if any
    pub fn now(&self) -> Option<NaiveDate> {
        self.now
    }

    /// Whether an account holds a USD stablecoin
    pub fn is_stablecoin(&self, account: &str) -> bool {
        self.stablecoin_accounts.contains(account)
    }

    /// Accessor for the output directory
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Accessor for the debug log path
    pub fn debug_log(&self) -> Option<&Path> {
        self.debug_log.as_deref()
    }

    /// Overrides the cost basis method, e.g. from the command line
    pub fn set_cost_basis_method(&mut self, method: CostBasisMethod) {
        self.cost_basis_method = method;
    }

    /// Overrides the reference date, e.g. from the command line
    pub fn set_now(&mut self, now: NaiveDate) {
        self.now = Some(now);
    }
}
