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

//! Files
//!
//! Wrappers around [std::fs::File] which basically just provide better
//! logging/error messages.
//!

use anyhow::Context;
use log::info;
use std::path::PathBuf;
use std::{fmt, fs, io};

/// A text file
pub struct TextFile {
    path: PathBuf,
    inner: io::BufWriter<fs::File>,
}

impl TextFile {
    /// Writes some formatted data to the text file
    ///
    /// This method should not be used directly. Use the write! or writeln!
    /// macros from std instead.
    pub fn write_fmt(&mut self, f: fmt::Arguments<'_>) -> anyhow::Result<()> {
        io::Write::write_fmt(&mut self.inner, f)
            .with_context(|| format!("writing {f} to {}", self.path.display()))
    }

    /// Flushes the file, reporting any error rather than dropping it
    pub fn finish(mut self) -> anyhow::Result<PathBuf> {
        io::Write::flush(&mut self.inner)
            .with_context(|| format!("flushing {}", self.path.display()))?;
        Ok(self.path)
    }
}

/// Helper function to create a file with logging etc
///
/// Refuses to overwrite an existing file.
pub fn create_text_file(path: PathBuf, reason: &str) -> anyhow::Result<TextFile> {
    let file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .with_context(|| {
            format!(
                "creating file {} (refusing to overwrite an existing file)",
                path.display()
            )
        })?;
    info!("Creating file {} {}.", path.display(), reason);
    Ok(TextFile {
        path,
        inner: io::BufWriter::new(file),
    })
}
