//! Source adapters: one per export format.
//!
//! An adapter maps the rows of one export format to canonical `LedgerLine`s. Adapters are pure
//! and stateless: each row is converted on its own, using only the row and the run's `Config`.
//!
//! A row the adapter cannot interpret (wrong shape, unparseable date, unknown transaction
//! category) is reported to `Diagnostics` and produces no lines. An `Err` aborts the whole run
//! and is reserved for input that no rule can recover from, such as a non-numeric amount.

mod binance;
mod binance_card;
mod etherlink;
mod meria;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::LedgerLine;
use crate::{Config, Result};
use anyhow::Context;
use csv::StringRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use binance::{BinanceConversions, BinanceTrades, BinanceTransfers, TransferDirection};
pub use binance_card::BinanceCard;
pub use etherlink::{NativeLedger, TokenLedger};
pub use meria::Meria;

/// The capability shared by all source adapters: raw rows in, canonical lines out.
pub trait Adapter {
    /// A short name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// The field delimiter of the export format.
    fn delimiter(&self) -> u8 {
        b','
    }

    /// Converts one data row into zero or more canonical lines.
    fn convert_row(
        &self,
        row: &StringRecord,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<LedgerLine>>;

    /// Converts all data rows (header already removed), preserving their order.
    fn convert(
        &self,
        rows: &[StringRecord],
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<LedgerLine>> {
        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            let converted = self.convert_row(row, diagnostics).with_context(|| {
                format!("Unable to convert {} row at line {}", self.name(), line_of(row))
            })?;
            lines.extend(converted);
        }
        debug!(
            "{} converted {} rows into {} lines",
            self.name(),
            rows.len(),
            lines.len()
        );
        Ok(lines)
    }
}

/// The export formats, selected once at startup from the command line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Meria (formerly Waltio) custody and exchange history.
    Meria,
    /// Binance Card spending statement.
    BinanceCard,
    /// Binance deposit history.
    BinanceDeposit,
    /// Binance withdrawal history.
    BinanceWithdraw,
    /// Binance spot trade history.
    BinanceTrade,
    /// Binance convert history.
    BinanceConvert,
    /// Etherlink explorer exports: the native transfer file, then the token transfer file.
    Etherlink,
}

serde_plain::derive_display_from_serialize!(Source);
serde_plain::derive_fromstr_from_deserialize!(Source);

impl Source {
    /// The adapters for this mode, one per expected input file, in input order.
    pub fn adapters(&self, config: &Config) -> Vec<Box<dyn Adapter>> {
        match self {
            Source::Meria => vec![Box::new(Meria::new(config))],
            Source::BinanceCard => vec![Box::new(BinanceCard::new(config))],
            Source::BinanceDeposit => vec![Box::new(BinanceTransfers::new(
                config,
                TransferDirection::Deposit,
            ))],
            Source::BinanceWithdraw => vec![Box::new(BinanceTransfers::new(
                config,
                TransferDirection::Withdraw,
            ))],
            Source::BinanceTrade => vec![Box::new(BinanceTrades::new(config))],
            Source::BinanceConvert => vec![Box::new(BinanceConversions::new(config))],
            Source::Etherlink => vec![
                Box::new(NativeLedger::new(config)),
                Box::new(TokenLedger::new()),
            ],
        }
    }

    /// The number of input files this mode expects.
    pub fn input_count(&self) -> usize {
        match self {
            Source::Etherlink => 2,
            _ => 1,
        }
    }

    /// True if the lines of this mode go through the consolidation engine.
    pub fn consolidates(&self) -> bool {
        matches!(self, Source::Etherlink)
    }
}

/// Splits `contents` into data rows. The header row is discarded.
pub fn read_rows(contents: &str, delimiter: u8) -> Result<Vec<StringRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(contents.as_bytes());
    let mut rows = Vec::new();
    for result in rdr.records() {
        rows.push(result.context("Unable to read a CSV record")?);
    }
    Ok(rows)
}

/// Deserializes a positional row into the adapter's record type, or reports it as malformed.
pub(crate) fn deserialize_row<T>(
    adapter: &str,
    row: &StringRecord,
    diagnostics: &mut Diagnostics,
) -> Option<T>
where
    T: DeserializeOwned,
{
    match row.deserialize(None) {
        Ok(record) => Some(record),
        Err(e) => {
            diagnostics.push(
                DiagnosticKind::MalformedRow,
                format!(
                    "Skipping malformed {adapter} row at line {}: {e}",
                    line_of(row)
                ),
            );
            None
        }
    }
}

/// Unwraps the normalized date of a row, or reports the row as malformed.
pub(crate) fn row_date(
    adapter: &str,
    row: &StringRecord,
    diagnostics: &mut Diagnostics,
    date: Result<String>,
) -> Option<String> {
    match date {
        Ok(date) => Some(date),
        Err(e) => {
            diagnostics.push(
                DiagnosticKind::MalformedRow,
                format!(
                    "Skipping malformed {adapter} row at line {}: {e:#}",
                    line_of(row)
                ),
            );
            None
        }
    }
}

/// Reports a transaction category the adapter has no rule for.
pub(crate) fn unhandled(
    adapter: &str,
    row: &StringRecord,
    diagnostics: &mut Diagnostics,
    what: impl AsRef<str>,
) -> Vec<LedgerLine> {
    diagnostics.push(
        DiagnosticKind::UnhandledCategory,
        format!(
            "{adapter} line {}: unhandled {}, row skipped",
            line_of(row),
            what.as_ref()
        ),
    );
    Vec::new()
}

fn line_of(row: &StringRecord) -> u64 {
    row.position().map(|p| p.line()).unwrap_or_default()
}

/// Returns `None` for an empty or blank string.
pub(crate) fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
