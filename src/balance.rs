//! Net balance changes of a canonical file, used to check a conversion against the balances the
//! exchange or the chain reports.

use crate::model::{amount, CsvLine, DELIMITER};
use crate::Result;
use anyhow::{bail, Context};
use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// The net change per currency, in the order currencies first appear.
#[derive(Debug, Clone, Default)]
pub struct BalanceChanges {
    changes: Vec<(String, BigDecimal)>,
    index: HashMap<String, usize>,
}

impl BalanceChanges {
    /// Sums a canonical file: sent and fee amounts decrease a balance, received amounts increase
    /// it. The header row is discarded.
    pub fn from_csv(contents: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(true)
            .from_reader(contents.as_bytes());

        let mut changes = Self::default();
        for (i, result) in rdr.records().enumerate() {
            // The header is line 1.
            let line_number = i + 2;
            let record = result.with_context(|| format!("Unable to read line {line_number}"))?;
            let line: CsvLine = record
                .deserialize(None)
                .with_context(|| format!("Line {line_number} is not a canonical row"))?;
            changes
                .apply(&line)
                .with_context(|| format!("Unable to sum line {line_number}"))?;
        }
        Ok(changes)
    }

    fn apply(&mut self, line: &CsvLine) -> Result<()> {
        for currency in [
            &line.sent_currency,
            &line.received_currency,
            &line.fee_currency,
        ] {
            self.entry(currency);
        }
        self.add(&line.sent_amount, &line.sent_currency, true)?;
        self.add(&line.received_amount, &line.received_currency, false)?;
        self.add(&line.fee_amount, &line.fee_currency, true)?;
        Ok(())
    }

    /// Registers `currency` with a zero change if it was not seen yet.
    fn entry(&mut self, currency: &str) -> Option<usize> {
        if currency.is_empty() {
            return None;
        }
        if let Some(&i) = self.index.get(currency) {
            return Some(i);
        }
        self.changes.push((currency.to_string(), BigDecimal::zero()));
        self.index.insert(currency.to_string(), self.changes.len() - 1);
        Some(self.changes.len() - 1)
    }

    fn add(&mut self, value: &str, currency: &str, decrease: bool) -> Result<()> {
        if value.trim().is_empty() {
            return Ok(());
        }
        let Some(i) = self.entry(currency) else {
            bail!("the amount '{value}' has no currency");
        };
        let value = amount::parse_exact(value)?;
        let change = &mut self.changes[i].1;
        *change = if decrease {
            &*change - &value
        } else {
            &*change + &value
        };
        Ok(())
    }

    /// One line per currency, in first-seen order.
    pub fn report(&self) -> Vec<BalanceLine> {
        self.changes
            .iter()
            .map(|(currency, change)| BalanceLine {
                currency: currency.clone(),
                change: amount::format_exact(change),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// The net change of one currency. Displays as `XTZ: +1.5`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct BalanceLine {
    currency: String,
    change: String,
}

impl BalanceLine {
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// The signed change, without trailing zeros and without a `+` sign.
    pub fn change(&self) -> &str {
        &self.change
    }
}

impl Display for BalanceLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.change.starts_with('-') || self.change == "0" {
            ""
        } else {
            "+"
        };
        write!(f, "{}: {sign}{}", self.currency, self.change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Date;Sent Amount;Sent Currency;Received Amount;Received Currency;\
        Fee Amount;Fee Currency;Net Worth Amount;Net Worth Currency;Label;Description;TxHash\n";

    fn report(rows: &str) -> Vec<String> {
        BalanceChanges::from_csv(&format!("{HEADER}{rows}"))
            .unwrap()
            .report()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_sums_in_first_seen_order() {
        let actual = report(
            "2024-01-01 00:00:00 UTC;;;100;EUR;;;;;liquidity in;;\n\
             2024-01-02 00:00:00 UTC;40;EUR;0.001;BTC;0.5;EUR;;;;;\n\
             2024-01-03 00:00:00 UTC;0.0004;BTC;;;;;;;;;\n",
        );
        assert_eq!(actual, ["EUR: +59.5", "BTC: +0.0006"]);
    }

    #[test]
    fn test_exact_decimal_sum() {
        let actual = report(
            "d;;;0.1;XTZ;;;;;;;\n\
             d;;;0.2;XTZ;;;;;;;\n\
             d;0.3;XTZ;;;;;;;;;\n",
        );
        assert_eq!(actual, ["XTZ: 0"]);
    }

    #[test]
    fn test_negative_change_and_fee_currency_only() {
        let actual = report("d;2;USDC;;;;XTZ;;;;;\n");
        assert_eq!(actual, ["USDC: -2", "XTZ: 0"]);
    }

    #[test]
    fn test_sums_beyond_decimal_precision() {
        let actual = report(
            "d;;;100000000000000000000000000000.000000000000000001;XTZ;;;;;;;\n\
             d;;;100000000000000000000000000000.000000000000000001;XTZ;;;;;;;\n\
             d;0.000000000000000001;XTZ;;;;;;;;;\n",
        );
        assert_eq!(actual, ["XTZ: +200000000000000000000000000000.000000000000000001"]);
    }

    #[test]
    fn test_non_numeric_amount_is_fatal() {
        assert!(BalanceChanges::from_csv(&format!("{HEADER}d;abc;USDC;;;;;;;;;\n")).is_err());
    }

    #[test]
    fn test_empty_file() {
        let changes = BalanceChanges::from_csv(HEADER).unwrap();
        assert!(changes.is_empty());
        assert!(changes.report().is_empty());
    }
}
