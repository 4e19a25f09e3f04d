//! Binance Card spending statements.
//!
//! Amounts in the `Paid` columns are in the card currency, which must be the configured base
//! fiat currency. The assets actually debited are listed in `Assets Used`, e.g.
//! `"BNB 0.01234, EUR 1.20"`.

use crate::adapters::{deserialize_row, row_date, Adapter};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{amount, date, Label, LedgerLine, Quantity};
use crate::{Config, Result};
use csv::StringRecord;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

const NAME: &str = "binance-card";

// Timestamp;Description;Paid OUT;Paid IN;Transaction Fee;Assets Used;Exchange Rates
#[derive(Debug, Clone, Default, Deserialize)]
struct CardRow {
    timestamp: String,
    description: String,
    paid_out: String,
    paid_in: String,
    transaction_fee: String,
    assets_used: String,
    _exchange_rates: String,
}

#[derive(Debug, Clone)]
pub struct BinanceCard {
    base_fiat: String,
}

impl BinanceCard {
    pub fn new(config: &Config) -> Self {
        Self {
            base_fiat: config.base_fiat().to_string(),
        }
    }
}

impl Adapter for BinanceCard {
    fn name(&self) -> &'static str {
        NAME
    }

    fn delimiter(&self) -> u8 {
        b';'
    }

    fn convert_row(
        &self,
        row: &StringRecord,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<LedgerLine>> {
        let Some(record) = deserialize_row::<CardRow>(NAME, row, diagnostics) else {
            return Ok(Vec::new());
        };
        let date = date::normalize(&record.timestamp);
        let Some(date) = row_date(NAME, row, diagnostics, date) else {
            return Ok(Vec::new());
        };
        let paid_out = amount::parse_or_zero(&record.paid_out)?;
        let paid_in = amount::parse_or_zero(&record.paid_in)?;
        let fee = amount::parse_or_zero(&record.transaction_fee)?;
        let description = record.description.trim();

        if paid_in > Decimal::ZERO {
            let refund = Quantity::new(amount::format(paid_in), &self.base_fiat);
            return Ok(vec![LedgerLine::new(date)
                .with_received(refund)
                .with_label(Label::LiquidityIn)
                .with_description(format!("Refund: {description}"))]);
        }

        if paid_out <= Decimal::ZERO {
            debug!("Skipping zero-amount card row '{description}'");
            return Ok(Vec::new());
        }

        let Some(assets) = parse_assets(&record.assets_used)? else {
            diagnostics.push(
                DiagnosticKind::MalformedRow,
                format!(
                    "{NAME}: cannot read the assets used '{}' for '{description}', row skipped",
                    record.assets_used
                ),
            );
            return Ok(Vec::new());
        };

        let mut fee = (fee > Decimal::ZERO)
            .then(|| Quantity::new(amount::format(fee), &self.base_fiat));
        let lines = assets
            .into_iter()
            .map(|asset| {
                LedgerLine::new(date.clone())
                    .with_sent(asset)
                    .with_fee(fee.take())
                    .with_label(Label::Cost)
                    .with_description(description)
            })
            .collect();
        Ok(lines)
    }
}

/// Parses `"BNB 0.01234, EUR 1.20"`. Returns `None` when the list is empty or an entry does not
/// have the `TICKER amount` shape.
fn parse_assets(assets_used: &str) -> Result<Option<Vec<Quantity>>> {
    let mut assets = Vec::new();
    for entry in assets_used.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = entry.split_whitespace();
        let (Some(ticker), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Ok(None);
        };
        let value = amount::parse(value)?;
        assets.push(Quantity::new(amount::format(value), ticker));
    }
    Ok((!assets.is_empty()).then_some(assets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tests::convert;

    const HEADER: &str =
        "Timestamp;Description;Paid OUT;Paid IN;Transaction Fee;Assets Used;Exchange Rates\n";

    fn card(rows: &str) -> (Vec<LedgerLine>, Diagnostics) {
        let adapter = BinanceCard::new(&Config::default());
        convert(&adapter, &format!("{HEADER}{rows}"))
    }

    #[test]
    fn test_spend_with_several_assets() {
        let (lines, diagnostics) = card(
            "2023-02-01 12:00:00;Bakery;12.50;0;0.10;\"BNB 0.02, EUR 5.00\";BNB 300\n",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].sent(), Some(&Quantity::new("0.02", "BNB")));
        assert_eq!(lines[0].fee(), Some(&Quantity::new("0.1", "EUR")));
        assert_eq!(lines[0].label(), Some(Label::Cost));
        assert_eq!(lines[0].description(), Some("Bakery"));
        assert_eq!(lines[1].sent(), Some(&Quantity::new("5", "EUR")));
        assert!(lines[1].fee().is_none());
    }

    #[test]
    fn test_refund() {
        let (lines, _) = card("2023-02-02 12:00:00;Shop;0;8.00;0;;\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].received(), Some(&Quantity::new("8", "EUR")));
        assert_eq!(lines[0].label(), Some(Label::LiquidityIn));
        assert_eq!(lines[0].description(), Some("Refund: Shop"));
    }

    #[test]
    fn test_zero_row_is_skipped() {
        let (lines, diagnostics) = card("2023-02-02 12:00:00;Card check;0;0;0;;\n");
        assert!(lines.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unreadable_assets_are_a_diagnostic() {
        let (lines, diagnostics) = card("2023-02-02 12:00:00;Shop;3;0;0;BNB;\n");
        assert!(lines.is_empty());
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_unparseable_date_skips_only_that_row() {
        let (lines, diagnostics) = card(
            "yesterday;Bakery;12.50;0;0;EUR 12.50;\n\
             2023-02-02 12:00:00;Shop;0;8.00;0;;\n",
        );
        assert_eq!(diagnostics.count(DiagnosticKind::MalformedRow), 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].description(), Some("Refund: Shop"));
    }
}
