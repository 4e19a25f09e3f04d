use crate::adapters::binance::split_quantity;
use crate::adapters::{deserialize_row, row_date, unhandled, Adapter};
use crate::config::Side;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{date, LedgerLine};
use crate::{Config, Result};
use csv::StringRecord;
use serde::Deserialize;

const NAME: &str = "binance-trade";

// Date(UTC),Pair,Side,Price,Executed,Amount,Fee
#[derive(Debug, Clone, Default, Deserialize)]
struct TradeRow {
    date: String,
    pair: String,
    side: String,
    _price: String,
    /// Base asset quantity, e.g. `0.5BTC`.
    executed: String,
    /// Quote asset quantity, e.g. `15000EUR`.
    amount: String,
    fee: String,
}

/// Converts spot trades. A buy sends the quote asset and receives the base asset; a sell does the
/// opposite.
#[derive(Debug, Clone)]
pub struct BinanceTrades {
    config: Config,
}

impl BinanceTrades {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Adapter for BinanceTrades {
    fn name(&self) -> &'static str {
        NAME
    }

    fn convert_row(
        &self,
        row: &StringRecord,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<LedgerLine>> {
        let Some(record) = deserialize_row::<TradeRow>(NAME, row, diagnostics) else {
            return Ok(Vec::new());
        };
        let Some(side) = self.config.side(&record.side) else {
            return Ok(unhandled(
                NAME,
                row,
                diagnostics,
                format!("side '{}'", record.side),
            ));
        };

        let (Some(base), Some(quote)) = (
            split_quantity(&record.executed)?,
            split_quantity(&record.amount)?,
        ) else {
            diagnostics.push(
                DiagnosticKind::MalformedRow,
                format!(
                    "{NAME}: cannot read the quantities of the {} trade '{}' / '{}', row skipped",
                    record.pair, record.executed, record.amount
                ),
            );
            return Ok(Vec::new());
        };
        let fee = split_quantity(&record.fee)?.filter(|q| q.amount() != "0");

        let (sent, received) = match side {
            Side::Buy => (quote, base),
            Side::Sell => (base, quote),
        };
        let date = date::normalize(&record.date);
        let Some(date) = row_date(NAME, row, diagnostics, date) else {
            return Ok(Vec::new());
        };
        let line = LedgerLine::new(date)
            .with_sent(sent)
            .with_received(received)
            .with_fee(fee)
            .with_description(format!("Trade {}", record.pair.trim()));
        Ok(vec![line])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tests::convert;
    use crate::model::Quantity;

    const HEADER: &str = "Date(UTC),Pair,Side,Price,Executed,Amount,Fee\n";

    fn trades(rows: &str) -> (Vec<LedgerLine>, Diagnostics) {
        let adapter = BinanceTrades::new(&Config::default());
        convert(&adapter, &format!("{HEADER}{rows}"))
    }

    #[test]
    fn test_buy() {
        let (lines, _) = trades(
            "2023-05-01 10:00:00,BTCEUR,BUY,25000,0.02BTC,500EUR,0.00002BTC\n",
        );
        let line = &lines[0];
        assert_eq!(line.sent(), Some(&Quantity::new("500", "EUR")));
        assert_eq!(line.received(), Some(&Quantity::new("0.02", "BTC")));
        assert_eq!(line.fee(), Some(&Quantity::new("0.00002", "BTC")));
        assert_eq!(line.label(), None);
    }

    #[test]
    fn test_localized_sell_without_fee() {
        let (lines, _) = trades(
            "2023-05-01 10:00:00,ETHUSDT,VENTE,1800,1.5ETH,\"2,700USDT\",0USDT\n",
        );
        let line = &lines[0];
        assert_eq!(line.sent(), Some(&Quantity::new("1.5", "ETH")));
        assert_eq!(line.received(), Some(&Quantity::new("2700", "USDT")));
        assert!(line.fee().is_none());
    }

    #[test]
    fn test_unknown_side() {
        let (lines, diagnostics) =
            trades("2023-05-01 10:00:00,BTCEUR,HOLD,1,1BTC,1EUR,0BTC\n");
        assert!(lines.is_empty());
        assert_eq!(diagnostics.count(DiagnosticKind::UnhandledCategory), 1);
    }

    #[test]
    fn test_unparseable_date_skips_only_that_row() {
        let (lines, diagnostics) = trades(
            ",BTCEUR,BUY,25000,0.02BTC,500EUR,0BTC\n\
             2023-05-01 10:00:00,BTCEUR,BUY,25000,0.02BTC,500EUR,0BTC\n",
        );
        assert_eq!(diagnostics.count(DiagnosticKind::MalformedRow), 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].date(), "2023-05-01 10:00:00 UTC");
    }
}
