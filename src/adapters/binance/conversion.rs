use crate::adapters::binance::split_quantity;
use crate::adapters::{deserialize_row, row_date, Adapter};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::{date, LedgerLine};
use crate::{Config, Result};
use csv::StringRecord;
use serde::Deserialize;
use tracing::debug;

const NAME: &str = "binance-convert";

// Date,Wallet,Pair,Type,Sell,Buy,Price,Inverse Price,Date Updated,Status
#[derive(Debug, Clone, Default, Deserialize)]
struct ConversionRow {
    date: String,
    wallet: String,
    pair: String,
    _kind: String,
    /// e.g. `100 USDT`
    sell: String,
    /// e.g. `0.0035 BTC`
    buy: String,
    _price: String,
    _inverse_price: String,
    _date_updated: String,
    status: String,
}

#[derive(Debug, Clone)]
pub struct BinanceConversions {
    config: Config,
}

impl BinanceConversions {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Adapter for BinanceConversions {
    fn name(&self) -> &'static str {
        NAME
    }

    fn convert_row(
        &self,
        row: &StringRecord,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<LedgerLine>> {
        let Some(record) = deserialize_row::<ConversionRow>(NAME, row, diagnostics) else {
            return Ok(Vec::new());
        };
        if !self.config.is_success(&record.status) {
            debug!("Skipping {} conversion with status '{}'", record.pair, record.status);
            return Ok(Vec::new());
        }

        let (Some(sell), Some(buy)) = (split_quantity(&record.sell)?, split_quantity(&record.buy)?)
        else {
            diagnostics.push(
                DiagnosticKind::MalformedRow,
                format!(
                    "{NAME}: cannot read the conversion '{}' -> '{}', row skipped",
                    record.sell, record.buy
                ),
            );
            return Ok(Vec::new());
        };

        if sell.currency() == buy.currency() {
            debug!("Skipping {} -> {} self-conversion", sell, buy);
            return Ok(Vec::new());
        }

        let date = date::normalize(&record.date);
        let Some(date) = row_date(NAME, row, diagnostics, date) else {
            return Ok(Vec::new());
        };
        let line = LedgerLine::new(date)
            .with_sent(sell)
            .with_received(buy)
            .with_description(format!("Convert ({} wallet)", record.wallet.trim()));
        Ok(vec![line])
    }
}
