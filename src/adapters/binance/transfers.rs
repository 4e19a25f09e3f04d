use crate::adapters::{deserialize_row, non_empty, row_date, Adapter};
use crate::diagnostics::Diagnostics;
use crate::model::{amount, date, Label, LedgerLine, Quantity};
use crate::{Config, Result};
use csv::StringRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Whether the history lists deposits into or withdrawals out of the exchange.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    Deposit,
    Withdraw,
}

// Date(UTC),Coin,Network,Amount,TransactionFee,Address,TXID,SourceAddress,PaymentID,Status
#[derive(Debug, Clone, Default, Deserialize)]
struct TransferRow {
    date: String,
    coin: String,
    network: String,
    amount: String,
    transaction_fee: String,
    address: String,
    txid: String,
    source_address: String,
    payment_id: String,
    status: String,
}

/// Converts the deposit and the withdrawal histories, which share one layout.
#[derive(Debug, Clone)]
pub struct BinanceTransfers {
    config: Config,
    direction: TransferDirection,
}

impl BinanceTransfers {
    pub fn new(config: &Config, direction: TransferDirection) -> Self {
        Self {
            config: config.clone(),
            direction,
        }
    }
}

impl Adapter for BinanceTransfers {
    fn name(&self) -> &'static str {
        match self.direction {
            TransferDirection::Deposit => "binance-deposit",
            TransferDirection::Withdraw => "binance-withdraw",
        }
    }

    fn convert_row(
        &self,
        row: &StringRecord,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<LedgerLine>> {
        let Some(record) = deserialize_row::<TransferRow>(self.name(), row, diagnostics) else {
            return Ok(Vec::new());
        };
        if !self.config.is_success(&record.status) {
            debug!(
                "Skipping {} of {} {} with status '{}'",
                self.name(),
                record.amount,
                record.coin,
                record.status
            );
            return Ok(Vec::new());
        }

        let coin = record.coin.trim();
        let moved = Quantity::new(amount::format(amount::parse(&record.amount)?), coin);
        let fee = amount::parse_or_zero(&record.transaction_fee)?;
        let fee = (fee > Decimal::ZERO).then(|| Quantity::new(amount::format(fee), coin));
        let is_fiat = coin == self.config.base_fiat();
        let network = record.network.trim();

        let date = date::normalize(&record.date);
        let Some(date) = row_date(self.name(), row, diagnostics, date) else {
            return Ok(Vec::new());
        };
        let line = LedgerLine::new(date)
            .with_fee(fee)
            .with_tx_hash(non_empty(&record.txid));

        let line = match self.direction {
            TransferDirection::Deposit => {
                let description = match non_empty(&record.source_address) {
                    Some(source) => format!("Deposit via {network} from {source}"),
                    None => format!("Deposit via {network}"),
                };
                line.with_received(moved)
                    .with_label(is_fiat.then_some(Label::LiquidityIn))
                    .with_description(description)
            }
            TransferDirection::Withdraw => {
                let mut description = format!("Withdraw via {network} to {}", record.address.trim());
                if let Some(memo) = non_empty(&record.payment_id) {
                    description.push_str(&format!(" ({memo})"));
                }
                line.with_sent(moved)
                    .with_label(is_fiat.then_some(Label::LiquidityOut))
                    .with_description(description)
            }
        };

        Ok(vec![line])
    }
}
