//! Meria (formerly Waltio) custody and exchange history.

use crate::adapters::{deserialize_row, row_date, unhandled, Adapter};
use crate::diagnostics::Diagnostics;
use crate::model::{amount, date, Label, LedgerLine, Quantity};
use crate::{Config, Result};
use csv::StringRecord;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

const NAME: &str = "meria";
const NO_HASH: &str = "n/a";

// txHash;type;sourceAmount;sourceCurrency;destinationAmount;destinationCurrency;address;memo;
// destinationType;fee;txInfo;date
#[derive(Debug, Clone, Default, Deserialize)]
struct MeriaRow {
    tx_hash: String,
    tx_type: String,
    source_amount: String,
    source_currency: String,
    destination_amount: String,
    destination_currency: String,
    address: String,
    memo: String,
    destination_type: String,
    /// Fee as a percentage of the moved amount.
    fee_percent: String,
    tx_info: String,
    date: String,
}

/// Converts Meria history rows. `credit` rows receive, `debit` and `withdraw` rows send, and
/// `exchange` rows do both.
#[derive(Debug, Clone)]
pub struct Meria {
    base_fiat: String,
}

impl Meria {
    pub fn new(config: &Config) -> Self {
        Self {
            base_fiat: config.base_fiat().to_string(),
        }
    }

    fn fee(&self, percent: Decimal, moved: &Quantity) -> Result<Option<Quantity>> {
        if percent <= Decimal::ZERO {
            return Ok(None);
        }
        let fee = amount::percent_of(percent, moved.amount())?;
        Ok(Some(Quantity::new(fee, moved.currency())))
    }
}

impl Adapter for Meria {
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
        let Some(record) = deserialize_row::<MeriaRow>(NAME, row, diagnostics) else {
            return Ok(Vec::new());
        };

        let tx_hash = match record.tx_hash.trim() {
            "" | NO_HASH => None,
            hash => Some(hash.to_string()),
        };
        let fee_percent = amount::parse_or_zero(&record.fee_percent)?;
        let source = Quantity::new(
            record.source_amount.trim(),
            normalize_ticker(&record.source_currency),
        );
        let destination = Quantity::new(
            record.destination_amount.trim(),
            normalize_ticker(&record.destination_currency),
        );
        let date = date::normalize(&record.date);
        let Some(date) = row_date(NAME, row, diagnostics, date) else {
            return Ok(Vec::new());
        };
        let line = LedgerLine::new(date).with_tx_hash(tx_hash);
        let info = record.tx_info.trim();

        let line = match record.tx_type.trim() {
            "credit" => match info {
                "airdrop" | "deposit" | "order" | "reward" | "unstaking" | "resale" => {
                    let label = match info {
                        "airdrop" => Some(Label::Airdrop),
                        "reward" => Some(Label::Reward),
                        "unstaking" | "resale" => Some(Label::Unstake),
                        _ if destination.currency() == self.base_fiat => Some(Label::LiquidityIn),
                        _ => None,
                    };
                    let fee = self.fee(fee_percent, &destination)?;
                    line.with_received(destination)
                        .with_fee(fee)
                        .with_label(label)
                }
                // The value of a claim shows up in a separate credit row.
                "claim" => return Ok(Vec::new()),
                other => {
                    return Ok(unhandled(
                        NAME,
                        row,
                        diagnostics,
                        format!("txInfo '{other}' for txType credit"),
                    ))
                }
            },

            "debit" => match info {
                "masternode" | "order" | "reinvestment" | "staking" => {
                    let label = match info {
                        "order" => Label::Cost,
                        _ => Label::Stake,
                    };
                    let fee = self.fee(fee_percent, &source)?;
                    line.with_sent(source).with_fee(fee).with_label(label)
                }
                other => {
                    return Ok(unhandled(
                        NAME,
                        row,
                        diagnostics,
                        format!("txInfo '{other}' for txType debit"),
                    ))
                }
            },

            "exchange" if info.is_empty() => {
                if source.currency() == destination.currency() {
                    debug!(
                        "Skipping {} -> {} self-exchange",
                        source.currency(),
                        destination.currency()
                    );
                    return Ok(Vec::new());
                }
                let fee = self.fee(fee_percent, &source)?;
                line.with_sent(source)
                    .with_received(destination)
                    .with_fee(fee)
                    .with_label(Label::Swap)
            }

            "withdraw" if info.is_empty() => {
                let fee = self.fee(fee_percent, &source)?;
                let description = format!(
                    "{} {} {}",
                    record.destination_type.trim(),
                    record.address.trim(),
                    record.memo.trim()
                );
                line.with_sent(source)
                    .with_fee(fee)
                    .with_description(description.trim_end())
            }

            tx_type @ ("exchange" | "withdraw") => {
                return Ok(unhandled(
                    NAME,
                    row,
                    diagnostics,
                    format!("txInfo '{info}' for txType {tx_type}"),
                ))
            }

            other => {
                return Ok(unhandled(
                    NAME,
                    row,
                    diagnostics,
                    format!("txType '{other}'"),
                ))
            }
        };

        Ok(vec![line])
    }
}

/// Meria still reports the relaunched Terra token under its old ticker.
fn normalize_ticker(ticker: &str) -> String {
    match ticker.trim() {
        "LUNA" => String::from("LUNA2"),
        other => other.to_string(),
    }
}
