use crate::model::{Label, LedgerLine, Quantity};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The delimiter of canonical files.
pub const DELIMITER: u8 = b';';

/// The header row of canonical files, in column order.
pub const HEADERS: [&str; 12] = [
    DATE_STR,
    SENT_AMOUNT_STR,
    SENT_CURRENCY_STR,
    RECEIVED_AMOUNT_STR,
    RECEIVED_CURRENCY_STR,
    FEE_AMOUNT_STR,
    FEE_CURRENCY_STR,
    NET_WORTH_AMOUNT_STR,
    NET_WORTH_CURRENCY_STR,
    LABEL_STR,
    DESCRIPTION_STR,
    TX_HASH_STR,
];

pub(super) const DATE_STR: &str = "Date";
pub(super) const SENT_AMOUNT_STR: &str = "Sent Amount";
pub(super) const SENT_CURRENCY_STR: &str = "Sent Currency";
pub(super) const RECEIVED_AMOUNT_STR: &str = "Received Amount";
pub(super) const RECEIVED_CURRENCY_STR: &str = "Received Currency";
pub(super) const FEE_AMOUNT_STR: &str = "Fee Amount";
pub(super) const FEE_CURRENCY_STR: &str = "Fee Currency";
pub(super) const NET_WORTH_AMOUNT_STR: &str = "Net Worth Amount";
pub(super) const NET_WORTH_CURRENCY_STR: &str = "Net Worth Currency";
pub(super) const LABEL_STR: &str = "Label";
pub(super) const DESCRIPTION_STR: &str = "Description";
pub(super) const TX_HASH_STR: &str = "TxHash";

// Date;Sent Amount;Sent Currency;Received Amount;Received Currency;Fee Amount;Fee Currency;
// Net Worth Amount;Net Worth Currency;Label;Description;TxHash
/// One row of a canonical file. Absent values are empty strings.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CsvLine {
    #[serde(rename = "Date")]
    pub(crate) date: String,
    #[serde(rename = "Sent Amount")]
    pub(crate) sent_amount: String,
    #[serde(rename = "Sent Currency")]
    pub(crate) sent_currency: String,
    #[serde(rename = "Received Amount")]
    pub(crate) received_amount: String,
    #[serde(rename = "Received Currency")]
    pub(crate) received_currency: String,
    #[serde(rename = "Fee Amount")]
    pub(crate) fee_amount: String,
    #[serde(rename = "Fee Currency")]
    pub(crate) fee_currency: String,
    #[serde(rename = "Net Worth Amount")]
    pub(crate) net_worth_amount: String,
    #[serde(rename = "Net Worth Currency")]
    pub(crate) net_worth_currency: String,
    #[serde(rename = "Label")]
    pub(crate) label: String,
    #[serde(rename = "Description")]
    pub(crate) description: String,
    #[serde(rename = "TxHash")]
    pub(crate) tx_hash: String,
}

impl CsvLine {
    /// Converts the row back into a `LedgerLine`.
    ///
    /// An amount without its currency, or a currency without its amount, is dropped: a fee
    /// currency with an empty fee amount yields no fee at all.
    pub fn into_line(self) -> Result<LedgerLine> {
        let label = match self.label.trim() {
            "" => None,
            s => Some(Label::from_str(s).with_context(|| format!("Unknown label '{s}'"))?),
        };
        Ok(LedgerLine {
            date: self.date,
            sent: quantity(self.sent_amount, self.sent_currency),
            received: quantity(self.received_amount, self.received_currency),
            fee: quantity(self.fee_amount, self.fee_currency),
            net_worth: quantity(self.net_worth_amount, self.net_worth_currency),
            label,
            description: non_empty(self.description),
            tx_hash: non_empty(self.tx_hash),
        })
    }
}

impl From<&LedgerLine> for CsvLine {
    fn from(line: &LedgerLine) -> Self {
        let (sent_amount, sent_currency) = split(line.sent());
        let (received_amount, received_currency) = split(line.received());
        let (fee_amount, fee_currency) = split(line.fee());
        let (net_worth_amount, net_worth_currency) = split(line.net_worth());
        Self {
            date: line.date().to_string(),
            sent_amount,
            sent_currency,
            received_amount,
            received_currency,
            fee_amount,
            fee_currency,
            net_worth_amount,
            net_worth_currency,
            label: line.label().map(|l| l.to_string()).unwrap_or_default(),
            description: line.description().unwrap_or_default().to_string(),
            tx_hash: line.tx_hash().unwrap_or_default().to_string(),
        }
    }
}

fn split(quantity: Option<&Quantity>) -> (String, String) {
    match quantity {
        Some(q) => (q.amount().to_string(), q.currency().to_string()),
        None => (String::new(), String::new()),
    }
}

fn quantity(amount: String, currency: String) -> Option<Quantity> {
    if amount.trim().is_empty() || currency.trim().is_empty() {
        None
    } else {
        Some(Quantity::new(amount, currency))
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_line() -> LedgerLine {
        LedgerLine::new("2024-03-01 09:15:00 UTC")
            .with_sent(Quantity::new("10", "XTZ"))
            .with_received(Quantity::new("10", "slWXTZ"))
            .with_fee(Quantity::new("0.01", "XTZ"))
            .with_label(Label::Swap)
            .with_description("WRAP (depositETH): 0xa to 0xb")
            .with_tx_hash("0xabc".to_string())
    }

    #[test]
    fn test_csv_line_from_ledger_line() {
        let csv_line = CsvLine::from(&full_line());
        assert_eq!(csv_line.sent_amount, "10");
        assert_eq!(csv_line.received_currency, "slWXTZ");
        assert_eq!(csv_line.label, "swap");
        assert!(csv_line.net_worth_amount.is_empty());
        assert!(csv_line.net_worth_currency.is_empty());
    }

    #[test]
    fn test_csv_line_back_to_ledger_line() {
        let line = full_line();
        assert_eq!(CsvLine::from(&line).into_line().unwrap(), line);
    }

    #[test]
    fn test_fee_currency_without_amount_is_no_fee() {
        let csv_line = CsvLine {
            date: String::from("2024-03-01 09:15:00 UTC"),
            sent_amount: String::from("1"),
            sent_currency: String::from("XTZ"),
            fee_currency: String::from("XTZ"),
            ..CsvLine::default()
        };
        let line = csv_line.into_line().unwrap();
        assert!(line.fee().is_none());
        assert!(line.sent().is_some());
    }

    #[test]
    fn test_unknown_label_is_an_error() {
        let csv_line = CsvLine {
            label: String::from("gift"),
            ..CsvLine::default()
        };
        assert!(csv_line.into_line().is_err());
    }

    #[test]
    fn test_serialized_header_matches_headers() {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .from_writer(Vec::new());
        writer.serialize(CsvLine::from(&full_line())).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, HEADERS.join(";"));
    }
}
