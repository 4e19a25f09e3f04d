//! Binance exchange histories: deposits, withdrawals, spot trades and conversions.
//!
//! These exports are localized: statuses and trade sides are matched against the sets held in
//! `Config`.

mod conversion;
mod trade;
mod transfers;

pub use conversion::BinanceConversions;
pub use trade::BinanceTrades;
pub use transfers::{BinanceTransfers, TransferDirection};

use crate::model::{amount, Quantity};
use crate::Result;

/// Splits an amount glued to its ticker, as in `"0.5BTC"` or `"1,250.00 EUR"`. Thousands
/// separators are dropped. Returns `None` when there is no ticker or no number.
pub(super) fn split_quantity(s: &str) -> Result<Option<Quantity>> {
    let s = s.trim();
    let Some(ix) = s.find(|c: char| c.is_alphabetic()) else {
        return Ok(None);
    };
    let (number, ticker) = s.split_at(ix);
    let number = number.trim().replace(',', "");
    let ticker = ticker.trim();
    if number.is_empty() || ticker.is_empty() {
        return Ok(None);
    }
    let value = amount::parse(&number)?;
    Ok(Some(Quantity::new(amount::format(value), ticker)))
}
