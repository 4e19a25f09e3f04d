//! Types that represent the canonical data model, such as `LedgerLine` and `Label`.
pub mod amount;
pub mod date;
mod label;
mod ledger_line;
mod record;

pub use label::Label;
pub use ledger_line::{LedgerLine, Quantity};
pub use record::{CsvLine, DELIMITER, HEADERS};
