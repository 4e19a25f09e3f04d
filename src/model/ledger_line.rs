use crate::model::Label;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// An amount of one currency. Amount and currency are always present together.
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Quantity {
    amount: String,
    currency: String,
}

impl Quantity {
    pub fn new(amount: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency: currency.into(),
        }
    }

    /// The decimal string, exactly as produced by the adapter.
    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// One canonical ledger line: a single directional or bidirectional value movement at one point
/// in time.
///
/// Lines are built by adapters with the `with_*` methods:
/// ```
/// # use koinly_convert::model::{Label, LedgerLine, Quantity};
/// let line = LedgerLine::new("2024-03-01 09:15:00 UTC")
///     .with_sent(Quantity::new("10", "XTZ"))
///     .with_received(Quantity::new("10", "slWXTZ"))
///     .with_label(Label::Swap);
/// assert!(line.sent().is_some());
/// assert!(line.fee().is_none());
/// ```
#[derive(Default, Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerLine {
    pub(crate) date: String,
    pub(crate) sent: Option<Quantity>,
    pub(crate) received: Option<Quantity>,
    pub(crate) fee: Option<Quantity>,
    pub(crate) net_worth: Option<Quantity>,
    pub(crate) label: Option<Label>,
    pub(crate) description: Option<String>,
    pub(crate) tx_hash: Option<String>,
}

impl LedgerLine {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    pub fn with_sent(mut self, sent: impl Into<Option<Quantity>>) -> Self {
        self.sent = sent.into();
        self
    }

    pub fn with_received(mut self, received: impl Into<Option<Quantity>>) -> Self {
        self.received = received.into();
        self
    }

    pub fn with_fee(mut self, fee: impl Into<Option<Quantity>>) -> Self {
        self.fee = fee.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<Option<Label>>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tx_hash(mut self, tx_hash: impl Into<Option<String>>) -> Self {
        self.tx_hash = tx_hash.into();
        self
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn sent(&self) -> Option<&Quantity> {
        self.sent.as_ref()
    }

    pub fn received(&self) -> Option<&Quantity> {
        self.received.as_ref()
    }

    pub fn fee(&self) -> Option<&Quantity> {
        self.fee.as_ref()
    }

    pub fn net_worth(&self) -> Option<&Quantity> {
        self.net_worth.as_ref()
    }

    pub fn label(&self) -> Option<Label> {
        self.label
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tx_hash(&self) -> Option<&str> {
        self.tx_hash.as_deref()
    }

    /// True when the line has a sent side and no received side.
    pub fn is_purely_sent(&self) -> bool {
        self.sent.is_some() && self.received.is_none()
    }

    /// True when the line has a received side and no sent side.
    pub fn is_purely_received(&self) -> bool {
        self.received.is_some() && self.sent.is_none()
    }
}
