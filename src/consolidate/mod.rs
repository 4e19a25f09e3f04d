//! The consolidation engine.
//!
//! Chain exports list one on-chain interaction as several lines: the contract call with its fee,
//! then the token and internal transfers it caused. The engine recognizes those groups by the
//! description prefix the adapters gave the head line and merges them into the lines a tax
//! report expects.
//!
//! Groups are found with a bounded lookahead over a date-sorted list, so all lines of one
//! transaction must be adjacent. [`sort_by_date`] is stable and keeps the adapter order of lines
//! sharing a date.

mod patterns;

pub use patterns::PatternKind;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::model::LedgerLine;
use crate::Config;
use patterns::PATTERNS;
use tracing::debug;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Consolidator {
    native_currency: String,
    lending_prefix: String,
}

impl Consolidator {
    pub fn new(native_currency: impl Into<String>, lending_prefix: impl Into<String>) -> Self {
        Self {
            native_currency: native_currency.into(),
            lending_prefix: lending_prefix.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.native_currency(), config.lending_prefix())
    }

    /// Merges every recognized group of `lines` and passes everything else through in order.
    ///
    /// Merged lines take the position of their group's head. A group that fails validation is
    /// reported to `diagnostics`, its head is kept as is and the following lines are scanned
    /// again as ordinary lines.
    pub fn consolidate(
        &self,
        lines: &[LedgerLine],
        diagnostics: &mut Diagnostics,
    ) -> Vec<LedgerLine> {
        // Stands in for lines past the end, and fails every check.
        let sentinel = LedgerLine::default();
        let mut output = Vec::with_capacity(lines.len());
        let mut skip = 0;

        for (i, head) in lines.iter().enumerate() {
            if skip > 0 {
                skip -= 1;
                continue;
            }
            let Some(pattern) = PATTERNS.iter().find(|p| p.matches(head)) else {
                output.push(head.clone());
                continue;
            };

            let legs: Vec<&LedgerLine> = (1..=pattern.legs)
                .map(|k| lines.get(i + k).unwrap_or(&sentinel))
                .collect();
            match (pattern.validate)(self, head, &legs) {
                Ok(()) => {
                    let merged = (pattern.merge)(self, head, &legs);
                    debug!(
                        "Consolidated {} at {} into {} line(s)",
                        pattern.kind,
                        head.date(),
                        merged.len()
                    );
                    output.extend(merged);
                    skip = pattern.legs;
                }
                Err(e) => {
                    diagnostics.push(
                        DiagnosticKind::Unconsolidated,
                        format!(
                            "Unable to consolidate {} at {}: {e:#}",
                            pattern.kind,
                            head.date()
                        ),
                    );
                    output.push(head.clone());
                }
            }
        }

        output
    }

    /// `{prefix}W{currency}`, the lending token of wrapped `currency`.
    fn wrapped(&self, currency: &str) -> String {
        format!("{}W{currency}", self.lending_prefix)
    }
}

/// Sorts by date, keeping the relative order of lines with equal dates.
pub fn sort_by_date(lines: &mut [LedgerLine]) {
    lines.sort_by(|a, b| a.date().cmp(b.date()));
}
