//! The catalog of multi-line interactions the engine knows how to merge.
//!
//! Each entry pairs the consistency checks of one interaction with the lines that replace it,
//! so the two can be read side by side.

use crate::consolidate::Consolidator;
use crate::model::{amount, Label, LedgerLine, Quantity};
use crate::Result;
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Native currency wrapped into its lending token.
    WrapNative,
    /// A token supplied to the lending pool in exchange for its lending token.
    LendingSupply,
    /// Wrapped native lending tokens redeemed for the native currency.
    LendingWithdraw,
    /// A router call swapping one token for another.
    MulticallSwap,
    /// Tokens sent to a bridge, with a relay leg echoing the same transfer.
    BridgeOut,
}

serde_plain::derive_display_from_serialize!(PatternKind);
serde_plain::derive_fromstr_from_deserialize!(PatternKind);

type Validate = fn(&Consolidator, &LedgerLine, &[&LedgerLine]) -> Result<()>;
type Merge = fn(&Consolidator, &LedgerLine, &[&LedgerLine]) -> Vec<LedgerLine>;

pub(super) struct Pattern {
    pub(super) kind: PatternKind,
    /// The description prefix the head line must start with.
    pub(super) prefix: &'static str,
    /// The number of lines following the head that belong to the group.
    pub(super) legs: usize,
    /// Every check is run against the head and exactly `legs` lines.
    pub(super) validate: Validate,
    /// Only called after `validate` succeeded.
    pub(super) merge: Merge,
}

impl Pattern {
    pub(super) fn matches(&self, head: &LedgerLine) -> bool {
        head.description()
            .is_some_and(|description| description.starts_with(self.prefix))
    }
}

pub(super) static PATTERNS: [Pattern; 5] = [
    Pattern {
        kind: PatternKind::WrapNative,
        prefix: "OUT (depositETH)",
        legs: 1,
        validate: validate_wrap,
        merge: merge_wrap,
    },
    Pattern {
        kind: PatternKind::LendingSupply,
        prefix: "OUT (supply)",
        legs: 2,
        validate: validate_supply,
        merge: merge_supply,
    },
    Pattern {
        kind: PatternKind::LendingWithdraw,
        prefix: "OUT (withdrawETH)",
        legs: 2,
        validate: validate_withdraw,
        merge: merge_withdraw,
    },
    Pattern {
        kind: PatternKind::MulticallSwap,
        prefix: "OUT (multicall)",
        legs: 2,
        validate: validate_multicall,
        merge: merge_multicall,
    },
    Pattern {
        kind: PatternKind::BridgeOut,
        prefix: "OUT (bridge)",
        legs: 2,
        validate: validate_bridge,
        merge: merge_bridge,
    },
];

fn validate_wrap(c: &Consolidator, head: &LedgerLine, legs: &[&LedgerLine]) -> Result<()> {
    same_transaction(head, legs)?;
    let Some(sent) = head.sent() else {
        bail!("the head line sends nothing");
    };
    ensure!(
        sent.currency() == c.native_currency,
        "the head line sends {} instead of {}",
        sent.currency(),
        c.native_currency
    );
    let received = purely_received(legs[0], 1)?;
    let wrapped = c.wrapped(sent.currency());
    ensure!(
        received.currency() == wrapped,
        "leg 1 receives {} instead of {wrapped}",
        received.currency()
    );
    covers(received, sent)
}

fn merge_wrap(_: &Consolidator, head: &LedgerLine, legs: &[&LedgerLine]) -> Vec<LedgerLine> {
    vec![swap(head, head.sent.clone(), legs[0].received.clone())
        .with_label(Label::Swap)
        .with_description(retag(head, "WRAP"))]
}

fn validate_supply(c: &Consolidator, head: &LedgerLine, legs: &[&LedgerLine]) -> Result<()> {
    same_transaction(head, legs)?;
    sends_nothing(head)?;
    let supplied = purely_sent(legs[0], 1)?;
    let received = purely_received(legs[1], 2)?;
    let expected = format!("{}{}", c.lending_prefix, supplied.currency());
    ensure!(
        received.currency() == expected,
        "leg 2 receives {} instead of {expected}",
        received.currency()
    );
    covers(received, supplied)
}

fn merge_supply(_: &Consolidator, head: &LedgerLine, legs: &[&LedgerLine]) -> Vec<LedgerLine> {
    vec![swap(head, legs[0].sent.clone(), legs[1].received.clone())
        .with_label(Label::Swap)
        .with_description(retag(head, "SUPPLY"))]
}

fn validate_withdraw(c: &Consolidator, head: &LedgerLine, legs: &[&LedgerLine]) -> Result<()> {
    same_transaction(head, legs)?;
    sends_nothing(head)?;
    let received = purely_received(legs[0], 1)?;
    ensure!(
        received.currency() == c.native_currency,
        "leg 1 receives {} instead of {}",
        received.currency(),
        c.native_currency
    );
    let redeemed = purely_sent(legs[1], 2)?;
    let wrapped = c.wrapped(&c.native_currency);
    ensure!(
        redeemed.currency() == wrapped,
        "leg 2 sends {} instead of {wrapped}",
        redeemed.currency()
    );
    covers(received, redeemed)
}

fn merge_withdraw(_: &Consolidator, head: &LedgerLine, legs: &[&LedgerLine]) -> Vec<LedgerLine> {
    vec![swap(head, legs[1].sent.clone(), legs[0].received.clone())
        .with_label(Label::Swap)
        .with_description(retag(head, "WITHDRAW"))]
}

fn validate_multicall(_: &Consolidator, head: &LedgerLine, legs: &[&LedgerLine]) -> Result<()> {
    same_transaction(head, legs)?;
    sends_nothing(head)?;
    let sold = purely_sent(legs[0], 1)?;
    let bought = purely_received(legs[1], 2)?;
    ensure!(
        sold.currency() != bought.currency(),
        "legs 1 and 2 both move {}",
        sold.currency()
    );
    Ok(())
}

fn merge_multicall(_: &Consolidator, head: &LedgerLine, legs: &[&LedgerLine]) -> Vec<LedgerLine> {
    vec![swap(head, legs[0].sent.clone(), legs[1].received.clone())
        .with_description(retag(head, "SWAP"))]
}

fn validate_bridge(_: &Consolidator, head: &LedgerLine, legs: &[&LedgerLine]) -> Result<()> {
    same_transaction(head, legs)?;
    sends_nothing(head)?;
    let bridged = purely_sent(legs[0], 1)?;
    let relayed = purely_sent(legs[1], 2)?;
    ensure!(
        bridged.currency() == relayed.currency()
            && amount::same(bridged.amount(), relayed.amount())?,
        "leg 1 sends {bridged} but leg 2 relays {relayed}"
    );
    Ok(())
}

/// The relay leg is dropped. The head only survives as a fee record when it carries a fee.
fn merge_bridge(_: &Consolidator, head: &LedgerLine, legs: &[&LedgerLine]) -> Vec<LedgerLine> {
    let mut lines = Vec::with_capacity(2);
    if head.fee().is_some() {
        lines.push(head.clone().with_description(retag(head, "BRIDGE FEE")));
    }
    lines.push(
        legs[0]
            .clone()
            .with_fee(None)
            .with_description(retag(head, "BRIDGE OUT")),
    );
    lines
}

/// All lines of one group are the same on-chain transaction.
fn same_transaction(head: &LedgerLine, legs: &[&LedgerLine]) -> Result<()> {
    let Some(tx_hash) = head.tx_hash() else {
        bail!("the head line has no transaction hash");
    };
    for (n, leg) in legs.iter().enumerate() {
        ensure!(
            leg.date() == head.date(),
            "leg {} is dated '{}' instead of '{}'",
            n + 1,
            leg.date(),
            head.date()
        );
        ensure!(
            leg.tx_hash() == Some(tx_hash),
            "leg {} belongs to transaction {} instead of {tx_hash}",
            n + 1,
            leg.tx_hash().unwrap_or("<none>")
        );
    }
    Ok(())
}

fn sends_nothing(head: &LedgerLine) -> Result<()> {
    match head.sent() {
        Some(sent) => bail!("the head line sends {sent}"),
        None => Ok(()),
    }
}

fn purely_sent(leg: &LedgerLine, n: usize) -> Result<&Quantity> {
    ensure!(leg.is_purely_sent(), "leg {n} is not a pure send");
    leg.sent().with_context(|| format!("leg {n} sends nothing"))
}

fn purely_received(leg: &LedgerLine, n: usize) -> Result<&Quantity> {
    ensure!(leg.is_purely_received(), "leg {n} is not a pure receive");
    leg.received()
        .with_context(|| format!("leg {n} receives nothing"))
}

/// Protocol rounding may credit slightly more than was moved, never less.
fn covers(received: &Quantity, sent: &Quantity) -> Result<()> {
    ensure!(
        amount::covers(received.amount(), sent.amount())?,
        "{received} received does not cover {sent} sent"
    );
    Ok(())
}

/// A bidirectional line dated and identified like the head, carrying the head's fee.
fn swap(head: &LedgerLine, sent: Option<Quantity>, received: Option<Quantity>) -> LedgerLine {
    LedgerLine::new(head.date())
        .with_sent(sent)
        .with_received(received)
        .with_fee(head.fee.clone())
        .with_tx_hash(head.tx_hash.clone())
}

/// Replaces the leading `OUT` of the head description, so that merged lines never match a
/// prefix again.
fn retag(head: &LedgerLine, tag: &str) -> String {
    let description = head.description().unwrap_or_default();
    match description.strip_prefix("OUT") {
        Some(rest) => format!("{tag}{rest}"),
        None => format!("{tag} {description}"),
    }
}
