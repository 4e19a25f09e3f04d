//! Etherlink block explorer exports.
//!
//! An account's activity comes in two files: the native transfer ledger (XTZ movements,
//! including internal transfers made by contracts, and every transaction's fee) and the token
//! transfer ledger. Both hold raw fixed-point integers that go through the amount normalizer.
//!
//! The descriptions written here for native `OUT` rows, `OUT ({method}): {from} to {to}`, are
//! the keys the consolidation engine matches on.

use crate::adapters::{deserialize_row, row_date, unhandled, Adapter};
use crate::diagnostics::Diagnostics;
use crate::model::{amount, date, LedgerLine, Quantity};
use crate::{Config, Result};
use anyhow::Context;
use csv::StringRecord;
use serde::Deserialize;
use tracing::debug;

const NATIVE_NAME: &str = "etherlink-native";
const TOKEN_NAME: &str = "etherlink-token";
const STATUS_OK: &str = "ok";
const DEFAULT_METHOD: &str = "transfer";

// TxHash,BlockNumber,UnixTimestamp,FromAddress,ToAddress,ContractAddress,Type,Value,Fee,Status,
// ErrCode,CurrentPrice,TxDateOpeningPrice,TxDateClosingPrice,MethodName
#[derive(Debug, Clone, Default, Deserialize)]
struct NativeRow {
    tx_hash: String,
    _block_number: String,
    unix_timestamp: String,
    from: String,
    to: String,
    _contract_address: String,
    kind: String,
    value: String,
    fee: String,
    status: String,
    _err_code: String,
    _current_price: String,
    _opening_price: String,
    _closing_price: String,
    method_name: String,
}

/// Converts the native transfer ledger.
#[derive(Debug, Clone)]
pub struct NativeLedger {
    currency: String,
    decimals: u32,
}

impl NativeLedger {
    pub fn new(config: &Config) -> Self {
        Self {
            currency: config.native_currency().to_string(),
            decimals: config.native_decimals(),
        }
    }

    /// Scales a raw value. Zero is treated as absent.
    fn quantity(&self, raw: &str) -> Result<Option<Quantity>> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let value = amount::normalize(raw, self.decimals)?;
        Ok((value != "0").then(|| Quantity::new(value, &self.currency)))
    }
}

impl Adapter for NativeLedger {
    fn name(&self) -> &'static str {
        NATIVE_NAME
    }

    fn convert_row(
        &self,
        row: &StringRecord,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<LedgerLine>> {
        let Some(record) = deserialize_row::<NativeRow>(NATIVE_NAME, row, diagnostics) else {
            return Ok(Vec::new());
        };
        let value = self.quantity(&record.value)?;
        let fee = self.quantity(&record.fee)?;
        let succeeded = record.status.trim().eq_ignore_ascii_case(STATUS_OK);
        let method = match record.method_name.trim() {
            "" => DEFAULT_METHOD,
            method => method,
        };
        let route = format!("{} to {}", record.from.trim(), record.to.trim());
        let date = date::from_unix(&record.unix_timestamp);
        let Some(date) = row_date(NATIVE_NAME, row, diagnostics, date) else {
            return Ok(Vec::new());
        };
        let line = LedgerLine::new(date)
            .with_tx_hash(record.tx_hash.trim().to_string());

        let line = match (record.kind.trim(), succeeded) {
            ("OUT", true) => {
                if value.is_none() && fee.is_none() {
                    return Ok(Vec::new());
                }
                line.with_sent(value)
                    .with_fee(fee)
                    .with_description(format!("OUT ({method}): {route}"))
            }
            ("IN", true) => {
                let Some(value) = value else {
                    return Ok(Vec::new());
                };
                line.with_received(value)
                    .with_description(format!("IN ({method}): {route}"))
            }
            ("SELF", true) => {
                let Some(fee) = fee else {
                    return Ok(Vec::new());
                };
                line.with_fee(fee)
                    .with_description(format!("SELF ({method}): {route}"))
            }
            // A reverted transaction still burns its fee.
            ("OUT" | "SELF", false) => {
                let Some(fee) = fee else {
                    return Ok(Vec::new());
                };
                line.with_fee(fee)
                    .with_description(format!("FAILED ({method}): {route}"))
            }
            ("IN", false) => {
                debug!("Skipping failed incoming transaction {}", record.tx_hash);
                return Ok(Vec::new());
            }
            (other, _) => {
                return Ok(unhandled(
                    NATIVE_NAME,
                    row,
                    diagnostics,
                    format!("transfer type '{other}'"),
                ))
            }
        };
        Ok(vec![line])
    }
}

// TxHash,BlockNumber,UnixTimestamp,FromAddress,ToAddress,TokenContractAddress,Type,TokenSymbol,
// TokensTransferred,TokenDecimals,Status
#[derive(Debug, Clone, Default, Deserialize)]
struct TokenRow {
    tx_hash: String,
    _block_number: String,
    unix_timestamp: String,
    from: String,
    to: String,
    _token_contract_address: String,
    kind: String,
    token_symbol: String,
    tokens_transferred: String,
    token_decimals: String,
    status: String,
}

/// Converts the token transfer ledger. Fees are never emitted here; the native ledger already
/// carries the fee of every transaction.
#[derive(Debug, Clone, Default)]
pub struct TokenLedger;

impl TokenLedger {
    pub fn new() -> Self {
        Self
    }
}

impl Adapter for TokenLedger {
    fn name(&self) -> &'static str {
        TOKEN_NAME
    }

    fn convert_row(
        &self,
        row: &StringRecord,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<LedgerLine>> {
        let Some(record) = deserialize_row::<TokenRow>(TOKEN_NAME, row, diagnostics) else {
            return Ok(Vec::new());
        };
        if !record.status.trim().eq_ignore_ascii_case(STATUS_OK) {
            debug!("Skipping failed token transfer {}", record.tx_hash);
            return Ok(Vec::new());
        }

        let decimals: u32 = match record.token_decimals.trim() {
            "" => 0,
            decimals => decimals
                .parse()
                .with_context(|| format!("'{decimals}' is not a number of decimals"))?,
        };
        let value = amount::normalize(&record.tokens_transferred, decimals)?;
        if value == "0" {
            return Ok(Vec::new());
        }
        let quantity = Quantity::new(value, record.token_symbol.trim());
        let route = format!("{} to {}", record.from.trim(), record.to.trim());
        let date = date::from_unix(&record.unix_timestamp);
        let Some(date) = row_date(TOKEN_NAME, row, diagnostics, date) else {
            return Ok(Vec::new());
        };
        let line = LedgerLine::new(date)
            .with_tx_hash(record.tx_hash.trim().to_string());

        let line = match record.kind.trim() {
            "IN" => line
                .with_received(quantity)
                .with_description(format!("TOKEN IN: {route}")),
            "OUT" => line
                .with_sent(quantity)
                .with_description(format!("TOKEN OUT: {route}")),
            "SELF" => return Ok(Vec::new()),
            other => {
                return Ok(unhandled(
                    TOKEN_NAME,
                    row,
                    diagnostics,
                    format!("token transfer type '{other}'"),
                ))
            }
        };
        Ok(vec![line])
    }
}
