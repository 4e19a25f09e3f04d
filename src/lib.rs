//! Converts exchange and blockchain transaction exports into Koinly universal import files.
//!
//! The pipeline is: read the export rows, convert them with the `adapters` for the selected
//! `Source`, merge multi-line chain interactions with the `consolidate` engine, and write the
//! canonical `model::CsvLine` rows. The `balance` module sums a written file per currency.

pub mod adapters;
pub mod args;
pub mod balance;
pub mod commands;
mod config;
pub mod consolidate;
pub mod diagnostics;
mod error;
pub mod model;
mod utils;


pub use config::{Config, Side};
pub use error::{Error, Result};
