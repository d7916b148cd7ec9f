//! Inex - A single-user income and expense ledger
//! ---
//!
//! Every ledger lives in one fixed-layout binary file holding a metadata block
//! and the records, most recent date first. A [`Store`] loads the whole file,
//! keeps running totals in step with each add, edit and delete, and writes the
//! file back on [`save`][Store::save].
//!

extern crate pest;
#[macro_use]
extern crate pest_derive;

/// Money as whole cents, [`Amount`][amount::Amount] for a single record and
/// [`Cents`][amount::Cents] for signed sums.
pub mod amount;

/// On-disk layout of store files.
pub mod codec;

pub mod config;
pub mod date;
pub mod error;

/// Text parsers for everything a user types: dates, amounts, file names,
/// record ids, view selectors and filter bounds.
pub mod parser;

/// Views, filters and aggregates over a store.
pub mod query;

pub mod record;

/// The record store and its file lifecycle.
pub mod store;

pub use config::Config;
pub use error::{InexError, Result};
pub use store::Store;
