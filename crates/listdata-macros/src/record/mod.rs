//! Implementation of the `#[derive(Record)]` macro.
//!
//! Generates field accessors, nested-record lookups and field name constants
//! from struct annotations.

mod attrs;
mod derive;

pub use derive::record_derive_impl;
