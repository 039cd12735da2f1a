//! Core types, store traits and the payment and deposit workflows of the
//! jobpay marketplace.
//!
//! Free of HTTP and database dependencies; backends implement
//! [`store::MarketStore`] and the API layer drives the workflows in
//! [`settlement`] and [`deposit`] through it.

pub mod deposit;
pub mod error;
pub mod model;
pub mod money;
pub mod settlement;
pub mod store;

#[cfg(test)]
mod memory;

pub use error::{Error, ErrorKind, Result};
