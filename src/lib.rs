//! Black-Scholes option chain pricing.
//!
//! [`models::OptionChainCalculator`] prices a European Call or Put across a
//! grid of asset prices, strikes and days to expiry, memoizing d1/d2 per
//! request. [`server`] exposes it as `GET /optionChain`.

pub mod config;
pub mod errors;
pub mod models;
pub mod server;
pub mod state;

pub use crate::errors::{EngineError, EngineResult};
