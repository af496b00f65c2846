//! Shared market-data plumbing for the replay tools.
//!
//! Candles are loaded from disk by [`core::io`] and turned into a
//! [`core::io::PriceSeries`] that the backtester and the strategy
//! crates consume.

pub mod core;
