use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::DataError;

/// A single OHLCV bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time (UTC)
    pub time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    pub fn new(
        time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Closing prices keyed by bar time, as consumed by the backtester.
///
/// Built once per run from a candle slice and never mutated afterwards.
/// Timestamps are strictly increasing and every close is finite and
/// positive.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    times: Vec<DateTime<Utc>>,
    closes: Vec<f64>,
}

impl PriceSeries {
    /// Build a series from candles sorted ascending by time.
    pub fn from_candles(candles: &[Candle]) -> Result<Self, DataError> {
        let times = candles.iter().map(|c| c.time).collect::<Vec<_>>();
        let closes = candles
            .iter()
            .map(|c| c.close.to_f64().unwrap_or(f64::NAN))
            .collect::<Vec<_>>();
        Self::new(times, closes)
    }

    /// Build a series from parallel time/close vectors.
    pub fn new(times: Vec<DateTime<Utc>>, closes: Vec<f64>) -> Result<Self, DataError> {
        if times.len() != closes.len() {
            return Err(DataError::LengthMismatch {
                times: times.len(),
                closes: closes.len(),
            });
        }
        if times.is_empty() {
            return Err(DataError::Empty);
        }

        if let Some(index) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(DataError::Unordered { index: index + 1 });
        }

        if let Some((index, &value)) = closes
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(DataError::InvalidClose { index, value });
        }

        Ok(Self { times, closes })
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn first_time(&self) -> DateTime<Utc> {
        self.times[0]
    }

    pub fn last_time(&self) -> DateTime<Utc> {
        self.times[self.times.len() - 1]
    }
}
