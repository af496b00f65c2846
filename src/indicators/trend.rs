pub mod ma;

use serde::{Deserialize, Serialize};

/// Smoothing used for a moving-average line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovingAverageKind {
    #[default]
    Simple,
    Exponential,
}

impl MovingAverageKind {
    /// Compute this kind of moving average over `data`.
    ///
    /// Positions without enough history are NaN.
    pub fn compute(self, data: &[f64], window: usize) -> Vec<f64> {
        match self {
            MovingAverageKind::Simple => ma::moving_average(data, window),
            MovingAverageKind::Exponential => ma::exponential_moving_average(data, window),
        }
    }
}
