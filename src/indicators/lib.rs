//! Price-series indicators.

pub mod trend;

pub use trend::MovingAverageKind;
pub use trend::ma::{exponential_moving_average, moving_average};
