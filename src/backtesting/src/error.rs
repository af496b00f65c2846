use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("price series is empty")]
    EmptySeries,

    #[error(
        "signal length mismatch: {prices} prices, {entries} entries, {exits} exits"
    )]
    LengthMismatch {
        prices: usize,
        entries: usize,
        exits: usize,
    },
}
