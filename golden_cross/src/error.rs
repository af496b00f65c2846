use backtesting::BacktestError;
use replay::core::io::DataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("fast window ({fast}) must be smaller than slow window ({slow})")]
    WindowOrder { fast: usize, slow: usize },

    #[error("moving-average windows must be greater than 0")]
    ZeroWindow,

    #[error("initial cash must be finite and non-negative, got {0}")]
    InvalidCash(f64),

    #[error("fees must be a fraction in [0, 1), got {0}")]
    InvalidFees(f64),

    #[error("periods per year must be positive, got {0}")]
    InvalidPeriodsPerYear(f64),

    #[error("parameter grid has no pair with fast < slow")]
    EmptyGrid,

    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("market data file is required (--data, or data_file in --config)")]
    MissingDataFile,

    #[error("moving-average length mismatch: fast {fast}, slow {slow}")]
    SignalLength { fast: usize, slow: usize },

    #[error(transparent)]
    Backtest(#[from] BacktestError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StrategyError {
    /// True for invalid parameters rejected before any computation.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StrategyError::WindowOrder { .. }
                | StrategyError::ZeroWindow
                | StrategyError::InvalidCash(_)
                | StrategyError::InvalidFees(_)
                | StrategyError::InvalidPeriodsPerYear(_)
                | StrategyError::EmptyGrid
                | StrategyError::UnknownMetric(_)
                | StrategyError::MissingDataFile
        )
    }
}

pub type Result<T> = std::result::Result<T, StrategyError>;
