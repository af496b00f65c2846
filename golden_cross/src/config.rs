use anyhow::{Context, Result};
use backtesting::{DEFAULT_PERIODS_PER_YEAR, SimulationSettings};
use clap::{Args, Parser, Subcommand};
use indicators::MovingAverageKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::StrategyError;
use crate::ranking::Metric;

/// Parameters of a single Golden Cross run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Fast (short-term) moving-average window
    #[serde(default = "default_fast_window")]
    pub fast_window: usize,

    /// Slow (long-term) moving-average window
    #[serde(default = "default_slow_window")]
    pub slow_window: usize,

    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,

    /// Fee rate per order as a fraction (0.001 = 0.1%)
    #[serde(default = "default_fees")]
    pub fees: f64,

    /// Bars per year used to annualize ratios
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: f64,

    #[serde(default)]
    pub ma_kind: MovingAverageKind,
}

/// Parameter grid searched by `optimize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    #[serde(default = "default_fast_range")]
    pub fast_range: Vec<usize>,

    #[serde(default = "default_slow_range")]
    pub slow_range: Vec<usize>,

    /// Ranking metric, e.g. "total_return" or "Sharpe Ratio"
    #[serde(default = "default_metric")]
    pub metric: String,

    /// Rows listed in the optimization summary
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

/// Configuration for Golden Cross analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to market data file (CSV or YYYYMMDD Price format)
    pub data_file: PathBuf,

    /// Directory receiving reports
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub strategy: StrategyConfig,

    #[serde(default)]
    pub optimization: OptimizationConfig,
}

fn default_fast_window() -> usize {
    50
}

fn default_slow_window() -> usize {
    200
}

fn default_initial_cash() -> f64 {
    10_000.0
}

fn default_fees() -> f64 {
    0.001
}

fn default_periods_per_year() -> f64 {
    DEFAULT_PERIODS_PER_YEAR
}

fn default_fast_range() -> Vec<usize> {
    vec![10, 20, 30, 40, 50]
}

fn default_slow_range() -> Vec<usize> {
    vec![100, 150, 200]
}

fn default_metric() -> String {
    "total_return".to_string()
}

fn default_top_n() -> usize {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            fast_window: default_fast_window(),
            slow_window: default_slow_window(),
            initial_cash: default_initial_cash(),
            fees: default_fees(),
            periods_per_year: default_periods_per_year(),
            ma_kind: MovingAverageKind::default(),
        }
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            fast_range: default_fast_range(),
            slow_range: default_slow_range(),
            metric: default_metric(),
            top_n: default_top_n(),
        }
    }
}

impl StrategyConfig {
    /// Check the cost and capital parameters shared with the optimizer.
    pub fn validate_costs(&self) -> std::result::Result<(), StrategyError> {
        if !self.initial_cash.is_finite() || self.initial_cash < 0.0 {
            return Err(StrategyError::InvalidCash(self.initial_cash));
        }
        if !(0.0..1.0).contains(&self.fees) {
            return Err(StrategyError::InvalidFees(self.fees));
        }
        if !self.periods_per_year.is_finite() || self.periods_per_year <= 0.0 {
            return Err(StrategyError::InvalidPeriodsPerYear(self.periods_per_year));
        }
        Ok(())
    }

    /// Validate windows and costs.
    pub fn validate(&self) -> std::result::Result<(), StrategyError> {
        if self.fast_window == 0 || self.slow_window == 0 {
            return Err(StrategyError::ZeroWindow);
        }
        if self.fast_window >= self.slow_window {
            return Err(StrategyError::WindowOrder {
                fast: self.fast_window,
                slow: self.slow_window,
            });
        }
        self.validate_costs()
    }

    pub fn settings(&self) -> SimulationSettings {
        SimulationSettings {
            initial_cash: self.initial_cash,
            fees: self.fees,
            periods_per_year: self.periods_per_year,
        }
    }
}

impl OptimizationConfig {
    pub fn metric(&self) -> std::result::Result<Metric, StrategyError> {
        self.metric.parse()
    }
}

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "golden_cross")]
#[command(about = "Golden Cross moving-average crossover backtest and parameter optimization")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest
    Backtest(CommonArgs),
    /// Search a (fast, slow) window grid
    Optimize(OptimizeArgs),
}

/// Flags shared by both subcommands; each overrides the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Market data file (CSV or YYYYMMDD Price)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Fast moving-average window
    #[arg(long)]
    pub fast: Option<usize>,

    /// Slow moving-average window
    #[arg(long)]
    pub slow: Option<usize>,

    /// Initial cash
    #[arg(long)]
    pub cash: Option<f64>,

    /// Fee rate per order as a fraction (0.001 = 0.1%)
    #[arg(long)]
    pub fees: Option<f64>,

    /// Bars per year for annualization
    #[arg(long)]
    pub periods_per_year: Option<f64>,

    /// Moving-average kind
    #[arg(long, value_enum)]
    pub ma_kind: Option<MaKindArg>,

    /// Directory receiving reports
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Fast windows to test (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub fast_range: Option<Vec<usize>>,

    /// Slow windows to test (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub slow_range: Option<Vec<usize>>,

    /// Metric used to pick the best pair
    #[arg(long)]
    pub metric: Option<String>,

    /// Rows shown in the summary
    #[arg(long)]
    pub top_n: Option<usize>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaKindArg {
    Simple,
    Exponential,
}

impl From<MaKindArg> for MovingAverageKind {
    fn from(kind: MaKindArg) -> Self {
        match kind {
            MaKindArg::Simple => MovingAverageKind::Simple,
            MaKindArg::Exponential => MovingAverageKind::Exponential,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Build the configuration for a subcommand: file values first, then
    /// command-line overrides.
    pub fn from_common_args(args: &CommonArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Config {
                data_file: args
                    .data
                    .clone()
                    .ok_or(StrategyError::MissingDataFile)?,
                output_dir: default_output_dir(),
                strategy: StrategyConfig::default(),
                optimization: OptimizationConfig::default(),
            },
        };

        if let Some(data) = &args.data {
            config.data_file = data.clone();
        }
        if let Some(dir) = &args.output_dir {
            config.output_dir = dir.clone();
        }

        let strategy = &mut config.strategy;
        if let Some(fast) = args.fast {
            strategy.fast_window = fast;
        }
        if let Some(slow) = args.slow {
            strategy.slow_window = slow;
        }
        if let Some(cash) = args.cash {
            strategy.initial_cash = cash;
        }
        if let Some(fees) = args.fees {
            strategy.fees = fees;
        }
        if let Some(ppy) = args.periods_per_year {
            strategy.periods_per_year = ppy;
        }
        if let Some(kind) = args.ma_kind {
            strategy.ma_kind = kind.into();
        }

        Ok(config)
    }

    pub fn from_optimize_args(args: &OptimizeArgs) -> Result<Self> {
        let mut config = Self::from_common_args(&args.common)?;
        let opt = &mut config.optimization;

        if let Some(range) = &args.fast_range {
            opt.fast_range = range.clone();
        }
        if let Some(range) = &args.slow_range {
            opt.slow_range = range.clone();
        }
        if let Some(metric) = &args.metric {
            opt.metric = metric.clone();
        }
        if let Some(top_n) = args.top_n {
            opt.top_n = top_n;
        }

        Ok(config)
    }

    /// Validate the single-run parameters.
    pub fn validate(&self) -> std::result::Result<(), StrategyError> {
        self.strategy.validate()
    }

    /// Validate the optimization parameters. Window order is checked per
    /// grid pair, not on `strategy`.
    pub fn validate_optimization(&self) -> std::result::Result<Metric, StrategyError> {
        self.strategy.validate_costs()?;
        let opt = &self.optimization;
        if opt.fast_range.contains(&0) || opt.slow_range.contains(&0) {
            return Err(StrategyError::ZeroWindow);
        }
        opt.metric()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_defaults_from_toml() {
        let config: Config = toml::from_str(r#"data_file = "prices.csv""#).unwrap();

        assert_eq!(config.strategy, StrategyConfig::default());
        assert_eq!(config.strategy.fast_window, 50);
        assert_eq!(config.strategy.slow_window, 200);
        assert_eq!(config.optimization.metric, "total_return");
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
data_file = "btc.csv"
output_dir = "reports"

[strategy]
fast_window = 10
slow_window = 30
fees = 0.0
ma_kind = "exponential"

[optimization]
fast_range = [5, 10]
slow_range = [20, 40]
metric = "Sharpe Ratio"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.strategy.fast_window, 10);
        assert_eq!(config.strategy.ma_kind, MovingAverageKind::Exponential);
        assert_eq!(config.strategy.initial_cash, 10_000.0);
        assert_eq!(config.optimization.fast_range, vec![5, 10]);
        assert_eq!(config.validate_optimization().unwrap(), Metric::SharpeRatio);
    }

    #[test]
    fn test_config_validation() {
        let mut strategy = StrategyConfig {
            fast_window: 10,
            slow_window: 50,
            ..StrategyConfig::default()
        };
        assert!(strategy.validate().is_ok());

        strategy.fast_window = 50;
        assert!(matches!(
            strategy.validate(),
            Err(StrategyError::WindowOrder { fast: 50, slow: 50 })
        ));

        strategy.fast_window = 0;
        assert!(matches!(strategy.validate(), Err(StrategyError::ZeroWindow)));

        strategy.fast_window = 10;
        strategy.fees = 1.0;
        assert!(matches!(strategy.validate(), Err(StrategyError::InvalidFees(_))));

        strategy.fees = 0.001;
        strategy.initial_cash = -1.0;
        assert!(matches!(strategy.validate(), Err(StrategyError::InvalidCash(_))));

        strategy.initial_cash = 0.0;
        assert!(strategy.validate().is_ok());

        strategy.periods_per_year = 0.0;
        assert!(matches!(
            strategy.validate(),
            Err(StrategyError::InvalidPeriodsPerYear(_))
        ));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "golden_cross",
            "optimize",
            "--data",
            "prices.txt",
            "--fees",
            "0.002",
            "--fast-range",
            "5,10,15",
            "--slow-range",
            "20,30",
            "--metric",
            "sortino",
        ]);

        let Command::Optimize(args) = cli.command else {
            panic!("expected optimize subcommand");
        };
        let config = Config::from_optimize_args(&args).unwrap();

        assert_eq!(config.data_file, PathBuf::from("prices.txt"));
        assert!((config.strategy.fees - 0.002).abs() < 1e-12);
        assert_eq!(config.optimization.fast_range, vec![5, 10, 15]);
        assert_eq!(config.optimization.slow_range, vec![20, 30]);
        assert_eq!(config.validate_optimization().unwrap(), Metric::SortinoRatio);
    }

    #[test]
    fn test_missing_data_file() {
        let err = Config::from_common_args(&CommonArgs::default()).unwrap_err();
        match err.downcast_ref::<StrategyError>() {
            Some(se @ StrategyError::MissingDataFile) => assert!(se.is_config_error()),
            other => panic!("expected MissingDataFile, got {:?}", other),
        }
    }
}
