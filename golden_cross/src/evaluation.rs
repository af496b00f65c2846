use anyhow::Result;
use std::io::Write;
use std::path::Path;

use replay::core::io::{PriceSeries, create_output_file};

use crate::config::{Config, OptimizationConfig};
use crate::optimization::{OptimizationResult, OptimizationRow};
use crate::ranking::{Ranking, rank};
use crate::strategy::BacktestRun;

/// Write the single-run summary
pub fn write_backtest_summary<P: AsRef<Path>>(
    path: P,
    config: &Config,
    prices: &PriceSeries,
    run: &BacktestRun,
) -> Result<()> {
    let mut file = create_output_file(path.as_ref())?;
    let strategy = &config.strategy;
    let m = &run.portfolio.metrics;

    writeln!(file, "Golden Cross - Moving Average Crossover Backtest")?;
    writeln!(file, "{}", "=".repeat(60))?;
    writeln!(file)?;

    writeln!(file, "Configuration:")?;
    writeln!(file, "  Data file: {}", config.data_file.display())?;
    writeln!(
        file,
        "  Bars: {} ({} to {})",
        prices.len(),
        prices.first_time().format("%Y-%m-%d"),
        prices.last_time().format("%Y-%m-%d")
    )?;
    writeln!(file, "  Fast window: {}", strategy.fast_window)?;
    writeln!(file, "  Slow window: {}", strategy.slow_window)?;
    writeln!(file, "  Moving average: {:?}", strategy.ma_kind)?;
    writeln!(file, "  Initial cash: {:.2}", strategy.initial_cash)?;
    writeln!(file, "  Fees: {:.3}%", strategy.fees * 100.0)?;
    writeln!(file, "  Periods per year: {}", strategy.periods_per_year)?;
    writeln!(file)?;

    writeln!(file, "Signals:")?;
    writeln!(file, "  Entries: {}", run.signals.entry_count())?;
    writeln!(file, "  Exits: {}", run.signals.exit_count())?;
    writeln!(file)?;

    writeln!(file, "Results:")?;
    writeln!(file, "  Final value: {:.2}", m.final_value)?;
    writeln!(file, "  Total return: {:.2}%", m.total_return * 100.0)?;
    writeln!(file, "  Buy & hold return: {:.2}%", m.buy_hold_return * 100.0)?;
    writeln!(file, "  Sharpe ratio: {:.3}", m.sharpe_ratio)?;
    writeln!(file, "  Sortino ratio: {:.3}", m.sortino_ratio)?;
    writeln!(file, "  Calmar ratio: {:.3}", m.calmar_ratio)?;
    writeln!(file, "  Max drawdown: {:.2}%", m.max_drawdown * 100.0)?;
    writeln!(file, "  Trades: {}", m.num_trades)?;
    writeln!(file, "  Win rate: {:.2}%", m.win_rate * 100.0)?;

    file.flush()?;
    Ok(())
}

fn write_row_table<W: Write>(out: &mut W, rows: &[&OptimizationRow]) -> std::io::Result<()> {
    writeln!(
        out,
        "  {:>5} {:>5} {:>10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>7}",
        "Fast", "Slow", "Return %", "Sharpe", "Sortino", "Calmar", "MaxDD %", "Win %", "Trades"
    )?;
    writeln!(out, "  {}", "-".repeat(79))?;
    for row in rows {
        writeln!(
            out,
            "  {:>5} {:>5} {:>10.2} {:>8.3} {:>8.3} {:>8.3} {:>8.2} {:>8.2} {:>7}",
            row.fast,
            row.slow,
            row.total_return_pct,
            row.sharpe_ratio,
            row.sortino_ratio,
            row.calmar_ratio,
            row.max_drawdown_pct,
            row.win_rate_pct,
            row.num_trades
        )?;
    }
    Ok(())
}

/// Write the optimization summary: grid, best pair and the top rows under
/// the ranking metric.
pub fn write_optimization_summary<P: AsRef<Path>>(
    path: P,
    config: &OptimizationConfig,
    result: &OptimizationResult,
    ranking: &Ranking<'_>,
) -> Result<()> {
    let mut file = create_output_file(path.as_ref())?;

    writeln!(file, "Golden Cross - Parameter Optimization")?;
    writeln!(file, "{}", "=".repeat(60))?;
    writeln!(file)?;

    writeln!(file, "Grid:")?;
    writeln!(file, "  Fast windows: {:?}", config.fast_range)?;
    writeln!(file, "  Slow windows: {:?}", config.slow_range)?;
    writeln!(file, "  Combinations tested: {}", result.len())?;
    writeln!(file, "  Ranked by: {}", ranking.metric)?;
    writeln!(file)?;

    if let Some(best) = ranking.best() {
        writeln!(file, "Best parameters:")?;
        writeln!(file, "  Fast={}, Slow={}", best.fast, best.slow)?;
        writeln!(file, "  {}: {:.4}", ranking.metric, ranking.metric.value(best))?;
        writeln!(file)?;
    }

    writeln!(file, "Top {} combinations:", config.top_n.min(ranking.len()))?;
    write_row_table(&mut file, ranking.top(config.top_n))?;

    file.flush()?;
    Ok(())
}

/// Print the best pair and the top rows to stdout.
pub fn print_optimization_summary(result: &OptimizationResult, config: &OptimizationConfig) -> Result<()> {
    let metric = config.metric()?;
    let ranking = rank(result, metric);

    println!("\nTested {} combinations, ranked by {}", result.len(), metric);
    if let Some(best) = ranking.best() {
        println!(
            "Best parameters: Fast={}, Slow={} ({} = {:.4})",
            best.fast,
            best.slow,
            metric,
            metric.value(best)
        );
    }
    println!();
    write_row_table(&mut std::io::stdout().lock(), ranking.top(config.top_n))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::Metric;
    use tempfile::tempdir;

    fn row(fast: usize, slow: usize, ret: f64) -> OptimizationRow {
        OptimizationRow {
            fast,
            slow,
            total_return_pct: ret,
            sharpe_ratio: 0.1,
            sortino_ratio: 0.2,
            calmar_ratio: 0.3,
            max_drawdown_pct: -5.0,
            win_rate_pct: 50.0,
            num_trades: 2,
        }
    }

    #[test]
    fn test_write_optimization_summary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.txt");
        let result = OptimizationResult {
            rows: vec![row(10, 50, 4.0), row(20, 50, 9.5), row(30, 50, 1.0)],
        };
        let config = OptimizationConfig {
            top_n: 2,
            ..OptimizationConfig::default()
        };
        let ranking = rank(&result, Metric::TotalReturn);

        write_optimization_summary(&path, &config, &result, &ranking).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Fast=20, Slow=50"));
        assert!(text.contains("Ranked by: Total Return"));
        assert!(text.contains("Top 2 combinations:"));
    }
}
