use anyhow::{Context, Result};
use backtesting::report::{generate_json_report, generate_text_report, write_equity_csv, write_trades_csv};
use clap::Parser;
use golden_cross::config::{Cli, Command, CommonArgs, OptimizeArgs};
use golden_cross::evaluation::print_optimization_summary;
use golden_cross::*;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Command::Backtest(args) => cmd_backtest(args),
        Command::Optimize(args) => cmd_optimize(args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<StrategyError>() {
                Some(se) if se.is_config_error() => warn!("invalid configuration: {}", se),
                _ => error!("run failed: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

fn cmd_backtest(args: &CommonArgs) -> Result<()> {
    println!("Golden Cross - Moving Average Crossover Backtest\n");

    let config = Config::from_common_args(args)?;
    let strategy = GoldenCrossStrategy::new(config.strategy.clone())?;

    println!("Loading market data...");
    let prices = load_price_series(&config.data_file)
        .with_context(|| format!("Failed to load market data: {}", config.data_file.display()))?;
    println!("Bars: {}", prices.len());

    let run = strategy.run_backtest(&prices)?;

    let out = &config.output_dir;
    write_backtest_summary(out.join("backtest_summary.txt"), &config, &prices, &run)?;
    generate_text_report(&run.portfolio, out.join("backtest_report.txt"))?;
    generate_json_report(&run.portfolio, out.join("backtest_report.json"))?;
    write_trades_csv(&run.portfolio, out.join("trades.csv"))?;
    write_equity_csv(&run.portfolio, out.join("equity.csv"))?;
    info!(dir = %out.display(), "reports written");

    let m = &run.portfolio.metrics;
    println!("\n{}", "=".repeat(60));
    println!("Summary");
    println!("{}", "=".repeat(60));
    println!(
        "  Fast / Slow: {} / {}",
        config.strategy.fast_window, config.strategy.slow_window
    );
    println!("  Final value: {:.2}", m.final_value);
    println!("  Total return: {:.2}%", m.total_return * 100.0);
    println!("  Buy & hold return: {:.2}%", m.buy_hold_return * 100.0);
    println!("  Sharpe ratio: {:.3}", m.sharpe_ratio);
    println!("  Max drawdown: {:.2}%", m.max_drawdown * 100.0);
    println!("  Trades: {}", m.num_trades);
    println!("  Win rate: {:.2}%", m.win_rate * 100.0);
    println!("\nResults written to {}", out.display());

    Ok(())
}

fn cmd_optimize(args: &OptimizeArgs) -> Result<()> {
    println!("Golden Cross - Parameter Optimization\n");

    let config = Config::from_optimize_args(args)?;
    let metric = config.validate_optimization()?;
    let opt = &config.optimization;
    if parameter_grid(&opt.fast_range, &opt.slow_range).is_empty() {
        return Err(StrategyError::EmptyGrid.into());
    }

    println!("Loading market data...");
    let prices = load_price_series(&config.data_file)
        .with_context(|| format!("Failed to load market data: {}", config.data_file.display()))?;
    println!("Bars: {}", prices.len());

    let result = optimize(&prices, &opt.fast_range, &opt.slow_range, &config.strategy)?;
    let ranking = rank(&result, metric);

    let out = &config.output_dir;
    write_optimization_csv(&result, out.join("optimization.csv"))?;
    write_optimization_summary(out.join("optimization_summary.txt"), opt, &result, &ranking)?;

    // Full reports for the winning pair
    if let Some(best) = ranking.best() {
        let strategy = GoldenCrossStrategy::new(StrategyConfig {
            fast_window: best.fast,
            slow_window: best.slow,
            ..config.strategy.clone()
        })?;
        let run = strategy.run_backtest(&prices)?;
        generate_text_report(&run.portfolio, out.join("best_report.txt"))?;
        write_trades_csv(&run.portfolio, out.join("best_trades.csv"))?;
    }
    info!(dir = %out.display(), "reports written");

    print_optimization_summary(&result, opt)?;
    println!("\nResults written to {}", out.display());

    Ok(())
}
