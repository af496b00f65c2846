use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use replay::core::io::create_output_file;
use serde::Serialize;

use crate::models::{PortfolioResult, TradeStatus};

/// Generate a text report
pub fn generate_text_report<P: AsRef<Path>>(result: &PortfolioResult, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut file = create_output_file(path)
        .with_context(|| format!("Failed to create report: {}", path.display()))?;
    let m = &result.metrics;

    writeln!(file, "Backtest Report")?;
    writeln!(file, "===============")?;
    writeln!(file)?;

    writeln!(file, "Performance Metrics:")?;
    writeln!(file, "--------------------")?;
    writeln!(file, "Initial Cash: {:.2}", result.settings.initial_cash)?;
    writeln!(file, "Final Value: {:.2}", m.final_value)?;
    writeln!(file, "Total Profit: {:.2}", m.total_profit)?;
    writeln!(file, "Total Return: {:.2}%", m.total_return * 100.0)?;
    writeln!(file, "Annualized Return: {:.2}%", m.annualized_return * 100.0)?;
    writeln!(file, "Sharpe Ratio: {:.4}", m.sharpe_ratio)?;
    writeln!(file, "Sortino Ratio: {:.4}", m.sortino_ratio)?;
    writeln!(file, "Calmar Ratio: {:.4}", m.calmar_ratio)?;
    writeln!(file, "Max Drawdown: {:.2}%", m.max_drawdown * 100.0)?;
    writeln!(file, "Total Fees: {:.2}", m.total_fees)?;
    writeln!(file)?;

    writeln!(file, "Trade Analysis:")?;
    writeln!(file, "---------------")?;
    writeln!(file, "Trades: {}", m.num_trades)?;
    writeln!(file, "Winning Trades: {}", m.winning_trades)?;
    writeln!(file, "Losing Trades: {}", m.losing_trades)?;
    writeln!(file, "Win Rate: {:.2}%", m.win_rate * 100.0)?;
    writeln!(file, "Avg Win: {:.2}", m.avg_win)?;
    writeln!(file, "Avg Loss: {:.2}", m.avg_loss)?;
    writeln!(file)?;

    writeln!(file, "Strategy vs Buy & Hold:")?;
    writeln!(file, "-----------------------")?;
    writeln!(file, "Buy & Hold Return: {:.2}%", m.buy_hold_return * 100.0)?;
    writeln!(file, "Outperformance: {:.2}%", m.outperformance * 100.0)?;

    if !result.trades.is_empty() {
        writeln!(file)?;
        writeln!(
            file,
            "{:<8} {:<20} {:>12} {:<20} {:>12} {:>12} {:>9} {:>8}",
            "Status", "Entry Date", "Entry $", "Exit Date", "Exit $", "P&L", "Return %", "Days"
        )?;
        writeln!(file, "{}", "-".repeat(108))?;
        for trade in &result.trades {
            writeln!(
                file,
                "{:<8} {:<20} {:>12.2} {:<20} {:>12.2} {:>12.2} {:>8.2}% {:>8}",
                status_label(trade.status),
                trade.entry_time.format("%Y-%m-%d %H:%M"),
                trade.entry_price,
                trade.exit_time.format("%Y-%m-%d %H:%M"),
                trade.exit_price,
                trade.pnl,
                trade.return_pct,
                trade.duration().num_days()
            )?;
        }
    }

    file.flush()?;
    Ok(())
}

/// Generate a JSON report
pub fn generate_json_report<P: AsRef<Path>>(result: &PortfolioResult, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut file = create_output_file(path)
        .with_context(|| format!("Failed to create report: {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, result)?;
    file.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct TradeRow<'a> {
    status: &'a str,
    entry_time: String,
    entry_price: f64,
    exit_time: String,
    exit_price: f64,
    size: f64,
    fees: f64,
    pnl: f64,
    return_pct: f64,
    duration_secs: i64,
}

/// Write the trade list as CSV, one row per trade.
pub fn write_trades_csv<P: AsRef<Path>>(result: &PortfolioResult, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = create_output_file(path)
        .with_context(|| format!("Failed to create trades file: {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    for trade in &result.trades {
        writer.serialize(TradeRow {
            status: status_label(trade.status),
            entry_time: trade.entry_time.to_rfc3339(),
            entry_price: trade.entry_price,
            exit_time: trade.exit_time.to_rfc3339(),
            exit_price: trade.exit_price,
            size: trade.size,
            fees: trade.fees,
            pnl: trade.pnl,
            return_pct: trade.return_pct,
            duration_secs: trade.duration().num_seconds(),
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the value and drawdown timelines as CSV.
pub fn write_equity_csv<P: AsRef<Path>>(result: &PortfolioResult, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = create_output_file(path)
        .with_context(|| format!("Failed to create equity file: {}", path.display()))?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(["time", "value", "drawdown"])?;
    for ((time, value), drawdown) in result.times.iter().zip(&result.value).zip(&result.drawdown) {
        writer.write_record([
            time.to_rfc3339(),
            value.to_string(),
            drawdown.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn status_label(status: TradeStatus) -> &'static str {
    match status {
        TradeStatus::Closed => "CLOSED",
        TradeStatus::Open => "OPEN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::simulate;
    use crate::models::SimulationSettings;
    use chrono::{Duration, TimeZone, Utc};
    use replay::core::io::PriceSeries;
    use tempfile::tempdir;

    fn sample_result() -> PortfolioResult {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let closes = vec![100.0, 110.0, 105.0, 120.0, 118.0];
        let times = (0..5).map(|d| start + Duration::days(d)).collect();
        let prices = PriceSeries::new(times, closes).unwrap();
        let entries = vec![true, false, false, true, false];
        let exits = vec![false, false, true, false, false];
        simulate(&prices, &entries, &exits, &SimulationSettings::default()).unwrap()
    }

    #[test]
    fn test_text_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.txt");
        generate_text_report(&sample_result(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Total Return:"));
        assert!(text.contains("CLOSED"));
        assert!(text.contains("OPEN"));
    }

    #[test]
    fn test_json_report_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let result = sample_result();
        generate_json_report(&result, &path).unwrap();

        let loaded: PortfolioResult =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.trades.len(), result.trades.len());
        assert_eq!(loaded.metrics.num_trades, result.metrics.num_trades);
    }

    #[test]
    fn test_json_report_keeps_infinite_ratios() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut result = sample_result();
        result.metrics.sortino_ratio = f64::INFINITY;
        result.metrics.calmar_ratio = f64::INFINITY;
        result.metrics.sharpe_ratio = f64::NEG_INFINITY;
        generate_json_report(&result, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"sortino_ratio\": \"inf\""));
        assert!(!text.contains("null"));

        let loaded: PortfolioResult = serde_json::from_str(&text).unwrap();
        assert_eq!(loaded.metrics.sortino_ratio, f64::INFINITY);
        assert_eq!(loaded.metrics.calmar_ratio, f64::INFINITY);
        assert_eq!(loaded.metrics.sharpe_ratio, f64::NEG_INFINITY);
        assert_eq!(loaded.metrics.num_trades, result.metrics.num_trades);
    }

    #[test]
    fn test_csv_outputs() {
        let dir = tempdir().unwrap();
        let result = sample_result();

        let trades_path = dir.path().join("trades.csv");
        write_trades_csv(&result, &trades_path).unwrap();
        let trades = std::fs::read_to_string(&trades_path).unwrap();
        assert!(trades.starts_with("status,entry_time"));
        assert_eq!(trades.lines().count(), 1 + result.trades.len());

        let equity_path = dir.path().join("equity.csv");
        write_equity_csv(&result, &equity_path).unwrap();
        let equity = std::fs::read_to_string(&equity_path).unwrap();
        assert_eq!(equity.lines().count(), 1 + result.value.len());
    }
}
