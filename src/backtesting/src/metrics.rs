//! Performance metrics computed from a value timeline and a trade list.

use crate::models::{PortfolioMetrics, Trade};

/// Daily bars, calendar-year annualization.
pub const DEFAULT_PERIODS_PER_YEAR: f64 = 365.0;

/// Bar-over-bar returns of the value series.
///
/// The first return is measured against the initial cash.
pub fn periodic_returns(initial_cash: f64, values: &[f64]) -> Vec<f64> {
    let mut prev = initial_cash;
    values
        .iter()
        .map(|&v| {
            let r = if prev > 0.0 { v / prev - 1.0 } else { 0.0 };
            prev = v;
            r
        })
        .collect()
}

/// `final / initial - 1`, or zero without starting capital.
pub fn total_return(initial_cash: f64, values: &[f64]) -> f64 {
    match values.last() {
        Some(&last) if initial_cash > 0.0 => last / initial_cash - 1.0,
        _ => 0.0,
    }
}

/// Drawdown at every bar relative to the running peak of `values`.
pub fn drawdown_series(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&v| {
            peak = peak.max(v);
            if peak > 0.0 { v / peak - 1.0 } else { 0.0 }
        })
        .collect()
}

/// Deepest drawdown; zero or negative.
pub fn max_drawdown(values: &[f64]) -> f64 {
    drawdown_series(values).into_iter().fold(0.0, f64::min)
}

/// Geometric annualization of `total_return` realised over `n_periods` bars.
pub fn annualized_return(total_return: f64, n_periods: usize, periods_per_year: f64) -> f64 {
    if n_periods == 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(periods_per_year / n_periods as f64) - 1.0
}

/// Annualized mean return over sample standard deviation.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    let n = returns.len();
    if n < 2 {
        return 0.0;
    }
    let mean = mean(returns);
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    safe_ratio(mean, variance.sqrt()) * periods_per_year.sqrt()
}

/// Annualized mean return over downside deviation (target zero).
pub fn sortino_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let mean = mean(returns);
    let downside = returns.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>() / returns.len() as f64;
    safe_ratio(mean, downside.sqrt()) * periods_per_year.sqrt()
}

/// Annualized return over the magnitude of the max drawdown.
pub fn calmar_ratio(annualized_return: f64, max_drawdown: f64) -> f64 {
    safe_ratio(annualized_return, max_drawdown.abs())
}

/// Compute every scalar metric of a finished simulation.
pub fn calculate_metrics(
    initial_cash: f64,
    periods_per_year: f64,
    closes: &[f64],
    values: &[f64],
    trades: &[Trade],
) -> PortfolioMetrics {
    let returns = periodic_returns(initial_cash, values);
    let total_return = total_return(initial_cash, values);
    let max_drawdown = max_drawdown(values);
    let annualized_return = annualized_return(total_return, returns.len(), periods_per_year);

    let closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();
    let wins: Vec<f64> = closed.iter().map(|t| t.pnl).filter(|&p| p > 0.0).collect();
    let losses: Vec<f64> = closed.iter().map(|t| t.pnl).filter(|&p| p < 0.0).collect();

    let win_rate = if closed.is_empty() {
        0.0
    } else {
        wins.len() as f64 / closed.len() as f64
    };

    let final_value = values.last().copied().unwrap_or(initial_cash);

    let buy_hold_return = match (closes.first(), closes.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
        _ => 0.0,
    };

    PortfolioMetrics {
        total_return,
        annualized_return,
        sharpe_ratio: sharpe_ratio(&returns, periods_per_year),
        sortino_ratio: sortino_ratio(&returns, periods_per_year),
        calmar_ratio: calmar_ratio(annualized_return, max_drawdown),
        max_drawdown,
        win_rate,
        num_trades: trades.len(),
        winning_trades: wins.len(),
        losing_trades: losses.len(),
        avg_win: mean(&wins),
        avg_loss: mean(&losses),
        final_value,
        total_profit: final_value - initial_cash,
        total_fees: trades.iter().map(|t| t.fees).sum(),
        buy_hold_return,
        outperformance: total_return - buy_hold_return,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Division that never yields NaN: a zero denominator maps to +inf for a
/// positive numerator and to zero otherwise.
fn safe_ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else if num > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_returns() {
        let returns = periodic_returns(100.0, &[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 3);
        assert!(returns[0].abs() < 1e-12);
        assert!((returns[1] - 0.1).abs() < 1e-12);
        assert!((returns[2] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_total_return() {
        assert!((total_return(100.0, &[100.0, 125.0]) - 0.25).abs() < 1e-12);
        assert_eq!(total_return(0.0, &[0.0, 0.0]), 0.0);
        assert_eq!(total_return(100.0, &[]), 0.0);
    }

    #[test]
    fn test_max_drawdown() {
        let values = vec![100.0, 120.0, 90.0, 130.0, 117.0];
        let dd = drawdown_series(&values);
        assert!((dd[2] + 0.25).abs() < 1e-12);
        assert!((dd[4] + 0.1).abs() < 1e-12);
        assert!((max_drawdown(&values) + 0.25).abs() < 1e-12);

        let rising = vec![1.0, 2.0, 3.0];
        assert_eq!(max_drawdown(&rising), 0.0);
    }

    #[test]
    fn test_sharpe_flat_curve() {
        let returns = vec![0.0; 10];
        assert_eq!(sharpe_ratio(&returns, 365.0), 0.0);
        assert_eq!(sortino_ratio(&returns, 365.0), 0.0);
    }

    #[test]
    fn test_sharpe_known_value() {
        let returns = vec![0.01, -0.01, 0.02, 0.0];
        // mean 0.005, sample std = sqrt(0.0005 / 3)
        let expected = 0.005 / (0.0005_f64 / 3.0).sqrt() * 365.0_f64.sqrt();
        assert!((sharpe_ratio(&returns, 365.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_sortino_known_value() {
        let returns = vec![0.01, -0.01, 0.02, 0.0];
        // downside deviation = sqrt(0.0001 / 4)
        let expected = 0.005 / (0.0001_f64 / 4.0).sqrt() * 252.0_f64.sqrt();
        assert!((sortino_ratio(&returns, 252.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_sortino_without_losses_is_infinite() {
        let returns = vec![0.01, 0.02, 0.0];
        assert_eq!(sortino_ratio(&returns, 365.0), f64::INFINITY);
    }

    #[test]
    fn test_annualized_and_calmar() {
        let ann = annualized_return(0.21, 730, 365.0);
        assert!((ann - 0.1).abs() < 1e-9);
        assert!((calmar_ratio(ann, -0.05) - 2.0).abs() < 1e-7);
        assert_eq!(calmar_ratio(-0.1, 0.0), 0.0);
        assert_eq!(annualized_return(-1.5, 10, 365.0), -1.0);
    }

    #[test]
    fn test_metrics_without_trades() {
        let values = vec![1000.0; 5];
        let closes = vec![10.0, 11.0, 12.0, 11.0, 12.0];
        let metrics = calculate_metrics(1000.0, 365.0, &closes, &values, &[]);

        assert_eq!(metrics.num_trades, 0);
        assert_eq!(metrics.win_rate, 0.0);
        assert!(!metrics.win_rate.is_nan());
        assert_eq!(metrics.total_return, 0.0);
        assert!((metrics.buy_hold_return - 0.2).abs() < 1e-12);
        assert!((metrics.outperformance + 0.2).abs() < 1e-12);
    }
}
