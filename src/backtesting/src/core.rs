use chrono::{DateTime, Utc};
use replay::core::io::PriceSeries;
use tracing::debug;

use crate::error::BacktestError;
use crate::metrics::{calculate_metrics, drawdown_series};
use crate::models::{PortfolioResult, SimulationSettings, Trade, TradeStatus};

/// Position held between an entry and its exit.
struct OpenPosition {
    index: usize,
    time: DateTime<Utc>,
    price: f64,
    size: f64,
    fees: f64,
}

impl OpenPosition {
    fn cost(&self) -> f64 {
        self.size * self.price + self.fees
    }

    fn into_trade(
        self,
        exit_index: usize,
        exit_time: DateTime<Utc>,
        exit_price: f64,
        exit_fees: f64,
        status: TradeStatus,
    ) -> Trade {
        let cost = self.cost();
        let pnl = self.size * exit_price - exit_fees - cost;
        Trade {
            entry_index: self.index,
            entry_time: self.time,
            entry_price: self.price,
            exit_index,
            exit_time,
            exit_price,
            size: self.size,
            fees: self.fees + exit_fees,
            pnl,
            return_pct: if cost > 0.0 { pnl / cost * 100.0 } else { 0.0 },
            status,
        }
    }
}

/// Simulate a long-only, all-in-or-flat strategy over `prices`.
///
/// On an entry bar while flat, all cash buys `cash / (price * (1 + fees))`
/// units. On an exit bar while long, the whole position is sold and
/// `fees` is charged on the proceeds. When a bar carries both signals the
/// exit is processed first. A position still open on the last bar is
/// reported as an [`TradeStatus::Open`] trade valued at the last close.
///
/// # Arguments
/// * `prices` - Closing prices with their bar times
/// * `entries` - Entry signal per bar
/// * `exits` - Exit signal per bar
/// * `settings` - Initial cash, fee rate and annualization factor
pub fn simulate(
    prices: &PriceSeries,
    entries: &[bool],
    exits: &[bool],
    settings: &SimulationSettings,
) -> Result<PortfolioResult, BacktestError> {
    let closes = prices.closes();
    let times = prices.times();
    let n = closes.len();

    if n == 0 {
        return Err(BacktestError::EmptySeries);
    }
    if entries.len() != n || exits.len() != n {
        return Err(BacktestError::LengthMismatch {
            prices: n,
            entries: entries.len(),
            exits: exits.len(),
        });
    }

    let fees = settings.fees;
    let mut cash = settings.initial_cash;
    let mut position: Option<OpenPosition> = None;
    let mut trades = Vec::new();
    let mut value = Vec::with_capacity(n);

    for i in 0..n {
        let price = closes[i];

        if exits[i] {
            if let Some(pos) = position.take() {
                let gross = pos.size * price;
                let exit_fees = gross * fees;
                cash += gross - exit_fees;
                let trade = pos.into_trade(i, times[i], price, exit_fees, TradeStatus::Closed);
                debug!(index = i, pnl = trade.pnl, "closed position");
                trades.push(trade);
            }
        }

        if entries[i] && position.is_none() && cash > 0.0 {
            let size = cash / (price * (1.0 + fees));
            let entry_fees = size * price * fees;
            debug!(index = i, price, size, "opened position");
            position = Some(OpenPosition {
                index: i,
                time: times[i],
                price,
                size,
                fees: entry_fees,
            });
            cash = 0.0;
        }

        let held = position.as_ref().map_or(0.0, |p| p.size * price);
        value.push(cash + held);
    }

    if let Some(pos) = position {
        trades.push(pos.into_trade(n - 1, times[n - 1], closes[n - 1], 0.0, TradeStatus::Open));
    }

    let metrics = calculate_metrics(
        settings.initial_cash,
        settings.periods_per_year,
        closes,
        &value,
        &trades,
    );

    Ok(PortfolioResult {
        settings: *settings,
        times: times.to_vec(),
        drawdown: drawdown_series(&value),
        value,
        trades,
        metrics,
    })
}
