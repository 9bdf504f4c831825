//! Backtest report generation.

use serde::{Deserialize, Serialize};

use crate::statistics::ValuationRow;
use crate::{BacktestConfig, BacktestStats};

const RULE: &str = "═══════════════════════════════════════════════════════════\n";
const SECTION: &str = "───────────────────────────────────────────────────────────\n";

/// Complete backtest report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Strategy name
    pub strategy: String,
    /// Effective strategy parameters
    pub parameters: serde_json::Value,
    /// Instrument symbol
    pub symbol: String,
    /// Configuration used
    pub config: BacktestConfig,
    /// Statistics
    pub stats: BacktestStats,
    /// One row per bar
    pub valuations: Vec<ValuationRow>,
}

impl BacktestReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let stats = &self.stats;
        let mut s = String::new();

        s.push_str(RULE);
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str(RULE);
        s.push('\n');

        s.push_str(&format!("  Strategy:            {}\n", self.strategy));
        s.push_str(&format!("  Symbol:              {}\n", self.symbol));
        if let Some((first, last)) = self.valuations.first().zip(self.valuations.last()) {
            s.push_str(&format!(
                "  Period:              {} → {}\n",
                first.timestamp.format("%Y-%m-%d %H:%M"),
                last.timestamp.format("%Y-%m-%d %H:%M")
            ));
        }
        s.push('\n');

        s.push_str("PERFORMANCE\n");
        s.push_str(SECTION);
        s.push_str(&format!(
            "  Initial Capital:     ${:.2}\n",
            stats.initial_capital
        ));
        s.push_str(&format!(
            "  Final Value:         ${:.2}\n",
            stats.final_portfolio_value
        ));
        s.push_str(&format!(
            "  Realized P&L:        ${:.2}\n",
            stats.total_pnl_realized
        ));
        s.push_str(&format!(
            "  Total Return:        {:.2}%\n",
            stats.total_return_pct
        ));
        s.push_str(&format!(
            "  Max Drawdown:        {:.2}%\n",
            stats.max_drawdown_pct
        ));
        s.push_str(&format!("  Sharpe Ratio:        {:.2}\n", stats.sharpe_ratio));
        s.push('\n');

        s.push_str("TRADE STATISTICS\n");
        s.push_str(SECTION);
        s.push_str(&format!(
            "  Closed Trades:       {}\n",
            stats.num_closed_trades
        ));
        s.push_str(&format!("  Winning Trades:      {}\n", stats.winning_trades));
        s.push_str(&format!("  Losing Trades:       {}\n", stats.losing_trades));
        s.push_str(&format!("  Win Rate:            {:.2}%\n", stats.win_rate_pct));
        s.push_str(&format!("  Fills:               {}\n", stats.trade_log.len()));
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str(SECTION);
        s.push_str(&format!("  Bars Processed:      {}\n", stats.bars_processed));
        s.push_str(&format!(
            "  Commission:          {} bps\n",
            self.config.commission_bps
        ));
        s.push_str(&format!(
            "  Slippage:            {} bps\n",
            self.config.slippage_bps
        ));
        s.push('\n');

        s.push_str(RULE);

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export the per-bar valuation table to CSV.
    pub fn valuations_to_csv(&self) -> String {
        let mut csv = String::from(
            "timestamp,signal,position_qty,entry_price,trade_pnl,cash,holdings_value,portfolio_value\n",
        );
        for row in &self.valuations {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                row.timestamp.to_rfc3339(),
                row.signal,
                row.position_qty,
                optional(row.entry_price),
                optional(row.trade_pnl),
                row.cash,
                row.holdings_value,
                row.portfolio_value
            ));
        }
        csv
    }

    /// Export the trade log to CSV.
    pub fn trades_to_csv(&self) -> String {
        let mut csv = String::from(
            "timestamp,trade_type,price,size,commission,realized_pnl,cash_after,portfolio_value_after\n",
        );
        for trade in &self.stats.trade_log {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                trade.timestamp.to_rfc3339(),
                trade.trade_type.as_str(),
                trade.price,
                trade.size,
                trade.commission,
                trade.realized_pnl,
                trade.cash_after,
                trade.portfolio_value_after
            ));
        }
        csv
    }
}

fn optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::{TradeRecord, TradeType};
    use chrono::DateTime;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use smc_core::types::Signal;

    fn sample_report() -> BacktestReport {
        let ts = DateTime::from_timestamp(0, 0).unwrap();
        let valuations = vec![
            ValuationRow {
                timestamp: ts,
                signal: Signal::Buy,
                position_qty: dec!(1),
                entry_price: Some(dec!(100)),
                trade_pnl: None,
                cash: dec!(900),
                holdings_value: dec!(100),
                portfolio_value: dec!(1000),
            },
            ValuationRow {
                timestamp: ts + chrono::Duration::days(1),
                signal: Signal::Sell,
                position_qty: Decimal::ZERO,
                entry_price: None,
                trade_pnl: Some(dec!(10)),
                cash: dec!(1010),
                holdings_value: Decimal::ZERO,
                portfolio_value: dec!(1010),
            },
        ];
        let trades = vec![TradeRecord {
            timestamp: ts,
            trade_type: TradeType::BuyLong,
            price: dec!(100),
            size: dec!(1),
            commission: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            cash_after: dec!(900),
            portfolio_value_after: dec!(1000),
        }];

        BacktestReport {
            strategy: "OrderBlockEntry".into(),
            parameters: serde_json::json!({ "strength_factor": 1.2 }),
            symbol: "TEST".into(),
            config: BacktestConfig {
                initial_capital: dec!(1000),
                ..BacktestConfig::default()
            },
            stats: BacktestStats::from_run(dec!(1000), &valuations, trades).unwrap(),
            valuations,
        }
    }

    #[test]
    fn test_report_summary() {
        let summary = sample_report().summary();

        assert!(summary.contains("OrderBlockEntry"));
        assert!(summary.contains("Total Return"));
        assert!(summary.contains("1.00%"));
        assert!(summary.contains("100.00%"));
    }

    #[test]
    fn test_valuations_csv() {
        let csv = sample_report().valuations_to_csv();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("timestamp,signal"));
        assert!(lines[1].contains(",buy,1,100,,900,100,1000"));
        assert!(lines[2].contains(",sell,0,,10,1010,0,1010"));
    }

    #[test]
    fn test_trades_csv_and_json() {
        let report = sample_report();

        assert!(report.trades_to_csv().contains("buy_long"));

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["strategy"], "OrderBlockEntry");
        assert_eq!(json["stats"]["num_closed_trades"], 1);
        assert_eq!(json["valuations"][1]["signal"], "sell");
    }
}
