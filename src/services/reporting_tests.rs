//! Unit tests for the daily summary report.

#[cfg(test)]
mod reporting_tests {
    use crate::portfolio::Holding;
    use crate::services::reporting::*;
    use chrono::TimeZone;

    fn summary() -> PortfolioSummary {
        let at = chrono_tz::America::New_York.with_ymd_and_hms(2025, 3, 4, 17, 0, 0).unwrap();
        PortfolioSummary::new(at)
    }

    #[test]
    fn test_position_line_math() {
        let line = PositionLine::new(&Holding::new("AAPL", 10.0, 100.0), 120.0, 0.91);

        assert_eq!(line.value, 1200.0);
        assert_eq!(line.cost_basis, 1000.0);
        assert_eq!(line.pnl, 200.0);
        assert_eq!(line.pnl_pct, 20.0);
        // (120 - 91) / 120
        assert!((line.to_stop_pct - 24.1666666).abs() < 1e-6);
    }

    #[test]
    fn test_empty_summary_totals() {
        let s = summary();
        assert_eq!(s.total_value(), 0.0);
        assert_eq!(s.total_pnl_pct(), 0.0);
        assert!(s.render().contains("TOTAL VALUE:  $0.00"));
    }

    #[test]
    fn test_render_layout() {
        let mut s = summary();
        s.positions.push(PositionLine::new(&Holding::new("AAPL", 10.0, 100.0), 120.0, 0.91));
        s.positions.push(PositionLine::new(&Holding::new("MSFT", 1.0, 400.0), 380.0, 0.91));
        s.unavailable.push("GONE".to_string());

        let text = s.render();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[1], "📊 PORTFOLIO SUMMARY");
        assert_eq!(lines[2], "Date: 2025-03-04 17:00:00");
        assert_eq!(
            lines[5],
            "AAPL   | Price: $ 120.00 | Value: $ 1200.00 | P&L: +  20.0% | To Stop: 24.2%"
        );
        assert!(lines[6].starts_with("MSFT   | Price: $ 380.00 | Value: $  380.00 | P&L:   -5.0%"));
        assert!(text.contains("No price data: GONE"));
        assert!(text.contains("TOTAL VALUE:  $1,580.00"));
        assert!(text.contains("TOTAL COST:   $1,400.00"));
        assert!(text.contains("TOTAL P&L:    +$180.00 (+12.86%)"));
    }

    #[test]
    fn test_render_negative_total() {
        let mut s = summary();
        s.positions.push(PositionLine::new(&Holding::new("AAPL", 10.0, 100.0), 90.0, 0.91));
        assert!(s.render().contains("TOTAL P&L:    -$100.00 (-10.00%)"));
    }

    #[test]
    fn test_money_grouping() {
        assert_eq!(money(0.0), "0.00");
        assert_eq!(money(999.999), "1,000.00");
        assert_eq!(money(1234567.891), "1,234,567.89");
        assert_eq!(money(-12345.6), "-12,345.60");
        assert_eq!(money(-0.001), "0.00");
    }
}
