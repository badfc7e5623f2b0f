//! Unit tests for RuleEngine - thresholds, suppression and sweeps.

#[cfg(test)]
mod rules_tests {
    use crate::alerts::{Alert, RuleKind};
    use crate::market::Period;
    use crate::portfolio::Holding;
    use crate::services::rules::*;
    use crate::services::test_support::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn aapl() -> Vec<Holding> {
        vec![Holding::new("AAPL", 10.0, 100.0)]
    }

    // ============= Threshold Predicates =============

    #[test]
    fn test_threshold_boundaries() {
        assert!(hard_stop_triggered(91.0, 100.0, 0.91));
        assert!(!hard_stop_triggered(91.01, 100.0, 0.91));
        assert!(warning_triggered(95.0, 100.0, 0.91, 0.95));
        assert!(!warning_triggered(95.01, 100.0, 0.91, 0.95));
        assert!(profit_target_triggered(130.0, 100.0, 1.30));
        assert!(!profit_target_triggered(129.99, 100.0, 1.30));
    }

    proptest! {
        /// Hard stop and warning partition the region below the warning level.
        #[test]
        fn stop_bands_are_exclusive(avg_cost in 0.01..100_000.0_f64, ratio in 0.5..1.5_f64) {
            let price = avg_cost * ratio;
            let hard = hard_stop_triggered(price, avg_cost, 0.91);
            let warn = warning_triggered(price, avg_cost, 0.91, 0.95);

            prop_assert!(!(hard && warn));
            prop_assert_eq!(hard, price <= avg_cost * 0.91);
            prop_assert_eq!(warn, avg_cost * 0.91 < price && price <= avg_cost * 0.95);
            prop_assert_eq!(hard || warn, price <= avg_cost * 0.95);
        }

        #[test]
        fn profit_never_overlaps_stops(avg_cost in 0.01..100_000.0_f64, ratio in 0.5..2.0_f64) {
            let price = avg_cost * ratio;
            if profit_target_triggered(price, avg_cost, 1.30) {
                prop_assert!(!hard_stop_triggered(price, avg_cost, 0.91));
                prop_assert!(!warning_triggered(price, avg_cost, 0.91, 0.95));
            }
        }
    }

    // ============= Position Rules =============

    #[tokio::test]
    async fn test_aapl_hard_stop_at_88() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("AAPL", vec![100.0, 95.0, 88.0]);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 10, 0));

        let report = engine.evaluate_portfolio(&aapl()).await;

        assert_eq!(report.evaluated, 1);
        assert_eq!(report.alerts.len(), 1);
        match &report.alerts[0] {
            Alert::HardStop { loss_pct, price, .. } => {
                assert_eq!(*loss_pct, 12.0);
                assert_eq!(*price, 88.0);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(recorder.count(), 1);
        assert!(recorder.bodies()[0].contains("Loss: 12.0%"));
    }

    #[tokio::test]
    async fn test_aapl_warning_at_93() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("AAPL", vec![93.0]);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 10, 0));

        let report = engine.evaluate_portfolio(&aapl()).await;

        assert_eq!(report.alerts.len(), 1);
        match &report.alerts[0] {
            Alert::Warning { loss_pct, stop_price, .. } => {
                assert_eq!(*loss_pct, 7.0);
                assert!((stop_price - 91.0).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_aapl_profit_at_135() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("AAPL", vec![135.0]);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 10, 0));

        let report = engine.evaluate_portfolio(&aapl()).await;

        assert!(matches!(report.alerts.as_slice(), [Alert::ProfitTarget { gain_pct, .. }] if *gain_pct == 35.0));
        assert_eq!(recorder.subjects(), vec!["🎯 PROFIT: AAPL +35% Target Hit".to_string()]);
    }

    #[tokio::test]
    async fn test_aapl_92_is_warning_only() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("AAPL", vec![92.0]);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 10, 0));

        let report = engine.evaluate_portfolio(&aapl()).await;

        assert!(report.fired(RuleKind::Warning, "AAPL"));
        assert!(!report.fired(RuleKind::HardStop, "AAPL"));
        assert_eq!(report.alerts.len(), 1);
    }

    #[tokio::test]
    async fn test_quiet_price_fires_nothing() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("AAPL", vec![110.0]);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 10, 0));

        let report = engine.evaluate_portfolio(&aapl()).await;

        assert_eq!(report.evaluated, 1);
        assert!(report.alerts.is_empty());
        assert_eq!(recorder.count(), 0);
    }

    #[tokio::test]
    async fn test_unscoped_alert_fires_once_per_run() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        let clock = clock_at(2025, 3, 4, 10, 0);
        market.set("AAPL", vec![88.0]);
        let mut engine = engine(&market, &recorder, clock.clone());

        engine.evaluate_portfolio(&aapl()).await;
        clock.advance(Duration::minutes(5));
        let second = engine.evaluate_portfolio(&aapl()).await;
        clock.advance(Duration::days(2));
        engine.reset_daily_alerts();
        let third = engine.evaluate_portfolio(&aapl()).await;

        assert!(second.alerts.is_empty());
        assert!(third.alerts.is_empty());
        assert_eq!(recorder.count(), 1);
    }

    #[tokio::test]
    async fn test_hard_stop_and_warning_tracked_separately() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("AAPL", vec![93.0]);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 10, 0));

        let first = engine.evaluate_portfolio(&aapl()).await;
        market.set_last("AAPL", 88.0);
        let second = engine.evaluate_portfolio(&aapl()).await;

        assert!(first.fired(RuleKind::Warning, "AAPL"));
        assert!(second.fired(RuleKind::HardStop, "AAPL"));
        assert_eq!(recorder.count(), 2);
    }

    #[tokio::test]
    async fn test_removed_holding_alerts_again_when_readded() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("AAPL", vec![88.0]);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 10, 0));

        engine.evaluate_portfolio(&aapl()).await;
        engine.evaluate_portfolio(&[]).await;
        let again = engine.evaluate_portfolio(&aapl()).await;

        assert!(again.fired(RuleKind::HardStop, "AAPL"));
        assert_eq!(recorder.count(), 2);
    }

    #[tokio::test]
    async fn test_missing_data_skips_symbol_and_continues() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("MSFT", vec![88.0]);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 10, 0));

        let holdings = vec![Holding::new("GONE", 1.0, 50.0), Holding::new("MSFT", 1.0, 100.0)];
        let report = engine.evaluate_portfolio(&holdings).await;

        assert_eq!(report.skipped, vec!["GONE".to_string()]);
        assert_eq!(report.evaluated, 1);
        assert!(report.fired(RuleKind::HardStop, "MSFT"));
    }

    #[tokio::test]
    async fn test_portfolio_sweep_uses_three_month_series() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("AAPL", vec![110.0]);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 10, 0));

        engine.evaluate_portfolio(&aapl()).await;

        assert_eq!(market.calls(), vec![("AAPL".to_string(), Period::ThreeMonths)]);
    }

    // ============= 200-Day SMA Breach =============

    fn breach_series() -> Vec<f64> {
        let mut closes = vec![100.0; 249];
        closes.push(80.0);
        closes
    }

    #[tokio::test]
    async fn test_sma_breach_only_friday_after_close() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("AAPL", breach_series());

        // Thursday after the close
        let mut thursday = engine(&market, &recorder, clock_at(2025, 3, 6, 16, 30));
        assert_eq!(thursday.check_sma_200_breach("AAPL").await.unwrap(), None);

        // Friday before the close
        let mut early = engine(&market, &recorder, clock_at(2025, 3, 7, 15, 30));
        assert_eq!(early.check_sma_200_breach("AAPL").await.unwrap(), None);

        assert!(market.calls().is_empty());
        assert_eq!(recorder.count(), 0);
    }

    #[tokio::test]
    async fn test_sma_breach_fires_once_per_day() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("AAPL", breach_series());
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 7, 16, 30));

        let alert = engine.check_sma_200_breach("AAPL").await.unwrap();
        match alert {
            Some(Alert::SmaBreach { close, sma_200, .. }) => {
                assert_eq!(close, 80.0);
                assert!((sma_200 - 99.9).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(engine.check_sma_200_breach("AAPL").await.unwrap(), None);
        assert_eq!(recorder.count(), 1);
        assert_eq!(market.calls(), vec![("AAPL".to_string(), Period::OneYear)]);
    }

    #[tokio::test]
    async fn test_sma_breach_needs_200_closes() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        let mut closes = vec![100.0; 150];
        closes.push(50.0);
        market.set("AAPL", closes);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 7, 16, 30));

        assert_eq!(engine.check_sma_200_breach("AAPL").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sma_above_average_is_quiet() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        let mut closes = vec![100.0; 249];
        closes.push(120.0);
        market.set("AAPL", closes);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 7, 16, 30));

        assert_eq!(engine.check_sma_200_breach("AAPL").await.unwrap(), None);
    }

    // ============= Momentum/Pullback =============

    #[tokio::test]
    async fn test_exact_eight_percent_pullback_fires() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("NVDA", pullback_series(92.0));
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 11, 0));

        match engine.check_momentum_pullback("NVDA").await.unwrap() {
            Some(Alert::BuySignal { pullback_pct, high_52w, rsi, sma_50, price, .. }) => {
                assert_eq!(pullback_pct, 8.0);
                assert_eq!(high_52w, 100.0);
                assert_eq!(price, 92.0);
                assert_eq!(rsi, 0.0);
                assert!(sma_50 < 92.0);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(recorder.subjects(), vec!["💡 BUY SIGNAL: NVDA".to_string()]);
    }

    #[tokio::test]
    async fn test_shallow_pullback_is_quiet() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("NVDA", pullback_series(92.5));
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 11, 0));

        assert_eq!(engine.check_momentum_pullback("NVDA").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_below_min_price_is_quiet() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        let closes: Vec<f64> = pullback_series(92.0).into_iter().map(|c| c / 10.0).collect();
        market.set("PENNY", closes);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 11, 0));

        assert_eq!(engine.check_momentum_pullback("PENNY").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_below_sma_50_is_quiet() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        // Long slide from 150: price sits far below its 50-day average
        let closes: Vec<f64> = (0..80).map(|i| 150.0 - i as f64).collect();
        market.set("SLIDE", closes);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 11, 0));

        assert_eq!(engine.check_momentum_pullback("SLIDE").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_short_history_is_quiet() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("IPO", vec![100.0, 90.0, 95.0]);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 11, 0));

        assert_eq!(engine.check_momentum_pullback("IPO").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overbought_rsi_is_quiet() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        // Crash to 80, then a steady climb to 90: above SMA50, 10% below the high, RSI 100
        let mut closes = vec![70.0; 30];
        closes.push(100.0);
        closes.extend((0..19).map(|_| 80.0));
        closes.extend((1..=20).map(|k| 80.0 + k as f64 * 0.5));
        market.set("HOT", closes);
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 11, 0));

        assert_eq!(engine.check_momentum_pullback("HOT").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_recommendation_refires_next_day() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        let clock = clock_at(2025, 3, 4, 11, 0);
        market.set("NVDA", pullback_series(92.0));
        let mut engine = engine(&market, &recorder, clock.clone());

        let symbols = vec!["NVDA".to_string()];
        assert_eq!(engine.scan_watchlist(&symbols).await.alerts.len(), 1);
        assert!(engine.scan_watchlist(&symbols).await.alerts.is_empty());

        clock.advance(Duration::days(1));
        assert_eq!(engine.scan_watchlist(&symbols).await.alerts.len(), 1);
        assert_eq!(recorder.count(), 2);
    }

    #[tokio::test]
    async fn test_scan_continues_past_failures() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("NVDA", pullback_series(92.0));
        let mut engine = engine(&market, &recorder, clock_at(2025, 3, 4, 11, 0));

        let symbols = vec!["MISSING".to_string(), "NVDA".to_string()];
        let report = engine.scan_watchlist(&symbols).await;

        assert_eq!(report.skipped, vec!["MISSING".to_string()]);
        assert!(report.fired(RuleKind::Recommendation, "NVDA"));
    }

    // ============= Daily Summary =============

    #[tokio::test]
    async fn test_summary_totals_skip_unavailable() {
        let market = FakeMarket::new();
        let recorder = Recorder::new();
        market.set("AAPL", vec![120.0]);
        let engine = engine(&market, &recorder, clock_at(2025, 3, 4, 17, 0));

        let holdings = vec![Holding::new("AAPL", 10.0, 100.0), Holding::new("GONE", 5.0, 20.0)];
        let summary = engine.generate_daily_summary(&holdings).await;

        assert_eq!(summary.positions.len(), 1);
        assert_eq!(summary.unavailable, vec!["GONE".to_string()]);
        assert_eq!(summary.total_value(), 1200.0);
        assert_eq!(summary.total_cost(), 1000.0);
        assert!((summary.total_pnl_pct() - 20.0).abs() < 1e-9);
        assert!(market.calls().iter().all(|(_, p)| *p == Period::FiveDays));
        assert_eq!(recorder.count(), 0);
    }
}
