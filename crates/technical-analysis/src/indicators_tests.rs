#[cfg(test)]
mod tests {
    use super::super::indicator_set::build_frame;
    use super::super::indicators::*;
    use analysis_core::{Bar, BarSeries, IndicatorRow, Interval, Period};
    use chrono::{Duration, TimeZone, Utc};

    // Helper function to create sample price data
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    fn bar(i: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap() + Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    // Steady uptrend, one point per bar
    fn sample_bars() -> Vec<Bar> {
        (0..15)
            .map(|i| {
                let base = 100.0 + i as f64;
                bar(i, base, base + 2.0, base - 1.0, base + 1.0, 1000000.0)
            })
            .collect()
    }

    fn wave_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.05;
                bar(i, close - 0.2, close + 1.0, close - 1.0, close, 500_000.0 + (i % 9) as f64 * 25_000.0)
            })
            .collect()
    }

    fn first_present(rows: &[IndicatorRow], field: fn(&IndicatorRow) -> Option<f64>) -> Option<usize> {
        rows.iter().position(|r| field(r).is_some())
    }

    #[test]
    fn test_align_pads_and_masks() {
        let aligned = align(&[1.0, f64::NAN, 3.0], 5);
        assert_eq!(aligned, vec![None, None, Some(1.0), None, Some(3.0)]);
        assert_eq!(align(&[], 2), vec![None, None]);
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 0.001); // (1+2+3)/3 = 2
        assert!((result[1] - 3.0).abs() < 0.001);
        assert!((result[2] - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_sma_insufficient_data() {
        assert!(sma(&[1.0, 2.0], 5).is_empty());
    }

    #[test]
    fn test_ema_seeded_with_sma() {
        let prices = sample_prices();
        let result = ema(&prices, 10);

        assert_eq!(result.len(), prices.len() - 9);
        let seed = prices[..10].iter().sum::<f64>() / 10.0;
        assert!((result[0] - seed).abs() < 1e-9);

        let k = 2.0 / 11.0;
        let second = (prices[10] - seed) * k + seed;
        assert!((result[1] - second).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_bounds_and_length() {
        let prices = sample_prices();
        let result = rsi(&prices, 14);

        assert_eq!(result.len(), prices.len() - 14);
        for v in &result {
            assert!(*v >= 0.0 && *v <= 100.0);
        }
    }

    #[test]
    fn test_rsi_one_sided_moves() {
        let rising: Vec<f64> = (0..30).map(|i| i as f64).collect();
        assert!(rsi(&rising, 14).iter().all(|v| *v == 100.0));

        let falling: Vec<f64> = (0..30).map(|i| -(i as f64)).collect();
        assert!(rsi(&falling, 14).iter().all(|v| *v == 0.0));

        // no movement at all is undefined
        let flat = vec![10.0; 30];
        assert!(rsi(&flat, 14).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_macd_lengths() {
        let data: Vec<f64> = (0..60).map(|i| 50.0 + (i as f64 * 0.5).cos()).collect();
        let result = macd(&data, 12, 26, 9);

        assert_eq!(result.macd_line.len(), 60 - 25);
        assert_eq!(result.signal_line.len(), 60 - 25 - 8);
    }

    #[test]
    fn test_bollinger_flat_series_collapses() {
        let data = vec![10.0; 25];
        let bands = bollinger_bands(&data, 20, 2.0);

        assert_eq!(bands.upper.len(), 6);
        assert_eq!(bands.upper[0], 10.0);
        assert_eq!(bands.lower[0], 10.0);
        assert_eq!(bands.middle[0], 10.0);
    }

    #[test]
    fn test_bollinger_ordering() {
        let bands = bollinger_bands(&sample_prices(), 10, 2.0);
        for i in 0..bands.middle.len() {
            assert!(bands.upper[i] > bands.middle[i]);
            assert!(bands.middle[i] > bands.lower[i]);
        }
    }

    #[test]
    fn test_williams_r_range() {
        let result = williams_r(&sample_bars(), 14);

        assert_eq!(result.len(), 2);
        for v in &result {
            assert!(*v <= 0.0 && *v >= -100.0);
        }
    }

    #[test]
    fn test_williams_r_flat_range_is_undefined() {
        let bars: Vec<Bar> = (0..14).map(|i| bar(i, 5.0, 5.0, 5.0, 5.0, 10.0)).collect();
        let result = williams_r(&bars, 14);
        assert_eq!(result.len(), 1);
        assert!(result[0].is_nan());
    }

    #[test]
    fn test_obv_accumulates_by_direction() {
        let bars = vec![
            bar(0, 10.0, 11.0, 9.0, 10.0, 100.0),
            bar(1, 10.0, 11.0, 9.0, 11.0, 50.0),
            bar(2, 11.0, 12.0, 10.0, 10.5, 30.0),
            bar(3, 10.5, 11.0, 10.0, 10.5, 70.0),
        ];
        assert_eq!(obv(&bars), vec![100.0, 150.0, 120.0, 120.0]);
    }

    #[test]
    fn test_adx_uptrend_favors_plus_di() {
        let bars: Vec<Bar> = (0..40)
            .map(|i| {
                let base = 100.0 + i as f64;
                bar(i, base, base + 2.0, base - 1.0, base + 1.0, 1000.0)
            })
            .collect();
        let result = adx(&bars, 14);

        assert_eq!(result.plus_di.len(), 40 - 14);
        assert_eq!(result.adx.len(), 40 - 27);
        let last = result.plus_di.len() - 1;
        assert!(result.plus_di[last] > result.minus_di[last]);
        assert!(*result.adx.last().unwrap() > 25.0);
    }

    #[test]
    fn test_parabolic_sar_one_side_per_bar() {
        let bars = wave_bars(80);
        let sar = parabolic_sar(&bars, 0.02, 0.02, 0.2);

        assert!(sar.long[0].is_nan() && sar.short[0].is_nan());
        for i in 1..bars.len() {
            assert!(sar.long[i].is_finite() != sar.short[i].is_finite(), "bar {}", i);
        }
        let combined = sar.combined();
        assert!(combined[1..].iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_parabolic_sar_trails_uptrend() {
        let bars = sample_bars();
        let sar = parabolic_sar(&bars, 0.02, 0.02, 0.2);
        // a clean uptrend never flips short
        assert!(sar.short.iter().all(|v| v.is_nan()));
        for i in 1..bars.len() {
            assert!(sar.long[i] <= bars[i].low);
        }
    }

    #[test]
    fn test_frame_warm_up_boundaries() {
        let bars = wave_bars(250);
        let series = BarSeries::new("WAVE", Interval::Day1, Period::Year1, bars).unwrap();
        let frame = build_frame(&series);
        let rows = frame.rows();

        assert_eq!(rows.len(), 250);
        assert_eq!(first_present(rows, |r| r.obv), Some(0));
        assert_eq!(first_present(rows, |r| r.parabolic_sar), Some(1));
        assert_eq!(first_present(rows, |r| r.williams_r), Some(13));
        assert_eq!(first_present(rows, |r| r.rsi), Some(14));
        assert_eq!(first_present(rows, |r| r.dm_plus), Some(14));
        assert_eq!(first_present(rows, |r| r.dm_minus), Some(14));
        assert_eq!(first_present(rows, |r| r.ema20), Some(19));
        assert_eq!(first_present(rows, |r| r.bb_lower), Some(19));
        assert_eq!(first_present(rows, |r| r.bb_upper), Some(19));
        assert_eq!(first_present(rows, |r| r.macd), Some(25));
        assert_eq!(first_present(rows, |r| r.adx), Some(27));
        assert_eq!(first_present(rows, |r| r.stoch_k), Some(29));
        assert_eq!(first_present(rows, |r| r.stoch_d), Some(31));
        assert_eq!(first_present(rows, |r| r.macd_signal), Some(33));
        assert_eq!(first_present(rows, |r| r.sma200), Some(199));
    }

    #[test]
    fn test_frame_rows_follow_bars() {
        let bars = wave_bars(30);
        let series = BarSeries::new("WAVE", Interval::Day1, Period::Month1, bars.clone()).unwrap();
        let frame = build_frame(&series);

        for (row, bar) in frame.rows().iter().zip(&bars) {
            assert_eq!(row.timestamp, bar.timestamp);
            assert_eq!(row.close, bar.close);
        }
        assert!(frame.latest().unwrap().sma200.is_none());
    }

    #[test]
    fn test_bad_volume_only_touches_obv() {
        let clean = wave_bars(60);
        let restart_volume = clean[4].volume;
        let mut bars = clean.clone();
        bars[3].volume = f64::NAN;

        let clean = build_frame(&BarSeries::new("WAVE", Interval::Day1, Period::Month3, clean).unwrap());
        let frame = build_frame(&BarSeries::new("WAVE", Interval::Day1, Period::Month3, bars).unwrap());
        assert_eq!(frame.len(), 60);

        for (row, expected) in frame.rows().iter().zip(clean.rows()) {
            assert_eq!(row.adx, expected.adx);
            assert_eq!(row.dm_plus, expected.dm_plus);
            assert_eq!(row.williams_r, expected.williams_r);
            assert_eq!(row.parabolic_sar, expected.parabolic_sar);
            assert_eq!(row.rsi, expected.rsi);
            assert_eq!(row.ema20, expected.ema20);
            assert_eq!(row.bb_upper, expected.bb_upper);
        }

        let rows = frame.rows();
        assert!(rows[2].obv.is_some());
        assert!(rows[3].obv.is_none());
        // accumulation restarts after the gap
        assert_eq!(rows[4].obv, Some(restart_volume));
        assert!(rows[59].obv.is_some());
    }

    #[test]
    fn test_bad_close_only_costs_its_lookback() {
        let mut bars = wave_bars(60);
        bars[2].close = f64::NAN;
        let frame = build_frame(&BarSeries::new("WAVE", Interval::Day1, Period::Month3, bars).unwrap());
        let rows = frame.rows();

        assert!(rows[2].ema20.is_none() && rows[2].rsi.is_none() && rows[2].williams_r.is_none());
        // indicators warm up again from the bar after the gap
        assert_eq!(first_present(rows, |r| r.ema20), Some(22));
        assert_eq!(first_present(rows, |r| r.rsi), Some(17));
        assert_eq!(first_present(rows, |r| r.macd), Some(28));
        assert_eq!(first_present(rows, |r| r.adx), Some(30));

        let latest = frame.latest().unwrap();
        assert!(latest.ema20.is_some());
        assert!(latest.rsi.is_some());
        assert!(latest.macd_signal.is_some());
        assert!(latest.adx.is_some());
        assert!(latest.williams_r.is_some());
        assert!(latest.parabolic_sar.is_some());
        assert!(latest.obv.is_some());
    }
}
