//! Turtle evaluator integration and property tests.
//!
//! Reference scenarios on the five-bar fixture, then proptest checks that the
//! evaluator agrees with a direct max/min over the trailing windows.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use turtle_core::strategy::{analyze, decide};
use turtle_core::{evaluate, PriceBar, PriceSeries, Signal, TurtleParams};

fn bars_from(rows: &[(f64, f64, f64)]) -> Vec<PriceBar> {
    let base = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    rows.iter()
        .enumerate()
        .map(|(i, &(high, low, close))| PriceBar {
            date: base + chrono::Duration::days(i as i64),
            open: close,
            high,
            low,
            close,
            volume: 1_000,
        })
        .collect()
}

fn reference(last_close: f64) -> Vec<PriceBar> {
    bars_from(&[
        (242.0, 238.0, 240.0),
        (247.0, 243.0, 245.0),
        (252.0, 248.0, 250.0),
        (257.0, 253.0, 255.0),
        (261.0, 258.0, last_close),
    ])
}

fn five_five() -> TurtleParams {
    TurtleParams::new(5, 5).unwrap()
}

// ── Reference scenarios ──────────────────────────────────────────────

#[test]
fn reference_inside_channel_holds() {
    let result = analyze("AAPL", &reference(260.0), &five_five(), Utc::now()).unwrap();
    assert_eq!(result.current_price, 260.0);
    assert_eq!(result.high_of_entry_window, 261.0);
    assert_eq!(result.low_of_exit_window, 238.0);
    assert_eq!(result.signal, Signal::Hold);
}

#[test]
fn reference_breakout_buys() {
    assert_eq!(evaluate(&reference(262.0), &five_five()), Signal::Buy);
}

#[test]
fn reference_breakdown_sells() {
    assert_eq!(evaluate(&reference(237.0), &five_five()), Signal::Sell);
}

#[test]
fn evaluation_through_series_matches_raw_bars() {
    // Shuffled input is canonicalized before evaluation.
    let mut bars = reference(262.0);
    bars.reverse();
    let series = PriceSeries::new("AAPL", bars);
    assert_eq!(evaluate(series.bars(), &five_five()), Signal::Buy);
}

#[test]
fn as_of_trims_future_bars() {
    let series = PriceSeries::new("AAPL", reference(262.0));
    let cutoff = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
    let trimmed = series.as_of(cutoff);
    assert_eq!(trimmed.len(), 4);
    let params = TurtleParams::new(4, 4).unwrap();
    // 255 is below the 257 window high and above the 238 low.
    assert_eq!(evaluate(trimmed.bars(), &params), Signal::Hold);
}

// ── Properties ───────────────────────────────────────────────────────

fn arb_bar() -> impl Strategy<Value = (f64, f64, f64)> {
    (10.0..500.0_f64, 0.0..20.0_f64, 0.0..1.0_f64).prop_map(|(low, range, frac)| {
        let low = (low * 100.0).round() / 100.0;
        let high = ((low + range) * 100.0).round() / 100.0;
        let close = ((low + (high - low) * frac) * 100.0).round() / 100.0;
        (high, low, close)
    })
}

fn arb_rows(min: usize, max: usize) -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec(arb_bar(), min..max)
}

fn expected(bars: &[PriceBar], params: &TurtleParams) -> Signal {
    let close = bars[bars.len() - 1].close;
    let entry_from = bars.len().saturating_sub(params.entry_period());
    let exit_from = bars.len().saturating_sub(params.exit_period());
    let high = bars[entry_from..]
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let low = bars[exit_from..]
        .iter()
        .map(|b| b.low)
        .fold(f64::INFINITY, f64::min);
    if close >= high {
        Signal::Buy
    } else if close <= low {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

proptest! {
    /// With enough history the evaluator agrees with a direct window scan.
    #[test]
    fn evaluator_matches_window_scan(
        rows in arb_rows(1, 80),
        entry in 1usize..30,
        exit in 1usize..30,
    ) {
        let bars = bars_from(&rows);
        let params = TurtleParams::new(entry, exit).unwrap();
        prop_assume!(bars.len() >= entry);
        prop_assert_eq!(evaluate(&bars, &params), expected(&bars, &params));
    }

    /// A series shorter than the entry window always holds.
    #[test]
    fn short_series_always_holds(rows in arb_rows(0, 20), exit in 1usize..15) {
        let bars = bars_from(&rows);
        let params = TurtleParams::new(20, exit).unwrap();
        prop_assert_eq!(evaluate(&bars, &params), Signal::Hold);
    }

    /// BUY takes precedence whenever the breakout condition holds.
    #[test]
    fn breakout_wins_over_breakdown(current in 1.0..500.0_f64, gap in 0.0..50.0_f64) {
        prop_assert_eq!(decide(current, current - gap, current + gap), Signal::Buy);
    }

    /// Reported levels bracket the window the evaluator read.
    #[test]
    fn reported_levels_come_from_the_series(rows in arb_rows(20, 60)) {
        let bars = bars_from(&rows);
        let params = TurtleParams::default();
        let result = analyze("X", &bars, &params, Utc::now()).unwrap();
        prop_assert!(bars.iter().any(|b| b.high == result.high_of_entry_window));
        prop_assert!(bars.iter().any(|b| b.low == result.low_of_exit_window));
        prop_assert_eq!(result.current_price, bars[bars.len() - 1].close);
        prop_assert_eq!(result.signal, evaluate(&bars, &params));
    }
}
