//! Arithmetic mean of every close in the supplied series (not windowed).

use crate::domain::PriceBar;

pub fn average_close(bars: &[PriceBar]) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }
    let sum: f64 = bars.iter().map(|b| b.close).sum();
    Some(sum / bars.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn averages_all_closes() {
        let bars = make_bars(&[(11.0, 9.0, 10.0), (21.0, 19.0, 20.0), (31.0, 29.0, 30.0)]);
        assert_approx(average_close(&bars).unwrap(), 20.0, DEFAULT_EPSILON);
    }

    #[test]
    fn empty_has_no_average() {
        assert_eq!(average_close(&[]), None);
    }
}
