use std::num::{NonZeroU64, NonZeroUsize};

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::bits::BitView;

pub use statrs::function::erf::erfc;

/// Significance level shared by every pass/fail test.
pub const SIGNIFICANCE: f64 = 0.01;

/// Number of distinct values a 32-bit word can take.
pub const WORD_RANGE: u64 = 1 << 32;

pub const DEFAULT_BINS: usize = 1000;

/// Result of a single statistical test.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub name: &'static str,
    pub passed: bool,
    /// `None` when the test stopped before reaching a p-value
    /// (insufficient data or a failed prerequisite).
    pub p_value: Option<f64>,
    pub statistic: f64,
    pub detail: String,
}

impl TestResult {
    /// Verdict from a p-value at [`SIGNIFICANCE`]. The stored p-value is
    /// clamped to [0, 1].
    pub fn from_p(name: &'static str, p: f64, statistic: f64, detail: String) -> Self {
        TestResult {
            name,
            passed: p >= SIGNIFICANCE,
            p_value: Some(p.clamp(0.0, 1.0)),
            statistic,
            detail,
        }
    }

    /// Failing result for a test that could not be evaluated.
    pub fn inconclusive(name: &'static str, detail: String) -> Self {
        TestResult {
            name,
            passed: false,
            p_value: None,
            statistic: 0.0,
            detail,
        }
    }
}

/// Mean, standard deviation and coefficient of variation of one buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub stdev: f64,
    pub cv: f64,
}

/// Arithmetic mean of the words.
pub fn mean(view: BitView<'_>) -> f64 {
    let sum: u128 = view.words().iter().map(|&w| w as u128).sum();
    sum as f64 / view.len() as f64
}

/// Population standard deviation around a mean computed from the same buffer.
pub fn stdev(view: BitView<'_>, mean: f64) -> f64 {
    let acc: f64 = view
        .words()
        .iter()
        .map(|&w| {
            let d = w as f64 - mean;
            d * d
        })
        .sum();
    (acc / view.len() as f64).sqrt()
}

/// `sd / m`, or 0 when the mean is 0.
pub fn coeff_var(mean: f64, sd: f64) -> f64 {
    if mean == 0.0 {
        0.0
    } else {
        sd / mean
    }
}

pub fn summarize(view: BitView<'_>) -> Summary {
    let m = mean(view);
    let sd = stdev(view, m);
    Summary {
        mean: m,
        stdev: sd,
        cv: coeff_var(m, sd),
    }
}

/// Chi-squared statistic of the words against a uniform distribution over
/// `[0, range)` split into `bins` equal bins.
///
/// Word `x` lands in bin `x * bins / range`; anything past the last bin is
/// counted in the last bin. Meaningful only when `len() >= bins`.
pub fn chi_squared(view: BitView<'_>, bins: NonZeroUsize, range: NonZeroU64) -> f64 {
    let bins = bins.get();
    let mut freq = vec![0u64; bins];
    for &w in view.words() {
        let idx = (w as u128 * bins as u128 / range.get() as u128) as usize;
        freq[idx.min(bins - 1)] += 1;
    }

    let expected = view.len() as f64 / bins as f64;
    freq.iter()
        .map(|&obs| {
            let diff = obs as f64 - expected;
            diff * diff / expected
        })
        .sum()
}

/// Upper-tail p-value of a chi-squared statistic with `df` degrees of freedom.
/// Returns `None` for `df == 0`.
pub fn chi_square_p_value(chi_sq: f64, df: usize) -> Option<f64> {
    let dist = ChiSquared::new(df as f64).ok()?;
    Some(dist.sf(chi_sq))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(words: &[u32]) -> BitView<'_> {
        BitView::new(words).unwrap()
    }

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn full_range() -> NonZeroU64 {
        NonZeroU64::new(WORD_RANGE).unwrap()
    }

    // --- Summary statistics ---

    #[test]
    fn test_mean_no_overflow() {
        let words = [u32::MAX; 64];
        assert_eq!(mean(view(&words)), u32::MAX as f64);
    }

    #[test]
    fn test_mean_matches_exact_sum() {
        let words: Vec<u32> = (0..5000u32).map(|i| i.wrapping_mul(2_654_435_761)).collect();
        let exact: u128 = words.iter().map(|&w| w as u128).sum();
        let m = mean(view(&words));
        assert_eq!(m, exact as f64 / words.len() as f64);
        assert!((0.0..WORD_RANGE as f64).contains(&m));
    }

    #[test]
    fn test_stdev_constant_is_zero() {
        let words = [7u32; 100];
        let v = view(&words);
        assert_eq!(stdev(v, mean(v)), 0.0);
    }

    #[test]
    fn test_stdev_known_value() {
        let words = [0u32, 2, 0, 2];
        let v = view(&words);
        let m = mean(v);
        assert_eq!(m, 1.0);
        assert!((stdev(v, m) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_stdev_positive_when_values_differ() {
        let words = [5u32, 5, 5, 6];
        let v = view(&words);
        assert!(stdev(v, mean(v)) > 0.0);
    }

    #[test]
    fn test_coeff_var_zero_mean() {
        assert_eq!(coeff_var(0.0, 123.0), 0.0);
    }

    #[test]
    fn test_coeff_var_ratio() {
        assert_eq!(coeff_var(4.0, 2.0), 0.5);
    }

    #[test]
    fn test_summarize() {
        let words = [0u32, 2, 0, 2];
        let s = summarize(view(&words));
        assert_eq!(s.mean, 1.0);
        assert!((s.stdev - 1.0).abs() < 1e-12);
        assert!((s.cv - 1.0).abs() < 1e-12);
    }

    // --- Chi-squared ---

    #[test]
    fn test_chi_squared_perfectly_uniform() {
        // Four bins of width 2^30, each hit exactly 25 times.
        let words: Vec<u32> = (0..100u32).map(|i| (i % 4) << 30).collect();
        assert_eq!(chi_squared(view(&words), nz(4), full_range()), 0.0);
    }

    #[test]
    fn test_chi_squared_max_word_lands_in_last_bin() {
        let words = [u32::MAX; 10];
        // All 10 in bin 9: (10 - 1)^2 / 1 + 9 * (0 - 1)^2 / 1
        assert_eq!(chi_squared(view(&words), nz(10), full_range()), 90.0);
    }

    #[test]
    fn test_chi_squared_clamps_out_of_range_words() {
        let words = [5000u32; 10];
        let range = NonZeroU64::new(1000).unwrap();
        assert_eq!(chi_squared(view(&words), nz(10), range), 90.0);
    }

    #[test]
    fn test_chi_squared_single_bin() {
        let words = [1u32, 2, 3];
        assert_eq!(chi_squared(view(&words), nz(1), full_range()), 0.0);
    }

    #[test]
    fn test_chi_square_p_value() {
        // Median of chi-squared(2) is 2 ln 2.
        let p = chi_square_p_value(2.0 * std::f64::consts::LN_2, 2).unwrap();
        assert!((p - 0.5).abs() < 1e-9, "expected 0.5, got {}", p);
        assert!(chi_square_p_value(1.0, 0).is_none());
    }

    // --- TestResult ---

    #[test]
    fn test_from_p_threshold() {
        assert!(TestResult::from_p("t", 0.01, 0.0, String::new()).passed);
        assert!(!TestResult::from_p("t", 0.0099, 0.0, String::new()).passed);
    }

    #[test]
    fn test_from_p_clamps() {
        let r = TestResult::from_p("t", 2.5, 0.0, String::new());
        assert!(r.passed);
        assert_eq!(r.p_value, Some(1.0));
    }

    #[test]
    fn test_inconclusive_fails() {
        let r = TestResult::inconclusive("t", "too short".into());
        assert!(!r.passed);
        assert!(r.p_value.is_none());
    }
}
