//! Bit-level randomness tests after NIST SP 800-22.
//!
//! Every test reads the buffer through [`BitView`], maps its statistic to a
//! p-value with the complementary error function, and passes when the
//! p-value is at least [`SIGNIFICANCE`](crate::stats::SIGNIFICANCE). Tests
//! that cannot be evaluated fail with no p-value.

use crate::bits::BitView;
use crate::stats::{erfc, TestResult};

/// Block frequency needs at least this many full blocks.
pub const MIN_BLOCKS: usize = 20;

pub const DEFAULT_BLOCK_SIZE: usize = 128;

/// Results of the five tests on one buffer.
#[derive(Debug, Clone)]
pub struct Battery {
    pub monobit: TestResult,
    pub block_frequency: TestResult,
    pub runs: TestResult,
    pub cumulative_sums: TestResult,
    pub serial2: TestResult,
}

impl Battery {
    pub fn all_passed(&self) -> bool {
        self.results().iter().all(|r| r.passed)
    }

    pub fn results(&self) -> [&TestResult; 5] {
        [
            &self.monobit,
            &self.block_frequency,
            &self.runs,
            &self.cumulative_sums,
            &self.serial2,
        ]
    }
}

/// Frequency (monobit) test: are ones and zeros balanced over the whole stream?
pub fn monobit(view: BitView<'_>) -> TestResult {
    let n = view.bit_len() as f64;
    let ones = view.ones();
    let s = (2.0 * ones as f64 - n).abs() / n.sqrt();
    let p = erfc(s / std::f64::consts::SQRT_2);
    TestResult::from_p("Monobit", p, s, format!("ones={}, n={}", ones, view.bit_len()))
}

/// Frequency test within non-overlapping blocks of `block_size` bits.
/// Trailing bits that do not fill a block are ignored.
pub fn block_frequency(view: BitView<'_>, block_size: usize) -> TestResult {
    let name = "Block Frequency";
    let n_blocks = if block_size == 0 {
        0
    } else {
        view.bit_len() / block_size
    };
    if n_blocks < MIN_BLOCKS {
        return TestResult::inconclusive(
            name,
            format!(
                "insufficient data: {} blocks of M={}, need {}",
                n_blocks, block_size, MIN_BLOCKS
            ),
        );
    }

    let mut chi = 0.0;
    for b in 0..n_blocks {
        let start = b * block_size;
        let ones: usize = (start..start + block_size)
            .map(|i| view.bit(i) as usize)
            .sum();
        let pi = ones as f64 / block_size as f64;
        chi += (pi - 0.5) * (pi - 0.5);
    }
    chi *= 4.0 * block_size as f64;

    let p = erfc((chi / 2.0).sqrt() / (n_blocks as f64 / 2.0).sqrt());
    TestResult::from_p(
        name,
        p,
        chi,
        format!("blocks={}, M={}", n_blocks, block_size),
    )
}

/// Runs test: number of maximal runs of identical bits.
///
/// Fails without a p-value when the proportion of ones is too far from 1/2
/// for the runs statistic to be meaningful.
pub fn runs(view: BitView<'_>) -> TestResult {
    let name = "Runs";
    let n = view.bit_len();

    let mut bits = view.bits();
    let mut prev = bits.next().unwrap_or(0);
    let mut ones = prev as u64;
    let mut run_count: u64 = 1;
    for bit in bits {
        ones += bit as u64;
        if bit != prev {
            run_count += 1;
            prev = bit;
        }
    }

    let nf = n as f64;
    let pi = ones as f64 / nf;
    if (pi - 0.5).abs() > 2.0 / nf.sqrt() {
        return TestResult::inconclusive(
            name,
            format!("frequency prerequisite failed: proportion={:.4}", pi),
        );
    }

    let expected = 2.0 * nf * pi * (1.0 - pi);
    let z = (run_count as f64 - expected).abs() / (2.0 * (2.0 * nf).sqrt() * pi * (1.0 - pi));
    TestResult::from_p(
        name,
        erfc(z),
        z,
        format!("runs={}, expected={:.0}", run_count, expected),
    )
}

/// Cumulative sums test: maximum excursion of the ±1 random walk.
pub fn cumulative_sums(view: BitView<'_>) -> TestResult {
    let name = "Cumulative Sums";
    let n = view.bit_len();

    let mut sum: i64 = 0;
    let mut zmax: u64 = 0;
    for bit in view.bits() {
        sum += if bit == 1 { 1 } else { -1 };
        zmax = zmax.max(sum.unsigned_abs());
    }

    match cusum_p_value(n, zmax) {
        Some(p) => TestResult::from_p(name, p, zmax as f64, format!("zmax={}, n={}", zmax, n)),
        None => TestResult::inconclusive(name, "zero excursion".to_string()),
    }
}

/// Series for the cumulative-sums p-value. `None` when `zmax` is 0.
fn cusum_p_value(n: usize, zmax: u64) -> Option<f64> {
    if zmax == 0 {
        return None;
    }
    let nf = n as f64;
    let z = zmax as f64;
    let scale = (2.0 * nf).sqrt();

    let start = ((-nf / z + 1.0) / 4.0).floor() as i64;
    let end = ((nf / z - 1.0) / 4.0).floor() as i64;

    let mut p = 1.0;
    for k in start..=end {
        let k = k as f64;
        let a = (4.0 * k + 1.0) * z / scale;
        let b = (4.0 * k - 1.0) * z / scale;
        p -= erfc(a) - erfc(b);
    }
    Some(p)
}

/// Single-bit counts `[zeros, ones]` and overlapping pair counts
/// `[00, 01, 10, 11]`, with the stream treated as cyclic so the last bit
/// pairs with the first.
pub fn serial_counts(view: BitView<'_>) -> ([u64; 2], [u64; 4]) {
    let n = view.bit_len();
    let mut c1 = [0u64; 2];
    let mut c2 = [0u64; 4];
    for i in 0..n {
        let b = view.bit(i) as usize;
        let next = view.bit((i + 1) % n) as usize;
        c1[b] += 1;
        c2[(b << 1) | next] += 1;
    }
    (c1, c2)
}

/// Second-order serial test: frequencies of 1- and 2-bit patterns.
pub fn serial2(view: BitView<'_>) -> TestResult {
    let (c1, c2) = serial_counts(view);
    let dn = view.bit_len() as f64;

    let sum_sq = |counts: &[u64]| counts.iter().map(|&c| (c as f64) * (c as f64)).sum::<f64>();
    let psi1 = sum_sq(&c1[..]) * 2.0 / dn - dn;
    let psi2 = sum_sq(&c2[..]) * 4.0 / dn - dn;

    let diff = (psi2 - psi1).abs();
    let p = erfc(diff / (2.0 * (2.0 * dn).sqrt()));
    TestResult::from_p(
        "Serial-2",
        p,
        diff,
        format!("psi1={:.3}, psi2={:.3}", psi1, psi2),
    )
}

/// Run all five tests on one buffer.
pub fn battery(view: BitView<'_>, block_size: usize) -> Battery {
    Battery {
        monobit: monobit(view),
        block_frequency: block_frequency(view, block_size),
        runs: runs(view),
        cumulative_sums: cumulative_sums(view),
        serial2: serial2(view),
    }
}
