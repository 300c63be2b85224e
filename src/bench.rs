use std::num::{NonZeroU64, NonZeroUsize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::bits::BitView;
use crate::cli::BenchArgs;
use crate::config::Config;
use crate::error::Error;
use crate::generators::GeneratorKind;
use crate::nist::{self, Battery};
use crate::report;
use crate::stats::{self, Summary};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Number of pass/fail tests tracked per row, in [`Battery::results`] order.
pub const TEST_COUNT: usize = 5;

/// Accumulated results for one generator at one sample size.
#[derive(Debug, Clone)]
pub struct RowStats {
    pub generator: GeneratorKind,
    pub sample_size: usize,
    pub trials: u32,
    pub mean_sum: f64,
    pub stdev_sum: f64,
    pub cv_sum: f64,
    pub chi2_sum: f64,
    pub passes: [u32; TEST_COUNT],
    pub gen_time: Duration,
    pub test_time: Duration,
}

impl RowStats {
    pub fn new(generator: GeneratorKind, sample_size: usize) -> Self {
        Self {
            generator,
            sample_size,
            trials: 0,
            mean_sum: 0.0,
            stdev_sum: 0.0,
            cv_sum: 0.0,
            chi2_sum: 0.0,
            passes: [0; TEST_COUNT],
            gen_time: Duration::ZERO,
            test_time: Duration::ZERO,
        }
    }

    fn record(&mut self, trial: &Trial) {
        self.trials += 1;
        self.mean_sum += trial.summary.mean;
        self.stdev_sum += trial.summary.stdev;
        self.cv_sum += trial.summary.cv;
        self.chi2_sum += trial.chi2;
        for (count, result) in self.passes.iter_mut().zip(trial.battery.results()) {
            if result.passed {
                *count += 1;
            }
        }
    }

    pub fn avg(&self, sum: f64) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        sum / self.trials as f64
    }

    /// Fraction of trials in which test `idx` passed.
    pub fn pass_rate(&self, idx: usize) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.passes[idx] as f64 / self.trials as f64
    }

    /// Average battery time per trial, in milliseconds.
    pub fn test_ms_per_trial(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        1000.0 * self.test_time.as_secs_f64() / self.trials as f64
    }
}

/// Everything computed from one buffer.
pub struct Trial {
    pub summary: Summary,
    pub chi2: f64,
    pub battery: Battery,
}

pub fn run_trial(
    view: BitView<'_>,
    bins: NonZeroUsize,
    range: NonZeroU64,
    block_size: usize,
) -> Trial {
    Trial {
        summary: stats::summarize(view),
        chi2: stats::chi_squared(view, bins, range),
        battery: nist::battery(view, block_size),
    }
}

/// Run the benchmark plan in `config`, stopping early once `shutdown` is set.
/// Rows with no completed trial are dropped. A zero sample size, which
/// [`BenchConfig::validate`](crate::config::BenchConfig::validate) removes,
/// is an [`Error::EmptySample`].
pub fn run_plan(config: &Config, shutdown: &AtomicBool) -> Result<Vec<RowStats>, Error> {
    let plan = &config.bench;
    let mut rows = Vec::with_capacity(plan.generators.len() * plan.sample_sizes.len());

    'outer: for &kind in &plan.generators {
        let seed = config.seeds.for_kind(kind);
        let mut source = kind.build(seed);
        log::info!("benchmarking {} ({}), seed {}", kind.name(), kind.description(), seed);

        for &size in &plan.sample_sizes {
            let mut row = RowStats::new(kind, size);
            let mut buffer = vec![0u32; size];

            for trial_idx in 0..plan.trials {
                if shutdown.load(Ordering::Relaxed) {
                    if row.trials > 0 {
                        rows.push(row);
                    }
                    break 'outer;
                }

                let gen_start = Instant::now();
                source.fill(&mut buffer);
                row.gen_time += gen_start.elapsed();

                let view = BitView::new(&buffer)?;

                let test_start = Instant::now();
                let trial = run_trial(view, plan.bins, plan.range, plan.block_size);
                row.test_time += test_start.elapsed();

                log::debug!(
                    "{} n={} trial {}: chi2={:.2}, all passed={}",
                    kind.name(),
                    size,
                    trial_idx,
                    trial.chi2,
                    trial.battery.all_passed()
                );
                row.record(&trial);
            }

            log::info!(
                "{} n={}: {} trials, {:.2} ms/trial",
                kind.name(),
                size,
                row.trials,
                row.test_ms_per_trial()
            );
            rows.push(row);
        }
    }

    Ok(rows)
}

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

fn install_signal_handlers() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = signal_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut sa.sa_mask);
        libc::sigaction(libc::SIGTERM, &sa, std::ptr::null_mut());
        libc::sigaction(libc::SIGINT, &sa, std::ptr::null_mut());
    }
}

/// Layer CLI overrides onto the loaded config.
pub fn apply_overrides(config: &mut Config, args: &BenchArgs) {
    let plan = &mut config.bench;
    if let Some(ref v) = args.generators {
        plan.generators = v.clone();
    }
    if let Some(ref v) = args.sample_sizes {
        plan.sample_sizes = v.clone();
    }
    if let Some(v) = args.trials {
        plan.trials = v;
    }
    if let Some(v) = args.bins {
        plan.bins = v;
    }
    if let Some(v) = args.block_size {
        plan.block_size = v;
    }
    if let Some(v) = args.range {
        plan.range = v;
    }
    plan.validate();
}

pub fn run(args: &BenchArgs, config: &Config) -> Result<(), Error> {
    install_signal_handlers();

    let plan = &config.bench;
    let names: Vec<&str> = plan.generators.iter().map(|g| g.name()).collect();
    log::info!(
        "benchmark: generators=[{}], {} sample sizes, {} trials, bins={}, M={}",
        names.join(", "),
        plan.sample_sizes.len(),
        plan.trials,
        plan.bins,
        plan.block_size
    );

    let start = Instant::now();
    let rows = run_plan(config, &SHUTDOWN)?;

    if SHUTDOWN.load(Ordering::Relaxed) {
        log::warn!(
            "interrupted after {:.1}s, reporting {} completed rows",
            start.elapsed().as_secs_f64(),
            rows.len()
        );
    } else {
        log::info!("completed in {:.1}s", start.elapsed().as_secs_f64());
    }

    report::write_report(&rows, args.format, plan.bins, args.output_file.as_deref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BenchConfig;
    use crate::generators::{Lcg, WordSource};
    use crate::report::ReportFormat;

    fn small_config(generators: Vec<GeneratorKind>, sizes: Vec<usize>, trials: u32) -> Config {
        Config {
            bench: BenchConfig {
                sample_sizes: sizes,
                trials,
                generators,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_lcg_end_to_end_trial() {
        let mut lcg = Lcg::new(1234);
        let mut words = vec![0u32; 1000];
        lcg.fill(&mut words);
        let view = BitView::new(&words).unwrap();

        let bins = NonZeroUsize::new(1000).unwrap();
        let range = NonZeroU64::new(stats::WORD_RANGE).unwrap();
        let trial = run_trial(view, bins, range, nist::DEFAULT_BLOCK_SIZE);

        assert_eq!(trial.chi2, 1066.0);
        assert!((trial.summary.mean - 2_133_365_392.14).abs() < 1e-3);
        assert!(trial.summary.stdev > 0.0);
        assert!(trial.summary.cv > 0.0 && trial.summary.cv < 1.0);
        for result in trial.battery.results() {
            let p = result.p_value.expect("1000 words is enough for every test");
            assert!((0.0..=1.0).contains(&p), "{}: p={}", result.name, p);
        }
    }

    #[test]
    fn test_run_plan_rows_and_counts() {
        let config = small_config(vec![GeneratorKind::Lcg, GeneratorKind::Mwc], vec![100, 200], 3);
        let rows = run_plan(&config, &AtomicBool::new(false)).unwrap();

        assert_eq!(rows.len(), 4);
        let order: Vec<(GeneratorKind, usize)> =
            rows.iter().map(|r| (r.generator, r.sample_size)).collect();
        assert_eq!(
            order,
            vec![
                (GeneratorKind::Lcg, 100),
                (GeneratorKind::Lcg, 200),
                (GeneratorKind::Mwc, 100),
                (GeneratorKind::Mwc, 200),
            ]
        );
        for row in &rows {
            assert_eq!(row.trials, 3);
            for i in 0..TEST_COUNT {
                assert!(row.passes[i] <= 3);
                assert!((0.0..=1.0).contains(&row.pass_rate(i)));
            }
        }
    }

    #[test]
    fn test_generator_state_carries_across_trials() {
        // The first trial of a run must match the first 100 words of a fresh
        // generator, and the second trial the next 100.
        let config = small_config(vec![GeneratorKind::Lcg], vec![100], 2);
        let rows = run_plan(&config, &AtomicBool::new(false)).unwrap();

        let mut lcg = Lcg::new(1234);
        let mut words = vec![0u32; 200];
        lcg.fill(&mut words);
        let m1 = stats::mean(BitView::new(&words[..100]).unwrap());
        let m2 = stats::mean(BitView::new(&words[100..]).unwrap());
        assert!((rows[0].mean_sum - (m1 + m2)).abs() < 1e-3);
    }

    #[test]
    fn test_run_plan_stops_on_shutdown() {
        let config = small_config(vec![GeneratorKind::Lcg], vec![100], 3);
        let rows = run_plan(&config, &AtomicBool::new(true)).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_run_plan_rejects_zero_sample_size() {
        let config = small_config(vec![GeneratorKind::Lcg], vec![0], 1);
        let result = run_plan(&config, &AtomicBool::new(false));
        assert!(matches!(result, Err(Error::EmptySample)));
    }

    #[test]
    fn test_row_stats_empty_averages() {
        let row = RowStats::new(GeneratorKind::Lcg, 10);
        assert_eq!(row.avg(5.0), 0.0);
        assert_eq!(row.pass_rate(0), 0.0);
        assert_eq!(row.test_ms_per_trial(), 0.0);
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        let args = BenchArgs {
            generators: Some(vec![GeneratorKind::Chacha, GeneratorKind::Chacha]),
            sample_sizes: Some(vec![64]),
            trials: Some(0),
            bins: None,
            block_size: Some(32),
            range: None,
            format: ReportFormat::Table,
            output_file: None,
        };
        apply_overrides(&mut config, &args);
        assert_eq!(config.bench.generators, vec![GeneratorKind::Chacha]);
        assert_eq!(config.bench.sample_sizes, vec![64]);
        assert_eq!(config.bench.trials, 1);
        assert_eq!(config.bench.block_size, 32);
        assert_eq!(config.bench.bins.get(), 1000);
    }
}
