use std::fs::File;
use std::io::{self, Read, Write};
use std::num::NonZeroUsize;
use std::path::Path;

use crate::bench::{self, Trial};
use crate::bits::{self, BitView};
use crate::cli::AnalyzeArgs;
use crate::config::BenchConfig;
use crate::error::Error;
use crate::stats;

fn read_input(path: Option<&Path>) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    match path {
        Some(p) if p != Path::new("-") => {
            File::open(p)
                .and_then(|mut f| f.read_to_end(&mut buf))
                .map_err(|e| Error::file(p, e))?;
        }
        _ => {
            io::stdin().lock().read_to_end(&mut buf)?;
        }
    }
    Ok(buf)
}

fn verdict(passed: bool) -> &'static str {
    if passed {
        "pass"
    } else {
        "FAIL"
    }
}

fn write_analysis(
    trial: &Trial,
    words: usize,
    bins: NonZeroUsize,
    out: &mut dyn Write,
) -> io::Result<()> {
    writeln!(out, "Words: {} ({} bits)", words, words * bits::WORD_BITS)?;
    writeln!(
        out,
        "  Mean {:.2}   StdDev {:.2}   CV {:.4}",
        trial.summary.mean, trial.summary.stdev, trial.summary.cv
    )?;
    let chi_p = stats::chi_square_p_value(trial.chi2, bins.get() - 1)
        .map(|p| format!("{:.4}", p))
        .unwrap_or_else(|| "n/a".to_string());
    writeln!(
        out,
        "  Chi-sq {:.2} over {} bins (p={})",
        trial.chi2, bins, chi_p
    )?;
    writeln!(out)?;

    for result in trial.battery.results() {
        let p = result
            .p_value
            .map(|p| format!("{:.6}", p))
            .unwrap_or_else(|| "n/a".to_string());
        writeln!(
            out,
            "  {:<16} {:<4}  p={:<8}  stat={:<12.4}  {}",
            result.name,
            verdict(result.passed),
            p,
            result.statistic,
            result.detail
        )?;
    }
    Ok(())
}

/// Run the full battery once over the words in the input.
pub fn run(args: &AnalyzeArgs, plan: &BenchConfig) -> Result<(), Error> {
    let bytes = read_input(args.input.as_deref())?;
    let (words, leftover) = bits::words_from_le_bytes(&bytes);
    if leftover > 0 {
        log::warn!("ignoring {} trailing bytes that do not fill a word", leftover);
    }

    let view = BitView::new(&words)?;
    if view.len() < plan.bins.get() {
        log::warn!(
            "{} words is fewer than {} bins, chi-squared is not meaningful",
            view.len(),
            plan.bins
        );
    }

    let trial = bench::run_trial(view, plan.bins, plan.range, plan.block_size);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_analysis(&trial, view.len(), plan.bins, &mut out)?;
    out.flush()?;
    Ok(())
}
