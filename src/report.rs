use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::Path;

use clap::ValueEnum;

use crate::bench::RowStats;
use crate::error::Error;
use crate::stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Aligned table
    Table,
    /// Comma-separated values with a header row
    Csv,
}

const CSV_HEADER: &str = "generator,sample_size,trials,mean,stdev,cv,chi2,chi2_p,monobit,\
block_frequency,runs,cumulative_sums,serial2,test_ms";

/// Writes the report to stdout or a file.
pub fn write_report(
    rows: &[RowStats],
    format: ReportFormat,
    bins: NonZeroUsize,
    output_file: Option<&Path>,
) -> Result<(), Error> {
    match output_file {
        Some(path) => {
            let f = File::create(path).map_err(|e| Error::file(path, e))?;
            let mut out = BufWriter::new(f);
            format_report(rows, format, bins, &mut out)?;
            out.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            format_report(rows, format, bins, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn format_report(
    rows: &[RowStats],
    format: ReportFormat,
    bins: NonZeroUsize,
    out: &mut dyn Write,
) -> io::Result<()> {
    let df = bins.get() - 1;
    match format {
        ReportFormat::Table => write_table(rows, df, out),
        ReportFormat::Csv => write_csv(rows, df, out),
    }
}

fn chi2_p(row: &RowStats, df: usize) -> Option<f64> {
    stats::chi_square_p_value(row.avg(row.chi2_sum), df)
}

fn write_table(rows: &[RowStats], df: usize, out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "{:<9} {:>7} | {:>14} | {:>14} | {:>6} | {:>10} | {:>6} | {:>7} | {:>10} | {:>6} | {:>15} | {:>7} | {:>10}",
        "Generator",
        "Size",
        "Mean",
        "StdDev",
        "CV",
        "chi2",
        "chi2 p",
        "monobit",
        "block freq",
        "runs",
        "cumulative sums",
        "serial2",
        "time"
    )?;

    for row in rows {
        let p = match chi2_p(row, df) {
            Some(p) => format!("{:.3}", p),
            None => "n/a".to_string(),
        };
        writeln!(
            out,
            "{:<9} {:>7} | {:>14.2} | {:>14.2} | {:>6.3} | {:>10.2} | {:>6} | {:>7.2} | {:>10.2} | {:>6.2} | {:>15.2} | {:>7.2} | {:>7.2} ms",
            row.generator.name(),
            row.sample_size,
            row.avg(row.mean_sum),
            row.avg(row.stdev_sum),
            row.avg(row.cv_sum),
            row.avg(row.chi2_sum),
            p,
            row.pass_rate(0),
            row.pass_rate(1),
            row.pass_rate(2),
            row.pass_rate(3),
            row.pass_rate(4),
            row.test_ms_per_trial()
        )?;
    }
    Ok(())
}

fn write_csv(rows: &[RowStats], df: usize, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{}", CSV_HEADER)?;
    for row in rows {
        let p = chi2_p(row, df).map(|p| format!("{:.6}", p)).unwrap_or_default();
        writeln!(
            out,
            "{},{},{},{:.4},{:.4},{:.6},{:.4},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4}",
            row.generator.name(),
            row.sample_size,
            row.trials,
            row.avg(row.mean_sum),
            row.avg(row.stdev_sum),
            row.avg(row.cv_sum),
            row.avg(row.chi2_sum),
            p,
            row.pass_rate(0),
            row.pass_rate(1),
            row.pass_rate(2),
            row.pass_rate(3),
            row.pass_rate(4),
            row.test_ms_per_trial()
        )?;
    }
    Ok(())
}
