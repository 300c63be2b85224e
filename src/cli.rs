use std::num::{NonZeroU64, NonZeroUsize};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::generators::GeneratorKind;
use crate::logging::LogArgs;
use crate::report::ReportFormat;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DumpFormat {
    /// Eight lowercase hex digits per word, one word per line
    Hex,
    /// Little-endian word bytes
    Raw,
    /// Base64 (standard, with padding) of the little-endian bytes
    Base64,
    /// 32-character bit strings, most significant bit first
    Binary,
    /// Unsigned decimal, one word per line
    Decimal,
}

/// Overrides for the benchmark plan. Unset values come from the config file.
#[derive(Debug, Args)]
pub struct BenchArgs {
    /// Comma-separated generators to benchmark
    #[arg(short = 'g', long, value_enum, value_delimiter = ',')]
    pub generators: Option<Vec<GeneratorKind>>,

    /// Comma-separated sample sizes, in words
    #[arg(short = 's', long, value_delimiter = ',')]
    pub sample_sizes: Option<Vec<usize>>,

    /// Trials per sample size (1-1000)
    #[arg(short = 't', long)]
    pub trials: Option<u32>,

    /// Chi-squared bin count
    #[arg(long)]
    pub bins: Option<NonZeroUsize>,

    /// Block size in bits for the block frequency test
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Value range for chi-squared binning (default: 2^32)
    #[arg(long)]
    pub range: Option<NonZeroU64>,

    /// Report format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = ReportFormat::Table)]
    pub format: ReportFormat,

    /// Write the report to a file instead of stdout
    #[arg(short = 'o', long = "output-file")]
    pub output_file: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[command(
    name = "rngbench",
    about = "Statistical quality benchmark for 32-bit pseudo-random generators"
)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Configuration file path (default: ./rngbench.toml)
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub bench: BenchArgs,

    #[command(flatten)]
    pub log: LogArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the test battery once over little-endian 32-bit words from a file
    Analyze(AnalyzeArgs),
    /// Write words from a generator
    Dump(DumpArgs),
}

#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Input file (default or "-": stdin)
    pub input: Option<PathBuf>,

    /// Chi-squared bin count
    #[arg(long)]
    pub bins: Option<NonZeroUsize>,

    /// Block size in bits for the block frequency test
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Value range for chi-squared binning (default: 2^32)
    #[arg(long)]
    pub range: Option<NonZeroU64>,

    /// Configuration file path (default: ./rngbench.toml)
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Debug, Parser)]
pub struct DumpArgs {
    /// Generator to draw words from
    #[arg(short = 'g', long, value_enum)]
    pub generator: GeneratorKind,

    /// Seed (default: the generator's seed from the config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of words to write
    #[arg(short = 'n', long = "count", default_value_t = 1000)]
    pub count: usize,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = DumpFormat::Hex)]
    pub format: DumpFormat,

    /// Write output to a file instead of stdout
    #[arg(short = 'o', long = "output-file")]
    pub output_file: Option<PathBuf>,

    /// Configuration file path (default: ./rngbench.toml)
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub log: LogArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bench_overrides() {
        let cli = Cli::try_parse_from([
            "rngbench",
            "--generators",
            "lcg,chacha",
            "--sample-sizes",
            "100,200",
            "--trials",
            "3",
            "--bins",
            "16",
            "--format",
            "csv",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(
            cli.bench.generators,
            Some(vec![GeneratorKind::Lcg, GeneratorKind::Chacha])
        );
        assert_eq!(cli.bench.sample_sizes, Some(vec![100, 200]));
        assert_eq!(cli.bench.trials, Some(3));
        assert_eq!(cli.bench.bins.map(|b| b.get()), Some(16));
        assert_eq!(cli.bench.format, ReportFormat::Csv);
    }

    #[test]
    fn test_zero_bins_rejected() {
        assert!(Cli::try_parse_from(["rngbench", "--bins", "0"]).is_err());
    }

    #[test]
    fn test_parse_dump() {
        let cli = Cli::try_parse_from([
            "rngbench", "dump", "-g", "xorshift", "-n", "8", "-f", "raw",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Dump(args)) => {
                assert_eq!(args.generator, GeneratorKind::Xorshift);
                assert_eq!(args.count, 8);
                assert!(matches!(args.format, DumpFormat::Raw));
                assert!(args.seed.is_none());
            }
            other => panic!("expected dump, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from(["rngbench", "analyze", "words.bin", "--block-size", "64"])
            .unwrap();
        match cli.command {
            Some(Command::Analyze(args)) => {
                assert_eq!(args.input, Some(PathBuf::from("words.bin")));
                assert_eq!(args.block_size, Some(64));
            }
            other => panic!("expected analyze, got {:?}", other),
        }
    }

    #[test]
    fn test_bench_args_conflict_with_subcommand() {
        assert!(Cli::try_parse_from(["rngbench", "--trials", "2", "dump", "-g", "lcg"]).is_err());
    }
}
