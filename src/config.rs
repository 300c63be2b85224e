use std::num::{NonZeroU64, NonZeroUsize};
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;
use crate::generators::GeneratorKind;
use crate::nist::DEFAULT_BLOCK_SIZE;
use crate::stats::{DEFAULT_BINS, WORD_RANGE};

const DEFAULT_CONFIG_PATH: &str = "rngbench.toml";

pub const DEFAULT_SAMPLE_SIZES: [usize; 20] = [
    1000, 2000, 5000, 10000, 15000, 20000, 25000, 30000, 35000, 40000, 45000, 50000, 55000,
    60000, 70000, 75000, 80000, 85000, 90000, 100000,
];

const DEFAULT_GENERATORS: [GeneratorKind; 3] =
    [GeneratorKind::Lcg, GeneratorKind::Xorshift, GeneratorKind::Mwc];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub sample_sizes: Vec<usize>,
    pub trials: u32,
    pub bins: NonZeroUsize,
    pub block_size: usize,
    pub range: NonZeroU64,
    pub generators: Vec<GeneratorKind>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sample_sizes: DEFAULT_SAMPLE_SIZES.to_vec(),
            trials: 10,
            bins: NonZeroUsize::new(DEFAULT_BINS).unwrap_or(NonZeroUsize::MIN),
            block_size: DEFAULT_BLOCK_SIZE,
            range: NonZeroU64::new(WORD_RANGE).unwrap_or(NonZeroU64::MIN),
            generators: DEFAULT_GENERATORS.to_vec(),
        }
    }
}

impl BenchConfig {
    /// Clamp fields to valid ranges.
    pub fn validate(&mut self) {
        self.trials = self.trials.clamp(1, 1000);
        self.block_size = self.block_size.max(1);

        self.sample_sizes.retain(|&n| n > 0);
        if self.sample_sizes.is_empty() {
            log::warn!("no usable sample sizes configured, using defaults");
            self.sample_sizes = DEFAULT_SAMPLE_SIZES.to_vec();
        }

        let mut seen = Vec::with_capacity(self.generators.len());
        self.generators.retain(|g| {
            if seen.contains(g) {
                false
            } else {
                seen.push(*g);
                true
            }
        });
        if self.generators.is_empty() {
            self.generators = DEFAULT_GENERATORS.to_vec();
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub lcg: u64,
    pub xorshift: u64,
    pub mwc: u64,
    pub chacha: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            lcg: 1234,
            xorshift: 9876,
            mwc: 13579,
            chacha: 0,
        }
    }
}

impl SeedConfig {
    pub fn for_kind(&self, kind: GeneratorKind) -> u64 {
        match kind {
            GeneratorKind::Lcg => self.lcg,
            GeneratorKind::Xorshift => self.xorshift,
            GeneratorKind::Mwc => self.mwc,
            GeneratorKind::Chacha => self.chacha,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bench: BenchConfig,
    pub seeds: SeedConfig,
}

/// Load configuration from a TOML file.
///
/// - If `explicit_path` is `Some` and the file is missing, returns an error.
/// - If `explicit_path` is `None`, tries `./rngbench.toml`; if missing, returns defaults.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config, Error> {
    let path = match explicit_path {
        Some(p) => {
            if !p.exists() {
                return Err(Error::InvalidArgs(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if !default.exists() {
                return Ok(Config::default());
            }
            default.to_path_buf()
        }
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| Error::file(&path, e))?;

    let config: Config = toml::from_str(&contents).map_err(|e| {
        Error::InvalidArgs(format!("failed to parse config {}: {}", path.display(), e))
    })?;

    log::debug!("loaded config from {}", path.display());
    Ok(config)
}
