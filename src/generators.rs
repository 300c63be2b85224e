use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use serde::Deserialize;

use crate::mixer;

/// A source of 32-bit words.
pub trait WordSource {
    fn next_word(&mut self) -> u32;

    /// Fill `buf` with consecutive words.
    fn fill(&mut self, buf: &mut [u32]) {
        for w in buf.iter_mut() {
            *w = self.next_word();
        }
    }
}

impl<F: FnMut() -> u32> WordSource for F {
    fn next_word(&mut self) -> u32 {
        self()
    }
}

/// Linear congruential generator, `x = 1664525 * x + 1013904223 (mod 2^32)`.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    const A: u32 = 1_664_525;
    const C: u32 = 1_013_904_223;
    pub const DEFAULT_SEED: u32 = 1;

    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }
}

impl WordSource for Lcg {
    fn next_word(&mut self) -> u32 {
        self.state = Self::A.wrapping_mul(self.state).wrapping_add(Self::C);
        self.state
    }
}

/// Marsaglia xorshift with shifts 13, 17, 5.
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub const DEFAULT_SEED: u32 = 2_463_534_242;

    /// A zero seed is a fixed point of the recurrence and is replaced by
    /// [`Self::DEFAULT_SEED`].
    pub fn new(seed: u32) -> Self {
        let state = if seed == 0 {
            log::warn!("xorshift seed 0 is degenerate, using {}", Self::DEFAULT_SEED);
            Self::DEFAULT_SEED
        } else {
            seed
        };
        Self { state }
    }
}

impl WordSource for XorShift32 {
    fn next_word(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

/// Multiply-with-carry, lag 1, multiplier 4294957665.
#[derive(Debug, Clone)]
pub struct Mwc {
    state: u32,
    carry: u32,
}

impl Mwc {
    const A: u64 = 4_294_957_665;
    pub const DEFAULT_SEED: u64 = 88_172_645_463_325_252;

    /// The low 32 bits of `seed` become the state and the high 32 bits the
    /// carry. A zero seed is a fixed point and is replaced by
    /// [`Self::DEFAULT_SEED`].
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 {
            log::warn!("mwc seed 0 is degenerate, using {}", Self::DEFAULT_SEED);
            Self::DEFAULT_SEED
        } else {
            seed
        };
        Self {
            state: seed as u32,
            carry: (seed >> 32) as u32,
        }
    }
}

impl WordSource for Mwc {
    fn next_word(&mut self) -> u32 {
        let p = Self::A * self.state as u64 + self.carry as u64;
        self.state = p as u32;
        self.carry = (p >> 32) as u32;
        self.state
    }
}

/// ChaCha20 stream used as a cryptographic baseline.
pub struct ChaChaSource {
    rng: ChaCha20Rng,
}

impl ChaChaSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(mixer::expand_seed("chacha", seed)),
        }
    }
}

impl WordSource for ChaChaSource {
    fn next_word(&mut self) -> u32 {
        self.rng.next_u32()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    Lcg,
    Xorshift,
    Mwc,
    Chacha,
}

impl GeneratorKind {
    pub fn name(&self) -> &'static str {
        match self {
            GeneratorKind::Lcg => "LCG",
            GeneratorKind::Xorshift => "XORShift",
            GeneratorKind::Mwc => "MWC",
            GeneratorKind::Chacha => "ChaCha20",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GeneratorKind::Lcg => "linear congruential (a=1664525, c=1013904223)",
            GeneratorKind::Xorshift => "xorshift32 (13, 17, 5)",
            GeneratorKind::Mwc => "multiply-with-carry (a=4294957665)",
            GeneratorKind::Chacha => "ChaCha20 keyed by BLAKE2b-256(seed)",
        }
    }

    /// Build a generator. 32-bit generators use the low 32 bits of `seed`.
    pub fn build(&self, seed: u64) -> Box<dyn WordSource> {
        match self {
            GeneratorKind::Lcg => Box::new(Lcg::new(seed as u32)),
            GeneratorKind::Xorshift => Box::new(XorShift32::new(seed as u32)),
            GeneratorKind::Mwc => Box::new(Mwc::new(seed)),
            GeneratorKind::Chacha => Box::new(ChaChaSource::new(seed)),
        }
    }
}
