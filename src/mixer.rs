use blake2::{
    digest::{consts::U32, Digest},
    Blake2b,
};

type Blake2b256 = Blake2b<U32>;

/// Expands a 64-bit seed into a 32-byte key through BLAKE2b-256, with a
/// domain tag and a length-prefixed label so different generators never
/// share a key for the same seed.
pub fn expand_seed(label: &str, seed: u64) -> [u8; 32] {
    let mut hasher = Blake2b256::new();

    hasher.update(b"rngbench-seed-v1");

    let label_bytes = label.as_bytes();
    hasher.update((label_bytes.len() as u64).to_le_bytes());
    hasher.update(label_bytes);
    hasher.update(seed.to_le_bytes());

    let mut key = [0u8; 32];
    key.copy_from_slice(&hasher.finalize());
    key
}
