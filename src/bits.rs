use crate::error::Error;

/// Bits per sample word.
pub const WORD_BITS: usize = 32;

/// Read-only view over a non-empty buffer of 32-bit words.
///
/// The same buffer is seen two ways: as `len()` numeric samples through
/// [`BitView::words`], and as one bitstream of `bit_len()` bits where bit `i`
/// is bit `i % 32` (LSB first) of word `i / 32`.
#[derive(Debug, Clone, Copy)]
pub struct BitView<'a> {
    words: &'a [u32],
}

impl<'a> BitView<'a> {
    pub fn new(words: &'a [u32]) -> Result<Self, Error> {
        if words.is_empty() {
            return Err(Error::EmptySample);
        }
        Ok(Self { words })
    }

    pub fn words(&self) -> &'a [u32] {
        self.words
    }

    /// Number of words. Never zero.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn bit_len(&self) -> usize {
        self.words.len() * WORD_BITS
    }

    /// Bit `i` of the stream, as 0 or 1.
    ///
    /// Panics if `i >= bit_len()`.
    #[inline]
    pub fn bit(&self, i: usize) -> u8 {
        ((self.words[i / WORD_BITS] >> (i % WORD_BITS)) & 1) as u8
    }

    /// All bits of the stream in order.
    pub fn bits(&self) -> impl Iterator<Item = u8> + 'a {
        self.words
            .iter()
            .flat_map(|&w| (0..WORD_BITS).map(move |shift| ((w >> shift) & 1) as u8))
    }

    /// Total number of set bits.
    pub fn ones(&self) -> u64 {
        self.words.iter().map(|w| w.count_ones() as u64).sum()
    }
}

/// Decode little-endian bytes into words. Trailing bytes that do not fill a
/// word are returned as the second element.
pub fn words_from_le_bytes(bytes: &[u8]) -> (Vec<u32>, usize) {
    let chunks = bytes.chunks_exact(4);
    let leftover = chunks.remainder().len();
    let words = chunks
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    (words, leftover)
}
