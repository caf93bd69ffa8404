//! Compressed sparse bit-vector with rank/select.
//!
//! Elias-Fano encoding of a sorted set of bit positions over a fixed
//! universe: each position splits into `l` low bits, stored packed, and a
//! high part, stored as unary bucket offsets in a plain bit-vector (`1` for
//! each element, at bit `(value >> l) + index`). With `l = log2(U/m)` the
//! whole structure takes roughly `m * (2 + log2(U/m))` bits, close to the
//! information-theoretic minimum for an m-of-U subset, while still
//! answering:
//!
//! - `select(j)`: position of the j-th set bit (1-indexed), via a sampled
//!   popcount directory over the high bits plus an in-word bit walk;
//! - `rank(i)`: number of set bits at positions `<= i`, via binary search
//!   over `select`.
//!
//! Those two primitives are all the merge-based set distances in
//! [`bitmap::distance`](crate::bitmap::distance) need; the occupancy set is
//! never decompressed.
//!
//! # References
//!
//! - Okanohara, Sadakane (2007): "Practical entropy-compressed rank/select
//!   dictionary"
//! - Vigna (2013): "Quasi-succinct indices"

use crate::error::{IndexError, Result};

/// Words per popcount-directory block over the high bit-vector.
const BLOCK_WORDS: usize = 8;

/// Succinct sorted set of bit positions over `[0, universe)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseBitmap {
    universe: u64,
    len: u64,
    low_width: u32,
    /// Packed `low_width`-bit low parts, one per element, padded one word.
    lows: Vec<u64>,
    /// Unary-coded high parts: bit `(value >> low_width) + i` is set for
    /// the i-th element.
    high: Vec<u64>,
    /// Set-bit count before each `BLOCK_WORDS`-word block of `high`.
    high_block_ones: Vec<u64>,
}

impl SparseBitmap {
    /// Encode `positions` (any order, duplicates collapse) as set bits over
    /// `[0, universe)`. Positions at or beyond `universe` are rejected.
    pub fn from_positions(universe: u64, positions: impl IntoIterator<Item = u64>) -> Result<Self> {
        let mut pos: Vec<u64> = positions.into_iter().collect();
        pos.sort_unstable();
        pos.dedup();

        if let Some(&last) = pos.last() {
            if last >= universe {
                return Err(IndexError::InvalidParameter(format!(
                    "bit position {last} outside universe {universe}"
                )));
            }
        }

        let m = pos.len() as u64;
        if m == 0 {
            return Ok(Self {
                universe,
                len: 0,
                low_width: 0,
                lows: Vec::new(),
                high: Vec::new(),
                high_block_ones: Vec::new(),
            });
        }

        // Splitting at log2(U/m) balances the two halves of the encoding.
        let low_width = (universe / m).ilog2();
        let low_mask = if low_width == 0 {
            0
        } else {
            (1u64 << low_width) - 1
        };

        let high_bits = (m + (universe >> low_width) + 1) as usize;
        let mut high = vec![0u64; high_bits.div_ceil(64)];
        let mut lows = if low_width == 0 {
            Vec::new()
        } else {
            vec![0u64; (m as usize * low_width as usize).div_ceil(64) + 1]
        };

        for (i, &v) in pos.iter().enumerate() {
            let h = (v >> low_width) as usize + i;
            high[h / 64] |= 1u64 << (h % 64);
            if low_width > 0 {
                pack_low(&mut lows, i, low_width, v & low_mask);
            }
        }

        let mut high_block_ones = Vec::with_capacity(high.len().div_ceil(BLOCK_WORDS));
        let mut ones = 0u64;
        for (w, word) in high.iter().enumerate() {
            if w % BLOCK_WORDS == 0 {
                high_block_ones.push(ones);
            }
            ones += u64::from(word.count_ones());
        }

        Ok(Self {
            universe,
            len: m,
            low_width,
            lows,
            high,
            high_block_ones,
        })
    }

    /// Size of the universe (number of addressable bit positions).
    pub fn universe(&self) -> u64 {
        self.universe
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u64 {
        self.len
    }

    /// Whether no bits are set.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Heap bytes of the encoded structure.
    pub fn size_bytes(&self) -> usize {
        (self.lows.len() + self.high.len() + self.high_block_ones.len()) * 8
    }

    /// Position of the `j`-th set bit, 1-indexed; `None` when `j` is 0 or
    /// exceeds the set-bit count.
    pub fn select(&self, j: u64) -> Option<u64> {
        if j == 0 || j > self.len {
            None
        } else {
            Some(self.nth_position(j))
        }
    }

    /// Number of set bits at positions `<= pos`.
    pub fn rank(&self, pos: u64) -> u64 {
        let (mut lo, mut hi) = (0u64, self.len);
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            if self.nth_position(mid) <= pos {
                lo = mid;
            } else {
                hi = mid - 1;
            }
        }
        lo
    }

    /// Whether `pos` is a set bit.
    pub fn contains(&self, pos: u64) -> bool {
        let r = self.rank(pos);
        r > 0 && self.nth_position(r) == pos
    }

    /// Iterate the set positions in increasing order.
    pub fn positions(&self) -> impl Iterator<Item = u64> + '_ {
        (1..=self.len).map(|j| self.nth_position(j))
    }

    /// `select` without the bounds dance; callers guarantee `1 <= j <= len`.
    pub(crate) fn nth_position(&self, j: u64) -> u64 {
        debug_assert!(j >= 1 && j <= self.len);

        let block = self.high_block_ones.partition_point(|&c| c < j) - 1;
        let mut remaining = j - self.high_block_ones[block];
        let mut w = block * BLOCK_WORDS;
        loop {
            let word = self.high[w];
            let ones = u64::from(word.count_ones());
            if remaining <= ones {
                let bit = nth_set_bit(word, remaining as u32);
                let high_part = (w as u64) * 64 + u64::from(bit) - (j - 1);
                return (high_part << self.low_width) | self.read_low((j - 1) as usize);
            }
            remaining -= ones;
            w += 1;
        }
    }

    fn read_low(&self, i: usize) -> u64 {
        let width = self.low_width;
        if width == 0 {
            return 0;
        }
        let bit = i * width as usize;
        let word = bit / 64;
        let off = (bit % 64) as u32;
        let mut v = self.lows[word] >> off;
        if off + width > 64 {
            v |= self.lows[word + 1] << (64 - off);
        }
        v & ((1u64 << width) - 1)
    }
}

fn pack_low(lows: &mut [u64], i: usize, width: u32, value: u64) {
    let bit = i * width as usize;
    let word = bit / 64;
    let off = (bit % 64) as u32;
    lows[word] |= value << off;
    if off + width > 64 {
        // off > 0 here, so the shift stays in range.
        lows[word + 1] |= value >> (64 - off);
    }
}

/// Index of the `n`-th (1-indexed) set bit of `word`; `word` must have at
/// least `n` set bits.
fn nth_set_bit(mut word: u64, n: u32) -> u32 {
    for _ in 1..n {
        word &= word - 1;
    }
    word.trailing_zeros()
}
