//! Bit-packed index arrays stored in 64-bit words, plus the 4-bit nibble
//! arrays of the numeric-ID era.
//!
//! Values are packed least-significant bit first, starting at bit 0 of the
//! first word. Two layouts exist:
//!
//! - [`SpanMode::Spanning`]: the words form one continuous bit stream, so a
//!   value may straddle two words (low bits at the top of word *i*, high bits
//!   at the bottom of word *i+1*). Used up to 1.15.
//! - [`SpanMode::Aligned`]: each word holds `64 / bit_width` values and the
//!   leftover high bits are zero. Used from 1.16 onward.

use crate::error::PackError;

/// Minimum index width for block-state arrays, regardless of palette size.
pub const MIN_BLOCK_BITS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanMode {
    Spanning,
    Aligned,
}

/// Index width for a block palette of `len` entries:
/// `max(4, ceil(log2(len)))`.
pub fn bits_for_palette(len: usize) -> u32 {
    let needed = if len <= 1 {
        0
    } else {
        usize::BITS - (len - 1).leading_zeros()
    };
    needed.max(MIN_BLOCK_BITS)
}

/// Number of words required to hold `count` values of `bit_width` bits.
pub fn words_needed(count: usize, bit_width: u32, mode: SpanMode) -> usize {
    let bw = bit_width as usize;
    match mode {
        SpanMode::Spanning => (count * bw).div_ceil(64),
        SpanMode::Aligned => count.div_ceil(64 / bw),
    }
}

/// Word index and bit offset of the `i`-th value.
fn locate(i: usize, bit_width: u32, mode: SpanMode) -> (usize, u32) {
    let bw = bit_width as usize;
    match mode {
        SpanMode::Spanning => {
            let bit = i * bw;
            (bit / 64, (bit % 64) as u32)
        }
        SpanMode::Aligned => {
            let per_word = 64 / bw;
            (i / per_word, ((i % per_word) * bw) as u32)
        }
    }
}

fn check_width(bit_width: u32) -> Result<u64, PackError> {
    if !(1..=32).contains(&bit_width) {
        return Err(PackError::InvalidBitWidth(bit_width));
    }
    Ok((1u64 << bit_width) - 1)
}

pub fn pack(values: &[u32], bit_width: u32, mode: SpanMode) -> Result<Vec<i64>, PackError> {
    let mask = check_width(bit_width)?;
    let mut words = vec![0u64; words_needed(values.len(), bit_width, mode)];

    for (i, &value) in values.iter().enumerate() {
        let value = value as u64;
        if value & !mask != 0 {
            return Err(PackError::ValueTooWide {
                value: value as u32,
                bit_width,
            });
        }
        let (word, offset) = locate(i, bit_width, mode);
        words[word] |= value << offset;
        if offset + bit_width > 64 {
            // Spanning mode only: carry the high bits into the next word.
            words[word + 1] |= value >> (64 - offset);
        }
    }

    Ok(words.into_iter().map(|w| w as i64).collect())
}

/// Unpack `count` values. Words beyond the required length are ignored.
pub fn unpack(
    words: &[i64],
    bit_width: u32,
    count: usize,
    mode: SpanMode,
) -> Result<Vec<u32>, PackError> {
    let mask = check_width(bit_width)?;
    let needed = words_needed(count, bit_width, mode);
    if words.len() < needed {
        return Err(PackError::TruncatedInput {
            needed,
            got: words.len(),
        });
    }

    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        let (word, offset) = locate(i, bit_width, mode);
        let mut value = (words[word] as u64) >> offset;
        if offset + bit_width > 64 {
            value |= (words[word + 1] as u64) << (64 - offset);
        }
        values.push((value & mask) as u32);
    }
    Ok(values)
}

/// Pack 4-bit values two per byte, low nibble first.
pub fn compress_nibbles(nibbles: &[u8]) -> Result<Vec<u8>, PackError> {
    if nibbles.len() % 2 == 1 {
        return Err(PackError::InvalidLength(nibbles.len()));
    }
    Ok(nibbles
        .chunks_exact(2)
        .map(|pair| ((pair[1] & 0x0F) << 4) | (pair[0] & 0x0F))
        .collect())
}

pub fn extract_nibbles(packed: &[u8]) -> Vec<u8> {
    let mut nibbles = Vec::with_capacity(packed.len() * 2);
    for &byte in packed {
        nibbles.push(byte & 0x0F);
        nibbles.push(byte >> 4);
    }
    nibbles
}
