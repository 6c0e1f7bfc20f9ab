use crate::ans::{RabsEncoder, PROB_SCALE};
use crate::encoder_buffer::EncoderBuffer;
use crate::status::Status;

/// Adaptive-free binary coder for one context.
///
/// Bits are logged as they arrive; [`end_encoding`] derives a single zero
/// probability from the log and codes every bit with it.
///
/// [`end_encoding`]: RAnsBitEncoder::end_encoding
#[derive(Debug, Default, Clone)]
pub struct RAnsBitEncoder {
    /// Bit `i` of the log is bit `i % 32` of `words[i / 32]`.
    words: Vec<u32>,
    num_bits: u64,
    num_zeros: u64,
}

impl RAnsBitEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_encoding(&mut self) {
        self.clear();
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.num_bits = 0;
        self.num_zeros = 0;
    }

    /// Number of bits coded since the last `start_encoding`.
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    pub fn encode_bit(&mut self, bit: bool) {
        let offset = (self.num_bits % 32) as u32;
        if offset == 0 {
            self.words.push(0);
        }
        if bit {
            if let Some(word) = self.words.last_mut() {
                *word |= 1 << offset;
            }
        } else {
            self.num_zeros += 1;
        }
        self.num_bits += 1;
    }

    /// Codes the `nbits` low bits of `value`, most significant first.
    pub fn encode_least_significant_bits32(&mut self, nbits: u32, value: u32) {
        debug_assert!(nbits <= 32);
        for i in (0..nbits).rev() {
            self.encode_bit((value >> i) & 1 == 1);
        }
    }

    fn bit(&self, index: u64) -> bool {
        (self.words[(index / 32) as usize] >> (index % 32)) & 1 == 1
    }

    /// Probability of a zero bit in 1/256 units, rounded and kept inside
    /// `1..=255` so both symbols stay codable.
    fn zero_probability(&self) -> u8 {
        let total = self.num_bits.max(1);
        let scaled = (self.num_zeros * PROB_SCALE as u64 + total / 2) / total;
        scaled.clamp(1, 255) as u8
    }

    /// Writes the probability byte, the varint byte length and the rANS bytes.
    pub fn end_encoding(&mut self, target_buffer: &mut EncoderBuffer) -> Status {
        let p0 = self.zero_probability();
        let mut rabs = RabsEncoder::new();
        for i in (0..self.num_bits).rev() {
            rabs.put(self.bit(i), p0);
        }
        let data = rabs.finish()?;

        target_buffer.reserve(data.len() + 11)?;
        target_buffer.encode_u8(p0);
        target_buffer.encode_varint(data.len() as u64);
        target_buffer.encode_data(&data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_log() {
        let mut encoder = RAnsBitEncoder::new();
        encoder.encode_least_significant_bits32(3, 0b101);
        for i in 0..40 {
            encoder.encode_bit(i == 39);
        }
        assert_eq!(encoder.num_bits(), 43);
        assert!(encoder.bit(0) && !encoder.bit(1) && encoder.bit(2));
        assert!(encoder.bit(42));
        assert!(!encoder.bit(41));
        assert_eq!(encoder.num_zeros, 40);
    }

    #[test]
    fn test_zero_probability_is_clamped() {
        let mut encoder = RAnsBitEncoder::new();
        assert_eq!(encoder.zero_probability(), 1);
        encoder.encode_bit(false);
        assert_eq!(encoder.zero_probability(), 255);
        encoder.encode_bit(true);
        assert_eq!(encoder.zero_probability(), 128);
    }
}
