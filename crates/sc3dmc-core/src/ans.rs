//! Binary asymmetric numeral system (rABS) with 8-bit probabilities.
//!
//! The state lives in `[STATE_LOWER_BOUND, STATE_LOWER_BOUND * 256)` and is
//! renormalized one byte at a time. The encoder runs backwards over the
//! bits, so the decoder reads them in their natural order from the end of
//! the byte stream towards its start.

#[cfg(feature = "decoder")]
use crate::status::corrupt_stream;
use crate::status::StatusResult;
#[cfg(feature = "encoder")]
use crate::status::Sc3dmcError;

/// Probabilities are expressed in 1/256 units.
pub const PROB_SCALE: u32 = 256;
pub const STATE_LOWER_BOUND: u32 = 4096;
const IO_BASE: u32 = 256;

/// Largest number of state bytes the final tag can announce.
const MAX_EXTRA_STATE_BYTES: u32 = 3;

#[cfg(feature = "encoder")]
#[derive(Debug, Clone)]
pub struct RabsEncoder {
    out: Vec<u8>,
    state: u32,
}

#[cfg(feature = "encoder")]
impl Default for RabsEncoder {
    fn default() -> Self {
        Self {
            out: Vec::new(),
            state: STATE_LOWER_BOUND,
        }
    }
}

#[cfg(feature = "encoder")]
impl RabsEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes one bit. `p0` is the probability of `false` in 1/256 units and
    /// must lie in `1..=255`. Bits must be pushed in reverse decode order.
    pub fn put(&mut self, bit: bool, p0: u8) {
        let p0 = p0 as u32;
        let (freq, offset) = if bit { (PROB_SCALE - p0, 0) } else { (p0, PROB_SCALE - p0) };

        let limit = STATE_LOWER_BOUND / PROB_SCALE * IO_BASE * freq;
        while self.state >= limit {
            self.out.push((self.state % IO_BASE) as u8);
            self.state /= IO_BASE;
        }
        self.state = (self.state / freq) * PROB_SCALE + self.state % freq + offset;
    }

    /// Appends the final state and returns the coded bytes. The last byte
    /// holds the count of extra state bytes in its top two bits.
    pub fn finish(mut self) -> StatusResult<Vec<u8>> {
        let state = self.state - STATE_LOWER_BOUND;
        let extra = (0..=MAX_EXTRA_STATE_BYTES)
            .find(|&n| state < 1 << (6 + 8 * n))
            .ok_or_else(|| Sc3dmcError::BufferError(format!("rANS state {} does not fit the final tag", state)))?;
        for i in 0..extra {
            self.out.push((state >> (8 * i)) as u8);
        }
        self.out.push(((extra << 6) | (state >> (8 * extra))) as u8);
        Ok(self.out)
    }
}

#[cfg(feature = "decoder")]
#[derive(Debug, Clone)]
pub struct RabsDecoder<'a> {
    data: &'a [u8],
    /// Bytes of `data` not yet consumed, counted from the start.
    unread: usize,
    state: u32,
}

#[cfg(feature = "decoder")]
impl<'a> RabsDecoder<'a> {
    /// Restores the final encoder state from the tail of `data`.
    pub fn new(data: &'a [u8]) -> StatusResult<Self> {
        let mut decoder = Self {
            data,
            unread: data.len(),
            state: 0,
        };
        let tag = decoder.pop_byte()? as u32;
        let mut state = tag & 0x3F;
        for _ in 0..(tag >> 6) {
            state = (state << 8) | decoder.pop_byte()? as u32;
        }
        decoder.state = state + STATE_LOWER_BOUND;
        Ok(decoder)
    }

    fn pop_byte(&mut self) -> StatusResult<u8> {
        if self.unread == 0 {
            return Err(corrupt_stream("rANS stream ends inside its final state"));
        }
        self.unread -= 1;
        Ok(self.data[self.unread])
    }

    /// Pulls the next bit. `p0` must match the value used when encoding.
    pub fn get(&mut self, p0: u8) -> bool {
        while self.state < STATE_LOWER_BOUND && self.unread > 0 {
            self.unread -= 1;
            self.state = self.state * IO_BASE + self.data[self.unread] as u32;
        }
        let p0 = p0 as u32;
        let p1 = PROB_SCALE - p0;
        let (quot, rem) = (self.state / PROB_SCALE, self.state % PROB_SCALE);
        if rem < p1 {
            self.state = quot * p1 + rem;
            true
        } else {
            self.state = quot * p0 + rem - p1;
            false
        }
    }
}

#[cfg(all(test, feature = "encoder", feature = "decoder"))]
mod tests {
    use super::*;

    fn roundtrip(bits: &[bool], p0: u8) -> Vec<bool> {
        let mut encoder = RabsEncoder::new();
        for &bit in bits.iter().rev() {
            encoder.put(bit, p0);
        }
        let data = encoder.finish().unwrap();
        let mut decoder = RabsDecoder::new(&data).unwrap();
        bits.iter().map(|_| decoder.get(p0)).collect()
    }

    #[test]
    fn test_roundtrip_across_probabilities() {
        let bits: Vec<bool> = (0..1000).map(|i| i % 7 == 0 || i % 13 == 0).collect();
        for p0 in [1u8, 2, 128, 200, 255] {
            assert_eq!(roundtrip(&bits, p0), bits, "p0 = {}", p0);
        }
    }

    #[test]
    fn test_empty_input_is_one_byte() {
        let data = RabsEncoder::new().finish().unwrap();
        assert_eq!(data, vec![0]);
    }

    #[test]
    fn test_truncated_state_rejected() {
        assert!(RabsDecoder::new(&[]).is_err());
        // Tag announces three extra bytes that are missing.
        assert!(RabsDecoder::new(&[0xC0]).is_err());
    }
}
