//! Entropy coding of prediction residuals.
//!
//! Every residual is binarized into a zero flag, a sign bit and the
//! order-0 Exp-Golomb code of its magnitude (a unary prefix of `k` ones and a
//! terminating zero, followed by the `k` low bits of the magnitude). Each
//! binary decision goes to its own context, and each context is a static
//! rANS bit coder, so a stream of zero residuals collapses to a few bytes.
//!
//! Layout: a varint bitmask of the contexts that received bits, followed by
//! one self-delimited bit coder per set bit in increasing context order.

#[cfg(feature = "decoder")]
use crate::decoder_buffer::DecoderBuffer;
#[cfg(feature = "encoder")]
use crate::encoder_buffer::EncoderBuffer;
#[cfg(feature = "decoder")]
use crate::rans_bit_decoder::RAnsBitDecoder;
#[cfg(feature = "encoder")]
use crate::rans_bit_encoder::RAnsBitEncoder;
#[cfg(feature = "decoder")]
use crate::status::{corrupt_stream, StatusResult};
use crate::status::Status;

pub const NUM_PREFIX_CONTEXTS: usize = 32;
const ZERO_CONTEXT: usize = 0;
const SIGN_CONTEXT: usize = 1;
const PREFIX_CONTEXT: usize = 2;
const SUFFIX_CONTEXT: usize = PREFIX_CONTEXT + NUM_PREFIX_CONTEXTS;
pub const NUM_CONTEXTS: usize = SUFFIX_CONTEXT + 1;

/// Longest unary prefix any 32-bit residual produces.
const MAX_PREFIX_LENGTH: u32 = 31;

fn prefix_context(position: u32) -> usize {
    PREFIX_CONTEXT + (position as usize).min(NUM_PREFIX_CONTEXTS - 1)
}

#[cfg(feature = "encoder")]
pub struct ResidualEncoder {
    contexts: Vec<RAnsBitEncoder>,
    num_residuals: usize,
}

#[cfg(feature = "encoder")]
impl Default for ResidualEncoder {
    fn default() -> Self {
        Self {
            contexts: (0..NUM_CONTEXTS).map(|_| RAnsBitEncoder::new()).collect(),
            num_residuals: 0,
        }
    }
}

#[cfg(feature = "encoder")]
impl ResidualEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_encoding(&mut self) {
        for ctx in &mut self.contexts {
            ctx.start_encoding();
        }
        self.num_residuals = 0;
    }

    pub fn num_residuals(&self) -> usize {
        self.num_residuals
    }

    pub fn encode_residual(&mut self, residual: i32) {
        self.num_residuals += 1;
        self.contexts[ZERO_CONTEXT].encode_bit(residual != 0);
        if residual == 0 {
            return;
        }
        self.contexts[SIGN_CONTEXT].encode_bit(residual < 0);

        let magnitude = residual.unsigned_abs();
        let k = 31 - magnitude.leading_zeros();
        for i in 0..k {
            self.contexts[prefix_context(i)].encode_bit(true);
        }
        self.contexts[prefix_context(k)].encode_bit(false);
        self.contexts[SUFFIX_CONTEXT].encode_least_significant_bits32(k, magnitude);
    }

    pub fn encode_residuals(&mut self, residuals: &[i32]) {
        for &r in residuals {
            self.encode_residual(r);
        }
    }

    pub fn end_encoding(&mut self, target_buffer: &mut EncoderBuffer) -> Status {
        let mut mask = 0u64;
        for (i, ctx) in self.contexts.iter().enumerate() {
            if ctx.num_bits() > 0 {
                mask |= 1 << i;
            }
        }
        target_buffer.encode_varint(mask);
        for ctx in self.contexts.iter_mut().filter(|ctx| ctx.num_bits() > 0) {
            ctx.end_encoding(target_buffer)?;
        }
        Ok(())
    }
}

#[cfg(feature = "decoder")]
pub struct ResidualDecoder<'a> {
    contexts: Vec<RAnsBitDecoder<'a>>,
}

#[cfg(feature = "decoder")]
impl<'a> Default for ResidualDecoder<'a> {
    fn default() -> Self {
        Self {
            contexts: (0..NUM_CONTEXTS).map(|_| RAnsBitDecoder::new()).collect(),
        }
    }
}

#[cfg(feature = "decoder")]
impl<'a> ResidualDecoder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_decoding(&mut self, source_buffer: &mut DecoderBuffer<'a>) -> Status {
        let mask = source_buffer.decode_varint()?;
        if mask >> NUM_CONTEXTS != 0 {
            return Err(corrupt_stream(format!(
                "Residual context mask {:#x} names unknown contexts",
                mask
            )));
        }
        for (i, ctx) in self.contexts.iter_mut().enumerate() {
            if mask & (1 << i) != 0 {
                ctx.start_decoding(source_buffer)?;
            } else {
                ctx.end_decoding();
            }
        }
        Ok(())
    }

    pub fn decode_residual(&mut self) -> StatusResult<i32> {
        if !self.contexts[ZERO_CONTEXT].decode_next_bit()? {
            return Ok(0);
        }
        let negative = self.contexts[SIGN_CONTEXT].decode_next_bit()?;

        let mut k = 0u32;
        while self.contexts[prefix_context(k)].decode_next_bit()? {
            k += 1;
            if k > MAX_PREFIX_LENGTH {
                return Err(corrupt_stream("Residual prefix exceeds 31 bits"));
            }
        }
        let suffix = self.contexts[SUFFIX_CONTEXT].decode_least_significant_bits32(k)?;
        let magnitude = ((1u64 << k) | suffix as u64) as i64;
        let value = if negative { -magnitude } else { magnitude };
        i32::try_from(value).map_err(|_| corrupt_stream(format!("Residual {} out of range", value)))
    }

    pub fn end_decoding(&mut self) {
        for ctx in &mut self.contexts {
            ctx.end_decoding();
        }
    }
}

/// Entropy-codes `residuals` into `target_buffer`.
#[cfg(feature = "encoder")]
pub fn encode_residuals(residuals: &[i32], target_buffer: &mut EncoderBuffer) -> Status {
    let mut encoder = ResidualEncoder::new();
    encoder.start_encoding();
    encoder.encode_residuals(residuals);
    encoder.end_encoding(target_buffer)
}

/// Decodes exactly `count` residuals written by [`encode_residuals`].
#[cfg(feature = "decoder")]
pub fn decode_residuals(source_buffer: &mut DecoderBuffer<'_>, count: usize) -> StatusResult<Vec<i32>> {
    let mut decoder = ResidualDecoder::new();
    decoder.start_decoding(source_buffer)?;
    let mut out = Vec::new();
    out.try_reserve_exact(count)?;
    for _ in 0..count {
        out.push(decoder.decode_residual()?);
    }
    decoder.end_decoding();
    Ok(out)
}
