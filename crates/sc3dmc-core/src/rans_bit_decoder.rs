use crate::ans::RabsDecoder;
use crate::decoder_buffer::DecoderBuffer;
use crate::status::{Sc3dmcError, StatusResult};

/// Reads bits written by [`RAnsBitEncoder`].
///
/// [`RAnsBitEncoder`]: crate::rans_bit_encoder::RAnsBitEncoder
#[derive(Default)]
pub struct RAnsBitDecoder<'a> {
    rabs: Option<RabsDecoder<'a>>,
    prob_zero: u8,
}

impl<'a> RAnsBitDecoder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_decoding(&mut self, source_buffer: &mut DecoderBuffer<'a>) -> StatusResult<()> {
        self.clear();

        let prob_zero = source_buffer.decode_u8()?;
        if prob_zero == 0 {
            return Err(Sc3dmcError::CorruptStream(
                "Bit coder probability must be non-zero".into(),
            ));
        }
        let size = usize::try_from(source_buffer.decode_varint()?).map_err(|_| {
            Sc3dmcError::CorruptStream("Bit coder size does not fit in memory".into())
        })?;
        let slice = source_buffer.decode_slice(size)?;

        self.rabs = Some(RabsDecoder::new(slice)?);
        self.prob_zero = prob_zero;
        Ok(())
    }

    pub fn decode_next_bit(&mut self) -> StatusResult<bool> {
        match &mut self.rabs {
            Some(rabs) => Ok(rabs.get(self.prob_zero)),
            None => Err(Sc3dmcError::CorruptStream(
                "Read from a bit coder that holds no data".into(),
            )),
        }
    }

    /// Reads `nbits` bits, most significant first.
    pub fn decode_least_significant_bits32(&mut self, nbits: u32) -> StatusResult<u32> {
        debug_assert!(nbits <= 32);
        let mut value = 0u32;
        for _ in 0..nbits {
            let bit = self.decode_next_bit()?;
            value = (value << 1) + (bit as u32);
        }
        Ok(value)
    }

    pub fn end_decoding(&mut self) {
        self.rabs = None;
    }

    fn clear(&mut self) {
        self.rabs = None;
        self.prob_zero = 0;
    }
}
