use byteorder::{BigEndian, ByteOrder};

use crate::status::{Sc3dmcError, StatusResult};

/// Input buffer for reading SC3DMC streams.
///
/// `DecoderBuffer` provides sequential byte and bit-level access to encoded
/// data, mirroring [`EncoderBuffer`]: bits are read most-significant-bit
/// first and byte-aligned reads skip the rest of a partially consumed byte.
/// Reads never move the cursor past the end of the data.
///
/// # Example
///
/// ```
/// use sc3dmc_core::DecoderBuffer;
///
/// let data = [0b1010_0000, 0x42];
/// let mut buffer = DecoderBuffer::new(&data);
///
/// assert_eq!(buffer.decode_bits(3).unwrap(), 0b101);
/// assert_eq!(buffer.decode_u8().unwrap(), 0x42);
/// assert_eq!(buffer.remaining_size(), 0);
/// ```
///
/// [`EncoderBuffer`]: crate::encoder_buffer::EncoderBuffer
#[derive(Debug, Clone)]
pub struct DecoderBuffer<'a> {
    data: &'a [u8],
    pos: usize,
    bit_offset: u32,
}

impl<'a> DecoderBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bit_offset: 0,
        }
    }

    /// Returns the current read position in bytes.
    ///
    /// While a byte is partially consumed, this is the index of that byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of whole bytes not yet touched.
    pub fn remaining_size(&self) -> usize {
        let consumed = self.pos + usize::from(self.bit_offset != 0);
        self.data.len().saturating_sub(consumed)
    }

    pub fn is_aligned(&self) -> bool {
        self.bit_offset == 0
    }

    /// Reads the byte at `pos` without moving the cursor.
    pub fn peek_u8_at(&self, pos: usize) -> Option<u8> {
        self.data.get(pos).copied()
    }

    pub fn decode_bit(&mut self) -> StatusResult<bool> {
        let byte = self.data.get(self.pos).copied().ok_or_else(|| {
            Sc3dmcError::BufferError("Unexpected end of bit stream".into())
        })?;
        let bit = (byte >> (7 - self.bit_offset)) & 1 != 0;
        self.bit_offset += 1;
        if self.bit_offset == 8 {
            self.bit_offset = 0;
            self.pos += 1;
        }
        Ok(bit)
    }

    /// Reads `nbits` bits, MSB first.
    pub fn decode_bits(&mut self, nbits: u32) -> StatusResult<u32> {
        debug_assert!(nbits <= 32);
        let mut value = 0u32;
        for _ in 0..nbits {
            value = (value << 1) | u32::from(self.decode_bit()?);
        }
        Ok(value)
    }

    /// Skips the unread bits of a partially consumed byte.
    pub fn align_to_byte(&mut self) {
        if self.bit_offset != 0 {
            self.bit_offset = 0;
            self.pos += 1;
        }
    }

    /// Decodes and returns a slice of the specified size.
    ///
    /// # Errors
    ///
    /// Returns `Sc3dmcError::BufferError` if not enough bytes remain.
    pub fn decode_slice(&mut self, size: usize) -> StatusResult<&'a [u8]> {
        self.align_to_byte();
        if size > self.remaining_size() {
            return Err(Sc3dmcError::BufferError(format!(
                "Unexpected end of buffer: need {} bytes, have {}",
                size,
                self.remaining_size()
            )));
        }
        let slice = &self.data[self.pos..self.pos + size];
        self.pos += size;
        Ok(slice)
    }

    pub fn decode_u8(&mut self) -> StatusResult<u8> {
        Ok(self.decode_slice(1)?[0])
    }

    pub fn decode_u32(&mut self) -> StatusResult<u32> {
        Ok(BigEndian::read_u32(self.decode_slice(4)?))
    }

    pub fn decode_f32(&mut self) -> StatusResult<f32> {
        Ok(f32::from_bits(self.decode_u32()?))
    }

    /// Decodes a variable-length unsigned integer (varint).
    pub fn decode_varint(&mut self) -> StatusResult<u64> {
        let mut val = 0u64;
        let mut shift = 0;
        loop {
            let b = self.decode_u8()?;
            val |= ((b & 0x7F) as u64) << shift;
            if (b & 0x80) == 0 {
                break;
            }
            shift += 7;
            if shift >= 64 {
                return Err(Sc3dmcError::BufferError("Varint exceeds 64 bits".into()));
            }
        }
        Ok(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "encoder")]
    #[test]
    fn test_bits_roundtrip_with_encoder() {
        use crate::encoder_buffer::EncoderBuffer;

        let mut enc = EncoderBuffer::new();
        enc.encode_bits(5, 0b10110);
        enc.encode_bits(32, 0xCAFEBABE);
        enc.encode_bit(true);
        enc.encode_f32(-2.5);
        enc.encode_varint(1 << 40);

        let mut dec = DecoderBuffer::new(enc.data());
        assert_eq!(dec.decode_bits(5).unwrap(), 0b10110);
        assert_eq!(dec.decode_bits(32).unwrap(), 0xCAFEBABE);
        assert!(dec.decode_bit().unwrap());
        assert_eq!(dec.decode_f32().unwrap(), -2.5);
        assert_eq!(dec.decode_varint().unwrap(), 1 << 40);
        assert_eq!(dec.remaining_size(), 0);
    }

    #[test]
    fn test_reads_past_end_fail() {
        let data = [0xFFu8];
        let mut dec = DecoderBuffer::new(&data);
        assert!(dec.decode_u32().is_err());
        assert_eq!(dec.position(), 0);
        assert_eq!(dec.decode_bits(8).unwrap(), 0xFF);
        assert!(dec.decode_bit().is_err());
        assert_eq!(dec.position(), 1);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let data = [1u8, 2, 3];
        let mut dec = DecoderBuffer::new(&data);
        assert_eq!(dec.peek_u8_at(2), Some(3));
        assert_eq!(dec.peek_u8_at(3), None);
        assert_eq!(dec.position(), 0);
        assert_eq!(dec.decode_u8().unwrap(), 1);
    }

    #[test]
    fn test_partial_byte_accounting() {
        let data = [0u8, 0xAB];
        let mut dec = DecoderBuffer::new(&data);
        dec.decode_bit().unwrap();
        assert_eq!(dec.remaining_size(), 1);
        assert_eq!(dec.decode_u8().unwrap(), 0xAB);
    }
}
