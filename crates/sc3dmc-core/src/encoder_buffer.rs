use byteorder::{BigEndian, ByteOrder};

use crate::status::{Sc3dmcError, Status};

/// Smallest capacity (in bytes) the buffer grows to.
const DEFAULT_MIN_CAPACITY: usize = 64;

/// Growable output buffer for SC3DMC streams.
///
/// Supports both byte-aligned writes and bit-packed writes. Bits are packed
/// most-significant-bit first into the last byte; `bit_offset` counts the
/// bits already used in that byte (0 means the buffer is byte aligned).
/// Byte-aligned writes pad any partially filled byte with zero bits first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderBuffer {
    buffer: Vec<u8>,
    bit_offset: u32,
}

impl EncoderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            bit_offset: 0,
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.bit_offset = 0;
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buffer
    }

    pub fn is_aligned(&self) -> bool {
        self.bit_offset == 0
    }

    /// Grows the capacity so at least `additional` more bytes fit, doubling
    /// the current capacity when that is larger.
    pub fn reserve(&mut self, additional: usize) -> Status {
        let required = self
            .buffer
            .len()
            .checked_add(additional)
            .ok_or_else(|| Sc3dmcError::AllocationFailure("capacity overflow".into()))?;
        let capacity = self.buffer.capacity();
        if required <= capacity {
            return Ok(());
        }
        let new_capacity = DEFAULT_MIN_CAPACITY.max(capacity * 2).max(required);
        self.buffer.try_reserve_exact(new_capacity - self.buffer.len())?;
        Ok(())
    }

    /// Writes the `nbits` least significant bits of `value`, MSB first.
    pub fn encode_bits(&mut self, nbits: u32, value: u32) {
        debug_assert!(nbits <= 32, "Cannot write more than 32 bits");
        for i in (0..nbits).rev() {
            self.encode_bit((value >> i) & 1 != 0);
        }
    }

    pub fn encode_bit(&mut self, bit: bool) {
        if self.bit_offset == 0 {
            self.buffer.push(0);
        }
        if bit {
            if let Some(last) = self.buffer.last_mut() {
                *last |= 0x80 >> self.bit_offset;
            }
        }
        self.bit_offset = (self.bit_offset + 1) % 8;
    }

    /// Pads the current byte with zero bits.
    pub fn align_to_byte(&mut self) {
        self.bit_offset = 0;
    }

    pub fn encode_u8(&mut self, value: u8) {
        self.align_to_byte();
        self.buffer.push(value);
    }

    pub fn encode_u32(&mut self, value: u32) {
        self.align_to_byte();
        let mut bytes = [0u8; 4];
        BigEndian::write_u32(&mut bytes, value);
        self.buffer.extend_from_slice(&bytes);
    }

    pub fn encode_f32(&mut self, value: f32) {
        self.encode_u32(value.to_bits());
    }

    /// LEB128-style unsigned varint.
    pub fn encode_varint(&mut self, mut value: u64) {
        self.align_to_byte();
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.buffer.push(byte);
                break;
            }
            self.buffer.push(byte | 0x80);
        }
    }

    pub fn encode_data(&mut self, data: &[u8]) {
        self.align_to_byte();
        self.buffer.extend_from_slice(data);
    }

    /// Appends ASCII text.
    pub fn encode_str(&mut self, text: &str) {
        self.encode_data(text.as_bytes());
    }

    /// Overwrites four already-written bytes at `pos` without moving the
    /// write cursor.
    pub fn overwrite_u32_at(&mut self, pos: usize, value: u32) -> Status {
        let end = pos
            .checked_add(4)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| {
                Sc3dmcError::BufferError(format!(
                    "Cannot overwrite 4 bytes at {} in a buffer of {} bytes",
                    pos,
                    self.buffer.len()
                ))
            })?;
        BigEndian::write_u32(&mut self.buffer[pos..end], value);
        Ok(())
    }
}
