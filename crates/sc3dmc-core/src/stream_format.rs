//! The two encodings of the SC3DMC field set.
//!
//! Both encodings carry the same fields in the same order. The binary form
//! packs unsigned fields MSB first at their declared widths, stores floats
//! as IEEE-754 bit patterns and entropy-codes each payload section behind a
//! big-endian byte length. The ASCII form writes every field as a decimal
//! token, one group per line, and stores payload sections as plain residual
//! lists prefixed by their element count.

#[cfg(feature = "decoder")]
use crate::decoder_buffer::DecoderBuffer;
#[cfg(feature = "encoder")]
use crate::encoder_buffer::EncoderBuffer;
use crate::encode_params::StreamType;
#[cfg(feature = "decoder")]
use crate::residual_coder::decode_residuals;
#[cfg(feature = "encoder")]
use crate::residual_coder::encode_residuals;
#[cfg(feature = "decoder")]
use crate::status::{corrupt_stream, StatusResult};
#[cfg(feature = "encoder")]
use crate::status::invalid_mesh;
use crate::status::Status;

/// Upper bound on the residuals a payload of `payload_size` bytes can hold.
///
/// A context bit coder spends at least log2(256/255) bits per coded bit and
/// every residual codes at least one bit; an ASCII residual takes at least
/// two characters. Used to reject headers whose counts cannot be backed by
/// the payload before any storage is sized from them.
pub fn max_elements_for_payload(stream_type: StreamType, payload_size: u32) -> u64 {
    match stream_type {
        StreamType::Binary => (payload_size as u64 + 256) * 2048,
        StreamType::Ascii => payload_size as u64 / 2 + 1,
    }
}

#[cfg(feature = "encoder")]
pub trait FieldWriter {
    fn stream_type(&self) -> StreamType;

    /// Writes the `nbits` low bits of `value`.
    fn write_uint(&mut self, nbits: u32, value: u32);

    fn write_f32(&mut self, value: f32);

    /// Closes a logical group of fields.
    fn end_group(&mut self);

    /// Pads to the next byte boundary.
    fn align(&mut self);

    /// Writes one self-delimited payload section.
    fn write_residual_section(&mut self, residuals: &[i32]) -> Status;
}

#[cfg(feature = "decoder")]
pub trait FieldReader<'a> {
    fn stream_type(&self) -> StreamType;

    fn read_uint(&mut self, nbits: u32) -> StatusResult<u32>;

    fn read_f32(&mut self) -> StatusResult<f32>;

    fn end_group(&mut self) -> Status;

    fn align(&mut self);

    /// Byte position of the next unread field.
    fn position(&self) -> usize;

    fn remaining_size(&self) -> usize;

    /// Reads one payload section holding exactly `count` residuals.
    fn read_residual_section(&mut self, count: usize) -> StatusResult<Vec<i32>>;
}

#[cfg(feature = "encoder")]
pub struct BinaryFieldWriter<'b> {
    buffer: &'b mut EncoderBuffer,
}

#[cfg(feature = "encoder")]
impl<'b> BinaryFieldWriter<'b> {
    pub fn new(buffer: &'b mut EncoderBuffer) -> Self {
        Self { buffer }
    }
}

#[cfg(feature = "encoder")]
impl FieldWriter for BinaryFieldWriter<'_> {
    fn stream_type(&self) -> StreamType {
        StreamType::Binary
    }

    fn write_uint(&mut self, nbits: u32, value: u32) {
        self.buffer.encode_bits(nbits, value);
    }

    fn write_f32(&mut self, value: f32) {
        self.buffer.encode_bits(32, value.to_bits());
    }

    fn end_group(&mut self) {}

    fn align(&mut self) {
        self.buffer.align_to_byte();
    }

    fn write_residual_section(&mut self, residuals: &[i32]) -> Status {
        self.buffer.encode_u32(0);
        let length_pos = self.buffer.size() - 4;
        encode_residuals(residuals, self.buffer)?;
        let length = self.buffer.size() - length_pos - 4;
        let length = u32::try_from(length).map_err(|_| invalid_mesh("Payload section exceeds 4 GiB"))?;
        self.buffer.overwrite_u32_at(length_pos, length)
    }
}

#[cfg(feature = "encoder")]
pub struct AsciiFieldWriter<'b> {
    buffer: &'b mut EncoderBuffer,
    line_start: bool,
}

#[cfg(feature = "encoder")]
impl<'b> AsciiFieldWriter<'b> {
    pub fn new(buffer: &'b mut EncoderBuffer) -> Self {
        Self {
            buffer,
            line_start: true,
        }
    }

    fn write_token(&mut self, token: &str) {
        if !self.line_start {
            self.buffer.encode_u8(b' ');
        }
        self.buffer.encode_str(token);
        self.line_start = false;
    }
}

#[cfg(feature = "encoder")]
impl FieldWriter for AsciiFieldWriter<'_> {
    fn stream_type(&self) -> StreamType {
        StreamType::Ascii
    }

    fn write_uint(&mut self, _nbits: u32, value: u32) {
        self.write_token(&value.to_string());
    }

    fn write_f32(&mut self, value: f32) {
        self.write_token(&value.to_string());
    }

    fn end_group(&mut self) {
        self.buffer.encode_u8(b'\n');
        self.line_start = true;
    }

    fn align(&mut self) {}

    fn write_residual_section(&mut self, residuals: &[i32]) -> Status {
        self.buffer.reserve(residuals.len() * 2 + 12)?;
        self.write_token(&residuals.len().to_string());
        for r in residuals {
            self.write_token(&r.to_string());
        }
        self.end_group();
        Ok(())
    }
}

#[cfg(feature = "decoder")]
pub struct BinaryFieldReader<'a> {
    buffer: DecoderBuffer<'a>,
}

#[cfg(feature = "decoder")]
impl<'a> BinaryFieldReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: DecoderBuffer::new(data),
        }
    }
}

#[cfg(feature = "decoder")]
impl<'a> FieldReader<'a> for BinaryFieldReader<'a> {
    fn stream_type(&self) -> StreamType {
        StreamType::Binary
    }

    fn read_uint(&mut self, nbits: u32) -> StatusResult<u32> {
        self.buffer.decode_bits(nbits)
    }

    fn read_f32(&mut self) -> StatusResult<f32> {
        Ok(f32::from_bits(self.buffer.decode_bits(32)?))
    }

    fn end_group(&mut self) -> Status {
        Ok(())
    }

    fn align(&mut self) {
        self.buffer.align_to_byte();
    }

    fn position(&self) -> usize {
        self.buffer.position()
    }

    fn remaining_size(&self) -> usize {
        self.buffer.remaining_size()
    }

    fn read_residual_section(&mut self, count: usize) -> StatusResult<Vec<i32>> {
        let length = self.buffer.decode_u32()?;
        if count as u64 > max_elements_for_payload(StreamType::Binary, length) {
            return Err(corrupt_stream(format!(
                "Section of {} bytes cannot hold {} residuals",
                length, count
            )));
        }
        let section = self.buffer.decode_slice(length as usize)?;
        let mut source = DecoderBuffer::new(section);
        let residuals = decode_residuals(&mut source, count)?;
        if source.remaining_size() != 0 {
            return Err(corrupt_stream(format!(
                "{} unused bytes at the end of a payload section",
                source.remaining_size()
            )));
        }
        Ok(residuals)
    }
}

#[cfg(feature = "decoder")]
pub struct AsciiFieldReader<'a> {
    buffer: DecoderBuffer<'a>,
}

#[cfg(feature = "decoder")]
impl<'a> AsciiFieldReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buffer: DecoderBuffer::new(data),
        }
    }

    fn skip_blanks(&mut self) -> StatusResult<()> {
        while let Some(b) = self.buffer.peek_u8_at(self.buffer.position()) {
            if b != b' ' && b != b'\t' && b != b'\r' {
                break;
            }
            self.buffer.decode_u8()?;
        }
        Ok(())
    }

    fn read_token(&mut self) -> StatusResult<&'a str> {
        self.skip_blanks()?;
        let start = self.buffer.position();
        let mut len = 0;
        while let Some(b) = self.buffer.peek_u8_at(start + len) {
            if b.is_ascii_whitespace() {
                break;
            }
            len += 1;
        }
        if len == 0 {
            return Err(corrupt_stream(format!("Expected a token at byte {}", start)));
        }
        let bytes = self.buffer.decode_slice(len)?;
        std::str::from_utf8(bytes).map_err(|_| corrupt_stream(format!("Non-ASCII token at byte {}", start)))
    }

    fn parse_token<T: std::str::FromStr>(&mut self) -> StatusResult<T> {
        let token = self.read_token()?;
        token
            .parse::<T>()
            .map_err(|_| corrupt_stream(format!("Malformed token '{}'", token)))
    }
}

#[cfg(feature = "decoder")]
impl<'a> FieldReader<'a> for AsciiFieldReader<'a> {
    fn stream_type(&self) -> StreamType {
        StreamType::Ascii
    }

    fn read_uint(&mut self, nbits: u32) -> StatusResult<u32> {
        let value: u32 = self.parse_token()?;
        if nbits < 32 && value >> nbits != 0 {
            return Err(corrupt_stream(format!("Value {} does not fit in {} bits", value, nbits)));
        }
        Ok(value)
    }

    fn read_f32(&mut self) -> StatusResult<f32> {
        self.parse_token()
    }

    fn end_group(&mut self) -> Status {
        self.skip_blanks()?;
        match self.buffer.peek_u8_at(self.buffer.position()) {
            Some(b'\n') => {
                self.buffer.decode_u8()?;
                Ok(())
            }
            _ => Err(corrupt_stream(format!(
                "Expected end of line at byte {}",
                self.buffer.position()
            ))),
        }
    }

    fn align(&mut self) {}

    fn position(&self) -> usize {
        self.buffer.position()
    }

    fn remaining_size(&self) -> usize {
        self.buffer.remaining_size()
    }

    fn read_residual_section(&mut self, count: usize) -> StatusResult<Vec<i32>> {
        let declared: usize = self.parse_token()?;
        if declared != count {
            return Err(corrupt_stream(format!(
                "Section declares {} residuals, header implies {}",
                declared, count
            )));
        }
        if count > self.buffer.remaining_size() / 2 + 1 {
            return Err(corrupt_stream("Section is shorter than its residual count"));
        }
        let mut residuals = Vec::new();
        residuals.try_reserve_exact(count)?;
        for _ in 0..count {
            residuals.push(self.parse_token()?);
        }
        self.end_group()?;
        Ok(residuals)
    }
}
