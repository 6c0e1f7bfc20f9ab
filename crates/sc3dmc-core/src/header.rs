use crate::bounding_box::{AttributeRange, BoundingBoxMode};
use crate::encode_params::StreamType;
#[cfg(feature = "decoder")]
use crate::quantization_utils::{is_valid_quantization_bits, MAX_QUANTIZATION_BITS};
use crate::quantization_utils::MIN_QUANTIZATION_BITS;
#[cfg(feature = "decoder")]
use crate::status::{corrupt_stream, Status, StatusResult};
#[cfg(feature = "decoder")]
use crate::stream_format::{max_elements_for_payload, FieldReader};
#[cfg(feature = "encoder")]
use crate::stream_format::FieldWriter;

const COUNT_BITS: u32 = 32;
const TAG_BITS: u32 = 8;
const BBOX_MODE_BITS: u32 = 1;
const QUANT_BITS_WIDTH: u32 = 5;

/// Everything the stream header carries: element counts, normalization
/// ranges, bit-depths and the payload size.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshHeader {
    pub stream_type: StreamType,
    pub num_vertices: u32,
    pub num_triangles: u32,
    pub num_normals: u32,
    pub num_colors: u32,
    pub num_texcoords: u32,
    pub bbox_mode: BoundingBoxMode,
    pub coord_range: AttributeRange<3>,
    pub normal_range: AttributeRange<3>,
    pub color_range: AttributeRange<3>,
    pub texcoord_range: AttributeRange<2>,
    pub coord_bits: u32,
    pub normal_bits: u32,
    pub color_bits: u32,
    pub texcoord_bits: u32,
    /// Size in bytes of the payload that follows the header.
    pub payload_size: u32,
    /// Offset of the payload from the start of the stream.
    pub payload_offset: usize,
}

impl Default for MeshHeader {
    fn default() -> Self {
        Self {
            stream_type: StreamType::Binary,
            num_vertices: 0,
            num_triangles: 0,
            num_normals: 0,
            num_colors: 0,
            num_texcoords: 0,
            bbox_mode: BoundingBoxMode::PerAxis,
            coord_range: AttributeRange::default(),
            normal_range: AttributeRange::default(),
            color_range: AttributeRange::default(),
            texcoord_range: AttributeRange::default(),
            coord_bits: MIN_QUANTIZATION_BITS,
            normal_bits: MIN_QUANTIZATION_BITS,
            color_bits: MIN_QUANTIZATION_BITS,
            texcoord_bits: MIN_QUANTIZATION_BITS,
            payload_size: 0,
            payload_offset: 0,
        }
    }
}

impl MeshHeader {
    /// Total number of coded residuals in the payload.
    pub fn num_residuals(&self) -> u64 {
        3 * self.num_triangles as u64
            + 3 * self.num_vertices as u64
            + 3 * self.num_normals as u64
            + 3 * self.num_colors as u64
            + 2 * self.num_texcoords as u64
    }
}

#[cfg(feature = "encoder")]
fn write_range<W: FieldWriter, const N: usize>(writer: &mut W, range: &AttributeRange<N>, mode: BoundingBoxMode) {
    for &m in &range.min {
        writer.write_f32(m);
    }
    match mode {
        BoundingBoxMode::PerAxis => {
            for &e in &range.extent {
                writer.write_f32(e);
            }
        }
        BoundingBoxMode::Diagonal => writer.write_f32(range.extent[0]),
    }
    writer.end_group();
}

/// Writes every header field up to and including the payload size.
#[cfg(feature = "encoder")]
pub fn write_header<W: FieldWriter>(writer: &mut W, header: &MeshHeader) {
    writer.write_uint(TAG_BITS, writer.stream_type().tag());
    writer.end_group();

    for count in [
        header.num_vertices,
        header.num_triangles,
        header.num_normals,
        header.num_colors,
        header.num_texcoords,
    ] {
        writer.write_uint(COUNT_BITS, count);
    }
    writer.end_group();

    writer.write_uint(BBOX_MODE_BITS, header.bbox_mode as u32);
    writer.end_group();

    write_range(writer, &header.coord_range, header.bbox_mode);
    if header.num_normals > 0 {
        write_range(writer, &header.normal_range, header.bbox_mode);
    }
    if header.num_colors > 0 {
        write_range(writer, &header.color_range, header.bbox_mode);
    }
    if header.num_texcoords > 0 {
        write_range(writer, &header.texcoord_range, header.bbox_mode);
    }

    for bits in [
        header.coord_bits,
        header.normal_bits,
        header.color_bits,
        header.texcoord_bits,
    ] {
        writer.write_uint(QUANT_BITS_WIDTH, bits);
    }
    writer.end_group();

    writer.align();
    writer.write_uint(COUNT_BITS, header.payload_size);
    writer.end_group();
}

#[cfg(feature = "decoder")]
fn read_range<'a, R: FieldReader<'a>, const N: usize>(
    reader: &mut R,
    mode: BoundingBoxMode,
) -> StatusResult<AttributeRange<N>> {
    let mut range = AttributeRange::<N>::default();
    for m in &mut range.min {
        *m = reader.read_f32()?;
    }
    match mode {
        BoundingBoxMode::PerAxis => {
            for e in &mut range.extent {
                *e = reader.read_f32()?;
            }
        }
        BoundingBoxMode::Diagonal => range.extent = [reader.read_f32()?; N],
    }
    reader.end_group()?;
    if !range.is_finite() || range.extent.iter().any(|&e| e < 0.0) {
        return Err(corrupt_stream("Attribute range is not a finite, non-negative box"));
    }
    Ok(range)
}

/// Reads and validates the header. Every failure, including running out of
/// bytes, is reported as `CorruptStream`.
#[cfg(feature = "decoder")]
pub fn read_header<'a, R: FieldReader<'a>>(reader: &mut R, data_size: usize) -> StatusResult<MeshHeader> {
    read_header_fields(reader, data_size).map_err(|e| e.into_stream_error())
}

#[cfg(feature = "decoder")]
fn read_header_fields<'a, R: FieldReader<'a>>(reader: &mut R, data_size: usize) -> StatusResult<MeshHeader> {
    let mut header = MeshHeader::default();

    let tag = reader.read_uint(TAG_BITS)?;
    match StreamType::try_from(tag) {
        Ok(t) if t == reader.stream_type() => header.stream_type = t,
        Ok(t) => {
            return Err(corrupt_stream(format!(
                "Stream is tagged {} but was opened as {}",
                t,
                reader.stream_type()
            )))
        }
        Err(()) => return Err(corrupt_stream(format!("Unknown stream type tag {}", tag))),
    }
    reader.end_group()?;

    header.num_vertices = reader.read_uint(COUNT_BITS)?;
    header.num_triangles = reader.read_uint(COUNT_BITS)?;
    header.num_normals = reader.read_uint(COUNT_BITS)?;
    header.num_colors = reader.read_uint(COUNT_BITS)?;
    header.num_texcoords = reader.read_uint(COUNT_BITS)?;
    reader.end_group()?;
    if header.num_vertices == 0 || header.num_triangles == 0 {
        return Err(corrupt_stream("Stream declares an empty mesh"));
    }
    if header.num_vertices > i32::MAX as u32 {
        return Err(corrupt_stream(format!("Vertex count {} too large", header.num_vertices)));
    }

    let mode = reader.read_uint(BBOX_MODE_BITS)?;
    header.bbox_mode = BoundingBoxMode::try_from(mode)
        .map_err(|_| corrupt_stream(format!("Unknown bounding box mode {}", mode)))?;
    reader.end_group()?;

    header.coord_range = read_range(reader, header.bbox_mode)?;
    if header.num_normals > 0 {
        header.normal_range = read_range(reader, header.bbox_mode)?;
    }
    if header.num_colors > 0 {
        header.color_range = read_range(reader, header.bbox_mode)?;
    }
    if header.num_texcoords > 0 {
        header.texcoord_range = read_range(reader, header.bbox_mode)?;
    }

    header.coord_bits = reader.read_uint(QUANT_BITS_WIDTH)?;
    header.normal_bits = reader.read_uint(QUANT_BITS_WIDTH)?;
    header.color_bits = reader.read_uint(QUANT_BITS_WIDTH)?;
    header.texcoord_bits = reader.read_uint(QUANT_BITS_WIDTH)?;
    reader.end_group()?;
    check_bits(&header)?;

    reader.align();
    header.payload_size = reader.read_uint(COUNT_BITS)?;
    reader.end_group()?;
    header.payload_offset = reader.position();

    let available = data_size.saturating_sub(header.payload_offset);
    if header.payload_size as usize > available {
        return Err(corrupt_stream(format!(
            "Truncated stream: header declares {} payload bytes, {} available",
            header.payload_size, available
        )));
    }
    if header.num_residuals() > max_elements_for_payload(header.stream_type, header.payload_size) {
        return Err(corrupt_stream(format!(
            "Payload of {} bytes cannot hold {} elements",
            header.payload_size,
            header.num_residuals()
        )));
    }
    Ok(header)
}

#[cfg(feature = "decoder")]
fn check_bits(header: &MeshHeader) -> Status {
    for bits in [
        header.coord_bits,
        header.normal_bits,
        header.color_bits,
        header.texcoord_bits,
    ] {
        if !is_valid_quantization_bits(bits) {
            return Err(corrupt_stream(format!(
                "Quantization bit-depth {} outside [{}, {}]",
                bits, MIN_QUANTIZATION_BITS, MAX_QUANTIZATION_BITS
            )));
        }
    }
    Ok(())
}

#[cfg(all(test, feature = "encoder", feature = "decoder"))]
mod tests {
    use super::*;
    use crate::encoder_buffer::EncoderBuffer;
    use crate::stream_format::{AsciiFieldReader, AsciiFieldWriter, BinaryFieldReader, BinaryFieldWriter};
    use crate::status::Sc3dmcError;

    fn sample_header() -> MeshHeader {
        MeshHeader {
            num_vertices: 4,
            num_triangles: 2,
            num_texcoords: 4,
            coord_range: AttributeRange::new([0.0, -1.0, 2.5], [1.0, 2.0, 0.0]),
            texcoord_range: AttributeRange::new([0.0, 0.0], [1.0, 1.0]),
            coord_bits: 12,
            normal_bits: 10,
            color_bits: 10,
            texcoord_bits: 9,
            payload_size: 3,
            ..MeshHeader::default()
        }
    }

    #[test]
    fn test_binary_header() {
        let header = sample_header();
        let mut buffer = EncoderBuffer::new();
        write_header(&mut BinaryFieldWriter::new(&mut buffer), &header);
        buffer.encode_data(&[0, 0, 0]);

        let mut reader = BinaryFieldReader::new(buffer.data());
        let decoded = read_header(&mut reader, buffer.size()).unwrap();
        assert_eq!(decoded.payload_offset, buffer.size() - 3);
        assert_eq!(MeshHeader { payload_offset: 0, ..decoded }, header);
    }

    #[test]
    fn test_ascii_header_is_line_oriented() {
        let header = MeshHeader {
            stream_type: StreamType::Ascii,
            bbox_mode: BoundingBoxMode::Diagonal,
            coord_range: AttributeRange::new([0.0; 3], [2.0; 3]),
            texcoord_range: AttributeRange::new([0.0; 2], [1.5; 2]),
            payload_size: 64,
            ..sample_header()
        };
        let mut buffer = EncoderBuffer::new();
        write_header(&mut AsciiFieldWriter::new(&mut buffer), &header);
        let text = std::str::from_utf8(buffer.data()).unwrap();
        assert_eq!(text, "2\n4 2 0 0 4\n1\n0 0 0 2\n0 0 1.5\n12 10 10 9\n64\n");
        let header_size = buffer.size();
        buffer.encode_data(&[b' '; 64]);

        let mut reader = AsciiFieldReader::new(buffer.data());
        let decoded = read_header(&mut reader, buffer.size()).unwrap();
        assert_eq!(decoded.payload_offset, header_size);
        assert_eq!(decoded.coord_range.extent, [2.0; 3]);
        assert_eq!(decoded.texcoord_range.extent, [1.5; 2]);
    }

    #[test]
    fn test_truncated_payload() {
        let header = sample_header();
        let mut buffer = EncoderBuffer::new();
        write_header(&mut BinaryFieldWriter::new(&mut buffer), &header);
        buffer.encode_data(&[0, 0]);
        let mut reader = BinaryFieldReader::new(buffer.data());
        assert!(matches!(
            read_header(&mut reader, buffer.size()),
            Err(Sc3dmcError::CorruptStream(_))
        ));
    }

    #[test]
    fn test_bad_bits_and_tag() {
        let header = MeshHeader {
            texcoord_bits: 20,
            ..sample_header()
        };
        let mut buffer = EncoderBuffer::new();
        write_header(&mut BinaryFieldWriter::new(&mut buffer), &header);
        buffer.encode_data(&[0, 0, 0]);
        let mut reader = BinaryFieldReader::new(buffer.data());
        assert!(matches!(
            read_header(&mut reader, buffer.size()),
            Err(Sc3dmcError::CorruptStream(_))
        ));

        let mut data = EncoderBuffer::new();
        write_header(&mut BinaryFieldWriter::new(&mut data), &sample_header());
        let mut bytes = data.into_vec();
        bytes[0] = 7;
        let mut reader = BinaryFieldReader::new(&bytes);
        assert!(matches!(
            read_header(&mut reader, bytes.len()),
            Err(Sc3dmcError::CorruptStream(_))
        ));
    }

    #[test]
    fn test_mode_mismatch_and_short_buffer() {
        let mut buffer = EncoderBuffer::new();
        write_header(&mut AsciiFieldWriter::new(&mut buffer), &sample_header());
        let mut reader = BinaryFieldReader::new(buffer.data());
        assert!(matches!(
            read_header(&mut reader, buffer.size()),
            Err(Sc3dmcError::CorruptStream(_))
        ));

        let data = [1u8, 0, 0];
        let mut reader = BinaryFieldReader::new(&data);
        assert!(matches!(
            read_header(&mut reader, data.len()),
            Err(Sc3dmcError::CorruptStream(_))
        ));
    }
}
