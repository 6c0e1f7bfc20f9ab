//! Two-phase SC3DMC decoding.
//!
//! [`Sc3dmcDecoder::decode_header`] reads counts, ranges and bit-depths
//! without touching any attribute storage and returns a [`HeaderRead`]
//! handle. The caller sizes an [`IndexedFaceSet`] from the header and then
//! consumes the handle with [`HeaderRead::decode_payload`], so decoding a
//! payload before its header, or twice, does not compile.
//!
//! ```
//! use sc3dmc_core::{EncodeParams, EncoderBuffer, IndexedFaceSet, Sc3dmcDecoder, Sc3dmcEncoder, StreamType};
//!
//! let mut mesh = IndexedFaceSet::new();
//! mesh.set_coords(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
//! mesh.set_triangles(vec![[0, 1, 2]]);
//!
//! let mut buffer = EncoderBuffer::new();
//! Sc3dmcEncoder::new()
//!     .encode(&EncodeParams::default(), &mesh, &mut buffer)
//!     .unwrap();
//!
//! let decoder = Sc3dmcDecoder::new(StreamType::Binary);
//! let header_read = decoder.decode_header(buffer.data()).unwrap();
//! let mut decoded = IndexedFaceSet::new();
//! decoded.allocate_from_header(header_read.header()).unwrap();
//! header_read.decode_payload(&mut decoded).unwrap();
//! assert_eq!(decoded.triangles(), mesh.triangles());
//! ```
//!
//! Callers that cannot thread the handle through their own state can use
//! the `*_in_place` methods, which track a [`DecoderState`] at runtime and
//! report misuse as `InvalidSequencing`.

use crate::bounding_box::AttributeRange;
use crate::connectivity::ConnectivityIndex;
use crate::encode_params::StreamType;
use crate::header::{read_header, MeshHeader};
use crate::mesh::{IndexedFaceSet, Triangle};
use crate::predictor::Predictor;
use crate::quantization_utils::VectorQuantizer;
use crate::status::{corrupt_stream, Sc3dmcError, Status, StatusResult};
use crate::stream_format::{AsciiFieldReader, BinaryFieldReader, FieldReader};

/// Progress of one decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    #[default]
    Empty,
    HeaderRead,
    PayloadComplete,
}

#[derive(Debug, Clone)]
pub struct Sc3dmcDecoder {
    stream_type: StreamType,
    state: DecoderState,
    header: Option<MeshHeader>,
}

/// A decoded header bound to the stream it came from.
#[derive(Debug, Clone)]
pub struct HeaderRead<'d> {
    data: &'d [u8],
    header: MeshHeader,
}

/// Proof that a payload was decoded.
#[derive(Debug, Clone)]
pub struct PayloadComplete {
    header: MeshHeader,
}

impl Sc3dmcDecoder {
    /// Creates a decoder for streams of the given encoding. The encoding is
    /// not auto-detected.
    pub fn new(stream_type: StreamType) -> Self {
        Self {
            stream_type,
            state: DecoderState::Empty,
            header: None,
        }
    }

    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Header of the last successful `decode_header_in_place`.
    pub fn header(&self) -> Option<&MeshHeader> {
        self.header.as_ref()
    }

    /// Reads and validates the header of `data`. Does not change `self`, so
    /// calling it again on the same bytes yields the same header.
    pub fn decode_header<'d>(&self, data: &'d [u8]) -> StatusResult<HeaderRead<'d>> {
        let header = match self.stream_type {
            StreamType::Binary => read_header(&mut BinaryFieldReader::new(data), data.len())?,
            StreamType::Ascii => read_header(&mut AsciiFieldReader::new(data), data.len())?,
        };
        tracing::debug!(
            stream_type = %header.stream_type,
            vertices = header.num_vertices,
            triangles = header.num_triangles,
            normals = header.num_normals,
            colors = header.num_colors,
            texcoords = header.num_texcoords,
            coord_bits = header.coord_bits,
            payload_bytes = header.payload_size,
            "decoded SC3DMC header"
        );
        Ok(HeaderRead { data, header })
    }

    /// Runtime-checked form of [`decode_header`](Self::decode_header).
    pub fn decode_header_in_place(&mut self, data: &[u8]) -> StatusResult<&MeshHeader> {
        if self.state == DecoderState::PayloadComplete {
            return Err(Sc3dmcError::InvalidSequencing(
                "Decoder already finished a payload; call reset() first".into(),
            ));
        }
        match self.decode_header(data) {
            Ok(header_read) => {
                self.state = DecoderState::HeaderRead;
                Ok(self.header.insert(header_read.header))
            }
            Err(err) => {
                self.reset();
                Err(err)
            }
        }
    }

    /// Runtime-checked form of [`HeaderRead::decode_payload`]. `data` must
    /// be the stream whose header was read.
    pub fn decode_payload_in_place(&mut self, data: &[u8], mesh: &mut IndexedFaceSet) -> Status {
        let header = match (self.state, self.header.take()) {
            (DecoderState::HeaderRead, Some(header)) => header,
            (DecoderState::PayloadComplete, header) => {
                self.header = header;
                return Err(Sc3dmcError::InvalidSequencing("Payload was already decoded".into()));
            }
            _ => {
                self.reset();
                return Err(Sc3dmcError::InvalidSequencing(
                    "Payload decoded before the header".into(),
                ));
            }
        };
        let header_read = match self.decode_header(data) {
            Ok(header_read) => header_read,
            Err(err) => {
                self.reset();
                return Err(err);
            }
        };
        if header_read.header != header {
            self.reset();
            return Err(Sc3dmcError::InvalidSequencing(
                "Payload stream differs from the stream whose header was read".into(),
            ));
        }
        match header_read.decode_payload(mesh) {
            Ok(done) => {
                self.header = Some(done.header);
                self.state = DecoderState::PayloadComplete;
                Ok(())
            }
            Err(err) => {
                self.reset();
                Err(err)
            }
        }
    }

    /// Returns to `Empty` so the decoder can be reused.
    pub fn reset(&mut self) {
        self.state = DecoderState::Empty;
        self.header = None;
    }
}

impl<'d> HeaderRead<'d> {
    pub fn header(&self) -> &MeshHeader {
        &self.header
    }

    /// Decodes the payload into `mesh`, whose storage must already be sized
    /// to the header counts (see [`IndexedFaceSet::allocate_from_header`]).
    pub fn decode_payload(self, mesh: &mut IndexedFaceSet) -> StatusResult<PayloadComplete> {
        if !mesh.is_sized_for(&self.header) {
            return Err(Sc3dmcError::InvalidSequencing(
                "Mesh storage is not sized to the decoded header".into(),
            ));
        }
        let start = self.header.payload_offset;
        let payload = start
            .checked_add(self.header.payload_size as usize)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| corrupt_stream("Payload lies outside the stream"))?;

        let result = match self.header.stream_type {
            StreamType::Binary => decode_sections(&mut BinaryFieldReader::new(payload), &self.header),
            StreamType::Ascii => decode_sections(&mut AsciiFieldReader::new(payload), &self.header),
        };
        result.map_err(|e| e.into_stream_error())?.commit(mesh);
        mesh.set_ranges_from_header(&self.header);
        Ok(PayloadComplete { header: self.header })
    }
}

impl PayloadComplete {
    pub fn header(&self) -> &MeshHeader {
        &self.header
    }
}

/// Payload contents held aside until every section has decoded cleanly.
struct DecodedSections {
    triangles: Vec<Triangle>,
    coords: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
}

impl DecodedSections {
    fn commit(self, mesh: &mut IndexedFaceSet) {
        mesh.triangles_mut().copy_from_slice(&self.triangles);
        mesh.coords_mut().copy_from_slice(&self.coords);
        mesh.normals_mut().copy_from_slice(&self.normals);
        mesh.colors_mut().copy_from_slice(&self.colors);
        mesh.texcoords_mut().copy_from_slice(&self.texcoords);
    }
}

fn decode_sections<'a, R: FieldReader<'a>>(reader: &mut R, header: &MeshHeader) -> StatusResult<DecodedSections> {
    let num_vertices = header.num_vertices as usize;
    let triangles = decode_triangles(reader, header)?;
    let connectivity = ConnectivityIndex::build(&triangles, num_vertices)?;
    let shared = |count: u32| (count == header.num_vertices).then_some(&connectivity);

    let coords = decode_attribute(reader, num_vertices, &header.coord_range, header.coord_bits, Some(&connectivity))?;
    let normals = decode_attribute(
        reader,
        header.num_normals as usize,
        &header.normal_range,
        header.normal_bits,
        shared(header.num_normals),
    )?;
    let colors = decode_attribute(
        reader,
        header.num_colors as usize,
        &header.color_range,
        header.color_bits,
        shared(header.num_colors),
    )?;
    let texcoords = decode_attribute(
        reader,
        header.num_texcoords as usize,
        &header.texcoord_range,
        header.texcoord_bits,
        shared(header.num_texcoords),
    )?;
    if reader.remaining_size() != 0 {
        return Err(corrupt_stream(format!(
            "{} unused bytes after the last payload section",
            reader.remaining_size()
        )));
    }

    Ok(DecodedSections {
        triangles,
        coords,
        normals,
        colors,
        texcoords,
    })
}

fn decode_triangles<'a, R: FieldReader<'a>>(reader: &mut R, header: &MeshHeader) -> StatusResult<Vec<Triangle>> {
    let num_triangles = header.num_triangles as usize;
    let residuals = reader.read_residual_section(num_triangles * 3)?;
    let mut triangles = Vec::new();
    triangles.try_reserve_exact(num_triangles)?;

    let mut prev = 0i64;
    let mut indices = residuals.iter().map(|&r| {
        let index = prev + r as i64;
        prev = index;
        index
    });
    for t in 0..num_triangles {
        let mut tri = [0u32; 3];
        for slot in &mut tri {
            let index = indices.next().unwrap_or(-1);
            if index < 0 || index >= header.num_vertices as i64 {
                return Err(corrupt_stream(format!(
                    "Triangle {} references vertex {} outside [0, {})",
                    t, index, header.num_vertices
                )));
            }
            *slot = index as u32;
        }
        triangles.push(tri);
    }
    tracing::trace!(triangles = num_triangles, "triangle section");
    Ok(triangles)
}

/// Absent attributes (`count == 0`) have no section and decode to nothing.
fn decode_attribute<'a, R: FieldReader<'a>, const N: usize>(
    reader: &mut R,
    count: usize,
    range: &AttributeRange<N>,
    bits: u32,
    connectivity: Option<&ConnectivityIndex<'_>>,
) -> StatusResult<Vec<[f32; N]>> {
    let mut values = Vec::new();
    if count == 0 {
        return Ok(values);
    }
    let residuals = reader.read_residual_section(count * N)?;
    let mut codes: Vec<[u32; N]> = Vec::new();
    codes.try_reserve_exact(count)?;
    codes.resize(count, [0; N]);
    Predictor::<N>::new(connectivity, bits).reconstruct(&residuals, &mut codes)?;

    let quantizer = VectorQuantizer::new(&range.min, &range.extent, bits);
    values.try_reserve_exact(count)?;
    values.extend(codes.iter().map(|code| quantizer.dequantize(code)));
    tracing::trace!(components = N, elements = count, bits, "attribute section");
    Ok(values)
}

/// Decodes a whole stream into a freshly allocated mesh.
pub fn decode_mesh(data: &[u8], stream_type: StreamType) -> StatusResult<IndexedFaceSet> {
    let decoder = Sc3dmcDecoder::new(stream_type);
    let header_read = decoder.decode_header(data)?;
    let mut mesh = IndexedFaceSet::new();
    mesh.allocate_from_header(header_read.header())?;
    header_read.decode_payload(&mut mesh)?;
    Ok(mesh)
}
