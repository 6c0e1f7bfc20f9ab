use crate::bounding_box::AttributeRange;
use crate::connectivity::ConnectivityIndex;
use crate::encode_params::{EncodeParams, StreamType};
use crate::encoder_buffer::EncoderBuffer;
use crate::header::{write_header, MeshHeader};
use crate::mesh::IndexedFaceSet;
use crate::predictor::Predictor;
use crate::quantization_utils::VectorQuantizer;
use crate::status::{invalid_mesh, Status};
use crate::stream_format::{AsciiFieldWriter, BinaryFieldWriter, FieldWriter};

/// Compresses an [`IndexedFaceSet`] into an SC3DMC stream.
///
/// The stream is built in scratch buffers and appended to the caller's
/// buffer only once encoding has succeeded, so a failed call leaves the
/// output untouched.
#[derive(Debug, Default)]
pub struct Sc3dmcEncoder {
    residuals: Vec<i32>,
}

impl Sc3dmcEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(
        &mut self,
        params: &EncodeParams,
        mesh: &IndexedFaceSet,
        out_buffer: &mut EncoderBuffer,
    ) -> Status {
        params.validate()?;
        mesh.validate()?;

        let mut header = MeshHeader {
            stream_type: params.stream_type,
            num_vertices: mesh.num_vertices() as u32,
            num_triangles: mesh.num_triangles() as u32,
            num_normals: mesh.num_normals() as u32,
            num_colors: mesh.num_colors() as u32,
            num_texcoords: mesh.num_texcoords() as u32,
            bbox_mode: params.bbox_mode,
            coord_range: AttributeRange::from_values(mesh.coords(), params.bbox_mode),
            normal_range: AttributeRange::from_values(mesh.normals(), params.bbox_mode),
            color_range: AttributeRange::from_values(mesh.colors(), params.bbox_mode),
            texcoord_range: AttributeRange::from_values(mesh.texcoords(), params.bbox_mode),
            coord_bits: params.coord_bits,
            normal_bits: params.normal_bits,
            color_bits: params.color_bits,
            texcoord_bits: params.texcoord_bits,
            ..MeshHeader::default()
        };
        if !(header.coord_range.is_finite()
            && header.normal_range.is_finite()
            && header.color_range.is_finite()
            && header.texcoord_range.is_finite())
        {
            return Err(invalid_mesh("Attribute extent overflows f32"));
        }

        let connectivity = ConnectivityIndex::build(mesh.triangles(), mesh.num_vertices())?;

        let mut payload = EncoderBuffer::new();
        match params.stream_type {
            StreamType::Binary => self.encode_payload(
                &mut BinaryFieldWriter::new(&mut payload),
                mesh,
                &header,
                &connectivity,
            )?,
            StreamType::Ascii => self.encode_payload(
                &mut AsciiFieldWriter::new(&mut payload),
                mesh,
                &header,
                &connectivity,
            )?,
        }
        header.payload_size = u32::try_from(payload.size())
            .map_err(|_| invalid_mesh(format!("Payload of {} bytes exceeds 4 GiB", payload.size())))?;

        let mut stream = EncoderBuffer::new();
        match params.stream_type {
            StreamType::Binary => write_header(&mut BinaryFieldWriter::new(&mut stream), &header),
            StreamType::Ascii => write_header(&mut AsciiFieldWriter::new(&mut stream), &header),
        }

        tracing::debug!(
            stream_type = %params.stream_type,
            vertices = header.num_vertices,
            triangles = header.num_triangles,
            normals = header.num_normals,
            colors = header.num_colors,
            texcoords = header.num_texcoords,
            header_bytes = stream.size(),
            payload_bytes = payload.size(),
            "encoded SC3DMC stream"
        );

        out_buffer.reserve(stream.size() + payload.size())?;
        out_buffer.encode_data(stream.data());
        out_buffer.encode_data(payload.data());
        Ok(())
    }

    fn encode_payload<W: FieldWriter>(
        &mut self,
        writer: &mut W,
        mesh: &IndexedFaceSet,
        header: &MeshHeader,
        connectivity: &ConnectivityIndex<'_>,
    ) -> Status {
        self.encode_triangles(writer, mesh)?;

        self.encode_attribute(
            writer,
            mesh.coords(),
            &header.coord_range,
            header.coord_bits,
            Some(connectivity),
        )?;
        if mesh.num_normals() > 0 {
            let shared = mesh.is_per_vertex(mesh.num_normals()).then_some(connectivity);
            self.encode_attribute(writer, mesh.normals(), &header.normal_range, header.normal_bits, shared)?;
        }
        if mesh.num_colors() > 0 {
            let shared = mesh.is_per_vertex(mesh.num_colors()).then_some(connectivity);
            self.encode_attribute(writer, mesh.colors(), &header.color_range, header.color_bits, shared)?;
        }
        if mesh.num_texcoords() > 0 {
            let shared = mesh.is_per_vertex(mesh.num_texcoords()).then_some(connectivity);
            self.encode_attribute(
                writer,
                mesh.texcoords(),
                &header.texcoord_range,
                header.texcoord_bits,
                shared,
            )?;
        }
        Ok(())
    }

    /// Codes every index as the difference to the index before it.
    fn encode_triangles<W: FieldWriter>(&mut self, writer: &mut W, mesh: &IndexedFaceSet) -> Status {
        self.residuals.clear();
        self.residuals.try_reserve_exact(mesh.num_triangles() * 3)?;
        let mut prev = 0i32;
        for &index in mesh.triangles().iter().flatten() {
            // Indices are below i32::MAX after validation.
            let index = index as i32;
            self.residuals.push(index - prev);
            prev = index;
        }
        tracing::trace!(residuals = self.residuals.len(), "triangle section");
        writer.write_residual_section(&self.residuals)
    }

    fn encode_attribute<W: FieldWriter, const N: usize>(
        &mut self,
        writer: &mut W,
        values: &[[f32; N]],
        range: &AttributeRange<N>,
        bits: u32,
        connectivity: Option<&ConnectivityIndex<'_>>,
    ) -> Status {
        let quantizer = VectorQuantizer::new(&range.min, &range.extent, bits);
        let mut codes: Vec<[u32; N]> = Vec::new();
        codes.try_reserve_exact(values.len())?;
        codes.extend(values.iter().map(|v| quantizer.quantize(v)));

        Predictor::<N>::new(connectivity, bits).compute_residuals(&codes, &mut self.residuals)?;

        let zeros = self.residuals.iter().filter(|&&r| r == 0).count();
        tracing::trace!(
            components = N,
            elements = values.len(),
            bits,
            zero_residuals = zeros,
            predicted = connectivity.is_some(),
            "attribute section"
        );
        writer.write_residual_section(&self.residuals)
    }
}
