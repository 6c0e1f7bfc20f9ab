use proptest::prelude::*;
use sc3dmc_core::bounding_box::BoundingBoxMode;
use sc3dmc_core::encode_params::{EncodeParams, StreamType};
use sc3dmc_core::encoder_buffer::EncoderBuffer;
use sc3dmc_core::mesh::IndexedFaceSet;
use sc3dmc_core::quantization_utils::max_quantized_value;
use sc3dmc_core::sc3dmc_decoder::{decode_mesh, Sc3dmcDecoder};
use sc3dmc_core::sc3dmc_encoder::Sc3dmcEncoder;
use sc3dmc_core::AttributeRange;

fn unit_cube() -> IndexedFaceSet {
    let mut mesh = IndexedFaceSet::new();
    mesh.set_coords(vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ]);
    mesh.set_triangles(vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [1, 2, 6],
        [1, 6, 5],
        [2, 3, 7],
        [2, 7, 6],
        [3, 0, 4],
        [3, 4, 7],
    ]);
    mesh
}

fn encode(mesh: &IndexedFaceSet, params: &EncodeParams) -> Vec<u8> {
    let mut buffer = EncoderBuffer::new();
    Sc3dmcEncoder::new()
        .encode(params, mesh, &mut buffer)
        .expect("encoding failed");
    buffer.into_vec()
}

/// Checks every component is within one quantization step of the original.
fn assert_within_step<const N: usize>(
    original: &[[f32; N]],
    decoded: &[[f32; N]],
    range: &AttributeRange<N>,
    bits: u32,
) {
    assert_eq!(original.len(), decoded.len());
    for (o, d) in original.iter().zip(decoded) {
        for axis in 0..N {
            let step = range.extent[axis] / max_quantized_value(bits) as f32;
            let slack = 1e-5 * (range.min[axis].abs() + range.extent[axis]) + 1e-6;
            assert!(
                (o[axis] - d[axis]).abs() <= step + slack,
                "axis {}: original {} decoded {} step {}",
                axis,
                o[axis],
                d[axis],
                step
            );
        }
    }
}

#[test]
fn test_unit_cube_scenario() {
    let mesh = unit_cube();
    let params = EncodeParams::new().with_coord_bits(8);
    let data = encode(&mesh, &params);

    let decoder = Sc3dmcDecoder::new(StreamType::Binary);
    let header_read = decoder.decode_header(&data).unwrap();
    let header = header_read.header().clone();
    assert_eq!(header.num_vertices, 8);
    assert_eq!(header.num_triangles, 12);
    assert_eq!(header.num_normals, 0);
    assert_eq!(header.coord_bits, 8);

    let mut decoded = IndexedFaceSet::new();
    decoded.allocate_from_header(&header).unwrap();
    header_read.decode_payload(&mut decoded).unwrap();

    assert_eq!(decoded.triangles(), mesh.triangles());
    for (o, d) in mesh.coords().iter().zip(decoded.coords()) {
        for axis in 0..3 {
            assert!((o[axis] - d[axis]).abs() <= 1.0 / 255.0);
        }
    }
}

#[test]
fn test_all_attributes_roundtrip_binary_and_ascii() {
    let mut mesh = unit_cube();
    let normals: Vec<[f32; 3]> = mesh
        .coords()
        .iter()
        .map(|c| {
            let v = [c[0] - 0.5, c[1] - 0.5, c[2] - 0.5];
            let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            [v[0] / len, v[1] / len, v[2] / len]
        })
        .collect();
    let colors: Vec<[f32; 3]> = mesh.coords().iter().map(|c| [c[0], c[1] * 0.5, 1.0 - c[2]]).collect();
    let texcoords: Vec<[f32; 2]> = mesh.coords().iter().map(|c| [c[0], c[1]]).collect();
    mesh.set_normals(normals);
    mesh.set_colors(colors);
    mesh.set_texcoords(texcoords);

    for stream_type in [StreamType::Binary, StreamType::Ascii] {
        let params = EncodeParams::new()
            .with_coord_bits(14)
            .with_normal_bits(9)
            .with_color_bits(8)
            .with_texcoord_bits(11)
            .with_stream_type(stream_type);
        let data = encode(&mesh, &params);
        let decoded = decode_mesh(&data, stream_type).unwrap();

        assert_eq!(decoded.triangles(), mesh.triangles());
        assert_within_step(mesh.coords(), decoded.coords(), decoded.coord_range(), 14);
        assert_within_step(mesh.normals(), decoded.normals(), decoded.normal_range(), 9);
        assert_within_step(mesh.colors(), decoded.colors(), decoded.color_range(), 8);
        assert_within_step(mesh.texcoords(), decoded.texcoords(), decoded.texcoord_range(), 11);
    }
}

#[test]
fn test_ascii_stream_is_text() {
    let params = EncodeParams::new().with_stream_type(StreamType::Ascii);
    let data = encode(&unit_cube(), &params);
    let text = std::str::from_utf8(&data).unwrap();
    assert!(text.starts_with("2\n8 12 0 0 0\n0\n"));
    assert!(text.ends_with('\n'));
}

#[test]
fn test_degenerate_axis_collapses_to_min() {
    let mut mesh = IndexedFaceSet::new();
    mesh.set_coords(vec![[0.0, 0.0, 2.5], [1.0, 0.0, 2.5], [0.0, 3.0, 2.5], [1.0, 3.0, 2.5]]);
    mesh.set_triangles(vec![[0, 1, 2], [2, 1, 3]]);

    let data = encode(&mesh, &EncodeParams::default());
    let decoded = decode_mesh(&data, StreamType::Binary).unwrap();
    assert_eq!(decoded.coord_range().extent[2], 0.0);
    for c in decoded.coords() {
        assert_eq!(c[2], 2.5);
    }
    assert_within_step(mesh.coords(), decoded.coords(), decoded.coord_range(), 12);
}

#[test]
fn test_diagonal_bounding_box() {
    let mut mesh = unit_cube();
    for c in mesh.coords_mut() {
        c[0] *= 10.0;
    }
    let params = EncodeParams::new()
        .with_coord_bits(10)
        .with_bbox_mode(BoundingBoxMode::Diagonal);
    let data = encode(&mesh, &params);
    let decoded = decode_mesh(&data, StreamType::Binary).unwrap();

    let extent = decoded.coord_range().extent;
    assert_eq!(extent[0], extent[1]);
    assert_eq!(extent[1], extent[2]);
    assert!((extent[0] - 102.0f32.sqrt()).abs() < 1e-4);
    assert_within_step(mesh.coords(), decoded.coords(), decoded.coord_range(), 10);
}

#[test]
fn test_diagonal_bounding_box_of_huge_mesh() {
    let mut mesh = unit_cube();
    for c in mesh.coords_mut() {
        for v in c.iter_mut() {
            *v *= 2e19;
        }
    }
    let params = EncodeParams::new().with_bbox_mode(BoundingBoxMode::Diagonal);
    let data = encode(&mesh, &params);
    let decoded = decode_mesh(&data, StreamType::Binary).unwrap();

    let extent = decoded.coord_range().extent;
    assert!(extent.iter().all(|e| e.is_finite()));
    assert!(extent[0] > 3.4e19 && extent[0] < 3.5e19);
    assert_eq!(decoded.triangles(), mesh.triangles());
}

#[test]
fn test_independently_indexed_attribute() {
    let mut mesh = unit_cube();
    // Fewer texture coordinates than vertices: coded without connectivity.
    mesh.set_texcoords(vec![[0.0, 0.0], [1.0, 0.0], [0.25, 0.75]]);
    let data = encode(&mesh, &EncodeParams::default());
    let decoded = decode_mesh(&data, StreamType::Binary).unwrap();
    assert_eq!(decoded.num_texcoords(), 3);
    assert_within_step(mesh.texcoords(), decoded.texcoords(), decoded.texcoord_range(), 10);
}

#[test]
fn test_encode_appends_to_existing_content() {
    let mesh = unit_cube();
    let mut buffer = EncoderBuffer::new();
    buffer.encode_data(b"prefix");
    Sc3dmcEncoder::new()
        .encode(&EncodeParams::default(), &mesh, &mut buffer)
        .unwrap();
    assert_eq!(&buffer.data()[..6], b"prefix");

    let decoded = decode_mesh(&buffer.data()[6..], StreamType::Binary).unwrap();
    assert_eq!(decoded.triangles(), mesh.triangles());
}

#[test]
fn test_encoding_is_deterministic() {
    let mesh = unit_cube();
    let params = EncodeParams::default();
    assert_eq!(encode(&mesh, &params), encode(&mesh, &params));
}

fn arb_mesh() -> impl Strategy<Value = IndexedFaceSet> {
    (3usize..40, any::<bool>()).prop_flat_map(|(num_vertices, with_normals)| {
        let coords = prop::collection::vec(prop::array::uniform3(-100.0f32..100.0), num_vertices);
        let normals = prop::collection::vec(prop::array::uniform3(-1.0f32..1.0), num_vertices);
        let triangles = prop::collection::vec(
            prop::array::uniform3(0..num_vertices as u32),
            1..(3 * num_vertices),
        );
        (coords, normals, triangles).prop_map(move |(coords, normals, triangles)| {
            let mut mesh = IndexedFaceSet::new();
            mesh.set_coords(coords);
            if with_normals {
                mesh.set_normals(normals);
            }
            mesh.set_triangles(triangles);
            mesh
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_roundtrip_within_one_step(
        mesh in arb_mesh(),
        coord_bits in 8u32..=16,
        normal_bits in 8u32..=16,
        diagonal in any::<bool>(),
        ascii in any::<bool>(),
    ) {
        let stream_type = if ascii { StreamType::Ascii } else { StreamType::Binary };
        let mode = if diagonal { BoundingBoxMode::Diagonal } else { BoundingBoxMode::PerAxis };
        let params = EncodeParams::new()
            .with_coord_bits(coord_bits)
            .with_normal_bits(normal_bits)
            .with_bbox_mode(mode)
            .with_stream_type(stream_type);
        let data = encode(&mesh, &params);
        let decoded = decode_mesh(&data, stream_type).unwrap();

        prop_assert_eq!(decoded.triangles(), mesh.triangles());
        assert_within_step(mesh.coords(), decoded.coords(), decoded.coord_range(), coord_bits);
        assert_within_step(mesh.normals(), decoded.normals(), decoded.normal_range(), normal_bits);
    }
}
