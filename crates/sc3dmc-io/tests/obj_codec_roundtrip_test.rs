use std::fs;

use sc3dmc_core::{decode_mesh, EncodeParams, EncoderBuffer, IndexedFaceSet, Sc3dmcEncoder, StreamType};
use sc3dmc_io::{ObjReader, ObjWriter, Reader, Writer};
use tempfile::tempdir;

// Cube with per-face normals: 8 positions, 6 normals, 24 unique corners.
const CUBE_OBJ: &str = "\
# cube
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
vn 0 0 -1
vn 0 0 1
vn 0 -1 0
vn 1 0 0
vn 0 1 0
vn -1 0 0
f 1//1 4//1 3//1 2//1
f 5//2 6//2 7//2 8//2
f 1//3 2//3 6//3 5//3
f 2//4 3//4 7//4 6//4
f 3//5 4//5 8//5 7//5
f 4//6 1//6 5//6 8//6
";

fn load<R: Reader>(path: &std::path::Path) -> IndexedFaceSet {
    R::open(path).unwrap().read_mesh().unwrap()
}

fn save<W: Writer>(mut writer: W, path: &std::path::Path, mesh: &IndexedFaceSet) {
    writer.add_mesh(mesh, Some("cube")).unwrap();
    writer.write(path).unwrap();
}

#[test]
fn test_obj_encode_decode_obj() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("cube.obj");
    fs::write(&input, CUBE_OBJ).unwrap();

    let mesh = load::<ObjReader>(&input);
    assert_eq!(mesh.num_vertices(), 24);
    assert_eq!(mesh.num_normals(), 24);
    assert_eq!(mesh.num_triangles(), 12);

    for stream_type in [StreamType::Binary, StreamType::Ascii] {
        let mut buffer = EncoderBuffer::new();
        let params = EncodeParams::new().with_stream_type(stream_type);
        Sc3dmcEncoder::new().encode(&params, &mesh, &mut buffer).unwrap();
        let decoded = decode_mesh(buffer.data(), stream_type).unwrap();

        let output = dir.path().join("cube_dec.obj");
        save(ObjWriter::new(), &output, &decoded);
        let text = fs::read_to_string(&output).unwrap();
        assert!(text.contains("# Faces: 12"));
        assert!(text.contains("f 1//1 2//2 3//3"));

        let reread = load::<ObjReader>(&output);
        assert_eq!(reread.triangles(), mesh.triangles());
        for (a, b) in reread.coords().iter().zip(mesh.coords()) {
            for axis in 0..3 {
                assert!((a[axis] - b[axis]).abs() < 1e-3);
            }
        }
        for (a, b) in reread.normals().iter().zip(mesh.normals()) {
            for axis in 0..3 {
                assert!((a[axis] - b[axis]).abs() < 1e-2);
            }
        }
    }
}

#[test]
fn test_malformed_obj_is_invalid_data() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bad.obj");
    fs::write(&input, "v 0 0 0\nv 1 0 0\nf 1 2 7\n").unwrap();
    let err = ObjReader::open(&input).unwrap().read_mesh().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}
