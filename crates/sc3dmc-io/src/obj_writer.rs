//! OBJ format writer.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use sc3dmc_core::IndexedFaceSet;

use crate::traits::Writer;

/// OBJ format writer.
///
/// Collects meshes and writes them as one file. Normals and texture
/// coordinates are referenced from faces only when they have one entry per
/// vertex.
#[derive(Debug, Default)]
pub struct ObjWriter {
    meshes: Vec<(Option<String>, IndexedFaceSet)>,
}

impl ObjWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: &IndexedFaceSet, name: Option<&str>) {
        self.meshes.push((name.map(str::to_string), mesh.clone()));
    }

    /// Write all meshes to `path`.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, &path.display().to_string())?;
        writer.flush()
    }

    /// Write all meshes to any sink. `object` names the file in the banner.
    pub fn write_to<W: Write>(&self, out: &mut W, object: &str) -> io::Result<()> {
        writeln!(out, "####")?;
        writeln!(out, "#")?;
        writeln!(out, "# OBJ File Generated by sc3dmc")?;
        writeln!(out, "#")?;
        writeln!(out, "####")?;
        writeln!(out, "# Object {}", object)?;
        writeln!(out, "#")?;
        writeln!(out, "# Vertices: {}", Writer::vertex_count(self))?;
        writeln!(out, "# Faces: {}", Writer::face_count(self))?;
        writeln!(out, "#")?;
        writeln!(out, "####")?;

        let (mut base_v, mut base_vn, mut base_vt) = (1usize, 1usize, 1usize);
        for (name, mesh) in &self.meshes {
            if let Some(name) = name {
                writeln!(out, "o {}", name)?;
            }
            write_mesh(out, mesh, base_v, base_vn, base_vt)?;
            base_v += mesh.num_vertices();
            base_vn += mesh.num_normals();
            base_vt += mesh.num_texcoords();
        }
        Ok(())
    }
}

fn write_mesh<W: Write>(
    out: &mut W,
    mesh: &IndexedFaceSet,
    base_v: usize,
    base_vn: usize,
    base_vt: usize,
) -> io::Result<()> {
    let colored = mesh.num_colors() > 0 && mesh.is_per_vertex(mesh.num_colors());
    for (i, p) in mesh.coords().iter().enumerate() {
        if colored {
            let c = mesh.colors()[i];
            writeln!(out, "v {} {} {} {} {} {}", p[0], p[1], p[2], c[0], c[1], c[2])?;
        } else {
            writeln!(out, "v {} {} {}", p[0], p[1], p[2])?;
        }
    }
    for n in mesh.normals() {
        writeln!(out, "vn {} {} {}", n[0], n[1], n[2])?;
    }
    for t in mesh.texcoords() {
        writeln!(out, "vt {} {}", t[0], t[1])?;
    }

    let with_normals = mesh.num_normals() > 0 && mesh.is_per_vertex(mesh.num_normals());
    let with_texcoords = mesh.num_texcoords() > 0 && mesh.is_per_vertex(mesh.num_texcoords());
    for tri in mesh.triangles() {
        write!(out, "f")?;
        for &v in tri {
            let v = v as usize;
            match (with_texcoords, with_normals) {
                (true, true) => write!(out, " {}/{}/{}", base_v + v, base_vt + v, base_vn + v)?,
                (false, true) => write!(out, " {}//{}", base_v + v, base_vn + v)?,
                (true, false) => write!(out, " {}/{}", base_v + v, base_vt + v)?,
                (false, false) => write!(out, " {}", base_v + v)?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

impl Writer for ObjWriter {
    fn new() -> Self {
        Self::default()
    }

    fn add_mesh(&mut self, mesh: &IndexedFaceSet, name: Option<&str>) -> io::Result<()> {
        ObjWriter::add_mesh(self, mesh, name);
        Ok(())
    }

    fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        ObjWriter::write(self, path)
    }

    fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|(_, m)| m.num_vertices()).sum()
    }

    fn face_count(&self) -> usize {
        self.meshes.iter().map(|(_, m)| m.num_triangles()).sum()
    }
}

/// Write a single mesh to an OBJ file.
pub fn write_obj<P: AsRef<Path>>(path: P, mesh: &IndexedFaceSet) -> io::Result<()> {
    let mut writer = ObjWriter::new();
    writer.add_mesh(mesh, None);
    writer.write(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj_reader::parse_obj;
    use std::io::Cursor;

    fn triangle() -> IndexedFaceSet {
        let mut mesh = IndexedFaceSet::new();
        mesh.set_coords(vec![[0.0, 0.0, 0.0], [1.5, 0.0, 0.0], [0.0, 1.0, -2.0]]);
        mesh.set_triangles(vec![[0, 1, 2]]);
        mesh
    }

    fn to_string(writer: &ObjWriter) -> String {
        let mut out = Vec::new();
        writer.write_to(&mut out, "test").unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_positions_only() {
        let mut writer = ObjWriter::new();
        writer.add_mesh(&triangle(), None);
        let text = to_string(&writer);
        assert!(text.contains("# Vertices: 3\n# Faces: 1\n"));
        assert!(text.contains("v 1.5 0 0\n"));
        assert!(text.ends_with("f 1 2 3\n"));
    }

    #[test]
    fn test_face_forms() {
        let mut mesh = triangle();
        mesh.set_normals(vec![[0.0, 0.0, 1.0]; 3]);
        let mut writer = ObjWriter::new();
        writer.add_mesh(&mesh, None);
        assert!(to_string(&writer).ends_with("f 1//1 2//2 3//3\n"));

        mesh.set_texcoords(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let mut writer = ObjWriter::new();
        writer.add_mesh(&mesh, None);
        assert!(to_string(&writer).ends_with("f 1/1/1 2/2/2 3/3/3\n"));

        mesh.set_normals(Vec::new());
        let mut writer = ObjWriter::new();
        writer.add_mesh(&mesh, None);
        assert!(to_string(&writer).ends_with("f 1/1 2/2 3/3\n"));
    }

    #[test]
    fn test_multiple_meshes_offset_indices() {
        let mut writer = ObjWriter::new();
        writer.add_mesh(&triangle(), Some("first"));
        writer.add_mesh(&triangle(), Some("second"));
        assert_eq!(Writer::vertex_count(&writer), 6);
        let text = to_string(&writer);
        assert!(text.contains("o second\n"));
        assert!(text.ends_with("f 4 5 6\n"));
    }

    #[test]
    fn test_written_text_reads_back() {
        let mut mesh = triangle();
        mesh.set_colors(vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        mesh.set_texcoords(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let mut writer = ObjWriter::new();
        writer.add_mesh(&mesh, None);
        let text = to_string(&writer);

        let read = parse_obj(Cursor::new(text)).unwrap();
        assert_eq!(read, mesh);
    }
}
