//! OBJ format reader.
//!
//! Reads `v`, `vn`, `vt` and `f` records. Every distinct
//! (position, normal, texcoord) corner becomes one output vertex, so all
//! attributes of the returned [`IndexedFaceSet`] share the triangle index
//! space. Polygons are fan-triangulated.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use sc3dmc_core::IndexedFaceSet;
use thiserror::Error;

use crate::traits::Reader;

/// Errors raised while parsing OBJ text.
#[derive(Error, Debug)]
pub enum ObjError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("{kind} index {index} is outside the {count} defined")]
    IndexOutOfRange {
        kind: &'static str,
        index: i64,
        count: usize,
    },

    #[error("OBJ file has no faces")]
    NoFaces,
}

impl From<ObjError> for io::Error {
    fn from(err: ObjError) -> Self {
        match err {
            ObjError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

/// OBJ format reader.
#[derive(Debug)]
pub struct ObjReader {
    path: PathBuf,
}

impl ObjReader {
    /// Open an OBJ file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            ));
        }
        Ok(Self { path })
    }

    /// Read the mesh, de-duplicating corners into shared vertices.
    pub fn read_mesh(&mut self) -> io::Result<IndexedFaceSet> {
        read_obj(&self.path)
    }
}

impl Reader for ObjReader {
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        ObjReader::open(path)
    }

    fn read_meshes(&mut self) -> io::Result<Vec<IndexedFaceSet>> {
        Ok(vec![self.read_mesh()?])
    }
}

/// A face corner after index resolution. Ordering is lexicographic over
/// (position, normal, texcoord).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Corner {
    position: usize,
    normal: Option<usize>,
    texcoord: Option<usize>,
}

#[derive(Debug, Default)]
struct ObjData {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
    uncolored_positions: usize,
    vertex_ids: BTreeMap<Corner, u32>,
    corners: Vec<Corner>,
    triangles: Vec<[u32; 3]>,
}

/// Parse an OBJ file into a mesh.
pub fn read_obj<P: AsRef<Path>>(path: P) -> io::Result<IndexedFaceSet> {
    let file = fs::File::open(path)?;
    parse_obj(BufReader::new(file))
}

/// Parse OBJ text from any buffered source.
pub fn parse_obj<R: BufRead>(reader: R) -> io::Result<IndexedFaceSet> {
    let mut data = ObjData::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        data.parse_line(i + 1, &line)?;
    }
    data.into_mesh().map_err(io::Error::from)
}

fn parse_error(line: usize, message: impl Into<String>) -> ObjError {
    ObjError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_floats<const N: usize>(line: usize, tokens: &[&str]) -> Result<[f32; N], ObjError> {
    if tokens.len() < N {
        return Err(parse_error(
            line,
            format!("expected {} values, found {}", N, tokens.len()),
        ));
    }
    let mut out = [0.0f32; N];
    for (value, token) in out.iter_mut().zip(tokens) {
        *value = token
            .parse()
            .map_err(|_| parse_error(line, format!("invalid number '{}'", token)))?;
    }
    Ok(out)
}

/// Resolves a 1-based or negative (relative) OBJ index against `count`
/// elements defined so far.
fn resolve_index(line: usize, token: &str, count: usize) -> Result<usize, ObjError> {
    let index: i64 = token
        .parse()
        .map_err(|_| parse_error(line, format!("invalid index '{}'", token)))?;
    let resolved = match index {
        0 => return Err(parse_error(line, "OBJ indices start at 1")),
        i if i > 0 => i - 1,
        i => count as i64 + i,
    };
    usize::try_from(resolved).map_err(|_| ObjError::IndexOutOfRange {
        kind: "relative",
        index,
        count,
    })
}

impl ObjData {
    fn parse_line(&mut self, line: usize, text: &str) -> Result<(), ObjError> {
        let mut tokens = text.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Ok(());
        };
        let rest: Vec<&str> = tokens.collect();
        match keyword {
            "v" => {
                self.positions.push(parse_floats::<3>(line, &rest)?);
                if rest.len() >= 6 {
                    self.colors.push(parse_floats::<3>(line, &rest[3..])?);
                } else {
                    self.uncolored_positions += 1;
                }
            }
            "vn" => self.normals.push(parse_floats::<3>(line, &rest)?),
            "vt" => self.texcoords.push(parse_floats::<2>(line, &rest)?),
            "f" => self.parse_face(line, &rest)?,
            // Groups, materials and smoothing carry nothing the codec keeps.
            _ => {}
        }
        Ok(())
    }

    fn parse_face(&mut self, line: usize, tokens: &[&str]) -> Result<(), ObjError> {
        if tokens.len() < 3 {
            return Err(parse_error(
                line,
                format!("face needs at least 3 corners, found {}", tokens.len()),
            ));
        }
        let mut ids = Vec::with_capacity(tokens.len());
        for token in tokens {
            let corner = self.parse_corner(line, token)?;
            ids.push(self.vertex_id(corner));
        }
        for i in 1..ids.len() - 1 {
            self.triangles.push([ids[0], ids[i], ids[i + 1]]);
        }
        Ok(())
    }

    /// Parses `p`, `p/t`, `p//n` or `p/t/n`.
    fn parse_corner(&self, line: usize, token: &str) -> Result<Corner, ObjError> {
        let mut parts = token.split('/');
        let position = match parts.next() {
            Some(p) if !p.is_empty() => resolve_index(line, p, self.positions.len())?,
            _ => return Err(parse_error(line, format!("corner '{}' has no position", token))),
        };
        let texcoord = match parts.next() {
            Some(t) if !t.is_empty() => Some(resolve_index(line, t, self.texcoords.len())?),
            _ => None,
        };
        let normal = match parts.next() {
            Some(n) if !n.is_empty() => Some(resolve_index(line, n, self.normals.len())?),
            _ => None,
        };
        if parts.next().is_some() {
            return Err(parse_error(line, format!("malformed corner '{}'", token)));
        }
        Ok(Corner {
            position,
            normal,
            texcoord,
        })
    }

    fn vertex_id(&mut self, corner: Corner) -> u32 {
        let next = self.corners.len() as u32;
        *self.vertex_ids.entry(corner).or_insert_with(|| {
            self.corners.push(corner);
            next
        })
    }

    fn into_mesh(self) -> Result<IndexedFaceSet, ObjError> {
        if self.triangles.is_empty() {
            return Err(ObjError::NoFaces);
        }
        let with_normals = !self.normals.is_empty() && self.corners.iter().all(|c| c.normal.is_some());
        let with_texcoords = !self.texcoords.is_empty() && self.corners.iter().all(|c| c.texcoord.is_some());
        let with_colors = !self.colors.is_empty() && self.uncolored_positions == 0;
        if !self.normals.is_empty() && !with_normals {
            tracing::warn!("some face corners lack normals; dropping normals");
        }
        if !self.texcoords.is_empty() && !with_texcoords {
            tracing::warn!("some face corners lack texture coordinates; dropping them");
        }

        let mut mesh = IndexedFaceSet::new();
        let mut coords = Vec::with_capacity(self.corners.len());
        let mut colors = Vec::new();
        let mut normals = Vec::new();
        let mut texcoords = Vec::new();
        for corner in &self.corners {
            coords.push(lookup(&self.positions, corner.position, "position")?);
            if with_colors {
                colors.push(lookup(&self.colors, corner.position, "position")?);
            }
            if let (true, Some(n)) = (with_normals, corner.normal) {
                normals.push(lookup(&self.normals, n, "normal")?);
            }
            if let (true, Some(t)) = (with_texcoords, corner.texcoord) {
                texcoords.push(lookup(&self.texcoords, t, "texture coordinate")?);
            }
        }

        tracing::debug!(
            positions = self.positions.len(),
            vertices = coords.len(),
            triangles = self.triangles.len(),
            normals = normals.len(),
            texcoords = texcoords.len(),
            colors = colors.len(),
            "parsed OBJ"
        );
        mesh.set_coords(coords);
        mesh.set_colors(colors);
        mesh.set_normals(normals);
        mesh.set_texcoords(texcoords);
        mesh.set_triangles(self.triangles);
        Ok(mesh)
    }
}

fn lookup<T: Copy>(values: &[T], index: usize, kind: &'static str) -> Result<T, ObjError> {
    values.get(index).copied().ok_or(ObjError::IndexOutOfRange {
        kind,
        index: index as i64 + 1,
        count: values.len(),
    })
}
