//! Common traits for mesh readers and writers.
//!
//! Import the trait to access its methods:
//!
//! ```no_run
//! use sc3dmc_io::{ObjReader, ObjWriter, Reader, Writer};
//!
//! fn convert<R: Reader, W: Writer>(input: &str, output: &str) -> std::io::Result<()> {
//!     let mesh = R::open(input)?.read_mesh()?;
//!     let mut writer = W::new();
//!     writer.add_mesh(&mesh, Some("Model"))?;
//!     writer.write(output)
//! }
//!
//! convert::<ObjReader, ObjWriter>("in.obj", "out.obj").unwrap();
//! ```

use std::io;
use std::path::Path;

use sc3dmc_core::IndexedFaceSet;

/// Common interface for mesh writers.
pub trait Writer: Sized {
    /// Create a new writer instance.
    fn new() -> Self;

    /// Add a mesh to be written.
    ///
    /// # Arguments
    /// * `mesh` - The mesh to add
    /// * `name` - Optional name for the mesh (if format supports naming)
    fn add_mesh(&mut self, mesh: &IndexedFaceSet, name: Option<&str>) -> io::Result<()>;

    /// Write all added meshes to a file.
    fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()>;

    /// Get the number of vertices added.
    fn vertex_count(&self) -> usize;

    /// Get the number of faces added (if applicable).
    fn face_count(&self) -> usize {
        0
    }
}

/// Common interface for mesh readers.
pub trait Reader: Sized {
    /// Open a file for reading.
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self>;

    /// Read every mesh in the file.
    fn read_meshes(&mut self) -> io::Result<Vec<IndexedFaceSet>>;

    /// Read a single mesh from the file.
    ///
    /// Default implementation returns the first mesh from `read_meshes()`.
    fn read_mesh(&mut self) -> io::Result<IndexedFaceSet> {
        let meshes = self.read_meshes()?;
        if let Some(m) = meshes.into_iter().next() {
            Ok(m)
        } else {
            Err(io::Error::new(io::ErrorKind::InvalidData, "No mesh found"))
        }
    }
}
