//! Mesh I/O for the SC3DMC codec.
//!
//! Reads and writes Wavefront OBJ text. The reader de-duplicates
//! (position, normal, texcoord) corners so every attribute of the returned
//! [`IndexedFaceSet`](sc3dmc_core::IndexedFaceSet) shares one index space,
//! which is what the encoder expects.
//!
//! ```no_run
//! use sc3dmc_io::{read_obj, write_obj};
//!
//! let mesh = read_obj("bunny.obj")?;
//! write_obj("bunny_copy.obj", &mesh)?;
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod obj_reader;
pub mod obj_writer;
pub mod traits;

pub use obj_reader::{parse_obj, read_obj, ObjError, ObjReader};
pub use obj_writer::{write_obj, ObjWriter};
pub use traits::{Reader, Writer};
