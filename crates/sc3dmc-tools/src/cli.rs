use std::path::PathBuf;

use clap::ValueHint;
use sc3dmc_core::encode_params::{
    DEFAULT_COLOR_BITS, DEFAULT_COORD_BITS, DEFAULT_NORMAL_BITS, DEFAULT_TEXCOORD_BITS,
};
use sc3dmc_core::{BoundingBoxMode, EncodeParams, StreamType};
use tracing_subscriber::EnvFilter;

/// Long flags also accepted with a single dash.
const LEGACY_FLAGS: [&str; 5] = ["-qc", "-qn", "-qt", "-qcol", "-st"];

#[derive(Debug, Copy, Clone, Eq, PartialEq, clap::ValueEnum)]
pub enum BboxArg {
    PerAxis,
    Diagonal,
}

impl From<BboxArg> for BoundingBoxMode {
    fn from(arg: BboxArg) -> Self {
        match arg {
            BboxArg::PerAxis => BoundingBoxMode::PerAxis,
            BboxArg::Diagonal => BoundingBoxMode::Diagonal,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Mode {
    Encode,
    Decode,
}

#[derive(Debug, clap::Parser)]
#[command(
    name = "sc3dmc",
    version,
    about = "Compress OBJ meshes into SC3DMC bitstreams and back",
    after_help = "Examples:\n  \
        Encode binary: sc3dmc -c -i mesh.obj -st binary\n  \
        Encode ascii:  sc3dmc -c -i mesh.obj -st ascii\n  \
        Decode:        sc3dmc -d -i mesh.s3d"
)]
pub struct Cli {
    /// Encode the input OBJ into <stem>.s3d
    #[arg(short = 'c', long = "encode", conflicts_with = "decode")]
    pub encode: bool,
    /// Decode the input bitstream into <stem>_dec.obj
    #[arg(short = 'd', long = "decode")]
    pub decode: bool,
    /// Input mesh (.obj) or bitstream (.s3d)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub input: Option<PathBuf>,
    /// Quantization bits for positions (8..=16)
    #[arg(long = "qc", value_name = "BITS", default_value_t = DEFAULT_COORD_BITS)]
    pub coord_bits: u32,
    /// Quantization bits for normals (8..=16)
    #[arg(long = "qn", value_name = "BITS", default_value_t = DEFAULT_NORMAL_BITS)]
    pub normal_bits: u32,
    /// Quantization bits for texture coordinates (8..=16)
    #[arg(long = "qt", value_name = "BITS", default_value_t = DEFAULT_TEXCOORD_BITS)]
    pub texcoord_bits: u32,
    /// Quantization bits for colors (8..=16)
    #[arg(long = "qcol", value_name = "BITS", default_value_t = DEFAULT_COLOR_BITS)]
    pub color_bits: u32,
    /// Stream type: binary or ascii. Decoding detects it when omitted
    #[arg(long = "st", value_name = "TYPE")]
    pub stream_type: Option<StreamType>,
    /// Bounding box used to normalize every attribute
    #[arg(long, value_enum, default_value_t = BboxArg::PerAxis)]
    pub bbox: BboxArg,
}

impl Cli {
    pub fn mode(&self) -> Option<Mode> {
        match (self.encode, self.decode) {
            (true, _) => Some(Mode::Encode),
            (_, true) => Some(Mode::Decode),
            _ => None,
        }
    }

    pub fn encode_params(&self) -> EncodeParams {
        EncodeParams::new()
            .with_coord_bits(self.coord_bits)
            .with_normal_bits(self.normal_bits)
            .with_color_bits(self.color_bits)
            .with_texcoord_bits(self.texcoord_bits)
            .with_bbox_mode(self.bbox.into())
            .with_stream_type(self.stream_type.unwrap_or_default())
    }
}

/// Rewrites `-qc 12` style flags to their `--qc 12` long form.
pub fn normalize_legacy_args<I: IntoIterator<Item = String>>(args: I) -> Vec<String> {
    args.into_iter()
        .map(|arg| {
            if LEGACY_FLAGS.contains(&arg.as_str()) {
                format!("-{}", arg)
            } else {
                arg
            }
        })
        .collect()
}

/// Log to stderr, filtered by `RUST_LOG` (default `info`).
pub fn initialize_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
