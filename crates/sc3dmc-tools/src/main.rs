//! `sc3dmc`: encode OBJ meshes into SC3DMC bitstreams and decode them back.

mod cli;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use sc3dmc_core::{
    EncodeParams, EncoderBuffer, IndexedFaceSet, MeshHeader, Sc3dmcDecoder, Sc3dmcEncoder, Sc3dmcError,
    StreamType,
};
use sc3dmc_io::{ObjReader, ObjWriter, Writer};
use thiserror::Error;

use crate::cli::{Cli, Mode};

#[derive(Error, Debug)]
enum ToolError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Codec(#[from] Sc3dmcError),
}

fn main() {
    let args = cli::normalize_legacy_args(std::env::args());
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(-1);
        }
    };
    cli::initialize_tracing();

    let (Some(mode), Some(input)) = (cli.mode(), cli.input.as_deref()) else {
        let _ = Cli::command().print_help();
        println!();
        process::exit(-1);
    };

    let result = match mode {
        Mode::Encode => encode(&cli, input),
        Mode::Decode => decode(&cli, input),
    };
    if let Err(e) = result {
        println!("Error: {}", e);
        process::exit(-1);
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// `dir/stem.ext` -> `dir/stem<suffix>`.
fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    input.with_file_name(format!("{}{}", stem, suffix))
}

fn print_mesh_info(num_vertices: usize, num_normals: usize, num_colors: usize, num_texcoords: usize, num_triangles: usize) {
    println!("Mesh info");
    println!("\t# coords    {}", num_vertices);
    println!("\t# normals   {}", num_normals);
    println!("\t# colors    {}", num_colors);
    println!("\t# texcoords {}", num_texcoords);
    println!("\t# triangles {}", num_triangles);
}

fn print_params(input: &Path, params: &EncodeParams) {
    println!("----------------------------------------");
    println!("Encode Parameters");
    println!("   Input           \t {}", input.display());
    println!("   Coord Quant.    \t {}", params.coord_bits);
    println!("   Normal Quant.   \t {}", params.normal_bits);
    println!("   Color Quant.    \t {}", params.color_bits);
    println!("   TexCoord Quant. \t {}", params.texcoord_bits);
    println!("   Bounding Box    \t {:?}", params.bbox_mode);
    println!("   Stream Type     \t {}", params.stream_type);
}

fn encode(cli: &Cli, input: &Path) -> Result<(), ToolError> {
    let params = cli.encode_params();
    params.validate()?;
    print_params(input, &params);

    println!("Loading {} ...", input.display());
    let mesh = ObjReader::open(input)?.read_mesh()?;
    println!("Done.");
    print_mesh_info(
        mesh.num_vertices(),
        mesh.num_normals(),
        mesh.num_colors(),
        mesh.num_texcoords(),
        mesh.num_triangles(),
    );

    let mut buffer = EncoderBuffer::new();
    let start = Instant::now();
    Sc3dmcEncoder::new().encode(&params, &mesh, &mut buffer)?;
    println!("Encode time (ms) {:.3}", elapsed_ms(start));

    let output = sibling_path(input, ".s3d");
    fs::write(&output, buffer.data())?;
    println!("Bitstream size (bytes) {}", buffer.size());
    tracing::info!(output = %output.display(), bytes = buffer.size(), "wrote bitstream");
    Ok(())
}

/// ASCII streams start with the decimal tag `2`, binary ones with byte 1.
fn detect_stream_type(data: &[u8]) -> StreamType {
    let ascii_tag = b'0' + StreamType::Ascii.tag() as u8;
    if data.first() == Some(&ascii_tag) {
        StreamType::Ascii
    } else {
        StreamType::Binary
    }
}

fn decode(cli: &Cli, input: &Path) -> Result<(), ToolError> {
    let data = fs::read(input)?;
    println!("Bitstream size (bytes) {}", data.len());
    let stream_type = cli.stream_type.unwrap_or_else(|| detect_stream_type(&data));

    let decoder = Sc3dmcDecoder::new(stream_type);
    let start = Instant::now();
    let header_read = decoder.decode_header(&data)?;
    println!("DecodeHeader time (ms) {:.3}", elapsed_ms(start));

    let header: &MeshHeader = header_read.header();
    let mut mesh = IndexedFaceSet::new();
    mesh.allocate_from_header(header)?;
    print_mesh_info(
        mesh.num_vertices(),
        mesh.num_normals(),
        mesh.num_colors(),
        mesh.num_texcoords(),
        mesh.num_triangles(),
    );

    let start = Instant::now();
    header_read.decode_payload(&mut mesh)?;
    println!("DecodePayload time (ms) {:.3}", elapsed_ms(start));

    let output = sibling_path(input, "_dec.obj");
    println!("Saving {} ...", output.display());
    let mut writer = ObjWriter::new();
    Writer::add_mesh(&mut writer, &mesh, None)?;
    Writer::write(&writer, &output)?;
    println!("Done.");
    Ok(())
}
