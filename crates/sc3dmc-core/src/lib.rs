//! SC3DMC Core Library
//!
//! Compression and decompression of static indexed triangle meshes:
//! bounding-box normalization, fixed-point quantization, connectivity-driven
//! prediction, context-modelled residual coding and the binary/ASCII stream
//! container that carries them.

#![allow(clippy::needless_range_loop)] // Per-component loops over const-generic arrays

// =============================================================================
// Core modules - always available
// =============================================================================

pub mod ans;
pub mod attribute_buffer;
pub mod bounding_box;
pub mod connectivity;
pub mod encode_params;
pub mod header;
pub mod mesh;
pub mod predictor;
pub mod quantization_utils;
pub mod residual_coder;
pub mod status;
pub mod stream_format;

// =============================================================================
// Decoder-only modules
// =============================================================================

#[cfg(feature = "decoder")]
pub mod decoder_buffer;
#[cfg(feature = "decoder")]
pub mod rans_bit_decoder;
#[cfg(feature = "decoder")]
pub mod sc3dmc_decoder;

// =============================================================================
// Encoder-only modules
// =============================================================================

#[cfg(feature = "encoder")]
pub mod encoder_buffer;
#[cfg(feature = "encoder")]
pub mod rans_bit_encoder;
#[cfg(feature = "encoder")]
pub mod sc3dmc_encoder;

// =============================================================================
// Core re-exports - always available
// =============================================================================

pub use attribute_buffer::AttributeBuffer;
pub use bounding_box::{AttributeRange, BoundingBoxMode};
pub use connectivity::ConnectivityIndex;
pub use encode_params::{EncodeParams, StreamType};
pub use header::MeshHeader;
pub use mesh::{IndexedFaceSet, Triangle};
pub use predictor::Predictor;
pub use quantization_utils::{dequantize, quantize, Dequantizer, Quantizer, VectorQuantizer};
pub use status::{Sc3dmcError, Status, StatusResult};

// =============================================================================
// Decoder re-exports
// =============================================================================

#[cfg(feature = "decoder")]
pub use decoder_buffer::DecoderBuffer;
#[cfg(feature = "decoder")]
pub use rans_bit_decoder::RAnsBitDecoder;
#[cfg(feature = "decoder")]
pub use residual_coder::ResidualDecoder;
#[cfg(feature = "decoder")]
pub use sc3dmc_decoder::{decode_mesh, DecoderState, HeaderRead, PayloadComplete, Sc3dmcDecoder};

// =============================================================================
// Encoder re-exports
// =============================================================================

#[cfg(feature = "encoder")]
pub use encoder_buffer::EncoderBuffer;
#[cfg(feature = "encoder")]
pub use rans_bit_encoder::RAnsBitEncoder;
#[cfg(feature = "encoder")]
pub use residual_coder::ResidualEncoder;
#[cfg(feature = "encoder")]
pub use sc3dmc_encoder::Sc3dmcEncoder;
