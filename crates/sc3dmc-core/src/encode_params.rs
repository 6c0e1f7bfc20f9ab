use std::fmt;
use std::str::FromStr;

use crate::bounding_box::BoundingBoxMode;
use crate::quantization_utils::{is_valid_quantization_bits, MAX_QUANTIZATION_BITS, MIN_QUANTIZATION_BITS};
use crate::status::{Sc3dmcError, Status};

/// Encoding of the logical field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamType {
    /// Bit-packed fields with entropy-coded payload sections.
    #[default]
    Binary = 1,
    /// Whitespace-delimited decimal tokens, for inspection.
    Ascii = 2,
}

impl StreamType {
    pub fn tag(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for StreamType {
    type Error = ();
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(StreamType::Binary),
            2 => Ok(StreamType::Ascii),
            _ => Err(()),
        }
    }
}

impl FromStr for StreamType {
    type Err = Sc3dmcError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(StreamType::Binary),
            "ascii" => Ok(StreamType::Ascii),
            _ => Err(Sc3dmcError::InvalidParameter(format!(
                "Unknown stream type '{}', expected binary or ascii",
                s
            ))),
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamType::Binary => write!(f, "binary"),
            StreamType::Ascii => write!(f, "ascii"),
        }
    }
}

pub const DEFAULT_COORD_BITS: u32 = 12;
pub const DEFAULT_NORMAL_BITS: u32 = 10;
pub const DEFAULT_COLOR_BITS: u32 = 10;
pub const DEFAULT_TEXCOORD_BITS: u32 = 10;

/// Per-call encoder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeParams {
    pub coord_bits: u32,
    pub normal_bits: u32,
    pub color_bits: u32,
    pub texcoord_bits: u32,
    pub bbox_mode: BoundingBoxMode,
    pub stream_type: StreamType,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            coord_bits: DEFAULT_COORD_BITS,
            normal_bits: DEFAULT_NORMAL_BITS,
            color_bits: DEFAULT_COLOR_BITS,
            texcoord_bits: DEFAULT_TEXCOORD_BITS,
            bbox_mode: BoundingBoxMode::PerAxis,
            stream_type: StreamType::Binary,
        }
    }
}

impl EncodeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coord_bits(mut self, bits: u32) -> Self {
        self.coord_bits = bits;
        self
    }

    pub fn with_normal_bits(mut self, bits: u32) -> Self {
        self.normal_bits = bits;
        self
    }

    pub fn with_color_bits(mut self, bits: u32) -> Self {
        self.color_bits = bits;
        self
    }

    pub fn with_texcoord_bits(mut self, bits: u32) -> Self {
        self.texcoord_bits = bits;
        self
    }

    pub fn with_bbox_mode(mut self, mode: BoundingBoxMode) -> Self {
        self.bbox_mode = mode;
        self
    }

    pub fn with_stream_type(mut self, stream_type: StreamType) -> Self {
        self.stream_type = stream_type;
        self
    }

    pub fn validate(&self) -> Status {
        for (name, bits) in [
            ("coordinate", self.coord_bits),
            ("normal", self.normal_bits),
            ("color", self.color_bits),
            ("texture coordinate", self.texcoord_bits),
        ] {
            if !is_valid_quantization_bits(bits) {
                return Err(Sc3dmcError::InvalidParameter(format!(
                    "{} quantization bits {} outside [{}, {}]",
                    name, bits, MIN_QUANTIZATION_BITS, MAX_QUANTIZATION_BITS
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = EncodeParams::default();
        assert_eq!(params.coord_bits, 12);
        assert_eq!(params.normal_bits, 10);
        assert_eq!(params.texcoord_bits, 10);
        assert_eq!(params.stream_type, StreamType::Binary);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_bits() {
        let params = EncodeParams::new().with_normal_bits(17);
        assert!(matches!(params.validate(), Err(Sc3dmcError::InvalidParameter(_))));
        let params = EncodeParams::new().with_coord_bits(7);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_stream_type_parsing() {
        assert_eq!("binary".parse::<StreamType>().unwrap(), StreamType::Binary);
        assert_eq!("ASCII".parse::<StreamType>().unwrap(), StreamType::Ascii);
        assert!("hex".parse::<StreamType>().is_err());
        assert_eq!(StreamType::try_from(2), Ok(StreamType::Ascii));
        assert!(StreamType::try_from(0).is_err());
        assert_eq!(StreamType::Ascii.to_string(), "ascii");
    }
}
