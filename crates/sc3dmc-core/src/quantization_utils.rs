use num_traits::clamp;

/// Smallest supported quantization bit-depth.
pub const MIN_QUANTIZATION_BITS: u32 = 8;
/// Largest supported quantization bit-depth.
pub const MAX_QUANTIZATION_BITS: u32 = 16;

pub fn is_valid_quantization_bits(bits: u32) -> bool {
    (MIN_QUANTIZATION_BITS..=MAX_QUANTIZATION_BITS).contains(&bits)
}

/// Largest code representable with `bits` bits.
pub fn max_quantized_value(bits: u32) -> u32 {
    debug_assert!(bits > 0 && bits < 32);
    (1u32 << bits) - 1
}

/// The representable code nearest the middle of the domain.
pub fn center_code(bits: u32) -> u32 {
    debug_assert!(bits > 0 && bits < 32);
    1u32 << (bits - 1)
}

/// Maps floats from `[min, min + range]` onto `[0, 2^bits - 1]`.
///
/// Values outside the domain clamp to the nearest end code. A zero range
/// maps everything to code 0.
#[derive(Debug, Default, Clone, Copy)]
pub struct Quantizer {
    min: f32,
    inverse_delta: f32,
    max_quantized_value: u32,
}

impl Quantizer {
    pub fn new(min: f32, range: f32, bits: u32) -> Self {
        let mut q = Self::default();
        q.init(min, range, bits);
        q
    }

    pub fn init(&mut self, min: f32, range: f32, bits: u32) {
        self.min = min;
        self.max_quantized_value = max_quantized_value(bits);
        if range > 0.0 {
            self.inverse_delta = self.max_quantized_value as f32 / range;
        } else {
            self.inverse_delta = 0.0;
        }
    }

    pub fn quantize_float(&self, val: f32) -> u32 {
        let scaled = (val - self.min) * self.inverse_delta;
        if !scaled.is_finite() {
            return 0;
        }
        let code = (scaled + 0.5).floor();
        clamp(code, 0.0, self.max_quantized_value as f32) as u32
    }
}

/// Inverse of [`Quantizer`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Dequantizer {
    min: f32,
    delta: f32,
}

impl Dequantizer {
    pub fn new(min: f32, range: f32, bits: u32) -> Self {
        let mut d = Self::default();
        d.init(min, range, bits);
        d
    }

    pub fn init(&mut self, min: f32, range: f32, bits: u32) {
        self.min = min;
        if range > 0.0 {
            self.delta = range / max_quantized_value(bits) as f32;
        } else {
            self.delta = 0.0;
        }
    }

    pub fn dequantize_float(&self, code: u32) -> f32 {
        self.min + code as f32 * self.delta
    }
}

pub fn quantize(value: f32, axis_min: f32, axis_range: f32, bits: u32) -> u32 {
    Quantizer::new(axis_min, axis_range, bits).quantize_float(value)
}

pub fn dequantize(code: u32, axis_min: f32, axis_range: f32, bits: u32) -> f32 {
    Dequantizer::new(axis_min, axis_range, bits).dequantize_float(code)
}

/// One quantizer per component of an `N`-wide attribute.
#[derive(Debug, Clone, Copy)]
pub struct VectorQuantizer<const N: usize> {
    quantizers: [Quantizer; N],
    dequantizers: [Dequantizer; N],
}

impl<const N: usize> VectorQuantizer<N> {
    pub fn new(min: &[f32; N], range: &[f32; N], bits: u32) -> Self {
        let mut quantizers = [Quantizer::default(); N];
        let mut dequantizers = [Dequantizer::default(); N];
        for d in 0..N {
            quantizers[d].init(min[d], range[d], bits);
            dequantizers[d].init(min[d], range[d], bits);
        }
        Self {
            quantizers,
            dequantizers,
        }
    }

    pub fn quantize(&self, value: &[f32; N]) -> [u32; N] {
        let mut out = [0u32; N];
        for d in 0..N {
            out[d] = self.quantizers[d].quantize_float(value[d]);
        }
        out
    }

    pub fn dequantize(&self, code: &[u32; N]) -> [f32; N] {
        let mut out = [0f32; N];
        for d in 0..N {
            out[d] = self.dequantizers[d].dequantize_float(code[d]);
        }
        out
    }
}
