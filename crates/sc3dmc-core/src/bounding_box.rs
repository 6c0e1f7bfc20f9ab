use num_traits::Float;

/// How attribute ranges are normalized before quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundingBoxMode {
    /// Every axis is normalized to its own extent.
    #[default]
    PerAxis = 0,
    /// Every axis shares the length of the bounding-box diagonal, which
    /// preserves the aspect ratio of the quantization grid.
    Diagonal = 1,
}

impl TryFrom<u32> for BoundingBoxMode {
    type Error = ();
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BoundingBoxMode::PerAxis),
            1 => Ok(BoundingBoxMode::Diagonal),
            _ => Err(()),
        }
    }
}

/// Normalization domain of one attribute stream: a per-axis minimum and a
/// per-axis extent (the quantization range).
///
/// The extent is stored rather than the maximum so that encoder and decoder
/// quantize with bit-identical parameters read from the stream header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeRange<const N: usize> {
    pub min: [f32; N],
    pub extent: [f32; N],
}

impl<const N: usize> Default for AttributeRange<N> {
    fn default() -> Self {
        Self {
            min: [0.0; N],
            extent: [0.0; N],
        }
    }
}

impl<const N: usize> AttributeRange<N> {
    pub fn new(min: [f32; N], extent: [f32; N]) -> Self {
        Self { min, extent }
    }

    /// Computes the range of `values` under `mode`. An empty input yields
    /// the all-zero range.
    pub fn from_values(values: &[[f32; N]], mode: BoundingBoxMode) -> Self {
        let Some((min, max)) = compute_min_max(values) else {
            return Self::default();
        };
        let mut extent = [0.0; N];
        for d in 0..N {
            extent[d] = max[d] - min[d];
        }
        if mode == BoundingBoxMode::Diagonal {
            extent = [diagonal_length(&min, &max); N];
        }
        Self { min, extent }
    }

    pub fn max(&self) -> [f32; N] {
        let mut out = self.min;
        for d in 0..N {
            out[d] += self.extent[d];
        }
        out
    }

    pub fn is_finite(&self) -> bool {
        self.min.iter().chain(self.extent.iter()).all(|v| v.is_finite())
    }
}

/// Per-axis minimum and maximum of a set of vectors.
pub fn compute_min_max<F: Float, const N: usize>(values: &[[F; N]]) -> Option<([F; N], [F; N])> {
    let first = values.first()?;
    let mut min = *first;
    let mut max = *first;
    for v in &values[1..] {
        for d in 0..N {
            min[d] = min[d].min(v[d]);
            max[d] = max[d].max(v[d]);
        }
    }
    Some((min, max))
}

/// Length of the box diagonal. Extents are scaled by the largest one before
/// squaring, so the result only overflows when the diagonal itself does.
pub fn diagonal_length<F: Float, const N: usize>(min: &[F; N], max: &[F; N]) -> F {
    let mut largest = F::zero();
    for d in 0..N {
        largest = largest.max((max[d] - min[d]).abs());
    }
    if largest == F::zero() || !largest.is_finite() {
        return largest;
    }
    let mut sum = F::zero();
    for d in 0..N {
        let e = (max[d] - min[d]) / largest;
        sum = sum + e * e;
    }
    largest * sum.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_axis_range() {
        let values = [[0.0, -1.0, 2.0], [4.0, 1.0, 2.0], [1.0, 0.0, 2.0]];
        let range = AttributeRange::from_values(&values, BoundingBoxMode::PerAxis);
        assert_eq!(range.min, [0.0, -1.0, 2.0]);
        assert_eq!(range.max(), [4.0, 1.0, 2.0]);
        assert_eq!(range.extent, [4.0, 2.0, 0.0]);
    }

    #[test]
    fn test_diagonal_range() {
        let values = [[0.0, 0.0], [3.0, 4.0]];
        let range = AttributeRange::from_values(&values, BoundingBoxMode::Diagonal);
        assert_eq!(range.extent, [5.0, 5.0]);
        assert_eq!(range.min, [0.0, 0.0]);
        assert!(range.is_finite());
    }

    #[test]
    fn test_diagonal_of_huge_box_stays_finite() {
        let values = [[0.0f32, 0.0, 0.0], [2e19, 2e19, 2e19]];
        let range = AttributeRange::from_values(&values, BoundingBoxMode::Diagonal);
        assert!(range.is_finite());
        let expected = 2e19f32 * 3.0f32.sqrt();
        assert!((range.extent[0] - expected).abs() <= expected * 1e-6);

        assert_eq!(diagonal_length(&[1.0f64, 1.0], &[1.0, 1.0]), 0.0);
        assert!(diagonal_length(&[-f32::MAX, 0.0], &[f32::MAX, 0.0]).is_infinite());
    }

    #[test]
    fn test_empty() {
        let values: [[f32; 3]; 0] = [];
        assert_eq!(
            AttributeRange::from_values(&values, BoundingBoxMode::PerAxis),
            AttributeRange::default()
        );
        assert!(compute_min_max::<f64, 3>(&[]).is_none());
    }

    #[test]
    fn test_mode_tags() {
        assert_eq!(BoundingBoxMode::try_from(0), Ok(BoundingBoxMode::PerAxis));
        assert_eq!(BoundingBoxMode::try_from(1), Ok(BoundingBoxMode::Diagonal));
        assert!(BoundingBoxMode::try_from(2).is_err());
    }
}
