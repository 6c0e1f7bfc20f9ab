use num_traits::clamp;

use crate::connectivity::ConnectivityIndex;
use crate::quantization_utils::{center_code, max_quantized_value};
use crate::status::{corrupt_stream, invalid_mesh, Status, StatusResult};

/// Predicts quantized attribute values from already processed vertices.
///
/// Elements are visited in increasing index order and a prediction for
/// element `v` only reads elements `< v`, so the decoder can replay exactly
/// what the encoder saw. Without connectivity (an attribute that is not
/// indexed in parallel with the positions) every prediction is the center
/// code.
pub struct Predictor<'c, 'a, const N: usize> {
    connectivity: Option<&'c ConnectivityIndex<'a>>,
    max_value: u32,
    center: u32,
    neighbors: Vec<u32>,
}

impl<'c, 'a, const N: usize> Predictor<'c, 'a, N> {
    pub fn new(connectivity: Option<&'c ConnectivityIndex<'a>>, bits: u32) -> Self {
        Self {
            connectivity,
            max_value: max_quantized_value(bits),
            center: center_code(bits),
            neighbors: Vec::new(),
        }
    }

    /// Predicts element `v` from `values[..v]`.
    pub fn predict(&mut self, v: usize, values: &[[u32; N]]) -> [u32; N] {
        let Some(connectivity) = self.connectivity else {
            return [self.center; N];
        };
        if let Some(prediction) = self.parallelogram(connectivity, v, values) {
            return prediction;
        }
        connectivity.collect_visited_neighbors(v, &mut self.neighbors);
        if self.neighbors.is_empty() {
            return [self.center; N];
        }
        let mut sum = [0u64; N];
        for &n in &self.neighbors {
            for d in 0..N {
                sum[d] += values[n as usize][d] as u64;
            }
        }
        let count = self.neighbors.len() as u64;
        let mut out = [0u32; N];
        for d in 0..N {
            out[d] = (sum[d] / count) as u32;
        }
        out
    }

    fn parallelogram(
        &self,
        connectivity: &ConnectivityIndex<'_>,
        v: usize,
        values: &[[u32; N]],
    ) -> Option<[u32; N]> {
        let limit = v as u32;
        let mut sum = [0i64; N];
        let mut count = 0i64;
        for &t in connectivity.incident_triangles(v) {
            let tri = connectivity.triangle(t as usize);
            let Some(pos) = tri.iter().position(|&x| x == limit) else {
                continue;
            };
            let a = tri[(pos + 1) % 3];
            let b = tri[(pos + 2) % 3];
            if a >= limit || b >= limit || a == b {
                continue;
            }
            let Some(c) = connectivity.opposite_vertex(t, a, b, limit) else {
                continue;
            };
            let (qa, qb, qc) = (&values[a as usize], &values[b as usize], &values[c as usize]);
            for d in 0..N {
                sum[d] += qa[d] as i64 + qb[d] as i64 - qc[d] as i64;
            }
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let mut out = [0u32; N];
        for d in 0..N {
            out[d] = clamp(sum[d].div_euclid(count), 0, self.max_value as i64) as u32;
        }
        Some(out)
    }

    /// Encoder side: residuals `actual - predicted`, component-interleaved.
    pub fn compute_residuals(&mut self, codes: &[[u32; N]], out: &mut Vec<i32>) -> Status {
        out.clear();
        out.try_reserve_exact(codes.len() * N)?;
        for v in 0..codes.len() {
            let prediction = self.predict(v, codes);
            for d in 0..N {
                if codes[v][d] > self.max_value {
                    return Err(invalid_mesh(format!("Code {} exceeds the bit range", codes[v][d])));
                }
                out.push(codes[v][d] as i32 - prediction[d] as i32);
            }
        }
        Ok(())
    }

    /// Decoder side: rebuilds `out` from component-interleaved residuals.
    pub fn reconstruct(&mut self, residuals: &[i32], out: &mut [[u32; N]]) -> Status {
        if residuals.len() != out.len() * N {
            return Err(corrupt_stream(format!(
                "Expected {} residuals, found {}",
                out.len() * N,
                residuals.len()
            )));
        }
        for v in 0..out.len() {
            let prediction = self.predict(v, out);
            for d in 0..N {
                out[v][d] = self.apply_residual(prediction[d], residuals[v * N + d])?;
            }
        }
        Ok(())
    }

    fn apply_residual(&self, prediction: u32, residual: i32) -> StatusResult<u32> {
        let value = prediction as i64 + residual as i64;
        if value < 0 || value > self.max_value as i64 {
            return Err(corrupt_stream(format!(
                "Reconstructed code {} is outside [0, {}]",
                value, self.max_value
            )));
        }
        Ok(value as u32)
    }
}
