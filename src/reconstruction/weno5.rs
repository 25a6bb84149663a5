//! Fifth-order WENO interpolation with Jiang-Shu smoothness indicators.

use hashbrown::HashMap;

use crate::grid::Field;
use crate::grid_error::GridError;
use crate::reconstruction::{Bias, Limiting, Reconstruction, Slot, check_args, for_each_interface};

const EPS: f64 = 1e-6;
const OPTIMAL: [f64; 3] = [0.1, 0.6, 0.3];

/// Candidate interpolants and smoothness indicators of the three sub-stencils.
#[inline]
fn candidates(s: &[f64; 5]) -> ([f64; 3], [f64; 3]) {
    let [m2, m1, c, p1, p2] = *s;
    let f = [
        (2.0 * m2 - 7.0 * m1 + 11.0 * c) / 6.0,
        (-m1 + 5.0 * c + 2.0 * p1) / 6.0,
        (2.0 * c + 5.0 * p1 - p2) / 6.0,
    ];
    let b = [
        13.0 / 12.0 * (m2 - 2.0 * m1 + c).powi(2) + 0.25 * (m2 - 4.0 * m1 + 3.0 * c).powi(2),
        13.0 / 12.0 * (m1 - 2.0 * c + p1).powi(2) + 0.25 * (m1 - p1).powi(2),
        13.0 / 12.0 * (c - 2.0 * p1 + p2).powi(2) + 0.25 * (3.0 * c - 4.0 * p1 + p2).powi(2),
    ];
    (f, b)
}

#[inline]
fn nonlinear_weights(beta: &[f64; 3]) -> [f64; 3] {
    let a: [f64; 3] = std::array::from_fn(|k| OPTIMAL[k] / (EPS + beta[k]).powi(2));
    let sum = a[0] + a[1] + a[2];
    [a[0] / sum, a[1] / sum, a[2] / sum]
}

type WeightKey = (usize, Bias, Slot);

/// WENO5 with weights stored per (direction, bias, slot) for frozen reuse.
#[derive(Clone, Debug, Default)]
pub struct Weno5 {
    weights: HashMap<WeightKey, Vec<[f64; 3]>>,
}

impl Weno5 {
    /// Whether weights are stored for this sweep.
    pub fn has_weights(&self, dir: usize, bias: Bias, slot: Slot) -> bool {
        self.weights.contains_key(&(dir, bias, slot))
    }
}

impl Reconstruction for Weno5 {
    fn name(&self) -> &'static str {
        "weno5"
    }

    fn ghosts_required(&self) -> usize {
        3
    }

    fn interpolate(
        &mut self,
        src: &Field,
        dir: usize,
        bias: Bias,
        slot: Slot,
        limiting: Limiting,
        out: &mut [f64],
    ) -> Result<(), GridError> {
        check_args(src, dir, self.ghosts_required(), out)?;
        let layout = src.layout();
        let nvars = layout.nvars();
        let stride = (layout.stride(dir) * nvars) as isize;
        let data = src.as_slice();

        let key = (dir, bias, slot);
        let weights = match limiting {
            Limiting::Recompute => {
                let w = self.weights.entry(key).or_default();
                w.clear();
                w.resize(out.len(), [0.0; 3]);
                w
            }
            Limiting::Frozen => {
                let w = self
                    .weights
                    .get_mut(&key)
                    .ok_or(GridError::MissingFrozenWeights { dir })?;
                if w.len() != out.len() {
                    return Err(GridError::LayoutMismatch {
                        expected: out.len(),
                        found: w.len(),
                    });
                }
                w
            }
        };

        for_each_interface(src, dir, bias, |o, cell, step| {
            let base = layout.offset(cell) as isize;
            let s = stride * step;
            for v in 0..nvars {
                let stencil: [f64; 5] =
                    std::array::from_fn(|k| data[(base + (k as isize - 2) * s) as usize + v]);
                let (f, beta) = candidates(&stencil);
                let w = &mut weights[o + v];
                if limiting == Limiting::Recompute {
                    *w = nonlinear_weights(&beta);
                }
                out[o + v] = w[0] * f[0] + w[1] * f[1] + w[2] * f[2];
            }
        });
        Ok(())
    }

    fn clear_frozen(&mut self) {
        self.weights.clear();
    }
}
