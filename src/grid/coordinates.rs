//! Per-dimension grid coordinates and inverse spacings, ghosts included.

use crate::grid::layout::GridLayout;
use crate::grid_error::GridError;

/// Coordinates of a tensor-product grid on one rank.
///
/// Each axis stores `dim_local[d] + 2 * ghosts` values; axis index `i` maps to
/// storage slot `i + ghosts`.
#[derive(Clone, Debug, PartialEq)]
pub struct Coordinates {
    ghosts: usize,
    x: Vec<Vec<f64>>,
    dxinv: Vec<Vec<f64>>,
}

impl Coordinates {
    /// Build from explicit axes (each of padded length).
    pub fn from_axes(layout: &GridLayout, axes: Vec<Vec<f64>>) -> Result<Self, GridError> {
        if axes.len() != layout.ndims() {
            return Err(GridError::Config(format!(
                "expected {} coordinate axes, got {}",
                layout.ndims(),
                axes.len()
            )));
        }
        for (d, axis) in axes.iter().enumerate() {
            let n = layout.padded_dims()[d];
            if axis.len() != n {
                return Err(GridError::LayoutMismatch {
                    expected: n,
                    found: axis.len(),
                });
            }
            if axis.windows(2).any(|w| w[1] <= w[0]) {
                return Err(GridError::Config(format!(
                    "coordinates along dimension {d} are not strictly increasing"
                )));
            }
        }
        let dxinv = axes.iter().map(|axis| inverse_spacing(axis)).collect();
        Ok(Self {
            ghosts: layout.ghosts(),
            x: axes,
            dxinv,
        })
    }

    /// Uniform grid: global cell `k` along `d` sits at `origin[d] + (k + 0.5) * dx[d]`.
    ///
    /// `start[d]` is the global index of this rank's first physical point.
    pub fn uniform(
        layout: &GridLayout,
        start: &[usize],
        origin: &[f64],
        dx: &[f64],
    ) -> Result<Self, GridError> {
        let nd = layout.ndims();
        if start.len() != nd || origin.len() != nd || dx.len() != nd {
            return Err(GridError::Config(
                "uniform coordinates need one start/origin/dx per dimension".into(),
            ));
        }
        let g = layout.ghosts() as isize;
        let axes = (0..nd)
            .map(|d| {
                (-g..layout.dim_local()[d] as isize + g)
                    .map(|i| origin[d] + ((start[d] as isize + i) as f64 + 0.5) * dx[d])
                    .collect()
            })
            .collect();
        Self::from_axes(layout, axes)
    }

    /// Coordinate at signed index `i` along `dir`.
    #[inline]
    pub fn x(&self, dir: usize, i: isize) -> f64 {
        self.x[dir][(i + self.ghosts as isize) as usize]
    }

    /// Inverse grid spacing at signed index `i` along `dir`.
    #[inline]
    pub fn dxinv(&self, dir: usize, i: isize) -> f64 {
        self.dxinv[dir][(i + self.ghosts as isize) as usize]
    }

    /// Full padded axis along `dir`.
    pub fn axis(&self, dir: usize) -> &[f64] {
        &self.x[dir]
    }
}

/// Central inverse spacing `2 / (x[i+1] - x[i-1])`, one-sided at the ends.
fn inverse_spacing(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| {
            if i == 0 {
                1.0 / (x[1] - x[0])
            } else if i == n - 1 {
                1.0 / (x[n - 1] - x[n - 2])
            } else {
                2.0 / (x[i + 1] - x[i - 1])
            }
        })
        .collect()
}
