//! Ghost-padded field arrays.

use itertools::izip;

use crate::grid::layout::GridLayout;
use crate::grid_error::GridError;

/// A flat `f64` buffer on a [`GridLayout`], indexed `[point][var]`.
///
/// Operators read and write fields in place; a `Field` owns nothing but its
/// values and a copy of the (small) layout descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    layout: GridLayout,
    data: Vec<f64>,
}

impl Field {
    /// Zero-initialized field.
    pub fn zeros(layout: &GridLayout) -> Self {
        Self {
            layout: layout.clone(),
            data: vec![0.0; layout.len()],
        }
    }

    /// Wrap an existing buffer; its length must match the layout.
    pub fn from_vec(layout: &GridLayout, data: Vec<f64>) -> Result<Self, GridError> {
        layout.check_len(data.len())?;
        Ok(Self {
            layout: layout.clone(),
            data,
        })
    }

    /// Field whose every point (ghosts included) holds `state`.
    pub fn uniform(layout: &GridLayout, state: &[f64]) -> Result<Self, GridError> {
        if state.len() != layout.nvars() {
            return Err(GridError::LayoutMismatch {
                expected: layout.nvars(),
                found: state.len(),
            });
        }
        let mut f = Self::zeros(layout);
        for chunk in f.data.chunks_exact_mut(layout.nvars()) {
            chunk.copy_from_slice(state);
        }
        Ok(f)
    }

    /// Fill physical and ghost points from a function of the multi-index.
    pub fn from_fn<F>(layout: &GridLayout, mut f: F) -> Self
    where
        F: FnMut(&[isize], &mut [f64]),
    {
        let mut field = Self::zeros(layout);
        let nvars = layout.nvars();
        layout.padded().for_each(|i| {
            let o = layout.offset(i);
            f(i, &mut field.data[o..o + nvars]);
        });
        field
    }

    #[inline]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Variables at a multi-index.
    #[inline]
    pub fn at(&self, index: &[isize]) -> &[f64] {
        let o = self.layout.offset(index);
        &self.data[o..o + self.layout.nvars()]
    }

    /// Mutable variables at a multi-index.
    #[inline]
    pub fn at_mut(&mut self, index: &[isize]) -> &mut [f64] {
        let nvars = self.layout.nvars();
        let o = self.layout.offset(index);
        &mut self.data[o..o + nvars]
    }

    /// Variables at a flat point index.
    #[inline]
    pub fn point(&self, p: usize) -> &[f64] {
        let nvars = self.layout.nvars();
        &self.data[p * nvars..(p + 1) * nvars]
    }

    pub fn fill(&mut self, value: f64) {
        self.data.iter_mut().for_each(|x| *x = value);
    }

    /// Overwrite with the values of `other` (same layout).
    pub fn copy_from(&mut self, other: &Field) -> Result<(), GridError> {
        self.layout.check_len(other.data.len())?;
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    /// `self += a * x`.
    pub fn axpy(&mut self, a: f64, x: &Field) -> Result<(), GridError> {
        self.layout.check_len(x.data.len())?;
        for (s, &xv) in izip!(self.data.iter_mut(), x.data.iter()) {
            *s += a * xv;
        }
        Ok(())
    }

    /// Multiply every variable of each point by a per-point mask value.
    ///
    /// `mask` must be a single-variable field on the same grid.
    pub fn block_multiply(&mut self, mask: &Field) -> Result<(), GridError> {
        if mask.layout.nvars() != 1
            || mask.layout.padded_dims() != self.layout.padded_dims()
        {
            return Err(GridError::LayoutMismatch {
                expected: self.layout.npoints_padded(),
                found: mask.data.len(),
            });
        }
        let nvars = self.layout.nvars();
        for (chunk, &m) in self.data.chunks_exact_mut(nvars).zip(&mask.data) {
            chunk.iter_mut().for_each(|x| *x *= m);
        }
        Ok(())
    }

    /// Copy the physical region into a packed ghost-free vector.
    pub fn gather_interior(&self, out: &mut [f64]) -> Result<(), GridError> {
        let expected = self.layout.interior_len();
        if out.len() != expected {
            return Err(GridError::LayoutMismatch {
                expected,
                found: out.len(),
            });
        }
        let nvars = self.layout.nvars();
        let mut k = 0;
        self.layout.interior().for_each(|i| {
            out[k..k + nvars].copy_from_slice(self.at(i));
            k += nvars;
        });
        Ok(())
    }

    /// Overwrite the physical region from a packed ghost-free vector.
    pub fn scatter_interior(&mut self, src: &[f64]) -> Result<(), GridError> {
        let expected = self.layout.interior_len();
        if src.len() != expected {
            return Err(GridError::LayoutMismatch {
                expected,
                found: src.len(),
            });
        }
        let nvars = self.layout.nvars();
        let layout = self.layout.clone();
        let mut k = 0;
        layout.interior().for_each(|i| {
            self.at_mut(i).copy_from_slice(&src[k..k + nvars]);
            k += nvars;
        });
        Ok(())
    }

    /// Largest absolute value over the physical region.
    pub fn interior_max_abs(&self) -> f64 {
        let mut m = 0.0f64;
        self.layout.interior().for_each(|i| {
            for &x in self.at(i) {
                m = m.max(x.abs());
            }
        });
        m
    }
}

static_assertions::assert_impl_all!(Field: Send, Sync);
