//! Small dense matrices for characteristic decompositions.

use std::fmt;

/// Row-major `n x n` matrix.
#[derive(Clone, PartialEq)]
pub struct SquareMatrix {
    n: usize,
    data: Vec<f64>,
}

impl SquareMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Build from rows; every row must have `rows.len()` entries.
    pub fn from_rows(rows: &[&[f64]]) -> Self {
        let n = rows.len();
        let mut m = Self::zeros(n);
        for (i, row) in rows.iter().enumerate() {
            debug_assert_eq!(row.len(), n);
            m.data[i * n..(i + 1) * n].copy_from_slice(row);
        }
        m
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        self.data[i * self.n + j] = v;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    pub fn set_row(&mut self, i: usize, v: &[f64]) {
        self.data[i * self.n..(i + 1) * self.n].copy_from_slice(v);
    }

    /// Set column `j` (used for right eigenvectors).
    pub fn set_col(&mut self, j: usize, v: &[f64]) {
        for (i, &x) in v.iter().enumerate() {
            self.data[i * self.n + j] = x;
        }
    }

    /// `y = self * x`.
    #[inline]
    pub fn matvec(&self, x: &[f64], y: &mut [f64]) {
        for (i, yi) in y.iter_mut().enumerate().take(self.n) {
            *yi = self.row(i).iter().zip(x).map(|(a, b)| a * b).sum();
        }
    }

    pub fn matmul(&self, other: &SquareMatrix) -> SquareMatrix {
        let n = self.n;
        let mut out = SquareMatrix::zeros(n);
        for i in 0..n {
            for k in 0..n {
                let a = self.get(i, k);
                if a == 0.0 {
                    continue;
                }
                for j in 0..n {
                    out.data[i * n + j] += a * other.get(k, j);
                }
            }
        }
        out
    }

    /// Scale column `j` by `s[j]` (right-multiplication by a diagonal).
    pub fn scale_cols(&self, s: &[f64]) -> SquareMatrix {
        let mut out = self.clone();
        for i in 0..self.n {
            for j in 0..self.n {
                out.data[i * self.n + j] *= s[j];
            }
        }
        out
    }

    pub fn max_abs_diff(&self, other: &SquareMatrix) -> f64 {
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

impl fmt::Debug for SquareMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries((0..self.n).map(|i| self.row(i)))
            .finish()
    }
}

/// Eigenvalues `lambda` and left/right eigenvectors `L`, `R` of a flux
/// Jacobian, with `L * R = I` and `R * diag(lambda) * L = A`.
#[derive(Clone, Debug)]
pub struct Eigensystem {
    pub lambda: Vec<f64>,
    pub left: SquareMatrix,
    pub right: SquareMatrix,
    scratch: Vec<f64>,
}

impl Eigensystem {
    pub fn new(nvars: usize) -> Self {
        Self {
            lambda: vec![0.0; nvars],
            left: SquareMatrix::identity(nvars),
            right: SquareMatrix::identity(nvars),
            scratch: vec![0.0; nvars],
        }
    }

    pub fn nvars(&self) -> usize {
        self.lambda.len()
    }

    /// `out = L * x` (project onto characteristic fields).
    #[inline]
    pub fn to_characteristic(&self, x: &[f64], out: &mut [f64]) {
        self.left.matvec(x, out);
    }

    /// `out = R * w` (back to conserved variables).
    #[inline]
    pub fn from_characteristic(&self, w: &[f64], out: &mut [f64]) {
        self.right.matvec(w, out);
    }

    /// `out = R * g(lambda) * L * x` for a scalar function `g` of the eigenvalues.
    pub fn apply_fn<G: Fn(f64) -> f64>(&mut self, g: G, x: &[f64], out: &mut [f64]) {
        self.left.matvec(x, &mut self.scratch);
        for (w, &l) in self.scratch.iter_mut().zip(&self.lambda) {
            *w *= g(l);
        }
        self.right.matvec(&self.scratch, out);
    }

    /// `R * D * L` as a matrix.
    pub fn reconstruct(&self) -> SquareMatrix {
        self.right.scale_cols(&self.lambda).matmul(&self.left)
    }

    /// Largest deviation of `L * R` from the identity.
    pub fn orthonormality_defect(&self) -> f64 {
        self.left
            .matmul(&self.right)
            .max_abs_diff(&SquareMatrix::identity(self.nvars()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matvec_and_matmul_agree() {
        let a = SquareMatrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let b = SquareMatrix::from_rows(&[&[0.0, 1.0], &[1.0, 0.0]]);
        let ab = a.matmul(&b);
        assert_eq!(ab.row(0), &[2.0, 1.0]);
        let mut y = [0.0; 2];
        a.matvec(&[1.0, 1.0], &mut y);
        assert_eq!(y, [3.0, 7.0]);
    }

    #[test]
    fn identity_system_applies_eigenvalue_function() {
        let mut e = Eigensystem::new(2);
        e.lambda = vec![-2.0, 3.0];
        let mut out = [0.0; 2];
        e.apply_fn(f64::abs, &[1.0, 1.0], &mut out);
        assert_eq!(out, [2.0, 3.0]);
        assert_eq!(e.orthonormality_defect(), 0.0);
    }
}
