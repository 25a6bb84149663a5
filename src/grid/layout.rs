//! Grid/state descriptor and ghost-padded index arithmetic.
//!
//! A field on a rank's subdomain is stored as a flat buffer logically indexed
//! as `[point][var]`. Points are padded by `ghosts` layers on every side of
//! every dimension and are laid out with dimension 0 varying fastest.
//! Multi-indices are signed: the physical region of dimension `d` is
//! `[0, dim_local[d])`, the padded region is `[-ghosts, dim_local[d] + ghosts)`.
//!
//! All offset arithmetic lives here; operators never re-derive ghost offsets.

use crate::grid_error::GridError;

/// Shape of one rank's ghost-padded subdomain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridLayout {
    nvars: usize,
    ghosts: usize,
    dim_local: Vec<usize>,
    padded: Vec<usize>,
    strides: Vec<usize>,
}

impl GridLayout {
    /// Build a layout from local extents, variable count and ghost width.
    pub fn new(dim_local: &[usize], nvars: usize, ghosts: usize) -> Result<Self, GridError> {
        if dim_local.is_empty() {
            return Err(GridError::Config("grid must have at least one dimension".into()));
        }
        if nvars == 0 {
            return Err(GridError::Config("nvars must be positive".into()));
        }
        if let Some(d) = dim_local.iter().position(|&n| n == 0) {
            return Err(GridError::Config(format!("local extent of dimension {d} is zero")));
        }
        let padded: Vec<usize> = dim_local.iter().map(|&n| n + 2 * ghosts).collect();
        let mut strides = Vec::with_capacity(padded.len());
        let mut acc = 1usize;
        for &n in &padded {
            strides.push(acc);
            acc *= n;
        }
        Ok(Self {
            nvars,
            ghosts,
            dim_local: dim_local.to_vec(),
            padded,
            strides,
        })
    }

    #[inline]
    pub fn ndims(&self) -> usize {
        self.dim_local.len()
    }

    #[inline]
    pub fn nvars(&self) -> usize {
        self.nvars
    }

    #[inline]
    pub fn ghosts(&self) -> usize {
        self.ghosts
    }

    /// Physical (non-ghost) extents.
    #[inline]
    pub fn dim_local(&self) -> &[usize] {
        &self.dim_local
    }

    /// Extents including ghost padding.
    #[inline]
    pub fn padded_dims(&self) -> &[usize] {
        &self.padded
    }

    /// Number of physical points.
    pub fn npoints_local(&self) -> usize {
        self.dim_local.iter().product()
    }

    /// Number of points including ghosts.
    pub fn npoints_padded(&self) -> usize {
        self.padded.iter().product()
    }

    /// Length in `f64` of a field on this layout.
    pub fn len(&self) -> usize {
        self.npoints_padded() * self.nvars
    }

    /// Length in `f64` of the interior (ghost-free) part of a field.
    pub fn interior_len(&self) -> usize {
        self.npoints_local() * self.nvars
    }

    /// Stride in points between neighbours along `dir`.
    #[inline]
    pub fn stride(&self, dir: usize) -> usize {
        self.strides[dir]
    }

    /// Flat point index of a signed multi-index.
    ///
    /// Indices outside `[-ghosts, dim_local + ghosts)` are a programming error.
    #[inline]
    pub fn point_index(&self, index: &[isize]) -> usize {
        debug_assert_eq!(index.len(), self.ndims());
        let g = self.ghosts as isize;
        let mut p = 0usize;
        for (d, &i) in index.iter().enumerate() {
            #[cfg(any(debug_assertions, feature = "check-invariants"))]
            assert!(
                i >= -g && i < self.dim_local[d] as isize + g,
                "index {i} out of padded range along dimension {d}"
            );
            p += (i + g) as usize * self.strides[d];
        }
        p
    }

    /// Offset of the first variable of a point in the flat buffer.
    #[inline]
    pub fn offset(&self, index: &[isize]) -> usize {
        self.point_index(index) * self.nvars
    }

    /// Box covering the physical region.
    pub fn interior(&self) -> IndexBox {
        IndexBox::new(
            vec![0; self.ndims()],
            self.dim_local.iter().map(|&n| n as isize).collect(),
        )
    }

    /// Box covering the whole padded region.
    pub fn padded(&self) -> IndexBox {
        let g = self.ghosts as isize;
        IndexBox::new(
            vec![-g; self.ndims()],
            self.dim_local.iter().map(|&n| n as isize + g).collect(),
        )
    }

    /// Physical region along every dimension except `dir`, padded along `dir`.
    pub fn padded_along(&self, dir: usize) -> IndexBox {
        let mut b = self.interior();
        let g = self.ghosts as isize;
        b.lo[dir] = -g;
        b.hi[dir] = self.dim_local[dir] as isize + g;
        b
    }

    /// Interface layout for sweeps along `dir`.
    pub fn interfaces(&self, dir: usize) -> InterfaceLayout {
        let mut bounds = self.dim_local.clone();
        bounds[dir] += 1;
        InterfaceLayout {
            dir,
            nvars: self.nvars,
            bounds,
        }
    }

    /// Fails unless the layout carries at least `required` ghost layers.
    pub fn require_ghosts(&self, required: usize) -> Result<(), GridError> {
        if self.ghosts < required {
            return Err(GridError::InsufficientGhosts {
                required,
                available: self.ghosts,
            });
        }
        Ok(())
    }

    /// Fails unless `len` matches a full field on this layout.
    pub fn check_len(&self, len: usize) -> Result<(), GridError> {
        if len != self.len() {
            return Err(GridError::LayoutMismatch {
                expected: self.len(),
                found: len,
            });
        }
        Ok(())
    }
}

/// Ghost-free layout of interface values along one sweep direction.
///
/// Interface `j` along `dir` separates cells `j - 1` and `j`; there are
/// `dim_local[dir] + 1` of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceLayout {
    dir: usize,
    nvars: usize,
    bounds: Vec<usize>,
}

impl InterfaceLayout {
    #[inline]
    pub fn dir(&self) -> usize {
        self.dir
    }

    #[inline]
    pub fn bounds(&self) -> &[usize] {
        &self.bounds
    }

    pub fn npoints(&self) -> usize {
        self.bounds.iter().product()
    }

    pub fn len(&self) -> usize {
        self.npoints() * self.nvars
    }

    /// Flat interface-point index of a non-negative multi-index.
    #[inline]
    pub fn point_index(&self, index: &[isize]) -> usize {
        let mut p = 0usize;
        let mut stride = 1usize;
        for (d, &i) in index.iter().enumerate() {
            debug_assert!(i >= 0 && (i as usize) < self.bounds[d]);
            p += i as usize * stride;
            stride *= self.bounds[d];
        }
        p
    }

    /// Stride in interface points along the sweep direction.
    pub fn stride(&self) -> usize {
        self.bounds[..self.dir].iter().product()
    }

    /// Box of all interfaces.
    pub fn all(&self) -> IndexBox {
        IndexBox::new(
            vec![0; self.bounds.len()],
            self.bounds.iter().map(|&n| n as isize).collect(),
        )
    }
}

/// Half-open box `[lo, hi)` of signed multi-indices, traversed with
/// dimension 0 varying fastest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexBox {
    lo: Vec<isize>,
    hi: Vec<isize>,
}

impl IndexBox {
    pub fn new(lo: Vec<isize>, hi: Vec<isize>) -> Self {
        debug_assert_eq!(lo.len(), hi.len());
        Self { lo, hi }
    }

    pub fn lo(&self) -> &[isize] {
        &self.lo
    }

    pub fn hi(&self) -> &[isize] {
        &self.hi
    }

    pub fn is_empty(&self) -> bool {
        self.lo.iter().zip(&self.hi).any(|(l, h)| l >= h)
    }

    /// Restrict the box to a single index along `dir`.
    pub fn with_slab(mut self, dir: usize, lo: isize, hi: isize) -> Self {
        self.lo[dir] = lo;
        self.hi[dir] = hi;
        self
    }

    /// Advance `index` to the next multi-index; `false` once exhausted.
    #[inline]
    pub fn increment(&self, index: &mut [isize]) -> bool {
        for d in 0..index.len() {
            index[d] += 1;
            if index[d] < self.hi[d] {
                return true;
            }
            index[d] = self.lo[d];
        }
        false
    }

    /// Visit every multi-index in the box.
    pub fn for_each<F: FnMut(&[isize])>(&self, mut f: F) {
        if self.is_empty() {
            return;
        }
        let mut index = self.lo.clone();
        loop {
            f(&index);
            if !self.increment(&mut index) {
                break;
            }
        }
    }

    /// Visit every multi-index, stopping at the first error.
    pub fn try_for_each<E, F>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&[isize]) -> Result<(), E>,
    {
        if self.is_empty() {
            return Ok(());
        }
        let mut index = self.lo.clone();
        loop {
            f(&index)?;
            if !self.increment(&mut index) {
                return Ok(());
            }
        }
    }

    /// Visit the start of every grid line along `dir`: the closure receives a
    /// multi-index whose `dir` component equals `lo[dir]`.
    pub fn for_each_line<F: FnMut(&[isize])>(&self, dir: usize, f: F) {
        let outer = self.clone().with_slab(dir, self.lo[dir], self.lo[dir] + 1);
        outer.for_each(f);
    }
}
