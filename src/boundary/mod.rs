//! Physical boundary zones: ghost-layer conditions and sponge forcing.
//!
//! Ghost conditions act only on ranks whose subdomain touches the zone's face
//! of a non-periodic dimension; periodic faces belong to the halo exchange.
//! Sponge zones never touch ghosts, they add `-sigma(x) (u - u_ref)` to the
//! source term inside their box, `sigma` ramping linearly from 0 at the box
//! edge facing the interior to `strength` at the boundary face.

use serde::{Deserialize, Serialize};

use crate::algs::halo::{ProcessGrid, Side};
use crate::grid::{Coordinates, Field, GridLayout};
use crate::grid_error::GridError;

fn default_strength() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BoundaryZone {
    /// Ghost `-1-k` mirrors physical point `k` (and likewise at the high face).
    Extrapolate { dim: usize, face: Side },
    /// Ghosts hold a fixed state.
    Dirichlet {
        dim: usize,
        face: Side,
        value: Vec<f64>,
    },
    /// Relaxation toward `reference` inside the box `[xmin, xmax]`.
    Sponge {
        dim: usize,
        face: Side,
        reference: Vec<f64>,
        xmin: Vec<f64>,
        xmax: Vec<f64>,
        #[serde(default = "default_strength")]
        strength: f64,
    },
}

impl BoundaryZone {
    pub fn dim(&self) -> usize {
        match self {
            BoundaryZone::Extrapolate { dim, .. }
            | BoundaryZone::Dirichlet { dim, .. }
            | BoundaryZone::Sponge { dim, .. } => *dim,
        }
    }

    pub fn face(&self) -> Side {
        match self {
            BoundaryZone::Extrapolate { face, .. }
            | BoundaryZone::Dirichlet { face, .. }
            | BoundaryZone::Sponge { face, .. } => *face,
        }
    }

    pub fn is_sponge(&self) -> bool {
        matches!(self, BoundaryZone::Sponge { .. })
    }

    /// Check the zone against the grid's dimension and variable counts.
    pub fn validate(&self, ndims: usize, nvars: usize) -> Result<(), GridError> {
        let dim = self.dim();
        if dim >= ndims {
            return Err(GridError::Config(format!(
                "boundary zone on dimension {dim} of a {ndims}-dimensional grid"
            )));
        }
        match self {
            BoundaryZone::Extrapolate { .. } => Ok(()),
            BoundaryZone::Dirichlet { value, .. } => expect_len("dirichlet value", value, nvars),
            BoundaryZone::Sponge {
                reference,
                xmin,
                xmax,
                strength,
                ..
            } => {
                expect_len("sponge reference", reference, nvars)?;
                expect_len("sponge xmin", xmin, ndims)?;
                expect_len("sponge xmax", xmax, ndims)?;
                if let Some(d) = (0..ndims).find(|&d| !(xmin[d] < xmax[d])) {
                    return Err(GridError::Config(format!(
                        "sponge box is empty along dimension {d}"
                    )));
                }
                if !(*strength >= 0.0) {
                    return Err(GridError::Config(format!(
                        "sponge strength must be non-negative, got {strength}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Whether this rank must fill ghosts for the zone.
    fn owns_ghosts(&self, grid: &ProcessGrid) -> bool {
        !self.is_sponge()
            && !grid.is_periodic(self.dim())
            && grid.touches_boundary(self.dim(), self.face())
    }
}

fn expect_len(what: &str, v: &[f64], n: usize) -> Result<(), GridError> {
    if v.len() != n {
        return Err(GridError::Config(format!(
            "{what} has {} entries, expected {n}",
            v.len()
        )));
    }
    Ok(())
}

/// Fill physical-boundary ghost layers of `u` from every non-sponge zone.
pub fn apply_ghost_conditions(zones: &[BoundaryZone], grid: &ProcessGrid, u: &mut Field) {
    let layout = u.layout().clone();
    let g = layout.ghosts() as isize;
    if g == 0 {
        return;
    }
    for zone in zones.iter().filter(|z| z.owns_ghosts(grid)) {
        let dim = zone.dim();
        let n = layout.dim_local()[dim] as isize;
        let ghosts = match zone.face() {
            Side::Low => layout.padded().with_slab(dim, -g, 0),
            Side::High => layout.padded().with_slab(dim, n, n + g),
        };
        match zone {
            BoundaryZone::Extrapolate { face, .. } => {
                let mut src = vec![0isize; layout.ndims()];
                ghosts.for_each(|i| {
                    src.copy_from_slice(i);
                    src[dim] = match face {
                        Side::Low => -1 - i[dim],
                        Side::High => 2 * n - 1 - i[dim],
                    };
                    let vals = u.at(&src).to_vec();
                    u.at_mut(i).copy_from_slice(&vals);
                });
            }
            BoundaryZone::Dirichlet { value, .. } => {
                ghosts.for_each(|i| u.at_mut(i).copy_from_slice(value));
            }
            BoundaryZone::Sponge { .. } => {}
        }
    }
}

/// Add the forcing of one sponge zone to `source` on the physical region.
/// Non-sponge zones contribute nothing.
pub fn sponge_source(
    zone: &BoundaryZone,
    coords: &Coordinates,
    u: &Field,
    source: &mut Field,
) -> Result<(), GridError> {
    let BoundaryZone::Sponge {
        dim,
        face,
        reference,
        xmin,
        xmax,
        strength,
    } = zone
    else {
        return Ok(());
    };
    let layout = u.layout();
    layout.check_len(source.as_slice().len())?;
    let (start, end) = match face {
        Side::Low => (xmax[*dim], xmin[*dim]),
        Side::High => (xmin[*dim], xmax[*dim]),
    };
    layout.interior().for_each(|i| {
        let inside = (0..layout.ndims()).all(|d| {
            let x = coords.x(d, i[d]);
            x >= xmin[d] && x <= xmax[d]
        });
        if !inside {
            return;
        }
        let sigma = strength * (coords.x(*dim, i[*dim]) - start) / (end - start);
        for ((s, &uv), &r) in source.at_mut(i).iter_mut().zip(u.at(i)).zip(reference) {
            *s -= sigma * (uv - r);
        }
    });
    Ok(())
}

/// Whether the sponge box overlaps this rank's physical region.
pub fn sponge_intersects(zone: &BoundaryZone, coords: &Coordinates, layout: &GridLayout) -> bool {
    let BoundaryZone::Sponge { xmin, xmax, .. } = zone else {
        return false;
    };
    (0..layout.ndims()).all(|d| {
        let n = layout.dim_local()[d] as isize;
        let (lo, hi) = (coords.x(d, 0), coords.x(d, n - 1));
        xmax[d] >= lo && xmin[d] <= hi
    })
}
