//! Interpolation of cell-centred values to interfaces.
//!
//! Interface `j` along `dir` lies between cells `j - 1` and `j`. A
//! [`Bias::Left`] interpolation is upwinded from the left cell (the `fL`/`uL`
//! arrays), [`Bias::Right`] from the right cell.

mod first_order;
mod weno5;

use std::fmt;

use crate::grid::Field;
use crate::grid_error::GridError;

pub use first_order::FirstOrderUpwind;
pub use weno5::Weno5;

/// Side an interface value is upwinded from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Bias {
    Left,
    Right,
}

/// Which quantity is being interpolated; nonlinear weights are kept per slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    Flux,
    State,
}

/// Whether nonlinear interpolation weights are recomputed or reused.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Limiting {
    /// Compute weights from the data and store them.
    #[default]
    Recompute,
    /// Reuse the weights stored by the last `Recompute` call for the same
    /// direction, bias and slot.
    Frozen,
}

/// Interface interpolation operator.
pub trait Reconstruction: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Ghost layers the stencil reads.
    fn ghosts_required(&self) -> usize;

    /// Interpolate `src` to the interfaces along `dir` into `out`, an
    /// interface array of `src.layout().interfaces(dir).len()` values.
    fn interpolate(
        &mut self,
        src: &Field,
        dir: usize,
        bias: Bias,
        slot: Slot,
        limiting: Limiting,
        out: &mut [f64],
    ) -> Result<(), GridError>;

    /// Forget any stored weights.
    fn clear_frozen(&mut self) {}
}

/// Interpolation scheme, selected by name (`"1"` or `"weno5"`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ReconstructionKind {
    #[default]
    FirstOrder,
    Weno5,
}

impl ReconstructionKind {
    pub fn build(self) -> Box<dyn Reconstruction> {
        match self {
            ReconstructionKind::FirstOrder => Box::new(FirstOrderUpwind),
            ReconstructionKind::Weno5 => Box::new(Weno5::default()),
        }
    }
}

impl std::str::FromStr for ReconstructionKind {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(ReconstructionKind::FirstOrder),
            "weno5" => Ok(ReconstructionKind::Weno5),
            other => Err(GridError::Config(format!(
                "unknown reconstruction scheme `{other}`"
            ))),
        }
    }
}

fn check_args(
    src: &Field,
    dir: usize,
    ghosts: usize,
    out: &[f64],
) -> Result<(), GridError> {
    let layout = src.layout();
    if dir >= layout.ndims() {
        return Err(GridError::Config(format!(
            "sweep direction {dir} on a {}-dimensional grid",
            layout.ndims()
        )));
    }
    layout.require_ghosts(ghosts)?;
    let expected = layout.interfaces(dir).len();
    if out.len() != expected {
        return Err(GridError::LayoutMismatch {
            expected,
            found: out.len(),
        });
    }
    Ok(())
}

/// Visit every interface with its output offset, its upwind cell and the
/// step pointing from that cell toward the interface: cell `j - 1` and `+1`
/// for [`Bias::Left`], cell `j` and `-1` for [`Bias::Right`].
fn for_each_interface<F>(src: &Field, dir: usize, bias: Bias, mut f: F)
where
    F: FnMut(usize, &[isize], isize),
{
    let il = src.layout().interfaces(dir);
    let nvars = src.layout().nvars();
    let mut cell = vec![0isize; il.bounds().len()];
    il.all().for_each(|j| {
        cell.copy_from_slice(j);
        let step = match bias {
            Bias::Left => {
                cell[dir] -= 1;
                1
            }
            Bias::Right => -1,
        };
        f(il.point_index(j) * nvars, &cell, step);
    });
}
