//! Hyperbolic term: divergence of upwind interface fluxes.

use crate::flux::{UpwindScheme, upwind_sweep};
use crate::grid::{Coordinates, Field, GridLayout};
use crate::grid_error::GridError;
use crate::physics::PhysicsModel;
use crate::reconstruction::{Bias, Limiting, Reconstruction, Slot};

/// Scratch for [`HyperbolicEvaluator`], sized once per layout.
#[derive(Clone, Debug)]
struct Scratch {
    fluxc: Field,
    fl: Vec<f64>,
    fr: Vec<f64>,
    ul: Vec<f64>,
    ur: Vec<f64>,
    fi: Vec<f64>,
}

/// Evaluates `hyp = sum_d dxinv_d (fI_{j+1/2} - fI_{j-1/2})` on the physical
/// region.
#[derive(Clone, Debug)]
pub struct HyperbolicEvaluator {
    scheme: UpwindScheme,
    scratch: Scratch,
}

impl HyperbolicEvaluator {
    pub fn new(layout: &GridLayout, scheme: UpwindScheme) -> Self {
        Self {
            scheme,
            scratch: Scratch {
                fluxc: Field::zeros(layout),
                fl: Vec::new(),
                fr: Vec::new(),
                ul: Vec::new(),
                ur: Vec::new(),
                fi: Vec::new(),
            },
        }
    }

    pub fn scheme(&self) -> UpwindScheme {
        self.scheme
    }

    /// Overwrite `hyp` with the hyperbolic term of `u`.
    ///
    /// `u` must have valid ghost layers. `hyp` is zero when the model has no
    /// flux.
    pub fn evaluate(
        &mut self,
        hyp: &mut Field,
        u: &Field,
        model: &dyn PhysicsModel,
        recon: &mut dyn Reconstruction,
        coords: &Coordinates,
        limiting: Limiting,
    ) -> Result<(), GridError> {
        let layout = u.layout();
        layout.check_len(hyp.as_slice().len())?;
        self.scratch.fluxc.layout().check_len(layout.len())?;
        hyp.fill(0.0);
        if !model.has_flux() {
            return Ok(());
        }
        let nvars = layout.nvars();
        let s = &mut self.scratch;
        for dir in 0..layout.ndims() {
            // Every padded point: interpolation stencils read into the ghosts.
            for (fc, uc) in s
                .fluxc
                .as_mut_slice()
                .chunks_exact_mut(nvars)
                .zip(u.as_slice().chunks_exact(nvars))
            {
                model.flux(uc, dir, fc);
            }
            let il = layout.interfaces(dir);
            for buf in [&mut s.fl, &mut s.fr, &mut s.ul, &mut s.ur, &mut s.fi] {
                buf.resize(il.len(), 0.0);
            }
            recon.interpolate(&s.fluxc, dir, Bias::Left, Slot::Flux, limiting, &mut s.fl)?;
            recon.interpolate(&s.fluxc, dir, Bias::Right, Slot::Flux, limiting, &mut s.fr)?;
            recon.interpolate(u, dir, Bias::Left, Slot::State, limiting, &mut s.ul)?;
            recon.interpolate(u, dir, Bias::Right, Slot::State, limiting, &mut s.ur)?;
            upwind_sweep(
                self.scheme, model, dir, &s.fl, &s.fr, &s.ul, &s.ur, &mut s.fi,
            )?;

            let istride = il.stride() * nvars;
            let fi = &s.fi;
            let mut j = vec![0isize; layout.ndims()];
            layout.interior().for_each(|i| {
                j.copy_from_slice(i);
                let lo = il.point_index(&j) * nvars;
                let hi = lo + istride;
                let dxinv = coords.dxinv(dir, i[dir]);
                for (v, h) in hyp.at_mut(i).iter_mut().enumerate() {
                    *h += dxinv * (fi[hi + v] - fi[lo + v]);
                }
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::LinearAdr;
    use crate::reconstruction::FirstOrderUpwind;

    #[test]
    fn first_order_upwind_advection_is_a_backward_difference() {
        let l = GridLayout::new(&[4], 1, 1).unwrap();
        let coords = Coordinates::uniform(&l, &[0], &[0.0], &[0.5]).unwrap();
        let m = LinearAdr::new(1, vec![1.0], vec![], 0.0).unwrap();
        let u = Field::from_fn(&l, |i, v| v[0] = (i[0] * i[0]) as f64);
        let mut hyp = Field::zeros(&l);
        let mut ev = HyperbolicEvaluator::new(&l, UpwindScheme::Roe);
        ev.evaluate(&mut hyp, &u, &m, &mut FirstOrderUpwind, &coords, Limiting::Recompute)
            .unwrap();
        // (u_i - u_{i-1}) / dx
        assert_eq!(hyp.at(&[0]), &[2.0 * (0.0 - 1.0)]);
        assert_eq!(hyp.at(&[3]), &[2.0 * (9.0 - 4.0)]);
        assert_eq!(hyp.at(&[-1]), &[0.0]);
    }
}
