//! Parabolic term `sum_{d1,d2} d2/dx_d1 dx_d2 h_{d1,d2}(u)`.
//!
//! Same-direction pairs use a second-derivative stencil. Cross pairs take a
//! first derivative along `d1` through the ghost layers of `d1`, refresh the
//! ghosts of that intermediate by a halo exchange, then take a first
//! derivative along `d2` on the physical region.

use crate::algs::communicator::Communicator;
use crate::algs::halo::HaloExchange;
use crate::grid::{Coordinates, Field, GridLayout};
use crate::grid_error::GridError;
use crate::operators::derivative::{
    FirstDerivativeScheme, SecondDerivativeScheme, first_derivative, second_derivative,
};
use crate::physics::PhysicsModel;

#[derive(Clone, Debug)]
pub struct ParabolicEvaluator {
    first: FirstDerivativeScheme,
    second: SecondDerivativeScheme,
    func: Field,
    deriv1: Field,
    deriv2: Field,
    exchanges: u64,
}

impl ParabolicEvaluator {
    pub fn new(
        layout: &GridLayout,
        first: FirstDerivativeScheme,
        second: SecondDerivativeScheme,
    ) -> Result<Self, GridError> {
        layout.require_ghosts(second.ghosts_required())?;
        Ok(Self {
            first,
            second,
            func: Field::zeros(layout),
            deriv1: Field::zeros(layout),
            deriv2: Field::zeros(layout),
            exchanges: 0,
        })
    }

    /// Halo exchanges issued for cross-derivative intermediates so far.
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    /// Overwrite `par` with the parabolic term of `u`.
    ///
    /// `u` must have valid ghost layers. If `iblank` is given, the result is
    /// multiplied point-wise by it.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate<C: Communicator>(
        &mut self,
        par: &mut Field,
        u: &Field,
        model: &dyn PhysicsModel,
        coords: &Coordinates,
        halo: &HaloExchange,
        comm: &C,
        iblank: Option<&Field>,
    ) -> Result<(), GridError> {
        let layout = u.layout().clone();
        layout.check_len(par.as_slice().len())?;
        self.func.layout().check_len(layout.len())?;
        par.fill(0.0);
        if !model.has_diffusion() {
            return Ok(());
        }
        let nvars = layout.nvars();
        let nd = layout.ndims();

        for d1 in 0..nd {
            for d2 in 0..nd {
                for (h, uc) in self
                    .func
                    .as_mut_slice()
                    .chunks_exact_mut(nvars)
                    .zip(u.as_slice().chunks_exact(nvars))
                {
                    model.diffusion_flux(uc, d1, d2, h);
                }

                if d1 == d2 {
                    second_derivative(self.second, &mut self.deriv2, &self.func, d1)?;
                } else {
                    self.deriv1.fill(0.0);
                    first_derivative(
                        self.first,
                        &mut self.deriv1,
                        &self.func,
                        d1,
                        1,
                        &layout.padded_along(d1),
                    )?;
                    halo.exchange(comm, &mut self.deriv1)?;
                    self.exchanges += 1;
                    halo.extrapolate_physical_ghosts(&mut self.deriv1, d2);
                    first_derivative(
                        self.first,
                        &mut self.deriv2,
                        &self.deriv1,
                        d2,
                        -1,
                        &layout.interior(),
                    )?;
                }

                let deriv2 = &self.deriv2;
                layout.interior().for_each(|i| {
                    let scale = coords.dxinv(d1, i[d1]) * coords.dxinv(d2, i[d2]);
                    for (p, &d) in par.at_mut(i).iter_mut().zip(deriv2.at(i)) {
                        *p += scale * d;
                    }
                });
            }
        }

        if let Some(mask) = iblank {
            par.block_multiply(mask)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;
    use crate::algs::halo::ProcessGrid;
    use crate::physics::LinearAdr;

    #[test]
    fn laplacian_of_quadratic_on_uniform_grid() {
        let l = GridLayout::new(&[6], 1, 1).unwrap();
        let coords = Coordinates::uniform(&l, &[0], &[0.0], &[0.5]).unwrap();
        let m = LinearAdr::new(1, vec![0.0], vec![vec![3.0]], 0.0).unwrap();
        let u = Field::from_fn(&l, |i, v| v[0] = coords.x(0, i[0]).powi(2));
        let halo = HaloExchange::new(ProcessGrid::serial(&[false]));
        let mut ev = ParabolicEvaluator::new(
            &l,
            FirstDerivativeScheme::Central2,
            SecondDerivativeScheme::Central2,
        )
        .unwrap();
        let mut par = Field::zeros(&l);
        ev.evaluate(&mut par, &u, &m, &coords, &halo, &NoComm, None).unwrap();
        l.interior().for_each(|i| assert!((par.at(i)[0] - 6.0).abs() < 1e-10));
        assert_eq!(ev.exchanges(), 0);
    }

    #[test]
    fn mask_zeroes_blanked_points() {
        let l = GridLayout::new(&[4, 4], 1, 1).unwrap();
        let coords = Coordinates::uniform(&l, &[0, 0], &[0.0, 0.0], &[1.0, 1.0]).unwrap();
        let m = LinearAdr::new(1, vec![0.0, 0.0], vec![vec![1.0, 0.5], vec![0.5, 1.0]], 0.0)
            .unwrap();
        let u = Field::from_fn(&l, |i, v| v[0] = (i[0] * i[1]) as f64);
        let mask = Field::from_fn(&GridLayout::new(&[4, 4], 1, 1).unwrap(), |i, v| {
            v[0] = if i[0] == 1 && i[1] == 1 { 0.0 } else { 1.0 }
        });
        let halo = HaloExchange::new(ProcessGrid::serial(&[true, true]));
        let mut ev = ParabolicEvaluator::new(
            &l,
            FirstDerivativeScheme::Central2,
            SecondDerivativeScheme::Central2,
        )
        .unwrap();
        let mut par = Field::zeros(&l);
        ev.evaluate(&mut par, &u, &m, &coords, &halo, &NoComm, Some(&mask)).unwrap();
        assert_eq!(par.at(&[1, 1]), &[0.0]);
        // Interior cross term of x*y is 2 * 0.5 * 1.
        assert!((par.at(&[2, 2])[0] - 1.0).abs() < 1e-12);
        assert_eq!(ev.exchanges(), 2);
    }
}
