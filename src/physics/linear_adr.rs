//! Linear advection-diffusion-reaction of `nvars` decoupled scalars.
//!
//! `u_t + sum_d a_d u_x_d = sum_{d1,d2} nu_{d1,d2} u_{x_d1 x_d2} - k u`

use crate::grid_error::GridError;
use crate::physics::{Eigensystem, PhysicsModel};

#[derive(Clone, Debug, PartialEq)]
pub struct LinearAdr {
    nvars: usize,
    advection: Vec<f64>,
    diffusion: Vec<Vec<f64>>,
    reaction: f64,
}

impl LinearAdr {
    /// `diffusion` is either empty or an `ndims x ndims` tensor.
    pub fn new(
        nvars: usize,
        advection: Vec<f64>,
        diffusion: Vec<Vec<f64>>,
        reaction: f64,
    ) -> Result<Self, GridError> {
        if nvars == 0 || advection.is_empty() {
            return Err(GridError::Config(
                "linear model needs at least one variable and one advection speed".into(),
            ));
        }
        let nd = advection.len();
        if !diffusion.is_empty()
            && (diffusion.len() != nd || diffusion.iter().any(|row| row.len() != nd))
        {
            return Err(GridError::Config(format!(
                "diffusion tensor must be {nd} x {nd}"
            )));
        }
        Ok(Self {
            nvars,
            advection,
            diffusion,
            reaction,
        })
    }

    pub fn advection(&self) -> &[f64] {
        &self.advection
    }

    fn nu(&self, d1: usize, d2: usize) -> f64 {
        self.diffusion.get(d1).and_then(|r| r.get(d2)).copied().unwrap_or(0.0)
    }
}

impl PhysicsModel for LinearAdr {
    fn name(&self) -> &'static str {
        "linear-adr"
    }

    fn nvars(&self) -> usize {
        self.nvars
    }

    fn ndims(&self) -> usize {
        self.advection.len()
    }

    fn has_flux(&self) -> bool {
        self.advection.iter().any(|&a| a != 0.0)
    }

    fn flux(&self, u: &[f64], dir: usize, out: &mut [f64]) {
        let a = self.advection[dir];
        for (o, &x) in out.iter_mut().zip(u) {
            *o = a * x;
        }
    }

    fn roe_average(
        &self,
        ul: &[f64],
        ur: &[f64],
        _dir: usize,
        out: &mut [f64],
    ) -> Result<(), GridError> {
        for ((o, &l), &r) in out.iter_mut().zip(ul).zip(ur) {
            *o = 0.5 * (l + r);
        }
        Ok(())
    }

    fn eigen(&self, _u: &[f64], dir: usize, eig: &mut Eigensystem) -> Result<(), GridError> {
        let a = self.advection[dir];
        eig.lambda.iter_mut().for_each(|l| *l = a);
        for i in 0..self.nvars {
            for j in 0..self.nvars {
                let v = if i == j { 1.0 } else { 0.0 };
                eig.left.set(i, j, v);
                eig.right.set(i, j, v);
            }
        }
        Ok(())
    }

    fn homogeneous_flux(&self) -> bool {
        true
    }

    fn has_diffusion(&self) -> bool {
        self.diffusion.iter().flatten().any(|&x| x != 0.0)
    }

    fn diffusion_flux(&self, u: &[f64], d1: usize, d2: usize, out: &mut [f64]) {
        let nu = self.nu(d1, d2);
        for (o, &x) in out.iter_mut().zip(u) {
            *o = nu * x;
        }
    }

    fn has_source(&self) -> bool {
        self.reaction != 0.0
    }

    fn source(&self, u: &[f64], out: &mut [f64]) {
        for (o, &x) in out.iter_mut().zip(u) {
            *o = -self.reaction * x;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_diffusion_tensor_is_rejected() {
        let res = LinearAdr::new(1, vec![1.0, 1.0], vec![vec![1.0, 0.0], vec![0.0]], 0.0);
        assert!(matches!(res, Err(GridError::Config(_))));
    }

    #[test]
    fn diffusion_flux_scales_by_tensor_entry() {
        let m = LinearAdr::new(2, vec![0.0, 0.0], vec![vec![1.0, 0.25], vec![0.25, 2.0]], 0.0)
            .unwrap();
        let mut h = [0.0; 2];
        m.diffusion_flux(&[4.0, -8.0], 0, 1, &mut h);
        assert_eq!(h, [1.0, -2.0]);
        assert!(!m.has_flux());
        assert!(m.has_diffusion());
    }
}
