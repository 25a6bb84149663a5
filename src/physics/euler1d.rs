//! One-dimensional Euler equations, conserved variables `[rho, rho*u, E]`.

use crate::grid_error::GridError;
use crate::physics::{Eigensystem, PhysicsModel};

#[derive(Clone, Debug, PartialEq)]
pub struct Euler1D {
    gamma: f64,
}

/// Primitive view of a conserved state.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Primitive {
    pub rho: f64,
    pub u: f64,
    pub p: f64,
    pub c: f64,
    pub h: f64,
}

impl Euler1D {
    pub fn new(gamma: f64) -> Result<Self, GridError> {
        if !(gamma > 1.0) {
            return Err(GridError::Config(format!(
                "ratio of specific heats must exceed 1, got {gamma}"
            )));
        }
        Ok(Self { gamma })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    #[inline]
    pub fn pressure(&self, u: &[f64]) -> f64 {
        (self.gamma - 1.0) * (u[2] - 0.5 * u[1] * u[1] / u[0])
    }

    /// Conserved state from density, velocity and pressure.
    pub fn conserved(&self, rho: f64, vel: f64, p: f64) -> [f64; 3] {
        [rho, rho * vel, p / (self.gamma - 1.0) + 0.5 * rho * vel * vel]
    }

    pub(crate) fn primitive(&self, u: &[f64]) -> Result<Primitive, GridError> {
        let rho = u[0];
        if !(rho > 0.0) {
            return Err(GridError::NonPhysicalState(format!("density {rho}")));
        }
        let vel = u[1] / rho;
        let p = self.pressure(u);
        if !(p > 0.0) {
            return Err(GridError::NonPhysicalState(format!("pressure {p}")));
        }
        Ok(Primitive {
            rho,
            u: vel,
            p,
            c: (self.gamma * p / rho).sqrt(),
            h: (u[2] + p) / rho,
        })
    }
}

impl PhysicsModel for Euler1D {
    fn name(&self) -> &'static str {
        "euler1d"
    }

    fn nvars(&self) -> usize {
        3
    }

    fn ndims(&self) -> usize {
        1
    }

    fn flux(&self, u: &[f64], _dir: usize, out: &mut [f64]) {
        let vel = u[1] / u[0];
        let p = self.pressure(u);
        out[0] = u[1];
        out[1] = u[1] * vel + p;
        out[2] = (u[2] + p) * vel;
    }

    fn roe_average(
        &self,
        ul: &[f64],
        ur: &[f64],
        _dir: usize,
        out: &mut [f64],
    ) -> Result<(), GridError> {
        let l = self.primitive(ul)?;
        let r = self.primitive(ur)?;
        let (sl, sr) = (l.rho.sqrt(), r.rho.sqrt());
        let rho = sl * sr;
        let vel = (sl * l.u + sr * r.u) / (sl + sr);
        let h = (sl * l.h + sr * r.h) / (sl + sr);
        let g = self.gamma;
        out[0] = rho;
        out[1] = rho * vel;
        out[2] = rho * h / g + rho * (g - 1.0) * vel * vel / (2.0 * g);
        Ok(())
    }

    fn eigen(&self, u: &[f64], _dir: usize, eig: &mut Eigensystem) -> Result<(), GridError> {
        let Primitive { u: vel, c, h, .. } = self.primitive(u)?;
        let b = (self.gamma - 1.0) / (c * c);
        let k = 0.5 * b * vel * vel;

        eig.lambda.copy_from_slice(&[vel - c, vel, vel + c]);

        eig.right.set_col(0, &[1.0, vel - c, h - vel * c]);
        eig.right.set_col(1, &[1.0, vel, 0.5 * vel * vel]);
        eig.right.set_col(2, &[1.0, vel + c, h + vel * c]);

        eig.left
            .set_row(0, &[0.5 * (k + vel / c), -0.5 * (b * vel + 1.0 / c), 0.5 * b]);
        eig.left.set_row(1, &[1.0 - k, b * vel, -b]);
        eig.left
            .set_row(2, &[0.5 * (k - vel / c), -0.5 * (b * vel - 1.0 / c), 0.5 * b]);
        Ok(())
    }

    fn eigenvalues(&self, u: &[f64], _dir: usize, out: &mut [f64]) -> Result<(), GridError> {
        let p = self.primitive(u)?;
        out.copy_from_slice(&[p.u - p.c, p.u, p.u + p.c]);
        Ok(())
    }

    fn homogeneous_flux(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::SquareMatrix;

    fn jacobian(m: &Euler1D, u: &[f64]) -> SquareMatrix {
        let g = m.gamma();
        let p = m.primitive(u).unwrap();
        let (v, h) = (p.u, p.h);
        SquareMatrix::from_rows(&[
            &[0.0, 1.0, 0.0],
            &[0.5 * (g - 3.0) * v * v, (3.0 - g) * v, g - 1.0],
            &[v * (0.5 * (g - 1.0) * v * v - h), h - (g - 1.0) * v * v, g * v],
        ])
    }

    #[test]
    fn eigenvectors_diagonalize_the_analytic_jacobian() {
        let m = Euler1D::new(1.4).unwrap();
        let u = m.conserved(0.8, -0.3, 1.7);
        let mut eig = Eigensystem::new(3);
        m.eigen(&u, 0, &mut eig).unwrap();
        assert!(eig.orthonormality_defect() < 1e-12);
        assert!(eig.reconstruct().max_abs_diff(&jacobian(&m, &u)) < 1e-12);
    }

    #[test]
    fn roe_average_of_equal_states_is_the_state() {
        let m = Euler1D::new(1.4).unwrap();
        let u = m.conserved(1.2, 0.4, 0.9);
        let mut avg = [0.0; 3];
        m.roe_average(&u, &u, 0, &mut avg).unwrap();
        for (a, b) in avg.iter().zip(&u) {
            assert!((a - b).abs() < 1e-14);
        }
    }

    #[test]
    fn negative_pressure_is_rejected() {
        let m = Euler1D::new(1.4).unwrap();
        let mut eig = Eigensystem::new(3);
        let res = m.eigen(&[1.0, 2.0, 1.0], 0, &mut eig);
        assert!(matches!(res, Err(GridError::NonPhysicalState(_))));
    }
}
