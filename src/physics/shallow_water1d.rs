//! One-dimensional shallow-water equations, conserved variables `[h, h*u]`.

use crate::grid_error::GridError;
use crate::physics::{Eigensystem, PhysicsModel};

#[derive(Clone, Debug, PartialEq)]
pub struct ShallowWater1D {
    gravity: f64,
}

impl ShallowWater1D {
    pub fn new(gravity: f64) -> Result<Self, GridError> {
        if !(gravity > 0.0) {
            return Err(GridError::Config(format!(
                "gravitational acceleration must be positive, got {gravity}"
            )));
        }
        Ok(Self { gravity })
    }

    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    fn depth(u: &[f64]) -> Result<f64, GridError> {
        let h = u[0];
        if !(h > 0.0) {
            return Err(GridError::NonPhysicalState(format!("depth {h}")));
        }
        Ok(h)
    }
}

impl PhysicsModel for ShallowWater1D {
    fn name(&self) -> &'static str {
        "shallow-water1d"
    }

    fn nvars(&self) -> usize {
        2
    }

    fn ndims(&self) -> usize {
        1
    }

    fn flux(&self, u: &[f64], _dir: usize, out: &mut [f64]) {
        out[0] = u[1];
        out[1] = u[1] * u[1] / u[0] + 0.5 * self.gravity * u[0] * u[0];
    }

    /// Arithmetic depth, square-root-depth weighted velocity.
    fn roe_average(
        &self,
        ul: &[f64],
        ur: &[f64],
        _dir: usize,
        out: &mut [f64],
    ) -> Result<(), GridError> {
        let (hl, hr) = (Self::depth(ul)?, Self::depth(ur)?);
        let (sl, sr) = (hl.sqrt(), hr.sqrt());
        let vel = (ul[1] / sl + ur[1] / sr) / (sl + sr);
        let h = 0.5 * (hl + hr);
        out[0] = h;
        out[1] = h * vel;
        Ok(())
    }

    fn eigen(&self, u: &[f64], _dir: usize, eig: &mut Eigensystem) -> Result<(), GridError> {
        let h = Self::depth(u)?;
        let vel = u[1] / h;
        let c = (self.gravity * h).sqrt();
        eig.lambda.copy_from_slice(&[vel - c, vel + c]);
        eig.right.set_col(0, &[1.0, vel - c]);
        eig.right.set_col(1, &[1.0, vel + c]);
        let s = 0.5 / c;
        eig.left.set_row(0, &[s * (vel + c), -s]);
        eig.left.set_row(1, &[-s * (vel - c), s]);
        Ok(())
    }

    fn eigenvalues(&self, u: &[f64], _dir: usize, out: &mut [f64]) -> Result<(), GridError> {
        let h = Self::depth(u)?;
        let vel = u[1] / h;
        let c = (self.gravity * h).sqrt();
        out.copy_from_slice(&[vel - c, vel + c]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steger_warming_is_not_offered() {
        let m = ShallowWater1D::new(9.81).unwrap();
        assert!(!m.homogeneous_flux());
    }

    #[test]
    fn dry_state_is_non_physical() {
        let m = ShallowWater1D::new(9.81).unwrap();
        let mut out = [0.0; 2];
        let res = m.roe_average(&[0.0, 0.0], &[1.0, 0.0], 0, &mut out);
        assert!(matches!(res, Err(GridError::NonPhysicalState(_))));
    }

    #[test]
    fn closed_form_eigenvalues_match_the_eigensystem() {
        let m = ShallowWater1D::new(9.81).unwrap();
        let u = [1.7, -0.9];
        let mut eig = Eigensystem::new(2);
        let mut lambda = [0.0; 2];
        m.eigen(&u, 0, &mut eig).unwrap();
        m.eigenvalues(&u, 0, &mut lambda).unwrap();
        assert_eq!(&lambda[..], &eig.lambda[..]);
        assert!(matches!(
            m.eigenvalues(&[-1.0, 0.0], 0, &mut lambda),
            Err(GridError::NonPhysicalState(_))
        ));
    }
}
