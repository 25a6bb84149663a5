//! Matrix-free Jacobian action for Newton-Krylov implicit time stepping.
//!
//! The implicit system of a stage is `shift * U - RHS(U) = b`; its Jacobian
//! applied to a direction `y` is approximated by a directional difference of
//! the right-hand side about a reference state:
//!
//! ```text
//! J y = shift * y - (RHS(uref + eps y) - RHS(uref)) / eps
//! ```
//!
//! with `eps = jfnk_eps / |y|` for nonlinear problems and `eps = 1` for
//! linear ones. Perturbed evaluations reuse the interpolation weights frozen
//! by the reference evaluation.

use serde::{Deserialize, Serialize};

use crate::algs::communicator::Communicator;
use crate::algs::reduction::global_norm2;
use crate::grid::Field;
use crate::grid_error::GridError;
use crate::reconstruction::Limiting;
use crate::solver::Solver;

/// Below this direction norm the action is exactly `shift * y`.
pub const NORM_FLOOR: f64 = 1e-16;

/// How the directional derivative is formed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JacobianMode {
    /// Finite-difference step scaled by the direction norm.
    #[default]
    Jfnk,
    /// Unit step, exact for a linear right-hand side.
    Linear,
}

fn default_jfnk_eps() -> f64 {
    1e-6
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JacobianConfig {
    #[serde(default)]
    pub mode: JacobianMode,
    #[serde(default = "default_jfnk_eps")]
    pub jfnk_eps: f64,
}

impl Default for JacobianConfig {
    fn default() -> Self {
        Self {
            mode: JacobianMode::default(),
            jfnk_eps: default_jfnk_eps(),
        }
    }
}

impl JacobianConfig {
    pub fn validate(&self) -> Result<(), GridError> {
        if !(self.jfnk_eps > 0.0) || !self.jfnk_eps.is_finite() {
            return Err(GridError::Config(format!(
                "jfnk_eps must be positive, got {}",
                self.jfnk_eps
            )));
        }
        if self.jfnk_eps > 1e-2 {
            log::warn!("jfnk_eps = {} is unusually large", self.jfnk_eps);
        }
        Ok(())
    }
}

/// Anything that maps a flat vector to a flat vector of the same length.
pub trait LinearOperator {
    fn apply(&mut self, x: &[f64], y: &mut [f64]) -> Result<(), GridError>;
}

/// Reference snapshot and scratch of the Jacobian action.
///
/// Direction and result vectors hold the physical points of one rank only
/// (`layout.interior_len()` values), the layout a Krylov solver works with.
#[derive(Clone, Debug)]
pub struct JacobianAction {
    mode: JacobianMode,
    jfnk_eps: f64,
    shift: f64,
    time: f64,
    uref: Option<Field>,
    rhsref: Option<Field>,
    upert: Option<Field>,
    rhspert: Option<Field>,
}

impl JacobianAction {
    pub fn new(config: JacobianConfig) -> Result<Self, GridError> {
        config.validate()?;
        Ok(Self {
            mode: config.mode,
            jfnk_eps: config.jfnk_eps,
            shift: 0.0,
            time: 0.0,
            uref: None,
            rhsref: None,
            upert: None,
            rhspert: None,
        })
    }

    /// Action configured from a solver's own Jacobian settings.
    pub fn for_solver<C: Communicator>(solver: &Solver<C>) -> Result<Self, GridError> {
        Self::new(*solver.jacobian_config())
    }

    pub fn mode(&self) -> JacobianMode {
        self.mode
    }

    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// Stage time recorded by the last [`JacobianAction::set_shift`].
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Record the implicit shift `a` of `a U - RHS(U)` for the current stage.
    pub fn set_shift<C: Communicator>(&mut self, solver: &mut Solver<C>, shift: f64, t: f64) {
        self.shift = shift;
        self.time = t;
        solver.counters_mut().jacobian_shift += 1;
    }

    /// Snapshot `u0` and its right-hand side as the linearisation point.
    ///
    /// The right-hand side is evaluated with recomputed interpolation
    /// weights, which freezes them for the following actions. `u0` itself
    /// is left untouched.
    pub fn set_reference<C: Communicator>(
        &mut self,
        solver: &mut Solver<C>,
        u0: &Field,
        t: f64,
    ) -> Result<(), GridError> {
        let layout = solver.layout().clone();
        layout.check_len(u0.as_slice().len())?;
        let mut uref = self.uref.take().unwrap_or_else(|| Field::zeros(&layout));
        let mut rhsref = self.rhsref.take().unwrap_or_else(|| Field::zeros(&layout));
        uref.copy_from(u0)?;
        solver.apply_boundaries(&mut uref)?;
        solver.clear_frozen_weights();
        solver.rhs(&mut rhsref, &uref, Limiting::Recompute)?;
        self.upert.get_or_insert_with(|| Field::zeros(&layout));
        self.rhspert.get_or_insert_with(|| Field::zeros(&layout));
        self.uref = Some(uref);
        self.rhsref = Some(rhsref);
        self.time = t;
        log::debug!(
            "rank {}: Jacobian reference updated at t = {t}",
            solver.comm().rank()
        );
        Ok(())
    }

    pub fn reference(&self) -> Option<&Field> {
        self.uref.as_ref()
    }

    /// `out = J y` on this rank's physical points.
    pub fn apply<C: Communicator>(
        &mut self,
        solver: &mut Solver<C>,
        y: &[f64],
        out: &mut [f64],
    ) -> Result<(), GridError> {
        let n = solver.layout().interior_len();
        for len in [y.len(), out.len()] {
            if len != n {
                return Err(GridError::LayoutMismatch {
                    expected: n,
                    found: len,
                });
            }
        }
        let (Some(uref), Some(rhsref), Some(upert), Some(rhspert)) = (
            self.uref.as_ref(),
            self.rhsref.as_ref(),
            self.upert.as_mut(),
            self.rhspert.as_mut(),
        ) else {
            return Err(GridError::NotInitialized("Jacobian reference state"));
        };
        solver.counters_mut().jacobian_action += 1;

        let norm = global_norm2(solver.comm(), y)?;
        if norm < NORM_FLOOR {
            for (o, &yi) in out.iter_mut().zip(y) {
                *o = self.shift * yi;
            }
            return Ok(());
        }
        let eps = match self.mode {
            JacobianMode::Jfnk => self.jfnk_eps / norm,
            JacobianMode::Linear => 1.0,
        };

        // upert = uref + eps * y on the physical points
        upert.copy_from(uref)?;
        out.iter_mut().zip(y).for_each(|(o, &yi)| *o = eps * yi);
        let mut interior = vec![0.0; n];
        upert.gather_interior(&mut interior)?;
        interior.iter_mut().zip(out.iter()).for_each(|(u, &d)| *u += d);
        upert.scatter_interior(&interior)?;

        solver.apply_boundaries(upert)?;
        solver.rhs(rhspert, upert, Limiting::Frozen)?;

        let mut r = vec![0.0; n];
        let mut r0 = vec![0.0; n];
        rhspert.gather_interior(&mut r)?;
        rhsref.gather_interior(&mut r0)?;
        for ((o, &yi), (&rp, &rr)) in out.iter_mut().zip(y).zip(r.iter().zip(&r0)) {
            *o = self.shift * yi - (rp - rr) / eps;
        }
        Ok(())
    }
}

/// A [`JacobianAction`] bound to its solver, as handed to a Krylov method.
pub struct JacobianOperator<'a, C: Communicator> {
    solver: &'a mut Solver<C>,
    action: &'a mut JacobianAction,
}

impl<'a, C: Communicator> JacobianOperator<'a, C> {
    pub fn new(solver: &'a mut Solver<C>, action: &'a mut JacobianAction) -> Self {
        Self { solver, action }
    }
}

impl<C: Communicator> LinearOperator for JacobianOperator<'_, C> {
    fn apply(&mut self, x: &[f64], y: &mut [f64]) -> Result<(), GridError> {
        self.action.apply(self.solver, x, y)
    }
}
