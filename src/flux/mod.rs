//! Upwind interface fluxes built on a model's characteristic decomposition.
//!
//! Every scheme maps left/right reconstructed fluxes `fL`, `fR` and states
//! `uL`, `uR` at one interface to a single interface flux, and reduces to the
//! physical flux when `uL == uR`.

mod char_fixed;
mod roe;
mod steger_warming;

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::grid_error::GridError;
use crate::physics::{Eigensystem, PhysicsModel};

/// Interface flux method, selected by name.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum UpwindScheme {
    /// `0.5 (fL + fR) - 0.5 R|D|L (uR - uL)` at the Roe average. No entropy fix.
    #[default]
    Roe,
    /// Per characteristic field: upwind when the eigenvalue has one sign at the
    /// left, right and averaged states, local Lax-Friedrichs otherwise.
    RoeFixed,
    /// Local Lax-Friedrichs in every characteristic field.
    LocalLaxFriedrichs,
    /// Flux-vector splitting by eigenvalue sign; needs `F(u) = A(u) u`.
    StegerWarming,
}

impl UpwindScheme {
    pub const ALL: [UpwindScheme; 4] = [
        UpwindScheme::Roe,
        UpwindScheme::RoeFixed,
        UpwindScheme::LocalLaxFriedrichs,
        UpwindScheme::StegerWarming,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UpwindScheme::Roe => "roe",
            UpwindScheme::RoeFixed => "rf-char",
            UpwindScheme::LocalLaxFriedrichs => "llf-char",
            UpwindScheme::StegerWarming => "steger-warming",
        }
    }

    /// Fails if `model` cannot be discretized with this scheme.
    pub fn check_model(self, model: &dyn PhysicsModel) -> Result<(), GridError> {
        if self == UpwindScheme::StegerWarming && !model.homogeneous_flux() {
            return Err(GridError::UnsupportedScheme {
                scheme: self.as_str(),
                model: model.name(),
            });
        }
        Ok(())
    }

    /// Interface flux at a single interface.
    #[allow(clippy::too_many_arguments)]
    pub fn interface_flux(
        self,
        model: &dyn PhysicsModel,
        dir: usize,
        fl: &[f64],
        fr: &[f64],
        ul: &[f64],
        ur: &[f64],
        ws: &mut UpwindWorkspace,
        out: &mut [f64],
    ) -> Result<(), GridError> {
        match self {
            UpwindScheme::Roe => roe::flux(model, dir, fl, fr, ul, ur, ws, out),
            UpwindScheme::RoeFixed => {
                char_fixed::flux(model, dir, fl, fr, ul, ur, ws, out, true)
            }
            UpwindScheme::LocalLaxFriedrichs => {
                char_fixed::flux(model, dir, fl, fr, ul, ur, ws, out, false)
            }
            UpwindScheme::StegerWarming => steger_warming::flux(model, dir, ul, ur, ws, out),
        }
    }
}

impl fmt::Display for UpwindScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpwindScheme {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpwindScheme::ALL
            .into_iter()
            .find(|u| u.as_str() == s)
            .ok_or_else(|| GridError::Config(format!("unknown upwind scheme `{s}`")))
    }
}

/// Per-thread scratch for interface flux evaluation.
#[derive(Clone, Debug)]
pub struct UpwindWorkspace {
    eig: Eigensystem,
    avg: Vec<f64>,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
    lam_l: Vec<f64>,
    lam_r: Vec<f64>,
}

impl UpwindWorkspace {
    pub fn new(nvars: usize) -> Self {
        Self {
            eig: Eigensystem::new(nvars),
            avg: vec![0.0; nvars],
            a: vec![0.0; nvars],
            b: vec![0.0; nvars],
            c: vec![0.0; nvars],
            d: vec![0.0; nvars],
            lam_l: vec![0.0; nvars],
            lam_r: vec![0.0; nvars],
        }
    }
}

/// Evaluate `scheme` at every interface of a sweep.
///
/// All slices are interface arrays of equal length, `nvars` values per point.
#[allow(clippy::too_many_arguments)]
pub fn upwind_sweep(
    scheme: UpwindScheme,
    model: &dyn PhysicsModel,
    dir: usize,
    fl: &[f64],
    fr: &[f64],
    ul: &[f64],
    ur: &[f64],
    fi: &mut [f64],
) -> Result<(), GridError> {
    let nvars = model.nvars();
    for len in [fl.len(), fr.len(), ul.len(), ur.len()] {
        if len != fi.len() {
            return Err(GridError::LayoutMismatch {
                expected: fi.len(),
                found: len,
            });
        }
    }
    let point = |p: usize, ws: &mut UpwindWorkspace, out: &mut [f64]| {
        let s = p * nvars..(p + 1) * nvars;
        scheme.interface_flux(
            model,
            dir,
            &fl[s.clone()],
            &fr[s.clone()],
            &ul[s.clone()],
            &ur[s],
            ws,
            out,
        )
    };

    #[cfg(feature = "rayon")]
    {
        fi.par_chunks_mut(nvars)
            .enumerate()
            .try_for_each_init(|| UpwindWorkspace::new(nvars), |ws, (p, out)| point(p, ws, out))
    }
    #[cfg(not(feature = "rayon"))]
    {
        let mut ws = UpwindWorkspace::new(nvars);
        fi.chunks_mut(nvars)
            .enumerate()
            .try_for_each(|(p, out)| point(p, &mut ws, out))
    }
}
