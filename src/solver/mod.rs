//! Simulation context: one rank's grid, model, operators and scratch.
//!
//! A [`Solver`] is built once from a [`SolverConfig`] and a communicator and
//! then evaluates the semi-discrete right-hand side as often as the time
//! integrator asks. All mutable state (scratch fields, frozen interpolation
//! weights, diagnostic counters) lives here; nothing is global.

pub mod config;

use std::sync::Arc;

use crate::algs::communicator::Communicator;
use crate::algs::halo::{HaloExchange, ProcessGrid};
use crate::boundary::{BoundaryZone, apply_ghost_conditions, sponge_intersects};
use crate::grid::{Coordinates, Field, GridLayout};
use crate::grid_error::GridError;
use crate::implicit::JacobianConfig;
use crate::operators::{HyperbolicEvaluator, ParabolicEvaluator, assemble_rhs, evaluate_source};
use crate::physics::PhysicsModel;
use crate::reconstruction::{Limiting, Reconstruction};

pub use config::{ResolvedConfig, SolverConfig};

/// Evaluation counts, for diagnostics only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub hyperbolic: u64,
    pub parabolic: u64,
    pub source: u64,
    pub rhs: u64,
    pub jacobian_shift: u64,
    pub jacobian_action: u64,
    pub halo_exchanges: u64,
}

/// One rank's share of a discretized problem.
pub struct Solver<C: Communicator> {
    comm: C,
    layout: GridLayout,
    coords: Coordinates,
    start: Vec<usize>,
    model: Arc<dyn PhysicsModel>,
    recon: Box<dyn Reconstruction>,
    halo: HaloExchange,
    hyperbolic: HyperbolicEvaluator,
    parabolic: ParabolicEvaluator,
    zones: Vec<BoundaryZone>,
    iblank: Option<Field>,
    jacobian: JacobianConfig,
    hyp: Field,
    par: Field,
    source: Field,
    counters: Counters,
}

impl<C: Communicator> std::fmt::Debug for Solver<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("rank", &self.comm.rank())
            .field("model", &self.model.name())
            .field("upwinding", &self.hyperbolic.scheme())
            .field("reconstruction", &self.recon.name())
            .field("dim_local", &self.layout.dim_local())
            .field("counters", &self.counters)
            .finish()
    }
}

impl<C: Communicator> Solver<C> {
    /// Validate `config` and set up this rank's subdomain.
    pub fn new(config: SolverConfig, comm: C) -> Result<Self, GridError> {
        let resolved = config.validate()?;
        let grid = ProcessGrid::new(&resolved.iproc, &resolved.periodic, comm.rank())?;
        let halo = HaloExchange::new(grid);
        halo.check_comm(&comm)?;
        let (local, start) = halo.process_grid().partition(&config.size)?;
        let layout = GridLayout::new(&local, resolved.nvars, config.ghosts)?;
        let dx: Vec<f64> = (0..resolved.ndims)
            .map(|d| (resolved.xmax[d] - resolved.xmin[d]) / config.size[d] as f64)
            .collect();
        let coords = Coordinates::uniform(&layout, &start, &resolved.xmin, &dx)?;
        let model = config.model.build(resolved.ndims, resolved.nvars)?;

        for zone in config.boundaries.iter().filter(|z| z.is_sponge()) {
            if halo.process_grid().touches_boundary(zone.dim(), zone.face())
                && !sponge_intersects(zone, &coords, &layout)
            {
                log::warn!(
                    "rank {}: sponge zone on dimension {} ({:?}) does not intersect the local subdomain",
                    comm.rank(),
                    zone.dim(),
                    zone.face()
                );
            }
        }

        log::info!(
            "rank {}/{}: model {} ({} vars), upwinding {}, reconstruction {}, local grid {:?} at {:?}",
            comm.rank(),
            comm.size(),
            model.name(),
            resolved.nvars,
            resolved.upwind,
            config.reconstruction,
            local,
            start
        );

        Ok(Self {
            hyperbolic: HyperbolicEvaluator::new(&layout, resolved.upwind),
            parabolic: ParabolicEvaluator::new(&layout, resolved.first, resolved.second)?,
            recon: resolved.reconstruction.build(),
            hyp: Field::zeros(&layout),
            par: Field::zeros(&layout),
            source: Field::zeros(&layout),
            zones: config.boundaries,
            jacobian: config.jacobian,
            iblank: None,
            counters: Counters::default(),
            comm,
            layout,
            coords,
            start,
            model,
            halo,
        })
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coords
    }

    pub fn model(&self) -> &dyn PhysicsModel {
        self.model.as_ref()
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn process_grid(&self) -> &ProcessGrid {
        self.halo.process_grid()
    }

    pub fn jacobian_config(&self) -> &JacobianConfig {
        &self.jacobian
    }

    /// Global index of the first physical point per dimension.
    pub fn start(&self) -> &[usize] {
        &self.start
    }

    pub fn counters(&self) -> Counters {
        let mut c = self.counters;
        c.halo_exchanges += self.parabolic.exchanges();
        c
    }

    pub(crate) fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    /// A zero field on this rank's layout.
    pub fn new_field(&self) -> Field {
        Field::zeros(&self.layout)
    }

    /// A field initialised point-wise from physical coordinates, ghosts included.
    pub fn field_from_fn<F>(&self, mut f: F) -> Field
    where
        F: FnMut(&[f64], &mut [f64]),
    {
        let mut x = vec![0.0; self.layout.ndims()];
        Field::from_fn(&self.layout, |i, vals| {
            for (d, xd) in x.iter_mut().enumerate() {
                *xd = self.coords.x(d, i[d]);
            }
            f(&x, vals)
        })
    }

    /// Install an immersed-boundary mask (one value per point) applied to
    /// the parabolic term.
    pub fn set_iblank(&mut self, mask: Field) -> Result<(), GridError> {
        if mask.layout().nvars() != 1 || mask.layout().dim_local() != self.layout.dim_local() {
            return Err(GridError::LayoutMismatch {
                expected: self.layout.npoints_padded(),
                found: mask.as_slice().len(),
            });
        }
        self.iblank = Some(mask);
        Ok(())
    }

    /// Fill physical-boundary ghosts of `u`, then exchange with neighbours.
    pub fn apply_boundaries(&mut self, u: &mut Field) -> Result<(), GridError> {
        self.layout.check_len(u.as_slice().len())?;
        apply_ghost_conditions(&self.zones, self.halo.process_grid(), u);
        self.halo.exchange(&self.comm, u)?;
        self.counters.halo_exchanges += 1;
        log::debug!("rank {}: boundary conditions and halo exchange", self.comm.rank());
        Ok(())
    }

    /// Hyperbolic term of `u`; `u` must have refreshed ghost layers.
    pub fn hyperbolic(&mut self, hyp: &mut Field, u: &Field, limiting: Limiting) -> Result<(), GridError> {
        self.counters.hyperbolic += 1;
        self.hyperbolic.evaluate(
            hyp,
            u,
            self.model.as_ref(),
            self.recon.as_mut(),
            &self.coords,
            limiting,
        )
    }

    /// Parabolic term of `u`; `u` must have refreshed ghost layers.
    pub fn parabolic(&mut self, par: &mut Field, u: &Field) -> Result<(), GridError> {
        self.counters.parabolic += 1;
        self.parabolic.evaluate(
            par,
            u,
            self.model.as_ref(),
            &self.coords,
            &self.halo,
            &self.comm,
            self.iblank.as_ref(),
        )
    }

    /// Model source plus sponge forcing of `u`.
    pub fn source(&mut self, source: &mut Field, u: &Field) -> Result<(), GridError> {
        self.counters.source += 1;
        evaluate_source(source, u, self.model.as_ref(), &self.zones, &self.coords)
    }

    /// Forget the reconstruction weights stored by earlier `Recompute` calls.
    pub fn clear_frozen_weights(&mut self) {
        self.recon.clear_frozen();
    }

    /// `rhs = -hyp(u) + par(u) + source(u)`; `u` must have refreshed ghost layers.
    pub fn rhs(&mut self, rhs: &mut Field, u: &Field, limiting: Limiting) -> Result<(), GridError> {
        self.layout.check_len(rhs.as_slice().len())?;
        let model = self.model.as_ref();
        self.hyperbolic.evaluate(
            &mut self.hyp,
            u,
            model,
            self.recon.as_mut(),
            &self.coords,
            limiting,
        )?;
        self.parabolic.evaluate(
            &mut self.par,
            u,
            model,
            &self.coords,
            &self.halo,
            &self.comm,
            self.iblank.as_ref(),
        )?;
        evaluate_source(&mut self.source, u, model, &self.zones, &self.coords)?;
        assemble_rhs(rhs, &self.hyp, &self.par, &self.source)?;
        let c = &mut self.counters;
        c.hyperbolic += 1;
        c.parabolic += 1;
        c.source += 1;
        c.rhs += 1;
        Ok(())
    }
}
