//! Halo exchange: refresh ghost layers from neighbouring subdomains.
//!
//! Ranks form a Cartesian process grid. Exchange runs dimension by dimension:
//! for each dimension every rank posts its receives, sends the `ghosts`-deep
//! layer of interior points adjacent to each neighbour, then waits. The slabs
//! span the full padded range of the other dimensions, so once all dimensions
//! are done the corner ghosts are consistent as well.
//!
//! A failure on any rank is agreed on through a global reduction at the end of
//! each exchange, so every rank leaves the exchange with an error.
//!
//! Ghost layers are a read-only mirror: they are overwritten wholesale here and
//! by boundary conditions, never patched point-wise by operators.

use serde::{Deserialize, Serialize};

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::reduction::global_sum;
use crate::algs::wire::{cast_slice, decode_halo, halo_bytes};
use crate::grid::{Field, GridLayout, IndexBox};
use crate::grid_error::GridError;

/// Face of a subdomain along one dimension.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Low,
    High,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Low, Side::High];

    #[inline]
    fn slot(self) -> u16 {
        match self {
            Side::Low => 0,
            Side::High => 1,
        }
    }

    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Low => Side::High,
            Side::High => Side::Low,
        }
    }
}

/// Cartesian arrangement of ranks, with periodicity flags per dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessGrid {
    iproc: Vec<usize>,
    periodic: Vec<bool>,
    rank: usize,
    ip: Vec<usize>,
}

impl ProcessGrid {
    /// `iproc[d]` ranks along dimension `d`; ranks are numbered with dimension 0 fastest.
    pub fn new(iproc: &[usize], periodic: &[bool], rank: usize) -> Result<Self, GridError> {
        if iproc.len() != periodic.len() {
            return Err(GridError::Config(format!(
                "process grid has {} dimensions but {} periodicity flags",
                iproc.len(),
                periodic.len()
            )));
        }
        if iproc.iter().any(|&n| n == 0) {
            return Err(GridError::Config("process grid extent must be positive".into()));
        }
        let nproc: usize = iproc.iter().product();
        if rank >= nproc {
            return Err(GridError::Config(format!(
                "rank {rank} outside a process grid of {nproc} ranks"
            )));
        }
        let mut ip = Vec::with_capacity(iproc.len());
        let mut r = rank;
        for &n in iproc {
            ip.push(r % n);
            r /= n;
        }
        Ok(Self {
            iproc: iproc.to_vec(),
            periodic: periodic.to_vec(),
            rank,
            ip,
        })
    }

    /// Single-rank grid.
    pub fn serial(periodic: &[bool]) -> Self {
        Self {
            iproc: vec![1; periodic.len()],
            periodic: periodic.to_vec(),
            rank: 0,
            ip: vec![0; periodic.len()],
        }
    }

    pub fn ndims(&self) -> usize {
        self.iproc.len()
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn nproc(&self) -> usize {
        self.iproc.iter().product()
    }

    pub fn iproc(&self) -> &[usize] {
        &self.iproc
    }

    /// This rank's position in the process grid.
    pub fn coords(&self) -> &[usize] {
        &self.ip
    }

    pub fn is_periodic(&self, dir: usize) -> bool {
        self.periodic[dir]
    }

    fn rank_of(&self, ip: &[usize]) -> usize {
        let mut r = 0;
        let mut stride = 1;
        for (d, &i) in ip.iter().enumerate() {
            r += i * stride;
            stride *= self.iproc[d];
        }
        r
    }

    /// Neighbour rank across `side` of dimension `dir`; `None` on a
    /// non-periodic physical boundary. May be this rank itself.
    pub fn neighbor(&self, dir: usize, side: Side) -> Option<usize> {
        let n = self.iproc[dir];
        let i = self.ip[dir];
        let j = match side {
            Side::Low if i > 0 => i - 1,
            Side::Low if self.periodic[dir] => n - 1,
            Side::High if i + 1 < n => i + 1,
            Side::High if self.periodic[dir] => 0,
            _ => return None,
        };
        let mut ip = self.ip.clone();
        ip[dir] = j;
        Some(self.rank_of(&ip))
    }

    /// Whether `side` of dimension `dir` lies on the global domain boundary.
    pub fn touches_boundary(&self, dir: usize, side: Side) -> bool {
        match side {
            Side::Low => self.ip[dir] == 0,
            Side::High => self.ip[dir] + 1 == self.iproc[dir],
        }
    }

    /// Block partition of `global` points: returns this rank's local extents
    /// and the global index of its first point. Remainders go to low ranks.
    pub fn partition(&self, global: &[usize]) -> Result<(Vec<usize>, Vec<usize>), GridError> {
        if global.len() != self.ndims() {
            return Err(GridError::Config(format!(
                "global grid has {} dimensions, process grid {}",
                global.len(),
                self.ndims()
            )));
        }
        let mut local = Vec::with_capacity(global.len());
        let mut start = Vec::with_capacity(global.len());
        for d in 0..global.len() {
            let (n, p, i) = (global[d], self.iproc[d], self.ip[d]);
            if n < p {
                return Err(GridError::Config(format!(
                    "dimension {d}: {n} points cannot be split over {p} ranks"
                )));
            }
            let base = n / p;
            let rem = n % p;
            local.push(base + usize::from(i < rem));
            start.push(i * base + i.min(rem));
        }
        Ok((local, start))
    }
}

/// Ghost-layer synchronization for fields on one rank's subdomain.
#[derive(Clone, Debug)]
pub struct HaloExchange {
    grid: ProcessGrid,
    tag: CommTag,
}

impl HaloExchange {
    pub fn new(grid: ProcessGrid) -> Self {
        Self {
            grid,
            tag: CommTag::new(0x4A10),
        }
    }

    pub fn process_grid(&self) -> &ProcessGrid {
        &self.grid
    }

    /// Check that the communicator matches the process grid.
    pub fn check_comm<C: Communicator>(&self, comm: &C) -> Result<(), GridError> {
        if comm.size() != self.grid.nproc() || comm.rank() != self.grid.rank() {
            return Err(GridError::Config(format!(
                "communicator (rank {} of {}) does not match process grid (rank {} of {})",
                comm.rank(),
                comm.size(),
                self.grid.rank(),
                self.grid.nproc()
            )));
        }
        Ok(())
    }

    fn tag_for(&self, dir: usize, travel: Side) -> u16 {
        self.tag.offset(2 * dir as u16 + travel.slot()).base()
    }

    /// Refresh every ghost layer of `field` that faces a neighbour.
    ///
    /// Ghosts on non-periodic physical boundaries are left untouched.
    pub fn exchange<C: Communicator>(&self, comm: &C, field: &mut Field) -> Result<(), GridError> {
        let layout = field.layout().clone();
        if layout.ndims() != self.grid.ndims() {
            return Err(GridError::Config(format!(
                "field has {} dimensions, process grid {}",
                layout.ndims(),
                self.grid.ndims()
            )));
        }
        if layout.ghosts() == 0 {
            return Ok(());
        }
        // Every message is still sent and received after a local failure, so
        // that no peer is left waiting on this rank.
        let mut failure = self.check_thickness(&layout).err();
        for dir in 0..layout.ndims() {
            if let Err(e) = self.exchange_dir(comm, &layout, dir, field) {
                failure.get_or_insert(e);
            }
        }
        self.agree(comm, failure)?;
        log::trace!("halo exchange done on rank {}", self.grid.rank());
        Ok(())
    }

    /// A slab sent to a neighbour must lie inside the interior.
    fn check_thickness(&self, layout: &GridLayout) -> Result<(), GridError> {
        for dir in 0..layout.ndims() {
            let points = layout.dim_local()[dir];
            let linked = Side::BOTH
                .iter()
                .any(|&side| self.grid.neighbor(dir, side).is_some());
            if linked && points < layout.ghosts() {
                return Err(GridError::SubdomainTooThin {
                    dim: dir,
                    points,
                    ghosts: layout.ghosts(),
                });
            }
        }
        Ok(())
    }

    /// Combine the local outcome with every other rank's.
    fn agree<C: Communicator>(&self, comm: &C, local: Option<GridError>) -> Result<(), GridError> {
        if comm.size() == 1 {
            return local.map_or(Ok(()), Err);
        }
        if let Some(e) = &local {
            log::warn!("halo exchange failed on rank {}: {e}", self.grid.rank());
        }
        let failed = global_sum(comm, if local.is_some() { 1.0 } else { 0.0 })?;
        match local {
            Some(e) => Err(e),
            None if failed > 0.0 => Err(GridError::PeerFailure {
                failed: failed.round() as usize,
            }),
            None => Ok(()),
        }
    }

    fn exchange_dir<C: Communicator>(
        &self,
        comm: &C,
        layout: &GridLayout,
        dir: usize,
        field: &mut Field,
    ) -> Result<(), GridError> {
        let me = self.grid.rank();
        let count = slab_count(layout, dir);

        // Post receives: ghosts on `side` are filled by the neighbour there,
        // whose message travels toward the opposite side.
        let mut pending = Vec::with_capacity(2);
        for side in Side::BOTH {
            match self.grid.neighbor(dir, side) {
                Some(nbr) if nbr != me => {
                    let h = comm.irecv(nbr, self.tag_for(dir, side.opposite()), halo_bytes(count));
                    pending.push((side, nbr, h));
                }
                _ => {}
            }
        }

        let mut sends = Vec::with_capacity(2);
        for side in Side::BOTH {
            let Some(nbr) = self.grid.neighbor(dir, side) else {
                continue;
            };
            let buf = pack(field, &send_slab(layout, dir, side));
            if nbr == me {
                // Periodic with a single rank along `dir`: our own high layer
                // feeds our low ghosts and vice versa.
                unpack(field, &ghost_slab(layout, dir, side.opposite()), &buf);
            } else {
                sends.push(comm.isend(nbr, self.tag_for(dir, side), cast_slice(&buf)));
            }
        }

        let mut outcome = Ok(());
        for (side, nbr, h) in pending {
            let received = h
                .wait()
                .ok_or_else(|| GridError::CommError {
                    neighbor: nbr,
                    reason: format!("no halo data received along dimension {dir}"),
                })
                .and_then(|raw| decode_halo(&raw, count, nbr));
            match received {
                Ok(vals) => unpack(field, &ghost_slab(layout, dir, side), &vals),
                Err(e) if outcome.is_ok() => outcome = Err(e),
                Err(_) => {}
            }
        }
        for s in sends {
            s.wait();
        }
        outcome
    }

    /// Fill ghosts along `dir` on faces without a neighbour by copying the
    /// nearest physical layer (zero-gradient extrapolation).
    pub fn extrapolate_physical_ghosts(&self, field: &mut Field, dir: usize) {
        let layout = field.layout().clone();
        let g = layout.ghosts() as isize;
        let n = layout.dim_local()[dir] as isize;
        for side in Side::BOTH {
            if self.grid.neighbor(dir, side).is_some() {
                continue;
            }
            let (edge, ghost_range) = match side {
                Side::Low => (0, -g..0),
                Side::High => (n - 1, n..n + g),
            };
            let slab = layout.padded().with_slab(dir, edge, edge + 1);
            slab.for_each(|i| {
                let src = field.at(i).to_vec();
                let mut j = i.to_vec();
                for k in ghost_range.clone() {
                    j[dir] = k;
                    field.at_mut(&j).copy_from_slice(&src);
                }
            });
        }
    }
}

/// Number of values in one halo slab along `dir`.
fn slab_count(layout: &GridLayout, dir: usize) -> usize {
    let pts: usize = layout
        .padded_dims()
        .iter()
        .enumerate()
        .map(|(d, &n)| if d == dir { layout.ghosts() } else { n })
        .product();
    pts * layout.nvars()
}

/// Interior layer next to `side`, sent to the neighbour on that side.
fn send_slab(layout: &GridLayout, dir: usize, side: Side) -> IndexBox {
    let g = layout.ghosts() as isize;
    let n = layout.dim_local()[dir] as isize;
    match side {
        Side::Low => layout.padded().with_slab(dir, 0, g),
        Side::High => layout.padded().with_slab(dir, n - g, n),
    }
}

/// Ghost layer on `side`.
fn ghost_slab(layout: &GridLayout, dir: usize, side: Side) -> IndexBox {
    let g = layout.ghosts() as isize;
    let n = layout.dim_local()[dir] as isize;
    match side {
        Side::Low => layout.padded().with_slab(dir, -g, 0),
        Side::High => layout.padded().with_slab(dir, n, n + g),
    }
}

fn pack(field: &Field, slab: &IndexBox) -> Vec<f64> {
    let mut buf = Vec::new();
    slab.for_each(|i| buf.extend_from_slice(field.at(i)));
    buf
}

fn unpack(field: &mut Field, slab: &IndexBox, vals: &[f64]) {
    let nvars = field.layout().nvars();
    let mut k = 0;
    slab.for_each(|i| {
        field.at_mut(i).copy_from_slice(&vals[k..k + nvars]);
        k += nvars;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, RayonComm};

    #[test]
    fn neighbours_wrap_only_when_periodic() {
        let g = ProcessGrid::new(&[3, 2], &[true, false], 2).unwrap();
        assert_eq!(g.coords(), &[2, 0]);
        assert_eq!(g.neighbor(0, Side::High), Some(0));
        assert_eq!(g.neighbor(0, Side::Low), Some(1));
        assert_eq!(g.neighbor(1, Side::Low), None);
        assert_eq!(g.neighbor(1, Side::High), Some(5));
        assert!(g.touches_boundary(0, Side::High));
    }

    #[test]
    fn partition_spreads_remainder_over_low_ranks() {
        let g = ProcessGrid::new(&[3], &[false], 1).unwrap();
        assert_eq!(g.partition(&[10]).unwrap(), (vec![3], vec![4]));
        let g0 = ProcessGrid::new(&[3], &[false], 0).unwrap();
        assert_eq!(g0.partition(&[10]).unwrap(), (vec![4], vec![0]));
    }

    #[test]
    fn serial_periodic_exchange_wraps_ghosts() {
        let l = GridLayout::new(&[4], 1, 2).unwrap();
        let mut f = Field::from_fn(&l, |i, v| v[0] = i[0] as f64);
        let halo = HaloExchange::new(ProcessGrid::serial(&[true]));
        halo.exchange(&NoComm, &mut f).unwrap();
        assert_eq!(f.at(&[-2]), &[2.0]);
        assert_eq!(f.at(&[-1]), &[3.0]);
        assert_eq!(f.at(&[4]), &[0.0]);
        assert_eq!(f.at(&[5]), &[1.0]);
    }

    #[test]
    fn two_rank_exchange_fills_internal_faces() {
        let comms = RayonComm::world(2);
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                std::thread::spawn(move || {
                    let grid = ProcessGrid::new(&[2], &[false], comm.rank()).unwrap();
                    let (local, start) = grid.partition(&[8]).unwrap();
                    let l = GridLayout::new(&local, 1, 1).unwrap();
                    let mut f = Field::from_fn(&l, |i, v| {
                        v[0] = if i[0] < 0 || i[0] >= 4 { -1.0 } else { (start[0] as isize + i[0]) as f64 }
                    });
                    HaloExchange::new(grid).exchange(&comm, &mut f).unwrap();
                    (comm.rank(), f.at(&[-1])[0], f.at(&[4])[0])
                })
            })
            .collect();
        for h in handles {
            let (rank, low, high) = h.join().unwrap();
            if rank == 0 {
                assert_eq!((low, high), (-1.0, 4.0));
            } else {
                assert_eq!((low, high), (3.0, -1.0));
            }
        }
    }

    fn run_ranks<F>(n: usize, f: F) -> Vec<Result<(), GridError>>
    where
        F: Fn(RayonComm) -> Result<(), GridError> + Send + Sync + Clone + 'static,
    {
        let handles: Vec<_> = RayonComm::world(n)
            .into_iter()
            .map(|comm| {
                let f = f.clone();
                std::thread::spawn(move || f(comm))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn thin_periodic_subdomain_is_rejected() {
        let l = GridLayout::new(&[2], 1, 3).unwrap();
        let mut f = Field::from_fn(&l, |i, v| v[0] = i[0] as f64);
        let periodic = HaloExchange::new(ProcessGrid::serial(&[true]));
        assert_eq!(
            periodic.exchange(&NoComm, &mut f),
            Err(GridError::SubdomainTooThin {
                dim: 0,
                points: 2,
                ghosts: 3
            })
        );
        // Without neighbours nothing is exchanged, so a thin grid is harmless.
        let walled = HaloExchange::new(ProcessGrid::serial(&[false]));
        assert!(walled.exchange(&NoComm, &mut f).is_ok());
    }

    #[test]
    fn thin_subdomain_on_one_rank_fails_everywhere() {
        let results = run_ranks(2, |comm| {
            let grid = ProcessGrid::new(&[2], &[false], comm.rank())?;
            let (local, _) = grid.partition(&[5])?;
            let l = GridLayout::new(&local, 1, 3)?;
            let mut f = Field::from_fn(&l, |i, v| v[0] = i[0] as f64);
            HaloExchange::new(grid).exchange(&comm, &mut f)
        });
        assert_eq!(results[0], Err(GridError::PeerFailure { failed: 1 }));
        assert_eq!(
            results[1],
            Err(GridError::SubdomainTooThin {
                dim: 0,
                points: 2,
                ghosts: 3
            })
        );
    }

    #[test]
    fn mismatched_layout_fails_on_every_rank() {
        // Rank 2 carries two variables; only ranks 1 and 2 exchange with it.
        let results = run_ranks(3, |comm| {
            let grid = ProcessGrid::new(&[3], &[false], comm.rank())?;
            let nvars = if comm.rank() == 2 { 2 } else { 1 };
            let l = GridLayout::new(&[4], nvars, 1)?;
            let mut f = Field::from_fn(&l, |_, v| v.fill(1.0));
            HaloExchange::new(grid).exchange(&comm, &mut f)
        });
        assert_eq!(results[0], Err(GridError::PeerFailure { failed: 2 }));
        assert!(matches!(results[1], Err(GridError::HaloSizeMismatch { neighbor: 2, .. })));
        assert!(matches!(results[2], Err(GridError::HaloSizeMismatch { neighbor: 1, .. })));
    }

    #[test]
    fn extrapolation_copies_edge_layer() {
        let l = GridLayout::new(&[3], 1, 2).unwrap();
        let mut f = Field::from_fn(&l, |i, v| v[0] = 10.0 + i[0] as f64);
        let halo = HaloExchange::new(ProcessGrid::serial(&[false]));
        halo.extrapolate_physical_ghosts(&mut f, 0);
        assert_eq!(f.at(&[-2]), &[10.0]);
        assert_eq!(f.at(&[4]), &[12.0]);
    }
}
