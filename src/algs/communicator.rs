//! Thin façade over intra-process (threads) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! Sends are posted immediately; receive handles are **waitable** and the
//! halo exchange calls `.wait()` before it trusts that a buffer is ready.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};

/// Point-to-point communication interface used by the halo exchange.
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive of an expected `len` bytes from `peer`. The payload is
    /// returned as sent; checking its length is up to the caller.
    fn irecv(&self, peer: usize, tag: u16, len: usize) -> Self::RecvHandle;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Message tag namespace for one communication epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(base: u16) -> Self {
        Self(base)
    }

    #[inline]
    pub fn base(self) -> u16 {
        self.0
    }

    /// Tag `k` slots after the base.
    #[inline]
    pub fn offset(self, k: u16) -> Self {
        Self(self.0.wrapping_add(k))
    }
}

/// Compile-time no-op comm for pure serial runs: a single rank, no neighbours.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _len: usize) {}

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
}

// --- RayonComm: ranks as threads of one process ---
type Key = (u64, usize, usize, u16); // (world, src, dst, tag)

static MAILBOX: Lazy<DashMap<Key, VecDeque<Bytes>>> = Lazy::new(DashMap::new);
static DELIVERED: Lazy<(Mutex<()>, Condvar)> = Lazy::new(|| (Mutex::new(()), Condvar::new()));
static NEXT_WORLD: AtomicU64 = AtomicU64::new(1);

/// How long a thread-rank waits for a message before declaring the exchange failed.
const RECV_TIMEOUT: Duration = Duration::from_secs(30);

/// In-process communicator: every rank is a thread, messages travel through a
/// shared mailbox. Each call to [`RayonComm::world`] opens an isolated world, so
/// independent groups of ranks never see each other's traffic.
#[derive(Clone, Debug)]
pub struct RayonComm {
    world: u64,
    rank: usize,
    size: usize,
}

impl RayonComm {
    /// Create the `size` rank handles of a fresh world.
    pub fn world(size: usize) -> Vec<RayonComm> {
        let world = NEXT_WORLD.fetch_add(1, Ordering::Relaxed);
        (0..size)
            .map(|rank| RayonComm { world, rank, size })
            .collect()
    }
}

/// Pending receive on a [`RayonComm`].
pub struct LocalHandle {
    key: Key,
    len: usize,
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        let deadline = Instant::now() + RECV_TIMEOUT;
        loop {
            if let Some(bytes) = pop_message(&self.key) {
                if bytes.len() != self.len {
                    log::debug!(
                        "rank {} expected {} bytes from rank {}, got {}",
                        self.key.2,
                        self.len,
                        self.key.1,
                        bytes.len()
                    );
                }
                return Some(bytes.to_vec());
            }
            if Instant::now() >= deadline {
                log::warn!(
                    "receive from rank {} to rank {} (tag {:#x}) timed out",
                    self.key.1,
                    self.key.2,
                    self.key.3
                );
                return None;
            }
            let mut guard = DELIVERED.0.lock();
            DELIVERED
                .1
                .wait_for(&mut guard, Duration::from_millis(1));
        }
    }
}

fn pop_message(key: &Key) -> Option<Bytes> {
    let mut entry = MAILBOX.get_mut(key)?;
    let msg = entry.pop_front();
    let now_empty = entry.is_empty();
    drop(entry);
    if now_empty {
        MAILBOX.remove_if(key, |_, q| q.is_empty());
    }
    msg
}

impl Communicator for RayonComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        let key = (self.world, self.rank, peer, tag);
        MAILBOX
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
        let _guard = DELIVERED.0.lock();
        DELIVERED.1.notify_all();
    }

    fn irecv(&self, peer: usize, tag: u16, len: usize) -> LocalHandle {
        LocalHandle {
            key: (self.world, peer, self.rank, tag),
            len,
        }
    }

    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use std::sync::Arc;

    use mpi::environment::Universe;
    use mpi::request::{Request, StaticScope};
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// Communicator over `MPI_COMM_WORLD`.
    #[derive(Clone)]
    pub struct MpiComm {
        _universe: Arc<Universe>,
        world: Arc<SimpleCommunicator>,
        rank: usize,
        size: usize,
    }

    impl MpiComm {
        /// Initialize MPI; `None` if it was already initialized elsewhere.
        pub fn new() -> Option<Self> {
            let universe = mpi::initialize()?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Some(Self {
                _universe: Arc::new(universe),
                world: Arc::new(world),
                rank,
                size,
            })
        }
    }

    /// In-flight send; owns its buffer until completion.
    pub struct MpiSendHandle {
        request: Request<'static, [u8], StaticScope>,
        buffer: *mut [u8],
    }

    impl Wait for MpiSendHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.request.wait();
            // SAFETY: the buffer was leaked in `isend` and the request that
            // borrowed it has completed.
            drop(unsafe { Box::from_raw(self.buffer) });
            None
        }
    }

    /// Deferred receive; the blocking receive happens in `wait`, after all
    /// sends of the epoch have been posted.
    pub struct MpiRecvHandle {
        world: Arc<SimpleCommunicator>,
        peer: i32,
        tag: i32,
    }

    impl Wait for MpiRecvHandle {
        fn wait(self) -> Option<Vec<u8>> {
            let (data, _status) = self
                .world
                .process_at_rank(self.peer)
                .receive_vec_with_tag::<u8>(self.tag);
            Some(data)
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiSendHandle;
        type RecvHandle = MpiRecvHandle;

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiSendHandle {
            let leaked: &'static mut [u8] = Box::leak(buf.to_vec().into_boxed_slice());
            let buffer: *mut [u8] = leaked;
            // SAFETY: `buffer` stays alive until `MpiSendHandle::wait` reclaims it.
            let data: &'static [u8] = unsafe { &*buffer };
            let request = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, data, tag as i32);
            MpiSendHandle { request, buffer }
        }

        fn irecv(&self, peer: usize, tag: u16, _len: usize) -> MpiRecvHandle {
            MpiRecvHandle {
                world: self.world.clone(),
                peer: peer as i32,
                tag: tag as i32,
            }
        }

        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_ranks_roundtrip() {
        let comms = RayonComm::world(2);
        let (c0, c1) = (comms[0].clone(), comms[1].clone());

        let recv = c1.irecv(0, 7, 4);
        c0.isend(1, 7, &[1, 2, 3, 4]).wait();
        let data = recv.wait().expect("Expected to receive data from rank 0");
        assert_eq!(data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn worlds_are_isolated() {
        let a = RayonComm::world(2);
        let b = RayonComm::world(2);
        a[0].isend(1, 3, &[10]);
        b[0].isend(1, 3, &[20]);
        assert_eq!(b[1].irecv(0, 3, 1).wait(), Some(vec![20]));
        assert_eq!(a[1].irecv(0, 3, 1).wait(), Some(vec![10]));
    }

    #[test]
    fn messages_with_same_tag_arrive_in_order() {
        let c = RayonComm::world(2);
        for i in 0..5u8 {
            c[0].isend(1, 9, &[i]);
        }
        let got: Vec<u8> = (0..5).map(|_| c[1].irecv(0, 9, 1).wait().unwrap()[0]).collect();
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn no_comm_is_single_rank() {
        let comm = NoComm;
        assert_eq!((comm.rank(), comm.size()), (0, 1));
        assert!(comm.irecv(0, 1, 8).wait().is_none());
    }

    #[test]
    fn oversized_message_is_delivered_whole() {
        use crate::algs::wire::{cast_slice, decode_halo, halo_bytes};
        use crate::grid_error::GridError;

        let c = RayonComm::world(2);
        c[0].isend(1, 5, cast_slice(&[1.0f64, 2.0, 3.0]));
        let raw = c[1].irecv(0, 5, halo_bytes(2)).wait().unwrap();
        assert_eq!(raw.len(), halo_bytes(3));
        assert_eq!(
            decode_halo(&raw, 2, 0),
            Err(GridError::HaloSizeMismatch {
                neighbor: 0,
                expected: 16,
                found: 24
            })
        );
    }
}
