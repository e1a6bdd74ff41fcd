//! Thin façade over intra-process (Rayon) or inter-process (MPI) message passing.
//!
//! Messages are contiguous byte slices. Every handle must be `.wait()`ed;
//! the exchange stages drain all of them before returning, even on error.
//! Delivery between one `(src, dst, tag)` triple is in posting order.

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Non-blocking communication interface.
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive of at most `buf.len()` bytes from `peer`. The payload is
    /// returned by [`Wait::wait`]; `buf` is only used for its length.
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    fn is_no_comm(&self) -> bool {
        false
    }
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

/// Message tag. Each collective operation reserves a small block of
/// consecutive tags starting at its base.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }
    pub const fn as_u16(self) -> u16 {
        self.0
    }
    pub const fn base(self) -> u16 {
        self.0
    }
    /// Tag `k` slots after this one (wrapping).
    pub const fn offset(self, k: u16) -> Self {
        Self(self.0.wrapping_add(k))
    }
}

/// Tags for the two phases of a count-then-payload exchange.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ExchangeCommTags {
    pub sizes: CommTag,
    pub data: CommTag,
}

impl ExchangeCommTags {
    pub const fn from_base(base: CommTag) -> Self {
        Self {
            sizes: base,
            data: base.offset(1),
        }
    }
}

/// Single-rank communicator: every operation is a no-op.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) -> Self::SendHandle {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) -> Self::RecvHandle {}

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn is_no_comm(&self) -> bool {
        true
    }
}

// --- RayonComm: intra-process / multi-thread ---
type Key = (usize, usize, u16); // (src, dst, tag)

static MAILBOX: Lazy<DashMap<Key, VecDeque<Bytes>>> = Lazy::new(DashMap::new);

/// Pending receive on the in-process mailbox; polls on `wait`.
pub struct LocalHandle {
    key: Key,
    max_len: usize,
    timeout: Option<Duration>,
}

impl LocalHandle {
    fn try_take(&self) -> Option<Bytes> {
        let msg = MAILBOX.get_mut(&self.key)?.pop_front();
        if msg.is_some() {
            MAILBOX.remove_if(&self.key, |_, q| q.is_empty());
        }
        msg
    }
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        let start = Instant::now();
        loop {
            if let Some(bytes) = self.try_take() {
                if bytes.len() > self.max_len {
                    log::warn!(
                        "RayonComm: message {:?} has {} bytes, receive posted for {}",
                        self.key,
                        bytes.len(),
                        self.max_len
                    );
                }
                return Some(bytes.to_vec());
            }
            if self.timeout.is_some_and(|t| start.elapsed() > t) {
                log::warn!("RayonComm: receive {:?} timed out", self.key);
                return None;
            }
            std::thread::yield_now();
        }
    }
}

/// Ranks living as threads of one process, talking through a process-wide
/// mailbox. Concurrent groups in one process must use disjoint tags.
#[derive(Clone, Debug)]
pub struct RayonComm {
    rank: usize,
    size: usize,
    timeout: Option<Duration>,
}

impl RayonComm {
    pub fn new(rank: usize, size: usize) -> Self {
        Self {
            rank,
            size,
            timeout: None,
        }
    }

    /// Receives give up (returning no data) after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Communicator for RayonComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        MAILBOX
            .entry((self.rank, peer, tag))
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle {
        LocalHandle {
            key: (peer, self.rank, tag),
            max_len: buf.len(),
            timeout: self.timeout,
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
    use super::{Communicator, Wait};
    use crate::sparsity_error::SparsityError;
    use mpi::environment::Universe;
    use mpi::request::{Request, StaticScope};
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{Communicator as MpiCommunicator, Destination, Source};
    use std::rc::Rc;

    /// World communicator. Sends are posted immediately; receives are matched
    /// when waited on, so posting every send before any wait cannot deadlock.
    pub struct MpiComm {
        world: Rc<SimpleCommunicator>,
        rank: usize,
        size: usize,
        // declared last: MPI is finalized after the communicator is released
        _universe: Option<Universe>,
    }

    impl MpiComm {
        /// Initialize MPI; finalized when the returned value is dropped.
        pub fn new() -> Result<Self, SparsityError> {
            let universe = mpi::initialize().ok_or_else(|| {
                SparsityError::Configuration("MPI is already initialized".into())
            })?;
            let world = universe.world();
            Ok(Self::wrap(Some(universe), world))
        }

        /// Attach to an MPI environment initialized by the caller.
        pub fn from_world(world: SimpleCommunicator) -> Self {
            Self::wrap(None, world)
        }

        fn wrap(universe: Option<Universe>, world: SimpleCommunicator) -> Self {
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Self {
                world: Rc::new(world),
                rank,
                size,
                _universe: universe,
            }
        }

        pub fn world(&self) -> &SimpleCommunicator {
            &self.world
        }
    }

    pub struct MpiSendHandle {
        req: Request<'static, [u8], StaticScope>,
        buf: *mut [u8],
    }

    impl Wait for MpiSendHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.req.wait();
            // SAFETY: `buf` came from `Box::into_raw` in `isend` and the
            // request reading it has completed.
            drop(unsafe { Box::from_raw(self.buf) });
            None
        }
    }

    pub struct MpiRecvHandle {
        world: Rc<SimpleCommunicator>,
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
            let raw: *mut [u8] = Box::into_raw(buf.to_vec().into_boxed_slice());
            // SAFETY: the allocation stays alive until `MpiSendHandle::wait`
            // has completed the request and frees it.
            let data: &'static [u8] = unsafe { &*raw };
            let req = self
                .world
                .process_at_rank(peer as i32)
                .immediate_send_with_tag(StaticScope, data, tag as i32);
            MpiSendHandle { req, buf: raw }
        }

        fn irecv(&self, peer: usize, tag: u16, _buf: &mut [u8]) -> MpiRecvHandle {
            MpiRecvHandle {
                world: Rc::clone(&self.world),
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
