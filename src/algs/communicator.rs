//! Thin façade over intra-process (mailbox) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! All handles are **waitable**; the distribution protocol calls `.wait()`
//! on every handle before it posts the next message, which makes each
//! exchange behave like a blocking send/receive pair.

use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Message tag; the protocol derives one tag per message kind from a base tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(v: u16) -> Self {
        CommTag(v)
    }
    pub const fn as_u16(self) -> u16 {
        self.0
    }
    /// Tag `k` slots above this one.
    pub const fn offset(self, k: u16) -> Self {
        CommTag(self.0.wrapping_add(k))
    }
}

/// Base tag of hyperedge distribution traffic.
pub const HYPEREDGE_TAG: CommTag = CommTag::new(0x4800);

/// Point-to-point communication interface (minimal by design).
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive; `buf.len()` is the expected message size.
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;

    fn rank(&self) -> usize;
    fn size(&self) -> usize;
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received message (if any), untruncated.
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Compile-time no-op comm for pure serial runs: rank 0 of a group of one.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
}

// --- MailboxComm: intra-process, one thread or many ---
type Key = (usize, usize, u16); // (src, dst, tag)

/// One delivered send, as recorded by a [`MailboxComm`] group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageRecord {
    pub src: usize,
    pub dst: usize,
    pub tag: u16,
    pub len: usize,
}

#[derive(Default)]
struct Mailbox {
    slots: DashMap<Key, VecDeque<Bytes>>,
    trace: Mutex<Vec<MessageRecord>>,
}

impl Mailbox {
    fn post(&self, key: Key, data: Bytes) {
        self.trace.lock().push(MessageRecord {
            src: key.0,
            dst: key.1,
            tag: key.2,
            len: data.len(),
        });
        self.slots.entry(key).or_default().push_back(data);
    }

    fn take(&self, key: &Key) -> Option<Bytes> {
        self.slots.get_mut(key).and_then(|mut q| q.pop_front())
    }

    fn pending(&self) -> usize {
        self.slots.iter().map(|q| q.len()).sum()
    }
}

static GLOBAL_MAILBOX: Lazy<Arc<Mailbox>> = Lazy::new(|| Arc::new(Mailbox::default()));

/// How a [`MailboxComm`] receive waits for its message.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RecvMode {
    /// Spin until the message arrives (ranks on separate threads).
    #[default]
    Blocking,
    /// Return `None` if the message is not already there (all ranks on one
    /// thread, senders run first). A missing message is a protocol mismatch.
    Immediate,
}

pub struct MailboxHandle {
    mailbox: Arc<Mailbox>,
    key: Key,
    mode: RecvMode,
}

impl Wait for MailboxHandle {
    fn wait(self) -> Option<Vec<u8>> {
        loop {
            if let Some(bytes) = self.mailbox.take(&self.key) {
                return Some(bytes.to_vec());
            }
            if self.mode == RecvMode::Immediate {
                return None;
            }
            std::thread::yield_now();
        }
    }
}

/// In-process communicator: ranks exchange messages through a shared mailbox
/// with per-(src, dst, tag) FIFO queues. Sends never block.
#[derive(Clone)]
pub struct MailboxComm {
    rank: usize,
    size: usize,
    mode: RecvMode,
    mailbox: Arc<Mailbox>,
}

impl std::fmt::Debug for MailboxComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .field("mode", &self.mode)
            .finish()
    }
}

impl MailboxComm {
    /// A rank on the process-wide mailbox shared by every `new` communicator.
    pub fn new(rank: usize, size: usize) -> Self {
        Self {
            rank,
            size,
            mode: RecvMode::Blocking,
            mailbox: Arc::clone(&GLOBAL_MAILBOX),
        }
    }

    /// All ranks of a fresh, private group.
    pub fn group(size: usize) -> Vec<Self> {
        let mailbox = Arc::new(Mailbox::default());
        (0..size)
            .map(|rank| Self {
                rank,
                size,
                mode: RecvMode::Blocking,
                mailbox: mailbox.clone(),
            })
            .collect()
    }

    pub fn with_mode(mut self, mode: RecvMode) -> Self {
        self.mode = mode;
        self
    }

    /// Every send posted so far in this communicator's group, in posting order.
    pub fn trace(&self) -> Vec<MessageRecord> {
        self.mailbox.trace.lock().clone()
    }

    /// Messages sent but not yet received anywhere in the group.
    pub fn pending(&self) -> usize {
        self.mailbox.pending()
    }
}

impl Communicator for MailboxComm {
    type SendHandle = ();
    type RecvHandle = MailboxHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        log::trace!("mailbox {} -> {peer} tag {tag:#x}: {} bytes", self.rank, buf.len());
        self.mailbox
            .post((self.rank, peer, tag), Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, _buf: &mut [u8]) -> MailboxHandle {
        MailboxHandle {
            mailbox: self.mailbox.clone(),
            key: (peer, self.rank, tag),
            mode: self.mode,
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
    use crate::hyperdist_error::HyperdistError;
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{Communicator as MpiCommunicator, Destination, Source};

    /// MPI communicator over `MPI_COMM_WORLD`. Sends and receives are blocking.
    pub struct MpiComm {
        // Field order matters: the world handle must drop before the universe finalizes MPI.
        world: SimpleCommunicator,
        _universe: Universe,
        rank: usize,
        size: usize,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, HyperdistError> {
            let universe = mpi::initialize().ok_or(HyperdistError::MpiInit)?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                _universe: universe,
                rank,
                size,
            })
        }

        pub fn world(&self) -> &SimpleCommunicator {
            &self.world
        }
    }

    pub struct MpiRecvHandle(Vec<u8>);

    impl Wait for MpiRecvHandle {
        fn wait(self) -> Option<Vec<u8>> {
            Some(self.0)
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = ();
        type RecvHandle = MpiRecvHandle;

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
            self.world
                .process_at_rank(peer as i32)
                .send_with_tag(buf, i32::from(tag));
        }

        fn irecv(&self, peer: usize, tag: u16, _buf: &mut [u8]) -> MpiRecvHandle {
            let (data, _status) = self
                .world
                .process_at_rank(peer as i32)
                .receive_vec_with_tag::<u8>(i32::from(tag));
            MpiRecvHandle(data)
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
