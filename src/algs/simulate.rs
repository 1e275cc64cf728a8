//! Drive every rank of a process group inside one process.
//!
//! [`run_ranks`] calls each rank in turn on the current thread, coordinator
//! first. Mailbox sends never block, so by the time a receiving rank runs,
//! everything addressed to it has been posted; receives are immediate, and a
//! message that is not there is reported as an error instead of hanging.
//! [`run_ranks_threaded`] gives each rank its own thread with blocking receives.

use crate::algs::communicator::{MailboxComm, MessageRecord, RecvMode};

/// Outcome of a simulated collective.
#[derive(Debug)]
pub struct SimulationRun<T> {
    /// Per-rank results, indexed by rank.
    pub results: Vec<T>,
    /// Every send of the run, in posting order.
    pub trace: Vec<MessageRecord>,
    /// Messages sent but never received.
    pub undelivered: usize,
}

impl<T> SimulationRun<T> {
    /// Sends from `src` to `dst`, in posting order.
    pub fn messages_between(&self, src: usize, dst: usize) -> impl Iterator<Item = &MessageRecord> + '_ {
        self.trace
            .iter()
            .filter(move |m| m.src == src && m.dst == dst)
    }
}

/// Run `f` for ranks `0..size` on one thread: `first` before all others,
/// the rest in ascending rank order.
pub fn run_ranks<T, F>(size: usize, first: usize, mut f: F) -> SimulationRun<T>
where
    F: FnMut(&MailboxComm) -> T,
{
    let comms: Vec<MailboxComm> = MailboxComm::group(size)
        .into_iter()
        .map(|c| c.with_mode(RecvMode::Immediate))
        .collect();
    let order = std::iter::once(first).chain((0..size).filter(|&r| r != first));
    let mut results: Vec<Option<T>> = (0..size).map(|_| None).collect();
    for rank in order {
        results[rank] = Some(f(&comms[rank]));
    }
    finish(&comms, results)
}

/// Run `f` for ranks `0..size`, one scoped thread per rank, blocking receives.
///
/// A protocol mismatch here hangs, as it would on a real process group.
pub fn run_ranks_threaded<T, F>(size: usize, f: F) -> SimulationRun<T>
where
    T: Send,
    F: Fn(&MailboxComm) -> T + Sync,
{
    let comms = MailboxComm::group(size);
    let results: Vec<Option<T>> = std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .iter()
            .map(|comm| {
                let f = &f;
                s.spawn(move || f(comm))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(v) => Some(v),
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });
    finish(&comms, results)
}

fn finish<T>(comms: &[MailboxComm], results: Vec<Option<T>>) -> SimulationRun<T> {
    let (trace, undelivered) = comms
        .first()
        .map(|c| (c.trace(), c.pending()))
        .unwrap_or_default();
    SimulationRun {
        results: results.into_iter().flatten().collect(),
        trace,
        undelivered,
    }
}
