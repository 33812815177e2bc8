//! Forced progress for a ticket whose slot will not turn over.
//!
//! A producer stuck behind an undrained slot discards the item at the head of
//! the queue. A consumer stuck behind an unwritten slot injects a `None`
//! placeholder. Both lose fidelity: the discarded item is gone, and the
//! placeholder reaches some consumer as `Ok((None, _))`. Neither is reported
//! through a return value; every activation is counted in [`EscapeStats`] and
//! logged at `warn`.
//!
//! The valve only touches a position whose slot has already turned over, so
//! its own get or put completes without waiting. A producer therefore never
//! discards its own unwritten ticket, and a stuck thread is never set waiting
//! on a second slot.

use tracing::warn;

use crate::queue::Queue;
use crate::sync::{AtomicUsize, Ordering};

/// Running totals of escape-valve activations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscapeStats {
    /// Items (real or placeholder) thrown away by stuck producers.
    pub discarded: usize,
    /// Placeholders injected by stuck consumers.
    pub placeholders: usize,
}

pub(crate) struct EscapeValve {
    enabled: bool,
    discarded: AtomicUsize,
    placeholders: AtomicUsize,
}

impl EscapeValve {
    pub(crate) fn new(enabled: bool) -> Self {
        EscapeValve {
            enabled,
            discarded: AtomicUsize::new(0),
            placeholders: AtomicUsize::new(0),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl<T> Queue<T> {
    /// Escape-valve activations so far.
    pub fn escape_stats(&self) -> EscapeStats {
        EscapeStats {
            discarded: self.valve.discarded.load(Ordering::Relaxed),
            placeholders: self.valve.placeholders.load(Ordering::Relaxed),
        }
    }

    /// Drop the queue head on behalf of the producer holding `ticket`.
    pub(crate) fn relieve_producer(&self, ticket: usize) -> bool {
        if !self.valve.enabled {
            return false;
        }
        match self.take_ready_head() {
            Some((discarded, count)) => {
                self.valve.discarded.fetch_add(1, Ordering::Relaxed);
                warn!(
                    ticket,
                    count,
                    placeholder = discarded.is_none(),
                    "escape valve discarded the queue head"
                );
                true
            }
            None => false,
        }
    }

    /// Inject a placeholder on behalf of the consumer holding `ticket`.
    pub(crate) fn relieve_consumer(&self, ticket: usize) -> bool {
        if !self.valve.enabled {
            return false;
        }
        match self.put_ready_placeholder() {
            Some(count) => {
                self.valve.placeholders.fetch_add(1, Ordering::Relaxed);
                warn!(ticket, count, "escape valve injected a placeholder");
                true
            }
            None => false,
        }
    }
}
