use core::fmt;

use crossbeam_utils::CachePadded;
use tracing::{debug, warn};

use crate::config::{self, Config};
use crate::error::{GetError, GetFailure, PutError, PutFailure};
use crate::escape::EscapeValve;
use crate::slot::Slot;
use crate::sync::{yield_now, AtomicUsize, Ordering};

/// Stable-snapshot attempts made by [`Queue::count`] before it clamps.
const COUNT_RETRIES: usize = 8;

/// How a ticket holder waits for its slot to turn over.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Wait {
    /// Try the escape valve after `max_wait` spins.
    Escalate,
    /// Spin until the slot is ready.
    Spin,
}

/// Which head position a reservation will accept.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Admit {
    /// Any position; the slot wait comes afterwards.
    Any,
    /// Only a position whose slot has already turned over, so the holder
    /// never waits.
    Ready,
}

/// Positions won with one CAS on a position counter.
struct Reservation {
    first: usize,
    granted: usize,
    count: usize,
}

/// Bounded lock-free MPMC queue over a ring of generation-counted slots.
///
/// Every operation first wins a position ticket with a single CAS (failing
/// fast on contention), then waits on the ticket's slot until the previous
/// lap has vacated it. Occupancy never exceeds `capacity - 2`.
pub struct Queue<T> {
    put_pos: CachePadded<AtomicUsize>,
    get_pos: CachePadded<AtomicUsize>,
    slots: Box<[Slot<T>]>,
    capacity: usize,
    mask: usize,
    max_wait: usize,
    pub(crate) valve: EscapeValve,
}

impl<T> Queue<T> {
    /// Create a queue holding at least `capacity` slots, rounded up to a power
    /// of two. Zero becomes [`MIN_CAPACITY`](crate::MIN_CAPACITY).
    pub fn new(capacity: usize) -> Self {
        Self::with_config(Config::new(capacity))
    }

    /// Create a queue from explicit parameters.
    pub fn with_config(config: Config) -> Self {
        Self::starting_at(config, 0)
    }

    /// Build a queue whose position counters start at `start`.
    ///
    /// Slot `i` is primed for the first ticket after `start` that maps to it,
    /// so with `start == 0` slot 0 begins at generation `capacity` and
    /// generation 0 is never used.
    pub(crate) fn starting_at(config: Config, start: usize) -> Self {
        let capacity = config::round_capacity(config.capacity);
        let mask = capacity - 1;
        let first = start.wrapping_add(1);
        let slots: Box<[Slot<T>]> = (0..capacity)
            .map(|i| Slot::new(first.wrapping_add(i.wrapping_sub(first) & mask)))
            .collect();

        if config::usable(capacity) == 0 {
            warn!(requested = config.capacity, capacity, "queue capacity leaves no usable slots");
        }
        debug!(
            requested = config.capacity,
            capacity,
            max_wait = config.max_wait,
            escape_valve = config.escape_valve,
            "queue created"
        );

        Queue {
            put_pos: CachePadded::new(AtomicUsize::new(start)),
            get_pos: CachePadded::new(AtomicUsize::new(start)),
            slots,
            capacity,
            mask,
            max_wait: config.max_wait,
            valve: EscapeValve::new(config.escape_valve),
        }
    }

    /// Enqueue one value.
    ///
    /// Returns the occupancy including this value. Fails without retrying when
    /// the queue is at its ceiling or another producer won the reservation;
    /// the value comes back inside the error.
    pub fn put(&self, value: T) -> Result<usize, PutError<T>> {
        match self.reserve_put(1, Admit::Any) {
            Ok(r) => {
                self.fill(r.first, Some(value), Wait::Escalate);
                Ok(r.count + 1)
            }
            Err((reason, count)) => Err(PutError { value, reason, count }),
        }
    }

    /// Dequeue one value.
    ///
    /// Returns the value and the occupancy after removing it. The value is
    /// `None` only when a consumer's escape valve injected a placeholder.
    pub fn get(&self) -> Result<(Option<T>, usize), GetError> {
        let r = self
            .reserve_get(1, Admit::Any)
            .map_err(|(reason, count)| GetError { reason, count })?;
        let value = self.drain(r.first, Wait::Escalate);
        Ok((value, r.count - 1))
    }

    /// Enqueue as many values from the front of `values` as fit, reserving
    /// them with a single CAS.
    ///
    /// Admitted values are moved out of `values`; the rest stay. Returns the
    /// number written and the occupancy after the write. Writes nothing if the
    /// queue is full or the reservation race is lost.
    pub fn puts(&self, values: &mut Vec<T>) -> (usize, usize) {
        if values.is_empty() {
            return (0, self.count());
        }
        match self.reserve_put(values.len(), Admit::Any) {
            Ok(r) => {
                for (i, value) in values.drain(..r.granted).enumerate() {
                    self.fill(r.first.wrapping_add(i), Some(value), Wait::Spin);
                }
                (r.granted, r.count + r.granted)
            }
            Err((_, count)) => (0, count),
        }
    }

    /// Fill a prefix of `buf` with dequeued values, reserving them with a
    /// single CAS.
    ///
    /// Returns the number read and the occupancy after the read.
    pub fn gets(&self, buf: &mut [Option<T>]) -> (usize, usize) {
        if buf.is_empty() {
            return (0, self.count());
        }
        match self.reserve_get(buf.len(), Admit::Any) {
            Ok(r) => {
                for (i, out) in buf[..r.granted].iter_mut().enumerate() {
                    *out = self.drain(r.first.wrapping_add(i), Wait::Spin);
                }
                (r.granted, r.count - r.granted)
            }
            Err((_, count)) => (0, count),
        }
    }

    /// Slot count after rounding.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Occupancy at the moment of the call. Advisory: it can change before
    /// the caller looks at it.
    ///
    /// If consumers keep moving `get_pos` through every re-read, the last
    /// difference is clamped to the admission ceiling instead.
    pub fn count(&self) -> usize {
        let mut get_pos = self.get_pos.load(Ordering::Acquire);
        for _ in 0..COUNT_RETRIES {
            let put_pos = self.put_pos.load(Ordering::Acquire);
            let again = self.get_pos.load(Ordering::Acquire);
            if again == get_pos {
                return put_pos.wrapping_sub(get_pos);
            }
            get_pos = again;
            yield_now();
        }
        // get_pos was read first, so put_pos cannot be behind it
        let put_pos = self.put_pos.load(Ordering::Acquire);
        put_pos.wrapping_sub(get_pos).min(config::usable(self.capacity))
    }

    /// `count() == 0`.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Diagnostic one-liner with capacity, mask and both position counters.
    pub fn info(&self) -> String {
        self.to_string()
    }

    /// Take the head only if it is already published. Returns the payload and
    /// the occupancy after removing it.
    pub(crate) fn take_ready_head(&self) -> Option<(Option<T>, usize)> {
        let r = self.reserve_get(1, Admit::Ready).ok()?;
        Some((self.drain(r.first, Wait::Spin), r.count - 1))
    }

    /// Enqueue a `None` placeholder only if the next slot is already free.
    /// Returns the occupancy including it.
    pub(crate) fn put_ready_placeholder(&self) -> Option<usize> {
        let r = self.reserve_put(1, Admit::Ready).ok()?;
        self.fill(r.first, None, Wait::Spin);
        Some(r.count + 1)
    }

    fn reserve_put(&self, wanted: usize, admit: Admit) -> Result<Reservation, (PutFailure, usize)> {
        let get_pos = self.get_pos.load(Ordering::Acquire);
        let put_pos = self.put_pos.load(Ordering::Acquire);
        let count = put_pos.wrapping_sub(get_pos);

        let room = config::usable(self.capacity).saturating_sub(count);
        if room == 0 {
            yield_now();
            return Err((PutFailure::Full, count));
        }

        let first = put_pos.wrapping_add(1);
        if admit == Admit::Ready && !self.slot(first).can_put(first) {
            yield_now();
            return Err((PutFailure::Busy, count));
        }

        let granted = wanted.min(room);
        if self
            .put_pos
            .compare_exchange(
                put_pos,
                put_pos.wrapping_add(granted),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_err()
        {
            yield_now();
            return Err((PutFailure::Busy, count));
        }
        Ok(Reservation { first, granted, count })
    }

    fn reserve_get(&self, wanted: usize, admit: Admit) -> Result<Reservation, (GetFailure, usize)> {
        let get_pos = self.get_pos.load(Ordering::Acquire);
        let put_pos = self.put_pos.load(Ordering::Acquire);
        let count = put_pos.wrapping_sub(get_pos);

        if count == 0 {
            yield_now();
            return Err((GetFailure::Empty, count));
        }
        let first = get_pos.wrapping_add(1);
        if admit == Admit::Ready && !self.slot(first).can_get(first, self.capacity) {
            yield_now();
            return Err((GetFailure::Busy, count));
        }

        let granted = wanted.min(count);
        if self
            .get_pos
            .compare_exchange(
                get_pos,
                get_pos.wrapping_add(granted),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_err()
        {
            yield_now();
            return Err((GetFailure::Busy, count));
        }
        Ok(Reservation { first, granted, count })
    }

    fn fill(&self, ticket: usize, value: Option<T>, wait: Wait) {
        let slot = self.slot(ticket);
        let mut waited = 0usize;
        while !slot.can_put(ticket) {
            waited = waited.saturating_add(1);
            if wait == Wait::Escalate && waited > self.max_wait && self.relieve_producer(ticket) {
                waited = 0;
                continue;
            }
            yield_now();
        }
        // SAFETY: `ticket` was won by this thread and the slot is empty for it.
        unsafe { slot.write(value, self.capacity) };
    }

    fn drain(&self, ticket: usize, wait: Wait) -> Option<T> {
        let slot = self.slot(ticket);
        let mut waited = 0usize;
        while !slot.can_get(ticket, self.capacity) {
            waited = waited.saturating_add(1);
            if wait == Wait::Escalate && waited > self.max_wait && self.relieve_consumer(ticket) {
                waited = 0;
                continue;
            }
            yield_now();
        }
        // SAFETY: `ticket` was won by this thread and the slot is full for it.
        unsafe { slot.take(self.capacity) }
    }

    #[inline]
    fn slot(&self, ticket: usize) -> &Slot<T> {
        &self.slots[ticket & self.mask]
    }
}

impl<T> fmt::Display for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Queue{{capacity: {}, mask: {}, put_pos: {}, get_pos: {}}}",
            self.capacity,
            self.mask,
            self.put_pos.load(Ordering::Relaxed),
            self.get_pos.load(Ordering::Relaxed),
        )
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("capacity", &self.capacity)
            .field("mask", &self.mask)
            .field("put_pos", &self.put_pos.load(Ordering::Relaxed))
            .field("get_pos", &self.get_pos.load(Ordering::Relaxed))
            .field("max_wait", &self.max_wait)
            .field("escape_valve", &self.valve.is_enabled())
            .finish()
    }
}

/// Hooks for driving one side of the handshake by hand, to model a thread
/// that won a ticket and then stalled.
#[cfg(all(test, not(loom)))]
impl<T> Queue<T> {
    pub(crate) fn stall_get(&self) -> usize {
        loop {
            if let Ok(r) = self.reserve_get(1, Admit::Any) {
                return r.first;
            }
        }
    }

    pub(crate) fn stall_put(&self) -> usize {
        loop {
            if let Ok(r) = self.reserve_put(1, Admit::Any) {
                return r.first;
            }
        }
    }

    pub(crate) fn finish_get(&self, ticket: usize) -> Option<T> {
        self.drain(ticket, Wait::Spin)
    }

    pub(crate) fn finish_put(&self, ticket: usize, value: T) {
        self.fill(ticket, Some(value), Wait::Spin)
    }
}
