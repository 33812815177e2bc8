use core::cell::UnsafeCell;

use crate::sync::{AtomicUsize, Ordering};

/// One cell of the ring, reused once per lap.
///
/// For a slot at index `i` the generations run `i, i + cap, i + 2 * cap, ...`.
/// Empty for generation `g` means `get_id == put_id == g`; full means
/// `get_id == g` and `put_id == g + cap`. Any other pair is another thread's
/// transition in flight.
#[repr(C, align(64))]
pub(crate) struct Slot<T> {
    put_id: AtomicUsize,
    get_id: AtomicUsize,
    value: UnsafeCell<Option<T>>,
}

impl<T> Slot<T> {
    pub(crate) fn new(generation: usize) -> Self {
        Slot {
            put_id: AtomicUsize::new(generation),
            get_id: AtomicUsize::new(generation),
            value: UnsafeCell::new(None),
        }
    }

    #[inline]
    pub(crate) fn can_put(&self, ticket: usize) -> bool {
        let get_id = self.get_id.load(Ordering::Acquire);
        let put_id = self.put_id.load(Ordering::Acquire);
        put_id == ticket && get_id == put_id
    }

    #[inline]
    pub(crate) fn can_get(&self, ticket: usize, capacity: usize) -> bool {
        let get_id = self.get_id.load(Ordering::Acquire);
        let put_id = self.put_id.load(Ordering::Acquire);
        get_id == ticket && get_id.wrapping_add(capacity) == put_id
    }

    /// Store a payload and mark the slot full.
    ///
    /// # Safety
    /// The caller must hold the put ticket for this generation and have
    /// observed `can_put(ticket)`.
    #[inline]
    pub(crate) unsafe fn write(&self, value: Option<T>, capacity: usize) {
        let prev = core::mem::replace(&mut *self.value.get(), value);
        debug_assert!(prev.is_none(), "slot overwritten before it was drained");
        self.put_id.fetch_add(capacity, Ordering::Release);
    }

    /// Take the payload and hand the slot to the next lap's producer.
    ///
    /// # Safety
    /// The caller must hold the get ticket for this generation and have
    /// observed `can_get(ticket, capacity)`.
    #[inline]
    pub(crate) unsafe fn take(&self, capacity: usize) -> Option<T> {
        let value = (*self.value.get()).take();
        self.get_id.fetch_add(capacity, Ordering::Release);
        value
    }
}

unsafe impl<T: Send> Send for Slot<T> {}
unsafe impl<T: Send> Sync for Slot<T> {}
