use thiserror::Error;

/// Why a put was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PutFailure {
    /// Occupancy reached the admission ceiling.
    #[error("queue is full")]
    Full,
    /// Another producer advanced the put position first.
    #[error("lost the put reservation race")]
    Busy,
}

/// Why a get came back empty-handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GetFailure {
    /// Nothing to take.
    #[error("queue is empty")]
    Empty,
    /// Another consumer advanced the get position first.
    #[error("lost the get reservation race")]
    Busy,
}

/// A rejected [`Queue::put`](crate::Queue::put). The value is handed back so
/// the caller can retry with it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} (count {count})")]
pub struct PutError<T> {
    /// The value that was not enqueued.
    pub value: T,
    /// Why it was rejected.
    pub reason: PutFailure,
    /// Occupancy observed by the attempt.
    pub count: usize,
}

/// A rejected [`Queue::get`](crate::Queue::get).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{reason} (count {count})")]
pub struct GetError {
    /// Why nothing was returned.
    pub reason: GetFailure,
    /// Occupancy observed by the attempt.
    pub count: usize,
}

impl<T> PutError<T> {
    /// Recover the rejected value.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// `true` when the queue was at its ceiling rather than contended.
    pub fn is_full(&self) -> bool {
        self.reason == PutFailure::Full
    }
}

impl GetError {
    /// `true` when the queue held nothing rather than being contended.
    pub fn is_empty(&self) -> bool {
        self.reason == GetFailure::Empty
    }
}
