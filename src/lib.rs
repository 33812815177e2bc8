//! lap_mpmc - bounded lock-free MPMC queue over generation-counted slots
//!
//! Each slot carries a `put_id`/`get_id` pair that advances by the capacity
//! every lap, so a position ticket `p` may only touch slot `p & mask` once the
//! previous lap has left it. Producers and consumers win tickets with a single
//! CAS on `put_pos`/`get_pos` and fail fast on contention; the slot wait that
//! follows is the only place anyone spins.
//!
//! Batch APIs reserve a whole range with one CAS and then run the same per-slot
//! handshake for every position in it.
//!
//! ```
//! use lap_mpmc::Queue;
//!
//! let q = Queue::new(8);
//! assert_eq!(q.put("a"), Ok(1));
//! assert_eq!(q.get(), Ok((Some("a"), 0)));
//! assert!(q.get().unwrap_err().is_empty());
//! ```
//!
//! Occupancy is capped at `capacity - 2`. A ticket that waits longer than
//! [`Config::max_wait`] spins triggers the escape valve, which discards the
//! queue head (producers) or injects a `None` placeholder (consumers) so the
//! waiter can progress. See [`Queue::escape_stats`].
#![warn(missing_docs)]

mod config;
mod error;
mod escape;
mod queue;
mod slot;
mod sync;

pub use config::{round_capacity, Config, HEADROOM, MAX_WAIT, MIN_CAPACITY};
pub use error::{GetError, GetFailure, PutError, PutFailure};
pub use escape::EscapeStats;
pub use queue::Queue;
