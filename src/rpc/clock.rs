//! Time source for request deadlines.
//!
//! The line reader computes `now + timeout` and waits in 1 ms steps, so it
//! needs both a monotonic reading and a way to yield. Host builds use
//! [`MonotonicClock`](crate::adapters::time::MonotonicClock); tests use a
//! clock that advances only when `delay_ms` is called.

/// Monotonic millisecond clock with a blocking delay.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;

    /// Block the calling thread for `ms` milliseconds.
    fn delay_ms(&self, ms: u32);
}
