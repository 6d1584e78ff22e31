//! Asynchronous delay abstraction providing the timing primitive required
//! by the contention and discovery windows.

/// Delay provider backed by the host's monotonic clock.
pub trait Delay {
    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms<'a>(&'a mut self, millis: u32) -> impl core::future::Future<Output = ()> + 'a;
}
