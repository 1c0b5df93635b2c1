//! Progress notifications for the write loop.

/// Observer told about the progress of a warm-up.
pub trait ProgressObserver: Send {
    /// Called once, after the rows are fetched.
    fn on_start(&mut self, _total: usize) {}

    /// Called every N successful writes with the running count.
    fn on_progress(&mut self, cached: u64, total: usize);
}

impl<F> ProgressObserver for F
where
    F: FnMut(u64, usize) + Send,
{
    fn on_progress(&mut self, cached: u64, total: usize) {
        self(cached, total);
    }
}

/// Observer logging through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_start(&mut self, total: usize) {
        tracing::info!(total, "Found {total} books to cache");
    }

    fn on_progress(&mut self, cached: u64, total: usize) {
        tracing::info!(cached, total, "Cached {cached} / {total} books");
    }
}
