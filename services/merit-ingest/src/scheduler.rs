use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Independently abortable cadence loops sharing one downstream pipeline.
///
/// Each source family gets its own loop; aborting the scheduler never waits
/// on an in-flight cycle of another cadence.
#[derive(Default)]
pub struct CycleScheduler {
    handles: Vec<JoinHandle<()>>,
}

impl CycleScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a loop that runs `cycle` every `period`.
    ///
    /// The first run happens one period after spawn — the startup cycle is
    /// the caller's responsibility.
    pub fn spawn_cycle<F, Fut>(&mut self, label: &'static str, period: Duration, cycle: F)
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(cadence = label, period_secs = period.as_secs(), "cadence scheduled");

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // interval's first tick resolves immediately; consume it so the
            // loop waits a full period before its first run.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tracing::info!(cadence = label, "cadence tick");
                cycle().await;
            }
        });
        self.handles.push(handle);
    }

    pub fn shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}
