//! Drain coordination for a single server.

use tokio::time::{error::Elapsed, timeout_at, Instant};
use tokio_util::sync::CancellationToken;

/// Coordinator for one server's graceful shutdown.
///
/// The serve loop watches [`Drain::signal`] to stop accepting and
/// [`Drain::forced`] to drop in-flight connections. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct Drain {
    /// Stop accepting, let in-flight requests finish.
    begin: CancellationToken,
    /// Deadline passed, abandon in-flight requests.
    force: CancellationToken,
    /// The serve loop has returned.
    stopped: CancellationToken,
}

impl Drain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Future that resolves once draining begins.
    pub fn signal(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let begin = self.begin.clone();
        async move { begin.cancelled().await }
    }

    /// Future that resolves once the drain deadline has passed.
    pub fn forced(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let force = self.force.clone();
        async move { force.cancelled().await }
    }

    /// Stop accepting new connections.
    pub fn begin(&self) {
        self.begin.cancel();
    }

    pub fn is_draining(&self) -> bool {
        self.begin.is_cancelled()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.is_cancelled()
    }

    /// Called by the serve loop when it returns.
    pub fn mark_stopped(&self) {
        self.stopped.cancel();
    }

    /// Begin draining and wait for the serve loop to stop.
    ///
    /// On deadline the drain is forced and `Elapsed` is returned. Calling
    /// this again after the server stopped returns immediately.
    pub async fn drain(&self, deadline: Instant) -> Result<(), Elapsed> {
        self.begin.cancel();
        let result = timeout_at(deadline, self.stopped.cancelled()).await;
        if result.is_err() {
            self.force.cancel();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn drain_waits_for_stop() {
        let drain = Drain::new();
        let loop_side = drain.clone();
        tokio::spawn(async move {
            loop_side.signal().await;
            loop_side.mark_stopped();
        });

        let deadline = Instant::now() + Duration::from_secs(1);
        assert!(drain.drain(deadline).await.is_ok());
        assert!(drain.is_draining());
        assert!(drain.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_forces_after_deadline() {
        let drain = Drain::new();
        let deadline = Instant::now() + Duration::from_millis(50);

        assert!(drain.drain(deadline).await.is_err());
        tokio::time::timeout(Duration::from_millis(1), drain.forced())
            .await
            .expect("force signal should fire after the deadline");
    }

    #[tokio::test]
    async fn second_drain_is_a_no_op() {
        let drain = Drain::new();
        drain.mark_stopped();

        let deadline = Instant::now() + Duration::from_millis(10);
        assert!(drain.drain(deadline).await.is_ok());
        assert!(drain.drain(deadline).await.is_ok());
    }
}
