//! Fetch counters and in-flight cache write tracking.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;
use tokio::sync::Notify;

/// How a fetch was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Live network response; a copy was queued for the cache if storable.
    Network,
    /// The network failed and the current generation answered instead.
    CacheFallback,
    /// Not intercepted; the cache was neither read nor written.
    Bypass,
}

/// Counters shared by every fetch task of one controller.
#[derive(Debug, Default)]
pub struct ControllerStats {
    network: AtomicU64,
    cache_fallback: AtomicU64,
    bypass: AtomicU64,
    failed: AtomicU64,
    write_failures: AtomicU64,
    pending_writes: AtomicUsize,
    writes_idle: Notify,
}

/// Point-in-time copy of [`ControllerStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub network: u64,
    pub cache_fallback: u64,
    pub bypass: u64,
    pub failed: u64,
    pub write_failures: u64,
    pub pending_writes: usize,
}

impl ControllerStats {
    pub fn record(&self, outcome: FetchOutcome) {
        let counter = match outcome {
            FetchOutcome::Network => &self.network,
            FetchOutcome::CacheFallback => &self.cache_fallback,
            FetchOutcome::Bypass => &self.bypass,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            network: self.network.load(Ordering::Relaxed),
            cache_fallback: self.cache_fallback.load(Ordering::Relaxed),
            bypass: self.bypass.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            pending_writes: self.pending_writes.load(Ordering::Acquire),
        }
    }

    /// Mark a cache write as in flight until the guard drops.
    pub fn begin_write(self: &Arc<Self>) -> WriteGuard {
        self.pending_writes.fetch_add(1, Ordering::AcqRel);
        WriteGuard { stats: Arc::clone(self) }
    }

    /// Wait until no cache write is in flight.
    pub async fn writes_settled(&self) {
        loop {
            let idle = self.writes_idle.notified();
            if self.pending_writes.load(Ordering::Acquire) == 0 {
                return;
            }
            idle.await;
        }
    }
}

/// Keeps a background cache write counted as pending.
#[derive(Debug)]
pub struct WriteGuard {
    stats: Arc<ControllerStats>,
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        if self.stats.pending_writes.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.stats.writes_idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_record_outcomes() {
        let stats = ControllerStats::default();
        stats.record(FetchOutcome::Network);
        stats.record(FetchOutcome::Network);
        stats.record(FetchOutcome::CacheFallback);
        stats.record(FetchOutcome::Bypass);
        stats.record_failure();

        let snap = stats.snapshot();
        assert_eq!(snap.network, 2);
        assert_eq!(snap.cache_fallback, 1);
        assert_eq!(snap.bypass, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.write_failures, 0);
    }

    #[tokio::test]
    async fn test_writes_settled_waits_for_guards() {
        let stats = Arc::new(ControllerStats::default());
        let guard = stats.begin_write();
        assert_eq!(stats.snapshot().pending_writes, 1);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            drop(guard);
        });

        tokio::time::timeout(Duration::from_secs(1), stats.writes_settled())
            .await
            .unwrap();
        assert_eq!(stats.snapshot().pending_writes, 0);
    }

    #[tokio::test]
    async fn test_writes_settled_returns_when_idle() {
        let stats = ControllerStats::default();
        stats.writes_settled().await;
    }
}
