use std::sync::Mutex;

/// Counters for the frame preload handshake.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadMetrics {
    pub issued: usize,
    pub applied: usize,
    pub stale: usize,
    pub failed: usize,
}

struct Metrics {
    preload: PreloadMetrics,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics {
                preload: PreloadMetrics::default(),
            }),
        }
    }

    pub fn record_issued(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.preload.issued += 1;
        }
    }

    pub fn record_applied(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.preload.applied += 1;
        }
    }

    pub fn record_stale(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.preload.stale += 1;
        }
    }

    pub fn record_failed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.preload.failed += 1;
        }
    }

    pub fn snapshot(&self) -> PreloadMetrics {
        if let Ok(metrics) = self.inner.lock() {
            metrics.preload
        } else {
            PreloadMetrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let metrics = MetricsRecorder::new();
        metrics.record_issued();
        metrics.record_issued();
        metrics.record_applied();
        metrics.record_stale();
        assert_eq!(
            metrics.snapshot(),
            PreloadMetrics {
                issued: 2,
                applied: 1,
                stale: 1,
                failed: 0
            }
        );
    }
}
