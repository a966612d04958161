use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Playback counters since the recorder was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub samples_rendered: u64,
    pub datasets_loaded: u64,
    pub fetch_failures: u64,
    pub superseded_responses: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_tick(&self, samples: usize) {
        self.update(|m| {
            m.ticks += 1;
            m.samples_rendered += samples as u64;
        });
    }

    pub fn record_loaded(&self) {
        self.update(|m| m.datasets_loaded += 1);
    }

    pub fn record_failure(&self) {
        self.update(|m| m.fetch_failures += 1);
    }

    pub fn record_superseded(&self) {
        self.update(|m| m.superseded_responses += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
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
    fn counters_accumulate() {
        let recorder = MetricsRecorder::new();
        recorder.record_tick(3);
        recorder.record_tick(0);
        recorder.record_superseded();
        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.samples_rendered, 3);
        assert_eq!(snapshot.superseded_responses, 1);
    }
}
