use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_time_ms: f32,
    pub dropped_backlog_ms: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    frames: u32,
    ticks: u32,
    frame_time: Duration,
    worst_frame: Duration,
    dropped: Duration,
}

impl Counters {
    fn snapshot(&self, elapsed: Duration) -> LoopMetricsSnapshot {
        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let mean_frame = if self.frames == 0 {
            Duration::ZERO
        } else {
            self.frame_time / self.frames
        };
        LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms: millis(mean_frame),
            worst_frame_time_ms: millis(self.worst_frame),
            dropped_backlog_ms: self.dropped.as_millis() as u64,
        }
    }
}

fn millis(duration: Duration) -> f32 {
    duration.as_secs_f32() * 1000.0
}

/// Rolling frame/tick counters, reported and reset once per interval.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval: Duration,
    since: Instant,
    counters: Counters,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            since: now,
            counters: Counters::default(),
        }
    }

    pub(crate) fn record_frame(&mut self, frame_time: Duration) {
        let counters = &mut self.counters;
        counters.frames = counters.frames.saturating_add(1);
        counters.frame_time = counters.frame_time.saturating_add(frame_time);
        counters.worst_frame = counters.worst_frame.max(frame_time);
    }

    pub(crate) fn record_tick(&mut self) {
        self.counters.ticks = self.counters.ticks.saturating_add(1);
    }

    pub(crate) fn record_dropped_backlog(&mut self, dropped: Duration) {
        self.counters.dropped = self.counters.dropped.saturating_add(dropped);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.since);
        if elapsed < self.interval {
            return None;
        }
        let snapshot = std::mem::take(&mut self.counters).snapshot(elapsed);
        self.since = now;
        Some(snapshot)
    }
}
