use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub dropped_ticks: u32,
}

/// Rolling loop counters, flushed to a snapshot once per interval.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    dropped_ticks: u32,
    frame_time_sum: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    fn starting_at(interval_start: Instant, interval: Duration) -> Self {
        Self {
            interval_start,
            interval,
            frames: 0,
            ticks: 0,
            dropped_ticks: 0,
            frame_time_sum: Duration::ZERO,
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub(crate) fn record_dropped(&mut self, backlog: Duration, fixed_dt: Duration) {
        if fixed_dt.is_zero() {
            return;
        }
        let dropped = (backlog.as_nanos() / fixed_dt.as_nanos()).min(u32::MAX as u128) as u32;
        self.dropped_ticks = self.dropped_ticks.saturating_add(dropped);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            (self.frame_time_sum.as_secs_f32() / self.frames as f32) * 1000.0
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            tps: self.ticks as f32 / elapsed_seconds,
            frame_time_ms,
            dropped_ticks: self.dropped_ticks,
        };

        *self = Self::starting_at(now, self.interval);
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_over_interval() {
        let base = Instant::now();
        let mut metrics = MetricsAccumulator::starting_at(base, Duration::from_secs(2));
        for _ in 0..4 {
            metrics.record_frame(Duration::from_millis(10));
        }
        for _ in 0..120 {
            metrics.record_tick();
        }

        let snapshot = metrics
            .maybe_snapshot(base + Duration::from_secs(2))
            .expect("interval elapsed");

        assert!((snapshot.fps - 2.0).abs() < 0.01);
        assert!((snapshot.tps - 60.0).abs() < 0.01);
        assert!((snapshot.frame_time_ms - 10.0).abs() < 0.001);
    }

    #[test]
    fn snapshot_waits_for_interval_and_then_resets() {
        let base = Instant::now();
        let mut metrics = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        metrics.record_tick();

        assert!(metrics
            .maybe_snapshot(base + Duration::from_millis(400))
            .is_none());
        assert!(metrics
            .maybe_snapshot(base + Duration::from_secs(1))
            .is_some());

        let next = metrics
            .maybe_snapshot(base + Duration::from_secs(2))
            .expect("second interval");
        assert_eq!(next.tps, 0.0);
    }

    #[test]
    fn dropped_backlog_counts_whole_ticks() {
        let base = Instant::now();
        let mut metrics = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        metrics.record_dropped(Duration::from_millis(50), Duration::from_millis(16));

        let snapshot = metrics
            .maybe_snapshot(base + Duration::from_secs(1))
            .expect("snapshot");
        assert_eq!(snapshot.dropped_ticks, 3);
    }
}
