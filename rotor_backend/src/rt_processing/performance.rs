use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use log::debug;
use quanta::{Clock, Instant as QuantaInstant};

/// Render-load figures for logging or a host's status display (non-RT).
#[derive(Debug, Clone)]
pub struct LoadSnapshot {
    pub frames_rendered: u64,
    pub buffer_count: u64,
    /// Buffers that took longer than their real-time budget.
    pub overrun_count: u64,
    /// Buffers answered with silence because the processor was unavailable.
    pub silent_buffer_count: u64,
    pub min_buffer_nanos: Option<u64>,
    pub max_buffer_nanos: Option<u64>,
    /// Smoothed render time as a percentage of the buffer's duration.
    pub avg_load_percent: f64,
    pub peak_load_percent: f64,
    pub timestamp: Instant,
}

/// Atomics-only timing of the render path.
///
/// The audio thread only calls [`scoped_buffer`](Self::scoped_buffer) and
/// the `increment_*` methods; [`snapshot`](Self::snapshot) is for the
/// control thread.
pub struct RenderLoadMonitor {
    clock: Clock,

    frames_rendered: AtomicU64,
    buffer_count: AtomicU64,
    overrun_count: AtomicU64,
    silent_buffer_count: AtomicU64,

    min_buffer_nanos: AtomicU64,
    max_buffer_nanos: AtomicU64,
    // f64 bits
    ema_load_bits: AtomicU64,
    peak_load_bits: AtomicU64,

    ema_alpha: f64,
}

impl RenderLoadMonitor {
    /// `ema_alpha` must already be validated (it comes from `EngineConfig`).
    pub fn new(ema_alpha: f64) -> Self {
        Self {
            clock: Clock::new(),
            frames_rendered: AtomicU64::new(0),
            buffer_count: AtomicU64::new(0),
            overrun_count: AtomicU64::new(0),
            silent_buffer_count: AtomicU64::new(0),
            min_buffer_nanos: AtomicU64::new(u64::MAX),
            max_buffer_nanos: AtomicU64::new(0),
            ema_load_bits: AtomicU64::new(0f64.to_bits()),
            peak_load_bits: AtomicU64::new(0f64.to_bits()),
            ema_alpha: ema_alpha.clamp(f64::MIN_POSITIVE, 1.0),
        }
    }

    #[inline(always)]
    pub fn increment_silent_buffer_count(&self) {
        self.silent_buffer_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one rendered buffer against its real-time budget.
    #[inline(always)]
    pub fn record_buffer(&self, frames: usize, elapsed_nanos: u64, budget_nanos: f64) {
        self.frames_rendered.fetch_add(frames as u64, Ordering::Relaxed);
        self.buffer_count.fetch_add(1, Ordering::Relaxed);
        self.min_buffer_nanos.fetch_min(elapsed_nanos, Ordering::Relaxed);
        self.max_buffer_nanos.fetch_max(elapsed_nanos, Ordering::Relaxed);

        if budget_nanos <= 0.0 {
            return;
        }
        let load = elapsed_nanos as f64 / budget_nanos * 100.0;
        if load > 100.0 {
            self.overrun_count.fetch_add(1, Ordering::Relaxed);
        }

        // EMA_new = alpha * x + (1 - alpha) * EMA_old
        let alpha = self.ema_alpha;
        let _ = self
            .ema_load_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |old| {
                let old = f64::from_bits(old);
                Some((alpha * load + (1.0 - alpha) * old).to_bits())
            });
        let _ = self
            .peak_load_bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |old| {
                (load > f64::from_bits(old)).then(|| load.to_bits())
            });
    }

    /// Starts timing a buffer of `frames` at `sample_rate`; the guard
    /// records it on drop.
    #[inline(always)]
    pub fn scoped_buffer(&self, frames: usize, sample_rate: f64) -> BufferTimer<'_> {
        BufferTimer {
            monitor: self,
            frames,
            budget_nanos: frames as f64 / sample_rate * 1_000_000_000.0,
            start: self.clock.now(),
        }
    }

    /// Reads the counters. Not real-time safe.
    pub fn snapshot(&self, reset_peaks: bool) -> LoadSnapshot {
        let min_raw = self.min_buffer_nanos.load(Ordering::Relaxed);
        let max_raw = self.max_buffer_nanos.load(Ordering::Relaxed);
        let snapshot = LoadSnapshot {
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
            buffer_count: self.buffer_count.load(Ordering::Relaxed),
            overrun_count: self.overrun_count.load(Ordering::Relaxed),
            silent_buffer_count: self.silent_buffer_count.load(Ordering::Relaxed),
            min_buffer_nanos: (min_raw != u64::MAX).then_some(min_raw),
            max_buffer_nanos: (max_raw != 0).then_some(max_raw),
            avg_load_percent: f64::from_bits(self.ema_load_bits.load(Ordering::Relaxed)),
            peak_load_percent: f64::from_bits(self.peak_load_bits.load(Ordering::Relaxed)),
            timestamp: Instant::now(),
        };

        if reset_peaks {
            self.min_buffer_nanos.store(u64::MAX, Ordering::Relaxed);
            self.max_buffer_nanos.store(0, Ordering::Relaxed);
            self.peak_load_bits.store(0f64.to_bits(), Ordering::Relaxed);
        }

        debug!(
            "render load: avg {:.1}%, peak {:.1}%, {} overruns in {} buffers",
            snapshot.avg_load_percent,
            snapshot.peak_load_percent,
            snapshot.overrun_count,
            snapshot.buffer_count
        );
        snapshot
    }
}

/// Records buffer render time on drop. Atomics only.
pub struct BufferTimer<'a> {
    monitor: &'a RenderLoadMonitor,
    frames: usize,
    budget_nanos: f64,
    start: QuantaInstant,
}

impl Drop for BufferTimer<'_> {
    fn drop(&mut self) {
        let now = self.monitor.clock.now();
        let elapsed = now.saturating_duration_since(self.start).as_nanos();
        let elapsed = u64::try_from(elapsed).unwrap_or(u64::MAX);
        self.monitor
            .record_buffer(self.frames, elapsed, self.budget_nanos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let monitor = RenderLoadMonitor::new(0.1);
        let snapshot = monitor.snapshot(false);
        assert_eq!(snapshot.buffer_count, 0);
        assert_eq!(snapshot.min_buffer_nanos, None);
        assert_eq!(snapshot.max_buffer_nanos, None);
        assert_eq!(snapshot.avg_load_percent, 0.0);
    }

    #[test]
    fn test_record_buffer_tracks_load_and_overruns() {
        let monitor = RenderLoadMonitor::new(1.0);
        monitor.record_buffer(480, 5_000_000, 10_000_000.0);
        monitor.record_buffer(480, 20_000_000, 10_000_000.0);
        let snapshot = monitor.snapshot(true);
        assert_eq!(snapshot.frames_rendered, 960);
        assert_eq!(snapshot.buffer_count, 2);
        assert_eq!(snapshot.overrun_count, 1);
        assert_eq!(snapshot.min_buffer_nanos, Some(5_000_000));
        assert_eq!(snapshot.max_buffer_nanos, Some(20_000_000));
        assert_eq!(snapshot.avg_load_percent, 200.0);
        assert_eq!(snapshot.peak_load_percent, 200.0);

        let after_reset = monitor.snapshot(false);
        assert_eq!(after_reset.max_buffer_nanos, None);
        assert_eq!(after_reset.buffer_count, 2);
    }

    #[test]
    fn test_scoped_buffer_records_on_drop() {
        let monitor = RenderLoadMonitor::new(0.5);
        {
            let _timer = monitor.scoped_buffer(64, 48000.0);
        }
        assert_eq!(monitor.snapshot(false).buffer_count, 1);
        monitor.increment_silent_buffer_count();
        assert_eq!(monitor.snapshot(false).silent_buffer_count, 1);
    }
}
