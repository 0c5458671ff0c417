// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event meter with exponentially weighted moving average rates.
//!
//! Rates are updated in fixed 5-second ticks. Instead of a background
//! ticker thread, elapsed ticks are applied lazily whenever the meter is
//! marked or read.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// EWMA tick period.
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Exponentially weighted moving average of a per-second rate.
#[derive(Debug, Clone)]
pub(crate) struct Ewma {
    alpha: f64,
    rate: f64,
    initialized: bool,
}

impl Ewma {
    /// EWMA whose weight decays by `1/e` every `minutes` minutes.
    pub(crate) fn over_minutes(minutes: f64) -> Self {
        let ticks_per_minute = 60.0 / TICK_INTERVAL.as_secs_f64();
        Self {
            alpha: 1.0 - (-1.0 / ticks_per_minute / minutes).exp(),
            rate: 0.0,
            initialized: false,
        }
    }

    /// Fold one tick worth of `events` into the average.
    pub(crate) fn tick(&mut self, events: i64) {
        let instant_rate = events as f64 / TICK_INTERVAL.as_secs_f64();
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    /// Apply `ticks` consecutive ticks with no events.
    pub(crate) fn decay(&mut self, ticks: u32) {
        if ticks == 0 {
            return;
        }
        if !self.initialized {
            self.tick(0);
            self.decay(ticks - 1);
            return;
        }
        self.rate *= (1.0 - self.alpha).powi(ticks as i32);
    }

    /// Current rate in events per second.
    pub(crate) fn rate(&self) -> f64 {
        self.rate
    }
}

#[derive(Debug)]
struct MeterState {
    count: i64,
    /// Events marked since the last applied tick.
    uncounted: i64,
    m1: Ewma,
    m5: Ewma,
    start: Instant,
    last_tick: Instant,
}

impl MeterState {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            uncounted: 0,
            m1: Ewma::over_minutes(1.0),
            m5: Ewma::over_minutes(5.0),
            start: now,
            last_tick: now,
        }
    }

    /// Apply every whole tick elapsed since `last_tick`.
    ///
    /// Pending events are attributed to the first elapsed tick.
    fn catch_up(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let ticks = (elapsed.as_nanos() / TICK_INTERVAL.as_nanos()) as u32;
        if ticks == 0 {
            return;
        }
        let pending = std::mem::take(&mut self.uncounted);
        for ewma in [&mut self.m1, &mut self.m5] {
            ewma.tick(pending);
            ewma.decay(ticks - 1);
        }
        self.last_tick += TICK_INTERVAL * ticks;
    }

    fn mark(&mut self, n: i64, now: Instant) {
        self.catch_up(now);
        self.count += n;
        self.uncounted += n;
    }

    fn snapshot(&mut self, now: Instant) -> MeterSnapshot {
        self.catch_up(now);
        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        let rate_mean = if elapsed > 0.0 {
            self.count as f64 / elapsed
        } else {
            0.0
        };
        MeterSnapshot {
            count: self.count,
            rate1: self.m1.rate(),
            rate5: self.m5.rate(),
            rate_mean,
        }
    }
}

/// Counts events and tracks their throughput.
#[derive(Debug)]
pub struct Meter {
    state: Mutex<MeterState>,
}

impl Meter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MeterState::new(Instant::now())),
        }
    }

    /// Record `n` events.
    pub fn mark(&self, n: i64) {
        self.state.lock().mark(n, Instant::now());
    }

    pub fn count(&self) -> i64 {
        self.state.lock().count
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        self.state.lock().snapshot(Instant::now())
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time rates of a [`Meter`]. Rates are events per second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterSnapshot {
    pub count: i64,
    pub rate1: f64,
    pub rate5: f64,
    pub rate_mean: f64,
}

impl MeterSnapshot {
    pub fn count(&self) -> i64 {
        self.count
    }

    /// One-minute moving average rate.
    pub fn rate1(&self) -> f64 {
        self.rate1
    }

    /// Five-minute moving average rate.
    pub fn rate5(&self) -> f64 {
        self.rate5
    }

    /// Mean rate since the meter was created.
    pub fn rate_mean(&self) -> f64 {
        self.rate_mean
    }
}
