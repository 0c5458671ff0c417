// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalar instruments: counters, gauges and health checks.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Signed running count.
///
/// Thread-safe: all operations are single atomic instructions (Relaxed).
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicI64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by `n`.
    pub fn inc(&self, n: i64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    /// Decrement by `n`.
    pub fn dec(&self, n: i64) {
        self.count.fetch_sub(n, Ordering::Relaxed);
    }

    /// Reset to zero.
    pub fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Last written integer value.
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Last written float value.
///
/// Stored as raw `f64` bits so reads and writes stay lock-free.
#[derive(Debug)]
pub struct GaugeFloat {
    bits: AtomicU64,
}

impl GaugeFloat {
    pub fn new() -> Self {
        Self {
            bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    pub fn update(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for GaugeFloat {
    fn default() -> Self {
        Self::new()
    }
}

type CheckFn = Box<dyn Fn() -> Result<(), String> + Send + Sync>;

/// Status probe backed by a user closure.
///
/// `check()` runs the closure and stores the outcome; `error()` returns the
/// stored failure message, if any. Reporters do not export health checks.
pub struct Healthcheck {
    probe: CheckFn,
    last_error: Mutex<Option<String>>,
}

impl Healthcheck {
    pub fn new<F>(probe: F) -> Self
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            probe: Box::new(probe),
            last_error: Mutex::new(None),
        }
    }

    /// Run the probe and record its result.
    pub fn check(&self) {
        let outcome = (self.probe)().err();
        *self.last_error.lock() = outcome;
    }

    pub fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn is_healthy(&self) -> bool {
        self.last_error.lock().is_none()
    }
}

impl fmt::Debug for Healthcheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Healthcheck")
            .field("last_error", &*self.last_error.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn test_counter_inc_dec_clear() {
        let c = Counter::new();
        c.inc(5);
        c.dec(2);
        assert_eq!(c.count(), 3);
        c.dec(10);
        assert_eq!(c.count(), -7);
        c.clear();
        assert_eq!(c.count(), 0);
    }

    #[test]
    fn test_counter_concurrent_increments() {
        let c = Arc::new(Counter::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        c.inc(1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("join");
        }
        assert_eq!(c.count(), 4000);
    }

    #[test]
    fn test_gauge_keeps_last_value() {
        let g = Gauge::new();
        assert_eq!(g.value(), 0);
        g.update(47);
        g.update(-3);
        assert_eq!(g.value(), -3);
    }

    #[test]
    fn test_gauge_float_roundtrips_bits() {
        let g = GaugeFloat::new();
        assert_eq!(g.value(), 0.0);
        g.update(47.25);
        assert_eq!(g.value(), 47.25);
    }

    #[test]
    fn test_healthcheck_records_outcome() {
        let failing = Arc::new(AtomicBool::new(false));
        let flag = failing.clone();
        let hc = Healthcheck::new(move || {
            if flag.load(Ordering::Relaxed) {
                Err("disk full".to_string())
            } else {
                Ok(())
            }
        });

        hc.check();
        assert!(hc.is_healthy());

        failing.store(true, Ordering::Relaxed);
        hc.check();
        assert_eq!(hc.error().as_deref(), Some("disk full"));
    }
}
