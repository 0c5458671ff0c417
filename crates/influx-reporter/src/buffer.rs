// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Partitioning of one tick's points into write batches.
//!
//! Batches are contiguous, keep the input order, and hold at most
//! `max_batch_size` points each. A limit of zero or less means no limit.

use crate::influx::Point;
use std::slice::Chunks;

/// Effective number of points per batch for `total` points.
///
/// Never zero, so the result can always be handed to `chunks`.
pub fn batch_size(total: usize, max_batch_size: i64) -> usize {
    if max_batch_size <= 0 {
        return total.max(1);
    }
    usize::try_from(max_batch_size).unwrap_or(usize::MAX)
}

/// Number of batches `total` points split into.
pub fn batch_count(total: usize, max_batch_size: i64) -> usize {
    if total == 0 {
        return 0;
    }
    total.div_ceil(batch_size(total, max_batch_size))
}

/// Split `points` into ordered batches.
///
/// An empty slice yields no batches.
pub fn batches(points: &[Point], max_batch_size: i64) -> Chunks<'_, Point> {
    points.chunks(batch_size(points.len(), max_batch_size))
}
