// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

/// Accumulates T-cycles and reports when a period has elapsed.
///
/// Each call to [`TickCounter::advance`] reports at most one edge. Callers that may cross several
/// periods at once drain the remaining edges with `advance(0)`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickCounter {
    current: usize,
    target: usize,
}

impl TickCounter {
    pub fn new(target: usize) -> Self {
        Self { current: 0, target }
    }

    pub fn advance(&mut self, ticks: usize) -> bool {
        self.current += ticks;
        // A zero period never fires
        if self.target != 0 && self.current >= self.target {
            self.current -= self.target;
            true
        } else {
            false
        }
    }

    /// Calls `edge` once for every period crossed by `ticks`.
    pub fn for_each_edge(&mut self, ticks: usize, mut edge: impl FnMut()) {
        let mut ticks = ticks;
        while self.advance(ticks) {
            ticks = 0;
            edge();
        }
    }

    pub fn rearm(&mut self, target: usize) {
        self.target = target;
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}
