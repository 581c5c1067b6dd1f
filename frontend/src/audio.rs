// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use dmg_core::system::{AudioSink, SinkError};

/// Stands in for an audio device; keeps statistics on what it was fed.
#[derive(Default)]
pub struct AudioStats {
    pub buffers: usize,
    pub samples: usize,
    pub peak: f32,
}

impl AudioSink for AudioStats {
    fn enqueue_audio(&mut self, samples: Vec<f32>) -> Result<(), SinkError> {
        self.buffers += 1;
        self.samples += samples.len();
        self.peak = samples.iter().fold(self.peak, |peak, s| peak.max(s.abs()));
        Ok(())
    }
}
