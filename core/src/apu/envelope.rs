// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use bilge::prelude::*;

use crate::tick::TickCounter;

/// T-cycles per envelope pace unit (1/64 s).
const ENVELOPE_STEP: usize = 65536;

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
pub(super) struct Nrx2 {
    sweep_pace: u3,
    increase_envelope: bool,
    initial_volume: u4,
}

#[derive(Default)]
pub(super) struct Envelope {
    initial: u8,
    volume: u8,
    increase: bool,
    ticks: Option<TickCounter>,
}

impl Envelope {
    pub(super) fn clock(&mut self, ticks: usize) {
        let Some(counter) = &mut self.ticks else {
            return;
        };

        let volume = &mut self.volume;
        let increase = self.increase;
        counter.for_each_edge(ticks, || {
            if increase {
                if *volume < 0xf {
                    *volume += 1;
                }
            } else if *volume > 0 {
                *volume -= 1;
            }
        });
    }

    /// Scales a full-range sample by the current volume.
    pub(super) fn apply(&self, sample: f32) -> f32 {
        if self.initial == 0 {
            return 0.0;
        }
        sample * self.volume as f32 / 15.0
    }
}

impl From<Nrx2> for Envelope {
    fn from(nrx2: Nrx2) -> Self {
        let pace = nrx2.sweep_pace().value() as usize;
        let initial = nrx2.initial_volume().value();
        Self {
            initial,
            volume: initial,
            increase: nrx2.increase_envelope(),
            ticks: (pace != 0).then(|| TickCounter::new(pace * ENVELOPE_STEP)),
        }
    }
}
