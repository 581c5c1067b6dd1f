// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use bilge::prelude::*;

use crate::tick::TickCounter;

use super::{Channel, Envelope, LengthTimer, LengthTimerRegs, Nrx2, Nrx4};

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
pub(super) struct Nr41 {
    initial_length_timer: u6,
    __: u2,
}

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
pub(super) struct Nr43 {
    clock_divider: u3,
    short_mode: bool,
    clock_shift: u4,
}

#[derive(Default)]
pub(super) struct NoiseRegs {
    pub(super) nr41: Nr41,
    pub(super) nr42: Nrx2,
    pub(super) nr43: Nr43,
    pub(super) nr44: Nrx4,
}

impl NoiseRegs {
    /// T-cycles per LFSR shift
    fn period(&self) -> usize {
        let divider = match self.nr43.clock_divider().value() as usize {
            0 => 8,
            code => code << 4,
        };
        divider << self.nr43.clock_shift().value()
    }
}

impl LengthTimerRegs for NoiseRegs {
    const MAX: usize = 64;

    fn initial(&self) -> usize {
        self.nr41.initial_length_timer().value() as usize
    }

    fn enabled(&self) -> bool {
        self.nr44.sound_length_enabled()
    }
}

struct Lfsr(u16);

impl Default for Lfsr {
    fn default() -> Self {
        Self(0x7fff)
    }
}

impl Lfsr {
    fn high(&self) -> bool {
        self.0 & 0x1 == 0
    }

    fn shift(&mut self, short_mode: bool) {
        let tap = (self.0 ^ (self.0 >> 1)) & 0x1;
        self.0 = (self.0 >> 1) | (tap << 14);
        if short_mode {
            self.0 = (self.0 & !(1 << 6)) | (tap << 6);
        }
    }
}

#[derive(Default)]
pub(super) struct NoiseChannel {
    pub(super) regs: NoiseRegs,
    lfsr: Lfsr,
    frequency_ticks: TickCounter,
    length_timer: LengthTimer<NoiseRegs>,
    envelope: Envelope,
    enabled: bool,
}

impl NoiseChannel {
    pub(super) fn set_nr41(&mut self, nr41: u8) {
        self.regs.nr41 = nr41.into();
        self.length_timer.trigger(&self.regs);
    }

    pub(super) fn set_nr42(&mut self, nr42: u8) {
        self.regs.nr42 = nr42.into();
        self.envelope = self.regs.nr42.into();
    }

    pub(super) fn set_nr43(&mut self, nr43: u8) {
        self.regs.nr43 = nr43.into();
        self.frequency_ticks.rearm(self.regs.period());
    }

    pub(super) fn set_nr44(&mut self, nr44: u8) {
        self.regs.nr44 = nr44.into();
        if self.regs.nr44.trigger() {
            self.regs.nr44.set_trigger(false);
            self.enabled = true;
            self.lfsr = Lfsr::default();
            self.frequency_ticks = TickCounter::new(self.regs.period());
            self.length_timer.trigger(&self.regs);
            self.envelope = self.regs.nr42.into();
        }
    }
}

impl Channel for NoiseChannel {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn amplitude(&self) -> f32 {
        self.envelope.apply(if self.lfsr.high() { 1.0 } else { -1.0 })
    }

    fn clock(&mut self, ticks: usize) {
        if !self.enabled {
            return;
        }

        let Self { regs, lfsr, frequency_ticks, .. } = self;
        let short_mode = regs.nr43.short_mode();
        frequency_ticks.for_each_edge(ticks, || lfsr.shift(short_mode));

        self.length_timer.clock(ticks, &self.regs, &mut self.enabled);
        self.envelope.clock(ticks);
    }
}
