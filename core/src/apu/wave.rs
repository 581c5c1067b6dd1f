// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use bilge::prelude::*;

use crate::tick::TickCounter;

use super::{Channel, LengthTimer, LengthTimerRegs, Nrx4};

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
pub(super) struct Nr30 {
    __: u7,
    dac_enabled: bool,
}

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
pub(super) struct Nr32 {
    _unused1: u5,
    output_level: u2,
    _unused2: u1,
}

#[derive(Default)]
pub(super) struct WaveRegs {
    pub(super) nr30: Nr30,
    pub(super) nr31: u8,
    pub(super) nr32: Nr32,
    pub(super) nr33: u8,
    pub(super) nr34: Nrx4,
}

impl WaveRegs {
    fn frequency(&self) -> u16 {
        ((self.nr34.period_high().value() as u16) << 8) | self.nr33 as u16
    }

    /// T-cycles per wave RAM sample
    fn period(&self) -> usize {
        (2048 - self.frequency() as usize) * 2
    }
}

impl LengthTimerRegs for WaveRegs {
    const MAX: usize = 256;

    fn initial(&self) -> usize {
        self.nr31 as usize
    }

    fn enabled(&self) -> bool {
        self.nr34.sound_length_enabled()
    }
}

#[derive(Default)]
pub(super) struct WaveChannel {
    pub(super) wave_ram: [u8; 16],
    pub(super) regs: WaveRegs,
    position: u8,
    frequency_ticks: TickCounter,
    length_timer: LengthTimer<WaveRegs>,
    enabled: bool,
}

impl WaveChannel {
    pub(super) fn nr30(&self) -> u8 {
        self.regs.nr30.into()
    }

    pub(super) fn nr32(&self) -> u8 {
        self.regs.nr32.into()
    }

    pub(super) fn set_nr30(&mut self, nr30: u8) {
        self.regs.nr30 = nr30.into();
        if !self.regs.nr30.dac_enabled() {
            self.enabled = false;
        }
    }

    pub(super) fn set_nr31(&mut self, nr31: u8) {
        self.regs.nr31 = nr31;
        self.length_timer.trigger(&self.regs);
    }

    pub(super) fn set_nr32(&mut self, nr32: u8) {
        self.regs.nr32 = nr32.into();
    }

    pub(super) fn set_nr33(&mut self, nr33: u8) {
        self.regs.nr33 = nr33;
        self.frequency_ticks.rearm(self.regs.period());
    }

    pub(super) fn set_nr34(&mut self, nr34: u8) {
        self.regs.nr34 = nr34.into();
        self.frequency_ticks.rearm(self.regs.period());
        if self.regs.nr34.trigger() {
            self.regs.nr34.set_trigger(false);
            self.enabled = self.regs.nr30.dac_enabled();
            self.position = 0;
            self.frequency_ticks = TickCounter::new(self.regs.period());
            self.length_timer.trigger(&self.regs);
        }
    }

    /// Clears everything but wave RAM.
    pub(super) fn power_off(&mut self) {
        let wave_ram = self.wave_ram;
        *self = Self { wave_ram, ..Default::default() };
    }

    /// 4-bit sample at the current position, high nibble first.
    fn raw_sample(&self) -> u8 {
        let byte = self.wave_ram[self.position as usize >> 1];
        if self.position & 0x1 == 0 {
            byte >> 4
        } else {
            byte & 0xf
        }
    }
}

impl Channel for WaveChannel {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn amplitude(&self) -> f32 {
        let sample = match self.regs.nr32.output_level().value() {
            0 => return 0.0,
            level => self.raw_sample() >> (level - 1),
        };
        sample as f32 / 7.5 - 1.0
    }

    fn clock(&mut self, ticks: usize) {
        if !self.enabled {
            return;
        }

        let position = &mut self.position;
        self.frequency_ticks
            .for_each_edge(ticks, || *position = (*position + 1) & 0x1f);

        self.length_timer.clock(ticks, &self.regs, &mut self.enabled);
    }
}
