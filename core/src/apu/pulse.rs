// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use bilge::prelude::*;

use crate::tick::TickCounter;

use super::{Channel, Envelope, LengthTimer, LengthTimerRegs, Nrx2, Nrx4};

/// T-cycles per sweep pace unit (1/128 s).
const SWEEP_STEP: usize = 32768;

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
pub(super) struct Nr10 {
    sweep_slope: u3,
    decrease_sweep: bool,
    sweep_pace: u3,
    __: u1,
}

#[bitsize(2)]
#[derive(Default, FromBits, Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WaveDuty {
    #[default]
    W12,
    W25,
    W50,
    W75,
}

impl WaveDuty {
    fn high(self, step: u8) -> bool {
        match self {
            WaveDuty::W12 => step == 7,
            WaveDuty::W25 => step >= 6,
            WaveDuty::W50 => step >= 4,
            WaveDuty::W75 => step < 6,
        }
    }
}

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
pub(super) struct Nrx1 {
    initial_length_timer: u6,
    wave_duty: WaveDuty,
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum SweepAction {
    Nothing,
    Disable,
    SetFrequency(u16),
}

pub(super) trait Sweep {
    fn trigger(&mut self);
    fn clock(&mut self, ticks: usize, frequency: u16) -> SweepAction;
}

#[derive(Default)]
pub(super) struct NoSweep;

impl Sweep for NoSweep {
    fn trigger(&mut self) {}

    fn clock(&mut self, _ticks: usize, _frequency: u16) -> SweepAction {
        SweepAction::Nothing
    }
}

#[derive(Default)]
pub(super) struct Sweeper {
    nr10: Nr10,
    ticks: Option<TickCounter>,
}

impl Sweeper {
    pub(super) fn nr10(&self) -> u8 {
        self.nr10.into()
    }

    pub(super) fn set_nr10(&mut self, nr10: u8) {
        self.nr10 = nr10.into();
        match (self.period(), &mut self.ticks) {
            (0, ticks) => *ticks = None,
            (period, Some(ticks)) => ticks.rearm(period),
            (period, ticks @ None) => *ticks = Some(TickCounter::new(period)),
        }
    }

    fn period(&self) -> usize {
        self.nr10.sweep_pace().value() as usize * SWEEP_STEP
    }

    fn next_frequency(&self, frequency: u16) -> Option<u16> {
        let offset = frequency >> self.nr10.sweep_slope().value();
        let next = if self.nr10.decrease_sweep() {
            frequency.checked_sub(offset)?
        } else {
            frequency + offset
        };
        (1..=0x7ff).contains(&next).then_some(next)
    }
}

impl Sweep for Sweeper {
    fn trigger(&mut self) {
        let period = self.period();
        self.ticks = (period != 0).then(|| TickCounter::new(period));
    }

    fn clock(&mut self, ticks: usize, frequency: u16) -> SweepAction {
        let Some(counter) = &mut self.ticks else {
            return SweepAction::Nothing;
        };

        let mut edges = 0;
        counter.for_each_edge(ticks, || edges += 1);

        let mut action = SweepAction::Nothing;
        let mut frequency = frequency;
        for _ in 0..edges {
            match self.next_frequency(frequency) {
                Some(next) => {
                    frequency = next;
                    action = SweepAction::SetFrequency(next);
                }
                None => return SweepAction::Disable,
            }
        }
        action
    }
}

#[derive(Default)]
pub(super) struct PulseRegs {
    pub(super) nrx1: Nrx1,
    pub(super) nrx2: Nrx2,
    pub(super) nrx3: u8,
    pub(super) nrx4: Nrx4,
}

impl PulseRegs {
    fn frequency(&self) -> u16 {
        ((self.nrx4.period_high().value() as u16) << 8) | self.nrx3 as u16
    }

    fn set_frequency(&mut self, frequency: u16) {
        self.nrx3 = frequency as u8;
        self.nrx4.set_period_high(u3::new((frequency >> 8) as u8 & 0x7));
    }

    /// T-cycles per duty step
    fn period(&self) -> usize {
        (2048 - self.frequency() as usize) * 4
    }
}

impl LengthTimerRegs for PulseRegs {
    const MAX: usize = 64;

    fn initial(&self) -> usize {
        self.nrx1.initial_length_timer().value() as usize
    }

    fn enabled(&self) -> bool {
        self.nrx4.sound_length_enabled()
    }
}

#[derive(Default)]
pub(super) struct PulseChannel<S: Sweep> {
    pub(super) sweeper: S,
    pub(super) regs: PulseRegs,
    duty_step: u8,
    frequency_ticks: TickCounter,
    length_timer: LengthTimer<PulseRegs>,
    envelope: Envelope,
    enabled: bool,
}

impl<S: Sweep> PulseChannel<S> {
    pub(super) fn nrx1(&self) -> u8 {
        let mut nrx1 = self.regs.nrx1;
        nrx1.set_initial_length_timer(Default::default());
        nrx1.into()
    }

    pub(super) fn set_nrx1(&mut self, nrx1: u8) {
        self.regs.nrx1 = nrx1.into();
        self.length_timer.trigger(&self.regs);
    }

    pub(super) fn set_nrx2(&mut self, nrx2: u8) {
        self.regs.nrx2 = nrx2.into();
        self.envelope = self.regs.nrx2.into();
    }

    pub(super) fn set_nrx3(&mut self, nrx3: u8) {
        self.regs.nrx3 = nrx3;
        self.frequency_ticks.rearm(self.regs.period());
    }

    pub(super) fn set_nrx4(&mut self, nrx4: u8) {
        self.regs.nrx4 = nrx4.into();
        self.frequency_ticks.rearm(self.regs.period());
        if self.regs.nrx4.trigger() {
            self.regs.nrx4.set_trigger(false);
            self.trigger();
        }
    }

    fn trigger(&mut self) {
        self.enabled = true;
        self.frequency_ticks = TickCounter::new(self.regs.period());
        self.length_timer.trigger(&self.regs);
        self.envelope = self.regs.nrx2.into();
        self.sweeper.trigger();
    }
}

impl<S: Sweep> Channel for PulseChannel<S> {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn amplitude(&self) -> f32 {
        let duty = self.regs.nrx1.wave_duty();
        let wave = if duty.high(self.duty_step) { 1.0 } else { -1.0 };
        self.envelope.apply(wave)
    }

    fn clock(&mut self, ticks: usize) {
        if !self.enabled {
            return;
        }

        let duty_step = &mut self.duty_step;
        self.frequency_ticks
            .for_each_edge(ticks, || *duty_step = (*duty_step + 1) & 0x7);

        self.length_timer.clock(ticks, &self.regs, &mut self.enabled);
        self.envelope.clock(ticks);

        match self.sweeper.clock(ticks, self.regs.frequency()) {
            SweepAction::Nothing => (),
            SweepAction::Disable => self.enabled = false,
            SweepAction::SetFrequency(frequency) => {
                self.regs.set_frequency(frequency);
                self.frequency_ticks.rearm(self.regs.period());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(nrx1: u8, nrx2: u8, frequency: u16) -> PulseChannel<NoSweep> {
        let mut channel = PulseChannel::<NoSweep>::default();
        channel.set_nrx1(nrx1);
        channel.set_nrx2(nrx2);
        channel.set_nrx3(frequency as u8);
        channel.set_nrx4(0x80 | (frequency >> 8) as u8);
        channel
    }

    #[test]
    fn duty_steps_follow_frequency() {
        // Duty 2, volume 15, frequency 1792 => 1024 T-cycles per step
        let mut channel = square(0x80, 0xf0, 1792);
        assert_eq!(channel.regs.period(), 1024);
        for _ in 0..4096 / 4 {
            channel.clock(4);
        }
        assert_eq!(channel.duty_step, 4);

        // Retrigger restarts the phase counter
        channel.clock(1000);
        channel.set_nrx4(0x87);
        channel.clock(1000);
        assert_eq!(channel.duty_step, 4);
        channel.clock(24);
        assert_eq!(channel.duty_step, 5);
    }

    #[test]
    fn duty_advances_match_elapsed_time() {
        for frequency in [0, 1000, 1800, 2000, 2047] {
            let mut channel = square(0x40, 0xf0, frequency);
            let period = (2048 - frequency as usize) * 4;
            let mut elapsed = 0;
            let mut advances = 0usize;
            for step in [4, 8, 12, 16, 20, 24].iter().cycle().take(2000) {
                let before = channel.duty_step;
                channel.clock(*step);
                advances += (channel.duty_step.wrapping_sub(before) & 0x7) as usize;
                elapsed += step;
            }
            // Steps wrap modulo 8, so compare the phase
            assert_eq!(advances % 8, (elapsed / period) % 8, "frequency {frequency}");
        }
    }

    #[test]
    fn duty_waveforms() {
        let highs = |duty: WaveDuty| (0..8).filter(|&step| duty.high(step)).count();
        assert_eq!(highs(WaveDuty::W12), 1);
        assert_eq!(highs(WaveDuty::W25), 2);
        assert_eq!(highs(WaveDuty::W50), 4);
        assert_eq!(highs(WaveDuty::W75), 6);
    }

    #[test]
    fn silent_with_zero_volume() {
        for duty in 0..4u8 {
            let mut channel = square(duty << 6, 0x00, 1900);
            for _ in 0..64 {
                assert_eq!(channel.amplitude(), 0.0);
                channel.clock(24);
            }
        }
    }

    #[test]
    fn sweep_increases_frequency() {
        let mut channel = PulseChannel::<Sweeper>::default();
        // Pace 1, increase, shift 1
        channel.sweeper.set_nr10(0x11);
        channel.set_nrx2(0xf0);
        channel.set_nrx3(0x00);
        channel.set_nrx4(0x82);
        assert_eq!(channel.regs.frequency(), 0x200);

        channel.clock(SWEEP_STEP);
        assert_eq!(channel.regs.frequency(), 0x300);
        channel.clock(SWEEP_STEP);
        assert_eq!(channel.regs.frequency(), 0x480);
        channel.clock(SWEEP_STEP);
        assert_eq!(channel.regs.frequency(), 0x6c0);
        assert!(channel.enabled());

        // 0x6c0 + 0x360 overflows 11 bits
        channel.clock(SWEEP_STEP);
        assert!(!channel.enabled());
    }

    #[test]
    fn sweep_decreases_frequency() {
        let mut channel = PulseChannel::<Sweeper>::default();
        // Pace 2, decrease, shift 2
        channel.sweeper.set_nr10(0x2a);
        channel.set_nrx2(0xf0);
        channel.set_nrx3(0x00);
        channel.set_nrx4(0x84);
        channel.clock(2 * SWEEP_STEP);
        assert_eq!(channel.regs.frequency(), 0x300);
        assert!(channel.enabled());
    }

    #[test]
    fn sweep_pace_zero_disabled() {
        let mut channel = PulseChannel::<Sweeper>::default();
        channel.sweeper.set_nr10(0x07);
        channel.set_nrx2(0xf0);
        channel.set_nrx3(0x00);
        channel.set_nrx4(0x84);
        channel.clock(100 * SWEEP_STEP);
        assert_eq!(channel.regs.frequency(), 0x400);
        assert!(channel.enabled());
    }
}
