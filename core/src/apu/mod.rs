// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use std::{marker::PhantomData, mem};

use bilge::prelude::*;
use log::warn;

use crate::{reg, system::TCycles, tick::TickCounter};

use self::{
    envelope::{Envelope, Nrx2},
    noise::NoiseChannel,
    pulse::{NoSweep, PulseChannel, Sweeper},
    wave::WaveChannel,
};

mod envelope;
mod noise;
mod pulse;
mod wave;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConfig {
    /// Host sample rate in Hz
    pub sample_rate: u32,
    /// Stereo frames per buffer handed to the host
    pub buffer_frames: usize,
}

impl AudioConfig {
    /// T-cycles between two output frames.
    pub fn sample_period(&self) -> usize {
        (TCycles::FREQ / self.sample_rate.max(1) as usize).max(1)
    }

    /// Interleaved samples per buffer.
    pub fn buffer_len(&self) -> usize {
        self.buffer_frames.max(1) * 2
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { sample_rate: 48000, buffer_frames: 1024 }
    }
}

trait Channel {
    fn enabled(&self) -> bool;
    /// Current output in [-1, 1], before panning
    fn amplitude(&self) -> f32;
    fn clock(&mut self, ticks: usize);

    fn sample(&self) -> f32 {
        if !self.enabled() {
            return 0.0;
        }

        self.amplitude()
    }
}

/// T-cycles per step of a sound length counter (1/256 s).
const LENGTH_STEP: usize = 16384;

trait LengthTimerRegs {
    const MAX: usize;

    fn initial(&self) -> usize;
    fn enabled(&self) -> bool;
}

/// Silences a channel once its programmed length runs out.
struct LengthTimer<R: LengthTimerRegs> {
    ticks: TickCounter,
    regs: PhantomData<R>,
}

impl<R: LengthTimerRegs> Default for LengthTimer<R> {
    fn default() -> Self {
        Self { ticks: TickCounter::new(R::MAX * LENGTH_STEP), regs: PhantomData }
    }
}

impl<R: LengthTimerRegs> LengthTimer<R> {
    fn trigger(&mut self, regs: &R) {
        self.ticks = TickCounter::new((R::MAX - regs.initial()) * LENGTH_STEP);
    }

    fn clock(&mut self, ticks: usize, regs: &R, enabled: &mut bool) {
        if !regs.enabled() {
            return;
        }
        if self.ticks.advance(ticks) {
            *enabled = false;
        }
    }
}

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
struct Nrx4 {
    period_high: u3,
    __: u3,
    sound_length_enabled: bool,
    trigger: bool,
}

impl Nrx4 {
    fn read(&self) -> u8 {
        let mut nrx4 = Nrx4::from(0xff);
        nrx4.set_sound_length_enabled(self.sound_length_enabled());
        nrx4.into()
    }
}

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
struct Nr50 {
    vol_right: u3,
    vin_right: bool,
    vol_left: u3,
    vin_left: bool,
}

#[bitsize(4)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
struct MixerBits {
    channel_1: bool,
    channel_2: bool,
    channel_3: bool,
    channel_4: bool,
}

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
struct Nr51 {
    right: MixerBits,
    left: MixerBits,
}

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
struct Nr52 {
    channel_1_enabled: bool,
    channel_2_enabled: bool,
    channel_3_enabled: bool,
    channel_4_enabled: bool,
    __: u3,
    sound_enabled: bool,
}

fn mixer(bits: MixerBits, [ch1, ch2, ch3, ch4]: [f32; 4]) -> f32 {
    let mut out = 0.0;

    if bits.channel_1() {
        out += ch1;
    }
    if bits.channel_2() {
        out += ch2;
    }
    if bits.channel_3() {
        out += ch3;
    }
    if bits.channel_4() {
        out += ch4;
    }

    out
}

fn master_volume(vol: u3) -> f32 {
    vol.value() as f32 / 7.0 / 4.0
}

pub struct Apu {
    nr50: Nr50,
    nr51: Nr51,
    ch1: PulseChannel<Sweeper>,
    ch2: PulseChannel<NoSweep>,
    ch3: WaveChannel,
    ch4: NoiseChannel,
    enabled: bool,
    sample_ticks: TickCounter,
    buffer: Vec<f32>,
    buffer_len: usize,
}

impl Apu {
    pub fn new(config: AudioConfig) -> Self {
        let buffer_len = config.buffer_len();
        Self {
            // Post-boot mixer state
            nr50: Nr50::from(0x77),
            nr51: Nr51::from(0xf3),
            ch1: Default::default(),
            ch2: Default::default(),
            ch3: Default::default(),
            ch4: Default::default(),
            enabled: true,
            sample_ticks: TickCounter::new(config.sample_period()),
            buffer: Vec::with_capacity(buffer_len),
            buffer_len,
        }
    }

    fn power_off(&mut self) {
        self.nr50 = Nr50::default();
        self.nr51 = Nr51::default();
        self.ch1 = Default::default();
        self.ch2 = Default::default();
        self.ch3.power_off();
        self.ch4 = Default::default();
    }

    /// Reads the register at `0xff00 | reg`.
    pub fn read(&self, reg: u8) -> u8 {
        match reg {
            reg::NR10 => self.ch1.sweeper.nr10() | 0x80,
            reg::NR11 => self.ch1.nrx1() | 0x3f,
            reg::NR12 => self.ch1.regs.nrx2.into(),
            reg::NR14 => self.ch1.regs.nrx4.read(),
            reg::NR21 => self.ch2.nrx1() | 0x3f,
            reg::NR22 => self.ch2.regs.nrx2.into(),
            reg::NR24 => self.ch2.regs.nrx4.read(),
            reg::NR30 => self.ch3.nr30() | 0x7f,
            reg::NR32 => self.ch3.nr32() | 0x9f,
            reg::NR34 => self.ch3.regs.nr34.read(),
            reg::NR42 => self.ch4.regs.nr42.into(),
            reg::NR43 => self.ch4.regs.nr43.into(),
            reg::NR44 => self.ch4.regs.nr44.read(),
            reg::NR50 => self.nr50.into(),
            reg::NR51 => self.nr51.into(),
            reg::NR52 => {
                let mut nr52 = Nr52::from(0x70);
                nr52.set_sound_enabled(self.enabled);
                nr52.set_channel_1_enabled(self.ch1.enabled());
                nr52.set_channel_2_enabled(self.ch2.enabled());
                nr52.set_channel_3_enabled(self.ch3.enabled());
                nr52.set_channel_4_enabled(self.ch4.enabled());
                nr52.into()
            }
            0x30..=0x3f => self.ch3.wave_ram[(reg & 0xf) as usize],
            // Write-only and unused
            _ => 0xff,
        }
    }

    /// Writes the register at `0xff00 | reg`.
    pub fn write(&mut self, reg: u8, val: u8) {
        if reg == reg::NR52 {
            let nr52 = Nr52::from(val);
            if self.enabled && !nr52.sound_enabled() {
                self.power_off();
            }
            self.enabled = nr52.sound_enabled();
            return;
        }
        if let 0x30..=0x3f = reg {
            self.ch3.wave_ram[(reg & 0xf) as usize] = val;
            return;
        }
        if !self.enabled {
            // Registers are read-only while the APU is off
            return;
        }

        match reg {
            reg::NR10 => self.ch1.sweeper.set_nr10(val),
            reg::NR11 => self.ch1.set_nrx1(val),
            reg::NR12 => self.ch1.set_nrx2(val),
            reg::NR13 => self.ch1.set_nrx3(val),
            reg::NR14 => self.ch1.set_nrx4(val),
            reg::NR21 => self.ch2.set_nrx1(val),
            reg::NR22 => self.ch2.set_nrx2(val),
            reg::NR23 => self.ch2.set_nrx3(val),
            reg::NR24 => self.ch2.set_nrx4(val),
            reg::NR30 => self.ch3.set_nr30(val),
            reg::NR31 => self.ch3.set_nr31(val),
            reg::NR32 => self.ch3.set_nr32(val),
            reg::NR33 => self.ch3.set_nr33(val),
            reg::NR34 => self.ch3.set_nr34(val),
            reg::NR41 => self.ch4.set_nr41(val),
            reg::NR42 => self.ch4.set_nr42(val),
            reg::NR43 => self.ch4.set_nr43(val),
            reg::NR44 => self.ch4.set_nr44(val),
            reg::NR50 => self.nr50 = val.into(),
            reg::NR51 => self.nr51 = val.into(),
            _ => (),
        }
    }

    fn frame(&self) -> [f32; 2] {
        let samples = [
            self.ch1.sample(),
            self.ch2.sample(),
            self.ch3.sample(),
            self.ch4.sample(),
        ];

        let left = mixer(self.nr51.left(), samples) * master_volume(self.nr50.vol_left());
        let right = mixer(self.nr51.right(), samples) * master_volume(self.nr50.vol_right());

        [left, right]
    }

    /// Advances every channel by `ticks` T-cycles. Returns the audio buffer once it fills up.
    pub fn execute(&mut self, ticks: usize) -> Option<Vec<f32>> {
        if !self.enabled {
            return None;
        }

        self.ch1.clock(ticks);
        self.ch2.clock(ticks);
        self.ch3.clock(ticks);
        self.ch4.clock(ticks);

        let mut frames = 0;
        self.sample_ticks.for_each_edge(ticks, || frames += 1);

        let mut full = None;
        for _ in 0..frames {
            self.buffer.extend(self.frame());
            if self.buffer.len() >= self.buffer_len {
                let buffer = mem::replace(&mut self.buffer, Vec::with_capacity(self.buffer_len));
                if full.replace(buffer).is_some() {
                    warn!("Audio buffer filled twice in one step; dropping the older one");
                }
            }
        }
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent_config() -> AudioConfig {
        AudioConfig { sample_rate: 48000, buffer_frames: 4 }
    }

    #[test]
    fn buffer_hand_off() {
        let config = silent_config();
        let period = config.sample_period();
        assert_eq!(period, 87);

        let mut apu = Apu::new(config);
        let mut buffers = Vec::new();
        for _ in 0..(period * 9) / 4 {
            if let Some(buffer) = apu.execute(4) {
                buffers.push(buffer);
            }
            assert!(apu.buffer.len() < config.buffer_len());
        }
        assert_eq!(buffers.len(), 2);
        assert!(buffers.iter().all(|b| b.len() == config.buffer_len()));
    }

    #[test]
    fn disabled_apu_produces_nothing() {
        let mut apu = Apu::new(silent_config());
        apu.write(reg::NR52, 0x00);
        assert!(!apu.enabled);
        for _ in 0..10000 {
            assert!(apu.execute(24).is_none());
        }
        assert_eq!(apu.read(reg::NR52), 0x70);
    }

    #[test]
    fn registers_locked_while_off() {
        let mut apu = Apu::new(silent_config());
        apu.write(0x3f, 0x5a);
        apu.write(reg::NR30, 0x80);
        apu.write(reg::NR34, 0x80);
        assert!(apu.ch3.enabled());
        apu.write(reg::NR52, 0x00);
        assert!(!apu.ch3.enabled());
        assert_eq!(apu.read(reg::NR30), 0x7f);
        assert_eq!(apu.read(0x3f), 0x5a, "wave RAM survives power off");
        apu.write(reg::NR50, 0x55);
        assert_eq!(apu.read(reg::NR50), 0x00);
        apu.write(0x30, 0x9c);
        assert_eq!(apu.read(0x30), 0x9c, "wave RAM stays writable");

        apu.write(reg::NR52, 0x80);
        apu.write(reg::NR50, 0x55);
        assert_eq!(apu.read(reg::NR50), 0x55);
        assert_eq!(apu.read(reg::NR52), 0xf0);
    }

    #[test]
    fn mixing_follows_panning_and_volume() {
        let mut apu = Apu::new(silent_config());
        apu.write(reg::NR50, 0x70); // left 7, right 0
        apu.write(reg::NR51, 0x22); // channel 2 both sides
        apu.write(reg::NR21, 0xc0); // 75% duty
        apu.write(reg::NR22, 0xf0);
        apu.write(reg::NR23, 0x00);
        apu.write(reg::NR24, 0x87);

        let [left, right] = apu.frame();
        assert_eq!(right, 0.0);
        assert!((left.abs() - 0.25).abs() < 1e-6, "left = {left}");

        apu.write(reg::NR51, 0x02);
        apu.write(reg::NR50, 0x07);
        let [left, right] = apu.frame();
        assert_eq!(left, 0.0);
        assert!((right.abs() - 0.25).abs() < 1e-6, "right = {right}");
    }

    #[test]
    fn nr52_reports_active_channels() {
        let mut apu = Apu::new(silent_config());
        assert_eq!(apu.read(reg::NR52), 0xf0);
        apu.write(reg::NR12, 0xf0);
        apu.write(reg::NR14, 0x80);
        assert_eq!(apu.read(reg::NR52), 0xf1);
        apu.write(reg::NR44, 0x80);
        assert_eq!(apu.read(reg::NR52), 0xf9);
    }

    #[test]
    fn length_counter_silences_channel() {
        let mut apu = Apu::new(silent_config());
        apu.write(reg::NR22, 0xf0);
        apu.write(reg::NR21, 62); // two steps left
        apu.write(reg::NR24, 0xc0);
        assert!(apu.ch2.enabled());
        apu.execute(LENGTH_STEP);
        assert!(apu.ch2.enabled());
        apu.execute(LENGTH_STEP);
        assert!(!apu.ch2.enabled());
        assert_eq!(apu.read(reg::NR52) & 0x2, 0);
    }
}
