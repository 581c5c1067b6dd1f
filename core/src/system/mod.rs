// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>
mod cpu;
mod joypad;
mod ppu;
mod timer;

use std::time::Duration;

use partial_borrow::{prelude::*, SplitOff};
use thiserror::Error;

use crate::{
    apu::Apu,
    cart::{Cart, RomParseError},
    cpu::{Cpu, CpuBus},
    interrupt::InterruptState,
    joypad::{Joypad, JoypadBus},
    memory::MemoryData,
    ppu::{Ppu, PpuBus},
    timer::{Timer, TimerBus},
};

pub use crate::{apu::AudioConfig, cpu::IllegalInstruction, ppu::Scanline};

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;
pub const VBLANK_LINES: usize = 10;
pub const FRAME_LINES: usize = SCREEN_HEIGHT + VBLANK_LINES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TCycles(pub usize);

impl TCycles {
    pub const FREQ: usize = 1 << 22;
    pub const PER_LINE: usize = 456;
    pub const PER_FRAME: usize = FRAME_LINES * Self::PER_LINE;
}

impl From<TCycles> for Duration {
    fn from(cycles: TCycles) -> Duration {
        Self::from_secs_f64(cycles.0 as f64 / TCycles::FREQ as f64)
    }
}

/// Whatever a host sink fails with. Passed through to the caller of [`GameBoy::run_frame`].
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Receives the screen one scanline at a time.
pub trait LcdSink {
    /// `pixels` holds palette-mapped shades, 0 being the lightest.
    fn draw_line(&mut self, line: usize, pixels: &Scanline) -> Result<(), SinkError>;
}

/// Receives full buffers of interleaved stereo samples.
pub trait AudioSink {
    fn enqueue_audio(&mut self, samples: Vec<f32>) -> Result<(), SinkError>;
}

#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error(transparent)]
    Cartridge(#[from] RomParseError),
    #[error(transparent)]
    IllegalInstruction(#[from] IllegalInstruction),
    #[error("Host sink failed")]
    HostSink(#[source] SinkError),
}

#[derive(PartialBorrow)]
pub struct GameBoy {
    cpu: Cpu,
    timer: Timer,
    ppu: Ppu,
    apu: Apu,
    mem: MemoryData,
    joypad: Joypad,
    interrupt: InterruptState,
    cart: Cart,
    /// T-cycles run past the end of the previous frame
    cycles: usize,
}

impl GameBoy {
    pub fn new(cart: Cart, audio: AudioConfig) -> Self {
        GameBoy {
            cpu: Cpu::new(),
            timer: Timer::new(),
            ppu: Ppu::new(),
            apu: Apu::new(audio),
            mem: MemoryData::new(),
            joypad: Joypad::new(),
            interrupt: InterruptState::new(),
            cart,
            cycles: 0,
        }
    }

    pub fn from_rom(rom: Box<[u8]>) -> Result<Self, EmulatorError> {
        Ok(Self::new(Cart::from_rom(rom)?, AudioConfig::default()))
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    fn split_cpu(&mut self) -> (&mut Cpu, &mut impl CpuBus) {
        let (bus, system) = SplitOff::split_off_mut(self);
        (&mut system.cpu, bus)
    }

    fn split_ppu(&mut self) -> (&mut Ppu, &mut impl PpuBus) {
        let (bus, system) = SplitOff::split_off_mut(self);
        (&mut system.ppu, bus)
    }

    fn split_timer(&mut self) -> (&mut Timer, &mut impl TimerBus) {
        let (bus, system) = SplitOff::split_off_mut(self);
        (&mut system.timer, bus)
    }

    fn split_joypad(&mut self) -> (&mut Joypad, &mut impl JoypadBus) {
        let (bus, system) = SplitOff::split_off_mut(self);
        (&mut system.joypad, bus)
    }

    /// Replaces the held buttons. Bits follow [`crate::joypad::Button::mask_bit`]; set means
    /// pressed.
    pub fn set_input(&mut self, directions: u8, actions: u8) {
        let (joypad, bus) = self.split_joypad();
        joypad.set_input(directions, actions, bus);
    }

    /// Runs one instruction and lets every other device catch up. The T-cycles spent are
    /// credited to the frame before any sink error is returned.
    fn step(
        &mut self,
        lcd: &mut impl LcdSink,
        audio: &mut impl AudioSink,
    ) -> Result<(), EmulatorError> {
        let (cpu, bus) = self.split_cpu();
        let ticks = cpu.step(bus)?;

        let (ppu, bus) = self.split_ppu();
        let drawn = ppu.execute(ticks, lcd, bus);
        let (timer, bus) = self.split_timer();
        timer.execute(ticks, bus);
        let queued = match self.apu.execute(ticks) {
            Some(samples) => audio.enqueue_audio(samples),
            None => Ok(()),
        };
        self.cycles += ticks;

        drawn.and(queued).map_err(EmulatorError::HostSink)
    }

    /// Runs until a frame's worth of T-cycles has elapsed. The overshoot is carried into the
    /// next frame. After an error the next call picks up the same frame where it stopped.
    pub fn run_frame(
        &mut self,
        lcd: &mut impl LcdSink,
        audio: &mut impl AudioSink,
    ) -> Result<(), EmulatorError> {
        while self.cycles < TCycles::PER_FRAME {
            self.step(lcd, audio)?;
        }
        self.cycles -= TCycles::PER_FRAME;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        cart::tests::banked_rom,
        ppu::{tests::Lines, Mode},
    };

    #[derive(Default)]
    struct Buffers(Vec<Vec<f32>>);

    impl AudioSink for Buffers {
        fn enqueue_audio(&mut self, samples: Vec<f32>) -> Result<(), SinkError> {
            self.0.push(samples);
            Ok(())
        }
    }

    struct BrokenScreen;

    impl LcdSink for BrokenScreen {
        fn draw_line(&mut self, _line: usize, _pixels: &Scanline) -> Result<(), SinkError> {
            Err("screen unplugged".into())
        }
    }

    /// A ROM-only system with `program` at the entry point.
    fn game_boy(program: &[u8]) -> GameBoy {
        let mut rom = banked_rom(0x00, 0x00, 0x00);
        rom[0x100..0x100 + program.len()].copy_from_slice(program);
        GameBoy::new(Cart::from_rom(rom).expect("valid header"), AudioConfig::default())
    }

    // JR -2
    const SPIN: [u8; 2] = [0x18, 0xfe];

    #[test]
    fn frame_duration() {
        let frame = Duration::from(TCycles(TCycles::PER_FRAME));
        assert_eq!(TCycles::PER_FRAME, 70224);
        assert!((frame.as_secs_f64() * 59.7275 - 1.0).abs() < 1e-4, "{frame:?}");
    }

    #[test]
    fn frames_draw_every_line_in_order() {
        let mut gb = game_boy(&SPIN);
        let mut lines = Lines::default();
        let mut audio = Buffers::default();
        gb.run_frame(&mut lines, &mut audio).expect("frame runs");
        gb.run_frame(&mut lines, &mut audio).expect("frame runs");

        let order: Vec<_> = lines.0.iter().map(|(line, _)| *line).collect();
        let expected: Vec<_> = (0..SCREEN_HEIGHT).chain(0..SCREEN_HEIGHT).collect();
        assert_eq!(order, expected);
        assert_eq!(gb.cycles, 0, "a 12 cycle loop divides the frame evenly");
    }

    #[test]
    fn audio_buffers_reach_the_sink() {
        let mut gb = game_boy(&SPIN);
        let mut audio = Buffers::default();
        gb.run_frame(&mut Lines::default(), &mut audio).expect("frame runs");
        assert!(audio.0.is_empty());
        gb.run_frame(&mut Lines::default(), &mut audio).expect("frame runs");
        assert_eq!(audio.0.len(), 1);
        assert_eq!(audio.0[0].len(), AudioConfig::default().buffer_len());
    }

    #[test]
    fn frame_remainder_carries_over() {
        // LD (0xc000), SP; JR -5
        let mut gb = game_boy(&[0x08, 0x00, 0xc0, 0x18, 0xfb]);
        let mut lines = Lines::default();
        gb.run_frame(&mut lines, &mut Buffers::default()).expect("frame runs");
        // 2194 loops of 32 cycles, then one more 20 cycle store
        assert_eq!(gb.cycles, 4);

        // Starting 4 cycles in, the loop lands exactly on the frame boundary
        gb.run_frame(&mut lines, &mut Buffers::default()).expect("frame runs");
        assert_eq!(gb.cycles, 0);
        assert_eq!(lines.0.len(), 2 * SCREEN_HEIGHT);
    }

    #[test]
    fn illegal_instruction_aborts_frame() {
        let mut gb = game_boy(&[0x00, 0xdd]);
        let err = gb.run_frame(&mut Lines::default(), &mut Buffers::default()).unwrap_err();
        assert!(matches!(
            err,
            EmulatorError::IllegalInstruction(IllegalInstruction { opcode: 0xdd, pc: 0x0101 })
        ));
    }

    #[test]
    fn sink_errors_pass_through() {
        let mut gb = game_boy(&SPIN);
        let err = gb.run_frame(&mut BrokenScreen, &mut Buffers::default()).unwrap_err();
        match err {
            EmulatorError::HostSink(source) => assert_eq!(source.to_string(), "screen unplugged"),
            err => panic!("unexpected error {err}"),
        }
    }

    #[test]
    fn sink_error_keeps_devices_in_step() {
        let mut gb = game_boy(&SPIN);
        let (_, bus) = gb.split_cpu();
        bus.write_8(0xff07, 0x05);

        assert!(gb.run_frame(&mut BrokenScreen, &mut Buffers::default()).is_err());
        // Line 0 finishes transfer 252 cycles in, exactly 21 spins
        assert_eq!(gb.cycles, 252);
        assert_eq!(gb.ppu.mode(), Mode::HBlank);

        let mut lines = Lines::default();
        gb.run_frame(&mut lines, &mut Buffers::default()).expect("frame runs");
        assert_eq!(gb.cycles, 0);
        let order: Vec<_> = lines.0.iter().map(|(line, _)| *line).collect();
        assert_eq!(order, (1..SCREEN_HEIGHT).collect::<Vec<_>>());

        // 70224 / 16 increments, reloading 0 on each overflow
        let (_, bus) = gb.split_cpu();
        assert_eq!(bus.read_8(0xff05), (TCycles::PER_FRAME / 16 % 256) as u8);
    }

    #[test]
    fn timer_overflow_dispatches_interrupt() {
        let mut gb = game_boy(&SPIN);
        let (cpu, bus) = gb.split_cpu();
        cpu.set_ime(true);
        bus.write_8(0xff07, 0x05);
        bus.write_8(0xff06, 0xab);
        bus.write_8(0xff05, 0xfe);
        bus.write_8(0xffff, 0x04);

        let (timer, bus) = gb.split_timer();
        timer.execute(32, bus);

        let (cpu, bus) = gb.split_cpu();
        assert_eq!(bus.read_8(0xff05), 0xab);
        assert_eq!(bus.read_8(0xff0f) & 0x04, 0x04);
        assert_eq!(cpu.step(bus), Ok(20));
        assert_eq!(cpu.pc(), 0x0050);
        assert_eq!(bus.read_16(cpu.sp()), 0x0100);
        assert_eq!(bus.read_8(0xff0f) & 0x04, 0);
    }

    #[test]
    fn joypad_through_bus() {
        let mut gb = game_boy(&SPIN);
        gb.set_input(0b0001, 0b0010);
        let (_, bus) = gb.split_cpu();
        // Bit 4 low selects the directions
        bus.write_8(0xff00, 0x20);
        assert_eq!(bus.read_8(0xff00) & 0x0f, 0b1110);
        bus.write_8(0xff00, 0x10);
        assert_eq!(bus.read_8(0xff00) & 0x0f, 0b1101);
        bus.write_8(0xff00, 0x30);
        assert_eq!(bus.read_8(0xff00), 0xff);
        // The new press was latched in IF
        assert_eq!(bus.read_8(0xff0f) & 0x10, 0x10);
    }

    #[test]
    fn input_release_does_not_interrupt() {
        let mut gb = game_boy(&SPIN);
        gb.set_input(0b1000, 0);
        gb.interrupt.set_flags(0);
        gb.set_input(0, 0);
        assert_eq!(gb.interrupt.flags & 0x10, 0);
    }
}
