// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

mod render;

use bilge::prelude::*;

use crate::{
    reg,
    system::{LcdSink, SinkError, SCREEN_HEIGHT, SCREEN_WIDTH},
    tick::TickCounter,
};

pub const VRAM_SIZE: usize = 0x2000;
pub const OAM_SIZE: usize = 0xa0;

/// Lines 144 through 153 are V-Blank.
const FRAME_LINES: u8 = 154;

pub type Scanline = [u8; SCREEN_WIDTH];

pub trait PpuBus {
    fn request_vblank_interrupt(&mut self);
    fn request_stat_interrupt(&mut self);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    HBlank = 0,
    VBlank,
    OamScan,
    Transfer,
}

impl Mode {
    const fn dots(self) -> usize {
        match self {
            Self::OamScan => 80,
            Self::Transfer => 168,
            Self::HBlank => 208,
            Self::VBlank => 456,
        }
    }

    /// STAT bit enabling the interrupt on entry to this mode.
    const fn stat_source(self) -> Option<u8> {
        match self {
            Self::HBlank => Some(0x08),
            Self::VBlank => Some(0x10),
            Self::OamScan => Some(0x20),
            Self::Transfer => None,
        }
    }
}

#[bitsize(8)]
#[derive(Default, FromBits, DebugBits, Clone, Copy)]
pub(crate) struct Lcdc {
    bg_enable: bool,
    obj_enable: bool,
    obj_tall: bool,
    bg_map_high: bool,
    tile_data_unsigned: bool,
    window_enable: bool,
    window_map_high: bool,
    lcd_enable: bool,
}

const STAT_LYC_SOURCE: u8 = 0x40;
const STAT_WRITABLE: u8 = 0x78;

pub struct Ppu {
    vram: Box<[u8; VRAM_SIZE]>,
    oam: [u8; OAM_SIZE],
    lcdc: Lcdc,
    stat: u8,
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,
    /// Window line counter
    wly: u8,
    mode: Mode,
    dots: TickCounter,
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            vram: Box::new([0; VRAM_SIZE]),
            oam: [0; OAM_SIZE],
            // Post-boot register values
            lcdc: Lcdc::from(0x91),
            stat: 0,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            bgp: 0xfc,
            obp0: 0xff,
            obp1: 0xff,
            wy: 0,
            wx: 0,
            wly: 0,
            mode: Mode::OamScan,
            dots: TickCounter::new(Mode::OamScan.dots()),
        }
    }

    pub fn lcd_enabled(&self) -> bool {
        self.lcdc.lcd_enable()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn read_vram(&self, addr: u16) -> u8 {
        self.vram[addr as usize & (VRAM_SIZE - 1)]
    }

    pub fn write_vram(&mut self, addr: u16, val: u8) {
        self.vram[addr as usize & (VRAM_SIZE - 1)] = val;
    }

    pub fn vram(&self) -> &[u8; VRAM_SIZE] {
        &self.vram
    }

    pub fn read_oam(&self, addr: u16) -> u8 {
        self.oam[addr as usize - 0xfe00]
    }

    pub fn write_oam(&mut self, addr: u16, val: u8) {
        self.oam[addr as usize - 0xfe00] = val;
    }

    pub fn oam_mut(&mut self) -> &mut [u8; OAM_SIZE] {
        &mut self.oam
    }

    /// Reads the register at `0xff00 | reg`.
    pub fn read(&self, reg: u8) -> u8 {
        match reg {
            reg::LCDC => self.lcdc.into(),
            reg::STAT => {
                let coincidence = ((self.ly == self.lyc) as u8) << 2;
                0x80 | self.stat | coincidence | self.mode as u8
            }
            reg::SCY => self.scy,
            reg::SCX => self.scx,
            reg::LY => self.ly,
            reg::LYC => self.lyc,
            reg::BGP => self.bgp,
            reg::OBP0 => self.obp0,
            reg::OBP1 => self.obp1,
            reg::WY => self.wy,
            reg::WX => self.wx,
            _ => 0xff,
        }
    }

    /// Writes the register at `0xff00 | reg`.
    pub fn write(&mut self, reg: u8, val: u8) {
        match reg {
            reg::LCDC => self.set_lcdc(val),
            reg::STAT => self.stat = val & STAT_WRITABLE,
            reg::SCY => self.scy = val,
            reg::SCX => self.scx = val,
            // LY is read-only
            reg::LY => (),
            reg::LYC => self.lyc = val,
            reg::BGP => self.bgp = val,
            reg::OBP0 => self.obp0 = val,
            reg::OBP1 => self.obp1 = val,
            reg::WY => self.wy = val,
            reg::WX => self.wx = val,
            _ => (),
        }
    }

    fn set_lcdc(&mut self, val: u8) {
        let was_enabled = self.lcd_enabled();
        self.lcdc = val.into();
        match (was_enabled, self.lcd_enabled()) {
            (true, false) => {
                self.ly = 0;
                self.wly = 0;
                self.mode = Mode::HBlank;
                self.dots = TickCounter::new(0);
            }
            (false, true) => {
                self.mode = Mode::OamScan;
                self.dots = TickCounter::new(Mode::OamScan.dots());
            }
            _ => (),
        }
    }

    fn set_mode(&mut self, mode: Mode, bus: &mut impl PpuBus) {
        self.mode = mode;
        self.dots.rearm(mode.dots());
        if let Some(source) = mode.stat_source() {
            if self.stat & source != 0 {
                bus.request_stat_interrupt();
            }
        }
    }

    fn set_ly(&mut self, ly: u8, bus: &mut impl PpuBus) {
        self.ly = ly;
        if self.ly == self.lyc && self.stat & STAT_LYC_SOURCE != 0 {
            bus.request_stat_interrupt();
        }
    }

    fn draw_line(&mut self, lcd: &mut impl LcdSink) -> Result<(), SinkError> {
        let line = self.render_line();
        let drawn = lcd.draw_line(self.ly as usize, &line);
        if self.window_visible() {
            self.wly = self.wly.wrapping_add(1);
        }
        drawn
    }

    fn next_mode(
        &mut self,
        lcd: &mut impl LcdSink,
        bus: &mut impl PpuBus,
    ) -> Result<(), SinkError> {
        match self.mode {
            Mode::OamScan => self.set_mode(Mode::Transfer, bus),
            Mode::Transfer => {
                let drawn = self.draw_line(lcd);
                self.set_mode(Mode::HBlank, bus);
                drawn?;
            }
            Mode::HBlank => {
                self.set_ly(self.ly + 1, bus);
                if self.ly as usize == SCREEN_HEIGHT {
                    bus.request_vblank_interrupt();
                    self.set_mode(Mode::VBlank, bus);
                } else {
                    self.set_mode(Mode::OamScan, bus);
                }
            }
            Mode::VBlank => {
                if self.ly + 1 == FRAME_LINES {
                    self.wly = 0;
                    self.set_ly(0, bus);
                    self.set_mode(Mode::OamScan, bus);
                } else {
                    self.set_ly(self.ly + 1, bus);
                }
            }
        }
        Ok(())
    }

    /// Advances the scanline state machine by `ticks` T-cycles. A sink error does not stop the
    /// machine; the first one is returned once all `ticks` are spent.
    pub fn execute(
        &mut self,
        ticks: usize,
        lcd: &mut impl LcdSink,
        bus: &mut impl PpuBus,
    ) -> Result<(), SinkError> {
        if !self.lcd_enabled() {
            return Ok(());
        }

        let mut result = Ok(());
        let mut ticks = ticks;
        while self.dots.advance(ticks) {
            ticks = 0;
            let next = self.next_mode(lcd, bus);
            if result.is_ok() {
                result = next;
            }
        }
        result
    }
}
