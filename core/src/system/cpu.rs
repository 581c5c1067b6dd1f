// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>
use log::trace;
use partial_borrow::prelude::*;

use crate::{
    cart::Cart,
    cpu::CpuBus,
    memory::MemoryData,
    ppu::{Mode, Ppu, OAM_SIZE},
    reg,
};

use super::GameBoy;

/// The `OAM_SIZE` bytes an OAM DMA from page `prefix` copies, routed like CPU reads.
fn slice_at_prefix<'a>(
    prefix: u8,
    cart: &'a Cart,
    ppu: &'a Ppu,
    mem: &'a MemoryData,
) -> &'a [u8] {
    let addr = (prefix as u16) << 8;
    match prefix {
        0x00..=0x7f => cart.rom_slice(addr, OAM_SIZE),
        0x80..=0x9f => {
            let start = addr as usize - 0x8000;
            &ppu.vram()[start..start + OAM_SIZE]
        }
        0xa0..=0xbf => cart.ram_slice(addr, OAM_SIZE),
        // Pages past the echo area read work RAM as well
        0xc0..=0xff => {
            let start = MemoryData::wram_index(addr);
            &mem.wram[start..start + OAM_SIZE]
        }
    }
}

impl CpuBus for partial!(GameBoy ! cpu, mut *) {
    fn read_8(&self, addr: u16) -> u8 {
        match (addr >> 8) as u8 {
            0x00..=0x7f => self.cart.read_low(addr),
            0x80..=0x9f => self.ppu.read_vram(addr),
            0xa0..=0xbf => self.cart.read_high(addr),
            0xc0..=0xfd => self.mem.read_wram(addr),
            0xfe => match addr as u8 {
                0x00..=0x9f => self.ppu.read_oam(addr),
                0xa0..=0xff => match self.ppu.mode() {
                    Mode::OamScan | Mode::Transfer => 0xff,
                    Mode::HBlank | Mode::VBlank => 0x00,
                },
            },
            0xff => match addr as u8 {
                low @ 0x80..=0xfe => self.mem.hram[low as usize - 0x80],
                reg::P1 => self.joypad.p1(),
                reg::SB | reg::SC => 0xff,
                reg::DIV => self.timer.div(),
                reg::TIMA => self.timer.tima(),
                reg::TMA => self.timer.tma(),
                reg::TAC => self.timer.tac(),
                reg::IF => self.interrupt.flags(),
                reg::IE => self.interrupt.enable,
                reg::DMA => self.mem.dma_source,
                low @ 0x10..=0x3f => self.apu.read(low),
                low @ reg::LCDC..=reg::WX => self.ppu.read(low),
                low => {
                    trace!("Read from unmapped I/O register {:#06x}", 0xff00 | low as u16);
                    0xff
                }
            },
        }
    }

    fn write_8(&mut self, addr: u16, val: u8) {
        match (addr >> 8) as u8 {
            0x00..=0x7f => self.cart.write_low(addr, val),
            0x80..=0x9f => self.ppu.write_vram(addr, val),
            0xa0..=0xbf => self.cart.write_high(addr, val),
            0xc0..=0xfd => self.mem.write_wram(addr, val),
            0xfe => match addr as u8 {
                0x00..=0x9f => self.ppu.write_oam(addr, val),
                0xa0..=0xff => (),
            },
            0xff => match addr as u8 {
                low @ 0x80..=0xfe => self.mem.hram[low as usize - 0x80] = val,
                reg::P1 => self.joypad.set_p1(val),
                reg::SB | reg::SC => (),
                reg::DIV => self.timer.reset_div(),
                reg::TIMA => self.timer.set_tima(val),
                reg::TMA => self.timer.set_tma(val),
                reg::TAC => self.timer.set_tac(val),
                reg::IF => self.interrupt.set_flags(val),
                reg::IE => self.interrupt.enable = val,
                reg::DMA => {
                    self.mem.dma_source = val;
                    let mut oam = [0; OAM_SIZE];
                    oam.copy_from_slice(slice_at_prefix(val, &self.cart, &self.ppu, &self.mem));
                    *self.ppu.oam_mut() = oam;
                }
                low @ 0x10..=0x3f => self.apu.write(low, val),
                low @ reg::LCDC..=reg::WX => self.ppu.write(low, val),
                low => {
                    trace!("Write of {val:#04x} to unmapped I/O register {:#06x}", 0xff00 | low as u16)
                }
            },
        }
    }

    fn pop_interrupt(&mut self) -> Option<u8> {
        self.interrupt.pop()
    }

    fn interrupt_pending(&self) -> bool {
        self.interrupt.pending()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        apu::AudioConfig,
        cart::{tests::banked_rom, Cart},
        cpu::CpuBus,
        system::GameBoy,
    };

    fn game_boy() -> GameBoy {
        let cart = Cart::from_rom(banked_rom(0x01, 0x05, 0x03)).expect("valid header");
        GameBoy::new(cart, AudioConfig::default())
    }

    #[test]
    fn wram_echo() {
        let mut gb = game_boy();
        let (_, bus) = gb.split_cpu();
        for (i, addr) in (0xc000..0xde00).step_by(0x1f7).enumerate() {
            bus.write_8(addr, i as u8);
        }
        for (i, addr) in (0xc000..0xde00).step_by(0x1f7).enumerate() {
            assert_eq!(bus.read_8(addr), i as u8, "{addr:#06x}");
            assert_eq!(bus.read_8(addr + 0x2000), i as u8, "{addr:#06x} echo");
        }
        bus.write_8(0xfd00, 0x5a);
        assert_eq!(bus.read_8(0xdd00), 0x5a);
    }

    #[test]
    fn hram_and_interrupt_registers() {
        let mut gb = game_boy();
        let (_, bus) = gb.split_cpu();
        bus.write_8(0xff80, 0x12);
        bus.write_8(0xfffe, 0x34);
        bus.write_8(0xffff, 0xff);
        bus.write_8(0xff0f, 0xff);
        assert_eq!(bus.read_8(0xff80), 0x12);
        assert_eq!(bus.read_8(0xfffe), 0x34);
        assert_eq!(bus.read_8(0xffff), 0xff);
        assert_eq!(bus.read_8(0xff0f), 0xff);
        bus.write_8(0xff0f, 0x01);
        assert_eq!(bus.read_8(0xff0f), 0xe1);
    }

    #[test]
    fn mbc1_bank_switch() {
        let mut gb = game_boy();
        let (_, bus) = gb.split_cpu();
        assert_eq!(bus.read_8(0x4000), 1);
        bus.write_8(0x2000, 0x2a);
        assert_eq!(bus.read_8(0x4000), 0x0a, "a 64 bank ROM keeps 5 bits of the primary bank");
        bus.write_8(0x4000, 0x01);
        assert_eq!(bus.read_8(0x4000), 0x2a);
        assert_eq!(bus.read_8(0x0000), 0);
    }

    #[test]
    fn external_ram() {
        let mut gb = game_boy();
        let (_, bus) = gb.split_cpu();
        bus.write_8(0xa000, 0x42);
        assert_eq!(bus.read_8(0xa000), 0xff, "RAM is disabled at power on");
        bus.write_8(0x0000, 0x0a);
        bus.write_8(0xa000, 0x42);
        assert_eq!(bus.read_8(0xa000), 0x42);
    }

    #[test]
    fn oam_dma() {
        let mut gb = game_boy();
        let (_, bus) = gb.split_cpu();
        for i in 0..0xa0 {
            bus.write_8(0xc100 + i, i as u8 ^ 0x55);
        }
        bus.write_8(0xff46, 0xc1);
        for i in 0..0xa0 {
            assert_eq!(bus.read_8(0xfe00 + i), i as u8 ^ 0x55);
        }
        assert_eq!(bus.read_8(0xff46), 0xc1);

        // From banked ROM
        bus.write_8(0x2000, 0x03);
        bus.write_8(0xff46, 0x40);
        assert!((0..0xa0).all(|i| bus.read_8(0xfe00 + i) == 3));

        // From VRAM
        bus.write_8(0x9f9f, 0x77);
        bus.write_8(0xff46, 0x9f);
        assert_eq!(bus.read_8(0xfe9f), 0x77);
    }

    #[test]
    fn prohibited_area() {
        let mut gb = game_boy();
        let (_, bus) = gb.split_cpu();
        // The PPU starts in OAM scan
        assert_eq!(bus.read_8(0xfea0), 0xff);
        bus.write_8(0xfeff, 0x12);
        assert_eq!(bus.read_8(0xfeff), 0xff);

        // LCD off leaves the PPU in H-Blank
        bus.write_8(0xff40, 0x11);
        assert_eq!(bus.read_8(0xfea0), 0x00);
        assert_eq!(bus.read_8(0xff41) & 0x3, 0);
    }

    #[test]
    fn unmapped_io() {
        let mut gb = game_boy();
        let (_, bus) = gb.split_cpu();
        bus.write_8(0xff4d, 0x01);
        assert_eq!(bus.read_8(0xff4d), 0xff);
        assert_eq!(bus.read_8(0xff01), 0xff);
        assert_eq!(bus.read_8(0xff7f), 0xff);
    }

    #[test]
    fn ppu_and_timer_registers() {
        let mut gb = game_boy();
        let (_, bus) = gb.split_cpu();
        bus.write_8(0xff42, 0x12);
        bus.write_8(0xff44, 0x99);
        bus.write_8(0xff06, 0x34);
        assert_eq!(bus.read_8(0xff42), 0x12);
        assert_eq!(bus.read_8(0xff44), 0x00, "LY is read-only");
        assert_eq!(bus.read_8(0xff06), 0x34);
        assert_eq!(bus.read_8(0xff40), 0x91);
        bus.write_8(0xff26, 0x00);
        assert_eq!(bus.read_8(0xff26), 0x70);
    }
}
