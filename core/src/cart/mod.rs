// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use ambassador::{delegatable_trait, Delegate};
use log::debug;
use thiserror::Error;

use self::{
    mbc1::Mbc1,
    mem::{Mem, OptionalSegment, Segment},
    save::CartSave,
    simple::Simple,
};

mod mbc1;
mod mem;
pub mod save;
mod simple;

pub const ROM_BANK_SIZE: usize = 0x4000;
pub const RAM_BANK_SIZE: usize = 0x2000;
const HEADER_END: usize = 0x150;

/// Translates CPU addresses into offsets within the cartridge's ROM and RAM.
#[delegatable_trait]
pub trait Mbc {
    fn rom_offset(&self, addr: u16) -> usize;
    /// `None` while external RAM is disabled.
    fn ram_offset(&self, addr: u16) -> Option<usize>;
    fn write_register(&mut self, addr: u16, val: u8);
}

#[derive(Delegate)]
#[delegate(Mbc)]
pub enum AnyMbc {
    Simple(Simple),
    Mbc1(Mbc1),
}

pub struct Cart<M = AnyMbc> {
    mem: Mem,
    mbc: M,
    battery_backed: bool,
}

impl<M: Mbc> Cart<M> {
    pub fn read_low(&self, addr: u16) -> u8 {
        self.mem.rom.read(self.mbc.rom_offset(addr))
    }

    pub fn write_low(&mut self, addr: u16, val: u8) {
        self.mbc.write_register(addr, val);
    }

    pub fn read_high(&self, addr: u16) -> u8 {
        self.mbc
            .ram_offset(addr)
            .map_or(0xff, |offset| self.mem.ram.read(offset))
    }

    pub fn write_high(&mut self, addr: u16, val: u8) {
        if let Some(offset) = self.mbc.ram_offset(addr) {
            self.mem.ram.write(offset, val);
        }
    }

    /// `len` bytes of banked ROM starting at `addr`. The run must not cross a bank boundary.
    pub fn rom_slice(&self, addr: u16, len: usize) -> &[u8] {
        self.mem.rom.slice(self.mbc.rom_offset(addr), len)
    }

    /// `len` bytes of banked external RAM starting at `addr`, or open bus while disabled.
    pub fn ram_slice(&self, addr: u16, len: usize) -> &[u8] {
        match self.mbc.ram_offset(addr) {
            Some(offset) => self.mem.ram.slice(offset, len),
            None => mem::open_bus(len),
        }
    }
}

#[derive(Error, Debug)]
pub enum RomParseError {
    #[error("Unknown cartrige type: {0:#x}")]
    UnknownCartType(u8),
    #[error("Unknown ROM size ID: {0:#x}")]
    UnknownRomSize(u8),
    #[error("Unknown RAM size ID: {0:#x}")]
    UnknownRamSize(u8),
    #[error("Provided ROM is too large")]
    LargeRom,
    #[error("Provided ROM is too small to hold a header ({0} bytes)")]
    Truncated(usize),
    #[error("Save holds {actual} bytes of RAM, but the cartridge has {expected}")]
    SaveMismatch { expected: usize, actual: usize },
}

impl Cart {
    pub fn from_rom(rom: Box<[u8]>) -> Result<Self, RomParseError> {
        if rom.len() < HEADER_END {
            return Err(RomParseError::Truncated(rom.len()));
        }

        let cart_type = rom[0x147];
        let rom_banks = match rom[0x148] {
            id @ 0x0..=0x6 => 2 << id,
            id => return Err(RomParseError::UnknownRomSize(id)),
        };
        let ram_size = match rom[0x149] {
            0x00 => 0,
            0x02 => RAM_BANK_SIZE,
            0x03 => 4 * RAM_BANK_SIZE,
            0x04 => 16 * RAM_BANK_SIZE,
            0x05 => 8 * RAM_BANK_SIZE,
            id => return Err(RomParseError::UnknownRamSize(id)),
        };

        let mbc = match cart_type {
            0x00 => AnyMbc::Simple(Simple),
            0x01..=0x03 => AnyMbc::Mbc1(Mbc1::new(rom_banks, ram_size)),
            _ => return Err(RomParseError::UnknownCartType(cart_type)),
        };

        let rom_size = rom_banks * ROM_BANK_SIZE;
        if rom_size < rom.len() {
            return Err(RomParseError::LargeRom);
        }
        let rom = if rom_size > rom.len() {
            let mut vec = Vec::from(rom);
            vec.resize(rom_size, 0);
            vec.into_boxed_slice()
        } else {
            rom
        };
        let rom = Segment::try_from(rom).map_err(|_| RomParseError::LargeRom)?;

        let cart = Self {
            mem: Mem { rom, ram: OptionalSegment::new(ram_size) },
            mbc,
            battery_backed: cart_type == 0x03,
        };
        debug!(
            "Loaded \"{}\": type {cart_type:#04x}, {rom_banks} ROM banks, {ram_size} bytes of RAM",
            cart.title()
        );
        Ok(cart)
    }

    /// The game title stored in the header, with padding stripped.
    pub fn title(&self) -> String {
        let raw = self.mem.rom.slice(0x134, 0x10);
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).trim().to_owned()
    }

    pub fn battery_backed(&self) -> bool {
        self.battery_backed
    }

    pub fn load_from_save(&mut self, save: CartSave) -> Result<(), RomParseError> {
        let expected = self.mem.ram.len();
        let actual = save.ram.len();
        if expected != actual {
            return Err(RomParseError::SaveMismatch { expected, actual });
        }
        self.mem.ram = save
            .ram
            .try_into()
            .map_err(|_| RomParseError::SaveMismatch { expected, actual })?;
        Ok(())
    }

    pub fn save(&self) -> Option<CartSave> {
        self.battery_backed.then(|| CartSave { ram: self.mem.ram.raw() })
    }
}
