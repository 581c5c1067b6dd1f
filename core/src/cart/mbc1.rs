// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use super::{Mbc, RAM_BANK_SIZE};

const LARGE_ROM_BANKS: usize = 32;

pub struct Mbc1 {
    rom_bank: u8,
    secondary: u8,
    advanced_banking: bool,
    ram_enabled: bool,
    rom_bank_mask: u8,
    large_rom: bool,
    large_ram: bool,
}

impl Mbc1 {
    pub fn new(rom_banks: usize, ram_size: usize) -> Self {
        let bank_bits = rom_banks.trailing_zeros().min(5);
        Self {
            rom_bank: 1,
            secondary: 0,
            advanced_banking: false,
            ram_enabled: false,
            rom_bank_mask: ((1u32 << bank_bits) - 1) as u8,
            large_rom: rom_banks > LARGE_ROM_BANKS,
            large_ram: ram_size > RAM_BANK_SIZE,
        }
    }

    fn set_rom_bank(&mut self, val: u8) {
        let bank = val & self.rom_bank_mask;
        self.rom_bank = if bank == 0 { 1 } else { bank };
    }
}

impl Mbc for Mbc1 {
    fn rom_offset(&self, addr: u16) -> usize {
        let upper = self.secondary << 5;
        let bank = if addr & 0x4000 == 0 {
            if self.advanced_banking && self.large_rom {
                upper
            } else {
                0
            }
        } else if !self.advanced_banking || self.large_rom {
            upper | self.rom_bank
        } else {
            self.rom_bank
        };

        ((bank as usize) << 14) | (addr & 0x3fff) as usize
    }

    fn ram_offset(&self, addr: u16) -> Option<usize> {
        if !self.ram_enabled {
            return None;
        }

        let bank = if self.advanced_banking && self.large_ram {
            self.secondary
        } else {
            0
        };
        Some(((bank as usize) << 13) | (addr & 0x1fff) as usize)
    }

    fn write_register(&mut self, addr: u16, val: u8) {
        match (addr >> 13) & 0x3 {
            0 => self.ram_enabled = val & 0xf == 0xa,
            1 => self.set_rom_bank(val),
            2 => self.secondary = val & 0x3,
            3 => self.advanced_banking = val & 0x1 != 0,
            _ => unreachable!(),
        }
    }
}
