// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

pub const WRAM_SIZE: usize = 0x2000;
pub const HRAM_SIZE: usize = 0x7f;

pub type WRamBytes = [u8; WRAM_SIZE];
pub type HRamBytes = [u8; HRAM_SIZE];

/// Memory owned by the bus itself rather than by a device.
pub struct MemoryData {
    pub wram: WRamBytes,
    pub hram: HRamBytes,
    /// Last page written to the OAM DMA register
    pub dma_source: u8,
}

impl MemoryData {
    pub fn new() -> Self {
        Self { wram: [0; WRAM_SIZE], hram: [0; HRAM_SIZE], dma_source: 0xff }
    }

    /// Maps 0xc000-0xfdff, including the echo area, onto work RAM.
    pub fn wram_index(addr: u16) -> usize {
        addr as usize & (WRAM_SIZE - 1)
    }

    pub fn read_wram(&self, addr: u16) -> u8 {
        self.wram[Self::wram_index(addr)]
    }

    pub fn write_wram(&mut self, addr: u16, val: u8) {
        self.wram[Self::wram_index(addr)] = val;
    }
}
