// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use super::Mbc;

/// ROM-only cartridge: 32 KiB mapped straight through, no registers.
#[derive(Default)]
pub struct Simple;

impl Mbc for Simple {
    fn rom_offset(&self, addr: u16) -> usize {
        addr as usize
    }

    fn ram_offset(&self, addr: u16) -> Option<usize> {
        Some((addr & 0x1fff) as usize)
    }

    fn write_register(&mut self, _addr: u16, _val: u8) {}
}
