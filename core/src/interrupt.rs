// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    VBlank = 0,
    Stat,
    Timer,
    // Bit 3 is the serial interrupt, which nothing raises
    Joypad = 4,
}

/// The IE and IF latches.
#[derive(Debug, Default)]
pub struct InterruptState {
    pub enable: u8,
    pub flags: u8,
}

impl InterruptState {
    const MASK: u8 = 0x1f;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, interrupt: Interrupt) {
        self.flags |= 1 << interrupt as u8;
    }

    fn active(&self) -> u8 {
        self.enable & self.flags & Self::MASK
    }

    pub fn pending(&self) -> bool {
        self.active() != 0
    }

    /// Acknowledges the highest priority pending interrupt, returning its index.
    pub fn pop(&mut self) -> Option<u8> {
        let active = self.active();
        if active == 0 {
            return None;
        }
        let bit = active.trailing_zeros() as u8;
        self.flags &= !(1 << bit);
        Some(bit)
    }

    pub fn flags(&self) -> u8 {
        // Unused bits read high
        self.flags | !Self::MASK
    }

    pub fn set_flags(&mut self, flags: u8) {
        self.flags = flags & Self::MASK;
    }
}
