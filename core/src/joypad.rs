// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Right = 0,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    /// Bit within the direction or action mask handed to [`Joypad::set_input`].
    pub fn mask_bit(self) -> u8 {
        1 << (self as u8 & 0x3)
    }

    pub fn is_direction(self) -> bool {
        (self as u8) < 4
    }
}

pub trait JoypadBus {
    fn request_joypad_interrupt(&mut self);
}

pub struct Joypad {
    /// Pressed buttons, directions in the low nibble and actions in the high nibble
    state: u8,
    p1: u8,
}

impl Joypad {
    const SELECT_DIRECTIONS: u8 = 0x10;
    const SELECT_ACTIONS: u8 = 0x20;

    pub fn new() -> Self {
        // Upper 2 bits of P1 are locked on
        Self { state: 0, p1: 0xc0 | Self::SELECT_DIRECTIONS | Self::SELECT_ACTIONS }
    }

    /// Replaces the pressed buttons. Set bits mean "pressed".
    pub fn set_input(&mut self, directions: u8, actions: u8, bus: &mut impl JoypadBus) {
        let state = (directions & 0x0f) | (actions << 4);
        if state & !self.state != 0 {
            bus.request_joypad_interrupt();
        }
        self.state = state;
    }

    fn direction_bits(&self) -> u8 {
        !self.state & 0x0f
    }

    fn action_bits(&self) -> u8 {
        !(self.state >> 4) & 0x0f
    }

    pub fn p1(&self) -> u8 {
        let mut bits = 0x0f;
        if self.p1 & Self::SELECT_DIRECTIONS == 0 {
            bits &= self.direction_bits();
        }
        if self.p1 & Self::SELECT_ACTIONS == 0 {
            bits &= self.action_bits();
        }

        self.p1 & 0xf0 | bits
    }

    pub fn set_p1(&mut self, p1: u8) {
        self.p1 &= !0x30;
        self.p1 |= p1 & 0x30;
    }
}
