// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

//! Low bytes of the memory-mapped I/O registers at 0xff00.

macro_rules! u8_consts {
    ($($name:ident = $val:expr),* $(,)?) => {
        $(
            pub const $name: u8 = $val;
        )*
    };
}

u8_consts! {
    P1 = 0x00,    // Joypad                                    | Mixed
    SB = 0x01,    // Serial transfer data                      | R/W
    SC = 0x02,    // Serial transfer control                   | R/W
    DIV = 0x04,   // Divider register                          | R/W
    TIMA = 0x05,  // Timer counter                             | R/W
    TMA = 0x06,   // Timer modulo                              | R/W
    TAC = 0x07,   // Timer control                             | R/W
    IF = 0x0f,    // Interrupt flag                            | R/W
    NR10 = 0x10,  // Sound channel 1 sweep                     | R/W
    NR11 = 0x11,  // Sound channel 1 length timer & duty cycle | Mixed
    NR12 = 0x12,  // Sound channel 1 volume & envelope         | R/W
    NR13 = 0x13,  // Sound channel 1 wavelength low            | W
    NR14 = 0x14,  // Sound channel 1 wavelength high & control | Mixed
    NR21 = 0x16,  // Sound channel 2 length timer & duty cycle | Mixed
    NR22 = 0x17,  // Sound channel 2 volume & envelope         | R/W
    NR23 = 0x18,  // Sound channel 2 wavelength low            | W
    NR24 = 0x19,  // Sound channel 2 wavelength high & control | Mixed
    NR30 = 0x1a,  // Sound channel 3 DAC enable                | R/W
    NR31 = 0x1b,  // Sound channel 3 length timer              | W
    NR32 = 0x1c,  // Sound channel 3 output level              | R/W
    NR33 = 0x1d,  // Sound channel 3 wavelength low            | W
    NR34 = 0x1e,  // Sound channel 3 wavelength high & control | Mixed
    NR41 = 0x20,  // Sound channel 4 length timer              | W
    NR42 = 0x21,  // Sound channel 4 volume & envelope         | R/W
    NR43 = 0x22,  // Sound channel 4 frequency & randomness    | R/W
    NR44 = 0x23,  // Sound channel 4 control                   | Mixed
    NR50 = 0x24,  // Master volume & VIN panning               | R/W
    NR51 = 0x25,  // Sound panning                             | R/W
    NR52 = 0x26,  // Sound on/off                              | Mixed
    LCDC = 0x40,  // LCD control                               | R/W
    STAT = 0x41,  // LCD status                                | Mixed
    SCY = 0x42,   // Viewport Y position                       | R/W
    SCX = 0x43,   // Viewport X position                       | R/W
    LY = 0x44,    // LCD Y coordinate                          | R
    LYC = 0x45,   // LY compare                                | R/W
    DMA = 0x46,   // OAM DMA source address & start            | R/W
    BGP = 0x47,   // BG palette data                           | R/W
    OBP0 = 0x48,  // OBJ palette 0 data                        | R/W
    OBP1 = 0x49,  // OBJ palette 1 data                        | R/W
    WY = 0x4a,    // Window Y position                         | R/W
    WX = 0x4b,    // Window X position plus 7                  | R/W
    IE = 0xff,    // Interrupt enable                          | R/W
}
