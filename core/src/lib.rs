// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

#![allow(clippy::new_without_default)]

mod apu;
mod cpu;
mod interrupt;
mod memory;
mod ppu;
mod reg;
mod tick;
mod timer;

pub mod cart;
pub mod joypad;
pub mod system;
