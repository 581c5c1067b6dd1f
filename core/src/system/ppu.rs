// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>
use partial_borrow::prelude::*;

use crate::{interrupt::Interrupt, ppu::PpuBus};

use super::GameBoy;

impl PpuBus for partial!(GameBoy ! ppu, mut interrupt) {
    fn request_vblank_interrupt(&mut self) {
        self.interrupt.request(Interrupt::VBlank);
    }

    fn request_stat_interrupt(&mut self) {
        self.interrupt.request(Interrupt::Stat);
    }
}
