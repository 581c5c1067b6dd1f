// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use super::{Cpu, CpuBus, INTERRUPT_CYCLES};

/// Handler address of interrupt 0 (V-Blank); each following source is 8 bytes further.
const VECTOR_BASE: u16 = 0x40;

impl Cpu {
    pub(super) fn ei(&mut self) {
        self.ime = true;
    }

    pub(super) fn di(&mut self) {
        self.ime = false;
    }

    pub(super) fn reti(&mut self, bus: &impl CpuBus) {
        self.ret(bus);
        self.ime = true;
    }

    /// Wakes from HALT on any pending interrupt and, if IME is set, dispatches the highest
    /// priority one. Returns the cycles spent dispatching.
    pub(super) fn handle_interrupts(&mut self, bus: &mut impl CpuBus) -> Option<usize> {
        if !bus.interrupt_pending() {
            return None;
        }
        self.halted = false;

        if !self.ime {
            return None;
        }
        let bit = bus.pop_interrupt()?;
        self.di();
        self.call_addr(VECTOR_BASE + 8 * bit as u16, bus);
        Some(INTERRUPT_CYCLES)
    }
}
