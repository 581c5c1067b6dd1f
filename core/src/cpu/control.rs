// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use super::{instruction_set::Test, Cpu, CpuBus, Flag, Reg16};

// The conditional forms always consume their operands and report whether the branch was taken.

impl Cpu {
    fn test(&self, test: Test) -> bool {
        match test {
            Test::Nz => !self.regs.get_flag(Flag::ZERO),
            Test::Z => self.regs.get_flag(Flag::ZERO),
            Test::Nc => !self.regs.get_flag(Flag::CARRY),
            Test::C => self.regs.get_flag(Flag::CARRY),
        }
    }

    pub(super) fn jump(&mut self, bus: &impl CpuBus) {
        self.pc = self.read_immediate_16(bus);
    }

    pub(super) fn jump_hl(&mut self) {
        self.pc = self.regs.get_16(Reg16::HL);
    }

    pub(super) fn jump_conditional(&mut self, test: Test, bus: &impl CpuBus) -> bool {
        let addr = self.read_immediate_16(bus);
        let taken = self.test(test);
        if taken {
            self.pc = addr;
        }
        taken
    }

    pub(super) fn jump_relative(&mut self, bus: &impl CpuBus) {
        let offset = self.read_immediate_8(bus) as i8;
        self.pc = self.pc.wrapping_add_signed(offset as i16);
    }

    pub(super) fn jump_relative_conditional(&mut self, test: Test, bus: &impl CpuBus) -> bool {
        let offset = self.read_immediate_8(bus) as i8;
        let taken = self.test(test);
        if taken {
            self.pc = self.pc.wrapping_add_signed(offset as i16);
        }
        taken
    }

    pub(super) fn call_addr(&mut self, addr: u16, bus: &mut impl CpuBus) {
        self.push_16(self.pc, bus);
        self.pc = addr;
    }

    pub(super) fn call(&mut self, bus: &mut impl CpuBus) {
        let addr = self.read_immediate_16(bus);
        self.call_addr(addr, bus);
    }

    pub(super) fn call_conditional(&mut self, test: Test, bus: &mut impl CpuBus) -> bool {
        let addr = self.read_immediate_16(bus);
        let taken = self.test(test);
        if taken {
            self.call_addr(addr, bus);
        }
        taken
    }

    pub(super) fn rst(&mut self, addr: u16, bus: &mut impl CpuBus) {
        self.call_addr(addr, bus);
    }

    pub(super) fn ret(&mut self, bus: &impl CpuBus) {
        self.pc = self.pop_16(bus);
    }

    pub(super) fn ret_conditional(&mut self, test: Test, bus: &impl CpuBus) -> bool {
        let taken = self.test(test);
        if taken {
            self.ret(bus);
        }
        taken
    }

    pub(super) fn halt(&mut self) {
        self.halted = true;
    }

    /// Low power mode is not emulated; the padding byte is skipped.
    pub(super) fn stop(&mut self, bus: &impl CpuBus) {
        self.read_immediate_8(bus);
    }
}
