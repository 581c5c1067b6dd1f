// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use super::{
    instruction_set::{HlIncDec, Operand8, Var8},
    Cpu, CpuBus, Reg16, Reg8,
};

/// Addresses `0xff00 + offset`, the I/O page.
fn high(offset: u8) -> u16 {
    0xff00 | offset as u16
}

impl Cpu {
    pub(super) fn load(&mut self, dst: Var8, src: Operand8, bus: &mut impl CpuBus) {
        let val = self.read_operand(src, bus);
        self.write_var(dst, val, bus);
    }

    pub(super) fn load_reg_mem_a(&mut self, reg: Reg16, bus: &mut impl CpuBus) {
        bus.write_8(self.regs.get_16(reg), self.regs[Reg8::A]);
    }

    pub(super) fn load_a_reg_mem(&mut self, reg: Reg16, bus: &impl CpuBus) {
        self.regs[Reg8::A] = bus.read_8(self.regs.get_16(reg));
    }

    pub(super) fn load_imm_mem_a(&mut self, bus: &mut impl CpuBus) {
        let addr = self.read_immediate_16(bus);
        bus.write_8(addr, self.regs[Reg8::A]);
    }

    pub(super) fn load_a_imm_mem(&mut self, bus: &impl CpuBus) {
        let addr = self.read_immediate_16(bus);
        self.regs[Reg8::A] = bus.read_8(addr);
    }

    pub(super) fn load_high_imm_mem_a(&mut self, bus: &mut impl CpuBus) {
        let addr = high(self.read_immediate_8(bus));
        bus.write_8(addr, self.regs[Reg8::A]);
    }

    pub(super) fn load_high_a_imm_mem(&mut self, bus: &impl CpuBus) {
        let addr = high(self.read_immediate_8(bus));
        self.regs[Reg8::A] = bus.read_8(addr);
    }

    pub(super) fn load_high_c_mem_a(&mut self, bus: &mut impl CpuBus) {
        bus.write_8(high(self.regs[Reg8::C]), self.regs[Reg8::A]);
    }

    pub(super) fn load_high_a_c_mem(&mut self, bus: &impl CpuBus) {
        self.regs[Reg8::A] = bus.read_8(high(self.regs[Reg8::C]));
    }

    /// Returns HL, then steps it in the given direction.
    fn hl_post_step(&mut self, inc_dec: HlIncDec) -> u16 {
        let hl = self.regs.get_16(Reg16::HL);
        let next = match inc_dec {
            HlIncDec::Inc => hl.wrapping_add(1),
            HlIncDec::Dec => hl.wrapping_sub(1),
        };
        self.regs.set_16(Reg16::HL, next);
        hl
    }

    pub(super) fn load_inc_dec_a(&mut self, inc_dec: HlIncDec, bus: &mut impl CpuBus) {
        let addr = self.hl_post_step(inc_dec);
        bus.write_8(addr, self.regs[Reg8::A]);
    }

    pub(super) fn load_a_inc_dec(&mut self, inc_dec: HlIncDec, bus: &impl CpuBus) {
        let addr = self.hl_post_step(inc_dec);
        self.regs[Reg8::A] = bus.read_8(addr);
    }

    pub(super) fn load_16(&mut self, reg: Reg16, bus: &impl CpuBus) {
        let val = self.read_immediate_16(bus);
        self.regs.set_16(reg, val);
    }

    pub(super) fn load_imm_mem_sp(&mut self, bus: &mut impl CpuBus) {
        let addr = self.read_immediate_16(bus);
        bus.write_16(addr, self.regs.sp);
    }

    pub(super) fn load_sp_hl(&mut self) {
        self.regs.sp = self.regs.get_16(Reg16::HL);
    }

    pub(super) fn push_16(&mut self, val: u16, bus: &mut impl CpuBus) {
        self.regs.sp = self.regs.sp.wrapping_sub(2);
        bus.write_16(self.regs.sp, val);
    }

    pub(super) fn pop_16(&mut self, bus: &impl CpuBus) -> u16 {
        let val = bus.read_16(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        val
    }

    pub(super) fn push(&mut self, reg: Reg16, bus: &mut impl CpuBus) {
        self.push_16(self.regs.get_16(reg), bus);
    }

    pub(super) fn pop(&mut self, reg: Reg16, bus: &impl CpuBus) {
        let val = self.pop_16(bus);
        self.regs.set_16(reg, val);
    }
}
