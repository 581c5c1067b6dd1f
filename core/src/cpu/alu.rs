// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use super::{
    instruction_set::{Operand8, Var8},
    Cpu, CpuBus, Flag, Reg16, Reg8,
};

/// 8-bit addition with carry in. Returns the sum and its Z, H and C flags.
fn add_with_carry(a: u8, src: u8, carry_in: bool) -> (u8, u8) {
    let carry_in = carry_in as u8;
    let sum = a as u16 + src as u16 + carry_in as u16;
    let half = (a & 0xf) + (src & 0xf) + carry_in;
    let result = sum as u8;
    (result, Flag::zero(result == 0) | Flag::half_carry(half > 0xf) | Flag::carry(sum > 0xff))
}

/// 8-bit subtraction with borrow in. Returns the difference and its Z, N, H and C flags.
fn sub_with_borrow(a: u8, src: u8, borrow_in: bool) -> (u8, u8) {
    let borrow_in = borrow_in as u8;
    let borrow = (a as u16) < src as u16 + borrow_in as u16;
    let half_borrow = a & 0xf < (src & 0xf) + borrow_in;
    let result = a.wrapping_sub(src).wrapping_sub(borrow_in);
    let flags = Flag::zero(result == 0)
        | Flag::SUB
        | Flag::half_carry(half_borrow)
        | Flag::carry(borrow);
    (result, flags)
}

impl Cpu {
    /// Applies `op` to A and the operand, storing the result in A and its flags in F.
    fn alu_a(&mut self, src: Operand8, bus: &impl CpuBus, op: impl FnOnce(u8, u8) -> (u8, u8)) {
        let src = self.read_operand(src, bus);
        let (a, flags) = op(self.regs[Reg8::A], src);
        self.regs[Reg8::A] = a;
        self.regs[Reg8::F] = flags;
    }

    pub(super) fn add(&mut self, src: Operand8, bus: &impl CpuBus) {
        self.alu_a(src, bus, |a, src| add_with_carry(a, src, false));
    }

    pub(super) fn adc(&mut self, src: Operand8, bus: &impl CpuBus) {
        let carry = self.regs.get_flag(Flag::CARRY);
        self.alu_a(src, bus, |a, src| add_with_carry(a, src, carry));
    }

    pub(super) fn sub(&mut self, src: Operand8, bus: &impl CpuBus) {
        self.alu_a(src, bus, |a, src| sub_with_borrow(a, src, false));
    }

    pub(super) fn sbc(&mut self, src: Operand8, bus: &impl CpuBus) {
        let carry = self.regs.get_flag(Flag::CARRY);
        self.alu_a(src, bus, |a, src| sub_with_borrow(a, src, carry));
    }

    pub(super) fn cp(&mut self, src: Operand8, bus: &impl CpuBus) {
        self.alu_a(src, bus, |a, src| (a, sub_with_borrow(a, src, false).1));
    }

    pub(super) fn and(&mut self, src: Operand8, bus: &impl CpuBus) {
        self.alu_a(src, bus, |a, src| {
            let a = a & src;
            (a, Flag::zero(a == 0) | Flag::HALF_CARRY)
        });
    }

    pub(super) fn or(&mut self, src: Operand8, bus: &impl CpuBus) {
        self.alu_a(src, bus, |a, src| (a | src, Flag::zero(a | src == 0)));
    }

    pub(super) fn xor(&mut self, src: Operand8, bus: &impl CpuBus) {
        self.alu_a(src, bus, |a, src| (a ^ src, Flag::zero(a ^ src == 0)));
    }

    pub(super) fn daa(&mut self) {
        let mut a = self.regs[Reg8::A];
        let mut carry = self.regs.get_flag(Flag::CARRY);

        if self.regs.get_flag(Flag::SUB) {
            if carry {
                a = a.wrapping_sub(0x60);
            }
            if self.regs.get_flag(Flag::HALF_CARRY) {
                a = a.wrapping_sub(0x06);
            }
        } else {
            if carry || a > 0x99 {
                a = a.wrapping_add(0x60);
                carry = true;
            }
            if self.regs.get_flag(Flag::HALF_CARRY) || a & 0xf > 0x9 {
                a = a.wrapping_add(0x06);
            }
        }

        self.regs[Reg8::A] = a;
        self.regs.set_flags(Flag::ZERO, a == 0);
        self.regs.set_flags(Flag::HALF_CARRY, false);
        self.regs.set_flags(Flag::CARRY, carry);
    }

    pub(super) fn inc(&mut self, var: Var8, bus: &mut impl CpuBus) {
        let val = self.read_var(var, bus).wrapping_add(1);
        self.write_var(var, val, bus);
        self.regs.set_flags(Flag::ZERO, val == 0);
        self.regs.set_flags(Flag::SUB, false);
        self.regs.set_flags(Flag::HALF_CARRY, val & 0xf == 0);
    }

    pub(super) fn dec(&mut self, var: Var8, bus: &mut impl CpuBus) {
        let val = self.read_var(var, bus).wrapping_sub(1);
        self.write_var(var, val, bus);
        self.regs.set_flags(Flag::ZERO, val == 0);
        self.regs.set_flags(Flag::SUB, true);
        self.regs.set_flags(Flag::HALF_CARRY, val & 0xf == 0xf);
    }

    pub(super) fn cpl(&mut self) {
        self.regs[Reg8::A] ^= 0xff;
        self.regs.set_flags(Flag::SUB | Flag::HALF_CARRY, true);
    }

    pub(super) fn ccf(&mut self) {
        let carry = self.regs.get_flag(Flag::CARRY);
        self.regs.set_flags(Flag::SUB | Flag::HALF_CARRY, false);
        self.regs.set_flags(Flag::CARRY, !carry);
    }

    pub(super) fn scf(&mut self) {
        self.regs.set_flags(Flag::SUB | Flag::HALF_CARRY, false);
        self.regs.set_flags(Flag::CARRY, true);
    }

    pub(super) fn bit(&mut self, bit: u8, var: Var8, bus: &impl CpuBus) {
        let set = self.read_var(var, bus) & (1 << bit) != 0;
        self.regs.set_flags(Flag::ZERO, !set);
        self.regs.set_flags(Flag::SUB, false);
        self.regs.set_flags(Flag::HALF_CARRY, true);
    }

    pub(super) fn res(&mut self, bit: u8, var: Var8, bus: &mut impl CpuBus) {
        let val = self.read_var(var, bus) & !(1 << bit);
        self.write_var(var, val, bus);
    }

    pub(super) fn set(&mut self, bit: u8, var: Var8, bus: &mut impl CpuBus) {
        let val = self.read_var(var, bus) | (1 << bit);
        self.write_var(var, val, bus);
    }

    /// Applies a shift or rotate to `var`. `op` returns the new value and the bit shifted out.
    fn shift(&mut self, var: Var8, bus: &mut impl CpuBus, op: impl FnOnce(u8) -> (u8, bool)) {
        let (val, carry) = op(self.read_var(var, bus));
        self.write_var(var, val, bus);
        self.regs[Reg8::F] = Flag::zero(val == 0) | Flag::carry(carry);
    }

    pub(super) fn rl(&mut self, var: Var8, bus: &mut impl CpuBus) {
        let carry = self.regs.get_flag(Flag::CARRY) as u8;
        self.shift(var, bus, |val| (val << 1 | carry, val & 0x80 != 0));
    }

    pub(super) fn rlc(&mut self, var: Var8, bus: &mut impl CpuBus) {
        self.shift(var, bus, |val| (val.rotate_left(1), val & 0x80 != 0));
    }

    pub(super) fn rr(&mut self, var: Var8, bus: &mut impl CpuBus) {
        let carry = self.regs.get_flag(Flag::CARRY) as u8;
        self.shift(var, bus, |val| (val >> 1 | carry << 7, val & 0x1 != 0));
    }

    pub(super) fn rrc(&mut self, var: Var8, bus: &mut impl CpuBus) {
        self.shift(var, bus, |val| (val.rotate_right(1), val & 0x1 != 0));
    }

    pub(super) fn sla(&mut self, var: Var8, bus: &mut impl CpuBus) {
        self.shift(var, bus, |val| (val << 1, val & 0x80 != 0));
    }

    pub(super) fn sra(&mut self, var: Var8, bus: &mut impl CpuBus) {
        self.shift(var, bus, |val| (val >> 1 | val & 0x80, val & 0x1 != 0));
    }

    pub(super) fn srl(&mut self, var: Var8, bus: &mut impl CpuBus) {
        self.shift(var, bus, |val| (val >> 1, val & 0x1 != 0));
    }

    pub(super) fn swap(&mut self, var: Var8, bus: &mut impl CpuBus) {
        self.shift(var, bus, |val| (val.rotate_left(4), false));
    }

    // The accumulator rotates always clear Z.

    pub(super) fn rla(&mut self, bus: &mut impl CpuBus) {
        self.rl(Var8::Reg(Reg8::A), bus);
        self.regs.set_flags(Flag::ZERO, false);
    }

    pub(super) fn rlca(&mut self, bus: &mut impl CpuBus) {
        self.rlc(Var8::Reg(Reg8::A), bus);
        self.regs.set_flags(Flag::ZERO, false);
    }

    pub(super) fn rra(&mut self, bus: &mut impl CpuBus) {
        self.rr(Var8::Reg(Reg8::A), bus);
        self.regs.set_flags(Flag::ZERO, false);
    }

    pub(super) fn rrca(&mut self, bus: &mut impl CpuBus) {
        self.rrc(Var8::Reg(Reg8::A), bus);
        self.regs.set_flags(Flag::ZERO, false);
    }

    pub(super) fn inc_16(&mut self, reg: Reg16) {
        let val = self.regs.get_16(reg).wrapping_add(1);
        self.regs.set_16(reg, val);
    }

    pub(super) fn dec_16(&mut self, reg: Reg16) {
        let val = self.regs.get_16(reg).wrapping_sub(1);
        self.regs.set_16(reg, val);
    }

    pub(super) fn add_hl(&mut self, reg: Reg16) {
        let hl = self.regs.get_16(Reg16::HL);
        let val = self.regs.get_16(reg);
        let (sum, carry) = hl.overflowing_add(val);
        let half_carry = (hl & 0xfff) + (val & 0xfff) > 0xfff;
        self.regs.set_16(Reg16::HL, sum);
        self.regs.set_flags(Flag::SUB, false);
        self.regs.set_flags(Flag::HALF_CARRY, half_carry);
        self.regs.set_flags(Flag::CARRY, carry);
    }

    /// SP plus a signed immediate. Flags come from the unsigned add of the low byte.
    fn sp_offset(&mut self, bus: &impl CpuBus) -> u16 {
        let sp = self.regs.sp;
        let offset = self.read_immediate_8(bus);
        let (_, flags) = add_with_carry(sp as u8, offset, false);
        self.regs[Reg8::F] = flags & (Flag::HALF_CARRY | Flag::CARRY);
        sp.wrapping_add_signed(offset as i8 as i16)
    }

    pub(super) fn add_sp(&mut self, bus: &impl CpuBus) {
        self.regs.sp = self.sp_offset(bus);
    }

    pub(super) fn load_hl_sp_imm_inc(&mut self, bus: &impl CpuBus) {
        let val = self.sp_offset(bus);
        self.regs.set_16(Reg16::HL, val);
    }
}
