// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use core::fmt;
use std::{
    fmt::{Debug, Formatter},
    marker::PhantomData,
    ops::{Index, IndexMut},
};

#[cfg(feature = "cpu-debug")]
use log::trace;
use log::warn;
use thiserror::Error;

use self::instruction_set::{Instruction, InstructionEntry, Operand8, Var8};

mod alu;
mod control;
mod instruction_set;
mod interrupt;
mod load;

pub trait CpuBus {
    fn read_8(&self, addr: u16) -> u8;
    fn write_8(&mut self, addr: u16, val: u8);

    fn read_16(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read_8(addr), self.read_8(addr.wrapping_add(1))])
    }

    fn write_16(&mut self, addr: u16, val: u16) {
        let [low, high] = val.to_le_bytes();
        self.write_8(addr, low);
        self.write_8(addr.wrapping_add(1), high);
    }

    /// Acknowledges the highest priority enabled and requested interrupt.
    fn pop_interrupt(&mut self) -> Option<u8>;
    fn interrupt_pending(&self) -> bool;
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Illegal instruction {opcode:#04x} at {pc:#06x}")]
pub struct IllegalInstruction {
    pub opcode: u8,
    pub pc: u16,
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct Reg<T>(u8, PhantomData<T>);

type Reg8 = Reg<u8>;
type Reg16 = Reg<u16>;

impl Reg8 {
    const C: Self = Self(0, PhantomData);
    const B: Self = Self(1, PhantomData);
    const L: Self = Self(4, PhantomData);
    const H: Self = Self(5, PhantomData);
    const F: Self = Self(6, PhantomData);
    const A: Self = Self(7, PhantomData);

    fn index(&self) -> usize {
        self.0 as usize
    }

    /// Decodes the 3-bit register field of an opcode. 6 is `(HL)` and must be handled first.
    const fn from_bits(bits: u8) -> Self {
        Self((bits & 0x7) ^ 0x1, PhantomData)
    }
}

impl Debug for Reg8 {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let name = ["C", "B", "E", "D", "L", "H", "F", "A"][self.index()];
        write!(f, "{name}")
    }
}

impl Reg16 {
    const BC: Self = Self(0, PhantomData);
    const DE: Self = Self(1, PhantomData);
    const HL: Self = Self(2, PhantomData);
    const AF: Self = Self(3, PhantomData);
    const SP: Self = Self(4, PhantomData);

    fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Debug for Reg16 {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let name = ["BC", "DE", "HL", "AF", "SP"][self.index()];
        write!(f, "{name}")
    }
}

enum Flag {}

impl Flag {
    const ZERO: u8 = 0x80;
    const SUB: u8 = 0x40;
    const HALF_CARRY: u8 = 0x20;
    const CARRY: u8 = 0x10;

    fn zero(val: bool) -> u8 {
        Self::ZERO * (val as u8)
    }
    fn half_carry(val: bool) -> u8 {
        Self::HALF_CARRY * (val as u8)
    }
    fn carry(val: bool) -> u8 {
        Self::CARRY * (val as u8)
    }
}

/// 8-bit registers stored low byte first in pairs (C B, E D, L H, F A), plus SP.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct RegisterSet {
    regs: [u8; 8],
    sp: u16,
}

impl Index<Reg8> for RegisterSet {
    type Output = u8;
    fn index(&self, reg: Reg8) -> &Self::Output {
        &self.regs[reg.index()]
    }
}

impl IndexMut<Reg8> for RegisterSet {
    fn index_mut(&mut self, reg: Reg8) -> &mut Self::Output {
        &mut self.regs[reg.index()]
    }
}

impl RegisterSet {
    fn get_16(&self, reg: Reg16) -> u16 {
        if reg == Reg16::SP {
            return self.sp;
        }
        let i = reg.index() * 2;
        u16::from_le_bytes([self.regs[i], self.regs[i + 1]])
    }

    fn set_16(&mut self, reg: Reg16, val: u16) {
        if reg == Reg16::SP {
            self.sp = val;
            return;
        }
        let i = reg.index() * 2;
        let [low, high] = val.to_le_bytes();
        self.regs[i] = low;
        self.regs[i + 1] = high;
        if reg == Reg16::AF {
            // The low nibble of F does not exist
            self.regs[Reg8::F.index()] &= 0xf0;
        }
    }

    fn set_flags(&mut self, flags: u8, value: bool) {
        let mut f = self[Reg8::F];
        f &= !flags;
        f |= (value as u8) * flags;
        self[Reg8::F] = f;
    }

    fn get_flag(&self, flag: u8) -> bool {
        self[Reg8::F] & flag != 0
    }
}

/// T-cycles spent servicing an interrupt.
const INTERRUPT_CYCLES: usize = 20;
/// T-cycles spent per step while halted.
const HALT_CYCLES: usize = 4;

#[derive(Debug, Clone)]
pub struct Cpu {
    regs: RegisterSet,
    pc: u16,
    ime: bool,
    halted: bool,
}

impl Cpu {
    /// A CPU in the state the DMG boot ROM leaves it in.
    pub fn new() -> Self {
        let mut regs = RegisterSet::default();
        regs.set_16(Reg16::AF, 0x1180);
        regs.set_16(Reg16::DE, 0xff56);
        regs.set_16(Reg16::SP, 0xfffe);
        Self { regs, pc: 0x0100, ime: false, halted: false }
    }

    #[cfg(test)]
    pub(crate) fn pc(&self) -> u16 {
        self.pc
    }

    #[cfg(test)]
    pub(crate) fn sp(&self) -> u16 {
        self.regs.sp
    }

    #[cfg(test)]
    pub(crate) fn set_ime(&mut self, ime: bool) {
        self.ime = ime;
    }

    fn read_immediate_8(&mut self, bus: &impl CpuBus) -> u8 {
        let val = bus.read_8(self.pc);
        self.pc = self.pc.wrapping_add(1);
        val
    }

    fn read_immediate_16(&mut self, bus: &impl CpuBus) -> u16 {
        let val = bus.read_16(self.pc);
        self.pc = self.pc.wrapping_add(2);
        val
    }

    fn read_var(&self, var: Var8, bus: &impl CpuBus) -> u8 {
        match var {
            Var8::Reg(reg) => self.regs[reg],
            Var8::MemHl => bus.read_8(self.regs.get_16(Reg16::HL)),
        }
    }

    fn write_var(&mut self, var: Var8, val: u8, bus: &mut impl CpuBus) {
        match var {
            Var8::Reg(reg) => self.regs[reg] = val,
            Var8::MemHl => bus.write_8(self.regs.get_16(Reg16::HL), val),
        }
    }

    fn read_operand(&mut self, operand: Operand8, bus: &impl CpuBus) -> u8 {
        match operand {
            Operand8::Var(var) => self.read_var(var, bus),
            Operand8::Imm => self.read_immediate_8(bus),
        }
    }

    /// Runs one decoded instruction, returning the T-cycles it took. `None` for illegal opcodes.
    fn execute_instruction(
        &mut self,
        entry: &InstructionEntry,
        bus: &mut impl CpuBus,
    ) -> Option<usize> {
        let branch = |taken| if taken { entry.cycles } else { entry.skip_cycles };

        use Instruction::*;
        match entry.instruction {
            Nop => (),
            Ld(dst, src) => self.load(dst, src, bus),
            LdMemRegA(reg) => self.load_reg_mem_a(reg, bus),
            LdAMemReg(reg) => self.load_a_reg_mem(reg, bus),
            LdMem16A => self.load_imm_mem_a(bus),
            LdAMem16 => self.load_a_imm_mem(bus),
            LdhMemA => self.load_high_imm_mem_a(bus),
            LdhAMem => self.load_high_a_imm_mem(bus),
            LdhMemCA => self.load_high_c_mem_a(bus),
            LdhAMemC => self.load_high_a_c_mem(bus),
            LdIncDecA(inc_dec) => self.load_inc_dec_a(inc_dec, bus),
            LdAIncDec(inc_dec) => self.load_a_inc_dec(inc_dec, bus),
            Ld16(reg) => self.load_16(reg, bus),
            LdMemSp => self.load_imm_mem_sp(bus),
            LdHlSpInc => self.load_hl_sp_imm_inc(bus),
            LdSpHl => self.load_sp_hl(),
            Pop(reg) => self.pop(reg, bus),
            Push(reg) => self.push(reg, bus),
            Bit(bit, var) => self.bit(bit, var, bus),
            Res(bit, var) => self.res(bit, var, bus),
            Set(bit, var) => self.set(bit, var, bus),
            Rla => self.rla(bus),
            Rl(var) => self.rl(var, bus),
            Rlca => self.rlca(bus),
            Rlc(var) => self.rlc(var, bus),
            Rra => self.rra(bus),
            Rr(var) => self.rr(var, bus),
            Rrca => self.rrca(bus),
            Rrc(var) => self.rrc(var, bus),
            Sla(var) => self.sla(var, bus),
            Sra(var) => self.sra(var, bus),
            Srl(var) => self.srl(var, bus),
            Swap(var) => self.swap(var, bus),
            Adc(src) => self.adc(src, bus),
            Add(src) => self.add(src, bus),
            And(src) => self.and(src, bus),
            Cp(src) => self.cp(src, bus),
            Or(src) => self.or(src, bus),
            Sbc(src) => self.sbc(src, bus),
            Sub(src) => self.sub(src, bus),
            Xor(src) => self.xor(src, bus),
            Dec(var) => self.dec(var, bus),
            Inc(var) => self.inc(var, bus),
            Cpl => self.cpl(),
            Daa => self.daa(),
            Dec16(reg) => self.dec_16(reg),
            Inc16(reg) => self.inc_16(reg),
            AddHl(reg) => self.add_hl(reg),
            AddSp => self.add_sp(bus),
            Ccf => self.ccf(),
            Scf => self.scf(),
            Call(None) => self.call(bus),
            Call(Some(test)) => return Some(branch(self.call_conditional(test, bus))),
            Jp(None) => self.jump(bus),
            Jp(Some(test)) => return Some(branch(self.jump_conditional(test, bus))),
            JpHl => self.jump_hl(),
            Jr(None) => self.jump_relative(bus),
            Jr(Some(test)) => return Some(branch(self.jump_relative_conditional(test, bus))),
            Rst(addr) => self.rst(addr, bus),
            Ret(None) => self.ret(bus),
            Ret(Some(test)) => return Some(branch(self.ret_conditional(test, bus))),
            Reti => self.reti(bus),
            Di => self.di(),
            Ei => self.ei(),
            Halt => self.halt(),
            Stop => self.stop(bus),
            Illegal => return None,
        }
        Some(entry.cycles)
    }

    /// Services a pending interrupt or executes one instruction. Returns the T-cycles consumed.
    pub fn step(&mut self, bus: &mut impl CpuBus) -> Result<usize, IllegalInstruction> {
        if let Some(cycles) = self.handle_interrupts(bus) {
            return Ok(cycles);
        }

        if self.halted {
            return Ok(HALT_CYCLES);
        }

        let pc = self.pc;
        let opcode = self.read_immediate_8(bus);
        let entry = if opcode == instruction_set::PREFIX_OPCODE {
            let opcode = self.read_immediate_8(bus);
            instruction_set::entry_for_prefix_opcode(opcode)
        } else {
            *instruction_set::entry_for_opcode(opcode)
        };

        #[cfg(feature = "cpu-debug")]
        trace!("{pc:04x}: {opcode:#04x} {:?} {:?}", entry.instruction, self.regs);

        self.execute_instruction(&entry, bus).ok_or_else(|| {
            warn!("Illegal instruction {opcode:#04x} at {pc:#06x}");
            self.pc = pc;
            IllegalInstruction { opcode, pc }
        })
    }
}
