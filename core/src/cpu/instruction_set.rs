// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use super::{Reg16, Reg8};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Var8 {
    Reg(Reg8),
    MemHl,
}

impl Var8 {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x7 {
            6 => Self::MemHl,
            7 => Self::Reg(Reg8::A),
            bits => Self::Reg(Reg8::from_bits(bits)),
        }
    }

    const fn is_mem(&self) -> bool {
        matches!(self, Self::MemHl)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Operand8 {
    Var(Var8),
    Imm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Test {
    Nz,
    Z,
    Nc,
    C,
}

impl Test {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => Self::Nz,
            1 => Self::Z,
            2 => Self::Nc,
            _ => Self::C,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum HlIncDec {
    Inc,
    Dec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Instruction {
    Nop,
    Ld(Var8, Operand8),
    LdMemRegA(Reg16),
    LdAMemReg(Reg16),
    LdMem16A,
    LdAMem16,
    LdhMemA,
    LdhAMem,
    LdhMemCA,
    LdhAMemC,
    LdIncDecA(HlIncDec),
    LdAIncDec(HlIncDec),
    Ld16(Reg16),
    LdMemSp,
    LdHlSpInc,
    LdSpHl,
    Pop(Reg16),
    Push(Reg16),
    Bit(u8, Var8),
    Res(u8, Var8),
    Set(u8, Var8),
    Rla,
    Rl(Var8),
    Rlca,
    Rlc(Var8),
    Rra,
    Rr(Var8),
    Rrca,
    Rrc(Var8),
    Sla(Var8),
    Sra(Var8),
    Srl(Var8),
    Swap(Var8),
    Adc(Operand8),
    Add(Operand8),
    And(Operand8),
    Cp(Operand8),
    Or(Operand8),
    Sbc(Operand8),
    Sub(Operand8),
    Xor(Operand8),
    Dec(Var8),
    Inc(Var8),
    Cpl,
    Daa,
    Dec16(Reg16),
    Inc16(Reg16),
    AddHl(Reg16),
    AddSp,
    Ccf,
    Scf,
    Call(Option<Test>),
    Jp(Option<Test>),
    JpHl,
    Jr(Option<Test>),
    Rst(u16),
    Ret(Option<Test>),
    Reti,
    Di,
    Ei,
    Halt,
    Stop,
    Illegal,
}

/// A decoded opcode with its cost in T-cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct InstructionEntry {
    pub(super) instruction: Instruction,
    /// Cost when executed, or when a conditional branch is taken.
    pub(super) cycles: usize,
    /// Cost when a conditional branch is not taken.
    pub(super) skip_cycles: usize,
}

impl InstructionEntry {
    const fn new(instruction: Instruction, cycles: usize) -> Self {
        Self { instruction, cycles, skip_cycles: cycles }
    }

    const fn branch(instruction: Instruction, cycles: usize, skip_cycles: usize) -> Self {
        Self { instruction, cycles, skip_cycles }
    }

    /// Register forms cost `reg`, `(HL)` forms cost `mem`.
    const fn var(instruction: Instruction, var: Var8, reg: usize, mem: usize) -> Self {
        Self::new(instruction, if var.is_mem() { mem } else { reg })
    }
}

const fn reg_pair(bits: u8) -> Reg16 {
    match bits & 0x3 {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        _ => Reg16::SP,
    }
}

/// Like `reg_pair`, but for PUSH and POP which address AF instead of SP.
const fn stack_pair(bits: u8) -> Reg16 {
    match bits & 0x3 {
        3 => Reg16::AF,
        bits => reg_pair(bits),
    }
}

const fn alu(op: u8, src: Operand8) -> Instruction {
    use Instruction::*;
    match op & 0x7 {
        0 => Add(src),
        1 => Adc(src),
        2 => Sub(src),
        3 => Sbc(src),
        4 => And(src),
        5 => Xor(src),
        6 => Or(src),
        _ => Cp(src),
    }
}

/// Opcode fields: `xx yyy zzz`, with `yyy` further split into `ppq`.
const fn decode(opcode: u8) -> InstructionEntry {
    use Instruction::*;
    use InstructionEntry as E;

    let x = opcode >> 6;
    let y = (opcode >> 3) & 0x7;
    let z = opcode & 0x7;
    let p = y >> 1;
    let q = y & 0x1;

    match (x, z) {
        (0, 0) => match y {
            0 => E::new(Nop, 4),
            1 => E::new(LdMemSp, 20),
            2 => E::new(Stop, 4),
            3 => E::new(Jr(None), 12),
            _ => E::branch(Jr(Some(Test::from_bits(y))), 12, 8),
        },
        (0, 1) if q == 0 => E::new(Ld16(reg_pair(p)), 12),
        (0, 1) => E::new(AddHl(reg_pair(p)), 8),
        (0, 2) => {
            let instruction = match (p, q) {
                (0 | 1, 0) => LdMemRegA(reg_pair(p)),
                (0 | 1, _) => LdAMemReg(reg_pair(p)),
                (2, 0) => LdIncDecA(HlIncDec::Inc),
                (2, _) => LdAIncDec(HlIncDec::Inc),
                (_, 0) => LdIncDecA(HlIncDec::Dec),
                _ => LdAIncDec(HlIncDec::Dec),
            };
            E::new(instruction, 8)
        }
        (0, 3) if q == 0 => E::new(Inc16(reg_pair(p)), 8),
        (0, 3) => E::new(Dec16(reg_pair(p)), 8),
        (0, 4) => E::var(Inc(Var8::from_bits(y)), Var8::from_bits(y), 4, 12),
        (0, 5) => E::var(Dec(Var8::from_bits(y)), Var8::from_bits(y), 4, 12),
        (0, 6) => E::var(Ld(Var8::from_bits(y), Operand8::Imm), Var8::from_bits(y), 8, 12),
        (0, _) => E::new([Rlca, Rrca, Rla, Rra, Daa, Cpl, Scf, Ccf][y as usize], 4),
        (1, 6) if y == 6 => E::new(Halt, 4),
        (1, _) => {
            let (dst, src) = (Var8::from_bits(y), Var8::from_bits(z));
            E::new(Ld(dst, Operand8::Var(src)), if dst.is_mem() || src.is_mem() { 8 } else { 4 })
        }
        (2, _) => {
            let src = Var8::from_bits(z);
            E::var(alu(y, Operand8::Var(src)), src, 4, 8)
        }
        (_, 0) => match y {
            0..=3 => E::branch(Ret(Some(Test::from_bits(y))), 20, 8),
            4 => E::new(LdhMemA, 12),
            5 => E::new(AddSp, 16),
            6 => E::new(LdhAMem, 12),
            _ => E::new(LdHlSpInc, 12),
        },
        (_, 1) if q == 0 => E::new(Pop(stack_pair(p)), 12),
        (_, 1) => match p {
            0 => E::new(Ret(None), 16),
            1 => E::new(Reti, 16),
            2 => E::new(JpHl, 4),
            _ => E::new(LdSpHl, 8),
        },
        (_, 2) => match y {
            0..=3 => E::branch(Jp(Some(Test::from_bits(y))), 16, 12),
            4 => E::new(LdhMemCA, 8),
            5 => E::new(LdMem16A, 16),
            6 => E::new(LdhAMemC, 8),
            _ => E::new(LdAMem16, 16),
        },
        (_, 3) => match y {
            0 => E::new(Jp(None), 16),
            6 => E::new(Di, 4),
            7 => E::new(Ei, 4),
            // 0xcb is dispatched to the prefix table before decoding
            _ => E::new(Illegal, 4),
        },
        (_, 4) if y < 4 => E::branch(Call(Some(Test::from_bits(y))), 24, 12),
        (_, 4) => E::new(Illegal, 4),
        (_, 5) if q == 0 => E::new(Push(stack_pair(p)), 16),
        (_, 5) if p == 0 => E::new(Call(None), 24),
        (_, 5) => E::new(Illegal, 4),
        (_, 6) => E::new(alu(y, Operand8::Imm), 8),
        _ => E::new(Rst(y as u16 * 8), 16),
    }
}

const OP_TABLE: [InstructionEntry; 0x100] = {
    let mut table = [InstructionEntry::new(Instruction::Illegal, 4); 0x100];
    let mut opcode = 0;
    while opcode < table.len() {
        table[opcode] = decode(opcode as u8);
        opcode += 1;
    }
    table
};

pub(super) const PREFIX_OPCODE: u8 = 0xcb;

pub(super) fn entry_for_opcode(opcode: u8) -> &'static InstructionEntry {
    &OP_TABLE[opcode as usize]
}

/// Decodes the byte following the 0xcb prefix. Costs include the prefix fetch.
pub(super) fn entry_for_prefix_opcode(opcode: u8) -> InstructionEntry {
    use Instruction::*;

    let y = (opcode >> 3) & 0x7;
    let var = Var8::from_bits(opcode);
    let instruction = match opcode >> 6 {
        0 => [Rlc(var), Rrc(var), Rl(var), Rr(var), Sla(var), Sra(var), Swap(var), Srl(var)]
            [y as usize],
        1 => return InstructionEntry::var(Bit(y, var), var, 8, 12),
        2 => Res(y, var),
        _ => Set(y, var),
    };
    InstructionEntry::var(instruction, var, 8, 16)
}
