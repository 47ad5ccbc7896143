//! Textual emission of the MIPS asm AST.
//!
//! Everything implements [Display], so a compiled program can be written to
//! any `fmt` target; the geracodigo driver simply prints the [AsmAst].

use crate::codegen::*;

use std::fmt;

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Zero => "$zero",
            Self::V0 => "$v0",
            Self::A0 => "$a0",
            Self::A1 => "$a1",
            Self::A2 => "$a2",
            Self::A3 => "$a3",
            Self::T0 => "$t0",
            Self::Sp => "$sp",
            Self::Fp => "$fp",
            Self::Ra => "$ra",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Frame(offset) => write!(f, "{offset}($sp)"),
            Self::Indirect(reg, offset) => write!(f, "{offset}({reg})"),
            Self::Global(label) => write!(f, "{label}"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Label(label) => write!(f, "{label}:"),
            Self::Li(reg, value) => write!(f, "li {reg}, {value}"),
            Self::La(reg, label) => write!(f, "la {reg}, {label}"),
            Self::Lw(reg, addr) => write!(f, "lw {reg}, {addr}"),
            Self::Sw(reg, addr) => write!(f, "sw {reg}, {addr}"),
            Self::Addiu(dst, src, imm) => write!(f, "addiu {dst}, {src}, {imm}"),
            Self::Addu(dst, lhs, rhs) => write!(f, "addu {dst}, {lhs}, {rhs}"),
            Self::Subu(dst, lhs, rhs) => write!(f, "subu {dst}, {lhs}, {rhs}"),
            Self::Mult(lhs, rhs) => write!(f, "mult {lhs}, {rhs}"),
            Self::Div(lhs, rhs) => write!(f, "div {lhs}, {rhs}"),
            Self::Mflo(dst) => write!(f, "mflo {dst}"),
            Self::Slt(dst, lhs, rhs) => write!(f, "slt {dst}, {lhs}, {rhs}"),
            Self::Sltu(dst, lhs, rhs) => write!(f, "sltu {dst}, {lhs}, {rhs}"),
            Self::Sltiu(dst, src, imm) => write!(f, "sltiu {dst}, {src}, {imm}"),
            Self::Xor(dst, lhs, rhs) => write!(f, "xor {dst}, {lhs}, {rhs}"),
            Self::Xori(dst, src, imm) => write!(f, "xori {dst}, {src}, {imm}"),
            Self::Sll(dst, src, amount) => write!(f, "sll {dst}, {src}, {amount}"),
            Self::Beq(lhs, rhs, target) => write!(f, "beq {lhs}, {rhs}, {target}"),
            Self::J(target) => write!(f, "j {target}"),
            Self::Jal(target) => write!(f, "jal {target}"),
            Self::Jr(reg) => write!(f, "jr {reg}"),
        }
    }
}

impl fmt::Display for AsmDataItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.words == 1 {
            writeln!(f, "{}: .word 0", self.label)
        } else {
            writeln!(f, "{}: .space {}", self.label, 4 * self.words)
        }
    }
}

impl fmt::Display for AsmFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\t.globl {}", self.label)?;
        writeln!(f, "{}:", self.label)?;
        for instruction in &self.body {
            if instruction.is_label() {
                writeln!(f, "{instruction}")?;
            } else {
                writeln!(f, "\t{instruction}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for AsmAst {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.data.is_empty() {
            writeln!(f, "\t.data")?;
            for item in &self.data {
                write!(f, "{item}")?;
            }
        }
        writeln!(f, "\t.text")?;
        for function in &self.functions {
            write!(f, "{function}")?;
        }
        Ok(())
    }
}
