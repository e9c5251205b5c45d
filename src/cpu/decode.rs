//! Instruction decoder.
//!
//! Each opcode byte names one (operation, addressing mode) pair. The set is
//! closed: `decode` is a single `match` with one arm per opcode, and
//! everything else is an unknown opcode.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How an instruction derives its operand from the bytes that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddrMode {
    /// Operand is the byte after the opcode.
    Immediate,
    /// Byte after the opcode is an address in page zero.
    ZeroPage,
}

impl AddrMode {
    /// Operand bytes following the opcode.
    pub const fn operand_bytes(self) -> u8 {
        match self {
            AddrMode::Immediate | AddrMode::ZeroPage => 1,
        }
    }
}

/// What an instruction does once its operand is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// A := operand
    Lda,
    /// X := operand
    Ldx,
    /// Y := operand
    Ldy,
    /// [addr] := A
    Sta,
    /// [addr] := X
    Stx,
    /// [addr] := Y
    Sty,
}

impl Operation {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Operation::Lda => "LDA",
            Operation::Ldx => "LDX",
            Operation::Ldy => "LDY",
            Operation::Sta => "STA",
            Operation::Stx => "STX",
            Operation::Sty => "STY",
        }
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub op: Operation,
    pub mode: AddrMode,
}

impl Instruction {
    pub const fn new(op: Operation, mode: AddrMode) -> Self {
        Self { op, mode }
    }

    /// Total cycles, opcode fetch included.
    pub const fn cycles(self) -> u8 {
        match (self.op, self.mode) {
            (_, AddrMode::Immediate) => 2,
            (Operation::Lda | Operation::Ldx | Operation::Ldy, AddrMode::ZeroPage) => 3,
            (Operation::Sta | Operation::Stx | Operation::Sty, AddrMode::ZeroPage) => 3,
        }
    }

    /// Total bytes, opcode included.
    pub const fn bytes(self) -> u8 {
        1 + self.mode.operand_bytes()
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mode {
            AddrMode::Immediate => write!(f, "{} #", self.op.mnemonic()),
            AddrMode::ZeroPage => write!(f, "{} zp", self.op.mnemonic()),
        }
    }
}

/// Opcode byte values.
pub struct Opcode;

impl Opcode {
    pub const LDA_IMM: u8 = 0xA9;
    pub const LDA_ZPG: u8 = 0xA5;
    pub const LDX_IMM: u8 = 0xA2;
    pub const LDX_ZPG: u8 = 0xA6;
    pub const LDY_IMM: u8 = 0xA0;
    pub const LDY_ZPG: u8 = 0xA4;
    pub const STA_ZPG: u8 = 0x85;
    pub const STX_ZPG: u8 = 0x86;
    pub const STY_ZPG: u8 = 0x84;
}

/// Decode an opcode byte.
pub fn decode(opcode: u8) -> Result<Instruction, DecodeError> {
    use AddrMode::*;
    use Operation::*;

    let instruction = match opcode {
        Opcode::LDA_IMM => Instruction::new(Lda, Immediate),
        Opcode::LDA_ZPG => Instruction::new(Lda, ZeroPage),
        Opcode::LDX_IMM => Instruction::new(Ldx, Immediate),
        Opcode::LDX_ZPG => Instruction::new(Ldx, ZeroPage),
        Opcode::LDY_IMM => Instruction::new(Ldy, Immediate),
        Opcode::LDY_ZPG => Instruction::new(Ldy, ZeroPage),
        Opcode::STA_ZPG => Instruction::new(Sta, ZeroPage),
        Opcode::STX_ZPG => Instruction::new(Stx, ZeroPage),
        Opcode::STY_ZPG => Instruction::new(Sty, ZeroPage),
        _ => return Err(DecodeError::UnknownOpcode(opcode)),
    };

    Ok(instruction)
}

/// Encode an instruction back to its opcode byte.
///
/// Returns `None` for pairs with no opcode (stores with an immediate operand).
pub fn encode(instr: Instruction) -> Option<u8> {
    use AddrMode::*;
    use Operation::*;

    let opcode = match (instr.op, instr.mode) {
        (Lda, Immediate) => Opcode::LDA_IMM,
        (Lda, ZeroPage) => Opcode::LDA_ZPG,
        (Ldx, Immediate) => Opcode::LDX_IMM,
        (Ldx, ZeroPage) => Opcode::LDX_ZPG,
        (Ldy, Immediate) => Opcode::LDY_IMM,
        (Ldy, ZeroPage) => Opcode::LDY_ZPG,
        (Sta, ZeroPage) => Opcode::STA_ZPG,
        (Stx, ZeroPage) => Opcode::STX_ZPG,
        (Sty, ZeroPage) => Opcode::STY_ZPG,
        (Sta | Stx | Sty, Immediate) => return None,
    };

    Some(opcode)
}

/// Static cycle cost of an opcode, or `None` if it does not decode.
pub fn cycles_for(opcode: u8) -> Option<u8> {
    decode(opcode).ok().map(Instruction::cycles)
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("instruction [{0:#04X}] not handled")]
    UnknownOpcode(u8),
}
