//! CPU registers and processor status flags.
//!
//! The register file holds:
//! - PC: 16-bit program counter
//! - SP: 16-bit stack pointer (biased into page one)
//! - A: 8-bit accumulator
//! - X, Y: 8-bit index registers
//! - P: seven independent status flags

use serde::{Deserialize, Serialize};

/// Address the program counter is rewound to on reset.
pub const RESET_VECTOR: u16 = 0xFFFC;

/// Initial value of the stack pointer.
pub const STACK_RESET: u16 = 0x0100;

/// Processor status flags.
///
/// Each flag is its own field; the packed byte form is only a view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub carry: bool,
    pub zero: bool,
    pub interrupt: bool,
    pub decimal: bool,
    pub brk: bool,
    pub overflow: bool,
    pub negative: bool,
}

impl Flags {
    const C: u8 = 0x01;
    const Z: u8 = 0x02;
    const I: u8 = 0x04;
    const D: u8 = 0x08;
    const B: u8 = 0x10;
    const U: u8 = 0x20;
    const V: u8 = 0x40;
    const N: u8 = 0x80;

    /// Derive zero and negative from a result byte.
    ///
    /// Every operation that defines Z/N goes through here.
    #[inline]
    pub fn set_zn(&mut self, result: u8) {
        self.zero = result == 0;
        self.negative = result & 0x80 != 0;
    }

    /// Clear every flag.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Pack into an NV-BDIZC status byte. Bit 5 always reads as 1.
    pub fn to_byte(self) -> u8 {
        let mut p = Self::U;
        for (set, bit) in [
            (self.carry, Self::C),
            (self.zero, Self::Z),
            (self.interrupt, Self::I),
            (self.decimal, Self::D),
            (self.brk, Self::B),
            (self.overflow, Self::V),
            (self.negative, Self::N),
        ] {
            if set {
                p |= bit;
            }
        }
        p
    }

    /// Unpack an NV-BDIZC status byte. Bit 5 is ignored.
    pub fn from_byte(p: u8) -> Self {
        Self {
            carry: p & Self::C != 0,
            zero: p & Self::Z != 0,
            interrupt: p & Self::I != 0,
            decimal: p & Self::D != 0,
            brk: p & Self::B != 0,
            overflow: p & Self::V != 0,
            negative: p & Self::N != 0,
        }
    }
}

impl std::fmt::Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = self.to_byte();
        for (i, name) in "NV-BDIZC".chars().enumerate() {
            let bit = 0x80 >> i;
            let shown = if name == '-' || p & bit == 0 {
                name.to_ascii_lowercase()
            } else {
                name
            };
            write!(f, "{}", shown)?;
        }
        Ok(())
    }
}

/// The register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Program counter: address of the next byte to fetch
    pub pc: u16,

    /// Stack pointer
    pub sp: u16,

    /// Accumulator
    pub a: u8,

    /// X index register
    pub x: u8,

    /// Y index register
    pub y: u8,

    /// Status flags
    pub flags: Flags,
}

impl Registers {
    /// Create a register file in its reset state.
    pub fn new() -> Self {
        Self {
            pc: RESET_VECTOR,
            sp: STACK_RESET,
            a: 0,
            x: 0,
            y: 0,
            flags: Flags::default(),
        }
    }

    /// Zero A/X/Y and the flags, rewind PC and SP.
    pub fn reset(&mut self) {
        self.pc = RESET_VECTOR;
        self.sp = STACK_RESET;
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.flags.clear();
    }

    /// Increment the program counter by 1, wrapping at 16 bits.
    /// Returns the old value.
    #[inline]
    pub fn advance_pc(&mut self) -> u16 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(1);
        old
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
