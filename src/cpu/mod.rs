//! CPU emulation for an 8-bit 6502-family processor.
//!
//! This module implements:
//! - 64 KiB flat memory
//! - PC, SP, A, X, Y and seven status flags
//! - A closed opcode table with immediate and zero-page addressing
//! - A cycle-budgeted fetch/decode/execute loop

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::{Flags, Registers, RESET_VECTOR, STACK_RESET};
pub use decode::{AddrMode, DecodeError, Instruction, Opcode, Operation};
pub use execute::{BudgetPolicy, Cpu, CpuError, CpuState, HaltReason};
