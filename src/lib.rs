//! # em6502
//!
//! The execution core of an 8-bit 6502-family microprocessor.
//!
//! A [`Cpu`] owns its register file and 64 KiB of memory. Callers reset it,
//! poke a program in at the reset vector, and hand [`Cpu::execute`] a cycle
//! budget. Each instruction is fetched one byte at a time, decoded against a
//! closed opcode set, and executed with its static cycle cost charged to the
//! budget.

pub mod cpu;

// Re-export commonly used types
pub use cpu::{
    AddrMode, BudgetPolicy, Cpu, CpuError, CpuState, DecodeError, Flags, HaltReason,
    Instruction, Memory, MemoryError, Opcode, Operation, Registers, RESET_VECTOR, STACK_RESET,
};
