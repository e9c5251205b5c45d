//! Flat 64 KiB memory.
//!
//! Every 16-bit address maps onto exactly one byte cell, so accesses through
//! `u16` can never leave the store. The `usize` entry points exist for callers
//! that hold wider integers and report out-of-range indices instead of wrapping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The number of byte cells in memory.
pub const MEMORY_SIZE: usize = 0x10000;

/// 64 KiB of byte-addressable memory.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<u8>,
}

impl Memory {
    /// Create a new memory with all cells zeroed.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Zero every cell.
    pub fn init(&mut self) {
        self.cells.fill(0);
    }

    /// Read the byte at `addr`.
    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.cells[addr as usize]
    }

    /// Write `value` at `addr`.
    #[inline]
    pub fn write(&mut self, addr: u16, value: u8) {
        self.cells[addr as usize] = value;
    }

    /// Read by raw index.
    pub fn read_at(&self, index: usize) -> Result<u8, MemoryError> {
        self.cells
            .get(index)
            .copied()
            .ok_or(MemoryError::AddressOutOfRange(index))
    }

    /// Write by raw index.
    pub fn write_at(&mut self, index: usize, value: u8) -> Result<(), MemoryError> {
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(MemoryError::AddressOutOfRange(index))?;
        *cell = value;
        Ok(())
    }

    /// Copy a program into memory starting at `start`.
    ///
    /// Fails instead of wrapping when the program runs past 0xFFFF.
    pub fn load_program(&mut self, start: u16, program: &[u8]) -> Result<(), MemoryError> {
        let start = start as usize;
        let available = MEMORY_SIZE - start;
        if program.len() > available {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available,
            });
        }

        self.cells[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: u16, count: usize) -> Vec<(u16, u8)> {
        let start = start as usize;
        let end = (start + count).min(MEMORY_SIZE);
        (start..end).map(|i| (i as u16, self.cells[i])).collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&b| b != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Index is outside the 64 KiB store.
    #[error("memory address {0:#X} out of range (0x0000-0xFFFF)")]
    AddressOutOfRange(usize),
    /// Program does not fit between its start address and the end of memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}
