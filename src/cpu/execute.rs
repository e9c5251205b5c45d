//! CPU execution engine.
//!
//! Implements the cycle-budgeted fetch-decode-execute loop and all
//! instruction behaviors.

use crate::cpu::decode::{self, AddrMode, DecodeError, Instruction, Operation};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::RESET_VECTOR;
use crate::cpu::{Memory, Registers};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dispatch loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// Between instructions.
    Idle,
    /// Consuming the opcode byte.
    Fetching,
    /// Matching the opcode against the instruction set.
    Decoding,
    /// Resolving the operand and running the operation.
    Executing,
    /// Stopped; see [`HaltReason`].
    Halted,
}

/// Why the engine stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// The budget cannot cover the next instruction. Resumable.
    BudgetExhausted,
    /// The byte at `address` is not an opcode. Sticky until reset.
    UnknownOpcode { opcode: u8, address: u16 },
}

/// What to do with an instruction that costs more than the remaining budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetPolicy {
    /// Leave it unstarted and halt; PC still points at it.
    #[default]
    Defer,
    /// Start it while any budget remains and let the budget go negative.
    Overrun,
}

/// The CPU: register file, memory and dispatch state.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    state: CpuState,
    halt_reason: Option<HaltReason>,
    policy: BudgetPolicy,
    /// Cycles consumed since reset.
    cycles: u64,
    /// Budget left in the current `execute` window.
    remaining: i64,
}

impl Cpu {
    /// Create a CPU in its reset state.
    pub fn new() -> Self {
        Self::with_policy(BudgetPolicy::default())
    }

    /// Create a CPU in its reset state with the given budget policy.
    pub fn with_policy(policy: BudgetPolicy) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Idle,
            halt_reason: None,
            policy,
            cycles: 0,
            remaining: 0,
        }
    }

    /// Reset registers, flags and memory.
    ///
    /// PC goes to the reset vector, SP to the bottom of page one.
    /// The budget policy is kept.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.init();
        self.state = CpuState::Idle;
        self.halt_reason = None;
        self.cycles = 0;
        self.remaining = 0;
        log::debug!("reset: PC={:#06X} SP={:#06X}", self.regs.pc, self.regs.sp);
    }

    /// Load a program at the reset vector.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), CpuError> {
        self.mem.load_program(RESET_VECTOR, program)?;
        Ok(())
    }

    /// Run instructions until the budget cannot cover the next one.
    ///
    /// Returns the number of cycles consumed by this call. A decode failure
    /// halts the engine and is returned as an error; registers and flags keep
    /// the values the last completed instruction left.
    pub fn execute(&mut self, budget: u32) -> Result<u64, CpuError> {
        self.ensure_running()?;

        let start_cycles = self.cycles;
        self.remaining = i64::from(budget);
        self.halt_reason = None;
        self.state = CpuState::Idle;

        while self.can_start_instruction() {
            self.run_instruction()?;
        }
        self.halt(HaltReason::BudgetExhausted);

        Ok(self.cycles - start_cycles)
    }

    /// Execute a single instruction with a budget of exactly its cost.
    pub fn step(&mut self) -> Result<Instruction, CpuError> {
        self.ensure_running()?;

        let opcode = self.mem.read(self.regs.pc);
        self.remaining = decode::cycles_for(opcode).map_or(1, i64::from);
        self.halt_reason = None;

        self.run_instruction()
    }

    fn ensure_running(&self) -> Result<(), CpuError> {
        match self.halt_reason {
            Some(reason @ HaltReason::UnknownOpcode { .. }) => Err(CpuError::NotRunning(reason)),
            _ => Ok(()),
        }
    }

    fn can_start_instruction(&self) -> bool {
        if self.remaining <= 0 {
            return false;
        }

        match self.policy {
            BudgetPolicy::Overrun => true,
            BudgetPolicy::Defer => match decode::cycles_for(self.mem.read(self.regs.pc)) {
                Some(cost) => i64::from(cost) <= self.remaining,
                // Unknown opcodes are fetched so the decode failure gets reported.
                None => true,
            },
        }
    }

    fn run_instruction(&mut self) -> Result<Instruction, CpuError> {
        // Fetch
        self.state = CpuState::Fetching;
        let address = self.regs.pc;
        let opcode = self.fetch_byte();

        // Decode
        self.state = CpuState::Decoding;
        let instr = match decode::decode(opcode) {
            Ok(instr) => instr,
            Err(source) => {
                log::warn!("instruction [{:#04X}] not handled at {:#06X}", opcode, address);
                self.halt(HaltReason::UnknownOpcode { opcode, address });
                return Err(CpuError::Decode { address, source });
            }
        };

        // Execute
        self.state = CpuState::Executing;
        self.execute_instruction(instr);
        self.state = CpuState::Idle;

        log::trace!(
            target: "instr",
            "{:#06X} {} A={:02X} X={:02X} Y={:02X} P={}",
            address,
            instr,
            self.regs.a,
            self.regs.x,
            self.regs.y,
            self.regs.flags
        );

        Ok(instr)
    }

    fn halt(&mut self, reason: HaltReason) {
        self.state = CpuState::Halted;
        self.halt_reason = Some(reason);
        log::debug!("halted: {:?} after {} cycles", reason, self.cycles);
    }

    /// Execute a decoded instruction.
    fn execute_instruction(&mut self, instr: Instruction) {
        match instr.op {
            Operation::Lda => self.regs.a = self.load(instr.mode),
            Operation::Ldx => self.regs.x = self.load(instr.mode),
            Operation::Ldy => self.regs.y = self.load(instr.mode),
            Operation::Sta => self.store(self.regs.a),
            Operation::Stx => self.store(self.regs.x),
            Operation::Sty => self.store(self.regs.y),
        }
    }

    /// Resolve an operand and derive Z/N from it.
    fn load(&mut self, mode: AddrMode) -> u8 {
        let value = self.resolve_operand(mode);
        self.regs.flags.set_zn(value);
        value
    }

    fn store(&mut self, value: u8) {
        let addr = self.fetch_zero_page_address();
        self.write_byte(addr, value);
    }

    /// Produce the effective operand for `mode`.
    fn resolve_operand(&mut self, mode: AddrMode) -> u8 {
        match mode {
            AddrMode::Immediate => self.fetch_byte(),
            AddrMode::ZeroPage => {
                let addr = self.fetch_zero_page_address();
                self.read_byte(addr)
            }
        }
    }

    fn fetch_zero_page_address(&mut self) -> u16 {
        u16::from(self.fetch_byte())
    }

    /// Read the byte at PC and advance past it. One cycle.
    fn fetch_byte(&mut self) -> u8 {
        let pc = self.regs.advance_pc();
        let value = self.mem.read(pc);
        self.tick();
        value
    }

    /// Read a data byte. One cycle.
    fn read_byte(&mut self, addr: u16) -> u8 {
        let value = self.mem.read(addr);
        self.tick();
        value
    }

    /// Write a data byte. One cycle.
    fn write_byte(&mut self, addr: u16, value: u8) {
        self.mem.write(addr, value);
        self.tick();
    }

    #[inline]
    fn tick(&mut self) {
        self.remaining -= 1;
        self.cycles += 1;
    }

    /// Current dispatch state.
    pub fn state(&self) -> CpuState {
        self.state
    }

    /// Why the engine last halted, if it has.
    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.halt_reason
    }

    /// Cycles consumed since reset.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Budget left after the last `execute`; negative only under
    /// [`BudgetPolicy::Overrun`].
    pub fn remaining_cycles(&self) -> i64 {
        self.remaining
    }

    /// The active budget policy.
    pub fn policy(&self) -> BudgetPolicy {
        self.policy
    }

    /// Change the budget policy; takes effect on the next `execute`.
    pub fn set_policy(&mut self, policy: BudgetPolicy) {
        self.policy = policy;
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("halt_reason", &self.halt_reason)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(HaltReason),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("decode error at {address:#06X}: {source}")]
    Decode {
        address: u16,
        #[source]
        source: DecodeError,
    },
}
