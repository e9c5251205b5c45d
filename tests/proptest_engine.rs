//! Property-based tests for engine invariants.

use em6502::{cpu::decode, AddrMode, Cpu, Flags, Opcode, Operation, RESET_VECTOR};
use proptest::prelude::*;

const LOADS: [u8; 6] = [
    Opcode::LDA_IMM,
    Opcode::LDA_ZPG,
    Opcode::LDX_IMM,
    Opcode::LDX_ZPG,
    Opcode::LDY_IMM,
    Opcode::LDY_ZPG,
];

const STORES: [u8; 3] = [Opcode::STA_ZPG, Opcode::STX_ZPG, Opcode::STY_ZPG];

/// Load `value` with `opcode`, placing it in zero page when needed.
fn run_load(opcode: u8, value: u8, zp: u8) -> (Cpu, u8) {
    let mut cpu = Cpu::new();
    cpu.reset();

    let instr = decode::decode(opcode).unwrap();
    let operand = match instr.mode {
        AddrMode::Immediate => value,
        AddrMode::ZeroPage => {
            cpu.mem.write(u16::from(zp), value);
            zp
        }
    };
    cpu.load_program(&[opcode, operand]).unwrap();
    cpu.execute(u32::from(instr.cycles())).unwrap();

    let result = match instr.op {
        Operation::Lda => cpu.regs.a,
        Operation::Ldx => cpu.regs.x,
        Operation::Ldy => cpu.regs.y,
        _ => unreachable!(),
    };
    (cpu, result)
}

proptest! {
    /// Property: reset twice is indistinguishable from reset once
    #[test]
    fn prop_reset_idempotent(
        cells in prop::collection::vec((any::<u16>(), any::<u8>()), 0..64),
        a in any::<u8>(),
        status in any::<u8>(),
    ) {
        let mut once = Cpu::new();
        for &(addr, value) in &cells {
            once.mem.write(addr, value);
        }
        once.regs.a = a;
        once.regs.flags = Flags::from_byte(status);
        let mut twice = once.clone();

        once.reset();
        twice.reset();
        twice.reset();

        prop_assert_eq!(&once.regs, &twice.regs);
        prop_assert_eq!(once.state(), twice.state());
        prop_assert_eq!(once.cycles(), twice.cycles());
        prop_assert_eq!(once.mem.dump(0, 0x10000), twice.mem.dump(0, 0x10000));
    }

    /// Property: every load stores its operand and derives Z/N from it alone
    #[test]
    fn prop_load_flags(idx in 0..LOADS.len(), value in any::<u8>(), zp in any::<u8>()) {
        let (cpu, result) = run_load(LOADS[idx], value, zp);

        prop_assert_eq!(result, value);
        prop_assert_eq!(cpu.regs.flags.zero, value == 0);
        prop_assert_eq!(cpu.regs.flags.negative, value >= 0x80);
        prop_assert!(!(cpu.regs.flags.zero && cpu.regs.flags.negative));
        prop_assert_eq!(cpu.regs.pc, RESET_VECTOR.wrapping_add(2));
    }

    /// Property: cycles consumed always match the static cost table
    #[test]
    fn prop_cycles_match_table(idx in 0..LOADS.len(), value in any::<u8>(), zp in any::<u8>()) {
        let (cpu, _) = run_load(LOADS[idx], value, zp);
        let expected = decode::cycles_for(LOADS[idx]).unwrap();

        prop_assert_eq!(cpu.cycles(), u64::from(expected));
    }

    /// Property: stores write their register, cost what the table says and keep every flag
    #[test]
    fn prop_store_cost_and_flags(
        idx in 0..STORES.len(),
        value in any::<u8>(),
        zp in any::<u8>(),
        status in any::<u8>(),
    ) {
        let opcode = STORES[idx];
        let mut cpu = Cpu::new();
        cpu.reset();
        cpu.load_program(&[opcode, zp]).unwrap();
        match decode::decode(opcode).unwrap().op {
            Operation::Sta => cpu.regs.a = value,
            Operation::Stx => cpu.regs.x = value,
            Operation::Sty => cpu.regs.y = value,
            _ => unreachable!(),
        }
        cpu.regs.flags = Flags::from_byte(status);
        let expected = decode::cycles_for(opcode).unwrap();

        let used = cpu.execute(u32::from(expected)).unwrap();

        prop_assert_eq!(used, u64::from(expected));
        prop_assert_eq!(cpu.mem.read(u16::from(zp)), value);
        prop_assert_eq!(cpu.regs.flags, Flags::from_byte(status));
    }

    /// Property: an unknown opcode never touches registers or flags
    #[test]
    fn prop_unknown_opcode_contained(
        opcode in any::<u8>().prop_filter("unknown", |b| decode::decode(*b).is_err()),
        a in any::<u8>(),
        x in any::<u8>(),
        y in any::<u8>(),
        status in any::<u8>(),
        budget in 1u32..16,
    ) {
        let mut cpu = Cpu::new();
        cpu.reset();
        cpu.mem.write(RESET_VECTOR, opcode);
        cpu.regs.a = a;
        cpu.regs.x = x;
        cpu.regs.y = y;
        cpu.regs.flags = Flags::from_byte(status);

        prop_assert!(cpu.execute(budget).is_err());

        prop_assert!(cpu.is_halted());
        prop_assert_eq!((cpu.regs.a, cpu.regs.x, cpu.regs.y), (a, x, y));
        prop_assert_eq!(cpu.regs.flags, Flags::from_byte(status));
    }
}
