//! End-to-end behavior of the execution engine through the public API.

use em6502::{
    BudgetPolicy, Cpu, CpuError, CpuState, Flags, HaltReason, Opcode, RESET_VECTOR, STACK_RESET,
};

fn setup_cpu(program: &[u8]) -> Cpu {
    let mut cpu = Cpu::new();
    cpu.reset();
    cpu.load_program(program).unwrap();
    cpu
}

#[test]
fn reset_state() {
    let mut cpu = Cpu::new();
    cpu.mem.write(0x1234, 0x56);
    cpu.regs.a = 9;
    cpu.regs.flags.decimal = true;

    cpu.reset();

    assert_eq!(cpu.regs.pc, RESET_VECTOR);
    assert_eq!(cpu.regs.sp, STACK_RESET);
    assert_eq!((cpu.regs.a, cpu.regs.x, cpu.regs.y), (0, 0, 0));
    assert_eq!(cpu.regs.flags, Flags::default());
    assert_eq!(cpu.mem.read(0x1234), 0);
    assert_eq!(cpu.cycles(), 0);
    assert_eq!(cpu.state(), CpuState::Idle);
}

#[test]
fn immediate_load() {
    let mut cpu = setup_cpu(&[Opcode::LDA_IMM, 0x84]);

    assert_eq!(cpu.execute(2).unwrap(), 2);

    assert_eq!(cpu.regs.a, 0x84);
    assert!(cpu.regs.flags.negative);
    assert!(!cpu.regs.flags.zero);
}

#[test]
fn zero_page_load() {
    let mut cpu = setup_cpu(&[Opcode::LDA_ZPG, 0x42]);
    cpu.mem.write(0x0042, 0x00);
    cpu.regs.flags.negative = true;

    assert_eq!(cpu.execute(3).unwrap(), 3);

    assert_eq!(cpu.regs.a, 0x00);
    assert!(cpu.regs.flags.zero);
    assert!(!cpu.regs.flags.negative);
}

#[test]
fn budget_smaller_than_instruction() {
    for (program, budget) in [
        (&[Opcode::LDA_IMM, 0x80][..], 1),
        (&[Opcode::LDA_ZPG, 0x10][..], 1),
        (&[Opcode::LDA_ZPG, 0x10][..], 2),
    ] {
        let mut cpu = setup_cpu(program);
        cpu.mem.write(0x0010, 0x00);

        assert_eq!(cpu.execute(budget).unwrap(), 0);

        assert_eq!(cpu.regs.a, 0);
        assert_eq!(cpu.regs.flags, Flags::default());
        assert_eq!(cpu.regs.pc, RESET_VECTOR);
        assert_eq!(cpu.halt_reason(), Some(HaltReason::BudgetExhausted));
    }
}

#[test]
fn budget_stops_after_completed_instruction() {
    let mut cpu = setup_cpu(&[Opcode::LDA_IMM, 0x01, Opcode::LDA_ZPG, 0x10]);
    cpu.mem.write(0x0010, 0xFF);

    assert_eq!(cpu.execute(4).unwrap(), 2);

    assert_eq!(cpu.regs.a, 0x01);
    assert!(!cpu.regs.flags.negative);
    assert_eq!(cpu.regs.pc, 0xFFFE);
    assert_eq!(cpu.remaining_cycles(), 2);
}

#[test]
fn unknown_opcode_containment() {
    let mut cpu = setup_cpu(&[Opcode::LDX_IMM, 0x90, 0xEA]);

    let err = cpu.execute(100).unwrap_err();

    assert!(matches!(err, CpuError::Decode { address: 0xFFFE, .. }));
    assert_eq!(cpu.state(), CpuState::Halted);
    assert_eq!(cpu.regs.x, 0x90);
    assert_eq!(cpu.regs.a, 0);
    assert_eq!(cpu.regs.y, 0);
    assert!(cpu.regs.flags.negative);
    assert!(!cpu.regs.flags.zero);
    // Only the opcode fetch is charged.
    assert_eq!(cpu.cycles(), 3);
}

#[test]
fn store_then_load_round_trip_through_zero_page() {
    let mut cpu = setup_cpu(&[Opcode::LDY_IMM, 0xC0, Opcode::STY_ZPG, 0x00]);

    cpu.execute(5).unwrap();
    assert_eq!(cpu.mem.read(0x0000), 0xC0);

    // PC has wrapped to 0x0000, where the stored byte (0xC0) is not an opcode.
    assert_eq!(cpu.regs.pc, 0x0000);
    assert!(cpu.execute(10).is_err());
}

#[test]
fn overrun_policy() {
    let mut cpu = Cpu::with_policy(BudgetPolicy::Overrun);
    cpu.reset();
    cpu.load_program(&[Opcode::LDA_IMM, 0x00]).unwrap();

    assert_eq!(cpu.execute(1).unwrap(), 2);

    assert!(cpu.regs.flags.zero);
    assert_eq!(cpu.remaining_cycles(), -1);
}

#[test]
fn engines_are_independent() {
    let mut a = setup_cpu(&[Opcode::LDA_IMM, 0x11]);
    let mut b = setup_cpu(&[Opcode::LDA_IMM, 0x22]);

    a.execute(2).unwrap();
    b.execute(2).unwrap();

    assert_eq!(a.regs.a, 0x11);
    assert_eq!(b.regs.a, 0x22);
}
