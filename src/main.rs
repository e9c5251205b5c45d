//! em6502 - CLI Entry Point
//!
//! Commands:
//! - `em6502 run <bytes>...` - Load hex bytes at the reset vector and execute
//! - `em6502 demo` - Run the built-in zero-page and immediate load programs

use clap::{Parser, Subcommand, ValueEnum};
use em6502::{cpu::decode, BudgetPolicy, Cpu, CpuError, CpuState, HaltReason, Opcode, Registers};
use log::LevelFilter;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "em6502")]
#[command(version = "0.1.0")]
#[command(about = "A cycle-budgeted 6502-family CPU execution engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log every executed instruction
    #[arg(short, long, global = true)]
    trace: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a program at 0xFFFC and run it
    Run {
        /// Program bytes in hex (e.g. A9 84)
        #[arg(required = true)]
        bytes: Vec<String>,
        /// Cycle budget (default: the cost of the loaded program)
        #[arg(short, long)]
        budget: Option<u32>,
        /// What to do with an instruction that does not fit the budget
        #[arg(short, long, value_enum, default_value = "defer")]
        policy: PolicyArg,
        /// Set a memory cell before running, as hex ADDR=VALUE (e.g. 42=84)
        #[arg(long, value_parser = parse_poke)]
        poke: Vec<(u16, u8)>,
        /// Print the final state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the built-in demo programs
    Demo,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Defer,
    Overrun,
}

impl From<PolicyArg> for BudgetPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Defer => BudgetPolicy::Defer,
            PolicyArg::Overrun => BudgetPolicy::Overrun,
        }
    }
}

/// Final engine state as printed by `run --json`.
#[derive(Serialize)]
struct Report<'a> {
    registers: &'a Registers,
    status: u8,
    state: CpuState,
    halt_reason: Option<HaltReason>,
    cycles: u64,
    remaining: i64,
}

impl<'a> Report<'a> {
    fn new(cpu: &'a Cpu) -> Self {
        Self {
            registers: &cpu.regs,
            status: cpu.regs.flags.to_byte(),
            state: cpu.state(),
            halt_reason: cpu.halt_reason(),
            cycles: cpu.cycles(),
            remaining: cpu.remaining_cycles(),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.trace);

    match cli.command {
        Some(Commands::Run { bytes, budget, policy, poke, json }) => {
            run_program(&bytes, budget, policy.into(), &poke, json);
        }
        Some(Commands::Demo) => {
            run_demo();
        }
        None => {
            println!("em6502 v0.1.0");
            println!("A cycle-budgeted 6502-family CPU execution engine");
            println!();
            println!("Use --help for available commands");
        }
    }
}

fn init_logging(trace: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if trace {
        builder.filter_level(LevelFilter::Trace);
    }
    builder.init();
}

fn parse_poke(s: &str) -> Result<(u16, u8), String> {
    let (addr, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ADDR=VALUE, got '{}'", s))?;
    let addr = u16::from_str_radix(addr.trim_start_matches("0x"), 16)
        .map_err(|e| format!("bad address '{}': {}", addr, e))?;
    let value = u8::from_str_radix(value.trim_start_matches("0x"), 16)
        .map_err(|e| format!("bad value '{}': {}", value, e))?;
    Ok((addr, value))
}

fn parse_bytes(words: &[String]) -> Result<Vec<u8>, String> {
    words
        .iter()
        .map(|w| {
            u8::from_str_radix(w.trim_start_matches("0x"), 16)
                .map_err(|e| format!("bad byte '{}': {}", w, e))
        })
        .collect()
}

/// Sum the static cost of each instruction in `program`.
///
/// A byte that does not decode adds the one cycle its fetch takes, so the
/// engine reaches it and reports it, and the sum stops there.
fn program_cost(program: &[u8]) -> u32 {
    let mut cost = 0;
    let mut i = 0;
    while let Some(&opcode) = program.get(i) {
        match decode::decode(opcode) {
            Ok(instr) => {
                cost += u32::from(instr.cycles());
                i += usize::from(instr.bytes());
            }
            Err(_) => {
                cost += 1;
                break;
            }
        }
    }
    cost
}

fn run_program(
    words: &[String],
    budget: Option<u32>,
    policy: BudgetPolicy,
    pokes: &[(u16, u8)],
    json: bool,
) {
    let program = match parse_bytes(words) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let mut cpu = Cpu::with_policy(policy);
    cpu.reset();
    if let Err(e) = cpu.load_program(&program) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }
    for &(addr, value) in pokes {
        cpu.mem.write(addr, value);
    }

    let budget = budget.unwrap_or_else(|| program_cost(&program));
    let result = cpu.execute(budget);

    if json {
        match serde_json::to_string_pretty(&Report::new(&cpu)) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("❌ Failed to render state: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_state(&cpu);
    }

    if let Err(e) = result {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

fn run_demo() {
    println!("━━━ Zero page: LDA $42 ([$42] = $84), 3 cycles ━━━");
    let mut cpu = Cpu::new();
    cpu.reset();
    cpu.mem.write(0xFFFC, Opcode::LDA_ZPG);
    cpu.mem.write(0xFFFD, 0x42);
    cpu.mem.write(0x0042, 0x84);
    report_result(cpu.execute(3));
    print_state(&cpu);

    println!();
    println!("━━━ Immediate: LDA #$42, 2 cycles ━━━");
    cpu.reset();
    cpu.mem.write(0xFFFC, Opcode::LDA_IMM);
    cpu.mem.write(0xFFFD, 0x42);
    report_result(cpu.execute(2));
    print_state(&cpu);
}

fn report_result(result: Result<u64, CpuError>) {
    if let Err(e) = result {
        eprintln!("❌ {}", e);
    }
}

fn print_state(cpu: &Cpu) {
    let regs = &cpu.regs;
    println!("PC: {:#06X}  SP: {:#06X}", regs.pc, regs.sp);
    println!("A: {:#04X}  X: {:#04X}  Y: {:#04X}", regs.a, regs.x, regs.y);
    println!("P: {} ({:#04X})", regs.flags, regs.flags.to_byte());
    println!("Cycles: {}", cpu.cycles());
    println!("State: {:?}", cpu.state());
    if let Some(reason) = cpu.halt_reason() {
        println!("Halt: {:?}", reason);
    }
}
