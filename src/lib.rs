//! # LS-8 Emulator
//!
//! An emulator for the LS-8, a minimal 8-bit register machine.
//!
//! The machine has 256 bytes of memory, eight 8-bit registers (R7 serving
//! as the stack pointer), and a small instruction set whose opcodes encode
//! their own operand count and whether they set the program counter. A
//! host loads a program image, then steps or runs the CPU, collecting
//! `PRN` output through an [`Output`] sink.

pub mod cpu;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{
    Cpu, CpuState, CpuError, Memory, Registers, Instruction, Opcode, AluOp,
    Output, LineOutput,
};
pub use asm::{assemble, disassemble, parse_program, load_program_file, save_program};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
