//! Assembler, disassembler and program files for the LS-8.
//!
//! This module provides:
//! - The binary-literal program file format (text → memory image)
//! - A simple two-pass assembler (mnemonics → memory image)
//! - A disassembler (memory image → readable text)

pub mod assembler;
pub mod disasm;
pub mod program;

pub use assembler::{assemble, AssemblerError};
pub use disasm::disassemble;
pub use program::{parse_program, load_program_file, save_program, ProgramError};
