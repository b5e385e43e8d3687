//! CPU emulation for the LS-8.
//!
//! This module implements the complete LS-8 core:
//! - 256 byte-wide memory cells
//! - 8 general-purpose registers, R7 doubling as the stack pointer
//! - an ALU evaluating a fixed set of 8-bit operations
//! - opcodes that carry their own operand count and PC-control bit

pub mod memory;
pub mod registers;
pub mod alu;
pub mod decode;
pub mod execute;
pub mod output;

pub use memory::{Memory, MemoryError};
pub use registers::{Registers, RegisterError};
pub use alu::{AluOp, AluError};
pub use decode::{Instruction, Opcode, DecodeError};
pub use execute::{Cpu, CpuError, CpuState};
pub use output::{Output, LineOutput};
