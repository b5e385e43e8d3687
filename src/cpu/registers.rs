//! LS-8 CPU registers.
//!
//! The LS-8 has eight general-purpose 8-bit registers, R0 through R7, and a
//! program counter. R7 doubles as the stack pointer by convention only: at
//! the storage level it is an ordinary register.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Index of the register used as the stack pointer.
pub const SP: usize = 7;

/// Initial stack pointer value. The twelve cells above it are reserved.
pub const SP_INIT: u8 = 0xF4;

/// The LS-8 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// R0..R7
    gpr: [u8; REGISTER_COUNT],

    /// Program counter: address of the next instruction to fetch.
    pub pc: usize,
}

impl Registers {
    /// Create a new register file: everything zero except SP.
    pub fn new() -> Self {
        let mut gpr = [0; REGISTER_COUNT];
        gpr[SP] = SP_INIT;
        Self { gpr, pc: 0 }
    }

    /// Reset all registers to their power-on values.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Read register `index` (0-7).
    #[inline]
    pub fn get(&self, index: usize) -> Result<u8, RegisterError> {
        self.gpr
            .get(index)
            .copied()
            .ok_or(RegisterError::InvalidRegister(index))
    }

    /// Write register `index` (0-7).
    #[inline]
    pub fn set(&mut self, index: usize, value: u8) -> Result<(), RegisterError> {
        let slot = self.gpr
            .get_mut(index)
            .ok_or(RegisterError::InvalidRegister(index))?;
        *slot = value;
        Ok(())
    }

    /// Current stack pointer (R7).
    #[inline]
    pub fn sp(&self) -> u8 {
        self.gpr[SP]
    }

    /// All general-purpose registers in index order.
    pub fn all(&self) -> &[u8; REGISTER_COUNT] {
        &self.gpr
    }

    /// Advance the program counter by `count` bytes, saturating.
    /// Returns the old value.
    pub fn advance_pc(&mut self, count: usize) -> usize {
        let old = self.pc;
        self.pc = self.pc.saturating_add(count);
        old
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: usize) {
        self.pc = addr;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("register index {0} out of range (0-7)")]
    InvalidRegister(usize),
}
