//! LS-8 memory subsystem.
//!
//! A flat bank of 256 byte-wide cells, addressed 0..=255. Every access is
//! bounds-checked; addresses are host `usize` values so that a program
//! counter or loader running past the last cell is reported instead of
//! silently wrapping.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of memory cells in the LS-8.
pub const MEMORY_SIZE: usize = 256;

/// LS-8 memory: 256 eight-bit cells.
///
/// Serialized as a plain array of cells; deserializing anything other than
/// exactly 256 cells fails.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
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

    /// Read a cell by address (0-255).
    #[inline]
    pub fn read(&self, addr: usize) -> Result<u8, MemoryError> {
        self.cells
            .get(addr)
            .copied()
            .ok_or(MemoryError::InvalidAddress(addr))
    }

    /// Write a cell by address (0-255).
    #[inline]
    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), MemoryError> {
        let cell = self.cells
            .get_mut(addr)
            .ok_or(MemoryError::InvalidAddress(addr))?;
        *cell = value;
        Ok(())
    }

    /// Read a cell without failing; out-of-range addresses yield `None`.
    ///
    /// Used by inspectors (trace, debugger) that must never disturb a run.
    #[inline]
    pub fn peek(&self, addr: usize) -> Option<u8> {
        self.cells.get(addr).copied()
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Load an image into memory starting at address 0, in order.
    ///
    /// Bytes are written one at a time, so an oversized image fails with
    /// `InvalidAddress(256)` after the first 256 bytes have been stored.
    pub fn load(&mut self, image: &[u8]) -> Result<(), MemoryError> {
        for (addr, &byte) in image.iter().enumerate() {
            self.write(addr, byte)?;
        }
        Ok(())
    }

    /// Borrow the full cell array.
    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u8)> {
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<u8>> for Memory {
    type Error = MemoryError;

    fn try_from(cells: Vec<u8>) -> Result<Self, Self::Error> {
        if cells.len() != MEMORY_SIZE {
            return Err(MemoryError::InvalidSize(cells.len()));
        }
        Ok(Self { cells })
    }
}

impl From<Memory> for Vec<u8> {
    fn from(mem: Memory) -> Self {
        mem.cells
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&cell| cell != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address is outside valid memory range.
    #[error("memory address {0} out of range (0-255)")]
    InvalidAddress(usize),

    /// A memory image restored from a snapshot has the wrong cell count.
    #[error("memory snapshot has {0} cells, expected 256")]
    InvalidSize(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();

        mem.write(10, 42).unwrap();
        assert_eq!(mem.read(10), Ok(42));
    }

    #[test]
    fn test_memory_bounds() {
        let mut mem = Memory::new();

        assert!(mem.read(0).is_ok());
        assert!(mem.read(255).is_ok());

        assert_eq!(mem.read(256), Err(MemoryError::InvalidAddress(256)));
        assert_eq!(mem.write(256, 1), Err(MemoryError::InvalidAddress(256)));
        assert_eq!(mem.write(usize::MAX, 1), Err(MemoryError::InvalidAddress(usize::MAX)));
    }

    #[test]
    fn test_load_image() {
        let mut mem = Memory::new();
        mem.load(&[1, 2, 3]).unwrap();

        assert_eq!(mem.read(0), Ok(1));
        assert_eq!(mem.read(1), Ok(2));
        assert_eq!(mem.read(2), Ok(3));
        assert_eq!(mem.read(3), Ok(0));
    }

    #[test]
    fn test_load_oversized_image() {
        let mut mem = Memory::new();
        let image = vec![7u8; MEMORY_SIZE + 1];

        assert_eq!(mem.load(&image), Err(MemoryError::InvalidAddress(256)));
        assert_eq!(mem.read(255), Ok(7));
    }

    #[test]
    fn test_peek_and_dump() {
        let mut mem = Memory::new();
        mem.write(254, 9).unwrap();

        assert_eq!(mem.peek(254), Some(9));
        assert_eq!(mem.peek(300), None);
        assert_eq!(mem.dump(253, 10), vec![(253, 0), (254, 9), (255, 0)]);
        assert!(mem.dump(400, 4).is_empty());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut mem = Memory::new();
        mem.write(7, 0x2A).unwrap();

        let json = serde_json::to_string(&mem).unwrap();
        let restored: Memory = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.as_slice(), mem.as_slice());
    }

    #[test]
    fn test_snapshot_with_wrong_size_is_rejected() {
        let short: Result<Memory, _> = serde_json::from_str("[1,2,3,4]");
        assert!(short.is_err());

        let long = format!("[{}]", vec!["0"; MEMORY_SIZE + 1].join(","));
        assert!(serde_json::from_str::<Memory>(&long).is_err());

        assert_eq!(
            Memory::try_from(vec![0; 4]).map(|_| ()),
            Err(MemoryError::InvalidSize(4))
        );
    }
}
