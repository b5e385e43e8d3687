//! Instruction decoder for the LS-8.
//!
//! An opcode byte is laid out as `AABCDDDD`:
//! - `AA`: number of operand bytes that follow (0-2)
//! - `B`: the instruction is handled by the ALU
//! - `C`: the instruction sets the PC itself
//! - `DDDD`: instruction identifier
//!
//! Operand bytes are register indices or immediates, depending on the
//! instruction.

use crate::cpu::alu::AluOp;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Bit marking an ALU instruction.
pub const ALU_FLAG: u8 = 0x20;

/// Bit marking an instruction that sets the PC explicitly.
pub const SETS_PC_FLAG: u8 = 0x10;

/// Number of operand bytes encoded in an opcode byte.
#[inline]
pub const fn operand_count(opcode: u8) -> usize {
    (opcode >> 6) as usize
}

/// Whether the opcode suppresses the automatic PC advance.
#[inline]
pub const fn sets_pc(opcode: u8) -> bool {
    opcode & SETS_PC_FLAG != 0
}

/// Whether the opcode is routed through the ALU.
#[inline]
pub const fn is_alu(opcode: u8) -> bool {
    opcode & ALU_FLAG != 0
}

/// Every opcode the LS-8 understands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Hlt = 0b0000_0001,
    Ldi = 0b1000_0010,
    Prn = 0b0100_0111,
    Push = 0b0100_0101,
    Pop = 0b0100_0110,
    Jmp = 0b0101_0100,
    Inc = 0b0110_0101,
    Dec = 0b0110_0110,
    Add = 0b1010_0000,
    Sub = 0b1010_0001,
    Mul = 0b1010_0010,
    Div = 0b1010_0011,
    Mod = 0b1010_0100,
    And = 0b1010_1000,
    Or = 0b1010_1010,
    Xor = 0b1010_1011,
    Shl = 0b1010_1100,
    Shr = 0b1010_1101,
}

impl Opcode {
    /// Every opcode, in a stable order.
    pub const ALL: [Opcode; 18] = [
        Opcode::Hlt, Opcode::Ldi, Opcode::Prn, Opcode::Push, Opcode::Pop,
        Opcode::Jmp, Opcode::Inc, Opcode::Dec, Opcode::Add, Opcode::Sub,
        Opcode::Mul, Opcode::Div, Opcode::Mod, Opcode::And, Opcode::Or,
        Opcode::Xor, Opcode::Shl, Opcode::Shr,
    ];

    /// Look up the opcode registered for `byte`.
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        let op = match byte {
            0x01 => Opcode::Hlt,
            0x82 => Opcode::Ldi,
            0x47 => Opcode::Prn,
            0x45 => Opcode::Push,
            0x46 => Opcode::Pop,
            0x54 => Opcode::Jmp,
            0x65 => Opcode::Inc,
            0x66 => Opcode::Dec,
            0xA0 => Opcode::Add,
            0xA1 => Opcode::Sub,
            0xA2 => Opcode::Mul,
            0xA3 => Opcode::Div,
            0xA4 => Opcode::Mod,
            0xA8 => Opcode::And,
            0xAA => Opcode::Or,
            0xAB => Opcode::Xor,
            0xAC => Opcode::Shl,
            0xAD => Opcode::Shr,
            _ => return None,
        };
        Some(op)
    }

    /// The raw opcode byte.
    #[inline]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Number of operand bytes following the opcode.
    #[inline]
    pub const fn operand_count(self) -> usize {
        operand_count(self as u8)
    }

    /// Total encoded length in bytes.
    #[inline]
    pub const fn size(self) -> usize {
        self.operand_count() + 1
    }

    /// Whether the handler sets the PC itself.
    #[inline]
    pub const fn sets_pc(self) -> bool {
        sets_pc(self as u8)
    }

    /// The ALU operation this opcode is bound to, if any.
    pub fn alu_op(self) -> Option<AluOp> {
        let op = match self {
            Opcode::Inc => AluOp::Inc,
            Opcode::Dec => AluOp::Dec,
            Opcode::Add => AluOp::Add,
            Opcode::Sub => AluOp::Sub,
            Opcode::Mul => AluOp::Mul,
            Opcode::Div => AluOp::Div,
            Opcode::Mod => AluOp::Mod,
            Opcode::And => AluOp::And,
            Opcode::Or => AluOp::Or,
            Opcode::Xor => AluOp::Xor,
            Opcode::Shl => AluOp::Shl,
            Opcode::Shr => AluOp::Shr,
            Opcode::Hlt | Opcode::Ldi | Opcode::Prn | Opcode::Push
            | Opcode::Pop | Opcode::Jmp => return None,
        };
        Some(op)
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Hlt => "HLT",
            Opcode::Ldi => "LDI",
            Opcode::Prn => "PRN",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
            Opcode::Jmp => "JMP",
            _ => self.alu_op().map_or("???", AluOp::name),
        }
    }

    /// Look up an opcode by mnemonic (case-insensitive).
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        let upper = mnemonic.to_ascii_uppercase();
        Opcode::ALL.into_iter().find(|op| op.mnemonic() == upper)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Opcode::from_byte(byte).ok_or(DecodeError::UnsupportedOpcode(byte))
    }
}

/// A decoded instruction: an opcode plus its two operand slots.
///
/// Absent operands are 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand_a: u8,
    pub operand_b: u8,
}

impl Instruction {
    pub fn new(opcode: Opcode, operand_a: u8, operand_b: u8) -> Self {
        Self { opcode, operand_a, operand_b }
    }

    /// HLT
    pub fn hlt() -> Self {
        Self::new(Opcode::Hlt, 0, 0)
    }

    /// LDI reg, value
    pub fn ldi(reg: u8, value: u8) -> Self {
        Self::new(Opcode::Ldi, reg, value)
    }

    /// PRN reg
    pub fn prn(reg: u8) -> Self {
        Self::new(Opcode::Prn, reg, 0)
    }

    /// PUSH reg
    pub fn push(reg: u8) -> Self {
        Self::new(Opcode::Push, reg, 0)
    }

    /// POP reg
    pub fn pop(reg: u8) -> Self {
        Self::new(Opcode::Pop, reg, 0)
    }

    /// JMP reg
    pub fn jmp(reg: u8) -> Self {
        Self::new(Opcode::Jmp, reg, 0)
    }

    /// Encoded length in bytes.
    pub fn size(&self) -> usize {
        self.opcode.size()
    }
}

/// Decode one instruction from the start of `bytes`.
pub fn decode(bytes: &[u8]) -> Result<Instruction, DecodeError> {
    let (&first, rest) = bytes.split_first().ok_or(DecodeError::Truncated)?;
    let opcode = Opcode::try_from(first)?;
    let count = opcode.operand_count();

    if rest.len() < count {
        return Err(DecodeError::Truncated);
    }

    let operand_a = if count >= 1 { rest[0] } else { 0 };
    let operand_b = if count >= 2 { rest[1] } else { 0 };

    Ok(Instruction { opcode, operand_a, operand_b })
}

/// Encode an instruction back to its bytes.
pub fn encode(instr: &Instruction) -> Vec<u8> {
    let mut bytes = vec![instr.opcode.byte(), instr.operand_a, instr.operand_b];
    bytes.truncate(instr.size());
    bytes
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unsupported opcode: {0:#04X}")]
    UnsupportedOpcode(u8),

    #[error("instruction truncated")]
    Truncated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_byte_roundtrip() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_byte(op.byte()), Some(op));
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op));
        }
    }

    #[test]
    fn test_metadata_bits() {
        assert_eq!(Opcode::Hlt.operand_count(), 0);
        assert_eq!(Opcode::Prn.operand_count(), 1);
        assert_eq!(Opcode::Ldi.operand_count(), 2);
        assert_eq!(Opcode::Inc.operand_count(), 1);
        assert_eq!(Opcode::Add.size(), 3);

        assert!(Opcode::Jmp.sets_pc());
        for op in Opcode::ALL.into_iter().filter(|&op| op != Opcode::Jmp) {
            assert!(!op.sets_pc(), "{:?}", op);
        }

        for op in Opcode::ALL {
            assert_eq!(is_alu(op.byte()), op.alu_op().is_some(), "{:?}", op);
        }
    }

    #[test]
    fn test_unsupported_opcode() {
        assert_eq!(Opcode::try_from(0xFF), Err(DecodeError::UnsupportedOpcode(0xFF)));
        assert_eq!(Opcode::try_from(0x00), Err(DecodeError::UnsupportedOpcode(0x00)));
        assert_eq!(decode(&[0xFF]), Err(DecodeError::UnsupportedOpcode(0xFF)));
    }

    #[test]
    fn test_decode_operands() {
        assert_eq!(decode(&[0x82, 0, 8]), Ok(Instruction::ldi(0, 8)));
        assert_eq!(decode(&[0x47, 3, 99]), Ok(Instruction::prn(3)));
        assert_eq!(decode(&[0x01, 5, 6]), Ok(Instruction::hlt()));
        assert_eq!(decode(&[0x82, 0]), Err(DecodeError::Truncated));
        assert_eq!(decode(&[]), Err(DecodeError::Truncated));
    }

    #[test]
    fn test_encode_drops_absent_operands() {
        assert_eq!(encode(&Instruction::hlt()), vec![0x01]);
        assert_eq!(encode(&Instruction::push(2)), vec![0x45, 2]);
        assert_eq!(encode(&Instruction::new(Opcode::Add, 0, 1)), vec![0xA0, 0, 1]);
    }
}
