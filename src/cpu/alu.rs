//! Arithmetic/logic unit.
//!
//! Every operation works on two unsigned 8-bit values and produces an
//! 8-bit result. Intermediate results are computed wide and masked with
//! `& 0xFF`, which is the only normalization step in the machine.

use serde::{Serialize, Deserialize};
use std::str::FromStr;
use thiserror::Error;

/// The closed set of ALU operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Inc,
    Dec,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl AluOp {
    /// Every operation, in a stable order.
    pub const ALL: [AluOp; 12] = [
        AluOp::Add, AluOp::Sub, AluOp::Mul, AluOp::Div, AluOp::Mod, AluOp::Inc,
        AluOp::Dec, AluOp::And, AluOp::Or, AluOp::Xor, AluOp::Shl, AluOp::Shr,
    ];

    /// Upper-case operation name.
    pub fn name(self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::Mul => "MUL",
            AluOp::Div => "DIV",
            AluOp::Mod => "MOD",
            AluOp::Inc => "INC",
            AluOp::Dec => "DEC",
            AluOp::And => "AND",
            AluOp::Or => "OR",
            AluOp::Xor => "XOR",
            AluOp::Shl => "SHL",
            AluOp::Shr => "SHR",
        }
    }
}

impl FromStr for AluOp {
    type Err = AluError;

    /// Parse an operation name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        AluOp::ALL
            .into_iter()
            .find(|op| op.name() == upper)
            .ok_or(AluError::UnsupportedOperation(s.to_string()))
    }
}

impl std::fmt::Display for AluOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Evaluate `op` on two register values.
///
/// `INC` and `DEC` ignore `b`.
pub fn evaluate(op: AluOp, a: u8, b: u8) -> Result<u8, AluError> {
    let (a, b) = (u32::from(a), u32::from(b));

    let wide = match op {
        AluOp::Add => a + b,
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Mul => a * b,
        AluOp::Div => a.checked_div(b).ok_or(AluError::DivisionByZero)?,
        AluOp::Mod => a.checked_rem(b).ok_or(AluError::DivisionByZero)?,
        AluOp::Inc => a + 1,
        AluOp::Dec => a.wrapping_sub(1),
        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Shl => a.checked_shl(b).unwrap_or(0),
        AluOp::Shr => a.checked_shr(b).unwrap_or(0),
    };

    Ok((wide & 0xFF) as u8)
}

/// Evaluate an operation given by name.
pub fn evaluate_named(name: &str, a: u8, b: u8) -> Result<u8, AluError> {
    evaluate(name.parse()?, a, b)
}

/// Errors raised by the ALU.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AluError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("unsupported ALU operation: {0}")]
    UnsupportedOperation(String),
}
