//! Simple assembler for LS-8 programs.
//!
//! Syntax:
//! ```text
//! ; Comment (or # Comment)
//! LOOP:           ; Define a label
//!     LDI R0, 8   ; Load immediate
//!     LDI R1, LOOP; Load a label's address
//!     ADD R0, R0  ; Register-register ALU op
//!     PRN R0      ; Print register
//!     JMP R1      ; Jump to the address held in R1
//!     HLT         ; Halt
//!     DB 0x2A     ; Define a raw byte
//! ```

use crate::cpu::decode::{encode, Instruction, Opcode};
use crate::cpu::memory::MEMORY_SIZE;
use crate::cpu::registers::REGISTER_COUNT;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to a memory image.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label -> address).
    symbols: HashMap<String, usize>,
    /// Pending references: (output_index, label, source_line).
    pending: Vec<(usize, String, usize)>,
    /// Output bytes.
    output: Vec<u8>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<u8>, AssemblerError> {
        // Pass 1: Collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        if self.output.len() > MEMORY_SIZE {
            return Err(AssemblerError::ProgramTooLarge(self.output.len()));
        }

        // Pass 2: Resolve forward references
        self.resolve_references()?;

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = match line.find([';', '#']) {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut line = line.trim();

        if line.is_empty() {
            return Ok(());
        }

        // Check for label definition
        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            if label.is_empty() || label.contains(char::is_whitespace) {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid label {:?}", &line[..colon_idx]),
                });
            }
            if self.symbols.insert(label.clone(), self.output.len()).is_some() {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("duplicate label {}", label),
                });
            }

            line = line[colon_idx + 1..].trim();
            if line.is_empty() {
                return Ok(());
            }
        }

        self.process_instruction(line, line_num)
    }

    fn process_instruction(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let (mnemonic, rest) = match line.split_once(char::is_whitespace) {
            Some((m, rest)) => (m.to_uppercase(), rest.trim()),
            None => (line.to_uppercase(), ""),
        };
        let operands: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::trim).collect()
        };

        if mnemonic == "DB" {
            let [value] = operands.as_slice() else {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: "DB requires exactly one value".into(),
                });
            };
            let slot = self.output.len();
            let byte = self.parse_value(value, slot, line_num)?;
            self.output.push(byte);
            return Ok(());
        }

        let instr = self.parse_instruction(&mnemonic, &operands, line_num)?;
        self.output.extend(encode(&instr));
        Ok(())
    }

    fn parse_instruction(&mut self, mnemonic: &str, operands: &[&str], line_num: usize)
        -> Result<Instruction, AssemblerError>
    {
        let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| {
            AssemblerError::UnknownMnemonic { line: line_num, mnemonic: mnemonic.to_string() }
        })?;

        if operands.len() != opcode.operand_count() {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!(
                    "{} takes {} operand(s), found {}",
                    mnemonic, opcode.operand_count(), operands.len()
                ),
            });
        }

        let instr = match (opcode, operands) {
            (Opcode::Hlt, []) => Instruction::hlt(),
            (Opcode::Ldi, [reg, value]) => {
                let reg = parse_register(reg, line_num)?;
                // The immediate is the third byte of the instruction.
                let slot = self.output.len() + 2;
                let value = self.parse_value(value, slot, line_num)?;
                Instruction::ldi(reg, value)
            }
            (_, [reg]) => Instruction::new(opcode, parse_register(reg, line_num)?, 0),
            (_, [a, b]) => Instruction::new(
                opcode,
                parse_register(a, line_num)?,
                parse_register(b, line_num)?,
            ),
            _ => unreachable!("operand count checked above"),
        };

        Ok(instr)
    }

    /// Parse an 8-bit value: decimal, `0x` hex, `0b` binary, or a label.
    ///
    /// Labels are recorded against output byte `slot` and patched in pass 2.
    fn parse_value(&mut self, operand: &str, slot: usize, line_num: usize) -> Result<u8, AssemblerError> {
        let number = if let Some(hex) = operand.strip_prefix("0x").or(operand.strip_prefix("0X")) {
            i64::from_str_radix(hex, 16).ok()
        } else if let Some(bin) = operand.strip_prefix("0b").or(operand.strip_prefix("0B")) {
            i64::from_str_radix(bin, 2).ok()
        } else if operand.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            operand.parse::<i64>().ok()
        } else {
            None
        };

        if let Some(value) = number {
            return u8::try_from(value)
                .map_err(|_| AssemblerError::ValueOutOfRange { line: line_num, value });
        }

        if !is_label(operand) {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid value {:?}", operand),
            });
        }

        self.pending.push((slot, operand.to_uppercase(), line_num));
        Ok(0)
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for (out_idx, label, line_num) in &self.pending {
            let addr = self.symbols.get(label)
                .ok_or_else(|| AssemblerError::UndefinedLabel {
                    line: *line_num,
                    label: label.clone(),
                })?;

            // A label after the last byte of a full image has address 256.
            self.output[*out_idx] = u8::try_from(*addr)
                .map_err(|_| AssemblerError::ValueOutOfRange {
                    line: *line_num,
                    value: *addr as i64,
                })?;
        }
        Ok(())
    }
}

fn parse_register(operand: &str, line_num: usize) -> Result<u8, AssemblerError> {
    operand
        .strip_prefix(['R', 'r'])
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|&n| usize::from(n) < REGISTER_COUNT)
        .ok_or_else(|| AssemblerError::SyntaxError {
            line: line_num,
            message: format!("expected register R0-R7, found {:?}", operand),
        })
}

fn is_label(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i64 },

    #[error("program is {0} bytes, memory holds 256")]
    ProgramTooLarge(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; LDI R0=8, LDI R1=9, ADD, PRN, HLT
            LDI R0, 8
            LDI R1, 9
            ADD R0, R1
            PRN R0
            HLT
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![0x82, 0, 8, 0x82, 1, 9, 0xA0, 0, 1, 0x47, 0, 0x01]);
    }

    #[test]
    fn test_assemble_with_labels() {
        let source = r#"
        START:
            LDI R2, END   # forward reference
            JMP R2
            HLT
        END:
            LDI R3, start
            HLT
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![0x82, 2, 6, 0x54, 2, 0x01, 0x82, 3, 0, 0x01]);
    }

    #[test]
    fn test_assemble_data_and_literals() {
        let source = "DB 42\nDB 0xff\nDB 0b101\nLDI R7, 0xF4\n";

        let result = assemble(source).unwrap();
        assert_eq!(result, vec![42, 0xFF, 0b101, 0x82, 7, 0xF4]);
    }

    #[test]
    fn test_label_on_same_line() {
        let result = assemble("loop: INC R0\nLDI R1, LOOP\n").unwrap();
        assert_eq!(result, vec![0x65, 0, 0x82, 1, 0]);
    }

    #[test]
    fn test_duplicate_label() {
        let source = "LOOP: HLT\nloop:\nHLT\n";
        assert_eq!(
            assemble(source),
            Err(AssemblerError::SyntaxError { line: 2, message: "duplicate label LOOP".into() })
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            assemble("NOP"),
            Err(AssemblerError::UnknownMnemonic { line: 1, mnemonic: "NOP".into() })
        );
        assert_eq!(
            assemble("LDI R0, 256"),
            Err(AssemblerError::ValueOutOfRange { line: 1, value: 256 })
        );
        assert_eq!(
            assemble("HLT\nLDI R0, NOWHERE"),
            Err(AssemblerError::UndefinedLabel { line: 2, label: "NOWHERE".into() })
        );
        assert!(matches!(
            assemble("PRN R8"),
            Err(AssemblerError::SyntaxError { line: 1, .. })
        ));
        assert!(matches!(
            assemble("ADD R0"),
            Err(AssemblerError::SyntaxError { line: 1, .. })
        ));
        assert!(matches!(
            assemble(&"DB 0\n".repeat(257)),
            Err(AssemblerError::ProgramTooLarge(257))
        ));
    }
}
