//! Disassembler for LS-8 programs.
//!
//! Converts a memory image back to readable assembly.

use crate::cpu::decode::{decode, Instruction, Opcode};

/// Disassemble the instruction at the start of `bytes`.
///
/// Unknown or truncated instructions render as a `DB` of their first byte.
pub fn disassemble_instruction(bytes: &[u8]) -> String {
    match decode(bytes) {
        Ok(decoded) => format_instruction(&decoded),
        Err(_) => match bytes.first() {
            Some(byte) => format!("DB {:#04X}", byte),
            None => "DB".to_string(),
        },
    }
}

/// Disassemble a whole image.
pub fn disassemble(image: &[u8]) -> String {
    let mut output = String::new();
    output.push_str("; LS-8 Disassembly\n");
    output.push_str("; ----------------\n\n");

    for (addr, size) in instruction_spans(image) {
        let line = disassemble_instruction(&image[addr..]);
        let raw: Vec<String> = image[addr..addr + size]
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect();
        output.push_str(&format!("{:02X}: {:<12}; {}\n", addr, line, raw.join(" ")));
    }

    output
}

/// Walk an image by instruction size, yielding `(address, size)` pairs.
///
/// Bytes that do not decode are consumed one at a time.
pub fn instruction_spans(image: &[u8]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut addr = 0;

    while addr < image.len() {
        let size = match decode(&image[addr..]) {
            Ok(instr) => instr.size(),
            Err(_) => 1,
        };
        spans.push((addr, size));
        addr += size;
    }

    spans
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    let name = instr.opcode.mnemonic();
    let (a, b) = (instr.operand_a, instr.operand_b);

    match instr.opcode {
        Opcode::Hlt => name.to_string(),
        Opcode::Ldi => format!("{} R{}, {}", name, a, b),
        _ => match instr.opcode.operand_count() {
            1 => format!("{} R{}", name, a),
            _ => format!("{} R{}, R{}", name, a, b),
        },
    }
}
