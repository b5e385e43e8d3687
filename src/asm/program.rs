//! LS-8 program image files.
//!
//! A program file is plain text with one byte per line, written as a
//! base-2 literal:
//! - Only the first whitespace-separated word of a line is considered
//! - It is a byte when it starts with `0` or `1`; anything after it is a comment
//! - Every other line (blank, `#` comment, prose) is skipped

use crate::asm::disasm::{disassemble_instruction, instruction_spans};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// Parse program text into a memory image.
pub fn parse_program(source: &str) -> Result<Vec<u8>, ProgramError> {
    read_program(source.as_bytes())
}

/// Load a program file from disk.
pub fn load_program_file<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ProgramError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| ProgramError::IoError(e.to_string()))?;
    read_program(BufReader::new(file))
}

fn read_program<R: BufRead>(reader: R) -> Result<Vec<u8>, ProgramError> {
    let mut image = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| ProgramError::IoError(e.to_string()))?;

        let Some(word) = line.split_whitespace().next() else {
            continue;
        };
        if !word.starts_with(['0', '1']) {
            continue;
        }

        image.push(parse_byte(word).map_err(|message| ProgramError::ParseError {
            line: line_num + 1,
            message,
        })?);
    }

    Ok(image)
}

fn parse_byte(word: &str) -> Result<u8, String> {
    if let Some(bad) = word.chars().find(|c| !matches!(c, '0' | '1')) {
        return Err(format!("invalid binary digit {:?} in {:?}", bad, word));
    }
    u8::from_str_radix(word, 2)
        .map_err(|_| format!("{:?} does not fit in 8 bits", word))
}

/// Save an image to disk, one binary literal per line.
///
/// Each instruction is annotated with its disassembly.
pub fn save_program<P: AsRef<Path>>(path: P, image: &[u8]) -> Result<(), ProgramError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| ProgramError::IoError(e.to_string()))?;
    file.write_all(format_program(image).as_bytes())
        .map_err(|e| ProgramError::IoError(e.to_string()))
}

/// Render an image in the program file format.
pub fn format_program(image: &[u8]) -> String {
    let mut text = String::new();
    text.push_str("# LS-8 program image\n");
    text.push_str(&format!("# {} bytes\n\n", image.len()));

    for (addr, size) in instruction_spans(image) {
        let comment = disassemble_instruction(&image[addr..]);
        for (i, byte) in image[addr..addr + size].iter().enumerate() {
            if i == 0 {
                text.push_str(&format!("{:08b} # {:02X}: {}\n", byte, addr, comment));
            } else {
                text.push_str(&format!("{:08b}\n", byte));
            }
        }
    }

    text
}

/// Errors that can occur while reading or writing program files.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRINT8: &str = "\
# print8.ls8: Print the number 8 on the screen

10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
";

    #[test]
    fn test_parse_program() {
        let image = parse_program(PRINT8).unwrap();
        assert_eq!(image, vec![0x82, 0x00, 0x08, 0x47, 0x00, 0x01]);
    }

    #[test]
    fn test_skips_non_binary_lines() {
        let image = parse_program("   \nhello world\n  101 trailing text\n#1111\n").unwrap();
        assert_eq!(image, vec![0b101]);
    }

    #[test]
    fn test_rejects_bad_literals() {
        assert_eq!(
            parse_program("10000010\n0102\n"),
            Err(ProgramError::ParseError {
                line: 2,
                message: "invalid binary digit '2' in \"0102\"".into(),
            })
        );
        assert!(matches!(
            parse_program("111111111\n"),
            Err(ProgramError::ParseError { line: 1, .. })
        ));
    }

    #[test]
    fn test_format_roundtrip() {
        let image = vec![0x82, 0x00, 0x08, 0x47, 0x00, 0x01, 0xFF];
        let text = format_program(&image);

        assert!(text.contains("10000010 # 00: LDI R0, 8"));
        assert!(text.contains("00000001 # 05: HLT"));
        assert_eq!(parse_program(&text).unwrap(), image);
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("ls8-program-{}.ls8", std::process::id()));
        let image = vec![0x82, 0x01, 0x02, 0x01];

        save_program(&path, &image).unwrap();
        let loaded = load_program_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, image);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_program_file("/nonexistent/ls8/program.ls8"),
            Err(ProgramError::IoError(_))
        ));
    }
}
