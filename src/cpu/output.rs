//! Output sinks for the PRN instruction.

use std::io::Write;

/// Receives every value printed by the program.
pub trait Output {
    fn emit(&mut self, value: u8);
}

/// Collects printed values in order.
impl Output for Vec<u8> {
    fn emit(&mut self, value: u8) {
        self.push(value);
    }
}

/// Writes each printed value as a decimal line.
pub struct LineOutput<W: Write> {
    writer: W,
    error: Option<std::io::Error>,
}

impl<W: Write> LineOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, error: None }
    }

    /// Take the first write error, if any occurred.
    ///
    /// Once a write fails, later values are dropped.
    pub fn take_error(&mut self) -> Option<std::io::Error> {
        self.error.take()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Output for LineOutput<W> {
    fn emit(&mut self, value: u8) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.writer, "{}", value) {
            self.error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_output() {
        let mut out: Vec<u8> = Vec::new();
        out.emit(1);
        out.emit(255);
        assert_eq!(out, vec![1, 255]);
    }

    #[test]
    fn test_line_output() {
        let mut out = LineOutput::new(Vec::<u8>::new());
        out.emit(17);
        out.emit(0);

        assert!(out.take_error().is_none());
        assert_eq!(String::from_utf8(out.into_inner()).unwrap(), "17\n0\n");
    }
}
