//! TUI debugger for the LS-8 emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and program counter view
//! - Memory hex view highlighting PC and SP
//! - Step/run/breakpoint controls
//! - Disassembly and program output views

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
