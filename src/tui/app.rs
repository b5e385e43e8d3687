//! Debugger application state and logic.

use crate::Cpu;
use crate::asm::disasm::{disassemble_instruction, instruction_spans};
use crate::cpu::decode::encode;
use crate::cpu::memory::{MemoryError, MEMORY_SIZE};
use std::collections::HashSet;

/// Bytes shown per row in the memory view.
pub const MEMORY_ROW: usize = 8;

/// Debugger application state.
pub struct DebuggerApp {
    /// The CPU being debugged.
    pub cpu: Cpu,
    /// Original program for reference.
    pub program: Vec<u8>,
    /// Values printed by the program so far.
    pub output: Vec<u8>,
    /// Breakpoints (by address).
    pub breakpoints: HashSet<usize>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset, in rows.
    pub mem_scroll: usize,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<u8>) -> Self {
        let mut app = Self {
            cpu: Cpu::new(),
            program,
            output: Vec::new(),
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: String::new(),
            mem_scroll: 0,
        };
        app.status = match app.reload() {
            Ok(()) => "Ready. Press 's' to step, 'r' to run, 'q' to quit.".into(),
            Err(e) => format!("Load error: {}", e),
        };
        app
    }

    /// Step one instruction.
    pub fn step(&mut self) {
        if !self.cpu.is_running() {
            self.status = format!("CPU stopped: {:?}", self.cpu.state);
            self.running = false;
            return;
        }

        let pc = self.cpu.pc();
        match self.cpu.step(&mut self.output) {
            Ok(instr) => {
                let disasm = disassemble_instruction(&encode(&instr));
                self.status = format!("PC={:02X}: {}", pc, disasm);
            }
            Err(e) => {
                self.status = format!("Error at PC={:02X}: {}", pc, e);
                self.running = false;
            }
        }
    }

    /// Run until halt, breakpoint, or error.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();

        // Move off the breakpoint we are sitting on.
        if self.breakpoints.contains(&self.cpu.pc()) {
            self.step();
        }
    }

    /// Run one iteration of continuous execution.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        if !self.cpu.is_running() {
            self.running = false;
            self.status = format!("{:?} after {} cycles", self.cpu.state, self.cpu.cycles);
            return;
        }

        // Check for breakpoint
        let pc = self.cpu.pc();
        if self.breakpoints.contains(&pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={:02X}", pc);
            return;
        }

        self.step();
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.pc();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:02X}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:02X}", pc);
        }
    }

    /// Reset CPU to initial state.
    pub fn reset(&mut self) {
        self.status = match self.reload() {
            Ok(()) => "Reset. Ready.".into(),
            Err(e) => format!("Load error: {}", e),
        };
    }

    /// Fresh CPU with the program loaded, output cleared.
    fn reload(&mut self) -> Result<(), MemoryError> {
        self.cpu = Cpu::new();
        self.output.clear();
        self.running = false;
        self.cpu.load_program(&self.program)
    }

    /// Scroll the memory view by `delta` rows.
    pub fn scroll_memory(&mut self, delta: isize) {
        let max = MEMORY_SIZE / MEMORY_ROW - 1;
        self.mem_scroll = self.mem_scroll.saturating_add_signed(delta).min(max);
    }

    /// Get disassembly around current PC: `(address, text, is_current)`.
    ///
    /// Lines follow instruction boundaries from address 0, so operand
    /// bytes are never shown as opcodes.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(usize, String, bool)> {
        let memory = self.cpu.mem.as_slice();
        let pc = self.cpu.pc();
        let spans = instruction_spans(memory);

        let current = spans
            .iter()
            .position(|&(addr, _)| addr >= pc)
            .unwrap_or(spans.len());
        let start = current.saturating_sub(lines / 2);

        spans[start..]
            .iter()
            .take(lines)
            .map(|&(addr, _)| (addr, disassemble_instruction(&memory[addr..]), addr == pc))
            .collect()
    }
}

/// Run the debugger with a program.
pub fn run_debugger(program: Vec<u8>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program);

    // Main loop
    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => app.scroll_memory(-1),
                        KeyCode::Down => app.scroll_memory(1),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
