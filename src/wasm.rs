//! WebAssembly bindings for the LS-8 emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use wasm_bindgen::prelude::*;
use crate::Cpu;
use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_instruction;
use crate::asm::program::parse_program;
use crate::cpu::decode::encode;
use crate::cpu::memory::MEMORY_SIZE;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu,
    program: Vec<u8>,
    output: Vec<u8>,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a new CPU instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            program: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Load a program in the binary-literal `.ls8` text format.
    #[wasm_bindgen]
    pub fn load_program(&mut self, text: &str) -> Result<usize, JsError> {
        let image = parse_program(text)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.install(image)
    }

    /// Load a program from assembly source code.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let image = assemble(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        self.install(image)
    }

    /// Step one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        let instr = self.cpu.step(&mut self.output)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        Ok(disassemble_instruction(&encode(&instr)))
    }

    /// Run until halt or max cycles. Returns the total cycle count.
    #[wasm_bindgen]
    pub fn run(&mut self, max_cycles: u32) -> Result<u64, JsError> {
        self.cpu.run_limited(&mut self.output, u64::from(max_cycles))
            .map_err(|e| JsError::new(&format!("{}", e)))?;
        Ok(self.cpu.cycles)
    }

    /// Reset CPU to initial state with loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.output.clear();
        // The image was validated when it was installed.
        let _ = self.cpu.load_program(&self.program);
    }

    /// Check if CPU is running.
    #[wasm_bindgen]
    pub fn is_running(&self) -> bool {
        self.cpu.is_running()
    }

    /// Check if CPU is halted.
    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> usize {
        self.cpu.pc()
    }

    /// Get register `index` (0-7); out-of-range indices read as 0.
    #[wasm_bindgen]
    pub fn register(&self, index: usize) -> u8 {
        self.cpu.regs.get(index).unwrap_or(0)
    }

    /// Get all eight registers.
    #[wasm_bindgen]
    pub fn registers(&self) -> Vec<u8> {
        self.cpu.regs.all().to_vec()
    }

    /// Get state as string.
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        format!("{:?}", self.cpu.state)
    }

    /// Get memory cell at `addr` (0-255); out-of-range addresses read as 0.
    #[wasm_bindgen]
    pub fn memory_at(&self, addr: usize) -> u8 {
        self.cpu.mem.peek(addr).unwrap_or(0)
    }

    /// Get all memory.
    #[wasm_bindgen]
    pub fn memory_all(&self) -> Vec<u8> {
        self.cpu.mem.as_slice().to_vec()
    }

    /// Values printed so far.
    #[wasm_bindgen]
    pub fn output(&self) -> Vec<u8> {
        self.output.clone()
    }

    /// Current trace line.
    #[wasm_bindgen]
    pub fn trace(&self) -> String {
        self.cpu.trace_line()
    }

    /// Full machine state as a JSON string.
    #[wasm_bindgen]
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl WasmCpu {
    fn install(&mut self, image: Vec<u8>) -> Result<usize, JsError> {
        if image.len() > MEMORY_SIZE {
            return Err(JsError::new(&format!(
                "program is {} bytes, memory holds {}", image.len(), MEMORY_SIZE
            )));
        }

        let len = image.len();
        self.program = image;
        self.reset();
        Ok(len)
    }
}

impl Default for WasmCpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the image size in bytes.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<usize, JsError> {
    let image = assemble(source)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(image.len())
}

/// Disassemble one instruction from up to three bytes.
#[wasm_bindgen]
pub fn wasm_disassemble(bytes: &[u8]) -> String {
    disassemble_instruction(bytes)
}
