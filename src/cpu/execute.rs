//! CPU execution engine for the LS-8.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.

use crate::cpu::{Memory, Registers, Output};
use crate::cpu::alu::{self, AluError, AluOp};
use crate::cpu::decode::{Instruction, Opcode, DecodeError};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::{RegisterError, SP};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// CPU execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// CPU is running normally.
    Running,
    /// CPU has halted (executed HLT, or stopped by the host).
    Halted,
    /// CPU stopped on a fatal error.
    Faulted,
}

/// The LS-8 CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers, including the program counter.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instruction count.
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new CPU with power-on state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset the CPU to initial state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Load a program image into memory at address 0.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), MemoryError> {
        self.mem.load(program)
    }

    /// Execute a single instruction.
    ///
    /// Returns the instruction that was executed, or an error. Any error
    /// leaves the CPU in `Faulted`.
    pub fn step(&mut self, out: &mut dyn Output) -> Result<Instruction, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        match self.cycle(out) {
            Ok(instr) => {
                self.cycles += 1;
                self.last_instr = Some(instr);
                Ok(instr)
            }
            Err(e) => {
                self.state = CpuState::Faulted;
                Err(e)
            }
        }
    }

    /// Run until halt or error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self, out: &mut dyn Output) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step(out)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, out: &mut dyn Output, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles.saturating_add(max_cycles);

        while self.state == CpuState::Running && self.cycles < limit {
            self.step(out)?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Stop the CPU between cycles.
    pub fn halt(&mut self) {
        if self.state == CpuState::Running {
            self.state = CpuState::Halted;
        }
    }

    /// One fetch-decode-execute cycle.
    fn cycle(&mut self, out: &mut dyn Output) -> Result<Instruction, CpuError> {
        let instr = self.fetch(self.regs.pc)?;

        self.execute(instr, out)?;

        if !instr.opcode.sets_pc() {
            self.regs.advance_pc(instr.size());
        }

        Ok(instr)
    }

    /// Fetch and decode the instruction at `pc`.
    ///
    /// Only the operand bytes the opcode declares are read.
    fn fetch(&self, pc: usize) -> Result<Instruction, CpuError> {
        let opcode = Opcode::try_from(self.mem.read(pc)?)?;
        let count = opcode.operand_count();

        let operand_a = if count >= 1 { self.mem.read(pc.saturating_add(1))? } else { 0 };
        let operand_b = if count >= 2 { self.mem.read(pc.saturating_add(2))? } else { 0 };

        Ok(Instruction::new(opcode, operand_a, operand_b))
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction, out: &mut dyn Output) -> Result<(), CpuError> {
        let Instruction { opcode, operand_a: a, operand_b: b } = instr;

        match opcode {
            Opcode::Hlt => self.op_hlt(a, b),
            Opcode::Ldi => self.op_ldi(a, b)?,
            Opcode::Prn => out.emit(self.op_prn(a, b)?),
            Opcode::Push => self.op_push(a, b)?,
            Opcode::Pop => self.op_pop(a, b)?,
            Opcode::Jmp => self.op_jmp(a, b)?,
            Opcode::Inc | Opcode::Dec | Opcode::Add | Opcode::Sub | Opcode::Mul
            | Opcode::Div | Opcode::Mod | Opcode::And | Opcode::Or | Opcode::Xor
            | Opcode::Shl | Opcode::Shr => {
                let op = opcode
                    .alu_op()
                    .ok_or(DecodeError::UnsupportedOpcode(opcode.byte()))?;
                self.op_alu(op, a, b)?;
            }
        }

        Ok(())
    }

    // ==================== Handlers ====================

    fn op_hlt(&mut self, _a: u8, _b: u8) {
        self.state = CpuState::Halted;
    }

    fn op_ldi(&mut self, a: u8, b: u8) -> Result<(), CpuError> {
        self.regs.set(a.into(), b)?;
        Ok(())
    }

    fn op_prn(&mut self, a: u8, _b: u8) -> Result<u8, CpuError> {
        Ok(self.regs.get(a.into())?)
    }

    fn op_push(&mut self, a: u8, _b: u8) -> Result<(), CpuError> {
        let sp = alu::evaluate(AluOp::Dec, self.regs.sp(), 0)?;
        self.regs.set(SP, sp)?;

        let value = self.regs.get(a.into())?;
        self.mem.write(sp.into(), value)?;
        Ok(())
    }

    fn op_pop(&mut self, a: u8, _b: u8) -> Result<(), CpuError> {
        let value = self.mem.read(self.regs.sp().into())?;
        self.regs.set(a.into(), value)?;

        let sp = alu::evaluate(AluOp::Inc, self.regs.sp(), 0)?;
        self.regs.set(SP, sp)?;
        Ok(())
    }

    fn op_jmp(&mut self, a: u8, _b: u8) -> Result<(), CpuError> {
        let target = self.regs.get(a.into())?;
        self.regs.jump(target.into());
        Ok(())
    }

    fn op_alu(&mut self, op: AluOp, a: u8, b: u8) -> Result<(), CpuError> {
        let lhs = self.regs.get(a.into())?;
        // INC/DEC carry no second operand; their `b` is the absent-operand 0.
        let rhs = match op {
            AluOp::Inc | AluOp::Dec => 0,
            _ => self.regs.get(b.into())?,
        };

        let result = alu::evaluate(op, lhs, rhs)?;
        self.regs.set(a.into(), result)?;
        Ok(())
    }

    // ==================== Inspection ====================

    /// Current program counter.
    pub fn pc(&self) -> usize {
        self.regs.pc
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the CPU is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }

    /// Render the machine state as a single trace line:
    /// `TRACE: PC | M[PC] M[PC+1] M[PC+2] | R0 .. R7`.
    pub fn trace_line(&self) -> String {
        let pc = self.regs.pc;
        let cell = |addr: usize| self.mem.peek(addr).unwrap_or(0);

        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            pc,
            cell(pc),
            cell(pc.saturating_add(1)),
            cell(pc.saturating_add(2))
        );
        for value in self.regs.all() {
            line.push_str(&format!(" {:02X}", value));
        }
        line
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur during CPU execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("register error: {0}")]
    Register(#[from] RegisterError),

    #[error("ALU error: {0}")]
    Alu(#[from] AluError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}
