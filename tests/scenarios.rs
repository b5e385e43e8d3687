//! End-to-end programs run through the public API.

use ls8::cpu::decode::DecodeError;
use ls8::{assemble, parse_program, Cpu, CpuError, CpuState, LineOutput};

fn load(image: &[u8]) -> Cpu {
    let mut cpu = Cpu::new();
    cpu.load_program(image).unwrap();
    cpu
}

#[test]
fn add_and_print() {
    // LDI R0,8; LDI R1,9; ADD R0,R1; PRN R0; HLT
    let image = [0x82, 0, 8, 0x82, 1, 9, 0xA0, 0, 1, 0x47, 0, 0x01];
    let mut cpu = load(&image);
    let mut out: Vec<u8> = Vec::new();

    let executed = cpu.run(&mut out).unwrap();

    assert_eq!(executed, 5);
    assert_eq!(out, vec![17]);
    assert_eq!(cpu.state, CpuState::Halted);
    assert_eq!(cpu.regs.get(0), Ok(17));
    assert_eq!(cpu.regs.get(1), Ok(9));
}

#[test]
fn stack_is_last_in_first_out() {
    let source = "
        LDI R0, 1
        LDI R1, 2
        LDI R2, 3
        PUSH R0
        PUSH R1
        PUSH R2
        POP R3
        POP R4
        POP R5
        PRN R3
        PRN R4
        PRN R5
        HLT
    ";
    let mut cpu = load(&assemble(source).unwrap());
    let mut out: Vec<u8> = Vec::new();

    cpu.run(&mut out).unwrap();

    assert_eq!(out, vec![3, 2, 1]);
    assert_eq!(cpu.regs.sp(), 0xF4);
    assert_eq!(cpu.mem.read(0xF3), Ok(1));
    assert_eq!(cpu.mem.read(0xF2), Ok(2));
    assert_eq!(cpu.mem.read(0xF1), Ok(3));
}

#[test]
fn unsupported_opcode_faults_without_output() {
    let mut cpu = load(&[0xFF]);
    let mut out: Vec<u8> = Vec::new();

    let err = cpu.run(&mut out).unwrap_err();

    assert_eq!(err, CpuError::Decode(DecodeError::UnsupportedOpcode(0xFF)));
    assert_eq!(cpu.state, CpuState::Faulted);
    assert!(out.is_empty());
    assert_eq!(cpu.step(&mut out), Err(CpuError::NotRunning(CpuState::Faulted)));
}

#[test]
fn program_text_runs() {
    let text = "\
# print8
10000010 # LDI R0,8
00000000
00001000
01000111 # PRN R0
00000000
00000001 # HLT
";
    let mut cpu = load(&parse_program(text).unwrap());
    let mut sink = LineOutput::new(Vec::<u8>::new());

    cpu.run(&mut sink).unwrap();

    assert!(sink.take_error().is_none());
    assert_eq!(sink.into_inner(), b"8\n".to_vec());
}

#[test]
fn countdown_loop_with_labels() {
    let source = "
            LDI R0, 3
            LDI R1, LOOP
            LDI R2, 0
        LOOP:
            PRN R0
            DEC R0
            JMP R1
    ";
    let mut cpu = load(&assemble(source).unwrap());
    let mut out: Vec<u8> = Vec::new();

    // Never halts; bounded by the cycle limit.
    let executed = cpu.run_limited(&mut out, 3 + 3 * 4).unwrap();

    assert_eq!(executed, 15);
    assert!(cpu.is_running());
    assert_eq!(out, vec![3, 2, 1, 0]);
    assert_eq!(cpu.regs.get(0), Ok(0xFF));
}

#[test]
fn running_past_memory_faults() {
    // LDI R0,0xFE; JMP R0; then INC R0 in the last two cells.
    let mut image = vec![0u8; 256];
    image[0] = 0x82;
    image[1] = 0;
    image[2] = 0xFE;
    image[3] = 0x54; // JMP R0
    image[4] = 0;
    image[0xFE] = 0x65; // INC R0
    image[0xFF] = 0;
    let mut cpu = load(&image);
    let mut out: Vec<u8> = Vec::new();

    let err = cpu.run(&mut out).unwrap_err();

    assert_eq!(err, CpuError::Memory(ls8::cpu::MemoryError::InvalidAddress(256)));
    assert_eq!(cpu.regs.get(0), Ok(0xFF));
    assert_eq!(cpu.state, CpuState::Faulted);
}
