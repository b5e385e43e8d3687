//! LS-8 Emulator - CLI Entry Point
//!
//! Commands:
//! - `ls8-emu run <program>` - Run an `.ls8` image or `.asm` source
//! - `ls8-emu debug <program>` - Interactive debugger
//! - `ls8-emu asm <source>` - Assemble to an `.ls8` image
//! - `ls8-emu disasm <program>` - Disassemble an `.ls8` image

use clap::{Parser, Subcommand};
use std::process::exit;

#[derive(Parser)]
#[command(name = "ls8-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator for the LS-8 8-bit register machine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the .ls8 or .asm file to execute
        program: String,
        /// Maximum number of cycles to run (default: 100000)
        #[arg(short, long, default_value = "100000")]
        max_cycles: u64,
        /// Print a trace line before every cycle (to stderr)
        #[arg(short, long)]
        trace: bool,
        /// Print the final machine state as JSON
        #[arg(short, long)]
        dump_state: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the .ls8 or .asm file to debug
        program: String,
    },
    /// Assemble source to an .ls8 image
    Asm {
        /// Path to the source file
        source: String,
        /// Output .ls8 file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Disassemble an .ls8 image to readable text
    Disasm {
        /// Path to the .ls8 file
        program: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { program, max_cycles, trace, dump_state } => {
            run_program(&program, max_cycles, trace, dump_state);
        }
        Commands::Debug { program } => {
            debug_program(&program);
        }
        Commands::Asm { source, output } => {
            assemble_file(&source, output);
        }
        Commands::Disasm { program } => {
            disassemble_file(&program);
        }
    }
}

/// Load an image from an `.asm` source or a binary-literal `.ls8` file.
fn load_image(path: &str) -> Vec<u8> {
    let image = if path.ends_with(".asm") {
        let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("❌ Failed to read file: {}", e);
            exit(1)
        });
        ls8::assemble(&source).unwrap_or_else(|e| {
            eprintln!("❌ Assembly error: {}", e);
            exit(1)
        })
    } else {
        ls8::load_program_file(path).unwrap_or_else(|e| {
            eprintln!("❌ Failed to load program: {}", e);
            exit(1)
        })
    };

    if image.is_empty() {
        eprintln!("❌ No instructions to execute");
        exit(1);
    }

    image
}

fn run_program(path: &str, max_cycles: u64, trace: bool, dump_state: bool) {
    use ls8::{Cpu, LineOutput};
    use ls8::asm::disasm::disassemble_instruction;
    use ls8::cpu::decode::encode;

    let image = load_image(path);

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(&image) {
        eprintln!("❌ Failed to load program: {}", e);
        exit(1);
    }

    let stdout = std::io::stdout();
    let mut out = LineOutput::new(stdout.lock());

    while cpu.is_running() && cpu.cycles < max_cycles {
        let pc = cpu.pc();
        if trace {
            eprintln!("{}", cpu.trace_line());
        }

        match cpu.step(&mut out) {
            Ok(instr) => {
                if trace {
                    eprintln!("       {:02X}: {}", pc, disassemble_instruction(&encode(&instr)));
                }
            }
            Err(e) => {
                eprintln!("❌ CPU error at PC={:02X}: {}", pc, e);
                exit(1);
            }
        }
    }

    if let Some(e) = out.take_error() {
        eprintln!("❌ Failed to write output: {}", e);
        exit(1);
    }

    if cpu.is_running() {
        eprintln!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }

    if dump_state {
        match serde_json::to_string_pretty(&cpu) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("❌ Failed to serialize state: {}", e);
                exit(1);
            }
        }
    }
}

#[cfg(feature = "tui")]
fn debug_program(path: &str) {
    use ls8::run_debugger;

    let image = load_image(path);
    println!("🚀 Launching debugger...");

    if let Err(e) = run_debugger(image) {
        eprintln!("❌ Debugger error: {}", e);
        exit(1);
    }
}

#[cfg(not(feature = "tui"))]
fn debug_program(_path: &str) {
    eprintln!("❌ This build has no debugger; rebuild with --features tui");
    exit(1);
}

fn assemble_file(source_path: &str, output: Option<String>) {
    let out_path = output.unwrap_or_else(|| source_path.replace(".asm", ".ls8"));
    if out_path == source_path {
        eprintln!("❌ Refusing to overwrite the source; pass --output");
        exit(1);
    }

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let source = std::fs::read_to_string(source_path).unwrap_or_else(|e| {
        eprintln!("❌ Failed to read file: {}", e);
        exit(1)
    });

    let image = ls8::assemble(&source).unwrap_or_else(|e| {
        eprintln!("❌ Assembly error: {}", e);
        exit(1)
    });

    println!("✓ Assembled {} bytes", image.len());

    if let Err(e) = ls8::save_program(&out_path, &image) {
        eprintln!("❌ Failed to save program: {}", e);
        exit(1);
    }

    println!("✓ Saved to {}", out_path);
}

fn disassemble_file(path: &str) {
    let image = ls8::load_program_file(path).unwrap_or_else(|e| {
        eprintln!("❌ Failed to load program: {}", e);
        exit(1)
    });

    println!("{}", ls8::disassemble(&image));
}
