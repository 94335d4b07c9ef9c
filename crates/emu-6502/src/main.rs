//! Bare 6502 runner.
//!
//! Loads a raw binary image into 64 KiB of RAM, resets the core and runs it
//! for a bounded number of instructions or cycles, optionally tracing.

use std::io::{self, BufWriter};
use std::process;

use emu_6502::trace::StreamTracer;
use emu_6502::{ConfigError, Machine, MachineConfig};

fn print_usage() {
    eprintln!("Usage: emu-6502 --image <file> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --image <file>          Raw binary to load");
    eprintln!("  --load <addr>           Load address (default $0000)");
    eprintln!("  --reset <addr>          Write the reset vector at $FFFC");
    eprintln!("  --instructions <n>      Stop after n instructions (default 100000)");
    eprintln!("  --cycles <n>            Stop after n cycles");
    eprintln!("  --trace <format>        none, log, cycles or json (default none)");
    eprintln!("  --decimal <mode>        nmos or off (default off)");
    eprintln!();
    eprintln!("Addresses and counts accept $hex, 0xhex or decimal.");
}

fn main() {
    let config = match MachineConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(ConfigError::Help) => {
            print_usage();
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            process::exit(1);
        }
    };

    let image = match config.load_image() {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Failed to read image: {e}");
            process::exit(1);
        }
    };
    eprintln!(
        "Loaded {} bytes at ${:04X} from {}",
        image.len(),
        config.load_address,
        config.image.display()
    );

    let mut machine = Machine::from_config(&config, &image);
    let mut tracer = StreamTracer::new(config.trace, BufWriter::new(io::stdout().lock()));
    let summary = machine.run_traced(config.limit, &mut tracer);
    if let Err(e) = tracer.finish() {
        eprintln!("Trace output error: {e}");
        process::exit(1);
    }

    let regs = machine.cpu.regs;
    eprintln!(
        "{} instructions, {} cycles; PC:{:04X} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
        summary.instructions,
        summary.cycles,
        regs.pc,
        regs.a,
        regs.x,
        regs.y,
        regs.p.bits(),
        regs.s
    );
    if let Some(fault) = summary.fault {
        eprintln!("Halted: {fault}");
        process::exit(1);
    }
}
