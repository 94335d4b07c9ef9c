//! A host session: load a program over the debug port, run it, read back.

use emu_6502::trace::StreamTracer;
use emu_6502::{DebugPort, Machine, MachineConfig, RunLimit, TraceFormat};
use mos_6502::Mos6502Config;
use mos_6502_asm::{Assembler, Program};

fn sum_program() -> Program {
    let mut asm = Assembler::new();
    asm.org(0x0400)
        .label("start")
        .lda().immediate(0)
        .ldx().immediate(10)
        .label("loop")
        .stx().zero_page(0x10)
        .clc()
        .adc().zero_page(0x10)
        .dex()
        .bne().relative("loop")
        .sta().absolute(0x0300_u16)
        .label("halt")
        .jmp().absolute("halt")
        .org(0xFFFC)
        .word("start");
    asm.build().expect("assembles")
}

/// Clock `bytes` in and collect what comes out.
fn exchange(port: &mut DebugPort, machine: &mut Machine, bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .filter_map(|&b| port.receive(machine, b).expect("valid command"))
        .collect()
}

fn mem_write(port: &mut DebugPort, machine: &mut Machine, address: u16, data: &[u8]) {
    let len = u16::try_from(data.len()).expect("fits");
    let mut bytes = vec![2];
    bytes.extend(address.to_be_bytes());
    bytes.extend(len.to_be_bytes());
    bytes.extend(data);
    assert!(exchange(port, machine, &bytes).is_empty());
}

fn mem_read(port: &mut DebugPort, machine: &mut Machine, address: u16, len: u16) -> Vec<u8> {
    let mut bytes = vec![3];
    bytes.extend(address.to_be_bytes());
    bytes.extend(len.to_be_bytes());
    bytes.extend(std::iter::repeat_n(0, usize::from(len)));
    exchange(port, machine, &bytes)
}

fn value_read(port: &mut DebugPort, machine: &mut Machine, id: u16) -> u16 {
    let mut bytes = vec![5];
    bytes.extend(id.to_be_bytes());
    bytes.extend([0, 0]);
    let out = exchange(port, machine, &bytes);
    u16::from_be_bytes([out[0], out[1]])
}

#[test]
fn load_run_and_inspect_over_the_port() {
    let program = sum_program();
    let mut machine = Machine::new(Mos6502Config::default());
    let mut port = DebugPort::new();

    for segment in program.segments() {
        mem_write(&mut port, &mut machine, segment.origin, &segment.bytes);
    }
    assert_eq!(mem_read(&mut port, &mut machine, 0xFFFC, 2), [0x00, 0x04]);

    let summary = machine.run(RunLimit::Instructions(1 + 2 + 10 * 5 + 2));
    assert_eq!(summary.fault, None);

    assert_eq!(mem_read(&mut port, &mut machine, 0x0300, 1), [55]);
    let halt = program.label("halt").expect("label");
    assert_eq!(value_read(&mut port, &mut machine, 0), halt);
    assert_eq!(value_read(&mut port, &mut machine, 2), 0);
    assert_eq!(value_read(&mut port, &mut machine, 7), 0);
}

#[test]
fn image_file_through_config() {
    let program = sum_program();
    let code = &program.segments()[0];

    let path = std::env::temp_dir().join(format!("emu-6502-image-{}.bin", std::process::id()));
    std::fs::write(&path, &code.bytes).expect("write temp image");

    let args = [
        "--image".to_string(),
        path.display().to_string(),
        "--load".to_string(),
        "$0400".to_string(),
        "--reset".to_string(),
        "$0400".to_string(),
        "--trace".to_string(),
        "log".to_string(),
    ];
    let config = MachineConfig::from_args(args).expect("parses");
    let image = config.load_image().expect("reads");
    std::fs::remove_file(&path).ok();

    let mut machine = Machine::from_config(&config, &image);
    let mut tracer = StreamTracer::new(TraceFormat::Log, Vec::new());
    let summary = machine.run_traced(RunLimit::Instructions(4), &mut tracer);
    assert_eq!(summary.instructions, 4);

    let log = String::from_utf8(tracer.finish().expect("trace written")).expect("utf8");
    let lines: Vec<&str> = log.lines().collect();
    // The reset step has no instruction line
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("0400  A9 00     LDA #$00"), "{}", lines[0]);
    assert!(lines[1].starts_with("0402  A2 0A     LDX #$0A"), "{}", lines[1]);
    assert!(lines[2].starts_with("0404  86 10     STX $10"), "{}", lines[2]);
}

#[test]
fn illegal_opcode_stops_the_run() {
    let mut machine = Machine::new(Mos6502Config::default());
    machine.ram.load(0x0200, &[0xE8, 0x02]);
    machine.ram.poke_word(0xFFFC, 0x0200);

    let summary = machine.run(RunLimit::Cycles(1_000));
    let fault = summary.fault.expect("halts");
    assert_eq!(fault.to_string(), "illegal opcode $02 at $0201");
    assert_eq!(machine.cpu.regs.x, 1);
}
