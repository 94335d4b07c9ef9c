//! Execution traces: nestest-style instruction logs, per-cycle bus lines and
//! JSON lines.

use std::io::{self, Write};

use emu_core::BusCycle;
use mos_6502::Registers;
use mos_6502_asm::decode;
use serde::Serialize;

use crate::{Machine, TraceFormat};

/// Receives each step of a run.
pub trait Tracer {
    /// Called at an instruction boundary, before the step runs.
    fn before_step(&mut self, _machine: &Machine) {}

    /// Called with the cycles of a completed step.
    fn after_step(&mut self, _machine: &Machine, _cycles: &[BusCycle]) {}
}

impl Tracer for () {}

/// One nestest log line for the instruction at PC:
///
/// `C000  4C F5 C5  JMP $C5F5                       A:00 X:00 Y:00 P:24 SP:FD`
#[must_use]
pub fn log_line(machine: &Machine) -> String {
    let regs = machine.cpu.regs;
    let pc = regs.pc;
    let window = [
        machine.ram.peek(pc),
        machine.ram.peek(pc.wrapping_add(1)),
        machine.ram.peek(pc.wrapping_add(2)),
    ];
    let (bytes, text) = match decode(&window, pc) {
        Ok(decoded) => {
            let text = decoded.to_string();
            (decoded.bytes, text)
        }
        Err(_) => (vec![window[0]], "???".to_string()),
    };
    let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02X}")).collect();
    format!(
        "{pc:04X}  {:<8}  {text:<32}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
        hex.join(" "),
        regs.a,
        regs.x,
        regs.y,
        regs.p.bits(),
        regs.s
    )
}

/// One bus cycle: address, data, direction and SYNC.
#[must_use]
pub fn cycle_line(cycle: &BusCycle) -> String {
    let direction = if cycle.is_write() { 'W' } else { 'R' };
    let sync = if cycle.sync { " SYNC" } else { "" };
    format!("{:04X} {:02X} {direction}{sync}", cycle.address, cycle.data)
}

/// JSON form of one step.
#[derive(Debug, Serialize)]
pub struct StepRecord<'a> {
    /// Registers after the step.
    pub registers: Registers,
    pub cycles: &'a [BusCycle],
}

/// Writes a trace in one of the [`TraceFormat`]s.
///
/// The first write error stops further output and is returned by
/// [`StreamTracer::finish`].
pub struct StreamTracer<W: Write> {
    format: TraceFormat,
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> StreamTracer<W> {
    pub fn new(format: TraceFormat, out: W) -> Self {
        Self {
            format,
            out,
            error: None,
        }
    }

    /// Flush and report the first write error, if any.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn emit(&mut self, line: impl FnOnce() -> io::Result<String>) {
        if self.error.is_some() {
            return;
        }
        let result = line().and_then(|text| writeln!(self.out, "{text}"));
        if let Err(err) = result {
            self.error = Some(err);
        }
    }
}

impl<W: Write> Tracer for StreamTracer<W> {
    fn before_step(&mut self, machine: &Machine) {
        if self.format == TraceFormat::Log && machine.cpu.is_instruction_complete() {
            self.emit(|| Ok(log_line(machine)));
        }
    }

    fn after_step(&mut self, machine: &Machine, cycles: &[BusCycle]) {
        match self.format {
            TraceFormat::Cycles => {
                for cycle in cycles {
                    self.emit(|| Ok(cycle_line(cycle)));
                }
            }
            TraceFormat::Json => {
                let record = StepRecord {
                    registers: machine.cpu.regs,
                    cycles,
                };
                self.emit(|| serde_json::to_string(&record).map_err(io::Error::other));
            }
            TraceFormat::None | TraceFormat::Log => {}
        }
    }
}
