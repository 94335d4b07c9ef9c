//! The core on flat RAM, plus run control.

use emu_core::{BusCycle, Cpu, SimpleBus};
use mos_6502::{Fault, Mos6502, Mos6502Config, RESET_VECTOR};

use crate::trace::Tracer;
use crate::{MachineConfig, RunLimit};

/// Longest boundary-to-boundary sequence (interrupt entry) is seven cycles.
const MAX_STEP_CYCLES: usize = 8;

/// CPU and memory.
#[derive(Debug)]
pub struct Machine {
    pub cpu: Mos6502,
    pub ram: SimpleBus,
}

/// What a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Completed boundary-to-boundary steps (instructions and interrupt entries).
    pub instructions: u64,
    pub cycles: u64,
    /// Set when the run ended on a halt.
    pub fault: Option<Fault>,
}

impl Machine {
    /// Power-on machine with zeroed RAM; the first cycles run the reset sequence.
    #[must_use]
    pub fn new(config: Mos6502Config) -> Self {
        Self {
            cpu: Mos6502::with_config(config),
            ram: SimpleBus::new(),
        }
    }

    /// Machine with `image` loaded as `config` describes.
    #[must_use]
    pub fn from_config(config: &MachineConfig, image: &[u8]) -> Self {
        let mut machine = Self::new(Mos6502Config {
            decimal: config.decimal,
        });
        machine.ram.load(config.load_address, image);
        if let Some(vector) = config.reset_vector {
            machine.ram.poke_word(RESET_VECTOR, vector);
        }
        machine
    }

    /// One clock cycle.
    pub fn tick(&mut self) -> BusCycle {
        self.cpu.tick(&mut self.ram)
    }

    /// Run to the next instruction boundary.
    ///
    /// Returns the cycles of the step, or the fault if the core halted.
    pub fn step_instruction(&mut self) -> Result<Vec<BusCycle>, Fault> {
        let mut cycles = Vec::with_capacity(MAX_STEP_CYCLES);
        loop {
            cycles.push(self.tick());
            if let Some(fault) = self.cpu.fault() {
                return Err(fault);
            }
            if self.cpu.is_instruction_complete() || cycles.len() >= MAX_STEP_CYCLES {
                return Ok(cycles);
            }
        }
    }

    /// Run until `limit` or a halt.
    pub fn run(&mut self, limit: RunLimit) -> RunSummary {
        self.run_traced(limit, &mut ())
    }

    /// Run until `limit` or a halt, reporting each step to `tracer`.
    pub fn run_traced<T: Tracer + ?Sized>(&mut self, limit: RunLimit, tracer: &mut T) -> RunSummary {
        let start = self.cpu.total_cycles();
        let mut summary = RunSummary::default();
        while !limit.reached(summary.instructions, summary.cycles) {
            tracer.before_step(self);
            let step = self.step_instruction();
            summary.cycles = self.cpu.total_cycles() - start;
            match step {
                Ok(cycles) => {
                    summary.instructions += 1;
                    tracer.after_step(self, &cycles);
                }
                Err(fault) => {
                    summary.fault = Some(fault);
                    break;
                }
            }
        }
        summary
    }

    /// Restart through the reset vector, keeping RAM.
    pub fn reset(&mut self) {
        self.cpu.reset();
    }
}
