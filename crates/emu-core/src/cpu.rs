//! CPU core trait.

use crate::{Bus, BusCycle};

/// A CPU core.
///
/// CPUs execute instructions and access memory through a bus. The bus is
/// passed into every tick rather than owned, so the host keeps exclusive
/// ownership of memory and the CPU never holds a reference into it.
///
/// CPUs expose their internal state for observation and debugging.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Advance the CPU by one clock cycle (both phases).
    ///
    /// Exactly one bus transaction is performed. The returned snapshot
    /// describes the pins for that cycle.
    fn tick<B: Bus>(&mut self, bus: &mut B) -> BusCycle;

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted and only a reset can resume it.
    fn is_halted(&self) -> bool;

    /// Drive the active-low IRQ input. `true` is the inactive (high) level.
    fn set_irq_line(&mut self, level: bool);

    /// Drive the active-low NMI input. `true` is the inactive (high) level.
    fn set_nmi_line(&mut self, level: bool);

    /// Begin the reset sequence.
    fn reset(&mut self);
}
