//! Core traits and types for cycle-accurate emulation.
//!
//! A CPU advances one clock cycle per tick and performs exactly one bus
//! transaction in that cycle. All state lives in the components; the host
//! drives the clock and owns memory.

mod bus;
mod cpu;
mod observable;

pub use bus::{Bus, BusCycle, ReadWrite, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
