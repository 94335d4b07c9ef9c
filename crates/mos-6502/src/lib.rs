//! Cycle-accurate NMOS 6502 core.
//!
//! The 6502 executes one bus access per cycle. Each `tick()` advances
//! exactly one cycle and returns the pins of that cycle (address, data,
//! read/write, sync), so a host can compare the full bus trace of every
//! instruction and interrupt against hardware.
//!
//! The core owns its registers and microstate; memory stays with the host
//! and is only reached through [`emu_core::Bus`].

pub mod addressing;
pub mod alu;
mod config;
mod cpu;
mod fault;
pub mod flags;
mod interrupts;
pub mod opcodes;
mod registers;

pub use addressing::{Access, AddressingMode};
pub use config::{DecimalMode, Mos6502Config};
pub use cpu::Mos6502;
pub use fault::Fault;
pub use flags::Status;
pub use interrupts::{ArbiterState, IRQ_VECTOR, Interrupt, NMI_VECTOR, RESET_VECTOR};
pub use opcodes::{Instruction, Mnemonic};
pub use registers::{Register, Registers};
