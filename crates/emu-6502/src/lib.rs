//! A bare 6502 machine: the `mos-6502` core wired to 64 KiB of flat RAM.
//!
//! The machine is what the CLI runs and what the debug port talks to. It
//! adds nothing to the core's timing; every cycle is one `Mos6502::tick`.

mod config;
mod debugger;
mod machine;
pub mod trace;

pub use config::{ConfigError, MachineConfig, RunLimit, TraceFormat};
pub use debugger::{Command, DebugPort, ProtocolError, ValueId};
pub use machine::{Machine, RunSummary};
