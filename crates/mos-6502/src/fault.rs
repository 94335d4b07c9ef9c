//! Terminal core faults.

use std::fmt;

/// Condition that stops the core until the next reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fetched a byte with no documented instruction.
    IllegalOpcode { opcode: u8, address: u16 },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalOpcode { opcode, address } => {
                write!(f, "illegal opcode ${opcode:02X} at ${address:04X}")
            }
        }
    }
}

impl std::error::Error for Fault {}
