//! Assembly and decode failures.

use std::fmt;

use mos_6502::{AddressingMode, Mnemonic};

/// Why a program failed to assemble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    /// A label operand that no `label()` defines.
    UndefinedLabel(String),
    /// The same label defined twice.
    DuplicateLabel(String),
    /// The mnemonic has no opcode for this addressing mode.
    UnsupportedMode {
        mnemonic: Mnemonic,
        mode: AddressingMode,
    },
    /// Branch target more than -128/+127 bytes from the next instruction.
    BranchOutOfRange { from: u16, to: u16 },
    /// An operand helper was called before any instruction.
    MissingInstruction,
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedLabel(name) => write!(f, "undefined label: {name}"),
            Self::DuplicateLabel(name) => write!(f, "label defined twice: {name}"),
            Self::UnsupportedMode { mnemonic, mode } => {
                write!(f, "{mnemonic} does not support {mode:?} addressing")
            }
            Self::BranchOutOfRange { from, to } => {
                write!(f, "branch at ${from:04X} cannot reach ${to:04X}")
            }
            Self::MissingInstruction => write!(f, "operand given before any instruction"),
        }
    }
}

impl std::error::Error for AsmError {}

/// Why a byte sequence could not be disassembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Undocumented or unassigned opcode.
    IllegalOpcode { address: u16, opcode: u8 },
    /// Fewer bytes available than the instruction needs.
    Truncated { address: u16, needed: u8 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IllegalOpcode { address, opcode } => {
                write!(f, "illegal opcode ${opcode:02X} at ${address:04X}")
            }
            Self::Truncated { address, needed } => {
                write!(f, "instruction at ${address:04X} needs {needed} bytes")
            }
        }
    }
}

impl std::error::Error for DecodeError {}
