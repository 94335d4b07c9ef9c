//! Disassembler over byte slices or live memory.
//!
//! Decoding never panics: an unknown opcode or a short buffer comes back as
//! a [`DecodeError`], and a memory walk stops at the first one.

use std::fmt;

use emu_core::Bus;
use mos_6502::addressing::branch_target;
use mos_6502::opcodes;
use mos_6502::{AddressingMode, Instruction};

use crate::DecodeError;

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub address: u16,
    pub instruction: Instruction,
    /// Opcode followed by its operand bytes.
    pub bytes: Vec<u8>,
}

impl Decoded {
    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.bytes.first().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn size_bytes(&self) -> u8 {
        self.instruction.size_bytes()
    }

    /// Raw operand, little-endian; zero when there is none.
    #[must_use]
    pub fn operand(&self) -> u16 {
        match *self.bytes.as_slice() {
            [_, lo] => u16::from(lo),
            [_, lo, hi] => u16::from_le_bytes([lo, hi]),
            _ => 0,
        }
    }

    /// Address of the following instruction.
    #[must_use]
    pub fn next_address(&self) -> u16 {
        self.address.wrapping_add(u16::from(self.size_bytes()))
    }

    /// Where a branch goes when taken.
    #[must_use]
    pub fn branch_target(&self) -> Option<u16> {
        (self.instruction.mode == AddressingMode::Relative)
            .then(|| branch_target(self.next_address(), self.operand() as u8))
    }
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.instruction.mnemonic;
        let operand = self.operand();
        match self.instruction.mode {
            AddressingMode::Implied => write!(f, "{mnemonic}"),
            AddressingMode::Accumulator => write!(f, "{mnemonic} A"),
            AddressingMode::Immediate => write!(f, "{mnemonic} #${operand:02X}"),
            AddressingMode::ZeroPage => write!(f, "{mnemonic} ${operand:02X}"),
            AddressingMode::ZeroPageX => write!(f, "{mnemonic} ${operand:02X},X"),
            AddressingMode::ZeroPageY => write!(f, "{mnemonic} ${operand:02X},Y"),
            AddressingMode::Absolute => write!(f, "{mnemonic} ${operand:04X}"),
            AddressingMode::AbsoluteX => write!(f, "{mnemonic} ${operand:04X},X"),
            AddressingMode::AbsoluteY => write!(f, "{mnemonic} ${operand:04X},Y"),
            AddressingMode::Indirect => write!(f, "{mnemonic} (${operand:04X})"),
            AddressingMode::IndexedIndirect => write!(f, "{mnemonic} (${operand:02X},X)"),
            AddressingMode::IndirectIndexed => write!(f, "{mnemonic} (${operand:02X}),Y"),
            AddressingMode::Relative => {
                let target = branch_target(self.next_address(), operand as u8);
                write!(f, "{mnemonic} ${target:04X}")
            }
        }
    }
}

/// Decode the instruction at the start of `bytes`, which sits at `address`.
pub fn decode(bytes: &[u8], address: u16) -> Result<Decoded, DecodeError> {
    let Some(&opcode) = bytes.first() else {
        return Err(DecodeError::Truncated { address, needed: 1 });
    };
    let instruction =
        opcodes::decode(opcode).ok_or(DecodeError::IllegalOpcode { address, opcode })?;
    let needed = instruction.size_bytes();
    let bytes = bytes
        .get(..usize::from(needed))
        .ok_or(DecodeError::Truncated { address, needed })?;
    Ok(Decoded {
        address,
        instruction,
        bytes: bytes.to_vec(),
    })
}

/// Result of walking memory: what decoded, and what stopped the walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disassembly {
    pub lines: Vec<Decoded>,
    pub error: Option<DecodeError>,
}

/// Disassemble up to `count` instructions from `pc`, wrapping at the top of
/// memory.
///
/// Reads go through the bus, so only use this on memory whose reads have no
/// side effects.
pub fn disassemble(bus: &mut impl Bus, pc: u16, count: usize) -> Disassembly {
    let mut result = Disassembly::default();
    let mut address = pc;
    for _ in 0..count {
        let window = [
            bus.read(address),
            bus.read(address.wrapping_add(1)),
            bus.read(address.wrapping_add(2)),
        ];
        match decode(&window, address) {
            Ok(decoded) => {
                address = decoded.next_address();
                result.lines.push(decoded);
            }
            Err(err) => {
                result.error = Some(err);
                break;
            }
        }
    }
    result
}
