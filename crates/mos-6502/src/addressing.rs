//! Addressing modes and the effective-address resolver.
//!
//! The resolver runs one bus cycle per call. It finishes once the effective
//! address is latched, leaving the data cycle(s) to the sequencer. Indexed
//! modes first form the address from the low byte plus index with no carry,
//! which is what hardware puts on the bus one cycle early. When that add
//! carries, or when the access writes, an extra cycle reads the uncorrected
//! address before the high byte is fixed.

use emu_core::Bus;

use crate::Mos6502;

/// 6502 addressing mode.
///
/// - **0 operand bytes**: Implied, Accumulator
/// - **1 byte**: Immediate, `ZeroPage`, `ZeroPageX`, `ZeroPageY`, Relative,
///   `IndexedIndirect`, `IndirectIndexed`
/// - **2 bytes**: Absolute, `AbsoluteX`, `AbsoluteY`, Indirect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// No operand: CLC, RTS, NOP.
    Implied,
    /// Operates on A: `ASL A`.
    Accumulator,
    /// `LDA #$10`
    Immediate,
    /// `LDA $80`
    ZeroPage,
    /// `LDA $80,X` - wraps within page zero.
    ZeroPageX,
    /// `LDX $80,Y` - wraps within page zero.
    ZeroPageY,
    /// `LDA $1234`
    Absolute,
    /// `LDA $1234,X`
    AbsoluteX,
    /// `LDA $1234,Y`
    AbsoluteY,
    /// `JMP ($FFFC)` - JMP only.
    Indirect,
    /// `LDA ($40,X)`
    IndexedIndirect,
    /// `LDA ($40),Y`
    IndirectIndexed,
    /// Signed branch displacement.
    Relative,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode.
    #[must_use]
    pub const fn operand_bytes(self) -> u8 {
        match self {
            Self::Implied | Self::Accumulator => 0,
            Self::Immediate
            | Self::ZeroPage
            | Self::ZeroPageX
            | Self::ZeroPageY
            | Self::IndexedIndirect
            | Self::IndirectIndexed
            | Self::Relative => 1,
            Self::Absolute | Self::AbsoluteX | Self::AbsoluteY | Self::Indirect => 2,
        }
    }
}

/// How an instruction touches its effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// One data read. The fixup cycle only happens on a page cross.
    Read,
    /// One data write. The fixup cycle always happens.
    Write,
    /// Read, write back unchanged, write modified. Fixup always happens.
    ReadModifyWrite,
}

/// Outcome of adding an index register to a 16-bit base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedAddress {
    /// Base high byte with the carried-free low byte: the first address read.
    pub uncorrected: u16,
    /// Correct effective address.
    pub effective: u16,
    pub page_crossed: bool,
}

/// Add `index` to `base` the way the address unit does, low byte first.
#[must_use]
pub const fn index_address(base: u16, index: u8) -> IndexedAddress {
    let (low, carry) = (base as u8).overflowing_add(index);
    let uncorrected = (base & 0xFF00) | low as u16;
    IndexedAddress {
        uncorrected,
        effective: if carry {
            uncorrected.wrapping_add(0x0100)
        } else {
            uncorrected
        },
        page_crossed: carry,
    }
}

/// Address of the second pointer byte in page zero; never carries into page one.
#[must_use]
pub const fn zero_page_next(pointer: u8) -> u16 {
    pointer.wrapping_add(1) as u16
}

/// Address of the high byte for `JMP (pointer)`.
///
/// Hardware increments only the low byte, so a pointer at `$xxFF` takes its
/// high byte from `$xx00`.
#[must_use]
pub const fn indirect_high(pointer: u16) -> u16 {
    (pointer & 0xFF00) | ((pointer as u8).wrapping_add(1) as u16)
}

/// Relative branch target from the address of the next instruction.
#[must_use]
pub const fn branch_target(pc: u16, offset: u8) -> u16 {
    pc.wrapping_add(offset as i8 as u16)
}

impl Mos6502 {
    /// Run one address-computation cycle for the latched instruction.
    ///
    /// Sets `address_ready` once the effective address is in `micro.addr`.
    pub(crate) fn resolve_cycle<B: Bus>(&mut self, bus: &mut B, access: Access) {
        let mode = self.micro.instruction.mode;
        match (mode, self.micro.t) {
            (AddressingMode::ZeroPage, 1) => {
                self.micro.addr = u16::from(self.fetch_operand(bus));
                self.micro.address_ready = true;
            }

            (AddressingMode::ZeroPageX | AddressingMode::ZeroPageY, 1)
            | (AddressingMode::IndexedIndirect | AddressingMode::IndirectIndexed, 1) => {
                self.micro.pointer = self.fetch_operand(bus);
            }
            (AddressingMode::ZeroPageX | AddressingMode::ZeroPageY, 2) => {
                // Dummy read of the unindexed pointer while the index is added
                self.read(bus, u16::from(self.micro.pointer));
                let index = self.index_for(mode);
                self.micro.addr = u16::from(self.micro.pointer.wrapping_add(index));
                self.micro.address_ready = true;
            }

            (AddressingMode::Absolute | AddressingMode::AbsoluteX | AddressingMode::AbsoluteY, 1) => {
                self.micro.addr = u16::from(self.fetch_operand(bus));
            }
            (AddressingMode::Absolute, 2) => {
                let hi = self.fetch_operand(bus);
                self.micro.addr |= u16::from(hi) << 8;
                self.micro.address_ready = true;
            }
            (AddressingMode::AbsoluteX | AddressingMode::AbsoluteY, 2) => {
                let hi = self.fetch_operand(bus);
                let base = self.micro.addr | (u16::from(hi) << 8);
                self.index_base(base, self.index_for(mode), access);
            }

            (AddressingMode::IndexedIndirect, 2) => {
                self.read(bus, u16::from(self.micro.pointer));
                self.micro.pointer = self.micro.pointer.wrapping_add(self.regs.x);
            }
            (AddressingMode::IndexedIndirect, 3) => {
                self.micro.addr = u16::from(self.read(bus, u16::from(self.micro.pointer)));
            }
            (AddressingMode::IndexedIndirect, 4) => {
                let hi = self.read(bus, zero_page_next(self.micro.pointer));
                self.micro.addr |= u16::from(hi) << 8;
                self.micro.address_ready = true;
            }

            (AddressingMode::IndirectIndexed, 2) => {
                self.micro.addr = u16::from(self.read(bus, u16::from(self.micro.pointer)));
            }
            (AddressingMode::IndirectIndexed, 3) => {
                let hi = self.read(bus, zero_page_next(self.micro.pointer));
                let base = self.micro.addr | (u16::from(hi) << 8);
                self.index_base(base, self.regs.y, access);
            }

            (AddressingMode::AbsoluteX | AddressingMode::AbsoluteY, 3)
            | (AddressingMode::IndirectIndexed, 4) => {
                // Read the uncorrected address, then fix the high byte
                self.read(bus, self.micro.addr);
                self.micro.addr = self.micro.effective;
                self.micro.address_ready = true;
            }

            _ => unreachable!("no address cycle T{} for {mode:?}", self.micro.t),
        }
    }

    fn index_for(&self, mode: AddressingMode) -> u8 {
        match mode {
            AddressingMode::ZeroPageY | AddressingMode::AbsoluteY => self.regs.y,
            _ => self.regs.x,
        }
    }

    fn index_base(&mut self, base: u16, index: u8, access: Access) {
        let indexed = index_address(base, index);
        self.micro.addr = indexed.uncorrected;
        self.micro.effective = indexed.effective;
        // Reads that stay in the page use the uncorrected address directly
        self.micro.address_ready = access == Access::Read && !indexed.page_crossed;
    }
}
