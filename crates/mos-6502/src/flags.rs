//! 6502 processor status register (P).
//!
//! Six of the eight bits are live flags. U has no storage and always reads
//! as 1. B has no storage either: it only exists in the byte pushed by
//! BRK/PHP (set) or by IRQ/NMI entry (clear), and is dropped again when a
//! byte is pulled back with PLP/RTI.

/// Carry flag - set if operation resulted in carry/borrow.
pub const C: u8 = 0x01;

/// Zero flag - set if result is zero.
pub const Z: u8 = 0x02;

/// Interrupt disable - when set, IRQ interrupts are ignored.
pub const I: u8 = 0x04;

/// Decimal mode - enables BCD arithmetic for ADC/SBC where supported.
pub const D: u8 = 0x08;

/// Break flag - not a real flag, only appears when status is pushed.
pub const B: u8 = 0x10;

/// Unused bit - always reads as 1.
pub const U: u8 = 0x20;

/// Overflow flag - set if signed arithmetic overflowed.
pub const V: u8 = 0x40;

/// Negative flag - set if result has bit 7 set.
pub const N: u8 = 0x80;

/// Processor status register.
///
/// The inner byte always has U set and B clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status(u8);

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

impl Status {
    /// Power-on status: only U reads as set.
    #[must_use]
    pub const fn new() -> Self {
        Self(U)
    }

    /// Load status from a byte, as PLP and RTI do: U forced, B discarded.
    #[must_use]
    pub const fn from_byte(value: u8) -> Self {
        Self((value | U) & !B)
    }

    /// Register-visible value (U set, B clear).
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Byte pushed by BRK and PHP (break and unused both set).
    #[must_use]
    pub const fn to_byte_brk(self) -> u8 {
        self.0 | U | B
    }

    /// Byte pushed on IRQ/NMI entry (unused set, break clear).
    #[must_use]
    pub const fn to_byte_irq(self) -> u8 {
        (self.0 | U) & !B
    }

    /// Check if a flag is set.
    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    /// Set a flag. U and B have no storage and are left as they read.
    pub fn set(&mut self, flag: u8) {
        self.0 = (self.0 | flag | U) & !B;
    }

    /// Clear a flag.
    pub fn clear(&mut self, flag: u8) {
        self.0 = (self.0 & !flag) | U;
    }

    /// Set or clear a flag based on condition.
    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Copy the bits selected by `mask` from `flags`, leaving the rest.
    pub fn apply(&mut self, flags: u8, mask: u8) {
        self.0 = ((self.0 & !mask) | (flags & mask) | U) & !B;
    }

    /// Update N and Z flags based on a value.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
    }

    /// Carry as an ALU carry-in bit.
    #[must_use]
    pub const fn carry(self) -> bool {
        self.is_set(C)
    }
}
