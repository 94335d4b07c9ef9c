//! Arithmetic/logic unit.
//!
//! Pure functions over two operand bytes and a carry-in. Each returns an
//! [`AluResult`] carrying the 8-bit result and the flags hardware would
//! latch from it; the sequencer decides which of those flags an instruction
//! actually commits.

use crate::flags::{C, N, V, Z};

/// Result byte plus the C/Z/V/N outputs of one ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub carry: bool,
    pub zero: bool,
    pub overflow: bool,
    pub negative: bool,
}

impl AluResult {
    /// Result with Z and N derived from the value itself.
    #[must_use]
    pub const fn new(value: u8, carry: bool, overflow: bool) -> Self {
        Self {
            value,
            carry,
            zero: value == 0,
            overflow,
            negative: value & 0x80 != 0,
        }
    }

    /// The C/Z/V/N outputs packed in status-register bit positions.
    #[must_use]
    pub const fn flags(self) -> u8 {
        let mut bits = 0;
        if self.carry {
            bits |= C;
        }
        if self.zero {
            bits |= Z;
        }
        if self.overflow {
            bits |= V;
        }
        if self.negative {
            bits |= N;
        }
        bits
    }
}

/// Binary addition: carry-out is bit 8 of the 9-bit sum.
///
/// Overflow is set when both operands share a sign that the result does
/// not.
#[must_use]
pub const fn add(a: u8, b: u8, carry_in: bool) -> AluResult {
    let sum = a as u16 + b as u16 + carry_in as u16;
    let result = sum as u8;
    let overflow = (a ^ result) & (b ^ result) & 0x80 != 0;
    AluResult::new(result, sum > 0xFF, overflow)
}

/// Binary subtraction as addition of the one's complement.
///
/// Carry-in is "not borrow": without a preceding SEC one extra is
/// subtracted. Carry-out is set when no borrow occurred.
#[must_use]
pub const fn subtract(a: u8, b: u8, carry_in: bool) -> AluResult {
    add(a, !b, carry_in)
}

/// Register/memory comparison (CMP, CPX, CPY). Overflow is not affected.
#[must_use]
pub const fn compare(register: u8, operand: u8) -> AluResult {
    AluResult::new(register.wrapping_sub(operand), register >= operand, false)
}

#[must_use]
pub const fn and(a: u8, b: u8) -> AluResult {
    AluResult::new(a & b, false, false)
}

#[must_use]
pub const fn or(a: u8, b: u8) -> AluResult {
    AluResult::new(a | b, false, false)
}

#[must_use]
pub const fn xor(a: u8, b: u8) -> AluResult {
    AluResult::new(a ^ b, false, false)
}

/// BIT: Z from `a & m`, N and V copied from bits 7 and 6 of the operand.
#[must_use]
pub const fn bit_test(a: u8, operand: u8) -> AluResult {
    AluResult {
        value: a & operand,
        carry: false,
        zero: a & operand == 0,
        overflow: operand & 0x40 != 0,
        negative: operand & 0x80 != 0,
    }
}

/// Arithmetic shift left: bit 7 goes to carry, 0 shifts in.
#[must_use]
pub const fn shift_left(value: u8) -> AluResult {
    AluResult::new(value << 1, value & 0x80 != 0, false)
}

/// Logical shift right: bit 0 goes to carry, 0 shifts in.
#[must_use]
pub const fn shift_right(value: u8) -> AluResult {
    AluResult::new(value >> 1, value & 0x01 != 0, false)
}

/// Rotate left through carry.
#[must_use]
pub const fn rotate_left(value: u8, carry_in: bool) -> AluResult {
    AluResult::new((value << 1) | carry_in as u8, value & 0x80 != 0, false)
}

/// Rotate right through carry.
#[must_use]
pub const fn rotate_right(value: u8, carry_in: bool) -> AluResult {
    AluResult::new(
        (value >> 1) | ((carry_in as u8) << 7),
        value & 0x01 != 0,
        false,
    )
}

#[must_use]
pub const fn increment(value: u8) -> AluResult {
    AluResult::new(value.wrapping_add(1), false, false)
}

#[must_use]
pub const fn decrement(value: u8) -> AluResult {
    AluResult::new(value.wrapping_sub(1), false, false)
}

/// NMOS decimal-mode ADC.
///
/// Z follows the binary sum, N and V follow the intermediate high nibble
/// before its decimal adjust. These outcomes have not been checked against
/// silicon.
#[must_use]
pub fn add_decimal(a: u8, b: u8, carry_in: bool) -> AluResult {
    let carry = u8::from(carry_in);

    let mut lo = (a & 0x0F) + (b & 0x0F) + carry;
    if lo > 9 {
        lo += 6;
    }
    let mut hi = (a >> 4) + (b >> 4) + u8::from(lo > 0x0F);

    let binary = add(a, b, carry_in).value;
    let intermediate = (hi << 4) | (lo & 0x0F);
    let overflow = (a ^ intermediate) & (b ^ intermediate) & 0x80 != 0 && (a ^ b) & 0x80 == 0;
    let negative = hi & 0x08 != 0;

    if hi > 9 {
        hi += 6;
    }

    AluResult {
        value: (hi << 4) | (lo & 0x0F),
        carry: hi > 0x0F,
        zero: binary == 0,
        overflow,
        negative,
    }
}

/// NMOS decimal-mode SBC. All flags follow the binary difference.
#[must_use]
pub fn subtract_decimal(a: u8, b: u8, carry_in: bool) -> AluResult {
    let flags = subtract(a, b, carry_in);
    let borrow = i16::from(!carry_in);

    let mut lo = i16::from(a & 0x0F) - i16::from(b & 0x0F) - borrow;
    let mut hi = i16::from(a >> 4) - i16::from(b >> 4);
    if lo < 0 {
        lo -= 6;
        hi -= 1;
    }
    if hi < 0 {
        hi -= 6;
    }

    AluResult {
        value: (((hi << 4) & 0xF0) | (lo & 0x0F)) as u8,
        ..flags
    }
}
