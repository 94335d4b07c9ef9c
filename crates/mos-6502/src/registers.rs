//! 6502 CPU registers.

use crate::Status;

/// Base of the fixed stack page.
pub const STACK_PAGE: u16 = 0x0100;

/// 6502 CPU register set.
///
/// The 6502 has minimal registers:
/// - A: 8-bit accumulator
/// - X, Y: 8-bit index registers
/// - S: 8-bit stack pointer (stack is at $0100-$01FF)
/// - PC: 16-bit program counter
/// - P: 8-bit processor status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer (points to next free location, stack at $0100-$01FF).
    pub s: u8,
    /// Program counter.
    pub pc: u16,
    /// Processor status flags.
    pub p: Status,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Power-on register contents, before the reset sequence has run.
    ///
    /// The reset sequence itself decrements S three times and sets I, so a
    /// core that has completed reset from power-on shows S = $FD and P = $24.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0x00,
            pc: 0,
            p: Status::new(),
        }
    }

    /// Push slot: return the address to write and post-decrement S.
    ///
    /// S wraps within page one; it never borrows into the high byte.
    pub fn push(&mut self) -> u16 {
        let addr = self.stack_addr();
        self.s = self.s.wrapping_sub(1);
        addr
    }

    /// Pull slot: pre-increment S and return the address to read.
    pub fn pop(&mut self) -> u16 {
        self.s = self.s.wrapping_add(1);
        self.stack_addr()
    }

    /// Get the current stack address without modifying S.
    #[must_use]
    pub const fn stack_addr(&self) -> u16 {
        STACK_PAGE | (self.s as u16)
    }

    /// Set A/X/Y-style destination and update N and Z from it.
    pub fn load(&mut self, target: Register, value: u8) {
        match target {
            Register::A => self.a = value,
            Register::X => self.x = value,
            Register::Y => self.y = value,
        }
        self.p.update_nz(value);
    }

    /// Read one of the 8-bit data registers.
    #[must_use]
    pub const fn get(&self, source: Register) -> u8 {
        match source {
            Register::A => self.a,
            Register::X => self.x,
            Register::Y => self.y,
        }
    }
}

/// The three 8-bit data registers addressed by loads, stores and transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    A,
    X,
    Y,
}
