//! Memory bus contract and the per-cycle signal snapshot.
//!
//! A CPU performs exactly one bus transaction per clock cycle. The host
//! owns the memory behind the bus; the CPU only ever sees it through
//! [`Bus::read`] and [`Bus::write`], which complete within the cycle that
//! issued them (address during phase 1, data latched at the end of phase 2).

/// Memory and I/O bus interface.
///
/// Components access memory and peripherals through this trait. The bus
/// handles address decoding and routing to the appropriate device.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}

/// Direction of a bus transaction, as seen on the R/W pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ReadWrite {
    /// Pin high: the host drives the data bus.
    Read,
    /// Pin low: the CPU drives the data bus.
    Write,
}

impl ReadWrite {
    /// Pin level: `true` (1) for read, `false` (0) for write.
    #[must_use]
    pub const fn pin(self) -> bool {
        matches!(self, Self::Read)
    }
}

/// Snapshot of the bus pins for one completed clock cycle.
///
/// `data` is the byte that crossed the bus in this cycle: supplied by the
/// host on a read, driven by the CPU on a write. Sub-cycle timing is not
/// represented, so a store's data appears only on its write cycle, not in
/// the phase before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusCycle {
    pub address: u16,
    pub data: u8,
    pub read_write: ReadWrite,
    /// High only while an opcode byte is being fetched (T0).
    pub sync: bool,
}

impl BusCycle {
    #[must_use]
    pub const fn read(address: u16, data: u8) -> Self {
        Self {
            address,
            data,
            read_write: ReadWrite::Read,
            sync: false,
        }
    }

    #[must_use]
    pub const fn write(address: u16, data: u8) -> Self {
        Self {
            address,
            data,
            read_write: ReadWrite::Write,
            sync: false,
        }
    }

    /// A read cycle with SYNC asserted.
    #[must_use]
    pub const fn opcode_fetch(address: u16, data: u8) -> Self {
        Self {
            address,
            data,
            read_write: ReadWrite::Read,
            sync: true,
        }
    }

    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self.read_write, ReadWrite::Write)
    }
}

impl Default for BusCycle {
    fn default() -> Self {
        Self::read(0, 0)
    }
}

/// Flat 64 KiB RAM covering the whole 16-bit address space.
///
/// Used as the host memory store in tests, tools and the runner.
#[derive(Clone)]
pub struct SimpleBus {
    ram: Box<[u8; 0x10000]>,
}

impl SimpleBus {
    /// Create a bus with all bytes cleared to zero.
    #[must_use]
    pub fn new() -> Self {
        Self::filled(0)
    }

    /// Create a bus with every byte set to `value`.
    #[must_use]
    pub fn filled(value: u8) -> Self {
        Self {
            ram: Box::new([value; 0x10000]),
        }
    }

    /// Set every byte to `value`.
    pub fn fill(&mut self, value: u8) {
        self.ram.fill(value);
    }

    /// Copy `data` into memory starting at `address`, wrapping at $FFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.ram[addr as usize] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read without side effects.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    /// Read a little-endian word without side effects.
    #[must_use]
    pub fn peek_word(&self, address: u16) -> u16 {
        u16::from_le_bytes([self.peek(address), self.peek(address.wrapping_add(1))])
    }

    /// Write without going through the CPU.
    pub fn poke(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }

    /// Store a little-endian word, e.g. an interrupt vector.
    pub fn poke_word(&mut self, address: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.poke(address, lo);
        self.poke(address.wrapping_add(1), hi);
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimpleBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleBus").finish_non_exhaustive()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }
}
