//! Interrupt lines, the arbiter and the shared entry sequence.
//!
//! NMI is edge-triggered: a high-to-low transition sets a latch that stays
//! set until the NMI is serviced, however briefly the line was low. IRQ is
//! level-triggered and re-sampled every cycle. Both are sampled at the end of
//! a cycle and acted on only at an instruction boundary.
//!
//! RESET, NMI, IRQ and BRK all run the same seven-cycle sequence. RESET
//! turns the three pushes into reads, BRK steps PC over its padding byte and
//! pushes P with B set.

use emu_core::Bus;

use crate::Mos6502;
use crate::cpu::State;
use crate::flags::I;

/// NMI vector (low byte; high byte follows).
pub const NMI_VECTOR: u16 = 0xFFFA;
/// RESET vector.
pub const RESET_VECTOR: u16 = 0xFFFC;
/// IRQ/BRK vector.
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Source of an interrupt-style entry sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interrupt {
    Reset,
    Nmi,
    Irq,
    /// Software interrupt (opcode $00).
    Brk,
}

impl Interrupt {
    /// Vector this source loads PC from when not hijacked.
    #[must_use]
    pub const fn vector(self) -> u16 {
        match self {
            Self::Reset => RESET_VECTOR,
            Self::Nmi => NMI_VECTOR,
            Self::Irq | Self::Brk => IRQ_VECTOR,
        }
    }
}

/// What the arbiter would do at the next instruction boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterState {
    Idle,
    NmiPending,
    /// IRQ asserted with I clear.
    IrqPending,
    Servicing(Interrupt),
}

/// Pin levels and latches. Levels are active-low: `true` means inactive.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InterruptLines {
    irq_line: bool,
    nmi_line: bool,
    /// Falling NMI edge seen since the last end-of-cycle sample.
    nmi_edge: bool,
    nmi_latched: bool,
    irq_latched: bool,
}

impl InterruptLines {
    pub(crate) const fn new() -> Self {
        Self {
            irq_line: true,
            nmi_line: true,
            nmi_edge: false,
            nmi_latched: false,
            irq_latched: false,
        }
    }

    pub(crate) fn set_irq(&mut self, level: bool) {
        self.irq_line = level;
    }

    pub(crate) fn set_nmi(&mut self, level: bool) {
        if self.nmi_line && !level {
            self.nmi_edge = true;
        }
        self.nmi_line = level;
    }

    /// End-of-cycle sample. Edges are dropped when `accept_nmi` is false.
    pub(crate) fn sample(&mut self, accept_nmi: bool) {
        if self.nmi_edge && accept_nmi {
            self.nmi_latched = true;
        }
        self.nmi_edge = false;
        self.irq_latched = !self.irq_line;
    }

    /// Boundary decision: NMI first, then IRQ unless masked.
    pub(crate) const fn poll(&self, irq_masked: bool) -> Option<Interrupt> {
        if self.nmi_latched {
            Some(Interrupt::Nmi)
        } else if self.irq_latched && !irq_masked {
            Some(Interrupt::Irq)
        } else {
            None
        }
    }

    /// Consume a latched NMI, reporting whether one was pending.
    pub(crate) fn take_nmi(&mut self) -> bool {
        std::mem::replace(&mut self.nmi_latched, false)
    }

    /// Forget any NMI edge or latch; used by RESET.
    pub(crate) fn clear_nmi(&mut self) {
        self.nmi_edge = false;
        self.nmi_latched = false;
    }

    pub(crate) const fn nmi_latched(&self) -> bool {
        self.nmi_latched
    }

    pub(crate) const fn irq_latched(&self) -> bool {
        self.irq_latched
    }
}

impl Mos6502 {
    /// Current arbiter state.
    #[must_use]
    pub fn arbiter_state(&self) -> ArbiterState {
        if let State::Interrupt(kind) = self.state {
            return ArbiterState::Servicing(kind);
        }
        match self.lines.poll(self.regs.p.is_set(I)) {
            Some(Interrupt::Nmi) => ArbiterState::NmiPending,
            Some(_) => ArbiterState::IrqPending,
            None => ArbiterState::Idle,
        }
    }

    /// Level-sensitive IRQ request as sampled at the end of the last cycle.
    #[must_use]
    pub fn irq_asserted(&self) -> bool {
        self.lines.irq_latched()
    }

    /// Whether an NMI edge is waiting to be serviced.
    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.lines.nmi_latched()
    }

    /// Take the arbiter decision for this boundary, if any.
    pub(crate) fn poll_interrupt(&mut self) -> Option<Interrupt> {
        let kind = self.lines.poll(self.regs.p.is_set(I))?;
        if kind == Interrupt::Nmi {
            self.lines.take_nmi();
        }
        Some(kind)
    }

    /// One cycle of the RESET/NMI/IRQ/BRK sequence.
    ///
    /// T0 is the opcode slot (the BRK fetch itself, or a discarded fetch for
    /// the others), T1 reads the byte after it, T2-T4 push PCH, PCL and P,
    /// T5-T6 read the vector.
    pub(crate) fn entry_cycle<B: Bus>(&mut self, bus: &mut B, kind: Interrupt) {
        match self.micro.t {
            0 => {
                self.fetch_opcode_byte(bus, self.regs.pc);
            }
            1 => {
                self.read(bus, self.regs.pc);
                if kind == Interrupt::Brk {
                    self.regs.pc = self.regs.pc.wrapping_add(1);
                }
            }
            2 => {
                let [_, pch] = self.regs.pc.to_le_bytes();
                self.push_or_suppress(bus, kind, pch);
            }
            3 => {
                let [pcl, _] = self.regs.pc.to_le_bytes();
                self.push_or_suppress(bus, kind, pcl);
            }
            4 => {
                let p = if kind == Interrupt::Brk {
                    self.regs.p.to_byte_brk()
                } else {
                    self.regs.p.to_byte_irq()
                };
                self.push_or_suppress(bus, kind, p);

                // An NMI arriving during a BRK/IRQ push steals the vector
                self.micro.addr = match kind {
                    Interrupt::Brk | Interrupt::Irq if self.lines.take_nmi() => NMI_VECTOR,
                    _ => kind.vector(),
                };
            }
            5 => {
                self.micro.data = self.read(bus, self.micro.addr);
                self.regs.p.set(I);
            }
            6 => {
                let hi = self.read(bus, self.micro.addr.wrapping_add(1));
                self.regs.pc = u16::from_le_bytes([self.micro.data, hi]);
                if kind == Interrupt::Reset {
                    self.lines.clear_nmi();
                }
                self.finish();
            }
            _ => unreachable!(),
        }
    }

    /// Push `value`, or for RESET decrement S and read the slot instead.
    fn push_or_suppress<B: Bus>(&mut self, bus: &mut B, kind: Interrupt, value: u8) {
        if kind == Interrupt::Reset {
            self.regs.s = self.regs.s.wrapping_sub(1);
            self.read(bus, self.regs.stack_addr());
        } else {
            let addr = self.regs.push();
            self.write(bus, addr, value);
        }
    }
}
