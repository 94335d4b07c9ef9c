//! 6502 instruction sequencer.
//!
//! Cycle-accurate emulation where each `tick()` performs exactly one
//! bus access. The latched opcode is decoded once through the opcode table;
//! from then on the instruction's class (implied, immediate, memory read,
//! store, read-modify-write, or one of the control-flow specials) picks the
//! per-cycle routine, and the addressing mode picks the address cycles.

use emu_core::{Bus, BusCycle, Cpu, Observable, Value};

use crate::addressing::{Access, AddressingMode, branch_target, indirect_high};
use crate::alu::{self, AluResult};
use crate::config::{DecimalMode, Mos6502Config};
use crate::flags::{C, D, I, N, V, Z};
use crate::interrupts::{Interrupt, InterruptLines};
use crate::opcodes::{self, Instruction, Mnemonic};
use crate::registers::Register;
use crate::{Fault, Registers, Status};

/// Internal state tracking instruction execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// Instruction boundary: fetch an opcode or start an interrupt.
    FetchOpcode,
    /// Executing instruction cycles.
    Execute,
    /// Running a RESET/NMI/IRQ/BRK entry sequence.
    Interrupt(Interrupt),
    /// Stopped on an illegal opcode until reset.
    Halted,
}

/// Per-instruction working state, overwritten at every opcode fetch.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Microstate {
    pub(crate) opcode: u8,
    pub(crate) instruction: Instruction,
    /// T-state of the next cycle (0 = opcode fetch).
    pub(crate) t: u8,
    /// Effective address under construction.
    pub(crate) addr: u16,
    /// Zero-page pointer for indexed and indirect modes.
    pub(crate) pointer: u8,
    /// Latched data or low byte.
    pub(crate) data: u8,
    /// Corrected indexed address, taken on the fixup cycle.
    pub(crate) effective: u16,
    pub(crate) address_ready: bool,
    /// Cycles run since `address_ready` (read-modify-write only).
    pub(crate) step: u8,
}

impl Microstate {
    const fn new() -> Self {
        Self {
            opcode: 0x00,
            instruction: Instruction::new(Mnemonic::Brk, AddressingMode::Implied),
            t: 0,
            addr: 0,
            pointer: 0,
            data: 0,
            effective: 0,
            address_ready: false,
            step: 0,
        }
    }

    fn latch(&mut self, opcode: u8, instruction: Instruction) {
        *self = Self {
            opcode,
            instruction,
            ..Self::new()
        };
    }
}

/// The MOS 6502 CPU.
///
/// Implements cycle-accurate execution where each `tick()` advances
/// exactly one CPU cycle. The 6502 performs one bus access per cycle.
///
/// A new core starts inside its RESET sequence: the first seven ticks read
/// the reset vector and the eighth fetches the first opcode.
#[derive(Debug)]
pub struct Mos6502 {
    /// CPU registers.
    pub regs: Registers,

    config: Mos6502Config,

    /// Current execution state.
    pub(crate) state: State,

    pub(crate) micro: Microstate,

    pub(crate) lines: InterruptLines,

    fault: Option<Fault>,

    /// Pins of the most recent cycle.
    pins: BusCycle,

    /// Total cycles executed (for debugging).
    total_cycles: u64,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6502 {
    /// Create a new 6502 at power-on, about to run its reset sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Mos6502Config::default())
    }

    #[must_use]
    pub fn with_config(config: Mos6502Config) -> Self {
        Self {
            regs: Registers::new(),
            config,
            state: State::Interrupt(Interrupt::Reset),
            micro: Microstate::new(),
            lines: InterruptLines::new(),
            fault: None,
            pins: BusCycle::default(),
            total_cycles: 0,
        }
    }

    /// Core parked at an instruction boundary with `regs` loaded, as if
    /// reset had already run.
    #[must_use]
    pub fn with_registers(config: Mos6502Config, regs: Registers) -> Self {
        Self {
            regs,
            state: State::FetchOpcode,
            ..Self::with_config(config)
        }
    }

    /// Why the core halted, if it has.
    #[must_use]
    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// True when the next tick starts a new instruction or interrupt.
    #[must_use]
    pub fn is_instruction_complete(&self) -> bool {
        self.state == State::FetchOpcode
    }

    /// T-state the next tick will execute.
    #[must_use]
    pub fn t_state(&self) -> u8 {
        self.micro.t
    }

    /// Most recently fetched opcode byte.
    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.micro.opcode
    }

    /// Instruction currently being executed, if any.
    #[must_use]
    pub fn current_instruction(&self) -> Option<Instruction> {
        (self.state == State::Execute).then_some(self.micro.instruction)
    }

    /// Bus pins of the last completed cycle.
    #[must_use]
    pub fn last_cycle(&self) -> BusCycle {
        self.pins
    }

    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Execute one CPU cycle.
    fn execute_cycle<B: Bus>(&mut self, bus: &mut B) -> BusCycle {
        match self.state {
            State::FetchOpcode => self.fetch_or_interrupt(bus),
            State::Execute => self.execute_instruction(bus),
            State::Interrupt(kind) => self.entry_cycle(bus, kind),
            State::Halted => {
                self.read(bus, self.regs.pc);
            }
        }

        self.micro.t = match self.state {
            State::FetchOpcode => 0,
            _ => self.micro.t.wrapping_add(1),
        };
        let in_reset = self.state == State::Interrupt(Interrupt::Reset);
        self.lines.sample(!in_reset);
        self.total_cycles += 1;
        self.pins
    }

    // ========================================================================
    // Bus access
    // ========================================================================

    pub(crate) fn read<B: Bus>(&mut self, bus: &mut B, address: u16) -> u8 {
        let data = bus.read(address);
        self.pins = BusCycle::read(address, data);
        data
    }

    pub(crate) fn write<B: Bus>(&mut self, bus: &mut B, address: u16, value: u8) {
        bus.write(address, value);
        self.pins = BusCycle::write(address, value);
    }

    /// T0 read with SYNC high.
    pub(crate) fn fetch_opcode_byte<B: Bus>(&mut self, bus: &mut B, address: u16) -> u8 {
        let data = bus.read(address);
        self.pins = BusCycle::opcode_fetch(address, data);
        data
    }

    /// Read the byte at PC and step past it.
    pub(crate) fn fetch_operand<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let data = self.read(bus, self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        data
    }

    // ========================================================================
    // Sequencing
    // ========================================================================

    /// Instruction boundary: the arbiter gets the first say.
    fn fetch_or_interrupt<B: Bus>(&mut self, bus: &mut B) {
        if let Some(kind) = self.poll_interrupt() {
            self.micro.latch(0x00, Instruction::new(Mnemonic::Brk, AddressingMode::Implied));
            self.state = State::Interrupt(kind);
            self.entry_cycle(bus, kind);
            return;
        }

        let address = self.regs.pc;
        let opcode = self.fetch_opcode_byte(bus, address);
        let Some(instruction) = opcodes::decode(opcode) else {
            // PC stays on the offending byte; only reset leaves this state
            self.micro.opcode = opcode;
            self.fault = Some(Fault::IllegalOpcode { opcode, address });
            self.state = State::Halted;
            return;
        };

        self.regs.pc = address.wrapping_add(1);
        self.micro.latch(opcode, instruction);
        self.state = if instruction.mnemonic == Mnemonic::Brk {
            State::Interrupt(Interrupt::Brk)
        } else {
            State::Execute
        };
    }

    /// Finish current instruction and return to opcode fetch.
    pub(crate) fn finish(&mut self) {
        self.state = State::FetchOpcode;
    }

    /// Execute one cycle of the current instruction.
    fn execute_instruction<B: Bus>(&mut self, bus: &mut B) {
        let Instruction { mnemonic, mode } = self.micro.instruction;
        match mnemonic {
            Mnemonic::Jsr => self.op_jsr(bus),
            Mnemonic::Rts => self.op_rts(bus),
            Mnemonic::Rti => self.op_rti(bus),
            Mnemonic::Jmp if mode == AddressingMode::Indirect => self.op_jmp_ind(bus),
            Mnemonic::Jmp => self.op_jmp_abs(bus),
            Mnemonic::Pha | Mnemonic::Php => self.op_push(bus),
            Mnemonic::Pla | Mnemonic::Plp => self.op_pull(bus),
            m if m.is_branch() => self.op_branch(bus, self.branch_taken(m)),
            _ => match mode {
                AddressingMode::Implied | AddressingMode::Accumulator => self.op_implied(bus),
                AddressingMode::Immediate => self.op_immediate(bus),
                _ => match mnemonic.access() {
                    Access::Read => self.exec_read(bus),
                    Access::Write => self.exec_write(bus),
                    Access::ReadModifyWrite => self.exec_rmw(bus),
                },
            },
        }
    }

    /// Address cycles, then one data read.
    fn exec_read<B: Bus>(&mut self, bus: &mut B) {
        if !self.micro.address_ready {
            self.resolve_cycle(bus, Access::Read);
            return;
        }
        let value = self.read(bus, self.micro.addr);
        self.apply_read(value);
        self.finish();
    }

    /// Address cycles, then one data write.
    fn exec_write<B: Bus>(&mut self, bus: &mut B) {
        if !self.micro.address_ready {
            self.resolve_cycle(bus, Access::Write);
            return;
        }
        let source = match self.micro.instruction.mnemonic {
            Mnemonic::Stx => Register::X,
            Mnemonic::Sty => Register::Y,
            _ => Register::A,
        };
        self.write(bus, self.micro.addr, self.regs.get(source));
        self.finish();
    }

    /// Address cycles, then read, write back unchanged, write modified.
    fn exec_rmw<B: Bus>(&mut self, bus: &mut B) {
        if !self.micro.address_ready {
            self.resolve_cycle(bus, Access::ReadModifyWrite);
            return;
        }
        match self.micro.step {
            0 => {
                self.micro.data = self.read(bus, self.micro.addr);
            }
            1 => {
                self.write(bus, self.micro.addr, self.micro.data);
                self.micro.data = self.modify(self.micro.data);
            }
            _ => {
                self.write(bus, self.micro.addr, self.micro.data);
                self.finish();
            }
        }
        self.micro.step += 1;
    }

    // ========================================================================
    // ALU operations
    // ========================================================================

    fn decimal_active(&self) -> bool {
        self.config.decimal == DecimalMode::Nmos && self.regs.p.is_set(D)
    }

    fn commit(&mut self, result: AluResult, mask: u8) {
        self.regs.p.apply(result.flags(), mask);
    }

    /// Operation of a read-class instruction on its operand.
    fn apply_read(&mut self, value: u8) {
        let a = self.regs.a;
        match self.micro.instruction.mnemonic {
            Mnemonic::Lda => self.regs.load(Register::A, value),
            Mnemonic::Ldx => self.regs.load(Register::X, value),
            Mnemonic::Ldy => self.regs.load(Register::Y, value),
            Mnemonic::And => self.regs.load(Register::A, alu::and(a, value).value),
            Mnemonic::Ora => self.regs.load(Register::A, alu::or(a, value).value),
            Mnemonic::Eor => self.regs.load(Register::A, alu::xor(a, value).value),
            Mnemonic::Adc => {
                let carry = self.regs.p.carry();
                let result = if self.decimal_active() {
                    alu::add_decimal(a, value, carry)
                } else {
                    alu::add(a, value, carry)
                };
                self.regs.a = result.value;
                self.commit(result, C | Z | V | N);
            }
            Mnemonic::Sbc => {
                let carry = self.regs.p.carry();
                let result = if self.decimal_active() {
                    alu::subtract_decimal(a, value, carry)
                } else {
                    alu::subtract(a, value, carry)
                };
                self.regs.a = result.value;
                self.commit(result, C | Z | V | N);
            }
            Mnemonic::Cmp => self.commit(alu::compare(a, value), C | Z | N),
            Mnemonic::Cpx => self.commit(alu::compare(self.regs.x, value), C | Z | N),
            Mnemonic::Cpy => self.commit(alu::compare(self.regs.y, value), C | Z | N),
            Mnemonic::Bit => self.commit(alu::bit_test(a, value), Z | V | N),
            other => unreachable!("{other} has no read operation"),
        }
    }

    /// Shift/rotate/increment/decrement, committing C (where used), Z and N.
    fn modify(&mut self, value: u8) -> u8 {
        let carry = self.regs.p.carry();
        let (result, mask) = match self.micro.instruction.mnemonic {
            Mnemonic::Asl => (alu::shift_left(value), C | Z | N),
            Mnemonic::Lsr => (alu::shift_right(value), C | Z | N),
            Mnemonic::Rol => (alu::rotate_left(value, carry), C | Z | N),
            Mnemonic::Ror => (alu::rotate_right(value, carry), C | Z | N),
            Mnemonic::Inc => (alu::increment(value), Z | N),
            Mnemonic::Dec => (alu::decrement(value), Z | N),
            other => unreachable!("{other} does not modify memory"),
        };
        self.commit(result, mask);
        result.value
    }

    fn branch_taken(&self, mnemonic: Mnemonic) -> bool {
        let p = self.regs.p;
        match mnemonic {
            Mnemonic::Bcc => !p.is_set(C),
            Mnemonic::Bcs => p.is_set(C),
            Mnemonic::Bne => !p.is_set(Z),
            Mnemonic::Beq => p.is_set(Z),
            Mnemonic::Bpl => !p.is_set(N),
            Mnemonic::Bmi => p.is_set(N),
            Mnemonic::Bvc => !p.is_set(V),
            Mnemonic::Bvs => p.is_set(V),
            _ => false,
        }
    }

    // ========================================================================
    // Instruction classes
    // ========================================================================

    /// Implied and accumulator: T1 re-reads PC while the operation runs.
    fn op_implied<B: Bus>(&mut self, bus: &mut B) {
        self.read(bus, self.regs.pc);
        let regs = &mut self.regs;
        match self.micro.instruction.mnemonic {
            Mnemonic::Clc => regs.p.clear(C),
            Mnemonic::Sec => regs.p.set(C),
            Mnemonic::Cli => regs.p.clear(I),
            Mnemonic::Sei => regs.p.set(I),
            Mnemonic::Cld => regs.p.clear(D),
            Mnemonic::Sed => regs.p.set(D),
            Mnemonic::Clv => regs.p.clear(V),
            Mnemonic::Tax => regs.load(Register::X, regs.a),
            Mnemonic::Tay => regs.load(Register::Y, regs.a),
            Mnemonic::Txa => regs.load(Register::A, regs.x),
            Mnemonic::Tya => regs.load(Register::A, regs.y),
            Mnemonic::Tsx => regs.load(Register::X, regs.s),
            // TXS is the one transfer that leaves the flags alone
            Mnemonic::Txs => regs.s = regs.x,
            Mnemonic::Inx => regs.load(Register::X, regs.x.wrapping_add(1)),
            Mnemonic::Iny => regs.load(Register::Y, regs.y.wrapping_add(1)),
            Mnemonic::Dex => regs.load(Register::X, regs.x.wrapping_sub(1)),
            Mnemonic::Dey => regs.load(Register::Y, regs.y.wrapping_sub(1)),
            Mnemonic::Asl | Mnemonic::Lsr | Mnemonic::Rol | Mnemonic::Ror => {
                self.regs.a = self.modify(self.regs.a);
            }
            Mnemonic::Nop => {}
            other => unreachable!("{other} is not an implied operation"),
        }
        self.finish();
    }

    fn op_immediate<B: Bus>(&mut self, bus: &mut B) {
        let value = self.fetch_operand(bus);
        self.apply_read(value);
        self.finish();
    }

    /// PHA/PHP - 3 cycles.
    fn op_push<B: Bus>(&mut self, bus: &mut B) {
        match self.micro.t {
            1 => {
                self.read(bus, self.regs.pc);
            }
            2 => {
                let value = if self.micro.instruction.mnemonic == Mnemonic::Php {
                    self.regs.p.to_byte_brk()
                } else {
                    self.regs.a
                };
                let addr = self.regs.push();
                self.write(bus, addr, value);
                self.finish();
            }
            _ => unreachable!(),
        }
    }

    /// PLA/PLP - 4 cycles.
    fn op_pull<B: Bus>(&mut self, bus: &mut B) {
        match self.micro.t {
            1 => {
                self.read(bus, self.regs.pc);
            }
            2 => {
                self.read(bus, self.regs.stack_addr());
            }
            3 => {
                let addr = self.regs.pop();
                let value = self.read(bus, addr);
                if self.micro.instruction.mnemonic == Mnemonic::Plp {
                    self.regs.p = Status::from_byte(value);
                } else {
                    self.regs.load(Register::A, value);
                }
                self.finish();
            }
            _ => unreachable!(),
        }
    }

    /// JSR - 6 cycles. Pushes the address of its own last byte.
    fn op_jsr<B: Bus>(&mut self, bus: &mut B) {
        match self.micro.t {
            1 => {
                self.micro.data = self.fetch_operand(bus);
            }
            2 => {
                self.read(bus, self.regs.stack_addr());
            }
            3 => {
                let [_, pch] = self.regs.pc.to_le_bytes();
                let addr = self.regs.push();
                self.write(bus, addr, pch);
            }
            4 => {
                let [pcl, _] = self.regs.pc.to_le_bytes();
                let addr = self.regs.push();
                self.write(bus, addr, pcl);
            }
            5 => {
                let hi = self.read(bus, self.regs.pc);
                self.regs.pc = u16::from_le_bytes([self.micro.data, hi]);
                self.finish();
            }
            _ => unreachable!(),
        }
    }

    /// RTS - 6 cycles. Pulls the return address and steps past it.
    fn op_rts<B: Bus>(&mut self, bus: &mut B) {
        match self.micro.t {
            1 => {
                self.read(bus, self.regs.pc);
            }
            2 => {
                self.read(bus, self.regs.stack_addr());
            }
            3 => {
                let addr = self.regs.pop();
                self.micro.data = self.read(bus, addr);
            }
            4 => {
                let addr = self.regs.pop();
                let hi = self.read(bus, addr);
                self.regs.pc = u16::from_le_bytes([self.micro.data, hi]);
            }
            5 => {
                self.read(bus, self.regs.pc);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.finish();
            }
            _ => unreachable!(),
        }
    }

    /// RTI - 6 cycles. P first (B dropped, U forced), then PCL, PCH.
    fn op_rti<B: Bus>(&mut self, bus: &mut B) {
        match self.micro.t {
            1 => {
                self.read(bus, self.regs.pc);
            }
            2 => {
                self.read(bus, self.regs.stack_addr());
            }
            3 => {
                let addr = self.regs.pop();
                let p = self.read(bus, addr);
                self.regs.p = Status::from_byte(p);
            }
            4 => {
                let addr = self.regs.pop();
                self.micro.data = self.read(bus, addr);
            }
            5 => {
                let addr = self.regs.pop();
                let hi = self.read(bus, addr);
                self.regs.pc = u16::from_le_bytes([self.micro.data, hi]);
                self.finish();
            }
            _ => unreachable!(),
        }
    }

    /// JMP abs - 3 cycles.
    fn op_jmp_abs<B: Bus>(&mut self, bus: &mut B) {
        match self.micro.t {
            1 => {
                self.micro.data = self.fetch_operand(bus);
            }
            2 => {
                let hi = self.read(bus, self.regs.pc);
                self.regs.pc = u16::from_le_bytes([self.micro.data, hi]);
                self.finish();
            }
            _ => unreachable!(),
        }
    }

    /// JMP (ind) - 5 cycles, with the page-wrap defect on `$xxFF` pointers.
    fn op_jmp_ind<B: Bus>(&mut self, bus: &mut B) {
        match self.micro.t {
            1 => {
                self.micro.addr = u16::from(self.fetch_operand(bus));
            }
            2 => {
                let hi = self.fetch_operand(bus);
                self.micro.addr |= u16::from(hi) << 8;
            }
            3 => {
                self.micro.data = self.read(bus, self.micro.addr);
            }
            4 => {
                let hi = self.read(bus, indirect_high(self.micro.addr));
                self.regs.pc = u16::from_le_bytes([self.micro.data, hi]);
                self.finish();
            }
            _ => unreachable!(),
        }
    }

    /// Branch - 2 cycles not taken, 3 taken, 4 taken across a page.
    fn op_branch<B: Bus>(&mut self, bus: &mut B, taken: bool) {
        match self.micro.t {
            1 => {
                self.micro.data = self.fetch_operand(bus);
                if !taken {
                    self.finish();
                }
            }
            2 => {
                self.read(bus, self.regs.pc);
                let target = branch_target(self.regs.pc, self.micro.data);
                if (target ^ self.regs.pc) & 0xFF00 == 0 {
                    self.regs.pc = target;
                    self.finish();
                } else {
                    // Low byte lands first; the high byte needs one more cycle
                    self.regs.pc = (self.regs.pc & 0xFF00) | (target & 0x00FF);
                    self.micro.addr = target;
                }
            }
            3 => {
                self.read(bus, self.regs.pc);
                self.regs.pc = self.micro.addr;
                self.finish();
            }
            _ => unreachable!(),
        }
    }
}

// ============================================================================
// Trait implementations
// ============================================================================

impl Cpu for Mos6502 {
    type Registers = Registers;

    fn tick<B: Bus>(&mut self, bus: &mut B) -> BusCycle {
        self.execute_cycle(bus)
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Self::Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    fn set_irq_line(&mut self, level: bool) {
        self.lines.set_irq(level);
    }

    fn set_nmi_line(&mut self, level: bool) {
        self.lines.set_nmi(level);
    }

    fn reset(&mut self) {
        self.state = State::Interrupt(Interrupt::Reset);
        self.micro = Microstate::new();
        self.lines.clear_nmi();
        self.fault = None;
    }
}

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        let p = self.regs.p;
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" => Some(self.regs.s.into()),
            "p" => Some(p.bits().into()),
            "flags.c" => Some(p.is_set(C).into()),
            "flags.z" => Some(p.is_set(Z).into()),
            "flags.i" => Some(p.is_set(I).into()),
            "flags.d" => Some(p.is_set(D).into()),
            "flags.v" => Some(p.is_set(V).into()),
            "flags.n" => Some(p.is_set(N).into()),
            "t" => Some(self.micro.t.into()),
            "opcode" => Some(self.micro.opcode.into()),
            "sync" => Some(self.pins.sync.into()),
            "cycles" => Some(self.total_cycles.into()),
            "halted" => Some(self.is_halted().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "a", "x", "y", "s", "p", "flags.c", "flags.z", "flags.i", "flags.d", "flags.v",
            "flags.n", "t", "opcode", "sync", "cycles", "halted",
        ]
    }
}
