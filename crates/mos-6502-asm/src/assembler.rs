//! Builder-style assembler with two-pass label resolution.
//!
//! Each mnemonic method appends an instruction in its default mode (implied,
//! or accumulator for the shifts and rotates); an operand helper called
//! straight after it picks the real addressing mode. Pass one lays every item
//! out and fixes the [`SymbolTable`]; pass two encodes against that table, so
//! forward references need no patching.

use emu_core::Bus;
use mos_6502::addressing::branch_target;
use mos_6502::opcodes;
use mos_6502::{AddressingMode, Mnemonic};

use crate::{AsmError, SymbolTable};

/// An address or value, given directly or by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Value(u16),
    Label(String),
}

impl From<u16> for Operand {
    fn from(value: u16) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Operand {
    fn from(name: &str) -> Self {
        Self::Label(name.to_string())
    }
}

impl From<String> for Operand {
    fn from(name: String) -> Self {
        Self::Label(name)
    }
}

#[derive(Debug, Clone)]
enum Item {
    Org(u16),
    Label(String),
    Byte(u8),
    Word(Operand),
    Instruction {
        mnemonic: Mnemonic,
        mode: AddressingMode,
        operand: Option<Operand>,
    },
}

/// Contiguous bytes starting at `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub origin: u16,
    pub bytes: Vec<u8>,
}

impl Segment {
    /// Copy the bytes onto the bus, wrapping at the top of memory.
    pub fn write_to(&self, bus: &mut impl Bus) {
        let mut address = self.origin;
        for &byte in &self.bytes {
            bus.write(address, byte);
            address = address.wrapping_add(1);
        }
    }

    /// First address past the segment.
    #[must_use]
    pub fn end(&self) -> u16 {
        self.origin.wrapping_add(self.bytes.len() as u16)
    }
}

/// Assembled output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    segments: Vec<Segment>,
    symbols: SymbolTable,
}

impl Program {
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Address a label resolved to.
    #[must_use]
    pub fn label(&self, name: &str) -> Option<u16> {
        self.symbols.get(name)
    }

    /// Load every segment in order; later segments win on overlap.
    pub fn write_to(&self, bus: &mut impl Bus) {
        for segment in &self.segments {
            segment.write_to(bus);
        }
    }
}

/// Program builder.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    items: Vec<Item>,
    /// First misuse of the builder, reported by `build`.
    error: Option<AsmError>,
}

impl Assembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue assembling at `address`.
    pub fn org(&mut self, address: u16) -> &mut Self {
        self.items.push(Item::Org(address));
        self
    }

    /// Name the current address.
    pub fn label(&mut self, name: &str) -> &mut Self {
        self.items.push(Item::Label(name.to_string()));
        self
    }

    pub fn byte(&mut self, value: u8) -> &mut Self {
        self.items.push(Item::Byte(value));
        self
    }

    pub fn bytes(&mut self, values: &[u8]) -> &mut Self {
        self.items.extend(values.iter().copied().map(Item::Byte));
        self
    }

    /// Little-endian 16-bit value, e.g. a vector.
    pub fn word(&mut self, value: impl Into<Operand>) -> &mut Self {
        self.items.push(Item::Word(value.into()));
        self
    }

    /// Append `mnemonic` in its default mode.
    pub fn instruction(&mut self, mnemonic: Mnemonic) -> &mut Self {
        let mode = match mnemonic {
            Mnemonic::Asl | Mnemonic::Lsr | Mnemonic::Rol | Mnemonic::Ror => {
                AddressingMode::Accumulator
            }
            _ => AddressingMode::Implied,
        };
        self.items.push(Item::Instruction {
            mnemonic,
            mode,
            operand: None,
        });
        self
    }

    // ------------------------------------------------------------------
    // Operand helpers
    // ------------------------------------------------------------------

    pub fn implied(&mut self) -> &mut Self {
        self.operand(AddressingMode::Implied, None)
    }

    pub fn accumulator(&mut self) -> &mut Self {
        self.operand(AddressingMode::Accumulator, None)
    }

    pub fn immediate(&mut self, value: u8) -> &mut Self {
        self.operand(AddressingMode::Immediate, Some(u16::from(value).into()))
    }

    pub fn zero_page(&mut self, address: u8) -> &mut Self {
        self.operand(AddressingMode::ZeroPage, Some(u16::from(address).into()))
    }

    pub fn zero_page_x(&mut self, address: u8) -> &mut Self {
        self.operand(AddressingMode::ZeroPageX, Some(u16::from(address).into()))
    }

    pub fn zero_page_y(&mut self, address: u8) -> &mut Self {
        self.operand(AddressingMode::ZeroPageY, Some(u16::from(address).into()))
    }

    pub fn absolute(&mut self, address: impl Into<Operand>) -> &mut Self {
        self.operand(AddressingMode::Absolute, Some(address.into()))
    }

    pub fn absolute_x(&mut self, address: impl Into<Operand>) -> &mut Self {
        self.operand(AddressingMode::AbsoluteX, Some(address.into()))
    }

    pub fn absolute_y(&mut self, address: impl Into<Operand>) -> &mut Self {
        self.operand(AddressingMode::AbsoluteY, Some(address.into()))
    }

    /// `JMP (pointer)`.
    pub fn indirect(&mut self, pointer: impl Into<Operand>) -> &mut Self {
        self.operand(AddressingMode::Indirect, Some(pointer.into()))
    }

    /// `(zp,X)`.
    pub fn indexed_indirect(&mut self, pointer: u8) -> &mut Self {
        self.operand(AddressingMode::IndexedIndirect, Some(u16::from(pointer).into()))
    }

    /// `(zp),Y`.
    pub fn indirect_indexed(&mut self, pointer: u8) -> &mut Self {
        self.operand(AddressingMode::IndirectIndexed, Some(u16::from(pointer).into()))
    }

    /// Branch to an absolute target; the displacement is computed at build.
    pub fn relative(&mut self, target: impl Into<Operand>) -> &mut Self {
        self.operand(AddressingMode::Relative, Some(target.into()))
    }

    fn operand(&mut self, new_mode: AddressingMode, value: Option<Operand>) -> &mut Self {
        match self.items.last_mut() {
            Some(Item::Instruction { mode, operand, .. }) => {
                *mode = new_mode;
                *operand = value;
            }
            _ if self.error.is_none() => self.error = Some(AsmError::MissingInstruction),
            _ => {}
        }
        self
    }

    // ------------------------------------------------------------------
    // Passes
    // ------------------------------------------------------------------

    /// Assemble into segments.
    pub fn build(&self) -> Result<Program, AsmError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let symbols = self.layout()?;
        let segments = self.encode(&symbols)?;
        Ok(Program { segments, symbols })
    }

    /// Pass one: address every item and collect labels.
    fn layout(&self) -> Result<SymbolTable, AsmError> {
        let mut symbols = SymbolTable::new();
        let mut pc: u16 = 0;
        for item in &self.items {
            match item {
                Item::Org(address) => pc = *address,
                Item::Label(name) => symbols.define(name, pc)?,
                Item::Byte(_) => pc = pc.wrapping_add(1),
                Item::Word(_) => pc = pc.wrapping_add(2),
                Item::Instruction { mnemonic, mode, .. } => {
                    opcode_for(*mnemonic, *mode)?;
                    pc = pc.wrapping_add(1 + u16::from(mode.operand_bytes()));
                }
            }
        }
        Ok(symbols)
    }

    /// Pass two: emit bytes against the finished symbol table.
    fn encode(&self, symbols: &SymbolTable) -> Result<Vec<Segment>, AsmError> {
        let mut segments = Vec::new();
        let mut current = Segment {
            origin: 0,
            bytes: Vec::new(),
        };

        for item in &self.items {
            match item {
                Item::Org(address) => {
                    let next = Segment {
                        origin: *address,
                        bytes: Vec::new(),
                    };
                    let done = std::mem::replace(&mut current, next);
                    if !done.bytes.is_empty() {
                        segments.push(done);
                    }
                }
                Item::Label(_) => {}
                Item::Byte(value) => current.bytes.push(*value),
                Item::Word(operand) => {
                    let value = resolve(operand, symbols)?;
                    current.bytes.extend_from_slice(&value.to_le_bytes());
                }
                Item::Instruction {
                    mnemonic,
                    mode,
                    operand,
                } => {
                    let pc = current.end();
                    current.bytes.push(opcode_for(*mnemonic, *mode)?);
                    let value = match operand {
                        Some(operand) => resolve(operand, symbols)?,
                        None => 0,
                    };
                    let [lo, hi] = value.to_le_bytes();
                    match mode.operand_bytes() {
                        0 => {}
                        1 if *mode == AddressingMode::Relative => {
                            current.bytes.push(displacement(pc, value)?);
                        }
                        1 => current.bytes.push(lo),
                        _ => current.bytes.extend_from_slice(&[lo, hi]),
                    }
                }
            }
        }
        if !current.bytes.is_empty() {
            segments.push(current);
        }
        Ok(segments)
    }
}

fn opcode_for(mnemonic: Mnemonic, mode: AddressingMode) -> Result<u8, AsmError> {
    opcodes::encode(mnemonic, mode).ok_or(AsmError::UnsupportedMode { mnemonic, mode })
}

fn resolve(operand: &Operand, symbols: &SymbolTable) -> Result<u16, AsmError> {
    match operand {
        Operand::Value(value) => Ok(*value),
        Operand::Label(name) => symbols.resolve(name),
    }
}

/// Signed offset from the instruction after a branch at `pc` to `target`.
fn displacement(pc: u16, target: u16) -> Result<u8, AsmError> {
    let next = pc.wrapping_add(2);
    let offset = target.wrapping_sub(next) as i16;
    let byte = i8::try_from(offset).map_err(|_| AsmError::BranchOutOfRange {
        from: pc,
        to: target,
    })? as u8;
    debug_assert_eq!(branch_target(next, byte), target);
    Ok(byte)
}

macro_rules! mnemonic_methods {
    ($($method:ident => $mnemonic:ident),* $(,)?) => {
        impl Assembler {
            $(
                #[doc = concat!("Append `", stringify!($mnemonic), "`.")]
                pub fn $method(&mut self) -> &mut Self {
                    self.instruction(Mnemonic::$mnemonic)
                }
            )*
        }
    };
}

impl Assembler {
    /// Append `BRK` as a single byte.
    ///
    /// The core returns from a BRK handler to BRK + 2, so the byte after
    /// `BRK` is skipped. Follow it with `.byte(..)` padding; an instruction
    /// placed there never runs.
    pub fn brk(&mut self) -> &mut Self {
        self.instruction(Mnemonic::Brk)
    }
}

mnemonic_methods! {
    adc => Adc, and => And, asl => Asl, bcc => Bcc, bcs => Bcs, beq => Beq,
    bit => Bit, bmi => Bmi, bne => Bne, bpl => Bpl, bvc => Bvc,
    bvs => Bvs, clc => Clc, cld => Cld, cli => Cli, clv => Clv, cmp => Cmp,
    cpx => Cpx, cpy => Cpy, dec => Dec, dex => Dex, dey => Dey, eor => Eor,
    inc => Inc, inx => Inx, iny => Iny, jmp => Jmp, jsr => Jsr, lda => Lda,
    ldx => Ldx, ldy => Ldy, lsr => Lsr, nop => Nop, ora => Ora, pha => Pha,
    php => Php, pla => Pla, plp => Plp, rol => Rol, ror => Ror, rti => Rti,
    rts => Rts, sbc => Sbc, sec => Sec, sed => Sed, sei => Sei, sta => Sta,
    stx => Stx, sty => Sty, tax => Tax, tay => Tay, tsx => Tsx, txa => Txa,
    txs => Txs, tya => Tya,
}
