//! Byte-serial debug port.
//!
//! The host clocks one byte in per call and gets at most one byte back.
//! A command is an opcode byte followed by a fixed-size big-endian header;
//! replies (ECHO, MEM_READ, VALUE_READ) come out on the following calls,
//! whose input bytes are ignored.
//!
//! | Command         | Header                  | Then                       |
//! |-----------------|-------------------------|----------------------------|
//! | `NOP` 0         |                         |                            |
//! | `ECHO` 1        | byte                    | 1 byte out                 |
//! | `MEM_WRITE` 2   | addr hi/lo, len hi/lo   | `len` bytes in             |
//! | `MEM_READ` 3    | addr hi/lo, len hi/lo   | `len` bytes out            |
//! | `VALUE_WRITE` 4 | id hi/lo, value hi/lo   |                            |
//! | `VALUE_READ` 5  | id hi/lo                | value hi, lo out           |

use std::fmt;

use emu_core::Observable;
use mos_6502::Status;

use crate::Machine;

/// Debug port command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Nop = 0,
    Echo = 1,
    MemWrite = 2,
    MemRead = 3,
    ValueWrite = 4,
    ValueRead = 5,
}

impl Command {
    /// Bytes that follow the command byte before it takes effect.
    #[must_use]
    pub const fn header_len(self) -> u8 {
        match self {
            Self::Nop => 0,
            Self::Echo => 1,
            Self::MemWrite | Self::MemRead | Self::ValueWrite => 4,
            Self::ValueRead => 2,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = ProtocolError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Ok(match byte {
            0 => Self::Nop,
            1 => Self::Echo,
            2 => Self::MemWrite,
            3 => Self::MemRead,
            4 => Self::ValueWrite,
            5 => Self::ValueRead,
            _ => return Err(ProtocolError::UnknownCommand(byte)),
        })
    }
}

/// Named machine values reachable through VALUE_READ / VALUE_WRITE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueId {
    Pc = 0,
    A = 1,
    X = 2,
    Y = 3,
    S = 4,
    P = 5,
    TState = 6,
    Halted = 7,
    /// Low 16 bits of the cycle counter.
    Cycles = 8,
}

impl ValueId {
    /// Observable path on the core.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Pc => "pc",
            Self::A => "a",
            Self::X => "x",
            Self::Y => "y",
            Self::S => "s",
            Self::P => "p",
            Self::TState => "t",
            Self::Halted => "halted",
            Self::Cycles => "cycles",
        }
    }

    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::TState | Self::Halted | Self::Cycles)
    }
}

impl TryFrom<u16> for ValueId {
    type Error = ProtocolError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Ok(match id {
            0 => Self::Pc,
            1 => Self::A,
            2 => Self::X,
            3 => Self::Y,
            4 => Self::S,
            5 => Self::P,
            6 => Self::TState,
            7 => Self::Halted,
            8 => Self::Cycles,
            _ => return Err(ProtocolError::UnknownValue(id)),
        })
    }
}

/// A rejected byte. The port is back in its idle state afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    UnknownCommand(u8),
    UnknownValue(u16),
    ReadOnlyValue(ValueId),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(byte) => write!(f, "unknown debug command ${byte:02X}"),
            Self::UnknownValue(id) => write!(f, "unknown value id {id}"),
            Self::ReadOnlyValue(id) => write!(f, "value {} is read-only", id.path()),
        }
    }
}

impl std::error::Error for ProtocolError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Header {
        command: Command,
        buf: [u8; 4],
        filled: u8,
    },
    Writing {
        address: u16,
        remaining: u16,
    },
    Reading {
        address: u16,
        remaining: u16,
    },
    Reply {
        bytes: [u8; 2],
        len: u8,
        sent: u8,
    },
}

/// Debug port state machine.
#[derive(Debug, Clone)]
pub struct DebugPort {
    state: State,
}

impl Default for DebugPort {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugPort {
    #[must_use]
    pub const fn new() -> Self {
        Self { state: State::Idle }
    }

    /// True between commands.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Clock one byte in; returns the byte clocked out, if any.
    pub fn receive(&mut self, machine: &mut Machine, byte: u8) -> Result<Option<u8>, ProtocolError> {
        let result = self.advance(machine, byte);
        if result.is_err() {
            self.state = State::Idle;
        }
        result
    }

    fn advance(&mut self, machine: &mut Machine, byte: u8) -> Result<Option<u8>, ProtocolError> {
        match self.state {
            State::Idle => {
                let command = Command::try_from(byte)?;
                self.state = if command.header_len() == 0 {
                    State::Idle
                } else {
                    State::Header {
                        command,
                        buf: [0; 4],
                        filled: 0,
                    }
                };
                Ok(None)
            }
            State::Header {
                command,
                mut buf,
                filled,
            } => {
                buf[usize::from(filled)] = byte;
                let filled = filled + 1;
                self.state = if filled == command.header_len() {
                    Self::execute(machine, command, buf)?
                } else {
                    State::Header {
                        command,
                        buf,
                        filled,
                    }
                };
                Ok(None)
            }
            State::Writing { address, remaining } => {
                machine.ram.poke(address, byte);
                self.state = Self::transfer(address.wrapping_add(1), remaining - 1, false);
                Ok(None)
            }
            State::Reading { address, remaining } => {
                let out = machine.ram.peek(address);
                self.state = Self::transfer(address.wrapping_add(1), remaining - 1, true);
                Ok(Some(out))
            }
            State::Reply { bytes, len, sent } => {
                let out = bytes[usize::from(sent)];
                let sent = sent + 1;
                self.state = if sent == len {
                    State::Idle
                } else {
                    State::Reply { bytes, len, sent }
                };
                Ok(Some(out))
            }
        }
    }

    fn transfer(address: u16, remaining: u16, reading: bool) -> State {
        match (remaining, reading) {
            (0, _) => State::Idle,
            (_, true) => State::Reading { address, remaining },
            (_, false) => State::Writing { address, remaining },
        }
    }

    /// Act on a complete header; returns the next state.
    fn execute(machine: &mut Machine, command: Command, buf: [u8; 4]) -> Result<State, ProtocolError> {
        let first = u16::from_be_bytes([buf[0], buf[1]]);
        let second = u16::from_be_bytes([buf[2], buf[3]]);
        Ok(match command {
            Command::Nop => State::Idle,
            Command::Echo => State::Reply {
                bytes: [buf[0], 0],
                len: 1,
                sent: 0,
            },
            Command::MemWrite => Self::transfer(first, second, false),
            Command::MemRead => Self::transfer(first, second, true),
            Command::ValueWrite => {
                write_value(machine, ValueId::try_from(first)?, second)?;
                State::Idle
            }
            Command::ValueRead => State::Reply {
                bytes: read_value(machine, ValueId::try_from(first)?).to_be_bytes(),
                len: 2,
                sent: 0,
            },
        })
    }
}

fn read_value(machine: &Machine, id: ValueId) -> u16 {
    machine
        .cpu
        .query(id.path())
        .and_then(|value| value.as_u16())
        .unwrap_or_default()
}

/// Register writes land directly in the register file.
fn write_value(machine: &mut Machine, id: ValueId, value: u16) -> Result<(), ProtocolError> {
    let regs = &mut machine.cpu.regs;
    let low = value as u8;
    match id {
        ValueId::Pc => regs.pc = value,
        ValueId::A => regs.a = low,
        ValueId::X => regs.x = low,
        ValueId::Y => regs.y = low,
        ValueId::S => regs.s = low,
        ValueId::P => regs.p = Status::from_byte(low),
        ValueId::TState | ValueId::Halted | ValueId::Cycles => {
            return Err(ProtocolError::ReadOnlyValue(id));
        }
    }
    Ok(())
}
