//! Assembler and disassembler for the NMOS 6502.
//!
//! Programs are built in code rather than parsed from text:
//!
//! ```
//! use mos_6502_asm::Assembler;
//!
//! let program = Assembler::new()
//!     .org(0x0200)
//!     .label("loop")
//!     .inx()
//!     .bne().relative("loop")
//!     .build()
//!     .expect("assembles");
//! assert_eq!(program.segments()[0].bytes, [0xE8, 0xD0, 0xFD]);
//! ```
//!
//! Both directions go through the core's opcode table, so anything the
//! assembler emits the core decodes, and anything the core decodes the
//! disassembler prints.

mod assembler;
mod disassembler;
mod error;
mod symbols;

pub use assembler::{Assembler, Operand, Program, Segment};
pub use disassembler::{Decoded, Disassembly, decode, disassemble};
pub use error::{AsmError, DecodeError};
pub use symbols::SymbolTable;
