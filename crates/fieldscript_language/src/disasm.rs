//! Disassembly listings.
//!
//! # Example
//!
//! ```
//! use fieldscript_language::{decode_program, disasm::listing, writer::ScriptWriter};
//! use fieldscript_language::opcode::codes;
//!
//! let mut w = ScriptWriter::new();
//! w.push_const(5).op(codes::UNKNOWN4, 0);
//! let program = decode_program("npc", &w.finish().unwrap()).unwrap();
//! assert_eq!(listing(&program), "0x0000  [0]  UNKNOWN4(arg0: 5)\n");
//! ```

use std::fmt::Write;

use crate::instruction::Instruction;
use crate::program::Program;

/// Formats one listing line.
#[must_use]
pub fn line(offset: usize, index: usize, instruction: &Instruction) -> String {
    format!("{offset:#06x}  [{index}]  {instruction}")
}

/// Renders every instruction of a program, one per line.
#[must_use]
pub fn listing(program: &Program) -> String {
    let mut out = String::new();
    for (index, (offset, instruction)) in program.iter().enumerate() {
        let _ = writeln!(out, "{}", line(offset, index, instruction));
    }
    out
}

/// Renders a program with a header naming it.
///
/// Programs holding placeholder opcodes get a second header line saying so.
#[must_use]
pub fn listing_with_header(program: &Program) -> String {
    let mut out = format!(
        "; {} ({} instructions, {} bytes)\n",
        program.name(),
        program.len(),
        program.end_offset()
    );
    if program.has_placeholders() {
        out.push_str("; has placeholder opcodes with no effect\n");
    }
    out.push_str(&listing(program));
    out
}
