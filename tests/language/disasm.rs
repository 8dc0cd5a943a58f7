//! Listing tests

use fieldscript_language::opcode::codes;
use fieldscript_language::{ScriptWriter, decode_program, disasm};

#[test]
fn listing_shows_offsets_and_indices() {
    let mut w = ScriptWriter::new();
    w.push_const(5)
        .op(codes::UNKNOWN4, 0)
        .op(codes::THROUGHON, 0);
    let program = decode_program("mystery", &w.finish().unwrap()).unwrap();
    let listing = disasm::listing(&program);
    let lines: Vec<_> = listing.lines().collect();
    assert_eq!(
        lines,
        vec![
            "0x0000  [0]  UNKNOWN4(arg0: 5)",
            "0x0008  [1]  THROUGHON()",
        ]
    );
}

#[test]
fn header_counts_instructions_and_bytes() {
    let mut w = ScriptWriter::new();
    w.op(codes::NOP, 0).op(codes::HALT, 0);
    let program = decode_program("tiny", &w.finish().unwrap()).unwrap();
    let listing = disasm::listing_with_header(&program);
    assert!(listing.starts_with("; tiny (2 instructions, 8 bytes)\n"));
}

#[test]
fn header_notes_placeholder_opcodes() {
    let mut w = ScriptWriter::new();
    w.push_const(5).op(codes::UNKNOWN4, 0);
    let program = decode_program("mystery", &w.finish().unwrap()).unwrap();
    let listing = disasm::listing_with_header(&program);
    let lines: Vec<_> = listing.lines().take(3).collect();
    assert_eq!(
        lines,
        vec![
            "; mystery (1 instructions, 8 bytes)",
            "; has placeholder opcodes with no effect",
            "0x0000  [0]  UNKNOWN4(arg0: 5)",
        ]
    );

    let mut w = ScriptWriter::new();
    w.op(codes::THROUGHON, 0);
    let plain = decode_program("door", &w.finish().unwrap()).unwrap();
    assert!(!disasm::listing_with_header(&plain).contains("placeholder"));
}
