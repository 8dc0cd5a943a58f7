//! Decoder tests over assembled byte streams

use fieldscript_foundation::{DecodeError, VarBank};
use fieldscript_language::opcode::{codes, encode_word};
use fieldscript_language::{
    BinaryOp, Decoder, DecoderConfig, Expr, Instruction, ScriptWriter, decode_program,
};

fn words(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

#[test]
fn bare_instruction_needs_no_pushes() {
    let program = decode_program("door", &words(&[encode_word(codes::THROUGHON, 0)])).unwrap();
    assert_eq!(program.len(), 1);
    assert_eq!(program.get(0), Some(&Instruction::ThroughOn));
}

#[test]
fn placeholder_keeps_its_operand() {
    let bytes = words(&[
        encode_word(codes::PSHN_L, 5),
        encode_word(codes::UNKNOWN4, 0),
    ]);
    let program = decode_program("mystery", &bytes).unwrap();
    assert_eq!(program.len(), 1);
    match program.get(0).unwrap() {
        Instruction::Placeholder { args, .. } => assert_eq!(args, &vec![Expr::Constant(5)]),
        other => panic!("expected placeholder, got {other}"),
    }
    assert_eq!(program.get(0).unwrap().to_string(), "UNKNOWN4(arg0: 5)");
}

#[test]
fn placeholder_without_operand_underflows() {
    let err = decode_program("broken", &words(&[encode_word(codes::UNKNOWN4, 0)])).unwrap_err();
    assert_eq!(
        err,
        DecodeError::StackUnderflow {
            offset: 0,
            mnemonic: "UNKNOWN4",
            arity: 1,
            available: 0,
        }
    );
}

#[test]
fn groups_start_at_their_first_push() {
    let mut w = ScriptWriter::new();
    w.push_const(2)
        .push_const(9)
        .op(codes::MESW, 0)
        .op(codes::THROUGHOFF, 0);
    let program = decode_program("talk", &w.finish().unwrap()).unwrap();
    assert_eq!(program.offset_of(0), Some(0));
    assert_eq!(program.offset_of(1), Some(12));
    assert_eq!(program.end_offset(), 16);
    assert_eq!(
        program.get(0),
        Some(&Instruction::Mesw {
            channel: Expr::Constant(2),
            message: Expr::Constant(9),
        })
    );
}

#[test]
fn wide_literals_take_the_next_word() {
    let mut w = ScriptWriter::new();
    w.push_const(100_000).op(codes::POPM_L, 0);
    let bytes = w.finish().unwrap();
    assert_eq!(bytes.len(), 12);
    let program = decode_program("wide", &bytes).unwrap();
    match program.get(0).unwrap() {
        Instruction::PopMem { var, value } => {
            assert_eq!(var.bank, VarBank::Long);
            assert_eq!(value, &Expr::Constant(100_000));
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn operators_build_trees() {
    let mut w = ScriptWriter::new();
    w.push_var(VarBank::Byte, 0)
        .push_const(1)
        .binary(BinaryOp::Sub)
        .op(codes::POPM_B, 0);
    let program = decode_program("dec", &w.finish().unwrap()).unwrap();
    let Instruction::PopMem { value, .. } = program.get(0).unwrap() else {
        panic!("expected a store");
    };
    assert_eq!(
        value,
        &Expr::binary(
            BinaryOp::Sub,
            Expr::var(VarBank::Byte, 0),
            Expr::Constant(1)
        )
    );
}

#[test]
fn malformed_streams() {
    assert!(matches!(
        decode_program("short", &[0x27, 0x00, 0x00]),
        Err(DecodeError::Truncated { offset: 0, .. })
    ));
    assert!(matches!(
        decode_program("wide", &words(&[encode_word(codes::PSHN_X, 0)])),
        Err(DecodeError::Truncated { .. })
    ));
    assert!(matches!(
        decode_program("bogus", &words(&[0x7FFF_0000])),
        Err(DecodeError::UnknownOpcode { opcode: 0x7FFF, .. })
    ));
    assert!(matches!(
        decode_program(
            "op",
            &words(&[
                encode_word(codes::PSHN_L, 1),
                encode_word(codes::PSHN_L, 1),
                encode_word(codes::CAL, 99),
            ])
        ),
        Err(DecodeError::UnknownOperator { operator: 99, .. })
    ));
    assert!(matches!(
        decode_program("dangling", &words(&[encode_word(codes::PSHN_L, 1)])),
        Err(DecodeError::DanglingOperands { depth: 1 })
    ));
}

#[test]
fn leftover_operands_are_rejected_unless_lenient() {
    let bytes = words(&[
        encode_word(codes::PSHN_L, 1),
        encode_word(codes::PSHN_L, 2),
        encode_word(codes::WAIT, 0),
        encode_word(codes::WAIT, 0),
    ]);
    assert!(matches!(
        decode_program("extra", &bytes),
        Err(DecodeError::StackImbalance { .. })
    ));

    let lenient = Decoder::new(DecoderConfig::default().with_strict_balance(false));
    let program = lenient.decode("extra", &bytes).unwrap();
    assert_eq!(program.len(), 2);
    assert_eq!(
        program.get(1),
        Some(&Instruction::Wait {
            frames: Expr::Constant(1)
        })
    );
}

#[test]
fn stack_depth_is_bounded() {
    let decoder = Decoder::new(DecoderConfig::default().with_max_stack_depth(2));
    let bytes = words(&[encode_word(codes::PSHN_L, 1); 3]);
    assert!(matches!(
        decoder.decode("deep", &bytes),
        Err(DecodeError::StackOverflow { limit: 2, .. })
    ));
}

#[test]
fn decoding_is_deterministic() {
    let mut w = ScriptWriter::new();
    w.label("top")
        .push_var(VarBank::Flag, 3)
        .jpf("top")
        .op(codes::HALT, 0);
    let bytes = w.finish().unwrap();
    let a = decode_program("a", &bytes).unwrap();
    let b = decode_program("a", &bytes).unwrap();
    assert_eq!(a, b);
    let render = |p: &fieldscript_language::Program| {
        p.iter().map(|(_, i)| i.to_string()).collect::<Vec<_>>()
    };
    assert_eq!(render(&a), render(&b));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn bare_opcodes_decode_one_instruction_per_word(
            ops in prop::collection::vec(
                prop::sample::select(vec![codes::NOP, codes::THROUGHON, codes::THROUGHOFF, codes::HALT]),
                1..64,
            )
        ) {
            let encoded: Vec<u32> = ops.iter().map(|&op| encode_word(op, 0)).collect();
            let program = decode_program("bare", &words(&encoded)).unwrap();
            prop_assert_eq!(program.len(), ops.len());
            prop_assert_eq!(program.end_offset(), ops.len() * 4);
        }
    }
}
