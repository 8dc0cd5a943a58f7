//! The four reference scenarios, run through a session

use fieldscript_foundation::{DecodeError, ErrorKind, RuntimeFault, VarBank};
use fieldscript_language::opcode::codes;
use fieldscript_language::{Expr, Instruction, ScriptWriter};
use fieldscript_runtime::Session;

#[test]
fn passability_toggle_without_operands() {
    let mut session = Session::new(0);
    let bytes = ScriptWriter::new().op(codes::THROUGHON, 0).finish().unwrap();
    let program = session.load_script("door", bytes).unwrap();
    assert_eq!(program.len(), 1);

    let gate = session.create_entity("gate");
    assert!(!session.field().is_passable(gate).unwrap());
    let id = session.spawn("door", gate).unwrap();
    let report = session.tick();

    assert_eq!(report.halted(), vec![id]);
    assert!(session.field().is_passable(gate).unwrap());
}

#[test]
fn placeholder_keeps_alignment_and_changes_nothing() {
    let mut session = Session::new(0);
    let bytes = ScriptWriter::new()
        .label("top")
        .push_const(5)
        .op(codes::UNKNOWN4, 0)
        .push_const(1)
        .op(codes::WAIT, 0)
        .jmp("top")
        .finish()
        .unwrap();
    let program = session.load_script("stub", bytes).unwrap();
    assert_eq!(
        program.get(0),
        Some(&Instruction::Placeholder {
            opcode: codes::UNKNOWN4,
            mnemonic: "UNKNOWN4",
            args: vec![Expr::Constant(5)],
        })
    );
    assert!(session.disassemble("stub").unwrap().contains("UNKNOWN4(arg0: 5)"));

    let npc = session.create_entity("npc");
    let before = session.field().clone();
    session.spawn("stub", npc).unwrap();
    let reports = session.run(12);

    assert!(reports.iter().all(|r| r.faulted().is_empty()));
    assert_eq!(session.field().memory(), before.memory());
    assert_eq!(session.field().entities(), before.entities());
}

#[test]
fn underflowing_script_is_never_registered() {
    let mut session = Session::new(0);
    let bytes = ScriptWriter::new().op(codes::UNKNOWN4, 0).finish().unwrap();

    let err = session.load_script("broken", bytes).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::Decode(DecodeError::StackUnderflow {
            offset: 0,
            arity: 1,
            available: 0,
            ..
        })
    ));
    assert_eq!(err.context.and_then(|c| c.source), Some("broken".to_string()));

    assert!(session.program("broken").is_none());
    let npc = session.create_entity("npc");
    let err = session.spawn("broken", npc).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownScript(_)));
    assert!(session.scheduler().is_empty());
}

#[test]
fn bad_jump_faults_one_instance_only() {
    let mut session = Session::new(0);
    let wild = ScriptWriter::new()
        .op(codes::NOP, 0)
        .op(codes::JMP, 40)
        .finish()
        .unwrap();
    let tidy = ScriptWriter::new()
        .push_const(9)
        .op(codes::POPM_B, 3)
        .op(codes::HALT, 0)
        .finish()
        .unwrap();
    session.load_script("wild", wild).unwrap();
    session.load_script("tidy", tidy).unwrap();

    let npc = session.create_entity("npc");
    let bad = session.spawn("wild", npc).unwrap();
    let good = session.spawn("tidy", npc).unwrap();
    let report = session.tick();

    assert_eq!(
        report.faulted(),
        vec![(bad, &RuntimeFault::UnresolvedJump { target: 164 })]
    );
    assert_eq!(report.halted(), vec![good]);
    assert_eq!(session.field().read(VarBank::Byte, 3).unwrap(), 9);
}
