//! VM tests over decoded programs

use fieldscript_foundation::{RuntimeFault, VarBank};
use fieldscript_language::opcode::codes;
use fieldscript_language::{
    BinaryOp, Cursor, ScriptWriter, Step, SuspendReason, Vm, decode_program,
};
use fieldscript_storage::FieldState;

fn run_to_end(bytes: &[u8], field: &mut FieldState) -> Result<Step, RuntimeFault> {
    let program = decode_program("test", bytes).unwrap();
    let owner = field.spawn_entity("owner");
    let mut cursor = Cursor::new();
    Vm::new()
        .run(&program, &mut cursor, owner, field, 10_000)
        .map(|(step, _)| step)
}

#[test]
fn through_on_makes_owner_passable() {
    let mut w = ScriptWriter::new();
    w.op(codes::THROUGHON, 0);
    let program = decode_program("door", &w.finish().unwrap()).unwrap();
    let mut field = FieldState::new(0);
    let owner = field.spawn_entity("door");
    let mut cursor = Cursor::new();

    let step = Vm::new().step(&program, &mut cursor, owner, &mut field).unwrap();
    assert_eq!(step, Step::Continue);
    assert!(field.is_passable(owner).unwrap());
    assert_eq!(
        Vm::new().step(&program, &mut cursor, owner, &mut field).unwrap(),
        Step::Halt
    );
}

#[test]
fn loop_sums_into_memory() {
    // word[0] = sum of 1..=10, counter in byte[2]
    let mut w = ScriptWriter::new();
    w.label("top")
        .push_var(VarBank::Byte, 2)
        .push_const(10)
        .binary(BinaryOp::Lt)
        .jpf("end")
        .push_var(VarBank::Byte, 2)
        .push_const(1)
        .binary(BinaryOp::Add)
        .op(codes::POPM_B, 2)
        .push_var(VarBank::Word, 0)
        .push_var(VarBank::Byte, 2)
        .binary(BinaryOp::Add)
        .op(codes::POPM_W, 0)
        .jmp("top")
        .label("end")
        .op(codes::HALT, 0);
    let mut field = FieldState::new(0);
    let step = run_to_end(&w.finish().unwrap(), &mut field).unwrap();
    assert_eq!(step, Step::Halt);
    assert_eq!(field.read(VarBank::Word, 0).unwrap(), 55);
}

#[test]
fn subroutines_return_to_caller() {
    let mut w = ScriptWriter::new();
    w.call("bump")
        .call("bump")
        .op(codes::HALT, 0)
        .label("bump")
        .push_var(VarBank::Byte, 0)
        .push_const(3)
        .binary(BinaryOp::Add)
        .op(codes::POPM_B, 0)
        .op(codes::RET, 0);
    let mut field = FieldState::new(0);
    run_to_end(&w.finish().unwrap(), &mut field).unwrap();
    assert_eq!(field.read(VarBank::Byte, 0).unwrap(), 6);
}

#[test]
fn temps_are_per_cursor() {
    let mut w = ScriptWriter::new();
    w.push_const(41)
        .op(codes::POPI_L, 1)
        .push_var(VarBank::Temp, 1)
        .push_const(1)
        .binary(BinaryOp::Add)
        .op(codes::POPM_B, 0);
    let mut field = FieldState::new(0);
    run_to_end(&w.finish().unwrap(), &mut field).unwrap();
    assert_eq!(field.read(VarBank::Byte, 0).unwrap(), 42);
}

#[test]
fn blocking_instructions_suspend_after_advancing() {
    let mut w = ScriptWriter::new();
    w.push_const(0)
        .push_const(12)
        .op(codes::MESW, 0)
        .op(codes::ANIME, 4)
        .op(codes::HALT, 0);
    let program = decode_program("talk", &w.finish().unwrap()).unwrap();
    let mut field = FieldState::new(0);
    let owner = field.spawn_entity("npc");
    let mut cursor = Cursor::new();
    let vm = Vm::new();

    let (step, executed) = vm.run(&program, &mut cursor, owner, &mut field, 100).unwrap();
    assert_eq!(
        step,
        Step::Suspend(SuspendReason::Dialogue {
            channel: 0,
            message: 12
        })
    );
    assert_eq!(executed, 1);
    assert_eq!(cursor.pc(), 1);

    let (step, _) = vm.run(&program, &mut cursor, owner, &mut field, 100).unwrap();
    assert_eq!(
        step,
        Step::Suspend(SuspendReason::Animation {
            entity: owner,
            animation: 4
        })
    );
}

#[test]
fn runtime_faults() {
    let mut field = FieldState::new(0);

    let mut w = ScriptWriter::new();
    w.push_const(1).push_const(0).binary(BinaryOp::Div).op(codes::POPM_B, 0);
    assert_eq!(
        run_to_end(&w.finish().unwrap(), &mut field),
        Err(RuntimeFault::DivisionByZero)
    );

    let mut w = ScriptWriter::new();
    w.op(codes::RET, 0);
    assert_eq!(
        run_to_end(&w.finish().unwrap(), &mut field),
        Err(RuntimeFault::CallStackUnderflow)
    );

    let mut w = ScriptWriter::new();
    w.op(codes::NOP, 0).op(codes::JMP, 25);
    assert_eq!(
        run_to_end(&w.finish().unwrap(), &mut field),
        Err(RuntimeFault::UnresolvedJump { target: 104 })
    );
}

#[test]
fn arithmetic_wraps() {
    let mut w = ScriptWriter::new();
    w.push_const(i32::MAX)
        .push_const(1)
        .binary(BinaryOp::Add)
        .op(codes::POPM_L, 0);
    let mut field = FieldState::new(0);
    run_to_end(&w.finish().unwrap(), &mut field).unwrap();
    assert_eq!(field.read(VarBank::Long, 0).unwrap(), i32::MIN);
}
