//! Scheduler ordering, quota and lifecycle tests

use std::sync::Arc;

use fieldscript_engine::{ExecState, Scheduler, SchedulerConfig, SchedulerEvent};
use fieldscript_foundation::{ErrorKind, RuntimeFault, VarBank};
use fieldscript_language::opcode::codes;
use fieldscript_language::{BinaryOp, Program, ScriptWriter, decode_program};
use fieldscript_storage::FieldState;

fn program(name: &str, w: &ScriptWriter) -> Arc<Program> {
    Arc::new(decode_program(name, &w.finish().unwrap()).unwrap())
}

/// `byte[0] = byte[0] * 10 + digit`, so the final value spells the run order.
fn stamp(digit: i32) -> ScriptWriter {
    let mut w = ScriptWriter::new();
    w.push_var(VarBank::Byte, 0)
        .push_const(10)
        .binary(BinaryOp::Mul)
        .push_const(digit)
        .binary(BinaryOp::Add)
        .op(codes::POPM_B, 0);
    w
}

#[test]
fn instances_run_in_registration_order() {
    let first = stamp(1);
    let second = stamp(2);

    let mut field = FieldState::new(0);
    let owner = field.spawn_entity("npc");
    let mut scheduler = Scheduler::new(SchedulerConfig::default());
    let a = scheduler.spawn(program("first", &first), owner);
    let b = scheduler.spawn(program("second", &second), owner);

    let report = scheduler.tick(&mut field);
    assert_eq!(report.halted(), vec![a, b]);
    assert_eq!(field.read(VarBank::Byte, 0).unwrap(), 12);
}

#[test]
fn quota_carries_over_between_ticks() {
    let mut w = ScriptWriter::new();
    for _ in 0..10 {
        w.push_var(VarBank::Byte, 0)
            .push_const(1)
            .binary(BinaryOp::Add)
            .op(codes::POPM_B, 0);
    }
    let mut field = FieldState::new(0);
    let owner = field.spawn_entity("npc");
    let mut scheduler = Scheduler::new(SchedulerConfig::new().with_instruction_quota(4));
    let id = scheduler.spawn(program("count", &w), owner);

    let report = scheduler.tick(&mut field);
    assert_eq!(report.executed, 4);
    assert!(report.events.contains(&SchedulerEvent::QuotaExhausted { instance: id }));
    assert_eq!(field.read(VarBank::Byte, 0).unwrap(), 4);
    assert_eq!(scheduler.state(id), Some(&ExecState::Running));

    scheduler.tick(&mut field);
    let report = scheduler.tick(&mut field);
    assert_eq!(report.halted(), vec![id]);
    assert_eq!(field.read(VarBank::Byte, 0).unwrap(), 10);
}

#[test]
fn infinite_loop_does_not_starve_others() {
    let mut spin = ScriptWriter::new();
    spin.label("top").jmp("top");
    let mut door = ScriptWriter::new();
    door.op(codes::THROUGHON, 0);

    let mut field = FieldState::new(0);
    let npc = field.spawn_entity("npc");
    let gate = field.spawn_entity("gate");
    let mut scheduler = Scheduler::new(SchedulerConfig::new().with_instruction_quota(32));
    scheduler.spawn(program("spin", &spin), npc);
    let opener = scheduler.spawn(program("door", &door), gate);

    let report = scheduler.tick(&mut field);
    assert_eq!(report.halted(), vec![opener]);
    assert!(field.is_passable(gate).unwrap());
}

#[test]
fn call_depth_is_configurable() {
    let mut w = ScriptWriter::new();
    w.label("down").call("down");
    let mut field = FieldState::new(0);
    let owner = field.spawn_entity("npc");
    let mut scheduler = Scheduler::new(SchedulerConfig::new().with_max_call_depth(3));
    let id = scheduler.spawn(program("recurse", &w), owner);

    let report = scheduler.tick(&mut field);
    assert_eq!(
        report.faulted(),
        vec![(id, &RuntimeFault::CallStackOverflow { limit: 3 })]
    );
}

#[test]
fn cancel_and_reap() {
    let mut w = ScriptWriter::new();
    w.push_const(9).op(codes::WAIT, 0);
    let waiting = program("wait", &w);
    let mut done = ScriptWriter::new();
    done.op(codes::HALT, 0);
    let done = program("done", &done);

    let mut field = FieldState::new(0);
    let npc = field.spawn_entity("npc");
    let other = field.spawn_entity("other");
    let mut scheduler = Scheduler::new(SchedulerConfig::default());
    let a = scheduler.spawn(Arc::clone(&waiting), npc);
    let b = scheduler.spawn(Arc::clone(&waiting), other);
    let c = scheduler.spawn(done, other);
    scheduler.tick(&mut field);

    let reaped: Vec<_> = scheduler.reap().iter().map(|i| i.id()).collect();
    assert_eq!(reaped, vec![c]);
    assert_eq!(scheduler.cancel_owned_by(other), vec![b]);
    assert_eq!(scheduler.cancel(a).unwrap().id(), a);
    assert!(scheduler.is_empty());

    let err = scheduler.cancel(a).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownInstance(_)));
}

#[test]
fn snapshot_restore_round_trip() {
    let mut w = ScriptWriter::new();
    w.push_const(1).op(codes::POPI_L, 0).push_const(3).op(codes::WAIT, 0);
    let wait = program("wait", &w);

    let mut field = FieldState::new(0);
    let owner = field.spawn_entity("npc");
    let mut scheduler = Scheduler::new(SchedulerConfig::default());
    let id = scheduler.spawn(Arc::clone(&wait), owner);
    scheduler.tick(&mut field);
    let snapshot = scheduler.snapshot();

    let mut restored = Scheduler::new(SchedulerConfig::default());
    restored
        .restore(snapshot.clone(), |saved| {
            (saved.script == "wait").then(|| Arc::clone(&wait))
        })
        .unwrap();
    assert_eq!(restored.snapshot(), snapshot);
    assert_eq!(restored.get(id).unwrap().cursor().temps()[0], 1);
    assert_eq!(restored.tick_count(), 1);

    let mut untouched = Scheduler::new(SchedulerConfig::default());
    let err = untouched.restore(snapshot, |_| None).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownScript(_)));
    assert!(untouched.is_empty());
}
