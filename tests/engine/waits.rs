//! Suspension, notification and resume tests

use std::sync::Arc;

use fieldscript_engine::{ExecState, InstanceId, Scheduler, WaitEvent};
use fieldscript_foundation::{EntityId, ErrorKind, VarBank};
use fieldscript_language::opcode::codes;
use fieldscript_language::{Program, ScriptWriter, SuspendReason, decode_program};
use fieldscript_storage::FieldState;

/// Shows message `message` on `channel`, then sets `byte[slot] = 1`.
fn talker(channel: i32, message: i32, slot: i16) -> Arc<Program> {
    let mut w = ScriptWriter::new();
    w.push_const(channel)
        .push_const(message)
        .op(codes::MESW, 0)
        .push_const(1)
        .op(codes::POPM_B, slot);
    Arc::new(decode_program("talker", &w.finish().unwrap()).unwrap())
}

fn setup() -> (Scheduler, FieldState, EntityId) {
    let mut field = FieldState::new(0);
    let owner = field.spawn_entity("npc");
    (Scheduler::default(), field, owner)
}

#[test]
fn dialogue_close_releases_only_its_channel() {
    let (mut scheduler, mut field, owner) = setup();
    let a = scheduler.spawn(talker(0, 5, 0), owner);
    let b = scheduler.spawn(talker(1, 6, 1), owner);
    let c = scheduler.spawn(talker(0, 7, 2), owner);

    let report = scheduler.tick(&mut field);
    assert_eq!(report.suspended().len(), 3);

    let released = scheduler.notify(&WaitEvent::DialogueClosed { channel: 0 });
    assert_eq!(released, vec![a, c]);
    assert_eq!(scheduler.state(a), Some(&ExecState::Running));
    assert!(matches!(scheduler.state(b), Some(ExecState::Suspended(_))));

    let report = scheduler.tick(&mut field);
    assert_eq!(report.halted(), vec![a, c]);
    assert_eq!(field.read(VarBank::Byte, 0).unwrap(), 1);
    assert_eq!(field.read(VarBank::Byte, 1).unwrap(), 0);
    assert_eq!(field.read(VarBank::Byte, 2).unwrap(), 1);
}

#[test]
fn animation_wait_is_per_entity() {
    let mut w = ScriptWriter::new();
    w.op(codes::ANIME, 3).op(codes::HALT, 0);
    let dance = Arc::new(decode_program("dance", &w.finish().unwrap()).unwrap());

    let (mut scheduler, mut field, first) = setup();
    let second = field.spawn_entity("other");
    let a = scheduler.spawn(Arc::clone(&dance), first);
    let b = scheduler.spawn(dance, second);
    scheduler.tick(&mut field);

    assert_eq!(
        scheduler.state(b).and_then(ExecState::suspend_reason),
        Some(&SuspendReason::Animation {
            entity: second,
            animation: 3
        })
    );

    let wrong_id = WaitEvent::AnimationFinished {
        entity: first,
        animation: 4,
    };
    assert!(scheduler.notify(&wrong_id).is_empty());

    let done = WaitEvent::AnimationFinished {
        entity: first,
        animation: 3,
    };
    assert_eq!(scheduler.notify(&done), vec![a]);
}

#[test]
fn timer_event_targets_one_instance() {
    let mut w = ScriptWriter::new();
    w.push_const(-5).op(codes::WAIT, 0);
    let program = Arc::new(decode_program("nap", &w.finish().unwrap()).unwrap());

    let (mut scheduler, mut field, owner) = setup();
    let a = scheduler.spawn(Arc::clone(&program), owner);
    let b = scheduler.spawn(program, owner);
    scheduler.tick(&mut field);

    // negative frame counts clamp to zero
    assert_eq!(
        scheduler.state(a).and_then(ExecState::suspend_reason),
        Some(&SuspendReason::Timer { frames: 0 })
    );
    assert_eq!(
        scheduler.notify(&WaitEvent::TimerElapsed { instance: b }),
        vec![b]
    );
    assert!(
        scheduler
            .notify(&WaitEvent::TimerElapsed {
                instance: InstanceId(99)
            })
            .is_empty()
    );
}

#[test]
fn resume_and_its_errors() {
    let (mut scheduler, mut field, owner) = setup();
    let id = scheduler.spawn(talker(2, 1, 4), owner);

    let err = scheduler.resume(id).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotSuspended(_)));
    let err = scheduler.resume(InstanceId(42)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownInstance(42)));

    scheduler.tick(&mut field);
    scheduler.resume(id).unwrap();
    let report = scheduler.tick(&mut field);
    assert_eq!(report.halted(), vec![id]);
    assert_eq!(field.read(VarBank::Byte, 4).unwrap(), 1);
}

#[test]
fn suspended_instances_consume_no_quota() {
    let (mut scheduler, mut field, owner) = setup();
    scheduler.spawn(talker(0, 1, 0), owner);
    scheduler.tick(&mut field);

    for _ in 0..5 {
        let report = scheduler.tick(&mut field);
        assert_eq!(report.executed, 0);
        assert!(report.events.is_empty());
    }
    assert_eq!(scheduler.suspended().count(), 1);
}
