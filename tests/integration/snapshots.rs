//! Saving and restoring whole sessions

use fieldscript_foundation::{ErrorKind, VarBank};
use fieldscript_language::ScriptWriter;
use fieldscript_language::opcode::codes;
use fieldscript_runtime::{Session, demo_script, from_bytes, load_from_file, save_to_file, to_bytes};

fn midway() -> Session {
    let mut session = Session::new(3);
    session.load_script("demo", demo_script().unwrap()).unwrap();
    let a = session.create_entity("a");
    let b = session.create_entity("b");
    session.spawn("demo", a).unwrap();
    session.tick();
    session.spawn("demo", b).unwrap();
    session
}

#[test]
fn restore_continues_mid_wait() {
    let mut original = midway();
    let snapshot = original.snapshot();
    assert_eq!(snapshot.timers.len(), 1);
    assert_eq!(snapshot.scheduler.instances.len(), 2);

    let mut copy = Session::new(0);
    copy.restore(snapshot).unwrap();

    for _ in 0..6 {
        let left = original.tick();
        let right = copy.tick();
        assert_eq!(left, right);
    }
    assert_eq!(original.field(), copy.field());
    assert_eq!(copy.field().read(VarBank::Byte, 0).unwrap(), 3);
}

#[test]
fn snapshot_file_round_trip() {
    let session = midway();
    let path = std::env::temp_dir().join("fieldscript_it_snapshot.msgpack");
    save_to_file(&session.snapshot(), &path).unwrap();

    let mut restored = Session::new(0);
    restored.restore(load_from_file(&path).unwrap()).unwrap();
    assert_eq!(restored.snapshot(), session.snapshot());
    assert!(restored.program("demo").is_some());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn snapshot_without_its_script_is_refused() {
    let session = midway();
    let mut snapshot = from_bytes(&to_bytes(&session.snapshot()).unwrap()).unwrap();
    snapshot.scripts.clear();

    let mut target = Session::new(0);
    target.load_script("demo", demo_script().unwrap()).unwrap();
    let err = target.restore(snapshot).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownScript(_)));
    assert!(target.scheduler().is_empty());
    assert!(target.program("demo").is_some());
}

#[test]
fn restore_keeps_the_program_an_instance_was_running() {
    let first = ScriptWriter::new()
        .push_const(1)
        .op(codes::WAIT, 0)
        .push_const(1)
        .op(codes::POPM_B, 0)
        .finish()
        .unwrap();
    let second = ScriptWriter::new()
        .op(codes::NOP, 0)
        .push_const(2)
        .op(codes::POPM_B, 0)
        .finish()
        .unwrap();

    let mut original = Session::new(0);
    original.load_script("s", first).unwrap();
    let owner = original.create_entity("npc");
    let id = original.spawn("s", owner).unwrap();
    original.tick();
    assert!(original.timer_deadline(id).is_some());
    original.load_script("s", second).unwrap();

    let snapshot = from_bytes(&to_bytes(&original.snapshot()).unwrap()).unwrap();
    assert_eq!(snapshot.detached.len(), 1);
    let mut copy = Session::new(0);
    copy.restore(snapshot).unwrap();
    assert_eq!(copy.snapshot(), original.snapshot());

    original.run(3);
    copy.run(3);
    assert_eq!(original.field().read(VarBank::Byte, 0).unwrap(), 1);
    assert_eq!(copy.field().read(VarBank::Byte, 0).unwrap(), 1);

    // New spawns pick up the replacement.
    copy.reap();
    copy.spawn("s", owner).unwrap();
    copy.tick();
    assert_eq!(copy.field().read(VarBank::Byte, 0).unwrap(), 2);
    assert!(copy.snapshot().detached.is_empty());
}
