//! Session lifecycle: loading, timers, notifications and command files

use std::fs;

use fieldscript_engine::{ExecState, WaitEvent};
use fieldscript_foundation::{ErrorKind, VarBank};
use fieldscript_language::SuspendReason;
use fieldscript_runtime::{LineEditor, ReadResult, Repl, Session, demo_script};

fn demo_session() -> Session {
    let mut session = Session::new(7);
    session.load_script("demo", demo_script().unwrap()).unwrap();
    session
}

#[test]
fn demo_counts_then_waits_for_dialogue() {
    let mut session = demo_session();
    let npc = session.create_entity("npc");
    let id = session.spawn("demo", npc).unwrap();

    for expected in 1..=3 {
        session.tick();
        assert_eq!(session.field().read(VarBank::Byte, 0).unwrap(), expected);
        assert!(session.timer_deadline(id).is_some());
    }

    let report = session.tick();
    assert_eq!(
        report.suspended(),
        vec![(
            id,
            &SuspendReason::Dialogue {
                channel: 0,
                message: 7
            }
        )]
    );
    assert_eq!(session.field().flag(1), Ok(true));
    assert!(!session.field().is_passable(npc).unwrap());

    // nothing moves until the window closes
    session.run(10);
    assert!(matches!(
        session.scheduler().state(id),
        Some(ExecState::Suspended(_))
    ));

    assert_eq!(session.notify(&WaitEvent::DialogueClosed { channel: 0 }), vec![id]);
    let report = session.tick();
    assert_eq!(report.halted(), vec![id]);
    assert!(session.field().is_passable(npc).unwrap());
    assert_eq!(session.reap().len(), 1);
}

#[test]
fn despawned_owner_cannot_spawn_and_loses_instances() {
    let mut session = demo_session();
    let npc = session.create_entity("npc");
    let other = session.create_entity("other");
    session.spawn("demo", npc).unwrap();
    let kept = session.spawn("demo", other).unwrap();
    session.tick();

    let removed = session.cancel_owned_by(npc);
    assert_eq!(removed.len(), 1);
    session.field_mut().despawn_entity(npc).unwrap();

    let err = session.spawn("demo", npc).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Fault(_)));
    assert_eq!(session.scheduler().len(), 1);
    assert!(session.scheduler().get(kept).is_some());
}

#[test]
fn scripts_load_from_files_by_stem() {
    let dir = std::env::temp_dir().join("fieldscript_it_scripts");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("opener.bin");
    fs::write(&path, demo_script().unwrap()).unwrap();

    let mut session = Session::new(0);
    let program = session.load_script_file(&path).unwrap();
    assert_eq!(program.name(), "opener");
    assert_eq!(session.script_names().collect::<Vec<_>>(), vec!["opener"]);

    let err = session
        .load_script_file(dir.join("missing.bin"))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IoError(_)));

    let _ = fs::remove_dir_all(&dir);
}

/// Editor that never has input; command files drive the REPL instead.
struct NoInput;

impl LineEditor for NoInput {
    fn read_line(&mut self, _prompt: &str) -> fieldscript_foundation::Result<ReadResult> {
        Ok(ReadResult::Eof)
    }

    fn add_history(&mut self, _line: &str) {}

    fn set_keywords(&mut self, _keywords: Vec<String>) {}
}

#[test]
fn command_file_drives_a_session() {
    let dir = std::env::temp_dir().join("fieldscript_it_commands");
    fs::create_dir_all(&dir).unwrap();
    let script = dir.join("setup.fsc");
    fs::write(
        &script,
        "# bring the demo up to its dialogue\n\
         entity npc\n\
         spawn demo npc\n\
         tick 4\n\
         peek byte 0\n\
         flag 1\n\
         notify dialogue 0\n\
         tick\n\
         quit\n\
         peek byte 1\n",
    )
    .unwrap();

    let mut repl = Repl::with_editor(NoInput).with_session(demo_session());
    let output = repl.eval_file(&script).unwrap();
    assert!(output.contains("byte[0] = 3"));
    assert!(output.contains("flag[1] = true"));
    assert!(output.contains("released #1"));
    assert!(!output.contains("byte[1]"));

    let _ = fs::remove_dir_all(&dir);
}
