//! Error type tests

use fieldscript_foundation::{
    DecodeError, EntityId, Error, ErrorContext, ErrorKind, RuntimeFault, VarBank,
};

#[test]
fn decode_errors_become_errors() {
    let err: Error = DecodeError::UnknownOpcode {
        offset: 12,
        opcode: 0x7777,
    }
    .into();
    assert!(matches!(err.kind, ErrorKind::Decode(_)));
    let text = err.to_string();
    assert!(text.contains("0x7777"));
    assert!(text.contains("0x000c"));
}

#[test]
fn faults_become_errors() {
    let err: Error = RuntimeFault::UnknownEntity(EntityId::new(2, 1)).into();
    assert!(matches!(
        err.kind,
        ErrorKind::Fault(RuntimeFault::UnknownEntity(_))
    ));
}

#[test]
fn fault_messages() {
    assert_eq!(
        RuntimeFault::UnresolvedJump { target: 6 }.to_string(),
        "unresolved jump target 6"
    );
    assert_eq!(
        RuntimeFault::AddressOutOfRange {
            bank: VarBank::Long,
            index: 4094
        }
        .to_string(),
        "address out of range: long[4094]"
    );
    assert!(
        RuntimeFault::CallStackOverflow { limit: 16 }
            .to_string()
            .contains("16")
    );
}

#[test]
fn decode_error_offsets() {
    assert_eq!(
        DecodeError::Truncated {
            offset: 8,
            needed: 2
        }
        .offset(),
        Some(8)
    );
    assert_eq!(DecodeError::DanglingOperands { depth: 1 }.offset(), None);
}

#[test]
fn context_renders_source_and_offset() {
    let context = ErrorContext::new().with_source("door").with_offset(4);
    assert_eq!(context.to_string(), "in door at 0x0004");
    let err = Error::unknown_script("door").with_context(context);
    assert_eq!(err.context.and_then(|c| c.offset), Some(4));
}
