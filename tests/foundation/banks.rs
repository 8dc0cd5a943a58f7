//! Variable bank and entity handle tests

use fieldscript_foundation::{EntityId, TEMP_SLOTS, VarBank, VarRef};

#[test]
fn every_bank_name_parses_back() {
    for bank in [
        VarBank::Byte,
        VarBank::Word,
        VarBank::Long,
        VarBank::SignedByte,
        VarBank::SignedWord,
        VarBank::Flag,
        VarBank::Temp,
    ] {
        assert_eq!(VarBank::from_name(bank.name()), Some(bank));
    }
    assert_eq!(VarBank::from_name("dword"), None);
}

#[test]
fn only_memory_banks_have_width() {
    assert!(VarBank::Flag.width().is_none());
    assert!(VarBank::Temp.width().is_none());
    assert!(VarBank::SignedByte.is_signed());
    assert!(!VarBank::Word.is_signed());
}

#[test]
fn var_ref_renders_bank_and_index() {
    assert_eq!(VarRef::new(VarBank::Word, 12).to_string(), "word[12]");
    assert_eq!(VarRef::new(VarBank::Temp, 3).to_string(), "temp[3]");
    assert_eq!(TEMP_SLOTS, 8);
}

#[test]
fn entity_display_and_debug() {
    let id = EntityId::new(7, 3);
    assert_eq!(id.to_string(), "entity#7");
    assert_eq!(format!("{id:?}"), "EntityId(7v3)");
    assert_ne!(id, EntityId::new(7, 5));
}
