//! Field state tests

use fieldscript_foundation::{RuntimeFault, VarBank};
use fieldscript_storage::{FLAG_COUNT, FieldState, MEMORY_SIZE};

#[test]
fn long_writes_are_little_endian() {
    let mut field = FieldState::new(0);
    field.write(VarBank::Long, 8, 0x0403_0201).unwrap();
    assert_eq!(field.memory().dump(8, 4), vec![1, 2, 3, 4]);
    assert_eq!(field.read(VarBank::Word, 9).unwrap(), 0x0302);
}

#[test]
fn writes_truncate_to_width() {
    let mut field = FieldState::new(0);
    field.write(VarBank::Byte, 0, 0x1FF).unwrap();
    assert_eq!(field.read(VarBank::Byte, 0).unwrap(), 0xFF);
    assert_eq!(field.read(VarBank::Byte, 1).unwrap(), 0);
}

#[test]
fn reads_past_the_end_fault() {
    let field = FieldState::new(0);
    let last = u16::try_from(MEMORY_SIZE - 1).unwrap();
    assert!(field.read(VarBank::Byte, last).is_ok());
    assert_eq!(
        field.read(VarBank::Word, last),
        Err(RuntimeFault::AddressOutOfRange {
            bank: VarBank::Word,
            index: last
        })
    );
}

#[test]
fn smaller_memory() {
    let mut field = FieldState::new(0).with_memory_size(4);
    assert!(field.write(VarBank::Long, 0, -1).is_ok());
    assert!(field.write(VarBank::Byte, 4, 1).is_err());
}

#[test]
fn flag_and_temp_banks_are_not_memory() {
    let field = FieldState::new(0);
    assert_eq!(
        field.read(VarBank::Flag, 0),
        Err(RuntimeFault::InvalidBank(VarBank::Flag))
    );
    assert_eq!(
        field.read(VarBank::Temp, 0),
        Err(RuntimeFault::InvalidBank(VarBank::Temp))
    );
}

#[test]
fn flags_outside_range_fault_like_memory() {
    let mut field = FieldState::new(0);
    let outside = u16::try_from(FLAG_COUNT).unwrap();
    let fault = RuntimeFault::AddressOutOfRange {
        bank: VarBank::Flag,
        index: outside,
    };
    assert_eq!(field.set_flag(outside, true), Err(fault.clone()));
    assert_eq!(field.flag(outside), Err(fault));
    assert_eq!(field.flag(outside - 1), Ok(false));

    field.set_flag(5, true).unwrap();
    field.set_flag(2, true).unwrap();
    assert_eq!(field.set_flags().collect::<Vec<_>>(), vec![2, 5]);
}

#[test]
fn random_stream_is_reproducible() {
    let mut a = FieldState::new(99);
    let mut b = FieldState::new(99);
    let first: Vec<u8> = (0..16).map(|_| a.random_byte()).collect();
    let second: Vec<u8> = (0..16).map(|_| b.random_byte()).collect();
    assert_eq!(first, second);

    let mut resumed = a.clone();
    assert_eq!(resumed.random_byte(), a.random_byte());
}

#[test]
fn clones_are_independent() {
    let mut field = FieldState::new(0);
    let before = field.clone();
    field.write(VarBank::Byte, 0, 1).unwrap();
    assert_eq!(before.read(VarBank::Byte, 0).unwrap(), 0);
}
