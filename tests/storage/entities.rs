//! Entity lifecycle tests

use fieldscript_foundation::RuntimeFault;
use fieldscript_storage::FieldState;

#[test]
fn new_entities_are_solid() {
    let mut field = FieldState::new(0);
    let npc = field.spawn_entity("npc");
    assert_eq!(field.entity(npc).unwrap().name, "npc");
    assert!(!field.is_passable(npc).unwrap());
    field.set_passable(npc, true).unwrap();
    assert!(field.is_passable(npc).unwrap());
}

#[test]
fn despawned_handles_go_stale() {
    let mut field = FieldState::new(0);
    let npc = field.spawn_entity("npc");
    field.despawn_entity(npc).unwrap();
    assert_eq!(
        field.is_passable(npc),
        Err(RuntimeFault::UnknownEntity(npc))
    );

    let reused = field.spawn_entity("chest");
    assert_eq!(reused.slot, npc.slot);
    assert_ne!(reused, npc);
    assert!(field.entity(npc).is_err());
    assert!(field.entity(reused).is_ok());
}

#[test]
fn entities_iterate_in_slot_order() {
    let mut field = FieldState::new(0);
    let a = field.spawn_entity("a");
    let b = field.spawn_entity("b");
    let ids: Vec<_> = field.entities().iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![a, b]);
    assert_eq!(field.entities().len(), 2);
}
