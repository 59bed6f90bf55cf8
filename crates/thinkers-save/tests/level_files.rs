//! Integration test: levels written to bytes and read back.
//!
//! Verifies that a save file restores the same layout (hash-equal and
//! divergence-free), that the header is checked before the level is
//! touched, and that a corrupt payload leaves no loaded object behind.

use proptest::prelude::*;
use thinkers_core::{ArchiveError, StatNum};
use thinkers_engine::{Level, SchedulerConfig};
use thinkers_save::{compare_layouts, layout_hash, load_level, save_level, SaveError};
use thinkers_test_utils::{fixture_registry, new_log, Bar, Foo, Killer, PlayerPawn, Probe};

fn level(name: &str) -> Level {
    Level::new(name, fixture_registry(), SchedulerConfig::default()).unwrap()
}

fn populated() -> Level {
    let log = new_log();
    let mut l = level("MAP01");
    let foo = l.spawn(StatNum::new(5), Foo::new(1));
    l.spawn(StatNum::new(5), Bar::new(2));
    l.spawn(StatNum::PLAYER, PlayerPawn::new(1));
    l.spawn(StatNum::DEFAULT, Probe::new(3, &log));
    l.spawn(StatNum::CATCH_ALL, Killer::new(Some(foo)));
    for _ in 0..4 {
        l.tick();
    }
    l.spawn(StatNum::new(9), Foo::new(4));
    l
}

#[test]
fn save_then_load_restores_layout_and_clocks() {
    let original = populated();
    let mut bytes = Vec::new();
    let written = save_level(&original, &mut bytes, false).unwrap();
    assert_eq!(written, bytes.len() as u64);

    let mut restored = level("MAP01");
    let meta = load_level(&mut restored, bytes.as_slice(), false).unwrap();
    assert_eq!(meta.level_name, "MAP01");
    assert_eq!(meta.maptime, 4);
    assert_eq!(restored.maptime(), 4);
    assert_eq!(compare_layouts(original.table(), restored.table()), None);
    assert_eq!(layout_hash(original.table()), layout_hash(restored.table()));
}

#[test]
fn restored_level_keeps_ticking_in_step() {
    let mut original = populated();
    let mut bytes = Vec::new();
    save_level(&original, &mut bytes, false).unwrap();
    let mut restored = level("MAP01");
    load_level(&mut restored, bytes.as_slice(), false).unwrap();

    for _ in 0..3 {
        let a = original.tick();
        let b = restored.tick();
        assert_eq!(a.ticked, b.ticked);
        assert_eq!(compare_layouts(original.table(), restored.table()), None);
    }
}

#[test]
fn keep_players_file_skips_pawns() {
    let original = populated();
    let mut bytes = Vec::new();
    save_level(&original, &mut bytes, true).unwrap();

    let mut next = level("MAP01");
    let pawn = next.spawn(StatNum::PLAYER, PlayerPawn::new(7));
    load_level(&mut next, bytes.as_slice(), true).unwrap();

    let players = next.table().bucket_ids(StatNum::PLAYER);
    assert_eq!(players, vec![pawn]);
    assert_eq!(next.table().len(), original.table().len());
}

#[test]
fn bad_magic_leaves_level_untouched() {
    let original = populated();
    let mut bytes = Vec::new();
    save_level(&original, &mut bytes, false).unwrap();
    bytes[1] = b'?';

    let mut target = level("MAP01");
    target.spawn(StatNum::new(3), Foo::new(5));
    let err = load_level(&mut target, bytes.as_slice(), false).unwrap_err();
    assert!(matches!(err, SaveError::InvalidMagic));
    assert_eq!(target.table().len(), 1);
}

#[test]
fn unknown_class_aborts_load() {
    let original = populated();
    let mut bytes = Vec::new();
    save_level(&original, &mut bytes, false).unwrap();
    let pos = bytes
        .windows(3)
        .position(|w| w == b"Bar")
        .expect("class name present");
    bytes[pos..pos + 3].copy_from_slice(b"Baz");

    let mut target = level("MAP01");
    let err = load_level(&mut target, bytes.as_slice(), false).unwrap_err();
    match err {
        SaveError::Archive(ArchiveError::UnknownClass { name }) => assert_eq!(name, "Baz"),
        other => panic!("expected unknown class, got {other}"),
    }
    assert!(target.table().is_empty());
}

#[test]
fn truncated_file_aborts_load() {
    let original = populated();
    let mut bytes = Vec::new();
    save_level(&original, &mut bytes, false).unwrap();
    bytes.truncate(bytes.len() - 2);

    let mut target = level("MAP01");
    let err = load_level(&mut target, bytes.as_slice(), false).unwrap_err();
    assert!(matches!(err, SaveError::Io(_)));
    assert!(target.table().is_empty());
}

proptest! {
    #[test]
    fn random_layouts_survive_files(
        spawns in prop::collection::vec((0u8..=128, any::<bool>()), 0..60),
        merge_at in 0usize..60,
    ) {
        let mut l = level("MAP02");
        for (i, &(s, bar)) in spawns.iter().enumerate() {
            if i == merge_at {
                l.table_mut().merge_fresh();
            }
            if bar {
                l.spawn(StatNum::new(s), Bar::new(i as u32));
            } else {
                l.spawn(StatNum::new(s), Foo::new(i as u32));
            }
        }
        let mut bytes = Vec::new();
        save_level(&l, &mut bytes, false).unwrap();
        let mut restored = level("MAP02");
        load_level(&mut restored, bytes.as_slice(), false).unwrap();
        prop_assert_eq!(compare_layouts(l.table(), restored.table()), None);
        prop_assert_eq!(restored.table().len(), spawns.len());
    }
}
