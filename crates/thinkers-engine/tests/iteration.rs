//! Integration test: class-filtered iteration over a live table.

use std::cell::Cell;
use std::rc::Rc;

use thinkers_core::{ClassId, StatNum, ThinkerId, ThinkerIterator, Thinkers};
use thinkers_engine::{SchedulerConfig, ThinkerTable};
use thinkers_test_utils::{fixture_registry, Bar, Doomed, Foo, Probe};

struct Scene {
    table: ThinkerTable,
    foo: ClassId,
    a: ThinkerId,
    b: ThinkerId,
    c: ThinkerId,
}

/// A: Foo in 5, B: Bar in 5, C: Foo in 9.
fn scene() -> Scene {
    let mut table = ThinkerTable::new(fixture_registry(), SchedulerConfig::default()).unwrap();
    let a = table.spawn(StatNum::new(5), Foo::new(1));
    let b = table.spawn(StatNum::new(5), Bar::new(2));
    let c = table.spawn(StatNum::new(9), Foo::new(3));
    table.run_all_buckets();
    let foo = table.classes().id_of::<Foo>().unwrap();
    Scene { table, foo, a, b, c }
}

#[test]
fn exact_class_across_all_buckets() {
    let s = scene();
    let found: Vec<_> = s.table.iter(s.foo, StatNum::CATCH_ALL, true).collect();
    assert_eq!(found, vec![s.a, s.c]);
}

#[test]
fn subclasses_included_unless_exact() {
    let s = scene();
    let exact: Vec<_> = s.table.iter(s.foo, StatNum::new(5), true).collect();
    assert_eq!(exact, vec![s.a]);
    let inclusive: Vec<_> = s.table.iter(s.foo, StatNum::new(5), false).collect();
    assert_eq!(inclusive, vec![s.a, s.b]);
    let everywhere: Vec<_> = s.table.iter(s.foo, StatNum::CATCH_ALL, false).collect();
    assert_eq!(everywhere, vec![s.a, s.b, s.c]);
}

#[test]
fn reinit_replays_full_sequence() {
    let s = scene();
    let mut cursor = s.table.cursor(s.foo, StatNum::CATCH_ALL);
    let first: Vec<_> = std::iter::from_fn(|| cursor.next(&s.table, false)).collect();
    assert!(cursor.is_exhausted());
    assert_eq!(cursor.next(&s.table, false), None);

    cursor.reinit();
    let second: Vec<_> = std::iter::from_fn(|| cursor.next(&s.table, false)).collect();
    assert_eq!(first, second);
    assert_eq!(first, vec![s.a, s.b, s.c]);

    // Part-way through, too.
    cursor.reinit();
    assert_eq!(cursor.next(&s.table, false), Some(s.a));
    assert_eq!(cursor.next(&s.table, false), Some(s.b));
    cursor.reinit();
    let third: Vec<_> = std::iter::from_fn(|| cursor.next(&s.table, false)).collect();
    assert_eq!(third, first);
}

#[test]
fn cursor_survives_table_mutation_between_steps() {
    let mut s = scene();
    let mut cursor = s.table.cursor(s.foo, StatNum::CATCH_ALL);
    assert_eq!(cursor.next(&s.table, false), Some(s.a));
    let d = s.table.spawn(StatNum::new(7), Foo::new(4));
    s.table.destroy(s.b);
    let rest: Vec<_> = std::iter::from_fn(|| cursor.next(&s.table, false)).collect();
    assert_eq!(rest, vec![d, s.c]);
}

#[test]
fn fresh_objects_follow_live_within_a_bucket() {
    let mut s = scene();
    let late = s.table.spawn(StatNum::new(5), Foo::new(9));
    let found: Vec<_> = s.table.iter(s.foo, StatNum::new(5), true).collect();
    assert_eq!(found, vec![s.a, late]);
}

#[test]
fn resume_continues_after_previous_result() {
    let s = scene();
    let cursor = ThinkerIterator::resume(&s.table, s.foo, StatNum::CATCH_ALL, Some(s.a));
    let rest: Vec<_> = Thinkers::new(&s.table, cursor, true).collect();
    assert_eq!(rest, vec![s.c]);

    let out_of_scope = ThinkerIterator::resume(&s.table, s.foo, StatNum::new(9), Some(s.a));
    let restarted: Vec<_> = Thinkers::new(&s.table, out_of_scope, true).collect();
    assert_eq!(restarted, vec![s.c]);
}

#[test]
fn typed_iteration_downcasts() {
    let s = scene();
    let tags: Vec<u32> = s.table.iter_of::<Foo>(StatNum::CATCH_ALL).map(|(_, f)| f.tag).collect();
    assert_eq!(tags, vec![1, 3]);
}

#[test]
fn absent_class_yields_nothing() {
    let s = scene();
    let probe = s.table.classes().id_of::<Probe>().unwrap();
    assert_eq!(s.table.iter(probe, StatNum::CATCH_ALL, false).count(), 0);
    assert_eq!(s.table.iter(s.foo, StatNum::new(6), false).count(), 0);

    let mut by_name =
        ThinkerIterator::by_name(s.table.classes(), "NoSuchClass", StatNum::CATCH_ALL);
    assert!(by_name.is_exhausted());
    assert_eq!(by_name.next(&s.table, false), None);
}

#[test]
fn cursor_kept_across_frames_outlives_its_last_result() {
    let freed = Rc::new(Cell::new(0));
    let mut table = ThinkerTable::new(fixture_registry(), SchedulerConfig::default()).unwrap();
    let doomed = table.spawn(StatNum::new(5), Doomed::new(2, &freed));
    let x = table.spawn(StatNum::new(5), Foo::new(1));
    let y = table.spawn(StatNum::new(5), Foo::new(2));
    table.run_all_buckets();

    let mut cursor = table.cursor(ClassId::ROOT, StatNum::CATCH_ALL);
    assert_eq!(cursor.next(&table, false), Some(doomed));

    table.run_all_buckets();
    assert_eq!(freed.get(), 1);
    assert!(!table.is_alive(doomed));

    let rest: Vec<_> = std::iter::from_fn(|| cursor.next(&table, false)).collect();
    assert_eq!(rest, vec![x, y]);
}

#[test]
fn unregistered_class_id_starts_exhausted() {
    let s = scene();
    let cursor = s.table.cursor(ClassId(999), StatNum::CATCH_ALL);
    assert!(cursor.is_exhausted());
    let resumed = ThinkerIterator::resume(&s.table, ClassId(999), StatNum::CATCH_ALL, Some(s.a));
    assert!(resumed.is_exhausted());
}
