//! Integration test: the reference 100x100 scenario end to end.
//!
//! Builds the arena for 3 Input, 7 Persistent and 6 Working grids, checks
//! the block size, drains the Working pool until it is exhausted, then
//! returns everything and verifies the guards and the low-water mark.

use sprawl_arena::{ArenaError, ErrorKind, GridArena, GridHandle};
use sprawl_core::{owner, GridKind, INVALID_PIXEL, WORD_BYTES};
use sprawl_test_utils::{init_tracing, scenario_config, small_config, with_level};

// ── Layout ──────────────────────────────────────────────────────────

#[test]
fn scenario_block_size() {
    init_tracing();
    let arena = GridArena::new(scenario_config()).unwrap();
    assert_eq!(arena.layout().total_bytes(), 16 * 10_000 + 17 * 4);
    assert_eq!(arena.raw_bytes().len(), 160_068);
    assert_eq!(arena.guards().len(), 17);
    for kind in GridKind::ALL {
        assert_eq!(arena.pool(kind).depth(), arena.layout().count(kind));
    }
}

// ── Pool exhaustion ─────────────────────────────────────────────────

#[test]
fn seventh_working_acquire_fails() {
    init_tracing();
    let mut arena = GridArena::new(scenario_config()).unwrap();
    let held: Vec<GridHandle> = (0..6)
        .map(|_| arena.acquire(GridKind::Working, owner!("spread")).unwrap())
        .collect();

    let err = arena
        .acquire(GridKind::Working, owner!("spread"))
        .unwrap_err();
    match &err {
        ArenaError::PoolExhausted {
            kind,
            capacity,
            requested_by,
        } => {
            assert_eq!(*kind, GridKind::Working);
            assert_eq!(*capacity, 6);
            assert_eq!(requested_by.function, "spread");
        }
        other => panic!("expected PoolExhausted, got {other:?}"),
    }
    assert!(err.to_string().contains("increase the configured working grid count"));
    assert_eq!(arena.pool(GridKind::Working).depth(), 0);

    for h in held {
        arena.release(h, owner!("spread")).unwrap();
    }
    assert_eq!(arena.min_free(GridKind::Working), 0);
    assert_eq!(arena.pool(GridKind::Working).depth(), 6);
    arena.verify_all().unwrap();
}

// ── A growth cycle ──────────────────────────────────────────────────

#[test]
fn full_cycle_keeps_guards_intact() {
    init_tracing();
    let mut arena = GridArena::new(scenario_config()).unwrap();

    let inputs: Vec<_> = (0..3)
        .map(|_| arena.acquire(GridKind::Input, owner!("load_inputs")).unwrap())
        .collect();
    let persistent: Vec<_> = (0..7)
        .map(|_| arena.acquire(GridKind::Persistent, owner!("init_run")).unwrap())
        .collect();
    for (i, h) in inputs.iter().chain(&persistent).enumerate() {
        arena.grid_mut(h).unwrap().fill(i as u8);
    }

    for year in 0..5u8 {
        let a = arena.acquire(GridKind::Working, owner!("grow")).unwrap();
        let b = arena.acquire(GridKind::Working, owner!("grow")).unwrap();
        arena.grid_mut(&a).unwrap().fill(year);
        let copy = arena.grid(&a).unwrap().to_vec();
        arena.grid_mut(&b).unwrap().copy_from_slice(&copy);
        arena.release(b, owner!("grow")).unwrap();
        arena.release(a, owner!("grow")).unwrap();
        arena.check_memory(owner!("end_of_year")).unwrap();
    }

    for (i, h) in inputs.iter().chain(&persistent).enumerate() {
        assert!(arena.grid(h).unwrap().iter().all(|&p| p == i as u8));
    }
    for h in inputs.into_iter().chain(persistent) {
        arena.release(h, owner!("end_run")).unwrap();
    }
    arena.verify_all().unwrap();
    assert_eq!(arena.min_free(GridKind::Working), 4);
    for stats in arena.pool_stats() {
        assert_eq!(stats.in_use(), 0);
    }
}

// ── Misuse ──────────────────────────────────────────────────────────

#[test]
fn double_release_detected() {
    let mut arena = GridArena::new(small_config(10, 10, 2)).unwrap();
    let h = arena.acquire(GridKind::Working, owner!("t")).unwrap();
    arena.release(h, owner!("first")).unwrap();
    let err = arena.release(h, owner!("second")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DoubleRelease);
    assert_eq!(arena.pool(GridKind::Working).depth(), 2);
}

#[test]
fn foreign_handle_is_unmatched() {
    let mut mine = GridArena::new(small_config(10, 10, 2)).unwrap();
    let mut theirs = GridArena::new(small_config(10, 10, 2)).unwrap();
    let h = theirs.acquire(GridKind::Working, owner!("t")).unwrap();
    let err = mine.release(h, owner!("t")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnmatchedRelease);
    assert_ne!(mine.id(), theirs.id());
}

#[test]
fn overrun_by_one_byte_names_the_slot() {
    let mut arena = GridArena::new(scenario_config()).unwrap();
    let who = owner!("leaky_rule");
    let h = arena.acquire(GridKind::Working, who).unwrap();
    let end = h.offset() + arena.layout().slot_bytes(GridKind::Working);
    arena.raw_bytes_mut()[end] ^= 0xFF;

    match arena.verify_all().unwrap_err() {
        ArenaError::GuardCorruption {
            found,
            overrun_slot,
            current_owner,
            ..
        } => {
            assert_ne!(found, sprawl_core::INVALID_WORD);
            assert_eq!(overrun_slot, Some((GridKind::Working, h.slot())));
            assert_eq!(current_owner, Some(who));
        }
        other => panic!("expected GuardCorruption, got {other:?}"),
    }
}

#[test]
fn strict_mode_catches_write_after_release() {
    let config = with_level(small_config(6, 6, 2), sprawl_arena::CheckLevel::Strict);
    let mut arena = GridArena::new(config).unwrap();
    let h = arena.acquire(GridKind::Working, owner!("t")).unwrap();
    arena.release(h, owner!("t")).unwrap();
    assert!(arena.raw_bytes()[h.offset()..h.offset() + 36]
        .iter()
        .all(|&b| b == INVALID_PIXEL));

    arena.raw_bytes_mut()[h.offset() + 35] = 1;
    let err = arena.check_memory(owner!("audit")).unwrap_err();
    match err {
        ArenaError::WriteAfterRelease {
            slot,
            pixel,
            released_by,
            ..
        } => {
            assert_eq!(slot, h.slot());
            assert_eq!(pixel, 35);
            assert_eq!(released_by.map(|o| o.function), Some("t"));
        }
        other => panic!("expected WriteAfterRelease, got {other:?}"),
    }
}

#[test]
fn grids_are_word_aligned() {
    let arena = GridArena::new(small_config(3, 5, 3)).unwrap();
    for region in arena.partition().slots() {
        assert_eq!(region.offset % WORD_BYTES, 0);
        assert_eq!(region.padded_len, 16);
        assert_eq!(region.len, 15);
    }
}
