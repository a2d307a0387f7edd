//! Integration test: the memory-map log written into the output directory.

use sprawl_arena::{ArenaConfig, ErrorKind, GridArena};
use sprawl_core::{owner, GridKind};
use sprawl_test_utils::{init_tracing, scenario_config, temp_output_dir};

fn read_log(arena: &GridArena) -> String {
    let path = arena.memory_log_path().expect("memory log enabled");
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn log_lists_layout_and_every_slot() {
    init_tracing();
    let dir = temp_output_dir();
    let arena = GridArena::new(scenario_config().with_memory_log(dir.path())).unwrap();
    assert_eq!(
        arena.memory_log_path().unwrap(),
        dir.path().join("memory.log")
    );

    let text = read_log(&arena);
    assert!(text.contains("rows = 100\n"));
    assert!(text.contains("igrid_count = 3\n"));
    assert!(text.contains("pgrid_count = 7\n"));
    assert!(text.contains("wgrid_count = 6\n"));
    assert!(text.contains("total_bytes = 160068\n"));
    assert!(text.contains("Memory starts at"));
    assert_eq!(text.lines().filter(|l| l.contains(" guard[")).count(), 17);
    assert_eq!(text.lines().filter(|l| l.contains(" wgrid[")).count(), 6);
    assert!(text.contains("end of memory"));
}

#[test]
fn log_records_checks_and_min_free() {
    let dir = temp_output_dir();
    let mut arena = GridArena::new(scenario_config().with_memory_log(dir.path())).unwrap();
    let a = arena.acquire(GridKind::Working, owner!("grow")).unwrap();
    let b = arena.acquire(GridKind::Working, owner!("grow")).unwrap();
    arena.release(a, owner!("grow")).unwrap();
    arena.release(b, owner!("grow")).unwrap();
    arena.check_memory(owner!("end_of_year")).unwrap();
    arena.log_min_free().unwrap();

    let text = read_log(&arena);
    assert!(text.contains("MEMORY CHECK at module"));
    assert!(text.contains("function end_of_year"));
    assert!(text.contains("MEMORY CHECK OK"));
    assert!(text.contains("reduce working grid count by 4"));
}

#[test]
fn failed_check_is_logged() {
    let dir = temp_output_dir();
    let mut arena = GridArena::new(scenario_config().with_memory_log(dir.path())).unwrap();
    arena.raw_bytes_mut()[0] = 0;
    let err = arena.check_memory(owner!("audit")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GuardCorruption);
    assert!(read_log(&arena).contains("MEMORY CHECK FAILED"));
}

#[test]
fn no_log_unless_requested() {
    let dir = temp_output_dir();
    let mut config = ArenaConfig::new(10, 10).with_grid_counts(1, 1, 1);
    config.output_dir = Some(dir.path().to_path_buf());
    let arena = GridArena::new(config).unwrap();
    assert!(arena.memory_log_path().is_none());
    assert!(!dir.path().join("memory.log").exists());
}

#[test]
fn unwritable_output_dir_fails_construction() {
    let dir = temp_output_dir();
    let missing = dir.path().join("does/not/exist");
    let err = GridArena::new(ArenaConfig::new(10, 10).with_memory_log(missing))
        .err()
        .expect("construction should fail");
    assert_eq!(err.kind(), ErrorKind::Io);
}
