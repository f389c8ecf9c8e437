//! End-to-end tests over an on-disk CSV trace

use sim_workload::{CacheConfig, WorkloadCache, WorkloadError, WorkloadLoader};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Write a small trace: three machines with samples, one metadata-only row,
/// and one interference group.
fn write_trace(base: &Path, name: &str) {
    let dir = base.join(name);
    fs::create_dir_all(&dir).unwrap();

    fs::write(
        dir.join("resource_states.csv"),
        "id,timestamp,duration,cpu_count,cpu_usage\n\
         vm-a,1000,1000,4,100.0\n\
         vm-a,3000,1000,4,50.0\n\
         vm-b,6000,1000,2,200.0\n\
         vm-c,6000,1000,1,10.0\n",
    )
    .unwrap();

    fs::write(
        dir.join("resources.csv"),
        "id,start_time,stop_time,cpu_count,cpu_capacity,mem_capacity\n\
         vm-b,5000,20000,2,2000.0,2048000\n\
         vm-a,0,10000,4,3000.0,4096000\n\
         vm-c,5000,20000,1,1000.0,1024000\n\
         vm-ghost,0,10000,1,1000.0,1024000\n",
    )
    .unwrap();

    fs::write(
        dir.join("interference_groups.json"),
        r#"[{"members": ["vm-a", "vm-b"], "target": 0.8, "score": 0.9}]"#,
    )
    .unwrap();
}

#[test]
fn loads_a_csv_trace_end_to_end() {
    init_logging();
    let base = TempDir::new().unwrap();
    write_trace(base.path(), "azure-small");

    let loader = WorkloadLoader::new(base.path());
    let machines = loader.load("azure-small", "csv").unwrap();

    // vm-ghost has no demand samples and is dropped; the rest are sorted by
    // start time with the tie between vm-b and vm-c preserving table order.
    let names: Vec<&str> = machines.iter().map(|vm| vm.name.as_str()).collect();
    assert_eq!(names, ["vm-a", "vm-b", "vm-c"]);

    let vm_a = &machines[0];
    // Sample windows [0,1000) and [2000,3000) leave an idle gap at [1000,2000).
    assert_eq!(vm_a.trace.len(), 3);
    assert!(vm_a.trace.fragments()[1].is_idle());
    assert_eq!(vm_a.total_load, 150.0);
    assert_eq!(vm_a.mem_capacity_mb, 4096);
    assert_eq!(vm_a.gpu_capacity_mhz, 0.0);
    assert!(vm_a.interference_profile.is_some());
    assert!(machines[2].interference_profile.is_none());
}

#[test]
fn reloading_yields_identical_machines() {
    init_logging();
    let base = TempDir::new().unwrap();
    write_trace(base.path(), "azure-small");

    let loader = WorkloadLoader::new(base.path());
    let first = loader.load("azure-small", "csv").unwrap();
    let second = loader.load("azure-small", "csv").unwrap();

    assert_eq!(first, second);
    let uids: Vec<_> = first.iter().map(|vm| vm.uid).collect();
    let reloaded: Vec<_> = second.iter().map(|vm| vm.uid).collect();
    assert_eq!(uids, reloaded);
}

#[test]
fn missing_trace_directory_fails_the_load() {
    init_logging();
    let base = TempDir::new().unwrap();

    let loader = WorkloadLoader::new(base.path());
    let err = loader.load("no-such-trace", "csv").unwrap_err();
    assert!(matches!(err, WorkloadError::Trace(_)));
}

#[test]
fn cache_serves_repeated_runs_without_reparsing() {
    init_logging();
    let base = TempDir::new().unwrap();
    write_trace(base.path(), "azure-small");

    let cache = WorkloadCache::new(WorkloadLoader::new(base.path()));
    let first = cache.get("azure-small", "csv").unwrap();
    let second = cache.get("azure-small", "csv").unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    cache.reset();
    let third = cache.get("azure-small", "csv").unwrap();
    assert_eq!(*first, *third);

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses), (1, 2));
}

#[test]
fn cache_rejects_unknown_formats() {
    init_logging();
    let base = TempDir::new().unwrap();
    write_trace(base.path(), "azure-small");

    let cache = WorkloadCache::with_config(
        WorkloadLoader::new(base.path()),
        CacheConfig { max_bytes: 64 * 1024 },
    );
    assert!(cache.get("azure-small", "parquet").is_err());
    assert!(cache.get("azure-small", "csv").is_ok());
}
