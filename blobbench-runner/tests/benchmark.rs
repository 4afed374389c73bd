use std::sync::Arc;
use std::time::Duration;

use blobbench_runner::phase::PhaseKind;
use blobbench_runner::{BenchError, Benchmark, BenchmarkConfig};
use blobbench_storage::{MemoryClient, StorageClient};
use blobbench_test::client::RecordingClient;
use bytesize::ByteSize;

fn config(storage_uri: &str, threads: usize, loops: u32) -> BenchmarkConfig {
    BenchmarkConfig {
        threads,
        loops,
        duration: Duration::from_millis(250),
        object_size: ByteSize::kib(16),
        ..BenchmarkConfig::new(storage_uri)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn repeated_loops_are_independent() {
    blobbench_test::tracing::init();

    let tempdir = tempfile::tempdir().unwrap();
    let log_file = tempdir.path().join("benchmark.log");
    let config = BenchmarkConfig {
        log_file: Some(log_file.clone()),
        ..config("mem://repeated-loops", 4, 2)
    };

    let benchmark = Benchmark::connect(config).unwrap();
    let reports = benchmark.run().await.unwrap();
    assert_eq!(reports.len(), 2);

    for (index, report) in reports.iter().enumerate() {
        let loop_index = index as u32 + 1;
        assert_eq!(report.upload.loop_index, loop_index);
        assert_eq!(report.upload.kind, PhaseKind::Upload);
        assert_eq!(report.download.kind, PhaseKind::Download);
        assert_eq!(report.delete.kind, PhaseKind::Delete);

        assert!(report.upload.objects >= 1);
        assert!(report.upload.elapsed >= Duration::from_millis(250));
        assert!(report.download.elapsed >= Duration::from_millis(250));
        // Counters start from zero in every loop, so each delete phase matches its own upload.
        assert_eq!(report.delete.objects, report.upload.objects);
    }

    let store = MemoryClient::named("repeated-loops");
    assert_eq!(store.object_count("blobbench-container"), Some(0));

    let log = std::fs::read_to_string(&log_file).unwrap();
    let lines: Vec<_> = log.lines().collect();
    assert_eq!(lines.len(), 7);
    assert!(lines[0].contains("Parameters: storage_uri=mem://repeated-loops"));
    assert!(lines[1].contains("Loop 1: PUT time"));
    assert!(lines[2].contains("Loop 1: GET time"));
    assert!(lines[3].contains("Loop 1: DELETE time"));
    assert!(lines[4].contains("Loop 2: PUT time"));
    assert!(lines[6].contains("Loop 2: DELETE time"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn single_worker_on_filesystem() {
    blobbench_test::tracing::init();

    let tempdir = tempfile::tempdir().unwrap();
    let uri = format!("file://{}", tempdir.path().display());

    let benchmark = Benchmark::connect(config(&uri, 1, 1)).unwrap();
    let reports = benchmark.run().await.unwrap();

    let report = &reports[0];
    assert!(report.upload.objects >= 1);
    assert!(report.download.objects >= 1);
    assert_eq!(report.delete.objects, report.upload.objects);

    let remaining = std::fs::read_dir(tempdir.path().join("blobbench-container"))
        .unwrap()
        .count();
    assert_eq!(remaining, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_phase_stays_in_uploaded_key_space() {
    blobbench_test::tracing::init();

    let client = RecordingClient::new();
    let handles = (0..4)
        .map(|_| Arc::new(client.clone()) as Arc<dyn StorageClient>)
        .collect();
    let benchmark = Benchmark::with_clients(config("mem://unused", 4, 1), handles);

    let report = benchmark.run().await.unwrap().remove(0);
    let uploaded = report.upload.objects;

    let parse = |key: &String| -> u64 { key.strip_prefix("Object-").unwrap().parse().unwrap() };

    let mut written: Vec<_> = client.written_keys().iter().map(parse).collect();
    written.sort_unstable();
    assert_eq!(written, (1..=uploaded).collect::<Vec<_>>());

    assert!(!client.read_keys().is_empty());
    assert!(client.read_keys().iter().map(parse).all(|n| (1..=uploaded).contains(&n)));

    let mut deleted: Vec<_> = client.deleted_keys().iter().map(parse).collect();
    deleted.sort_unstable();
    assert_eq!(deleted, written);
}

#[tokio::test]
async fn write_failure_aborts_without_report() {
    blobbench_test::tracing::init();

    let tempdir = tempfile::tempdir().unwrap();
    let log_file = tempdir.path().join("benchmark.log");

    let client = RecordingClient::new().failing_writes_after(3);
    let handles = vec![Arc::new(client.clone()) as Arc<dyn StorageClient>];
    let config = BenchmarkConfig {
        log_file: Some(log_file.clone()),
        ..config("mem://unused", 1, 3)
    };

    let error = Benchmark::with_clients(config, handles)
        .run()
        .await
        .unwrap_err();
    let BenchError::Phase { phase, key, .. } = error else {
        panic!("unexpected error: {error:?}");
    };
    assert_eq!(phase, PhaseKind::Upload);
    assert_eq!(key, "Object-4");

    // Only the parameters line has been written.
    let log = std::fs::read_to_string(&log_file).unwrap();
    assert_eq!(log.lines().count(), 1);
}

#[tokio::test]
async fn read_failure_discards_iteration_report() {
    blobbench_test::tracing::init();

    let tempdir = tempfile::tempdir().unwrap();
    let log_file = tempdir.path().join("benchmark.log");

    let client = RecordingClient::new().failing_reads();
    let handles = vec![Arc::new(client.clone()) as Arc<dyn StorageClient>];
    let config = BenchmarkConfig {
        log_file: Some(log_file.clone()),
        duration: Duration::from_millis(50),
        object_size: ByteSize::kib(1),
        ..config("mem://unused", 1, 1)
    };

    let error = Benchmark::with_clients(config, handles)
        .run()
        .await
        .unwrap_err();
    let BenchError::Phase { phase, .. } = error else {
        panic!("unexpected error: {error:?}");
    };
    assert_eq!(phase, PhaseKind::Download);
    assert!(!client.written_keys().is_empty());

    // The upload succeeded, but the failed iteration is not reported.
    let log = std::fs::read_to_string(&log_file).unwrap();
    let lines: Vec<_> = log.lines().collect();
    assert_eq!(lines.len(), 1, "{log}");
    assert!(lines[0].contains("Parameters: "));
    assert!(lines[0].contains("size=1.0 KiB"));
}
