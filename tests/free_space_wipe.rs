/// End-to-end free-space wipe tests
///
/// Every wipe runs against a scratch directory with a fake volume provider
/// reporting a few MiB of free space, so both phases complete quickly.
mod common;

use common::test_helpers::{
    calculate_entropy, scaled_config, FakeVolume, PassInspector, UnreadableVolume,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wipeme::{
    NullSink, Progress, RecordingSink, WipeConfig, WipeError, WipeMethod, WipePhase, Wiper, KIB,
    MIB,
};

fn wiper(volume: &TempDir, method: WipeMethod, free: u64, min_buffer: u64) -> Wiper {
    Wiper::new(volume.path(), method)
        .expect("scratch directory is a valid volume")
        .with_config(scaled_config(min_buffer))
        .with_volume_info(Arc::new(FakeVolume::new(free)))
}

#[test]
fn test_single_pass_ten_units() {
    // One unit = 1 MiB: 10 free, 1 buffer
    let volume = TempDir::new().unwrap();
    let w = wiper(&volume, WipeMethod::SinglePassZeros, 10 * MIB, MIB);
    let inspector = PassInspector::new(w.temp_dir_path());

    let report = w.wipe_free_space(&inspector).unwrap();

    assert_eq!(report.phase1_target, 9 * MIB);
    assert_eq!(report.phase1_written, 9 * MIB);
    assert!(report.reclaimed_bytes >= MIB / 2);
    assert_eq!(report.phase2_target, report.reclaimed_bytes + MIB);
    assert_eq!(report.phase2_written, report.phase2_target);
    assert!(!w.temp_dir_path().exists());

    let captures = inspector.captures();
    assert_eq!(captures.len(), 2);
    for capture in &captures {
        assert!(capture.data.iter().all(|&b| b == 0x00));
    }
    assert_eq!(captures[0].data.len() as u64, 9 * MIB);
    assert_eq!(captures[1].data.len() as u64, report.phase2_target);
}

#[test]
fn test_dod_pass_contents() {
    let volume = TempDir::new().unwrap();
    let w = wiper(&volume, WipeMethod::DoD522022M, 2 * MIB, 256 * KIB);
    let inspector = PassInspector::new(w.temp_dir_path());

    w.wipe_free_space(&inspector).unwrap();

    let captures = inspector.captures();
    assert_eq!(captures.len(), 6, "Three passes in each phase");

    for capture in &captures {
        assert!(!capture.data.is_empty());
        match capture.pass {
            1 => assert!(capture.data.iter().all(|&b| b == 0x00), "{}", capture.label),
            2 => assert!(capture.data.iter().all(|&b| b == 0xFF), "{}", capture.label),
            3 => {
                assert!(!capture.data.iter().all(|&b| b == 0x00));
                assert!(!capture.data.iter().all(|&b| b == 0xFF));
                assert!(calculate_entropy(&capture.data) > 7.9);
            }
            other => panic!("unexpected pass {}", other),
        }
    }
}

#[test]
fn test_gutmann_pass_contents() {
    let volume = TempDir::new().unwrap();
    let w = wiper(&volume, WipeMethod::Gutmann, 2 * MIB, 256 * KIB);
    let inspector = PassInspector::new(w.temp_dir_path());

    let report = w.wipe_free_space(&inspector).unwrap();
    assert_eq!(report.phase1_written, 35 * (2 * MIB - 256 * KIB));

    let phase1: Vec<_> = inspector
        .captures()
        .into_iter()
        .filter(|c| c.phase == WipePhase::Fill)
        .collect();
    assert_eq!(phase1.len(), 35);

    let table = [
        0x55u8, 0xAA, 0x92, 0x49, 0x24, 0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88,
        0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
    ];
    for capture in &phase1 {
        if (5..=31).contains(&capture.pass) {
            let expected = table[(capture.pass - 5) % table.len()];
            assert!(
                capture.data.iter().all(|&b| b == expected),
                "{} should be 0x{:02X}",
                capture.label,
                expected
            );
        } else {
            assert!(calculate_entropy(&capture.data) > 7.9, "{}", capture.label);
        }
    }
    assert!(!w.temp_dir_path().exists());
}

fn gutmann_random_passes(volume: &TempDir) -> Vec<Vec<u8>> {
    let w = wiper(volume, WipeMethod::Gutmann, 2 * MIB, 256 * KIB);
    let inspector = PassInspector::new(w.temp_dir_path());
    w.wipe_free_space(&inspector).unwrap();

    inspector
        .captures()
        .into_iter()
        .filter(|c| c.phase == WipePhase::Fill && (c.pass <= 4 || c.pass >= 32))
        .map(|c| c.data)
        .collect()
}

#[test]
fn test_gutmann_random_passes_never_repeat() {
    let volume = TempDir::new().unwrap();
    let first = gutmann_random_passes(&volume);
    let second = gutmann_random_passes(&volume);

    assert_eq!(first.len(), 8);
    assert_eq!(second.len(), 8);
    for (i, data) in first.iter().enumerate() {
        for other in &first[i + 1..] {
            assert_ne!(data, other, "random passes within one wipe repeated");
        }
    }
    assert_ne!(first[0], second[0], "pass 1 repeated across wipes");
    assert_ne!(first[7], second[7], "pass 35 repeated across wipes");
}

#[test]
fn test_no_recycling_still_cleans_up() {
    let volume = TempDir::new().unwrap();
    let config = WipeConfig {
        recycle_pass_files: false,
        ..scaled_config(256 * KIB)
    };
    let w = Wiper::new(volume.path(), WipeMethod::DoD522022M)
        .unwrap()
        .with_config(config)
        .with_volume_info(Arc::new(FakeVolume::new(2 * MIB)));

    let report = w.wipe_free_space(&NullSink).unwrap();

    assert_eq!(report.phase2_written, 3 * report.phase2_target);
    assert!(!w.temp_dir_path().exists());
}

#[test]
fn test_progress_phases_in_order() {
    let volume = TempDir::new().unwrap();
    let w = wiper(&volume, WipeMethod::DoD522022M, 2 * MIB, 256 * KIB);
    let sink = RecordingSink::new();

    w.wipe_free_space(&sink).unwrap();

    let records = sink.snapshot();
    let first_refill = records
        .iter()
        .position(|p| p.phase == WipePhase::Refill)
        .unwrap();
    assert!(records[..first_refill].iter().all(|p| p.phase == WipePhase::Fill));
    assert!(records[first_refill..].iter().all(|p| p.phase == WipePhase::Refill));
    assert!(records.iter().all(|p| p.percentage() <= 100.0));
}

#[test]
fn test_query_failure_leaves_no_temp_dir() {
    let volume = TempDir::new().unwrap();
    let w = Wiper::new(volume.path(), WipeMethod::Gutmann)
        .unwrap()
        .with_volume_info(Arc::new(UnreadableVolume));

    let err = w.wipe_free_space(&NullSink).unwrap_err();

    assert!(matches!(err, WipeError::VolumeQuery { .. }));
    assert!(!w.temp_dir_path().exists());
}

#[test]
fn test_insufficient_space_queries_once() {
    let volume = TempDir::new().unwrap();
    let provider = Arc::new(FakeVolume::new(256 * KIB));
    let w = Wiper::new(volume.path(), WipeMethod::SinglePassZeros)
        .unwrap()
        .with_config(scaled_config(256 * KIB))
        .with_volume_info(provider.clone());

    let err = w.wipe_free_space(&NullSink).unwrap_err();

    assert!(matches!(err, WipeError::InsufficientSpace { .. }));
    assert_eq!(provider.queries(), 1);
    assert!(!w.temp_dir_path().exists());
}

#[test]
fn test_concurrent_wipe_is_rejected() {
    let volume = TempDir::new().unwrap();
    let first = wiper(&volume, WipeMethod::SinglePassZeros, 2 * MIB, 256 * KIB);
    let second = wiper(&volume, WipeMethod::SinglePassZeros, 2 * MIB, 256 * KIB);
    let second_result = Mutex::new(None);

    // Start the second wipe while the first is writing its first chunk
    let sink = |_p: Progress| {
        let mut slot = second_result.lock().unwrap();
        if slot.is_none() {
            *slot = Some(second.wipe_free_space(&NullSink));
        }
    };

    first.wipe_free_space(&sink).unwrap();

    let result = second_result.into_inner().unwrap().unwrap();
    assert!(matches!(result, Err(WipeError::TempDirInUse(_))));
    assert!(!first.temp_dir_path().exists());
}

#[test]
fn test_volume_must_be_directory() {
    let volume = TempDir::new().unwrap();
    let file = volume.path().join("not-a-volume");
    std::fs::write(&file, b"").unwrap();

    assert!(matches!(
        Wiper::new(&file, WipeMethod::SinglePassZeros),
        Err(WipeError::InvalidVolume { .. })
    ));
}
