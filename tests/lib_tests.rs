use filebridge::engine::{PathMatcher, ProcessedLedger, candidate_path, scan};
use filebridge::error::ConfigErrorReason;
use filebridge::pipeline::OutputTemplate;
use filebridge::utils::{ConsumerConfig, ParamKeys, ProducerConfig};
use filebridge::{BridgeError, FailureKind, PatternErrorKind};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn touch(dir: &TempDir, name: &str) {
    fs::write(dir.path().join(name), name.as_bytes()).unwrap();
}

fn root_str(dir: &TempDir) -> String {
    dir.path().to_str().unwrap().to_string()
}

// --- PathMatcher ---

#[test]
fn test_matcher_is_full_match() {
    let m = PathMatcher::compile(r".*\.txt").unwrap();
    assert!(m.matches("a.txt"));
    assert!(!m.matches("a.txt.bak"));
    assert!(!m.matches("xa.tx"));
    let m = PathMatcher::compile("img").unwrap();
    assert!(m.matches("img"));
    assert!(!m.matches("img1"));
}

#[test]
fn test_matcher_reports_error_class() {
    let err = PathMatcher::compile("a{3,1}").unwrap_err();
    match err {
        BridgeError::PatternCompile { pattern, kind, .. } => {
            assert_eq!(pattern, "a{3,1}");
            assert_eq!(kind, PatternErrorKind::BadBrace);
        }
        other => panic!("unexpected error: {other}"),
    }
    let err = PathMatcher::compile("(abc").unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::PatternCompile);
}

// --- scan ---

#[test]
fn test_scan_filters_and_sorts() {
    let dir = TempDir::new().unwrap();
    for name in ["b.txt", "c.log", "a.txt"] {
        touch(&dir, name);
    }
    fs::create_dir(dir.path().join("d.txt")).unwrap();
    let root = root_str(&dir);
    let m = PathMatcher::compile(r".*\.txt").unwrap();

    let found = scan(&root, &m, &ProcessedLedger::new()).unwrap();
    assert_eq!(
        found,
        vec![candidate_path(&root, "a.txt"), candidate_path(&root, "b.txt")]
    );
}

#[test]
fn test_scan_excludes_ledger_entries() {
    let dir = TempDir::new().unwrap();
    touch(&dir, "a.txt");
    touch(&dir, "b.txt");
    let root = root_str(&dir);
    let m = PathMatcher::compile(".*").unwrap();

    let mut ledger = ProcessedLedger::new();
    ledger.insert(&candidate_path(&root, "a.txt"));
    let found = scan(&root, &m, &ledger).unwrap();
    assert_eq!(found, vec![candidate_path(&root, "b.txt")]);
}

#[test]
fn test_scan_trailing_slash_root_not_doubled() {
    let dir = TempDir::new().unwrap();
    touch(&dir, "a.txt");
    let root = format!("{}/", root_str(&dir));
    let m = PathMatcher::compile(".*").unwrap();
    let found = scan(&root, &m, &ProcessedLedger::new()).unwrap();
    assert_eq!(found.len(), 1);
    assert!(!found[0].contains("//"));
}

#[test]
fn test_scan_empty_dir_is_ok() {
    let dir = TempDir::new().unwrap();
    let m = PathMatcher::compile(".*").unwrap();
    assert!(
        scan(&root_str(&dir), &m, &ProcessedLedger::new())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_scan_missing_root_is_scan_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    let m = PathMatcher::compile(".*").unwrap();
    let err = scan(missing.to_str().unwrap(), &m, &ProcessedLedger::new()).unwrap_err();
    assert_eq!(err.failure_kind(), FailureKind::Scan);
}

#[test]
fn test_scan_file_root_is_scan_error() {
    let dir = TempDir::new().unwrap();
    touch(&dir, "plain");
    let root = dir.path().join("plain");
    let m = PathMatcher::compile(".*").unwrap();
    let err = scan(root.to_str().unwrap(), &m, &ProcessedLedger::new()).unwrap_err();
    assert!(matches!(err, BridgeError::Scan { .. }));
}

// --- config parsing ---

#[test]
fn test_producer_params_defaults() {
    let c = ProducerConfig::from_params(&params(&[
        (ParamKeys::PATH, "/in"),
        (ParamKeys::FILENAME_RGX, r".*\.jpg"),
    ]))
    .unwrap();
    assert_eq!(c, ProducerConfig::new("/in", r".*\.jpg"));
}

#[test]
fn test_producer_params_all_keys() {
    let c = ProducerConfig::from_params(&params(&[
        ("path", "/in"),
        ("filename_rgx", ".*"),
        ("publishrate", "2.5"),
        ("repeatcount", "-1"),
        ("blocksize", "10"),
        ("transactional", "true"),
        ("publishwithupsert", "true"),
        ("rescandelay", "250"),
    ]))
    .unwrap();
    assert_eq!(c.publish_rate, 2.5);
    assert_eq!(c.repeat_count, -1);
    assert_eq!(c.block_size, 10);
    assert!(c.transactional);
    assert!(c.publish_with_upsert);
    assert_eq!(c.rescan_delay_ms, 250);
}

#[test]
fn test_producer_params_missing_path() {
    let err = ProducerConfig::from_params(&params(&[("filename_rgx", ".*")])).unwrap_err();
    assert_eq!(err.key, "path");
    assert_eq!(err.reason, ConfigErrorReason::Missing);
}

#[test]
fn test_producer_params_invalid_values() {
    let base = [("path", "/in"), ("filename_rgx", ".*")];
    for (key, value) in [
        ("blocksize", "0"),
        ("blocksize", "many"),
        ("repeatcount", "1.5"),
        ("publishrate", "fast"),
        ("publishrate", "inf"),
        ("transactional", "yes"),
    ] {
        let mut p = params(&base);
        p.insert(key.to_string(), value.to_string());
        let err = ProducerConfig::from_params(&p).unwrap_err();
        assert_eq!(err.key, key, "value {value}");
        assert_eq!(err.reason, ConfigErrorReason::InvalidValue);
    }
}

#[test]
fn test_consumer_params() {
    let c = ConsumerConfig::from_params(&params(&[
        ("filename", "/out/frame.jpg"),
        ("datafieldname", "image"),
    ]))
    .unwrap();
    assert_eq!(c, ConsumerConfig::new("/out/frame.jpg", "image"));

    let err = ConsumerConfig::from_params(&params(&[("filename", "/out/frame.jpg")])).unwrap_err();
    assert_eq!(err.key, "datafieldname");
}

#[test]
fn test_config_error_converts_to_bridge_error() {
    let err: BridgeError = ConsumerConfig::new("", "x").validate().unwrap_err().into();
    assert_eq!(err.failure_kind(), FailureKind::Config);
    assert!(err.to_string().contains("filename"));
}

// --- OutputTemplate ---

#[test]
fn test_template_numbering() {
    let t = OutputTemplate::parse("/out/frame.jpg");
    assert_eq!(t.path_for(1), PathBuf::from("/out/frame1.jpg"));
    assert_eq!(t.path_for(12), PathBuf::from("/out/frame12.jpg"));
}
