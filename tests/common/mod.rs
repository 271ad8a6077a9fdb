#![allow(dead_code)]

pub mod config_test_utils;
pub mod scan_server;

use fraudshield::common::ProgressFn;
use fraudshield::transfer::FileRef;
use std::sync::{Arc, Mutex};

pub const TWO_MB: usize = 2 * 1024 * 1024;

pub fn document(name: &str, size: usize) -> FileRef {
    let payload: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    FileRef::new(name, "application/pdf", payload)
}

/// Progress callback that records every value it is given.
pub fn progress_recorder() -> (ProgressFn, Arc<Mutex<Vec<u8>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (Arc::new(move |pct: u8| sink.lock().unwrap().push(pct)), seen)
}

pub fn assert_monotonic_to_hundred(values: &[u8]) {
    assert!(!values.is_empty(), "no progress reported");
    assert!(
        values.windows(2).all(|w| w[0] < w[1]),
        "progress not strictly increasing: {values:?}"
    );
    assert_eq!(values.last(), Some(&100), "progress did not end at 100: {values:?}");
}
