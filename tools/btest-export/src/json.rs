//! Gzipped JSON corpus reader
//!
//! Each input file is a gzip stream wrapping one JSON array of test
//! objects. The model types in `m64k-btest` deserialize straight from the
//! corpus field names, with absent numeric fields defaulting to zero (the
//! corpus omits registers that happen to be zero for a given test).
//!
//! There is no partial-success mode: a malformed stream fails the whole
//! file, before any output is written.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use m64k_btest::TestCase;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read and decode one gzipped JSON test file into an ordered suite.
///
/// Test order and ram-pair order are preserved exactly as they appear in
/// the JSON arrays.
pub fn read_tests(path: &Path) -> Result<Vec<TestCase>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open test file: {}", path.display()))?;
    let gz = GzDecoder::new(BufReader::new(file));

    let tests: Vec<TestCase> = serde_json::from_reader(BufReader::new(gz))
        .with_context(|| format!("Failed to decode test file: {}", path.display()))?;

    Ok(tests)
}
