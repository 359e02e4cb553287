//! Per-file conversion pipeline and input discovery
//!
//! One file is read, decoded and encoded to completion before the next
//! begins; nothing is cached across files. Output is written to a `.tmp`
//! sibling and renamed into place, so a failure never leaves a partial
//! `.btest` at the final name.

use anyhow::{Context, Result};
use m64k_btest::{encode_suite, encoded_size};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::json;

/// Input files end with this suffix
pub const INPUT_SUFFIX: &str = ".json.gz";

/// Output files end with this suffix
pub const OUTPUT_SUFFIX: &str = ".btest";

/// What one conversion produced, for logging and summaries
#[derive(Debug, Clone, Copy)]
pub struct ConvertStats {
    pub tests: usize,
    pub bytes: usize,
}

/// Derive the output path: strip the `.json.gz` suffix, append `.btest`.
///
/// `ADD.b.json.gz` becomes `ADD.b.btest`. An input without the expected
/// suffix just gets `.btest` appended.
pub fn output_path(input: &Path) -> PathBuf {
    let name = input.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let stem = name.strip_suffix(INPUT_SUFFIX).unwrap_or(name);
    input.with_file_name(format!("{}{}", stem, OUTPUT_SUFFIX))
}

/// Convert one gzipped JSON test file to a `.btest` file.
///
/// The suite is fully decoded before any output exists; encode errors tear
/// down the temp file. Only a completely written file is renamed to
/// `output`.
pub fn convert_file(input: &Path, output: &Path) -> Result<ConvertStats> {
    let tests = json::read_tests(input)?;
    let bytes = encoded_size(&tests);

    let tmp = output.with_file_name(format!(
        "{}.tmp",
        output.file_name().and_then(|n| n.to_str()).unwrap_or("out.btest")
    ));

    if let Err(err) = write_btest(&tmp, &tests) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    fs::rename(&tmp, output)
        .with_context(|| format!("Failed to move output into place: {}", output.display()))?;

    Ok(ConvertStats {
        tests: tests.len(),
        bytes,
    })
}

fn write_btest(path: &Path, tests: &[m64k_btest::TestCase]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut w = BufWriter::new(file);
    encode_suite(&mut w, tests)
        .with_context(|| format!("Failed to write btest data: {}", path.display()))?;
    w.flush()
        .with_context(|| format!("Failed to flush output file: {}", path.display()))?;
    Ok(())
}

/// Find all `.json.gz` files under `dir`, sorted for a stable run order.
///
/// Non-recursive by default; `recursive` lifts the depth limit.
pub fn find_inputs(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut inputs = Vec::new();

    for entry in WalkDir::new(dir)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
    {
        let entry = entry.with_context(|| format!("Failed to scan: {}", dir.display()))?;
        let path = entry.path();
        let is_input = path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(INPUT_SUFFIX));
        if is_input {
            inputs.push(path.to_path_buf());
        }
    }

    inputs.sort();
    Ok(inputs)
}
