//! btest encoder implementation
//!
//! This module handles serializing a test suite to the fixed binary layout.
//! The output is the wire contract the conformance harness loads, so the
//! byte stream must be identical for identical input on every platform:
//! fixed field order, big-endian u32s, no padding.

use std::io::{self, Write};

use crate::{CpuState, TestCase, BTEST_MAGIC, TEST_MARKER};

#[inline]
fn w32<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_be_bytes())
}

/// Write one CpuState block (registers, prefetch, ram pairs).
///
/// Initial and final states use the same layout with no tag; their position
/// within the record is what tells them apart.
fn encode_state<W: Write>(w: &mut W, s: &CpuState) -> io::Result<()> {
    w32(w, s.d0)?;
    w32(w, s.d1)?;
    w32(w, s.d2)?;
    w32(w, s.d3)?;
    w32(w, s.d4)?;
    w32(w, s.d5)?;
    w32(w, s.d6)?;
    w32(w, s.d7)?;
    w32(w, s.a0)?;
    w32(w, s.a1)?;
    w32(w, s.a2)?;
    w32(w, s.a3)?;
    w32(w, s.a4)?;
    w32(w, s.a5)?;
    w32(w, s.a6)?;
    w32(w, s.usp)?;
    w32(w, s.ssp)?;
    w32(w, s.sr)?;
    w32(w, s.pc)?;
    w32(w, s.prefetch[0])?;
    w32(w, s.prefetch[1])?;

    w32(w, s.ram.len() as u32)?;
    for &(addr, value) in &s.ram {
        w32(w, addr)?;
        w32(w, value)?;
    }

    Ok(())
}

/// Serialize a complete test suite to a writer.
///
/// No content validation happens here: tests are written as given, in
/// order. The only failure mode is a write error from the sink, which is
/// propagated as-is. There is no way to skip a test mid-stream - doing so
/// would break the `TEST` marker resync invariant for every later record.
pub fn encode_suite<W: Write>(w: &mut W, tests: &[TestCase]) -> io::Result<()> {
    w.write_all(&BTEST_MAGIC)?;
    w32(w, tests.len() as u32)?;

    for test in tests {
        w.write_all(&TEST_MARKER)?;
        w32(w, test.name.len() as u32)?;
        w.write_all(test.name.as_bytes())?;
        w32(w, test.length)?;
        encode_state(w, &test.initial)?;
        encode_state(w, &test.final_state)?;
    }

    Ok(())
}

/// Serialize a complete test suite to a preallocated byte vector.
pub fn encode_suite_to_vec(tests: &[TestCase]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_size(tests));
    encode_suite(&mut out, tests).expect("writing to a Vec cannot fail");
    out
}

/// Exact encoded size in bytes of a whole suite (header included)
pub fn encoded_size(tests: &[TestCase]) -> usize {
    8 + tests.iter().map(TestCase::encoded_size).sum::<usize>()
}
