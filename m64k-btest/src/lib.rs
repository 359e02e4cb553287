//! btest binary test-vector format (.btest)
//!
//! Fixed-layout container for m68k single-instruction test vectors, loaded
//! by the m64k conformance harness. Each file holds one ordered suite of
//! tests; each test carries the CPU state before and after executing one
//! instruction. All multi-byte integers are big-endian u32, with no padding
//! and no alignment.
//!
//! **This is a pure codec** - it turns an in-memory suite into bytes and
//! back. How the suite was produced (gzipped JSON corpus, see btest-export)
//! and where the bytes land are the caller's business.
//!
//! # Layout
//!
//! ```text
//! 0x00: magic "M64K" (4 bytes)
//! 0x04: test_count u32
//!
//! Per test (in suite order):
//!   "TEST" marker (4 bytes, resync anchor)
//!   name_len u32
//!   name bytes (exactly name_len, no terminator)
//!   length u32 (instruction byte length, opaque to this crate)
//!   initial CpuState
//!   final CpuState
//!
//! CpuState (84 fixed bytes + 4 + 8 per ram pair):
//!   d0..d7 (8 x u32)
//!   a0..a6, usp, ssp (9 x u32)
//!   sr, pc (2 x u32)
//!   prefetch[0], prefetch[1] (2 x u32)
//!   ram_count u32
//!   ram pairs (address u32, value u32) in original access order
//! ```
//!
//! The `TEST` marker is an anchor, not a record length: a malformed record
//! cannot be skipped without corrupting every record after it, so encoding
//! never drops tests and decoding aborts on the first inconsistency.
//!
//! # Usage
//!
//! ```
//! use m64k_btest::{decode_suite, encode_suite_to_vec, TestCase};
//!
//! let suite = vec![TestCase {
//!     name: "NOP 0".to_string(),
//!     ..Default::default()
//! }];
//! let bytes = encode_suite_to_vec(&suite);
//! assert_eq!(decode_suite(&bytes).unwrap(), suite);
//! ```

mod decode;
mod encode;

pub use decode::decode_suite;
pub use encode::{encode_suite, encode_suite_to_vec, encoded_size};

use serde::Deserialize;

// =============================================================================
// Constants
// =============================================================================

/// File magic, first 4 bytes of every .btest file
pub const BTEST_MAGIC: [u8; 4] = *b"M64K";

/// Per-record marker preceding every serialized test
pub const TEST_MARKER: [u8; 4] = *b"TEST";

/// Fixed register block size per CpuState (21 x u32, before the ram count)
pub const STATE_FIXED_SIZE: usize = 84;

/// Bytes per (address, value) ram pair
pub const RAM_PAIR_SIZE: usize = 8;

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur while decoding .btest data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BtestError {
    /// File does not start with the "M64K" magic
    #[error("not a btest file (bad magic)")]
    BadMagic,
    /// A test record does not start with the "TEST" marker
    #[error("test {index}: missing TEST record marker")]
    BadMarker { index: usize },
    /// A test name is not valid UTF-8
    #[error("test {index}: name is not valid UTF-8")]
    BadName { index: usize },
    /// Data ended before the declared contents
    #[error("truncated btest data")]
    Truncated,
}

// =============================================================================
// Data Model
// =============================================================================

/// Full m68k register snapshot plus sparse memory overlay.
///
/// `ram` records (address, value) pairs in access order. The order is part
/// of the data: pairs are never sorted or deduplicated, and a sorted-map
/// container must not be substituted for the vector.
///
/// Field names match the JSON corpus, so the struct deserializes directly
/// from it. Fields absent from the JSON decode as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CpuState {
    pub d0: u32,
    pub d1: u32,
    pub d2: u32,
    pub d3: u32,
    pub d4: u32,
    pub d5: u32,
    pub d6: u32,
    pub d7: u32,
    pub a0: u32,
    pub a1: u32,
    pub a2: u32,
    pub a3: u32,
    pub a4: u32,
    pub a5: u32,
    pub a6: u32,
    pub usp: u32,
    pub ssp: u32,
    pub sr: u32,
    pub pc: u32,
    pub prefetch: [u32; 2],
    pub ram: Vec<(u32, u32)>,
}

impl CpuState {
    /// Encoded size in bytes: fixed register block + ram count + pairs
    pub fn encoded_size(&self) -> usize {
        STATE_FIXED_SIZE + 4 + RAM_PAIR_SIZE * self.ram.len()
    }
}

/// One unit of test data: a name, the (initial, final) state pair, and the
/// byte length of the instruction under test.
///
/// `length` is stored and transported opaquely; its semantics belong to the
/// harness that loads the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestCase {
    pub name: String,
    pub initial: CpuState,
    #[serde(rename = "final")]
    pub final_state: CpuState,
    pub length: u32,
}

impl TestCase {
    /// Encoded size in bytes: marker + name_len + name + length + two states
    pub fn encoded_size(&self) -> usize {
        TEST_MARKER.len()
            + 4
            + self.name.len()
            + 4
            + self.initial.encoded_size()
            + self.final_state.encoded_size()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_size_follows_ram_count() {
        let mut state = CpuState::default();
        assert_eq!(state.encoded_size(), 88);

        state.ram.push((0x1000, 0xAB));
        state.ram.push((0x1002, 0xCD));
        assert_eq!(state.encoded_size(), 88 + 16);
    }

    #[test]
    fn test_case_size_includes_name() {
        let case = TestCase {
            name: "MOVE.b 0".to_string(),
            ..Default::default()
        };
        assert_eq!(case.encoded_size(), 4 + 4 + 8 + 4 + 88 + 88);
    }

    #[test]
    fn test_deserialize_full_state() {
        let json = r#"{
            "d0": 1, "d1": 2, "d2": 3, "d3": 4,
            "d4": 5, "d5": 6, "d6": 7, "d7": 8,
            "a0": 9, "a1": 10, "a2": 11, "a3": 12,
            "a4": 13, "a5": 14, "a6": 15,
            "usp": 16, "ssp": 17, "sr": 18, "pc": 19,
            "prefetch": [20, 21],
            "ram": [[4096, 171], [4098, 205], [4096, 0]]
        }"#;
        let state: CpuState = serde_json::from_str(json).unwrap();
        assert_eq!(state.d0, 1);
        assert_eq!(state.d7, 8);
        assert_eq!(state.a6, 15);
        assert_eq!(state.usp, 16);
        assert_eq!(state.ssp, 17);
        assert_eq!(state.prefetch, [20, 21]);
        // Access order preserved, duplicates kept
        assert_eq!(state.ram, vec![(4096, 171), (4098, 205), (4096, 0)]);
    }

    #[test]
    fn test_deserialize_missing_fields_default_to_zero() {
        // The corpus omits fields that are zero for a given test
        let state: CpuState = serde_json::from_str(r#"{"pc": 4096}"#).unwrap();
        assert_eq!(state.pc, 4096);
        assert_eq!(state.d0, 0);
        assert_eq!(state.sr, 0);
        assert_eq!(state.prefetch, [0, 0]);
        assert!(state.ram.is_empty());
    }

    #[test]
    fn test_deserialize_test_case() {
        let json = r#"{
            "name": "NOP 17",
            "length": 2,
            "initial": {"pc": 4096},
            "final": {"pc": 4098}
        }"#;
        let case: TestCase = serde_json::from_str(json).unwrap();
        assert_eq!(case.name, "NOP 17");
        assert_eq!(case.length, 2);
        assert_eq!(case.initial.pc, 4096);
        assert_eq!(case.final_state.pc, 4098);
    }

    #[test]
    fn test_deserialize_rejects_wrong_shape() {
        // Register block of the wrong shape is a hard failure, not a default
        let result: Result<CpuState, _> =
            serde_json::from_str(r#"{"prefetch": [1, 2, 3]}"#);
        assert!(result.is_err());

        let result: Result<CpuState, _> = serde_json::from_str(r#"{"ram": [[1]]}"#);
        assert!(result.is_err());
    }
}
