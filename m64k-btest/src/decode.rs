//! btest decoder implementation
//!
//! Symmetric decoder for the .btest layout. The whole suite is materialized
//! in memory; there is no streaming mode. Decoding is all-or-nothing: any
//! inconsistency (bad magic, missing marker, truncation) aborts with an
//! error rather than returning a partial suite.

use crate::{BtestError, CpuState, TestCase, BTEST_MAGIC, TEST_MARKER};

/// Cursor over the raw bytes, failing with `Truncated` when data runs out
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], BtestError> {
        let end = self.pos.checked_add(n).ok_or(BtestError::Truncated)?;
        if end > self.bytes.len() {
            return Err(BtestError::Truncated);
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, BtestError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

fn decode_state(r: &mut Reader) -> Result<CpuState, BtestError> {
    // Struct literal fields evaluate in written order, which matches the
    // wire order exactly.
    let mut state = CpuState {
        d0: r.u32()?,
        d1: r.u32()?,
        d2: r.u32()?,
        d3: r.u32()?,
        d4: r.u32()?,
        d5: r.u32()?,
        d6: r.u32()?,
        d7: r.u32()?,
        a0: r.u32()?,
        a1: r.u32()?,
        a2: r.u32()?,
        a3: r.u32()?,
        a4: r.u32()?,
        a5: r.u32()?,
        a6: r.u32()?,
        usp: r.u32()?,
        ssp: r.u32()?,
        sr: r.u32()?,
        pc: r.u32()?,
        prefetch: [r.u32()?, r.u32()?],
        ram: Vec::new(),
    };
    let ram_count = r.u32()?;
    // Don't trust the declared count for preallocation; a truncated file
    // would otherwise ask for an absurd reservation before failing.
    for _ in 0..ram_count {
        let addr = r.u32()?;
        let value = r.u32()?;
        state.ram.push((addr, value));
    }

    Ok(state)
}

/// Decode a complete .btest byte stream back into a test suite.
///
/// # Errors
/// Returns `BtestError` if the magic or a record marker is wrong, a name is
/// not valid UTF-8, or the data ends before the declared contents.
pub fn decode_suite(bytes: &[u8]) -> Result<Vec<TestCase>, BtestError> {
    let mut r = Reader::new(bytes);

    if r.take(4)? != BTEST_MAGIC {
        return Err(BtestError::BadMagic);
    }

    let count = r.u32()? as usize;
    let mut tests = Vec::new();

    for index in 0..count {
        if r.take(4)? != TEST_MARKER {
            return Err(BtestError::BadMarker { index });
        }

        let name_len = r.u32()? as usize;
        let name = String::from_utf8(r.take(name_len)?.to_vec())
            .map_err(|_| BtestError::BadName { index })?;
        let length = r.u32()?;
        let initial = decode_state(&mut r)?;
        let final_state = decode_state(&mut r)?;

        tests.push(TestCase {
            name,
            initial,
            final_state,
            length,
        });
    }

    Ok(tests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode_suite_to_vec;

    fn sample_suite() -> Vec<TestCase> {
        vec![
            TestCase {
                name: "BTST.b 0".to_string(),
                length: 4,
                initial: CpuState {
                    d0: 0xDEADBEEF,
                    a6: 0x00FF_0000,
                    usp: 0x100,
                    ssp: 0x200,
                    sr: 0x2700,
                    pc: 0x1000,
                    prefetch: [0x4E71, 0x4E72],
                    ram: vec![(0x1000, 0x08), (0x1001, 0x39)],
                    ..Default::default()
                },
                final_state: CpuState {
                    pc: 0x1004,
                    ram: vec![(0x1001, 0x39), (0x1000, 0x08)],
                    ..Default::default()
                },
            },
            TestCase {
                name: "BTST.b 1".to_string(),
                length: 2,
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_roundtrip() {
        let suite = sample_suite();
        let bytes = encode_suite_to_vec(&suite);
        let decoded = decode_suite(&bytes).unwrap();
        assert_eq!(decoded, suite);
    }

    #[test]
    fn test_roundtrip_empty_suite() {
        let bytes = encode_suite_to_vec(&[]);
        assert_eq!(decode_suite(&bytes).unwrap(), Vec::<TestCase>::new());
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode_suite_to_vec(&sample_suite());
        bytes[0] = b'X';
        assert_eq!(decode_suite(&bytes), Err(BtestError::BadMagic));
    }

    #[test]
    fn test_bad_marker_reports_record_index() {
        let suite = sample_suite();
        let bytes = encode_suite_to_vec(&suite);

        // Corrupt the second record's marker
        let second = 8 + suite[0].encoded_size();
        let mut bytes = bytes;
        bytes[second] = b'X';
        assert_eq!(decode_suite(&bytes), Err(BtestError::BadMarker { index: 1 }));
    }

    #[test]
    fn test_truncated_data() {
        let bytes = encode_suite_to_vec(&sample_suite());
        for cut in [2, 7, 12, 40, bytes.len() - 1] {
            assert_eq!(
                decode_suite(&bytes[..cut]),
                Err(BtestError::Truncated),
                "cut at {} should be truncated",
                cut
            );
        }
    }

    #[test]
    fn test_count_larger_than_data() {
        let mut bytes = encode_suite_to_vec(&sample_suite());
        // Claim more tests than the stream contains
        bytes[4..8].copy_from_slice(&100u32.to_be_bytes());
        assert_eq!(decode_suite(&bytes), Err(BtestError::Truncated));
    }

    #[test]
    fn test_non_utf8_name() {
        // Hand-build a record whose name bytes are invalid UTF-8
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"M64K");
        bytes.extend_from_slice(&1u32.to_be_bytes());
        bytes.extend_from_slice(b"TEST");
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&[0xFF, 0xFE]);
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 88 + 88]);
        assert_eq!(decode_suite(&bytes), Err(BtestError::BadName { index: 0 }));
    }
}
