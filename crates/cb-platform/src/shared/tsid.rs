//! TSID Generator
//!
//! Time-Sorted IDs rendered as 13-character Crockford Base32 strings.
//! Lexicographic order of the strings follows creation time.

use std::sync::atomic::{AtomicU16, Ordering};

use chrono::Utc;

/// Crockford Base32 alphabet (excludes I, L, O, U)
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

const TSID_LEN: usize = 13;

static COUNTER: AtomicU16 = AtomicU16::new(0);

/// Generator for role, child, event and audit identifiers
pub struct TsidGenerator;

impl TsidGenerator {
    /// Generate a new TSID, e.g. `"0HZXEQ5Y8JY5Z"`.
    ///
    /// Layout (64 bits): 42 bits of milliseconds since the Unix epoch,
    /// 10 random bits, 12 bits of a process-wide counter.
    pub fn generate() -> String {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) as u64;
        let random = rand::random::<u16>() as u64 & 0x3FF;

        let tsid = ((millis & 0x3FF_FFFF_FFFF) << 22) | (random << 12) | (counter & 0xFFF);
        encode(tsid)
    }
}

fn encode(mut value: u64) -> String {
    let mut out = [b'0'; TSID_LEN];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(value & 0x1F) as usize];
        value >>= 5;
    }
    out.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_tsid() {
        let id = TsidGenerator::generate();
        assert_eq!(id.len(), 13);
        assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(ids.insert(TsidGenerator::generate()), "Duplicate TSID generated");
        }
    }

    #[test]
    fn test_encode_is_fixed_width() {
        assert_eq!(encode(0), "0000000000000");
        assert_eq!(encode(31), "000000000000Z");
        assert_eq!(encode(u64::MAX).len(), 13);
    }

    #[test]
    fn test_sortability() {
        let id1 = TsidGenerator::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = TsidGenerator::generate();
        assert!(id1 < id2, "TSIDs should be lexicographically sortable");
    }
}
