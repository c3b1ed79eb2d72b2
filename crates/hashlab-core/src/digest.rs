use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::HASH_HEX_SIZE;

/// SHA-256 of `bytes` as 64 lowercase hex characters.
pub fn sha256_hex(bytes: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes.as_ref());
    hex::encode(hasher.finalize())
}

/// Number of leading `'0'` characters in a hex digest.
pub fn leading_hex_zeros(hash: &str) -> u32 {
    hash.bytes().take_while(|b| *b == b'0').count() as u32
}

pub fn is_hash_hex(value: &str) -> bool {
    value.len() == HASH_HEX_SIZE && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Result of hashing an input and the same input with one extra character.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avalanche {
    pub original: String,
    pub modified: String,
    /// Hex positions at which the two digests differ.
    pub differing_positions: usize,
}

impl Avalanche {
    pub fn ratio(&self) -> f64 {
        self.differing_positions as f64 / HASH_HEX_SIZE as f64
    }
}

pub fn avalanche(input: &str) -> Avalanche {
    let original = sha256_hex(input);
    let modified = sha256_hex(format!("{input}."));
    let differing_positions = original
        .bytes()
        .zip(modified.bytes())
        .filter(|(a, b)| a != b)
        .count();
    Avalanche {
        original,
        modified,
        differing_positions,
    }
}

/// Rough 0-100 plausibility score for a hex digest: width, a proof-of-work
/// style leading zero, hex alphabet and character spread.
///
/// The alphabet credit needs the whole input to be exactly 64 lowercase hex
/// digits; a digest embedded in a longer string earns nothing for it.
pub fn strength_score(hash: &str) -> u8 {
    let mut score = 0;
    if hash.len() == HASH_HEX_SIZE {
        score += 30;
    }
    if hash.starts_with('0') {
        score += 20;
    }
    if hash.len() == HASH_HEX_SIZE && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        score += 30;
    }
    if hash.chars().collect::<HashSet<_>>().len() > 10 {
        score += 20;
    }
    score
}

/// Deliberately weak 32-bit rolling hash, kept for side-by-side comparison with
/// SHA-256. Its output type is not a `String`, so it cannot stand in for a
/// block hash anywhere in the engine.
pub mod weak {
    use std::fmt;

    use serde::Serialize;

    #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
    pub struct WeakDigest(String);

    impl WeakDigest {
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for WeakDigest {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// `h = h * 31 + unit` over UTF-16 code units with 32-bit wrap-around,
    /// rendered as the unpadded hex of `|h|`.
    pub fn rolling_hash(input: &str) -> WeakDigest {
        let h = input.encode_utf16().fold(0i32, |h, unit| {
            (h << 5).wrapping_sub(h).wrapping_add(i32::from(unit))
        });
        WeakDigest(format!("{:x}", h.unsigned_abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::weak::rolling_hash;
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(sha256_hex("abc"), sha256_hex(b"abc".to_vec()));
    }

    #[test]
    fn leading_zero_examples() {
        assert_eq!(leading_hex_zeros("00ab"), 2);
        assert_eq!(leading_hex_zeros("ab00"), 0);
        assert_eq!(leading_hex_zeros(crate::constants::ZERO_HASH), 64);
    }

    #[test]
    fn weak_hash_is_short_and_collides() {
        assert_eq!(rolling_hash("").as_str(), "0");
        // "a" = 97
        assert_eq!(rolling_hash("a").as_str(), "61");
        // 'A' * 31 + 'a' == 'B' * 31 + 'B'
        assert_eq!(rolling_hash("Aa"), rolling_hash("BB"));
        assert!(rolling_hash("hello world").as_str().len() <= 8);
    }

    #[test]
    fn avalanche_changes_most_positions() {
        let result = avalanche("hashlab");
        assert_ne!(result.original, result.modified);
        assert!(result.differing_positions > 32);
        assert!(result.ratio() <= 1.0);
    }

    #[test]
    fn strength_score_examples() {
        assert_eq!(strength_score(&sha256_hex("abc")), 80);
        assert_eq!(strength_score(crate::constants::ZERO_HASH), 80);
        assert_eq!(strength_score("0"), 20);
        assert_eq!(strength_score(""), 0);
    }

    #[test]
    fn strength_score_hex_check_covers_whole_string() {
        // 64 hex digits followed by junk: spread only, no width or alphabet credit.
        let padded = format!("{}x", sha256_hex("abc"));
        assert_eq!(strength_score(&padded), 20);
        assert_eq!(strength_score(&sha256_hex("abc").to_uppercase()), 50);
    }
}
