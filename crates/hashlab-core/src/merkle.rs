use crate::constants::ZERO_HASH;
use crate::digest::sha256_hex;

/// Pairwise-combine `leaves` left to right until a single root remains. A
/// trailing odd element is paired with itself; parents are
/// `sha256_hex(left + right)` over the hex strings. Empty input yields
/// [`ZERO_HASH`].
pub fn merkle_root<S: AsRef<str>>(leaves: &[S]) -> String {
    if leaves.is_empty() {
        return ZERO_HASH.to_string();
    }
    let mut level: Vec<String> = leaves.iter().map(|l| l.as_ref().to_owned()).collect();
    // A lone leaf still goes through one round so that it is hashed.
    loop {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            next.push(sha256_hex(format!("{left}{right}")));
        }
        level = next;
        if level.len() == 1 {
            break;
        }
    }
    level.swap_remove(0)
}
