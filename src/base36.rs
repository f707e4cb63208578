//! Base-36 id codec behind post permalinks (`/p/<base36>`).

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Encode with digits then lowercase letters, no padding. `0` encodes as `"0"`.
pub fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(13);
    while n > 0 {
        digits.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    // ALPHABET is ASCII.
    digits.into_iter().map(char::from).collect()
}

/// Inverse of `to_base36`. Accepts upper-case letters; rejects empty input,
/// foreign characters and overflow.
pub fn from_base36(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }
    s.chars().try_fold(0u64, |acc, c| {
        let d = c.to_digit(36)?;
        acc.checked_mul(36)?.checked_add(u64::from(d))
    })
}

/// `<base_url>/p/<base36(id)>`
pub fn permalink(base_url: &str, plurk_id: u64) -> String {
    format!("{}/p/{}", base_url.trim_end_matches('/'), to_base36(plurk_id))
}
