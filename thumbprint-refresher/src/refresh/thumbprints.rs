use crate::refresh::util::eq_hex;
use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY};

/// SHA-1 of a DER certificate as 40 lowercase hex characters, the form IAM
/// stores in a provider's thumbprint list.
pub fn fingerprint_of(der: &[u8]) -> String {
    hex::encode(digest(&SHA1_FOR_LEGACY_USE_ONLY, der).as_ref())
}

/// Merges `fingerprint` into `thumbprints` and reports whether the list changed.
///
/// A fingerprint already present (ignoring case) leaves the list untouched.
/// Otherwise it is appended, or replaces the whole list when `append` is
/// false. With `max_thumbprints > 0` the oldest entries are evicted from the
/// front until the list fits, so the outgoing and incoming certificates of a
/// key rotation can both stay trusted.
pub fn update_thumbprint_list(
    thumbprints: &mut Vec<String>,
    fingerprint: &str,
    max_thumbprints: u32,
    append: bool,
) -> bool {
    if thumbprints.iter().any(|existing| eq_hex(existing, fingerprint)) {
        return false;
    }

    if append {
        thumbprints.push(fingerprint.to_string());
    } else {
        thumbprints.clear();
        thumbprints.push(fingerprint.to_string());
    }

    let max = max_thumbprints as usize;
    if max > 0 && thumbprints.len() > max {
        let excess = thumbprints.len() - max;
        thumbprints.drain(..excess);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bound_of_one_keeps_latest() {
        let mut thumbprints = Vec::new();
        assert!(update_thumbprint_list(&mut thumbprints, "fp1", 1, true));
        assert_eq!(thumbprints, list(&["fp1"]));

        assert!(!update_thumbprint_list(&mut thumbprints, "fp1", 1, true));
        assert_eq!(thumbprints, list(&["fp1"]));

        assert!(update_thumbprint_list(&mut thumbprints, "fp2", 1, true));
        assert_eq!(thumbprints, list(&["fp2"]));
    }

    #[test]
    fn unlimited_keeps_everything_in_order() {
        let mut thumbprints = list(&["fp1"]);
        assert!(update_thumbprint_list(&mut thumbprints, "fp2", 0, true));
        assert!(update_thumbprint_list(&mut thumbprints, "fp3", 0, true));
        assert_eq!(thumbprints, list(&["fp1", "fp2", "fp3"]));
    }

    #[test]
    fn second_update_with_same_fingerprint_is_a_no_op() {
        let mut thumbprints = list(&["aa", "bb"]);
        assert!(update_thumbprint_list(&mut thumbprints, "cc", 5, true));
        let after_first = thumbprints.clone();
        assert!(!update_thumbprint_list(&mut thumbprints, "cc", 5, true));
        assert_eq!(thumbprints, after_first);
    }

    #[test]
    fn bounded_growth_keeps_most_recent_k() {
        for k in 1..=5u32 {
            for n in 0..9usize {
                let mut thumbprints = Vec::new();
                let fps: Vec<String> = (0..n).map(|i| format!("{i:040x}")).collect();
                for fp in &fps {
                    update_thumbprint_list(&mut thumbprints, fp, k, true);
                }
                let keep = n.min(k as usize);
                assert_eq!(thumbprints.len(), keep, "k={k} n={n}");
                assert_eq!(thumbprints, fps[n - keep..].to_vec(), "k={k} n={n}");
            }
        }
    }

    #[test]
    fn replace_mode_leaves_single_entry() {
        let mut thumbprints = list(&["fp1", "fp2", "fp3"]);
        assert!(update_thumbprint_list(&mut thumbprints, "fp4", 0, false));
        assert_eq!(thumbprints, list(&["fp4"]));
        assert!(update_thumbprint_list(&mut thumbprints, "fp5", 5, false));
        assert_eq!(thumbprints, list(&["fp5"]));
    }

    #[test]
    fn replace_mode_keeps_list_when_already_present() {
        let mut thumbprints = list(&["fp1", "fp2"]);
        assert!(!update_thumbprint_list(&mut thumbprints, "fp1", 0, false));
        assert_eq!(thumbprints, list(&["fp1", "fp2"]));
    }

    #[test]
    fn membership_ignores_case() {
        let mut thumbprints = list(&["ABCDEF0123456789ABCDEF0123456789ABCDEF01"]);
        assert!(!update_thumbprint_list(
            &mut thumbprints,
            "abcdef0123456789abcdef0123456789abcdef01",
            5,
            true
        ));
        assert_eq!(thumbprints.len(), 1);
    }

    #[test]
    fn fingerprint_is_lowercase_sha1_hex() {
        // SHA-1("abc")
        assert_eq!(
            fingerprint_of(b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        let fp = fingerprint_of(b"any bytes");
        assert_eq!(fp.len(), 40);
        assert!(fp.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
