/// Prefixes `https://` when `url` carries no scheme.
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// Case-insensitive hex comparison.
pub fn eq_hex(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_missing_scheme() {
        assert_eq!(
            normalize_url("oidc.eks.eu-west-1.amazonaws.com/id/ABC"),
            "https://oidc.eks.eu-west-1.amazonaws.com/id/ABC"
        );
        assert_eq!(
            normalize_url("https://accounts.google.com"),
            "https://accounts.google.com"
        );
        assert_eq!(normalize_url("http://127.0.0.1:8080"), "http://127.0.0.1:8080");
    }

    #[test]
    fn hex_compare_ignores_case() {
        assert!(eq_hex("ABCDEF0123", "abcdef0123"));
        assert!(!eq_hex("abcdef0123", "abcdef0124"));
    }
}
