//! URL slugs for articles

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

static VALID_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s-]+").unwrap());

/// Lowercased title reduced to `[a-z0-9-]`, suffixed with the current epoch millis
/// ("Hello, World!" -> "hello-world-1718000000000").
pub fn generate_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();
    let joined = SEPARATOR_RE.replace_all(kept.trim(), "-");
    let base = joined.trim_matches('-');

    let millis = Utc::now().timestamp_millis();
    if base.is_empty() {
        millis.to_string()
    } else {
        format!("{}-{}", base, millis)
    }
}

pub fn is_valid_slug(slug: &str) -> bool {
    VALID_SLUG_RE.is_match(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug() {
        let slug = generate_slug("Hello, World!");
        let re = Regex::new(r"^hello-world-\d{13}$").unwrap();
        assert!(re.is_match(&slug), "unexpected slug: {}", slug);

        let slug = generate_slug("  Rust -- and   Async  ");
        assert!(slug.starts_with("rust-and-async-"), "unexpected slug: {}", slug);
    }

    #[test]
    fn test_generate_slug_without_ascii() {
        let slug = generate_slug("你好");
        assert!(slug.chars().all(|c| c.is_ascii_digit()));
        assert!(is_valid_slug(&slug));
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("hello-world_2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("hello world"));
        assert!(!is_valid_slug("../etc"));
    }
}
