// src/util.rs — Shared utility functions

/// Truncate a string for display/logging (UTF-8 safe).
///
/// Returns a substring of at most `max_len` bytes, ensuring the cut
/// point falls on a valid UTF-8 character boundary.
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

/// Split a description into the words worth matching against the fault
/// table: lowercase, alphanumeric only, longer than three characters.
pub fn keywords(description: &str) -> Vec<String> {
    description
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 3)
        .map(|w| w.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_exact() {
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "café" is 5 bytes (é = 2 bytes), truncating at 4 should not split é
        let s = "café";
        let t = truncate_str(s, 4);
        assert_eq!(t, "caf");
    }

    #[test]
    fn test_truncate_empty() {
        assert_eq!(truncate_str("", 5), "");
    }

    #[test]
    fn test_keywords_filters_short_words() {
        let words = keywords("the fan is not spinning");
        assert_eq!(words, vec!["spinning"]);
    }

    #[test]
    fn test_keywords_lowercases_and_splits_punctuation() {
        let words = keywords("Screen FLICKERS, won't charge!");
        assert_eq!(words, vec!["screen", "flickers", "charge"]);
    }

    #[test]
    fn test_keywords_empty() {
        assert!(keywords("").is_empty());
        assert!(keywords("a an is").is_empty());
    }

    #[test]
    fn test_keywords_length_is_in_characters_not_bytes() {
        // "坏了" is two characters (six bytes) and must be filtered;
        // "écran" is five characters and must pass
        assert!(keywords("坏了").is_empty());
        assert_eq!(keywords("écran noir"), vec!["écran", "noir"]);
    }
}
