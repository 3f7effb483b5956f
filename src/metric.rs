/// Tokens that explicitly carry no numeric value, compared case-insensitively.
const NO_VALUE: [&str; 5] = ["new", "re", "n/a", "-", ""];

/// Parses a raw metric token such as `"2"`, `"New"`, `"RE"` or `"12,"`.
///
/// Thousands separators are stripped and a single trailing `.` is allowed.
/// Anything that is not a whole number yields `None`; this never fails.
pub fn normalize(token: &str) -> Option<u32> {
    let token = token.trim().replace(',', "");
    if is_no_value(&token) {
        return None;
    }
    let digits = token.strip_suffix('.').unwrap_or(&token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `"New"`, `"RE"`, `"-"` and friends: a deliberate absence of a number.
pub fn is_no_value(token: &str) -> bool {
    let token = token.trim();
    NO_VALUE.iter().any(|x| token.eq_ignore_ascii_case(x))
}

#[cfg(test)]
mod tests {
    use super::{is_no_value, normalize};

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("7"), Some(7));
        assert_eq!(normalize(" 12, "), Some(12));
        assert_eq!(normalize("12,"), Some(12));
        assert_eq!(normalize("1,234"), Some(1234));
        assert_eq!(normalize("5."), Some(5));
        assert_eq!(normalize("\u{a0}42\u{a0}"), Some(42));
        assert_eq!(normalize("0"), Some(0));
    }

    #[test]
    fn no_value_tokens() {
        for token in ["New", "NEW", "RE", "re", "n/a", "N/A", "-", "", "   "] {
            assert_eq!(normalize(token), None, "{token:?}");
        }
        assert!(is_no_value("New"));
        assert!(!is_no_value("7"));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(normalize("12a"), None);
        assert_eq!(normalize("1.5"), None);
        assert_eq!(normalize("5.."), None);
        assert_eq!(normalize("-3"), None);
        assert_eq!(normalize("99999999999"), None);
    }
}
