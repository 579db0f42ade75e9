//! LCCN (Library of Congress Control Number) normalization (§4.3).
//!
//! Implements the published algorithm exactly so equality comparisons
//! against the LCCN index are exact-match, not fuzzy.

/// Canonicalize a raw LCCN per the LC algorithm:
/// 1. Remove spaces.
/// 2. Truncate at the first `/`.
/// 3. On a hyphen, zero-pad the numeric suffix (≤6 digits) to 6 and
///    reassemble without the hyphen.
pub fn normalize_lccn(raw: &str) -> String {
    let no_spaces: String = raw.chars().filter(|c| *c != ' ').collect();

    let truncated = match no_spaces.split_once('/') {
        Some((head, _)) => head.to_string(),
        None => no_spaces,
    };

    match truncated.split_once('-') {
        Some((prefix, suffix)) => {
            let suffix: String = suffix.chars().filter(|c| *c != '-').collect();
            if !suffix.is_empty() && suffix.len() <= 6 && suffix.chars().all(|c| c.is_ascii_digit())
            {
                format!("{prefix}{suffix:0>6}")
            } else {
                format!("{prefix}{suffix}")
            }
        }
        None => truncated,
    }
}

/// Leading alphabetic prefix of a normalized LCCN, if any.
pub fn extract_lccn_prefix(normalized: &str) -> String {
    normalized.chars().take_while(|c| c.is_ascii_alphabetic()).collect()
}

/// The year segment of a normalized LCCN: a 4-digit year only if it
/// starts with "19" or "20", otherwise a 2-digit year.
pub fn extract_lccn_year(normalized: &str) -> Option<String> {
    let digits_start = normalized
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)?;
    let rest = &normalized[digits_start..];

    if rest.len() >= 4 && (rest.starts_with("19") || rest.starts_with("20")) {
        let candidate = &rest[..4];
        if candidate.chars().all(|c| c.is_ascii_digit()) {
            return Some(candidate.to_string());
        }
    }
    if rest.len() >= 2 {
        let candidate = &rest[..2];
        if candidate.chars().all(|c| c.is_ascii_digit()) {
            return Some(candidate.to_string());
        }
    }
    None
}

/// The serial-number remainder after prefix and year are removed.
pub fn extract_lccn_serial(normalized: &str) -> Option<String> {
    let prefix = extract_lccn_prefix(normalized);
    let year = extract_lccn_year(normalized)?;
    let rest = normalized.strip_prefix(&prefix)?.strip_prefix(&year)?;
    Some(rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphenated_suffix_is_zero_padded() {
        assert_eq!(normalize_lccn("n78-890351"), "n78890351");
        assert_eq!(normalize_lccn("n78-89035"), "n78089035");
    }

    #[test]
    fn spaces_are_removed() {
        assert_eq!(normalize_lccn("n 78890351 "), "n78890351");
        assert_eq!(normalize_lccn(" 85000002 "), "85000002");
    }

    #[test]
    fn short_hyphen_suffix_zero_pads() {
        assert_eq!(normalize_lccn("85-2 "), "85000002");
    }

    #[test]
    fn four_digit_year_prefix() {
        assert_eq!(normalize_lccn("2001-000002"), "2001000002");
    }

    #[test]
    fn truncates_at_slash() {
        assert_eq!(normalize_lccn("75-425165//r75"), "75425165");
        assert_eq!(normalize_lccn(" 79139101 /AC/r932"), "79139101");
    }

    #[test]
    fn idempotent() {
        let once = normalize_lccn("n78-890351");
        let twice = normalize_lccn(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn no_spaces_hyphens_or_slashes_remain() {
        let n = normalize_lccn(" 79139101 /AC/r932");
        assert!(!n.contains(' ') && !n.contains('-') && !n.contains('/'));
    }
}
