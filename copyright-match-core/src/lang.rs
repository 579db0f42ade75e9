//! Language and country resolution (§4.2).

use crate::model::{CountryClass, ProcessingLanguage};

/// Outcome of [`resolve_language`]: whether the tag mapped cleanly, was
/// empty (a genuine fallback), or was present but not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageDetection {
    Detected,
    FallbackEnglish,
    UnknownCode,
}

/// Map a bibliographic language tag (2- or 3-letter) to one of the
/// five processing languages. An empty tag falls back to English; a
/// non-empty but unrecognized tag also processes as English but is
/// reported as `UnknownCode` rather than `FallbackEnglish`, so callers
/// can tell "no language recorded" apart from "a code we don't know".
pub fn resolve_language(tag: &str) -> (ProcessingLanguage, LanguageDetection) {
    let lower = tag.trim().to_lowercase();
    let lang = match lower.as_str() {
        "en" | "eng" => Some(ProcessingLanguage::Eng),
        "fr" | "fre" | "fra" => Some(ProcessingLanguage::Fre),
        "de" | "ger" | "deu" => Some(ProcessingLanguage::Ger),
        "es" | "spa" | "esp" => Some(ProcessingLanguage::Spa),
        "it" | "ita" | "ital" => Some(ProcessingLanguage::Ita),
        _ => None,
    };
    match lang {
        Some(l) => (l, LanguageDetection::Detected),
        None if lower.is_empty() => (ProcessingLanguage::Eng, LanguageDetection::FallbackEnglish),
        None => (ProcessingLanguage::Eng, LanguageDetection::UnknownCode),
    }
}

/// The ~51 MARC country codes denoting a U.S. state, territory, or
/// the catch-all "xxu" (United States, unspecified).
const US_COUNTRY_CODES: &[&str] = &[
    "aku", "alu", "aru", "azu", "cau", "cou", "ctu", "dcu", "deu", "flu", "gau", "hiu", "iau",
    "idu", "ilu", "inu", "ksu", "kyu", "lau", "mau", "mdu", "meu", "miu", "mnu", "mou", "msu",
    "mtu", "nbu", "ncu", "ndu", "nhu", "nju", "nmu", "nvu", "nyu", "ohu", "oku", "oru", "pau",
    "riu", "scu", "sdu", "tnu", "txu", "utu", "vau", "vtu", "wau", "wvu", "wyu", "xxu",
];

/// Repair a small set of known malformed country-code renderings
/// (stray pipe-delimiters from MARC subfield separators leaking in).
fn repair_country_code(raw: &str) -> String {
    match raw {
        "| |" | "|| " | " ||" => String::new(),
        other => other.to_string(),
    }
}

fn is_plausible_country_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= 3
        && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Extract positions 15–17 (0-indexed) of a MARC 008-shaped control
/// field and classify it as US / non-US / unknown.
pub fn resolve_country(marc_008: &str) -> (Option<String>, CountryClass) {
    if marc_008.len() < 18 {
        return (None, CountryClass::Unknown);
    }
    let raw: String = marc_008.chars().skip(15).take(3).collect();
    let repaired = repair_country_code(raw.trim());

    if !is_plausible_country_code(&repaired) {
        return (None, CountryClass::Unknown);
    }

    let lower = repaired.to_lowercase();
    let classification = if US_COUNTRY_CODES.contains(&lower.as_str()) {
        CountryClass::Us
    } else {
        CountryClass::NonUs
    };
    (Some(repaired), classification)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_two_and_three_letter_codes() {
        assert_eq!(resolve_language("en").0, ProcessingLanguage::Eng);
        assert_eq!(resolve_language("fre").0, ProcessingLanguage::Fre);
        assert_eq!(resolve_language("deu").0, ProcessingLanguage::Ger);
    }

    #[test]
    fn unrecognized_tag_processes_as_english_but_flagged_unknown() {
        let (lang, status) = resolve_language("xx");
        assert_eq!(lang, ProcessingLanguage::Eng);
        assert_eq!(status, LanguageDetection::UnknownCode);
    }

    #[test]
    fn empty_tag_falls_back_to_english() {
        let (lang, status) = resolve_language("");
        assert_eq!(lang, ProcessingLanguage::Eng);
        assert_eq!(status, LanguageDetection::FallbackEnglish);
    }

    #[test]
    fn classifies_us_state_code() {
        let field = format!("{:15}{}", "", "nyu");
        let (code, class) = resolve_country(&field);
        assert_eq!(code.as_deref(), Some("nyu"));
        assert_eq!(class, CountryClass::Us);
    }

    #[test]
    fn classifies_foreign_code() {
        let field = format!("{:15}{}", "", "fr ");
        let (_, class) = resolve_country(&field);
        assert_eq!(class, CountryClass::NonUs);
    }

    #[test]
    fn short_field_is_unknown() {
        let (code, class) = resolve_country("short");
        assert!(code.is_none());
        assert_eq!(class, CountryClass::Unknown);
    }
}
