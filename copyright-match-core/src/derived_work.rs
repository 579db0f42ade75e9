//! Derived-work detection (§4.5): flags titles that are indexes,
//! bibliographies, supplements, or guides to another work, and scores
//! the penalty a match between two such titles should take.

use regex::Regex;

use crate::model::ProcessingLanguage;

/// A single language's patterns: (regex, base confidence, pattern name).
struct PatternSet {
    patterns: Vec<(Regex, f64, &'static str)>,
}

fn compile(pairs: &[(&str, f64, &'static str)]) -> PatternSet {
    PatternSet {
        patterns: pairs
            .iter()
            .map(|(pat, conf, name)| (Regex::new(pat).expect("valid built-in pattern"), *conf, *name))
            .collect(),
    }
}

fn english_patterns() -> PatternSet {
    compile(&[
        (r"(?i)\bindex\s+(to|of|for)\b", 0.9, "index"),
        (r"(?i)\bindexes?\b$", 0.6, "index_suffix"),
        (r"(?i)\bbibliography\s+(of|for|to)\b", 0.9, "bibliography"),
        (r"(?i)\bbibliography\b$", 0.6, "bibliography_suffix"),
        (r"(?i)\bsupplement\s+(to|for)\b", 0.85, "supplement"),
        (r"(?i)\bsupplements?\b$", 0.55, "supplement_suffix"),
        (r"(?i)\bguide\s+(to|for)\b", 0.8, "guide"),
        (r"(?i)\bconcordance\s+(to|of)\b", 0.85, "concordance"),
        (r"(?i)\bselections?\s+from\b", 0.7, "selection"),
        (r"(?i)\babstracts?\s+of\b", 0.75, "abstract"),
        (r"(?i)\bdigest\s+of\b", 0.7, "digest"),
        (r"(?i)\bcompanion\s+to\b", 0.65, "companion"),
        (r"(?i)\bhandbook\s+(to|for|of)\b", 0.6, "handbook"),
        (r"(?i)\bintroduction\s+to\b", 0.5, "introduction"),
    ])
}

fn french_patterns() -> PatternSet {
    compile(&[
        (r"(?i)\bindex\s+(de|du|des|pour)\b", 0.9, "index"),
        (r"(?i)\bbibliographie\s+(de|du|des|sur)\b", 0.9, "bibliography"),
        (r"(?i)\bsuppl[ée]ment\s+(a|au|aux)\b", 0.85, "supplement"),
        (r"(?i)\bguide\s+(de|du|pour)\b", 0.8, "guide"),
    ])
}

fn german_patterns() -> PatternSet {
    compile(&[
        (r"(?i)\bregister\s+(zu|zum|zur)\b", 0.9, "index"),
        (r"(?i)\bbibliographie\s+(zu|zum|zur|von)\b", 0.9, "bibliography"),
        (r"(?i)\bergänzung\s+(zu|zum|zur)\b", 0.85, "supplement"),
        (r"(?i)\bführer\s+(zu|zum|zur|durch)\b", 0.8, "guide"),
    ])
}

fn spanish_patterns() -> PatternSet {
    compile(&[
        (r"(?i)\b[íi]ndice\s+(de|a|para)\b", 0.9, "index"),
        (r"(?i)\bbibliograf[íi]a\s+(de|sobre|para)\b", 0.9, "bibliography"),
        (r"(?i)\bsuplemento\s+(a|de|para)\b", 0.85, "supplement"),
        (r"(?i)\bguía\s+(de|para)\b", 0.8, "guide"),
    ])
}

fn italian_patterns() -> PatternSet {
    compile(&[
        (r"(?i)\bindice\s+(di|a|per)\b", 0.9, "index"),
        (r"(?i)\bbibliografia\s+(di|su|per)\b", 0.9, "bibliography"),
        (r"(?i)\bsupplemento\s+(a|di|per)\b", 0.85, "supplement"),
        (r"(?i)\bguida\s+(a|per|di)\b", 0.8, "guide"),
    ])
}

fn patterns_for(language: ProcessingLanguage) -> PatternSet {
    match language {
        ProcessingLanguage::Eng => english_patterns(),
        ProcessingLanguage::Fre => french_patterns(),
        ProcessingLanguage::Ger => german_patterns(),
        ProcessingLanguage::Spa => spanish_patterns(),
        ProcessingLanguage::Ita => italian_patterns(),
    }
}

/// Whether a single title looks like a derived work, and by which
/// pattern, with what confidence.
#[derive(Debug, Clone, Default)]
pub struct DerivedWorkInfo {
    pub is_derived: bool,
    pub pattern_matched: Option<String>,
    pub confidence: f64,
    pub language_hint: Option<ProcessingLanguage>,
}

/// English-pattern confidence multiplier applied when a non-English
/// title matches only via the English fallback pass.
const ENGLISH_FALLBACK_SCALE: f64 = 0.9;

fn check_single_title(title: &str, language: ProcessingLanguage) -> DerivedWorkInfo {
    let primary = patterns_for(language);
    let mut best: Option<(f64, &'static str, ProcessingLanguage)> = None;

    for (re, conf, name) in &primary.patterns {
        if re.is_match(title) && best.as_ref().map_or(true, |(c, ..)| *conf > *c) {
            best = Some((*conf, name, language));
        }
    }

    if language != ProcessingLanguage::Eng {
        let fallback = english_patterns();
        for (re, conf, name) in &fallback.patterns {
            let scaled = conf * ENGLISH_FALLBACK_SCALE;
            if re.is_match(title) && best.as_ref().map_or(true, |(c, ..)| scaled > *c) {
                best = Some((scaled, name, ProcessingLanguage::Eng));
            }
        }
    }

    match best {
        Some((confidence, name, lang)) => DerivedWorkInfo {
            is_derived: true,
            pattern_matched: Some(name.to_string()),
            confidence,
            language_hint: Some(lang),
        },
        None => DerivedWorkInfo::default(),
    }
}

/// Detect derived-work status for both sides of a candidate match.
pub fn detect(
    query_title: &str,
    reference_title: &str,
    language: ProcessingLanguage,
) -> (DerivedWorkInfo, DerivedWorkInfo) {
    (
        check_single_title(query_title, language),
        check_single_title(reference_title, language),
    )
}

/// Apply the §4.5 penalty table to a base combined score. The
/// percentages in §4.5 are read as points off the 0-100 scale rather
/// than a fraction of the score itself — a multiplicative cut can
/// never pull a high-confidence one-sided match (base score in the
/// 80s, as in an index matched against its parent work) below the
/// title threshold, which is exactly what §8's worked example
/// requires of it.
pub fn should_penalize(
    marc_info: &DerivedWorkInfo,
    ref_info: &DerivedWorkInfo,
    base_score: f64,
) -> (bool, f64) {
    if !marc_info.is_derived && !ref_info.is_derived {
        return (false, base_score);
    }

    if marc_info.is_derived && ref_info.is_derived {
        let avg_confidence = (marc_info.confidence + ref_info.confidence) / 2.0;
        let same_pattern = marc_info.pattern_matched == ref_info.pattern_matched;
        let max_penalty_points = if same_pattern { 10.0 } else { 30.0 };
        let penalty = max_penalty_points * avg_confidence;
        return (true, (base_score - penalty).max(0.0));
    }

    let side_confidence = if marc_info.is_derived { marc_info.confidence } else { ref_info.confidence };
    let penalty = 50.0 * side_confidence;
    (true, (base_score - penalty).max(0.0))
}

/// A short human-readable reason string for diagnostics.
pub fn penalty_reason(marc_info: &DerivedWorkInfo, ref_info: &DerivedWorkInfo) -> String {
    match (marc_info.is_derived, ref_info.is_derived) {
        (false, false) => "none".to_string(),
        (true, true) if marc_info.pattern_matched == ref_info.pattern_matched => {
            format!("both_derived_same_pattern:{}", marc_info.pattern_matched.as_deref().unwrap_or(""))
        }
        (true, true) => format!(
            "both_derived_different_pattern:{}/{}",
            marc_info.pattern_matched.as_deref().unwrap_or(""),
            ref_info.pattern_matched.as_deref().unwrap_or("")
        ),
        (true, false) => format!("query_derived:{}", marc_info.pattern_matched.as_deref().unwrap_or("")),
        (false, true) => format!("reference_derived:{}", ref_info.pattern_matched.as_deref().unwrap_or("")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_english_index_pattern() {
        let info = check_single_title("Index to War and Peace", ProcessingLanguage::Eng);
        assert!(info.is_derived);
        assert_eq!(info.pattern_matched.as_deref(), Some("index"));
    }

    #[test]
    fn plain_title_is_not_derived() {
        let info = check_single_title("War and Peace", ProcessingLanguage::Eng);
        assert!(!info.is_derived);
    }

    #[test]
    fn one_sided_penalty_is_scaled_by_confidence() {
        let marc = check_single_title("Index to War and Peace", ProcessingLanguage::Eng);
        let reference = check_single_title("War and Peace", ProcessingLanguage::Eng);
        let (penalized, score) = should_penalize(&marc, &reference, 100.0);
        assert!(penalized);
        assert!(score < 100.0);
        assert!(score >= 100.0 * (1.0 - 0.50));
    }

    #[test]
    fn non_english_title_tries_english_fallback() {
        let info = check_single_title("Supplement to something", ProcessingLanguage::Ger);
        assert!(info.is_derived);
        assert_eq!(info.language_hint, Some(ProcessingLanguage::Eng));
    }
}
