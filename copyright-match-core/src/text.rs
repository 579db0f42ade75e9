//! Text normalization pipeline (§4.1).
//!
//! Modeled on `evergreen::norm::Normalizer`: a struct holding
//! precompiled `Regex` fields, built once and reused for every
//! record. Unlike the teacher's NACO normalizer (library-catalog
//! filing order), this pipeline targets cross-corpus similarity
//! scoring, so it folds all the way to ASCII and optionally stems.

use std::collections::{HashMap, HashSet};

use icu_normalizer::ComposingNormalizer;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use crate::config::Wordlists;
use crate::error::{MatchError, Result};
use crate::model::ProcessingLanguage;

fn stemmer_algorithm(language: ProcessingLanguage) -> Algorithm {
    match language {
        ProcessingLanguage::Eng => Algorithm::English,
        ProcessingLanguage::Fre => Algorithm::French,
        ProcessingLanguage::Ger => Algorithm::German,
        ProcessingLanguage::Spa => Algorithm::Spanish,
        ProcessingLanguage::Ita => Algorithm::Italian,
    }
}

/// The precompiled patterns and data tables used by every normalize
/// call. Immutable and safely shared across worker threads.
pub struct TextNormalizer {
    bracket_re: Regex,
    punctuation_re: Regex,
    coalesce_re: Regex,
    split_letter_re: Regex,
    parenthetical_re: Regex,
    parenthetical_date_re: Regex,
    standalone_year_re: Regex,

    mojibake_map: HashMap<String, String>,
    abbreviations: HashMap<String, String>,
    stopwords: HashMap<String, HashSet<String>>,
    author_stopwords: HashMap<String, HashSet<String>>,
    publisher_stopwords: HashSet<String>,
    publisher_suffix_re: Regex,

    stemmers: HashMap<&'static str, Stemmer>,
}

/// Which text field is being normalized; selects the profile (§4.1,
/// last paragraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Author,
    Publisher,
}

impl TextNormalizer {
    pub fn new(wordlists: &Wordlists) -> Result<Self> {
        let mut stopwords = HashMap::new();
        for (lang, words) in &wordlists.stopwords {
            stopwords.insert(lang.clone(), words.iter().cloned().collect());
        }
        let mut author_stopwords = HashMap::new();
        for (lang, words) in &wordlists.author_stopwords {
            author_stopwords.insert(lang.clone(), words.iter().cloned().collect());
        }

        let mut stemmers = HashMap::new();
        for lang in [
            ProcessingLanguage::Eng,
            ProcessingLanguage::Fre,
            ProcessingLanguage::Ger,
            ProcessingLanguage::Spa,
            ProcessingLanguage::Ita,
        ] {
            stemmers.insert(lang.code(), Stemmer::create(stemmer_algorithm(lang)));
        }

        let suffix_pattern = if wordlists.publisher_suffix_pattern.is_empty() {
            r"\b(inc|ltd|llc|co|corp)\.?\s*$".to_string()
        } else {
            wordlists.publisher_suffix_pattern.clone()
        };

        Ok(TextNormalizer {
            bracket_re: Regex::new(r"\[[^\[\]]*\]").map_err(regex_err)?,
            punctuation_re: Regex::new(r"[^a-z0-9\s-]").map_err(regex_err)?,
            coalesce_re: Regex::new(r"[\s-]+").map_err(regex_err)?,
            split_letter_re: Regex::new(r"\b(?:[a-z]\s+)+[a-z]\b").map_err(regex_err)?,
            parenthetical_re: Regex::new(r"\([^()]*\)").map_err(regex_err)?,
            parenthetical_date_re: Regex::new(r"\(\s*\d{3,4}\s*(-\s*\d{3,4}\s*)?\)")
                .map_err(regex_err)?,
            standalone_year_re: Regex::new(r"\b(?:18|19|20)\d{2}\b").map_err(regex_err)?,
            mojibake_map: wordlists.mojibake_map.clone(),
            abbreviations: wordlists.abbreviations.clone(),
            stopwords,
            author_stopwords,
            publisher_stopwords: wordlists.publisher_stopwords.iter().cloned().collect(),
            publisher_suffix_re: Regex::new(&format!("(?i){suffix_pattern}")).map_err(regex_err)?,
            stemmers,
        })
    }

    /// Steps 1–6 of §4.1: bracket strip through split-letter join.
    /// Shared by every field profile.
    fn coalesce_core(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }

        // 1. Bracket strip, to fixed point.
        let mut s = raw.to_string();
        loop {
            let stripped = self.bracket_re.replace_all(&s, " ").into_owned();
            if stripped == s {
                break;
            }
            s = stripped;
        }

        // 2. Unicode repair (mojibake table) + NFC + ASCII fold.
        for (bad, good) in &self.mojibake_map {
            if s.contains(bad.as_str()) {
                s = s.replace(bad.as_str(), good);
            }
        }
        let nfc = ComposingNormalizer::new_nfc();
        s = nfc.normalize(&s);
        s = deunicode::deunicode(&s);

        // 3. Case fold.
        s = s.to_lowercase();

        // 4. Punctuation strip (keep word chars, whitespace, hyphen).
        s = self.punctuation_re.replace_all(&s, " ").into_owned();

        // 5. Whitespace/hyphen coalesce.
        s = self.coalesce_re.replace_all(&s, " ").trim().to_string();

        // 6. Split-letter join ("u s a" -> "usa").
        s = self
            .split_letter_re
            .replace_all(&s, |caps: &regex::Captures| caps[0].replace(' ', ""))
            .into_owned();

        s
    }

    /// Step 7: abbreviation expansion. Conservative rule: expand a
    /// dictionary word if it has a trailing period, or if it is
    /// shorter than 5 characters; longer dictionary keys seen without
    /// a period are left alone.
    fn expand_abbreviations(&self, base: &str) -> String {
        if self.abbreviations.is_empty() {
            return base.to_string();
        }
        base.split_whitespace()
            .map(|word| {
                let (stem, had_period) = match word.strip_suffix('.') {
                    Some(s) => (s, true),
                    None => (word, false),
                };
                if let Some(expansion) = self.abbreviations.get(stem) {
                    if had_period || stem.len() < 5 {
                        return expansion.clone();
                    }
                }
                word.to_string()
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn stem(&self, language: ProcessingLanguage, word: &str) -> String {
        self.stemmers
            .get(language.code())
            .map(|s| s.stem(word).into_owned())
            .unwrap_or_else(|| word.to_string())
    }

    /// Tokenize a title through steps 1–7, without stopword removal
    /// or stemming. Used to decide the "short title" exemption in
    /// the similarity calculator (§4.7) before the caller chooses
    /// whether to keep stopwords.
    pub fn title_base_tokens(&self, raw: &str) -> Vec<String> {
        let base = self.expand_abbreviations(&self.coalesce_core(raw));
        base.split_whitespace().map(|s| s.to_string()).collect()
    }

    /// Full title pipeline (§4.1 steps 1–9 plus §4.6/§4.7 stemming),
    /// returning the stemmed token list used both for indexing and
    /// for Jaccard similarity.
    pub fn title_tokens(
        &self,
        raw: &str,
        language: ProcessingLanguage,
        remove_stopwords: bool,
    ) -> Vec<String> {
        let tokens = self.title_base_tokens(raw);
        let stopwords = self.stopwords.get(language.code());
        tokens
            .into_iter()
            .filter(|w| {
                if !remove_stopwords {
                    return true;
                }
                w.len() >= 2 && !stopwords.is_some_and(|set| set.contains(w))
            })
            .map(|w| self.stem(language, &w))
            .collect()
    }

    /// Author profile: date-in-parentheses stripping, abbreviation
    /// expansion, author-qualifier stopword removal (Dr., Prof., …).
    pub fn normalize_author(&self, raw: &str, language: ProcessingLanguage) -> String {
        if raw.is_empty() {
            return String::new();
        }
        let without_dates = self.parenthetical_date_re.replace_all(raw, " ");
        let base = self.expand_abbreviations(&self.coalesce_core(&without_dates));
        let stopwords = self.author_stopwords.get(language.code());
        base.split_whitespace()
            .filter(|w| !stopwords.is_some_and(|set| set.contains(*w)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Publisher profile: location-in-parentheses stripping, date
    /// stripping, publisher stopword removal, suffix regex.
    pub fn normalize_publisher(&self, raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }
        let without_parens = self.parenthetical_re.replace_all(raw, " ");
        let without_years = self.standalone_year_re.replace_all(&without_parens, " ");
        let base = self.expand_abbreviations(&self.coalesce_core(&without_years));
        let filtered = base
            .split_whitespace()
            .filter(|w| !self.publisher_stopwords.contains(*w))
            .collect::<Vec<_>>()
            .join(" ");
        self.publisher_suffix_re
            .replace(&filtered, "")
            .trim()
            .to_string()
    }

    /// Same pipeline as [`Self::normalize_publisher`] but applied to a
    /// long blob (a renewal's `full_text`) without suffix-trimming,
    /// for use as the haystack in partial-ratio scoring (§4.7).
    pub fn normalize_for_field(&self, raw: &str, field: Field, language: ProcessingLanguage) -> String {
        match field {
            Field::Title => self.title_tokens(raw, language, false).join(" "),
            Field::Author => self.normalize_author(raw, language),
            Field::Publisher => self.normalize_publisher(raw),
        }
    }
}

fn regex_err(e: regex::Error) -> MatchError {
    MatchError::Config(format!("invalid built-in pattern: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(&Wordlists::embedded().unwrap()).unwrap()
    }

    #[test]
    fn idempotent_on_plain_ascii() {
        let n = normalizer();
        let once = n.title_tokens("The Great Gatsby", ProcessingLanguage::Eng, true);
        let twice = n.title_tokens(&once.join(" "), ProcessingLanguage::Eng, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn strips_bracketed_annotations() {
        let n = normalizer();
        let tokens = n.title_base_tokens("Moby Dick [microform]");
        assert!(!tokens.iter().any(|t| t.contains("microform")));
    }

    #[test]
    fn joins_split_initials() {
        let n = normalizer();
        let base = n.coalesce_core("u s a today");
        assert!(base.contains("usa"));
    }

    #[test]
    fn ascii_only_output() {
        let n = normalizer();
        let base = n.coalesce_core("Café Müller");
        assert!(base.is_ascii());
    }
}
