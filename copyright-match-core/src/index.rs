//! Inverted index over reference corpora (§4.6).
//!
//! `CompactIndexEntry` is the tagged-variant analogue of the source's
//! `CompactIndexEntry` class (`int | set[int] | None`): a single ID is
//! stored inline with no heap allocation, and only sets of two or more
//! spill to a `Vec`. This mirrors the teacher's own habit of hand
//! rolling small tagged unions (`marctk::record::Field`,
//! `evergreen::error::EgError`) rather than reaching for a generic
//! container.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::{Publication, ProcessingLanguage};
use crate::text::TextNormalizer;

/// A compact set of dense publication indices: empty, one, or many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompactIndexEntry {
    Empty,
    One(u32),
    Many(Vec<u32>),
}

impl Default for CompactIndexEntry {
    fn default() -> Self {
        CompactIndexEntry::Empty
    }
}

impl CompactIndexEntry {
    pub fn add(&mut self, id: u32) {
        match self {
            CompactIndexEntry::Empty => *self = CompactIndexEntry::One(id),
            CompactIndexEntry::One(existing) => {
                if *existing != id {
                    *self = CompactIndexEntry::Many(vec![*existing, id]);
                }
            }
            CompactIndexEntry::Many(ids) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CompactIndexEntry::Empty)
    }

    pub fn ids(&self) -> Vec<u32> {
        match self {
            CompactIndexEntry::Empty => Vec::new(),
            CompactIndexEntry::One(id) => vec![*id],
            CompactIndexEntry::Many(ids) => ids.clone(),
        }
    }

    fn extend_into(&self, set: &mut HashSet<u32>) {
        match self {
            CompactIndexEntry::Empty => {}
            CompactIndexEntry::One(id) => {
                set.insert(*id);
            }
            CompactIndexEntry::Many(ids) => set.extend(ids.iter().copied()),
        }
    }
}

/// The five parallel inverted indices over one reference corpus.
#[derive(Default, Serialize, Deserialize)]
pub struct Index {
    title_index: AHashMap<String, CompactIndexEntry>,
    author_index: AHashMap<String, CompactIndexEntry>,
    publisher_index: AHashMap<String, CompactIndexEntry>,
    year_index: AHashMap<i32, CompactIndexEntry>,
    lccn_index: AHashMap<String, CompactIndexEntry>,
}

/// A lookup query assembled from a Publication's normalized fields.
pub struct Query {
    pub title_keys: Vec<String>,
    pub author_keys: Vec<String>,
    pub publisher_keys: Vec<String>,
    pub year: Option<i32>,
    pub lccn: Option<String>,
}

impl Index {
    pub fn new() -> Self {
        Index::default()
    }

    /// Index one reference publication, identified by its dense slot
    /// `dense_id` in the owning corpus's Publication vector.
    pub fn add_publication(&mut self, dense_id: u32, pub_: &Publication, normalizer: &TextNormalizer) {
        for key in generate_title_keys(&pub_.title, pub_.processing_language, normalizer) {
            self.title_index.entry(key).or_default().add(dense_id);
        }
        for key in generate_author_keys(&pub_.author, normalizer) {
            self.author_index.entry(key).or_default().add(dense_id);
        }
        if let Some(main_author) = &pub_.main_author {
            for key in generate_author_keys(main_author, normalizer) {
                self.author_index.entry(key).or_default().add(dense_id);
            }
        }
        if let Some(publisher) = &pub_.publisher {
            for key in generate_publisher_keys(publisher, normalizer) {
                self.publisher_index.entry(key).or_default().add(dense_id);
            }
        }
        if let Some(year) = pub_.year {
            self.year_index.entry(year).or_default().add(dense_id);
        }
        if let Some(lccn) = &pub_.lccn {
            let normalized = crate::lccn::normalize_lccn(lccn);
            if !normalized.is_empty() {
                self.lccn_index.entry(normalized).or_default().add(dense_id);
            }
        }
    }

    fn lookup_set(index: &AHashMap<String, CompactIndexEntry>, keys: &[String]) -> HashSet<u32> {
        let mut out = HashSet::new();
        for key in keys {
            if let Some(entry) = index.get(key) {
                entry.extend_into(&mut out);
            }
        }
        out
    }

    fn year_set(&self, year: i32, tolerance: i32) -> HashSet<u32> {
        let mut out = HashSet::new();
        for y in (year - tolerance)..=(year + tolerance) {
            if let Some(entry) = self.year_index.get(&y) {
                entry.extend_into(&mut out);
            }
        }
        out
    }

    /// Candidate retrieval (§4.6). Ordering is contractual: LCCN
    /// short-circuit, then year as primary filter, then
    /// title/author/publisher intersections, retaining the
    /// pre-intersection set at any step that would empty it.
    pub fn candidates(&self, query: &Query, year_tolerance: i32) -> Vec<u32> {
        if let Some(lccn) = &query.lccn {
            if let Some(entry) = self.lccn_index.get(lccn) {
                if !entry.is_empty() {
                    return entry.ids();
                }
            }
        }

        let title_set = Self::lookup_set(&self.title_index, &query.title_keys);
        let author_set = Self::lookup_set(&self.author_index, &query.author_keys);
        let publisher_set = Self::lookup_set(&self.publisher_index, &query.publisher_keys);

        let base = match query.year {
            Some(year) => {
                let year_set = self.year_set(year, year_tolerance);
                intersect_or_retain(year_set, &title_set)
            }
            None => {
                if !title_set.is_empty() {
                    title_set.clone()
                } else {
                    author_set.clone()
                }
            }
        };

        let after_author = if query.year.is_some() || !title_set.is_empty() {
            intersect_or_retain(base, &author_set)
        } else {
            base
        };

        let after_publisher = intersect_or_retain(after_author, &publisher_set);

        let mut out: Vec<u32> = after_publisher.into_iter().collect();
        out.sort_unstable();
        out
    }
}

/// Intersect `base` with `other` unless `other` is empty (nothing to
/// intersect with) or the intersection would be empty (retain `base`
/// per the §4.6 "retain the pre-intersection set" rule).
fn intersect_or_retain(base: HashSet<u32>, other: &HashSet<u32>) -> HashSet<u32> {
    if other.is_empty() {
        return base;
    }
    let intersected: HashSet<u32> = base.intersection(other).copied().collect();
    if intersected.is_empty() {
        base
    } else {
        intersected
    }
}

/// Title keys: stems of length ≥2, plus 2- and 3-stem concatenations
/// at the front and back of the token list (§4.6).
pub fn generate_title_keys(title: &str, language: ProcessingLanguage, normalizer: &TextNormalizer) -> Vec<String> {
    let stems = normalizer.title_tokens(title, language, true);
    let mut keys: Vec<String> = stems.iter().filter(|s| s.len() >= 2).cloned().collect();

    if stems.len() >= 2 {
        keys.push(format!("{}_{}", stems[0], stems[1]));
        keys.push(format!("{}_{}", stems[stems.len() - 2], stems[stems.len() - 1]));
    }
    if stems.len() >= 3 {
        keys.push(format!("{}_{}_{}", stems[0], stems[1], stems[2]));
    }
    keys
}

/// Author keys: surname + given-name tokens, both bigram orderings,
/// and initials with and without a trailing period. Detects
/// "Last, First" vs "First Last" vs single-token form.
pub fn generate_author_keys(author: &str, normalizer: &TextNormalizer) -> Vec<String> {
    let normalized = normalizer.normalize_author(author, ProcessingLanguage::Eng);
    if normalized.is_empty() {
        return Vec::new();
    }

    let (surname, given): (String, Vec<String>) = if let Some((last, rest)) = normalized.split_once(',') {
        (last.trim().to_string(), rest.split_whitespace().map(str::to_string).collect())
    } else {
        let tokens: Vec<String> = normalized.split_whitespace().map(str::to_string).collect();
        if tokens.len() >= 2 {
            let last = tokens.last().cloned().unwrap_or_default();
            (last, tokens[..tokens.len() - 1].to_vec())
        } else {
            (tokens.first().cloned().unwrap_or_default(), Vec::new())
        }
    };

    let mut keys = Vec::new();
    if !surname.is_empty() {
        keys.push(surname.clone());
    }
    for g in &given {
        if !g.is_empty() {
            keys.push(g.clone());
            if let Some(first_char) = g.chars().next() {
                keys.push(first_char.to_string());
                keys.push(format!("{first_char}."));
            }
        }
    }
    if let (Some(first_given), false) = (given.first(), surname.is_empty()) {
        keys.push(format!("{surname}_{first_given}"));
        keys.push(format!("{first_given}_{surname}"));
    }
    keys
}

/// Publisher keys: tokens and bigrams, after stopword filtering;
/// falls back to the three longest tokens if filtering removed
/// everything (§4.6).
pub fn generate_publisher_keys(publisher: &str, normalizer: &TextNormalizer) -> Vec<String> {
    let normalized = normalizer.normalize_publisher(publisher);
    let mut tokens: Vec<String> = normalized
        .split_whitespace()
        .filter(|t| t.len() >= 3 || (t.len() >= 2 && t.chars().all(|c| c.is_alphabetic())))
        .map(str::to_string)
        .collect();

    if tokens.is_empty() {
        let mut all: Vec<String> = normalized.split_whitespace().map(str::to_string).collect();
        all.sort_by_key(|b| std::cmp::Reverse(b.len()));
        tokens = all.into_iter().take(3).collect();
    }

    let mut keys = tokens.clone();
    for window in tokens.windows(2) {
        keys.push(format!("{}_{}", window[0], window[1]));
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Wordlists;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(&Wordlists::embedded().unwrap()).unwrap()
    }

    #[test]
    fn compact_entry_stays_inline_for_singletons() {
        let mut entry = CompactIndexEntry::default();
        entry.add(7);
        assert!(matches!(entry, CompactIndexEntry::One(7)));
    }

    #[test]
    fn compact_entry_spills_to_many() {
        let mut entry = CompactIndexEntry::default();
        entry.add(1);
        entry.add(2);
        assert!(matches!(entry, CompactIndexEntry::Many(_)));
        assert_eq!(entry.ids().len(), 2);
    }

    #[test]
    fn year_is_primary_filter_when_present() {
        let n = normalizer();
        let mut idx = Index::new();
        let mut p = make_pub("Sherlock Holmes", 1892);
        p.author = "Doyle, Arthur Conan".to_string();
        idx.add_publication(0, &p, &n);

        let mut p2 = make_pub("Sherlock Holmes", 1950);
        p2.author = "Doyle, Arthur Conan".to_string();
        idx.add_publication(1, &p2, &n);

        let query = Query {
            title_keys: generate_title_keys("Sherlock Holmes", ProcessingLanguage::Eng, &n),
            author_keys: generate_author_keys("Doyle, Arthur Conan", &n),
            publisher_keys: vec![],
            year: Some(1892),
            lccn: None,
        };
        let candidates = idx.candidates(&query, 0);
        assert_eq!(candidates, vec![0]);
    }

    fn make_pub(title: &str, year: i32) -> Publication {
        Publication {
            id: crate::model::PublicationId::from("x"),
            source: crate::model::SourceTag::Registration,
            title: title.to_string(),
            part_number: None,
            part_name: None,
            author: String::new(),
            main_author: None,
            publisher: None,
            place: None,
            pub_date: None,
            year: Some(year),
            full_text: None,
            country_code: None,
            country_class: crate::model::CountryClass::Unknown,
            language_tag: None,
            processing_language: ProcessingLanguage::Eng,
            lccn: None,
            normalized: crate::model::NormalizedForms::default(),
        }
    }
}
