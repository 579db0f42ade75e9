//! Generic-title detection (§4.4).
//!
//! Ported from the source's `GenericTitleDetector`: a fixed pattern
//! list plus a bounded frequency counter, with an explicit LRU cache
//! standing in for the source's memoizing decorator (per the
//! re-architecture note in the Design Notes — no language-level
//! memoization magic, just a `HashMap` we evict from ourselves).

use std::collections::HashMap;

use crate::config::GenericTitleConfig;

#[derive(Clone)]
struct LruCache {
    capacity: usize,
    map: HashMap<String, bool>,
    order: Vec<String>,
}

impl LruCache {
    fn new(capacity: usize) -> Self {
        LruCache { capacity, map: HashMap::new(), order: Vec::new() }
    }

    fn get(&mut self, key: &str) -> Option<bool> {
        if let Some(v) = self.map.get(key).copied() {
            self.order.retain(|k| k != key);
            self.order.push(key.to_string());
            Some(v)
        } else {
            None
        }
    }

    fn insert(&mut self, key: String, value: bool) {
        if self.map.len() >= self.capacity && !self.map.contains_key(&key) {
            if !self.order.is_empty() {
                let oldest = self.order.remove(0);
                self.map.remove(&oldest);
            }
        }
        self.order.retain(|k| k != &key);
        self.order.push(key.clone());
        self.map.insert(key, value);
    }
}

/// Detects titles too generic to be individually identifying, and
/// tracks how often each normalized title has been seen across the
/// reference corpora.
#[derive(Clone)]
pub struct GenericTitleDetector {
    patterns: Vec<String>,
    frequency_threshold: u32,
    max_title_counts: usize,
    counts: HashMap<String, u32>,
    trim_performed: bool,
    cache: LruCache,
}

fn normalize_for_counting(title: &str) -> String {
    let lower = title.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut last_was_space = false;
    for c in lower.chars() {
        if c.is_alphanumeric() {
            out.push(c);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim().to_string()
}

impl GenericTitleDetector {
    pub fn new(config: &GenericTitleConfig, patterns: Vec<String>) -> Self {
        GenericTitleDetector {
            patterns,
            frequency_threshold: config.frequency_threshold,
            max_title_counts: config.max_title_counts,
            counts: HashMap::new(),
            trim_performed: false,
            cache: LruCache::new(config.cache_size),
        }
    }

    /// Record a reference title's occurrence, trimming the counter to
    /// its top half (by count) when it grows past `max_title_counts`.
    pub fn add_title(&mut self, title: &str) {
        let key = normalize_for_counting(title);
        if key.is_empty() {
            return;
        }
        *self.counts.entry(key).or_insert(0) += 1;

        if self.counts.len() > self.max_title_counts {
            self.trim_title_counts();
        }
    }

    fn trim_title_counts(&mut self) {
        let keep = self.max_title_counts / 2;
        let mut entries: Vec<(String, u32)> = self.counts.drain().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(keep);
        self.counts = entries.into_iter().collect();
        self.trim_performed = true;
    }

    pub fn trim_was_performed(&self) -> bool {
        self.trim_performed
    }

    /// A title is generic if its normalized form contains one of the
    /// patterns, or is short (<20 chars) and frequent.
    pub fn is_generic(&mut self, title: &str, _language: &str) -> bool {
        let key = normalize_for_counting(title);
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }
        let result = self.is_generic_impl(&key);
        self.cache.insert(key, result);
        result
    }

    fn is_generic_impl(&self, normalized: &str) -> bool {
        if self.patterns.iter().any(|p| normalized.contains(p.as_str())) {
            return true;
        }
        if normalized.len() < 20 {
            if let Some(count) = self.counts.get(normalized) {
                return *count >= self.frequency_threshold;
            }
        }
        false
    }

    /// The longest matching pattern, or a frequency-based reason, or
    /// "none" when the title is not generic.
    pub fn detection_reason(&mut self, title: &str, language: &str) -> String {
        let key = normalize_for_counting(title);
        if !self.is_generic(title, language) {
            return "none".to_string();
        }
        let mut matched: Vec<&String> =
            self.patterns.iter().filter(|p| key.contains(p.as_str())).collect();
        matched.sort_by_key(|p| std::cmp::Reverse(p.len()));
        if let Some(p) = matched.first() {
            return format!("pattern:{p}");
        }
        if let Some(count) = self.counts.get(&key) {
            return format!("frequency:{count}");
        }
        "none".to_string()
    }

    pub fn stats(&self) -> (usize, bool) {
        (self.counts.len(), self.trim_performed)
    }
}

/// Build a detector from the embedded wordlist patterns.
pub fn from_patterns(config: &GenericTitleConfig, patterns: &[String]) -> GenericTitleDetector {
    GenericTitleDetector::new(config, patterns.to_vec())
}

/// Normalize a title the way the detector's frequency counter does,
/// independent of the full similarity-oriented [`TextNormalizer`].
pub fn counting_key(title: &str) -> String {
    normalize_for_counting(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> GenericTitleDetector {
        let cfg = GenericTitleConfig { frequency_threshold: 2, cache_size: 16, max_title_counts: 10 };
        GenericTitleDetector::new(&cfg, vec!["poems".to_string(), "annual report".to_string()])
    }

    #[test]
    fn pattern_match_is_generic() {
        let mut d = detector();
        assert!(d.is_generic("Poems", "eng"));
        assert_eq!(d.detection_reason("Poems", "eng"), "pattern:poems");
    }

    #[test]
    fn frequent_short_title_is_generic() {
        let mut d = detector();
        d.add_title("Letters");
        d.add_title("Letters");
        assert!(d.is_generic("Letters", "eng"));
    }

    #[test]
    fn distinctive_title_is_not_generic() {
        let mut d = detector();
        assert!(!d.is_generic("The Adventures of Sherlock Holmes", "eng"));
        assert_eq!(d.detection_reason("The Adventures of Sherlock Holmes", "eng"), "none");
    }

    #[test]
    fn counter_trims_when_oversized() {
        let mut d = detector();
        for i in 0..20 {
            d.add_title(&format!("Title Number {i}"));
        }
        let (size, trimmed) = d.stats();
        assert!(trimmed);
        assert!(size <= 10);
    }
}
