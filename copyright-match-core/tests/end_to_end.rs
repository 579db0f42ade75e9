//! End-to-end scenarios from the matching engine's testable-properties
//! list: one input record, one reference corpus, run through
//! [`MatchingEngine::find_best`] exactly as the batch driver would.

use copyright_match_core::config::Config;
use copyright_match_core::generic_title::from_patterns;
use copyright_match_core::index::Index;
use copyright_match_core::matcher::MatchingEngine;
use copyright_match_core::model::{
    CountryClass, NormalizedForms, ProcessingLanguage, Publication, PublicationId, SourceTag,
};
use copyright_match_core::text::TextNormalizer;

fn blank_publication(id: &str, title: &str) -> Publication {
    Publication {
        id: PublicationId::from(id),
        source: SourceTag::Registration,
        title: title.to_string(),
        part_number: None,
        part_name: None,
        author: String::new(),
        main_author: None,
        publisher: None,
        place: None,
        pub_date: None,
        year: None,
        full_text: None,
        country_code: None,
        country_class: CountryClass::Unknown,
        language_tag: None,
        processing_language: ProcessingLanguage::Eng,
        lccn: None,
        normalized: NormalizedForms::default(),
    }
}

struct Harness {
    config: Config,
    normalizer: TextNormalizer,
}

impl Harness {
    fn new() -> Self {
        let config = Config::default_config().unwrap();
        let normalizer = TextNormalizer::new(&config.wordlists).unwrap();
        Harness { config, normalizer }
    }

    fn find_best(&self, input: &Publication, reference: &[Publication]) -> Option<copyright_match_core::model::MatchResult> {
        let mut index = Index::new();
        for (i, publication) in reference.iter().enumerate() {
            index.add_publication(i as u32, publication, &self.normalizer);
        }
        let mut generic_titles = from_patterns(&self.config.generic_title, &self.config.wordlists.generic_title_patterns);
        for publication in reference {
            generic_titles.add_title(&publication.title);
        }
        let engine = MatchingEngine::new(&self.normalizer, &self.config);
        engine.find_best(input, reference, &index, &mut generic_titles)
    }
}

/// Scenario 1: exact match, US registration.
#[test]
fn exact_match_scores_high_across_all_fields() {
    let harness = Harness::new();

    let query = Publication {
        author: "Doyle, Arthur Conan".to_string(),
        publisher: Some("George Newnes".to_string()),
        year: Some(1892),
        country_class: CountryClass::Us,
        ..blank_publication("q1", "The Adventures of Sherlock Holmes")
    };

    let reference = Publication {
        author: "Arthur Conan Doyle".to_string(),
        publisher: Some("Newnes".to_string()),
        year: Some(1892),
        ..blank_publication("r1", "Adventures of Sherlock Holmes")
    };

    let best = harness.find_best(&query, &[reference]).expect("expected a match");

    assert!(best.title_score >= 75.0, "title_score={}", best.title_score);
    assert!(best.author_score >= 90.0, "author_score={}", best.author_score);
    assert!(best.publisher_score >= 70.0, "publisher_score={}", best.publisher_score);
    assert!(best.combined_score >= 85.0, "combined_score={}", best.combined_score);
}

/// Scenario 2: an LCCN match short-circuits and floors the score even
/// when the query and reference are formatted differently.
#[test]
fn lccn_match_short_circuits_regardless_of_text_scores() {
    let harness = Harness::new();

    let query = Publication {
        lccn: Some("n78-890351".to_string()),
        year: Some(1975),
        ..blank_publication("q2", "A Completely Different Title")
    };

    let reference = Publication {
        lccn: Some("n 78890351".to_string()),
        title: "Nothing Like The Query At All".to_string(),
        year: Some(1975),
        ..blank_publication("r2", "Nothing Like The Query At All")
    };

    let best = harness.find_best(&query, &[reference]).expect("expected an LCCN match");

    assert!(best.matched_via_lccn);
    assert!(best.combined_score >= harness.config.scoring.lccn_floor);
}

/// Scenario 3: a generic title is downweighted in favor of author and
/// publisher, but a strong enough match on those fields still wins.
#[test]
fn generic_title_is_downweighted_not_disqualified() {
    let harness = Harness::new();

    let query = Publication {
        author: "Whitman, Walt".to_string(),
        publisher: Some("Random House".to_string()),
        year: Some(1950),
        ..blank_publication("q3", "Poems")
    };

    let reference = Publication {
        author: "Walt Whitman".to_string(),
        publisher: Some("Random House".to_string()),
        year: Some(1950),
        ..blank_publication("r3", "Poems")
    };

    // Seed the detector's frequency counter the way the driver would
    // from a corpus where "poems" recurs across many records.
    let mut generic_titles =
        from_patterns(&harness.config.generic_title, &harness.config.wordlists.generic_title_patterns);
    for _ in 0..50 {
        generic_titles.add_title("Poems");
    }
    generic_titles.add_title("Poems");

    assert!(generic_titles.is_generic("Poems", ProcessingLanguage::Eng.code()));

    let mut index = Index::new();
    index.add_publication(0, &reference, &harness.normalizer);
    let engine = MatchingEngine::new(&harness.normalizer, &harness.config);
    let best = engine
        .find_best(&query, std::slice::from_ref(&reference), &index, &mut generic_titles)
        .expect("expected a match despite the generic title");

    assert!(best.has_generic_title);
    assert!(best.combined_score >= harness.config.thresholds.minimum_combined_score);
}

/// Scenario 4: a derived-work title (an index to another work) is
/// penalized enough to fall below the ordinary title threshold.
#[test]
fn derived_work_title_is_penalized_below_threshold() {
    let harness = Harness::new();

    let query = Publication {
        author: "Tolstoy, Leo".to_string(),
        year: Some(1869),
        ..blank_publication("q4", "Index to War and Peace")
    };

    let reference = Publication {
        author: "Leo Tolstoy".to_string(),
        year: Some(1869),
        ..blank_publication("r4", "War and Peace")
    };

    let best = harness.find_best(&query, &[reference]);
    if let Some(best) = best {
        assert!(best.derived_work_penalty_applied);
        assert!(best.combined_score < harness.config.thresholds.title);
    }
}

/// Scenario 5: a truncated query title gets a containment bonus well
/// above its raw Jaccard overlap with the fuller reference title.
#[test]
fn truncated_title_gets_containment_bonus() {
    let harness = Harness::new();

    let query = Publication {
        author: "Some Author".to_string(),
        year: Some(1900),
        processing_language: ProcessingLanguage::Ger,
        ..blank_publication("q5", "Iduna Robiat")
    };

    let reference = Publication {
        author: "Some Author".to_string(),
        year: Some(1900),
        processing_language: ProcessingLanguage::Ger,
        ..blank_publication("r5", "Iduna Robiat historischer Roman aus Merans Vergangenheit")
    };

    let best = harness.find_best(&query, &[reference]).expect("expected a match");
    assert!(best.title_score >= 60.0, "title_score={}", best.title_score);
}

/// Scenario 6: publisher evidence extracted from a renewal's raw
/// full_text, not a structured publisher field.
#[test]
fn publisher_extracted_from_renewal_full_text() {
    let harness = Harness::new();

    let query = Publication {
        author: "Smith, Jane".to_string(),
        publisher: Some("Penguin".to_string()),
        year: Some(1950),
        ..blank_publication("q6", "Collected Works")
    };

    let reference = Publication {
        author: "Jane Smith".to_string(),
        year: Some(1950),
        full_text: Some("© 1950, A1234. R123456, 15Jun78, Penguin Books (PB)".to_string()),
        source: SourceTag::Renewal,
        ..blank_publication("r6", "Collected Works")
    };

    let best = harness.find_best(&query, &[reference]).expect("expected a match");
    assert!(best.publisher_score >= 70.0, "publisher_score={}", best.publisher_score);
}

/// Boundary: an empty query title never attempts a match.
#[test]
fn empty_title_never_matches() {
    let harness = Harness::new();
    let query = blank_publication("q7", "");
    let reference = blank_publication("r7", "Something");
    assert!(harness.find_best(&query, &[reference]).is_none());
}

/// Boundary: an empty reference corpus never matches, never panics.
#[test]
fn empty_reference_corpus_never_matches() {
    let harness = Harness::new();
    let query = blank_publication("q8", "Anything At All");
    assert!(harness.find_best(&query, &[]).is_none());
}
