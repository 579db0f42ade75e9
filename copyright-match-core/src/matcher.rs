//! Matching engine (§4.9): retrieve, score, and select the best
//! reference candidate for one query Publication.

use crate::combiner::{self, FieldScores};
use crate::config::Config;
use crate::derived_work;
use crate::generic_title::GenericTitleDetector;
use crate::index::{generate_author_keys, generate_publisher_keys, generate_title_keys, Index, Query};
use crate::lccn::normalize_lccn;
use crate::model::{MatchResult, Publication, PublicationId};
use crate::similarity::SimilarityCalculator;
use crate::text::TextNormalizer;

/// Everything the matching engine needs that is read-only and shared
/// across worker threads (§4.10: "read-only handles ... shared
/// without copying").
pub struct MatchingEngine<'a> {
    pub normalizer: &'a TextNormalizer,
    pub config: &'a Config,
}

impl<'a> MatchingEngine<'a> {
    pub fn new(normalizer: &'a TextNormalizer, config: &'a Config) -> Self {
        MatchingEngine { normalizer, config }
    }

    /// Build the index query for one input Publication against a
    /// given reference corpus.
    fn build_query(&self, input: &Publication) -> Query {
        Query {
            title_keys: generate_title_keys(&input.title, input.processing_language, self.normalizer),
            author_keys: generate_author_keys(&input.author, self.normalizer),
            publisher_keys: input
                .publisher
                .as_deref()
                .map(|p| generate_publisher_keys(p, self.normalizer))
                .unwrap_or_default(),
            year: input.year,
            lccn: input.lccn.as_deref().map(normalize_lccn).filter(|s| !s.is_empty()),
        }
    }

    /// Find the best match for `input` among `reference` records,
    /// using `index` for candidate retrieval and `generic_titles` for
    /// the generic-title signal. Returns `None` when no candidate
    /// passes the threshold gates (or when there are no candidates at
    /// all) and `score_everything` is off.
    pub fn find_best(
        &self,
        input: &Publication,
        reference: &[Publication],
        index: &Index,
        generic_titles: &mut GenericTitleDetector,
    ) -> Option<MatchResult> {
        if input.title.is_empty() {
            return None;
        }

        let query = self.build_query(input);
        let candidates = index.candidates(&query, self.config.thresholds.year_tolerance);
        if candidates.is_empty() {
            return None;
        }

        let calc = SimilarityCalculator::new(self.normalizer);
        let thresholds = &self.config.thresholds;
        let score_everything = self.config.analysis.score_everything;

        let has_generic_title = generic_titles.is_generic(&input.title, input.processing_language.code());

        let mut best: Option<MatchResult> = None;
        let mut best_score = f64::MIN;

        for &dense_id in &candidates {
            let Some(candidate) = reference.get(dense_id as usize) else { continue };
            if candidate.title.is_empty() {
                continue;
            }

            if let (Some(iy), Some(cy)) = (input.year, candidate.year) {
                if (iy - cy).abs() > thresholds.year_tolerance {
                    continue;
                }
            }

            let title_score = calc.title_similarity(&input.title, &candidate.title, input.processing_language);
            if title_score < thresholds.title && !score_everything {
                continue;
            }

            let author_vs_transcribed = calc.author_similarity(&input.author, &candidate.author, input.processing_language);
            let author_vs_heading = input
                .main_author
                .as_deref()
                .map(|heading| calc.author_similarity(heading, &candidate.author, input.processing_language))
                .unwrap_or(0.0);
            let author_score = author_vs_transcribed.max(author_vs_heading);

            let has_author_data = !input.author.is_empty() || input.main_author.is_some();
            let has_publisher_query = input.publisher.as_deref().is_some_and(|p| !p.is_empty());

            let publisher_score = if has_publisher_query {
                Some(calc.publisher_similarity(
                    input.publisher.as_deref().unwrap_or(""),
                    candidate.publisher.as_deref(),
                    candidate.full_text.as_deref(),
                ))
            } else {
                None
            };

            let lccn_matches = query
                .lccn
                .as_deref()
                .zip(candidate.lccn.as_deref())
                .is_some_and(|(a, b)| a == normalize_lccn(b));

            let (marc_derived, ref_derived) =
                derived_work::detect(&input.title, &candidate.title, input.processing_language);

            let fields = FieldScores {
                title: Some(title_score),
                author: if has_author_data { Some(author_score) } else { None },
                publisher: publisher_score,
            };

            let combined = combiner::combine(
                &self.config.scoring,
                &fields,
                has_generic_title,
                candidate.has_publisher_evidence() && has_publisher_query,
                lccn_matches,
                Some(&marc_derived),
                Some(&ref_derived),
            );

            if has_author_data && author_score < thresholds.author && !score_everything {
                continue;
            }
            if has_publisher_query && publisher_score.unwrap_or(0.0) < thresholds.publisher && !score_everything {
                continue;
            }

            if combined > best_score {
                best_score = combined;
                let (penalized, _) = derived_work::should_penalize(&marc_derived, &ref_derived, combined);
                best = Some(MatchResult {
                    reference_id: PublicationId(candidate.id.0.clone()),
                    matched_title: candidate.title.clone(),
                    matched_author: candidate.author.clone(),
                    matched_publisher: candidate.publisher.clone(),
                    reference_year: candidate.year,
                    year_difference: input.year.zip(candidate.year).map(|(a, b)| a - b),
                    title_score,
                    author_score,
                    publisher_score: publisher_score.unwrap_or(0.0),
                    combined_score: combined,
                    has_generic_title,
                    derived_work_penalty_applied: penalized,
                    matched_via_lccn: lccn_matches,
                    reason_codes: vec![derived_work::penalty_reason(&marc_derived, &ref_derived)],
                });
            }

            if title_score >= thresholds.early_exit_title
                && has_author_data
                && author_score >= thresholds.early_exit_author
            {
                break;
            }
        }

        best
    }
}
