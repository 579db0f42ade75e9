//! Adaptive weighted score combination (§4.8).

use crate::config::{ScoringConfig, ScoringScenario, ScoringWeights};
use crate::derived_work::{self, DerivedWorkInfo};

/// Evidence available for one candidate comparison, used to select
/// the scenario and to decide which fields to redistribute weight
/// away from.
pub struct FieldScores {
    pub title: Option<f64>,
    pub author: Option<f64>,
    pub publisher: Option<f64>,
}

/// Redistribute a scenario's weights proportionally across whichever
/// fields are present, so the weights used still sum to 1 (or to 0 if
/// every field is absent).
fn redistribute(weights: ScoringWeights, fields: &FieldScores) -> (f64, f64, f64) {
    let present = [
        (fields.title.is_some(), weights.title),
        (fields.author.is_some(), weights.author),
        (fields.publisher.is_some(), weights.publisher),
    ];
    let missing_weight: f64 = present.iter().filter(|(p, _)| !p).map(|(_, w)| w).sum();
    let present_weight: f64 = present.iter().filter(|(p, _)| *p).map(|(_, w)| w).sum();

    if present_weight <= 0.0 {
        return (0.0, 0.0, 0.0);
    }

    let scale = (present_weight + missing_weight) / present_weight;
    (
        if fields.title.is_some() { weights.title * scale } else { 0.0 },
        if fields.author.is_some() { weights.author * scale } else { 0.0 },
        if fields.publisher.is_some() { weights.publisher * scale } else { 0.0 },
    )
}

/// Combine field scores into one confidence value in [0, 100].
#[allow(clippy::too_many_arguments)]
pub fn combine(
    config: &ScoringConfig,
    fields: &FieldScores,
    has_generic_title: bool,
    publisher_present: bool,
    has_lccn_match: bool,
    marc_derived: Option<&DerivedWorkInfo>,
    ref_derived: Option<&DerivedWorkInfo>,
) -> f64 {
    let scenario = ScoringScenario::select(has_generic_title, publisher_present);
    let weights = config.weights_for(scenario);
    let (wt, wa, wp) = redistribute(weights, fields);

    let mut score = wt * fields.title.unwrap_or(0.0)
        + wa * fields.author.unwrap_or(0.0)
        + wp * fields.publisher.unwrap_or(0.0);

    if has_lccn_match {
        // A direct LCCN match is the highest-precision signal available;
        // it floors the combined score even when text evidence is weak.
        score = score.max(config.lccn_floor);
    }

    if let (Some(marc), Some(reference)) = (marc_derived, ref_derived) {
        let (_, adjusted) = derived_work::should_penalize(marc, reference, score);
        score = adjusted;
    }

    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;

    #[test]
    fn weights_redistribute_to_sum_one_when_field_missing() {
        let weights = ScoringWeights { title: 0.5, author: 0.3, publisher: 0.2 };
        let fields = FieldScores { title: Some(80.0), author: Some(70.0), publisher: None };
        let (wt, wa, wp) = redistribute(weights, &fields);
        assert!((wt + wa + wp - 1.0).abs() < 1e-9);
        assert_eq!(wp, 0.0);
    }

    #[test]
    fn all_fields_missing_redistributes_to_zero() {
        let weights = ScoringWeights { title: 0.5, author: 0.3, publisher: 0.2 };
        let fields = FieldScores { title: None, author: None, publisher: None };
        let (wt, wa, wp) = redistribute(weights, &fields);
        assert_eq!((wt, wa, wp), (0.0, 0.0, 0.0));
    }

    #[test]
    fn identical_fields_combine_to_100() {
        let config = ScoringConfig::default();
        let fields = FieldScores { title: Some(100.0), author: Some(100.0), publisher: Some(100.0) };
        let score = combine(&config, &fields, false, true, false, None, None);
        assert!((score - 100.0).abs() < 0.001);
    }

    #[test]
    fn lccn_match_floors_weak_text_score() {
        let config = ScoringConfig::default();
        let fields = FieldScores { title: Some(10.0), author: Some(10.0), publisher: Some(10.0) };
        let score = combine(&config, &fields, false, true, true, None, None);
        assert!(score >= config.lccn_floor - 0.001);
    }
}
