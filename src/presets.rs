//! Named filter combinations and the classifier that recognises them.
//!
//! Classification is presentational only. It picks the entry the case
//! dropdown highlights and never feeds back into filtering.

use crate::state::{PredictionFilter, QueryState, ScoreRange};

/// Name reported when no preset matches.
pub const CUSTOM: &str = "custom";

/// An immutable named filter combination.
#[derive(Debug, Clone, PartialEq)]
pub struct CasePreset {
    pub name: &'static str,
    /// Dropdown label
    pub title: &'static str,
    pub iou: ScoreRange,
    pub ground_truth_coverage: ScoreRange,
    pub explanation_coverage: ScoreRange,
    pub prediction: PredictionFilter,
    pub description: &'static str,
}

impl CasePreset {
    /// Whether `state` carries exactly this preset's ranges and prediction
    /// filter. The label filter is not compared.
    pub fn matches(&self, state: &QueryState) -> bool {
        state.iou_range() == self.iou
            && state.ground_truth_range() == self.ground_truth_coverage
            && state.explanation_range() == self.explanation_coverage
            && state.prediction_fn() == &self.prediction
    }
}

const FULL: ScoreRange = ScoreRange::FULL;
const LOW: ScoreRange = ScoreRange::LOW;
const HIGH: ScoreRange = ScoreRange::HIGH;

const fn preset(
    name: &'static str,
    title: &'static str,
    ranges: [ScoreRange; 3],
    prediction: PredictionFilter,
    description: &'static str,
) -> CasePreset {
    let [iou, ground_truth_coverage, explanation_coverage] = ranges;
    CasePreset {
        name,
        title,
        iou,
        ground_truth_coverage,
        explanation_coverage,
        prediction,
        description,
    }
}

/// The preset table in declaration order. `default` comes first.
pub static CASE_PRESETS: [CasePreset; 9] = [
    preset(
        "default",
        "--- Select a preset to explore ---",
        [FULL, FULL, FULL],
        PredictionFilter::All,
        "",
    ),
    preset(
        "human_aligned",
        "Human Aligned",
        [HIGH, FULL, FULL],
        PredictionFilter::CorrectOnly,
        "Correctly classified results with high IoU.",
    ),
    preset(
        "sufficient_subset",
        "Sufficient Subset",
        [FULL, LOW, HIGH],
        PredictionFilter::CorrectOnly,
        "Correctly classified results with low ground truth coverage and high explanation coverage.",
    ),
    preset(
        "sufficient_background",
        "Sufficient Background",
        [FULL, LOW, FULL],
        PredictionFilter::CorrectOnly,
        "Correctly classified results with low ground truth coverage.",
    ),
    preset(
        "context_dependant",
        "Context Dependant",
        [FULL, HIGH, LOW],
        PredictionFilter::CorrectOnly,
        "Correctly classified results with high ground truth coverage and low explanation coverage.",
    ),
    preset(
        "confuser",
        "Confuser",
        [HIGH, FULL, FULL],
        PredictionFilter::IncorrectOnly,
        "Incorrectly classified results with high IoU.",
    ),
    preset(
        "too_focused",
        "Too Focused",
        [FULL, LOW, HIGH],
        PredictionFilter::IncorrectOnly,
        "Incorrectly classified results with low ground truth coverage and high explanation coverage.",
    ),
    preset(
        "distracted",
        "Distracted",
        [FULL, LOW, FULL],
        PredictionFilter::IncorrectOnly,
        "Incorrectly classified results with low ground truth coverage.",
    ),
    preset(
        "context_confusion",
        "Context Confusion",
        [FULL, HIGH, LOW],
        PredictionFilter::IncorrectOnly,
        "Incorrectly classified results with high ground truth coverage and low explanation coverage.",
    ),
];

pub fn find_preset(name: &str) -> Option<&'static CasePreset> {
    CASE_PRESETS.iter().find(|p| p.name == name)
}

/// Name of the first preset matching `state`, or [`CUSTOM`].
pub fn classify(state: &QueryState) -> &'static str {
    CASE_PRESETS
        .iter()
        .find(|p| p.matches(state))
        .map_or(CUSTOM, |p| p.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FieldValue, StateOverrides};

    #[test]
    fn test_fresh_state_is_default() {
        assert_eq!(classify(&QueryState::detached()), "default");
    }

    #[test]
    fn test_human_aligned_scenario() {
        let overrides = StateOverrides {
            iou_filter: Some(ScoreRange::new_clamped(0.7, 1.0)),
            prediction_fn: Some(PredictionFilter::CorrectOnly),
            ..Default::default()
        };
        let state = QueryState::embedded(&overrides, false);
        assert_eq!(classify(&state), "human_aligned");
    }

    #[test]
    fn test_every_preset_classifies_as_itself() {
        for preset in &CASE_PRESETS {
            let mut state = QueryState::detached();
            state.apply_preset(preset);
            assert_eq!(classify(&state), preset.name);
        }
    }

    #[test]
    fn test_label_filter_does_not_affect_classification() {
        let mut state = QueryState::detached();
        state.apply_preset(find_preset("distracted").unwrap());
        let before = classify(&state);
        state.set(FieldValue::LabelFilter("beagle".into()));
        assert_eq!(classify(&state), before);
        assert_eq!(classify(&state), classify(&state));
    }

    #[test]
    fn test_custom_when_nothing_matches() {
        let mut state = QueryState::detached();
        state.set_iou_range(0.1, 0.2);
        assert_eq!(classify(&state), CUSTOM);

        let mut by_class = QueryState::detached();
        by_class.set(FieldValue::PredictionFn(PredictionFilter::Predicted(
            "pug".into(),
        )));
        assert_eq!(classify(&by_class), CUSTOM);
    }

    #[test]
    fn test_preset_names_unique() {
        for (i, a) in CASE_PRESETS.iter().enumerate() {
            assert!(CASE_PRESETS[i + 1..].iter().all(|b| b.name != a.name));
        }
        assert!(find_preset("nope").is_none());
    }
}
