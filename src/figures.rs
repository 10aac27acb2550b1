//! Frozen dashboards embedded beside the article text.
//!
//! Each panel mounts its own dashboard under element `fig{n}-{i}`, ignores
//! the page URL and freezes every field its overrides name.

use crate::state::{PredictionFilter, QueryState, ScoreFn, StateOverrides};

#[derive(Debug, Clone, PartialEq)]
pub struct FigurePanel {
    pub element_id: String,
    pub overrides: StateOverrides,
}

impl FigurePanel {
    /// Detached state with the overrides applied and frozen.
    pub fn state(&self) -> QueryState {
        QueryState::embedded(&self.overrides, true)
    }
}

fn overrides(
    case_study: &str,
    score_fn: ScoreFn,
    sort_by: i8,
    prediction: PredictionFilter,
    label: &str,
) -> StateOverrides {
    StateOverrides {
        case_study: Some(case_study.to_string()),
        score_fn: Some(score_fn),
        sort_by: Some(sort_by),
        prediction_fn: Some(prediction),
        label_filter: Some(label.to_string()),
        ..StateOverrides::default()
    }
}

fn figure(number: usize, panels: Vec<StateOverrides>) -> impl Iterator<Item = FigurePanel> {
    panels
        .into_iter()
        .enumerate()
        .map(move |(i, overrides)| FigurePanel {
            element_id: format!("fig{}-{}", number, i),
            overrides,
        })
}

/// Every figure panel of the article page, in mount order.
pub fn figure_panels() -> Vec<FigurePanel> {
    use PredictionFilter::{CorrectOnly, IncorrectOnly};

    let vehicles = vec![
        overrides("data_vehicle", ScoreFn::Iou, -1, CorrectOnly, "jeep"),
        overrides("data_vehicle", ScoreFn::Iou, 1, CorrectOnly, "jeep"),
        overrides("data_vehicle", ScoreFn::Iou, 1, IncorrectOnly, ""),
    ];
    let melanoma = vec![
        overrides("data_melanoma", ScoreFn::Iou, -1, CorrectOnly, ""),
        overrides(
            "data_melanoma",
            ScoreFn::GroundTruthCoverage,
            1,
            IncorrectOnly,
            "malignant",
        ),
        overrides(
            "data_melanoma",
            ScoreFn::ExplanationCoverage,
            1,
            CorrectOnly,
            "benign",
        ),
    ];
    figure(1, vehicles).chain(figure(2, melanoma)).collect()
}

pub fn find_figure(element_id: &str) -> Option<FigurePanel> {
    figure_panels()
        .into_iter()
        .find(|p| p.element_id == element_id)
}
