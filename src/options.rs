//! Dropdown option lists.

use serde::Serialize;

use crate::presets::CASE_PRESETS;
use crate::state::{PredictionFilter, ScoreFn, SortDirection};

/// One `<option>` of a dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub name: String,
    /// Set when the field behind the dropdown is frozen.
    pub disabled: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            name: name.into(),
            disabled: false,
        }
    }

    fn disabled_if(mut self, frozen: bool) -> Self {
        self.disabled = frozen;
        self
    }
}

pub fn sort_options(frozen: bool) -> Vec<SelectOption> {
    [
        (SortDirection::Ascending, "Increasing"),
        (SortDirection::Descending, "Decreasing"),
    ]
    .into_iter()
    .map(|(d, name)| SelectOption::new(d.as_str(), name).disabled_if(frozen))
    .collect()
}

pub fn score_fn_options(frozen: bool) -> Vec<SelectOption> {
    ScoreFn::ALL
        .into_iter()
        .map(|f| SelectOption::new(f.as_str(), f.label()).disabled_if(frozen))
        .collect()
}

pub fn case_options(frozen: bool) -> Vec<SelectOption> {
    CASE_PRESETS
        .iter()
        .map(|p| SelectOption::new(p.name, p.title).disabled_if(frozen))
        .collect()
}

/// `All` followed by one option per label.
pub fn label_options(labels: &[String], frozen: bool) -> Vec<SelectOption> {
    std::iter::once(SelectOption::new("", "All"))
        .chain(labels.iter().map(|l| SelectOption::new(l.as_str(), l.as_str())))
        .map(|o| o.disabled_if(frozen))
        .collect()
}

/// The three correctness filters followed by one option per predicted class.
pub fn prediction_options(predictions: &[String], frozen: bool) -> Vec<SelectOption> {
    [
        (PredictionFilter::All, "All"),
        (PredictionFilter::CorrectOnly, "Correct"),
        (PredictionFilter::IncorrectOnly, "Incorrect"),
    ]
    .into_iter()
    .map(|(p, name)| SelectOption::new(p.as_str(), name))
    .chain(
        predictions
            .iter()
            .map(|p| SelectOption::new(p.as_str(), p.as_str())),
    )
    .map(|o| o.disabled_if(frozen))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_options_lead_with_all() {
        let opts = label_options(&["beagle".into(), "pug".into()], false);
        assert_eq!(opts[0], SelectOption::new("", "All"));
        assert_eq!(opts.len(), 3);
        assert_eq!(opts[2].value, "pug");
    }

    #[test]
    fn test_frozen_disables_every_option() {
        let opts = prediction_options(&["pug".into()], true);
        assert_eq!(opts.len(), 4);
        assert!(opts.iter().all(|o| o.disabled));
        assert_eq!(opts[1].value, "correct_only");
    }

    #[test]
    fn test_static_lists() {
        assert_eq!(sort_options(false)[0].value, "+1");
        assert_eq!(score_fn_options(false).len(), 3);
        assert_eq!(case_options(false)[0].value, "default");
    }
}
