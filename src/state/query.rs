use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use super::field::{Field, FieldValue, PredictionFilter, ScoreFn, ScoreRange, SortDirection};
use super::url::{UrlMode, UrlStore};
use crate::constants::{
    DEFAULT_BRUSH_RADIUS, DEFAULT_CASE_STUDY, DEFAULT_SELECTED_IMAGE, MAX_BRUSH_RADIUS,
};
use crate::presets::CasePreset;

/// Values supplied when a dashboard is embedded with a fixed configuration.
///
/// Every `Some` field is applied after the URL has been read and, when the
/// state is built with `freeze`, becomes frozen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateOverrides {
    pub case_study: Option<String>,
    pub score_fn: Option<ScoreFn>,
    pub sort_by: Option<i8>,
    pub prediction_fn: Option<PredictionFilter>,
    pub label_filter: Option<String>,
    pub iou_filter: Option<ScoreRange>,
    pub ground_truth_filter: Option<ScoreRange>,
    pub explanation_filter: Option<ScoreRange>,
    pub selected_image: Option<String>,
    pub paint_brush_r: Option<u32>,
}

impl StateOverrides {
    fn values(&self) -> Vec<FieldValue> {
        let mut out = Vec::new();
        if let Some(v) = &self.case_study {
            out.push(FieldValue::CaseStudy(v.clone()));
        }
        if let Some(v) = self.score_fn {
            out.push(FieldValue::ScoreFn(v));
        }
        if let Some(v) = self.sort_by {
            let dir = if v < 0 {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            out.push(FieldValue::SortBy(dir));
        }
        if let Some(v) = &self.prediction_fn {
            out.push(FieldValue::PredictionFn(v.clone()));
        }
        if let Some(v) = &self.label_filter {
            out.push(FieldValue::LabelFilter(v.clone()));
        }
        if let Some(v) = self.iou_filter {
            out.push(FieldValue::IouFilter(v));
        }
        if let Some(v) = self.ground_truth_filter {
            out.push(FieldValue::GroundTruthFilter(v));
        }
        if let Some(v) = self.explanation_filter {
            out.push(FieldValue::ExplanationFilter(v));
        }
        if let Some(v) = &self.selected_image {
            out.push(FieldValue::SelectedImage(v.clone()));
        }
        if let Some(v) = self.paint_brush_r {
            out.push(FieldValue::PaintBrushR(v));
        }
        out
    }
}

/// Filter values as they travel through the URL.
#[derive(Debug, Clone, PartialEq)]
struct Values {
    case_study: String,
    score_fn: ScoreFn,
    sort_by: SortDirection,
    prediction_fn: PredictionFilter,
    label_filter: String,
    iou: ScoreRange,
    ground_truth: ScoreRange,
    explanation: ScoreRange,
    selected_image: String,
    brush_radius: u32,
}

impl Default for Values {
    fn default() -> Self {
        Self {
            case_study: DEFAULT_CASE_STUDY.to_string(),
            score_fn: ScoreFn::default(),
            sort_by: SortDirection::default(),
            prediction_fn: PredictionFilter::default(),
            label_filter: String::new(),
            iou: ScoreRange::FULL,
            ground_truth: ScoreRange::FULL,
            explanation: ScoreRange::FULL,
            selected_image: DEFAULT_SELECTED_IMAGE.to_string(),
            brush_radius: DEFAULT_BRUSH_RADIUS,
        }
    }
}

impl Values {
    fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::CaseStudy => FieldValue::CaseStudy(self.case_study.clone()),
            Field::ScoreFn => FieldValue::ScoreFn(self.score_fn),
            Field::SortBy => FieldValue::SortBy(self.sort_by),
            Field::PredictionFn => FieldValue::PredictionFn(self.prediction_fn.clone()),
            Field::LabelFilter => FieldValue::LabelFilter(self.label_filter.clone()),
            Field::IouFilter => FieldValue::IouFilter(self.iou),
            Field::GroundTruthFilter => FieldValue::GroundTruthFilter(self.ground_truth),
            Field::ExplanationFilter => FieldValue::ExplanationFilter(self.explanation),
            Field::SelectedImage => FieldValue::SelectedImage(self.selected_image.clone()),
            Field::PaintBrushR => FieldValue::PaintBrushR(self.brush_radius),
        }
    }

    fn put(&mut self, value: FieldValue) {
        match value {
            FieldValue::CaseStudy(v) => self.case_study = v,
            FieldValue::ScoreFn(v) => self.score_fn = v,
            FieldValue::SortBy(v) => self.sort_by = v,
            FieldValue::PredictionFn(v) => self.prediction_fn = v,
            FieldValue::LabelFilter(v) => self.label_filter = v,
            FieldValue::IouFilter(v) => self.iou = v,
            FieldValue::GroundTruthFilter(v) => self.ground_truth = v,
            FieldValue::ExplanationFilter(v) => self.explanation = v,
            FieldValue::SelectedImage(v) => self.selected_image = v,
            FieldValue::PaintBrushR(v) => self.brush_radius = v.clamp(1, MAX_BRUSH_RADIUS),
        }
    }
}

/// Canonical, URL-addressable dashboard state.
///
/// State is pull-based: writes do not notify anyone. Callers re-read what
/// they need after a successful `set`.
pub struct QueryState {
    values: Values,
    frozen: BTreeSet<Field>,
    mode: UrlMode,
    url: Option<Rc<dyn UrlStore>>,
}

impl QueryState {
    /// Build the state of a mounted dashboard.
    ///
    /// Reads `url` (unless `mode` is [`UrlMode::Ignore`]), applies
    /// `overrides`, freezing them when `freeze` is set, then writes the result
    /// back with a history replace.
    pub fn new(
        url: Rc<dyn UrlStore>,
        mode: UrlMode,
        overrides: &StateOverrides,
        freeze: bool,
    ) -> Self {
        let mut state = match mode {
            UrlMode::Sync => Self::from_query_string(&url.read_query()),
            UrlMode::Ignore => Self::detached(),
        };
        state.mode = mode;
        state.url = Some(url);
        state.apply_overrides(overrides, freeze);
        state.sync_url();
        log::debug!("state: mounted ({:?}) {}", mode, state.to_query_string());
        state
    }

    /// Build a state that never touches any URL.
    pub fn detached() -> Self {
        Self {
            values: Values::default(),
            frozen: BTreeSet::new(),
            mode: UrlMode::Ignore,
            url: None,
        }
    }

    /// Detached state with overrides applied.
    pub fn embedded(overrides: &StateOverrides, freeze: bool) -> Self {
        let mut state = Self::detached();
        state.apply_overrides(overrides, freeze);
        state
    }

    /// Parse a query string. Never fails: missing, unknown and malformed
    /// keys leave the documented default in place.
    pub fn from_query_string(raw: &str) -> Self {
        let mut state = Self::detached();
        let raw = raw.trim_start_matches('?');
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            let Some(field) = Field::from_key(&key) else {
                continue;
            };
            match FieldValue::from_query_value(field, &value) {
                Some(v) => state.values.put(v),
                None => log::debug!("state: ignoring malformed {}={}", key, value),
            }
        }
        state
    }

    /// Serialize every non-frozen field.
    pub fn to_query_string(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        for field in Field::ALL {
            if self.frozen.contains(&field) {
                continue;
            }
            out.append_pair(field.key(), &self.values.get(field).to_query_value());
        }
        out.finish()
    }

    fn apply_overrides(&mut self, overrides: &StateOverrides, freeze: bool) {
        for value in overrides.values() {
            let field = value.field();
            self.values.put(value);
            if freeze {
                self.frozen.insert(field);
            }
        }
    }

    fn sync_url(&self) {
        if self.mode == UrlMode::Ignore {
            return;
        }
        if let Some(url) = &self.url {
            url.replace_query(&self.to_query_string());
        }
    }

    pub fn mode(&self) -> UrlMode {
        self.mode
    }

    pub fn is_frozen(&self, field: Field) -> bool {
        self.frozen.contains(&field)
    }

    pub fn frozen_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.frozen.iter().copied()
    }

    pub fn get(&self, field: Field) -> FieldValue {
        self.values.get(field)
    }

    /// Write one field. Returns `false` (and changes nothing) if the field is
    /// frozen. Accepted writes are mirrored into the URL immediately.
    pub fn set(&mut self, value: FieldValue) -> bool {
        let field = value.field();
        if self.frozen.contains(&field) {
            log::warn!("state: rejected write to frozen field {}", field);
            return false;
        }
        self.values.put(value);
        log::debug!("state: {} = {}", field, self.values.get(field).to_query_value());
        self.sync_url();
        true
    }

    /// Write a range, clamping so that `0 <= min <= max <= 1`.
    pub fn set_range(&mut self, dimension: ScoreFn, min: f64, max: f64) -> bool {
        let range = ScoreRange::new_clamped(min, max);
        match dimension {
            ScoreFn::Iou => self.set(FieldValue::IouFilter(range)),
            ScoreFn::GroundTruthCoverage => self.set(FieldValue::GroundTruthFilter(range)),
            ScoreFn::ExplanationCoverage => self.set(FieldValue::ExplanationFilter(range)),
        }
    }

    pub fn set_iou_range(&mut self, min: f64, max: f64) -> bool {
        self.set_range(ScoreFn::Iou, min, max)
    }

    pub fn set_ground_truth_range(&mut self, min: f64, max: f64) -> bool {
        self.set_range(ScoreFn::GroundTruthCoverage, min, max)
    }

    pub fn set_explanation_range(&mut self, min: f64, max: f64) -> bool {
        self.set_range(ScoreFn::ExplanationCoverage, min, max)
    }

    /// Write a preset's ranges and prediction filter. Frozen fields keep their
    /// value; returns `false` if any of them was frozen.
    pub fn apply_preset(&mut self, preset: &CasePreset) -> bool {
        let writes = [
            FieldValue::IouFilter(preset.iou),
            FieldValue::GroundTruthFilter(preset.ground_truth_coverage),
            FieldValue::ExplanationFilter(preset.explanation_coverage),
            FieldValue::PredictionFn(preset.prediction.clone()),
        ];
        let mut all_applied = true;
        for value in writes {
            let field = value.field();
            if self.frozen.contains(&field) {
                all_applied = false;
                continue;
            }
            self.values.put(value);
        }
        log::debug!("state: applied preset '{}'", preset.name);
        self.sync_url();
        all_applied
    }

    pub fn case_study(&self) -> &str {
        &self.values.case_study
    }

    pub fn score_fn(&self) -> ScoreFn {
        self.values.score_fn
    }

    pub fn sort_by(&self) -> SortDirection {
        self.values.sort_by
    }

    pub fn prediction_fn(&self) -> &PredictionFilter {
        &self.values.prediction_fn
    }

    pub fn label_filter(&self) -> &str {
        &self.values.label_filter
    }

    pub fn range(&self, dimension: ScoreFn) -> ScoreRange {
        match dimension {
            ScoreFn::Iou => self.values.iou,
            ScoreFn::GroundTruthCoverage => self.values.ground_truth,
            ScoreFn::ExplanationCoverage => self.values.explanation,
        }
    }

    pub fn iou_range(&self) -> ScoreRange {
        self.values.iou
    }

    pub fn ground_truth_range(&self) -> ScoreRange {
        self.values.ground_truth
    }

    pub fn explanation_range(&self) -> ScoreRange {
        self.values.explanation
    }

    pub fn selected_image(&self) -> &str {
        &self.values.selected_image
    }

    pub fn brush_radius(&self) -> u32 {
        self.values.brush_radius
    }
}

impl fmt::Debug for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryState")
            .field("values", &self.values)
            .field("frozen", &self.frozen)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Field-by-field equality of the values; frozen sets and URL binding are
/// not compared.
impl PartialEq for QueryState {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;
    use crate::state::MemoryUrl;

    fn mounted(query: &str, overrides: &StateOverrides, freeze: bool) -> (QueryState, MemoryUrl) {
        let url = MemoryUrl::new(query);
        let state = QueryState::new(Rc::new(url.clone()), UrlMode::Sync, overrides, freeze);
        (state, url)
    }

    #[test]
    fn test_defaults_from_empty_query() {
        let state = QueryState::from_query_string("");
        assert_eq!(state.case_study(), DEFAULT_CASE_STUDY);
        assert_eq!(state.selected_image(), DEFAULT_SELECTED_IMAGE);
        assert_eq!(state.score_fn(), ScoreFn::Iou);
        assert_eq!(state.sort_by(), SortDirection::Ascending);
        assert_eq!(state.prediction_fn(), &PredictionFilter::All);
        assert_eq!(state.label_filter(), "");
        assert_eq!(state.iou_range(), ScoreRange::FULL);
        assert_eq!(state.brush_radius(), DEFAULT_BRUSH_RADIUS);
    }

    #[test]
    fn test_malformed_and_unknown_keys_are_tolerated() {
        let state = QueryState::from_query_string(
            "?scoreFn=nope&sortBy=x&iouFilter=[bad&paintBrushR=-1&mystery=1&caseStudy=data_cats",
        );
        assert_eq!(state.score_fn(), ScoreFn::Iou);
        assert_eq!(state.sort_by(), SortDirection::Ascending);
        assert_eq!(state.iou_range(), ScoreRange::FULL);
        assert_eq!(state.brush_radius(), DEFAULT_BRUSH_RADIUS);
        assert_eq!(state.case_study(), "data_cats");
    }

    #[test]
    fn test_query_string_round_trip() {
        let mut state = QueryState::detached();
        state.set(FieldValue::CaseStudy("data_text".into()));
        state.set(FieldValue::ScoreFn(ScoreFn::ExplanationCoverage));
        state.set(FieldValue::SortBy(SortDirection::Descending));
        state.set(FieldValue::PredictionFn(PredictionFilter::Predicted(
            "golden retriever".into(),
        )));
        state.set(FieldValue::LabelFilter("a&b=c".into()));
        state.set_iou_range(0.25, 0.75);
        state.set_ground_truth_range(0.7, 1.0);
        state.set(FieldValue::SelectedImage("img_7".into()));
        state.set(FieldValue::PaintBrushR(33));

        let parsed = QueryState::from_query_string(&state.to_query_string());
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_reversed_range_is_clamped() {
        let mut state = QueryState::detached();
        assert!(state.set_iou_range(0.9, 0.2));
        let r = state.iou_range();
        assert!(r.min() <= r.max());
        assert_eq!(r.min(), 0.9);

        state.set_explanation_range(-1.0, 4.0);
        assert_eq!(state.explanation_range(), ScoreRange::FULL);
    }

    #[test]
    fn test_brush_radius_clamped() {
        let mut state = QueryState::detached();
        state.set(FieldValue::PaintBrushR(500));
        assert_eq!(state.brush_radius(), MAX_BRUSH_RADIUS);
    }

    #[test]
    fn test_set_mirrors_into_url() {
        let (mut state, url) = mounted("caseStudy=data_cats", &StateOverrides::default(), false);
        assert_eq!(url.write_count(), 1);
        assert!(url.current().contains("caseStudy=data_cats"));

        state.set(FieldValue::LabelFilter("beagle".into()));
        assert_eq!(url.write_count(), 2);
        assert!(url.current().contains("labelFilter=beagle"));
    }

    #[test]
    fn test_ignore_mode_leaves_url_alone() {
        let url = MemoryUrl::new("caseStudy=data_cats");
        let mut state = QueryState::new(
            Rc::new(url.clone()),
            UrlMode::Ignore,
            &StateOverrides::default(),
            false,
        );
        assert_eq!(state.case_study(), DEFAULT_CASE_STUDY);
        state.set(FieldValue::LabelFilter("beagle".into()));
        assert_eq!(url.write_count(), 0);
        assert_eq!(url.current(), "caseStudy=data_cats");
    }

    #[test]
    fn test_frozen_fields_reject_writes() {
        let overrides = StateOverrides {
            case_study: Some("data_birds".into()),
            iou_filter: Some(ScoreRange::HIGH),
            ..Default::default()
        };
        let (mut state, url) = mounted("caseStudy=data_cats", &overrides, true);
        assert_eq!(state.case_study(), "data_birds");
        assert!(state.is_frozen(Field::CaseStudy));

        let writes = url.write_count();
        assert!(!state.set(FieldValue::CaseStudy("data_cats".into())));
        assert!(!state.set_iou_range(0.0, 0.1));
        assert_eq!(state.case_study(), "data_birds");
        assert_eq!(state.iou_range(), ScoreRange::HIGH);
        assert_eq!(url.write_count(), writes);

        assert!(state.set(FieldValue::LabelFilter("x".into())));
    }

    #[test]
    fn test_frozen_fields_not_serialized() {
        let overrides = StateOverrides {
            selected_image: Some("fixed".into()),
            ..Default::default()
        };
        let (state, url) = mounted("", &overrides, true);
        assert!(!state.to_query_string().contains("selectedImage"));
        assert!(!url.current().contains("selectedImage"));
    }

    #[test]
    fn test_unfrozen_overrides_stay_writable() {
        let overrides = StateOverrides {
            label_filter: Some("beagle".into()),
            ..Default::default()
        };
        let mut state = QueryState::embedded(&overrides, false);
        assert_eq!(state.label_filter(), "beagle");
        assert!(state.set(FieldValue::LabelFilter("pug".into())));
    }

    #[test]
    fn test_overrides_from_json() {
        let overrides: StateOverrides = serde_json::from_str(
            r#"{"caseStudy": "data_text", "scoreFn": "saliency_proportion_score",
                "predictionFn": "all_images", "iouFilter": [0.7, 1.0], "sortBy": -1}"#,
        )
        .unwrap();
        let state = QueryState::embedded(&overrides, true);
        assert_eq!(state.score_fn(), ScoreFn::ExplanationCoverage);
        assert_eq!(state.prediction_fn(), &PredictionFilter::All);
        assert_eq!(state.iou_range(), ScoreRange::HIGH);
        assert_eq!(state.sort_by(), SortDirection::Descending);
    }

    #[test]
    fn test_apply_preset_respects_frozen() {
        let preset = presets::find_preset("human_aligned").unwrap();
        let mut state = QueryState::detached();
        assert!(state.apply_preset(preset));
        assert_eq!(state.iou_range(), ScoreRange::HIGH);
        assert_eq!(state.prediction_fn(), &PredictionFilter::CorrectOnly);

        let overrides = StateOverrides {
            prediction_fn: Some(PredictionFilter::IncorrectOnly),
            ..Default::default()
        };
        let mut frozen = QueryState::embedded(&overrides, true);
        assert!(!frozen.apply_preset(preset));
        assert_eq!(frozen.iou_range(), ScoreRange::HIGH);
        assert_eq!(frozen.prediction_fn(), &PredictionFilter::IncorrectOnly);
    }
}
