//! Typed values for every URL-addressable field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BRUSH_RADIUS, DEFAULT_CASE_STUDY, DEFAULT_SELECTED_IMAGE};

/// Names of the state fields, which double as URL query keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    CaseStudy,
    ScoreFn,
    SortBy,
    PredictionFn,
    LabelFilter,
    IouFilter,
    GroundTruthFilter,
    ExplanationFilter,
    SelectedImage,
    PaintBrushR,
}

impl Field {
    /// All fields in URL serialization order.
    pub const ALL: [Field; 10] = [
        Field::CaseStudy,
        Field::ScoreFn,
        Field::SortBy,
        Field::PredictionFn,
        Field::LabelFilter,
        Field::IouFilter,
        Field::GroundTruthFilter,
        Field::ExplanationFilter,
        Field::SelectedImage,
        Field::PaintBrushR,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::CaseStudy => "caseStudy",
            Field::ScoreFn => "scoreFn",
            Field::SortBy => "sortBy",
            Field::PredictionFn => "predictionFn",
            Field::LabelFilter => "labelFilter",
            Field::IouFilter => "iouFilter",
            Field::GroundTruthFilter => "groundTruthFilter",
            Field::ExplanationFilter => "explanationFilter",
            Field::SelectedImage => "selectedImage",
            Field::PaintBrushR => "paintBrushR",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Score dimension. Selects both the sort score and a range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFn {
    #[default]
    #[serde(alias = "iou_score")]
    Iou,
    #[serde(alias = "bbox_proportion_score")]
    GroundTruthCoverage,
    #[serde(alias = "saliency_proportion_score")]
    ExplanationCoverage,
}

impl ScoreFn {
    pub const ALL: [ScoreFn; 3] = [
        ScoreFn::Iou,
        ScoreFn::GroundTruthCoverage,
        ScoreFn::ExplanationCoverage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreFn::Iou => "iou",
            ScoreFn::GroundTruthCoverage => "ground_truth_coverage",
            ScoreFn::ExplanationCoverage => "explanation_coverage",
        }
    }

    /// Human-readable name for dropdowns and axis titles.
    pub fn label(self) -> &'static str {
        match self {
            ScoreFn::Iou => "IoU",
            ScoreFn::GroundTruthCoverage => "Ground Truth Coverage",
            ScoreFn::ExplanationCoverage => "Explanation Coverage",
        }
    }

    /// The range filter field for this dimension.
    pub fn range_field(self) -> Field {
        match self {
            ScoreFn::Iou => Field::IouFilter,
            ScoreFn::GroundTruthCoverage => Field::GroundTruthFilter,
            ScoreFn::ExplanationCoverage => Field::ExplanationFilter,
        }
    }
}

impl FromStr for ScoreFn {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iou" | "iou_score" => Ok(ScoreFn::Iou),
            "ground_truth_coverage" | "bbox_proportion_score" => Ok(ScoreFn::GroundTruthCoverage),
            "explanation_coverage" | "saliency_proportion_score" => {
                Ok(ScoreFn::ExplanationCoverage)
            }
            _ => Err(()),
        }
    }
}

impl fmt::Display for ScoreFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction of the result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Wire value: `+1` or `-1`.
    pub fn sign(self) -> i8 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "+1",
            SortDirection::Descending => "-1",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "+1" | "1" => Ok(SortDirection::Ascending),
            "-1" => Ok(SortDirection::Descending),
            _ => Err(()),
        }
    }
}

/// Which results pass the prediction filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PredictionFilter {
    #[default]
    All,
    CorrectOnly,
    IncorrectOnly,
    /// Only results predicted as this class.
    Predicted(String),
}

impl PredictionFilter {
    pub fn as_str(&self) -> &str {
        match self {
            PredictionFilter::All => "all",
            PredictionFilter::CorrectOnly => "correct_only",
            PredictionFilter::IncorrectOnly => "incorrect_only",
            PredictionFilter::Predicted(class) => class,
        }
    }

    pub fn parse(s: &str) -> PredictionFilter {
        match s {
            "" | "all" | "all_images" => PredictionFilter::All,
            "correct_only" => PredictionFilter::CorrectOnly,
            "incorrect_only" => PredictionFilter::IncorrectOnly,
            class => PredictionFilter::Predicted(class.to_string()),
        }
    }
}

impl From<String> for PredictionFilter {
    fn from(s: String) -> Self {
        PredictionFilter::parse(&s)
    }
}

impl From<PredictionFilter> for String {
    fn from(p: PredictionFilter) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for PredictionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed score interval within [0, 1], always with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct ScoreRange {
    min: f64,
    max: f64,
}

impl ScoreRange {
    pub const FULL: ScoreRange = ScoreRange { min: 0.0, max: 1.0 };
    pub const LOW: ScoreRange = ScoreRange { min: 0.0, max: 0.3 };
    pub const HIGH: ScoreRange = ScoreRange { min: 0.7, max: 1.0 };

    /// Build a range, clamping both ends into [0, 1] and raising `max` to
    /// `min` when they are reversed. NaN ends fall back to the full range.
    pub fn new_clamped(min: f64, max: f64) -> ScoreRange {
        let min = if min.is_nan() { 0.0 } else { min.clamp(0.0, 1.0) };
        let max = if max.is_nan() { 1.0 } else { max.clamp(0.0, 1.0) };
        ScoreRange {
            min,
            max: max.max(min),
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, score: f64) -> bool {
        score >= self.min && score <= self.max
    }

    /// Parse `[min,max]`; brackets are optional.
    pub fn parse(s: &str) -> Option<ScoreRange> {
        let inner = s.trim().trim_start_matches('[').trim_end_matches(']');
        let (a, b) = inner.split_once(',')?;
        let min: f64 = a.trim().parse().ok()?;
        let max: f64 = b.trim().parse().ok()?;
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        Some(ScoreRange::new_clamped(min, max))
    }
}

impl Default for ScoreRange {
    fn default() -> Self {
        ScoreRange::FULL
    }
}

impl From<[f64; 2]> for ScoreRange {
    fn from([min, max]: [f64; 2]) -> Self {
        ScoreRange::new_clamped(min, max)
    }
}

impl From<ScoreRange> for [f64; 2] {
    fn from(r: ScoreRange) -> Self {
        [r.min, r.max]
    }
}

impl fmt::Display for ScoreRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.min, self.max)
    }
}

/// A value for one field, used by the generic `get`/`set` pair.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    CaseStudy(String),
    ScoreFn(ScoreFn),
    SortBy(SortDirection),
    PredictionFn(PredictionFilter),
    LabelFilter(String),
    IouFilter(ScoreRange),
    GroundTruthFilter(ScoreRange),
    ExplanationFilter(ScoreRange),
    SelectedImage(String),
    PaintBrushR(u32),
}

impl FieldValue {
    pub fn field(&self) -> Field {
        match self {
            FieldValue::CaseStudy(_) => Field::CaseStudy,
            FieldValue::ScoreFn(_) => Field::ScoreFn,
            FieldValue::SortBy(_) => Field::SortBy,
            FieldValue::PredictionFn(_) => Field::PredictionFn,
            FieldValue::LabelFilter(_) => Field::LabelFilter,
            FieldValue::IouFilter(_) => Field::IouFilter,
            FieldValue::GroundTruthFilter(_) => Field::GroundTruthFilter,
            FieldValue::ExplanationFilter(_) => Field::ExplanationFilter,
            FieldValue::SelectedImage(_) => Field::SelectedImage,
            FieldValue::PaintBrushR(_) => Field::PaintBrushR,
        }
    }

    /// Range value for a range field.
    pub fn range(field: Field, range: ScoreRange) -> Option<FieldValue> {
        match field {
            Field::IouFilter => Some(FieldValue::IouFilter(range)),
            Field::GroundTruthFilter => Some(FieldValue::GroundTruthFilter(range)),
            Field::ExplanationFilter => Some(FieldValue::ExplanationFilter(range)),
            _ => None,
        }
    }

    /// Query-string form of the value.
    pub fn to_query_value(&self) -> String {
        match self {
            FieldValue::CaseStudy(s) | FieldValue::LabelFilter(s) | FieldValue::SelectedImage(s) => {
                s.clone()
            }
            FieldValue::ScoreFn(f) => f.to_string(),
            FieldValue::SortBy(d) => d.as_str().to_string(),
            FieldValue::PredictionFn(p) => p.to_string(),
            FieldValue::IouFilter(r)
            | FieldValue::GroundTruthFilter(r)
            | FieldValue::ExplanationFilter(r) => r.to_string(),
            FieldValue::PaintBrushR(r) => r.to_string(),
        }
    }

    /// Parse the query-string form of `field`. `None` means "use the default".
    pub fn from_query_value(field: Field, raw: &str) -> Option<FieldValue> {
        let value = match field {
            Field::CaseStudy => {
                FieldValue::CaseStudy(non_empty(raw).unwrap_or(DEFAULT_CASE_STUDY).to_string())
            }
            Field::ScoreFn => FieldValue::ScoreFn(raw.parse().ok()?),
            Field::SortBy => FieldValue::SortBy(raw.parse().ok()?),
            Field::PredictionFn => FieldValue::PredictionFn(PredictionFilter::parse(raw)),
            Field::LabelFilter => FieldValue::LabelFilter(raw.to_string()),
            Field::IouFilter => FieldValue::IouFilter(ScoreRange::parse(raw)?),
            Field::GroundTruthFilter => FieldValue::GroundTruthFilter(ScoreRange::parse(raw)?),
            Field::ExplanationFilter => FieldValue::ExplanationFilter(ScoreRange::parse(raw)?),
            Field::SelectedImage => FieldValue::SelectedImage(
                non_empty(raw).unwrap_or(DEFAULT_SELECTED_IMAGE).to_string(),
            ),
            Field::PaintBrushR => {
                let r: u32 = raw.trim().parse().ok()?;
                FieldValue::PaintBrushR(if r == 0 { DEFAULT_BRUSH_RADIUS } else { r })
            }
        };
        Some(value)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_keys_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
        assert_eq!(Field::from_key("nope"), None);
    }

    #[test]
    fn test_score_fn_aliases() {
        assert_eq!("iou_score".parse(), Ok(ScoreFn::Iou));
        assert_eq!(
            "bbox_proportion_score".parse(),
            Ok(ScoreFn::GroundTruthCoverage)
        );
        assert_eq!(
            "saliency_proportion_score".parse(),
            Ok(ScoreFn::ExplanationCoverage)
        );
        let f: ScoreFn = serde_json::from_str("\"bbox_proportion_score\"").unwrap();
        assert_eq!(f, ScoreFn::GroundTruthCoverage);
        assert!("bogus".parse::<ScoreFn>().is_err());
    }

    #[test]
    fn test_prediction_filter_parse() {
        assert_eq!(PredictionFilter::parse("all_images"), PredictionFilter::All);
        assert_eq!(PredictionFilter::parse(""), PredictionFilter::All);
        assert_eq!(
            PredictionFilter::parse("correct_only"),
            PredictionFilter::CorrectOnly
        );
        assert_eq!(
            PredictionFilter::parse("beagle"),
            PredictionFilter::Predicted("beagle".into())
        );
    }

    #[test]
    fn test_range_clamping() {
        let r = ScoreRange::new_clamped(0.8, 0.2);
        assert_eq!((r.min(), r.max()), (0.8, 0.8));

        let r = ScoreRange::new_clamped(-3.0, 7.0);
        assert_eq!(r, ScoreRange::FULL);

        let r = ScoreRange::new_clamped(f64::NAN, f64::NAN);
        assert_eq!(r, ScoreRange::FULL);
    }

    #[test]
    fn test_range_parse() {
        assert_eq!(ScoreRange::parse("[0.7,1]"), Some(ScoreRange::HIGH));
        assert_eq!(ScoreRange::parse(" 0 , 0.3 "), Some(ScoreRange::LOW));
        assert_eq!(ScoreRange::parse("[0.5]"), None);
        assert_eq!(ScoreRange::parse("[a,b]"), None);
        assert_eq!(ScoreRange::parse("[NaN,1]"), None);
        assert_eq!(ScoreRange::HIGH.to_string(), "[0.7,1]");
    }

    #[test]
    fn test_range_serde_clamps() {
        let r: ScoreRange = serde_json::from_str("[0.9, 0.1]").unwrap();
        assert!(r.min() <= r.max());
        assert_eq!(serde_json::to_string(&ScoreRange::LOW).unwrap(), "[0.0,0.3]");
    }

    #[test]
    fn test_query_value_defaults() {
        assert_eq!(
            FieldValue::from_query_value(Field::CaseStudy, "  "),
            Some(FieldValue::CaseStudy(DEFAULT_CASE_STUDY.into()))
        );
        assert_eq!(FieldValue::from_query_value(Field::SortBy, "sideways"), None);
        assert_eq!(
            FieldValue::from_query_value(Field::PaintBrushR, "0"),
            Some(FieldValue::PaintBrushR(DEFAULT_BRUSH_RADIUS))
        );
        assert_eq!(FieldValue::from_query_value(Field::PaintBrushR, "-4"), None);
    }
}
