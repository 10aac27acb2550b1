//! Request and response shapes of the scoring backend.

use serde::{Deserialize, Deserializer, Serialize};
use si_raster::BinaryMask;

use crate::results::ResultMode;
use crate::state::{QueryState, ScoreFn};

/// Filters for the ordered result id list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultQuery {
    pub case_study: String,
    pub sort_by: i8,
    pub prediction_fn: String,
    pub score_fn: ScoreFn,
    pub label_filter: String,
    pub iou_min: f64,
    pub iou_max: f64,
    pub gtc_min: f64,
    pub gtc_max: f64,
    pub ec_min: f64,
    pub ec_max: f64,
}

impl ResultQuery {
    pub fn from_state(state: &QueryState) -> Self {
        let iou = state.iou_range();
        let gtc = state.ground_truth_range();
        let ec = state.explanation_range();
        Self {
            case_study: state.case_study().to_string(),
            sort_by: state.sort_by().sign(),
            prediction_fn: state.prediction_fn().to_string(),
            score_fn: state.score_fn(),
            label_filter: state.label_filter().to_string(),
            iou_min: iou.min(),
            iou_max: iou.max(),
            gtc_min: gtc.min(),
            gtc_max: gtc.max(),
            ec_min: ec.min(),
            ec_max: ec.max(),
        }
    }

    /// Query-string pairs in wire order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("case_study", self.case_study.clone()),
            ("sort_by", self.sort_by.to_string()),
            ("prediction_fn", self.prediction_fn.clone()),
            ("score_fn", self.score_fn.to_string()),
            ("label_filter", self.label_filter.clone()),
            ("iou_min", self.iou_min.to_string()),
            ("iou_max", self.iou_max.to_string()),
            ("gtc_min", self.gtc_min.to_string()),
            ("gtc_max", self.gtc_max.to_string()),
            ("ec_min", self.ec_min.to_string()),
            ("ec_max", self.ec_max.to_string()),
        ]
    }
}

/// One detail fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRequest {
    pub case_study: String,
    pub result_id: String,
    pub score_fn: ScoreFn,
    #[serde(skip)]
    pub mode: ResultMode,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinRequest {
    pub case_study: String,
    pub ids: Vec<String>,
    pub score_fn: ScoreFn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfusionRequest {
    pub case_study: String,
    pub label_filter: String,
    pub score_fn: ScoreFn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPredictionRequest {
    pub case_study: String,
    pub image_id: String,
    /// Raw base64 PNG, no data-URL header
    pub mask: String,
    pub score_fn: ScoreFn,
    pub topk: u32,
}

/// Minimal projection used for sorting and filtering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultSummary {
    pub id: String,
    #[serde(deserialize_with = "number_or_string")]
    pub score: f64,
    #[serde(default, deserialize_with = "text_or_number")]
    pub label: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub prediction: String,
}

/// An entry of the id list; older backends send bare ids.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ResultListing {
    Id(String),
    Summary(ResultSummary),
}

impl ResultListing {
    pub fn id(&self) -> &str {
        match self {
            ResultListing::Id(id) => id,
            ResultListing::Summary(s) => &s.id,
        }
    }
}

/// Image detail record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaliencyImage {
    #[serde(default, alias = "image_id", alias = "imageID")]
    pub id: String,
    /// Base64 image payload, with or without a data-URL header
    pub image: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub label: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub prediction: String,
    #[serde(default, deserialize_with = "optional_number")]
    pub score: Option<f64>,
    /// Ground-truth region as SVG polygon point lists
    #[serde(default, alias = "ground_truth")]
    pub bbox: Vec<String>,
    /// Explanation region as SVG polygon point lists
    #[serde(default, alias = "explanation")]
    pub saliency: Vec<String>,
    #[serde(default, deserialize_with = "optional_number")]
    pub iou: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub ground_truth_coverage: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub explanation_coverage: Option<f64>,
}

/// Text detail record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaliencyText {
    #[serde(default, alias = "result_id")]
    pub id: String,
    pub words: Vec<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub label: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub prediction: String,
    #[serde(default)]
    pub explanation_inds: Vec<usize>,
    #[serde(default)]
    pub ground_truth_inds: Vec<usize>,
    #[serde(default, deserialize_with = "optional_number")]
    pub iou: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub ground_truth_coverage: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub explanation_coverage: Option<f64>,
}

/// Full render payload for one result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ResultDetail {
    Text(SaliencyText),
    Image(SaliencyImage),
}

macro_rules! detail_field {
    ($self:ident, $field:ident) => {
        match $self {
            ResultDetail::Image(d) => &d.$field,
            ResultDetail::Text(d) => &d.$field,
        }
    };
}

impl ResultDetail {
    pub fn id(&self) -> &str {
        detail_field!(self, id)
    }

    pub fn label(&self) -> &str {
        detail_field!(self, label)
    }

    pub fn prediction(&self) -> &str {
        detail_field!(self, prediction)
    }

    pub fn is_correct(&self) -> bool {
        self.label() == self.prediction()
    }

    /// Score for `score_fn`. Falls back to the single `score` an image
    /// record carries for the score function it was fetched with.
    pub fn score(&self, score_fn: ScoreFn) -> Option<f64> {
        let (iou, gtc, ec, fallback) = match self {
            ResultDetail::Image(d) => (
                d.iou,
                d.ground_truth_coverage,
                d.explanation_coverage,
                d.score,
            ),
            ResultDetail::Text(d) => (d.iou, d.ground_truth_coverage, d.explanation_coverage, None),
        };
        let specific = match score_fn {
            ScoreFn::Iou => iou,
            ScoreFn::GroundTruthCoverage => gtc,
            ScoreFn::ExplanationCoverage => ec,
        };
        specific.or(fallback)
    }
}

/// One histogram bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub x0: f64,
    pub x1: f64,
    #[serde(alias = "count")]
    pub num: u64,
}

/// One confusion-matrix cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfusionCell {
    #[serde(deserialize_with = "text_or_number")]
    pub label: String,
    #[serde(deserialize_with = "text_or_number")]
    pub prediction: String,
    pub count: u64,
    #[serde(default)]
    pub mean: f64,
}

/// One entry of the ranked best-prediction list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankedPrediction {
    #[serde(rename = "className", alias = "class_name", alias = "label")]
    pub class_name: String,
    #[serde(deserialize_with = "number_or_string")]
    pub score: f64,
    /// Row-major cells, non-zero meaning inside
    #[serde(default)]
    pub mask: Vec<Vec<u8>>,
}

impl RankedPrediction {
    pub fn binary_mask(&self) -> BinaryMask {
        BinaryMask::from_rows(&self.mask)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(f64),
    Text(String),
}

fn number_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    match Scalar::deserialize(d)? {
        Scalar::Number(n) => Ok(n),
        Scalar::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn optional_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Scalar>::deserialize(d)? {
        Some(Scalar::Number(n)) => Some(n),
        Some(Scalar::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

fn text_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Scalar::deserialize(d)? {
        Scalar::Number(n) => n.to_string(),
        Scalar::Text(s) => s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FieldValue, SortDirection};

    #[test]
    fn test_query_from_state() {
        let mut state = QueryState::detached();
        state.set(FieldValue::SortBy(SortDirection::Descending));
        state.set_ground_truth_range(0.0, 0.3);
        let q = ResultQuery::from_state(&state);
        assert_eq!(q.sort_by, -1);
        assert_eq!(q.prediction_fn, "all");
        assert_eq!((q.gtc_min, q.gtc_max), (0.0, 0.3));
        let pairs = q.pairs();
        assert_eq!(pairs[0], ("case_study", state.case_study().to_string()));
        assert_eq!(pairs.len(), 11);
    }

    #[test]
    fn test_listing_accepts_ids_and_summaries() {
        let list: Vec<ResultListing> = serde_json::from_str(
            r#"["a", {"id": "b", "score": "0.5", "label": "x", "prediction": 3}]"#,
        )
        .unwrap();
        assert_eq!(list[0].id(), "a");
        match &list[1] {
            ResultListing::Summary(s) => {
                assert_eq!(s.score, 0.5);
                assert_eq!(s.prediction, "3");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_image_detail() {
        let detail: ResultDetail = serde_json::from_str(
            r#"{"image": "AAAA", "bbox": ["0,0 1,1"], "saliency": [],
                "label": "pug", "prediction": "pug", "score": "0.42"}"#,
        )
        .unwrap();
        assert!(matches!(detail, ResultDetail::Image(_)));
        assert!(detail.is_correct());
        assert_eq!(detail.score(ScoreFn::Iou), Some(0.42));
    }

    #[test]
    fn test_text_detail() {
        let detail: ResultDetail = serde_json::from_str(
            r#"{"words": ["a", "b"], "label": 1, "prediction": 0,
                "explanation_inds": [0], "ground_truth_inds": [0, 1],
                "iou": 0.5, "ground_truth_coverage": 1.0, "explanation_coverage": 0.5}"#,
        )
        .unwrap();
        assert!(matches!(detail, ResultDetail::Text(_)));
        assert!(!detail.is_correct());
        assert_eq!(detail.score(ScoreFn::GroundTruthCoverage), Some(1.0));
    }

    #[test]
    fn test_bin_count_alias_and_ranked() {
        let bin: Bin = serde_json::from_str(r#"{"x0": 0, "x1": 0.5, "count": 3}"#).unwrap();
        assert_eq!(bin.num, 3);

        let ranked: RankedPrediction =
            serde_json::from_str(r#"{"className": "pug", "score": 0.9, "mask": [[0, 1], [1, 1]]}"#)
                .unwrap();
        assert_eq!(ranked.binary_mask().count(), 3);
    }
}
