//! View models for populated result cards.

use serde::Serialize;
use si_raster::to_data_url;

use crate::api::{ResultDetail, SaliencyImage, SaliencyText};
use crate::color_utils::{CORRECT_COLOR, INCORRECT_COLOR, score_color, score_text_color};
use crate::state::ScoreFn;

const EXPLANATION_TOKEN_COLOR: &str = "#d95f02aa";
const GROUND_TRUTH_TOKEN_COLOR: &str = "#f2d602aa";

/// Colored score chip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBadge {
    pub value: f64,
    /// Two decimals
    pub text: String,
    pub background: String,
    pub color: &'static str,
}

impl ScoreBadge {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            text: format!("{:.2}", value),
            background: score_color(value).to_hex(),
            color: score_text_color(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageCard {
    pub id: String,
    /// `data:` URL ready for an `<img>`
    pub image_src: String,
    pub label: String,
    pub prediction: String,
    pub correct: bool,
    /// Background of the prediction chip
    pub prediction_color: &'static str,
    pub badge: Option<ScoreBadge>,
    /// SVG polygon point lists
    pub ground_truth: Vec<String>,
    pub explanation: Vec<String>,
}

impl ImageCard {
    fn build(image: &SaliencyImage, score: Option<f64>) -> Self {
        let correct = image.label == image.prediction;
        Self {
            id: image.id.clone(),
            image_src: to_data_url(&image.image),
            label: image.label.clone(),
            prediction: image.prediction.clone(),
            correct,
            prediction_color: correctness_color(correct),
            badge: score.map(ScoreBadge::new),
            ground_truth: image.bbox.clone(),
            explanation: image.saliency.clone(),
        }
    }
}

/// How a token relates to the explanation and ground-truth regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenHighlight {
    None,
    Explanation,
    GroundTruth,
    Both,
}

impl TokenHighlight {
    pub fn css_class(self) -> &'static str {
        match self {
            TokenHighlight::None => "word",
            TokenHighlight::Explanation => "word explanation",
            TokenHighlight::GroundTruth => "word ground-truth",
            TokenHighlight::Both => "word explanation ground-truth",
        }
    }

    /// CSS `background` value, if any.
    pub fn background(self) -> Option<String> {
        match self {
            TokenHighlight::None => None,
            TokenHighlight::Explanation => Some(EXPLANATION_TOKEN_COLOR.to_string()),
            TokenHighlight::GroundTruth => Some(GROUND_TRUTH_TOKEN_COLOR.to_string()),
            TokenHighlight::Both => Some(format!(
                "linear-gradient(120deg, {} 50%, {} 50%)",
                EXPLANATION_TOKEN_COLOR, GROUND_TRUTH_TOKEN_COLOR
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub text: String,
    pub highlight: TokenHighlight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextCard {
    pub id: String,
    pub tokens: Vec<Token>,
    pub label: String,
    pub prediction: String,
    pub correct: bool,
    pub prediction_color: &'static str,
    pub badge: Option<ScoreBadge>,
}

impl TextCard {
    fn build(text: &SaliencyText, score: Option<f64>) -> Self {
        let correct = text.label == text.prediction;
        let tokens = text
            .words
            .iter()
            .enumerate()
            .map(|(i, word)| {
                let highlight = match (
                    text.explanation_inds.contains(&i),
                    text.ground_truth_inds.contains(&i),
                ) {
                    (true, true) => TokenHighlight::Both,
                    (true, false) => TokenHighlight::Explanation,
                    (false, true) => TokenHighlight::GroundTruth,
                    (false, false) => TokenHighlight::None,
                };
                Token {
                    text: word.clone(),
                    highlight,
                }
            })
            .collect();
        Self {
            id: text.id.clone(),
            tokens,
            label: sentiment(&text.label),
            prediction: sentiment(&text.prediction),
            correct,
            prediction_color: correctness_color(correct),
            badge: score.map(ScoreBadge::new),
        }
    }
}

/// A populated card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultCard {
    Image(ImageCard),
    Text(TextCard),
}

impl ResultCard {
    pub fn from_detail(detail: &ResultDetail, score_fn: ScoreFn) -> Self {
        let score = detail.score(score_fn);
        match detail {
            ResultDetail::Image(image) => ResultCard::Image(ImageCard::build(image, score)),
            ResultDetail::Text(text) => ResultCard::Text(TextCard::build(text, score)),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ResultCard::Image(c) => &c.id,
            ResultCard::Text(c) => &c.id,
        }
    }

    pub fn correct(&self) -> bool {
        match self {
            ResultCard::Image(c) => c.correct,
            ResultCard::Text(c) => c.correct,
        }
    }

    pub fn badge(&self) -> Option<&ScoreBadge> {
        match self {
            ResultCard::Image(c) => c.badge.as_ref(),
            ResultCard::Text(c) => c.badge.as_ref(),
        }
    }
}

fn correctness_color(correct: bool) -> &'static str {
    if correct {
        CORRECT_COLOR
    } else {
        INCORRECT_COLOR
    }
}

/// Sentiment labels arrive as `1`/`0`.
fn sentiment(label: &str) -> String {
    match label.trim() {
        "1" | "1.0" => "positive".to_string(),
        "0" | "0.0" => "negative".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_utils::{DARK_TEXT, LIGHT_TEXT};

    fn text_detail() -> ResultDetail {
        serde_json::from_str(
            r#"{"id": "t1", "words": ["a", "b", "c", "d"], "label": 1, "prediction": 0,
                "explanation_inds": [0, 1], "ground_truth_inds": [1, 2],
                "iou": 0.3333, "ground_truth_coverage": 0.5, "explanation_coverage": 0.8}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_token_highlights() {
        let ResultCard::Text(card) = ResultCard::from_detail(&text_detail(), ScoreFn::Iou) else {
            panic!("expected a text card");
        };
        let highlights: Vec<_> = card.tokens.iter().map(|t| t.highlight).collect();
        assert_eq!(
            highlights,
            vec![
                TokenHighlight::Explanation,
                TokenHighlight::Both,
                TokenHighlight::GroundTruth,
                TokenHighlight::None,
            ]
        );
        assert_eq!(card.label, "positive");
        assert_eq!(card.prediction, "negative");
        assert!(!card.correct);
        assert_eq!(card.prediction_color, INCORRECT_COLOR);
        assert!(TokenHighlight::Both.background().unwrap().contains("gradient"));
        assert_eq!(TokenHighlight::None.background(), None);
    }

    #[test]
    fn test_badge_follows_score_fn() {
        let detail = text_detail();
        let low = ResultCard::from_detail(&detail, ScoreFn::Iou);
        let high = ResultCard::from_detail(&detail, ScoreFn::ExplanationCoverage);
        assert_eq!(low.badge().unwrap().text, "0.33");
        assert_eq!(low.badge().unwrap().color, DARK_TEXT);
        assert_eq!(high.badge().unwrap().color, LIGHT_TEXT);
    }

    #[test]
    fn test_image_card() {
        let detail: ResultDetail = serde_json::from_str(
            r#"{"id": "i1", "image": "QUJD", "label": "pug", "prediction": "pug", "score": 0.9,
                "bbox": ["0,0 1,0 1,1"], "saliency": []}"#,
        )
        .unwrap();
        let ResultCard::Image(card) = ResultCard::from_detail(&detail, ScoreFn::Iou) else {
            panic!("expected an image card");
        };
        assert!(card.image_src.starts_with("data:image/png;base64,"));
        assert!(card.image_src.ends_with("QUJD"));
        assert!(card.correct);
        assert_eq!(card.prediction_color, CORRECT_COLOR);
        assert_eq!(card.ground_truth.len(), 1);
    }
}
