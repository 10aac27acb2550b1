//! Ranked best-prediction panel.
//!
//! Each prediction is shown with its class, a score badge, the selected
//! image spotlighted through the prediction's mask, and a small bar chart of
//! its own score next to the scores of its neighbours in the ranking.
//! Hovering a bar or a badge lights up the matching entries in every item;
//! items learn about hovers only through the bus.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use serde::Serialize;
use si_raster::RasterBuffer;

use crate::api::RankedPrediction;
use crate::event_bus::{EventBus, Subscription};
use crate::events::{DashboardEvent, EventKind, HighlightEvent};
use crate::results::ScoreBadge;

/// Number of scores in an item's bar chart.
pub const WINDOW: usize = 3;

/// Positions shown next to position `index` in a list of `len`: centred on
/// `index`, shifted inwards at either end.
pub fn adjacent_window(index: usize, len: usize) -> Range<usize> {
    let start = index.saturating_sub(1).min(len.saturating_sub(WINDOW));
    start..(start + WINDOW).min(len)
}

/// Scores of the window around `index`.
pub fn adjacent_scores(predictions: &[RankedPrediction], index: usize) -> Vec<f64> {
    predictions[adjacent_window(index, predictions.len())]
        .iter()
        .map(|p| p.score)
        .collect()
}

/// One bar of an item's chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBar {
    /// Ranking position whose score this bar shows.
    pub source_position: usize,
    pub score: f64,
    /// Bar length in percent of the chart width
    pub width_percent: f64,
    pub is_own_score: bool,
    pub highlighted: bool,
}

#[derive(Debug, Default)]
struct HighlightState {
    badge: bool,
    source: Option<usize>,
}

/// One rendered prediction.
pub struct RankedItem {
    position: usize,
    class_name: String,
    score: f64,
    window: Vec<(usize, f64)>,
    image: RasterBuffer,
    highlight: Rc<RefCell<HighlightState>>,
    _subscriptions: [Subscription; 2],
}

impl RankedItem {
    fn new(
        bus: &EventBus,
        position: usize,
        prediction: &RankedPrediction,
        window: Vec<(usize, f64)>,
        image: RasterBuffer,
    ) -> Self {
        let highlight = Rc::new(RefCell::new(HighlightState::default()));
        let on_hover = {
            let highlight = Rc::clone(&highlight);
            bus.bind(EventKind::RankedHover, move |event| {
                if let DashboardEvent::RankedHover(h) = event {
                    let mut state = highlight.borrow_mut();
                    state.badge = h.source_position == position;
                    state.source = Some(h.source_position);
                }
            })
        };
        let on_end = {
            let highlight = Rc::clone(&highlight);
            bus.bind(EventKind::RankedHoverEnd, move |_| {
                *highlight.borrow_mut() = HighlightState::default();
            })
        };
        Self {
            position,
            class_name: prediction.class_name.clone(),
            score: prediction.score,
            window,
            image,
            highlight,
            _subscriptions: [on_hover, on_end],
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn badge(&self) -> ScoreBadge {
        ScoreBadge::new(self.score)
    }

    pub fn badge_highlighted(&self) -> bool {
        self.highlight.borrow().badge
    }

    /// The image with everything outside the mask dimmed.
    pub fn image(&self) -> &RasterBuffer {
        &self.image
    }

    pub fn adjacent_scores(&self) -> Vec<f64> {
        self.window.iter().map(|&(_, s)| s).collect()
    }

    pub fn bars(&self) -> Vec<ScoreBar> {
        let lit = self.highlight.borrow().source;
        self.window
            .iter()
            .map(|&(source_position, score)| ScoreBar {
                source_position,
                score,
                width_percent: score.clamp(0.0, 1.0) * 100.0,
                is_own_score: source_position == self.position,
                highlighted: lit == Some(source_position),
            })
            .collect()
    }
}

pub struct RankedResultPresenter {
    bus: EventBus,
    dim_alpha: f32,
    items: Vec<RankedItem>,
}

impl RankedResultPresenter {
    pub fn new(bus: EventBus, dim_alpha: f32) -> Self {
        Self {
            bus,
            dim_alpha,
            items: Vec::new(),
        }
    }

    /// Replace the panel with `predictions`, which arrive best first.
    pub fn render(&mut self, predictions: &[RankedPrediction], background: &RasterBuffer) {
        self.items.clear();
        let len = predictions.len();
        for (position, prediction) in predictions.iter().enumerate() {
            let window = adjacent_window(position, len)
                .map(|i| (i, predictions[i].score))
                .collect();
            let image = prediction
                .binary_mask()
                .spotlight(background, self.dim_alpha);
            self.items.push(RankedItem::new(
                &self.bus,
                position,
                prediction,
                window,
                image,
            ));
        }
        log::debug!("ranked: rendered {} prediction(s)", len);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[RankedItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pointer entered bar `bar` of the item at `list_position`.
    pub fn hover_bar(&self, list_position: usize, bar: usize) {
        let Some(item) = self.items.get(list_position) else {
            return;
        };
        let Some(&(source_position, _)) = item.window.get(bar) else {
            return;
        };
        self.bus.trigger(&DashboardEvent::RankedHover(HighlightEvent {
            list_position,
            source_position,
            is_own_score: source_position == list_position,
        }));
    }

    /// Pointer entered the score badge of the item at `list_position`.
    pub fn hover_badge(&self, list_position: usize) {
        if list_position >= self.items.len() {
            return;
        }
        self.bus.trigger(&DashboardEvent::RankedHover(HighlightEvent {
            list_position,
            source_position: list_position,
            is_own_score: true,
        }));
    }

    pub fn hover_end(&self) {
        self.bus.trigger(&DashboardEvent::RankedHoverEnd);
    }
}
