//! Ranked result collections rendered from an ordered id list.
//!
//! [`ResultPresenter::update`] lays out one [`Placeholder`] per id in list
//! order and registers each with the viewport loader. When the host reports
//! a scroll, rows that came into view are announced on the bus as
//! [`DashboardEvent::ResultOnScreen`]; whoever listens fetches the detail and
//! populates the row.

mod card;
mod placeholder;

use serde::{Deserialize, Serialize};

pub use card::{ImageCard, ResultCard, ScoreBadge, TextCard, Token, TokenHighlight};
pub use placeholder::{Placeholder, RowContext, SlotStatus};

use crate::config::GridOptions;
use crate::event_bus::EventBus;
use crate::events::DashboardEvent;
use crate::state::ScoreFn;
use crate::viewport::{Rect, SlotId, ViewportLoader, VisibilityScheduler, VisibilityTarget};

/// Whether a case study holds images or texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultMode {
    #[default]
    ImageGrid,
    TextList,
}

impl ResultMode {
    /// Text case studies carry `text` or `beer` in their name.
    pub fn for_case_study(case_study: &str) -> Self {
        if case_study.contains("text") || case_study.contains("beer") {
            ResultMode::TextList
        } else {
            ResultMode::ImageGrid
        }
    }
}

/// Placement of rows on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    options: GridOptions,
}

impl GridLayout {
    pub fn new(options: GridOptions) -> Self {
        Self { options }
    }

    /// Bounds of the row at `index`, relative to the top of the panel.
    pub fn bounds(&self, mode: ResultMode, index: usize) -> Rect {
        let o = &self.options;
        match mode {
            ResultMode::ImageGrid => {
                let columns = o.columns.max(1) as usize;
                let (row, col) = (index / columns, index % columns);
                Rect::new(
                    col as f64 * (o.card_width + o.gap),
                    row as f64 * (o.card_height + o.gap),
                    o.card_width,
                    o.card_height,
                )
            }
            ResultMode::TextList => {
                let width = o.columns.max(1) as f64 * (o.card_width + o.gap);
                Rect::new(
                    0.0,
                    index as f64 * (o.text_row_height + o.gap),
                    width,
                    o.text_row_height,
                )
            }
        }
    }
}

pub struct ResultPresenter {
    bus: EventBus,
    mode: ResultMode,
    layout: GridLayout,
    loader: ViewportLoader,
    rows: Vec<Placeholder>,
    next_slot: u64,
}

impl ResultPresenter {
    pub fn new(bus: EventBus, mode: ResultMode, layout: GridLayout, root_margin: f64) -> Self {
        Self {
            bus,
            mode,
            layout,
            loader: ViewportLoader::new(root_margin),
            rows: Vec::new(),
            next_slot: 0,
        }
    }

    pub fn mode(&self) -> ResultMode {
        self.mode
    }

    /// Takes effect on the next update.
    pub fn set_mode(&mut self, mode: ResultMode) {
        self.mode = mode;
    }

    /// Replace the content with one placeholder per id, in order. Every row
    /// remembers `case_study`, `score_fn` and the current mode.
    pub fn update(&mut self, ids: &[String], case_study: &str, score_fn: ScoreFn) {
        self.clear();
        let context = RowContext {
            case_study: case_study.to_string(),
            mode: self.mode,
            score_fn,
        };
        for (index, id) in ids.iter().enumerate() {
            let slot = SlotId(self.next_slot);
            self.next_slot += 1;
            let bounds = self.layout.bounds(self.mode, index);
            self.loader.observe(VisibilityTarget { slot, bounds });
            self.rows
                .push(Placeholder::new(slot, id.clone(), &context, index, bounds));
        }
        log::debug!(
            "results: {} placeholder(s) for {} / {}",
            self.rows.len(),
            case_study,
            score_fn
        );
    }

    /// Remove every row. Safe to call when empty.
    pub fn clear(&mut self) {
        for row in self.rows.drain(..) {
            row.detach();
        }
        // slot ids are never reused, so nothing from the old list is worth
        // remembering
        self.loader = ViewportLoader::new(self.loader.root_margin());
    }

    /// Announce the rows that `viewport` brings into view for the first time.
    /// Returns how many were announced.
    pub fn on_viewport(&mut self, viewport: Rect) -> usize {
        let fired = self.loader.poll(viewport);
        let mut announced = 0;
        for slot in fired {
            let Some(row) = self.rows.iter().find(|r| r.slot() == slot) else {
                continue;
            };
            row.mark_loading();
            self.bus
                .trigger(&DashboardEvent::ResultOnScreen { slot: row.clone() });
            announced += 1;
        }
        announced
    }

    pub fn rows(&self) -> &[Placeholder] {
        &self.rows
    }

    pub fn ids(&self) -> Vec<String> {
        self.rows.iter().map(Placeholder::result_id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows still waiting to scroll into view.
    pub fn pending(&self) -> usize {
        self.loader.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("r{}", i)).collect()
    }

    fn presenter(bus: &EventBus) -> ResultPresenter {
        ResultPresenter::new(
            bus.clone(),
            ResultMode::ImageGrid,
            GridLayout::new(GridOptions::default()),
            0.0,
        )
    }

    #[test]
    fn test_update_preserves_order() {
        let bus = EventBus::new();
        let mut p = presenter(&bus);
        let list = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        p.update(&list, "data_dogs_10", ScoreFn::Iou);
        assert_eq!(p.ids(), list);
        assert!(p.rows().iter().enumerate().all(|(i, r)| r.index() == i));
        assert!(p.rows().iter().all(|r| r.score_fn() == ScoreFn::Iou));
        assert!(p.rows().iter().all(|r| r.case_study() == "data_dogs_10"));
    }

    #[test]
    fn test_rows_keep_the_mode_they_were_built_in() {
        let bus = EventBus::new();
        let mut p = presenter(&bus);
        p.update(&ids(2), "data_dogs_10", ScoreFn::Iou);
        let row = p.rows()[0].clone();

        p.set_mode(ResultMode::TextList);
        assert_eq!(row.mode(), ResultMode::ImageGrid);
        assert_eq!(row.case_study(), "data_dogs_10");

        p.update(&ids(2), "data_beer_reviews", ScoreFn::Iou);
        assert!(p.rows().iter().all(|r| r.mode() == ResultMode::TextList));
    }

    #[test]
    fn test_update_forgets_fired_rows() {
        let bus = EventBus::new();
        let mut p = presenter(&bus);
        p.update(&ids(10), "data_dogs_10", ScoreFn::Iou);
        p.on_viewport(Rect::new(0.0, 0.0, 5000.0, 5000.0));
        assert_eq!(p.loader.fired_count(), 10);

        p.update(&ids(3), "data_dogs_10", ScoreFn::Iou);
        assert_eq!(p.loader.fired_count(), 0);
        assert_eq!(p.on_viewport(Rect::new(0.0, 0.0, 5000.0, 5000.0)), 3);
        assert_eq!(p.loader.fired_count(), 3);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let bus = EventBus::new();
        let mut p = presenter(&bus);
        p.clear();
        p.update(&ids(3), "data_dogs_10", ScoreFn::Iou);
        let old = p.rows()[0].clone();
        p.clear();
        p.clear();
        assert!(p.is_empty());
        assert_eq!(p.pending(), 0);
        assert!(!old.is_attached());
    }

    #[test]
    fn test_visible_rows_are_announced_once() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = Rc::clone(&seen);
            bus.bind(EventKind::ResultOnScreen, move |e| {
                if let DashboardEvent::ResultOnScreen { slot } = e {
                    seen.borrow_mut().push(slot.result_id());
                }
            })
        };
        let mut p = presenter(&bus);
        p.update(&ids(50), "data_dogs_10", ScoreFn::Iou);

        // first grid row only
        let first_row = Rect::new(0.0, 0.0, 1000.0, 100.0);
        assert_eq!(p.on_viewport(first_row), 5);
        assert_eq!(p.on_viewport(first_row), 0);
        assert_eq!(*seen.borrow(), ids(5));
        assert!(
            p.rows()[..5]
                .iter()
                .all(|r| r.status() == SlotStatus::Loading)
        );
        assert_eq!(p.rows()[5].status(), SlotStatus::Pending);
    }

    #[test]
    fn test_stale_row_still_populates() {
        let bus = EventBus::new();
        let mut p = presenter(&bus);
        p.update(&ids(1), "data_dogs_10", ScoreFn::Iou);
        let stale = p.rows()[0].clone();
        p.update(&ids(2), "data_dogs_10", ScoreFn::Iou);

        let detail = serde_json::from_str(r#"{"words": ["x"], "label": "1", "prediction": "1"}"#)
            .unwrap();
        stale.populate(&detail);
        assert!(stale.card().is_some());
        assert!(p.rows().iter().all(|r| r.card().is_none()));
        assert!(!p.rows()[0].same_as(&stale));
    }

    #[test]
    fn test_layouts() {
        let layout = GridLayout::new(GridOptions::default());
        let o = GridOptions::default();
        let sixth = layout.bounds(ResultMode::ImageGrid, 6);
        assert_eq!(sixth.x, o.card_width + o.gap);
        assert_eq!(sixth.y, o.card_height + o.gap);

        let row = layout.bounds(ResultMode::TextList, 2);
        assert_eq!(row.x, 0.0);
        assert_eq!(row.y, 2.0 * (o.text_row_height + o.gap));
    }

    #[test]
    fn test_mode_from_case_study() {
        assert_eq!(ResultMode::for_case_study("data_dogs_10"), ResultMode::ImageGrid);
        assert_eq!(ResultMode::for_case_study("beer_advocate"), ResultMode::TextList);
    }
}
