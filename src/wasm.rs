//! Browser bridge: one `WebDashboard` per mounted dashboard.
//!
//! The page owns the DOM. It forwards user input to the methods below and
//! redraws from `snapshot_json`, `editor_image` and `ranked_image`.

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::api::{Backend, HttpBackend};
use crate::config::DashboardConfig;
use crate::controller::{DashboardContext, DashboardController};
use crate::figures;
use crate::logging;
use crate::mask_editor::{PointerEvent, PointerKind};
use crate::spawn::BrowserSpawner;
use crate::state::{
    BrowserUrl, PredictionFilter, QueryState, ScoreFn, SortDirection, StateOverrides, UrlMode,
    UrlStore,
};
use crate::viewport::Rect;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let config = load_config();
    logging::init(config.log_level);
}

fn load_config() -> DashboardConfig {
    DashboardConfig::load_from_local_storage().unwrap_or_default()
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

fn parse_score_fn(raw: &str) -> Result<ScoreFn, JsValue> {
    raw.parse()
        .map_err(|_| js_error(format!("unknown score function '{}'", raw)))
}

#[wasm_bindgen]
pub struct WebDashboard {
    controller: DashboardController,
}

impl WebDashboard {
    fn mount(state: QueryState) -> Result<WebDashboard, JsValue> {
        let config = load_config();
        let backend: Rc<dyn Backend> =
            Rc::new(HttpBackend::new(&config.api_base_url()).map_err(js_error)?);
        let ctx = DashboardContext::new(state, backend, Rc::new(BrowserSpawner), config);
        let controller = DashboardController::new(ctx);
        controller.initialize();
        Ok(WebDashboard { controller })
    }
}

#[wasm_bindgen]
impl WebDashboard {
    /// The page's main dashboard, kept in sync with the address bar.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WebDashboard, JsValue> {
        let url: Rc<dyn UrlStore> = Rc::new(BrowserUrl);
        let state = QueryState::new(url, UrlMode::Sync, &StateOverrides::default(), false);
        Self::mount(state)
    }

    /// A dashboard that ignores the URL. `overrides` is a JSON object with
    /// camelCase field names.
    pub fn embedded(overrides: &str, freeze: bool) -> Result<WebDashboard, JsValue> {
        let overrides: StateOverrides = serde_json::from_str(overrides).map_err(js_error)?;
        Self::mount(QueryState::embedded(&overrides, freeze))
    }

    /// One of the article's figure panels, by element id.
    pub fn figure(element_id: &str) -> Result<WebDashboard, JsValue> {
        let panel = figures::find_figure(element_id)
            .ok_or_else(|| js_error(format!("no figure panel '{}'", element_id)))?;
        Self::mount(panel.state())
    }

    /// JSON array of every figure panel's element id.
    pub fn figure_ids() -> String {
        let ids: Vec<String> = figures::figure_panels()
            .into_iter()
            .map(|p| p.element_id)
            .collect();
        serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn set_case_study(&self, case_study: &str) -> bool {
        self.controller.on_case_study_changed(case_study)
    }

    pub fn set_sort(&self, direction: &str) -> Result<bool, JsValue> {
        let direction: SortDirection = direction
            .parse()
            .map_err(|_| js_error(format!("unknown sort direction '{}'", direction)))?;
        Ok(self.controller.on_sort_changed(direction))
    }

    pub fn set_score_fn(&self, score_fn: &str) -> Result<bool, JsValue> {
        Ok(self.controller.on_score_fn_changed(parse_score_fn(score_fn)?))
    }

    pub fn set_prediction(&self, prediction: &str) -> bool {
        self.controller
            .on_prediction_changed(PredictionFilter::parse(prediction))
    }

    pub fn set_label(&self, label: &str) -> bool {
        self.controller.on_label_changed(label)
    }

    pub fn set_range(&self, dimension: &str, min: f64, max: f64) -> Result<bool, JsValue> {
        Ok(self
            .controller
            .on_range_changed(parse_score_fn(dimension)?, min, max))
    }

    pub fn select_preset(&self, name: &str) -> bool {
        self.controller.on_preset_selected(name)
    }

    /// A result card was clicked.
    pub fn select_result(&self, id: &str) {
        self.controller.select_result(id);
    }

    pub fn set_brush_radius(&self, radius: u32) -> bool {
        self.controller.on_brush_radius_changed(radius)
    }

    /// Visible part of the result panel, in panel coordinates.
    pub fn viewport(&self, x: f64, y: f64, width: f64, height: f64) -> usize {
        self.controller
            .on_viewport_changed(Rect::new(x, y, width, height))
    }

    /// Canvas pointer event; `kind` is down, move, up, enter or leave.
    pub fn pointer(&self, kind: &str, x: f32, y: f32, primary: bool) -> Result<bool, JsValue> {
        let kind = match kind {
            "down" => PointerKind::Down,
            "move" => PointerKind::Move,
            "up" => PointerKind::Up,
            "enter" => PointerKind::Enter,
            "leave" => PointerKind::Leave,
            other => return Err(js_error(format!("unknown pointer event '{}'", other))),
        };
        Ok(self
            .controller
            .pointer(PointerEvent::new(kind, x, y, primary)))
    }

    pub fn reset_mask(&self) {
        self.controller.reset_mask();
    }

    pub fn submit_mask(&self) -> bool {
        self.controller.submit_mask()
    }

    pub fn hover_bar(&self, list_position: usize, bar: usize) {
        self.controller.hover_ranked_bar(list_position, bar);
    }

    pub fn hover_badge(&self, list_position: usize) {
        self.controller.hover_ranked_badge(list_position);
    }

    pub fn hover_end(&self) {
        self.controller.hover_ranked_end();
    }

    pub fn busy(&self) -> bool {
        self.controller.busy() > 0
    }

    /// Every panel as JSON, laid out for the given chart sizes.
    pub fn snapshot_json(
        &self,
        histogram_width: f64,
        histogram_height: f64,
        confusion_size: f64,
    ) -> Result<String, JsValue> {
        let snapshot = self
            .controller
            .snapshot((histogram_width, histogram_height), confusion_size);
        serde_json::to_string(&snapshot).map_err(js_error)
    }

    pub fn editor_image(&self) -> Option<String> {
        self.controller.editor_image()
    }

    pub fn ranked_image(&self, position: usize) -> Option<String> {
        self.controller.ranked_image(position)
    }

    pub fn teardown(&self) {
        self.controller.teardown();
    }
}
