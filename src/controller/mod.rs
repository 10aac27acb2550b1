//! Page-level flows of one mounted dashboard.
//!
//! A UI event writes [`QueryState`], then the controller re-reads the state,
//! queries the backend and re-renders the affected panels. Fetches never
//! block and are never cancelled; every task holds only a weak handle to the
//! controller, so a response arriving after [`DashboardController::teardown`]
//! is dropped.
//!
//! Page-level and ranking responses carry a generation number. A response
//! older than one already rendered for the same panel is dropped, so a slow
//! earlier query cannot overwrite a newer view. Row detail fetches are not
//! guarded: each one writes only its own placeholder.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use serde::Serialize;
use si_raster::RasterBuffer;

use crate::api::{
    Backend, BestPredictionRequest, BinRequest, ConfusionRequest, DetailRequest, ResultDetail,
    ResultQuery,
};
use crate::config::DashboardConfig;
use crate::confusion::{ConfusionMatrix, ConfusionSquare};
use crate::event_bus::{EventBus, Subscription};
use crate::events::{DashboardEvent, EventKind};
use crate::histogram::{Histogram, HistogramBar};
use crate::mask_editor::{CanvasMaskEditor, EditorState, PointerEvent, encode_mask};
use crate::options::{self, SelectOption};
use crate::presets;
use crate::ranked::{RankedResultPresenter, ScoreBar};
use crate::results::{
    GridLayout, Placeholder, ResultCard, ResultMode, ResultPresenter, ScoreBadge, SlotStatus,
};
use crate::spawn::Spawner;
use crate::state::{Field, FieldValue, PredictionFilter, QueryState, ScoreFn, SortDirection};
use crate::viewport::Rect;


/// Everything one mounted dashboard shares between its components.
#[derive(Clone)]
pub struct DashboardContext {
    pub bus: EventBus,
    pub state: Rc<RefCell<QueryState>>,
    pub backend: Rc<dyn Backend>,
    pub spawner: Rc<dyn Spawner>,
    pub config: DashboardConfig,
}

impl DashboardContext {
    pub fn new(
        state: QueryState,
        backend: Rc<dyn Backend>,
        spawner: Rc<dyn Spawner>,
        config: DashboardConfig,
    ) -> Self {
        Self {
            bus: EventBus::new(),
            state: Rc::new(RefCell::new(state)),
            backend,
            spawner,
            config,
        }
    }
}

/// Issued and rendered generation numbers of one panel.
#[derive(Debug, Default)]
struct Freshness {
    issued: Cell<u64>,
    rendered: Cell<u64>,
}

impl Freshness {
    fn issue(&self) -> u64 {
        let next = self.issued.get() + 1;
        self.issued.set(next);
        next
    }

    /// Whether a response of `generation` may render; records it if so.
    fn accept(&self, generation: u64) -> bool {
        if generation < self.rendered.get() {
            return false;
        }
        self.rendered.set(generation);
        true
    }
}

/// Counts one in-flight fetch for as long as it lives.
struct BusyToken(Rc<Cell<usize>>);

impl BusyToken {
    fn new(counter: &Rc<Cell<usize>>) -> Self {
        counter.set(counter.get() + 1);
        Self(Rc::clone(counter))
    }
}

impl Drop for BusyToken {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

struct ControllerInner {
    ctx: DashboardContext,
    mode: Cell<ResultMode>,
    results: RefCell<ResultPresenter>,
    histogram: RefCell<Option<Histogram>>,
    confusion: RefCell<Option<ConfusionMatrix>>,
    editor: RefCell<CanvasMaskEditor>,
    ranked: RefCell<RankedResultPresenter>,
    label_options: RefCell<Vec<SelectOption>>,
    prediction_options: RefCell<Vec<SelectOption>>,
    last_mask: RefCell<Option<RasterBuffer>>,
    last_viewport: Cell<Option<Rect>>,
    busy: Rc<Cell<usize>>,
    results_gen: Freshness,
    histogram_gen: Freshness,
    confusion_gen: Freshness,
    labels_gen: Freshness,
    predictions_gen: Freshness,
    image_gen: Freshness,
    ranking_gen: Freshness,
    subscriptions: RefCell<Vec<Subscription>>,
    torn_down: Cell<bool>,
}

fn live(weak: &Weak<ControllerInner>) -> Option<Rc<ControllerInner>> {
    weak.upgrade().filter(|inner| !inner.torn_down.get())
}

impl ControllerInner {
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        let token = BusyToken::new(&self.busy);
        self.ctx.spawner.spawn_local(
            async move {
                task.await;
                drop(token);
            }
            .boxed_local(),
        );
    }

    fn bind_handlers(self: &Rc<Self>) {
        let bus = &self.ctx.bus;
        let mut subs = self.subscriptions.borrow_mut();

        let weak = Rc::downgrade(self);
        subs.push(bus.bind(EventKind::ResultOnScreen, move |event| {
            if let (Some(inner), DashboardEvent::ResultOnScreen { slot }) = (live(&weak), event) {
                inner.fetch_detail(slot.clone());
            }
        }));

        let weak = Rc::downgrade(self);
        subs.push(bus.bind(EventKind::ResultSelected, move |event| {
            if let (Some(inner), DashboardEvent::ResultSelected { id }) = (live(&weak), event) {
                inner.select_image(id);
            }
        }));

        let weak = Rc::downgrade(self);
        subs.push(bus.bind(EventKind::MaskSubmit, move |event| {
            if let (Some(inner), DashboardEvent::MaskSubmit { annotation }) = (live(&weak), event)
            {
                inner.request_ranking(annotation.clone());
            }
        }));

        let weak = Rc::downgrade(self);
        subs.push(bus.bind(EventKind::MaskReset, move |_| {
            if let Some(inner) = live(&weak) {
                inner.last_mask.borrow_mut().take();
                inner.ranked.borrow_mut().clear();
            }
        }));
    }

    fn mode_for(&self, case_study: &str) -> ResultMode {
        self.ctx
            .config
            .grid
            .mode
            .unwrap_or_else(|| ResultMode::for_case_study(case_study))
    }

    fn resolve_mode(&self) -> ResultMode {
        let case_study = self.ctx.state.borrow().case_study().to_string();
        self.mode_for(&case_study)
    }

    fn set(&self, value: FieldValue) -> bool {
        self.ctx.state.borrow_mut().set(value)
    }

    /// Like `set`, but frozen fields are skipped quietly.
    fn reset_filter(&self, value: FieldValue) {
        let mut state = self.ctx.state.borrow_mut();
        if !state.is_frozen(value.field()) {
            state.set(value);
        }
    }

    // ---- results, histogram, confusion matrix ----

    /// Lay out `ids` under the case study and score function they were
    /// queried with.
    fn show_results(&self, ids: &[String], case_study: &str, score_fn: ScoreFn) {
        let mut results = self.results.borrow_mut();
        results.set_mode(self.mode_for(case_study));
        results.update(ids, case_study, score_fn);
        if let Some(viewport) = self.last_viewport.get() {
            results.on_viewport(viewport);
        }
    }

    fn clear_results(&self) {
        self.results.borrow_mut().clear();
    }

    fn list_request(&self) -> (ResultQuery, String, ScoreFn) {
        let state = self.ctx.state.borrow();
        (
            ResultQuery::from_state(&state),
            state.case_study().to_string(),
            state.score_fn(),
        )
    }

    /// Refetch the id list only.
    fn refresh_results(self: &Rc<Self>) {
        let (query, case_study, score_fn) = self.list_request();
        let generation = self.results_gen.issue();
        let backend = Rc::clone(&self.ctx.backend);
        let weak = Rc::downgrade(self);
        self.spawn(async move {
            let outcome = backend.result_ids(query).await;
            let Some(inner) = live(&weak) else {
                return;
            };
            if !inner.results_gen.accept(generation) {
                log::debug!("controller: dropping stale result list #{}", generation);
                return;
            }
            match outcome {
                Ok(ids) => inner.show_results(&ids, &case_study, score_fn),
                Err(e) => {
                    log::warn!("controller: result list failed: {}", e);
                    inner.clear_results();
                }
            }
        });
    }

    /// Refetch the id list, then the histogram of those ids, and the
    /// confusion matrix.
    ///
    /// The list and the histogram are guarded separately: a sort-only
    /// refresh may overtake the list, but the histogram of this query
    /// still renders unless a newer page refresh got there first.
    fn refresh_page(self: &Rc<Self>) {
        let (query, case_study, score_fn) = self.list_request();
        let list_generation = self.results_gen.issue();
        let histogram_generation = self.histogram_gen.issue();
        let backend = Rc::clone(&self.ctx.backend);
        let weak = Rc::downgrade(self);
        self.spawn(async move {
            let outcome = backend.result_ids(query).await;
            let Some(inner) = live(&weak) else {
                return;
            };
            let list_is_current = inner.results_gen.accept(list_generation);
            if !list_is_current {
                log::debug!("controller: dropping stale result list #{}", list_generation);
            }
            let ids = match outcome {
                Ok(ids) => ids,
                Err(e) => {
                    log::warn!("controller: result list failed: {}", e);
                    if list_is_current {
                        inner.clear_results();
                    }
                    if inner.histogram_gen.accept(histogram_generation) {
                        inner.histogram.borrow_mut().take();
                    }
                    return;
                }
            };
            if list_is_current {
                inner.show_results(&ids, &case_study, score_fn);
            }
            if histogram_generation < inner.histogram_gen.rendered.get() {
                return;
            }
            drop(inner);

            let bins = backend
                .bin_scores(BinRequest {
                    case_study,
                    ids,
                    score_fn,
                })
                .await;
            let Some(inner) = live(&weak) else {
                return;
            };
            if !inner.histogram_gen.accept(histogram_generation) {
                log::debug!("controller: dropping stale histogram #{}", histogram_generation);
                return;
            }
            let histogram = bins
                .map_err(|e| e.to_string())
                .and_then(|bins| Histogram::from_bins(bins).map_err(|e| e.to_string()));
            match histogram {
                Ok(histogram) => {
                    log::debug!("controller: histogram of {} result(s)", histogram.total_count());
                    *inner.histogram.borrow_mut() = Some(histogram);
                }
                Err(e) => {
                    log::warn!("controller: histogram failed: {}", e);
                    inner.histogram.borrow_mut().take();
                }
            }
        });
        self.refresh_confusion();
    }

    fn refresh_confusion(self: &Rc<Self>) {
        let request = {
            let state = self.ctx.state.borrow();
            ConfusionRequest {
                case_study: state.case_study().to_string(),
                label_filter: state.label_filter().to_string(),
                score_fn: state.score_fn(),
            }
        };
        let generation = self.confusion_gen.issue();
        let backend = Rc::clone(&self.ctx.backend);
        let weak = Rc::downgrade(self);
        self.spawn(async move {
            let outcome = backend.confusion_matrix(request).await;
            let Some(inner) = live(&weak) else {
                return;
            };
            if !inner.confusion_gen.accept(generation) {
                return;
            }
            let matrix = match outcome {
                Ok(cells) => Some(ConfusionMatrix::new(cells)),
                Err(e) => {
                    log::warn!("controller: confusion matrix failed: {}", e);
                    None
                }
            };
            *inner.confusion.borrow_mut() = matrix;
        });
    }

    fn fetch_detail(self: &Rc<Self>, slot: Placeholder) {
        let request = DetailRequest {
            case_study: slot.case_study(),
            result_id: slot.result_id(),
            score_fn: slot.score_fn(),
            mode: slot.mode(),
        };
        let backend = Rc::clone(&self.ctx.backend);
        let weak = Rc::downgrade(self);
        self.spawn(async move {
            let outcome = backend.result_detail(request).await;
            if live(&weak).is_none() {
                return;
            }
            match outcome {
                Ok(detail) => slot.populate(&detail),
                Err(e) => {
                    log::warn!("controller: detail of {} failed: {}", slot.result_id(), e);
                    slot.fail();
                }
            }
        });
    }

    // ---- dropdown options ----

    fn reset_options(&self) {
        let state = self.ctx.state.borrow();
        *self.label_options.borrow_mut() =
            options::label_options(&[], state.is_frozen(Field::LabelFilter));
        *self.prediction_options.borrow_mut() =
            options::prediction_options(&[], state.is_frozen(Field::PredictionFn));
    }

    fn refresh_options(self: &Rc<Self>) {
        let case_study = self.ctx.state.borrow().case_study().to_string();

        let generation = self.labels_gen.issue();
        let backend = Rc::clone(&self.ctx.backend);
        let weak = Rc::downgrade(self);
        let labels_case = case_study.clone();
        self.spawn(async move {
            let outcome = backend.labels(labels_case).await;
            let Some(inner) = live(&weak) else {
                return;
            };
            if !inner.labels_gen.accept(generation) {
                return;
            }
            let labels = outcome.unwrap_or_else(|e| {
                log::warn!("controller: labels failed: {}", e);
                Vec::new()
            });
            let frozen = inner.ctx.state.borrow().is_frozen(Field::LabelFilter);
            *inner.label_options.borrow_mut() = options::label_options(&labels, frozen);
        });

        let generation = self.predictions_gen.issue();
        let backend = Rc::clone(&self.ctx.backend);
        let weak = Rc::downgrade(self);
        self.spawn(async move {
            let outcome = backend.predictions(case_study).await;
            let Some(inner) = live(&weak) else {
                return;
            };
            if !inner.predictions_gen.accept(generation) {
                return;
            }
            let predictions = outcome.unwrap_or_else(|e| {
                log::warn!("controller: predictions failed: {}", e);
                Vec::new()
            });
            let frozen = inner.ctx.state.borrow().is_frozen(Field::PredictionFn);
            *inner.prediction_options.borrow_mut() =
                options::prediction_options(&predictions, frozen);
        });
    }

    // ---- annotation and ranking ----

    fn select_image(self: &Rc<Self>, id: &str) -> bool {
        if !self.set(FieldValue::SelectedImage(id.to_string())) {
            return false;
        }
        self.load_selected_image();
        true
    }

    fn load_selected_image(self: &Rc<Self>) {
        self.last_mask.borrow_mut().take();
        self.ranked.borrow_mut().clear();
        let generation = self.image_gen.issue();

        if self.mode.get() == ResultMode::TextList {
            self.image_gen.accept(generation);
            self.set_editor_image(None);
            return;
        }

        let request = {
            let state = self.ctx.state.borrow();
            DetailRequest {
                case_study: state.case_study().to_string(),
                result_id: state.selected_image().to_string(),
                score_fn: state.score_fn(),
                mode: ResultMode::ImageGrid,
            }
        };
        let backend = Rc::clone(&self.ctx.backend);
        let weak = Rc::downgrade(self);
        self.spawn(async move {
            let outcome = backend.result_detail(request).await;
            let Some(inner) = live(&weak) else {
                return;
            };
            if !inner.image_gen.accept(generation) {
                return;
            }
            match outcome {
                Ok(ResultDetail::Image(image)) => inner.set_editor_image(Some(&image.image)),
                Ok(ResultDetail::Text(_)) => inner.set_editor_image(None),
                Err(e) => {
                    log::warn!("controller: selected image failed: {}", e);
                    inner.set_editor_image(None);
                }
            }
        });
    }

    fn set_editor_image(&self, image: Option<&str>) {
        if let Err(e) = self.editor.borrow_mut().set_image(image) {
            log::debug!("controller: editor left empty: {}", e);
        }
    }

    fn request_ranking(self: &Rc<Self>, annotation: RasterBuffer) {
        let size = self.ctx.config.editor.mask_size;
        let mask = match encode_mask(&annotation, size, size) {
            Ok(mask) => mask,
            Err(e) => {
                log::warn!("controller: could not encode mask: {}", e);
                return;
            }
        };
        let Some(background) = self
            .editor
            .borrow()
            .layers()
            .map(|l| l.background.clone())
        else {
            return;
        };
        *self.last_mask.borrow_mut() = Some(annotation);

        let request = {
            let state = self.ctx.state.borrow();
            BestPredictionRequest {
                case_study: state.case_study().to_string(),
                image_id: state.selected_image().to_string(),
                mask,
                score_fn: state.score_fn(),
                topk: self.ctx.config.ranked.top_k,
            }
        };
        let generation = self.ranking_gen.issue();
        let backend = Rc::clone(&self.ctx.backend);
        let weak = Rc::downgrade(self);
        self.spawn(async move {
            let outcome = backend.best_prediction(request).await;
            let Some(inner) = live(&weak) else {
                return;
            };
            if !inner.ranking_gen.accept(generation) {
                log::debug!("controller: dropping stale ranking #{}", generation);
                return;
            }
            match outcome {
                Ok(predictions) => inner.ranked.borrow_mut().render(&predictions, &background),
                Err(e) => {
                    log::warn!("controller: ranking failed: {}", e);
                    inner.ranked.borrow_mut().clear();
                }
            }
        });
    }
}

/// Row of the result panel as the page sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSnapshot {
    pub id: String,
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub status: &'static str,
    pub card: Option<ResultCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSnapshot {
    pub position: usize,
    pub class_name: String,
    pub badge: ScoreBadge,
    pub badge_highlighted: bool,
    pub bars: Vec<ScoreBar>,
}

/// Serializable view of every panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub query: String,
    pub preset: &'static str,
    pub busy: bool,
    pub mode: ResultMode,
    pub case_options: Vec<SelectOption>,
    pub score_fn_options: Vec<SelectOption>,
    pub sort_options: Vec<SelectOption>,
    pub label_options: Vec<SelectOption>,
    pub prediction_options: Vec<SelectOption>,
    pub rows: Vec<RowSnapshot>,
    pub histogram: Vec<HistogramBar>,
    pub confusion: Vec<ConfusionSquare>,
    pub editor: &'static str,
    pub ranked: Vec<RankedSnapshot>,
}

/// Controller of one mounted dashboard. Clones share the same dashboard.
#[derive(Clone)]
pub struct DashboardController {
    inner: Rc<ControllerInner>,
}

impl DashboardController {
    pub fn new(ctx: DashboardContext) -> Self {
        let config = &ctx.config;
        let brush_radius = ctx.state.borrow().brush_radius();
        let mode = config
            .grid
            .mode
            .unwrap_or_else(|| ResultMode::for_case_study(ctx.state.borrow().case_study()));
        let results = ResultPresenter::new(
            ctx.bus.clone(),
            mode,
            GridLayout::new(config.grid.clone()),
            config.viewport.root_margin,
        );
        let editor = CanvasMaskEditor::new(ctx.bus.clone(), config.editor.clone(), brush_radius);
        let ranked = RankedResultPresenter::new(ctx.bus.clone(), config.ranked.dim_alpha);

        let inner = Rc::new(ControllerInner {
            mode: Cell::new(mode),
            results: RefCell::new(results),
            histogram: RefCell::new(None),
            confusion: RefCell::new(None),
            editor: RefCell::new(editor),
            ranked: RefCell::new(ranked),
            label_options: RefCell::new(Vec::new()),
            prediction_options: RefCell::new(Vec::new()),
            last_mask: RefCell::new(None),
            last_viewport: Cell::new(None),
            busy: Rc::new(Cell::new(0)),
            results_gen: Freshness::default(),
            histogram_gen: Freshness::default(),
            confusion_gen: Freshness::default(),
            labels_gen: Freshness::default(),
            predictions_gen: Freshness::default(),
            image_gen: Freshness::default(),
            ranking_gen: Freshness::default(),
            subscriptions: RefCell::new(Vec::new()),
            torn_down: Cell::new(false),
            ctx,
        });
        inner.bind_handlers();
        inner.reset_options();
        Self { inner }
    }

    pub fn context(&self) -> &DashboardContext {
        &self.inner.ctx
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.ctx.bus
    }

    /// First load: dropdown options, the page, and the selected image.
    pub fn initialize(&self) {
        log::info!(
            "Mounting dashboard for {}",
            self.inner.ctx.state.borrow().case_study()
        );
        self.inner.refresh_options();
        self.inner.refresh_page();
        self.inner.load_selected_image();
    }

    /// New case study: label and prediction filters go back to their
    /// defaults, options and page are reloaded.
    pub fn on_case_study_changed(&self, case_study: &str) -> bool {
        let inner = &self.inner;
        if !inner.set(FieldValue::CaseStudy(case_study.to_string())) {
            return false;
        }
        inner.reset_filter(FieldValue::LabelFilter(String::new()));
        inner.reset_filter(FieldValue::PredictionFn(PredictionFilter::All));

        let mode = inner.resolve_mode();
        inner.mode.set(mode);

        inner.refresh_options();
        inner.refresh_page();
        inner.load_selected_image();
        true
    }

    /// Sort order only affects the list.
    pub fn on_sort_changed(&self, direction: SortDirection) -> bool {
        if !self.inner.set(FieldValue::SortBy(direction)) {
            return false;
        }
        self.inner.refresh_results();
        true
    }

    pub fn on_prediction_changed(&self, prediction: PredictionFilter) -> bool {
        if !self.inner.set(FieldValue::PredictionFn(prediction)) {
            return false;
        }
        self.inner.refresh_page();
        true
    }

    /// Also re-ranks the last submitted mask under the new score function.
    pub fn on_score_fn_changed(&self, score_fn: ScoreFn) -> bool {
        if !self.inner.set(FieldValue::ScoreFn(score_fn)) {
            return false;
        }
        self.inner.refresh_page();
        let last_mask = self.inner.last_mask.borrow().clone();
        if let Some(mask) = last_mask {
            self.inner.request_ranking(mask);
        }
        true
    }

    pub fn on_label_changed(&self, label: &str) -> bool {
        if !self.inner.set(FieldValue::LabelFilter(label.to_string())) {
            return false;
        }
        self.inner.refresh_page();
        true
    }

    pub fn on_range_changed(&self, dimension: ScoreFn, min: f64, max: f64) -> bool {
        if !self.inner.ctx.state.borrow_mut().set_range(dimension, min, max) {
            return false;
        }
        self.inner.refresh_page();
        true
    }

    /// Apply a named preset. Unknown names change nothing.
    pub fn on_preset_selected(&self, name: &str) -> bool {
        let Some(preset) = presets::find_preset(name) else {
            log::warn!("controller: unknown preset '{}'", name);
            return false;
        };
        let all_applied = self.inner.ctx.state.borrow_mut().apply_preset(preset);
        self.inner.refresh_page();
        all_applied
    }

    pub fn on_image_selected(&self, id: &str) -> bool {
        self.inner.select_image(id)
    }

    /// Announce a click on a result card.
    pub fn select_result(&self, id: &str) {
        self.inner
            .ctx
            .bus
            .trigger(&DashboardEvent::ResultSelected { id: id.to_string() });
    }

    pub fn on_brush_radius_changed(&self, radius: u32) -> bool {
        if !self.inner.set(FieldValue::PaintBrushR(radius)) {
            return false;
        }
        let radius = self.inner.ctx.state.borrow().brush_radius();
        self.inner.editor.borrow_mut().set_brush_radius(radius);
        true
    }

    /// Report the visible part of the result panel. Returns how many rows
    /// started loading.
    pub fn on_viewport_changed(&self, viewport: Rect) -> usize {
        self.inner.last_viewport.set(Some(viewport));
        self.inner.results.borrow_mut().on_viewport(viewport)
    }

    pub fn pointer(&self, event: PointerEvent) -> bool {
        self.inner.editor.borrow_mut().handle_pointer(event)
    }

    pub fn reset_mask(&self) {
        self.inner.editor.borrow_mut().reset();
    }

    pub fn submit_mask(&self) -> bool {
        self.inner.editor.borrow().submit()
    }

    pub fn hover_ranked_bar(&self, list_position: usize, bar: usize) {
        self.inner.ranked.borrow().hover_bar(list_position, bar);
    }

    pub fn hover_ranked_badge(&self, list_position: usize) {
        self.inner.ranked.borrow().hover_badge(list_position);
    }

    pub fn hover_ranked_end(&self) {
        self.inner.ranked.borrow().hover_end();
    }

    /// Number of fetches in flight; drives the busy cursor.
    pub fn busy(&self) -> usize {
        self.inner.busy.get()
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.get()
    }

    pub fn editor_state(&self) -> EditorState {
        self.inner.editor.borrow().state()
    }

    /// What the annotation canvas shows, as a PNG data URL.
    pub fn editor_image(&self) -> Option<String> {
        let editor = self.inner.editor.borrow();
        let composite = editor.composite()?;
        composite
            .to_data_url()
            .map_err(|e| log::warn!("controller: could not encode canvas: {}", e))
            .ok()
    }

    /// Spotlighted image of ranked item `position`, as a PNG data URL.
    pub fn ranked_image(&self, position: usize) -> Option<String> {
        let ranked = self.inner.ranked.borrow();
        let item = ranked.items().get(position)?;
        item.image()
            .to_data_url()
            .map_err(|e| log::warn!("controller: could not encode ranked image: {}", e))
            .ok()
    }

    pub fn encoded_mask(&self) -> Option<String> {
        let size = self.inner.ctx.config.editor.mask_size;
        self.inner
            .editor
            .borrow()
            .get_encoded_mask(size, size)
            .map_err(|e| log::warn!("controller: could not encode mask: {}", e))
            .ok()
    }

    pub fn result_rows(&self) -> Vec<Placeholder> {
        self.inner.results.borrow().rows().to_vec()
    }

    pub fn histogram(&self) -> Option<Histogram> {
        self.inner.histogram.borrow().clone()
    }

    pub fn confusion_matrix(&self) -> Option<ConfusionMatrix> {
        self.inner.confusion.borrow().clone()
    }

    pub fn label_options(&self) -> Vec<SelectOption> {
        self.inner.label_options.borrow().clone()
    }

    pub fn prediction_options(&self) -> Vec<SelectOption> {
        self.inner.prediction_options.borrow().clone()
    }

    pub fn ranked_snapshot(&self) -> Vec<RankedSnapshot> {
        self.inner
            .ranked
            .borrow()
            .items()
            .iter()
            .map(|item| RankedSnapshot {
                position: item.position(),
                class_name: item.class_name().to_string(),
                badge: item.badge(),
                badge_highlighted: item.badge_highlighted(),
                bars: item.bars(),
            })
            .collect()
    }

    /// Everything the page needs to draw, sized for a histogram of
    /// `histogram_size` and a confusion matrix of `confusion_size` pixels.
    pub fn snapshot(&self, histogram_size: (f64, f64), confusion_size: f64) -> DashboardSnapshot {
        let inner = &self.inner;
        let state = inner.ctx.state.borrow();
        let rows = inner
            .results
            .borrow()
            .rows()
            .iter()
            .map(|row| {
                let bounds = row.bounds();
                let status = row.status();
                RowSnapshot {
                    id: row.result_id(),
                    index: row.index(),
                    x: bounds.x,
                    y: bounds.y,
                    status: match status {
                        SlotStatus::Pending => "pending",
                        SlotStatus::Loading => "loading",
                        SlotStatus::Loaded(_) => "loaded",
                        SlotStatus::Failed => "failed",
                    },
                    card: row.card(),
                }
            })
            .collect();
        let editor = match self.editor_state() {
            EditorState::Empty => "empty",
            EditorState::HasImage => "has_image",
            EditorState::Annotating => "annotating",
        };

        DashboardSnapshot {
            query: state.to_query_string(),
            preset: presets::classify(&state),
            busy: self.busy() > 0,
            mode: inner.mode.get(),
            case_options: options::case_options(state.is_frozen(Field::CaseStudy)),
            score_fn_options: options::score_fn_options(state.is_frozen(Field::ScoreFn)),
            sort_options: options::sort_options(state.is_frozen(Field::SortBy)),
            label_options: self.label_options(),
            prediction_options: self.prediction_options(),
            rows,
            histogram: inner
                .histogram
                .borrow()
                .as_ref()
                .map(|h| h.layout(histogram_size.0, histogram_size.1))
                .unwrap_or_default(),
            confusion: inner
                .confusion
                .borrow()
                .as_ref()
                .map(|m| m.layout(confusion_size))
                .unwrap_or_default(),
            editor,
            ranked: self.ranked_snapshot(),
        }
    }

    /// Unbind every handler and release every panel. Responses still in
    /// flight are dropped when they arrive.
    pub fn teardown(&self) {
        let inner = &self.inner;
        if inner.torn_down.replace(true) {
            return;
        }
        inner.subscriptions.borrow_mut().clear();
        inner.results.borrow_mut().clear();
        inner.ranked.borrow_mut().clear();
        inner.editor.borrow_mut().destroy();
        inner.histogram.borrow_mut().take();
        inner.confusion.borrow_mut().take();
        inner.last_mask.borrow_mut().take();
        log::info!("Dashboard torn down");
    }
}
