use std::cell::RefCell;
use std::rc::Rc;

use super::ResultMode;
use super::card::ResultCard;
use crate::api::ResultDetail;
use crate::state::ScoreFn;
use crate::viewport::{Rect, SlotId};

/// Load state of one placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotStatus {
    Pending,
    Loading,
    Loaded(Box<ResultCard>),
    Failed,
}

#[derive(Debug)]
struct SlotState {
    slot: SlotId,
    result_id: String,
    case_study: String,
    mode: ResultMode,
    score_fn: ScoreFn,
    index: usize,
    bounds: Rect,
    status: SlotStatus,
    attached: bool,
}

/// Query context a row was created under. Its detail fetch uses this, not
/// whatever the dashboard shows by the time the row scrolls into view.
#[derive(Debug, Clone, PartialEq)]
pub struct RowContext {
    pub case_study: String,
    pub mode: ResultMode,
    pub score_fn: ScoreFn,
}

/// Shared handle to one row of the result list.
///
/// The presenter owns the row while it is on the page; a pending fetch keeps
/// its own handle, so a response arriving after the list was rebuilt still
/// has somewhere to go. Such a row is detached and nobody looks at it again.
#[derive(Debug, Clone)]
pub struct Placeholder(Rc<RefCell<SlotState>>);

impl Placeholder {
    pub(crate) fn new(
        slot: SlotId,
        result_id: String,
        context: &RowContext,
        index: usize,
        bounds: Rect,
    ) -> Self {
        Self(Rc::new(RefCell::new(SlotState {
            slot,
            result_id,
            case_study: context.case_study.clone(),
            mode: context.mode,
            score_fn: context.score_fn,
            index,
            bounds,
            status: SlotStatus::Pending,
            attached: true,
        })))
    }

    pub fn slot(&self) -> SlotId {
        self.0.borrow().slot
    }

    pub fn result_id(&self) -> String {
        self.0.borrow().result_id.clone()
    }

    /// Score function the row was created for.
    pub fn case_study(&self) -> String {
        self.0.borrow().case_study.clone()
    }

    pub fn mode(&self) -> ResultMode {
        self.0.borrow().mode
    }

    pub fn score_fn(&self) -> ScoreFn {
        self.0.borrow().score_fn
    }

    /// Position in the ordered id list.
    pub fn index(&self) -> usize {
        self.0.borrow().index
    }

    pub fn bounds(&self) -> Rect {
        self.0.borrow().bounds
    }

    pub fn status(&self) -> SlotStatus {
        self.0.borrow().status.clone()
    }

    pub fn card(&self) -> Option<ResultCard> {
        match &self.0.borrow().status {
            SlotStatus::Loaded(card) => Some(card.as_ref().clone()),
            _ => None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.0.borrow().attached
    }

    pub(crate) fn detach(&self) {
        self.0.borrow_mut().attached = false;
    }

    pub(crate) fn mark_loading(&self) {
        self.0.borrow_mut().status = SlotStatus::Loading;
    }

    /// Render `detail` into this row, attached or not.
    pub fn populate(&self, detail: &ResultDetail) {
        let mut state = self.0.borrow_mut();
        let card = ResultCard::from_detail(detail, state.score_fn);
        if !state.attached {
            log::trace!("results: {} loaded after detach", state.result_id);
        }
        state.status = SlotStatus::Loaded(Box::new(card));
    }

    /// Clear the row back to an idle, empty look.
    pub fn fail(&self) {
        self.0.borrow_mut().status = SlotStatus::Failed;
    }

    pub fn same_as(&self, other: &Placeholder) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
