//! In-memory backend for tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;

use super::types::{
    BestPredictionRequest, Bin, BinRequest, ConfusionCell, ConfusionRequest, DetailRequest,
    RankedPrediction, ResultDetail, ResultQuery, SaliencyText,
};
use super::{ApiError, ApiResult, Backend};

/// Releases one held call.
pub(crate) struct Gate(oneshot::Sender<()>);

impl Gate {
    pub(crate) fn release(self) {
        let _ = self.0.send(());
    }
}

/// Answers are captured when a call is made and delivered when its gate (if
/// any) is released, so held calls can resolve out of order.
#[derive(Default)]
pub(crate) struct FakeBackend {
    pub ids: RefCell<Vec<String>>,
    pub details: RefCell<HashMap<String, ResultDetail>>,
    pub bins: RefCell<Vec<Bin>>,
    pub confusion: RefCell<Vec<ConfusionCell>>,
    pub ranked: RefCell<Vec<RankedPrediction>>,
    pub labels: RefCell<Vec<String>>,
    pub predictions: RefCell<Vec<String>>,
    failing: RefCell<HashSet<&'static str>>,
    holds: RefCell<HashMap<&'static str, VecDeque<oneshot::Receiver<()>>>>,
    calls: RefCell<Vec<String>>,
    requests: RefCell<Vec<BestPredictionRequest>>,
    detail_requests: RefCell<Vec<DetailRequest>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_ids(ids: &[&str]) -> Self {
        let backend = Self::new();
        backend.set_ids(ids);
        backend
    }

    pub(crate) fn set_ids(&self, ids: &[&str]) {
        *self.ids.borrow_mut() = ids.iter().map(|s| s.to_string()).collect();
    }

    /// Text detail record for `id` whose label equals its prediction.
    pub(crate) fn add_text(&self, id: &str, iou: f64) {
        let detail = ResultDetail::Text(SaliencyText {
            id: id.to_string(),
            words: vec!["good".into(), "beer".into()],
            label: "1".into(),
            prediction: "1".into(),
            explanation_inds: vec![0],
            ground_truth_inds: vec![0, 1],
            iou: Some(iou),
            ground_truth_coverage: Some(0.5),
            explanation_coverage: Some(1.0),
        });
        self.details.borrow_mut().insert(id.to_string(), detail);
    }

    pub(crate) fn fail(&self, endpoint: &'static str) {
        self.failing.borrow_mut().insert(endpoint);
    }

    pub(crate) fn recover(&self, endpoint: &'static str) {
        self.failing.borrow_mut().remove(endpoint);
    }

    /// Hold the next call to `endpoint` until the returned gate is released.
    pub(crate) fn hold(&self, endpoint: &'static str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.holds
            .borrow_mut()
            .entry(endpoint)
            .or_default()
            .push_back(rx);
        Gate(tx)
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub(crate) fn call_count(&self, endpoint: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.split(':').next() == Some(endpoint))
            .count()
    }

    pub(crate) fn ranking_requests(&self) -> Vec<BestPredictionRequest> {
        self.requests.borrow().clone()
    }

    pub(crate) fn detail_requests(&self) -> Vec<DetailRequest> {
        self.detail_requests.borrow().clone()
    }

    fn answer<T: 'static>(
        &self,
        endpoint: &'static str,
        arg: &str,
        value: T,
    ) -> LocalBoxFuture<'_, ApiResult<T>> {
        self.calls.borrow_mut().push(format!("{}:{}", endpoint, arg));
        let failing = self.failing.borrow().contains(endpoint);
        let gate = self
            .holds
            .borrow_mut()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front);
        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if failing {
                return Err(ApiError::Status {
                    status: 500,
                    endpoint: endpoint.to_string(),
                });
            }
            Ok(value)
        }
        .boxed_local()
    }
}

impl Backend for FakeBackend {
    fn result_ids(&self, query: ResultQuery) -> LocalBoxFuture<'_, ApiResult<Vec<String>>> {
        let ids = self.ids.borrow().clone();
        self.answer("result_ids", &query.case_study, ids)
    }

    fn result_detail(&self, request: DetailRequest) -> LocalBoxFuture<'_, ApiResult<ResultDetail>> {
        self.detail_requests.borrow_mut().push(request.clone());
        match self.details.borrow().get(&request.result_id).cloned() {
            Some(detail) => self.answer("result_detail", &request.result_id, detail),
            None => {
                self.calls
                    .borrow_mut()
                    .push(format!("result_detail:{}", request.result_id));
                async {
                    Err(ApiError::Status {
                        status: 404,
                        endpoint: "result_detail".to_string(),
                    })
                }
                .boxed_local()
            }
        }
    }

    fn bin_scores(&self, request: BinRequest) -> LocalBoxFuture<'_, ApiResult<Vec<Bin>>> {
        let bins = self.bins.borrow().clone();
        self.answer("bin_scores", &request.ids.len().to_string(), bins)
    }

    fn confusion_matrix(
        &self,
        request: ConfusionRequest,
    ) -> LocalBoxFuture<'_, ApiResult<Vec<ConfusionCell>>> {
        let cells = self.confusion.borrow().clone();
        self.answer("confusion_matrix", &request.case_study, cells)
    }

    fn best_prediction(
        &self,
        request: BestPredictionRequest,
    ) -> LocalBoxFuture<'_, ApiResult<Vec<RankedPrediction>>> {
        let ranked = self.ranked.borrow().clone();
        let arg = request.score_fn.to_string();
        self.requests.borrow_mut().push(request);
        self.answer("best_prediction", &arg, ranked)
    }

    fn labels(&self, case_study: String) -> LocalBoxFuture<'_, ApiResult<Vec<String>>> {
        let labels = self.labels.borrow().clone();
        self.answer("labels", &case_study, labels)
    }

    fn predictions(&self, case_study: String) -> LocalBoxFuture<'_, ApiResult<Vec<String>>> {
        let predictions = self.predictions.borrow().clone();
        self.answer("predictions", &case_study, predictions)
    }
}
