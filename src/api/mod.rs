//! Contract with the scoring backend.
//!
//! Everything the dashboard knows about results comes through [`Backend`].
//! [`HttpBackend`] talks JSON over HTTP; tests use an in-memory double.

mod http;
mod types;

#[cfg(test)]
pub(crate) mod fake;

use futures::future::LocalBoxFuture;

pub use http::HttpBackend;
pub use types::{
    BestPredictionRequest, Bin, BinRequest, ConfusionCell, ConfusionRequest, DetailRequest,
    RankedPrediction, ResultDetail, ResultListing, ResultQuery, ResultSummary, SaliencyImage,
    SaliencyText,
};

/// Errors from a backend call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} answered with status {status}")]
    Status { status: u16, endpoint: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Scoring backend. All calls are asynchronous and single-threaded.
pub trait Backend {
    /// Ordered ids of the results passing the filters.
    fn result_ids(&self, query: ResultQuery) -> LocalBoxFuture<'_, ApiResult<Vec<String>>>;

    /// Render payload of one result.
    fn result_detail(&self, request: DetailRequest) -> LocalBoxFuture<'_, ApiResult<ResultDetail>>;

    /// Histogram of the score of `ids`.
    fn bin_scores(&self, request: BinRequest) -> LocalBoxFuture<'_, ApiResult<Vec<Bin>>>;

    fn confusion_matrix(
        &self,
        request: ConfusionRequest,
    ) -> LocalBoxFuture<'_, ApiResult<Vec<ConfusionCell>>>;

    /// Classes ranked by how well their explanation matches a drawn mask.
    fn best_prediction(
        &self,
        request: BestPredictionRequest,
    ) -> LocalBoxFuture<'_, ApiResult<Vec<RankedPrediction>>>;

    fn labels(&self, case_study: String) -> LocalBoxFuture<'_, ApiResult<Vec<String>>>;

    fn predictions(&self, case_study: String) -> LocalBoxFuture<'_, ApiResult<Vec<String>>>;
}
