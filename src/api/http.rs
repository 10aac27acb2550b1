use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;
use web_time::Instant;

use super::types::{
    BestPredictionRequest, Bin, BinRequest, ConfusionCell, ConfusionRequest, DetailRequest,
    RankedPrediction, ResultDetail, ResultListing, ResultQuery,
};
use super::{ApiError, ApiResult, Backend};
use crate::results::ResultMode;

/// JSON-over-HTTP backend rooted at an `/api` URL.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        // Joining relative endpoints needs the trailing slash.
        let base = Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?;
        log::info!("Using API at {}", base);
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        Ok(self.base.join(path)?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        pairs: &[(&str, String)],
    ) -> ApiResult<T> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut()
            .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
        let started = Instant::now();
        let response = self.client.get(url).send().await?;
        Self::decode(path, response, started).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let url = self.endpoint(path)?;
        let started = Instant::now();
        let response = self.client.post(url).json(body).send().await?;
        Self::decode(path, response, started).await
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
        started: Instant,
    ) -> ApiResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                endpoint: path.to_string(),
            });
        }
        let body = response.text().await?;
        log::debug!(
            "api: {} answered {} bytes in {:?}",
            path,
            body.len(),
            started.elapsed()
        );
        Ok(serde_json::from_str(&body)?)
    }
}

impl Backend for HttpBackend {
    fn result_ids(&self, query: ResultQuery) -> LocalBoxFuture<'_, ApiResult<Vec<String>>> {
        async move {
            let listing: Vec<ResultListing> = self.get("get-result-ids", &query.pairs()).await?;
            Ok(listing
                .into_iter()
                .map(|entry| match entry {
                    ResultListing::Id(id) => id,
                    ResultListing::Summary(s) => s.id,
                })
                .collect())
        }
        .boxed_local()
    }

    fn result_detail(&self, request: DetailRequest) -> LocalBoxFuture<'_, ApiResult<ResultDetail>> {
        async move {
            let (path, id_key) = match request.mode {
                ResultMode::ImageGrid => ("get-saliency-image", "image_id"),
                ResultMode::TextList => ("get-result", "result_id"),
            };
            let pairs = [
                ("case_study", request.case_study.clone()),
                (id_key, request.result_id.clone()),
                ("score_fn", request.score_fn.to_string()),
            ];
            let mut detail: ResultDetail = self.get(path, &pairs).await?;
            fill_missing_id(&mut detail, &request.result_id);
            Ok(detail)
        }
        .boxed_local()
    }

    fn bin_scores(&self, request: BinRequest) -> LocalBoxFuture<'_, ApiResult<Vec<Bin>>> {
        async move { self.post("bin-scores", &request).await }.boxed_local()
    }

    fn confusion_matrix(
        &self,
        request: ConfusionRequest,
    ) -> LocalBoxFuture<'_, ApiResult<Vec<ConfusionCell>>> {
        async move {
            let pairs = [
                ("case_study", request.case_study),
                ("label_filter", request.label_filter),
                ("score_fn", request.score_fn.to_string()),
            ];
            self.get("confusion-matrix", &pairs).await
        }
        .boxed_local()
    }

    fn best_prediction(
        &self,
        request: BestPredictionRequest,
    ) -> LocalBoxFuture<'_, ApiResult<Vec<RankedPrediction>>> {
        async move { self.post("get-best-prediction", &request).await }.boxed_local()
    }

    fn labels(&self, case_study: String) -> LocalBoxFuture<'_, ApiResult<Vec<String>>> {
        async move { self.get("get-labels", &[("case_study", case_study)]).await }.boxed_local()
    }

    fn predictions(&self, case_study: String) -> LocalBoxFuture<'_, ApiResult<Vec<String>>> {
        async move { self.get("get-predictions", &[("case_study", case_study)]).await }
            .boxed_local()
    }
}

fn fill_missing_id(detail: &mut ResultDetail, id: &str) {
    let slot = match detail {
        ResultDetail::Image(d) => &mut d.id,
        ResultDetail::Text(d) => &mut d.id,
    };
    if slot.is_empty() {
        *slot = id.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_join_under_base_path() {
        let backend = HttpBackend::new("http://localhost:8000/api").unwrap();
        assert_eq!(
            backend.endpoint("get-labels").unwrap().as_str(),
            "http://localhost:8000/api/get-labels"
        );

        let slashed = HttpBackend::new("http://localhost:8000/api/").unwrap();
        assert_eq!(slashed.base_url(), backend.base_url());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpBackend::new("not a url"),
            Err(ApiError::Url(_))
        ));
    }

    #[test]
    fn test_fill_missing_id() {
        let mut detail: ResultDetail =
            serde_json::from_str(r#"{"words": ["x"], "label": "a", "prediction": "a"}"#).unwrap();
        fill_missing_id(&mut detail, "r1");
        assert_eq!(detail.id(), "r1");
    }
}
