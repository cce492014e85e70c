//! HTTP surface: one JSON route per endpoint plus a health check.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use disclosure_lib::{ChainError, Endpoint, ReportOptions, RequestContext, ServiceError, TradeService};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, warn};

use crate::cache::ResponseCache;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TradeService>,
    pub cache: Option<Arc<ResponseCache>>,
}

impl AppState {
    pub fn new(service: TradeService, cache: Option<ResponseCache>) -> Self {
        Self {
            service: Arc::new(service),
            cache: cache.map(Arc::new),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ReportParams {
    pub limit: Option<usize>,
    pub cluster: Option<bool>,
}

impl ReportParams {
    fn options(&self) -> ReportOptions {
        ReportOptions {
            limit: self.limit,
            cluster: self.cluster.unwrap_or(true),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/api/congress-trades", get(congress_trades))
        .route("/api/insider-trades", get(insider_trades))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn congress_trades(
    State(state): State<AppState>,
    uri: Uri,
    params: Result<Query<ReportParams>, QueryRejection>,
) -> Response {
    match params {
        Ok(Query(params)) => serve_report(&state, Endpoint::Congress, &uri, &params).await,
        Err(rejection) => bad_params(Endpoint::Congress, rejection),
    }
}

async fn insider_trades(
    State(state): State<AppState>,
    uri: Uri,
    params: Result<Query<ReportParams>, QueryRejection>,
) -> Response {
    match params {
        Ok(Query(params)) => serve_report(&state, Endpoint::Insider, &uri, &params).await,
        Err(rejection) => bad_params(Endpoint::Insider, rejection),
    }
}

async fn serve_report(
    state: &AppState,
    endpoint: Endpoint,
    uri: &Uri,
    params: &ReportParams,
) -> Response {
    let key = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    if let Some(body) = state.cache.as_ref().and_then(|c| c.get(&key)) {
        debug!(%key, "Serving cached report");
        return json_body(StatusCode::OK, body);
    }

    let result = state
        .service
        .report(endpoint, params.options(), &RequestContext::now())
        .await;
    let report = match result {
        Ok(report) => report,
        Err(e) => return error_response(endpoint, e),
    };

    match serde_json::to_string(&report) {
        Ok(body) => {
            if let Some(cache) = &state.cache {
                cache.insert(key, body.clone());
                debug!(entries = cache.len(), "Cached report");
            }
            json_body(StatusCode::OK, body)
        }
        Err(e) => {
            error!(%endpoint, error = %e, "Failed to serialize report");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn bad_params(endpoint: Endpoint, rejection: QueryRejection) -> Response {
    let message = rejection.body_text();
    debug!(%endpoint, error = %message, "Rejected query parameters");
    error_json(StatusCode::BAD_REQUEST, message)
}

fn error_response(endpoint: Endpoint, err: ServiceError) -> Response {
    match &err {
        ServiceError::Chain(ChainError::Exhausted { .. }) => {
            warn!(%endpoint, error = %err, "No source produced trades");
            error_json(StatusCode::BAD_GATEWAY, err.to_string())
        }
        ServiceError::Chain(ChainError::TimedOut { .. }) => {
            warn!(%endpoint, error = %err, "Report deadline passed");
            error_json(StatusCode::GATEWAY_TIMEOUT, err.to_string())
        }
        _ => {
            error!(%endpoint, error = %err, "Report failed");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn json_body(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn error_json(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use disclosure_lib::{
        AdapterChain, Amount, FilingContext, SourceAdapter, SourceError, Ticker, TradeFact,
        TransactionType,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    struct Fixed {
        name: &'static str,
        tickers: Vec<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SourceAdapter for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_trades(&self, _ctx: &RequestContext) -> Result<Vec<TradeFact>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let ctx = FilingContext::listing(self.name, "https://example.test");
            Ok(self
                .tickers
                .iter()
                .map(|t| ctx.fact(Ticker::parse(t), TransactionType::Purchase, Amount::Value(1_000.0)))
                .collect())
        }
    }

    struct Stalled;

    #[async_trait]
    impl SourceAdapter for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn fetch_trades(&self, _ctx: &RequestContext) -> Result<Vec<TradeFact>, SourceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    struct Broken;

    #[async_trait]
    impl SourceAdapter for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn fetch_trades(&self, _ctx: &RequestContext) -> Result<Vec<TradeFact>, SourceError> {
            Err(SourceError::Shape("unexpected page".into()))
        }
    }

    fn app(cache: Option<ResponseCache>) -> (Router, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let congress = AdapterChain::new(
            "congress",
            vec![
                Box::new(Broken) as Box<dyn SourceAdapter>,
                Box::new(Fixed {
                    name: "house_clerk",
                    tickers: vec!["AAPL", "MSFT", "AAPL"],
                    calls: Arc::clone(&calls),
                }),
            ],
        );
        let insider = AdapterChain::new("insider", vec![Box::new(Broken) as Box<dyn SourceAdapter>]);
        let service = TradeService::new(congress, insider, 200, 20);
        (router(AppState::new(service, cache)), calls)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _) = app(None);
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn congress_report_names_committed_source() {
        let (app, _) = app(None);
        let (status, body) = get_json(app, "/api/congress-trades").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["source"], "house_clerk");
        assert_eq!(body["count"], 3);
        assert_eq!(body["clustered"][0]["ticker"], "AAPL");
        assert_eq!(body["clustered"][0]["buys"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn limit_and_cluster_params_apply() {
        let (app, _) = app(None);
        let (status, body) = get_json(app, "/api/congress-trades?limit=1&cluster=false").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert!(body.get("clustered").is_none());
    }

    #[tokio::test]
    async fn malformed_params_get_a_json_error() {
        let (app, calls) = app(None);
        let (status, body) = get_json(app, "/api/congress-trades?limit=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("query string"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn slow_chain_is_gateway_timeout() {
        let congress = AdapterChain::new("congress", vec![Box::new(Stalled) as Box<dyn SourceAdapter>]);
        let insider = AdapterChain::new("insider", vec![Box::new(Broken) as Box<dyn SourceAdapter>]);
        let service =
            TradeService::new(congress, insider, 200, 20).with_budget(Duration::from_millis(50));
        let app = router(AppState::new(service, None));

        let (status, body) = get_json(app, "/api/congress-trades").await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body["error"].as_str().unwrap().ends_with(": stalled"));
    }

    #[tokio::test]
    async fn exhausted_chain_is_bad_gateway() {
        let (app, _) = app(None);
        let (status, body) = get_json(app, "/api/insider-trades").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "all sources failed: broken");
    }

    #[tokio::test]
    async fn cached_reports_skip_the_chain() {
        let (app, calls) = app(Some(ResponseCache::new(Duration::from_secs(60))));
        let (_, first) = get_json(app.clone(), "/api/congress-trades?limit=2").await;
        let (_, second) = get_json(app.clone(), "/api/congress-trades?limit=2").await;
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        get_json(app, "/api/congress-trades?limit=3").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
