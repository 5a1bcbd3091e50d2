use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::debug;

use squall_core::{AggregateError, Dispatcher, Location, Strategy, UnknownStrategy};

use crate::config::Config;
use crate::response::{WeatherView, assemble};

#[derive(Clone)]
pub struct AppState {
    dispatcher: Dispatcher,
    default_cities: Arc<Vec<Location>>,
    max_batch: usize,
    expose_errors: bool,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, config: &Config) -> Self {
        Self {
            dispatcher,
            default_cities: Arc::new(config.default_locations()),
            max_batch: config.max_batch,
            expose_errors: config.expose_errors,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    UnknownStrategy(#[from] UnknownStrategy),

    #[error("too many cities: {requested} requested, at most {max} allowed")]
    TooManyCities { requested: usize, max: usize },

    #[error("batch failed: {0}")]
    Gather(#[from] AggregateError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::UnknownStrategy(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyCities { .. } => StatusCode::BAD_REQUEST,
            ApiError::Gather(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(default_route))
        .route("/weather/batch/{strategy}", get(batch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn default_route() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "the weather is quite sad." }))
}

#[derive(Debug, Deserialize)]
struct BatchQuery {
    cities: Option<String>,
}

/// Always 200 when the batch gathers, even if some lookups failed.
async fn batch(
    State(state): State<AppState>,
    Path(strategy): Path<String>,
    Query(query): Query<BatchQuery>,
) -> Result<Json<Vec<WeatherView>>, ApiError> {
    let strategy: Strategy = strategy.parse()?;
    let locations = match query.cities.as_deref() {
        Some(raw) => Location::parse_list(raw),
        None => state.default_cities.as_ref().clone(),
    };
    if locations.len() > state.max_batch {
        return Err(ApiError::TooManyCities {
            requested: locations.len(),
            max: state.max_batch,
        });
    }

    debug!(%strategy, cities = locations.len(), "dispatching batch");
    let batch = state.dispatcher.dispatch(strategy, locations).await?;
    Ok(Json(assemble(&batch, state.expose_errors)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use clap::Parser;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use squall_core::{StubFetcher, WeatherRecord};
    use tower::ServiceExt;

    fn app(extra_args: &[&str]) -> Router {
        let mut args = vec!["squalld", "--default-cities", "Paris,Tokyo"];
        args.extend_from_slice(extra_args);
        let config = Config::try_parse_from(args).unwrap();

        let fetcher = StubFetcher::new()
            .with_record("Paris", WeatherRecord::new("Paris", "FR", 18.0, "clear"))
            .with_record("Tokyo", WeatherRecord::new("Tokyo", "JP", 22.0, "cloudy"))
            .failing("B");
        router(AppState::new(Dispatcher::new(Arc::new(fetcher)), &config))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn default_route_answers() {
        let (status, body) = get_json(app(&[]), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "the weather is quite sad.");
    }

    #[rstest]
    #[case::barrier("barrier")]
    #[case::channel("channel")]
    #[case::polling("polling")]
    #[case::handoff("handoff")]
    #[case::legacy_name("stress2")]
    #[tokio::test]
    async fn batch_returns_one_item_per_city(#[case] strategy: &str) {
        let uri = format!("/weather/batch/{strategy}?cities=Paris,B,Tokyo");
        let (status, body) = get_json(app(&[]), &uri).await;

        assert_eq!(status, StatusCode::OK);
        let items: Vec<WeatherView> = serde_json::from_value(body).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().any(|i| i.city == "Paris" && i.temperature == "18"));
        assert!(items.iter().any(|i| i.city == "Tokyo" && i.description == "cloudy"));
        assert_eq!(items.iter().filter(|i| i.city.is_empty()).count(), 1);
        assert!(items.iter().all(|i| i.error.is_none()));
    }

    #[tokio::test]
    async fn batch_uses_default_cities() {
        let (status, body) = get_json(app(&[]), "/weather/batch/barrier").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_city_list_is_an_empty_batch() {
        let (status, body) = get_json(app(&[]), "/weather/batch/handoff?cities=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn exposes_errors_when_enabled() {
        let (status, body) = get_json(app(&["--expose-errors"]), "/weather/batch/channel?cities=B").await;
        assert_eq!(status, StatusCode::OK);
        let error = body[0]["error"].as_str().unwrap();
        assert!(error.contains("B"));
    }

    #[tokio::test]
    async fn unknown_strategy_is_not_found() {
        let (status, body) = get_json(app(&[]), "/weather/batch/quantum").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("quantum"));
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected() {
        let (status, _) = get_json(app(&["--max-batch", "2"]), "/weather/batch/polling?cities=A,B,C").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
