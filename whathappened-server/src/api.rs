use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use whathappened_core::{Error, OsmSource, WatchEvaluator, WatchReport};

pub struct AppState<S> {
    pub evaluator: Arc<WatchEvaluator<S>>,
    pub default_osmtypes: Arc<Vec<String>>,
}

impl<S> AppState<S> {
    pub fn new(evaluator: WatchEvaluator<S>, default_osmtypes: Vec<String>) -> Self {
        Self {
            evaluator: Arc::new(evaluator),
            default_osmtypes: Arc::new(default_osmtypes),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            evaluator: Arc::clone(&self.evaluator),
            default_osmtypes: Arc::clone(&self.default_osmtypes),
        }
    }
}

pub fn create_router<S: OsmSource + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/whathappened/:identifier/:watchfor", get(full_changeset::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Status code reported for an evaluation failure.
pub fn status_for(error: &Error) -> StatusCode {
    if error.is_upstream() {
        return StatusCode::BAD_GATEWAY;
    }
    match error {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidOsmType(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

#[derive(Deserialize)]
struct WatchParams {
    osmtypes: Option<String>,
}

/// Splits a `|` separated list. Items are kept verbatim, empty ones dropped.
fn split_list(value: &str) -> Vec<String> {
    value
        .split('|')
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

async fn full_changeset<S: OsmSource + 'static>(
    State(state): State<AppState<S>>,
    Path((identifier, watchfor)): Path<(u64, String)>,
    Query(params): Query<WatchParams>,
) -> Result<Json<WatchReport>, (StatusCode, String)> {
    let watchlist = split_list(&watchfor);
    let osmtypes = match params.osmtypes {
        Some(osmtypes) => split_list(&osmtypes),
        None => state.default_osmtypes.to_vec(),
    };

    info!(changeset = identifier, ?watchlist, ?osmtypes, "whathappened request");

    state
        .evaluator
        .evaluate(identifier, &watchlist, &osmtypes)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(changeset = identifier, error = %e, "evaluation failed");
            (status_for(&e), e.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use whathappened_core::{Document, OsmType, Result};

    struct StubSource;

    #[async_trait]
    impl OsmSource for StubSource {
        async fn changeset_document(&self, identifier: u64) -> Result<Document> {
            let body = match identifier {
                1 => r#"<osmChange version="0.6"><modify>
                        <node id="5" version="2"><tag k="amenity" v="cafe"/></node>
                        <way id="6" version="3"><tag k="highway" v="path"/></way>
                    </modify></osmChange>"#,
                2 => "<osm/>",
                _ => return Err(Error::remote("stub", "connection refused")),
            };
            Ok(Document::new("stub", body))
        }

        async fn history_document(&self, osmtype: OsmType, identifier: u64) -> Result<Document> {
            let body = match (osmtype, identifier) {
                (OsmType::Node, 5) => r#"<osm><node id="5" version="1"/></osm>"#,
                (OsmType::Way, 6) => {
                    r#"<osm><way id="6" version="2"><tag k="highway" v="track"/></way></osm>"#
                }
                _ => return Err(Error::remote("stub", "connection refused")),
            };
            Ok(Document::new("stub", body))
        }
    }

    fn router() -> Router {
        let state = AppState::new(
            WatchEvaluator::new(StubSource),
            vec!["node".to_string(), "way".to_string()],
        );
        create_router(state)
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_default_osmtypes() {
        let (status, body) = get_json("/whathappened/1/amenity|highway").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "node": [{"id": 5, "version": 2, "created": {"amenity": "cafe"}, "modified": {}, "deleted": {}}],
                "way": [{"id": 6, "version": 3, "created": {}, "modified": {"highway": {"new": "path", "old": "track"}}, "deleted": {}}]
            })
        );
    }

    #[tokio::test]
    async fn test_explicit_osmtypes() {
        let (status, body) = get_json("/whathappened/1/amenity?osmtypes=relation").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"relation": []}));
    }

    #[tokio::test]
    async fn test_unknown_osmtype_is_an_empty_key() {
        let (status, body) = get_json("/whathappened/1/amenity?osmtypes=node|area").await;

        assert_eq!(status, StatusCode::OK);
        let keys: Vec<&str> = body
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["area", "node"]);
        assert_eq!(body["area"], serde_json::json!([]));
        assert_eq!(body["node"][0]["id"], 5);
    }

    #[tokio::test]
    async fn test_watch_keys_are_not_trimmed() {
        let (status, body) = get_json("/whathappened/1/%20amenity|highway").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["node"], serde_json::json!([]));
        assert_eq!(body["way"][0]["id"], 6);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let (status, _) = get_json("/whathappened/3/amenity").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = get_json("/whathappened/2/amenity").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_non_numeric_changeset_is_rejected() {
        let (status, _) = get_json("/whathappened/abc/amenity").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("amenity|shop"), vec!["amenity", "shop"]);
        assert_eq!(split_list("amenity||"), vec!["amenity"]);
        assert_eq!(split_list(" name|shop "), vec![" name", "shop "]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&Error::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&Error::InvalidOperation("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&Error::malformed("u", "r")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::remote("u", "timeout")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::InvalidOsmType("area".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::InvalidVersion("node 1 v0".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
