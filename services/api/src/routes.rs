use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use clarification_tracker::error::AppError;
use clarification_tracker::workflows::clarifications::{
    ingest, CancellationFlag, Clarification, ClarificationTracker, DelimitedSource,
    FilterCriteria, IngestionDiagnostic, IngestionError, IngestionResult, Module, ModuleSummary,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::info;

const INLINE_SHEET: &str = "Clarifications";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryRequest {
    #[serde(default)]
    pub(crate) source_path: Option<PathBuf>,
    #[serde(default)]
    pub(crate) csv: Option<String>,
    /// Module name given to inline CSV rows.
    #[serde(default)]
    pub(crate) sheet_name: Option<String>,
    #[serde(default)]
    pub(crate) filters: Option<FilterCriteria>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QueryResponse {
    pub(crate) modules: Vec<Module>,
    pub(crate) summaries: Vec<ModuleSummary>,
    pub(crate) clarifications: Vec<Clarification>,
    pub(crate) total: usize,
    pub(crate) matched: usize,
    pub(crate) diagnostics: Vec<IngestionDiagnostic>,
}

pub(crate) fn router() -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/clarifications/query",
            axum::routing::post(query_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn query_endpoint(
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let QueryRequest {
        source_path,
        csv,
        sheet_name,
        filters,
    } = payload;

    let mut tracker = ClarificationTracker::new();
    let diagnostics = match (source_path, csv) {
        (Some(path), None) => tracker.load_path(&path, CancellationFlag::new()).await?,
        (None, Some(csv)) => {
            let name = sheet_name.unwrap_or_else(|| INLINE_SHEET.to_string());
            let result = tokio::task::spawn_blocking(move || ingest_inline(name, csv))
                .await
                .map_err(IngestionError::from)??;
            tracker.replace(result)
        }
        _ => {
            return Err(AppError::InvalidRequest(
                "provide exactly one of source_path or csv".to_string(),
            ))
        }
    };

    if let Some(criteria) = filters {
        tracker.apply_filters(criteria);
    }

    let clarifications = tracker.export_view().to_vec();
    info!(
        total = tracker.clarifications().len(),
        matched = clarifications.len(),
        diagnostics = diagnostics.len(),
        "clarification query served"
    );

    Ok(Json(QueryResponse {
        modules: tracker.modules().to_vec(),
        summaries: tracker.summaries(),
        total: tracker.clarifications().len(),
        matched: clarifications.len(),
        clarifications,
        diagnostics,
    }))
}

fn ingest_inline(name: String, csv: String) -> Result<IngestionResult, IngestionError> {
    let mut source = DelimitedSource::from_reader(name.clone(), Cursor::new(csv)).map_err(
        |err| IngestionError::SourceUnreadable {
            path: PathBuf::from(&name),
            reason: err.reason,
        },
    )?;
    ingest(&mut source, &CancellationFlag::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use clarification_tracker::workflows::clarifications::{SchemaMismatch, EXPECTED_HEADERS};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn tracker_csv() -> String {
        // Row 3 carries "#N/A" as plain text, which loads as an undated record.
        format!(
            "Clarification register\n{}\n\
             1,2024-01-01,Valve list,1,1.1,Valve rating?,,Class 300,High,Closed,\n\
             2,2024-02-01,Line list,2,1.2,Pipe class?,,,Low,Open,\n\
             3,#N/A,Line list,2,1.3,Insulation?,,,Low,Pending,\n",
            EXPECTED_HEADERS.join(",")
        )
    }

    fn test_state(ready: bool) -> AppState {
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        }
    }

    #[tokio::test]
    async fn query_endpoint_filters_inline_csv() {
        let request = QueryRequest {
            csv: Some(tracker_csv()),
            sheet_name: Some("Piping".to_string()),
            filters: Some(FilterCriteria::default().with_status("Open")),
            ..QueryRequest::default()
        };

        let Json(body) = query_endpoint(Json(request)).await.expect("query succeeds");

        assert_eq!(body.modules, vec![Module::new("Piping")]);
        assert_eq!(body.total, 3);
        assert_eq!(body.matched, 1);
        assert_eq!(body.clarifications[0].number, 2);
        assert_eq!(body.summaries.len(), 1);
        assert_eq!(body.summaries[0].total, 3);
        assert_eq!(body.summaries[0].closed, 1);
        assert!(body.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn query_without_filters_returns_everything() {
        let request = QueryRequest {
            csv: Some(tracker_csv()),
            ..QueryRequest::default()
        };

        let Json(body) = query_endpoint(Json(request)).await.expect("query succeeds");

        assert_eq!(body.modules[0].name, INLINE_SHEET);
        assert_eq!(body.matched, body.total);
        assert_eq!(body.clarifications.len(), 3);
        assert!(body.clarifications[2].is_undated());
    }

    #[tokio::test]
    async fn inline_csv_with_wrong_headers_reports_the_sheet() {
        let csv = format!(
            "Clarification register\n{}\n1,2024-01-01,Valve list\n",
            EXPECTED_HEADERS[..10].join(",")
        );
        let request = QueryRequest {
            csv: Some(csv),
            sheet_name: Some("Civil".to_string()),
            ..QueryRequest::default()
        };

        let Json(body) = query_endpoint(Json(request)).await.expect("query succeeds");

        assert!(body.modules.is_empty());
        assert_eq!(body.total, 0);
        assert_eq!(
            body.diagnostics,
            vec![IngestionDiagnostic::InvalidSheetSchema {
                sheet: "Civil".to_string(),
                reason: SchemaMismatch::ColumnCount {
                    expected: 11,
                    found: 10,
                },
            }]
        );
    }

    #[tokio::test]
    async fn query_requires_exactly_one_source() {
        let error = query_endpoint(Json(QueryRequest::default()))
            .await
            .expect_err("no source given");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn query_route_rejects_unsupported_paths() {
        let app = router();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/clarifications/query")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"source_path":"tracker.docx"}"#))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert!(body["error"]
            .as_str()
            .is_some_and(|message| message.contains("tracker.docx")));
    }

    #[tokio::test]
    async fn query_route_serialises_the_response() {
        let payload = json!({
            "csv": tracker_csv(),
            "sheet_name": "Piping",
            "filters": { "search": "line list", "date_from": "2024-01-15" }
        });
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/clarifications/query")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["matched"], 1);
        assert_eq!(body["clarifications"][0]["number"], 2);
        assert_eq!(body["summaries"][0]["module"], "Piping");
    }

    #[tokio::test]
    async fn readiness_reflects_the_flag() {
        let app = router().layer(Extension(test_state(false)));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let app = router().layer(Extension(test_state(true)));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }
}
