pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Matching API
        .route("/api/v1/match/single", post(handlers::handle_match_single))
        .route("/api/v1/match/job/:job_id", post(handlers::handle_match_job))
        .route("/api/v1/ideal-profile", post(handlers::handle_ideal_profile))
        .route("/api/v1/pipeline/run", post(handlers::handle_run_pipeline))
        .route(
            "/api/v1/matches/:job_id/:candidate_id",
            get(handlers::handle_get_match),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::test_config;
    use crate::matching::embedding::fakes::BagOfWords;
    use crate::matching::engine::fakes::engine;
    use crate::matching::pipeline::Pipeline;
    use crate::matching::profile::fakes::EchoGenerator;
    use crate::models::candidate::candidate;
    use crate::models::job::{icu_rn_job, Job};
    use crate::store::memory::MemoryStore;

    fn app(store: Arc<MemoryStore>) -> Router {
        let engine = engine(Arc::new(EchoGenerator::new()), Arc::new(BagOfWords::new()));
        build_router(AppState {
            pipeline: Pipeline::new(engine, store, None),
            config: test_config(),
        })
    }

    fn seeded() -> (Arc<MemoryStore>, Job) {
        let job = icu_rn_job();
        let store = Arc::new(MemoryStore::new(
            vec![job.clone()],
            vec![
                candidate("Jane Smith", "Registered Nurse, ICU, CCRN, ACLS"),
                candidate("Luis Ortega", "Phlebotomist, venipuncture"),
            ],
        ));
        (store, job)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (store, _) = seeded();
        let (status, body) = send(app(store), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["profile_cache"], false);
    }

    #[tokio::test]
    async fn test_match_single_returns_percentage() {
        let (store, job) = seeded();
        let body = json!({
            "job": job,
            "candidate": candidate("Jane Smith", "Registered Nurse, 5 years ICU experience"),
        });
        let (status, body) = send(app(store), "POST", "/api/v1/match/single", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        let score = body["similarity_score"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&score));
        assert!(body["match_percentage"].as_str().unwrap().ends_with('%'));
    }

    #[tokio::test]
    async fn test_match_job_rejects_out_of_range_threshold() {
        let (store, job) = seeded();
        let uri = format!("/api/v1/match/job/{}?threshold=1.5", job.id);
        let (status, body) = send(app(store), "POST", &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_match_job_unknown_is_404() {
        let (store, _) = seeded();
        let uri = format!("/api/v1/match/job/{}", Uuid::new_v4());
        let (status, _) = send(app(store), "POST", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_match_job_lists_ranked_candidates_without_writing() {
        let (store, job) = seeded();
        let uri = format!("/api/v1/match/job/{}?threshold=0", job.id);
        let (status, body) = send(app(store.clone()), "POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn test_run_pipeline_then_fetch_match() {
        let (store, job) = seeded();
        let jane_id = store.candidates[0].id;
        let router = app(store);

        let (status, body) =
            send(router.clone(), "POST", "/api/v1/pipeline/run?threshold=0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");
        assert_eq!(body["jobs_processed"], 1);
        assert_eq!(body["matches_created"], 2);

        let uri = format!("/api/v1/matches/{}/{}", job.id, jane_id);
        let (status, body) = send(router, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["questionnaire_sent"], false);
    }

    #[tokio::test]
    async fn test_async_pipeline_reports_started() {
        let (store, _) = seeded();
        let (status, body) = send(
            app(store),
            "POST",
            "/api/v1/pipeline/run?async_mode=true",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "started");
        assert_eq!(body["matches_created"], 0);
    }

    #[tokio::test]
    async fn test_ideal_profile_endpoint() {
        let (store, job) = seeded();
        let (status, body) =
            send(app(store), "POST", "/api/v1/ideal-profile", Some(json!(job))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job_id"], json!(job.id));
        assert!(body["ideal_profile"]
            .as_str()
            .unwrap()
            .contains("Registered Nurse - ICU"));
    }
}
