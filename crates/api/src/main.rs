mod cache;
mod config;
mod metrics;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use extract::Families;
use relations::{
    FamilyRelationPipeline, NoCache, PipelineOutput, RelationCandidate, RelationMap,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::Cache;
use crate::config::AppConfig;
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};

struct AppState {
    config: AppConfig,
    pipeline: FamilyRelationPipeline,
    cache: Option<Cache>,
    metrics: Arc<Metrics>,
    latest: RwLock<Option<LatestRun>>,
}

struct LatestRun {
    run_id: String,
    output: PipelineOutput,
}

#[derive(Debug)]
enum AppError {
    /// No pipeline output yet
    NotReady,
    NotFound(String),
    Evaluation(eval::EvaluationError),
    Internal(anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotReady => (
                StatusCode::CONFLICT,
                "No pipeline output yet, POST /run first".to_string(),
            ),
            AppError::NotFound(family) => {
                (StatusCode::NOT_FOUND, format!("Unknown family: {}", family))
            }
            AppError::Evaluation(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e)
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    loaded: bool,
    run_id: Option<String>,
}

#[derive(Serialize)]
struct RunResponse {
    run_id: String,
    people: usize,
    families: usize,
    candidates: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::load()?;
    let bind_addr = config.server.bind_addr.clone();
    let state = build_state(config)?;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(config: AppConfig) -> anyhow::Result<Arc<AppState>> {
    let pipeline = FamilyRelationPipeline::new(config.pipeline.clone())?;
    let cache = config
        .cache
        .enabled
        .then(|| Cache::new(config.cache.max_entries));

    Ok(Arc::new(AppState {
        config,
        pipeline,
        cache,
        metrics: Metrics::new(),
        latest: RwLock::new(None),
    }))
}

fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/run", post(run_pipeline))
        .route("/families", get(get_families))
        .route("/relations", get(get_relations))
        .route("/relations/:surname", get(get_family_relations))
        .route("/evaluate", post(evaluate))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let latest = state.latest.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        loaded: latest.is_some(),
        run_id: latest.as_ref().map(|run| run.run_id.clone()),
    })
}

async fn run_pipeline(State(state): State<Arc<AppState>>) -> Result<Json<RunResponse>, AppError> {
    let timer = TimedOperation::start();
    let result = infer(&state).await;

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            state.metrics.record_run(timer.elapsed(), None);
            return Err(e.into());
        }
    };

    let run_id = uuid::Uuid::new_v4().to_string();
    let response = RunResponse {
        run_id: run_id.clone(),
        people: output.people.len(),
        families: output.families.len(),
        candidates: output.candidate_count(),
    };
    if let Err(e) = save_relations(&state.config, &output.relations).await {
        state.metrics.record_run(timer.elapsed(), None);
        return Err(e.into());
    }
    state.metrics.record_run(
        timer.elapsed(),
        Some((response.families, response.candidates)),
    );

    tracing::info!(
        run_id = %run_id,
        families = response.families,
        candidates = response.candidates,
        "Pipeline run complete"
    );

    *state.latest.write().await = Some(LatestRun { run_id, output });
    Ok(Json(response))
}

async fn infer(state: &AppState) -> anyhow::Result<PipelineOutput> {
    let data = &state.config.data;
    let documents = ingest::ingest_tagged_directory(&data.ner_dir).await?;
    let paragraphs = ingest::ingest_chapter_directory(
        &data.chapters_dir,
        state.pipeline.config().segmenter.clone(),
    )
    .await?;

    let output = match &state.cache {
        Some(cache) => {
            let corpus = cache.for_corpus(
                paragraphs.iter().map(|p| p.text.as_str()),
                &state.pipeline.config().scorer,
            );
            tracing::debug!(digest = corpus.digest(), "Scoring with evidence cache");
            state.pipeline.infer_with_cache(&documents, &paragraphs, &corpus)
        }
        None => state.pipeline.infer_with_cache(&documents, &paragraphs, &NoCache),
    };

    Ok(output)
}

async fn save_relations(config: &AppConfig, relations: &RelationMap) -> anyhow::Result<()> {
    let output_dir = &config.data.output_dir;
    tokio::fs::create_dir_all(output_dir).await?;
    let json = serde_json::to_string_pretty(relations)?;
    tokio::fs::write(output_dir.join("relations.json"), json).await?;
    Ok(())
}

async fn get_families(State(state): State<Arc<AppState>>) -> Result<Json<Families>, AppError> {
    let latest = state.latest.read().await;
    let run = latest.as_ref().ok_or(AppError::NotReady)?;
    Ok(Json(run.output.families.clone()))
}

async fn get_relations(State(state): State<Arc<AppState>>) -> Result<Json<RelationMap>, AppError> {
    let latest = state.latest.read().await;
    let run = latest.as_ref().ok_or(AppError::NotReady)?;
    Ok(Json(run.output.relations.clone()))
}

async fn get_family_relations(
    State(state): State<Arc<AppState>>,
    Path(surname): Path<String>,
) -> Result<Json<Vec<RelationCandidate>>, AppError> {
    let latest = state.latest.read().await;
    let run = latest.as_ref().ok_or(AppError::NotReady)?;
    run.output
        .relations
        .get(&surname)
        .cloned()
        .map(Json)
        .ok_or(AppError::NotFound(surname))
}

async fn evaluate(
    State(state): State<Arc<AppState>>,
) -> Result<Json<eval::EvaluationReport>, AppError> {
    let timer = TimedOperation::start();
    let gold = eval::load_gold(&state.config.data.gold_path).await?;

    let latest = state.latest.read().await;
    let run = latest.as_ref().ok_or(AppError::NotReady)?;

    let result = eval::EvaluationReport::build(&run.output.relations, &gold);
    state.metrics.record_evaluation(timer.elapsed(), result.is_ok());

    let report = result.map_err(AppError::Evaluation)?;
    tracing::info!(
        run_id = %run.run_id,
        f1 = report.scores.f1,
        "Evaluation complete"
    );
    Ok(Json(report))
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    let cache = state.cache.as_ref().map(Cache::stats);
    Json(state.metrics.snapshot(cache))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt; // for oneshot

    fn create_test_state(dir: &std::path::Path, gold: &str) -> Arc<AppState> {
        let ner_dir = dir.join("ner");
        let chapters_dir = dir.join("chapters");
        std::fs::create_dir_all(&ner_dir).unwrap();
        std::fs::create_dir_all(&chapters_dir).unwrap();
        std::fs::write(
            ner_dir.join("chapter_0.ner"),
            "Ned/PERSON Stark/PERSON saw/O Robb/PERSON Stark/PERSON",
        )
        .unwrap();
        std::fs::write(chapters_dir.join("chapter_0.txt"), "Ned is Robb's father.\n").unwrap();
        std::fs::write(dir.join("gold.json"), gold).unwrap();

        let mut config = AppConfig::default();
        config.data.ner_dir = ner_dir;
        config.data.chapters_dir = chapters_dir;
        config.data.gold_path = dir.join("gold.json");
        config.data.output_dir = dir.join("results");
        build_state(config).unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const GOLD: &str = r#"{"Stark": [["Ned", "Robb", "parent_child"]]}"#;

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(create_test_state(dir.path(), GOLD));

        let response = app.oneshot(request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["loaded"], false);
    }

    #[tokio::test]
    async fn test_relations_before_run_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(create_test_state(dir.path(), GOLD));

        let response = app.oneshot(request("GET", "/relations")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_run_then_query_and_evaluate() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(create_test_state(dir.path(), GOLD));

        let response = app.clone().oneshot(request("POST", "/run")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let run = body_json(response).await;
        assert_eq!(run["families"], 1);
        assert_eq!(run["candidates"], 1);
        assert!(dir.path().join("results/relations.json").exists());

        let response = app
            .clone()
            .oneshot(request("GET", "/relations/Stark"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let stark = body_json(response).await;
        assert_eq!(stark[0]["scores"][0][0], "parent_child");

        let response = app
            .clone()
            .oneshot(request("GET", "/relations/Tully"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.clone().oneshot(request("POST", "/evaluate")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["scores"]["f1"], 1.0);

        let response = app.oneshot(request("GET", "/metrics")).await.unwrap();
        let metrics = body_json(response).await;
        assert_eq!(metrics["total_runs"], 1);
        assert_eq!(metrics["cache"]["entries"], 1);
    }

    #[tokio::test]
    async fn test_second_run_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let state = create_test_state(dir.path(), GOLD);
        let app = create_router(state.clone());

        app.clone().oneshot(request("POST", "/run")).await.unwrap();
        app.oneshot(request("POST", "/run")).await.unwrap();

        let stats = state.cache.as_ref().unwrap().stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_failed_save_counts_as_failed_run() {
        let dir = tempfile::tempdir().unwrap();
        let state = create_test_state(dir.path(), GOLD);
        std::fs::write(dir.path().join("results"), "not a directory").unwrap();
        let app = create_router(state);

        let response = app.clone().oneshot(request("POST", "/run")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = app.clone().oneshot(request("GET", "/metrics")).await.unwrap();
        let metrics = body_json(response).await;
        assert_eq!(metrics["total_runs"], 1);
        assert_eq!(metrics["failed_runs"], 1);
        assert_eq!(metrics["families"], 0);

        let response = app.oneshot(request("GET", "/health")).await.unwrap();
        assert_eq!(body_json(response).await["loaded"], false);
    }

    #[tokio::test]
    async fn test_misaligned_gold_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let gold = r#"{"Tully": [["Catelyn", "Edmure", "sibling"]]}"#;
        let app = create_router(create_test_state(dir.path(), gold));

        app.clone().oneshot(request("POST", "/run")).await.unwrap();
        let response = app.oneshot(request("POST", "/evaluate")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let error = body_json(response).await;
        assert!(error["error"].as_str().unwrap().contains("Tully"));
    }
}
