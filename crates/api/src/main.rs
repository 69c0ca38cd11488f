mod config;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use assess::Assessor;
use config::AppConfig;
use extract::{Extractor, OllamaClient};
use lookups::{FindingsCache, LookupClient, RetryPolicy};
use pipeline::{Pipeline, TransactionContext};
use store::{GraphStore, KnowledgeBase};

#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    knowledge_base: Arc<KnowledgeBase>,
    neo4j_graph: neo4rs::Graph,
    llm_base_url: String,
}

#[derive(Deserialize)]
struct SubmitRequest {
    transaction_data: Option<String>,
    transaction_id: Option<String>,
    callback_url: Option<String>,
}

#[derive(Serialize)]
struct SubmitResponse {
    transaction_id: String,
    run_id: String,
    status: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    neo4j: String,
    llm: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = AppConfig::load(std::env::args().nth(1).as_deref())
        .expect("Failed to load configuration");

    // Connect to Neo4j
    let neo4j_graph = neo4rs::Graph::new(
        &config.neo4j.uri,
        &config.neo4j.user,
        &config.neo4j.password,
    )
    .await
    .expect("Failed to connect to Neo4j");

    let graph_store = Arc::new(GraphStore::new(neo4j_graph.clone()));
    graph_store
        .init_schema()
        .await
        .expect("Failed to initialize graph schema");

    let knowledge_base = Arc::new(KnowledgeBase::new(&config.results_dir));

    let cache = if config.cache.enabled {
        FindingsCache::new(config.cache.max_entries)
    } else {
        FindingsCache::disabled()
    };
    let retry = RetryPolicy::new(
        config.retry.max_retries,
        config.retry.initial_backoff_ms,
        config.retry.max_backoff_ms,
    );
    let lookup_client = Arc::new(LookupClient::new(config.lookups.clone(), retry, cache));

    let extractor = Extractor::new(OllamaClient::new(
        config.llm.base_url.clone(),
        config.llm.extraction_model.clone(),
        config.llm.request_timeout_secs,
    ));
    let assessor = Assessor::new(OllamaClient::new(
        config.llm.base_url.clone(),
        config.llm.assessment_model.clone(),
        config.llm.request_timeout_secs,
    ));

    let pipeline = Arc::new(Pipeline {
        extractor,
        assessor,
        lookups: lookup_client,
        knowledge_base: knowledge_base.clone(),
        graph: graph_store,
        max_concurrent_subjects: config.concurrency.max_concurrent_subjects,
    });

    let state = AppState {
        pipeline,
        knowledge_base,
        neo4j_graph,
        llm_base_url: config.llm.base_url.clone(),
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/transactions", post(submit_transaction))
        .route("/transactions/:id/assessment", get(get_assessment))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!(listen_addr = %config.listen_addr, "AML pipeline API listening");

    axum::serve(listener, app).await.expect("Server error");
}

/// Validate the trigger input and run the pipeline in the background.
/// Missing transaction data or id is the one caller-visible hard failure.
async fn submit_transaction(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), (StatusCode, Json<ErrorResponse>)> {
    let ctx = TransactionContext::new(
        req.transaction_id.unwrap_or_default(),
        req.transaction_data.unwrap_or_default(),
        req.callback_url,
    )
    .map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    let response = SubmitResponse {
        transaction_id: ctx.transaction_id.clone(),
        run_id: ctx.run_id.clone(),
        status: "accepted".to_string(),
    };

    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        let transaction_id = ctx.transaction_id.clone();
        if let Err(e) = pipeline.run(ctx).await {
            tracing::error!(%transaction_id, error = %e, "Pipeline run failed");
        }
    });

    Ok((StatusCode::ACCEPTED, Json(response)))
}

async fn get_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    state
        .knowledge_base
        .load_document(&id, "risk_assessment.json")
        .await
        .map(Json)
        .map_err(|_| StatusCode::NOT_FOUND)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Check Neo4j with a simple query
    let neo4j_status = match state.neo4j_graph.run(neo4rs::query("RETURN 1")).await {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("error: {}", e),
    };

    // Check the LLM endpoint
    let llm_status = match reqwest::get(format!("{}/api/tags", state.llm_base_url)).await {
        Ok(resp) if resp.status().is_success() => "ok".to_string(),
        Ok(resp) => format!("error: status {}", resp.status()),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        neo4j: neo4j_status,
        llm: llm_status,
    })
}
