//! Query, streaming query and feedback endpoints.

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use comai_rag::{stream_query, MemoryContext, Question, RagResult};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::convert::Infallible;

use super::error::ApiError;
use super::state::AppState;

/// Body of `/query` and `/query-stream`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,

    /// Summary of earlier turns
    #[serde(default, rename = "memoryContext")]
    pub memory_context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<String>,
    pub follow_ups: Vec<String>,
}

impl From<RagResult> for QueryResponse {
    fn from(result: RagResult) -> Self {
        let (answer, sources, follow_ups) = result.into_parts();
        Self {
            answer,
            sources,
            follow_ups,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub question: String,
    pub answer: String,
    pub positive: bool,
}

/// POST /query
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let pipeline = state.pipeline()?;
    let question = Question::parse(request.question)?;

    tracing::info!("Query: \"{}\"", question);

    let result = pipeline
        .run(&question, &MemoryContext::from(request.memory_context))
        .await;

    Ok(Json(result.into()))
}

/// POST /query-stream
///
/// Always 200; failures are reported in-band as an `error` event.
pub async fn query_stream(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Response {
    tracing::info!("Streaming query: \"{}\"", request.question);

    let events = stream_query(
        state.handle(),
        &request.question,
        MemoryContext::from(request.memory_context),
    );
    let body = Body::from_stream(events.map(|event| Ok::<_, Infallible>(event.to_ndjson())));

    ([(header::CONTENT_TYPE, "application/x-ndjson")], body).into_response()
}

/// POST /feedback
pub async fn feedback(Json(request): Json<FeedbackRequest>) -> Json<Value> {
    tracing::info!(
        positive = request.positive,
        question = %request.question,
        answer = %request.answer,
        "Feedback received"
    );

    Json(json!({ "status": "success" }))
}
