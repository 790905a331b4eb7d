//! HTTP request handlers.
//!
//! `POST /ask/stream` streams answer fragments as chunked plain text. The
//! response status commits before generation finishes, so a provider
//! failure mid-stream is rendered in-band as a terminal `Error: <message>`
//! line rather than a status code. Selection failures happen before any
//! bytes are streamed and return a synchronous error response.
//!
//! `POST /ask/sources` runs evidence selection only and returns the
//! citation-ordered source list without invoking the generator.

use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse};
use bytes::Bytes;
use futures::StreamExt;
use grounder_core::AppError;
use grounder_pipeline::AnswerChunk;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// User id applied when a request does not carry one.
pub const DEFAULT_USER_ID: &str = "default";

/// Request body for both ask endpoints.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,

    #[serde(default)]
    pub user_id: Option<String>,
}

/// One entry of the `/ask/sources` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct SourceEntry {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Response body of `/ask/sources`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceEntry>,
}

/// Map a pipeline error to a synchronous error response.
fn error_response(error: AppError) -> HttpResponse {
    let status = match &error {
        AppError::Retrieval(_) | AppError::Embedding(_) | AppError::Generation(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::error!(%error, "Request failed before streaming");
    HttpResponse::build(status).json(json!({ "error": error.to_string() }))
}

/// Strip the citation prefix and title from a formatted evidence line.
///
/// `"[1] Paris: Capital of France (https://a.example)"` becomes
/// `"Capital of France (https://a.example)"` — everything after the first
/// colon, trimmed.
fn extract_snippet(line: &str) -> String {
    line.splitn(2, ':')
        .nth(1)
        .map(str::trim)
        .unwrap_or("")
        .to_string()
}

/// Stream a grounded answer for a question.
#[post("/ask/stream")]
pub async fn ask_stream(
    request: web::Json<AskRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let user_id = request
        .user_id
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string());

    tracing::info!(%user_id, "Handling /ask/stream");

    let (evidence, citations) = match state
        .selector
        .select(&request.question, state.num_results, state.top_k)
        .await
    {
        Ok(selected) => selected,
        Err(error) => return error_response(error),
    };

    let answer = match state
        .synthesizer
        .synthesize(&user_id, &request.question, &evidence, citations)
    {
        Ok(stream) => stream,
        Err(error) => return error_response(error),
    };

    let body = answer.map(|chunk| {
        Ok::<Bytes, std::convert::Infallible>(match chunk {
            AnswerChunk::Text(text) => Bytes::from(text),
            AnswerChunk::Failure(message) => Bytes::from(format!("Error: {}\n", message)),
        })
    });

    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .streaming(body)
}

/// Return the ranked evidence set for a question, without generation.
#[post("/ask/sources")]
pub async fn ask_sources(
    request: web::Json<AskRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    tracing::info!("Handling /ask/sources");

    let (evidence, _citations) = match state
        .selector
        .select(&request.question, state.num_results, state.top_k)
        .await
    {
        Ok(selected) => selected,
        Err(error) => return error_response(error),
    };

    let sources = evidence
        .iter()
        .map(|item| SourceEntry {
            title: item.title.clone(),
            url: item.url.clone(),
            snippet: extract_snippet(&item.snippet),
        })
        .collect();

    HttpResponse::Ok().json(SourcesResponse { sources })
}

/// Liveness check.
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "grounder"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_snippet_strips_prefix_and_title() {
        let line = "[1] Paris: Capital of France (https://a.example)";
        assert_eq!(extract_snippet(line), "Capital of France (https://a.example)");
    }

    #[test]
    fn test_extract_snippet_splits_on_first_colon() {
        // A colon inside the title cuts there, like the original service
        let line = "[2] Rust: The Book: great read (https://b.example)";
        assert_eq!(extract_snippet(line), "The Book: great read (https://b.example)");
    }

    #[test]
    fn test_extract_snippet_without_colon() {
        assert_eq!(extract_snippet("no colon here"), "");
    }
}
