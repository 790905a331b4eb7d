//! Endpoint tests over the full answering pipeline.
//!
//! The external providers are replaced with scripted stand-ins: a canned
//! search backend, the deterministic trigram embedder, and a generation
//! client that replays a fragment script. Everything else — selection,
//! ranking, streaming, session commits — is the real pipeline.

use actix_web::{test, web, App};
use grounder::routes::{ask_sources, ask_stream, health, SourcesResponse};
use grounder::state::AppState;
use grounder_core::{AppError, AppResult};
use grounder_llm::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk};
use grounder_pipeline::embeddings::TrigramEmbeddings;
use grounder_pipeline::{AnswerSynthesizer, EvidenceSelector, SessionStore};
use grounder_search::{RawResult, SearchProvider};
use serde_json::json;
use std::sync::Arc;

/// Search backend returning a fixed result list.
struct StubSearch {
    results: Vec<RawResult>,
}

#[async_trait::async_trait]
impl SearchProvider for StubSearch {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn search(&self, _query: &str, max_results: u32) -> AppResult<Vec<RawResult>> {
        Ok(self
            .results
            .iter()
            .take(max_results as usize)
            .cloned()
            .collect())
    }
}

/// Search backend that always fails.
struct FailingSearch;

#[async_trait::async_trait]
impl SearchProvider for FailingSearch {
    fn provider_name(&self) -> &str {
        "failing"
    }

    async fn search(&self, _query: &str, _max_results: u32) -> AppResult<Vec<RawResult>> {
        Err(AppError::Retrieval("engine unreachable".to_string()))
    }
}

/// Generation client replaying a fragment script on every call.
struct ScriptedLlm {
    script: Vec<Result<String, String>>,
}

impl ScriptedLlm {
    fn replaying(fragments: &[&str]) -> Self {
        Self {
            script: fragments.iter().map(|f| Ok(f.to_string())).collect(),
        }
    }

    fn failing_after(fragments: &[&str], message: &str) -> Self {
        let mut script: Vec<Result<String, String>> =
            fragments.iter().map(|f| Ok(f.to_string())).collect();
        script.push(Err(message.to_string()));
        Self { script }
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
        Err(AppError::Generation("complete() not scripted".to_string()))
    }

    async fn stream(&self, _request: &LlmRequest) -> AppResult<LlmStream> {
        let items: Vec<AppResult<LlmStreamChunk>> = self
            .script
            .iter()
            .map(|entry| match entry {
                Ok(text) => Ok(LlmStreamChunk {
                    content: text.clone(),
                    done: false,
                }),
                Err(message) => Err(AppError::Generation(message.clone())),
            })
            .collect();

        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// Eight plausible raw results for a capital-of-France question.
fn canned_results() -> Vec<RawResult> {
    (1..=8)
        .map(|n| {
            RawResult::new(
                format!("Doc {}", n),
                format!("Fact number {} about the capital of France", n),
                format!("https://example.com/{}", n),
            )
        })
        .collect()
}

fn build_state(
    search: Arc<dyn SearchProvider>,
    llm: Arc<dyn LlmClient>,
) -> (web::Data<AppState>, Arc<SessionStore>) {
    let sessions = Arc::new(SessionStore::new());

    let state = web::Data::new(AppState {
        selector: EvidenceSelector::new(search, Arc::new(TrigramEmbeddings::default())),
        synthesizer: AnswerSynthesizer::new(
            llm,
            Arc::clone(&sessions),
            "scripted-model",
            0.2,
            1000,
        ),
        sessions: Arc::clone(&sessions),
        num_results: 8,
        top_k: 4,
    });

    (state, sessions)
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .service(ask_stream)
                .service(ask_sources)
                .service(health),
        )
        .await
    };
}

#[actix_web::test]
async fn sources_returns_top_k_entries_with_round_trip_snippets() {
    let (state, _sessions) = build_state(
        Arc::new(StubSearch {
            results: canned_results(),
        }),
        Arc::new(ScriptedLlm::replaying(&[])),
    );
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/ask/sources")
        .set_json(json!({ "question": "What is the capital of France?" }))
        .to_request();
    let response: SourcesResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(response.sources.len(), 4);

    for entry in &response.sources {
        // Each entry maps back to one canned result, and its snippet is
        // the evidence line with the "[k] " prefix and title removed
        let n: usize = entry.url.rsplit('/').next().unwrap().parse().unwrap();
        assert_eq!(entry.title, format!("Doc {}", n));
        assert_eq!(
            entry.snippet,
            format!(
                "Fact number {} about the capital of France (https://example.com/{})",
                n, n
            )
        );
    }
}

#[actix_web::test]
async fn sources_with_no_search_results_is_empty_list() {
    let (state, _sessions) = build_state(
        Arc::new(StubSearch {
            results: Vec::new(),
        }),
        Arc::new(ScriptedLlm::replaying(&[])),
    );
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/ask/sources")
        .set_json(json!({ "question": "anything" }))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;

    assert_eq!(body, actix_web::web::Bytes::from_static(b"{\"sources\":[]}"));
}

#[actix_web::test]
async fn stream_concatenates_fragments_and_commits_one_turn() {
    let (state, sessions) = build_state(
        Arc::new(StubSearch {
            results: canned_results(),
        }),
        Arc::new(ScriptedLlm::replaying(&[
            "Paris is the capital",
            " of France [1].",
        ])),
    );
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/ask/stream")
        .set_json(json!({ "question": "What is the capital of France?" }))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;

    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text, "Paris is the capital of France [1].");
    assert!(text.contains("[1]"));

    // user_id was omitted, so the turn lands on the default session
    assert_eq!(sessions.turn_count("default"), 1);
    let history = sessions.history("default");
    assert_eq!(history[0].answer, "Paris is the capital of France [1].");
    assert_eq!(history[0].sources.len(), 4);
}

#[actix_web::test]
async fn stream_grows_history_by_one_turn_per_call() {
    let (state, sessions) = build_state(
        Arc::new(StubSearch {
            results: canned_results(),
        }),
        Arc::new(ScriptedLlm::replaying(&["An answer [1]."])),
    );
    let app = test_app!(state);

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/ask/stream")
            .set_json(json!({ "question": "capital of France?", "user_id": "alice" }))
            .to_request();
        test::call_and_read_body(&app, req).await;
    }

    assert_eq!(sessions.turn_count("alice"), 2);
    assert_eq!(sessions.turn_count("default"), 0);
}

#[actix_web::test]
async fn stream_failure_yields_fragments_then_error_marker() {
    let (state, sessions) = build_state(
        Arc::new(StubSearch {
            results: canned_results(),
        }),
        Arc::new(ScriptedLlm::failing_after(
            &["one", "two", "three"],
            "connection reset",
        )),
    );
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/ask/stream")
        .set_json(json!({ "question": "q", "user_id": "bob" }))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;

    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.starts_with("onetwothree"));
    assert!(text.contains("Error:"));
    assert!(text.contains("connection reset"));
    assert!(text.ends_with('\n'));

    // The failed turn is still recorded, with the error as the answer
    let history = sessions.history("bob");
    assert_eq!(history.len(), 1);
    assert!(history[0].answer.starts_with("Error:"));
    assert!(history[0].answer.contains("connection reset"));
    assert!(history[0].sources.is_empty());
}

#[actix_web::test]
async fn stream_selection_failure_is_synchronous_error() {
    let (state, sessions) = build_state(
        Arc::new(FailingSearch),
        Arc::new(ScriptedLlm::replaying(&["never reached"])),
    );
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/ask/stream")
        .set_json(json!({ "question": "q" }))
        .to_request();
    let response = test::call_service(&app, req).await;

    assert_eq!(response.status(), actix_web::http::StatusCode::BAD_GATEWAY);
    assert_eq!(sessions.turn_count("default"), 0);
}

#[actix_web::test]
async fn health_endpoint_responds() {
    let (state, _sessions) = build_state(
        Arc::new(StubSearch {
            results: Vec::new(),
        }),
        Arc::new(ScriptedLlm::replaying(&[])),
    );
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let response = test::call_service(&app, req).await;
    assert!(response.status().is_success());
}
