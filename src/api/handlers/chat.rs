//! Chat handler: runs the query pipeline and streams the answer as SSE.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use uuid::Uuid;

use crate::{
    index::Retriever,
    llm::{Embedder, LLMClient, LLMClientFactoryTrait},
    query::{build_query_engine, HydeTransform, QueryBundle, QueryTransform},
    types::{AppError, ChatRequest, MessageRole, Result},
    AppState,
};

fn json_event(name: &str, data: serde_json::Value) -> Event {
    Event::default().event(name.to_string()).data(data.to_string())
}

fn error_event(error: &AppError) -> Event {
    json_event("error", serde_json::json!({ "message": error.to_string() }))
}

/// Ask a question about the indexed corpus.
///
/// The response is an SSE stream; see the module docs in [`crate::api`]
/// for the event protocol.
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "SSE stream of answer events"),
        (status = 400, description = "Invalid input")
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    if payload.message.trim().is_empty() {
        return Err(AppError::InvalidInput("Message required".into()));
    }

    let config = state.config_manager.config();
    let question = payload.message.clone();

    // Store the user message before streaming starts so the transcript is
    // consistent even if the pipeline fails.
    let session_id = state.sessions.get_or_create(payload.session_id.as_deref());
    state
        .sessions
        .push_message(&session_id, MessageRole::User, &question)?;
    let message_id = Uuid::new_v4().to_string();

    let stream = async_stream::stream! {
        let start = Instant::now();

        yield Ok(json_event(
            "session",
            serde_json::json!({ "session_id": session_id, "message_id": message_id }),
        ));

        let llm: Arc<dyn LLMClient> = match state.llm_factory.create_client().await {
            Ok(client) => Arc::from(client),
            Err(e) => {
                yield Ok(error_event(&e));
                return;
            }
        };
        let embedder: Arc<dyn Embedder> = match state.llm_factory.create_embedder().await {
            Ok(embedder) => Arc::from(embedder),
            Err(e) => {
                yield Ok(error_event(&e));
                return;
            }
        };

        // The stored assistant message mirrors exactly what the UI renders:
        // hyde preamble, answer tokens, then the references block.
        let mut full_response = String::new();

        let bundle = if config.query.enable_hyde {
            let hyde = HydeTransform::new(Arc::clone(&llm), config.query.hyde_include_original);
            match hyde.transform(&question).await {
                Ok(bundle) => {
                    let hypothetical = bundle
                        .embedding_strs
                        .first()
                        .cloned()
                        .unwrap_or_default();
                    full_response.push_str(&format!(
                        "=== Non-RAG response ===\n\n{}\n\n=== RAG response ===\n\n",
                        hypothetical
                    ));
                    yield Ok(json_event("hyde", serde_json::json!({ "text": hypothetical })));
                    bundle
                }
                Err(e) => {
                    yield Ok(error_event(&e));
                    return;
                }
            }
        } else {
            QueryBundle::new(question.clone())
        };

        let retriever = Retriever::new(Arc::clone(&state.index), embedder);
        let engine = match build_query_engine(&config, retriever, llm) {
            Ok(engine) => engine,
            Err(e) => {
                yield Ok(error_event(&e));
                return;
            }
        };

        let mut response = match engine.query(&bundle).await {
            Ok(response) => response,
            Err(e) => {
                yield Ok(error_event(&e));
                return;
            }
        };

        while let Some(chunk) = response.stream.next().await {
            match chunk {
                Ok(delta) => {
                    full_response.push_str(&delta);
                    yield Ok(json_event("token", serde_json::json!({ "delta": delta })));
                }
                Err(e) => {
                    yield Ok(error_event(&e));
                    break;
                }
            }
        }

        if config.citation.enabled {
            yield Ok(json_event(
                "sources",
                serde_json::to_value(&response.sources).unwrap_or_default(),
            ));

            if !response.sources.is_empty() {
                full_response.push_str("\n\n### References\n\n");
                for source in &response.sources {
                    full_response.push_str(&format!(
                        "[{}]\n\n```\n{}\n```\n\n",
                        source.number, source.text
                    ));
                }
            }
        }

        if let Err(e) = state.sessions.push_message_with_id(
            &session_id,
            message_id.clone(),
            MessageRole::Assistant,
            full_response,
        ) {
            tracing::error!(error = %e, session_id = %session_id, "Failed to store assistant message");
        }

        yield Ok(json_event("done", serde_json::json!({ "message_id": message_id })));

        tracing::info!(
            session_id = %session_id,
            message_id = %message_id,
            sources = response.sources.len(),
            hyde = config.query.enable_hyde,
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat completed"
        );
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
