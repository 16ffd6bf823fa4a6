//! Streaming adapter.
//!
//! Replays a finished [`RagResult`] as `token* sources? follow_ups? done`.
//! Streams are lazy: nothing runs until polled, and dropping the stream
//! (client disconnect) stops both the pipeline and the pacing timer.

use crate::startup::{PipelineHandle, NOT_INITIALIZED};
use crate::types::{MemoryContext, Question, RagResult, StreamEvent};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use std::time::Duration;

/// Run the pipeline for `question` and stream the result.
///
/// An uninitialized pipeline or an empty question yields a single `error`
/// event with no trailing `done`.
pub fn stream_query(
    handle: &PipelineHandle,
    question: &str,
    memory: MemoryContext,
) -> BoxStream<'static, StreamEvent> {
    let pipeline = match handle.pipeline() {
        Ok(pipeline) => pipeline.clone(),
        Err(e) => {
            tracing::error!("Rejecting streamed query: {}", e);
            return error_event(NOT_INITIALIZED);
        }
    };

    let question = match Question::parse(question) {
        Ok(question) => question,
        Err(e) => return error_event(&e.to_string()),
    };

    let token_delay = pipeline.token_delay();

    stream::once(async move { pipeline.run(&question, &memory).await })
        .flat_map(move |result| replay(result, token_delay))
        .boxed()
}

/// Emit one `token` per character of the answer, then the non-empty
/// sources and follow-ups, then `done`.
///
/// A zero `token_delay` disables pacing.
pub fn replay(result: RagResult, token_delay: Duration) -> BoxStream<'static, StreamEvent> {
    let (answer, sources, follow_ups) = result.into_parts();

    let tokens: Vec<StreamEvent> = answer
        .chars()
        .map(|c| StreamEvent::Token(c.to_string()))
        .collect();

    let mut tail = Vec::with_capacity(3);
    if !sources.is_empty() {
        tail.push(StreamEvent::Sources(sources));
    }
    if !follow_ups.is_empty() {
        tail.push(StreamEvent::FollowUps(follow_ups));
    }
    tail.push(StreamEvent::Done);

    stream::iter(tokens)
        .then(move |event| async move {
            if !token_delay.is_zero() {
                tokio::time::sleep(token_delay).await;
            }
            event
        })
        .chain(stream::iter(tail))
        .boxed()
}

fn error_event(message: &str) -> BoxStream<'static, StreamEvent> {
    stream::once(future::ready(StreamEvent::Error(message.to_string()))).boxed()
}
