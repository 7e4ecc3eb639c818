//! Producer tasks
//!
//! Each `run`/`resume` call drives its work on one tokio task that writes
//! into an event pipe. The task body runs behind a panic boundary: an
//! `Err` or a panic becomes one error event, after which the pipe closes.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use super::channels::{event_pipe, AgentEventStream, EventSender};
use crate::core::{AgentEvent, FrameworkError, FrameworkResult};
use crate::session::{format_run_path, RunStep};

/// Spawn `body` as the producer of a new event stream
pub fn spawn_producer<F, Fut>(
    agent_name: impl Into<String>,
    run_path: Vec<RunStep>,
    body: F,
) -> AgentEventStream
where
    F: FnOnce(EventSender) -> Fut + Send + 'static,
    Fut: Future<Output = FrameworkResult<()>> + Send + 'static,
{
    let (stream, tx) = event_pipe();
    let agent_name = agent_name.into();

    tokio::spawn(async move {
        let body_tx = tx.clone();
        let outcome = AssertUnwindSafe(async move { body(body_tx).await })
            .catch_unwind()
            .await;

        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(panic) => Some(FrameworkError::Panic(panic_message(panic.as_ref()))),
        };

        if let Some(err) = failure {
            tracing::error!(
                agent = %agent_name,
                run_path = %format_run_path(&run_path),
                error = %err,
                "Producer failed"
            );
            let mut event = AgentEvent::error(agent_name.clone(), err);
            event.run_path = run_path;
            // The consumer may already be gone
            let _ = tx.send(event).await;
        }

        tx.close();
        tracing::debug!(agent = %agent_name, "Producer finished");
    });

    stream
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
