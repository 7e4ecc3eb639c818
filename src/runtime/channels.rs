//! Event pipe between a producer task and its consumer
//!
//! Every agent call hands back an `AgentEventStream`. The producing side
//! holds an `EventSender`; the pipe closes once every sender is gone and
//! the consumer then sees `None` after draining what was buffered.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

use crate::core::{AgentEvent, FrameworkError, FrameworkResult};

/// Default buffer size for an event pipe
pub const EVENT_PIPE_SIZE: usize = 64;

/// Create an event pipe with the default buffer size
pub fn event_pipe() -> (AgentEventStream, EventSender) {
    event_pipe_with_capacity(EVENT_PIPE_SIZE)
}

/// Create an event pipe buffering at most `capacity` events
pub fn event_pipe_with_capacity(capacity: usize) -> (AgentEventStream, EventSender) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (AgentEventStream { rx }, EventSender { tx })
}

/// Producer half of an event pipe
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<AgentEvent>,
}

impl EventSender {
    /// Send an event, waiting while the buffer is full
    ///
    /// Fails with `ChannelClosed` once the consumer is gone.
    pub async fn send(&self, event: AgentEvent) -> FrameworkResult<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| FrameworkError::ChannelClosed)
    }

    /// Check whether the consumer has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Give up this sender; the pipe closes when the last one is gone
    pub fn close(self) {}
}

/// Consumer half of an event pipe
#[derive(Debug)]
pub struct AgentEventStream {
    rx: mpsc::Receiver<AgentEvent>,
}

impl AgentEventStream {
    /// A stream yielding `events` and then ending
    pub fn from_events(events: Vec<AgentEvent>) -> Self {
        let (stream, tx) = event_pipe_with_capacity(events.len());
        for event in events {
            // Capacity covers every event, so this never hits a full buffer
            let _ = tx.tx.try_send(event);
        }
        stream
    }

    /// A stream yielding one error event and then ending
    pub fn from_error(agent_name: impl Into<String>, err: FrameworkError) -> Self {
        Self::from_events(vec![AgentEvent::error(agent_name, err)])
    }

    /// Pump any event stream through a pipe
    ///
    /// Spawns a task, so this must be called inside a tokio runtime.
    pub fn from_stream<S>(source: S) -> Self
    where
        S: Stream<Item = AgentEvent> + Send + 'static,
    {
        let (stream, tx) = event_pipe();
        tokio::spawn(async move {
            futures::pin_mut!(source);
            while let Some(event) = source.next().await {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
        stream
    }

    /// Receive the next event; `None` once closed and drained
    pub async fn next(&mut self) -> Option<AgentEvent> {
        self.rx.recv().await
    }

    /// Drain the stream to its end
    pub async fn collect_all(mut self) -> Vec<AgentEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        events
    }
}

impl Stream for AgentEventStream {
    type Item = AgentEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
