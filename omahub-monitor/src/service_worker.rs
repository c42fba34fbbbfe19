//! Message contract and in-process transport between the monitor and a
//! service worker.
//!
//! A [`WorkerChannel`] is the monitor's end: it sends requests that carry a
//! one-shot reply slot and receives messages the worker posts on its own. The
//! worker holds the matching [`WorkerEndpoint`].

use crate::error::{MonitorError, Result};
use omahub_cache_core::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Requests the monitor sends to the worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerRequest {
    #[serde(rename = "GET_METRICS")]
    GetMetrics,
}

/// Messages the worker sends, spontaneously or as a reply.
///
/// Messages with an unrecognised `type` decode to [`WorkerMessage::Unknown`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "GET_METRICS")]
    Metrics(WorkerReport),
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerReport {
    pub version: String,
    /// Worker uptime in milliseconds.
    pub uptime: f64,
    pub metrics: WorkerCacheCounters,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkerCacheCounters {
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// A request in flight, waiting for the worker to answer.
#[derive(Debug)]
pub struct WorkerCall {
    request: WorkerRequest,
    reply: oneshot::Sender<WorkerMessage>,
}

impl WorkerCall {
    pub fn request(&self) -> WorkerRequest {
        self.request
    }

    /// Answers the call. Returns `false` when the requester gave up waiting.
    pub fn respond(self, message: WorkerMessage) -> bool {
        self.reply.send(message).is_ok()
    }
}

/// Monitor side of the worker link.
#[derive(Debug)]
pub struct WorkerChannel {
    calls: mpsc::Sender<WorkerCall>,
    inbox: mpsc::Receiver<WorkerMessage>,
}

impl WorkerChannel {
    /// Sends `request` and waits at most `timeout` for the reply.
    ///
    /// # Errors
    ///
    /// `WorkerUnavailable` when the endpoint is gone or dropped the call,
    /// `WorkerTimeout` when no reply came in time.
    pub async fn request(
        &self,
        request: WorkerRequest,
        timeout: Duration,
    ) -> Result<WorkerMessage> {
        let (reply, answer) = oneshot::channel();
        self.calls
            .send(WorkerCall { request, reply })
            .await
            .map_err(|_| MonitorError::WorkerUnavailable)?;

        match tokio::time::timeout(timeout, answer).await {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(_)) => Err(MonitorError::WorkerUnavailable),
            Err(_) => Err(MonitorError::WorkerTimeout(duration_ms(timeout))),
        }
    }

    /// Next spontaneous message; `None` once the endpoint is dropped.
    pub async fn recv(&mut self) -> Option<WorkerMessage> {
        self.inbox.recv().await
    }
}

/// Worker side of the link.
#[derive(Debug)]
pub struct WorkerEndpoint {
    calls: mpsc::Receiver<WorkerCall>,
    outbox: mpsc::Sender<WorkerMessage>,
}

impl WorkerEndpoint {
    /// Next request from the monitor; `None` once the channel is dropped.
    pub async fn next_call(&mut self) -> Option<WorkerCall> {
        self.calls.recv().await
    }

    /// Posts an unsolicited message to the monitor.
    pub async fn post(&self, message: WorkerMessage) -> Result<()> {
        self.outbox
            .send(message)
            .await
            .map_err(|_| MonitorError::WorkerUnavailable)
    }
}

/// Creates a connected channel/endpoint pair; `buffer` bounds each direction.
pub fn worker_channel(buffer: usize) -> (WorkerChannel, WorkerEndpoint) {
    let (call_tx, call_rx) = mpsc::channel(buffer.max(1));
    let (msg_tx, msg_rx) = mpsc::channel(buffer.max(1));
    (
        WorkerChannel {
            calls: call_tx,
            inbox: msg_rx,
        },
        WorkerEndpoint {
            calls: call_rx,
            outbox: msg_tx,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> WorkerMessage {
        WorkerMessage::Metrics(WorkerReport {
            version: "sw-2.1.0".to_string(),
            uptime: 42_000.0,
            metrics: WorkerCacheCounters {
                cache_hits: 9,
                cache_misses: 3,
            },
        })
    }

    #[test]
    fn test_request_wire_shape() {
        let json = serde_json::to_value(WorkerRequest::GetMetrics).unwrap();
        assert_eq!(json, json!({"type": "GET_METRICS"}));
    }

    #[test]
    fn test_message_wire_shape() {
        let raw = json!({
            "type": "GET_METRICS",
            "version": "sw-2.1.0",
            "uptime": 42000,
            "metrics": {"cacheHits": 9, "cacheMisses": 3}
        });
        let message: WorkerMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(message, report());
    }

    #[test]
    fn test_unknown_message_type() {
        let message: WorkerMessage =
            serde_json::from_str(r#"{"type":"SKIP_WAITING","payload":1}"#).unwrap();
        assert_eq!(message, WorkerMessage::Unknown);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (channel, mut endpoint) = worker_channel(4);
        let worker = tokio::spawn(async move {
            let call = endpoint.next_call().await.unwrap();
            assert_eq!(call.request(), WorkerRequest::GetMetrics);
            assert!(call.respond(report()));
        });

        let answer = channel
            .request(WorkerRequest::GetMetrics, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(answer, report());
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_times_out() {
        let (channel, _endpoint) = worker_channel(4);
        let err = channel
            .request(WorkerRequest::GetMetrics, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::WorkerTimeout(50)));
    }

    #[tokio::test]
    async fn test_dropped_endpoint_is_unavailable() {
        let (mut channel, endpoint) = worker_channel(1);
        drop(endpoint);
        let err = channel
            .request(WorkerRequest::GetMetrics, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::WorkerUnavailable));
        assert!(channel.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_spontaneous_post() {
        let (mut channel, endpoint) = worker_channel(1);
        endpoint.post(report()).await.unwrap();
        assert_eq!(channel.recv().await, Some(report()));
    }
}
