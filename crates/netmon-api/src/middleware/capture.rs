//! Response body decorator that records what the client was sent.
//!
//! `CaptureBody` forwards every frame untouched and copies data frames into
//! a bounded buffer. The audit event is emitted exactly once, at whichever
//! comes first: end of stream, a body error, or the body being dropped
//! unfinished (client disconnect, or a body that was never polled).

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use chrono::Utc;
use http_body::{Body, Frame, SizeHint};

use netmon_audit::AuditPipeline;
use netmon_core::{AuditEvent, AuditEventId};

use crate::observability;

/// Everything known about a request before its response body is sent.
#[derive(Debug, Clone)]
pub struct PendingEvent {
    pub subject: String,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub request_body: serde_json::Value,
    pub response_status: u16,
    pub client_address: Option<String>,
    pub user_agent: Option<String>,
    /// Route template for metrics labels, when the request matched one.
    pub route: Option<String>,
    pub started: Instant,
}

impl PendingEvent {
    fn complete(self, response_body: String, truncated: bool) -> AuditEvent {
        AuditEvent {
            id: AuditEventId::new(),
            timestamp: Utc::now(),
            subject: self.subject,
            method: self.method,
            path: self.path,
            query: self.query,
            request_body: self.request_body,
            response_status: self.response_status,
            response_body,
            response_body_truncated: truncated,
            client_address: self.client_address,
            user_agent: self.user_agent,
            duration_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

pub struct CaptureBody<B> {
    inner: B,
    captured: Vec<u8>,
    limit: usize,
    truncated: bool,
    pending: Option<PendingEvent>,
    pipeline: AuditPipeline,
}

impl<B> CaptureBody<B> {
    pub fn new(inner: B, limit: usize, pending: PendingEvent, pipeline: AuditPipeline) -> Self {
        Self {
            inner,
            captured: Vec::new(),
            limit,
            truncated: false,
            pending: Some(pending),
            pipeline,
        }
    }

    fn capture(&mut self, data: &Bytes) {
        let room = self.limit.saturating_sub(self.captured.len());
        if data.len() > room {
            self.truncated = true;
        }
        let take = data.len().min(room);
        self.captured.extend_from_slice(&data[..take]);
    }

    fn finish(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let route = pending.route.clone().unwrap_or_else(|| "unmatched".to_string());
        let body = String::from_utf8_lossy(&std::mem::take(&mut self.captured)).into_owned();
        let event = pending.complete(body, self.truncated);

        observability::record_request(&event.method, &route, event.response_status);
        self.pipeline.emit(&event);
    }
}

impl<B> Body for CaptureBody<B>
where
    B: Body<Data = Bytes> + Unpin,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.capture(data);
                }
                if this.inner.is_end_stream() {
                    this.finish();
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.finish();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> Drop for CaptureBody<B> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::to_bytes;
    use netmon_audit::AuditRing;
    use netmon_core::ANONYMOUS_SUBJECT;

    fn pending() -> PendingEvent {
        PendingEvent {
            subject: ANONYMOUS_SUBJECT.to_string(),
            method: "GET".to_string(),
            path: "/devices".to_string(),
            query: None,
            request_body: serde_json::Value::Null,
            response_status: 200,
            client_address: None,
            user_agent: None,
            route: Some("/devices".to_string()),
            started: Instant::now(),
        }
    }

    fn capture(inner: axum::body::Body, limit: usize) -> (axum::body::Body, Arc<AuditRing>) {
        let ring = Arc::new(AuditRing::new(10));
        let pipeline = AuditPipeline::new().with_sink(ring.clone());
        let body = CaptureBody::new(inner, limit, pending(), pipeline);
        (axum::body::Body::new(body), ring)
    }

    #[tokio::test]
    async fn forwards_and_records_body() {
        let (body, ring) = capture(axum::body::Body::from("[1,2,3]"), 1024);

        let sent = to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&sent[..], b"[1,2,3]");

        let events = ring.newest_first();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].response_body, "[1,2,3]");
        assert!(!events[0].response_body_truncated);
    }

    #[tokio::test]
    async fn truncates_capture_but_not_the_stream() {
        let payload = "x".repeat(100);
        let (body, ring) = capture(axum::body::Body::from(payload.clone()), 10);

        let sent = to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(sent.len(), 100);

        let event = &ring.newest_first()[0];
        assert_eq!(event.response_body, "x".repeat(10));
        assert!(event.response_body_truncated);
    }

    #[tokio::test]
    async fn dropped_body_still_emits_once() {
        let (body, ring) = capture(axum::body::Body::from("never read"), 1024);
        drop(body);

        let events = ring.newest_first();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].response_body, "");
    }

    /// Yields its chunks one frame at a time, returning `Pending` before
    /// each one the way a handler streaming its output would.
    struct Chunked {
        chunks: std::collections::VecDeque<&'static str>,
        ready: bool,
    }

    impl Body for Chunked {
        type Data = Bytes;
        type Error = std::convert::Infallible;

        fn poll_frame(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
            if !self.ready {
                self.ready = true;
                cx.waker().wake_by_ref();
                return Poll::Pending;
            }
            self.ready = false;
            Poll::Ready(
                self.chunks
                    .pop_front()
                    .map(|chunk| Ok(Frame::data(Bytes::from_static(chunk.as_bytes())))),
            )
        }
    }

    #[tokio::test]
    async fn multi_frame_body_is_forwarded_and_captured_whole() {
        let ring = Arc::new(AuditRing::new(10));
        let pipeline = AuditPipeline::new().with_sink(ring.clone());
        let inner = Chunked {
            chunks: ["ab", "cd", "ef"].into_iter().collect(),
            ready: false,
        };
        let mut body = CaptureBody::new(inner, 1024, pending(), pipeline);

        let mut sent = Vec::new();
        let mut frames = 0;
        while let Some(frame) = std::future::poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await {
            let frame = frame.unwrap();
            sent.extend_from_slice(frame.data_ref().unwrap());
            frames += 1;
            if frames < 3 {
                assert!(ring.is_empty(), "event emitted before the stream ended");
            }
        }

        assert_eq!(frames, 3);
        assert_eq!(sent, b"abcdef");
        let events = ring.newest_first();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].response_body, "abcdef");
        assert!(!events[0].response_body_truncated);

        drop(body);
        assert_eq!(ring.len(), 1);
    }

    #[tokio::test]
    async fn multi_frame_truncation_spans_frames() {
        let ring = Arc::new(AuditRing::new(10));
        let pipeline = AuditPipeline::new().with_sink(ring.clone());
        let inner = Chunked {
            chunks: ["abc", "def", "ghi"].into_iter().collect(),
            ready: false,
        };
        let body = axum::body::Body::new(CaptureBody::new(inner, 5, pending(), pipeline));

        let sent = to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&sent[..], b"abcdefghi");

        let event = &ring.newest_first()[0];
        assert_eq!(event.response_body, "abcde");
        assert!(event.response_body_truncated);
    }

    #[tokio::test]
    async fn empty_body_emits_once() {
        let (body, ring) = capture(axum::body::Body::empty(), 1024);
        let sent = to_bytes(body, usize::MAX).await.unwrap();
        assert!(sent.is_empty());
        assert_eq!(ring.len(), 1);
    }
}
