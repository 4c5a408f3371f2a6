use async_trait::async_trait;
use axum::http::Method;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::pipeline::{Contribution, PipelineRequest, Stage};

/// Correlation stage: assigns a fresh opaque trace id to every request and
/// logs one line with method, path and trace id. Cannot fail.
pub struct Trace;

#[async_trait]
impl Stage for Trace {
    async fn handle(&self, request: &PipelineRequest) -> Result<Contribution, ApiError> {
        let trace_id = Uuid::new_v4().to_string();

        // The root liveness probe is polled constantly; keep it out of the logs.
        if !(request.method == Method::GET && request.path == "/") {
            tracing::info!(
                method = %request.method,
                path = %request.path,
                trace_id = %trace_id,
                "request received"
            );
        }

        let mut contribution = Contribution::new();
        contribution.insert("traceId".to_string(), Value::String(trace_id));
        Ok(contribution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Locals;
    use std::sync::{Arc, Mutex};
    use tracing::instrument::WithSubscriber;

    fn request(path: &str) -> PipelineRequest {
        request_with_method(Method::GET, path)
    }

    fn request_with_method(method: Method, path: &str) -> PipelineRequest {
        PipelineRequest {
            method,
            path: path.to_string(),
            authorization: None,
            access_token: None,
            locals: Locals::default(),
        }
    }

    /// Captures formatted log output for assertions.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }

        fn dispatch(&self) -> tracing::Dispatch {
            tracing::Dispatch::new(
                tracing_subscriber::fmt()
                    .with_writer(self.clone())
                    .with_ansi(false)
                    .finish(),
            )
        }
    }

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn contributes_a_parseable_trace_id() {
        let contribution = Trace.handle(&request("/api/v1/health")).await.unwrap();
        let id = contribution.get("traceId").unwrap().as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn trace_ids_are_unique_per_invocation() {
        let a = Trace.handle(&request("/a")).await.unwrap();
        let b = Trace.handle(&request("/a")).await.unwrap();
        assert_ne!(a.get("traceId"), b.get("traceId"));
    }

    #[tokio::test]
    async fn root_probe_emits_no_log_line() {
        let capture = Capture::default();

        Trace
            .handle(&request("/"))
            .with_subscriber(capture.dispatch())
            .await
            .unwrap();

        assert_eq!(capture.contents(), "");
    }

    #[tokio::test]
    async fn other_requests_log_method_path_and_trace_id() {
        let capture = Capture::default();

        let contribution = Trace
            .handle(&request("/api/v1/health"))
            .with_subscriber(capture.dispatch())
            .await
            .unwrap();

        let logged = capture.contents();
        assert!(logged.contains("request received"), "got: {}", logged);
        assert!(logged.contains("/api/v1/health"));
        assert!(logged.contains(contribution.get("traceId").unwrap().as_str().unwrap()));
    }

    #[tokio::test]
    async fn only_get_is_suppressed_at_the_root_path() {
        let capture = Capture::default();

        Trace
            .handle(&request_with_method(Method::POST, "/"))
            .with_subscriber(capture.dispatch())
            .await
            .unwrap();

        assert!(capture.contents().contains("request received"));
    }
}
