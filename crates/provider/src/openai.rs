//! OpenAI-compatible chat completions provider.
//!
//! Posts a streaming request to `{base}/chat/completions` and hands back the
//! raw SSE body. Works with GitHub Models, OpenAI itself, and anything else
//! speaking the same protocol.

use crate::http_util::ProviderHttp;
use agent_types::{
    ChatProvider, CompletionRequest,
    traits::{ByteStream, Result},
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Streams completions from an OpenAI-compatible endpoint.
pub struct OpenAiProvider {
    http: ProviderHttp,
    url: String,
    user_agent: String,
    timeout: Duration,
}

impl OpenAiProvider {
    /// `url` is the full completions endpoint. `timeout` bounds the wait for
    /// the response head and then each gap between body chunks.
    pub fn new(
        http: Client,
        url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http: ProviderHttp::new(http),
            url: url.into(),
            user_agent: user_agent.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn stream_chat(
        &self,
        request: &CompletionRequest,
        api_key: Option<&str>,
    ) -> Result<ByteStream> {
        let mut builder = self
            .http
            .client()
            .post(&self.url)
            .header("user-agent", &self.user_agent)
            .header("accept", "text/event-stream")
            .json(request);
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let resp = self.http.send_within(builder, self.timeout).await?;
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "provider accepted completion request"
        );
        Ok(ProviderHttp::idle_bounded_stream(resp, self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_types::AgentError;
    use axum::{
        Json, Router,
        body::Body,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use futures_util::{StreamExt as _, TryStreamExt as _, stream};
    use serde_json::{Value, json};
    use std::{
        convert::Infallible,
        sync::{Arc, Mutex},
    };

    #[derive(Default)]
    struct Seen {
        auth: Option<String>,
        body: Option<Value>,
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/chat/completions")
    }

    fn recording_app(seen: Arc<Mutex<Seen>>) -> Router {
        Router::new().route(
            "/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let seen = Arc::clone(&seen);
                async move {
                    let mut s = seen.lock().unwrap();
                    s.auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(String::from);
                    s.body = Some(body);
                    "data: {\"choices\":[]}\n\ndata: [DONE]\n\n"
                }
            }),
        )
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("gpt-4o", "be brief", vec![json!({"role": "user", "content": "hi"})])
    }

    fn provider(url: String) -> OpenAiProvider {
        OpenAiProvider::new(Client::new(), url, "agent-test", Duration::from_secs(2))
    }

    async fn collect(stream: ByteStream) -> String {
        let chunks: Vec<_> = stream.try_collect().await.unwrap();
        String::from_utf8(chunks.concat()).unwrap()
    }

    #[tokio::test]
    async fn test_posts_streaming_request_with_bearer_key() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let url = serve(recording_app(Arc::clone(&seen))).await;

        let stream = provider(url).stream_chat(&request(), Some("ghu_abc")).await.unwrap();
        assert!(collect(stream).await.ends_with("data: [DONE]\n\n"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.auth.as_deref(), Some("Bearer ghu_abc"));
        let body = seen.body.as_ref().unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[tokio::test]
    async fn test_no_key_sends_no_authorization() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let url = serve(recording_app(Arc::clone(&seen))).await;

        provider(url.clone()).stream_chat(&request(), None).await.unwrap();
        assert!(seen.lock().unwrap().auth.is_none());

        provider(url).stream_chat(&request(), Some("")).await.unwrap();
        assert!(seen.lock().unwrap().auth.is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_upstream() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let url = serve(app).await;
        let err = provider(url).stream_chat(&request(), None).await.err().unwrap();
        assert!(matches!(err, AgentError::Upstream { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_stalled_stream_ends_with_error() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async {
                let first = stream::iter([Ok::<_, Infallible>(
                    "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
                )]);
                Body::from_stream(first.chain(stream::pending()))
            }),
        );
        let url = serve(app).await;
        let provider =
            OpenAiProvider::new(Client::new(), url, "agent-test", Duration::from_millis(300));
        let mut stream = provider.stream_chat(&request(), None).await.unwrap();

        assert!(stream.next().await.unwrap().is_ok());
        let stalled = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("provider stall must be cut off by the idle limit");
        assert!(matches!(stalled, Some(Err(AgentError::Http(_)))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_is_http_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = provider(format!("http://{addr}/chat/completions"))
            .stream_chat(&request(), None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AgentError::Http(_)));
    }
}
