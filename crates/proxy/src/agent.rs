//! The agent endpoint: verify, enrich, dispatch, relay.

use crate::{
    AppState,
    error::ApiError,
    relay::{failure, relay},
    sse::RelayFrame,
};
use agent_types::{AgentError, AgentRequest, ChatProvider, CompletionRequest, ProfileLookup};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderName, header},
    response::{IntoResponse, Response},
};
use futures_util::{StreamExt as _, stream::BoxStream};
use std::{convert::Infallible, sync::Arc};

/// Identifier of the key that signed the body.
pub const KEY_ID_HEADER: &str = "x-github-public-key-identifier";
/// Base64 ECDSA signature over the raw body.
pub const SIGNATURE_HEADER: &str = "x-github-public-key-signature";
/// Optional user token; used for enrichment and as the provider credential.
pub const TOKEN_HEADER: &str = "x-github-token";

const CONTACT_FAILURE: &str = "Sorry, I encountered an error contacting the model.";
const MODEL_FAILURE: &str = "Sorry, the model returned an error.";

/// Returns a header's value, treating absent, empty and non-ASCII alike.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Handles `POST /`.
///
/// Rejections (400/401) happen before anything else runs. Once the request
/// is authenticated the response is always a 200 event stream; provider
/// failures are reported inside it.
///
/// # Errors
///
/// [`AgentError::MissingCredentials`], [`AgentError::Unauthorized`] or
/// [`AgentError::InvalidBody`], wrapped in [`ApiError`].
pub async fn handle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let (Some(key_id), Some(signature)) = (
        header_value(&headers, KEY_ID_HEADER),
        header_value(&headers, SIGNATURE_HEADER),
    ) else {
        tracing::warn!("request without signature headers");
        return Err(AgentError::MissingCredentials.into());
    };

    let outcome = state.verifier.verify(&body, key_id, signature).await;
    if !outcome.is_verified() {
        tracing::warn!(key_id, reason = %outcome, "signature verification failed");
        return Err(AgentError::Unauthorized.into());
    }

    let request: AgentRequest = serde_json::from_slice(&body)
        .map_err(|e| AgentError::InvalidBody(e.to_string()))?;

    let token = header_value(&headers, TOKEN_HEADER);
    let login = match token {
        Some(token) => enrich(state.profile.as_ref(), token).await,
        None => None,
    };

    let instruction = match &login {
        Some(login) => format!(
            "{}\n\nThe user's GitHub login is: {login}",
            state.config.system_prompt
        ),
        None => state.config.system_prompt.clone(),
    };
    let completion = CompletionRequest::new(
        state.config.llm_model.as_str(),
        &instruction,
        request.conversation_turns(),
    );
    let api_key = token
        .or_else(|| state.config.api_key())
        .map(str::to_owned);

    tracing::info!(
        key_id,
        model = %completion.model,
        turns = completion.messages.len() - 1,
        enriched = login.is_some(),
        "dispatching completion"
    );

    // Dispatch runs when the body is first polled, after the 200 is committed.
    let provider = Arc::clone(&state.provider);
    let frames = futures_util::stream::once(async move {
        dispatch(provider.as_ref(), &completion, api_key.as_deref()).await
    })
    .flatten()
    .map(|frame| Ok::<_, Infallible>(frame.into_bytes()));

    Ok(event_stream(Body::from_stream(frames)))
}

/// Looks up the caller's login, absorbing every failure.
async fn enrich(profile: &dyn ProfileLookup, token: &str) -> Option<String> {
    match profile.login(token).await {
        Ok(login) => Some(login),
        Err(e) => {
            tracing::debug!(error = %e, "profile lookup failed, continuing without it");
            None
        }
    }
}

async fn dispatch(
    provider: &dyn ChatProvider,
    request: &CompletionRequest,
    api_key: Option<&str>,
) -> BoxStream<'static, RelayFrame> {
    match provider.stream_chat(request, api_key).await {
        Ok(upstream) => relay(upstream).boxed(),
        Err(e) => {
            tracing::error!(error = %e, model = %request.model, "provider request failed");
            failure(failure_message(&e)).boxed()
        }
    }
}

fn failure_message(err: &AgentError) -> &'static str {
    match err {
        AgentError::Upstream { .. } => MODEL_FAILURE,
        _ => CONTACT_FAILURE,
    }
}

fn event_stream(body: Body) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_value_rejects_empty_and_blank() {
        let mut headers = HeaderMap::new();
        headers.insert(KEY_ID_HEADER, HeaderValue::from_static(""));
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_static("   "));
        headers.insert(TOKEN_HEADER, HeaderValue::from_static(" ghu_x "));
        assert_eq!(header_value(&headers, KEY_ID_HEADER), None);
        assert_eq!(header_value(&headers, SIGNATURE_HEADER), None);
        assert_eq!(header_value(&headers, TOKEN_HEADER), Some("ghu_x"));
        assert_eq!(header_value(&headers, "x-absent"), None);
    }

    #[test]
    fn test_failure_message_by_cause() {
        let status = AgentError::Upstream {
            status: 500,
            body: String::new(),
        };
        assert_eq!(failure_message(&status), MODEL_FAILURE);
        assert_eq!(
            failure_message(&AgentError::Http("timed out".into())),
            CONTACT_FAILURE
        );
    }
}
