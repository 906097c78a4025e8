//! GitHub user profile lookup.

use crate::http_util::ProviderHttp;
use agent_types::{AgentError, ProfileLookup, traits::Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct UserProfile {
    #[serde(default)]
    login: Option<String>,
}

/// Resolves a user token to a GitHub login via `GET /user`.
pub struct GitHubProfile {
    http: ProviderHttp,
    url: String,
    user_agent: String,
    timeout: Duration,
}

impl GitHubProfile {
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
impl ProfileLookup for GitHubProfile {
    async fn login(&self, token: &str) -> Result<String> {
        let builder = self
            .http
            .client()
            .get(&self.url)
            .bearer_auth(token)
            .header("user-agent", &self.user_agent)
            .header("accept", "application/vnd.github+json")
            .timeout(self.timeout);

        let resp = self.http.send(builder).await?;
        let status = resp.status().as_u16();
        let profile: UserProfile = resp.json().await?;
        match profile.login {
            Some(login) if !login.is_empty() => Ok(login),
            _ => Err(AgentError::Upstream {
                status,
                body: "profile has no login".into(),
            }),
        }
    }
}
