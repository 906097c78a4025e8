//! Outbound HTTP collaborators of the agent.
//!
//! [`OpenAiProvider`] implements [`ChatProvider`](agent_types::ChatProvider)
//! for OpenAI-compatible completion endpoints, and [`GitHubProfile`]
//! implements [`ProfileLookup`](agent_types::ProfileLookup) against the
//! GitHub REST API.

pub mod http_util;
pub mod openai;
pub mod profile;

pub use http_util::ProviderHttp;
pub use openai::OpenAiProvider;
pub use profile::GitHubProfile;
