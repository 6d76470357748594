// ABOUTME: LLM provider abstraction for the coach's advice-generation backends
// ABOUTME: Defines the neutral turn format, request/response types, and the provider trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LLM Provider Gateway
//!
//! Every backend implements [`LlmProvider`]: it accepts role-tagged turns plus
//! a system instruction and returns text. Adapters own the translation to and
//! from their wire schema, including backend-specific role tokens.
//!
//! Failures come in two kinds that callers can tell apart:
//!
//! - **unreachable** (`ExternalServiceUnavailable`): connect failure or the
//!   backend-call timeout elapsed
//! - **rejected** (`ExternalServiceError`): the backend answered with a
//!   non-success status, carried in the error details
//!
//! There is no failover between backends inside a call.
//!
//! ## Example
//!
//! ```rust,no_run
//! use korsana_coach::config::LlmConfig;
//! use korsana_coach::llm::{ChatMessage, ChatProvider, ChatRequest, LlmProvider};
//!
//! # async fn example() -> Result<(), korsana_coach::errors::AppError> {
//! if let Some(provider) = ChatProvider::from_config(&LlmConfig::from_env())? {
//!     let request = ChatRequest::new(vec![ChatMessage::user("How should I taper?")])
//!         .with_system_prompt("You are a running coach.");
//!     let response = provider.complete(&request).await?;
//!     println!("{}", response.content);
//! }
//! # Ok(())
//! # }
//! ```

mod anthropic;
mod gemini;
pub mod prompts;
mod provider;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use provider::ChatProvider;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult, ErrorCode};

// ============================================================================
// Message Types
// ============================================================================

/// Role of a conversation turn
///
/// Closed at the core boundary; backend-specific tokens (such as Gemini's
/// `model`) exist only inside adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The runner
    User,
    /// The coach
    Assistant,
}

impl MessageRole {
    /// Stored and wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(AppError::invalid_input(format!(
                "Unknown message role: {other}"
            ))),
        }
    }
}

/// A single turn in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A generation request in the neutral format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation turns, oldest first
    pub messages: Vec<ChatMessage>,
    /// System instruction
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate (provider default when absent)
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Create a new chat request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            system_prompt: None,
            max_tokens: None,
        }
    }

    /// Set the system instruction
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from a generation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated text
    pub content: String,
    /// Model used for generation
    pub model: String,
    /// Token usage statistics
    pub usage: Option<TokenUsage>,
    /// Finish reason reported by the backend
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

/// Connection settings shared by every adapter
#[derive(Clone)]
pub struct ProviderSettings {
    /// Backend credential
    pub api_key: String,
    /// API base URL (overridable for tests and proxies)
    pub base_url: String,
    /// Default model
    pub model: String,
    /// Backend-call timeout
    pub timeout: Duration,
    /// Default output token ceiling
    pub max_output_tokens: u32,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// An advice-generation backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Unique provider identifier (e.g., "gemini", "anthropic")
    fn name(&self) -> &'static str;

    /// Human-readable display name for the provider
    fn display_name(&self) -> &'static str;

    /// Model every request is sent to
    fn default_model(&self) -> &str;

    /// Generate a reply for the conversation
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError>;
}

// ============================================================================
// Shared HTTP helpers
// ============================================================================

/// Build the HTTP client an adapter uses; the timeout bounds the whole call
pub(crate) fn build_http_client(settings: &ProviderSettings) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(settings.timeout)
        .build()
        .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))
}

/// Map a transport failure to the unreachable kind
///
/// The URL is stripped because Gemini carries its key in the query string.
pub(crate) fn transport_error(provider: &str, error: reqwest::Error) -> AppError {
    let kind = if error.is_timeout() {
        "timed out"
    } else if error.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    AppError::upstream_unreachable(provider, format!("{kind}: {}", error.without_url()))
}

/// A 2xx response whose body does not contain usable text
pub(crate) fn empty_response_error(provider: &str, reason: impl Into<String>) -> AppError {
    AppError::new(
        ErrorCode::ExternalServiceError,
        format!("No usable response from {provider}: {}", reason.into()),
    )
    .with_details(serde_json::json!({ "provider": provider }))
}
