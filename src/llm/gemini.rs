// ABOUTME: Google Gemini provider implementation over the generateContent REST endpoint
// ABOUTME: Remaps the assistant role to Gemini's "model" token and sends the system instruction separately
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Gemini Provider
//!
//! Implementation of the `LlmProvider` trait for Google's Gemini models.
//! Set `GEMINI_API_KEY` with a key from Google AI Studio. Gemini is the
//! preferred backend because of its free tier.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{
    build_http_client, empty_response_error, transport_error, ChatMessage, ChatRequest,
    ChatResponse, LlmProvider, MessageRole, ProviderSettings, TokenUsage,
};
use crate::errors::{AppError, AppResult};

const PROVIDER_NAME: &str = "gemini";

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
    total_token_count: Option<u32>,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Google Gemini LLM provider
pub struct GeminiProvider {
    settings: ProviderSettings,
    client: Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(settings: ProviderSettings) -> AppResult<Self> {
        let client = build_http_client(&settings)?;
        Ok(Self { settings, client })
    }

    /// Gemini's role token for a neutral role
    const fn convert_role(role: MessageRole) -> &'static str {
        match role {
            MessageRole::User => "user",
            MessageRole::Assistant => "model",
        }
    }

    fn text_content(role: Option<&str>, text: &str) -> GeminiContent {
        GeminiContent {
            role: role.map(str::to_owned),
            parts: vec![GeminiPart {
                text: Some(text.to_owned()),
            }],
        }
    }

    fn build_request(&self, request: &ChatRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .map(|message: &ChatMessage| {
                Self::text_content(Some(Self::convert_role(message.role)), &message.content)
            })
            .collect();

        GeminiRequest {
            contents,
            system_instruction: request
                .system_prompt
                .as_deref()
                .map(|prompt| Self::text_content(None, prompt)),
            generation_config: GenerationConfig {
                max_output_tokens: request
                    .max_tokens
                    .unwrap_or(self.settings.max_output_tokens),
            },
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/models/{model}:generateContent",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    /// Concatenate the text parts of the first candidate
    fn extract_content(response: &GeminiResponse) -> AppResult<String> {
        let parts = response
            .candidates
            .as_ref()
            .and_then(|candidates| candidates.first())
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default();

        let text: String = parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.is_empty() {
            return Err(empty_response_error(PROVIDER_NAME, "no candidate text"));
        }
        Ok(text)
    }

    fn convert_usage(metadata: &UsageMetadata) -> TokenUsage {
        TokenUsage {
            prompt_tokens: metadata.prompt_token_count.unwrap_or(0),
            completion_tokens: metadata.candidates_token_count.unwrap_or(0),
            total_tokens: metadata.total_token_count.unwrap_or(0),
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn display_name(&self) -> &'static str {
        "Google Gemini"
    }

    fn default_model(&self) -> &str {
        &self.settings.model
    }

    #[instrument(skip(self, request), fields(model = %self.settings.model, turns = request.messages.len()))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = self.settings.model.as_str();
        let body = self.build_request(request);

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(self.generate_url(model))
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER_NAME, e))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| transport_error(PROVIDER_NAME, e))?;

        if !status.is_success() {
            error!(status = %status, body = %response_text, "Gemini API returned an error status");
            return Err(AppError::upstream_rejected(PROVIDER_NAME, status.as_u16()));
        }

        let gemini_response: GeminiResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                error!(error = %e, "Failed to decode Gemini response");
                empty_response_error(PROVIDER_NAME, format!("undecodable body: {e}"))
            })?;

        let content = Self::extract_content(&gemini_response)?;
        let finish_reason = gemini_response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.finish_reason.clone());

        debug!(chars = content.len(), "Received Gemini response");

        Ok(ChatResponse {
            content,
            model: model.to_owned(),
            usage: gemini_response
                .usage_metadata
                .as_ref()
                .map(Self::convert_usage),
            finish_reason,
        })
    }
}

impl Debug for GeminiProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiProvider")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
