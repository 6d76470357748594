// ABOUTME: Unified LLM provider selector choosing Gemini or Claude from configuration
// ABOUTME: Selection order is fixed; a failed call never fails over to the other backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LLM Provider Selector
//!
//! Gemini is chosen when `GEMINI_API_KEY` is set, otherwise Claude when
//! `CLAUDE_API_KEY` is set. Adding a backend means adding a variant and an
//! adapter; callers only see [`LlmProvider`].

use async_trait::async_trait;
use tracing::{info, warn};

use super::{
    AnthropicProvider, ChatRequest, ChatResponse, GeminiProvider, LlmProvider, ProviderSettings,
};
use crate::config::{LlmConfig, LlmProviderType};
use crate::errors::AppError;

/// Unified chat provider that wraps Gemini or Claude
#[derive(Debug)]
pub enum ChatProvider {
    /// Google Gemini provider
    Gemini(GeminiProvider),
    /// Anthropic Claude provider
    Anthropic(AnthropicProvider),
}

impl ChatProvider {
    /// Create the preferred configured provider
    ///
    /// Returns `Ok(None)` when no backend has a key; the coach then rejects
    /// generation requests with a configuration error.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for the selected backend cannot be built
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, AppError> {
        let Some(provider_type) = config.preferred_provider() else {
            warn!("No AI API key configured; the coach will not be able to generate responses");
            return Ok(None);
        };

        let provider = Self::create(provider_type, config)?;
        info!(
            provider = provider.display_name(),
            model = provider.default_model(),
            "LLM provider initialized"
        );
        Ok(Some(provider))
    }

    /// Create a specific provider
    ///
    /// # Errors
    ///
    /// Returns an error if the backend has no key or its HTTP client cannot be built
    pub fn create(provider_type: LlmProviderType, config: &LlmConfig) -> Result<Self, AppError> {
        let api_key = config.api_key(provider_type).ok_or_else(|| {
            AppError::config_missing(format!(
                "{} is not set",
                provider_type.api_key_env_var()
            ))
        })?;

        let (base_url, model) = match provider_type {
            LlmProviderType::Gemini => (&config.gemini_base_url, &config.gemini_model),
            LlmProviderType::Anthropic => (&config.anthropic_base_url, &config.claude_model),
        };
        let settings = ProviderSettings {
            api_key: api_key.to_owned(),
            base_url: base_url.clone(),
            model: model.clone(),
            timeout: config.timeout(),
            max_output_tokens: config.max_output_tokens,
        };

        Ok(match provider_type {
            LlmProviderType::Gemini => Self::Gemini(GeminiProvider::new(settings)?),
            LlmProviderType::Anthropic => Self::Anthropic(AnthropicProvider::new(settings)?),
        })
    }

    /// Which backend this is
    #[must_use]
    pub const fn provider_type(&self) -> LlmProviderType {
        match self {
            Self::Gemini(_) => LlmProviderType::Gemini,
            Self::Anthropic(_) => LlmProviderType::Anthropic,
        }
    }
}

#[async_trait]
impl LlmProvider for ChatProvider {
    fn name(&self) -> &'static str {
        match self {
            Self::Gemini(p) => p.name(),
            Self::Anthropic(p) => p.name(),
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini(p) => p.display_name(),
            Self::Anthropic(p) => p.display_name(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Self::Gemini(p) => p.default_model(),
            Self::Anthropic(p) => p.default_model(),
        }
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        match self {
            Self::Gemini(p) => p.complete(request).await,
            Self::Anthropic(p) => p.complete(request).await,
        }
    }
}
