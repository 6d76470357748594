// ABOUTME: LLM backend configuration: credentials, models, endpoints, and call limits
// ABOUTME: Determines which backend the coach uses, preferring Gemini over Claude
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{env_non_empty, env_parse_or, env_var_or};
use crate::constants::llm;

/// Supported advice-generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// Google Gemini (preferred; free tier)
    Gemini,
    /// Anthropic Claude
    Anthropic,
}

impl LlmProviderType {
    /// Fixed selection order
    pub const PREFERENCE: [Self; 2] = [Self::Gemini, Self::Anthropic];

    /// Environment variable holding this backend's API key
    #[must_use]
    pub const fn api_key_env_var(self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::Anthropic => "CLAUDE_API_KEY",
        }
    }
}

impl fmt::Display for LlmProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => f.write_str("gemini"),
            Self::Anthropic => f.write_str("anthropic"),
        }
    }
}

/// LLM configuration
#[derive(Clone)]
pub struct LlmConfig {
    /// Gemini API key
    pub gemini_api_key: Option<String>,
    /// Claude API key
    pub claude_api_key: Option<String>,
    /// Gemini model name
    pub gemini_model: String,
    /// Claude model name
    pub claude_model: String,
    /// Gemini API base URL
    pub gemini_base_url: String,
    /// Anthropic API base URL
    pub anthropic_base_url: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
    /// Output token ceiling for chat and insight calls
    pub max_output_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            claude_api_key: None,
            gemini_model: llm::DEFAULT_GEMINI_MODEL.to_owned(),
            claude_model: llm::DEFAULT_CLAUDE_MODEL.to_owned(),
            gemini_base_url: llm::GEMINI_BASE_URL.to_owned(),
            anthropic_base_url: llm::ANTHROPIC_BASE_URL.to_owned(),
            timeout_secs: llm::DEFAULT_TIMEOUT_SECS,
            max_output_tokens: llm::DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("claude_api_key", &self.claude_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("gemini_model", &self.gemini_model)
            .field("claude_model", &self.claude_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl LlmConfig {
    /// Load LLM configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gemini_api_key: env_non_empty(LlmProviderType::Gemini.api_key_env_var()),
            claude_api_key: env_non_empty(LlmProviderType::Anthropic.api_key_env_var()),
            gemini_model: env_var_or("GEMINI_MODEL", &defaults.gemini_model),
            claude_model: env_var_or("CLAUDE_MODEL", &defaults.claude_model),
            gemini_base_url: env_var_or("GEMINI_BASE_URL", &defaults.gemini_base_url),
            anthropic_base_url: env_var_or("ANTHROPIC_BASE_URL", &defaults.anthropic_base_url),
            timeout_secs: env_parse_or("COACH_LLM_TIMEOUT_SECS", defaults.timeout_secs),
            max_output_tokens: env_parse_or("COACH_MAX_OUTPUT_TOKENS", defaults.max_output_tokens),
        }
    }

    /// API key for a backend, if configured
    #[must_use]
    pub fn api_key(&self, provider: LlmProviderType) -> Option<&str> {
        match provider {
            LlmProviderType::Gemini => self.gemini_api_key.as_deref(),
            LlmProviderType::Anthropic => self.claude_api_key.as_deref(),
        }
    }

    /// First backend in preference order that has a key
    #[must_use]
    pub fn preferred_provider(&self) -> Option<LlmProviderType> {
        LlmProviderType::PREFERENCE
            .into_iter()
            .find(|provider| self.api_key(*provider).is_some())
    }

    /// Per-call timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_preferred_when_both_configured() {
        let config = LlmConfig {
            gemini_api_key: Some("g".to_owned()),
            claude_api_key: Some("c".to_owned()),
            ..LlmConfig::default()
        };
        assert_eq!(config.preferred_provider(), Some(LlmProviderType::Gemini));
    }

    #[test]
    fn test_claude_used_when_only_claude_configured() {
        let config = LlmConfig {
            claude_api_key: Some("c".to_owned()),
            ..LlmConfig::default()
        };
        assert_eq!(config.preferred_provider(), Some(LlmProviderType::Anthropic));
        assert_eq!(LlmConfig::default().preferred_provider(), None);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = LlmConfig {
            gemini_api_key: Some("super-secret".to_owned()),
            ..LlmConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
