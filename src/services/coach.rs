// ABOUTME: Coach orchestration: quota admission, context assembly, backend dispatch, persistence
// ABOUTME: Implements send-message, insight, plan generation, and history for the HTTP layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::constants::limits::{
    CONTEXT_HISTORY_TURNS, DEFAULT_HISTORY_LIMIT, DEFAULT_PLAN_DAYS, MAX_MESSAGE_CHARS,
    MAX_PLAN_DAYS,
};
use crate::constants::llm::PLAN_MAX_OUTPUT_TOKENS;
use crate::context::ContextBuilder;
use crate::database::{CalendarStore, ConversationStore, Database};
use crate::errors::{AppError, AppResult};
use crate::llm::{prompts, ChatMessage, ChatProvider, ChatRequest, LlmProvider, MessageRole};
use crate::models::{ConversationTurn, PlanResponse, PlanWriteReport};
use crate::plan::{parse_plan, PlanWriter};
use crate::quota::{
    CounterStore, InMemoryCounterStore, QuotaEnforcer, QuotaUsage, RedisCounterStore,
};

/// Reply to a coach message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachReply {
    /// Assistant text
    pub response: String,
    /// Model that produced it
    pub model: String,
}

/// Result of a plan request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    /// Number of days that were requested after normalization
    pub days: u32,
    /// The decoded plan
    pub plan: PlanResponse,
    /// Calendar write outcome; `None` when the plan was not confirmed
    pub write_report: Option<PlanWriteReport>,
}

/// Plan length after normalization: out-of-range requests get the default
#[must_use]
pub fn normalize_plan_days(days: u32) -> u32 {
    if (1..=MAX_PLAN_DAYS).contains(&days) {
        days
    } else {
        DEFAULT_PLAN_DAYS
    }
}

/// Coach service
///
/// Every generation path runs in the same order: backend configured, quota
/// admission, context assembly, backend call. Quota is charged at admission,
/// so a failed generation still counts.
#[derive(Clone)]
pub struct CoachService {
    provider: Option<Arc<dyn LlmProvider>>,
    quota: QuotaEnforcer,
    context: ContextBuilder,
    conversations: Arc<dyn ConversationStore>,
    plan_writer: PlanWriter,
}

impl CoachService {
    /// Create a service from its collaborators
    #[must_use]
    pub fn new(
        provider: Option<Arc<dyn LlmProvider>>,
        quota: QuotaEnforcer,
        context: ContextBuilder,
        conversations: Arc<dyn ConversationStore>,
        calendar: Arc<dyn CalendarStore>,
    ) -> Self {
        Self {
            provider,
            quota,
            context,
            conversations,
            plan_writer: PlanWriter::new(calendar),
        }
    }

    /// Wire the service from configuration and an open database
    ///
    /// Uses Redis counters when `REDIS_URL` is set, in-process counters otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if Redis is configured but unreachable, or the LLM
    /// client cannot be built
    pub async fn from_config(config: &ServerConfig, database: &Database) -> AppResult<Self> {
        let store: Arc<dyn CounterStore> = match &config.redis_url {
            Some(url) => Arc::new(RedisCounterStore::connect(url, &config.redis).await?),
            None => {
                warn!("REDIS_URL not set; quota counters are local to this process");
                Arc::new(InMemoryCounterStore::new())
            }
        };

        let provider = ChatProvider::from_config(&config.llm)?
            .map(|provider| Arc::new(provider) as Arc<dyn LlmProvider>);

        let training = Arc::new(database.training());
        let calendar: Arc<dyn CalendarStore> = Arc::new(database.calendar());

        Ok(Self::new(
            provider,
            QuotaEnforcer::new(store, config.quota.clone()),
            ContextBuilder::new(training, Arc::clone(&calendar)),
            Arc::new(database.conversations()),
            calendar,
        ))
    }

    /// The quota enforcer in use
    #[must_use]
    pub const fn quota(&self) -> &QuotaEnforcer {
        &self.quota
    }

    /// Answer a coach message and record both turns
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty or over-long message, `ConfigMissing`
    /// without a backend, `QuotaExceeded` on denial, or the backend's error
    #[instrument(skip(self, message), fields(user_id = %user_id, chars = message.chars().count()))]
    pub async fn send_message(&self, user_id: Uuid, message: &str) -> AppResult<CoachReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::invalid_input("Message is required"));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::invalid_input(format!(
                "Message too long (max {MAX_MESSAGE_CHARS} characters)"
            )));
        }

        let provider = self.provider()?;
        self.quota.enforce(user_id).await?;

        let training_context = self.context.build(user_id).await.render();
        let history = self
            .conversations
            .recent(user_id, CONTEXT_HISTORY_TURNS)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load conversation history");
                Vec::new()
            });

        let mut messages: Vec<ChatMessage> = history
            .into_iter()
            .map(|turn| ChatMessage::new(turn.role, turn.content))
            .collect();
        messages.push(ChatMessage::user(message));

        let request = ChatRequest::new(messages)
            .with_system_prompt(prompts::coach_system_prompt(&training_context));
        let response = provider.complete(&request).await?;
        info!(
            provider = provider.name(),
            chars = response.content.len(),
            "Coach response generated"
        );

        self.record_turn(user_id, MessageRole::User, message).await;
        self.record_turn(user_id, MessageRole::Assistant, &response.content)
            .await;

        Ok(CoachReply {
            response: response.content,
            model: response.model,
        })
    }

    /// One-shot dashboard insight; not recorded in the conversation
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` without a backend, `QuotaExceeded` on denial, or
    /// the backend's error
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn generate_insight(&self, user_id: Uuid) -> AppResult<String> {
        let provider = self.provider()?;
        self.quota.enforce(user_id).await?;

        let training_context = self.context.build(user_id).await.render();
        let request = ChatRequest::new(vec![ChatMessage::user(prompts::INSIGHT_USER_MESSAGE)])
            .with_system_prompt(prompts::insight_system_prompt(&training_context));
        let response = provider.complete(&request).await?;

        Ok(response.content.trim().to_owned())
    }

    /// Generate a plan starting tomorrow; with `confirm`, write it to the calendar
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing`, `QuotaExceeded`, the backend's error,
    /// `PlanParseFailed` for undecodable output, or a storage error when a
    /// confirmed plan could not be saved at all
    pub async fn generate_plan(
        &self,
        user_id: Uuid,
        days: u32,
        confirm: bool,
    ) -> AppResult<PlanOutcome> {
        self.generate_plan_from(user_id, days, confirm, Utc::now().date_naive())
            .await
    }

    /// [`Self::generate_plan`] with an explicit current date
    ///
    /// # Errors
    ///
    /// See [`Self::generate_plan`]
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn generate_plan_from(
        &self,
        user_id: Uuid,
        days: u32,
        confirm: bool,
        today: NaiveDate,
    ) -> AppResult<PlanOutcome> {
        let days = normalize_plan_days(days);
        let provider = self.provider()?;
        self.quota.enforce(user_id).await?;

        let training_context = self.context.build(user_id).await.render();
        let request = ChatRequest::new(vec![ChatMessage::user(prompts::plan_user_message(days))])
            .with_system_prompt(prompts::plan_system_prompt(&training_context, today, days))
            .with_max_tokens(PLAN_MAX_OUTPUT_TOKENS);
        let response = provider.complete(&request).await?;

        let plan = parse_plan(&response.content)?;
        info!(entries = plan.plan.len(), days, confirm, "Plan generated");

        let write_report = if confirm {
            Some(self.plan_writer.write(user_id, &plan.plan).await?)
        } else {
            None
        };

        Ok(PlanOutcome {
            days,
            plan,
            write_report,
        })
    }

    /// Most recent turns in chronological order (default 50); not quota-governed
    ///
    /// # Errors
    ///
    /// Returns an error if the conversation store fails
    pub async fn history(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> AppResult<Vec<ConversationTurn>> {
        let limit = limit.filter(|n| *n > 0).unwrap_or(DEFAULT_HISTORY_LIMIT);
        self.conversations.recent(user_id, limit).await
    }

    /// Current quota counters for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the counter store cannot be read
    pub async fn usage(&self, user_id: Uuid) -> AppResult<QuotaUsage> {
        self.quota.usage(user_id).await
    }

    fn provider(&self) -> AppResult<&Arc<dyn LlmProvider>> {
        self.provider.as_ref().ok_or_else(|| {
            AppError::config_missing(
                "No AI backend configured. Set GEMINI_API_KEY or CLAUDE_API_KEY.",
            )
        })
    }

    async fn record_turn(&self, user_id: Uuid, role: MessageRole, content: &str) {
        if let Err(e) = self.conversations.append(user_id, role, content).await {
            warn!(role = %role, error = %e, "Failed to save conversation turn");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_days_fall_back_to_a_week() {
        assert_eq!(normalize_plan_days(0), 7);
        assert_eq!(normalize_plan_days(1), 1);
        assert_eq!(normalize_plan_days(14), 14);
        assert_eq!(normalize_plan_days(15), 7);
    }
}
