// ABOUTME: SQLite conversation store: append-only coach turns per user
// ABOUTME: Recent turns are fetched newest-first with a limit, then reversed to chronological order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{decode_timestamp, decode_uuid, encode_timestamp, ConversationStore};
use crate::errors::{AppError, AppResult};
use crate::llm::MessageRole;
use crate::models::ConversationTurn;

/// Conversation database operations manager
#[derive(Clone)]
pub struct ConversationManager {
    pool: SqlitePool,
}

impl ConversationManager {
    /// Create a new conversation manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for ConversationManager {
    async fn append(
        &self,
        user_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> AppResult<ConversationTurn> {
        let turn = ConversationTurn {
            id: Uuid::new_v4(),
            user_id,
            role,
            content: content.to_owned(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO coach_conversations (id, user_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(turn.id.to_string())
        .bind(user_id.to_string())
        .bind(role.as_str())
        .bind(&turn.content)
        .bind(encode_timestamp(turn.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to append conversation turn: {e}")))?;

        Ok(turn)
    }

    async fn recent(&self, user_id: Uuid, limit: u32) -> AppResult<Vec<ConversationTurn>> {
        // seq breaks ties between turns written within the same microsecond
        let rows = sqlx::query(
            r"
            SELECT id, user_id, role, content, created_at
            FROM coach_conversations
            WHERE user_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT $2
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get recent turns: {e}")))?;

        let mut turns = rows
            .iter()
            .map(|r| -> AppResult<ConversationTurn> {
                Ok(ConversationTurn {
                    id: decode_uuid(&r.try_get::<String, _>("id")?)?,
                    user_id: decode_uuid(&r.try_get::<String, _>("user_id")?)?,
                    role: r.try_get::<String, _>("role")?.parse()?,
                    content: r.try_get("content")?,
                    created_at: decode_timestamp(&r.try_get::<String, _>("created_at")?)?,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        // Reverse to get chronological order
        turns.reverse();
        Ok(turns)
    }
}
