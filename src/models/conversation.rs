// ABOUTME: Coach conversation turn model
// ABOUTME: Turns are immutable once written and owned by a single user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::MessageRole;

/// One stored message in a user's coach conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Turn id
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Who said it
    pub role: MessageRole,
    /// Message text
    pub content: String,
    /// When it was written
    pub created_at: DateTime<Utc>,
}
