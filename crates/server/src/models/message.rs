//! Direct message domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supplyhub_core::{MessageId, Role, UserId};

/// One side of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: UserId,
    pub name: String,
    pub role: Role,
}

impl From<&super::User> for Participant {
    fn from(user: &super::User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
        }
    }
}

/// A message from one account to another. Only `is_read` ever changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message ID.
    pub id: MessageId,
    /// Who wrote it.
    pub sender: Participant,
    /// Who it is addressed to.
    pub receiver: Participant,
    /// Body text.
    pub message: String,
    /// Whether the receiver has read it.
    pub is_read: bool,
    /// When it was sent.
    pub created_at: DateTime<Utc>,
}

/// Input for sending a message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub message: String,
}
