//! Wire shapes consumed from and sent to the LiveWire REST API.

use serde::{Deserialize, Serialize};

/// A LiveWire account as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_email_verified: bool,
    pub date_joined: String,
}

/// Response of `POST /auth/token/`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

/// Response of `POST /auth/token/refresh/` — a fresh access credential only;
/// the refresh credential stays valid and is not rotated.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A conversation thread. The server keeps the list ordered by most recent
/// activity (`updated_at` descending).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    pub is_group: bool,
    pub created_at: String,
    pub updated_at: String,
    pub participants: Vec<User>,
}

/// Create/update payload for a conversation. The same shape serves both
/// `POST` and `PATCH`; the server always folds the calling user into the
/// participant set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationUpsert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub participant_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
}

/// A single message in a conversation, ordered by `created_at` ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation: i64,
    pub sender: User,
    pub body: String,
    pub attachment_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_edited: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub body: String,
}
