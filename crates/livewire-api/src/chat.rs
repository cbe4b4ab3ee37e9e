//! Conversation and message operations.

use crate::{
    error::ApiError,
    gateway::ApiGateway,
    types::{Conversation, ConversationUpsert, Message, SendMessageRequest},
};

/// List the caller's conversations, most recently active first (server
/// ordering).
pub async fn list_conversations(gateway: &ApiGateway) -> Result<Vec<Conversation>, ApiError> {
    gateway.get("/chat/conversations/").await
}

/// Start a conversation. The server folds the caller into the participant
/// set, so `participant_ids` only needs the other members.
pub async fn create_conversation(
    gateway: &ApiGateway,
    payload: &ConversationUpsert,
) -> Result<Conversation, ApiError> {
    gateway.post("/chat/conversations/", payload).await
}

/// Update title/participants/group flag of an existing conversation.
pub async fn update_conversation(
    gateway: &ApiGateway,
    conversation_id: i64,
    payload: &ConversationUpsert,
) -> Result<Conversation, ApiError> {
    gateway
        .patch(&format!("/chat/conversations/{conversation_id}/"), payload)
        .await
}

/// Fetch a conversation's messages, oldest first (server ordering).
pub async fn list_messages(
    gateway: &ApiGateway,
    conversation_id: i64,
) -> Result<Vec<Message>, ApiError> {
    gateway
        .get(&format!("/chat/conversations/{conversation_id}/messages/"))
        .await
}

/// Post a message. Sending also bumps the conversation's `updated_at` on the
/// server, which reorders the conversation list.
pub async fn send_message(
    gateway: &ApiGateway,
    conversation_id: i64,
    body: &str,
) -> Result<Message, ApiError> {
    let payload = SendMessageRequest { body: body.into() };
    gateway
        .post(
            &format!("/chat/conversations/{conversation_id}/messages/"),
            &payload,
        )
        .await
}
