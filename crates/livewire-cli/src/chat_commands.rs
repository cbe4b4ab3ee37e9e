use {
    anyhow::Result,
    clap::Subcommand,
    livewire_api::{ApiGateway, chat, types::ConversationUpsert},
};

#[derive(Subcommand)]
pub enum ConversationAction {
    /// List conversations, most recently active first.
    List,
    /// Start a conversation with one or more users.
    Create {
        /// User IDs to include (the caller is added automatically).
        #[arg(long, value_delimiter = ',', required = true)]
        participants: Vec<i64>,
        #[arg(long)]
        title: Option<String>,
        /// Mark as a group conversation.
        #[arg(long, default_value_t = false)]
        group: bool,
    },
    /// Change title or participants of a conversation.
    Update {
        id: i64,
        #[arg(long, value_delimiter = ',', required = true)]
        participants: Vec<i64>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        group: Option<bool>,
    },
}

#[derive(Subcommand)]
pub enum MessageAction {
    /// Show a conversation's messages, oldest first.
    List { conversation: i64 },
    /// Send a message to a conversation.
    Send {
        conversation: i64,
        #[arg(short, long)]
        message: String,
    },
}

pub async fn handle_conversations(gateway: &ApiGateway, action: ConversationAction) -> Result<()> {
    match action {
        ConversationAction::List => {
            let conversations = chat::list_conversations(gateway).await?;
            if conversations.is_empty() {
                println!("No conversations yet.");
                return Ok(());
            }
            for c in conversations {
                let kind = if c.is_group { "group" } else { "direct" };
                println!(
                    "{:>6}  [{kind}]  {}  ({} participants, active {})",
                    c.id,
                    c.title,
                    c.participants.len(),
                    c.updated_at
                );
            }
            Ok(())
        },
        ConversationAction::Create {
            participants,
            title,
            group,
        } => {
            let payload = ConversationUpsert {
                title,
                participant_ids: participants,
                is_group: group.then_some(true),
            };
            let created = chat::create_conversation(gateway, &payload).await?;
            println!("Created conversation {} — {}", created.id, created.title);
            Ok(())
        },
        ConversationAction::Update {
            id,
            participants,
            title,
            group,
        } => {
            let payload = ConversationUpsert {
                title,
                participant_ids: participants,
                is_group: group,
            };
            let updated = chat::update_conversation(gateway, id, &payload).await?;
            println!("Updated conversation {} — {}", updated.id, updated.title);
            Ok(())
        },
    }
}

pub async fn handle_messages(gateway: &ApiGateway, action: MessageAction) -> Result<()> {
    match action {
        MessageAction::List { conversation } => {
            let messages = chat::list_messages(gateway, conversation).await?;
            if messages.is_empty() {
                println!("No messages yet.");
                return Ok(());
            }
            for m in messages {
                let edited = if m.is_edited { " (edited)" } else { "" };
                println!(
                    "[{}] {}: {}{edited}",
                    m.created_at,
                    m.sender
                        .display_name
                        .as_deref()
                        .unwrap_or(m.sender.email.as_str()),
                    m.body
                );
            }
            Ok(())
        },
        MessageAction::Send {
            conversation,
            message,
        } => {
            let sent = chat::send_message(gateway, conversation, &message).await?;
            println!("Sent message {} to conversation {}", sent.id, conversation);
            Ok(())
        },
    }
}
