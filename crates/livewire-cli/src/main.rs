mod auth_commands;
mod chat_commands;

use {
    clap::{Parser, Subcommand},
    livewire_api::{ApiGateway, SessionEvent, SessionStore},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "livewire", about = "LiveWire — terminal chat client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Override the API base URL from config.
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create a new account.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
    },
    /// Drop the local session.
    Logout,
    /// Show the logged-in user.
    Whoami,
    /// List other users.
    Users {
        /// Filter by email or display name substring.
        #[arg(long)]
        search: Option<String>,
    },
    /// Conversation management.
    Conversations {
        #[command(subcommand)]
        action: chat_commands::ConversationAction,
    },
    /// Message management.
    Messages {
        #[command(subcommand)]
        action: chat_commands::MessageAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Print any session notice the gateway emitted while a command ran. The
/// event lands on the channel before the failing call returns, so a drain
/// after the command sees it.
fn report_session_events(events: &mut tokio::sync::broadcast::Receiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::Expired => {
                eprintln!("Session expired — run `livewire login` to sign in again.");
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let mut config = livewire_config::discover_and_load();
    if let Some(url) = cli.api_url.clone() {
        config.api.base_url = url;
    }
    debug!(api = %config.api.base_url, "resolved API base URL");

    let store = match &config.api.credentials_path {
        Some(path) => SessionStore::with_path(path.clone()),
        None => SessionStore::new(),
    };
    let gateway = ApiGateway::new(&config.api.base_url, store);
    let mut events = gateway.subscribe();

    let result = match cli.command {
        Commands::Login { email, password } => {
            auth_commands::login(&gateway, &email, &password).await
        },
        Commands::Register {
            email,
            password,
            display_name,
            avatar_url,
        } => auth_commands::register(&gateway, email, password, display_name, avatar_url).await,
        Commands::Logout => auth_commands::logout(&gateway),
        Commands::Whoami => auth_commands::whoami(&gateway).await,
        Commands::Users { search } => auth_commands::users(&gateway, search.as_deref()).await,
        Commands::Conversations { action } => {
            chat_commands::handle_conversations(&gateway, action).await
        },
        Commands::Messages { action } => chat_commands::handle_messages(&gateway, action).await,
    };

    report_session_events(&mut events);
    result
}
