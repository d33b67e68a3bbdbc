#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use session_sync::push::{PushError, run_push_listener};
use session_sync::{
    ApiError, ClientConfig, ClientStores, ConfigError, Credentials, FileStorage, LogNavigator, RegisterPayload,
    TokenStore,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Push(#[from] PushError),
    #[error("not logged in; run `session-sync login` first")]
    NotLoggedIn,
    #[error("no push URL; pass --push-url or set SESSION_SYNC_PUSH_URL")]
    MissingPushUrl,
    #[error("no refresh token stored; run `session-sync login` first")]
    NoRefreshToken,
    #[error("refresh failed; session ended")]
    RefreshFailed,
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "session-sync", about = "Session and notification sync client")]
struct Cli {
    #[arg(long, env = "SESSION_SYNC_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "SESSION_SYNC_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SESSION_SYNC_PASSWORD")]
        password: String,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SESSION_SYNC_PASSWORD")]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Fetch the current user, ending the session if that fails.
    Me,
    Refresh,
    Logout,
    /// Show the locally known session state without a network call.
    Status,
    Notifications(NotificationsCommand),
}

#[derive(Args, Debug)]
struct NotificationsCommand {
    #[command(subcommand)]
    command: NotificationsSubcommand,
}

#[derive(Subcommand, Debug)]
enum NotificationsSubcommand {
    List,
    Read { id: String },
    ReadAll,
    /// Stream pushed notifications until the server closes the socket.
    Watch {
        #[arg(long, env = "SESSION_SYNC_PUSH_URL")]
        push_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url.as_deref() {
        config = config.with_api_url(url)?;
    }
    if let Some(path) = cli.token_file {
        config.token_file = path;
    }

    let tokens = TokenStore::new(Arc::new(FileStorage::new(&config.token_file)));
    let stores = ClientStores::connect(&config, tokens.clone(), Arc::new(LogNavigator))?;

    match cli.command {
        Command::Login { email, password } => {
            let response = stores.auth.login(&Credentials { email, password }).await?;
            print_json(&response.user)
        }
        Command::Register { email, password, name } => {
            let response = stores.auth.register(&RegisterPayload { email, password, name }).await?;
            print_json(&response.user)
        }
        Command::Me => {
            require_session(&stores)?;
            stores.auth.fetch_user().await;
            match stores.auth.snapshot().user {
                Some(user) => print_json(&user),
                None => Err(CliError::NotLoggedIn),
            }
        }
        Command::Refresh => {
            refresh_session(&stores).await?;
            println!("ok");
            Ok(())
        }
        Command::Logout => {
            stores.auth.logout();
            println!("ok");
            Ok(())
        }
        Command::Status => print_json(&StatusView::from_stores(&stores)),
        Command::Notifications(cmd) => run_notifications(&config, &tokens, &stores, cmd).await,
    }
}

async fn run_notifications(
    config: &ClientConfig,
    tokens: &TokenStore,
    stores: &ClientStores,
    cmd: NotificationsCommand,
) -> Result<(), CliError> {
    require_session(stores)?;
    let cache = &stores.notifications;
    match cmd.command {
        NotificationsSubcommand::List => {
            cache.fetch_notifications().await;
            let state = cache.snapshot();
            print_json(&serde_json::json!({
                "unreadCount": state.unread_count,
                "notifications": state.notifications,
            }))
        }
        NotificationsSubcommand::Read { id } => {
            cache.fetch_notifications().await;
            cache.mark_as_read(&id).await;
            println!("unread: {}", cache.unread_count());
            Ok(())
        }
        NotificationsSubcommand::ReadAll => {
            cache.fetch_notifications().await;
            cache.mark_all_as_read().await;
            println!("unread: {}", cache.unread_count());
            Ok(())
        }
        NotificationsSubcommand::Watch { push_url } => {
            let url = push_url.or_else(|| config.push_url.clone()).ok_or(CliError::MissingPushUrl)?;
            let mut rx = cache.subscribe();
            let printer = tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let state = rx.borrow_and_update().clone();
                    if let Some(latest) = state.notifications.first() {
                        println!("[{} unread] {}: {}", state.unread_count, latest.id, latest.message);
                    }
                }
            });
            let delivered = run_push_listener(&url, tokens, cache).await?;
            printer.abort();
            println!("delivered: {delivered}");
            Ok(())
        }
    }
}

/// A missing refresh token is reported apart from a rejected one, since
/// only the latter ends a session.
async fn refresh_session(stores: &ClientStores) -> Result<String, CliError> {
    if stores.auth.session().tokens().get_refresh().is_none() {
        return Err(CliError::NoRefreshToken);
    }
    stores.auth.refresh().await.ok_or(CliError::RefreshFailed)
}

fn require_session(stores: &ClientStores) -> Result<(), CliError> {
    if stores.auth.snapshot().is_authenticated { Ok(()) } else { Err(CliError::NotLoggedIn) }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView {
    phase: String,
    is_authenticated: bool,
    has_refresh_token: bool,
}

impl StatusView {
    fn from_stores(stores: &ClientStores) -> Self {
        let state = stores.auth.snapshot();
        Self {
            phase: format!("{:?}", state.phase()),
            is_authenticated: state.is_authenticated,
            has_refresh_token: stores.auth.session().tokens().get_refresh().is_some(),
        }
    }
}
