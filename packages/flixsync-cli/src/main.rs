use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use flixsync_client::{
    BellConfig, BellSnapshot, DeleteOutcome, NotificationSync, Prompter, SyncPhase, badge_label,
    format_notification,
};
use flixsync_sdk::{AppConfig, FlixsyncClient};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

mod auth_commands;
mod config;
mod search_commands;
mod terminal;

#[derive(Parser)]
#[command(name = "flixsync-cli")]
#[command(about = "Flixsync CLI client")]
struct Cli {
    /// API base URL, overrides FLIXSYNC_API_URL
    #[arg(short, long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List notifications
    Notifications,
    /// Open the notification bell and mark everything as read
    Open,
    /// Delete all notifications
    DeleteAll {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Keep the bell mounted and print every refresh
    Watch,
    /// Search movies by title
    Search {
        /// Search text
        text: String,
    },
    /// Interactive search suggestions
    Suggest,
    /// Token management
    Auth {
        #[command(subcommand)]
        action: auth_commands::AuthAction,
    },
}

fn notification_bell(config: &AppConfig, prompter: Arc<dyn Prompter>) -> NotificationSync {
    NotificationSync::new(
        Arc::new(FlixsyncClient::from_config(config)),
        config::credentials(),
        prompter,
        BellConfig::from(config),
    )
}

/// 挂载铃铛，未登录时直接退出
async fn mount_or_exit(bell: &NotificationSync) {
    if !bell.mount().await {
        eprintln!("❌ Not logged in");
        eprintln!("💡 Run: flixsync-cli auth set-token <token>, or set FLIXSYNC_TOKEN");
        std::process::exit(1);
    }
}

fn print_bell(snapshot: &BellSnapshot) {
    let badge = badge_label(snapshot.unread_count)
        .map(|label| format!(" ({} unread)", label))
        .unwrap_or_default();
    println!(
        "🔔 Notifications{}: {} total",
        badge,
        snapshot.notifications.len()
    );

    if snapshot.notifications.is_empty() {
        println!("📭 No notifications");
        return;
    }
    let now = Utc::now();
    for (i, notification) in snapshot.notifications.iter().enumerate() {
        println!("  {}", format_notification(notification, now));
        if i < snapshot.notifications.len() - 1 {
            println!();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = config::load_config(cli.server);

    match cli.command {
        Commands::Notifications => {
            let bell = notification_bell(&config, Arc::new(terminal::StdinPrompter));
            mount_or_exit(&bell).await;
            print_bell(&bell.snapshot());
            bell.unmount();
        }
        Commands::Open => {
            let bell = notification_bell(&config, Arc::new(terminal::StdinPrompter));
            if !bell.toggle_open().await {
                eprintln!("❌ Not logged in");
                std::process::exit(1);
            }
            print_bell(&bell.snapshot());

            // 等待后台的标记已读和可能的纠正拉取结束
            let mut updates = bell.subscribe();
            tokio::time::sleep(config.settle_delay()).await;
            let wait = config.timeout() + config.resync_delay() + config.timeout();
            tokio::time::timeout(
                wait,
                updates.wait_for(|s| !s.is_loading && s.phase == SyncPhase::Clean),
            )
            .await
            .context("timed out waiting for mark as read")?
            .context("notification bell stopped")?;

            println!();
            println!("✅ Marked as read");
            print_bell(&bell.snapshot());
            bell.unmount();
        }
        Commands::DeleteAll { yes } => {
            let prompter: Arc<dyn Prompter> = if yes {
                Arc::new(terminal::AssumeYes)
            } else {
                Arc::new(terminal::StdinPrompter)
            };
            let bell = notification_bell(&config, prompter);
            mount_or_exit(&bell).await;

            match bell.delete_all().await {
                DeleteOutcome::Deleted { count } => {
                    println!("✅ Deleted {} notifications", count);
                }
                DeleteOutcome::Partial { succeeded, total } => {
                    eprintln!("⚠️  Deleted {}/{} notifications", succeeded, total);
                    print_bell(&bell.snapshot());
                    std::process::exit(1);
                }
                DeleteOutcome::NothingToDelete => println!("📭 Nothing to delete"),
                DeleteOutcome::Cancelled => println!("🚫 Cancelled"),
                DeleteOutcome::Busy => {
                    eprintln!("❌ Another operation is still running");
                    std::process::exit(1);
                }
                DeleteOutcome::NotAuthenticated => {
                    eprintln!("❌ Not logged in");
                    std::process::exit(1);
                }
                DeleteOutcome::Failed => {
                    eprintln!("❌ Failed to delete notifications");
                    std::process::exit(1);
                }
            }
            bell.unmount();
        }
        Commands::Watch => {
            let bell = notification_bell(&config, Arc::new(terminal::StdinPrompter));
            let mut updates = bell.subscribe();
            mount_or_exit(&bell).await;
            print_bell(&bell.snapshot());

            println!("🎧 Refreshing every {}s", config.poll_interval_seconds);
            println!("   Press Ctrl+C to stop");

            let mut last = bell.snapshot();
            loop {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = updates.borrow_and_update().clone();
                        if !snapshot.is_authenticated {
                            println!("🔌 Logged out, stopping");
                            break;
                        }
                        if !snapshot.is_loading && snapshot.notifications != last.notifications {
                            println!();
                            print_bell(&snapshot);
                            last = snapshot;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        println!();
                        println!("👋 Stopped");
                        break;
                    }
                }
            }
            bell.unmount();
        }
        Commands::Search { text } => {
            search_commands::search_once(&config, &text).await?;
        }
        Commands::Suggest => {
            search_commands::suggest_interactive(&config).await?;
        }
        Commands::Auth { action } => {
            auth_commands::handle_auth_command(action)?;
        }
    }

    Ok(())
}
