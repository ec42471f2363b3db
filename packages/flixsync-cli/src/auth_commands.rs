use anyhow::{Context, Result};
use clap::Subcommand;
use flixsync_client::CredentialProvider;

use crate::config;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a bearer token in the token file
    SetToken {
        /// Bearer token
        token: String,
    },
    /// Remove the stored token
    Logout,
    /// Show current token status
    Status,
}

pub fn handle_auth_command(action: AuthAction) -> Result<()> {
    let store = config::token_file();

    match action {
        AuthAction::SetToken { token } => {
            let token = token.trim();
            if token.is_empty() {
                anyhow::bail!("token must not be empty");
            }
            store
                .set(token)
                .with_context(|| format!("failed to write {}", store.path().display()))?;
            println!("🔐 Token saved to {}", store.path().display());
            let preview: String = token.chars().take(12).collect();
            println!("   Token: {}...", preview);
        }
        AuthAction::Logout => {
            store
                .clear()
                .with_context(|| format!("failed to remove {}", store.path().display()))?;
            println!("👋 Logged out");
        }
        AuthAction::Status => {
            let credentials = config::credentials();
            if credentials.get().is_some() {
                println!("✅ Token is configured");
            } else {
                println!("❌ No token configured");
                println!("💡 Run: flixsync-cli auth set-token <token>");
            }
        }
    }
    Ok(())
}
