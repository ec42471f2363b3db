use flixsync_client::{CredentialProvider, FileCredentials, MemoryCredentials};
use flixsync_sdk::AppConfig;
use std::env;
use std::sync::Arc;

pub const DEFAULT_TOKEN_FILE: &str = ".flixsync-token";

/// 合并命令行参数与环境变量，命令行优先
pub fn load_config(server: Option<String>) -> AppConfig {
    resolve_config(server, env::var("FLIXSYNC_API_URL").ok())
}

fn resolve_config(server: Option<String>, env_url: Option<String>) -> AppConfig {
    let mut config = AppConfig::default();
    if let Some(url) = server
        .or(env_url)
        .filter(|url| !url.trim().is_empty())
    {
        config.server_url = url;
    }
    config
}

pub fn token_file() -> FileCredentials {
    let path = env::var("FLIXSYNC_TOKEN_FILE").unwrap_or_else(|_| DEFAULT_TOKEN_FILE.to_string());
    FileCredentials::new(path)
}

/// `FLIXSYNC_TOKEN` 优先，否则读取令牌文件
pub fn credentials() -> Arc<dyn CredentialProvider> {
    match env::var("FLIXSYNC_TOKEN") {
        Ok(token) if !token.trim().is_empty() => Arc::new(MemoryCredentials::new(Some(token))),
        _ => Arc::new(token_file()),
    }
}
