use anyhow::{Context, Result};
use flixsync_client::{SearchConfig, SearchPhase, SuggestSearch, SuggestSnapshot};
use flixsync_sdk::{AppConfig, FlixsyncClient};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::terminal::PrintNavigator;

fn suggest_search(config: &AppConfig) -> SuggestSearch {
    SuggestSearch::new(
        Arc::new(FlixsyncClient::from_config(config)),
        Arc::new(PrintNavigator),
        SearchConfig::from(config),
    )
}

fn print_suggestions(snapshot: &SuggestSnapshot) {
    if snapshot.results.is_empty() {
        println!("🔍 No movies match '{}'", snapshot.query);
        return;
    }
    println!("🔍 Suggestions for '{}':", snapshot.query);
    for (i, movie) in snapshot.results.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, movie.title, movie.id);
    }
}

/// 单次搜索：输入一次并等待防抖后的结果
pub async fn search_once(config: &AppConfig, text: &str) -> Result<()> {
    let search = suggest_search(config);
    let mut updates = search.subscribe();

    search.on_input_change(text);
    let wait = config.debounce() + config.timeout();
    let snapshot = tokio::time::timeout(
        wait,
        updates.wait_for(|snapshot| snapshot.phase == SearchPhase::Idle),
    )
    .await
    .context("search timed out")?
    .context("search stopped")?
    .clone();

    if snapshot.visible {
        print_suggestions(&snapshot);
    } else {
        println!("🔍 Nothing to search for");
    }
    Ok(())
}

/// 交互模式：每行输入都是新的搜索框内容
pub async fn suggest_interactive(config: &AppConfig) -> Result<()> {
    let search = suggest_search(config);
    let mut updates = search.subscribe();

    println!("⌨️  Type to search. ':open N' opens a suggestion, ':hide' closes the list, ':quit' exits.");

    let printer = tokio::spawn(async move {
        let mut was_visible = false;
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if snapshot.phase == SearchPhase::Idle && snapshot.visible {
                print_suggestions(&snapshot);
            } else if was_visible && !snapshot.visible {
                println!("🙈 Suggestions hidden");
            }
            was_visible = snapshot.visible;
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            ":quit" => break,
            ":hide" => search.on_click_outside(),
            command if command.starts_with(":open") => {
                let index: Option<usize> = command[":open".len()..].trim().parse().ok();
                let results = search.results();
                match index.and_then(|n| n.checked_sub(1)).and_then(|i| results.get(i)) {
                    Some(movie) => search.on_suggestion_click(&movie.id),
                    None => eprintln!("❌ No suggestion with that number"),
                }
            }
            _ => search.on_input_change(&line),
        }
    }

    search.teardown();
    drop(search);
    printer.abort();
    Ok(())
}
