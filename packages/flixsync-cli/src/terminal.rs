use flixsync_client::{Navigator, Prompter};
use std::io::{self, BufRead, Write};

/// 在终端里询问 y/N
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&self, message: &str) -> bool {
        print!("❓ {} [y/N] ", message);
        let _ = io::stdout().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }

    fn alert(&self, message: &str) {
        eprintln!("⚠️  {}", message);
    }
}

/// `--yes` 时跳过确认
pub struct AssumeYes;

impl Prompter for AssumeYes {
    fn confirm(&self, _message: &str) -> bool {
        true
    }

    fn alert(&self, message: &str) {
        eprintln!("⚠️  {}", message);
    }
}

pub struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn open_movie(&self, movie_id: &str) {
        println!("🎬 Opening /movies/{}", movie_id);
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
