//! Debounced search-as-you-type.
//!
//! At most one search task exists at a time. Every keystroke aborts the
//! previous task before scheduling a new one, whether it is still waiting out
//! the quiet period or already waiting on the search endpoint, so a
//! superseded response never reaches `results`.

use crate::api::SearchApi;
use crate::interaction::Navigator;
use flixsync_sdk::{AppConfig, MovieSummary};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub debounce: Duration,
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SearchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            debounce: config.debounce(),
            limit: config.suggestion_limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    Pending,
    Fetching,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuggestSnapshot {
    pub query: String,
    pub results: Vec<MovieSummary>,
    pub visible: bool,
    pub phase: SearchPhase,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct SuggestInner {
    api: Arc<dyn SearchApi>,
    navigator: Arc<dyn Navigator>,
    config: SearchConfig,
    state: Mutex<SuggestSnapshot>,
    timer: Mutex<Option<JoinHandle<()>>>,
    // 每次输入、点击或拆除都会递增，旧任务的结果不再应用
    generation: AtomicU64,
    updates: watch::Sender<SuggestSnapshot>,
}

impl Drop for SuggestInner {
    fn drop(&mut self) {
        if let Some(handle) = self
            .timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

impl SuggestInner {
    fn update(&self, f: impl FnOnce(&mut SuggestSnapshot)) {
        let mut state = lock(&self.state);
        f(&mut state);
        self.updates.send_replace(state.clone());
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// 仅当期间没有新的输入时才应用更新
    fn update_current(&self, generation: u64, f: impl FnOnce(&mut SuggestSnapshot)) {
        self.update(|state| {
            if self.generation.load(Ordering::SeqCst) == generation {
                f(state);
            }
        });
    }

    fn cancel_pending(&self) {
        self.bump_generation();
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
        }
    }

    async fn run_search(&self, generation: u64) {
        let mut query = String::new();
        self.update_current(generation, |state| {
            state.phase = SearchPhase::Fetching;
            query = state.query.clone();
        });
        if query.is_empty() {
            return;
        }
        debug!(query = %query, "searching suggestions");

        match self.api.search_by_title(&query).await {
            Ok(movies) => {
                let limit = self.config.limit;
                self.update_current(generation, |state| {
                    state.results = movies.into_iter().take(limit).collect();
                    state.visible = true;
                    state.phase = SearchPhase::Idle;
                });
            }
            Err(err) => {
                error!(query = %query, error = %err, "suggestion search failed");
                self.update_current(generation, |state| state.phase = SearchPhase::Idle);
            }
        }
    }
}

/// 搜索建议
pub struct SuggestSearch {
    inner: Arc<SuggestInner>,
}

impl SuggestSearch {
    pub fn new(api: Arc<dyn SearchApi>, navigator: Arc<dyn Navigator>, config: SearchConfig) -> Self {
        let (updates, _) = watch::channel(SuggestSnapshot::default());
        Self {
            inner: Arc::new(SuggestInner {
                api,
                navigator,
                config,
                state: Mutex::new(SuggestSnapshot::default()),
                timer: Mutex::new(None),
                generation: AtomicU64::new(0),
                updates,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestSnapshot> {
        self.inner.updates.subscribe()
    }

    pub fn snapshot(&self) -> SuggestSnapshot {
        lock(&self.inner.state).clone()
    }

    pub fn query(&self) -> String {
        lock(&self.inner.state).query.clone()
    }

    pub fn results(&self) -> Vec<MovieSummary> {
        lock(&self.inner.state).results.clone()
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.inner.state).visible
    }

    pub fn phase(&self) -> SearchPhase {
        lock(&self.inner.state).phase
    }

    /// 输入框内容变化，必须在 tokio 运行时内调用
    pub fn on_input_change(&self, text: &str) {
        // 持有 timer 锁直到新任务登记完成，保证任意时刻最多一个待执行任务
        let mut timer = lock(&self.inner.timer);
        let generation = self.inner.bump_generation();
        if let Some(previous) = timer.take() {
            previous.abort();
        }

        if text.trim().is_empty() {
            self.inner.update(|state| {
                state.query = text.to_string();
                state.results.clear();
                state.visible = false;
                state.phase = SearchPhase::Idle;
            });
            return;
        }

        self.inner.update(|state| {
            state.query = text.to_string();
            state.phase = SearchPhase::Pending;
        });

        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.config.debounce;
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.run_search(generation).await;
            }
        }));
    }

    pub fn on_suggestion_click(&self, movie_id: &str) {
        self.inner.navigator.open_movie(movie_id);
        self.inner.cancel_pending();
        self.inner.update(|state| {
            state.query.clear();
            state.results.clear();
            state.visible = false;
            state.phase = SearchPhase::Idle;
        });
    }

    /// 只隐藏面板，保留输入和结果，之后只有新的输入才会重新显示
    pub fn on_click_outside(&self) {
        self.inner.update(|state| state.visible = false);
    }

    pub fn teardown(&self) {
        self.inner.cancel_pending();
        self.inner.update(|state| state.phase = SearchPhase::Idle);
    }
}
