//! Notification bell engine.
//!
//! Keeps a local copy of the user's notifications in step with the server.
//! Opening the panel fetches, then marks everything read optimistically and
//! fires one mark-as-read request per unread item; any failed item triggers a
//! corrective fetch instead of per-item reconciliation. A background timer
//! refreshes the list while the panel is closed.

use crate::api::NotificationApi;
use crate::batch::{self, BatchReport};
use crate::credentials::CredentialProvider;
use crate::interaction::Prompter;
use flixsync_sdk::{AppConfig, MarkReadRequest, Notification, unread_count};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub const DELETE_ALL_PROMPT: &str = "Delete all notifications?";
pub const DELETE_FAILED_NOTICE: &str = "Something went wrong while deleting notifications";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BellConfig {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub resync_delay: Duration,
}

impl Default for BellConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for BellConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            settle_delay: config.settle_delay(),
            resync_delay: config.resync_delay(),
        }
    }
}

/// 乐观更新与纠正性刷新的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Clean,
    OptimisticPending,
    Reconciling,
}

/// 对外发布的状态快照
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BellSnapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub is_open: bool,
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub phase: SyncPhase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    NotAuthenticated,
    NothingUnread,
    Marked { succeeded: usize, failed: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// 有操作正在进行，删除按钮处于禁用状态
    Busy,
    Cancelled,
    NotAuthenticated,
    NothingToDelete,
    Deleted { count: usize },
    Partial { succeeded: usize, total: usize },
    Failed,
}

#[derive(Debug, Default)]
struct BellState {
    notifications: Vec<Notification>,
    is_open: bool,
    is_authenticated: bool,
    in_flight: usize,
    phase: SyncPhase,
    // 每次拆除会话时递增，旧会话中返回的结果会被丢弃
    session: u64,
}

impl BellState {
    fn snapshot(&self) -> BellSnapshot {
        BellSnapshot {
            notifications: self.notifications.clone(),
            unread_count: unread_count(&self.notifications),
            is_open: self.is_open,
            is_loading: self.in_flight > 0,
            is_authenticated: self.is_authenticated,
            phase: self.phase,
        }
    }
}

#[derive(Default)]
struct Timers {
    poll: Option<JoinHandle<()>>,
    settle: Option<JoinHandle<()>>,
    resync: Option<JoinHandle<()>>,
}

impl Timers {
    fn abort_all(&mut self) {
        for handle in [self.poll.take(), self.settle.take(), self.resync.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct BellInner {
    api: Arc<dyn NotificationApi>,
    credentials: Arc<dyn CredentialProvider>,
    prompter: Arc<dyn Prompter>,
    config: BellConfig,
    state: Mutex<BellState>,
    timers: Mutex<Timers>,
    updates: watch::Sender<BellSnapshot>,
}

impl Drop for BellInner {
    fn drop(&mut self) {
        self.timers
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }
}

struct LoadingGuard<'a> {
    inner: &'a BellInner,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.inner
            .update(|state| state.in_flight = state.in_flight.saturating_sub(1));
    }
}

impl BellInner {
    /// 快照在持有状态锁时发布，保证订阅者看到的顺序与状态变化一致
    fn update<R>(&self, f: impl FnOnce(&mut BellState) -> R) -> R {
        let mut state = lock(&self.state);
        let result = f(&mut state);
        self.updates.send_replace(state.snapshot());
        result
    }

    /// 仅当会话未被拆除时才应用更新
    fn update_session(&self, session: u64, f: impl FnOnce(&mut BellState)) -> bool {
        self.update(|state| {
            if state.session != session {
                return false;
            }
            f(state);
            true
        })
    }

    fn session(&self) -> u64 {
        lock(&self.state).session
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        self.update(|state| state.in_flight += 1);
        LoadingGuard { inner: self }
    }

    /// 重新读取凭据并刷新登录状态
    fn refresh_auth(&self) -> Option<String> {
        let token = self.credentials.get();
        let authenticated = token.is_some();
        let changed = lock(&self.state).is_authenticated != authenticated;
        if changed {
            self.update(|state| state.is_authenticated = authenticated);
        }
        token
    }

    fn teardown(&self) {
        lock(&self.timers).abort_all();
        self.update(|state| {
            state.notifications.clear();
            state.is_open = false;
            state.phase = SyncPhase::Clean;
            state.session += 1;
        });
    }

    async fn fetch(&self) -> bool {
        let Some(token) = self.credentials.get() else {
            debug!("no credential, skipping notification fetch");
            return false;
        };

        let session = self.session();
        let _loading = self.begin_loading();
        match self.api.list_notifications(&token).await {
            Ok(items) => {
                let count = items.len();
                let applied = self.update_session(session, |state| state.notifications = items);
                if applied {
                    debug!(count, "notifications refreshed");
                } else {
                    debug!("discarding notifications fetched for an ended session");
                }
                applied
            }
            Err(err) => {
                error!(error = %err, "failed to fetch notifications");
                self.update_session(session, |state| state.notifications.clear());
                false
            }
        }
    }

    async fn mark_all_as_read_on_open(self: &Arc<Self>) -> MarkOutcome {
        let Some(token) = self.credentials.get() else {
            debug!("no credential, skipping mark as read");
            return MarkOutcome::NotAuthenticated;
        };

        let (session, targets) = {
            let mut state = lock(&self.state);
            let targets: Vec<Option<String>> = state
                .notifications
                .iter()
                .filter(|item| !item.is_read)
                .map(|item| item.resolved_id().map(str::to_string))
                .collect();
            if targets.is_empty() {
                debug!("no unread notifications to mark");
                return MarkOutcome::NothingUnread;
            }
            for item in state.notifications.iter_mut() {
                item.is_read = true;
            }
            state.phase = SyncPhase::OptimisticPending;
            (state.session, targets)
        };
        self.update(|_| ());
        info!(count = targets.len(), "marking notifications as read");

        let total = targets.len();
        let ids: Vec<String> = targets.into_iter().flatten().collect();
        let missing = total - ids.len();
        if missing > 0 {
            warn!(missing, "notifications without an id cannot be marked as read");
        }

        let _loading = self.begin_loading();
        let api = Arc::clone(&self.api);
        let report = batch::run_all(ids, move |id| {
            let api = Arc::clone(&api);
            let token = token.clone();
            async move {
                api.mark_read(&id, &token, &MarkReadRequest::default())
                    .await
                    .map(|_| ())
            }
        })
        .await;

        let succeeded = report.succeeded.len();
        let failed = report.failures() + missing;
        info!(succeeded, failed, "mark as read finished");

        if failed > 0 {
            let resync = self.update_session(session, |state| {
                state.phase = SyncPhase::Reconciling;
            });
            if resync {
                self.schedule_resync();
            }
        } else {
            self.update_session(session, |state| {
                if state.phase == SyncPhase::OptimisticPending {
                    state.phase = SyncPhase::Clean;
                }
            });
        }

        MarkOutcome::Marked { succeeded, failed }
    }

    async fn delete_all(&self) -> DeleteOutcome {
        let busy = lock(&self.state).in_flight > 0;
        if busy {
            return DeleteOutcome::Busy;
        }
        if !self.prompter.confirm(DELETE_ALL_PROMPT) {
            return DeleteOutcome::Cancelled;
        }
        let Some(token) = self.credentials.get() else {
            return DeleteOutcome::NotAuthenticated;
        };

        let _loading = self.begin_loading();
        let (session, ids) = {
            let state = lock(&self.state);
            let ids: Vec<String> = state
                .notifications
                .iter()
                .filter_map(|item| item.resolved_id().map(str::to_string))
                .collect();
            (state.session, ids)
        };
        if ids.is_empty() {
            debug!("no notifications with an id to delete");
            return DeleteOutcome::NothingToDelete;
        }

        let total = ids.len();
        info!(count = total, "deleting notifications");
        let api = Arc::clone(&self.api);
        let report: BatchReport = batch::run_all(ids, move |id| {
            let api = Arc::clone(&api);
            let token = token.clone();
            async move { api.delete_notification(&id, &token).await }
        })
        .await;

        if report.aborted > 0 {
            error!(aborted = report.aborted, "delete batch did not complete");
            if self.session() != session {
                return DeleteOutcome::NotAuthenticated;
            }
            self.prompter.alert(DELETE_FAILED_NOTICE);
            self.fetch().await;
            return DeleteOutcome::Failed;
        }

        let succeeded = report.succeeded.len();
        if succeeded == total {
            let applied = self.update_session(session, |state| {
                state.notifications.clear();
                state.is_open = false;
            });
            if !applied {
                return DeleteOutcome::NotAuthenticated;
            }
            info!(count = total, "all notifications deleted");
            DeleteOutcome::Deleted { count: total }
        } else {
            warn!(succeeded, total, "some notifications could not be deleted");
            self.fetch().await;
            if self.session() != session {
                debug!("session ended during delete, dropping the report");
                return DeleteOutcome::NotAuthenticated;
            }
            self.prompter
                .alert(&format!("Deleted {}/{} notifications", succeeded, total));
            DeleteOutcome::Partial { succeeded, total }
        }
    }

    fn schedule_mark_on_open(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let delay = self.config.settle_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.mark_all_as_read_on_open().await;
            }
        });
        if let Some(previous) = lock(&self.timers).settle.replace(handle) {
            previous.abort();
        }
    }

    fn schedule_resync(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let delay = self.config.resync_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                debug!("running corrective notification fetch");
                inner.fetch().await;
                inner.update(|state| {
                    if state.phase == SyncPhase::Reconciling {
                        state.phase = SyncPhase::Clean;
                    }
                });
            }
        });
        if let Some(previous) = lock(&self.timers).resync.replace(handle) {
            previous.abort();
        }
    }

    fn start_polling(self: &Arc<Self>) {
        let mut timers = lock(&self.timers);
        if timers.poll.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let weak = Arc::downgrade(self);
        let interval = self.config.poll_interval;
        timers.poll = Some(tokio::spawn(poll_loop(weak, interval)));
    }
}

async fn poll_loop(weak: Weak<BellInner>, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;
        let Some(inner) = weak.upgrade() else {
            break;
        };
        if inner.refresh_auth().is_none() {
            debug!("credential gone, stopping notification refresh");
            inner.teardown();
            break;
        }
        let is_open = lock(&inner.state).is_open;
        if is_open {
            continue;
        }
        inner.fetch().await;
    }
}

/// 通知铃铛
pub struct NotificationSync {
    inner: Arc<BellInner>,
}

impl NotificationSync {
    pub fn new(
        api: Arc<dyn NotificationApi>,
        credentials: Arc<dyn CredentialProvider>,
        prompter: Arc<dyn Prompter>,
        config: BellConfig,
    ) -> Self {
        let (updates, _) = watch::channel(BellSnapshot::default());
        Self {
            inner: Arc::new(BellInner {
                api,
                credentials,
                prompter,
                config,
                state: Mutex::new(BellState::default()),
                timers: Mutex::new(Timers::default()),
                updates,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<BellSnapshot> {
        self.inner.updates.subscribe()
    }

    pub fn snapshot(&self) -> BellSnapshot {
        lock(&self.inner.state).snapshot()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.inner.state).notifications.clone()
    }

    pub fn unread_count(&self) -> usize {
        unread_count(&lock(&self.inner.state).notifications)
    }

    pub fn is_open(&self) -> bool {
        lock(&self.inner.state).is_open
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.inner.state).in_flight > 0
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.inner.state).is_authenticated
    }

    pub fn phase(&self) -> SyncPhase {
        lock(&self.inner.state).phase
    }

    /// 删除按钮是否可用
    pub fn can_delete(&self) -> bool {
        let state = lock(&self.inner.state);
        state.in_flight == 0 && !state.notifications.is_empty()
    }

    /// 挂载：已登录时拉取一次并启动后台刷新
    pub async fn mount(&self) -> bool {
        if self.inner.refresh_auth().is_none() {
            debug!("not logged in, notification bell stays idle");
            return false;
        }
        self.inner.start_polling();
        self.inner.fetch().await;
        true
    }

    pub fn unmount(&self) {
        self.inner.teardown();
    }

    /// 重新检查凭据，登录状态变化时挂载或拆除
    pub async fn sync_auth(&self) -> bool {
        let was_authenticated = self.is_authenticated();
        let authenticated = self.inner.refresh_auth().is_some();
        match (was_authenticated, authenticated) {
            (true, false) => {
                info!("credential lost, tearing down notifications");
                self.inner.teardown();
            }
            (false, true) => {
                self.mount().await;
            }
            _ => {}
        }
        authenticated
    }

    pub fn logout(&self) {
        if let Err(err) = self.inner.credentials.clear() {
            warn!(error = %err, "failed to clear credential");
        }
        self.inner.teardown();
        self.inner.refresh_auth();
    }

    pub async fn fetch(&self) -> bool {
        self.inner.fetch().await
    }

    /// 点击铃铛，返回点击后面板是否打开
    pub async fn toggle_open(&self) -> bool {
        if self.is_open() {
            debug!("closing notification bell");
            self.inner.update(|state| state.is_open = false);
            return false;
        }
        if self.inner.refresh_auth().is_none() {
            debug!("user not logged in");
            return false;
        }

        debug!("opening notification bell");
        let session = self.inner.session();
        self.inner.fetch().await;
        let mut opened = false;
        self.inner.update_session(session, |state| {
            if state.is_authenticated {
                state.is_open = true;
                opened = true;
            }
        });
        if !opened {
            debug!("session ended while opening, bell stays closed");
            return false;
        }
        self.inner.schedule_mark_on_open();
        true
    }

    /// 面板外的指针操作
    pub fn close_from_outside(&self) {
        if self.is_open() {
            self.inner.update(|state| state.is_open = false);
        }
    }

    pub async fn mark_all_as_read_on_open(&self) -> MarkOutcome {
        self.inner.mark_all_as_read_on_open().await
    }

    pub async fn delete_all(&self) -> DeleteOutcome {
        self.inner.delete_all().await
    }
}
