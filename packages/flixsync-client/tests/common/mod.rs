#![allow(dead_code)]

use async_trait::async_trait;
use flixsync_client::{
    BellConfig, CredentialProvider, MemoryCredentials, Navigator, NotificationApi,
    NotificationSync, Prompter, SearchApi,
};
use flixsync_sdk::{MarkReadRequest, MovieSummary, Notification, SdkError, SdkResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LATENCY: Duration = Duration::from_millis(50);

pub fn notification(id: &str, is_read: bool) -> Notification {
    Notification {
        id: Some(id.to_string()),
        title: format!("title {}", id),
        message: format!("message {}", id),
        is_read,
        created_at: None,
        related_movie: None,
    }
}

/// 内存中的通知服务端
#[derive(Default)]
pub struct FakeNotificationServer {
    store: Mutex<Vec<Notification>>,
    fail_mark: Mutex<HashSet<String>>,
    fail_delete: Mutex<HashSet<String>>,
    panic_delete: Mutex<HashSet<String>>,
    fail_list: AtomicBool,
    pub list_calls: AtomicUsize,
    pub mark_calls: AtomicUsize,
    pub marks_completed: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub mark_bodies: Mutex<Vec<MarkReadRequest>>,
}

impl FakeNotificationServer {
    pub fn with(items: Vec<Notification>) -> Arc<Self> {
        let server = Self::default();
        *server.store.lock().unwrap() = items;
        Arc::new(server)
    }

    pub fn items(&self) -> Vec<Notification> {
        self.store.lock().unwrap().clone()
    }

    pub fn push(&self, item: Notification) {
        self.store.lock().unwrap().insert(0, item);
    }

    pub fn fail_mark_for(&self, id: &str) {
        self.fail_mark.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_delete_for(&self, id: &str) {
        self.fail_delete.lock().unwrap().insert(id.to_string());
    }

    /// 删除该 id 时请求任务直接 panic
    pub fn panic_delete_for(&self, id: &str) {
        self.panic_delete.lock().unwrap().insert(id.to_string());
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn mark_calls(&self) -> usize {
        self.mark_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.list_calls() + self.mark_calls() + self.delete_calls()
    }
}

#[async_trait]
impl NotificationApi for FakeNotificationServer {
    async fn list_notifications(&self, _token: &str) -> SdkResult<Vec<Notification>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(LATENCY).await;
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(SdkError::ApiError { status: 500 });
        }
        Ok(self.items())
    }

    async fn mark_read(
        &self,
        notification_id: &str,
        _token: &str,
        body: &MarkReadRequest,
    ) -> SdkResult<Notification> {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);
        self.mark_bodies.lock().unwrap().push(body.clone());
        tokio::time::sleep(LATENCY).await;
        self.marks_completed.fetch_add(1, Ordering::SeqCst);

        if self.fail_mark.lock().unwrap().contains(notification_id) {
            return Err(SdkError::ApiError { status: 500 });
        }
        let mut store = self.store.lock().unwrap();
        match store
            .iter_mut()
            .find(|item| item.resolved_id() == Some(notification_id))
        {
            Some(item) => {
                item.is_read = body.is_read;
                Ok(item.clone())
            }
            None => Err(SdkError::ApiError { status: 404 }),
        }
    }

    async fn delete_notification(&self, notification_id: &str, _token: &str) -> SdkResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(LATENCY).await;

        let explode = self.panic_delete.lock().unwrap().contains(notification_id);
        if explode {
            panic!("delete handler crashed for {}", notification_id);
        }

        if self.fail_delete.lock().unwrap().contains(notification_id) {
            return Err(SdkError::ApiError { status: 500 });
        }
        self.store
            .lock()
            .unwrap()
            .retain(|item| item.resolved_id() != Some(notification_id));
        Ok(())
    }
}

/// 记录提示内容并按预设回答确认框
pub struct FakePrompter {
    answer: bool,
    pub confirms: AtomicUsize,
    pub alerts: Mutex<Vec<String>>,
}

impl FakePrompter {
    pub fn answering(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            confirms: AtomicUsize::new(0),
            alerts: Mutex::new(Vec::new()),
        })
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Prompter for FakePrompter {
    fn confirm(&self, _message: &str) -> bool {
        self.confirms.fetch_add(1, Ordering::SeqCst);
        self.answer
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

pub struct Bell {
    pub sync: NotificationSync,
    pub server: Arc<FakeNotificationServer>,
    pub credentials: Arc<MemoryCredentials>,
    pub prompter: Arc<FakePrompter>,
}

pub fn bell(items: Vec<Notification>, token: Option<&str>, answer: bool) -> Bell {
    let server = FakeNotificationServer::with(items);
    let credentials = Arc::new(MemoryCredentials::new(token.map(str::to_string)));
    let prompter = FakePrompter::answering(answer);
    let sync = NotificationSync::new(
        server.clone(),
        credentials.clone() as Arc<dyn CredentialProvider>,
        prompter.clone(),
        BellConfig::default(),
    );
    Bell {
        sync,
        server,
        credentials,
        prompter,
    }
}

/// 按片名前缀过滤的搜索服务
#[derive(Default)]
pub struct FakeSearchServer {
    catalog: Vec<MovieSummary>,
    latency: Duration,
    fail: AtomicBool,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearchServer {
    pub fn with(titles: &[&str], latency: Duration) -> Arc<Self> {
        let catalog = titles
            .iter()
            .enumerate()
            .map(|(i, title)| MovieSummary {
                id: format!("m{}", i + 1),
                title: title.to_string(),
                poster_url: Some(format!("https://img.example/{}.jpg", i + 1)),
            })
            .collect();
        Arc::new(Self {
            catalog,
            latency,
            ..Self::default()
        })
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchApi for FakeSearchServer {
    async fn search_by_title(&self, query: &str) -> SdkResult<Vec<MovieSummary>> {
        self.queries.lock().unwrap().push(query.to_string());
        tokio::time::sleep(self.latency).await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(SdkError::NetworkError("connection reset".to_string()));
        }
        let needle = query.to_lowercase();
        Ok(self
            .catalog
            .iter()
            .filter(|movie| movie.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub opened: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn open_movie(&self, movie_id: &str) {
        self.opened.lock().unwrap().push(movie_id.to_string());
    }
}
