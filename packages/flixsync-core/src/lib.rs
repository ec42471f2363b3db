use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 通知关联的影片（仅用于展示）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedMovie {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
}

/// 通知项数据结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "content")]
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "movie", skip_serializing_if = "Option::is_none")]
    pub related_movie: Option<RelatedMovie>,
}

impl Notification {
    /// 可用于请求的 ID，空白 ID 视为不存在
    pub fn resolved_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Notification"
        } else {
            &self.title
        }
    }
}

/// 未读数量，始终由列表推导
pub fn unread_count(items: &[Notification]) -> usize {
    items.iter().filter(|item| !item.is_read).count()
}

/// 搜索建议中的影片摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_url: Option<String>,
}

/// 标记已读请求体，永远不是空 body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub is_read: bool,
}

impl Default for MarkReadRequest {
    fn default() -> Self {
        Self { is_read: true }
    }
}

/// 列表响应：裸数组或 `{ "data": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListPayload<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListPayload::Bare(items) => items,
            ListPayload::Wrapped { data } => data,
        }
    }
}

/// API 响应结构，缺失的 data 视为空列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<Vec<T>>,
}

impl<T> ApiResponse<T> {
    pub fn into_items(self) -> Vec<T> {
        self.data.unwrap_or_default()
    }
}

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_url: String,
    pub timeout_seconds: u64,
    pub poll_interval_seconds: u64,
    pub settle_delay_ms: u64,
    pub resync_delay_ms: u64,
    pub debounce_ms: u64,
    pub suggestion_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000/api".to_string(),
            timeout_seconds: 30,
            poll_interval_seconds: 30,
            settle_delay_ms: 500,
            resync_delay_ms: 1000,
            debounce_ms: 300,
            suggestion_limit: 4,
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn resync_delay(&self) -> Duration {
        Duration::from_millis(self.resync_delay_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_from_backend_document() {
        let value = json!({
            "_id": "65f0c1",
            "title": "New episode",
            "message": "Episode 4 is out",
            "isRead": false,
            "createdAt": "2024-03-12T08:30:00Z",
            "movie": { "_id": "m1", "title": "Arcane" }
        });

        let item: Notification = serde_json::from_value(value).unwrap();
        assert_eq!(item.resolved_id(), Some("65f0c1"));
        assert_eq!(item.message, "Episode 4 is out");
        assert!(!item.is_read);
        assert!(item.created_at.is_some());
        assert_eq!(item.related_movie.unwrap().title, "Arcane");
    }

    #[test]
    fn test_notification_aliases() {
        let value = json!({
            "id": "n-7",
            "content": "legacy body",
            "isRead": true
        });

        let item: Notification = serde_json::from_value(value).unwrap();
        assert_eq!(item.resolved_id(), Some("n-7"));
        assert_eq!(item.message, "legacy body");
        assert!(item.is_read);
        assert!(item.created_at.is_none());
    }

    #[test]
    fn test_blank_id_is_unresolved() {
        let item: Notification = serde_json::from_value(json!({ "_id": "   " })).unwrap();
        assert_eq!(item.resolved_id(), None);

        let item: Notification = serde_json::from_value(json!({})).unwrap();
        assert_eq!(item.resolved_id(), None);
    }

    #[test]
    fn test_display_title_fallback() {
        let mut item: Notification = serde_json::from_value(json!({ "_id": "a" })).unwrap();
        assert_eq!(item.display_title(), "Notification");

        item.title = "Comment reply".to_string();
        assert_eq!(item.display_title(), "Comment reply");
    }

    #[test]
    fn test_unread_count() {
        let items: Vec<Notification> = serde_json::from_value(json!([
            { "_id": "a", "isRead": false },
            { "_id": "b", "isRead": false },
            { "_id": "c", "isRead": true }
        ]))
        .unwrap();

        assert_eq!(unread_count(&items), 2);
        assert_eq!(unread_count(&[]), 0);
    }

    #[test]
    fn test_mark_read_body_is_explicit() {
        let body = serde_json::to_value(MarkReadRequest::default()).unwrap();
        assert_eq!(body, json!({ "isRead": true }));
    }

    #[test]
    fn test_list_payload_shapes() {
        let bare: ListPayload<Notification> =
            serde_json::from_value(json!([{ "_id": "a" }])).unwrap();
        assert_eq!(bare.into_items().len(), 1);

        let wrapped: ListPayload<Notification> =
            serde_json::from_value(json!({ "data": [{ "_id": "a" }, { "_id": "b" }] })).unwrap();
        assert_eq!(wrapped.into_items().len(), 2);

        let invalid = serde_json::from_value::<ListPayload<Notification>>(json!({ "count": 3 }));
        assert!(invalid.is_err());
    }

    #[test]
    fn test_search_response_without_data() {
        let response: ApiResponse<MovieSummary> = serde_json::from_value(json!({})).unwrap();
        assert!(response.into_items().is_empty());

        let response: ApiResponse<MovieSummary> = serde_json::from_value(json!({
            "data": [{ "_id": "m1", "title": "Dune", "posterUrl": "https://img/dune.jpg" }]
        }))
        .unwrap();
        let items = response.into_items();
        assert_eq!(items[0].id, "m1");
        assert_eq!(items[0].poster_url.as_deref(), Some("https://img/dune.jpg"));
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.settle_delay(), Duration::from_millis(500));
        assert_eq!(config.resync_delay(), Duration::from_millis(1000));
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.suggestion_limit, 4);
    }
}
