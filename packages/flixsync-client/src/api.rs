use async_trait::async_trait;
use flixsync_sdk::{FlixsyncClient, MarkReadRequest, MovieSummary, Notification, SdkResult};

/// 通知接口
#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn list_notifications(&self, token: &str) -> SdkResult<Vec<Notification>>;

    async fn mark_read(
        &self,
        notification_id: &str,
        token: &str,
        body: &MarkReadRequest,
    ) -> SdkResult<Notification>;

    async fn delete_notification(&self, notification_id: &str, token: &str) -> SdkResult<()>;
}

/// 影片搜索接口
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search_by_title(&self, query: &str) -> SdkResult<Vec<MovieSummary>>;
}

#[async_trait]
impl NotificationApi for FlixsyncClient {
    async fn list_notifications(&self, token: &str) -> SdkResult<Vec<Notification>> {
        FlixsyncClient::list_notifications(self, token).await
    }

    async fn mark_read(
        &self,
        notification_id: &str,
        token: &str,
        body: &MarkReadRequest,
    ) -> SdkResult<Notification> {
        FlixsyncClient::mark_read(self, notification_id, token, body).await
    }

    async fn delete_notification(&self, notification_id: &str, token: &str) -> SdkResult<()> {
        FlixsyncClient::delete_notification(self, notification_id, token).await
    }
}

#[async_trait]
impl SearchApi for FlixsyncClient {
    async fn search_by_title(&self, query: &str) -> SdkResult<Vec<MovieSummary>> {
        FlixsyncClient::search_by_title(self, query).await
    }
}
