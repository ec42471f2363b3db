use crate::error::*;
use crate::SdkResult;
use flixsync_core::*;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Clone)]
pub struct FlixsyncClient {
    client: Client,
    pub base_url: String,
    pub timeout: Duration,
}

impl FlixsyncClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.server_url).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> SdkResult<Url> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Ok(Url::parse(&url)?)
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", token))
    }

    fn check_status(response: Response) -> SdkResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(SdkError::ApiError {
                status: status.as_u16(),
            })
        }
    }

    /// 获取当前用户的通知列表
    pub async fn list_notifications(&self, token: &str) -> SdkResult<Vec<Notification>> {
        let token = require_token(token)?;
        let url = self.endpoint("notifications")?;
        debug!(%url, "listing notifications");

        let response = self
            .authorized(self.client.get(url), token)
            .send()
            .await
            .map_err(SdkError::from_send)?;
        let response = Self::check_status(response)?;
        let bytes = response.bytes().await?;
        let payload: ListPayload<Notification> = serde_json::from_slice(&bytes)?;

        Ok(payload.into_items())
    }

    /// 标记单条通知为已读，请求体必须是一个完整的 JSON 对象
    pub async fn mark_read(
        &self,
        notification_id: &str,
        token: &str,
        body: &MarkReadRequest,
    ) -> SdkResult<Notification> {
        let id = require_id(notification_id)?;
        let token = require_token(token)?;
        let url = self.endpoint(&format!("notifications/{}/read", id))?;
        debug!(%url, "marking notification as read");

        let response = self
            .authorized(self.client.patch(url), token)
            .json(body)
            .send()
            .await
            .map_err(SdkError::from_send)?;
        let response = Self::check_status(response)?;
        let bytes = response.bytes().await?;

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// 删除单条通知
    pub async fn delete_notification(&self, notification_id: &str, token: &str) -> SdkResult<()> {
        let id = require_id(notification_id)?;
        let token = require_token(token)?;
        let url = self.endpoint(&format!("notifications/{}", id))?;
        debug!(%url, "deleting notification");

        let response = self
            .authorized(self.client.delete(url), token)
            .send()
            .await
            .map_err(SdkError::from_send)?;
        Self::check_status(response)?;
        Ok(())
    }

    /// 按片名搜索影片
    pub async fn search_by_title(&self, query: &str) -> SdkResult<Vec<MovieSummary>> {
        let url = self.endpoint("movies")?;
        debug!(%url, query, "searching movies");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(SdkError::from_send)?;
        let response = Self::check_status(response)?;
        let bytes = response.bytes().await?;
        let payload: ApiResponse<MovieSummary> = serde_json::from_slice(&bytes)?;

        Ok(payload.into_items())
    }
}

fn require_id(notification_id: &str) -> SdkResult<&str> {
    let id = notification_id.trim();
    if id.is_empty() {
        return Err(SdkError::Validation("Notification ID is required".to_string()));
    }
    Ok(id)
}

fn require_token(token: &str) -> SdkResult<&str> {
    if token.trim().is_empty() {
        return Err(SdkError::Validation("Token is required".to_string()));
    }
    Ok(token)
}
