use flixsync_sdk::{SdkError, SdkResult};
use std::future::Future;
use tokio::task::JoinSet;
use tracing::error;

/// 批量请求的逐项结果
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, SdkError)>,
    /// 任务本身被取消或 panic 的数量
    pub aborted: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.aborted
    }

    pub fn failures(&self) -> usize {
        self.failed.len() + self.aborted
    }
}

/// 并发发出所有请求并等待全部结束，单个失败不会取消其他请求
pub(crate) async fn run_all<F, Fut>(ids: Vec<String>, op: F) -> BatchReport
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = SdkResult<()>> + Send + 'static,
{
    let mut set = JoinSet::new();
    for id in ids {
        let request = op(id.clone());
        set.spawn(async move { (id, request.await) });
    }

    let mut report = BatchReport::default();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((id, Ok(()))) => report.succeeded.push(id),
            Ok((id, Err(err))) => {
                error!(id = %id, error = %err, "batch request failed");
                report.failed.push((id, err));
            }
            Err(err) => {
                error!(error = %err, "batch task did not complete");
                report.aborted += 1;
            }
        }
    }
    report
}
