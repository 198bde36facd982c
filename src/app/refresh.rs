// ==========================================
// 自助终端管理后台 - 定时刷新任务
// ==========================================
// 职责: 按固定间隔执行回调（如后端状态轮询）
// 生命周期: 与句柄绑定，cancel() 或句柄销毁时停止
// ==========================================

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// 作用域内的定时任务
pub struct ScopedRefreshTask {
    name: String,
    handle: Option<JoinHandle<()>>,
}

impl ScopedRefreshTask {
    /// 启动定时任务（第一次回调立即执行）
    ///
    /// 必须在 tokio 运行时内调用
    pub fn spawn<F, Fut>(name: impl Into<String>, interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // 回调耗时超过间隔时不补跑
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                debug!(task = %task_name, "执行定时刷新");
                tick().await;
            }
        });

        Self {
            name,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 停止任务（幂等）
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!(task = %self.name, "定时刷新已停止");
        }
    }
}

impl Drop for ScopedRefreshTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(counter: Arc<AtomicUsize>) -> ScopedRefreshTask {
        ScopedRefreshTask::spawn("test", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    #[tokio::test]
    async fn test_task_ticks_until_cancelled() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut task = counting_task(counter.clone());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(task.is_running());
        task.cancel();
        assert!(!task.is_running());

        // 等待 abort 生效后计数不再增长
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_cancel = counter.load(Ordering::SeqCst);
        assert!(after_cancel >= 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), after_cancel);
    }

    #[tokio::test]
    async fn test_task_stops_when_dropped() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let _task = counting_task(counter.clone());
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_drop = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), after_drop);
    }
}
