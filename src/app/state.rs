// ==========================================
// 自助终端管理后台 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 启动时解析一次配置，构建后端客户端与导入API
// ==========================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::api::ImportApi;
use crate::app::refresh::ScopedRefreshTask;
use crate::backend::client::{HttpBackend, ProductBackend};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::importer::error::ImportResult;

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 后端客户端
    pub backend: Arc<HttpBackend>,

    /// 商品导入API
    pub import_api: Arc<ImportApi>,

    /// 最近一次探测的后端连通状态
    pub backend_online: Arc<AtomicBool>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 读取后端地址与超时配置
    /// 2. 创建 HTTP 客户端
    /// 3. 创建导入API
    pub fn new(config: ConfigManager) -> ImportResult<Self> {
        let base_url = config.backend_base_url();
        tracing::info!("初始化AppState，后端地址: {}", base_url);

        let backend = Arc::new(HttpBackend::new(&base_url, config.request_timeout_secs())?);
        let import_api = Arc::new(ImportApi::new(backend.clone(), backend.clone(), &config));

        Ok(Self {
            config: Arc::new(config),
            backend,
            import_api,
            backend_online: Arc::new(AtomicBool::new(false)),
        })
    }

    /// 从环境变量创建
    pub fn from_env() -> ImportResult<Self> {
        Self::new(ConfigManager::from_env())
    }

    pub fn is_backend_online(&self) -> bool {
        self.backend_online.load(Ordering::SeqCst)
    }

    /// 启动后端状态轮询；返回的句柄销毁时轮询停止
    pub fn spawn_backend_monitor(&self) -> ScopedRefreshTask {
        let interval = Duration::from_secs(self.config.refresh_interval_secs());
        let backend: Arc<dyn ProductBackend> = self.backend.clone();
        let online = self.backend_online.clone();

        ScopedRefreshTask::spawn("backend-monitor", interval, move || {
            let backend = backend.clone();
            let online = online.clone();
            async move {
                let reachable = backend.ping().await.is_ok();
                let previous = online.swap(reachable, Ordering::SeqCst);
                if previous != reachable {
                    if reachable {
                        tracing::info!("后端连接已恢复");
                    } else {
                        tracing::warn!("后端不可达");
                    }
                }
            }
        })
    }
}
