// ==========================================
// 商品批量导入API
// ==========================================
// 职责: 封装三个导入界面（表格 / ZIP / 外部 API）的全部操作
// 每个来源一个会话；同一会话同时只允许一个加载或提交
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::backend::client::{JsonSource, ProductBackend};
use crate::backend::name_resolver::resolve_names;
use crate::config::ImportConfigReader;
use crate::domain::product::{BulkImportResult, ProductRecord, ValidationError};
use crate::domain::types::{AdapterState, SourceKind};
use crate::importer::api_adapter::{ExternalApiAdapter, ExternalApiConfig};
use crate::importer::session::ImportSession;
use crate::importer::spreadsheet_adapter::SpreadsheetAdapter;
use crate::importer::submission::{format_result_summary, SubmissionOrchestrator, SUMMARY_DETAIL_LIMIT};
use crate::importer::zip_adapter::{ZipAdapter, ZipManifest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, instrument};

/// 会话视图（返回给界面）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub source: SourceKind,
    pub state: AdapterState,
    pub source_name: Option<String>,
    /// 可导入记录数
    pub record_count: usize,
    /// 前 N 条记录
    pub preview: Vec<ProductRecord>,
    /// 行级错误（表格导入时阻止提交）
    pub errors: Vec<ValidationError>,
    /// 结构性错误或上一次提交失败的原因
    pub failure: Option<String>,
    pub last_result: Option<BulkImportResult>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl SessionView {
    fn from_session(session: &ImportSession) -> Self {
        let preview = match session.archive() {
            Some(upload) => upload.manifest.preview.clone(),
            None => session.preview().to_vec(),
        };
        Self {
            session_id: session.session_id().to_string(),
            source: session.source(),
            state: session.state(),
            source_name: session.source_name().map(str::to_string),
            record_count: session.records().len(),
            preview,
            errors: session.errors().to_vec(),
            failure: session.failure().map(str::to_string),
            last_result: session.last_result().cloned(),
            loaded_at: session.loaded_at(),
        }
    }
}

/// ZIP 加载响应
#[derive(Debug, Clone, Serialize)]
pub struct ZipLoadResponse {
    pub session: SessionView,
    pub manifest: ZipManifest,
}

/// 外部 API 测试响应
#[derive(Debug, Clone, Serialize)]
pub struct ApiLoadResponse {
    pub session: SessionView,
    /// 按路径提取到的元素数
    pub extracted: usize,
    /// 被丢弃的无效元素数
    pub dropped: usize,
}

/// 提交响应
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    /// 后端结果（原样）
    pub result: BulkImportResult,
    /// 给用户的摘要文本
    pub summary: String,
    pub session: SessionView,
}

/// 模板下载响应
#[derive(Debug, Clone, Serialize)]
pub struct TemplateResponse {
    pub path: String,
    pub size: usize,
}

/// 商品批量导入API
pub struct ImportApi {
    backend: Arc<dyn ProductBackend>,
    spreadsheet_adapter: SpreadsheetAdapter,
    zip_adapter: ZipAdapter,
    api_adapter: ExternalApiAdapter,
    orchestrator: SubmissionOrchestrator,
    spreadsheet_session: Mutex<ImportSession>,
    zip_session: Mutex<ImportSession>,
    external_session: Mutex<ImportSession>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(
        backend: Arc<dyn ProductBackend>,
        json_source: Arc<dyn JsonSource>,
        config: &dyn ImportConfigReader,
    ) -> Self {
        let preview_limit = config.preview_limit();
        Self {
            backend: backend.clone(),
            spreadsheet_adapter: SpreadsheetAdapter::default(),
            zip_adapter: ZipAdapter::new(
                config.zip_max_bytes(),
                config.zip_spreadsheet_stem(),
                preview_limit,
            ),
            api_adapter: ExternalApiAdapter::new(json_source),
            orchestrator: SubmissionOrchestrator::new(backend),
            spreadsheet_session: Mutex::new(ImportSession::new(SourceKind::Spreadsheet, preview_limit)),
            zip_session: Mutex::new(ImportSession::new(SourceKind::Zip, preview_limit)),
            external_session: Mutex::new(ImportSession::new(SourceKind::ExternalApi, preview_limit)),
        }
    }

    fn session_mutex(&self, source: SourceKind) -> &Mutex<ImportSession> {
        match source {
            SourceKind::Spreadsheet => &self.spreadsheet_session,
            SourceKind::Zip => &self.zip_session,
            SourceKind::ExternalApi => &self.external_session,
        }
    }

    /// 获取会话锁；会话正被其他操作占用时返回 Busy
    ///
    /// 加载与提交期间一直持有锁，所以界面看不到 Loading 状态，
    /// 对应的信号是 `ApiError::Busy` 或 [`ImportApi::is_busy`]
    fn lock_session(&self, source: SourceKind) -> ApiResult<MutexGuard<'_, ImportSession>> {
        self.session_mutex(source)
            .try_lock()
            .map_err(|_| ApiError::Busy)
    }

    /// 会话是否有加载或提交正在进行（不等待锁）
    pub fn is_busy(&self, source: SourceKind) -> bool {
        match self.session_mutex(source).try_lock() {
            Ok(session) => session.is_busy(),
            Err(_) => true,
        }
    }

    // ==========================================
    // 加载
    // ==========================================

    /// 加载表格文件（.xlsx/.xls/.csv）
    #[instrument(skip(self))]
    pub async fn load_spreadsheet(&self, file_path: &str) -> ApiResult<SessionView> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }

        let mut session = self.lock_session(SourceKind::Spreadsheet)?;
        session.begin_loading()?;

        match self.spreadsheet_adapter.load_file(file_path).await {
            Ok(load) => session.complete(load.source_name, load.outcome),
            Err(e) => {
                session.fail(&e);
                return Err(e.into());
            }
        }
        Ok(SessionView::from_session(&session))
    }

    /// 加载内存中的表格文件（界面上传）
    pub async fn load_spreadsheet_bytes(&self, file_name: &str, bytes: &[u8]) -> ApiResult<SessionView> {
        let mut session = self.lock_session(SourceKind::Spreadsheet)?;
        session.begin_loading()?;

        match self.spreadsheet_adapter.load_bytes(file_name, bytes) {
            Ok(load) => session.complete(load.source_name, load.outcome),
            Err(e) => {
                session.fail(&e);
                return Err(e.into());
            }
        }
        Ok(SessionView::from_session(&session))
    }

    /// 加载并检查 ZIP 压缩包
    #[instrument(skip(self))]
    pub async fn load_zip(&self, file_path: &str) -> ApiResult<ZipLoadResponse> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }

        let mut session = self.lock_session(SourceKind::Zip)?;
        session.begin_loading()?;

        let manifest = match self.zip_adapter.inspect_file(file_path).await {
            Ok(upload) => {
                let manifest = upload.manifest.clone();
                session.complete_archive(upload);
                manifest
            }
            Err(e) => {
                session.fail(&e);
                return Err(e.into());
            }
        };

        Ok(ZipLoadResponse {
            session: SessionView::from_session(&session),
            manifest,
        })
    }

    /// 请求外部 API 并校验数据（“测试连接”）
    #[instrument(skip(self, config), fields(url = %config.url))]
    pub async fn test_api_connection(&self, config: &ExternalApiConfig) -> ApiResult<ApiLoadResponse> {
        let mut session = self.lock_session(SourceKind::ExternalApi)?;
        session.begin_loading()?;

        let fetch = match self.api_adapter.fetch(config).await {
            Ok(fetch) => fetch,
            Err(e) => {
                session.fail(&e);
                return Err(e.into());
            }
        };

        let extracted = fetch.extracted;
        let dropped = fetch.outcome.dropped;
        session.complete(config.url.clone(), fetch.outcome);

        Ok(ApiLoadResponse {
            session: SessionView::from_session(&session),
            extracted,
            dropped,
        })
    }

    // ==========================================
    // 提交
    // ==========================================

    /// 提交指定来源会话中的数据
    #[instrument(skip(self))]
    pub async fn submit(&self, source: SourceKind) -> ApiResult<SubmitResponse> {
        if source == SourceKind::Zip {
            return self.submit_zip().await;
        }

        let mut session = self.lock_session(source)?;
        let result = self.orchestrator.submit(&mut session).await?;
        Ok(Self::submit_response(result, &session))
    }

    /// 上传已检查的压缩包
    #[instrument(skip(self))]
    pub async fn submit_zip(&self) -> ApiResult<SubmitResponse> {
        let mut session = self.lock_session(SourceKind::Zip)?;
        let result = self.orchestrator.submit_zip(&mut session).await?;
        Ok(Self::submit_response(result, &session))
    }

    fn submit_response(result: BulkImportResult, session: &ImportSession) -> SubmitResponse {
        SubmitResponse {
            summary: format_result_summary(&result, SUMMARY_DETAIL_LIMIT),
            result,
            session: SessionView::from_session(session),
        }
    }

    // ==========================================
    // 其他操作
    // ==========================================

    /// 清空会话，回到 Idle
    pub fn reset(&self, source: SourceKind) -> ApiResult<SessionView> {
        let mut session = self.lock_session(source)?;
        session.reset();
        info!(source = source.as_str(), "会话已重置");
        Ok(SessionView::from_session(&session))
    }

    /// 查看会话当前状态
    ///
    /// 操作进行中返回 `ApiError::Busy`，可先用 [`ImportApi::is_busy`] 轮询
    pub fn session_view(&self, source: SourceKind) -> ApiResult<SessionView> {
        let session = self.lock_session(source)?;
        Ok(SessionView::from_session(&session))
    }

    /// 下载导入模板并保存到指定路径
    pub async fn download_template(&self, output_path: &str) -> ApiResult<TemplateResponse> {
        if output_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("保存路径不能为空".to_string()));
        }

        let bytes = self.backend.download_template().await?;
        let path = Path::new(output_path);
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| ApiError::InternalError(format!("模板保存失败: {}", e)))?;

        info!(path = %path.display(), size = bytes.len(), "模板已保存");
        Ok(TemplateResponse {
            path: path.display().to_string(),
            size: bytes.len(),
        })
    }

    /// 批量解析商品名称（失败的编码显示占位名称）
    pub async fn resolve_product_names(&self, codes: &[String]) -> HashMap<String, String> {
        resolve_names(self.backend.as_ref(), codes).await
    }

    /// 后端连通性检查
    pub async fn check_backend(&self) -> bool {
        self.backend.ping().await.is_ok()
    }
}
