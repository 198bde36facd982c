// ==========================================
// 自助终端管理后台 - 导入会话
// ==========================================
// 一个导入界面的内存状态: 记录 / 错误 / 结构性错误 / 最近一次结果
// 状态机: Idle → Loading → {Validated | Failed}，reset 回到 Idle
// 同一会话同时只允许一个加载或提交操作
// ==========================================

use crate::domain::product::{BulkImportResult, ProductRecord, ValidationError};
use crate::domain::types::{AdapterState, SourceKind};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_pipeline::RowOutcome;
use crate::importer::zip_adapter::ZipUpload;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 默认预览条数
pub const DEFAULT_PREVIEW_LIMIT: usize = 5;

#[derive(Debug)]
pub struct ImportSession {
    session_id: Uuid,
    source: SourceKind,
    state: AdapterState,
    source_name: Option<String>,
    records: Vec<ProductRecord>,
    errors: Vec<ValidationError>,
    failure: Option<String>,
    archive: Option<ZipUpload>,
    last_result: Option<BulkImportResult>,
    loaded_at: Option<DateTime<Utc>>,
    preview_limit: usize,
    submitting: bool,
}

impl ImportSession {
    pub fn new(source: SourceKind, preview_limit: usize) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            source,
            state: AdapterState::Idle,
            source_name: None,
            records: Vec::new(),
            errors: Vec::new(),
            failure: None,
            archive: None,
            last_result: None,
            loaded_at: None,
            preview_limit,
            submitting: false,
        }
    }

    // ===== 查询 =====

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn archive(&self) -> Option<&ZipUpload> {
        self.archive.as_ref()
    }

    pub fn last_result(&self) -> Option<&BulkImportResult> {
        self.last_result.as_ref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// 前 N 条记录
    pub fn preview(&self) -> &[ProductRecord] {
        let end = self.records.len().min(self.preview_limit);
        &self.records[..end]
    }

    pub fn is_busy(&self) -> bool {
        self.state == AdapterState::Loading || self.submitting
    }

    // ===== 加载 =====

    /// 进入 Loading，清空上一次的状态
    pub fn begin_loading(&mut self) -> ImportResult<()> {
        if self.is_busy() {
            return Err(ImportError::Busy);
        }
        self.clear();
        self.state = AdapterState::Loading;
        debug!(session_id = %self.session_id, source = self.source.as_str(), "开始加载");
        Ok(())
    }

    /// 行处理完成
    pub fn complete(&mut self, source_name: impl Into<String>, outcome: RowOutcome) {
        self.source_name = Some(source_name.into());
        self.records = outcome.records;
        self.errors = outcome.errors;
        self.loaded_at = Some(Utc::now());
        self.state = if self.errors.is_empty() && !self.records.is_empty() {
            AdapterState::Validated
        } else {
            AdapterState::Failed
        };
        info!(
            session_id = %self.session_id,
            state = self.state.as_str(),
            records = self.records.len(),
            errors = self.errors.len(),
            "加载完成"
        );
    }

    /// 压缩包检查完成（记录由后端解析）
    pub fn complete_archive(&mut self, upload: ZipUpload) {
        self.source_name = Some(upload.file_name.clone());
        self.errors = upload.manifest.row_errors.clone();
        self.archive = Some(upload);
        self.loaded_at = Some(Utc::now());
        self.state = AdapterState::Validated;
    }

    /// 结构性错误: 无记录，只保留一条错误信息
    pub fn fail(&mut self, error: &ImportError) {
        self.records.clear();
        self.errors.clear();
        self.archive = None;
        self.failure = Some(error.to_string());
        self.state = AdapterState::Failed;
        warn!(session_id = %self.session_id, error = %error, "加载失败");
    }

    pub fn reset(&mut self) {
        self.clear();
        self.state = AdapterState::Idle;
        self.submitting = false;
    }

    fn clear(&mut self) {
        self.source_name = None;
        self.records.clear();
        self.errors.clear();
        self.failure = None;
        self.archive = None;
        self.last_result = None;
        self.loaded_at = None;
    }

    // ===== 提交 =====

    /// 开始提交记录，返回待提交的记录副本
    pub fn begin_submit(&mut self) -> ImportResult<Vec<ProductRecord>> {
        if self.is_busy() {
            return Err(ImportError::Busy);
        }
        if self.records.is_empty() || self.state != AdapterState::Validated {
            return Err(ImportError::NothingToSubmit);
        }
        self.submitting = true;
        self.failure = None;
        Ok(self.records.clone())
    }

    /// 开始提交压缩包
    pub fn begin_submit_archive(&mut self) -> ImportResult<ZipUpload> {
        if self.is_busy() {
            return Err(ImportError::Busy);
        }
        let upload = self.archive.clone().ok_or(ImportError::NothingToSubmit)?;
        self.submitting = true;
        self.failure = None;
        Ok(upload)
    }

    /// 提交完成: 全部成功才清空记录，部分成功保留以便用户查看
    pub fn finish_submit(&mut self, result: BulkImportResult) {
        self.submitting = false;
        if result.is_full_success() {
            self.records.clear();
            self.errors.clear();
            self.archive = None;
            self.state = AdapterState::Idle;
        } else {
            self.state = AdapterState::Validated;
        }
        self.last_result = Some(result);
    }

    /// 提交失败（传输错误），记录保持不变
    pub fn abort_submit(&mut self, error: &ImportError) {
        self.submitting = false;
        self.failure = Some(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str) -> ProductRecord {
        ProductRecord {
            code: code.to_string(),
            name: "A".to_string(),
            category: "C".to_string(),
            price: 1.0,
            details: "d".to_string(),
            promotion: String::new(),
        }
    }

    fn loaded_session(count: usize) -> ImportSession {
        let mut session = ImportSession::new(SourceKind::Spreadsheet, DEFAULT_PREVIEW_LIMIT);
        session.begin_loading().unwrap();
        let outcome = RowOutcome {
            total: count,
            records: (0..count).map(|i| record(&i.to_string())).collect(),
            errors: Vec::new(),
            dropped: 0,
        };
        session.complete("productos.xlsx", outcome);
        session
    }

    fn result(inserted: u64, failed: u64) -> BulkImportResult {
        BulkImportResult {
            inserted,
            failed,
            total: inserted + failed,
            details: None,
        }
    }

    #[test]
    fn test_preview_is_capped() {
        let session = loaded_session(8);
        assert_eq!(session.state(), AdapterState::Validated);
        assert_eq!(session.preview().len(), 5);
        assert_eq!(session.records().len(), 8);
    }

    #[test]
    fn test_begin_loading_while_loading_is_busy() {
        let mut session = ImportSession::new(SourceKind::Zip, DEFAULT_PREVIEW_LIMIT);
        session.begin_loading().unwrap();
        assert!(matches!(session.begin_loading(), Err(ImportError::Busy)));
        assert!(matches!(session.begin_submit(), Err(ImportError::Busy)));
    }

    #[test]
    fn test_empty_session_has_nothing_to_submit() {
        let mut session = ImportSession::new(SourceKind::Spreadsheet, DEFAULT_PREVIEW_LIMIT);
        assert!(matches!(session.begin_submit(), Err(ImportError::NothingToSubmit)));
    }

    #[test]
    fn test_partial_result_keeps_records() {
        let mut session = loaded_session(3);
        session.begin_submit().unwrap();
        session.finish_submit(result(2, 1));

        assert_eq!(session.records().len(), 3);
        assert_eq!(session.state(), AdapterState::Validated);
        assert_eq!(session.last_result().map(|r| r.failed), Some(1));
    }

    #[test]
    fn test_full_success_clears_records() {
        let mut session = loaded_session(3);
        session.begin_submit().unwrap();
        session.finish_submit(result(3, 0));

        assert!(session.records().is_empty());
        assert_eq!(session.state(), AdapterState::Idle);
        assert!(session.last_result().is_some());
    }

    #[test]
    fn test_structural_failure_keeps_single_message() {
        let mut session = loaded_session(2);
        session.begin_loading().unwrap();
        session.fail(&ImportError::MissingColumns(vec!["price".to_string()]));

        assert_eq!(session.state(), AdapterState::Failed);
        assert!(session.records().is_empty());
        assert!(session.errors().is_empty());
        assert_eq!(session.failure(), Some("缺少必填列: price"));
    }

    #[test]
    fn test_row_errors_leave_session_failed() {
        let mut session = ImportSession::new(SourceKind::Spreadsheet, DEFAULT_PREVIEW_LIMIT);
        session.begin_loading().unwrap();
        session.complete(
            "productos.csv",
            RowOutcome {
                total: 1,
                records: Vec::new(),
                errors: vec![ValidationError::for_field(2, "price", "bad")],
                dropped: 1,
            },
        );
        assert_eq!(session.state(), AdapterState::Failed);
        assert!(matches!(session.begin_submit(), Err(ImportError::NothingToSubmit)));
    }

    #[test]
    fn test_abort_submit_keeps_records_and_allows_retry() {
        let mut session = loaded_session(2);
        session.begin_submit().unwrap();
        session.abort_submit(&ImportError::Transport("timeout".to_string()));

        assert_eq!(session.records().len(), 2);
        assert!(session.begin_submit().is_ok());
    }

    #[test]
    fn test_successful_retry_clears_transport_failure() {
        let mut session = loaded_session(1);
        session.begin_submit().unwrap();
        session.abort_submit(&ImportError::Transport("timeout".to_string()));
        assert_eq!(session.failure(), Some("网络请求失败: timeout"));

        session.begin_submit().unwrap();
        session.finish_submit(result(1, 0));

        assert_eq!(session.state(), AdapterState::Idle);
        assert_eq!(session.last_result().map(|r| r.failed), Some(0));
        assert!(session.failure().is_none());
    }
}
