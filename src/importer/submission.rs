// ==========================================
// 自助终端管理后台 - 批量提交编排
// ==========================================
// 职责: 将已校验记录（或压缩包）提交到后端批量接口
// 红线:
// - 不重新校验，不重算后端返回的统计
// - 不自动重试
// - 仅在 failed == 0 时清空会话记录
// ==========================================

use crate::backend::client::ProductBackend;
use crate::domain::product::{BulkImportResult, ProductRecord};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::session::ImportSession;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// 结果摘要中最多列出的失败明细条数
pub const SUMMARY_DETAIL_LIMIT: usize = 10;

pub struct SubmissionOrchestrator {
    backend: Arc<dyn ProductBackend>,
}

impl SubmissionOrchestrator {
    pub fn new(backend: Arc<dyn ProductBackend>) -> Self {
        Self { backend }
    }

    /// 提交会话中的记录
    #[instrument(skip(self, session), fields(session_id = %session.session_id()))]
    pub async fn submit(&self, session: &mut ImportSession) -> ImportResult<BulkImportResult> {
        let records = session.begin_submit()?;

        match self.submit_records(&records).await {
            Ok(result) => {
                session.finish_submit(result.clone());
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, "批量提交失败");
                session.abort_submit(&e);
                Err(e)
            }
        }
    }

    /// 直接提交记录（调用方保证记录已通过校验）
    pub async fn submit_records(&self, records: &[ProductRecord]) -> ImportResult<BulkImportResult> {
        if records.is_empty() {
            return Err(ImportError::NothingToSubmit);
        }

        info!(count = records.len(), "开始批量提交");
        let result = self.backend.bulk_create(records).await?;
        info!(
            inserted = result.inserted,
            failed = result.failed,
            total = result.total,
            "批量提交完成"
        );
        Ok(result)
    }

    /// 上传会话中已检查的压缩包
    #[instrument(skip(self, session), fields(session_id = %session.session_id()))]
    pub async fn submit_zip(&self, session: &mut ImportSession) -> ImportResult<BulkImportResult> {
        let upload = session.begin_submit_archive()?;

        match self
            .backend
            .bulk_create_zip(&upload.file_name, upload.bytes)
            .await
        {
            Ok(result) => {
                info!(
                    archive = %upload.file_name,
                    inserted = result.inserted,
                    failed = result.failed,
                    "压缩包导入完成"
                );
                session.finish_submit(result.clone());
                Ok(result)
            }
            Err(e) => {
                error!(archive = %upload.file_name, error = %e, "压缩包上传失败");
                session.abort_submit(&e);
                Err(e)
            }
        }
    }
}

/// 生成给用户看的结果摘要
pub fn format_result_summary(result: &BulkImportResult, limit: usize) -> String {
    let mut summary = format!(
        "导入完成: 成功 {} 条，失败 {} 条，共 {} 条",
        result.inserted, result.failed, result.total
    );

    let details = result.failure_details();
    for detail in details.iter().take(limit) {
        let _ = match &detail.code {
            Some(code) => write!(summary, "\n第 {} 行 [{}]: {}", detail.row, code, detail.error),
            None => write!(summary, "\n第 {} 行: {}", detail.row, detail.error),
        };
    }
    if details.len() > limit {
        let _ = write!(summary, "\n... 另有 {} 条错误", details.len() - limit);
    }
    summary
}
