// ==========================================
// 自助终端管理后台 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，将导入层错误转换为用户可读的错误消息
// 界面按类别呈现: 结构性错误 / 传输错误 / 会话状态错误
// ==========================================

use crate::importer::error::{ImportError, ImportErrorKind};
use serde::Serialize;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与结构错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 后端访问错误
    // ==========================================
    #[error("后端服务不可用: {0}")]
    BackendUnavailable(String),

    #[error("后端拒绝请求 (HTTP {status}): {message}")]
    BackendRejected { status: u16, message: String },

    // ==========================================
    // 会话状态错误
    // ==========================================
    #[error("已有导入操作正在进行，请稍后再试")]
    Busy,

    #[error("没有可导入的有效数据")]
    NothingToSubmit,

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::InvalidUrl(msg) => ApiError::InvalidInput(format!("无效的 URL: {}", msg)),
            ImportError::NoDataAtPath(_) | ImportError::NoValidRecords => {
                ApiError::ValidationError(err.to_string())
            }
            ImportError::BackendRejected { status, message } => {
                ApiError::BackendRejected { status, message }
            }
            ImportError::Busy => ApiError::Busy,
            ImportError::NothingToSubmit => ApiError::NothingToSubmit,
            ImportError::Other(e) => ApiError::Other(e),
            other => match other.kind() {
                ImportErrorKind::Structural => ApiError::ImportError(other.to_string()),
                ImportErrorKind::Transport => ApiError::BackendUnavailable(other.to_string()),
                ImportErrorKind::Session | ImportErrorKind::Internal => {
                    ApiError::InternalError(other.to_string())
                }
            },
        }
    }
}

impl ApiError {
    /// 错误类别代码（供界面选择呈现方式）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::ImportError(_) => "IMPORT_ERROR",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            ApiError::BackendRejected { .. } => "BACKEND_REJECTED",
            ApiError::Busy => "BUSY",
            ApiError::NothingToSubmit => "NOTHING_TO_SUBMIT",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// 序列化给界面的错误
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
