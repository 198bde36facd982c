// ==========================================
// 自助终端管理后台 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 结构性错误 / 传输错误 / 会话错误
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误（结构性） =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("缺少必填列: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("文件为空或没有数据行")]
    EmptyFile,

    // ===== 压缩包相关错误（结构性） =====
    #[error("压缩包格式不支持: {0}（仅支持 .zip）")]
    UnsupportedArchive(String),

    #[error("压缩包过大: {size} 字节，上限 {limit} 字节")]
    ArchiveTooLarge { size: u64, limit: u64 },

    #[error("压缩包读取失败: {0}")]
    ArchiveReadError(String),

    #[error("压缩包中缺少表格文件: {0}")]
    ArchiveEntryMissing(String),

    // ===== 外部 API 数据错误（结构性） =====
    #[error("指定路径下没有数据: {0}")]
    NoDataAtPath(String),

    #[error("数据结构不正确，没有可导入的记录")]
    NoValidRecords,

    // ===== 传输错误 =====
    #[error("网络请求失败: {0}")]
    Transport(String),

    #[error("后端拒绝请求 (HTTP {status}): {message}")]
    BackendRejected { status: u16, message: String },

    #[error("响应解析失败 ({context}): {message}")]
    Deserialize { context: String, message: String },

    #[error("无效的 URL: {0}")]
    InvalidUrl(String),

    // ===== 会话错误 =====
    #[error("已有导入操作正在进行")]
    Busy,

    #[error("没有可导入的有效数据")]
    NothingToSubmit,

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 错误分类（决定界面如何呈现）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportErrorKind {
    /// 行处理之前发现的问题，整次导入中止
    Structural,
    /// 网络/后端问题，需用户手动重试
    Transport,
    /// 会话状态不允许该操作
    Session,
    /// 其他内部错误
    Internal,
}

impl ImportError {
    pub fn kind(&self) -> ImportErrorKind {
        match self {
            ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::FileReadError(_)
            | ImportError::ExcelParseError(_)
            | ImportError::CsvParseError(_)
            | ImportError::MissingColumns(_)
            | ImportError::EmptyFile
            | ImportError::UnsupportedArchive(_)
            | ImportError::ArchiveTooLarge { .. }
            | ImportError::ArchiveReadError(_)
            | ImportError::ArchiveEntryMissing(_)
            | ImportError::NoDataAtPath(_)
            | ImportError::NoValidRecords => ImportErrorKind::Structural,

            ImportError::Transport(_)
            | ImportError::BackendRejected { .. }
            | ImportError::Deserialize { .. }
            | ImportError::InvalidUrl(_) => ImportErrorKind::Transport,

            ImportError::Busy | ImportError::NothingToSubmit => ImportErrorKind::Session,

            ImportError::InternalError(_) | ImportError::Other(_) => ImportErrorKind::Internal,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<zip::result::ZipError>
impl From<zip::result::ZipError> for ImportError {
    fn from(err: zip::result::ZipError) -> Self {
        ImportError::ArchiveReadError(err.to_string())
    }
}

// 实现 From<reqwest::Error>
impl From<reqwest::Error> for ImportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ImportError::Transport(format!("请求超时: {}", err))
        } else if err.is_decode() {
            ImportError::Deserialize {
                context: err
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.to_string(),
            }
        } else {
            ImportError::Transport(err.to_string())
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_all() {
        let err = ImportError::MissingColumns(vec!["price".to_string(), "details".to_string()]);
        assert_eq!(err.to_string(), "缺少必填列: price, details");
        assert_eq!(err.kind(), ImportErrorKind::Structural);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ImportError::BackendRejected {
                status: 500,
                message: "boom".to_string()
            }
            .kind(),
            ImportErrorKind::Transport
        );
        assert_eq!(ImportError::Busy.kind(), ImportErrorKind::Session);
        assert_eq!(
            ImportError::ArchiveTooLarge { size: 2, limit: 1 }.kind(),
            ImportErrorKind::Structural
        );
    }
}
