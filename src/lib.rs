// ==========================================
// 自助终端管理后台 - 商品批量导入核心库
// ==========================================
// 来源: Excel/CSV 表格、ZIP 压缩包、外部 JSON API
// 流程: 解析 → 标准化 → 校验 → 提交后端批量接口
// 技术栈: tokio + reqwest + calamine/csv/zip
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 解析/标准化/校验/提交
pub mod importer;

// 后端访问层 - HTTP 客户端
pub mod backend;

// 配置层 - 系统配置
pub mod config;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装与定时任务
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AdapterState, ImportPolicy, SourceKind};

// 领域实体
pub use domain::{BulkImportResult, ProductRecord, RowFailure, ValidationError};

// 导入
pub use importer::{ImportError, ImportResult, ImportSession, SubmissionOrchestrator};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "自助终端管理后台 - 商品批量导入";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
