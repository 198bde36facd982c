// ==========================================
// 自助终端管理后台 - 领域模型层
// ==========================================
// 职责: 定义导入流程的数据结构与枚举
// 红线: 不含网络访问逻辑,不含解析逻辑
// ==========================================

pub mod product;
pub mod types;

// 重导出核心类型
pub use product::{BulkImportResult, ProductRecord, RowFailure, ValidationError};
pub use types::{AdapterState, ImportPolicy, SourceKind};
