// ==========================================
// 自助终端管理后台 - API 层
// ==========================================
// 职责: 提供导入界面调用的业务 API 接口
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use import_api::{
    ApiLoadResponse, ImportApi, SessionView, SubmitResponse, TemplateResponse, ZipLoadResponse,
};
