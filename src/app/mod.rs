// ==========================================
// 自助终端管理后台 - 应用层
// ==========================================
// 职责: 组装配置、后端客户端与导入API
// ==========================================

pub mod refresh;
pub mod state;

// 重导出
pub use refresh::ScopedRefreshTask;
pub use state::AppState;
