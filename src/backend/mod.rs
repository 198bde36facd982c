// ==========================================
// 自助终端管理后台 - 后端访问层
// ==========================================

pub mod client;
pub mod name_resolver;

pub use client::{HttpBackend, JsonSource, ProductBackend};
pub use name_resolver::{resolve_names, UNKNOWN_PRODUCT_NAME};
