// ==========================================
// 自助终端管理后台 - 商品名称批量解析
// ==========================================
// 用于结果展示: 按编码并发查询名称，失败时使用占位名称
// ==========================================

use crate::backend::client::ProductBackend;
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, warn};

/// 查询失败时显示的名称
pub const UNKNOWN_PRODUCT_NAME: &str = "Producto Desconocido";

/// 并发解析商品名称（编码去重，单个失败不影响其他）
pub async fn resolve_names(backend: &dyn ProductBackend, codes: &[String]) -> HashMap<String, String> {
    let mut unique: Vec<&String> = Vec::new();
    for code in codes {
        if !code.trim().is_empty() && !unique.contains(&code) {
            unique.push(code);
        }
    }

    let lookups = unique.iter().map(|code| async move {
        let name = match backend.product_name(code).await {
            Ok(name) => name,
            Err(e) => {
                warn!(code = %code, error = %e, "商品名称查询失败");
                UNKNOWN_PRODUCT_NAME.to_string()
            }
        };
        ((*code).clone(), name)
    });

    let names: HashMap<String, String> = join_all(lookups).await.into_iter().collect();
    debug!(requested = codes.len(), resolved = names.len(), "商品名称解析完成");
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::{BulkImportResult, ProductRecord};
    use crate::importer::error::{ImportError, ImportResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NameBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProductBackend for NameBackend {
        async fn bulk_create(&self, _records: &[ProductRecord]) -> ImportResult<BulkImportResult> {
            unimplemented!()
        }

        async fn bulk_create_zip(&self, _file_name: &str, _bytes: Vec<u8>) -> ImportResult<BulkImportResult> {
            unimplemented!()
        }

        async fn download_template(&self) -> ImportResult<Vec<u8>> {
            unimplemented!()
        }

        async fn product_name(&self, code: &str) -> ImportResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match code {
                "7501" => Ok("Agua".to_string()),
                _ => Err(ImportError::BackendRejected {
                    status: 404,
                    message: "not found".to_string(),
                }),
            }
        }

        async fn ping(&self) -> ImportResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_resolve_names_dedupes_and_falls_back() {
        let backend = NameBackend {
            calls: AtomicUsize::new(0),
        };
        let codes = vec!["7501".to_string(), "9999".to_string(), "7501".to_string()];

        let names = resolve_names(&backend, &codes).await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(names.get("7501").map(String::as_str), Some("Agua"));
        assert_eq!(names.get("9999").map(String::as_str), Some(UNKNOWN_PRODUCT_NAME));
    }
}
