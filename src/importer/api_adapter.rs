// ==========================================
// 自助终端管理后台 - 外部 API 导入适配器
// ==========================================
// 流程: GET 外部接口 → 按路径提取数组 → 逐条标准化/校验
// 策略: BestEffort，无效记录静默丢弃（仅记录 warn 日志）
// ==========================================

use crate::backend::client::JsonSource;
use crate::domain::product::ProductRecord;
use crate::domain::types::ImportPolicy;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::row_pipeline::{RawRow, RowOutcome, RowPipeline};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 外部 API 连接配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalApiConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,
}

/// 外部 API 拉取结果
#[derive(Debug, Clone)]
pub struct ApiFetch {
    pub extracted: usize,
    pub outcome: RowOutcome,
}

impl ApiFetch {
    pub fn records(&self) -> &[ProductRecord] {
        &self.outcome.records
    }
}

/// 按点分路径提取数组
///
/// - 路径为空: 根节点本身须为数组
/// - 逐级在对象上查找键，任一步缺失或不是对象 → 空
/// - 最终不是数组 → 空
pub fn extract_by_path(json: &Value, path: Option<&str>) -> Vec<Value> {
    let path = path.map(str::trim).unwrap_or("");

    let mut current = json;
    if !path.is_empty() {
        for key in path.split('.') {
            match current {
                Value::Object(map) => match map.get(key) {
                    Some(next) => current = next,
                    None => return Vec::new(),
                },
                _ => return Vec::new(),
            }
        }
    }

    match current {
        Value::Array(items) => items.clone(),
        _ => Vec::new(),
    }
}

pub struct ExternalApiAdapter {
    source: Arc<dyn JsonSource>,
    pipeline: RowPipeline,
}

impl ExternalApiAdapter {
    pub fn new(source: Arc<dyn JsonSource>) -> Self {
        Self {
            source,
            pipeline: RowPipeline::standard(),
        }
    }

    pub fn with_pipeline(source: Arc<dyn JsonSource>, pipeline: RowPipeline) -> Self {
        Self { source, pipeline }
    }

    /// 请求外部接口并提取记录
    #[instrument(skip(self, config), fields(url = %config.url))]
    pub async fn fetch(&self, config: &ExternalApiConfig) -> ImportResult<ApiFetch> {
        if config.url.trim().is_empty() {
            return Err(ImportError::InvalidUrl("URL 不能为空".to_string()));
        }

        let json = self
            .source
            .fetch_json(&config.url, config.token.as_deref())
            .await?;
        self.extract_records(&json, config.data_path.as_deref())
    }

    /// 从已获取的 JSON 中提取并校验记录
    pub fn extract_records(&self, json: &Value, data_path: Option<&str>) -> ImportResult<ApiFetch> {
        let items = extract_by_path(json, data_path);
        if items.is_empty() {
            return Err(ImportError::NoDataAtPath(
                data_path.unwrap_or("(根节点)").to_string(),
            ));
        }

        let extracted = items.len();
        debug!(extracted, "按路径提取完成");

        let rows = items
            .into_iter()
            .enumerate()
            .map(|(idx, value)| RawRow {
                row_number: idx + 1,
                value,
            })
            .collect();
        let outcome = self.pipeline.process(rows, ImportPolicy::BestEffort);

        if outcome.records.is_empty() {
            return Err(ImportError::NoValidRecords);
        }

        info!(
            extracted,
            valid = outcome.records.len(),
            dropped = outcome.dropped,
            "外部 API 数据校验完成"
        );
        Ok(ApiFetch { extracted, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct StaticSource(Value);

    #[async_trait]
    impl JsonSource for StaticSource {
        async fn fetch_json(&self, _url: &str, _token: Option<&str>) -> ImportResult<Value> {
            Ok(self.0.clone())
        }
    }

    fn item(code: &str) -> Value {
        json!({"codigo": code, "nombre": "A", "categoria": "C", "precio": 10, "detalles": "d"})
    }

    fn adapter(json: Value) -> ExternalApiAdapter {
        ExternalApiAdapter::new(Arc::new(StaticSource(json)))
    }

    #[test]
    fn test_extract_by_nested_path() {
        let json = json!({"data": {"items": [{"codigo": "1"}]}});
        assert_eq!(extract_by_path(&json, Some("data.items")).len(), 1);
        assert!(extract_by_path(&json, Some("data.missing")).is_empty());
    }

    #[test]
    fn test_extract_root_array_without_path() {
        let json = json!([1, 2, 3]);
        assert_eq!(extract_by_path(&json, None).len(), 3);
        assert_eq!(extract_by_path(&json, Some("")).len(), 3);
    }

    #[test]
    fn test_extract_non_array_is_empty() {
        let json = json!({"data": {"items": {"codigo": "1"}}});
        assert!(extract_by_path(&json, Some("data.items")).is_empty());
        assert!(extract_by_path(&json, None).is_empty());
        // 中间节点不是对象
        assert!(extract_by_path(&json!({"data": [1]}), Some("data.items")).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_drops_invalid_elements_silently() {
        let json = json!({"data": [item("1"), item("2"), item(""), item("4"), item("5")]});
        let config = ExternalApiConfig {
            url: "http://example.test/products".to_string(),
            token: None,
            data_path: Some("data".to_string()),
        };

        let fetch = adapter(json).fetch(&config).await.unwrap();

        assert_eq!(fetch.extracted, 5);
        assert_eq!(fetch.records().len(), 4);
        assert_eq!(fetch.outcome.dropped, 1);
        assert!(fetch.outcome.errors.is_empty());
    }

    #[test]
    fn test_empty_extraction_is_structural_error() {
        let result = adapter(json!({})).extract_records(&json!({"data": []}), Some("data"));
        assert!(matches!(result, Err(ImportError::NoDataAtPath(p)) if p == "data"));
    }

    #[test]
    fn test_no_survivors_is_wrong_structure() {
        let json = json!([{"id": 1}, {"id": 2}]);
        let result = adapter(json.clone()).extract_records(&json, None);
        assert!(matches!(result, Err(ImportError::NoValidRecords)));
    }

    #[tokio::test]
    async fn test_fetch_requires_url() {
        let result = adapter(json!([])).fetch(&ExternalApiConfig::default()).await;
        assert!(matches!(result, Err(ImportError::InvalidUrl(_))));
    }
}
