// ==========================================
// 自助终端管理后台 - 后端 HTTP 客户端
// ==========================================
// 职责: 批量创建 / ZIP 上传 / 模板下载 / 商品名称查询 / 外部 API 拉取
// 约定: 任何非 2xx 状态都视为 BackendRejected（优先取响应体的 message）
// 红线: 不做自动重试，由用户手动重新提交
// ==========================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::product::{BulkImportResult, ProductRecord};
use crate::importer::error::{ImportError, ImportResult};

/// ZIP 上传接口读取的 multipart 字段名
const ZIP_FIELD_NAME: &str = "archivo";

/// 导入流程依赖的后端接口
#[async_trait]
pub trait ProductBackend: Send + Sync {
    /// `POST /productos/bulk`，记录按提交顺序排列
    async fn bulk_create(&self, records: &[ProductRecord]) -> ImportResult<BulkImportResult>;

    /// `POST /productos/bulk-zip`，压缩包以 multipart 上传
    async fn bulk_create_zip(&self, file_name: &str, bytes: Vec<u8>)
        -> ImportResult<BulkImportResult>;

    /// `GET /productos/template`，带标准表头的模板文件
    async fn download_template(&self) -> ImportResult<Vec<u8>>;

    /// `GET /productos/nombre/{code}`
    async fn product_name(&self, code: &str) -> ImportResult<String>;

    /// 连通性探测（统计接口）
    async fn ping(&self) -> ImportResult<()>;
}

/// 任意 JSON 文档来源（外部 API 适配器的输入）
#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn fetch_json(&self, url: &str, token: Option<&str>) -> ImportResult<Value>;
}

/// 基于 `reqwest` 的 [`ProductBackend`] / [`JsonSource`] 实现
///
/// 基础地址只在配置中出现一次，所有接口路径都由它派生
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// 创建客户端，基础地址形如 `http://localhost:3000/api`
    ///
    /// # 错误
    /// - InvalidUrl: 基础地址无法解析或不能作为基础地址
    /// - Transport: reqwest 客户端构建失败
    pub fn new(base_url: &str, timeout_secs: u64) -> ImportResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("kiosk-bulk-import/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .map_err(|e| ImportError::InvalidUrl(format!("{trimmed}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ImportError::InvalidUrl(trimmed.to_string()));
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 在基础地址后追加路径段（自动百分号编码）
    fn endpoint(&self, segments: &[&str]) -> ImportResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ImportError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// 读取响应体，非 2xx 转为 [`ImportError::BackendRejected`]
    async fn checked_body(response: Response) -> ImportResult<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        Ok(body)
    }

    async fn read_bulk_result(response: Response, context: &str) -> ImportResult<BulkImportResult> {
        let body = Self::checked_body(response).await?;
        serde_json::from_str(&body).map_err(|e| ImportError::Deserialize {
            context: context.to_string(),
            message: e.to_string(),
        })
    }
}

/// 拒绝原因: JSON message > 简短响应文本 > 状态码短语
fn rejection(status: StatusCode, body: &str) -> ImportError {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    let trimmed = body.trim();
    let message = from_json
        .or_else(|| (!trimmed.is_empty() && trimmed.len() <= 200).then(|| trimmed.to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

    ImportError::BackendRejected {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ProductBackend for HttpBackend {
    async fn bulk_create(&self, records: &[ProductRecord]) -> ImportResult<BulkImportResult> {
        let url = self.endpoint(&["productos", "bulk"])?;
        info!(url = %url, count = records.len(), "提交批量创建请求");

        let response = self.client.post(url).json(records).send().await?;
        let result = Self::read_bulk_result(response, "POST /productos/bulk").await?;

        info!(
            inserted = result.inserted,
            failed = result.failed,
            total = result.total,
            "批量创建完成"
        );
        Ok(result)
    }

    async fn bulk_create_zip(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ImportResult<BulkImportResult> {
        let url = self.endpoint(&["productos", "bulk-zip"])?;
        info!(url = %url, file_name = %file_name, size = bytes.len(), "上传 ZIP 批量导入");

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/zip")?;
        let form = Form::new().part(ZIP_FIELD_NAME, part);

        let response = self.client.post(url).multipart(form).send().await?;
        Self::read_bulk_result(response, "POST /productos/bulk-zip").await
    }

    async fn download_template(&self) -> ImportResult<Vec<u8>> {
        let url = self.endpoint(&["productos", "template"])?;
        debug!(url = %url, "下载导入模板");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(rejection(status, &body));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn product_name(&self, code: &str) -> ImportResult<String> {
        let url = self.endpoint(&["productos", "nombre", code])?;
        let response = self.client.get(url).send().await?;
        let body = Self::checked_body(response).await?;

        let value: Value = serde_json::from_str(&body).map_err(|e| ImportError::Deserialize {
            context: format!("GET /productos/nombre/{code}"),
            message: e.to_string(),
        })?;
        value
            .get("nombre")
            .or_else(|| value.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ImportError::Deserialize {
                context: format!("GET /productos/nombre/{code}"),
                message: "missing field `nombre`".to_string(),
            })
    }

    async fn ping(&self) -> ImportResult<()> {
        let url = self.endpoint(&["consultas", "estadisticas", "general"])?;
        let response = self.client.get(url).send().await?;
        Self::checked_body(response).await.map(|_| ())
    }
}

#[async_trait]
impl JsonSource for HttpBackend {
    async fn fetch_json(&self, url: &str, token: Option<&str>) -> ImportResult<Value> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| ImportError::InvalidUrl(format!("{url}: {e}")))?;
        info!(url = %parsed, token = token.is_some(), "请求外部 API");

        let mut request = self.client.get(parsed.clone());
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            request = request.bearer_auth(token.trim());
        }

        let response = request.send().await?;
        let body = Self::checked_body(response).await?;
        serde_json::from_str(&body).map_err(|e| ImportError::Deserialize {
            context: parsed.to_string(),
            message: e.to_string(),
        })
    }
}
