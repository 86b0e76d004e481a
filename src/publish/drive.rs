use crate::config::DriveConfig;
use crate::error::SyncError;
use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

/// 发布协作方: publish(name, payload) -> 成功/失败
///
/// 目录解析/创建、同名文件检测 (更新 vs 新建)、分块可续传与
/// 重试退避策略全部属于实现方。
#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    async fn publish(&self, filename: &str, payload: &Value) -> Result<(), SyncError>;
}

/// 分块大小: 8MB
const UPLOAD_CHUNK_SIZE: usize = 8 * 1024 * 1024;

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Drive 风格对象存储客户端
pub struct DrivePublisher {
    client: reqwest::Client,
    config: DriveConfig,
    /// 目录ID缓存 — 显式注入, 进程生命周期内不失效
    folder_cache: DashMap<String, String>,
}

impl DrivePublisher {
    pub fn new(config: DriveConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            folder_cache: DashMap::new(),
        }
    }

    fn error(&self, artifact: &str, reason: impl Into<String>) -> SyncError {
        SyncError::Publish {
            artifact: artifact.to_string(),
            reason: reason.into(),
        }
    }

    /// 429 与 5xx 重试, 其余 HTTP 错误为终态
    fn should_retry(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    /// 指数退避: 2^attempt + 1 秒
    fn retry_backoff(attempt: usize) -> Duration {
        Duration::from_secs((1u64 << attempt) + 1)
    }

    /// 带重试执行单个请求; 308 (分块上传未完成) 按成功放行给调用方解释
    async fn send_with_retry<F>(
        &self,
        make_request: F,
        context: &str,
    ) -> Result<reqwest::Response, SyncError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match make_request().send().await {
                Ok(resp)
                    if resp.status().is_success()
                        || resp.status() == StatusCode::PERMANENT_REDIRECT =>
                {
                    return Ok(resp);
                }
                Ok(resp) if Self::should_retry(resp.status())
                    && attempt + 1 < self.config.max_retries =>
                {
                    let wait = Self::retry_backoff(attempt);
                    tracing::warn!("{} 返回 {}, {:?} 后重试", context, resp.status(), wait);
                    tokio::time::sleep(wait).await;
                }
                Ok(resp) => {
                    return Err(self.error(context, format!("HTTP {}", resp.status())));
                }
                Err(e) if attempt + 1 < self.config.max_retries => {
                    let wait = Self::retry_backoff(attempt);
                    tracing::warn!("{} 请求失败: {}, {:?} 后重试", context, e, wait);
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(self.error(context, e.to_string())),
            }
            attempt += 1;
        }
    }

    /// 解析产物目录ID: 命中缓存直接返回, 否则查找, 不存在则创建
    async fn folder_id(&self) -> Result<String, SyncError> {
        let name = self.config.folder.clone();
        if let Some(id) = self.folder_cache.get(&name) {
            return Ok(id.clone());
        }

        let query = format!(
            "name='{}' and mimeType='{}' and trashed=false",
            name, FOLDER_MIME
        );
        let url = format!("{}/files", self.config.api_base);
        let resp = self
            .send_with_retry(
                || {
                    self.client
                        .get(&url)
                        .bearer_auth(&self.config.token)
                        .query(&[("q", query.as_str()), ("fields", "files(id, name)")])
                },
                "folder-lookup",
            )
            .await?;
        let body: Value = resp
            .json()
            .await
            .map_err(|e| self.error("folder-lookup", e.to_string()))?;

        if let Some(id) = body["files"].get(0).and_then(|f| f["id"].as_str()) {
            tracing::info!("目录已存在: {}", name);
            self.folder_cache.insert(name, id.to_string());
            return Ok(id.to_string());
        }

        // 目录不存在, 创建
        let metadata = json!({ "name": name, "mimeType": FOLDER_MIME });
        let resp = self
            .send_with_retry(
                || {
                    self.client
                        .post(&url)
                        .bearer_auth(&self.config.token)
                        .query(&[("fields", "id")])
                        .json(&metadata)
                },
                "folder-create",
            )
            .await?;
        let created: Value = resp
            .json()
            .await
            .map_err(|e| self.error("folder-create", e.to_string()))?;
        let id = created["id"]
            .as_str()
            .ok_or_else(|| self.error("folder-create", "response missing folder id"))?
            .to_string();
        tracing::info!("目录已创建: {}", name);
        self.folder_cache.insert(name, id.clone());
        Ok(id)
    }

    /// 在目录内按名查找文件, 决定更新还是新建
    async fn find_file_id(
        &self,
        filename: &str,
        folder_id: &str,
    ) -> Result<Option<String>, SyncError> {
        let query = format!(
            "name='{}' and '{}' in parents and trashed=false",
            filename, folder_id
        );
        let url = format!("{}/files", self.config.api_base);
        let resp = self
            .send_with_retry(
                || {
                    self.client
                        .get(&url)
                        .bearer_auth(&self.config.token)
                        .query(&[("q", query.as_str()), ("fields", "files(id, name)")])
                },
                filename,
            )
            .await?;
        let body: Value = resp
            .json()
            .await
            .map_err(|e| self.error(filename, e.to_string()))?;
        Ok(body["files"]
            .get(0)
            .and_then(|f| f["id"].as_str())
            .map(str::to_string))
    }

    /// 发起可续传上传会话, 返回会话 URL (Location 头)
    async fn open_session(
        &self,
        filename: &str,
        folder_id: &str,
    ) -> Result<String, SyncError> {
        let existing = self.find_file_id(filename, folder_id).await?;

        let resp = match &existing {
            Some(file_id) => {
                tracing::info!("更新已存在的文件: {}", filename);
                let url = format!(
                    "{}/files/{}?uploadType=resumable",
                    self.config.upload_base, file_id
                );
                self.send_with_retry(
                    || self.client.patch(&url).bearer_auth(&self.config.token),
                    filename,
                )
                .await?
            }
            None => {
                tracing::info!("创建新文件: {}", filename);
                let url = format!("{}/files?uploadType=resumable", self.config.upload_base);
                let metadata = json!({ "name": filename, "parents": [folder_id] });
                self.send_with_retry(
                    || {
                        self.client
                            .post(&url)
                            .bearer_auth(&self.config.token)
                            .json(&metadata)
                    },
                    filename,
                )
                .await?
            }
        };

        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| self.error(filename, "upload session missing Location header"))
    }

    /// 分块上传: 中间块预期 308, 末块预期 2xx
    async fn upload_chunks(
        &self,
        session_url: &str,
        bytes: &[u8],
        filename: &str,
    ) -> Result<(), SyncError> {
        let total = bytes.len();
        let mut offset = 0usize;

        while offset < total {
            let end = (offset + UPLOAD_CHUNK_SIZE).min(total);
            let chunk = &bytes[offset..end];
            let range = format!("bytes {}-{}/{}", offset, end - 1, total);

            let resp = self
                .send_with_retry(
                    || {
                        self.client
                            .put(session_url)
                            .bearer_auth(&self.config.token)
                            .header(header::CONTENT_RANGE, range.clone())
                            .header(header::CONTENT_TYPE, "application/json")
                            .body(chunk.to_vec())
                    },
                    filename,
                )
                .await?;

            let status = resp.status();
            if end < total && status != StatusCode::PERMANENT_REDIRECT {
                return Err(self.error(
                    filename,
                    format!("unexpected status {} before final chunk", status),
                ));
            }
            if end == total && !status.is_success() {
                return Err(self.error(filename, format!("final chunk rejected: {}", status)));
            }

            tracing::info!("上传进度 {}: {}%", filename, end * 100 / total);
            offset = end;
        }

        Ok(())
    }
}

#[async_trait]
impl ArtifactPublisher for DrivePublisher {
    async fn publish(&self, filename: &str, payload: &Value) -> Result<(), SyncError> {
        let folder_id = self.folder_id().await?;
        let bytes = serde_json::to_vec_pretty(payload)
            .map_err(|e| self.error(filename, e.to_string()))?;
        let session_url = self.open_session(filename, &folder_id).await?;
        self.upload_chunks(&session_url, &bytes, filename).await
    }
}
