//! EasyImage APIクライアント
//!
//! `POST <apiUrl>` にmultipartで `image` と `token` を送る。
//! 成功レスポンス: `{"result": "success", "url": ..., "thumb": ..., "srcName": ...}`
//!
//! 通信エラーを含む全ての失敗はこの境界で `UploadOutcome::Failed` に変換する。

use crate::error::{Result, UploaderError};
use crate::fetcher::ImageFile;
use async_trait::async_trait;
use easyimage_common::{HostedImage, Settings};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const SUCCESS_RESULT: &str = "success";
const GENERIC_FAILURE: &str = "アップロード失敗";

/// アップロード1件の結果
#[derive(Debug)]
pub enum UploadOutcome {
    Uploaded(HostedImage),
    Failed(UploaderError),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded(_))
    }

    pub fn into_result(self) -> Result<HostedImage> {
        match self {
            UploadOutcome::Uploaded(image) => Ok(image),
            UploadOutcome::Failed(e) => Err(e),
        }
    }
}

impl From<Result<HostedImage>> for UploadOutcome {
    fn from(result: Result<HostedImage>) -> Self {
        match result {
            Ok(image) => UploadOutcome::Uploaded(image),
            Err(e) => UploadOutcome::Failed(e),
        }
    }
}

/// 画像ホスト
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, file: ImageFile) -> UploadOutcome;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    thumb: Option<String>,
    #[serde(default)]
    src_name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// レスポンスボディを解釈する
pub fn parse_upload_response(body: &str) -> Result<HostedImage> {
    let response: UploadResponse = serde_json::from_str(body)
        .map_err(|e| UploaderError::UploadRejected(format!("レスポンスのパースに失敗: {}", e)))?;

    if response.result.as_deref() != Some(SUCCESS_RESULT) {
        let message = response
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());
        return Err(UploaderError::UploadRejected(message));
    }

    let url = response
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| UploaderError::UploadRejected("レスポンスにURLがありません".into()))?;

    Ok(HostedImage {
        url,
        thumb: response.thumb,
        src_name: response.src_name,
    })
}

/// タイムアウト付きHTTPクライアント
pub fn build_http_client(settings: &Settings) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .build()
        .map_err(|e| UploaderError::Config(format!("HTTPクライアントの作成に失敗: {}", e)))
}

pub struct EasyImageClient {
    http: Client,
    settings: Arc<Settings>,
}

impl EasyImageClient {
    pub fn new(http: Client, settings: Arc<Settings>) -> Self {
        Self { http, settings }
    }

    async fn try_upload(&self, file: ImageFile) -> Result<HostedImage> {
        let ImageFile {
            bytes,
            file_name,
            mime,
        } = file;
        debug!(file_name = %file_name, size = bytes.len(), "アップロード開始");

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&mime)
            .map_err(|e| UploaderError::Transport(e.to_string()))?;
        let form = Form::new()
            .part("image", part)
            .text("token", self.settings.token.clone());

        let response = self
            .http
            .post(&self.settings.api_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploaderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploaderError::Http {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UploaderError::Transport(e.to_string()))?;
        parse_upload_response(&body)
    }
}

#[async_trait]
impl ImageHost for EasyImageClient {
    async fn upload(&self, file: ImageFile) -> UploadOutcome {
        let file_name = file.file_name.clone();
        let outcome = UploadOutcome::from(self.try_upload(file).await);
        if let UploadOutcome::Failed(e) = &outcome {
            warn!(file_name = %file_name, error = %e, "API呼び出し失敗");
        }
        outcome
    }
}
