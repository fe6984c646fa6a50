//! 画像の取得
//!
//! Web画像はGETでバイナリのまま取得し、ローカル画像は絶対パスならファイルシステム、
//! 相対パスならVaultから読む。

use crate::error::{Result, UploaderError};
use crate::store::{FsStore, LocalStore, VaultStore};
use easyimage_common::path::{
    file_name, generate_filename, is_absolute_path, is_dot_relative, normalize_path,
};
use easyimage_common::{resolve_relative_path, ImageKind};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static FILENAME_SEQUENCE: AtomicU64 = AtomicU64::new(0);

const FALLBACK_MIME: &str = "image/*";

/// アップロード用に取得した画像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime: String,
}

impl ImageFile {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name);
        Self {
            bytes,
            file_name,
            mime,
        }
    }
}

fn guess_mime(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

/// `./` `../` の解決基準となる文書
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveDocument {
    /// Vault内の文書（Vault相対パス）
    InVault(String),
    /// Vault外の文書（実パス）。相対パスは文書のフォルダからファイルシステムで読む
    External(PathBuf),
}

pub struct Fetcher {
    http: Client,
    fs: FsStore,
    vault: VaultStore,
    active_document: Option<ActiveDocument>,
}

impl Fetcher {
    pub fn new(http: Client, vault: VaultStore) -> Self {
        Self {
            http,
            fs: FsStore,
            vault,
            active_document: None,
        }
    }

    pub fn with_active_document(mut self, document: Option<ActiveDocument>) -> Self {
        self.active_document = document;
        self
    }

    pub fn set_active_document(&mut self, document: Option<ActiveDocument>) {
        self.active_document = document;
    }

    pub fn active_document(&self) -> Option<&ActiveDocument> {
        self.active_document.as_ref()
    }

    fn vault_document(&self) -> Option<&str> {
        match &self.active_document {
            Some(ActiveDocument::InVault(path)) => Some(path.as_str()),
            _ => None,
        }
    }

    pub fn vault(&self) -> &VaultStore {
        &self.vault
    }

    /// 分類に応じて取得
    pub async fn fetch(&self, url: &str, kind: ImageKind) -> Result<ImageFile> {
        match kind {
            ImageKind::Web => self.fetch_web(url).await,
            ImageKind::Local(_) => self.read_local(url).await,
            ImageKind::Hosted => Err(UploaderError::InvalidReference(format!(
                "既にホスト済みの画像です: {}",
                url
            ))),
        }
    }

    pub async fn fetch_web(&self, url: &str) -> Result<ImageFile> {
        debug!(url, "Web画像をダウンロード");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| UploaderError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploaderError::Fetch(format!("HTTP {}: {}", status.as_u16(), url)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| UploaderError::Fetch(e.to_string()))?;

        let sequence = FILENAME_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let file_name = generate_filename(url, chrono::Utc::now().timestamp_millis(), sequence);
        let mime = content_type.unwrap_or_else(|| guess_mime(&file_name));

        Ok(ImageFile {
            bytes: bytes.to_vec(),
            file_name,
            mime,
        })
    }

    pub async fn read_local(&self, path: &str) -> Result<ImageFile> {
        let (store, target) = self
            .locate(path)
            .ok_or_else(|| UploaderError::NotFound(path.to_string()))?;

        debug!(path, target = %target, "ローカル画像を読み込み");
        let bytes = store.read(&target).await?;
        Ok(ImageFile::new(bytes, file_name(&target)))
    }

    /// ローカルパスが（ファイル・フォルダとして）存在するか
    pub async fn local_entry_exists(&self, path: &str) -> bool {
        match self.locate(path) {
            Some((store, target)) => store.exists(&target).await,
            None => false,
        }
    }

    /// 読み込み先のストアとそのストア上のパス。Vaultルートを越える場合は `None`
    fn locate(&self, path: &str) -> Option<(&dyn LocalStore, String)> {
        let normalized = normalize_path(path);
        if is_absolute_path(&normalized) {
            return Some((&self.fs as &dyn LocalStore, normalized));
        }

        if let Some(ActiveDocument::External(document)) = &self.active_document {
            if is_dot_relative(&normalized) {
                let base = document.parent().unwrap_or_else(|| Path::new(""));
                let target = base.join(&normalized).to_string_lossy().into_owned();
                return Some((&self.fs as &dyn LocalStore, target));
            }
        }

        let resolved = resolve_relative_path(&normalized, self.vault_document())?;
        Some((&self.vault as &dyn LocalStore, resolved))
    }
}
