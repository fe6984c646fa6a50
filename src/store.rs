//! ローカル画像の読み込み先
//!
//! - FsStore: 絶対パスをそのままファイルシステムから読む
//! - VaultStore: Vaultルートからの相対パスとして読む
//!
//! どちらも `LocalStore` として扱い、Fetcherは種類を意識しない。

use crate::error::{Result, UploaderError};
use async_trait::async_trait;
use easyimage_common::path::{collapse_dot_segments, normalize_path};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait LocalStore: Send + Sync {
    /// ファイルの中身を読む（NotFound / NotAFile）
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// 何らかのエントリ（ファイル・フォルダ）が存在するか
    async fn exists(&self, path: &str) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct FsStore;

#[async_trait]
impl LocalStore for FsStore {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        read_file(Path::new(path), path).await
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct VaultStore {
    root: PathBuf,
}

impl VaultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Vault相対パスを実パスへ。ルートを越える場合は `None`
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = collapse_dot_segments(&normalize_path(path))?;
        if relative.is_empty() {
            return Some(self.root.clone());
        }
        Some(self.root.join(relative))
    }

    /// 実パスをVault相対パスへ（Vault外なら `None`）
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        Some(joined)
    }
}

#[async_trait]
impl LocalStore for VaultStore {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let resolved = self
            .resolve(path)
            .ok_or_else(|| UploaderError::NotFound(path.to_string()))?;
        read_file(&resolved, path).await
    }

    async fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Some(resolved) => tokio::fs::metadata(resolved).await.is_ok(),
            None => false,
        }
    }
}

async fn read_file(path: &Path, display: &str) -> Result<Vec<u8>> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(UploaderError::NotFound(display.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_file() {
        return Err(UploaderError::NotAFile(display.to_string()));
    }

    Ok(tokio::fs::read(path).await?)
}
