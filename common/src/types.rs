//! パイプラインの型定義
//!
//! CLIと将来のフロントエンドで共有される型:
//! - ImageMatch: スキャナの出力（URLと元テキスト上の位置）
//! - ImageKind: 分類結果
//! - ImageReference: ImageMatch + 分類
//! - HostedImage / BatchResult: アップロード結果

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// ドキュメント中の `![alt](url)` 1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMatch {
    /// 括弧内のURL（またはパス）
    pub url: String,
    /// マッチした元テキスト全体
    pub raw_match: String,
    /// マッチ開始位置（UTF-8バイトオフセット）
    pub offset: usize,
    /// URL開始位置（UTF-8バイトオフセット）
    pub url_offset: usize,
}

impl ImageMatch {
    /// マッチ全体の範囲
    pub fn span(&self) -> Range<usize> {
        self.offset..self.offset + self.raw_match.len()
    }

    /// 括弧内URLの範囲
    pub fn url_span(&self) -> Range<usize> {
        self.url_offset..self.url_offset + self.url.len()
    }
}

/// ローカルパスの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocalPath {
    /// `C:\`, `\\server\share`, `/home/...`
    Absolute,
    /// Vaultルートからの相対パス
    VaultRelative,
}

/// 画像参照の分類結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageKind {
    /// 既に画像ホスト上にある（何もしない）
    Hosted,
    /// http(s) のWeb画像
    Web,
    /// ローカル画像
    Local(LocalPath),
}

impl ImageKind {
    /// アップロード対象か
    pub fn is_actionable(&self) -> bool {
        !matches!(self, ImageKind::Hosted)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImageKind::Hosted => "hosted",
            ImageKind::Web => "web",
            ImageKind::Local(LocalPath::Absolute) => "local-absolute",
            ImageKind::Local(LocalPath::VaultRelative) => "local-vault",
        }
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// 分類済みの画像参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub image: ImageMatch,
    pub kind: ImageKind,
}

impl ImageReference {
    pub fn url(&self) -> &str {
        &self.image.url
    }
}

/// アップロード成功時に画像ホストが返す情報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedImage {
    pub url: String,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub src_name: Option<String>,
}

/// 失敗した参照1件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub url: String,
    pub offset: usize,
    pub error: String,
}

/// 一括処理の結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// 書き換え後のテキスト
    pub content: String,
    pub success_count: usize,
    /// アップロード対象の件数（ホスト済みは含まない）
    pub total_count: usize,
    pub failures: Vec<ItemFailure>,
}

impl BatchResult {
    /// 対象なし: 入力をそのまま返す
    pub fn unchanged(content: &str) -> Self {
        Self {
            content: content.to_string(),
            ..Default::default()
        }
    }

    pub fn is_modified(&self) -> bool {
        self.success_count > 0
    }
}
