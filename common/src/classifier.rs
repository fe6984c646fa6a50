//! 画像参照の分類
//!
//! 判定順:
//! 1. 設定ドメインを部分文字列として含む → Hosted
//! 2. `http://` / `https://` 始まり → Web
//! 3. それ以外 → Local（絶対パス / Vault相対）
//!
//! ネットワークもディスクも参照しない純粋関数。

use crate::path::{is_absolute_path, is_web_url};
use crate::scanner;
use crate::types::{ImageKind, ImageReference, LocalPath};

#[derive(Debug, Clone)]
pub struct Classifier {
    domain: String,
}

impl Classifier {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    pub fn classify(&self, url: &str) -> ImageKind {
        // 空ドメインは全URLに部分一致してしまうので判定に使わない
        if !self.domain.is_empty() && url.contains(&self.domain) {
            return ImageKind::Hosted;
        }

        if is_web_url(url) {
            return ImageKind::Web;
        }

        if is_absolute_path(url) {
            ImageKind::Local(LocalPath::Absolute)
        } else {
            ImageKind::Local(LocalPath::VaultRelative)
        }
    }

    /// スキャンと分類をまとめて実行
    pub fn classify_all(&self, text: &str) -> Vec<ImageReference> {
        scanner::detect(text)
            .into_iter()
            .map(|image| {
                let kind = self.classify(&image.url);
                ImageReference { image, kind }
            })
            .collect()
    }

    /// アップロード対象の参照のみ
    pub fn actionable(&self, text: &str) -> Vec<ImageReference> {
        self.classify_all(text)
            .into_iter()
            .filter(|r| r.kind.is_actionable())
            .collect()
    }
}
