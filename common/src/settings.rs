//! 設定値の型
//!
//! ディスク上はcamelCaseのJSON。欠けているキーはデフォルト値で補完される。
//! 読み込み・保存はCLI側（`config`モジュール）が担当する。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// 同時アップロード数の上限
pub const MAX_CONCURRENT_UPLOADS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// アップロードAPIのURL
    pub api_url: String,
    pub token: String,
    /// ホスト済み画像を判定するドメイン（部分一致）
    pub domain: String,
    /// 圧縮品質 (1-100)。未実装のため適用されない
    pub compression: u8,
    /// 変換フォーマット。未実装のため適用されない
    pub convert_format: String,
    /// 貼り付け時の自動アップロード（外部フック用）
    pub auto_upload: bool,
    pub max_concurrent_uploads: usize,
    /// リクエストごとのタイムアウト（秒）
    pub timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "https://yourdomain.com".into(),
            token: "your token here".into(),
            domain: "https://yourdomain.com for image".into(),
            compression: 80,
            convert_format: "webp".into(),
            auto_upload: true,
            max_concurrent_uploads: 3,
            timeout_seconds: 60,
        }
    }
}

impl Settings {
    /// 値の妥当性チェック
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::Config("apiUrl が空です".into()));
        }
        if !(1..=MAX_CONCURRENT_UPLOADS).contains(&self.max_concurrent_uploads) {
            return Err(Error::Config(format!(
                "maxConcurrentUploads は1-{}の範囲で指定してください: {}",
                MAX_CONCURRENT_UPLOADS, self.max_concurrent_uploads
            )));
        }
        if !(1..=100).contains(&self.compression) {
            return Err(Error::Config(format!(
                "compression は1-100の範囲で指定してください: {}",
                self.compression
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(Error::Config("timeoutSeconds は1以上が必要です".into()));
        }
        Ok(())
    }

    /// JSON文字列をデフォルト値にマージして読み込む
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }
}
