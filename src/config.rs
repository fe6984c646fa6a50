use crate::error::{Result, UploaderError};
use easyimage_common::Settings;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CONFIG_ENV: &str = "EASYIMAGE_CONFIG";
const TOKEN_ENV: &str = "EASYIMAGE_TOKEN";

/// 永続化された設定
///
/// `settings` は不変のスナップショット。更新時は新しいスナップショットを作って即保存する。
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    settings: Arc<Settings>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// 指定パスから読み込み（存在しなければデフォルト値）
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let settings = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Settings::from_json(&content)?
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            settings: Arc::new(settings),
        })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self.settings.as_ref())?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        let home = dirs::home_dir()
            .ok_or_else(|| UploaderError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("easyimage").join("config.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 保存されている値そのもの
    pub fn stored(&self) -> &Settings {
        &self.settings
    }

    /// 呼び出し時点の有効な設定（環境変数のトークンを優先）
    pub fn snapshot(&self) -> Arc<Settings> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => Arc::new(Settings {
                token,
                ..self.settings.as_ref().clone()
            }),
            _ => Arc::clone(&self.settings),
        }
    }

    /// 値を変更して即保存
    pub fn update(&mut self, edit: impl FnOnce(&mut Settings)) -> Result<()> {
        let mut next = self.settings.as_ref().clone();
        edit(&mut next);
        next.validate()?;
        self.settings = Arc::new(next);
        self.save()
    }
}
