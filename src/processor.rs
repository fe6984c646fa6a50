//! 画像アップロードの実行
//!
//! - process_all: 文書内の全参照を並列にアップロードし、成功分のURLを書き換える
//! - process_reference: 参照1件を 分類 → 取得 → アップロード
//! - upload_selection: 選択テキスト（Markdown画像 or 生のURL/パス）を処理
//!
//! 同時実行数はセマフォで `maxConcurrentUploads` に制限する。
//! 各パイプラインは自分の参照だけを持ち、結果の集約は全件完了後に行う。

use crate::error::{Result, UploaderError};
use crate::fetcher::{ActiveDocument, Fetcher};
use crate::store::VaultStore;
use crate::uploader::{build_http_client, EasyImageClient, ImageHost};
use easyimage_common::{
    apply_replacements, first_match, is_absolute_path, is_web_url, BatchResult, Classifier,
    HostedImage, ImageKind, ImageReference, ItemFailure, Replacement, Settings,
    MAX_CONCURRENT_UPLOADS,
};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// 参照1件の処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceOutcome {
    /// 既にホスト済み（何もしていない）
    AlreadyHosted,
    Uploaded(HostedImage),
}

/// 選択テキスト処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOutcome {
    /// 選択範囲と置き換えるテキスト
    pub replacement: String,
    pub new_url: String,
    /// 選択がMarkdown画像構文だったか
    pub markdown: bool,
    pub already_hosted: bool,
}

/// 一括処理の進捗通知（1件完了するごとに呼ばれる）
pub trait ProgressSink: Send + Sync {
    fn on_settled(&self, reference: &ImageReference, success: bool);
}

impl<F> ProgressSink for F
where
    F: Fn(&ImageReference, bool) + Send + Sync,
{
    fn on_settled(&self, reference: &ImageReference, success: bool) {
        self(reference, success)
    }
}

pub struct ImageProcessor<H: ImageHost> {
    settings: Arc<Settings>,
    classifier: Classifier,
    fetcher: Fetcher,
    host: H,
}

impl ImageProcessor<EasyImageClient> {
    /// EasyImage APIを使う標準構成
    pub fn easyimage(settings: Arc<Settings>, vault: VaultStore) -> Result<Self> {
        settings.validate()?;
        let http = build_http_client(&settings)?;
        let fetcher = Fetcher::new(http.clone(), vault);
        let host = EasyImageClient::new(http, Arc::clone(&settings));
        Ok(Self::new(settings, fetcher, host))
    }
}

impl<H: ImageHost> ImageProcessor<H> {
    pub fn new(settings: Arc<Settings>, fetcher: Fetcher, host: H) -> Self {
        debug!(
            compression = settings.compression,
            convert_format = %settings.convert_format,
            "圧縮・形式変換は未対応のため適用しません"
        );
        Self {
            classifier: Classifier::new(settings.domain.clone()),
            settings,
            fetcher,
            host,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// 相対パス解決の基準となる文書を切り替える
    pub fn set_active_document(&mut self, document: Option<ActiveDocument>) {
        self.fetcher.set_active_document(document);
    }

    pub fn classify(&self, url: &str) -> ImageKind {
        self.classifier.classify(url)
    }

    /// アップロード対象の参照数
    pub fn actionable_count(&self, content: &str) -> usize {
        self.classifier.actionable(content).len()
    }

    /// 参照1件を処理
    pub async fn process_reference(&self, url: &str) -> Result<ReferenceOutcome> {
        match self.classifier.classify(url) {
            ImageKind::Hosted => Ok(ReferenceOutcome::AlreadyHosted),
            kind => self.upload_one(url, kind).await.map(ReferenceOutcome::Uploaded),
        }
    }

    async fn upload_one(&self, url: &str, kind: ImageKind) -> Result<HostedImage> {
        let file = self.fetcher.fetch(url, kind).await?;
        self.host.upload(file).await.into_result()
    }

    pub async fn process_all(&self, content: &str) -> BatchResult {
        self.process_all_with_progress(content, &|_: &ImageReference, _: bool| {})
            .await
    }

    pub async fn process_all_with_progress(
        &self,
        content: &str,
        progress: &dyn ProgressSink,
    ) -> BatchResult {
        let references = self.classifier.actionable(content);
        if references.is_empty() {
            info!("アップロード対象の画像はありません");
            return BatchResult::unchanged(content);
        }

        let total_count = references.len();
        info!(
            total = total_count,
            max_concurrent = self.settings.max_concurrent_uploads,
            "画像のアップロードを開始"
        );

        // 未検証の設定でも許可数は 1..=上限 に収める
        let permits = self
            .settings
            .max_concurrent_uploads
            .clamp(1, MAX_CONCURRENT_UPLOADS);
        let semaphore = Semaphore::new(permits);
        let tasks = references.iter().map(|reference| {
            let semaphore = &semaphore;
            async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => self.upload_one(reference.url(), reference.kind).await,
                    Err(e) => Err(UploaderError::Transport(e.to_string())),
                };
                progress.on_settled(reference, result.is_ok());
                (reference, result)
            }
        });
        let settled = join_all(tasks).await;

        let mut replacements = Vec::new();
        let mut failures = Vec::new();
        for (reference, result) in settled {
            match result {
                Ok(image) => {
                    debug!(from = reference.url(), to = %image.url, "置換");
                    replacements.push(Replacement::new(reference.image.url_span(), image.url));
                }
                Err(e) => {
                    warn!(url = reference.url(), error = %e, "画像のアップロードに失敗");
                    failures.push(ItemFailure {
                        url: reference.url().to_string(),
                        offset: reference.image.offset,
                        error: e.to_string(),
                    });
                }
            }
        }

        let success_count = replacements.len();
        info!(
            success = success_count,
            total = total_count,
            "アップロード完了"
        );

        BatchResult {
            content: apply_replacements(content, &replacements),
            success_count,
            total_count,
            failures,
        }
    }

    /// 選択テキストをアップロードし、置き換え後のテキストを返す
    pub async fn upload_selection(&self, selection: &str) -> Result<SelectionOutcome> {
        let markdown = first_match(selection).filter(|m| !m.url.is_empty());
        let candidate = match &markdown {
            Some(m) => m.url.clone(),
            None => selection.trim().to_string(),
        };

        if candidate.is_empty() {
            return Err(UploaderError::InvalidReference(selection.to_string()));
        }

        let valid = is_web_url(&candidate)
            || is_absolute_path(&candidate)
            || self.fetcher.local_entry_exists(&candidate).await;
        if !valid {
            return Err(UploaderError::InvalidReference(candidate));
        }

        let image = match self.process_reference(&candidate).await? {
            ReferenceOutcome::AlreadyHosted => {
                return Ok(SelectionOutcome {
                    replacement: selection.to_string(),
                    new_url: candidate,
                    markdown: markdown.is_some(),
                    already_hosted: true,
                });
            }
            ReferenceOutcome::Uploaded(image) => image,
        };

        let replacement = match &markdown {
            Some(m) => {
                apply_replacements(selection, &[Replacement::new(m.url_span(), image.url.clone())])
            }
            None => image.url.clone(),
        };

        Ok(SelectionOutcome {
            replacement,
            new_url: image.url,
            markdown: markdown.is_some(),
            already_hosted: false,
        })
    }
}
