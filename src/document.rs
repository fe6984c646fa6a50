//! Markdown文書の収集と一括処理
//!
//! フォルダ指定時は直下（`recursive` なら再帰的）の `.md` / `.markdown` を対象にする。
//! 各文書は自身をアクティブ文書として処理され、変更があった場合のみ書き戻す。
//! `output` 指定時は変更の有無に関わらずそこへ書き出す。
//! フォルダ処理では読めない・書けない文書があっても残りの文書を続けて処理する。

use crate::error::{Result, UploaderError};
use crate::fetcher::ActiveDocument;
use crate::processor::ImageProcessor;
use crate::store::VaultStore;
use crate::uploader::ImageHost;
use easyimage_common::{BatchResult, ImageReference};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "MD", "MARKDOWN"];

/// 文書1件の処理結果
#[derive(Debug)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub result: BatchResult,
    /// 書き戻したか
    pub written: bool,
}

/// 処理対象のMarkdownファイルを集める
pub fn collect_documents(path: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(UploaderError::FolderNotFound(path.display().to_string()));
    }

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut documents: Vec<PathBuf> = WalkDir::new(path)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_markdown(p))
        .collect();

    documents.sort();
    Ok(documents)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|ext| MARKDOWN_EXTENSIONS.iter().any(|&e| e == ext.to_string_lossy()))
        .unwrap_or(false)
}

/// 文書のVault相対パス（Vault外なら `None`）
pub fn document_in_vault(vault: &VaultStore, document: &Path) -> Option<String> {
    let absolute = document.canonicalize().ok()?;
    let root = vault.root().canonicalize().ok()?;
    VaultStore::new(root).relative_path(&absolute)
}

/// アクティブ文書としての位置（Vault内ならVault相対、外なら実パス）
pub fn locate_document(vault: &VaultStore, document: &Path) -> Option<ActiveDocument> {
    let absolute = document.canonicalize().ok()?;
    Some(match document_in_vault(vault, &absolute) {
        Some(relative) => ActiveDocument::InVault(relative),
        None => ActiveDocument::External(absolute),
    })
}

/// 文書1件をアップロード・書き換え
///
/// `output` 指定時はそこへ（変更がなくても）書き出し、なければ変更があった場合のみ
/// 元ファイルへ書き戻す。`dry_run` では書かない。
pub async fn process_document<H: ImageHost>(
    processor: &mut ImageProcessor<H>,
    vault: &VaultStore,
    path: &Path,
    output: Option<&Path>,
    dry_run: bool,
    show_progress: bool,
) -> Result<DocumentReport> {
    let content = tokio::fs::read_to_string(path).await?;
    let active = locate_document(vault, path);
    debug!(document = %path.display(), active = ?active, "文書を処理");
    processor.set_active_document(active);

    let pending = processor.actionable_count(&content);
    let bar = if show_progress && pending > 0 {
        let bar = progress_bar(pending as u64);
        if let Some(name) = path.file_name() {
            bar.set_message(name.to_string_lossy().into_owned());
        }
        bar
    } else {
        ProgressBar::hidden()
    };
    let on_settled = |reference: &ImageReference, success: bool| {
        if !success {
            bar.println(format!("  ✗ {}", reference.url()));
        }
        bar.inc(1);
    };

    let result = processor.process_all_with_progress(&content, &on_settled).await;
    bar.finish_and_clear();

    let written = !dry_run && (output.is_some() || result.is_modified());
    if written {
        let target = output.unwrap_or(path);
        tokio::fs::write(target, &result.content).await?;
    }

    Ok(DocumentReport {
        path: path.to_path_buf(),
        result,
        written,
    })
}

/// 複数の文書を順に処理する
///
/// 1件の失敗（読み込み・書き込みエラー）で止めず、文書ごとの結果を返す。
pub async fn process_documents<H: ImageHost>(
    processor: &mut ImageProcessor<H>,
    vault: &VaultStore,
    documents: &[PathBuf],
    output: Option<&Path>,
    dry_run: bool,
    show_progress: bool,
) -> Vec<(PathBuf, Result<DocumentReport>)> {
    let mut reports = Vec::with_capacity(documents.len());
    for document in documents {
        let report =
            process_document(processor, vault, document, output, dry_run, show_progress).await;
        if let Err(e) = &report {
            warn!(document = %document.display(), error = %e, "文書の処理に失敗");
        }
        reports.push((document.clone(), report));
    }
    reports
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("  {bar:30} {pos}/{len} {msg}") {
        bar.set_style(style);
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown(Path::new("a.md")));
        assert!(is_markdown(Path::new("a.markdown")));
        assert!(is_markdown(Path::new("A.MD")));
        assert!(!is_markdown(Path::new("a.png")));
        assert!(!is_markdown(Path::new("README")));
    }

    #[test]
    fn test_collect_not_found() {
        let result = collect_documents(Path::new("/nonexistent/folder"), false);
        assert!(matches!(result, Err(UploaderError::FolderNotFound(_))));
    }

    #[test]
    fn test_collect_single_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("note.txt");
        fs::write(&file, "x").unwrap();
        // 明示指定されたファイルは拡張子を問わない
        assert_eq!(collect_documents(&file, false).unwrap(), vec![file]);
    }

    #[test]
    fn test_collect_folder_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.md"), "").unwrap();
        fs::write(dir.path().join("a.md"), "").unwrap();
        fs::write(dir.path().join("image.png"), "").unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/c.md"), "").unwrap();

        let flat = collect_documents(dir.path(), false).unwrap();
        assert_eq!(flat, vec![dir.path().join("a.md"), dir.path().join("b.md")]);

        let recursive = collect_documents(dir.path(), true).unwrap();
        assert_eq!(recursive.len(), 3);
        assert!(recursive.contains(&dir.path().join("sub/c.md")));
    }

    #[test]
    fn test_document_in_vault() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("notes")).unwrap();
        let doc = dir.path().join("notes/today.md");
        fs::write(&doc, "").unwrap();

        let vault = VaultStore::new(dir.path());
        assert_eq!(document_in_vault(&vault, &doc).as_deref(), Some("notes/today.md"));

        let other = tempdir().unwrap();
        let outside = other.path().join("x.md");
        fs::write(&outside, "").unwrap();
        assert!(document_in_vault(&vault, &outside).is_none());
    }

    #[test]
    fn test_locate_document() {
        let dir = tempdir().unwrap();
        let doc = dir.path().join("today.md");
        fs::write(&doc, "").unwrap();

        let vault = VaultStore::new(dir.path());
        assert_eq!(
            locate_document(&vault, &doc),
            Some(ActiveDocument::InVault("today.md".into()))
        );

        let other = tempdir().unwrap();
        let outside = other.path().join("x.md");
        fs::write(&outside, "").unwrap();
        assert_eq!(
            locate_document(&vault, &outside),
            Some(ActiveDocument::External(outside.canonicalize().unwrap()))
        );

        assert!(locate_document(&vault, &dir.path().join("missing.md")).is_none());
    }
}
