//! 一括処理の統合テスト
//!
//! 画像配信サーバとアップロードAPIをローカルに立て、文書の書き換えまでを検証

mod common;

use easyimage_common::Settings;
use easyimage_uploader::document;
use easyimage_uploader::store::VaultStore;
use easyimage_uploader::ImageProcessor;
use std::sync::Arc;
use tempfile::tempdir;

const DOMAIN: &str = "https://img.example.com";

fn settings(api_url: String) -> Arc<Settings> {
    Arc::new(Settings {
        api_url,
        token: "test-token".into(),
        domain: DOMAIN.into(),
        max_concurrent_uploads: 2,
        timeout_seconds: 5,
        ..Settings::default()
    })
}

async fn upload_api() -> common::TestServer {
    common::serve(
        200,
        "application/json",
        br#"{"result":"success","url":"https://img.example.com/i/uploaded.png"}"#.to_vec(),
    )
    .await
}

/// Web画像1件 + ホスト済み1件 → 対象は1件、ホスト済みはそのまま
#[tokio::test]
async fn test_web_and_hosted_scenario() {
    let images = common::serve(200, "image/png", b"png".to_vec()).await;
    let api = upload_api().await;

    let web_url = images.url("/1.png");
    let text = format!("![a]({}) text ![b](https://img.example.com/2.png)", web_url);

    let dir = tempdir().unwrap();
    let processor = ImageProcessor::easyimage(
        settings(api.url("/api/index.php")),
        VaultStore::new(dir.path()),
    )
    .unwrap();

    let result = processor.process_all(&text).await;
    assert_eq!(result.total_count, 1);
    assert_eq!(result.success_count, 1);
    assert_eq!(
        result.content,
        "![a](https://img.example.com/i/uploaded.png) text ![b](https://img.example.com/2.png)"
    );
    assert_eq!(api.requests().len(), 1);
}

/// アップロードAPIが落ちていても他に影響せず、失敗分は元のまま
#[tokio::test]
async fn test_upload_api_failure_keeps_original() {
    let api = common::serve(503, "text/plain", b"unavailable".to_vec()).await;
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.png"), b"a").unwrap();
    std::fs::write(dir.path().join("b.png"), b"b").unwrap();

    let processor = ImageProcessor::easyimage(
        settings(api.url("/api")),
        VaultStore::new(dir.path()),
    )
    .unwrap();

    let text = "![](a.png)\n![](b.png)\n![](missing.png)";
    let result = processor.process_all(text).await;
    assert_eq!(result.success_count, 0);
    assert_eq!(result.total_count, 3);
    assert_eq!(result.content, text);
    assert_eq!(result.failures.len(), 3);
}

/// 文書ファイルを処理して書き戻す
#[tokio::test]
async fn test_process_document_writes_back() {
    let api = upload_api().await;
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("notes/pics")).unwrap();
    std::fs::write(dir.path().join("notes/pics/a.png"), b"a").unwrap();
    let doc = dir.path().join("notes/today.md");
    std::fs::write(&doc, "# 今日\n![写真](./pics/a.png)\n").unwrap();

    let vault = VaultStore::new(dir.path());
    let mut processor =
        ImageProcessor::easyimage(settings(api.url("/api")), vault.clone()).unwrap();

    let report = document::process_document(&mut processor, &vault, &doc, None, false, false)
        .await
        .unwrap();
    assert!(report.written);
    assert_eq!(report.result.success_count, 1);

    let written = std::fs::read_to_string(&doc).unwrap();
    assert_eq!(written, "# 今日\n![写真](https://img.example.com/i/uploaded.png)\n");

    // 2回目は対象なし
    let again = document::process_document(&mut processor, &vault, &doc, None, false, false)
        .await
        .unwrap();
    assert_eq!(again.result.total_count, 0);
    assert!(!again.written);
}

/// ドライランでは書き戻さない
#[tokio::test]
async fn test_process_document_dry_run() {
    let api = upload_api().await;
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.png"), b"a").unwrap();
    let doc = dir.path().join("note.md");
    let original = "![](a.png)";
    std::fs::write(&doc, original).unwrap();

    let vault = VaultStore::new(dir.path());
    let mut processor =
        ImageProcessor::easyimage(settings(api.url("/api")), vault.clone()).unwrap();

    let report = document::process_document(&mut processor, &vault, &doc, None, true, false)
        .await
        .unwrap();
    assert_eq!(report.result.success_count, 1);
    assert!(!report.written);
    assert_eq!(std::fs::read_to_string(&doc).unwrap(), original);
}

/// 選択テキスト（Markdown形式）のURL部分のみ置き換える
#[tokio::test]
async fn test_upload_selection_end_to_end() {
    let images = common::serve(200, "image/gif", b"gif".to_vec()).await;
    let api = upload_api().await;
    let dir = tempdir().unwrap();

    let processor = ImageProcessor::easyimage(
        settings(api.url("/api")),
        VaultStore::new(dir.path()),
    )
    .unwrap();

    let selection = format!("![アニメ]({})", images.url("/anim.gif"));
    let outcome = processor.upload_selection(&selection).await.unwrap();
    assert!(outcome.markdown);
    assert_eq!(outcome.replacement, "![アニメ](https://img.example.com/i/uploaded.png)");
}

/// Vault外の文書は `./` を文書自身のフォルダから解決する
#[tokio::test]
async fn test_document_outside_vault_resolves_own_folder() {
    let api = upload_api().await;
    let vault_dir = tempdir().unwrap();
    let docs_dir = tempdir().unwrap();
    std::fs::create_dir_all(docs_dir.path().join("pics")).unwrap();
    std::fs::write(docs_dir.path().join("pics/a.png"), b"a").unwrap();
    let doc = docs_dir.path().join("today.md");
    std::fs::write(&doc, "![](./pics/a.png)").unwrap();

    let vault = VaultStore::new(vault_dir.path());
    let mut processor =
        ImageProcessor::easyimage(settings(api.url("/api")), vault.clone()).unwrap();

    let report = document::process_document(&mut processor, &vault, &doc, None, false, false)
        .await
        .unwrap();
    assert_eq!(report.result.success_count, 1);
    assert!(report.result.failures.is_empty());
    assert_eq!(
        std::fs::read_to_string(&doc).unwrap(),
        "![](https://img.example.com/i/uploaded.png)"
    );
}

/// 読めない文書があっても残りの文書を処理する
#[tokio::test]
async fn test_unreadable_document_does_not_stop_folder() {
    let api = upload_api().await;
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.png"), b"a").unwrap();
    std::fs::write(dir.path().join("1_broken.md"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
    std::fs::write(dir.path().join("2_note.md"), "![](a.png)").unwrap();

    let vault = VaultStore::new(dir.path());
    let mut processor =
        ImageProcessor::easyimage(settings(api.url("/api")), vault.clone()).unwrap();
    let documents = document::collect_documents(dir.path(), false).unwrap();
    assert_eq!(documents.len(), 2);

    let reports =
        document::process_documents(&mut processor, &vault, &documents, None, false, false).await;
    assert_eq!(reports.len(), 2);
    assert!(reports[0].1.is_err());

    let second = reports[1].1.as_ref().unwrap();
    assert_eq!(second.result.success_count, 1);
    assert!(second.written);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("2_note.md")).unwrap(),
        "![](https://img.example.com/i/uploaded.png)"
    );
}

/// 出力先指定時はアップロード対象がなくても書き出す
#[tokio::test]
async fn test_output_written_without_uploads() {
    let api = upload_api().await;
    let dir = tempdir().unwrap();
    let doc = dir.path().join("note.md");
    let content = "# 画像なし\n![](https://img.example.com/i/x.png)\n";
    std::fs::write(&doc, content).unwrap();
    let output = dir.path().join("out.md");

    let vault = VaultStore::new(dir.path());
    let mut processor =
        ImageProcessor::easyimage(settings(api.url("/api")), vault.clone()).unwrap();

    let report =
        document::process_document(&mut processor, &vault, &doc, Some(&output), false, false)
            .await
            .unwrap();
    assert_eq!(report.result.total_count, 0);
    assert!(report.written);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), content);
    assert!(api.requests().is_empty());
}
