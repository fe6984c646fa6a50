use clap::Parser;
use easyimage_common::Classifier;
use easyimage_uploader::{cli, config, document, error, processor, store};
use cli::{Cli, Commands};
use config::Config;
use error::{Result, UploaderError};
use processor::ImageProcessor;
use store::VaultStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,easyimage_uploader=debug"
    } else {
        "warn,easyimage_uploader=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;

    match cli.command {
        Commands::UploadAll { path, vault, output, dry_run, recursive } => {
            println!("📤 easyimage - 画像一括アップロード\n");

            let documents = document::collect_documents(&path, recursive)?;
            if output.is_some() && documents.len() != 1 {
                return Err(UploaderError::Config(
                    "--output は単一ファイル指定時のみ使用できます".into(),
                ));
            }
            println!("✔ {}件の文書を検出\n", documents.len());

            let vault = VaultStore::new(vault);
            let mut processor = ImageProcessor::easyimage(config.snapshot(), vault.clone())?;

            let reports = document::process_documents(
                &mut processor,
                &vault,
                &documents,
                output.as_deref(),
                dry_run,
                true,
            )
            .await;

            let mut uploaded = 0;
            let mut total = 0;
            let mut failed_documents = 0;
            for (doc, report) in &reports {
                println!("- {}", doc.display());
                let report = match report {
                    Ok(report) => report,
                    Err(e) => {
                        println!("  ✗ 文書を処理できませんでした: {}", e);
                        failed_documents += 1;
                        continue;
                    }
                };

                let result = &report.result;
                if result.total_count == 0 {
                    println!("  アップロード対象の画像はありません");
                } else {
                    println!(
                        "  アップロード完了: 成功 {}/{}枚{}",
                        result.success_count,
                        result.total_count,
                        if report.written { "（書き戻し済み）" } else { "" }
                    );
                    for failure in &result.failures {
                        println!("  ✗ {}: {}", failure.url, failure.error);
                    }
                }
                if let Some(target) = output.as_deref().filter(|_| report.written) {
                    println!("  出力: {}", target.display());
                }
                uploaded += result.success_count;
                total += result.total_count;
            }

            println!("\n✅ 完了: 成功 {}/{}", uploaded, total);
            if failed_documents > 0 {
                return Err(UploaderError::DocumentsFailed(failed_documents));
            }
        }

        Commands::Upload { selection, document: active, vault } => {
            let vault = VaultStore::new(vault);
            let mut processor = ImageProcessor::easyimage(config.snapshot(), vault.clone())?;
            if let Some(path) = active {
                processor.set_active_document(document::locate_document(&vault, &path));
            }

            let outcome = processor.upload_selection(&selection).await?;
            if outcome.already_hosted {
                eprintln!("既にEasyImage上の画像です");
            } else {
                eprintln!("✔ アップロード成功");
            }
            println!("{}", outcome.replacement);
        }

        Commands::Scan { file } => {
            let content = std::fs::read_to_string(&file)?;
            let classifier = Classifier::new(config.snapshot().domain.clone());
            let references = classifier.classify_all(&content);

            println!("画像参照: {}件", references.len());
            for reference in &references {
                println!(
                    "  {:>6}  {:<14} {}",
                    reference.image.offset,
                    reference.kind.label(),
                    reference.url()
                );
            }
            let actionable = references.iter().filter(|r| r.kind.is_actionable()).count();
            println!("アップロード対象: {}件", actionable);
        }

        Commands::Config {
            show,
            set_api_url,
            set_token,
            set_domain,
            set_compression,
            set_convert_format,
            set_auto_upload,
            set_max_concurrent,
            set_timeout,
        } => {
            let changed = set_api_url.is_some()
                || set_token.is_some()
                || set_domain.is_some()
                || set_compression.is_some()
                || set_convert_format.is_some()
                || set_auto_upload.is_some()
                || set_max_concurrent.is_some()
                || set_timeout.is_some();

            if changed {
                config.update(|s| {
                    if let Some(v) = set_api_url {
                        s.api_url = v;
                    }
                    if let Some(v) = set_token {
                        s.token = v;
                    }
                    if let Some(v) = set_domain {
                        s.domain = v;
                    }
                    if let Some(v) = set_compression {
                        s.compression = v;
                    }
                    if let Some(v) = set_convert_format {
                        s.convert_format = v;
                    }
                    if let Some(v) = set_auto_upload {
                        s.auto_upload = v;
                    }
                    if let Some(v) = set_max_concurrent {
                        s.max_concurrent_uploads = v;
                    }
                    if let Some(v) = set_timeout {
                        s.timeout_seconds = v;
                    }
                })?;
                println!("✔ 設定を保存しました: {}", config.path().display());
            }

            if show || !changed {
                print_settings(&config);
            }
        }
    }

    Ok(())
}

fn print_settings(config: &Config) {
    let s = config.snapshot();
    println!("設定 ({}):", config.path().display());
    println!("  API URL: {}", s.api_url);
    println!("  トークン: {}", cli::mask_token(&s.token));
    println!("  画像ドメイン: {}", s.domain);
    println!("  圧縮品質: {} (未適用)", s.compression);
    println!("  変換フォーマット: {} (未適用)", s.convert_format);
    println!("  自動アップロード: {}", s.auto_upload);
    println!("  最大同時アップロード数: {}", s.max_concurrent_uploads);
    println!("  タイムアウト: {}秒", s.timeout_seconds);
}
