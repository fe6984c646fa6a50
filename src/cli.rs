use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "easyimage")]
#[command(about = "Markdown内の画像をEasyImageへアップロードしてリンクを書き換える", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 文書内の全画像をアップロードしてリンクを書き換え
    UploadAll {
        /// Markdownファイル、またはMarkdownを含むフォルダ
        #[arg(required = true)]
        path: PathBuf,

        /// Vaultルート（相対パス画像の基準）
        #[arg(long, default_value = ".")]
        vault: PathBuf,

        /// 出力ファイル（単一ファイル指定時のみ。省略時は上書き）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ドライラン（アップロードはするが書き戻さない）
        #[arg(long)]
        dry_run: bool,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 選択テキスト（画像リンク or URL/パス）を1件アップロード
    Upload {
        /// `![alt](url)` または生のURL/パス
        #[arg(required = true)]
        selection: String,

        /// アクティブ文書（`./` `../` の解決基準）
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// Vaultルート
        #[arg(long, default_value = ".")]
        vault: PathBuf,
    },

    /// 文書内の画像参照と分類を一覧表示
    Scan {
        #[arg(required = true)]
        file: PathBuf,
    },

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// アップロードAPIのURL
        #[arg(long)]
        set_api_url: Option<String>,

        /// APIトークン
        #[arg(long)]
        set_token: Option<String>,

        /// ホスト済み判定に使う画像ドメイン
        #[arg(long)]
        set_domain: Option<String>,

        /// 圧縮品質 (1-100)
        #[arg(long)]
        set_compression: Option<u8>,

        /// 変換フォーマット
        #[arg(long)]
        set_convert_format: Option<String>,

        /// 貼り付け時の自動アップロード
        #[arg(long)]
        set_auto_upload: Option<bool>,

        /// 最大同時アップロード数
        #[arg(long)]
        set_max_concurrent: Option<usize>,

        /// リクエストタイムアウト（秒）
        #[arg(long)]
        set_timeout: Option<u64>,
    },
}

/// トークンを伏せ字にする（先頭4文字のみ表示）
pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
