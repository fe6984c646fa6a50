//! パス・ファイル名ユーティリティ
//!
//! Windows/POSIX両方の書式を文字列として扱う。ディスクアクセスはしない。

use regex::Regex;

lazy_static::lazy_static! {
    static ref DRIVE_RE: Regex = Regex::new(r"^[A-Za-z]:[\\/]").unwrap();
    static ref UNC_RE: Regex = Regex::new(r"^\\\\[^\\]+[\\/]").unwrap();
    static ref EXTENSION_RE: Regex = Regex::new(r"\.([a-zA-Z0-9]+)(?:\?|$)").unwrap();
}

const DEFAULT_EXTENSION: &str = "jpg";

/// 絶対パスかどうか
///
/// - ドライブレター: `C:\` / `C:/`
/// - UNC: `\\server\share`
/// - POSIX: `/` 始まり
pub fn is_absolute_path(path: &str) -> bool {
    DRIVE_RE.is_match(path) || UNC_RE.is_match(path) || path.starts_with('/')
}

/// http(s) のURLかどうか
pub fn is_web_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// 区切り文字を `/` に統一し、連続する `/` をまとめる
///
/// UNCパスの先頭 `//` は1つにまとめず維持する。
pub fn normalize_path(path: &str) -> String {
    let replaced = path.replace('\\', "/");
    let (prefix, rest) = if replaced.starts_with("//") && UNC_RE.is_match(path) {
        ("//", &replaced[2..])
    } else {
        ("", replaced.as_str())
    };

    let mut out = String::with_capacity(replaced.len());
    out.push_str(prefix);
    let mut prev_slash = false;
    for c in rest.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out
}

/// `./` `../` 始まりの相対パスをアクティブ文書の親フォルダ基準で解決する
///
/// それ以外の相対パスはVault相対としてそのまま返す。
/// 戻り値はVaultルートからのパス（先頭 `/` なし）。
/// `..` がVaultルートを越える場合は `None`。
pub fn resolve_relative_path(path: &str, active_document: Option<&str>) -> Option<String> {
    let path = normalize_path(path);
    if !is_dot_relative(&path) {
        return Some(path);
    }

    let Some(document) = active_document else {
        return Some(path);
    };

    let document = normalize_path(document);
    let parent = parent_dir(&document);
    let joined = if parent.is_empty() {
        path
    } else {
        format!("{}/{}", parent, path)
    };
    collapse_dot_segments(&joined)
}

/// 文書の位置を基準に解決する `./` `../` 始まりのパスか
pub fn is_dot_relative(path: &str) -> bool {
    let path = normalize_path(path);
    path.starts_with("./") || path.starts_with("../")
}

/// 親フォルダ（Vaultルート直下なら空文字）
pub fn parent_dir(path: &str) -> &str {
    let trimmed = path.trim_start_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[..idx],
        None => "",
    }
}

/// `.` と `..` を字句的に畳み込む
pub fn collapse_dot_segments(path: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// パス末尾のファイル名
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// URL末尾の拡張子（クエリ文字列の前）。見つからなければ `jpg`
pub fn file_extension(url: &str) -> &str {
    EXTENSION_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(DEFAULT_EXTENSION)
}

/// タイムスタンプと連番から一意なファイル名を生成
pub fn generate_filename(url: &str, timestamp_millis: i64, sequence: u64) -> String {
    format!("image_{}_{}.{}", timestamp_millis, sequence, file_extension(url))
}
