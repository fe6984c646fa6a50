//! Markdown画像参照スキャナ
//!
//! `![alt](url)` を先頭から線形に走査し、重ならないマッチを文書順に返す。
//! altは捨て、URLとその位置だけを保持する。

use crate::types::ImageMatch;
use regex::{Captures, Regex};

lazy_static::lazy_static! {
    static ref IMAGE_RE: Regex = Regex::new(r"!\[.*?\]\((.*?)\)").unwrap();
}

/// 画像参照を全て検出
pub fn detect(text: &str) -> Vec<ImageMatch> {
    IMAGE_RE.captures_iter(text).filter_map(|caps| to_match(&caps)).collect()
}

/// 最初の画像参照のみ検出（選択範囲用）
pub fn first_match(text: &str) -> Option<ImageMatch> {
    IMAGE_RE.captures(text).and_then(|caps| to_match(&caps))
}

fn to_match(caps: &Captures<'_>) -> Option<ImageMatch> {
    let whole = caps.get(0)?;
    let url = caps.get(1)?;
    Some(ImageMatch {
        url: url.as_str().to_string(),
        raw_match: whole.as_str().to_string(),
        offset: whole.start(),
        url_offset: url.start(),
    })
}
