//! 位置ベースのテキスト置換
//!
//! 各置換は元テキスト上の範囲で指定し、オフセットの大きい方から1パスで適用する。
//! 同一のMarkdownが複数回出現しても、それぞれ独立に置換される。

use std::ops::Range;

/// 置換1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub span: Range<usize>,
    pub text: String,
}

impl Replacement {
    pub fn new(span: Range<usize>, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }
}

/// 範囲指定の置換を右から左へ適用
///
/// 範囲外・文字境界でない・先行する置換と重なる置換は無視する。
pub fn apply_replacements(text: &str, replacements: &[Replacement]) -> String {
    let mut ordered: Vec<&Replacement> = replacements.iter().collect();
    ordered.sort_by(|a, b| b.span.start.cmp(&a.span.start));

    let mut result = text.to_string();
    let mut lower_bound = text.len();
    for replacement in ordered {
        let Range { start, end } = replacement.span;
        if start > end || end > lower_bound {
            continue;
        }
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            continue;
        }
        result.replace_range(start..end, &replacement.text);
        lower_bound = start;
    }
    result
}
