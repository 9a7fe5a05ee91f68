//! テキスト処理ユーティリティ。
//!
//! 文分割、URL・絵文字の除去、ハッシングを提供します。
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;
use xxhash_rust::xxh3::xxh3_64;

/// 行頭から始まるURLを行末まで除去する（旧実装と同じ挙動）。
static LINE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^https?://.*[\r\n]*").expect("compile line url regex"));

/// 文中に埋め込まれたURL。
static INLINE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("compile inline url regex"));

static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        "[",
        "\u{1F600}-\u{1F64F}", // emoticons
        "\u{1F300}-\u{1F5FF}", // symbols & pictographs
        "\u{1F680}-\u{1F6FF}", // transport & map symbols
        "\u{1F1E0}-\u{1F1FF}", // flags (iOS)
        "\u{1F900}-\u{1F9FF}", // supplemental symbols & pictographs
        "\u{2600}-\u{26FF}",   // misc symbols
        "\u{2700}-\u{27BF}",   // dingbats
        "\u{FE0F}",
        "]+"
    ))
    .expect("compile emoji regex")
});

/// テキストをXXH3でハッシュする。
#[must_use]
pub fn hash_text(text: &str) -> u64 {
    xxh3_64(text.as_bytes())
}

/// テキストを文に分割する。
///
/// Unicode UAX#29に準拠した文境界検出を使用します。
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    text.unicode_sentences()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// URLを除去する。
#[must_use]
pub fn strip_urls(text: &str) -> String {
    let without_lines = LINE_URL_RE.replace_all(text, "");
    INLINE_URL_RE.replace_all(&without_lines, " ").into_owned()
}

/// 絵文字・記号・国旗を除去する。
#[must_use]
pub fn strip_emojis(text: &str) -> String {
    EMOJI_RE.replace_all(text, "").into_owned()
}
