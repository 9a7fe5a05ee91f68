//! テキスト正規化: 文→単語分割、小文字化、ストップワード除去、ステミング。
//!
//! 概念抽出・クラスタリング・分類のすべてがこのモジュールを共有する。
pub mod language;
pub mod stopwords;
pub mod translate;

use rust_stemmers::Stemmer;
use rustc_hash::FxHashSet;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

pub use self::language::Language;
pub use self::stopwords::StopWords;
pub use self::translate::{HttpTranslator, IdentityTranslator, RetryingTranslator, Translator};
use crate::util::text::{split_sentences, strip_emojis, strip_urls};

/// 正規化の出力形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeMode {
    /// ストップワードを除去し、表層形を保つ
    #[default]
    RemoveStopWords,
    /// ストップワード除去の後に Snowball ステミングを適用する
    Stem,
}

/// 1回の正規化呼び出しのオプション。
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub context_words: Vec<String>,
    pub mode: NormalizeMode,
    pub strip_urls: bool,
    pub strip_emojis: bool,
    pub letters_only: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            context_words: Vec::new(),
            mode: NormalizeMode::RemoveStopWords,
            strip_urls: false,
            strip_emojis: false,
            letters_only: true,
        }
    }
}

impl NormalizeOptions {
    #[must_use]
    pub fn stemmed(context_words: &[String]) -> Self {
        Self {
            context_words: context_words.to_vec(),
            mode: NormalizeMode::Stem,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn surface(context_words: &[String]) -> Self {
        Self {
            context_words: context_words.to_vec(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_url_stripping(mut self, strip: bool) -> Self {
        self.strip_urls = strip;
        self
    }
}

/// 言語ごとのトークナイザ。ストップワード集合とステマーを保持する。
pub struct TextNormalizer {
    language: Language,
    stop_words: StopWords,
    stemmer: Stemmer,
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("language", &self.language)
            .field("stop_words", &self.stop_words.len())
            .finish_non_exhaustive()
    }
}

impl TextNormalizer {
    #[must_use]
    pub fn new(language: Language) -> Self {
        Self {
            language,
            stop_words: StopWords::for_language(language),
            stemmer: Stemmer::create(language.stemmer_algorithm()),
        }
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// 文単位→単語単位でトークナイズし、小文字化した生トークンを返す。
    ///
    /// 空白だけのトークンは含まれない。句読点は独立したトークンになる。
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized: String = text.nfc().collect();
        split_sentences(&normalized)
            .iter()
            .flat_map(|sentence| {
                sentence
                    .split_word_bounds()
                    .filter(|piece| !piece.trim().is_empty())
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// テキストを正規化したトークン列に変換する。
    #[must_use]
    pub fn normalize(&self, text: &str, options: &NormalizeOptions) -> Vec<String> {
        let mut source = text.to_string();
        if options.strip_urls {
            source = strip_urls(&source);
        }
        if options.strip_emojis {
            source = strip_emojis(&source);
        }

        let context: FxHashSet<String> = options
            .context_words
            .iter()
            .map(|word| word.trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        let is_stop = |token: &str| self.stop_words.contains(token) || context.contains(token);

        let mut tokens = Vec::new();
        for token in self.tokenize(&source) {
            if is_stop(&token) {
                continue;
            }
            if options.letters_only {
                let cleaned: String = token
                    .chars()
                    .map(|c| if c.is_alphabetic() { c } else { ' ' })
                    .collect();
                for piece in cleaned.split_whitespace() {
                    if !is_stop(piece) {
                        tokens.push(piece.to_string());
                    }
                }
            } else if token.chars().any(char::is_alphanumeric) {
                tokens.push(token);
            }
        }

        match options.mode {
            NormalizeMode::RemoveStopWords => tokens,
            NormalizeMode::Stem => tokens
                .iter()
                .map(|token| self.stemmer.stem(token).into_owned())
                .collect(),
        }
    }

    /// [`TextNormalizer::normalize`] の結果を空白で連結する。
    #[must_use]
    pub fn normalize_joined(&self, text: &str, options: &NormalizeOptions) -> String {
        self.normalize(text, options).join(" ")
    }

    /// 単語1つをステミングする。
    #[must_use]
    pub fn stem(&self, word: &str) -> String {
        self.stemmer.stem(word).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn english() -> TextNormalizer {
        TextNormalizer::new(Language::English)
    }

    #[test]
    fn tokenize_splits_punctuation_from_words() {
        let tokens = english().tokenize("Hello, World! It works.");
        assert_eq!(tokens, vec!["hello", ",", "world", "!", "it", "works", "."]);
    }

    #[test]
    fn removes_stop_words_and_punctuation() {
        let tokens = english().normalize(
            "The parliament approved the budget.",
            &NormalizeOptions::default(),
        );
        assert_eq!(tokens, vec!["parliament", "approved", "budget"]);
    }

    #[test]
    fn context_words_are_removed() {
        let options = NormalizeOptions::surface(&["budget".to_string()]);
        let tokens = english().normalize("The Budget was approved", &options);
        assert_eq!(tokens, vec!["approved"]);
    }

    #[test]
    fn letters_only_drops_numbers() {
        let tokens = english().normalize("budget2019 votes 42", &NormalizeOptions::default());
        assert_eq!(tokens, vec!["budget", "votes"]);
    }

    #[test]
    fn stem_mode_applies_snowball() {
        let tokens = english().normalize(
            "Running runners voted",
            &NormalizeOptions::stemmed(&[]),
        );
        assert_eq!(tokens, vec!["run", "runner", "vote"]);
    }

    #[test]
    fn url_lines_are_stripped_on_request() {
        let text = "https://example.com/path\nSchools lack funding";
        let kept = english().normalize(text, &NormalizeOptions::default());
        assert!(kept.iter().any(|token| token.contains("example")));

        let options = NormalizeOptions::default().with_url_stripping(true);
        let stripped = english().normalize(text, &options);
        assert_eq!(stripped, vec!["schools", "lack", "funding"]);
    }

    #[test]
    fn spanish_keeps_accented_letters() {
        let normalizer = TextNormalizer::new(Language::Spanish);
        let tokens = normalizer.normalize("La educación pública", &NormalizeOptions::default());
        assert_eq!(tokens, vec!["educación", "pública"]);
    }
}
