//! ストップワード集合の構築。
use rustc_hash::FxHashSet;

use super::language::Language;

/// 単語分割で独立したトークンになる記号類。言語のストップワードに常に追加される。
pub const PUNCTUATION_STOP_WORDS: &[&str] = &[
    ".", ",", "--", "'s", "?", ")", "(", ":", "'", "'re", "\"", "-", "}", "{", "\u{2014}",
];

/// 言語の既定ストップワードに記号類と呼び出し側の文脈語を加えた集合。
#[derive(Debug, Clone)]
pub struct StopWords {
    words: FxHashSet<String>,
}

impl StopWords {
    #[must_use]
    pub fn for_language(language: Language) -> Self {
        let mut words: FxHashSet<String> = stop_words::get(language.stop_words_language())
            .iter()
            .map(|word| word.to_string().to_lowercase())
            .collect();
        words.extend(PUNCTUATION_STOP_WORDS.iter().map(|word| (*word).to_string()));
        Self { words }
    }

    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_set_contains_function_words_and_punctuation() {
        let stop_words = StopWords::for_language(Language::English);
        assert!(stop_words.contains("the"));
        assert!(stop_words.contains("and"));
        assert!(stop_words.contains("'s"));
        assert!(stop_words.contains("\u{2014}"));
        assert!(!stop_words.contains("parliament"));
    }

    #[test]
    fn spanish_set_contains_articles() {
        let stop_words = StopWords::for_language(Language::Spanish);
        assert!(stop_words.contains("el"));
        assert!(stop_words.contains("de"));
        assert!(!stop_words.is_empty());
    }
}
