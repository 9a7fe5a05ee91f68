//! 品詞タグ付け。Penn Treebank タグを出力する。
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// トークン列に品詞タグを付与する。
pub trait PosTagger: Send + Sync {
    /// 入力と同じ長さのタグ列を返す。
    fn tag(&self, tokens: &[String]) -> Vec<String>;
}

/// 閉じた語彙クラスの辞書と接尾辞規則によるタガー。
///
/// 入力は小文字化済みトークンを想定する。大文字情報がないため `NNP` は出さない。
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedTagger;

static LEXICON: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    let groups: &[(&str, &[&str])] = &[
        ("DT", &["the", "a", "an", "this", "that", "these", "those", "every", "each", "some", "any", "no", "all", "both", "another"]),
        ("IN", &["of", "in", "on", "at", "by", "for", "with", "about", "against", "between", "into", "through", "during", "before", "after", "above", "below", "from", "under", "over", "since", "until", "while", "because", "although", "if", "than", "via", "per", "among", "without", "within", "across", "towards", "upon", "near", "beside", "behind", "around", "along", "toward", "onto", "past", "beyond", "throughout", "beneath", "inside", "outside"]),
        ("CC", &["and", "or", "but", "nor", "yet", "so"]),
        ("PRP", &["i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them"]),
        ("PRP$", &["my", "your", "his", "its", "our", "their"]),
        ("MD", &["can", "could", "may", "might", "must", "shall", "should", "will", "would"]),
        ("TO", &["to"]),
        ("WDT", &["which", "whatever", "whichever"]),
        ("WP", &["who", "whom", "what", "whoever"]),
        ("WRB", &["when", "where", "why", "how"]),
        ("EX", &["there"]),
        ("RB", &["not", "very", "too", "also", "just", "now", "then", "here", "always", "never", "often", "soon", "again", "already", "still", "almost", "even", "ever", "quite", "rather", "perhaps", "however", "instead", "together", "away", "back"]),
        ("VB", &["be", "have", "do", "make", "get", "go", "take", "give", "see", "know", "think", "want", "need", "use", "find", "tell", "ask", "work", "seem", "feel", "try", "leave", "call", "keep", "let", "begin", "help", "show", "hear", "play", "run", "move", "live", "believe", "bring", "happen", "provide", "allow", "include", "continue", "improve", "create", "support", "reduce", "increase", "ensure", "promote", "encourage", "establish", "implement"]),
        ("VBZ", &["is", "has", "does", "says", "goes", "makes", "needs", "seems"]),
        ("VBP", &["are", "am"]),
        ("VBD", &["was", "were", "had", "did", "said", "made", "went", "took", "gave", "saw", "knew", "thought", "told", "found", "became", "came", "got", "left", "felt", "brought", "began", "kept", "held", "wrote", "stood", "heard", "meant", "met", "ran", "paid", "sat", "spoke", "lay", "led", "grew", "lost", "fell", "sent", "built", "understood"]),
        ("VBN", &["been", "done", "gone", "taken", "given", "seen", "known", "shown", "written", "become", "grown", "chosen", "spoken", "born"]),
        ("JJ", &["good", "new", "first", "last", "long", "great", "little", "own", "other", "old", "right", "big", "high", "different", "small", "large", "next", "early", "young", "important", "few", "public", "bad", "same", "able", "free", "better", "best", "full", "real", "true", "whole", "clear", "strong", "poor", "low", "sure", "main", "major", "local", "national", "social", "green", "safe", "clean", "fair", "open", "cheap", "easy", "hard", "necessary", "possible", "available", "current", "general", "human", "economic", "political", "environmental", "digital", "rural", "urban", "more", "most", "less", "many", "much", "several"]),
        ("CD", &["one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "hundred", "thousand", "million", "billion"]),
        ("UH", &["yes", "oh", "ok", "okay", "please", "hello", "thanks"]),
    ];
    for (tag, words) in groups {
        for word in *words {
            map.insert(*word, *tag);
        }
    }
    map
});

/// 接尾辞規則の例外となる名詞（-ing, -ed, -s で終わる名詞）。
static NOUN_EXCEPTIONS: &[&str] = &[
    "thing", "king", "ring", "spring", "string", "wing", "morning", "evening", "ceiling",
    "nothing", "something", "anything", "everything", "building", "meeting", "funding",
    "housing", "training", "planning", "spending", "clothing", "parking", "wedding", "bed",
    "seed", "speed", "feed", "shed", "greed", "weed", "deed", "news", "series", "species",
    "physics", "economics", "politics", "mathematics", "ethics", "lens", "gas", "bus", "virus",
    "campus", "bonus", "census", "status", "focus", "analysis", "crisis", "basis", "thesis",
];

fn tag_word(word: &str) -> &'static str {
    if let Some(tag) = LEXICON.get(word) {
        return *tag;
    }
    if word.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') && !word.is_empty() {
        return "CD";
    }
    if !word.chars().any(char::is_alphabetic) {
        return "SYM";
    }
    if NOUN_EXCEPTIONS.contains(&word) {
        return "NN";
    }

    let len = word.chars().count();
    let ends = |suffix: &str| word.ends_with(suffix) && len > suffix.len() + 2;

    if ends("ly") {
        "RB"
    } else if ends("ing") {
        "VBG"
    } else if ends("ed") {
        "VBD"
    } else if ["ous", "ful", "ive", "able", "ible", "less", "ish", "ical"]
        .iter()
        .any(|suffix| ends(suffix))
    {
        "JJ"
    } else if ends("est") {
        "JJS"
    } else if ["ize", "ise", "ify"].iter().any(|suffix| ends(suffix)) {
        "VB"
    } else if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") && len > 3 {
        "NNS"
    } else {
        "NN"
    }
}

impl PosTagger for RuleBasedTagger {
    fn tag(&self, tokens: &[String]) -> Vec<String> {
        let mut tags: Vec<String> = tokens.iter().map(|t| tag_word(t).to_string()).collect();

        // 限定詞・所有格・形容詞の直後の -ing/-ed は名詞・形容詞として扱う
        for idx in 1..tokens.len() {
            let previous = tags[idx - 1].clone();
            let follows_modifier = matches!(previous.as_str(), "DT" | "PRP$" | "JJ");
            if follows_modifier && tags[idx] == "VBG" {
                tags[idx] = "NN".to_string();
            } else if previous == "DT" && tags[idx] == "VBD" {
                tags[idx] = "JJ".to_string();
            } else if matches!(previous.as_str(), "TO" | "MD") && tags[idx] == "NN" {
                tags[idx] = "VB".to_string();
            }
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tags_for(words: &[&str]) -> Vec<String> {
        let tokens: Vec<String> = words.iter().map(ToString::to_string).collect();
        RuleBasedTagger.tag(&tokens)
    }

    #[rstest]
    #[case("education", "NN")]
    #[case("schools", "NNS")]
    #[case("business", "NN")]
    #[case("quickly", "RB")]
    #[case("running", "VBG")]
    #[case("approved", "VBD")]
    #[case("dangerous", "JJ")]
    #[case("2019", "CD")]
    #[case("housing", "NN")]
    #[case("the", "DT")]
    #[case("near", "IN")]
    #[case("behind", "IN")]
    #[case("toward", "IN")]
    #[case("throughout", "IN")]
    fn tags_single_words(#[case] word: &str, #[case] expected: &str) {
        assert_eq!(tags_for(&[word]), vec![expected.to_string()]);
    }

    #[test]
    fn gerund_after_determiner_is_noun() {
        assert_eq!(tags_for(&["the", "recycling"]), vec!["DT", "NN"]);
    }

    #[test]
    fn noun_after_modal_is_verb() {
        assert_eq!(tags_for(&["should", "plant"]), vec!["MD", "VB"]);
    }

    #[test]
    fn spatial_prepositions_are_not_nouns() {
        let tags = tags_for(&["light", "near", "the", "school", "outside", "the", "library"]);
        assert_eq!(tags[1], "IN");
        assert_eq!(tags[4], "IN");
        assert!(tags[3].starts_with("NN"));
    }

    #[test]
    fn output_length_matches_input() {
        assert_eq!(tags_for(&["a", "b", "c", "d"]).len(), 4);
        assert!(tags_for(&[]).is_empty());
    }
}
