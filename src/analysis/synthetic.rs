//! ベンチマーク・結合テスト用の合成コーパス。
use rand::{Rng, SeedableRng, rngs::StdRng};

/// 5つのトピック群。語彙は群どうしで重ならない。
const GROUPS: [(&str, [&str; 8]); 5] = [
    (
        "transit",
        ["bus", "tram", "subway", "station", "timetable", "commuter", "fare", "platform"],
    ),
    (
        "parks",
        ["park", "garden", "playground", "bench", "fountain", "lawn", "picnic", "trail"],
    ),
    (
        "health",
        ["clinic", "hospital", "nurse", "doctor", "vaccine", "pharmacy", "patient", "ambulance"],
    ),
    (
        "housing",
        ["rent", "apartment", "landlord", "tenant", "mortgage", "eviction", "lease", "housing"],
    ),
    (
        "safety",
        ["police", "crime", "patrol", "theft", "burglary", "streetlight", "alarm", "vandalism"],
    ),
];

/// ストップワードだけで組んだ文型。`{0}`〜`{2}` に群の語が入る。
const TEMPLATES: [&str; 4] = [
    "The {0} and the {1} of the {2}.",
    "There is a {0} for the {1} with {2}.",
    "Our {0} was by the {1} and {2}.",
    "What about the {0}, the {1} or the {2}?",
];

/// 群の数。
pub const GROUP_COUNT: usize = GROUPS.len();

/// 合成文書と群ラベルを生成する。文書 `i` は群 `i % 5` に属する。
///
/// # Arguments
/// * `count` - 生成する文書数
/// * `seed` - 乱数シード
#[must_use]
pub fn synthetic_labeled_corpus(count: usize, seed: u64) -> Vec<(String, String)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|idx| {
            let (label, words) = GROUPS[idx % GROUP_COUNT];
            (compose(&words, &mut rng), label.to_string())
        })
        .collect()
}

/// 群ごとの文書数を指定して合成文書を生成する。出力は群の順に並ぶ。
///
/// `sizes` の長さが群の数を超えた分は無視する。
#[must_use]
pub fn synthetic_grouped_corpus(sizes: &[usize], seed: u64) -> Vec<(String, String)> {
    let mut rng = StdRng::seed_from_u64(seed);
    GROUPS
        .iter()
        .zip(sizes)
        .flat_map(|((label, words), &size)| {
            (0..size)
                .map(|_| (compose(words, &mut rng), (*label).to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn compose(words: &[&str], rng: &mut StdRng) -> String {
    let sentences = rng.random_range(2..=3);
    (0..sentences)
        .map(|_| {
            let mut sentence = TEMPLATES[rng.random_range(0..TEMPLATES.len())].to_string();
            for slot in 0..3 {
                let word = words[rng.random_range(0..words.len())];
                sentence = sentence.replace(&format!("{{{slot}}}"), word);
            }
            sentence
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// ラベルなしの合成文書。
#[must_use]
pub fn synthetic_documents(count: usize, seed: u64) -> Vec<String> {
    synthetic_labeled_corpus(count, seed)
        .into_iter()
        .map(|(body, _)| body)
        .collect()
}

/// 群ラベルの一覧（生成順）。
#[must_use]
pub fn group_labels() -> Vec<&'static str> {
    GROUPS.iter().map(|(label, _)| *label).collect()
}
