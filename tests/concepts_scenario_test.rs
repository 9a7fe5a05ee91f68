use analytics_worker::concepts::{ConceptConfig, ConceptExtractor};

fn complaints() -> Vec<String> {
    include_str!("data/complaints.txt")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[test]
fn unigram_concepts_rank_by_frequency() {
    let config = ConceptConfig {
        num_concepts: 15,
        ..ConceptConfig::default()
    };

    let summary = ConceptExtractor::new()
        .extract(&complaints(), &config)
        .expect("extract");

    assert_eq!(summary.concepts.len(), 15);
    let top: Vec<(&str, usize)> = summary
        .concepts
        .iter()
        .take(3)
        .map(|entry| (entry.term.as_str(), entry.frequency))
        .collect();
    assert_eq!(top[0].1, 6);
    assert_eq!(top[1].1, 6);
    assert!(top[..2].iter().any(|(term, _)| *term == "street"));
    assert!(top[..2].iter().any(|(term, _)| *term == "light"));
    assert_eq!(top[2], ("garbage", 2));
    assert!(
        summary
            .concepts
            .iter()
            .all(|entry| entry.term != "near" && entry.term != "outside")
    );
}

#[test]
fn frequent_bigram_replaces_its_words() {
    let config = ConceptConfig {
        num_concepts: 15,
        ngram_range: (1, 2),
        ..ConceptConfig::default()
    };
    let extractor = ConceptExtractor::new();

    let first = extractor.extract(&complaints(), &config).expect("extract");
    let second = extractor.extract(&complaints(), &config).expect("extract");

    assert_eq!(first, second);
    assert!(first.concepts.len() <= 15);
    assert_eq!(first.concepts[0].term, "street light");
    assert_eq!(first.concepts[0].frequency, 6);
    assert!(
        first
            .concepts
            .iter()
            .all(|entry| entry.term != "street" && entry.term != "light")
    );
}

#[test]
fn context_words_never_become_concepts() {
    let config = ConceptConfig {
        num_concepts: 15,
        context_words: vec!["street".to_string(), "light".to_string()],
        ..ConceptConfig::default()
    };

    let summary = ConceptExtractor::new()
        .extract(&complaints(), &config)
        .expect("extract");

    assert_eq!(summary.concepts[0].term, "garbage");
    assert!(summary.concepts.iter().all(|entry| entry.term != "street"));
}
