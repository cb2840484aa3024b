//! End-to-end mining scenarios over the full collector pipeline.

use phrasemine_core::{
    CollectorOptions, PhraseCollector, PhraseStats, PrunePolicy, StatsOptions, WordCache, report,
};

fn collector(policy: PrunePolicy) -> PhraseCollector {
    let stats = PhraseStats::new(StatsOptions {
        max_count: 100_000,
        buffer_count: 50_000,
        policy,
    });
    PhraseCollector::new(WordCache::new(), stats, CollectorOptions::default()).unwrap()
}

#[test]
fn frequency_list_matches_recorded_behavior() {
    let mut c = collector(PrunePolicy::CountRank);
    let total = c.add_text(
        "Word's-B - WordA   Word-C  worda <tag> word-c  wordA </tag> wordD Wordd  -",
    );
    assert_eq!(total, 8);

    c.stats_mut().reduce(true);
    let (cache, stats) = c.into_parts();
    assert_eq!(
        report::render_tsv(&cache, &stats),
        "3\tWordA\r\n2\tWord-C\r\n2\twordD\r\n2\tWord-C WordA\r\n1\tWord's-B"
    );
}

#[test]
fn self_count_reduction_prunes_subsumed_phrases() {
    let mut c = collector(PrunePolicy::SelfCount);
    // "alpha beta" three times; neither word ever appears alone.
    c.add_text("alpha beta\r\nalpha beta\r\nalpha beta");
    c.stats_mut().reduce(true);

    let (cache, stats) = c.into_parts();
    assert_eq!(stats.len(), 1);
    let entries = stats.entries();
    let (phrase_key, record) = entries[0];
    assert_eq!(record.count, 3);
    assert_eq!(record.self_count, 3);
    assert_eq!(
        report::phrase_text(&cache, phrase_key).as_deref(),
        Some("alpha beta")
    );
}

#[test]
fn self_count_keeps_phrases_with_their_own_signal() {
    let mut c = collector(PrunePolicy::SelfCount);
    // "strange loop" appears inside a longer phrase twice and alone once.
    c.add_text("the strange loop\r\nthe strange loop\r\nstrange loop");
    c.stats_mut().reduce(true);

    let (cache, stats) = c.into_parts();
    let texts: Vec<String> = stats
        .entries()
        .iter()
        .map(|(k, _)| report::phrase_text(&cache, k).unwrap())
        .collect();
    assert!(texts.contains(&"the strange loop".to_string()));
    assert!(texts.contains(&"strange loop".to_string()));
    assert!(!texts.contains(&"the strange".to_string()));
    assert!(!texts.contains(&"loop".to_string()));
}

#[test]
fn identical_input_produces_identical_tables() {
    let text = "над небом голубым есть город золотой\r\nпод небом голубым";
    let snapshot = |mut c: PhraseCollector| {
        c.add_text(text);
        c.stats_mut().reduce(true);
        let (cache, stats) = c.into_parts();
        stats
            .entries()
            .iter()
            .map(|(k, r)| {
                (
                    report::phrase_text(&cache, k).unwrap(),
                    r.count,
                    r.self_count,
                )
            })
            .collect::<Vec<_>>()
    };
    let a = snapshot(collector(PrunePolicy::SelfCount));
    let b = snapshot(collector(PrunePolicy::SelfCount));
    assert_eq!(a, b);
    assert!(!a.is_empty());
}

#[test]
fn rejected_document_contributes_nothing() {
    let stats = PhraseStats::default();
    let opts = CollectorOptions {
        filter_text: Some(Box::new(|t| !t.contains("droppable"))),
        ..CollectorOptions::default()
    };
    let mut c = PhraseCollector::new(WordCache::new(), stats, opts).unwrap();
    assert_eq!(c.add_text("entirely droppable document"), 0);
    assert!(c.stats().is_empty());
    assert_eq!(c.add_text("kept document"), 2);
}
