mod common;

use common::fixtures;
use manga_layout::bubble::{place_bubbles, Bubble, BubbleParams};
use manga_layout::geometry::BBox;
use manga_layout::layout::{build_query_layout, Corpus, CorpusFilter, ElementType, ScriptElement};
use manga_layout::matching::{find_similar_layouts, rank_references, similarity, MatchParams};
use manga_layout::LayoutError;
use std::collections::HashSet;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn load_fixture_corpus() -> (tempfile::TempDir, Corpus) {
    let dir = tempfile::tempdir().unwrap();
    let path = fixtures::write_json(dir.path(), "corpus.json", &fixtures::corpus());
    let corpus = Corpus::load(&path).unwrap();
    (dir, corpus)
}

fn script() -> Vec<ScriptElement> {
    serde_json::from_value(fixtures::script()).unwrap()
}

fn boxes() -> Vec<BBox> {
    fixtures::query_boxes().into_iter().map(BBox::from).collect()
}

#[test]
fn corpus_loads_and_reports_missing_signatures() {
    init_logger();
    let (_dir, corpus) = load_fixture_corpus();
    assert_eq!(corpus.len(), 5);
    assert_eq!(corpus.signatures().collect::<Vec<_>>(), vec!["1_1", "2_0"]);
    assert_eq!(corpus.query(1, 1).unwrap().len(), 4);
    match corpus.query(3, 0) {
        Err(LayoutError::MissingSignature(key)) => assert_eq!(key, "3_0"),
        other => panic!("expected a missing signature, got {other:?}"),
    }
}

#[test]
fn unreadable_or_malformed_corpus_is_a_hard_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    assert!(matches!(Corpus::load(&missing), Err(LayoutError::Io { .. })));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{\"1_1\": [").unwrap();
    assert!(matches!(Corpus::load(&broken), Err(LayoutError::Parse { .. })));
}

#[test]
fn geometric_twin_ranks_first_with_full_score() {
    init_logger();
    let (_dir, corpus) = load_fixture_corpus();
    let query = build_query_layout(&boxes(), &script(), 200, 200);
    assert_eq!((query.num_speakers, query.num_non_speakers), (1, 1));
    assert_eq!(query.layout.count(ElementType::Speaker), 1);
    assert_eq!(query.unrelated_text_length, 3);

    let ranked = find_similar_layouts(
        &corpus,
        &query,
        &CorpusFilter::default(),
        &MatchParams::default(),
    )
    .unwrap();
    // wide.png fails the aspect window, wordy.png the text window
    let names: Vec<&str> = ranked.iter().map(|r| r.record.image_path.as_str()).collect();
    assert_eq!(names, vec!["exact.png", "shifted.png"]);
    assert!((ranked[0].score - 2.0).abs() < 1e-12);
    assert_eq!(ranked[0].matching, vec![(0, 0), (1, 1)]);
    assert!(ranked[1].score < ranked[0].score);
}

#[test]
fn scores_are_bounded_and_matchings_feasible() {
    let (_dir, corpus) = load_fixture_corpus();
    let query = build_query_layout(&boxes(), &script(), 200, 200);
    let records = corpus.query(1, 1).unwrap();
    let params = MatchParams {
        aspect_ratio_threshold: 10.0,
        ..Default::default()
    };
    for scored in rank_references(&query.layout, records, &params) {
        let reference = records[scored.record_index].to_layout();
        let bound = query.layout.elements.len().min(reference.elements.len()) as f64;
        assert!(scored.score >= 0.0 && scored.score <= bound + 1e-12);

        let mut rows = HashSet::new();
        let mut cols = HashSet::new();
        for &(i, j) in &scored.matching {
            assert!(rows.insert(i), "query index {i} matched twice");
            assert!(cols.insert(j), "reference index {j} matched twice");
            assert_eq!(
                query.layout.elements[i].element_type,
                reference.elements[j].element_type
            );
        }
    }
}

#[test]
fn shared_records_survive_repeated_queries() {
    let (_dir, corpus) = load_fixture_corpus();
    let before = corpus.query(1, 1).unwrap().to_vec();
    let query = build_query_layout(&boxes(), &script(), 200, 200);
    let first = similarity(&query.layout, &before[1].to_layout(), &MatchParams::default());
    for _ in 0..3 {
        let _ = find_similar_layouts(
            &corpus,
            &query,
            &CorpusFilter::default(),
            &MatchParams::default(),
        )
        .unwrap();
    }
    assert_eq!(corpus.query(1, 1).unwrap(), before.as_slice());
    let again = similarity(&query.layout, &before[1].to_layout(), &MatchParams::default());
    assert_eq!(first, again);
}

#[test]
fn query_with_unknown_signature_fails() {
    let (_dir, corpus) = load_fixture_corpus();
    let panel: Vec<ScriptElement> = serde_json::from_value(serde_json::json!([
        {"type": "dialogue", "content": "a", "speaker": "x"},
        {"type": "dialogue", "content": "b", "speaker": "y"},
        {"type": "dialogue", "content": "c", "speaker": "z"}
    ]))
    .unwrap();
    let three = vec![
        BBox::new(0, 0, 50, 100),
        BBox::new(60, 0, 110, 100),
        BBox::new(120, 0, 170, 100),
    ];
    let query = build_query_layout(&three, &panel, 200, 200);
    let err = find_similar_layouts(
        &corpus,
        &query,
        &CorpusFilter::default(),
        &MatchParams::default(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "corpus does not contain signature: 3_0");
}

#[test]
fn best_reference_yields_speech_and_narration_bubbles() {
    init_logger();
    let (_dir, corpus) = load_fixture_corpus();
    let panel = script();
    let query = build_query_layout(&boxes(), &panel, 200, 200);
    let ranked = find_similar_layouts(
        &corpus,
        &query,
        &CorpusFilter::default(),
        &MatchParams::default(),
    )
    .unwrap();
    let best = &ranked[0];
    let bubbles = place_bubbles(
        &query,
        &best.record,
        &best.matching,
        &panel,
        &BubbleParams::default(),
    )
    .unwrap();
    assert_eq!(bubbles.len(), 2);
    match &bubbles[0] {
        Bubble::Speech {
            speaker,
            text,
            text_box,
            balloon,
            glyphs,
        } => {
            assert_eq!(speaker, "aki");
            assert_eq!(text, "おはようござ");
            assert_eq!(*text_box, BBox::new(30, 0, 100, 30));
            // tail points at the top centre of the speaking figure
            assert_eq!(balloon.tail[2], [50.0, 40.0]);
            assert_eq!(glyphs.len(), 6);
        }
        other => panic!("expected speech first, got {other:?}"),
    }
    assert_eq!(bubbles[1].text(), "まだ雨");
}

#[test]
fn canonical_size_rescales_surviving_records() {
    let (_dir, corpus) = load_fixture_corpus();
    let filter = CorpusFilter {
        target_text_length: 0,
        canonical_size: Some((200, 200)),
        ..Default::default()
    };
    let kept = filter.apply(corpus.query(1, 1).unwrap());
    assert_eq!(kept.len(), 2);
    for record in &kept {
        assert_eq!((record.width, record.height), (200, 200));
    }
    let exact = kept.iter().find(|r| r.image_path == "exact.png").unwrap();
    assert_eq!(exact.speaker_objects[0].bbox, BBox::new(20, 40, 80, 190));
}
