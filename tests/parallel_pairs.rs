// Parallel pair scoring tests.
//
// The same pair set is scored with one worker and with eight; feature records
// must come out identical. Also covers constructor guards, empty input, and
// pairs that reference unknown items.

use lexmine::item::{ItemSet, Side, Term, Vocabulary};
use lexmine::pairs::{CancellationToken, CandidatePair, PairScorer, ScoredPair};
use lexmine::scoring::{ContextScorer, EditDistanceScorer, Scorer};
use lexmine::Error;

const NEIGHBORS: [&str; 6] = ["alpha", "beta", "gamma", "delta", "eps", "zeta"];

fn item_set(side: Side, prefix: &str, n: usize) -> ItemSet {
    let vocab = {
        let mut v = Vocabulary::new();
        for w in NEIGHBORS {
            v.insert_stem(w);
        }
        v
    };
    let mut items = ItemSet::new(side);
    for i in 0..n {
        let stem = format!("{prefix}{i}");
        items.insert(Term::new(stem.as_str(), stem.as_str()));
        let bag = items.get_mut(&stem).unwrap().context_mut();
        // deterministic but uneven neighborhoods
        for (k, w) in NEIGHBORS.iter().enumerate() {
            for _ in 0..((i * 7 + k * 3) % 5) {
                bag.add_context_term(w, w, &vocab);
            }
        }
    }
    items
}

fn scorers() -> Vec<Box<dyn Scorer>> {
    vec![
        Box::new(ContextScorer::monolingual()),
        Box::new(EditDistanceScorer::new()),
    ]
}

fn all_pairs(n_src: usize, n_tgt: usize) -> Vec<ScoredPair> {
    let mut pairs = Vec::with_capacity(n_src * n_tgt);
    for s in 0..n_src {
        for t in 0..n_tgt {
            pairs.push(CandidatePair::new(format!("src{s}"), format!("tgt{t}")));
        }
    }
    ScoredPair::from_pairs(pairs)
}

#[test]
fn worker_count_does_not_change_results() {
    let mut source = item_set(Side::Source, "src", 30);
    let mut target = item_set(Side::Target, "tgt", 30);

    let single = PairScorer::new(1, scorers()).unwrap();
    let many = PairScorer::new(8, scorers()).unwrap().with_chunk_size(17);
    single.prepare(&mut source).unwrap();
    single.prepare(&mut target).unwrap();

    let mut a = all_pairs(30, 30);
    let mut b = a.clone();

    let sa = single.estimate(&source, &target, &mut a);
    let sb = many.estimate(&source, &target, &mut b);

    assert_eq!(sa.processed, 900);
    assert_eq!(sb.processed, 900);
    assert_eq!(sa.failed, 0);
    assert_eq!(sb.failed, 0);
    assert_eq!(a, b);
    for scored in &a {
        assert_eq!(scored.features.len(), 2);
        let context = scored.features.get("context").unwrap();
        assert!((0.0..=1.0).contains(&context));
    }
}

#[test]
fn empty_pair_set_returns_cleanly() {
    let source = item_set(Side::Source, "src", 2);
    let target = item_set(Side::Target, "tgt", 2);
    let scorer = PairScorer::new(4, scorers()).unwrap();
    let mut pairs: Vec<ScoredPair> = Vec::new();
    let summary = scorer.estimate(&source, &target, &mut pairs);
    assert_eq!(summary.total, 0);
    assert_eq!(summary.processed, 0);
    assert!(!summary.cancelled);
}

#[test]
fn constructor_guards() {
    assert!(matches!(
        PairScorer::new(0, scorers()),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        PairScorer::new(2, Vec::new()),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn unknown_items_are_counted_as_failures() {
    let source = item_set(Side::Source, "src", 3);
    let target = item_set(Side::Target, "tgt", 3);
    let scorer = PairScorer::new(2, scorers()).unwrap().with_chunk_size(1);

    let mut pairs = ScoredPair::from_pairs([
        CandidatePair::new("src0", "tgt0"),
        CandidatePair::new("nope", "tgt1"),
        CandidatePair::new("src2", "missing"),
        CandidatePair::new("src1", "tgt2"),
    ]);
    let summary = scorer.estimate(&source, &target, &mut pairs);

    assert_eq!(summary.processed, 4);
    assert_eq!(summary.failed, 2);
    assert_eq!(pairs[0].features.len(), 2);
    assert!(pairs[1].features.is_empty());
    assert!(pairs[2].features.is_empty());
    assert_eq!(pairs[3].features.len(), 2);
}

#[test]
fn failing_scorer_keeps_other_features() {
    let source = item_set(Side::Source, "src", 1);
    let mut target = ItemSet::new(Side::Target);
    // no context bag: the context scorer fails, edit distance still runs
    target.insert(Term::new("tgt0", "tgt0"));

    let scorer = PairScorer::new(1, scorers()).unwrap();
    let mut pairs = ScoredPair::from_pairs([CandidatePair::new("src0", "tgt0")]);
    let summary = scorer.estimate(&source, &target, &mut pairs);

    assert_eq!(summary.failed, 1);
    assert!(pairs[0].features.get("context").is_none());
    assert!(pairs[0].features.get("edit").is_some());
}

#[test]
fn cancelled_run_leaves_records_untouched() {
    let source = item_set(Side::Source, "src", 5);
    let target = item_set(Side::Target, "tgt", 5);
    let token = CancellationToken::new();
    token.cancel();
    let scorer = PairScorer::new(3, scorers())
        .unwrap()
        .with_cancellation(token);

    let mut pairs = all_pairs(5, 5);
    let summary = scorer.estimate(&source, &target, &mut pairs);
    assert!(summary.cancelled);
    assert_eq!(summary.processed, 0);
    assert!(pairs.iter().all(|p| p.features.is_empty()));
}

#[test]
fn directions_follow_registration_order() {
    let scorer = PairScorer::new(1, scorers()).unwrap();
    assert_eq!(scorer.directions(), vec![("context", false), ("edit", true)]);
}
