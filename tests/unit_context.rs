// Unit tests for context collection, weighting and pruning.
//
// Exercises the windowed scan against small hand-checked sentences and the
// bag invariants: vocabulary gating, one entry per stem, and pruning to the
// smallest N under a comparator.

use lexmine::context::bag::{prune_item_set, score_item_set};
use lexmine::context::{by_count_desc, by_score_desc, ContextCollector, RawCount, TfIdf};
use lexmine::item::{count_frequencies, ItemSet, Side, Vocabulary};
use lexmine::text::{Normalizer, Tokenizer};

fn collector(left: usize, right: usize) -> ContextCollector {
    ContextCollector::new(Tokenizer::default(), Normalizer::default(), left, right)
}

// ============================================================
// Windowed collection
// ============================================================

#[test]
fn bank_and_river_pick_up_only_allowed_neighbors() {
    let norm = Normalizer::default();
    let mut items = ItemSet::from_surfaces(Side::Source, ["bank", "river"], &norm);
    let vocab = Vocabulary::from_surfaces(["money", "flow", "loan"], &norm);

    collector(2, 2)
        .collect(
            &mut items,
            &vocab,
            "the bank gave a loan near the river's flow".as_bytes(),
        )
        .unwrap();

    let bank = items.get("bank").unwrap().context.as_ref().unwrap();
    assert_eq!(bank.len(), 1);
    assert_eq!(bank.count("loan"), 1);

    let river = items.get("river").unwrap().context.as_ref().unwrap();
    assert_eq!(river.len(), 1);
    assert_eq!(river.count("flow"), 1);

    for item in items.iter() {
        assert!(!item.context.as_ref().unwrap().contains("money"));
    }
}

#[test]
fn neighbors_outside_vocabulary_never_enter() {
    let norm = Normalizer::default();
    let mut items = ItemSet::from_surfaces(Side::Target, ["cat"], &norm);
    let vocab = Vocabulary::from_surfaces(["milk"], &norm);

    collector(3, 3)
        .collect(
            &mut items,
            &vocab,
            "the cat drinks milk\nthe cat chases the dog\ncat food and milk".as_bytes(),
        )
        .unwrap();

    let bag = items.get("cat").unwrap().context.as_ref().unwrap();
    assert_eq!(bag.len(), 1, "only 'milk' is allowed");
    assert_eq!(bag.count("milk"), 2);
}

#[test]
fn repeated_item_in_one_sentence_counts_each_window() {
    let norm = Normalizer::default();
    let mut items = ItemSet::from_surfaces(Side::Source, ["tea"], &norm);
    let vocab = Vocabulary::from_surfaces(["green"], &norm);

    collector(1, 1)
        .collect(&mut items, &vocab, "green tea green tea".as_bytes())
        .unwrap();

    // tea@1 sees green@0 and green@2, tea@3 sees green@2
    let bag = items.get("tea").unwrap().context.as_ref().unwrap();
    assert_eq!(bag.count("green"), 3);
    assert_eq!(bag.len(), 1);
}

#[test]
fn case_is_folded_before_lookup() {
    let norm = Normalizer::default();
    let mut items = ItemSet::from_surfaces(Side::Source, ["Paris"], &norm);
    let vocab = Vocabulary::from_surfaces(["France"], &norm);

    collector(3, 3)
        .collect(&mut items, &vocab, "PARIS is in FRANCE".as_bytes())
        .unwrap();

    let bag = items.get("paris").unwrap().context.as_ref().unwrap();
    assert_eq!(bag.count("france"), 1);
}

#[test]
fn empty_and_blank_lines_produce_nothing() {
    let norm = Normalizer::default();
    let mut items = ItemSet::from_surfaces(Side::Source, ["bank"], &norm);
    let vocab = Vocabulary::from_surfaces(["loan"], &norm);

    let stats = collector(2, 2)
        .collect(&mut items, &vocab, "\n   \n...\n".as_bytes())
        .unwrap();

    assert_eq!(stats.sentences, 0);
    assert_eq!(stats.item_occurrences, 0);
    assert!(items.get("bank").unwrap().context.is_none());
}

// ============================================================
// Weighting and pruning
// ============================================================

fn populated() -> ItemSet {
    let norm = Normalizer::default();
    let mut items = ItemSet::from_surfaces(Side::Source, ["bank", "shore"], &norm);
    let vocab = Vocabulary::from_surfaces(["money", "loan", "water", "sand", "the"], &norm);
    let corpus = "\
        the bank lends money. the bank makes a loan. the bank has money.\n\
        water on the shore. sand on the shore. the shore and water";
    collector(2, 2)
        .collect(&mut items, &vocab, corpus.as_bytes())
        .unwrap();
    items
}

#[test]
fn prune_keeps_min_of_n_and_size() {
    let mut items = populated();
    let sizes: Vec<(String, usize)> = items
        .iter()
        .map(|i| (i.term.stem.clone(), i.context.as_ref().unwrap().len()))
        .collect();

    prune_item_set(&mut items, 2, by_count_desc);
    for (stem, before) in sizes {
        let after = items.get(&stem).unwrap().context.as_ref().unwrap().len();
        assert_eq!(after, before.min(2), "bag of {stem}");
    }

    let bank = items.get("bank").unwrap().context.as_ref().unwrap();
    // 'the' (3) and 'money' (2) outrank 'loan' (1)
    assert!(bank.contains("the"));
    assert!(bank.contains("money"));
    assert!(!bank.contains("loan"));
}

#[test]
fn tfidf_then_prune_by_score_drops_shared_function_word() {
    let mut items = populated();
    let tfidf = TfIdf::from_items(&items);
    score_item_set(&mut items, &tfidf).unwrap();

    let bank = items.get("bank").unwrap().context.as_ref().unwrap();
    assert_eq!(bank.scored_by(), Some("tf-idf"));
    // 'the' appears in both bags, so its idf is zero
    assert_eq!(bank.get("the").unwrap().score, 0.0);

    prune_item_set(&mut items, 1, by_score_desc);
    let bank = items.get("bank").unwrap().context.as_ref().unwrap();
    assert!(bank.contains("money"));
    assert_eq!(bank.len(), 1);
}

#[test]
fn raw_count_scoring_matches_counts() {
    let mut items = populated();
    score_item_set(&mut items, &RawCount).unwrap();
    for item in items.iter() {
        for entry in item.context.as_ref().unwrap().entries() {
            assert_eq!(entry.score, entry.count as f64);
        }
    }
}

// ============================================================
// Phrase items
// ============================================================

#[test]
fn phrase_item_collects_context_and_frequency() {
    let norm = Normalizer::default();
    let mut items = ItemSet::from_surfaces(Side::Target, ["New York"], &norm);
    let vocab = Vocabulary::from_surfaces(["money"], &norm);

    let stats = collector(3, 3)
        .collect(&mut items, &vocab, "new york has money".as_bytes())
        .unwrap();
    assert_eq!(stats.item_occurrences, 1);
    let bag = items.get("new york").unwrap().context.as_ref().unwrap();
    assert_eq!(bag.count("money"), 1);

    count_frequencies(&mut items, "new york new york".as_bytes(), &Tokenizer::default(), &norm)
        .unwrap();
    assert_eq!(items.get("new york").unwrap().frequency, 2);
}
