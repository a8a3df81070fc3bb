//! Integration tests for the quorum-merge of exemplar responses.

mod common;

use common::{exemplar, response, series, NOW_MS};
use quiver::model::proto::{ExemplarQueryResponse, Label};
use quiver::query::merge::merge_exemplar_responses;

// ============================================================================
// Fixtures
// ============================================================================

fn labels1() -> Vec<Label> {
    vec![Label::new("label1", "foo1")]
}

fn labels2() -> Vec<Label> {
    vec![Label::new("label1", "foo2")]
}

fn merge_both_ways(
    a: ExemplarQueryResponse,
    b: ExemplarQueryResponse,
) -> (ExemplarQueryResponse, ExemplarQueryResponse) {
    let forward = merge_exemplar_responses(vec![a.clone(), b.clone()]);
    let reverse = merge_exemplar_responses(vec![b, a]);
    (forward, reverse)
}

// ============================================================================
// Overlapping replica answers
// ============================================================================

#[test]
fn empty_exemplar_sets_merge_to_empty() {
    let a = response(vec![series(labels1(), vec![])]);
    let b = response(vec![series(labels1(), vec![])]);

    let expected = response(vec![series(labels1(), vec![])]);
    let (forward, reverse) = merge_both_ways(a, b);
    assert_eq!(forward, expected);
    assert_eq!(reverse, expected);
}

#[test]
fn exemplars_only_on_one_replica_survive() {
    let e1 = exemplar("trace-1", NOW_MS, 1.0);
    let a = response(vec![series(labels1(), vec![e1.clone()])]);
    let b = response(vec![series(labels1(), vec![])]);

    let expected = response(vec![series(labels1(), vec![e1])]);
    let (forward, reverse) = merge_both_ways(a, b);
    assert_eq!(forward, expected);
    assert_eq!(reverse, expected);
}

#[test]
fn identical_replicas_merge_to_one_copy() {
    let e1 = exemplar("trace-1", NOW_MS, 1.0);
    let a = response(vec![series(labels1(), vec![e1.clone()])]);

    let expected = response(vec![series(labels1(), vec![e1])]);
    let (forward, reverse) = merge_both_ways(a.clone(), a.clone());
    assert_eq!(forward, expected);
    assert_eq!(reverse, expected);

    // A single input passes through unchanged.
    assert_eq!(merge_exemplar_responses(vec![a]), expected);
}

#[test]
fn partially_overlapping_exemplars_union_sorted() {
    let e1 = exemplar("trace-1", NOW_MS, 1.0);
    let e2 = exemplar("trace-2", NOW_MS + 1, 2.0);
    let e3 = exemplar("trace-3", NOW_MS + 4, 3.0);
    let e4 = exemplar("trace-4", NOW_MS + 8, 7.0);

    let a = response(vec![series(
        labels1(),
        vec![e1.clone(), e2.clone(), e3.clone()],
    )]);
    let b = response(vec![series(
        labels1(),
        vec![e1.clone(), e3.clone(), e4.clone()],
    )]);

    let expected = response(vec![series(labels1(), vec![e1, e2, e3, e4])]);
    let (forward, reverse) = merge_both_ways(a, b);
    assert_eq!(forward, expected);
    assert_eq!(reverse, expected);
}

#[test]
fn duplicate_timestamp_first_input_wins() {
    let e1 = exemplar("trace-1", NOW_MS, 1.0);
    let e2 = exemplar("trace-2", NOW_MS + 1, 2.0);
    let e3 = exemplar("trace-3", NOW_MS + 4, 3.0);
    let e4 = exemplar("trace-4", NOW_MS + 8, 7.0);
    // Same timestamp as e1, different payload.
    let e5 = exemplar("trace-4", NOW_MS, 7.0);

    let a = response(vec![series(
        labels1(),
        vec![e1.clone(), e2.clone(), e3.clone()],
    )]);
    let b = response(vec![series(
        labels1(),
        vec![e5.clone(), e3.clone(), e4.clone()],
    )]);

    let forward = merge_exemplar_responses(vec![a.clone(), b.clone()]);
    assert_eq!(
        forward,
        response(vec![series(
            labels1(),
            vec![e1.clone(), e2.clone(), e3.clone(), e4.clone()]
        )])
    );

    // Swapping input order swaps which exemplar holds the contested
    // timestamp: the merge is deliberately not commutative here.
    let reverse = merge_exemplar_responses(vec![b, a]);
    assert_eq!(
        reverse,
        response(vec![series(labels1(), vec![e5, e2, e3, e4])])
    );
    assert_ne!(forward, reverse);
}

// ============================================================================
// Multiple series
// ============================================================================

#[test]
fn disjoint_series_both_survive() {
    let e1 = exemplar("trace-1", NOW_MS, 1.0);
    let e2 = exemplar("trace-2", NOW_MS + 1, 2.0);

    let a = response(vec![series(labels1(), vec![e1.clone()])]);
    let b = response(vec![series(labels2(), vec![e2.clone()])]);

    let forward = merge_exemplar_responses(vec![a.clone(), b.clone()]);
    assert_eq!(
        forward,
        response(vec![
            series(labels1(), vec![e1.clone()]),
            series(labels2(), vec![e2.clone()]),
        ])
    );

    // Series take their output position from first occurrence, so the
    // reversed input yields the reversed series order with identical
    // per-series content.
    let reverse = merge_exemplar_responses(vec![b, a]);
    assert_eq!(
        reverse,
        response(vec![series(labels2(), vec![e2]), series(labels1(), vec![e1])])
    );
}

#[test]
fn series_present_on_one_replica_extends_the_other() {
    let e1 = exemplar("trace-1", NOW_MS, 1.0);
    let e2 = exemplar("trace-2", NOW_MS + 1, 2.0);
    let e4 = exemplar("trace-4", NOW_MS + 8, 7.0);

    let a = response(vec![
        series(labels1(), vec![e1.clone()]),
        series(labels2(), vec![e2.clone()]),
    ]);
    let b = response(vec![series(labels2(), vec![e4.clone()])]);

    let expected = response(vec![
        series(labels1(), vec![e1]),
        series(labels2(), vec![e2, e4]),
    ]);
    let forward = merge_exemplar_responses(vec![a, b]);
    assert_eq!(forward, expected);
}

// ============================================================================
// Structural properties
// ============================================================================

#[test]
fn merge_is_idempotent() {
    let a = response(vec![series(
        labels1(),
        vec![
            exemplar("trace-1", NOW_MS, 1.0),
            exemplar("trace-2", NOW_MS + 1, 2.0),
        ],
    )]);

    let once = merge_exemplar_responses(vec![a.clone()]);
    let twice = merge_exemplar_responses(vec![once.clone(), a]);
    assert_eq!(once, twice);
}

#[test]
fn three_way_merge_unions_all_replicas() {
    let e1 = exemplar("trace-1", NOW_MS, 1.0);
    let e2 = exemplar("trace-2", NOW_MS + 1, 2.0);
    let e3 = exemplar("trace-3", NOW_MS + 4, 3.0);

    let merged = merge_exemplar_responses(vec![
        response(vec![series(labels1(), vec![e2.clone()])]),
        response(vec![series(labels1(), vec![e3.clone()])]),
        response(vec![series(labels1(), vec![e1.clone()])]),
    ]);
    assert_eq!(merged, response(vec![series(labels1(), vec![e1, e2, e3])]));
}

#[test]
fn label_permutations_collapse_into_one_series() {
    let forward_labels = vec![Label::new("job", "api"), Label::new("zone", "eu")];
    let reversed_labels = vec![Label::new("zone", "eu"), Label::new("job", "api")];

    let merged = merge_exemplar_responses(vec![
        response(vec![series(
            forward_labels.clone(),
            vec![exemplar("trace-1", NOW_MS, 1.0)],
        )]),
        response(vec![series(
            reversed_labels,
            vec![exemplar("trace-2", NOW_MS + 1, 2.0)],
        )]),
    ]);

    assert_eq!(merged.timeseries.len(), 1);
    // The surviving label set is the first occurrence's, verbatim.
    assert_eq!(merged.timeseries[0].labels, forward_labels);
    assert_eq!(merged.timeseries[0].exemplars.len(), 2);
}
