//! Quorum-read reconciliation of per-replica responses.
//!
//! Each replica may hold a disjoint or overlapping subset of the exemplars
//! for a series (replication skew, partial write failures), so the merge
//! is a deterministic, order-sensitive union: nothing that appeared on any
//! replica is dropped, and ties are broken by input order.
//!
//! Ordering rules:
//! - Inputs are processed strictly in the given order, which the
//!   dispatcher fixes to replica-list order (never arrival order).
//! - A series takes its output position from its first occurrence.
//! - At most one exemplar survives per distinct timestamp within a
//!   series; the first occurrence wins. The merge is therefore not
//!   commutative when two inputs disagree on the payload at an identical
//!   timestamp, and that asymmetry is deliberate.
//!
//! Merging never fails on well-formed input and does not validate series
//! semantics; an empty label set or an empty series passes through.

use crate::model::labels::{fingerprint, format_labels};
use crate::model::proto::{Exemplar, ExemplarQueryResponse, Label, TimeSeries};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

/// Accumulates one output series during the merge.
struct SeriesAccumulator {
    labels: Vec<Label>,
    exemplars_by_timestamp: BTreeMap<i64, Exemplar>,
}

/// Merge per-replica responses into one deduplicated response.
///
/// `responses` must be ordered by replica-list position; the output is
/// then independent of network arrival timing.
pub fn merge_exemplar_responses(responses: Vec<ExemplarQueryResponse>) -> ExemplarQueryResponse {
    let mut order: Vec<u64> = Vec::new();
    let mut accumulators: HashMap<u64, SeriesAccumulator> = HashMap::new();

    for response in responses {
        for series in response.timeseries {
            let key = fingerprint(&series.labels);
            let accumulator = accumulators.entry(key).or_insert_with(|| {
                order.push(key);
                SeriesAccumulator {
                    labels: series.labels.clone(),
                    exemplars_by_timestamp: BTreeMap::new(),
                }
            });

            for exemplar in series.exemplars {
                // First occurrence wins: later inputs never overwrite an
                // exemplar already recorded at this timestamp.
                match accumulator.exemplars_by_timestamp.entry(exemplar.timestamp_ms) {
                    Entry::Vacant(slot) => {
                        slot.insert(exemplar);
                    }
                    Entry::Occupied(_) => {
                        tracing::trace!(
                            series = %format_labels(&accumulator.labels),
                            timestamp_ms = exemplar.timestamp_ms,
                            "discarding duplicate exemplar"
                        );
                    }
                }
            }
        }
    }

    let timeseries = order
        .into_iter()
        .filter_map(|key| accumulators.remove(&key))
        .map(|accumulator| TimeSeries {
            labels: accumulator.labels,
            // BTreeMap iteration yields ascending timestamps.
            exemplars: accumulator.exemplars_by_timestamp.into_values().collect(),
        })
        .collect();

    ExemplarQueryResponse { timeseries }
}
