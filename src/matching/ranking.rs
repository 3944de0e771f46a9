//! Rank corpus records against a query layout.
//!
//! Records are scored independently (in parallel via rayon) and then sorted
//! by score, ties resolved by the record's position so that results do not
//! depend on thread scheduling.

use super::{similarity, MatchParams};
use crate::error::Result;
use crate::layout::{Corpus, CorpusFilter, CorpusRecord, Layout, QueryLayout};
use log::debug;
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredReference {
    /// Index into the slice passed to [`rank_references`].
    pub record_index: usize,
    pub score: f64,
    pub matching: Vec<(usize, usize)>,
}

/// Reference record together with its score against the query.
#[derive(Clone, Debug, Serialize)]
pub struct RankedReference {
    pub record: CorpusRecord,
    pub score: f64,
    pub matching: Vec<(usize, usize)>,
}

/// Score every record against `query`, best first.
pub fn rank_references(
    query: &Layout,
    records: &[CorpusRecord],
    params: &MatchParams,
) -> Vec<ScoredReference> {
    let mut scored: Vec<ScoredReference> = records
        .par_iter()
        .enumerate()
        .map(|(record_index, record)| {
            let sim = similarity(query, &record.to_layout(), params);
            ScoredReference {
                record_index,
                score: sim.score,
                matching: sim.matching,
            }
        })
        .collect();
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.record_index.cmp(&b.record_index))
    });
    scored
}

/// Signature lookup, text/aspect filtering and ranking in one call.
///
/// The filter's targets are taken from the query (monologue length and
/// canvas aspect ratio); its thresholds and canonical size come from
/// `window`. Only a missing signature is an error.
pub fn find_similar_layouts(
    corpus: &Corpus,
    query: &QueryLayout,
    window: &CorpusFilter,
    params: &MatchParams,
) -> Result<Vec<RankedReference>> {
    let records = corpus.query(query.num_speakers, query.num_non_speakers)?;
    let filter = CorpusFilter {
        target_text_length: query.unrelated_text_length,
        target_aspect_ratio: query.layout.aspect_ratio().unwrap_or(1.0),
        ..window.clone()
    };
    let candidates = filter.apply(records);
    let ranked = rank_references(&query.layout, &candidates, params);
    debug!(
        "find_similar_layouts signature={}_{} candidates={} best={:.4}",
        query.num_speakers,
        query.num_non_speakers,
        candidates.len(),
        ranked.first().map(|r| r.score).unwrap_or(0.0)
    );
    let mut candidates: Vec<Option<CorpusRecord>> = candidates.into_iter().map(Some).collect();
    Ok(ranked
        .into_iter()
        .filter_map(|r| {
            candidates[r.record_index].take().map(|record| RankedReference {
                record,
                score: r.score,
                matching: r.matching,
            })
        })
        .collect())
}
