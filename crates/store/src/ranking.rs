//! Scoring and top-k selection shared by every backend.

use std::cmp::Ordering;

use document::{Document, SearchRequest};

use crate::descriptor::SimilarityMetric;

/// Chunk size for auto-vectorization friendly loops.
const SIMD_CHUNK_SIZE: usize = 32;

/// Cosine similarity; `0.0` for empty, zero, or length-mismatched vectors.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0f32;
    let mut norm_a = 0f32;
    let mut norm_b = 0f32;

    let mut a_chunks = a.chunks_exact(SIMD_CHUNK_SIZE);
    let mut b_chunks = b.chunks_exact(SIMD_CHUNK_SIZE);
    for (ca, cb) in a_chunks.by_ref().zip(b_chunks.by_ref()) {
        let (d, na, nb) = accumulate_chunk(ca, cb);
        dot += d;
        norm_a += na;
        norm_b += nb;
    }
    let (d, na, nb) = accumulate_chunk(a_chunks.remainder(), b_chunks.remainder());
    dot += d;
    norm_a += na;
    norm_b += nb;

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Plain dot product; `0.0` for length-mismatched vectors.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.chunks(SIMD_CHUNK_SIZE)
        .zip(b.chunks(SIMD_CHUNK_SIZE))
        .map(|(ca, cb)| accumulate_chunk(ca, cb).0)
        .sum()
}

#[inline(always)]
fn accumulate_chunk(a: &[f32], b: &[f32]) -> (f32, f32, f32) {
    let mut dot = 0f32;
    let mut na = 0f32;
    let mut nb = 0f32;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    (dot, na, nb)
}

impl SimilarityMetric {
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            SimilarityMetric::Cosine => cosine_similarity(a, b),
            SimilarityMetric::DotProduct => dot_product(a, b),
        }
    }
}

/// Select the hits for `request` among `candidates`.
///
/// Candidates without an embedding, with a different vector length than the
/// query, or rejected by the request's filter are skipped. Hits are ordered
/// by descending score (ties by id), all clear the threshold, and at most
/// `top_k` are returned. Each hit carries its score and no embedding.
pub fn rank<'a, I>(
    candidates: I,
    query: &[f32],
    request: &SearchRequest,
    metric: SimilarityMetric,
) -> Vec<Document>
where
    I: IntoIterator<Item = &'a Document>,
{
    let filter = request.filter();
    let mut scored: Vec<(f32, &Document)> = candidates
        .into_iter()
        .filter(|doc| filter.is_none_or(|f| f.matches(doc.metadata())))
        .filter_map(|doc| {
            let embedding = doc.embedding()?;
            if embedding.len() != query.len() {
                return None;
            }
            let score = metric.score(embedding, query);
            (score.is_finite() && request.accepts(score)).then_some((score, doc))
        })
        .collect();

    scored.sort_by(|(sa, da), (sb, db)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| da.id().cmp(db.id()))
    });
    scored.truncate(request.top_k());

    scored
        .into_iter()
        .map(|(score, doc)| doc.clone().into_hit(score))
        .collect()
}
