//! Reciprocal Rank Fusion.
//!
//! Chunks are identified by their normalized text, not by id: the same passage
//! arriving from both strategies collapses into one entry even when the two
//! indexes hold distinct chunk objects. The first-encountered instance (and its
//! metadata) is the one kept.

use std::collections::HashMap;
use std::sync::Arc;

use lorekeep_core::types::Chunk;

pub const DEFAULT_RRF_K: usize = 60;

#[derive(Debug, Clone)]
pub struct FusedChunk {
    pub chunk: Arc<Chunk>,
    pub score: f64,
}

/// Fuse best-first lists: each entry at zero-based rank `r` adds `1 / (r + k)`.
///
/// Output is sorted by descending score; exact ties keep first-encountered
/// order. Nothing is truncated. `k` below 1 is treated as 1.
pub fn reciprocal_rank_fusion(lists: &[Vec<Arc<Chunk>>], k: usize) -> Vec<FusedChunk> {
    let k = k.max(1) as f64;
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut fused: Vec<FusedChunk> = Vec::new();

    for list in lists {
        for (rank, chunk) in list.iter().enumerate() {
            let contribution = 1.0 / (rank as f64 + k);
            let key = normalize_text(&chunk.text);
            match slots.get(&key) {
                Some(&slot) => fused[slot].score += contribution,
                None => {
                    slots.insert(key, fused.len());
                    fused.push(FusedChunk { chunk: chunk.clone(), score: contribution });
                }
            }
        }
    }

    // stable: equal scores stay in insertion order
    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace() {
        assert_eq!(normalize_text("  a \n\t b  c "), "a b c");
        assert_eq!(normalize_text(""), "");
    }
}
