//! Approximate keyword scoring
//!
//! Optional layer behind the keyword table: tolerates typos ("suplier",
//! "stcok") by scoring the query against a small keyword → field map.
//! Scores are 0-100; a match needs at least the configured threshold (60).

/// Default minimum score for a fuzzy match (out of 100)
pub const MATCH_THRESHOLD: u32 = 60;

/// Similarity between a query and a candidate keyword, 0-100
pub trait Scorer: Send + Sync {
    fn score(&self, query: &str, candidate: &str) -> u32;
}

/// Best-window similarity: the shorter string is slid across the longer one
/// and each window is scored by longest-common-subsequence ratio.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatioScorer;

impl Scorer for PartialRatioScorer {
    fn score(&self, query: &str, candidate: &str) -> u32 {
        let a: Vec<char> = query.to_lowercase().chars().collect();
        let b: Vec<char> = candidate.to_lowercase().chars().collect();
        if a.is_empty() || b.is_empty() {
            return 0;
        }

        let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
        let window = short.len();

        let mut best = 0;
        for start in 0..=(long.len() - window) {
            let score = lcs_ratio(short, &long[start..start + window]);
            if score > best {
                best = score;
                if best == 100 {
                    break;
                }
            }
        }
        best
    }
}

fn lcs_ratio(a: &[char], b: &[char]) -> u32 {
    let total = a.len() + b.len();
    if total == 0 {
        return 0;
    }
    let common = lcs_len(a, b);
    ((200 * common) as f64 / total as f64).round() as u32
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Outcome of a fuzzy lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch<T> {
    pub value: T,
    pub keyword: &'static str,
    pub score: u32,
}

/// Highest-scoring candidate at or above `threshold`; earlier entries win ties
pub fn best_field_match<T: Copy>(
    scorer: &dyn Scorer,
    query: &str,
    candidates: &[(&'static str, T)],
    threshold: u32,
) -> Option<FuzzyMatch<T>> {
    let mut best: Option<FuzzyMatch<T>> = None;
    for (keyword, value) in candidates {
        let score = scorer.score(query, keyword);
        if score < threshold {
            continue;
        }
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(FuzzyMatch {
                value: *value,
                keyword: *keyword,
                score,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_contained() {
        let scorer = PartialRatioScorer;
        assert_eq!(scorer.score("supplier", "supplier"), 100);
        assert_eq!(scorer.score("siapa supplier nya", "supplier"), 100);
    }

    #[test]
    fn test_typo_scores_above_threshold() {
        let scorer = PartialRatioScorer;
        assert!(scorer.score("suplier", "supplier") >= MATCH_THRESHOLD);
        assert!(scorer.score("alamta", "alamat") >= MATCH_THRESHOLD);
    }

    #[test]
    fn test_unrelated_scores_low() {
        let scorer = PartialRatioScorer;
        assert!(scorer.score("xyzq", "supplier") < MATCH_THRESHOLD);
        assert_eq!(scorer.score("", "supplier"), 0);
    }

    #[test]
    fn test_best_field_match_prefers_highest() {
        let candidates = [("supplier", 1u8), ("alamat", 2u8)];
        let found = best_field_match(&PartialRatioScorer, "suplier", &candidates, MATCH_THRESHOLD);
        assert_eq!(found.map(|m| m.value), Some(1));

        let best = best_field_match(&PartialRatioScorer, "qqqq", &candidates, MATCH_THRESHOLD);
        assert!(best.is_none());
    }
}
