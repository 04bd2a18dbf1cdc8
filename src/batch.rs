//! Batch splitting — partitions an ordered URL list into contiguous,
//! balanced batches.
//!
//! The full player-URL set can be orders of magnitude larger than what a
//! single request will reliably serve, so it is split into batches before
//! fetching. Splitting is a pure, total function: any input (including the
//! empty list) produces a valid batch sequence whose concatenation, in order,
//! reconstructs the input exactly.

use crate::types::PlayerUrl;

/// A contiguous, non-empty slice of player URLs submitted in one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based sequence number within the run
    pub index: usize,
    /// The URLs in this batch, in input order
    pub urls: Vec<PlayerUrl>,
}

impl Batch {
    /// The first URL of the batch — the resume marker if this batch aborts.
    pub fn first_url(&self) -> &PlayerUrl {
        // Batches are never empty (see split_into_batches)
        &self.urls[0]
    }
}

/// Split `urls` into contiguous batches of roughly `batch_size` URLs.
///
/// - An empty input yields no batches.
/// - `N <= batch_size` yields exactly one batch holding the whole list;
///   small inputs are never over-split.
/// - Otherwise the batch count is `round(N / batch_size)` (half rounds up)
///   and sizes differ by at most one, the earlier batches taking the extra
///   element. Balanced sizes across the whole run are preferred over a
///   perfectly fixed batch size.
///
/// `batch_size` must be at least 1; [`crate::Config::validate`] enforces this
/// before a run starts.
pub fn split_into_batches(urls: &[PlayerUrl], batch_size: usize) -> Vec<Batch> {
    debug_assert!(batch_size >= 1, "batch_size must be at least 1");

    let n = urls.len();
    if n == 0 {
        return Vec::new();
    }

    let k = if n <= batch_size {
        1
    } else {
        // round(n / batch_size), half up, in integer arithmetic
        ((2 * n + batch_size) / (2 * batch_size)).max(1)
    };

    let base = n / k;
    let extra = n % k;

    let mut batches = Vec::with_capacity(k);
    let mut offset = 0;
    for index in 0..k {
        let size = if index < extra { base + 1 } else { base };
        batches.push(Batch {
            index,
            urls: urls[offset..offset + size].to_vec(),
        });
        offset += size;
    }

    batches
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn urls(n: usize) -> Vec<PlayerUrl> {
        (1..=n).map(|i| PlayerUrl::new(format!("u{}", i))).collect()
    }

    fn reassemble(batches: &[Batch]) -> Vec<PlayerUrl> {
        batches.iter().flat_map(|b| b.urls.clone()).collect()
    }

    #[test]
    fn test_empty_input_yields_no_batches() {
        assert!(split_into_batches(&[], 50).is_empty());
    }

    #[test]
    fn test_input_at_or_below_batch_size_is_one_batch() {
        for n in [1, 10, 49, 50] {
            let input = urls(n);
            let batches = split_into_batches(&input, 50);
            assert_eq!(batches.len(), 1, "N = {} should not be split", n);
            assert_eq!(batches[0].index, 0);
            assert_eq!(batches[0].urls, input);
        }
    }

    #[test]
    fn test_120_urls_at_size_50_is_two_batches_of_60() {
        let input = urls(120);
        let batches = split_into_batches(&input, 50);

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].urls.len(), 60);
        assert_eq!(batches[1].urls.len(), 60);
        assert_eq!(batches[1].first_url(), &PlayerUrl::new("u61"));
    }

    #[test]
    fn test_half_rounds_up() {
        // 125 / 50 = 2.5 -> 3 batches
        let batches = split_into_batches(&urls(125), 50);
        assert_eq!(batches.len(), 3);
    }

    #[test]
    fn test_just_over_batch_size_stays_one_batch() {
        // round(51 / 50) = 1: one oversized batch beats one tiny remainder
        let batches = split_into_batches(&urls(51), 50);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].urls.len(), 51);
    }

    #[test]
    fn test_concatenation_reconstructs_input_exactly() {
        for n in [0, 1, 50, 51, 74, 76, 120, 125, 999, 1000, 1001] {
            let input = urls(n);
            let batches = split_into_batches(&input, 50);
            assert_eq!(
                reassemble(&batches),
                input,
                "N = {}: batches must concatenate to the input",
                n
            );
        }
    }

    #[test]
    fn test_sizes_differ_by_at_most_one() {
        for n in [51, 74, 120, 125, 999, 1001] {
            let batches = split_into_batches(&urls(n), 50);
            let min = batches.iter().map(|b| b.urls.len()).min().unwrap();
            let max = batches.iter().map(|b| b.urls.len()).max().unwrap();
            assert!(max - min <= 1, "N = {}: sizes {}..{} unbalanced", n, min, max);
            assert!(min >= 1, "N = {}: no batch may be empty", n);
        }
    }

    #[test]
    fn test_indices_are_sequential_from_zero() {
        let batches = split_into_batches(&urls(300), 50);
        for (i, batch) in batches.iter().enumerate() {
            assert_eq!(batch.index, i);
        }
    }

    #[test]
    fn test_batch_size_one_yields_singleton_batches() {
        let batches = split_into_batches(&urls(3), 1);
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.urls.len() == 1));
    }
}
