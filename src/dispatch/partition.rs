//! Shard partitioning
//!
//! Splits the input into contiguous, near-equal shards, one per worker. The
//! last shard absorbs the remainder so no record is dropped.

/// Number of shards used for `len` records across `worker_count` workers
///
/// Never more shards than records, so no shard is empty. A worker count of
/// zero is treated as one.
pub fn effective_count(len: usize, worker_count: usize) -> usize {
    worker_count.max(1).min(len)
}

/// Majority required out of `count` shards
pub fn required_quorum(count: usize) -> usize {
    count / 2 + 1
}

/// Split `records` into `effective_count(records.len(), worker_count)` shards
///
/// Every shard but the last holds `len / count` records; the last one also
/// takes the `len % count` leftovers. Concatenating the shards in order gives
/// back the input.
pub fn partition<R>(mut records: Vec<R>, worker_count: usize) -> Vec<Vec<R>> {
    let count = effective_count(records.len(), worker_count);
    if count == 0 {
        return Vec::new();
    }

    let len = records.len();
    let chunk = (len - len % count) / count;

    // Peel shards off the back so each split_off moves only its own records
    let mut shards = Vec::with_capacity(count);
    for i in (1..count).rev() {
        shards.push(records.split_off(i * chunk));
    }
    shards.push(records);
    shards.reverse();

    shards
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(s: &str) -> Vec<String> {
        s.chars().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_effective_count() {
        assert_eq!(effective_count(0, 5), 0);
        assert_eq!(effective_count(3, 5), 3);
        assert_eq!(effective_count(10, 5), 5);
        assert_eq!(effective_count(10, 0), 1);
    }

    #[test]
    fn test_required_quorum() {
        assert_eq!(required_quorum(1), 1);
        assert_eq!(required_quorum(2), 2);
        assert_eq!(required_quorum(3), 2);
        assert_eq!(required_quorum(4), 3);
        assert_eq!(required_quorum(5), 3);
        assert_eq!(required_quorum(20), 11);
    }

    #[test]
    fn test_partition_even() {
        let shards = partition(letters("abcd"), 2);
        assert_eq!(shards, vec![letters("ab"), letters("cd")]);
    }

    #[test]
    fn test_partition_remainder_goes_last() {
        let shards = partition((0..11).collect::<Vec<u32>>(), 3);
        assert_eq!(shards, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8, 9, 10]]);
    }

    #[test]
    fn test_partition_fewer_records_than_workers() {
        let shards = partition(letters("xyz"), 5);
        assert_eq!(shards.len(), 3);
        assert!(shards.iter().all(|s| s.len() == 1));
    }

    #[test]
    fn test_partition_empty() {
        let shards: Vec<Vec<u8>> = partition(Vec::new(), 4);
        assert!(shards.is_empty());
    }

    #[test]
    fn test_partition_reconstructs_input() {
        for len in 0..40usize {
            for workers in 1..=7usize {
                let input: Vec<usize> = (0..len).collect();
                let shards = partition(input.clone(), workers);

                assert_eq!(shards.len(), effective_count(len, workers));
                assert!(shards.iter().all(|s| !s.is_empty()));
                assert_eq!(shards.concat(), input, "len={} workers={}", len, workers);
                assert_eq!(partition(input, workers), shards);
            }
        }
    }
}
