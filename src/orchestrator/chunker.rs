//! 分块器
//!
//! 把有序序列切成大小不超过上限的连续分块

/// 把 `items` 按顺序切成若干块，每块最多 `max_size` 个元素
///
/// 各块依次拼接后与输入完全一致；空输入返回空列表（不会产生空块）。
/// `max_size` 为 0 时按 1 处理。
pub fn chunk<T: Clone>(items: &[T], max_size: usize) -> Vec<Vec<T>> {
    items
        .chunks(max_size.max(1))
        .map(<[T]>::to_vec)
        .collect()
}

/// 分块数量，等于 `ceil(len / max_size)`
pub fn chunk_count(len: usize, max_size: usize) -> usize {
    len.div_ceil(max_size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let chunks = chunk::<u32>(&[], 25);
        assert!(chunks.is_empty());
        assert_eq!(chunk_count(0, 25), 0);
    }

    #[test]
    fn test_chunk_sizes_and_order() {
        let items: Vec<usize> = (0..53).collect();
        let chunks = chunk(&items, 25);

        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![25, 25, 3]);
        assert_eq!(chunks.concat(), items);
    }

    #[test]
    fn test_chunk_count_matches_for_all_lengths() {
        for max_size in 1..=7 {
            for len in 0..40 {
                let items: Vec<usize> = (0..len).collect();
                let chunks = chunk(&items, max_size);

                assert_eq!(chunks.len(), chunk_count(len, max_size));
                assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= max_size));
                assert_eq!(chunks.concat(), items);
            }
        }
    }

    #[test]
    fn test_zero_max_size_does_not_panic() {
        let chunks = chunk(&[1, 2, 3], 0);
        assert_eq!(chunks, vec![vec![1], vec![2], vec![3]]);
    }
}
