//! Ranking of numeric data.
//!
//! [`average_ranks`] assigns 1-based ranks with ties averaged;
//! [`tie_group_sizes`] reports the size of every tied block, which the rank
//! correlation statistics need for their tie corrections.

/// 1-based ranks of `data`; tied values share the average of their
/// would-be ranks. Empty input produces empty output.
pub fn average_ranks(data: &[f64]) -> Vec<f64> {
    let mut ranks = vec![0.0; data.len()];
    let order = sort_order(data);
    for (start, end) in tie_blocks(data, &order) {
        let value = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = value;
        }
    }
    ranks
}

/// Sizes of the tied blocks in `data` (blocks of one included).
pub fn tie_group_sizes(data: &[f64]) -> Vec<usize> {
    let order = sort_order(data);
    tie_blocks(data, &order)
        .map(|(start, end)| end - start)
        .collect()
}

fn sort_order(data: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..data.len()).collect();
    order.sort_by(|&a, &b| data[a].total_cmp(&data[b]));
    order
}

/// Half-open `[start, end)` ranges over `order` sharing one value.
fn tie_blocks<'a>(data: &'a [f64], order: &'a [usize]) -> impl Iterator<Item = (usize, usize)> + 'a {
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= order.len() {
            return None;
        }
        let mut end = start + 1;
        while end < order.len() && data[order[end]].total_cmp(&data[order[start]]).is_eq() {
            end += 1;
        }
        let block = (start, end);
        start = end;
        Some(block)
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────
