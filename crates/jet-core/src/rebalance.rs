//! `rebalance_weak` and `rebalance_strong` (`SPEC_FULL.md` sections
//! 4.3/4.4): move vertices out of oversized parts to restore the balance
//! constraint.

use graph_builder::{Graph, Idx, UndirectedNeighborsWithValues};

use crate::bucket::{gain_bucket, select_evictions, BucketedCandidate};
use crate::conn::ConnData;
use crate::model::{BalanceTargets, Gain};

/// Fast rebalancing: for each over-budget vertex, assign a destination
/// *before* deciding whether to evict it (section 4.3).
pub fn rebalance_weak<NI, G>(
    graph: &G,
    part: &[i32],
    conn: &ConnData,
    part_sizes: &[Gain],
    vtx_w: &[Gain],
    targets: BalanceTargets,
) -> Vec<(NI, i32)>
where
    NI: Idx,
    G: Graph<NI> + UndirectedNeighborsWithValues<NI, Gain> + Sync,
{
    let n = graph.node_count().index();
    let k = part_sizes.len();
    let size_max = targets.size_max;
    let opt = targets.opt;

    let undersized: Vec<usize> = (0..k).filter(|&p| part_sizes[p] < size_max).collect();
    if undersized.is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for i in 0..n {
        let p = part[i] as usize;
        if part_sizes[p] <= size_max {
            continue;
        }
        let w = vtx_w[i];
        if w <= 0 {
            continue;
        }
        if (w as f64) >= 1.5 * (part_sizes[p] - opt) as f64 {
            continue;
        }

        let p_conn = conn.lookup(i, p);
        let mut best: Option<usize> = None;
        let mut best_conn = Gain::MIN;
        for &q in &undersized {
            if (part_sizes[q] as f64) < 0.99 * size_max as f64 {
                let c = conn.lookup(i, q);
                if best.is_none() || c > best_conn {
                    best = Some(q);
                    best_conn = c;
                }
            }
        }
        let best = best.unwrap_or_else(|| undersized[i % undersized.len()]);
        let save_gain = conn.lookup(i, best) - p_conn;

        candidates.push((
            BucketedCandidate {
                vertex: NI::new(i),
                source_part: p,
                bucket: gain_bucket(save_gain, w),
                weight: w,
            },
            best,
        ));
    }

    let bucketed: Vec<BucketedCandidate<NI>> = candidates.iter().map(|(c, _)| *c).collect();
    let budget: Vec<Gain> = (0..k).map(|p| (part_sizes[p] - size_max).max(0)).collect();
    let selected = select_evictions(&bucketed, k, &budget);

    selected
        .into_iter()
        .map(|idx| (candidates[idx].0.vertex, candidates[idx].1 as i32))
        .collect()
}

/// Balance-preserving rebalancing: select evictions first by an
/// average-neighbor-gain estimate, then assign destinations respecting
/// undersized-part capacity (section 4.4).
pub fn rebalance_strong<NI, G>(
    graph: &G,
    part: &[i32],
    conn: &ConnData,
    part_sizes: &[Gain],
    vtx_w: &[Gain],
    targets: BalanceTargets,
) -> Vec<(NI, i32)>
where
    NI: Idx,
    G: Graph<NI> + UndirectedNeighborsWithValues<NI, Gain> + Sync,
{
    let n = graph.node_count().index();
    let k = part_sizes.len();
    let size_max = targets.size_max;

    let undersized: Vec<usize> = (0..k).filter(|&p| part_sizes[p] < size_max).collect();
    if undersized.is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for i in 0..n {
        let p = part[i] as usize;
        if part_sizes[p] <= size_max {
            continue;
        }
        let w_cap = vtx_w[i].min(part_sizes[p] - size_max);
        if w_cap <= 0 {
            continue;
        }

        let p_conn = conn.lookup(i, p);
        let mut sum_gain: f64 = 0.0;
        let mut count = 0usize;
        for &q in &undersized {
            sum_gain += (conn.lookup(i, q) - p_conn) as f64;
            count += 1;
        }
        if count == 0 {
            continue;
        }
        let gain = (sum_gain / count as f64).round() as Gain;

        candidates.push(BucketedCandidate {
            vertex: NI::new(i),
            source_part: p,
            bucket: gain_bucket(gain, w_cap),
            weight: vtx_w[i],
        });
    }

    let budget: Vec<Gain> = (0..k).map(|p| (part_sizes[p] - size_max).max(0)).collect();
    let selected = select_evictions(&candidates, k, &budget);

    // Destination assignment: spare capacity per undersized part, evicted
    // vertices consume it in selection order (bucket order), falling back
    // to their home part if no destination has remaining capacity.
    let mut spare: Vec<Gain> = (0..k).map(|p| (size_max - part_sizes[p]).max(0)).collect();

    let mut moves = Vec::with_capacity(selected.len());
    for idx in selected {
        let c = candidates[idx];
        let mut assigned = None;
        for &q in &undersized {
            if spare[q] >= c.weight / 2 {
                assigned = Some(q);
                break;
            }
        }
        if let Some(q) = assigned {
            spare[q] -= c.weight;
            moves.push((c.vertex, q as i32));
        }
        // else: stays in its home part, not emitted as a move.
    }

    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_builder::prelude::*;

    #[test]
    fn weak_rebalance_skips_oversized_vertex() {
        // star graph, vtx_w = [3,1,1,1,1,1], k=2, imb_ratio=1.5 (opt=4, size_max=6).
        let graph: UndirectedCsrGraph<usize, (), i64> = GraphBuilder::new()
            .csr_layout(CsrLayout::Sorted)
            .edges_with_values(vec![
                (0usize, 1usize, 1i64),
                (0, 2, 1),
                (0, 3, 1),
                (0, 4, 1),
                (0, 5, 1),
            ])
            .build();

        let part = vec![0, 1, 1, 1, 1, 1];
        let part_sizes = vec![3 as Gain, 5];
        let vtx_w = vec![3 as Gain, 1, 1, 1, 1, 1];

        let mut conn = ConnData::new(graph.node_count(), 2);
        conn.build(&graph, &part);

        let targets = BalanceTargets::new(8, 2, 1.5);
        assert_eq!(targets.opt, 4);
        assert_eq!(targets.size_max, 6);

        // part_sizes[1] = 5 <= size_max = 6, nothing to rebalance.
        let moves = rebalance_weak::<usize, _>(&graph, &part, &conn, &part_sizes, &vtx_w, targets);
        assert!(moves.is_empty());
    }
}
