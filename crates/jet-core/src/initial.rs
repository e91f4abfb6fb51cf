//! Initial partitioning of the coarsest graph (`SPEC_FULL.md` section
//! 10.3): a greedy round-robin bisection-free assignment, grounded in
//! `examples/original_source/src/partitioner.hpp`'s `metis_init` call --
//! this port does not link METIS, so it substitutes a self-contained
//! greedy heuristic recorded as a simplification in `DESIGN.md`.

use graph_builder::prelude::*;

use crate::model::Gain;

/// Greedily assigns each vertex, visited in descending degree order, to the
/// part that maximizes its connectivity gain subject to not exceeding
/// `size_max`; falls back to the least-loaded part when every part is full.
pub fn initial_partition(
    graph: &UndirectedCsrGraph<u32, (), Gain>,
    vtx_w: &[Gain],
    num_parts: usize,
    size_max: Gain,
) -> Vec<i32> {
    let n = graph.node_count() as usize;
    let mut part = vec![-1i32; n];
    let mut part_sizes = vec![0 as Gain; num_parts];

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(graph.degree(i as u32)));

    for i in order {
        let w = vtx_w[i];
        let mut conn_to = vec![0 as Gain; num_parts];
        for target in graph.neighbors_with_values(i as u32) {
            let j = target.target as usize;
            if part[j] >= 0 {
                conn_to[part[j] as usize] += target.value;
            }
        }

        let mut best: Option<usize> = None;
        let mut best_score = Gain::MIN;
        for p in 0..num_parts {
            if part_sizes[p] + w > size_max {
                continue;
            }
            if best.is_none() || conn_to[p] > best_score {
                best = Some(p);
                best_score = conn_to[p];
            }
        }

        let chosen = best.unwrap_or_else(|| {
            (0..num_parts)
                .min_by_key(|&p| part_sizes[p])
                .expect("num_parts > 0")
        });

        part[i] = chosen as i32;
        part_sizes[chosen] += w;
    }

    part
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_vertex_gets_a_part() {
        let edges: Vec<(u32, u32, Gain)> =
            vec![(0, 1, 1), (1, 2, 1), (2, 3, 1), (3, 0, 1), (0, 2, 1)];
        let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
            .csr_layout(CsrLayout::Sorted)
            .edges_with_values(edges)
            .build();
        let vtx_w = vec![1 as Gain; 4];

        let part = initial_partition(&graph, &vtx_w, 2, 3);
        assert!(part.iter().all(|&p| p == 0 || p == 1));
    }

    #[test]
    fn respects_size_max_when_feasible() {
        let edges: Vec<(u32, u32, Gain)> = (0..7u32).map(|i| (i, i + 1, 1)).collect();
        let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
            .csr_layout(CsrLayout::Sorted)
            .edges_with_values(edges)
            .build();
        let vtx_w = vec![1 as Gain; 8];

        let part = initial_partition(&graph, &vtx_w, 2, 5);
        let mut sizes = [0 as Gain; 2];
        for &p in &part {
            sizes[p as usize] += 1;
        }
        assert!(sizes[0] <= 5 && sizes[1] <= 5);
    }
}
