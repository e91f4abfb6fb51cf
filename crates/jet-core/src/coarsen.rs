//! Coarsening via heavy-edge matching (`SPEC_FULL.md` section 10.2,
//! grounded in `examples/original_source/src/partitioner.hpp`'s `HECv1`
//! coarsening heuristic -- the only heuristic this port implements;
//! `coarsening_alg` values `0` and `2` route to the same implementation,
//! recorded in `DESIGN.md`).

use graph_builder::prelude::*;

use crate::model::Gain;

/// One level of the coarsening sequence (section 6's "coarsening output
/// contract"): the graph at this level, its vertex weights, and the map
/// from this level's vertex ids to the next-coarser level's vertex ids
/// (`None` at the coarsest level).
pub struct Level {
    pub graph: UndirectedCsrGraph<u32, (), Gain>,
    pub vtx_w: Vec<Gain>,
    pub interp: Option<Vec<u32>>,
}

/// Computes the cutoff below which coarsening stops, mirroring
/// `partitioner.hpp`'s `cutoff = max(1024, min(num_parts*8, ...))`.
fn coarsening_cutoff(num_parts: usize) -> usize {
    let cutoff = num_parts * 8;
    if cutoff > 1024 {
        usize::max(1024, num_parts * 2)
    } else {
        cutoff
    }
}

/// One pass of heavy-edge matching: visit vertices in id order, match each
/// unmatched vertex to its unmatched neighbor with the heaviest connecting
/// edge (ties broken by lower id).
fn match_pass(graph: &UndirectedCsrGraph<u32, (), Gain>) -> Vec<u32> {
    let n = graph.node_count() as usize;
    let mut matched = vec![false; n];
    let mut partner: Vec<u32> = (0..n as u32).collect();

    for i in 0..n {
        if matched[i] {
            continue;
        }
        let mut best: Option<u32> = None;
        let mut best_weight = Gain::MIN;
        for target in graph.neighbors_with_values(i as u32) {
            let j = target.target as usize;
            if j == i || matched[j] {
                continue;
            }
            let w = target.value;
            if best.is_none() || w > best_weight || (w == best_weight && target.target < best.unwrap()) {
                best = Some(target.target);
                best_weight = w;
            }
        }

        match best {
            Some(j) => {
                matched[i] = true;
                matched[j as usize] = true;
                partner[i] = j;
                partner[j as usize] = i as u32;
            }
            None => {
                matched[i] = true;
            }
        }
    }

    partner
}

/// Contracts a graph along a matching (`partner[i]` is `i`'s match, or `i`
/// itself if unmatched), summing vertex weights over each coarse vertex and
/// unioning (parallel edges summed) constituent edges, dropping edges
/// internal to a matched pair.
fn contract(
    graph: &UndirectedCsrGraph<u32, (), Gain>,
    vtx_w: &[Gain],
    partner: &[u32],
) -> (UndirectedCsrGraph<u32, (), Gain>, Vec<Gain>, Vec<u32>) {
    let n = graph.node_count() as usize;

    // Assign coarse ids: one per matched pair / unmatched vertex, lowest
    // fine id in each pair determines visitation order.
    let mut coarse_id = vec![u32::MAX; n];
    let mut next_id = 0u32;
    let mut interp = vec![0u32; n];

    for i in 0..n {
        let j = partner[i] as usize;
        let rep = usize::min(i, j);
        if coarse_id[rep] == u32::MAX {
            coarse_id[rep] = next_id;
            next_id += 1;
        }
        coarse_id[i] = coarse_id[rep];
        interp[i] = coarse_id[rep];
    }

    let coarse_n = next_id as usize;
    let mut coarse_vtx_w = vec![0 as Gain; coarse_n];
    for i in 0..n {
        coarse_vtx_w[coarse_id[i] as usize] += vtx_w[i];
    }

    let mut coarse_edges: std::collections::HashMap<(u32, u32), Gain> = std::collections::HashMap::new();
    for i in 0..n {
        let ci = coarse_id[i];
        for target in graph.neighbors_with_values(i as u32) {
            let cj = coarse_id[target.target as usize];
            if ci == cj {
                continue;
            }
            let key = if ci < cj { (ci, cj) } else { (cj, ci) };
            *coarse_edges.entry(key).or_insert(0) += target.value;
        }
    }

    let mut edges: Vec<(u32, u32, Gain)> = Vec::with_capacity(coarse_edges.len());
    for ((a, b), w) in coarse_edges {
        edges.push((a, b, w));
    }

    let coarse_graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
        .csr_layout(CsrLayout::Sorted)
        .edges_with_values(edges)
        .build();

    (coarse_graph, coarse_vtx_w, interp)
}

/// Generates the coarsening sequence, finest graph last, per section 6's
/// "coarsening output contract". Repeats while `n` exceeds
/// `coarsening_cutoff(num_parts)`, or until a pass matches fewer than 10%
/// of vertices.
pub fn coarsen(
    graph: UndirectedCsrGraph<u32, (), Gain>,
    vtx_w: Vec<Gain>,
    num_parts: usize,
) -> Vec<Level> {
    let cutoff = coarsening_cutoff(num_parts);
    let mut levels: Vec<Level> = Vec::new();

    let mut cur_graph = graph;
    let mut cur_vtx_w = vtx_w;

    loop {
        let n = cur_graph.node_count() as usize;
        if n <= cutoff {
            levels.push(Level { graph: cur_graph, vtx_w: cur_vtx_w, interp: None });
            break;
        }

        let partner = match_pass(&cur_graph);
        let matched_count = (0..n).filter(|&i| partner[i] as usize != i).count();
        if matched_count < n / 10 {
            levels.push(Level { graph: cur_graph, vtx_w: cur_vtx_w, interp: None });
            break;
        }

        let (coarse_graph, coarse_vtx_w, interp) = contract(&cur_graph, &cur_vtx_w, &partner);
        if coarse_graph.node_count() as usize == n {
            levels.push(Level { graph: cur_graph, vtx_w: cur_vtx_w, interp: None });
            break;
        }

        levels.push(Level { graph: cur_graph, vtx_w: cur_vtx_w, interp: Some(interp) });

        cur_graph = coarse_graph;
        cur_vtx_w = coarse_vtx_w;
    }

    levels.reverse();
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coarsens_until_cutoff() {
        // path of 20 vertices, well above a k=2 cutoff of 16.
        let edges: Vec<(u32, u32, Gain)> = (0..19u32).map(|i| (i, i + 1, 1)).collect();
        let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
            .csr_layout(CsrLayout::Sorted)
            .edges_with_values(edges)
            .build();
        let vtx_w = vec![1 as Gain; 20];

        let levels = coarsen(graph, vtx_w, 2);
        assert!(levels.len() >= 2);
        assert_eq!(levels.last().unwrap().graph.node_count(), 20);
        assert!(levels[0].interp.is_none());
        for level in &levels[1..] {
            assert!(level.interp.is_some());
        }
    }

    #[test]
    fn vertex_weight_is_conserved() {
        let edges: Vec<(u32, u32, Gain)> = (0..19u32).map(|i| (i, i + 1, 1)).collect();
        let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
            .csr_layout(CsrLayout::Sorted)
            .edges_with_values(edges)
            .build();
        let vtx_w = vec![1 as Gain; 20];

        let levels = coarsen(graph, vtx_w, 2);
        let coarsest_total: Gain = levels[0].vtx_w.iter().sum();
        assert_eq!(coarsest_total, 20);
    }
}
