//! `jet_lp`, the label-propagation improver (`SPEC_FULL.md` section 4.2).

use graph_builder::{Graph, Idx, UndirectedNeighborsWithValues};
use rayon::prelude::*;

use crate::conn::ConnData;
use crate::model::{Gain, NO_MOVE, NULL_PART};

/// Result of one `jet_lp` pass: the list of committed moves as
/// `(vertex, old_part, new_part)`, and the pre-move gain contribution
/// (`cut_change1` in `perform_moves`, section 4.6).
pub struct LpResult<NI> {
    pub moves: Vec<(NI, i32, i32)>,
    pub cut_change1: Gain,
}

/// Runs one label-propagation phase: phase A (tentative destination per
/// vertex), phase B (compress to candidates), phase C (afterburner
/// reconciliation), against the current `part`/`conn` state.
pub fn jet_lp<NI, G>(graph: &G, part: &[i32], conn: &mut ConnData, filter_ratio: f64) -> LpResult<NI>
where
    NI: Idx,
    G: Graph<NI> + UndirectedNeighborsWithValues<NI, Gain> + Sync,
{
    let n = graph.node_count().index();
    let k = conn.num_parts;

    // Phase A: tentative destination + pregain per vertex.
    let mut dest = vec![NULL_PART; n];
    let mut pregain = vec![Gain::MIN; n];

    for i in 0..n {
        let cached = conn.dest_cache[i];
        if cached != NULL_PART {
            dest[i] = cached;
            if cached != NO_MOVE {
                let p = part[i] as usize;
                let p_conn = conn.lookup(i, p);
                let b_conn = conn.lookup(i, cached as usize);
                pregain[i] = b_conn - p_conn;
            }
            continue;
        }

        let p = part[i];
        let p_conn = conn.lookup(i, p as usize);

        let mut best_part: Option<usize> = None;
        let mut b_conn: Gain = 0;
        for q in 0..k {
            if q == p as usize {
                continue;
            }
            let c = conn.lookup(i, q);
            if best_part.is_none() || c > b_conn {
                best_part = Some(q);
                b_conn = c;
            }
        }

        let accept = match best_part {
            Some(_) => {
                b_conn >= p_conn || (p_conn - b_conn) < (filter_ratio * p_conn as f64).floor() as Gain
            }
            None => false,
        };

        if accept {
            let best = best_part.unwrap();
            dest[i] = best as i32;
            pregain[i] = b_conn - p_conn;
            conn.dest_cache[i] = best as i32;
        } else {
            dest[i] = NO_MOVE;
            conn.dest_cache[i] = NO_MOVE;
        }
    }

    // Phase B: compress to dense candidate list.
    let candidates: Vec<usize> = (0..n)
        .filter(|&i| dest[i] != NO_MOVE && !conn.lock_bit[i])
        .collect();

    // Phase C: afterburner -- estimate gain assuming higher-priority
    // neighbors have already moved, and lock in vertices whose adjusted
    // gain remains non-negative.
    let locked: Vec<usize> = candidates
        .par_iter()
        .copied()
        .filter(|&i| {
            let g_i = pregain[i];
            let p = part[i];
            let best = dest[i];
            let mut delta: Gain = 0;

            for target in graph.neighbors_with_values(NI::new(i)) {
                let v = target.target.index();
                let w = target.value;
                let higher_priority = pregain[v] > g_i || (pregain[v] == g_i && v < i);
                if !higher_priority || dest[v] == NO_MOVE {
                    continue;
                }
                let v_old = part[v];
                let v_new = dest[v];

                if v_old == p {
                    delta += w;
                }
                if v_new == best {
                    delta += w;
                }
                if v_new == p {
                    delta -= w;
                }
                if v_old == best {
                    delta -= w;
                }
            }

            g_i + delta >= 0
        })
        .collect();

    let mut moves = Vec::with_capacity(locked.len());
    let mut cut_change1: Gain = 0;
    for i in locked {
        conn.lock_bit[i] = false;
        let old_p = part[i];
        let new_p = dest[i];
        cut_change1 += pregain[i];
        moves.push((NI::new(i), old_p, new_p));
    }

    LpResult { moves, cut_change1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_builder::prelude::*;

    #[test]
    fn no_beneficial_move_produces_zero_moves() {
        // two disjoint, already-optimal edges: moving either endpoint only loses connectivity.
        let graph: UndirectedCsrGraph<usize, (), i64> = GraphBuilder::new()
            .csr_layout(CsrLayout::Sorted)
            .edges_with_values(vec![(0usize, 1usize, 1i64), (2, 3, 1)])
            .build();

        let part = vec![0, 0, 1, 1];
        let mut conn = ConnData::new(graph.node_count(), 2);
        conn.build(&graph, &part);

        let result = jet_lp::<usize, _>(&graph, &part, &mut conn, 0.25);
        assert!(result.moves.is_empty());
    }
}
