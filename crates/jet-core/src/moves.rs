//! `perform_moves` (`SPEC_FULL.md` section 4.6): commits a batch of moves,
//! updating part sizes, the partition array, and the connectivity table,
//! and derives the resulting change in cut from before/after connectivity
//! differencing.

use graph_builder::{Graph, Idx, UndirectedNeighborsWithValues};

use crate::conn::ConnData;
use crate::model::Gain;

/// Commits `moves` (`(vertex, new_part)`) against `part`/`part_sizes`/
/// `conn`, returning the resulting change in `cut` (negative = cut
/// decreased) and the new maximum part size.
pub fn perform_moves<NI, G>(
    graph: &G,
    part: &mut [i32],
    part_sizes: &mut [Gain],
    vtx_w: &[Gain],
    conn: &mut ConnData,
    moves: &[(NI, i32)],
    cut_change1: Gain,
) -> (Gain, Gain)
where
    NI: Idx,
    G: Graph<NI> + UndirectedNeighborsWithValues<NI, Gain> + Sync,
{
    let mut applied = Vec::with_capacity(moves.len());
    for &(v, new_p) in moves {
        let i = v.index();
        let old_p = part[i];
        if old_p == new_p {
            continue;
        }
        part_sizes[old_p as usize] -= vtx_w[i];
        part_sizes[new_p as usize] += vtx_w[i];
        part[i] = new_p;
        applied.push((v, old_p, new_p));
    }

    // conn(new) - conn(old), evaluated against the post-move partition, so
    // a neighbor that also moved in this batch is accounted for under its
    // new part (section 4.6: "the new values encode the new contribution").
    let mut cut_change2: Gain = 0;
    for &(v, old_p, new_p) in &applied {
        for target in graph.neighbors_with_values(v) {
            let nb_part = part[target.target.index()];
            if nb_part == new_p {
                cut_change2 += target.value;
            }
            if nb_part == old_p {
                cut_change2 -= target.value;
            }
        }
    }

    conn.update(graph, part, &applied);

    let max_part = part_sizes.iter().copied().max().unwrap_or(0);
    (cut_change1 + cut_change2, max_part)
}
