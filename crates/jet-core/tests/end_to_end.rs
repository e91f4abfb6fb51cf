//! End-to-end refinement scenarios small enough to reason about by hand,
//! in the style of `graph-builder`'s `tests/builder.rs` integration tests.

use jet_core::model::{Gain, RefineData};
use jet_core::prelude::*;
use jet_core::refine::jet_refine;

fn refine_from_scratch(
    graph: &UndirectedCsrGraph<u32, (), Gain>,
    vtx_w: &[Gain],
    num_parts: usize,
    max_imb_ratio: f64,
    schedule: &[f64],
    part: &mut [i32],
) -> RefineData {
    let state = RefineData::empty(num_parts);
    jet_refine(
        graph,
        vtx_w,
        num_parts,
        max_imb_ratio,
        0.999,
        schedule,
        part,
        state,
    )
}

#[test]
fn four_vertex_path_stays_at_optimal_cut() {
    let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
        .csr_layout(CsrLayout::Sorted)
        .edges_with_values(vec![(0u32, 1u32, 1i64), (1, 2, 1), (2, 3, 1)])
        .build();
    let vtx_w = vec![1 as Gain; 4];
    let mut part = vec![0, 0, 1, 1];

    let state = refine_from_scratch(&graph, &vtx_w, 2, 1.0, &[0.25], &mut part);

    assert_eq!(state.cut, 2, "cut is stored doubled (each cut edge counted from both endpoints)");
    assert_eq!(state.total_imb, 0);
}

#[test]
fn bipartite_k33_converges_to_full_cut() {
    let mut edges = Vec::new();
    for u in 0..3u32 {
        for v in 3..6u32 {
            edges.push((u, v, 1i64));
        }
    }
    let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
        .csr_layout(CsrLayout::Sorted)
        .edges_with_values(edges)
        .build();
    let vtx_w = vec![1 as Gain; 6];
    let mut part = vec![0, 1, 0, 1, 0, 1];

    let state = refine_from_scratch(&graph, &vtx_w, 2, 1.0, &[0.25], &mut part);

    // every edge crosses parts in the fully-connected bipartite graph only
    // when each side is wholly in one part; any other 3/3 split cuts fewer
    // than all 9 edges in both directions, i.e. a *smaller* doubled cut.
    assert!(state.cut <= 18);
    assert_eq!(state.total_imb, 0);
}

#[test]
fn two_disjoint_triangles_separate_within_two_phases() {
    let edges = vec![
        (0u32, 1u32, 1i64), (1, 2, 1), (2, 0, 1),
        (3, 4, 1), (4, 5, 1), (5, 3, 1),
    ];
    let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
        .csr_layout(CsrLayout::Sorted)
        .edges_with_values(edges)
        .build();
    let vtx_w = vec![1 as Gain; 6];
    let mut part = vec![0, 1, 0, 1, 0, 1];

    let state = refine_from_scratch(&graph, &vtx_w, 2, 1.0, &[0.25], &mut part);

    assert_eq!(state.cut, 0);
    let mut by_part: Vec<Vec<i32>> = vec![Vec::new(), Vec::new()];
    for (v, &p) in part.iter().enumerate() {
        by_part[p as usize].push(v as i32);
    }
    by_part.iter_mut().for_each(|g| g.sort());
    assert!(
        by_part.contains(&vec![0, 1, 2]) && by_part.contains(&vec![3, 4, 5]),
        "expected the two triangles to land in separate parts, got {part:?}"
    );
}

#[test]
fn star_with_heavy_center_keeps_center_in_place() {
    let edges: Vec<(u32, u32, Gain)> = (1..=5u32).map(|i| (0, i, 1)).collect();
    let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
        .csr_layout(CsrLayout::Sorted)
        .edges_with_values(edges)
        .build();
    let vtx_w = vec![3 as Gain, 1, 1, 1, 1, 1];
    let mut part = vec![0, 1, 1, 1, 1, 1];

    refine_from_scratch(&graph, &vtx_w, 2, 1.5, &[0.25], &mut part);

    assert_eq!(part[0], 0, "moving the heavy center costs more than it could ever gain");
}

#[test]
fn coarse_dump_round_trip_yields_identical_cut() {
    let edges: Vec<(u32, u32, Gain)> = (0..9u32).map(|i| (i, i + 1, 1)).collect();
    let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
        .csr_layout(CsrLayout::Sorted)
        .edges_with_values(edges)
        .build();
    let vtx_w = vec![1 as Gain; 10];

    let levels = jet_core::coarsen::coarsen(graph, vtx_w, 2);

    let dir = tempfile::tempdir().expect("tempdir");
    let dump_path = dir.path().join("coarse.bin");
    jet_core::io::dump_coarse(&dump_path, &levels).expect("dump");
    let reloaded = jet_core::io::load_coarse(&dump_path).expect("reload");

    let run = |levels: &[jet_core::coarsen::Level]| -> Gain {
        let coarsest = &levels[0];
        let targets = BalanceTargets::new(coarsest.vtx_w.iter().sum(), 2, 1.2);
        let mut part = jet_core::initial::initial_partition(
            &coarsest.graph,
            &coarsest.vtx_w,
            2,
            targets.size_max,
        );
        let mut state = refine_from_scratch(&coarsest.graph, &coarsest.vtx_w, 2, 1.2, &[0.25], &mut part);
        for level in levels.iter().skip(1) {
            let interp = level.interp.as_ref().expect("carries an interpolation map");
            part = interp.iter().map(|&c| part[c as usize]).collect();
            state = refine_from_scratch(&level.graph, &level.vtx_w, 2, 1.2, &[0.25], &mut part);
        }
        state.cut
    };

    assert_eq!(run(&levels), run(&reloaded));
}

#[test]
fn optimal_input_is_idempotent_under_refinement() {
    let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
        .csr_layout(CsrLayout::Sorted)
        .edges_with_values(vec![(0u32, 1u32, 1i64), (1, 2, 1), (2, 3, 1)])
        .build();
    let vtx_w = vec![1 as Gain; 4];
    let mut part = vec![0, 0, 1, 1];

    let first = refine_from_scratch(&graph, &vtx_w, 2, 1.0, &[0.25], &mut part);
    let part_sizes_before = first.part_sizes.clone();
    let cut_before = first.cut;

    let mut state = RefineData::empty(2);
    state.part_sizes = part_sizes_before.clone();
    state.total_size = first.total_size;
    state.cut = cut_before;
    state.init = true;

    let second = jet_refine(&graph, &vtx_w, 2, 1.0, 0.999, &[0.25], &mut part, state);

    assert_eq!(second.cut, cut_before);
    assert_eq!(second.part_sizes, part_sizes_before);
}
