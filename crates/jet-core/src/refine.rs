//! The refinement driver, `jet_refine` (`SPEC_FULL.md` section 4.7): runs
//! `jet_lp`/`rebalance_weak`/`rebalance_strong` phases under a temperature
//! schedule, keeping a `best_state`/`curr_state` pair and accepting a
//! candidate only when it improves balance or cut.

use graph_builder::{Graph, Idx, UndirectedDegrees, UndirectedNeighborsWithValues};
use log::debug;

use crate::conn::ConnData;
use crate::lp::jet_lp;
use crate::model::{BalanceTargets, Gain, RefineData};
use crate::moves::perform_moves;
use crate::rebalance::{rebalance_strong, rebalance_weak};

const MAX_PHASES_PER_TEMPERATURE: usize = 12;

/// The refiner's one exposed operation (section 6): refines `part` in
/// place against `graph`/`vtx_w`, returning the accepted `RefineData`.
/// `state` carries `RefineData` across levels; pass `RefineData::empty(k)`
/// with `init = false` on a level's first call (mirrors interpolation,
/// section 10.4).
pub fn jet_refine<NI, G>(
    graph: &G,
    vtx_w: &[Gain],
    num_parts: usize,
    max_imb_ratio: f64,
    refine_tolerance: f64,
    schedule: &[f64],
    part: &mut [i32],
    mut state: RefineData,
) -> RefineData
where
    NI: Idx,
    G: Graph<NI> + UndirectedDegrees<NI> + UndirectedNeighborsWithValues<NI, Gain> + Sync,
{
    if !state.init {
        state.initialize::<NI, _>(graph, vtx_w, part);
    }

    let targets = BalanceTargets::new(state.total_size, num_parts, max_imb_ratio);
    state.recompute_imbalance(targets.opt);

    let mut conn = ConnData::new(graph.node_count().index(), num_parts);
    conn.build(graph, part);

    let mut best_state = state.clone();
    let mut best_part = part.to_vec();
    let mut curr_state = state;

    for &filter_ratio in schedule {
        let mut phase_counter = 0usize;
        let mut balance_counter = 0usize;

        while phase_counter < MAX_PHASES_PER_TEMPERATURE {
            let accepted = if curr_state.total_imb <= targets.imb_max() {
                balance_counter = 0;
                run_lp_phase(graph, part, &mut conn, vtx_w, &mut curr_state, &targets, filter_ratio)
            } else if balance_counter < 2 {
                balance_counter += 1;
                run_rebalance_phase(
                    graph,
                    part,
                    &mut conn,
                    vtx_w,
                    &mut curr_state,
                    &targets,
                    rebalance_weak,
                )
            } else {
                balance_counter += 1;
                run_rebalance_phase(
                    graph,
                    part,
                    &mut conn,
                    vtx_w,
                    &mut curr_state,
                    &targets,
                    rebalance_strong,
                )
            };

            phase_counter += 1;

            let imbalanced_best = best_state.total_imb > targets.imb_max();
            let improves_balance = imbalanced_best && curr_state.total_imb < best_state.total_imb;
            let improves_cut = curr_state.cut < best_state.cut
                && (curr_state.total_imb <= targets.imb_max() || curr_state.total_imb <= best_state.total_imb);

            if improves_balance || improves_cut {
                debug!(
                    "jet_refine: accepting cut={} total_imb={} (was cut={} total_imb={})",
                    curr_state.cut, curr_state.total_imb, best_state.cut, best_state.total_imb
                );
                let material = improves_balance
                    || (curr_state.cut as f64) < refine_tolerance * best_state.cut as f64;

                best_state = curr_state.clone();
                best_part.copy_from_slice(part);

                if material {
                    phase_counter = 0;
                }
            } else {
                // reject: restore best known partition before the next phase.
                part.copy_from_slice(&best_part);
                curr_state = best_state.clone();
                conn.build(graph, part);
            }

            if accepted.moves_were_empty {
                break;
            }
        }
    }

    part.copy_from_slice(&best_part);
    best_state
}

struct PhaseOutcome {
    moves_were_empty: bool,
}

fn run_lp_phase<NI, G>(
    graph: &G,
    part: &mut [i32],
    conn: &mut ConnData,
    vtx_w: &[Gain],
    state: &mut RefineData,
    targets: &BalanceTargets,
    filter_ratio: f64,
) -> PhaseOutcome
where
    NI: Idx,
    G: Graph<NI> + UndirectedNeighborsWithValues<NI, Gain> + Sync,
{
    let result = jet_lp::<NI, _>(graph, part, conn, filter_ratio);
    let moves_were_empty = result.moves.is_empty();

    let moves: Vec<(NI, i32)> = result.moves.iter().map(|&(v, _, new_p)| (v, new_p)).collect();
    let (cut_delta, max_part) = perform_moves(
        graph,
        part,
        &mut state.part_sizes,
        vtx_w,
        conn,
        &moves,
        result.cut_change1,
    );
    state.cut -= cut_delta;
    state.total_imb = (max_part - targets.opt).max(0);

    PhaseOutcome { moves_were_empty }
}

fn run_rebalance_phase<NI, G>(
    graph: &G,
    part: &mut [i32],
    conn: &mut ConnData,
    vtx_w: &[Gain],
    state: &mut RefineData,
    targets: &BalanceTargets,
    rebalancer: impl Fn(&G, &[i32], &ConnData, &[Gain], &[Gain], BalanceTargets) -> Vec<(NI, i32)>,
) -> PhaseOutcome
where
    NI: Idx,
    G: Graph<NI> + UndirectedNeighborsWithValues<NI, Gain> + Sync,
{
    let moves = rebalancer(graph, part, conn, &state.part_sizes, vtx_w, *targets);
    let moves_were_empty = moves.is_empty();

    let (cut_delta, max_part) = perform_moves(
        graph,
        part,
        &mut state.part_sizes,
        vtx_w,
        conn,
        &moves,
        0,
    );
    state.cut -= cut_delta;
    state.total_imb = (max_part - targets.opt).max(0);

    PhaseOutcome { moves_were_empty }
}
