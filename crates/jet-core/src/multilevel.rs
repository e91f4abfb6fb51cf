//! The top-level driver tying coarsening, initial partitioning, and
//! per-level refinement together (`SPEC_FULL.md` section 6's `partition`
//! operation), grounded in `examples/original_source/src/partitioner.hpp`'s
//! `partition()`.

use graph_builder::prelude::*;
use log::info;

use crate::coarsen::coarsen;
use crate::config::Config;
use crate::initial::initial_partition;
use crate::model::{BalanceTargets, Gain, RefineData};
use crate::refine::jet_refine;
use crate::Error;

/// The result of one partitioning run: the final per-vertex part
/// assignment on the input (finest) graph, and the cut it achieves.
pub struct PartitionResult {
    pub part: Vec<i32>,
    pub cut: Gain,
}

/// Runs the full coarsen / initial-partition / uncoarsen-and-refine
/// pipeline once against `graph`/`vtx_w`, per `config`.
pub fn partition(
    graph: &UndirectedCsrGraph<u32, (), Gain>,
    vtx_w: &[Gain],
    config: &Config,
) -> Result<PartitionResult, Error> {
    config.validate()?;

    let sample_count = (graph.node_count() as usize).min(1024) as u32;
    let uniform_edge_weight = (0..sample_count)
        .all(|n| graph.neighbors_with_values(n).all(|t| t.value == 1));
    let schedule = config.temperature_schedule(uniform_edge_weight);

    let levels = coarsen(graph.clone(), vtx_w.to_vec(), config.num_parts);
    let coarsest = &levels[0];

    let total_size: Gain = coarsest.vtx_w.iter().sum();
    let targets = BalanceTargets::new(total_size, config.num_parts, config.max_imb_ratio);

    let mut part = initial_partition(&coarsest.graph, &coarsest.vtx_w, config.num_parts, targets.size_max);

    if config.verbose {
        info!(
            "multilevel: coarsest graph n={} m={}, initial partition built",
            coarsest.graph.node_count(),
            coarsest.graph.edge_count()
        );
    }

    let mut state = RefineData::empty(config.num_parts);
    state = jet_refine(
        &coarsest.graph,
        &coarsest.vtx_w,
        config.num_parts,
        config.max_imb_ratio,
        config.refine_tolerance,
        &schedule,
        &mut part,
        state,
    );

    for (level_idx, level) in levels.iter().enumerate().skip(1) {
        let interp = level
            .interp
            .as_ref()
            .expect("every level but the coarsest carries an interpolation map");

        let fine_part: Vec<i32> = interp.iter().map(|&coarse_v| part[coarse_v as usize]).collect();
        part = fine_part;

        state = RefineData::empty(config.num_parts);
        state = jet_refine(
            &level.graph,
            &level.vtx_w,
            config.num_parts,
            config.max_imb_ratio,
            config.refine_tolerance,
            &schedule,
            &mut part,
            state,
        );

        if config.verbose {
            info!(
                "multilevel: level {} (n={}) refined, cut={} total_imb={}",
                level_idx,
                level.graph.node_count(),
                state.cut,
                state.total_imb
            );
        }
    }

    Ok(PartitionResult { part, cut: state.cut })
}

/// Runs `config.num_iter` independent trials, keeping the lowest-cut result
/// (section 10.8's CLI trial loop, lifted into the library so callers other
/// than the binary can use it too).
pub fn partition_best_of(
    graph: &UndirectedCsrGraph<u32, (), Gain>,
    vtx_w: &[Gain],
    config: &Config,
) -> Result<PartitionResult, Error> {
    let mut best: Option<PartitionResult> = None;
    for trial in 0..config.num_iter.max(1) {
        let result = partition(graph, vtx_w, config)?;
        if config.verbose {
            info!("multilevel: trial {trial} cut={}", result.cut);
        }
        if best.as_ref().map_or(true, |b| result.cut < b.cut) {
            best = Some(result);
        }
    }
    Ok(best.expect("num_iter.max(1) >= 1 guarantees at least one trial"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_a_path_graph() {
        let edges: Vec<(u32, u32, Gain)> = (0..7u32).map(|i| (i, i + 1, 1)).collect();
        let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
            .csr_layout(CsrLayout::Sorted)
            .edges_with_values(edges)
            .build();
        let vtx_w = vec![1 as Gain; 8];

        let config = Config::new(1, 2, 1, 1.2);
        let result = partition(&graph, &vtx_w, &config).expect("valid config");

        assert_eq!(result.part.len(), 8);
        assert!(result.part.iter().all(|&p| p == 0 || p == 1));
    }

    #[test]
    fn best_of_trials_never_worse_than_single_trial() {
        let edges: Vec<(u32, u32, Gain)> = vec![
            (0, 1, 1), (1, 2, 1), (2, 3, 1), (3, 0, 1),
            (4, 5, 1), (5, 6, 1), (6, 7, 1), (7, 4, 1),
            (0, 4, 1),
        ];
        let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
            .csr_layout(CsrLayout::Sorted)
            .edges_with_values(edges)
            .build();
        let vtx_w = vec![1 as Gain; 8];

        let config = Config::new(1, 2, 3, 1.2);
        let single = Config::new(1, 2, 1, 1.2);

        let best = partition_best_of(&graph, &vtx_w, &config).expect("valid config");
        let one = partition(&graph, &vtx_w, &single).expect("valid config");
        assert!(best.cut <= one.cut);
    }

    #[test]
    fn rejects_invalid_config() {
        let edges: Vec<(u32, u32, Gain)> = vec![(0, 1, 1)];
        let graph: UndirectedCsrGraph<u32, (), Gain> = GraphBuilder::new()
            .csr_layout(CsrLayout::Sorted)
            .edges_with_values(edges)
            .build();
        let vtx_w = vec![1 as Gain; 2];

        let config = Config::new(1, 1, 1, 1.2);
        assert!(partition(&graph, &vtx_w, &config).is_err());
    }
}
