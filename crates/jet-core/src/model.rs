//! The data model shared across connectivity building, label propagation,
//! rebalancing, and the refinement driver: balance targets, per-level
//! refinement state, and the sentinel values used throughout the
//! connectivity table and gain bucketing.

use graph_builder::Idx;

/// Aggregated weight type. Wide enough that the sum of all edge or vertex
/// weights in a graph fits, independent of the vertex-id width `NI` --
/// mirrors `jet_defs.h`'s `value_t`/`big_val_t` split collapsed to a single
/// width (see `SPEC_FULL.md` section 10.1).
pub type Gain = i64;

/// `dest_cache` entry meaning "recompute on next use"; also the empty-slot
/// sentinel in a connectivity row.
pub const NULL_PART: i32 = -1;
/// Connectivity-row tombstone: a slot whose weight dropped to zero and was
/// reclaimed for reuse (only ever written when a row's capacity is below
/// `k`, since a full-capacity-`k` row's slots are never shared between
/// parts and so never need reclaiming).
pub const HASH_RECLAIM: i32 = -2;
/// `dest_cache` entry meaning "no beneficial destination found".
pub const NO_MOVE: i32 = -3;

/// `opt`/`size_max` balance targets derived from total vertex weight, part
/// count, and the configured imbalance ratio.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BalanceTargets {
    pub opt: Gain,
    pub size_max: Gain,
}

impl BalanceTargets {
    pub fn new(total_size: Gain, num_parts: usize, max_imb_ratio: f64) -> Self {
        let opt = (total_size + num_parts as Gain - 1) / num_parts as Gain;
        let size_max = ((opt as f64) * max_imb_ratio).floor() as Gain;
        Self { opt, size_max }
    }

    /// `imb_max` as used by the refinement driver's phase selection (section 4.7).
    pub fn imb_max(&self) -> Gain {
        self.size_max - self.opt
    }
}

/// Refinement state persisted across levels after interpolation (section 3).
///
/// Cloned into a *candidate* alongside a *best* by the driver; on
/// acceptance the candidate's fields are copied into best.
#[derive(Clone, Debug)]
pub struct RefineData {
    pub part_sizes: Vec<Gain>,
    pub total_size: Gain,
    pub cut: Gain,
    pub total_imb: Gain,
    pub init: bool,
}

impl RefineData {
    pub fn empty(num_parts: usize) -> Self {
        Self {
            part_sizes: vec![0; num_parts],
            total_size: 0,
            cut: 0,
            total_imb: 0,
            init: false,
        }
    }

    /// Recomputes `part_sizes`, `total_size`, and `cut` from a graph and
    /// partition. Invoked by `jet_refine` the first time a level is
    /// refined, since `init` starts `false` after interpolation (section 10.4).
    pub fn initialize<NI, G>(&mut self, graph: &G, vtx_w: &[Gain], part: &[i32])
    where
        NI: Idx,
        G: graph_builder::Graph<NI> + graph_builder::UndirectedNeighborsWithValues<NI, Gain> + Sync,
    {
        self.part_sizes.iter_mut().for_each(|s| *s = 0);
        self.total_size = 0;
        for (i, &w) in vtx_w.iter().enumerate() {
            self.part_sizes[part[i] as usize] += w;
            self.total_size += w;
        }

        let mut cut = 0 as Gain;
        for i in 0..graph.node_count().index() {
            let p = part[i];
            for target in graph.neighbors_with_values(NI::new(i)) {
                if part[target.target.index()] != p {
                    cut += target.value;
                }
            }
        }
        self.cut = cut;
        self.init = true;
    }

    pub fn max_part_size(&self) -> Gain {
        self.part_sizes.iter().copied().max().unwrap_or(0)
    }

    pub fn recompute_imbalance(&mut self, opt: Gain) {
        self.total_imb = (self.max_part_size() - opt).max(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_targets_strict() {
        let t = BalanceTargets::new(10, 2, 1.0);
        assert_eq!(t.opt, 5);
        assert_eq!(t.size_max, 5);
        assert_eq!(t.imb_max(), 0);
    }

    #[test]
    fn balance_targets_with_slack() {
        let t = BalanceTargets::new(4, 2, 1.5);
        assert_eq!(t.opt, 2);
        assert_eq!(t.size_max, 3);
    }
}
