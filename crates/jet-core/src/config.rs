use crate::Error;

/// Acceptance tolerance presets, named after the original's `FOUR9`/`TWO9`
/// shorthand for how close a candidate cut must stay to the incumbent
/// before the phase-acceptance counter resets.
pub const REFINE_TOLERANCE_FOUR9: f64 = 0.9999;
pub const REFINE_TOLERANCE_TWO9: f64 = 0.99;
pub const REFINE_TOLERANCE_DEFAULT: f64 = 0.999;

/// The closed set of options recognized by the partitioner.
///
/// Mirrors `graph::wcc::WccConfig`'s dual `clap::Args`/`serde` derives: the
/// CLI builds one from flags, the 4-line config file format (see
/// [`crate::io::load_config`]) builds one from a loader, library users
/// build one directly.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct Config {
    /// Coarsening heuristic selector. `0` (MtMetis) and `2` (Matching) are
    /// accepted for compatibility with the closed option set but both route
    /// to the same heavy-edge-matching coarsener as `1` (HEC v1).
    #[cfg_attr(feature = "clap", clap(long, default_value_t = 1))]
    pub coarsening_alg: u8,

    /// Number of parts `k`, must be at least 2.
    #[cfg_attr(feature = "clap", clap(long))]
    pub num_parts: usize,

    /// Number of independent outer trials; the lowest-cut trial wins.
    #[cfg_attr(feature = "clap", clap(long, default_value_t = 1))]
    pub num_iter: usize,

    /// Maximum allowed imbalance ratio, e.g. `1.03` for 3% imbalance.
    #[cfg_attr(feature = "clap", clap(long, default_value_t = 1.03))]
    pub max_imb_ratio: f64,

    /// Acceptance tolerance for the phase counter reset.
    #[cfg_attr(feature = "clap", clap(long, default_value_t = REFINE_TOLERANCE_DEFAULT))]
    pub refine_tolerance: f64,

    /// Switches the temperature schedule to the extended sweep.
    #[cfg_attr(feature = "clap", clap(long))]
    pub ultra_settings: bool,

    /// Dumps the coarse-graph sequence after the first trial's coarsening
    /// pass, for controlled-input replay (see [`crate::io::dump_coarse`]).
    #[cfg_attr(feature = "clap", clap(long))]
    pub dump_coarse: bool,

    /// Emits per-level refinement statistics via `log::debug!`.
    #[cfg_attr(feature = "clap", clap(long))]
    pub verbose: bool,
}

impl Config {
    pub fn new(coarsening_alg: u8, num_parts: usize, num_iter: usize, max_imb_ratio: f64) -> Self {
        Self {
            coarsening_alg,
            num_parts,
            num_iter,
            max_imb_ratio,
            refine_tolerance: REFINE_TOLERANCE_DEFAULT,
            ultra_settings: false,
            dump_coarse: false,
            verbose: false,
        }
    }

    /// Validates the closed option set, mirroring the original's config
    /// loader: a bad `num_parts` or `max_imb_ratio` is a configuration
    /// error, reported and fatal, never silently clamped.
    pub fn validate(&self) -> Result<(), Error> {
        if self.num_parts < 2 {
            return Err(Error::InvalidConfig {
                detail: format!("num_parts must be >= 2, got {}", self.num_parts),
            });
        }
        if self.max_imb_ratio < 1.0 {
            return Err(Error::InvalidConfig {
                detail: format!("max_imb_ratio must be >= 1.0, got {}", self.max_imb_ratio),
            });
        }
        if !matches!(self.coarsening_alg, 0 | 1 | 2) {
            return Err(Error::InvalidConfig {
                detail: format!("coarsening_alg must be 0, 1, or 2, got {}", self.coarsening_alg),
            });
        }
        Ok(())
    }

    /// Temperature schedule tried in order by [`crate::refine::jet_refine`].
    pub fn temperature_schedule(&self, uniform_edge_weight: bool) -> Vec<f64> {
        if self.ultra_settings {
            let mut schedule = Vec::new();
            let mut t = 85;
            while t >= 5 {
                schedule.push(t as f64 / 100.0);
                t -= 5;
            }
            schedule
        } else if uniform_edge_weight {
            vec![0.25]
        } else {
            vec![0.75]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_num_parts() {
        let config = Config::new(1, 1, 1, 1.03);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_imb_ratio() {
        let config = Config::new(1, 4, 1, 0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn ultra_schedule_is_descending() {
        let config = Config {
            ultra_settings: true,
            ..Config::new(1, 4, 1, 1.03)
        };
        let schedule = config.temperature_schedule(false);
        assert_eq!(schedule.first(), Some(&0.85));
        assert_eq!(schedule.last(), Some(&0.05));
        assert!(schedule.windows(2).all(|w| w[0] > w[1]));
    }
}
