use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use jet_core::prelude::*;
use log::{error, info};

/// A data-parallel local-search refiner for multilevel k-way graph
/// partitioning, taking its positional arguments in the same order as the
/// original command-line driver: graph, config, optional partition output,
/// optional metrics output.
#[derive(Parser, Debug)]
#[command(name = "jet")]
struct Args {
    /// METIS-format graph file.
    metis_graph_file: PathBuf,

    /// 4-line configuration file (coarsening_alg, num_parts, num_iter, max_imb_ratio).
    config_file: PathBuf,

    /// Where to write the winning trial's partition, one part id per line.
    partition_output: Option<PathBuf>,

    /// Where to write per-trial cut metrics, one line per trial.
    metrics_file: Option<PathBuf>,

    /// Emits per-level refinement statistics via `log::debug!`.
    #[arg(long)]
    verbose: bool,

    /// Switches the temperature schedule to the extended sweep.
    #[arg(long)]
    ultra_settings: bool,

    /// Dumps the coarse-graph sequence after the first trial's coarsening pass.
    #[arg(long)]
    dump_coarse: bool,

    /// Loads a previously dumped coarse-graph sequence instead of coarsening.
    #[arg(long)]
    import_coarse: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(255)
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    let mut config = io::load_config(&args.config_file)?;
    config.verbose = args.verbose;
    config.ultra_settings = args.ultra_settings;
    config.dump_coarse = args.dump_coarse;
    config.validate()?;

    info!("Reading graph from {:?}", args.metis_graph_file);
    let (graph, vtx_w) = io::load_metis_graph(&args.metis_graph_file)?;
    info!(
        "Loaded graph: n={} m={}",
        graph.node_count(),
        graph.edge_count()
    );

    if let Some(import_path) = &args.import_coarse {
        info!("Importing coarse sequence from {import_path:?}");
        let levels = io::load_coarse(import_path)?;
        let coarsest = &levels[0];
        let targets = BalanceTargets::new(
            coarsest.vtx_w.iter().sum(),
            config.num_parts,
            config.max_imb_ratio,
        );
        let sample_count = (graph.node_count() as usize).min(1024) as u32;
        let uniform_edge_weight =
            (0..sample_count).all(|n| graph.neighbors_with_values(n).all(|t| t.value == 1));
        let schedule = config.temperature_schedule(uniform_edge_weight);
        let mut part = jet_core::initial::initial_partition(
            &coarsest.graph,
            &coarsest.vtx_w,
            config.num_parts,
            targets.size_max,
        );

        let mut state = RefineData::empty(config.num_parts);
        state = jet_core::refine::jet_refine(
            &coarsest.graph,
            &coarsest.vtx_w,
            config.num_parts,
            config.max_imb_ratio,
            config.refine_tolerance,
            &schedule,
            &mut part,
            state,
        );

        for level in levels.iter().skip(1) {
            let interp = level.interp.as_ref().expect("non-coarsest level carries an interpolation map");
            part = interp.iter().map(|&c| part[c as usize]).collect();
            state = RefineData::empty(config.num_parts);
            state = jet_core::refine::jet_refine(
                &level.graph,
                &level.vtx_w,
                config.num_parts,
                config.max_imb_ratio,
                config.refine_tolerance,
                &schedule,
                &mut part,
                state,
            );
        }

        report_and_write(&PartitionResult { part, cut: state.cut }, &args)?;
        return Ok(());
    }

    if config.dump_coarse {
        let levels = jet_core::coarsen::coarsen(graph.clone(), vtx_w.clone(), config.num_parts);
        if let Some(partition_output) = &args.partition_output {
            let dump_path = partition_output.with_extension("coarse.bin");
            io::dump_coarse(&dump_path, &levels)?;
            info!("Dumped coarse sequence to {dump_path:?}");
        }
    }

    let mut cuts = Vec::with_capacity(config.num_iter.max(1));
    let mut best: Option<PartitionResult> = None;
    for trial in 0..config.num_iter.max(1) {
        let result = multilevel::partition(&graph, &vtx_w, &config)?;
        info!("Trial {trial}: cut={}", result.cut);
        cuts.push(result.cut);
        if best.as_ref().map_or(true, |b| result.cut < b.cut) {
            best = Some(result);
        }
    }
    let best = best.expect("num_iter.max(1) >= 1 guarantees at least one trial");

    if let Some(metrics_path) = &args.metrics_file {
        let body: String = cuts.iter().map(|c| format!("{c}\n")).collect();
        std::fs::write(metrics_path, body)?;
    }

    report_and_write(&best, &args)
}

fn report_and_write(result: &PartitionResult, args: &Args) -> Result<(), Error> {
    info!("Best cut: {}", result.cut);
    if let Some(partition_output) = &args.partition_output {
        io::write_part(partition_output, &result.part)?;
    }
    Ok(())
}
