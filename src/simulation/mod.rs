pub mod config;
pub mod scheduler;
pub use config::SimConfig;

use crate::agent::Agent;
use crate::error::GameError;
use crate::game::UpdateParams;
use crate::metrics::analyzer::{self, AnalysisReport};
use crate::metrics::logger::{self, MetricsLogger};
use crate::metrics::{MatchSnapshot, MetricsCollector};
use crate::network::{Edge, Network};
use crate::population::Population;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use scheduler::MatchContext;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Files written by [`Simulation::save_results`].
#[derive(Debug, Clone)]
pub struct SavedResults {
    pub matches: PathBuf,
    pub agents: PathBuf,
    pub analysis: PathBuf,
}

pub struct Simulation {
    config: SimConfig,
    network: Network,
    population: Population,
    initial: Vec<Agent>,
    params: UpdateParams,
    seed: u64,
    progress: bool,
    pub metrics: MetricsCollector,
}

// splitmix64 finaliser, spreads (seed, pass, edge) over the whole u64 range
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

pub fn match_seed(seed: u64, pass: u32, index: usize) -> u64 {
    mix(mix(seed ^ mix(pass as u64)) ^ index as u64)
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);

        let network = config
            .graph
            .build(config.n, config.p, config.m, config.pajek_file(), &mut rng)?;
        let source = config.cooperation_source()?;
        let population = Population::initialize(config.n, &source, &mut rng)?;

        Self::from_parts(config, network, population, seed)
    }

    /// Builds a simulation around an existing network and population.
    pub fn from_parts(config: SimConfig, network: Network, population: Population, seed: u64) -> Result<Self> {
        if network.node_count() != population.len() {
            return Err(GameError::SizeMismatch {
                network: network.node_count(),
                population: population.len(),
            }
            .into());
        }

        let isolated = network.isolated_nodes();
        if isolated > 0 {
            warn!("{} of {} agents have no neighbours and will never play", isolated, network.node_count());
        }

        let metrics = MetricsCollector::new();
        metrics.record_baseline(&population);

        Ok(Self {
            params: config.update_params(),
            initial: population.snapshot(),
            config,
            network,
            population,
            seed,
            progress: false,
            metrics,
        })
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn run(&mut self) -> Result<()> {
        info!("Starting simulation: {}", self.config.name);
        info!(
            "Network: {} with {} agents and {} edges",
            self.config.graph,
            self.network.node_count(),
            self.network.edge_count()
        );
        info!(
            "Rounds per match: {}, passes: {}, workers: {}, seed: {}",
            self.config.rounds, self.config.passes, self.config.workers, self.seed
        );

        let pool = if self.config.workers > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.workers)
                    .build()?,
            )
        } else {
            None
        };

        let total = self.network.edge_count() as u64 * self.config.passes as u64;
        let pb = if self.progress {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.orange/yellow} {pos}/{len} matches {msg}")?
                    .progress_chars("█▓░"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        for pass in 0..self.config.passes {
            self.run_pass(pass, pool.as_ref(), &pb)?;
        }

        let after = self.population.census();
        pb.finish_with_message(format!("cooperation {:.3}", after.cooperation_ratio()));
        info!(
            "Simulation complete: {} matches, cooperation {:.3} -> {:.3}",
            self.metrics.match_count(),
            self.metrics.baseline().map(|c| c.cooperation_ratio()).unwrap_or_default(),
            after.cooperation_ratio()
        );

        Ok(())
    }

    fn run_pass(&self, pass: u32, pool: Option<&rayon::ThreadPool>, pb: &ProgressBar) -> Result<()> {
        let ctx = MatchContext {
            payoff: &self.config.payoff,
            params: self.params,
            rounds: self.config.rounds,
            network: &self.network,
            population: &self.population,
            metrics: &self.metrics,
        };
        let seed = self.seed;

        let play = |(index, &edge): (usize, &Edge)| -> crate::error::Result<()> {
            let mut rng = StdRng::seed_from_u64(match_seed(seed, pass, index));
            let snapshot = scheduler::run_match(&ctx, pass, edge, &mut rng)?;
            pb.inc(1);
            pb.set_message(format!("cooperation {:.3}", snapshot.cooperation_ratio));
            Ok(())
        };

        let edges = self.network.edges();
        match pool {
            Some(pool) => pool.install(|| edges.par_iter().enumerate().try_for_each(play))?,
            None => edges.iter().enumerate().try_for_each(play)?,
        }

        Ok(())
    }

    pub fn save_results(&self, dir: impl AsRef<Path>) -> Result<SavedResults> {
        let dir = dir.as_ref();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let prefix = format!("{}_{}", self.config.name, timestamp);

        std::fs::create_dir_all(dir)?;

        let matches = dir.join(format!("{}_matches.csv", prefix));
        let mut csv = MetricsLogger::new(&matches)?;
        csv.log_batch(&self.metrics.get_snapshots())?;
        info!("Match snapshots saved to: {}", matches.display());

        let agents = dir.join(format!("{}_agents.csv", prefix));
        let current = self.population.snapshot();
        logger::write_agents(&agents, &self.initial, &current)?;
        info!("Agent table saved to: {}", agents.display());

        let report = analyzer::analyze(&self.config.name, &self.initial, &current, &self.metrics);
        let analysis = dir.join(format!("{}_analysis.json", prefix));
        std::fs::write(&analysis, serde_json::to_string_pretty(&report)?)?;
        info!("Analysis saved to: {}", analysis.display());

        info!(
            "Cooperation: {:.2}% -> {:.2}%",
            report.cooperation_before * 100.0,
            report.cooperation_after * 100.0
        );
        if let Some(dominant) = report.dominant_rule() {
            info!("Dominant rule: {} ({} agents)", dominant.rule.display_name(), dominant.members_after);
        }

        Ok(SavedResults { matches, agents, analysis })
    }

    pub fn report(&self) -> AnalysisReport {
        analyzer::analyze(
            &self.config.name,
            &self.initial,
            &self.population.snapshot(),
            &self.metrics,
        )
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn initial_agents(&self) -> &[Agent] {
        &self.initial
    }

    pub fn final_agents(&self) -> Vec<Agent> {
        self.population.snapshot()
    }

    pub fn snapshots(&self) -> Vec<MatchSnapshot> {
        self.metrics.get_snapshots()
    }
}
