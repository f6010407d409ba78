// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use coopnet::prelude::*;
use coopnet::metrics::analyzer::AnalysisReport;
use coopnet::network::pajek;

use clap::{Parser, Subcommand};
use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long)]
        workers: Option<usize>,
        #[arg(short, long)]
        rounds: Option<u32>,
        #[arg(short, long)]
        passes: Option<u32>,
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
        #[arg(long)]
        no_save: bool,
    },

    /// Generates a network and writes it as a Pajek file
    Graph {
        #[arg(default_value = "erdos_renyi")]
        kind: String,
        #[arg(short = 'n', long, default_value_t = 50)]
        nodes: usize,
        #[arg(short, long, default_value_t = 0.15)]
        p: f64,
        #[arg(short, long, default_value_t = 2)]
        m: usize,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(short, long, default_value = "network.net")]
        output: PathBuf,
    },

    Analyze {
        #[arg(default_value = "results")]
        path: PathBuf,
    },

    Rules,
}

fn main() -> Result<()> {
    let program_start = Instant::now(); // Global timer for end time.

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            config,
            seed,
            workers,
            rounds,
            passes,
            output,
            no_save,
        } => {
            let mut config = SimConfig::load(&config)?;
            if let Some(seed) = seed {
                config.seed = Some(seed);
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if let Some(rounds) = rounds {
                config.rounds = rounds;
            }
            if let Some(passes) = passes {
                config.passes = passes;
            }

            run_simulation(config, &output, no_save)?;
        }

        Commands::Graph { kind, nodes, p, m, seed, output } => {
            generate_graph(&kind, nodes, p, m, seed, &output)?;
        }

        Commands::Analyze { path } => {
            analyze_results(&path)?;
        }

        Commands::Rules => {
            println!("\nAvailable Update Rules");

            for rule in UpdateRule::ALL {
                println!("  - {:<28} {}", rule.name(), rule.description());
            }

            println!("\nRules are assigned at random when the population is created.");
            println!("Set change_update_rule in config.yaml to let agents adopt each other's rules.\n");
        }
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

fn run_simulation(config: SimConfig, output: &Path, no_save: bool) -> Result<()> {
    info!("coopnet: Single Run");

    let mut sim = Simulation::new(config)?.with_progress(true);
    sim.run()?;

    if no_save {
        let report = sim.report();
        comparison_table(std::slice::from_ref(&report));
    } else {
        sim.save_results(output)?;
    }

    Ok(())
}

fn generate_graph(kind: &str, n: usize, p: f64, m: usize, seed: Option<u64>, output: &Path) -> Result<()> {
    let kind: GraphKind = kind.parse()?;
    if kind == GraphKind::Pajek {
        anyhow::bail!("pajek is an input format, pick a generator: erdos_renyi, small_world or barabasi_albert");
    }

    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let network = kind.build(n, p, m, None, &mut rng)?;
    pajek::write_pajek(&network, output)?;

    info!(
        "{} network with {} nodes and {} edges (seed {}) written to: {}",
        kind,
        network.node_count(),
        network.edge_count(),
        seed,
        output.display()
    );
    if network.isolated_nodes() > 0 {
        info!("{} isolated nodes", network.isolated_nodes());
    }

    Ok(())
}

fn analyze_results(path: &Path) -> Result<()> {
    use std::fs;

    info!("Analyzing results in: {}", path.display());

    let mut reports = Vec::new();
    for entry in fs::read_dir(path)? {
        let path = entry?.path();

        if path.extension().and_then(|s| s.to_str()) == Some("json")
            && path.to_string_lossy().contains("analysis") {
            let content = fs::read_to_string(&path)?;
            let report: AnalysisReport = serde_json::from_str(&content)?;
            reports.push(report);
        }
    }

    if reports.is_empty() {
        info!("No analysis files found.");
        return Ok(());
    }

    reports.sort_by(|a, b| a.name.cmp(&b.name));
    comparison_table(&reports);

    Ok(())
}

// TODO: Long run names still push the right border out
fn comparison_table(reports: &[AnalysisReport]) {
    println!("\n╔═══════════════════════════════════════════════════════════════════════════════╗");
    println!("║                            RUN COMPARISON                                     ║");
    println!("╠═══════════════╦═══════════╦═══════════╦════════════╦════════════╦═════════════╣");
    println!("║ Run           ║ Agents    ║ Matches   ║ Coop before║ Coop after ║ Coop wins   ║");
    println!("║               ║           ║           ║ (%)        ║ (%)        ║ (%)         ║");
    println!("╠═══════════════╬═══════════╬═══════════╬════════════╬════════════╬═════════════╣");

    for report in reports {
        println!(
            "║ {:<13} ║ {:>9} ║ {:>9} ║ {:>9.2}% ║ {:>9.2}% ║ {:>10.2}% ║",
            report.name,
            report.agents,
            report.matches,
            report.cooperation_before * 100.0,
            report.cooperation_after * 100.0,
            report.cooperative_win_rate * 100.0,
        );
    }

    println!("╚═══════════════╩═══════════╩═══════════╩════════════╩════════════╩═════════════╝\n");

    for report in reports {
        println!("{}:", report.name);
        for rule in &report.rules {
            println!(
                "  {:<28} {:>5} -> {:<5} win share {:>6.2}%  win rate {:>6.2}%",
                rule.rule.display_name(),
                rule.members_before,
                rule.members_after,
                rule.win_share * 100.0,
                rule.win_rate * 100.0,
            );
        }
    }

    if let Some(most_cooperative) = reports.iter().max_by(|a, b| {
        a.cooperation_after.total_cmp(&b.cooperation_after)
    }) {
        println!(
            "\nMost cooperative: {} ({:.2}%)",
            most_cooperative.name, most_cooperative.cooperation_after * 100.0
        );
    }

    println!();
}
