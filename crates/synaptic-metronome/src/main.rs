//! synaptic-metronome - run the decay/excitation loop over an atom graph
//!
//! Usage:
//!   synaptic-metronome --demo --ticks 10 --query "miłość" --export graph.json
//!   synaptic-metronome --seed graph.json --config metronome.toml
//!
//! Without `--ticks` the loop runs until Ctrl-C.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use synaptic_graph::{AtomGraph, GraphSnapshot};
use synaptic_metronome::demo::demo_graph;
use synaptic_metronome::{Metronome, MetronomeConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "synaptic-metronome", about = "Periodic decay and excitation over a weighted atom graph")]
struct Cli {
    /// Path to config file (TOML). Missing file means defaults.
    #[arg(long, default_value = "metronome.toml")]
    config: PathBuf,

    /// Dump default config as TOML and exit.
    #[arg(long)]
    dump_config: bool,

    /// Load the initial graph from a JSON snapshot.
    #[arg(long, conflicts_with = "demo")]
    seed: Option<PathBuf>,

    /// Start from the built-in demo graph.
    #[arg(long)]
    demo: bool,

    /// Stop after this many cycles instead of waiting for Ctrl-C.
    #[arg(long)]
    ticks: Option<u64>,

    /// Query for the first cycle's excitation pass.
    #[arg(long)]
    query: Option<String>,

    /// Print spreading-activation recall results for this query after stopping.
    #[arg(long)]
    recall: Option<String>,

    /// Write the final graph as a JSON snapshot.
    #[arg(long)]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.dump_config {
        println!("{}", MetronomeConfig::default().to_toml());
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "synaptic=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MetronomeConfig::load(&cli.config);

    let now = chrono::Utc::now();
    let graph = if let Some(path) = &cli.seed {
        let snapshot = GraphSnapshot::load(path).with_context(|| format!("loading seed {}", path.display()))?;
        AtomGraph::import(snapshot)?
    } else if cli.demo {
        demo_graph(now)?
    } else {
        AtomGraph::new()
    };
    tracing::info!("Initial graph: {} atoms, {} edges", graph.stats().atoms, graph.stats().edges);

    let mut metronome = Metronome::new(graph, config)?;
    if let Some(query) = &cli.query {
        metronome.set_query(query.as_str()).await;
    }
    metronome.start();

    match cli.ticks {
        Some(target) => {
            let poll = metronome.config().tick_interval().min(Duration::from_millis(100));
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = tokio::time::sleep(poll) => {
                        let c = metronome.counters().await;
                        if c.cycles + c.failed_cycles >= target {
                            break;
                        }
                    }
                }
            }
        }
        None => {
            tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
        }
    }

    if let Some(counters) = metronome.stop().await {
        println!("{}", serde_json::to_string_pretty(&counters)?);
    }

    if let Some(query) = &cli.recall {
        for hit in metronome.recall(query).await {
            println!(
                "{:<16} relevance {:.3}  activation {:.3}{}",
                hit.id.as_str(),
                hit.relevance,
                hit.activation,
                if hit.direct { "" } else { "  (via edges)" }
            );
        }
    }

    if let Some(path) = &cli.export {
        metronome.snapshot().await.save(path)?;
        println!("Exported graph to {}", path.display());
    }

    let graph = metronome.dispose().await;
    tracing::info!("Final graph: {} atoms, {} edges", graph.stats().atoms, graph.stats().edges);
    Ok(())
}
