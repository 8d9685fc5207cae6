//! Integration tests for synaptic-metronome
//!
//! - MetronomeConfig defaults, TOML round-trip and validation
//! - Metronome lifecycle: start / stop / dispose state machine
//! - Scheduled ticks, queued queries, inspection while running

use std::path::Path;
use std::time::Duration;
use synaptic_core::{AtomId, EdgeKind, Error};
use synaptic_graph::{AtomGraph, ExcitationMode, NewAtom};
use synaptic_metronome::demo::demo_graph;
use synaptic_metronome::{Metronome, MetronomeConfig};
use tempfile::TempDir;

fn fast_config() -> MetronomeConfig {
    let mut config = MetronomeConfig::default();
    config.timing.tick_ms = 10;
    config
}

fn love_graph() -> AtomGraph {
    let now = chrono::Utc::now();
    let mut g = AtomGraph::new();
    g.add_atom(NewAtom::new("love", "Love").tags(["love"]).weight(0.5), now).unwrap();
    g.add_atom(NewAtom::new("plain", "Plain").weight(0.5), now).unwrap();
    g
}

async fn wait_for_cycles(m: &Metronome, n: u64) {
    for _ in 0..500 {
        if m.counters().await.cycles >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("metronome never reached {} cycles", n);
}

// ============================================================
// Config
// ============================================================

#[test]
fn config_defaults_match_documented_values() {
    let c = MetronomeConfig::default();
    assert_eq!(c.timing.tick_ms, 1_000);
    assert_eq!(c.timing.introspection_ms, 30_000);
    assert_eq!(c.timing.optimize_ms, 60_000);
    assert_eq!(c.decay.min_weight, 0.01);
    assert_eq!(c.decay.promotion_threshold, 0.5);
    assert_eq!(c.excitation.spontaneous_top_n, 3);
    assert_eq!(c.rules.altruistic_weight_boost, 1.2);
    assert_eq!(c.rules.altruistic_decay_factor, 0.8);
    assert_eq!(c.rules.negative_decay_factor, 1.5);
    assert_eq!(c.counters.consolidation_threshold, 0.7);
    assert_eq!(c.counters.ema_alpha, 0.1);
    assert_eq!(c.recall.max_hops, 2);
}

#[test]
fn config_partial_toml_keeps_other_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metronome.toml");
    std::fs::write(&path, "[timing]\ntick_ms = 250\n\n[rules]\nnegative_decay_factor = 2.0\n").unwrap();

    let c = MetronomeConfig::load(&path);
    assert_eq!(c.timing.tick_ms, 250);
    assert_eq!(c.timing.optimize_ms, 60_000);
    assert_eq!(c.rules.negative_decay_factor, 2.0);
    assert_eq!(c.rules.altruistic_weight_boost, 1.2);
}

#[test]
fn config_missing_or_broken_file_falls_back() {
    let dir = TempDir::new().unwrap();
    let c = MetronomeConfig::load(Path::new("/nonexistent/metronome.toml"));
    assert_eq!(c.timing.tick_ms, 1_000);

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "[timing\ntick_ms = ").unwrap();
    assert_eq!(MetronomeConfig::load(&broken).timing.tick_ms, 1_000);
}

#[test]
fn config_dump_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dump.toml");
    std::fs::write(&path, MetronomeConfig::default().to_toml()).unwrap();
    let c = MetronomeConfig::load(&path);
    assert_eq!(c.counters.ema_alpha, 0.1);
    assert_eq!(c.recall.propagation, 0.7);
}

#[test]
fn config_validation_rejects_unusable_values() {
    let mut c = MetronomeConfig::default();
    c.timing.tick_ms = 0;
    assert!(matches!(c.validate(), Err(Error::ConfigError(_))));

    let mut c = MetronomeConfig::default();
    c.counters.ema_alpha = 0.0;
    assert!(c.validate().is_err());

    let mut c = MetronomeConfig::default();
    c.rules.negative_decay_factor = -1.0;
    assert!(c.validate().is_err());

    assert!(Metronome::new(AtomGraph::new(), MetronomeConfig { timing: Default::default(), ..c }).is_err());
}

// ============================================================
// Lifecycle
// ============================================================

#[tokio::test]
async fn start_stop_state_machine() {
    let mut m = Metronome::new(love_graph(), fast_config()).unwrap();
    assert!(!m.is_running());
    assert!(m.stop().await.is_none());

    assert!(m.start());
    assert!(!m.start());
    assert!(m.is_running());

    wait_for_cycles(&m, 2).await;
    let counters = m.stop().await.unwrap();
    assert!(counters.cycles >= 2);
    assert_eq!(counters.failed_cycles, 0);
    assert!(counters.ema_cycle_ms >= 0.0);
    assert!(!m.is_running());

    // stopped means no more cycles
    let frozen = m.counters().await.cycles;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(m.counters().await.cycles, frozen);

    // and it can be started again
    assert!(m.start());
    wait_for_cycles(&m, frozen + 1).await;
    assert!(m.stop().await.is_some());
}

#[tokio::test]
async fn dispose_returns_the_graph() {
    let mut m = Metronome::new(love_graph(), fast_config()).unwrap();
    m.start();
    wait_for_cycles(&m, 1).await;
    let graph = m.dispose().await;
    assert_eq!(graph.len(), 2);
    assert!(graph.get("love").unwrap().weight() > 0.0);
}

#[tokio::test]
async fn drop_while_running_does_not_hang() {
    let mut m = Metronome::new(love_graph(), fast_config()).unwrap();
    m.start();
    drop(m);
    tokio::time::sleep(Duration::from_millis(30)).await;
}

#[tokio::test]
async fn scheduled_optimize_prunes_while_ticking() {
    let now = chrono::Utc::now();
    let mut g = AtomGraph::new();
    g.add_atom(NewAtom::new("a", "A").weight(0.9), now).unwrap();
    g.add_atom(NewAtom::new("b", "B").weight(0.9), now).unwrap();
    assert!(g.connect("a", "b", 0.05, EdgeKind::Semantic, now));

    let mut config = fast_config();
    config.timing.introspection_ms = 20;
    config.timing.optimize_ms = 40;
    let mut m = Metronome::new(g, config).unwrap();
    m.start();

    for _ in 0..500 {
        let c = m.counters().await;
        if c.cycles >= 3 && c.introspections >= 1 && c.optimizations >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let counters = m.stop().await.unwrap();
    assert!(counters.cycles >= 3);
    assert!(counters.introspections >= 1);
    assert!(counters.optimizations >= 1);
    assert_eq!(counters.failed_cycles, 0);

    let graph = m.dispose().await;
    assert_eq!(graph.stats().edges, 0);
    assert!(graph.get("a").unwrap().edges().is_empty());
    assert!(graph.get("b").unwrap().edges().is_empty());
    assert_eq!(graph.len(), 2);
}

// ============================================================
// Ticks
// ============================================================

#[tokio::test]
async fn queued_query_is_consumed_once() {
    let m = Metronome::new(love_graph(), MetronomeConfig::default()).unwrap();
    m.set_query("kocham").await;

    let first = m.tick_once().await.unwrap();
    assert_eq!(first.excitation.mode, ExcitationMode::Query);
    assert_eq!(first.excitation.boosted[0].0, AtomId::from("love"));

    let second = m.tick_once().await.unwrap();
    assert_eq!(second.excitation.mode, ExcitationMode::Spontaneous);

    let love = m.with_graph(|g| g.get("love").unwrap().weight()).await;
    let plain = m.with_graph(|g| g.get("plain").unwrap().weight()).await;
    assert!(love > 0.9, "love boosted to {love}");
    assert!(plain < 0.5);
    assert_eq!(m.counters().await.cycles, 2);
}

#[tokio::test]
async fn inspection_works_while_running() {
    let mut m = Metronome::new(demo_graph(chrono::Utc::now()).unwrap(), fast_config()).unwrap();
    m.start();
    wait_for_cycles(&m, 1).await;

    let stats = m.stats().await;
    assert!(stats.atoms > 0);
    let snapshot = m.snapshot().await;
    assert_eq!(snapshot.atoms.len(), stats.atoms);

    let report = m.introspect().await;
    assert!(!report.strongest.is_empty());
    assert!(report.counters.cycles >= 1);

    let optimized = m.auto_optimize().await;
    assert!(m.auto_optimize().await.is_noop());
    assert!(optimized.edges_removed <= 1);

    let hits = m.recall("miłość").await;
    assert!(hits.iter().any(|h| h.id.as_str() == "care" && h.direct));

    m.stop().await;
}

#[tokio::test]
async fn consolidated_count_follows_threshold() {
    let now = chrono::Utc::now();
    let mut g = AtomGraph::new();
    g.add_atom(NewAtom::new("heavy", "Heavy").weight(0.9), now).unwrap();
    g.add_atom(NewAtom::new("light", "Light").weight(0.2), now).unwrap();
    let m = Metronome::new(g, MetronomeConfig::default()).unwrap();

    let report = m.tick_once().await.unwrap();
    assert_eq!(report.consolidated, 1);
    assert_eq!(m.counters().await.consolidated, 1);
}

#[tokio::test]
async fn reinforce_reports_missing_atoms() {
    let m = Metronome::new(love_graph(), MetronomeConfig::default()).unwrap();
    m.reinforce("plain", 0.25).await.unwrap();
    let (weight, activations) = m
        .with_graph(|g| {
            let a = g.get("plain").unwrap();
            (a.weight(), a.activations())
        })
        .await;
    assert!((weight - 0.75).abs() < 1e-12);
    assert_eq!(activations, 1);

    let err = m.reinforce("ghost", 1.0).await.unwrap_err();
    assert!(matches!(err, Error::AtomNotFound(id) if id == "ghost"));
}

#[tokio::test]
async fn non_finite_input_cannot_wedge_the_ticks() {
    let m = Metronome::new(love_graph(), MetronomeConfig::default()).unwrap();

    let err = m.reinforce("plain", f64::NAN).await.unwrap_err();
    assert!(matches!(err, Error::NonFiniteWeight { id } if id == "plain"));
    assert!(m.reinforce("plain", f64::INFINITY).await.is_err());

    let rejected = m
        .with_graph(|g| {
            let now = chrono::Utc::now();
            g.add_atom(NewAtom::new("bad", "Bad").weight(f64::NAN), now).is_err()
                && !g.scale_weight("love", f64::INFINITY)
        })
        .await;
    assert!(rejected);

    for _ in 0..3 {
        m.tick_once().await.unwrap();
    }
    let counters = m.counters().await;
    assert_eq!(counters.cycles, 3);
    assert_eq!(counters.failed_cycles, 0);
}
