//! Metronome - the periodic driver
//!
//! One scheduler task multiplexes three intervals with `select!`:
//! - tick: decay → excitation → rules → counters
//! - introspection: stats and strongest atoms to the log
//! - optimization: prune weak edges and idle atoms
//!
//! The graph, counters and queued query share a single mutex, so the loops
//! and every inspection call are serialized. Stopping cancels the scheduler
//! between ticks; a tick already running always completes.

use crate::config::MetronomeConfig;
use crate::counters::RollingCounters;
use crate::rules::{LogicRules, RuleReport};
use chrono::{DateTime, Utc};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use synaptic_core::{AtomId, Error, Result};
use synaptic_graph::{
    consolidation_need, forget_probability, recall, AtomGraph, DecayPass, DecayReport,
    ExcitationPass, ExcitationReport, GraphSnapshot, GraphStats, KeywordMatcher,
    OptimizeReport, Recalled, TagMatcher, WeightTable,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Atoms listed in an introspection report.
const INTROSPECTION_TOP: usize = 5;
/// Forget probability above which an atom is reported at risk.
const AT_RISK_PROBABILITY: f64 = 0.5;

/// Everything one cycle did.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub decay: DecayReport,
    pub excitation: ExcitationReport,
    pub rules: RuleReport,
    /// Atoms at or above the consolidation threshold after the cycle.
    pub consolidated: usize,
}

#[derive(Debug, Clone)]
pub struct IntrospectionReport {
    pub stats: GraphStats,
    pub counters: RollingCounters,
    /// Strongest atoms by overall strength.
    pub strongest: Vec<(AtomId, f64)>,
    /// Atoms whose forget probability exceeds 0.5, most fragile first.
    pub at_risk: Vec<(AtomId, f64)>,
    /// Unpromoted atoms ranked by consolidation need.
    pub consolidation_queue: Vec<(AtomId, f64)>,
}

/// The three passes of a cycle, with no timing or locking.
pub struct Engine {
    decay: DecayPass,
    excitation: ExcitationPass,
    rules: LogicRules,
    consolidation_threshold: f64,
}

impl Engine {
    pub fn from_config(config: &MetronomeConfig) -> Self {
        Self::with_matcher(config, Box::new(KeywordMatcher::standard()))
    }

    pub fn with_matcher(config: &MetronomeConfig, matcher: Box<dyn TagMatcher>) -> Self {
        Self {
            decay: DecayPass::new(config.decay.clone(), WeightTable::standard()),
            excitation: ExcitationPass::new(config.excitation.clone(), matcher),
            rules: LogicRules::new(config.rules.clone()),
            consolidation_threshold: config.counters.consolidation_threshold,
        }
    }

    pub fn matcher(&self) -> &dyn TagMatcher {
        self.excitation.matcher()
    }

    /// Run one full cycle against `graph`. Fails if any weight ends up non-finite.
    pub fn cycle(&self, graph: &mut AtomGraph, query: Option<&str>, now: DateTime<Utc>) -> Result<CycleReport> {
        let report = self.passes(graph, query, now);
        graph.check_integrity()?;
        Ok(report)
    }

    /// The three passes without the integrity check. Changes stay applied
    /// whatever the check later finds.
    pub fn passes(&self, graph: &mut AtomGraph, query: Option<&str>, now: DateTime<Utc>) -> CycleReport {
        let decay = self.decay.run(graph, now);
        let excitation = self.excitation.run(graph, query, now);
        let rules = self.rules.apply(graph);

        let consolidated = graph
            .atoms()
            .filter(|a| a.weight() >= self.consolidation_threshold)
            .count();
        CycleReport {
            decay,
            excitation,
            rules,
            consolidated,
        }
    }
}

struct State {
    graph: AtomGraph,
    counters: RollingCounters,
    pending_query: Option<String>,
}

struct Shared {
    state: Mutex<State>,
    engine: Engine,
    config: MetronomeConfig,
}

struct Runner {
    run_id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct Metronome {
    shared: Arc<Shared>,
    runner: Option<Runner>,
}

impl Metronome {
    /// Build a stopped metronome around `graph`. Counters start at zero.
    pub fn new(graph: AtomGraph, config: MetronomeConfig) -> Result<Self> {
        let engine = Engine::from_config(&config);
        Self::with_engine(graph, config, engine)
    }

    pub fn with_engine(graph: AtomGraph, config: MetronomeConfig, engine: Engine) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    graph,
                    counters: RollingCounters::default(),
                    pending_query: None,
                }),
                engine,
                config,
            }),
            runner: None,
        })
    }

    pub fn config(&self) -> &MetronomeConfig {
        &self.shared.config
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_some()
    }

    /// Spawn the scheduler. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        if self.runner.is_some() {
            return false;
        }
        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(schedule(self.shared.clone(), cancel.clone()));
        info!(
            "Metronome {} started (tick {}ms, introspection {}ms, optimize {}ms)",
            run_id,
            self.shared.config.timing.tick_ms,
            self.shared.config.timing.introspection_ms,
            self.shared.config.timing.optimize_ms
        );
        self.runner = Some(Runner { run_id, cancel, handle });
        true
    }

    /// Stop the scheduler and return the cumulative counters.
    /// Returns `None` if not running.
    pub async fn stop(&mut self) -> Option<RollingCounters> {
        let runner = self.runner.take()?;
        runner.cancel.cancel();
        if let Err(e) = runner.handle.await {
            warn!("Metronome {} scheduler ended abnormally: {}", runner.run_id, e);
        }
        let counters = self.counters().await;
        info!(
            "Metronome {} stopped: {} cycles ({} failed), avg {:.3}ms, {} removed, {} promoted",
            runner.run_id,
            counters.cycles,
            counters.failed_cycles,
            counters.ema_cycle_ms,
            counters.total_removed,
            counters.total_promoted
        );
        Some(counters)
    }

    /// Stop if running and hand back the graph.
    pub async fn dispose(mut self) -> AtomGraph {
        self.stop().await;
        let mut state = self.shared.state.lock().await;
        std::mem::take(&mut state.graph)
    }

    /// Run one cycle now, outside the schedule. Consumes the queued query.
    pub async fn tick_once(&self) -> Result<CycleReport> {
        run_cycle(&self.shared).await
    }

    /// Queue a query for the next cycle's excitation pass.
    pub async fn set_query(&self, query: impl Into<String>) {
        self.shared.state.lock().await.pending_query = Some(query.into());
    }

    pub async fn counters(&self) -> RollingCounters {
        self.shared.state.lock().await.counters.clone()
    }

    pub async fn stats(&self) -> GraphStats {
        self.shared.state.lock().await.graph.stats().clone()
    }

    pub async fn snapshot(&self) -> GraphSnapshot {
        self.shared.state.lock().await.graph.export(Utc::now())
    }

    /// Spreading-activation recall; returned atoms count as activated.
    pub async fn recall(&self, query: &str) -> Vec<Recalled> {
        let mut state = self.shared.state.lock().await;
        recall(
            &mut state.graph,
            self.shared.engine.matcher(),
            query,
            &self.shared.config.recall,
            Utc::now(),
        )
    }

    /// Add `amount` to an atom's weight and count an activation.
    /// Fails with `AtomNotFound` for unknown ids and `NonFiniteWeight` when
    /// the resulting weight would be NaN or infinite.
    pub async fn reinforce(&self, id: &str, amount: f64) -> Result<()> {
        let mut state = self.shared.state.lock().await;
        if !state.graph.contains(id) {
            return Err(Error::AtomNotFound(id.to_string()));
        }
        if state.graph.reinforce(id, amount, Utc::now()) {
            Ok(())
        } else {
            Err(Error::non_finite(id))
        }
    }

    /// Run `f` with exclusive access to the graph.
    pub async fn with_graph<R>(&self, f: impl FnOnce(&mut AtomGraph) -> R) -> R {
        let mut state = self.shared.state.lock().await;
        f(&mut state.graph)
    }

    pub async fn introspect(&self) -> IntrospectionReport {
        introspect(&self.shared).await
    }

    pub async fn auto_optimize(&self) -> OptimizeReport {
        self.shared.state.lock().await.graph.optimize()
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        if let Some(runner) = &self.runner {
            runner.cancel.cancel();
        }
    }
}

// ============================================================
// Loops
// ============================================================

async fn schedule(shared: Arc<Shared>, cancel: CancellationToken) {
    let config = &shared.config;
    let start = Instant::now();

    let mut tick = interval_at(start + config.tick_interval(), config.tick_interval());
    let mut introspection = interval_at(start + config.introspection_interval(), config.introspection_interval());
    let mut optimization = interval_at(start + config.optimize_interval(), config.optimize_interval());
    for interval in [&mut tick, &mut introspection, &mut optimization] {
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tick.tick() => {
                if let Err(e) = run_cycle(&shared).await {
                    error!("Cycle failed: {}", e);
                }
            }
            _ = introspection.tick() => {
                let report = introspect(&shared).await;
                shared.state.lock().await.counters.introspections += 1;
                info!(
                    "Introspection: {} atoms, {} edges, mean weight {:.3}, {} promotable, {} at risk, strongest {:?}",
                    report.stats.atoms,
                    report.stats.edges,
                    report.stats.mean_weight,
                    report.stats.promotable,
                    report.at_risk.len(),
                    report.strongest.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>()
                );
            }
            _ = optimization.tick() => {
                let mut state = shared.state.lock().await;
                let report = state.graph.optimize();
                state.counters.optimizations += 1;
                debug!("Auto-optimize: -{} edges, -{} atoms", report.edges_removed, report.atoms_removed.len());
            }
        }
    }
}

async fn run_cycle(shared: &Shared) -> Result<CycleReport> {
    let mut state = shared.state.lock().await;
    let state = &mut *state;
    let query = state.pending_query.take();
    let started = std::time::Instant::now();

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        shared.engine.passes(&mut state.graph, query.as_deref(), Utc::now())
    }));
    let cycle_ms = started.elapsed().as_secs_f64() * 1_000.0;

    let report = match outcome {
        Ok(report) => report,
        Err(panic) => {
            state.counters.record_failure(0, 0);
            return Err(Error::Internal(panic_message(panic.as_ref())));
        }
    };

    // failed ticks are not rolled back; their removals and promotions count
    if let Err(e) = state.graph.check_integrity() {
        state
            .counters
            .record_failure(report.decay.removed.len(), report.decay.promoted.len());
        let purged = state.graph.purge_non_finite();
        warn!("Dropped {} atoms with non-finite weight: {:?}", purged.len(), purged);
        return Err(e);
    }

    state.counters.record(
        shared.config.counters.ema_alpha,
        cycle_ms,
        report.consolidated,
        report.decay.removed.len(),
        report.decay.promoted.len(),
    );
    info!(
        "Cycle {}: {} decayed, -{} removed, +{} promoted, {} excited, {} rewarded, {} penalized, {} consolidated ({:.3}ms)",
        state.counters.cycles,
        report.decay.decayed,
        report.decay.removed.len(),
        report.decay.promoted.len(),
        report.excitation.boosted.len(),
        report.rules.rewarded.len(),
        report.rules.penalized.len(),
        report.consolidated,
        cycle_ms
    );
    Ok(report)
}

async fn introspect(shared: &Shared) -> IntrospectionReport {
    let state = shared.state.lock().await;
    let graph = &state.graph;
    let now = Utc::now();

    let strongest = graph
        .top_n(INTROSPECTION_TOP)
        .into_iter()
        .map(|a| (a.id().clone(), a.overall_strength()))
        .collect();

    let mut at_risk: Vec<(AtomId, f64)> = graph
        .atoms()
        .map(|a| (a.id().clone(), forget_probability(a, now)))
        .filter(|(_, p)| *p > AT_RISK_PROBABILITY)
        .collect();
    at_risk.sort_by(|a, b| b.1.total_cmp(&a.1));
    at_risk.truncate(INTROSPECTION_TOP);

    let mut consolidation_queue: Vec<(AtomId, f64)> = graph
        .atoms()
        .filter(|a| !a.is_promoted())
        .map(|a| (a.id().clone(), consolidation_need(a, now)))
        .collect();
    consolidation_queue.sort_by(|a, b| b.1.total_cmp(&a.1));
    consolidation_queue.truncate(INTROSPECTION_TOP);

    IntrospectionReport {
        stats: graph.stats().clone(),
        counters: state.counters.clone(),
        strongest,
        at_risk,
        consolidation_queue,
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("cycle panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("cycle panicked: {}", s)
    } else {
        "cycle panicked".to_string()
    }
}
