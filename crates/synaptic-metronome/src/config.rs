//! Metronome configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use synaptic_core::{Error, Result};
use synaptic_graph::{DecayConfig, ExcitationConfig, RecallConfig};

/// Top-level metronome configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    /// Loop intervals.
    pub timing: TimingConfig,
    /// Removal floor and promotion threshold.
    pub decay: DecayConfig,
    /// Spontaneous excitation breadth.
    pub excitation: ExcitationConfig,
    /// Post-decay reward/penalty multipliers.
    pub rules: RulesConfig,
    /// Rolling counter parameters.
    pub counters: CountersConfig,
    /// Spreading-activation recall.
    pub recall: RecallConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Main tick interval in milliseconds.
    pub tick_ms: u64,
    /// Introspection log interval in milliseconds.
    pub introspection_ms: u64,
    /// Auto-optimization interval in milliseconds.
    pub optimize_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Weight multiplier for atoms carrying an altruistic tag.
    pub altruistic_weight_boost: f64,
    /// Decay-rate multiplier for atoms carrying an altruistic tag.
    pub altruistic_decay_factor: f64,
    /// Decay-rate multiplier for atoms carrying a negative tag.
    pub negative_decay_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CountersConfig {
    /// Atoms at or above this weight count as consolidated.
    pub consolidation_threshold: f64,
    /// Smoothing factor of the cycle-duration EMA (0.0 - 1.0].
    pub ema_alpha: f64,
}

// ============================================================
// Defaults
// ============================================================

impl Default for TimingConfig {
    fn default() -> Self {
        Self { tick_ms: 1_000, introspection_ms: 30_000, optimize_ms: 60_000 }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self { altruistic_weight_boost: 1.2, altruistic_decay_factor: 0.8, negative_decay_factor: 1.5 }
    }
}

impl Default for CountersConfig {
    fn default() -> Self {
        Self { consolidation_threshold: 0.7, ema_alpha: 0.1 }
    }
}

// ============================================================
// Loading
// ============================================================

impl MetronomeConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {} - using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Reject values the loops cannot run with.
    pub fn validate(&self) -> Result<()> {
        let t = &self.timing;
        if t.tick_ms == 0 || t.introspection_ms == 0 || t.optimize_ms == 0 {
            return Err(Error::ConfigError("timing intervals must be non-zero".into()));
        }
        let alpha = self.counters.ema_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::ConfigError(format!("ema_alpha {} outside (0, 1]", alpha)));
        }
        let r = &self.rules;
        for (name, value) in [
            ("altruistic_weight_boost", r.altruistic_weight_boost),
            ("altruistic_decay_factor", r.altruistic_decay_factor),
            ("negative_decay_factor", r.negative_decay_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::ConfigError(format!("rules.{} must be a non-negative number", name)));
            }
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.timing.tick_ms)
    }

    pub fn introspection_interval(&self) -> Duration {
        Duration::from_millis(self.timing.introspection_ms)
    }

    pub fn optimize_interval(&self) -> Duration {
        Duration::from_millis(self.timing.optimize_ms)
    }
}
