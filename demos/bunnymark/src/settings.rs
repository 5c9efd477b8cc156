//! Demo settings and resource slots.

use std::fs;
use std::path::Path;

use anyhow::Context;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Tunables for the bunnymark run, optionally loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bunnies queued per spawn wave.
    pub amount: usize,
    /// Ticks between spawn waves.
    pub wave_interval: u64,
    /// Ticks between metrics reports.
    pub metrics_interval: u64,
    /// Total ticks to run.
    pub ticks: u64,
    /// Canvas width in character cells.
    pub width: u32,
    /// Canvas height in character cells.
    pub height: u32,
    /// Vary glyphs by hue when drawing.
    pub colorful: bool,
    /// Seed for the velocity jitter.
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            amount: 100,
            wave_interval: 60,
            metrics_interval: 120,
            ticks: 600,
            width: 80,
            height: 24,
            colorful: false,
            seed: 42,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("parsing settings file {}", path.display()))?;
        Ok(settings)
    }
}

/// Running counters updated by the metrics system.
#[derive(Debug, Clone, Copy, Default)]
pub struct Metrics {
    /// Highest entity count observed so far.
    pub peak_entities: usize,
    /// Number of spawn waves queued so far.
    pub waves: u64,
}

/// The demo's typed resource slots, shared by every system.
#[derive(Debug)]
pub struct DemoResources {
    /// Run configuration.
    pub settings: Settings,
    /// Metrics counters.
    pub metrics: Metrics,
    /// Deterministic random source for velocity jitter.
    pub rng: StdRng,
}

impl DemoResources {
    /// Build the resource slots from loaded settings.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let rng = StdRng::seed_from_u64(settings.seed);
        Self {
            settings,
            metrics: Metrics::default(),
            rng,
        }
    }
}
