//! Headless runs against the in-memory host.

use murmur_core::config::SimConfig;
use murmur_core::host::{HostCalls, RecordingHost};
use murmur_core::{Simulation, Telemetry, TickReport};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdjustmentError {
    #[error("Expected NAME=DELTA, got '{0}'")]
    MissingSeparator(String),
    #[error("Invalid delta '{0}'")]
    InvalidDelta(String),
}

/// A live tuning step, written `separation=+1.5`, `max_speed=-0.1` or `max_force=0.005`.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub name: String,
    pub delta: f32,
}

impl FromStr for Adjustment {
    type Err = AdjustmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, delta) = s
            .split_once('=')
            .ok_or_else(|| AdjustmentError::MissingSeparator(s.to_string()))?;
        let delta = delta
            .trim()
            .parse::<f32>()
            .map_err(|_| AdjustmentError::InvalidDelta(delta.to_string()))?;
        Ok(Self {
            name: name.trim().to_string(),
            delta,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub ticks: u64,
    pub seed: Option<u64>,
    pub entities: Option<usize>,
    /// Applied once, before the first tick.
    pub adjustments: Vec<Adjustment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub total_updates: usize,
    pub update_failures: usize,
    pub effects_shown: usize,
    pub effects_failed: usize,
    pub peak_pending_transforms: usize,
    pub destroyed_on_shutdown: usize,
    pub telemetry: Telemetry,
    pub host_calls: HostCalls,
    pub metrics: serde_json::Value,
}

#[derive(Debug, Default)]
struct Totals {
    updates: usize,
    failures: usize,
    shown: usize,
    failed: usize,
    peak_pending: usize,
}

impl Totals {
    fn add(&mut self, report: &TickReport) {
        self.updates += report.updates;
        self.failures += report.update_failures;
        self.shown += report.effects_shown;
        self.failed += report.effects_failed;
        self.peak_pending = self.peak_pending.max(report.pending_transforms);
    }
}

fn apply_adjustment(
    sim: &mut Simulation<RecordingHost>,
    adjustment: &Adjustment,
) -> anyhow::Result<()> {
    match adjustment.name.to_ascii_lowercase().as_str() {
        "max_speed" => {
            sim.adjust_max_speed(adjustment.delta);
        }
        "max_force" => {
            sim.adjust_max_force(adjustment.delta);
        }
        name => {
            sim.adjust_force_weight_by_name(name, adjustment.delta)?;
        }
    }
    Ok(())
}

/// Runs `options.ticks` ticks and shuts the simulation down.
pub fn run(mut config: SimConfig, options: &RunOptions) -> anyhow::Result<RunSummary> {
    if let Some(seed) = options.seed {
        config.swarm.seed = Some(seed);
    }
    if let Some(entities) = options.entities {
        config.swarm.initial_entities = entities;
    }

    let mut sim = Simulation::new(config, RecordingHost::new())?;
    for adjustment in &options.adjustments {
        apply_adjustment(&mut sim, adjustment)?;
    }

    let totals = Rc::new(RefCell::new(Totals::default()));
    let sink = Rc::clone(&totals);
    let token = sim.subscribe_tick(Box::new(move |report: &TickReport| {
        sink.borrow_mut().add(report);
        Ok(())
    }));

    for _ in 0..options.ticks {
        sim.tick();
    }
    sim.unsubscribe(token);

    let telemetry = sim.telemetry();
    let metrics = sim.metrics().store().to_json();
    let destroyed = sim.shutdown();
    let host_calls = sim.host().calls();
    let totals = totals.borrow();

    tracing::info!(
        ticks = options.ticks,
        entities = telemetry.entities,
        shown = totals.shown,
        "Run finished"
    );

    Ok(RunSummary {
        ticks: options.ticks,
        total_updates: totals.updates,
        update_failures: totals.failures,
        effects_shown: totals.shown,
        effects_failed: totals.failed,
        peak_pending_transforms: totals.peak_pending,
        destroyed_on_shutdown: destroyed,
        telemetry,
        host_calls,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_adjustment() {
        let a: Adjustment = "separation=+1.5".parse().unwrap();
        assert_eq!(a.name, "separation");
        assert_eq!(a.delta, 1.5);
        assert_eq!(
            "separation".parse::<Adjustment>(),
            Err(AdjustmentError::MissingSeparator("separation".into()))
        );
        assert!(matches!(
            "cohesion=lots".parse::<Adjustment>(),
            Err(AdjustmentError::InvalidDelta(_))
        ));
    }

    #[test]
    fn test_run_is_reproducible() {
        let options = RunOptions {
            ticks: 20,
            seed: Some(3),
            entities: Some(30),
            adjustments: Vec::new(),
        };
        let a = run(SimConfig::default(), &options).unwrap();
        let b = run(SimConfig::default(), &options).unwrap();
        assert_eq!(a.effects_shown, b.effects_shown);
        assert_eq!(a.telemetry.pool, b.telemetry.pool);
        assert_eq!(a.total_updates, 20 * 30);
    }

    #[test]
    fn test_shutdown_destroys_everything_spawned() {
        let options = RunOptions {
            ticks: 10,
            seed: Some(1),
            entities: Some(10),
            adjustments: Vec::new(),
        };
        let summary = run(SimConfig::default(), &options).unwrap();
        assert_eq!(summary.host_calls.spawn, summary.host_calls.destroy);
        assert_eq!(summary.destroyed_on_shutdown, summary.telemetry.pool.live);
    }

    #[test]
    fn test_adjustments_apply_before_first_tick() {
        let options = RunOptions {
            ticks: 1,
            seed: Some(1),
            entities: Some(0),
            adjustments: vec!["cohesion=0.25".parse().unwrap(), "max_speed=-0.1".parse().unwrap()],
        };
        let summary = run(SimConfig::default(), &options).unwrap();
        assert_eq!(summary.telemetry.force_weights["Cohesion"], 0.25);
        assert!((summary.telemetry.max_speed - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_adjustment_fails() {
        let options = RunOptions {
            ticks: 1,
            seed: Some(1),
            entities: Some(0),
            adjustments: vec!["gravity=1".parse().unwrap()],
        };
        assert!(run(SimConfig::default(), &options).is_err());
    }
}
