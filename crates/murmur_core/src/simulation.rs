//! Simulation context.
//!
//! [`Simulation`] owns every runtime component and is the only thing a host
//! ticks. One [`tick`](Simulation::tick) runs, in order:
//!
//! 1. the scheduler's batch of updaters (entity physics and custom tasks)
//! 2. the bounded transform apply pass, which shows pooled trail effects
//! 3. the pool sweep
//! 4. tick subscribers, then the periodic metrics report

use crate::clock::{RateLimiter, TickClock, TickRateMonitor};
use crate::config::SimConfig;
use crate::error::Result;
use crate::events::{Handler, SubscriptionToken, Subscriptions};
use crate::forces::{ForceSet, NeighborData};
use crate::grid::SpatialGrid;
use crate::host::EffectHost;
use crate::metrics::Metrics;
use crate::physics::{integrate, Motion, PhysicsParams, Swarm};
use crate::pool::{EffectPool, PoolStats};
use crate::scheduler::{Destructor, RoundRobinScheduler, Updater};
use crate::transforms::{StagedTransform, TransformQueue};
use murmur_data::{EffectKind, EntityId, ExternalId, ForceKind, Transform, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

/// Scheduler key: built-in entity physics or a host-registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TaskKey {
    Entity(EntityId),
    Custom(u64),
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKey::Entity(id) => write!(f, "entity:{id}"),
            TaskKey::Custom(key) => write!(f, "custom:{key}"),
        }
    }
}

/// Everything scheduler updaters may read and mutate.
pub struct SwarmState {
    pub swarm: Swarm,
    pub grid: SpatialGrid,
    pub forces: ForceSet,
    pub params: PhysicsParams,
    pub transforms: TransformQueue,
    candidates: Vec<usize>,
    neighbors: Vec<NeighborData>,
}

impl SwarmState {
    pub fn new(config: &SimConfig) -> Self {
        let swarm = &config.swarm;
        Self {
            swarm: Swarm::with_capacity(swarm.initial_entities),
            grid: SpatialGrid::new(swarm.cell_size),
            forces: ForceSet::from_config(&config.forces, swarm.perception_radius),
            params: PhysicsParams::new(swarm.max_speed, swarm.max_force),
            transforms: TransformQueue::new(),
            candidates: Vec::new(),
            neighbors: Vec::new(),
        }
    }

    /// One physics update for `id`: gather neighbors, fold forces, integrate,
    /// re-bucket and stage the resulting transform.
    pub fn step(&mut self, id: EntityId) -> Result<Motion> {
        let index = self.swarm.resolve(id)?;
        let radius = self.forces.max_perception_radius();
        self.swarm.gather_neighbors(
            index,
            &self.grid,
            radius,
            &mut self.candidates,
            &mut self.neighbors,
        );

        let position = self.swarm.position(index);
        let velocity = self.swarm.velocity(index);
        let total = self
            .forces
            .weighted_sum(index, position, velocity, &self.neighbors);
        let motion = integrate(position, velocity, total, &self.params);

        self.swarm.set_motion(index, motion, total);
        self.grid.update_one(index, self.swarm.positions());

        let speed_ratio = if self.params.max_speed > 0.0 {
            motion.velocity.magnitude() / self.params.max_speed
        } else {
            0.0
        };
        self.transforms.stage(
            index,
            StagedTransform {
                transform: Transform::from_motion(motion.position, motion.velocity),
                speed_ratio,
            },
        );
        Ok(motion)
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub now_ms: u64,
    pub updates: usize,
    pub update_failures: usize,
    pub transforms_applied: usize,
    pub effects_shown: usize,
    pub effects_failed: usize,
    pub effects_hidden: usize,
    pub effects_recycled: usize,
    pub effects_released: usize,
    pub pending_transforms: usize,
}

/// Point-in-time snapshot for dashboards and the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Telemetry {
    pub tick: u64,
    pub sim_time_ms: u64,
    pub entities: usize,
    pub scheduled: usize,
    pub pending_transforms: usize,
    pub performance_ratio: f64,
    pub max_speed: f32,
    pub max_force: f32,
    pub force_weights: BTreeMap<String, f32>,
    pub pool: PoolStats,
}

const METRICS_REPORT: &str = "metrics_report";

pub struct Simulation<H: EffectHost> {
    config: SimConfig,
    host: H,
    state: SwarmState,
    scheduler: RoundRobinScheduler<TaskKey, SwarmState>,
    pool: EffectPool,
    clock: TickClock,
    events: Subscriptions<TickReport>,
    limiter: RateLimiter<&'static str>,
    monitor: TickRateMonitor,
    metrics: Metrics,
    rng: ChaCha8Rng,
}

impl<H: EffectHost> Simulation<H> {
    /// Validates `config`, then builds the runtime and spawns the initial swarm.
    pub fn new(config: SimConfig, host: H) -> anyhow::Result<Self> {
        config.validate()?;
        let rng = match config.swarm.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut sim = Self {
            state: SwarmState::new(&config),
            scheduler: RoundRobinScheduler::new(config.scheduler.entity_budget),
            pool: EffectPool::new(
                config.pool.capacity,
                config.pool.grace_ms,
                config.pool.recycle_expired,
            ),
            clock: TickClock::new(config.telemetry.tick_rate),
            events: Subscriptions::new(),
            limiter: RateLimiter::new(),
            monitor: TickRateMonitor::new(config.telemetry.tick_rate),
            metrics: Metrics::new(),
            rng,
            host,
            config,
        };
        sim.seed_swarm();
        tracing::info!(
            entities = sim.state.swarm.len(),
            fingerprint = %sim.config.fingerprint(),
            "Simulation initialized"
        );
        Ok(sim)
    }

    /// Lays the initial entities out in rows with small random velocities.
    fn seed_swarm(&mut self) {
        let swarm = self.config.swarm.clone();
        let origin = Vec3::from(swarm.origin);
        for i in 0..swarm.initial_entities {
            let col = (i % swarm.row_length) as f32;
            let row = (i / swarm.row_length) as f32;
            let position = origin + Vec3::new(col * swarm.spacing, row * swarm.spacing, 0.0);
            let velocity = Vec3::new(
                self.rng.gen::<f32>() - 0.5,
                self.rng.gen::<f32>() - 0.5,
                self.rng.gen::<f32>() - 0.5,
            ) * swarm.initial_speed_spread;
            self.spawn_entity(position, velocity);
        }
    }

    /// Adds an entity and schedules its physics updater.
    pub fn spawn_entity(&mut self, position: Vec3, velocity: Vec3) -> EntityId {
        let id = self.state.swarm.spawn(position, velocity);
        let index = id.slot();
        self.state.grid.update_one(index, self.state.swarm.positions());

        let interval = self.config.transforms.min_interval_ticks;
        let offset = if interval > 0 {
            self.clock
                .current()
                .saturating_sub(self.rng.gen_range(0..interval))
        } else {
            self.clock.current()
        };
        self.state.transforms.track(index, offset);

        self.scheduler.set(
            TaskKey::Entity(id),
            Box::new(move |state: &mut SwarmState| -> anyhow::Result<()> {
                state.step(id)?;
                Ok(())
            }),
            None,
        );
        tracing::debug!(entity = %id, "Entity spawned");
        id
    }

    /// Unschedules the entity and frees its slot.
    pub fn despawn_entity(&mut self, id: EntityId) -> Result<()> {
        let index = self.state.swarm.resolve(id)?;
        self.scheduler.delete(&TaskKey::Entity(id));
        self.state.grid.remove(index);
        self.state.transforms.forget(index);
        self.state.swarm.despawn(id)?;
        tracing::debug!(entity = %id, "Entity despawned");
        Ok(())
    }

    /// Schedules a host task. Re-registering a key runs the previous destructor.
    pub fn register(
        &mut self,
        key: u64,
        updater: Updater<SwarmState>,
        destructor: Option<Destructor>,
    ) {
        self.scheduler.set(TaskKey::Custom(key), updater, destructor);
    }

    /// Runs the task's destructor and removes it. Returns whether it existed.
    pub fn unregister(&mut self, key: u64) -> bool {
        self.scheduler.delete(&TaskKey::Custom(key))
    }

    pub fn tick(&mut self) -> TickReport {
        let started = Instant::now();
        let tick = self.clock.advance();
        self.monitor.record(started);
        let now_ms = self.clock.now_ms();

        let batch = self.scheduler.update_with(&mut self.state);
        let (transforms_applied, effects_shown, effects_failed) = self.apply_transforms(tick, now_ms);
        let sweep = self.pool.sweep(&mut self.host, now_ms);

        let report = TickReport {
            tick,
            now_ms,
            updates: batch.visited,
            update_failures: batch.failed,
            transforms_applied,
            effects_shown,
            effects_failed,
            effects_hidden: sweep.hidden,
            effects_recycled: sweep.recycled,
            effects_released: sweep.released,
            pending_transforms: self.state.transforms.pending_count(),
        };

        let store = self.metrics.store_mut();
        store.record("physics_updates", report.updates as f64);
        store.record("transforms_applied", report.transforms_applied as f64);
        store.record("pending_transforms", report.pending_transforms as f64);
        store.record("pool_live", self.pool.live_count() as f64);
        store.record("pool_free", self.pool.free_count() as f64);
        store.record("performance_ratio", self.monitor.ratio());
        if report.effects_failed > 0 {
            store.accumulate_periodic("effects_failed", report.effects_failed as f64);
        }
        self.metrics
            .record_tick(started.elapsed(), self.state.swarm.len());

        self.events.dispatch(&report);

        if self
            .limiter
            .ready(METRICS_REPORT, self.config.telemetry.report_interval_ticks, tick)
        {
            self.metrics.report();
        }
        report
    }

    /// Turns due staged transforms into pooled trail effects.
    fn apply_transforms(&mut self, tick: u64, now_ms: u64) -> (usize, usize, usize) {
        let Self {
            config,
            host,
            state,
            pool,
            rng,
            ..
        } = self;
        let ttl_base = config.transforms.effect_ttl_ms;
        let jitter = config.transforms.effect_ttl_jitter_ms;
        let mut shown = 0;
        let mut failed = 0;

        let applied = state.transforms.apply(
            tick,
            config.transforms.budget,
            config.transforms.min_interval_ticks,
            |slot, staged| {
                let ttl = if jitter > 0 {
                    ttl_base + rng.gen_range(0..jitter)
                } else {
                    ttl_base
                };
                let kind = EffectKind::for_speed_ratio(staged.speed_ratio);
                let Transform { position, rotation } = staged.transform;
                match pool.acquire(&mut *host, kind, position, rotation, ttl, now_ms) {
                    Ok(_) => shown += 1,
                    Err(err) => {
                        failed += 1;
                        tracing::debug!(slot, %kind, error = %err, "Trail effect not shown");
                    }
                }
            },
        );
        (applied, shown, failed)
    }

    pub fn adjust_force_weight(&mut self, kind: ForceKind, delta: f32) -> Result<f32> {
        let weight = self.state.forces.adjust_weight(kind, delta)?;
        self.log_weights();
        Ok(weight)
    }

    /// [`adjust_force_weight`](Self::adjust_force_weight) by force name.
    pub fn adjust_force_weight_by_name(&mut self, name: &str, delta: f32) -> Result<f32> {
        let kind: ForceKind = name.parse()?;
        self.adjust_force_weight(kind, delta)
    }

    pub fn set_force_enabled(&mut self, kind: ForceKind, enabled: bool) -> Result<()> {
        self.state.forces.set_enabled(kind, enabled)?;
        self.log_weights();
        Ok(())
    }

    pub fn adjust_max_speed(&mut self, delta: f32) -> f32 {
        let value = self.state.params.adjust_max_speed(delta);
        self.log_weights();
        value
    }

    pub fn adjust_max_force(&mut self, delta: f32) -> f32 {
        let value = self.state.params.adjust_max_force(delta);
        self.log_weights();
        value
    }

    pub fn set_attractor_target(&mut self, target: Vec3) -> Result<()> {
        self.state.forces.set_attractor_target(target)?;
        tracing::debug!(x = target.x, y = target.y, z = target.z, "Attractor moved");
        Ok(())
    }

    fn log_weights(&self) {
        tracing::info!(
            weights = %self.state.forces.describe(),
            max_force = self.state.params.max_force,
            max_speed = self.state.params.max_speed,
            "Force weights"
        );
    }

    /// Shows a one-off effect through the pool.
    pub fn acquire_effect(
        &mut self,
        kind: EffectKind,
        position: Vec3,
        rotation: Vec3,
        ttl_ms: u64,
    ) -> Result<ExternalId> {
        let now_ms = self.clock.now_ms();
        let id = self
            .pool
            .acquire(&mut self.host, kind, position, rotation, ttl_ms, now_ms)?;
        Ok(id)
    }

    pub fn release_effect(&mut self, id: ExternalId) -> Result<()> {
        self.pool.release(&mut self.host, id)?;
        Ok(())
    }

    pub fn subscribe_tick(&mut self, handler: Handler<TickReport>) -> SubscriptionToken {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.events.unsubscribe(token)
    }

    pub fn telemetry(&self) -> Telemetry {
        let force_weights = ForceKind::ALL
            .into_iter()
            .filter_map(|kind| {
                self.state
                    .forces
                    .get(kind)
                    .map(|f| (kind.to_string(), f.weight()))
            })
            .collect();
        Telemetry {
            tick: self.clock.current(),
            sim_time_ms: self.clock.now_ms(),
            entities: self.state.swarm.len(),
            scheduled: self.scheduler.len(),
            pending_transforms: self.state.transforms.pending_count(),
            performance_ratio: self.monitor.ratio(),
            max_speed: self.state.params.max_speed,
            max_force: self.state.params.max_force,
            force_weights,
            pool: self.pool.stats(),
        }
    }

    /// Runs every destructor, drops subscribers and destroys all pooled effects.
    ///
    /// Returns the number of host objects destroyed.
    pub fn shutdown(&mut self) -> usize {
        self.scheduler.clear();
        self.events.clear();
        let destroyed = self.pool.drain(&mut self.host);
        tracing::info!(
            ticks = self.clock.current(),
            destroyed = destroyed,
            "Simulation shut down"
        );
        destroyed
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &SwarmState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn pool(&self) -> &EffectPool {
        &self.pool
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    pub fn scheduler(&self) -> &RoundRobinScheduler<TaskKey, SwarmState> {
        &self.scheduler
    }
}
