//! Bounded-capacity effect pool.
//!
//! Handles move through three states:
//!
//! 1. **live**: visible until `disables_at`
//! 2. **hidden**: still live and still counted until `expires_at`
//! 3. **free**: parked on its kind's free-list for reuse, or destroyed
//!
//! `live + free` never exceeds the capacity. All times are simulated
//! milliseconds supplied by the caller.

use crate::error::PoolError;
use crate::host::EffectHost;
use murmur_data::{EffectKind, ExternalId, Vec3};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Bookkeeping for one host effect object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PooledEffect {
    pub kind: EffectKind,
    pub external_id: ExternalId,
    pub position: Vec3,
    pub disables_at: u64,
    pub expires_at: u64,
    pub hidden: bool,
}

/// Counters since the pool was created, plus the current occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub live: usize,
    pub free: usize,
    pub spawned: u64,
    pub reused: u64,
    pub evicted: u64,
    pub saturated: u64,
    pub stale: u64,
    pub recycled: u64,
    pub released: u64,
    pub hidden: u64,
}

/// What one [`EffectPool::sweep`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub hidden: usize,
    pub recycled: usize,
    pub released: usize,
    pub stale: usize,
}

#[derive(Debug)]
pub struct EffectPool {
    capacity: usize,
    grace_ms: u64,
    recycle_expired: bool,
    live: Vec<PooledEffect>,
    free: BTreeMap<EffectKind, VecDeque<PooledEffect>>,
    free_count: usize,
    stats: PoolStats,
}

impl EffectPool {
    pub fn new(capacity: usize, grace_ms: u64, recycle_expired: bool) -> Self {
        Self {
            capacity,
            grace_ms,
            recycle_expired,
            live: Vec::new(),
            free: BTreeMap::new(),
            free_count: 0,
            stats: PoolStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn free_count(&self) -> usize {
        self.free_count
    }

    /// Free handles parked for `kind`.
    pub fn free_count_of(&self, kind: EffectKind) -> usize {
        self.free.get(&kind).map_or(0, VecDeque::len)
    }

    pub fn occupied(&self) -> usize {
        self.live.len() + self.free_count
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            live: self.live.len(),
            free: self.free_count,
            ..self.stats
        }
    }

    /// Live handle by host id.
    pub fn get(&self, id: ExternalId) -> Option<&PooledEffect> {
        self.live.iter().find(|e| e.external_id == id)
    }

    pub fn live(&self) -> &[PooledEffect] {
        &self.live
    }

    /// Shows an effect of `kind` at `position` for `ttl_ms`.
    ///
    /// Tries, in order: reuse a free handle of the same kind, evict any free
    /// handle if the pool is full, spawn a new object.
    pub fn acquire<H: EffectHost>(
        &mut self,
        host: &mut H,
        kind: EffectKind,
        position: Vec3,
        rotation: Vec3,
        ttl_ms: u64,
        now_ms: u64,
    ) -> Result<ExternalId, PoolError> {
        let disables_at = now_ms.saturating_add(ttl_ms);
        let expires_at = disables_at.saturating_add(self.grace_ms);

        if let Some(mut effect) = self.pop_free(kind) {
            let id = effect.external_id;
            let reshown = host.is_valid(id)
                && host.set_visible(id, true).is_ok()
                && host.move_to(id, position, rotation).is_ok();
            if reshown {
                effect.position = position;
                effect.disables_at = disables_at;
                effect.expires_at = expires_at;
                effect.hidden = false;
                self.live.push(effect);
                self.stats.reused += 1;
                self.check_capacity();
                return Ok(id);
            }
            self.stats.stale += 1;
            tracing::warn!(%kind, id = %id, "Discarding stale free-list handle");
        }

        if self.occupied() >= self.capacity {
            self.evict_one(host);
        }
        if self.occupied() >= self.capacity {
            self.stats.saturated += 1;
            tracing::warn!(%kind, capacity = self.capacity, "Effect pool saturated");
            return Err(PoolError::Saturated {
                capacity: self.capacity,
            });
        }

        let id = host.spawn(kind, position, rotation)?;
        self.live.push(PooledEffect {
            kind,
            external_id: id,
            position,
            disables_at,
            expires_at,
            hidden: false,
        });
        self.stats.spawned += 1;
        self.check_capacity();
        Ok(id)
    }

    /// Hides handles past `disables_at` and retires handles past `expires_at`.
    ///
    /// An expired handle is parked on its kind's free-list while the live count
    /// taken before the sweep plus the free count stays below capacity, and is
    /// destroyed otherwise. A pool swept at capacity releases what expires.
    pub fn sweep<H: EffectHost>(&mut self, host: &mut H, now_ms: u64) -> SweepReport {
        let mut report = SweepReport::default();
        let current = std::mem::take(&mut self.live);
        let live_before = current.len();
        let mut kept = Vec::with_capacity(live_before);

        for mut effect in current {
            let id = effect.external_id;
            if !host.is_valid(id) {
                report.stale += 1;
                tracing::warn!(kind = %effect.kind, id = %id, "Dropping stale live handle");
                continue;
            }
            if now_ms > effect.disables_at && !effect.hidden {
                if let Err(err) = host.set_visible(id, false) {
                    tracing::warn!(id = %id, error = %err, "Failed to hide effect");
                }
                effect.hidden = true;
                report.hidden += 1;
            }
            if now_ms <= effect.expires_at {
                kept.push(effect);
                continue;
            }
            // Parking is only allowed while the pool, as it stood before the sweep, has room.
            if self.recycle_expired && live_before + self.free_count < self.capacity {
                self.free.entry(effect.kind).or_default().push_back(effect);
                self.free_count += 1;
                report.recycled += 1;
            } else {
                if let Err(err) = host.destroy(id) {
                    tracing::warn!(id = %id, error = %err, "Failed to destroy expired effect");
                }
                report.released += 1;
            }
        }

        self.live = kept;
        self.stats.hidden += report.hidden as u64;
        self.stats.recycled += report.recycled as u64;
        self.stats.released += report.released as u64;
        self.stats.stale += report.stale as u64;
        self.check_capacity();
        report
    }

    /// Destroys one live handle ahead of its expiry.
    pub fn release<H: EffectHost>(&mut self, host: &mut H, id: ExternalId) -> Result<(), PoolError> {
        let pos = self
            .live
            .iter()
            .position(|e| e.external_id == id)
            .ok_or(PoolError::StaleHandle(id))?;
        self.live.swap_remove(pos);
        if !host.is_valid(id) {
            self.stats.stale += 1;
            return Err(PoolError::StaleHandle(id));
        }
        host.destroy(id)?;
        self.stats.released += 1;
        Ok(())
    }

    /// Destroys every live and free handle. Returns how many host objects were destroyed.
    pub fn drain<H: EffectHost>(&mut self, host: &mut H) -> usize {
        let mut destroyed = 0;
        let parked = std::mem::take(&mut self.free);
        self.free_count = 0;
        let all = self
            .live
            .drain(..)
            .chain(parked.into_values().flatten());
        for effect in all {
            if host.is_valid(effect.external_id) && host.destroy(effect.external_id).is_ok() {
                destroyed += 1;
            }
        }
        self.stats.released += destroyed as u64;
        destroyed
    }

    fn pop_free(&mut self, kind: EffectKind) -> Option<PooledEffect> {
        let queue = self.free.get_mut(&kind)?;
        let effect = queue.pop_front();
        if queue.is_empty() {
            self.free.remove(&kind);
        }
        if effect.is_some() {
            self.free_count -= 1;
        }
        effect
    }

    /// Destroys the first parked handle found, of any kind.
    fn evict_one<H: EffectHost>(&mut self, host: &mut H) -> bool {
        let Some(kind) = self.free.keys().next().copied() else {
            return false;
        };
        let Some(effect) = self.pop_free(kind) else {
            return false;
        };
        let id = effect.external_id;
        if host.is_valid(id) {
            if let Err(err) = host.destroy(id) {
                tracing::warn!(id = %id, error = %err, "Failed to destroy evicted effect");
            }
            self.stats.evicted += 1;
        } else {
            self.stats.stale += 1;
            tracing::warn!(%kind, id = %id, "Evicted handle was already stale");
        }
        true
    }

    #[inline]
    fn check_capacity(&self) {
        debug_assert!(
            self.occupied() <= self.capacity,
            "pool over capacity: {} live + {} free > {}",
            self.live.len(),
            self.free_count,
            self.capacity
        );
    }
}
