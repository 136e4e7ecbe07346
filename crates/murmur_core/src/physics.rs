//! Swarm arena and the per-entity integrator.
//!
//! Entity state is stored as flat `[x, y, z, ...]` component arrays so the
//! spatial grid can read positions directly. Slots are addressed through
//! generational [`EntityId`]s; a freed slot bumps its generation and is
//! handed out again before the arrays grow.

use crate::error::{CoreError, Result};
use crate::forces::NeighborData;
use crate::grid::SpatialGrid;
use murmur_data::{EntityId, Vec3};

/// Global motion limits, tunable at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    pub max_speed: f32,
    pub max_force: f32,
}

impl PhysicsParams {
    pub fn new(max_speed: f32, max_force: f32) -> Self {
        Self {
            max_speed: max_speed.max(0.0),
            max_force: max_force.max(0.0),
        }
    }

    /// Adds `delta` to the max speed, clamping at zero. Returns the new value.
    pub fn adjust_max_speed(&mut self, delta: f32) -> f32 {
        self.max_speed = (self.max_speed + delta).max(0.0);
        self.max_speed
    }

    pub fn adjust_max_force(&mut self, delta: f32) -> f32 {
        self.max_force = (self.max_force + delta).max(0.0);
        self.max_force
    }
}

/// Result of one integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Forward Euler with `dt = 1 tick`: `v += force * max_force`, `|v| <= max_speed`, `p += v`.
#[inline]
pub fn integrate(position: Vec3, velocity: Vec3, force: Vec3, params: &PhysicsParams) -> Motion {
    let velocity = (velocity + force * params.max_force).limit(params.max_speed);
    Motion {
        position: position + velocity,
        velocity,
    }
}

/// Structure-of-arrays storage for the swarm.
#[derive(Debug, Clone, Default)]
pub struct Swarm {
    positions: Vec<f32>,
    velocities: Vec<f32>,
    forces: Vec<f32>,
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_slots: Vec<u32>,
    live: usize,
}

impl Swarm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity * 3),
            velocities: Vec::with_capacity(capacity * 3),
            forces: Vec::with_capacity(capacity * 3),
            generations: Vec::with_capacity(capacity),
            alive: Vec::with_capacity(capacity),
            free_slots: Vec::new(),
            live: 0,
        }
    }

    /// Allocates a slot, reusing the most recently freed one first.
    pub fn spawn(&mut self, position: Vec3, velocity: Vec3) -> EntityId {
        let index = match self.free_slots.pop() {
            Some(index) => {
                let slot = index as usize;
                self.generations[slot] = self.generations[slot].wrapping_add(1);
                self.alive[slot] = true;
                slot
            }
            None => {
                self.positions.extend_from_slice(&[0.0; 3]);
                self.velocities.extend_from_slice(&[0.0; 3]);
                self.forces.extend_from_slice(&[0.0; 3]);
                self.generations.push(0);
                self.alive.push(true);
                self.alive.len() - 1
            }
        };
        position.write_to(&mut self.positions, index * 3);
        velocity.write_to(&mut self.velocities, index * 3);
        Vec3::ZERO.write_to(&mut self.forces, index * 3);
        self.live += 1;
        EntityId::new(index as u32, self.generations[index])
    }

    /// Frees the id's slot. Fails if the id is stale.
    pub fn despawn(&mut self, id: EntityId) -> Result<usize> {
        let index = self.resolve(id)?;
        self.alive[index] = false;
        Vec3::ZERO.write_to(&mut self.velocities, index * 3);
        Vec3::ZERO.write_to(&mut self.forces, index * 3);
        self.free_slots.push(id.index);
        self.live -= 1;
        Ok(index)
    }

    /// Slot index of a live id.
    pub fn resolve(&self, id: EntityId) -> Result<usize> {
        if self.is_alive(id) {
            Ok(id.slot())
        } else {
            Err(CoreError::StaleEntity(id))
        }
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        let slot = id.slot();
        slot < self.alive.len() && self.alive[slot] && self.generations[slot] == id.generation
    }

    pub fn is_slot_alive(&self, index: usize) -> bool {
        self.alive.get(index).copied().unwrap_or(false)
    }

    /// Live entity count.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Allocated slots, live or free.
    pub fn slot_count(&self) -> usize {
        self.alive.len()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn velocities(&self) -> &[f32] {
        &self.velocities
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.positions, index * 3)
    }

    pub fn velocity(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.velocities, index * 3)
    }

    /// Weighted force applied on the entity's last update.
    pub fn force(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.forces, index * 3)
    }

    pub fn set_motion(&mut self, index: usize, motion: Motion, force: Vec3) {
        motion.position.write_to(&mut self.positions, index * 3);
        motion.velocity.write_to(&mut self.velocities, index * 3);
        force.write_to(&mut self.forces, index * 3);
    }

    /// Collects live neighbors of `index` within `radius` into `out`.
    ///
    /// Grid candidates are filtered by exact squared distance, inclusive of
    /// the radius itself. `candidates` is scratch space.
    pub fn gather_neighbors(
        &self,
        index: usize,
        grid: &SpatialGrid,
        radius: f32,
        candidates: &mut Vec<usize>,
        out: &mut Vec<NeighborData>,
    ) {
        out.clear();
        let position = self.position(index);
        let radius_sq = radius * radius;
        grid.query_near_into(position.x, position.y, position.z, candidates);
        for &other in candidates.iter() {
            if other == index || !self.is_slot_alive(other) {
                continue;
            }
            let other_position = self.position(other);
            let distance_sq = position.distance_sq(other_position);
            if distance_sq > radius_sq {
                continue;
            }
            out.push(NeighborData {
                index: other,
                position: other_position,
                velocity: self.velocity(other),
                distance: distance_sq.sqrt(),
                distance_sq,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrate_clamps_speed() {
        let params = PhysicsParams::new(0.5, 1.0);
        let m = integrate(Vec3::ZERO, Vec3::new(0.4, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), &params);
        assert!((m.velocity.magnitude() - 0.5).abs() < 1e-6);
        assert!((m.position.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_integrate_scales_force() {
        let params = PhysicsParams::new(10.0, 0.01);
        let m = integrate(Vec3::ZERO, Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0), &params);
        assert!((m.velocity.y - 0.02).abs() < 1e-7);
        assert_eq!(m.position, m.velocity);
    }

    #[test]
    fn test_params_clamp_at_zero() {
        let mut params = PhysicsParams::new(0.5, 0.01);
        assert_eq!(params.adjust_max_speed(-1.0), 0.0);
        assert_eq!(params.adjust_max_force(-0.02), 0.0);
        assert!((params.adjust_max_speed(0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_despawn_bumps_generation_and_reuses_slot() {
        let mut swarm = Swarm::new();
        let a = swarm.spawn(Vec3::ZERO, Vec3::ZERO);
        let b = swarm.spawn(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(swarm.despawn(a), Ok(0));
        assert!(!swarm.is_alive(a));
        assert_eq!(swarm.despawn(a), Err(CoreError::StaleEntity(a)));

        let c = swarm.spawn(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(c.index, a.index);
        assert_ne!(c.generation, a.generation);
        assert!(swarm.is_alive(b));
        assert_eq!(swarm.len(), 2);
        assert_eq!(swarm.slot_count(), 2);
        assert_eq!(swarm.position(0), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_free_slots_are_lifo() {
        let mut swarm = Swarm::new();
        let ids: Vec<_> = (0..3).map(|_| swarm.spawn(Vec3::ZERO, Vec3::ZERO)).collect();
        swarm.despawn(ids[0]).unwrap();
        swarm.despawn(ids[2]).unwrap();
        assert_eq!(swarm.spawn(Vec3::ZERO, Vec3::ZERO).index, 2);
        assert_eq!(swarm.spawn(Vec3::ZERO, Vec3::ZERO).index, 0);
    }

    #[test]
    fn test_gather_neighbors_boundary() {
        let mut swarm = Swarm::new();
        swarm.spawn(Vec3::ZERO, Vec3::ZERO);
        swarm.spawn(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO);
        swarm.spawn(Vec3::new(0.0, 5.001, 0.0), Vec3::ZERO);
        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(swarm.positions());

        let mut scratch = Vec::new();
        let mut neighbors = Vec::new();
        swarm.gather_neighbors(0, &grid, 5.0, &mut scratch, &mut neighbors);
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].index, 1);
        assert_eq!(neighbors[0].distance, 5.0);
    }

    #[test]
    fn test_gather_neighbors_skips_dead() {
        let mut swarm = Swarm::new();
        swarm.spawn(Vec3::ZERO, Vec3::ZERO);
        let b = swarm.spawn(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
        let mut grid = SpatialGrid::new(10.0);
        grid.rebuild(swarm.positions());
        swarm.despawn(b).unwrap();

        let mut scratch = Vec::new();
        let mut neighbors = Vec::new();
        swarm.gather_neighbors(0, &grid, 5.0, &mut scratch, &mut neighbors);
        assert!(neighbors.is_empty());
    }
}
