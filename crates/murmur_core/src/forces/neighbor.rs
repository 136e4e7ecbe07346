use super::{Force, ForceSettings, NeighborData};
use murmur_data::{ForceKind, Vec3};

/// Accumulate-then-process rule plugged into [`NeighborForce`].
pub trait NeighborRule {
    const KIND: ForceKind;

    fn should_accumulate(&self, _neighbor: &NeighborData) -> bool {
        true
    }

    fn accumulate(&self, acc: &mut Vec3, position: Vec3, velocity: Vec3, neighbor: &NeighborData);

    /// Turns the accumulator into the force output. Only called with `count > 0`.
    fn process_accumulated(&self, acc: Vec3, count: usize, position: Vec3, velocity: Vec3) -> Vec3;
}

/// A force computed by folding a [`NeighborRule`] over the neighbors inside
/// its own perception radius.
#[derive(Debug, Clone)]
pub struct NeighborForce<R> {
    rule: R,
    settings: ForceSettings,
}

impl<R: NeighborRule> NeighborForce<R> {
    pub fn new(rule: R, weight: f32, perception_radius: f32) -> Self {
        Self {
            rule,
            settings: ForceSettings::new(weight, perception_radius),
        }
    }
}

impl<R: NeighborRule> Force for NeighborForce<R> {
    fn kind(&self) -> ForceKind {
        R::KIND
    }

    fn settings(&self) -> &ForceSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut ForceSettings {
        &mut self.settings
    }

    fn calculate(
        &self,
        index: usize,
        position: Vec3,
        velocity: Vec3,
        neighbors: &[NeighborData],
    ) -> Vec3 {
        let mut acc = Vec3::ZERO;
        let mut count = 0;
        for neighbor in neighbors {
            if neighbor.index == index || neighbor.distance > self.settings.perception_radius {
                continue;
            }
            if self.rule.should_accumulate(neighbor) {
                self.rule.accumulate(&mut acc, position, velocity, neighbor);
                count += 1;
            }
        }
        if count == 0 {
            return Vec3::ZERO;
        }
        self.rule.process_accumulated(acc, count, position, velocity)
    }
}

/// Steers away from neighbors closer than `distance`, weighted by `1 / d`.
#[derive(Debug, Clone, Copy)]
pub struct Separation {
    pub distance: f32,
}

impl NeighborRule for Separation {
    const KIND: ForceKind = ForceKind::Separation;

    fn should_accumulate(&self, neighbor: &NeighborData) -> bool {
        neighbor.distance > 0.0 && neighbor.distance < self.distance
    }

    fn accumulate(&self, acc: &mut Vec3, position: Vec3, _velocity: Vec3, neighbor: &NeighborData) {
        *acc += (position - neighbor.position) * (1.0 / neighbor.distance);
    }

    fn process_accumulated(&self, acc: Vec3, count: usize, _position: Vec3, _velocity: Vec3) -> Vec3 {
        acc.div_or_keep(count as f32).normalized()
    }
}

/// Steers toward the mean neighbor heading.
#[derive(Debug, Clone, Copy)]
pub struct Alignment;

impl NeighborRule for Alignment {
    const KIND: ForceKind = ForceKind::Alignment;

    fn accumulate(&self, acc: &mut Vec3, _position: Vec3, _velocity: Vec3, neighbor: &NeighborData) {
        *acc += neighbor.velocity;
    }

    fn process_accumulated(&self, acc: Vec3, count: usize, _position: Vec3, velocity: Vec3) -> Vec3 {
        (acc.div_or_keep(count as f32) - velocity).normalized()
    }
}

/// Steers toward the neighbors' center of mass.
#[derive(Debug, Clone, Copy)]
pub struct Cohesion;

impl NeighborRule for Cohesion {
    const KIND: ForceKind = ForceKind::Cohesion;

    fn accumulate(&self, acc: &mut Vec3, _position: Vec3, _velocity: Vec3, neighbor: &NeighborData) {
        *acc += neighbor.position;
    }

    fn process_accumulated(&self, acc: Vec3, count: usize, position: Vec3, _velocity: Vec3) -> Vec3 {
        (acc.div_or_keep(count as f32) - position).normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(index: usize, position: Vec3, velocity: Vec3, from: Vec3) -> NeighborData {
        let distance_sq = position.distance_sq(from);
        NeighborData {
            index,
            position,
            velocity,
            distance: distance_sq.sqrt(),
            distance_sq,
        }
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).magnitude() < 1e-5
    }

    #[test]
    fn test_no_neighbors_gives_zero() {
        let force = NeighborForce::new(Cohesion, 1.0, 10.0);
        assert_eq!(force.calculate(0, Vec3::ZERO, Vec3::ZERO, &[]), Vec3::ZERO);
    }

    #[test]
    fn test_separation_pushes_away() {
        let force = NeighborForce::new(Separation { distance: 3.0 }, 4.0, 20.0);
        let pos = Vec3::ZERO;
        let neighbors = [at(1, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, pos)];
        let out = force.calculate(0, pos, Vec3::ZERO, &neighbors);
        assert!(approx(out, Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_separation_ignores_far_and_coincident() {
        let force = NeighborForce::new(Separation { distance: 3.0 }, 4.0, 20.0);
        let pos = Vec3::ZERO;
        let neighbors = [
            at(1, Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO, pos),
            at(2, Vec3::ZERO, Vec3::ZERO, pos),
        ];
        assert_eq!(force.calculate(0, pos, Vec3::ZERO, &neighbors), Vec3::ZERO);
    }

    #[test]
    fn test_alignment_matches_mean_heading() {
        let force = NeighborForce::new(Alignment, 1.0, 20.0);
        let pos = Vec3::ZERO;
        let neighbors = [
            at(1, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), pos),
            at(2, Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), pos),
        ];
        let out = force.calculate(0, pos, Vec3::ZERO, &neighbors);
        assert!(approx(out, Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_cohesion_steers_to_center() {
        let force = NeighborForce::new(Cohesion, 1.0, 20.0);
        let pos = Vec3::ZERO;
        let neighbors = [
            at(1, Vec3::new(2.0, 2.0, 0.0), Vec3::ZERO, pos),
            at(2, Vec3::new(2.0, -2.0, 0.0), Vec3::ZERO, pos),
        ];
        let out = force.calculate(0, pos, Vec3::ZERO, &neighbors);
        assert!(approx(out, Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_self_and_out_of_radius_skipped() {
        let force = NeighborForce::new(Cohesion, 1.0, 5.0);
        let pos = Vec3::ZERO;
        let neighbors = [
            at(0, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, pos),
            at(3, Vec3::new(6.0, 0.0, 0.0), Vec3::ZERO, pos),
        ];
        assert_eq!(force.calculate(0, pos, Vec3::ZERO, &neighbors), Vec3::ZERO);
    }
}
