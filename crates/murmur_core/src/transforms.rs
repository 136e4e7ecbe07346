//! Pending transform staging and the bounded apply pass.
//!
//! Physics stages at most one transform per entity slot (latest wins). Each
//! tick the apply pass walks slots from where it last stopped and hands at
//! most `budget` staged transforms to the caller, skipping slots applied less
//! than `min_interval` ticks ago.

use murmur_data::Transform;

/// A transform waiting to be shown, with the entity's speed relative to max speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagedTransform {
    pub transform: Transform,
    pub speed_ratio: f32,
}

#[derive(Debug, Clone, Default)]
pub struct TransformQueue {
    pending: Vec<Option<StagedTransform>>,
    last_applied: Vec<u64>,
    cursor: usize,
    pending_count: usize,
}

impl TransformQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `slot` as if it was last applied on tick `offset`.
    ///
    /// Spreading offsets over `[0, min_interval)` staggers the first applies.
    pub fn track(&mut self, slot: usize, offset: u64) {
        if self.pending.len() <= slot {
            self.pending.resize(slot + 1, None);
            self.last_applied.resize(slot + 1, 0);
        }
        if self.pending[slot].take().is_some() {
            self.pending_count -= 1;
        }
        self.last_applied[slot] = offset;
    }

    /// Drops anything staged for `slot`.
    pub fn forget(&mut self, slot: usize) {
        if let Some(entry) = self.pending.get_mut(slot) {
            if entry.take().is_some() {
                self.pending_count -= 1;
            }
        }
    }

    /// Stages a transform for `slot`, replacing any earlier one.
    pub fn stage(&mut self, slot: usize, staged: StagedTransform) {
        if self.pending.len() <= slot {
            self.track(slot, 0);
        }
        if self.pending[slot].replace(staged).is_none() {
            self.pending_count += 1;
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    pub fn is_pending(&self, slot: usize) -> bool {
        matches!(self.pending.get(slot), Some(Some(_)))
    }

    pub fn last_applied(&self, slot: usize) -> Option<u64> {
        self.last_applied.get(slot).copied()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Hands up to `budget` due transforms to `apply`. Returns how many were applied.
    ///
    /// Visits each slot at most once per call, starting at the cursor.
    pub fn apply<F>(&mut self, tick: u64, budget: usize, min_interval: u64, mut apply: F) -> usize
    where
        F: FnMut(usize, StagedTransform),
    {
        let slots = self.pending.len();
        if slots == 0 || budget == 0 {
            return 0;
        }
        let start = self.cursor % slots;
        let mut current = start;
        let mut applied = 0;
        loop {
            if self.pending[current].is_some()
                && tick.saturating_sub(self.last_applied[current]) >= min_interval
            {
                if let Some(staged) = self.pending[current].take() {
                    self.pending_count -= 1;
                    self.last_applied[current] = tick;
                    apply(current, staged);
                    applied += 1;
                }
            }
            current = (current + 1) % slots;
            if current == start || applied >= budget {
                break;
            }
        }
        self.cursor = current;
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_data::Vec3;

    fn staged(x: f32) -> StagedTransform {
        StagedTransform {
            transform: Transform::new(Vec3::new(x, 0.0, 0.0), Vec3::ZERO),
            speed_ratio: 0.5,
        }
    }

    #[test]
    fn test_latest_stage_wins() {
        let mut q = TransformQueue::new();
        q.track(0, 0);
        q.stage(0, staged(1.0));
        q.stage(0, staged(2.0));
        assert_eq!(q.pending_count(), 1);

        let mut seen = Vec::new();
        q.apply(10, 5, 3, |slot, s| seen.push((slot, s.transform.position.x)));
        assert_eq!(seen, vec![(0, 2.0)]);
        assert_eq!(q.pending_count(), 0);
    }

    #[test]
    fn test_budget_limits_and_cursor_resumes() {
        let mut q = TransformQueue::new();
        for slot in 0..4 {
            q.track(slot, 0);
            q.stage(slot, staged(slot as f32));
        }
        let mut seen = Vec::new();
        assert_eq!(q.apply(10, 2, 0, |slot, _| seen.push(slot)), 2);
        assert_eq!(q.cursor(), 2);
        assert_eq!(q.apply(10, 2, 0, |slot, _| seen.push(slot)), 2);
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_min_interval_defers() {
        let mut q = TransformQueue::new();
        q.track(0, 5);
        q.stage(0, staged(1.0));
        assert_eq!(q.apply(7, 5, 3, |_, _| {}), 0);
        assert!(q.is_pending(0));
        assert_eq!(q.apply(8, 5, 3, |_, _| {}), 1);
        assert_eq!(q.last_applied(0), Some(8));
    }

    #[test]
    fn test_forget_drops_pending() {
        let mut q = TransformQueue::new();
        q.stage(3, staged(1.0));
        assert_eq!(q.pending_count(), 1);
        q.forget(3);
        q.forget(99);
        assert_eq!(q.pending_count(), 0);
        assert_eq!(q.apply(100, 5, 0, |_, _| panic!("nothing staged")), 0);
    }
}
