//! Batched round-robin updater.
//!
//! Bounds per-tick work by running at most `budget` registered updaters per
//! [`update`](RoundRobinScheduler::update), resuming from where the previous
//! call stopped. With `N` entries every entry runs at least once within
//! `ceil(N / budget)` updates.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Per-entry work. Receives the caller's context on every run.
pub type Updater<C> = Box<dyn FnMut(&mut C) -> anyhow::Result<()>>;
/// Runs once when the entry is replaced, deleted or cleared.
pub type Destructor = Box<dyn FnOnce()>;

struct Entry<C> {
    updater: Updater<C>,
    destructor: Option<Destructor>,
}

/// Outcome of one [`RoundRobinScheduler::update`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub visited: usize,
    pub failed: usize,
}

pub struct RoundRobinScheduler<K, C = ()> {
    entries: HashMap<K, Entry<C>>,
    keys: Vec<K>,
    cursor: usize,
    budget: usize,
}

impl<K, C> RoundRobinScheduler<K, C>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Creates a scheduler running at most `budget` entries per update (at least one).
    pub fn new(budget: usize) -> Self {
        Self {
            entries: HashMap::new(),
            keys: Vec::new(),
            cursor: 0,
            budget: budget.max(1),
        }
    }

    /// Registers `updater` under `key`.
    ///
    /// A new key joins the end of the rotation. Replacing an existing key runs
    /// its previous destructor and keeps its place in the rotation.
    pub fn set(&mut self, key: K, updater: Updater<C>, destructor: Option<Destructor>) {
        let entry = Entry {
            updater,
            destructor,
        };
        match self.entries.insert(key.clone(), entry) {
            Some(previous) => {
                if let Some(destroy) = previous.destructor {
                    destroy();
                }
            }
            None => self.keys.push(key),
        }
        debug_assert_eq!(self.keys.len(), self.entries.len());
    }

    /// Runs the entry's destructor and removes it. Missing keys are a no-op.
    ///
    /// Returns whether an entry was removed.
    pub fn delete(&mut self, key: &K) -> bool {
        let Some(entry) = self.entries.remove(key) else {
            return false;
        };
        if let Some(destroy) = entry.destructor {
            destroy();
        }
        if let Some(removed_at) = self.keys.iter().position(|k| k == key) {
            self.keys.remove(removed_at);
            if self.keys.is_empty() || self.cursor >= self.keys.len() {
                self.cursor = 0;
            } else if self.cursor > removed_at {
                self.cursor -= 1;
            }
        }
        debug_assert_eq!(self.keys.len(), self.entries.len());
        true
    }

    /// Runs up to `budget` updaters starting at the cursor, wrapping around.
    ///
    /// A failing updater is logged with its key and does not stop the batch.
    pub fn update_with(&mut self, context: &mut C) -> UpdateReport {
        let mut report = UpdateReport::default();
        if self.keys.is_empty() {
            return report;
        }
        let batch = self.budget.min(self.keys.len());
        for _ in 0..batch {
            let key = &self.keys[self.cursor];
            if let Some(entry) = self.entries.get_mut(key) {
                report.visited += 1;
                if let Err(err) = (entry.updater)(context) {
                    report.failed += 1;
                    tracing::error!(key = ?key, error = %err, "Updater failed");
                }
            }
            self.cursor = (self.cursor + 1) % self.keys.len();
        }
        report
    }

    /// Runs every destructor and empties the scheduler.
    pub fn clear(&mut self) {
        for key in self.keys.drain(..) {
            if let Some(entry) = self.entries.remove(&key) {
                if let Some(destroy) = entry.destructor {
                    destroy();
                }
            }
        }
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in rotation order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Index into [`keys`](Self::keys) of the next entry to run.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn set_budget(&mut self, budget: usize) {
        self.budget = budget.max(1);
    }
}

impl<K> RoundRobinScheduler<K, ()>
where
    K: Eq + Hash + Clone + Debug,
{
    /// [`update_with`](Self::update_with) for context-free schedulers.
    pub fn update(&mut self) -> UpdateReport {
        self.update_with(&mut ())
    }
}

impl<K, C> Drop for RoundRobinScheduler<K, C> {
    fn drop(&mut self) {
        for (_, entry) in self.entries.drain() {
            if let Some(destroy) = entry.destructor {
                destroy();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting(counter: &Rc<Cell<u32>>) -> Updater<()> {
        let counter = Rc::clone(counter);
        Box::new(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        })
    }

    #[test]
    fn test_cursor_advances_mod_len() {
        let mut s: RoundRobinScheduler<u32> = RoundRobinScheduler::new(2);
        for key in 0..3 {
            s.set(key, Box::new(|_| Ok(())), None);
        }
        s.update();
        assert_eq!(s.cursor(), 2);
        s.update();
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn test_delete_before_cursor_shifts_back() {
        let mut s: RoundRobinScheduler<u32> = RoundRobinScheduler::new(2);
        for key in 0..4 {
            s.set(key, Box::new(|_| Ok(())), None);
        }
        s.update();
        assert_eq!(s.cursor(), 2);
        assert!(s.delete(&0));
        assert_eq!(s.cursor(), 1);
        assert_eq!(s.keys()[s.cursor()], 2);
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let mut s: RoundRobinScheduler<&str> = RoundRobinScheduler::new(10);
        let ok = Rc::new(Cell::new(0));
        s.set(
            "bad",
            Box::new(|_: &mut ()| -> anyhow::Result<()> { anyhow::bail!("boom") }),
            None,
        );
        s.set("good", counting(&ok), None);
        let report = s.update();
        assert_eq!(report, UpdateReport { visited: 2, failed: 1 });
        assert_eq!(ok.get(), 1);
    }

    #[test]
    fn test_context_is_threaded_through() {
        let mut s: RoundRobinScheduler<u8, Vec<u8>> = RoundRobinScheduler::new(3);
        for key in 0..3u8 {
            s.set(
                key,
                Box::new(move |seen: &mut Vec<u8>| {
                    seen.push(key);
                    Ok(())
                }),
                None,
            );
        }
        let mut seen = Vec::new();
        s.update_with(&mut seen);
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_clear_runs_all_destructors() {
        let mut s: RoundRobinScheduler<u32> = RoundRobinScheduler::new(1);
        let destroyed = Rc::new(Cell::new(0));
        for key in 0..3 {
            let d = Rc::clone(&destroyed);
            s.set(key, Box::new(|_| Ok(())), Some(Box::new(move || d.set(d.get() + 1))));
        }
        s.update();
        s.clear();
        assert_eq!(destroyed.get(), 3);
        assert!(s.is_empty());
        assert_eq!(s.cursor(), 0);
    }

    #[test]
    fn test_drop_runs_remaining_destructors() {
        let destroyed = Rc::new(Cell::new(0));
        {
            let mut s: RoundRobinScheduler<u32> = RoundRobinScheduler::new(1);
            let d = Rc::clone(&destroyed);
            s.set(1, Box::new(|_| Ok(())), Some(Box::new(move || d.set(d.get() + 1))));
        }
        assert_eq!(destroyed.get(), 1);
    }

    #[test]
    fn test_budget_is_at_least_one() {
        let mut s: RoundRobinScheduler<u32> = RoundRobinScheduler::new(0);
        assert_eq!(s.budget(), 1);
        s.set_budget(0);
        assert_eq!(s.budget(), 1);
    }
}
