//! Tick counting, keyed rate limiting and tick-rate monitoring.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Monotonic tick counter. Simulated time is derived from it, never from the wall clock.
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    tick: u64,
    tick_rate: u32,
}

impl TickClock {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick: 0,
            tick_rate: tick_rate.max(1),
        }
    }

    /// Advances one tick and returns the new tick number.
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    pub fn current(&self) -> u64 {
        self.tick
    }

    pub fn ticks_since(&self, tick: u64) -> u64 {
        self.tick.saturating_sub(tick)
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Simulated milliseconds since tick 0.
    pub fn now_ms(&self) -> u64 {
        self.tick * 1000 / u64::from(self.tick_rate)
    }

    /// Simulated seconds since tick 0.
    pub fn seconds(&self) -> f64 {
        self.tick as f64 / f64::from(self.tick_rate)
    }
}

/// Runs keyed work at most once every `n` ticks.
///
/// A key that has never fired counts as last fired on tick 0.
#[derive(Debug, Clone)]
pub struct RateLimiter<K> {
    last_fired: HashMap<K, u64>,
}

impl<K: Eq + Hash> Default for RateLimiter<K> {
    fn default() -> Self {
        Self {
            last_fired: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> RateLimiter<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true, and records `now`, when at least `n` ticks passed since `key` last fired.
    pub fn ready(&mut self, key: K, n: u64, now: u64) -> bool {
        let last = self.last_fired.get(&key).copied().unwrap_or(0);
        if now.saturating_sub(last) >= n {
            self.last_fired.insert(key, now);
            true
        } else {
            false
        }
    }

    /// Calls `f` if `key` is [`ready`](Self::ready).
    pub fn every_n_ticks<F, T>(&mut self, key: K, n: u64, now: u64, f: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        self.ready(key, n, now).then(f)
    }

    pub fn forget(&mut self, key: &K) {
        self.last_fired.remove(key);
    }
}

/// Compares observed wall time over a window of ticks with the nominal tick rate.
///
/// `ratio > 1` means the host is ticking faster than nominal, `ratio < 1` slower.
#[derive(Debug, Clone)]
pub struct TickRateMonitor {
    window: VecDeque<Instant>,
    capacity: usize,
    expected: Duration,
    ratio: f64,
    last_elapsed: Option<Duration>,
}

impl TickRateMonitor {
    /// Tracks the last `tick_rate * 2` ticks.
    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        let capacity = tick_rate as usize * 2;
        let expected = Duration::from_secs_f64(capacity as f64 / f64::from(tick_rate));
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            expected,
            ratio: 1.0,
            last_elapsed: None,
        }
    }

    pub fn record(&mut self, now: Instant) {
        if self.window.len() >= self.capacity {
            if let Some(oldest) = self.window.pop_front() {
                let elapsed = now.saturating_duration_since(oldest);
                self.last_elapsed = Some(elapsed);
                if !elapsed.is_zero() {
                    self.ratio = self.expected.as_secs_f64() / elapsed.as_secs_f64();
                }
            }
        }
        self.window.push_back(now);
    }

    /// Stays at 1.0 until the window has filled once.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Wall time spanned by the last full window.
    pub fn last_elapsed(&self) -> Option<Duration> {
        self.last_elapsed
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}
