//! Internal utilities.

use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;

/// Hosts already dispatched by one runner.
///
/// Matching is exact: no case folding, no trimming.
#[derive(Debug, Default)]
pub struct Visited {
    hosts: HashSet<String>,
}

impl Visited {
    /// Records `host`. Returns `false` if it was already recorded.
    pub fn insert(&mut self, host: &str) -> bool {
        if self.hosts.contains(host) {
            return false;
        }
        self.hosts.insert(host.to_string())
    }

    /// Number of distinct hosts recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Returns `true` if nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Pause before the next launch: `delay` plus up to `jitter` extra.
///
/// The extra part is drawn in whole milliseconds from `[0, jitter)`.
#[must_use]
pub fn launch_delay(delay: Duration, jitter: Duration) -> Duration {
    let jitter_ms = u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX);
    if jitter_ms == 0 {
        return delay;
    }
    delay + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visited_is_exact_match() {
        let mut visited = Visited::default();
        assert!(visited.is_empty());
        assert!(visited.insert("a.example"));
        assert!(!visited.insert("a.example"));
        assert!(visited.insert("A.example"));
        assert!(visited.insert("a.example "));
        assert_eq!(visited.len(), 3);
    }

    #[test]
    fn no_jitter_is_exact_delay() {
        let delay = Duration::from_millis(40);
        assert_eq!(launch_delay(delay, Duration::ZERO), delay);
        assert_eq!(launch_delay(Duration::ZERO, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn jitter_stays_in_bounds() {
        let delay = Duration::from_millis(10);
        let jitter = Duration::from_millis(5);
        for _ in 0..200 {
            let d = launch_delay(delay, jitter);
            assert!(d >= delay && d < delay + jitter);
        }
    }
}
