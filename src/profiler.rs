// profiler.rs
// Per-phase frame timings, compiled in with the `profiling` feature

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Scoped profiler recording cumulative time per frame phase.
#[derive(Default)]
pub struct Profiler {
    pub timings: HashMap<&'static str, Duration>,
    pub calls: HashMap<&'static str, u64>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(&mut self, guard: &ProfilerGuard) {
        let elapsed = guard.start.elapsed();
        *self.timings.entry(guard.name).or_default() += elapsed;
        *self.calls.entry(guard.name).or_default() += 1;
    }

    /// Phases ordered by total time, slowest first.
    pub fn report_sorted(&self) -> Vec<(&'static str, Duration)> {
        let mut v: Vec<_> = self.timings.iter().map(|(n, d)| (*n, *d)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v
    }

    pub fn clear(&mut self) {
        self.timings.clear();
        self.calls.clear();
    }

    /// Mean time per call for `name`.
    pub fn per_call(&self, name: &str) -> Option<Duration> {
        let total = *self.timings.get(name)?;
        let calls = self.calls.get(name).copied().unwrap_or(1).max(1);
        Some(total.div_f64(calls as f64))
    }

    pub fn log_and_clear(&mut self) {
        for (name, total) in self.report_sorted() {
            log::info!(
                "{:<16} total {:>10.3?}  per call {:>10.3?}",
                name,
                total,
                self.per_call(name).unwrap_or_default()
            );
        }
        self.clear();
    }
}

pub struct ProfilerGuard {
    name: &'static str,
    start: Instant,
}

/// Start a profiling section. Returns a guard that will update the global
/// profiler when dropped.
pub fn start(name: &'static str) -> ProfilerGuard {
    ProfilerGuard {
        name,
        start: Instant::now(),
    }
}

#[cfg(feature = "profiling")]
impl Drop for ProfilerGuard {
    fn drop(&mut self) {
        crate::PROFILER.lock().finish(self);
    }
}

/// Profile the rest of the enclosing scope when the `profiling` feature is enabled.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        #[cfg(feature = "profiling")]
        let _guard = $crate::profiler::start($name);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_is_sorted_and_counts_calls() {
        let mut profiler = Profiler::new();
        for name in ["integrate", "interact", "interact"] {
            let guard = start(name);
            std::thread::sleep(Duration::from_millis(1));
            profiler.finish(&guard);
        }
        let report = profiler.report_sorted();
        assert_eq!(report.len(), 2);
        assert!(report.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(profiler.timings["interact"] >= Duration::from_millis(2));
        assert_eq!(profiler.calls["interact"], 2);
        profiler.clear();
        assert!(profiler.report_sorted().is_empty());
        assert_eq!(profiler.per_call("interact"), None);
    }

    #[test]
    fn per_call_handles_call_counts_past_u32() {
        let mut profiler = Profiler::new();
        let calls = u64::from(u32::MAX) + 2;
        profiler.timings.insert("interact", Duration::from_secs(calls));
        profiler.calls.insert("interact", calls);
        assert_eq!(profiler.per_call("interact"), Some(Duration::from_secs(1)));
    }
}
