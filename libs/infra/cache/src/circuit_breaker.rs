use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// `CircuitState` is packed into a single `AtomicU8` so every request can
/// check it with one load instead of taking a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    fn from_tag(tag: u8) -> Self {
        match tag {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }

    fn tag(self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    pub consecutive_failure_threshold: u32,
    pub window_size: usize,
    pub window_failure_ratio: f64,
    pub cool_off: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            consecutive_failure_threshold: 5,
            window_size: 20,
            window_failure_ratio: 0.5,
            cool_off: Duration::from_secs(30),
        }
    }
}

struct Window {
    outcomes: VecDeque<bool>,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    half_open_probe_in_flight: bool,
}

/// Per-dependency circuit breaker: CLOSED lets traffic through and counts
/// failures, OPEN rejects everything until the cool-off elapses, HALF_OPEN
/// admits exactly one probe request to decide whether to close or re-open.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: AtomicU8,
    window: Mutex<Window>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: AtomicU8::new(CircuitState::Closed.tag()),
            window: Mutex::new(Window {
                outcomes: VecDeque::with_capacity(config.window_size),
                consecutive_failures: 0,
                opened_at: None,
                half_open_probe_in_flight: false,
            }),
            config,
        }
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from_tag(self.state.load(Ordering::Acquire))
    }

    /// Call before attempting the guarded operation. Returns `true` if the
    /// caller should proceed (and, for HALF_OPEN, is now the single
    /// admitted probe); `false` means fail fast.
    pub fn allow_request(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                let mut window = self.window.lock().expect("circuit breaker mutex poisoned");
                if window.half_open_probe_in_flight {
                    false
                } else {
                    window.half_open_probe_in_flight = true;
                    true
                }
            }
            CircuitState::Open => {
                let mut window = self.window.lock().expect("circuit breaker mutex poisoned");
                let elapsed = window.opened_at.map(|at| at.elapsed()) >= Some(self.config.cool_off);
                if elapsed {
                    window.half_open_probe_in_flight = true;
                    self.state.store(CircuitState::HalfOpen.tag(), Ordering::Release);
                    info!("circuit breaker cool-off elapsed, admitting a half-open probe");
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut window = self.window.lock().expect("circuit breaker mutex poisoned");
        window.consecutive_failures = 0;
        push_outcome(&mut window.outcomes, self.config.window_size, true);

        if self.state() == CircuitState::HalfOpen {
            window.half_open_probe_in_flight = false;
            window.opened_at = None;
            self.state.store(CircuitState::Closed.tag(), Ordering::Release);
            info!("half-open probe succeeded, circuit breaker closed");
        }
    }

    pub fn record_failure(&self) {
        let mut window = self.window.lock().expect("circuit breaker mutex poisoned");
        window.consecutive_failures += 1;
        push_outcome(&mut window.outcomes, self.config.window_size, false);

        let was_half_open = self.state() == CircuitState::HalfOpen;
        let ratio_tripped = window.outcomes.len() == self.config.window_size
            && failure_ratio(&window.outcomes) >= self.config.window_failure_ratio;
        let consecutive_tripped = window.consecutive_failures >= self.config.consecutive_failure_threshold;

        if was_half_open || ratio_tripped || consecutive_tripped {
            window.half_open_probe_in_flight = false;
            window.opened_at = Some(Instant::now());
            self.state.store(CircuitState::Open.tag(), Ordering::Release);
            warn!(
                consecutive_failures = window.consecutive_failures,
                was_half_open, ratio_tripped, "circuit breaker opened"
            );
        }
    }
}

fn push_outcome(outcomes: &mut VecDeque<bool>, cap: usize, success: bool) {
    if outcomes.len() == cap {
        outcomes.pop_front();
    }
    outcomes.push_back(success);
}

fn failure_ratio(outcomes: &VecDeque<bool>) -> f64 {
    let failures = outcomes.iter().filter(|&&ok| !ok).count();
    failures as f64 / outcomes.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            consecutive_failure_threshold: 5,
            window_size: 20,
            window_failure_ratio: 0.5,
            cool_off: Duration::from_millis(20),
        })
    }

    #[test]
    fn opens_after_consecutive_failure_threshold() {
        let cb = breaker();
        for _ in 0..4 {
            assert!(cb.allow_request());
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());
    }

    #[test]
    fn opens_on_window_failure_ratio_without_consecutive_run() {
        let cb = breaker();
        for i in 0..20 {
            assert!(cb.allow_request());
            if i % 2 == 0 {
                cb.record_failure();
            } else {
                cb.record_success();
            }
        }
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn half_open_admits_exactly_one_probe_and_closes_on_success() {
        let cb = breaker();
        for _ in 0..5 {
            cb.allow_request();
            cb.record_failure();
        }
        assert_eq!(cb.state(), CircuitState::Open);
        std::thread::sleep(Duration::from_millis(30));

        assert!(cb.allow_request());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(!cb.allow_request());

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());
    }

    #[test]
    fn half_open_probe_failure_reopens_circuit() {
        let cb = breaker();
        for _ in 0..5 {
            cb.allow_request();
            cb.record_failure();
        }
        std::thread::sleep(Duration::from_millis(30));
        assert!(cb.allow_request());
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }
}
