use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Assigns `LogEvent::id` at persist time. Ids are monotonically
/// increasing per worker process and globally unique given a distinct
/// `worker_id` per storage-worker instance; they carry no meaning about
/// the event's `timestamp` (the client-supplied field remains the
/// authoritative event time, per the no-id-monotonicity-assumption
/// contract downstream consumers must honor).
///
/// Layout (low to high bit): 12 bits sequence, 10 bits worker id, 42 bits
/// milliseconds since `LOGFLUX_EPOCH`. Good for ~139 years and 4096
/// ids/ms/worker before sequence wraps, at which point the generator
/// spins to the next millisecond.
const LOGFLUX_EPOCH_MILLIS: i64 = 1_700_000_000_000;

pub struct LogIdGenerator {
    worker_id: i64,
    state: AtomicI64,
}

impl LogIdGenerator {
    pub fn new(worker_id: u16) -> Self {
        Self {
            worker_id: (worker_id & 0x3FF) as i64,
            state: AtomicI64::new(0),
        }
    }

    pub fn next_id(&self) -> i64 {
        loop {
            let now_millis = current_millis() - LOGFLUX_EPOCH_MILLIS;
            let prev = self.state.load(Ordering::Acquire);
            let prev_millis = prev >> 12;
            let prev_seq = prev & 0xFFF;

            let (millis, seq) = if now_millis > prev_millis {
                (now_millis, 0)
            } else {
                (prev_millis, prev_seq + 1)
            };

            if seq > 0xFFF {
                // Sequence exhausted within this millisecond; spin to the next one.
                continue;
            }

            let next = (millis << 12) | seq;
            if self
                .state
                .compare_exchange(prev, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return (millis << 22) | (self.worker_id << 12) | seq;
            }
        }
    }
}

fn current_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after the unix epoch")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_strictly_increasing_for_one_generator() {
        let gen = LogIdGenerator::new(7);
        let mut last = gen.next_id();
        for _ in 0..10_000 {
            let id = gen.next_id();
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn distinct_workers_never_collide_within_the_same_millisecond() {
        let a = LogIdGenerator::new(1);
        let b = LogIdGenerator::new(2);
        let ids: Vec<i64> = (0..100).flat_map(|_| vec![a.next_id(), b.next_id()]).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }
}
