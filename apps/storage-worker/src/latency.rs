/// Nearest-rank percentile over a set of millisecond latencies. Mutates
/// `samples` in place (sorts it) since every caller owns a scratch buffer
/// anyway and this runs once per flush, not on a hot path.
pub fn percentile_ms(samples: &mut [f64], p: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.sort_by(|a, b| a.partial_cmp(b).expect("latency samples are never NaN"));
    let rank = ((p / 100.0) * (samples.len() as f64 - 1.0)).round() as usize;
    samples[rank.min(samples.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p99_of_a_single_sample_is_itself() {
        let mut samples = vec![42.0];
        assert_eq!(percentile_ms(&mut samples, 99.0), 42.0);
    }

    #[test]
    fn p95_picks_a_high_rank_not_the_max() {
        let mut samples: Vec<f64> = (1..=100).map(|n| n as f64).collect();
        let p95 = percentile_ms(&mut samples, 95.0);
        assert!((95.0..=96.0).contains(&p95));
    }

    #[test]
    fn empty_input_is_zero() {
        let mut samples: Vec<f64> = Vec::new();
        assert_eq!(percentile_ms(&mut samples, 99.0), 0.0);
    }
}
