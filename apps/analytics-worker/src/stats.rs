/// Nearest-rank percentile over a set of millisecond durations. Sorts
/// `samples` in place; callers own a scratch buffer built fresh per bucket.
pub fn percentile_ms(samples: &mut [f64], p: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.sort_by(|a, b| a.partial_cmp(b).expect("duration samples are never NaN"));
    let rank = ((p / 100.0) * (samples.len() as f64 - 1.0)).round() as usize;
    samples[rank.min(samples.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_zero() {
        let mut samples: Vec<f64> = Vec::new();
        assert_eq!(percentile_ms(&mut samples, 99.0), 0.0);
    }

    #[test]
    fn p50_of_an_odd_length_run_is_the_median() {
        let mut samples = vec![10.0, 30.0, 20.0];
        assert_eq!(percentile_ms(&mut samples, 50.0), 20.0);
    }
}
