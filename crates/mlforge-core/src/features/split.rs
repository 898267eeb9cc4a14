//! Deterministic train/test partitioning.

/// Seed used for every train/test split.
pub const RANDOM_SEED: u64 = 11;

/// SplitMix64: small, fast and reproducible across platforms.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Bernoulli-sample `rows` into a training set with probability `fraction`;
/// everything not sampled forms the test set.
///
/// Rows are assigned by position, so the two sets are disjoint and together
/// contain every input row exactly once.
pub fn bernoulli_split<T>(rows: Vec<T>, fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = SplitMix64::new(seed);
    let mut train = Vec::with_capacity(rows.len());
    let mut test = Vec::new();
    for row in rows {
        if rng.next_f64() < fraction {
            train.push(row);
        } else {
            test.push(row);
        }
    }
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_deterministic() {
        let rows: Vec<u32> = (0..500).collect();
        let first = bernoulli_split(rows.clone(), 0.7, RANDOM_SEED);
        let second = bernoulli_split(rows, 0.7, RANDOM_SEED);
        assert_eq!(first, second);
    }

    #[test]
    fn test_split_partitions_rows() {
        let rows: Vec<u32> = (0..1000).collect();
        let (train, test) = bernoulli_split(rows, 0.7, RANDOM_SEED);

        assert_eq!(train.len() + test.len(), 1000);
        assert!(train.iter().all(|r| !test.contains(r)));
        // Loose bound; the sample is random but seeded.
        assert!((600..800).contains(&train.len()), "train={}", train.len());
    }

    #[test]
    fn test_full_fraction_keeps_everything_in_train() {
        let (train, test) = bernoulli_split((0..50).collect::<Vec<_>>(), 1.0, RANDOM_SEED);
        assert_eq!(train.len(), 50);
        assert!(test.is_empty());
    }

    #[test]
    fn test_next_f64_range() {
        let mut rng = SplitMix64::new(0);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }
}
