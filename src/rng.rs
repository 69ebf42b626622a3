use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

/// The single source of randomness for spawning and dot decisions.
#[derive(Clone, Debug)]
pub struct Rng {
    inner: StdRng,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_f32(&mut self) -> f32 {
        self.inner.random::<f32>()
    }

    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.inner.random_range(min..=max)
    }

    pub fn bool(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.inner.random_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::Rng;

    #[test]
    fn same_seed_yields_same_sequence() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..64 {
            assert_eq!(a.next_f32().to_bits(), b.next_f32().to_bits());
            assert_eq!(a.int(-3, 3), b.int(-3, 3));
        }
    }

    #[test]
    fn int_and_pick_index_stay_in_range() {
        let mut rng = Rng::new(99);
        for _ in 0..1_000 {
            let v = rng.int(0, 31);
            assert!((0..=31).contains(&v));
            assert!(rng.pick_index(5) < 5);
        }
        assert_eq!(rng.int(4, 4), 4);
        assert_eq!(rng.pick_index(0), 0);
    }

    #[test]
    fn bool_respects_extreme_probabilities() {
        let mut rng = Rng::new(3);
        for _ in 0..200 {
            assert!(!rng.bool(0.0));
            assert!(rng.bool(1.0));
        }
    }
}
