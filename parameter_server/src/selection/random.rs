use comms::Rank;
use rand::{SeedableRng, rngs::StdRng, seq::index};

use super::ClientSelector;

/// Picks clients uniformly at random without repetition.
#[derive(Debug, Clone)]
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    /// Creates a new `RandomSelector`.
    ///
    /// # Arguments
    /// * `seed` - An optional seed to make the selection reproducible.
    ///
    /// # Returns
    /// A new `RandomSelector` instance.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self { rng }
    }
}

impl ClientSelector for RandomSelector {
    fn select(&mut self, client_count: usize, amount: usize) -> Vec<Rank> {
        index::sample(&mut self.rng, client_count, amount)
            .into_iter()
            .map(|i| i as Rank + 1)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_selection_is_distinct_and_in_range() {
        let mut selector = RandomSelector::new(None);

        for _ in 0..100 {
            let ranks = selector.select(10, 7);
            assert_eq!(ranks.len(), 7);

            let unique: HashSet<_> = ranks.iter().collect();
            assert_eq!(unique.len(), 7);
            assert!(ranks.iter().all(|&r| (1..=10).contains(&r)));
        }
    }

    #[test]
    fn test_full_selection_covers_everyone() {
        let mut selector = RandomSelector::new(Some(7));

        let mut ranks = selector.select(5, 5);
        ranks.sort();
        assert_eq!(ranks, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let mut one = RandomSelector::new(Some(42));
        let mut two = RandomSelector::new(Some(42));

        for _ in 0..10 {
            assert_eq!(one.select(20, 5), two.select(20, 5));
        }
    }
}
