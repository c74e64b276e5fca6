use std::collections::BTreeMap;

use comms::Rank;

use crate::error::{HandlerErr, Result};

/// The outcome of offering a contribution to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contribution {
    Accepted,
    /// The client already contributed this round, the payload was dropped.
    Duplicate,
}

/// The contributions received during the current round, at most one per client.
#[derive(Debug)]
pub struct ClientBufferCache {
    client_count: usize,
    entries: BTreeMap<Rank, Vec<f32>>,
}

impl ClientBufferCache {
    /// Creates a new empty `ClientBufferCache`.
    ///
    /// # Arguments
    /// * `client_count` - The amount of clients, valid ranks are `[1, client_count]`.
    ///
    /// # Returns
    /// A new `ClientBufferCache` instance.
    pub fn new(client_count: usize) -> Self {
        Self {
            client_count,
            entries: BTreeMap::new(),
        }
    }

    /// Stores a copy of `payload` for `rank` unless it already has one.
    ///
    /// # Returns
    /// Whether the contribution was accepted, or `RankOutOfBounds` for an unknown client.
    pub fn insert(&mut self, rank: Rank, payload: &[f32]) -> Result<Contribution> {
        if rank == 0 || rank as usize > self.client_count {
            return Err(HandlerErr::RankOutOfBounds {
                rank,
                client_count: self.client_count,
            });
        }

        if self.entries.contains_key(&rank) {
            return Ok(Contribution::Duplicate);
        }

        self.entries.insert(rank, payload.to_vec());
        Ok(Contribution::Accepted)
    }

    pub fn contains(&self, rank: Rank) -> bool {
        self.entries.contains_key(&rank)
    }

    pub fn get(&self, rank: Rank) -> Option<&[f32]> {
        self.entries.get(&rank).map(Vec::as_slice)
    }

    /// The amount of clients holding a contribution.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn client_count(&self) -> usize {
        self.client_count
    }

    /// The stored contributions ordered by rank.
    pub fn contributions(&self) -> Vec<&[f32]> {
        self.entries.values().map(Vec::as_slice).collect()
    }

    /// Empties every slot at once.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_contribution_wins() {
        let mut cache = ClientBufferCache::new(3);

        assert_eq!(cache.insert(2, &[1.0]).unwrap(), Contribution::Accepted);
        assert_eq!(cache.insert(2, &[9.0]).unwrap(), Contribution::Duplicate);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(2), Some([1.0].as_slice()));
    }

    #[test]
    fn test_rank_bounds() {
        let mut cache = ClientBufferCache::new(3);

        assert!(matches!(
            cache.insert(0, &[1.0]),
            Err(HandlerErr::RankOutOfBounds { rank: 0, client_count: 3 })
        ));
        assert!(matches!(
            cache.insert(4, &[1.0]),
            Err(HandlerErr::RankOutOfBounds { rank: 4, .. })
        ));
        assert!(cache.insert(3, &[1.0]).is_ok());
    }

    #[test]
    fn test_clear_empties_every_slot() {
        let mut cache = ClientBufferCache::new(2);
        cache.insert(1, &[1.0]).unwrap();
        cache.insert(2, &[2.0]).unwrap();
        assert_eq!(cache.contributions(), [[1.0].as_slice(), [2.0].as_slice()]);

        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains(1));
        assert_eq!(cache.insert(1, &[3.0]).unwrap(), Contribution::Accepted);
    }
}
