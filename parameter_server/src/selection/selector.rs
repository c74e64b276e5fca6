use comms::Rank;

/// Chooses which clients take part in the next round.
pub trait ClientSelector {
    /// Should return `amount` distinct ranks out of `[1, client_count]`.
    ///
    /// # Arguments
    /// * `client_count` - The amount of clients in the federation.
    /// * `amount` - How many of them to pick, never greater than `client_count`.
    fn select(&mut self, client_count: usize, amount: usize) -> Vec<Rank>;
}
