use comms::{MessageKind, Rank};
use log::{debug, info, warn};

use super::{ClientBufferCache, Contribution, GlobalModel, Reply, ServerHandler};
use crate::{
    aggregation::{Aggregator, FedAvg},
    error::{HandlerErr, Result},
    model::{ModelHandle, SizeMismatchErr},
    selection::{ClientSelector, RandomSelector},
};

/// Round barrier handler, averages the parameters of a quorum of clients.
///
/// Accepts at most one contribution per client per round. Once `quorum` distinct
/// clients contributed, the aggregate becomes the new global model, the cache is
/// emptied and the update flag is raised until `start_round` is called.
#[derive(Debug)]
pub struct SyncHandler<M, A = FedAvg, S = RandomSelector>
where
    M: ModelHandle,
{
    global: GlobalModel<M>,
    aggregator: A,
    selector: S,
    cache: ClientBufferCache,
    quorum: usize,
    received_count: usize,
    update_flag: bool,
}

impl<M: ModelHandle> SyncHandler<M> {
    /// Creates a new `SyncHandler` averaging with `FedAvg` and selecting clients at random.
    ///
    /// # Arguments
    /// * `model` - The externally managed model, its parameters become the global buffer.
    /// * `client_count` - The amount of clients in the federation.
    /// * `select_ratio` - The fraction of clients that make up a round, in `(0, 1]`.
    ///
    /// # Returns
    /// A new `SyncHandler` or `InvalidConfig` if the quorum would be empty.
    pub fn new(model: M, client_count: usize, select_ratio: f64) -> Result<Self> {
        Self::with_parts(model, client_count, select_ratio, FedAvg, RandomSelector::new(None))
    }
}

impl<M, A, S> SyncHandler<M, A, S>
where
    M: ModelHandle,
    A: Aggregator,
    S: ClientSelector,
{
    /// Creates a new `SyncHandler` with a custom aggregation rule and client selector.
    ///
    /// # Arguments
    /// * `model` - The externally managed model, its parameters become the global buffer.
    /// * `client_count` - The amount of clients in the federation.
    /// * `select_ratio` - The fraction of clients that make up a round, in `(0, 1]`.
    /// * `aggregator` - How a round's contributions become the new global model.
    /// * `selector` - How the participants of a round are chosen.
    ///
    /// # Returns
    /// A new `SyncHandler` or `InvalidConfig` if the quorum would be empty.
    pub fn with_parts(
        model: M,
        client_count: usize,
        select_ratio: f64,
        aggregator: A,
        selector: S,
    ) -> Result<Self> {
        if !(select_ratio > 0.0 && select_ratio <= 1.0) {
            return Err(HandlerErr::InvalidConfig(format!(
                "select ratio must be in (0, 1], got {select_ratio}"
            )));
        }

        let quorum = (select_ratio * client_count as f64).floor() as usize;
        if quorum == 0 {
            return Err(HandlerErr::InvalidConfig(format!(
                "a select ratio of {select_ratio} over {client_count} clients makes an empty round"
            )));
        }

        Ok(Self {
            global: GlobalModel::new(model),
            aggregator,
            selector,
            cache: ClientBufferCache::new(client_count),
            quorum,
            received_count: 0,
            update_flag: false,
        })
    }

    /// Returns `quorum` distinct client ranks chosen to take part in the next round.
    pub fn select_clients(&mut self) -> Vec<Rank> {
        self.selector.select(self.cache.client_count(), self.quorum)
    }

    /// Whether a round completed since the last `start_round`.
    pub fn is_updated(&self) -> bool {
        self.update_flag
    }

    /// Clears the update flag, must be called before relying on `is_updated` again.
    pub fn start_round(&mut self) {
        self.update_flag = false;
    }

    /// The amount of contributions that complete a round.
    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// The amount of contributions accepted so far in the current round.
    pub fn received_count(&self) -> usize {
        self.received_count
    }

    pub fn client_count(&self) -> usize {
        self.cache.client_count()
    }

    pub fn cache(&self) -> &ClientBufferCache {
        &self.cache
    }

    /// Aggregates the cached contributions and resets the round bookkeeping.
    ///
    /// The bookkeeping is reset even if the model refuses the aggregate, in which
    /// case the round is lost and the next one starts from an empty cache.
    fn complete_round(&mut self) -> Result<()> {
        let mut next = vec![0.0; self.global.len()];
        self.aggregator.aggregate(&self.cache.contributions(), &mut next);

        self.cache.clear();
        self.received_count = 0;

        if let Err(e) = self.global.install(next) {
            warn!(quorum = self.quorum; "model refused the aggregate, round dropped: {e}");
            return Err(e);
        }

        self.update_flag = true;

        info!(quorum = self.quorum; "round complete, global model updated");
        Ok(())
    }
}

impl<M, A, S> ServerHandler for SyncHandler<M, A, S>
where
    M: ModelHandle,
    A: Aggregator,
    S: ClientSelector,
{
    type Model = M;

    fn receive(&mut self, sender: Rank, kind: MessageKind, payload: &[f32]) -> Result<Option<Reply>> {
        debug!(sender = sender, kind = kind.name(); "processing message");

        if kind != MessageKind::ParameterUpdate {
            return Err(HandlerErr::ProtocolViolation { sender, kind });
        }

        self.global.check_len(sender, payload)?;

        match self.cache.insert(sender, payload)? {
            Contribution::Duplicate => {
                warn!(sender = sender; "parameters already received this round, ignoring them");
                return Ok(None);
            }
            Contribution::Accepted => self.received_count += 1,
        }

        debug!(
            sender = sender,
            received = self.received_count,
            quorum = self.quorum;
            "contribution accepted"
        );

        if self.received_count == self.quorum {
            self.complete_round()?;
        }

        Ok(None)
    }

    fn update(&mut self, contributions: &[&[f32]]) -> Result<()> {
        if contributions.is_empty() {
            return Err(HandlerErr::InvalidConfig(
                "cannot aggregate an empty set of contributions".to_string(),
            ));
        }

        let expected = self.global.len();
        if let Some(bad) = contributions.iter().find(|c| c.len() != expected) {
            return Err(SizeMismatchErr {
                got: bad.len(),
                expected,
            }
            .into());
        }

        let mut next = vec![0.0; expected];
        self.aggregator.aggregate(contributions, &mut next);
        self.global.install(next)
    }

    fn buffer(&self) -> &[f32] {
        self.global.buffer()
    }

    fn model(&self) -> &M {
        self.global.model()
    }
}
