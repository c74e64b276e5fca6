use comms::{MessageKind, Rank};
use log::{debug, trace};

use super::{GlobalModel, Reply, ServerHandler};
use crate::{
    error::{HandlerErr, Result},
    model::{ModelHandle, SizeMismatchErr},
};

const DEFAULT_ALPHA: f32 = 0.5;
const DEFAULT_DECAY: f32 = 0.9;

/// Asynchronous handler, merges every contribution into the global model as soon as it arrives.
///
/// `buffer <- (1 - alpha) * buffer + alpha * payload`, without rounds, quorum or deduplication.
#[derive(Debug)]
pub struct AsyncHandler<M: ModelHandle> {
    global: GlobalModel<M>,
    alpha: f32,
    decay: f32,
    merges: usize,
}

impl<M: ModelHandle> AsyncHandler<M> {
    /// Creates a new `AsyncHandler`.
    ///
    /// # Arguments
    /// * `model` - The externally managed model, its parameters become the global buffer.
    /// * `alpha` - The mixing weight of incoming parameters, in `(0, 1)`.
    /// * `decay` - Reserved for staleness weighting, currently not applied.
    ///
    /// # Returns
    /// A new `AsyncHandler` or `InvalidConfig` if `alpha` is out of range.
    pub fn new(model: M, alpha: f32, decay: f32) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(HandlerErr::InvalidConfig(format!(
                "alpha must be in (0, 1), got {alpha}"
            )));
        }

        Ok(Self {
            global: GlobalModel::new(model),
            alpha,
            decay,
            merges: 0,
        })
    }

    /// Creates a new `AsyncHandler` with `alpha = 0.5` and `decay = 0.9`.
    pub fn with_defaults(model: M) -> Self {
        Self {
            global: GlobalModel::new(model),
            alpha: DEFAULT_ALPHA,
            decay: DEFAULT_DECAY,
            merges: 0,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// The amount of contributions merged so far.
    pub fn merges(&self) -> usize {
        self.merges
    }

    fn merge(&mut self, params: &[f32]) -> Result<()> {
        let alpha = self.alpha;

        let next = self
            .global
            .buffer()
            .iter()
            .zip(params)
            .map(|(b, p)| (1.0 - alpha) * b + alpha * p)
            .collect();

        self.global.install(next)?;
        self.merges += 1;
        Ok(())
    }
}

impl<M: ModelHandle> ServerHandler for AsyncHandler<M> {
    type Model = M;

    fn receive(&mut self, sender: Rank, kind: MessageKind, payload: &[f32]) -> Result<Option<Reply>> {
        trace!(sender = sender, kind = kind.name(); "processing message");

        match kind {
            MessageKind::ParameterUpdate => {
                self.global.check_len(sender, payload)?;
                self.merge(payload)?;

                debug!(sender = sender, merges = self.merges; "merged parameters");
                Ok(None)
            }
            MessageKind::ParameterRequest => Ok(Some(Reply {
                dst: sender,
                kind: MessageKind::ParameterUpdate,
                payload: self.global.model().parameters(),
            })),
            MessageKind::GradientUpdate => Err(HandlerErr::Unimplemented("gradient update")),
            MessageKind::Exit => Ok(None),
        }
    }

    /// Merges every contribution in order, each one as if it had just been received.
    fn update(&mut self, contributions: &[&[f32]]) -> Result<()> {
        let expected = self.global.len();
        if let Some(bad) = contributions.iter().find(|c| c.len() != expected) {
            return Err(SizeMismatchErr {
                got: bad.len(),
                expected,
            }
            .into());
        }

        contributions.iter().try_for_each(|params| self.merge(params))
    }

    fn buffer(&self) -> &[f32] {
        self.global.buffer()
    }

    fn model(&self) -> &M {
        self.global.model()
    }
}
