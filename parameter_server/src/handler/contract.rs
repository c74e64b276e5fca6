use comms::{MessageKind, Rank};

use crate::{
    error::{HandlerErr, Result},
    model::ModelHandle,
};

/// A message the handler needs sent back, the driver owning the channel sends it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub dst: Rank,
    pub kind: MessageKind,
    pub payload: Vec<f32>,
}

/// The server side of the coordination protocol.
///
/// A handler owns the global parameters and the model handle kept in sync with them.
/// It is fed one message at a time by a serialized receive loop, `receive` being the
/// only write path.
///
/// `receive` and `update` fail with `HandlerErr::Unimplemented` unless overridden,
/// every concrete handler must provide them.
pub trait ServerHandler {
    type Model: ModelHandle;

    /// Processes a single message from a client.
    ///
    /// # Arguments
    /// * `sender` - The rank of the client.
    /// * `kind` - The kind of message.
    /// * `payload` - The parameter vector it carried.
    ///
    /// # Returns
    /// An optional reply for the sender, or a fatal `HandlerErr`.
    fn receive(&mut self, sender: Rank, kind: MessageKind, payload: &[f32]) -> Result<Option<Reply>> {
        let _ = (sender, kind, payload);
        Err(HandlerErr::Unimplemented("receive"))
    }

    /// Applies a set of already collected contributions to the global model.
    ///
    /// # Arguments
    /// * `contributions` - Parameter vectors of the model's length.
    fn update(&mut self, contributions: &[&[f32]]) -> Result<()> {
        let _ = contributions;
        Err(HandlerErr::Unimplemented("update"))
    }

    /// The current global parameters, always a complete vector.
    fn buffer(&self) -> &[f32];

    /// The model handle, consistent with `buffer` after every aggregation.
    fn model(&self) -> &Self::Model;
}
