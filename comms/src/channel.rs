use std::io;

use crate::msg::{Message, MessageKind, Rank};

/// Point to point messaging between the ranks of a fixed size cluster.
///
/// Delivery is reliable and FIFO per sender, there is no ordering guarantee
/// between messages coming from different senders.
#[allow(unused)]
#[trait_variant::make(Channel: Send)]
pub trait LocalChannel {
    /// The rank of this end of the channel, stamped on every sent message.
    fn rank(&self) -> Rank;

    /// Sends a message to `dst`, completing once it was written.
    ///
    /// # Arguments
    /// * `kind` - The kind of message.
    /// * `payload` - The parameter vector to send, may be empty.
    /// * `dst` - The destination rank.
    ///
    /// # Returns
    /// An io error if `dst` is unknown or the transport failed.
    async fn send(&mut self, kind: MessageKind, payload: &[f32], dst: Rank) -> io::Result<()>;

    /// Waits until a message arrives.
    ///
    /// # Arguments
    /// * `src` - Only return a message from this rank, or from any rank if `None`.
    ///
    /// # Returns
    /// The received message or an io error if the transport failed.
    async fn recv(&mut self, src: Option<Rank>) -> io::Result<Message>;
}
