use std::io;

use comms::Channel;

/// This trait acts as an indirection layer, allowing the `ServerBuilder` to return
/// and manage different server configurations from its unique build method.
#[async_trait::async_trait]
pub trait Server<C>: Send
where
    C: Channel + Send,
{
    /// Drives the federation over `channel` until every client was dismissed.
    ///
    /// # Arguments
    /// * `channel` - The server's end of the cluster channel.
    ///
    /// # Returns
    /// The final global parameters, or an io error on transport failures and
    /// fatal handler errors.
    async fn run(&mut self, channel: &mut C) -> io::Result<Vec<f32>>;
}
