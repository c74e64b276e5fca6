use std::{
    collections::{HashMap, HashSet},
    io,
};

use comms::{Channel, MessageKind, Rank};
use log::{debug, info};

use super::Server;
use crate::{
    handler::{AsyncHandler, SharedHandler},
    model::ModelHandle,
};

/// Drives an `AsyncHandler` with a plain receive loop.
///
/// Parameter requests are answered through the handler. After each merged
/// contribution the sender is handed the current parameters to keep training,
/// until it reached `updates_per_client` contributions and is sent `Exit`.
pub struct AsyncServer<M: ModelHandle> {
    handler: SharedHandler<AsyncHandler<M>>,
    client_count: usize,
    updates_per_client: usize,
}

impl<M: ModelHandle> AsyncServer<M> {
    /// Creates a new `AsyncServer`.
    ///
    /// # Arguments
    /// * `handler` - The merging handler.
    /// * `client_count` - The amount of clients to serve.
    /// * `updates_per_client` - Contributions to take from each client before dismissing it.
    ///
    /// # Returns
    /// A new `AsyncServer` instance.
    pub fn new(handler: AsyncHandler<M>, client_count: usize, updates_per_client: usize) -> Self {
        Self {
            handler: SharedHandler::new(handler),
            client_count,
            updates_per_client,
        }
    }

    pub fn handler(&self) -> &SharedHandler<AsyncHandler<M>> {
        &self.handler
    }

    /// Serves the clients until every one of them was dismissed.
    pub async fn run<C: Channel>(&mut self, channel: &mut C) -> io::Result<Vec<f32>> {
        let mut contributed: HashMap<Rank, usize> = HashMap::new();
        let mut dismissed = HashSet::new();

        while dismissed.len() < self.client_count {
            let msg = channel.recv(None).await?;
            let (sender, kind) = (msg.sender(), msg.kind());

            if let Some(reply) = self.handler.receive(sender, kind, msg.payload())? {
                channel.send(reply.kind, &reply.payload, reply.dst).await?;
                continue;
            }

            match kind {
                MessageKind::ParameterUpdate => {
                    let count = contributed.entry(sender).or_default();
                    *count += 1;

                    if *count >= self.updates_per_client {
                        channel.send(MessageKind::Exit, &[], sender).await?;
                        dismissed.insert(sender);
                        debug!(sender = sender; "client dismissed");
                    } else {
                        let params = self.handler.snapshot();
                        channel.send(MessageKind::ParameterUpdate, &params, sender).await?;
                    }
                }
                MessageKind::Exit => {
                    info!(sender = sender; "client left on its own");
                    dismissed.insert(sender);
                }
                _ => {}
            }
        }

        let merges = self.handler.lock().merges();
        info!(merges = merges; "every client dismissed");
        Ok(self.handler.snapshot())
    }
}

#[async_trait::async_trait]
impl<C, M> Server<C> for AsyncServer<M>
where
    C: Channel + Send,
    M: ModelHandle + Send,
{
    /// Indirection call to `Self::run`.
    async fn run(&mut self, channel: &mut C) -> io::Result<Vec<f32>> {
        AsyncServer::run(self, channel).await
    }
}
